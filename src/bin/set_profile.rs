//! Utility to set the body profile from the command line
//!
//! Usage: set_profile <sex> <height_cm> <weight_kg> <age> <activity> [username]

use nutrilog::config::Config;
use nutrilog::db::Database;
use nutrilog::nutrition::BodyMetrics;
use nutrilog::tools::profile::{setup_profile, ProfileSetup};

const USAGE: &str = "Usage: set_profile <male|female> <height_cm> <weight_kg> <age> <low|moderate|high> [username]";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 5 || args.len() > 6 {
        eprintln!("{}", USAGE);
        std::process::exit(2);
    }

    // Each field comes from its own argument
    let metrics = BodyMetrics::parse(&args[2], &args[1], &args[3])?;

    let config = Config::from_env();
    println!("Database path: {}", config.database_path.display());
    let database = Database::open(&config.database_path)?;

    let setup = ProfileSetup {
        username: args.get(5).cloned(),
        sex: args[0].clone(),
        height_cm: metrics.height_cm,
        weight_kg: metrics.weight_kg,
        age_years: metrics.age_years,
        activity_level: args[4].clone(),
    };
    let response = setup_profile(&database, &config.user_id, setup)?;

    println!("Profile set for '{}':", config.user_id);
    if let Some(name) = &response.profile.username {
        println!("  Name: {}", name);
    }
    println!(
        "  {} | {} cm | {} kg | {} years | activity {}",
        args[0], metrics.height_cm, metrics.weight_kg, metrics.age_years, args[4]
    );
    if let Some(goals) = response.goals {
        println!("  BMR: {:.1} kcal", goals.bmr);
        println!("  Daily calories: {} kcal", goals.daily_calories);
        println!("  Daily water: {} ml", goals.daily_water_ml);
    }

    Ok(())
}
