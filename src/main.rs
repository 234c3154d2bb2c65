//! Timberborn Production Calculator
//!
//! Sizes farms, forests and workshops for a Timberborn faction.

mod calculator;
mod catalog;
mod db;
mod error;
mod loader;
mod models;
mod names;
mod rules;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use rusqlite::Connection;

use crate::calculator::Calculator;
use crate::catalog::CatalogRepository;
use crate::names::{BuildingName, Difficulty, Good, TileSource};

const SAMPLE_CATALOGS: &[(&str, &str)] = &[
    ("folktails.yml", include_str!("../data/folktails.yml")),
    ("iron_teeth.yml", include_str!("../data/iron_teeth.yml")),
];

#[derive(Parser)]
#[command(name = "timberborn-calculator")]
#[command(about = "Production requirement calculator for Timberborn factions")]
struct Cli {
    /// Path to the SQLite database
    #[arg(short, long, env = "TIMBERBORN_DB", default_value = "timberborn.db")]
    database: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize empty database with schema
    Init,

    /// Load the bundled Folktails and Iron Teeth catalogs
    LoadSample,

    /// Import faction data files from a directory
    Import {
        /// Directory searched recursively for *.yml / *.yaml faction files
        dir: PathBuf,

        /// Clear existing catalogs before import
        #[arg(long)]
        clear: bool,
    },

    /// List all factions in the database
    ListFactions,

    /// Show the catalog of a faction
    Show {
        faction: String,
    },

    /// Daily food and water needs of a population
    Consumption {
        faction: String,

        #[arg(short, long)]
        population: i64,

        #[arg(long, default_value = "normal", value_parser = Difficulty::parse_lenient)]
        difficulty: Difficulty,

        /// Split the food need evenly across this many food types
        #[arg(long)]
        food_types: Option<i64>,
    },

    /// Tiles of a crop or tree needed for a daily amount
    Tiles {
        faction: String,

        /// Crop or tree (e.g., "carrot crop", "pine")
        #[arg(value_parser = TileSource::parse_lenient)]
        source: TileSource,

        /// Target amount per day
        #[arg(short, long)]
        amount: f64,

        /// Crops are pollinated by beehives
        #[arg(long)]
        beehive: bool,

        /// Size a tree for its harvest (resin, syrup, fruit) instead of logs
        #[arg(long)]
        resin: bool,
    },

    /// Buildings needed to produce a daily amount of a recipe
    Buildings {
        faction: String,

        #[arg(value_parser = BuildingName::parse_lenient)]
        building: BuildingName,

        #[arg(value_parser = Good::parse_lenient)]
        recipe: Good,

        /// Target amount per day
        #[arg(short, long)]
        amount: f64,

        /// Workers assigned to each building (default: fully staffed)
        #[arg(short, long)]
        workers: Option<i64>,
    },

    /// Daily inputs consumed by a number of buildings running a recipe
    Inputs {
        faction: String,

        #[arg(value_parser = BuildingName::parse_lenient)]
        building: BuildingName,

        #[arg(value_parser = Good::parse_lenient)]
        recipe: Good,

        /// Number of buildings
        #[arg(short, long)]
        count: i64,

        /// Workers assigned to each building (default: fully staffed)
        #[arg(short, long)]
        workers: Option<i64>,
    },

    /// Calculate the production chain for a target good
    Plan {
        faction: String,

        /// Target good (e.g., "Treated Planks", "Breads")
        #[arg(value_parser = Good::parse_lenient)]
        good: Good,

        /// Target amount per day
        #[arg(short, long, default_value = "10.0")]
        amount: f64,

        /// Crops are pollinated by beehives
        #[arg(long)]
        beehive: bool,

        /// Show detailed production tree
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut conn = Connection::open(&cli.database)
        .with_context(|| format!("Failed to open {}", cli.database.display()))?;
    db::init_schema(&conn)?;

    match cli.command {
        Commands::Init => {
            println!("Database initialized at: {}", cli.database.display());
        }

        Commands::LoadSample => {
            load_sample_data(&mut conn)?;
            println!("Sample data loaded successfully!");
        }

        Commands::Import { dir, clear } => {
            if clear {
                log::info!("Clearing existing catalogs...");
                db::clear_catalogs(&conn)?;
            }

            let stats = loader::import_directory(&mut conn, &dir)?;
            println!("{}", stats);
        }

        Commands::ListFactions => {
            let factions = db::list_factions(&conn)?;
            if factions.is_empty() {
                println!("No factions in database. Run 'import' or 'load-sample' first.");
            } else {
                println!("Factions:");
                for f in factions {
                    println!("  {}", f);
                }
            }
        }

        Commands::Show { faction } => {
            let repo = open_repository(&conn, &faction)?;
            print_catalog(&repo)?;
        }

        Commands::Consumption {
            faction,
            population,
            difficulty,
            food_types,
        } => {
            let repo = open_repository(&conn, &faction)?;
            let calc = Calculator::for_faction(&repo);

            let food = calc.daily_food_consumption(population, difficulty)?;
            let water = calc.daily_water_consumption(population, difficulty)?;
            println!(
                "{} beavers of {} on {} difficulty:",
                population,
                repo.faction_name(),
                difficulty
            );
            println!("  Food:  {:.2}/day", food);
            println!("  Water: {:.2}/day", water);

            if let Some(types) = food_types {
                let per_type = calc.food_per_type(population, types, difficulty)?;
                println!("  {} food types: {} of each per day", types, per_type);
            }
        }

        Commands::Tiles {
            faction,
            source,
            amount,
            beehive,
            resin,
        } => {
            let repo = open_repository(&conn, &faction)?;
            let calc = Calculator::for_faction(&repo);

            match source {
                TileSource::Crop(crop) => {
                    if resin {
                        bail!("--resin only applies to trees");
                    }
                    let rate = calc.crop_rate_per_tile(crop, beehive)?;
                    let tiles = calc.crop_tiles_needed(crop, amount, beehive)?;
                    let harvest = repo.crop_harvest_name(crop)?;
                    println!("{} tiles of {} -> {} @ {:.2}/day", tiles, crop, harvest, amount);
                    println!("  ({:.3} {} per tile per day)", rate, harvest);
                }
                TileSource::Tree(tree) => {
                    if beehive {
                        bail!("--beehive only applies to crops");
                    }
                    let (product, rate, tiles) = if resin {
                        (
                            repo.tree_harvest_name(tree)?.to_string(),
                            calc.tree_harvest_rate_per_tile(tree)?,
                            calc.tree_harvest_tiles_needed(tree, amount)?,
                        )
                    } else {
                        (
                            "Logs".to_string(),
                            calc.tree_log_rate_per_tile(tree)?,
                            calc.tree_log_tiles_needed(tree, amount)?,
                        )
                    };
                    println!("{} {} trees -> {} @ {:.2}/day", tiles, tree, product, amount);
                    println!("  ({:.3} {} per tree per day)", rate, product);
                }
            }
        }

        Commands::Buildings {
            faction,
            building,
            recipe,
            amount,
            workers,
        } => {
            let repo = open_repository(&conn, &faction)?;
            let calc = Calculator::for_faction(&repo);

            let count = calc.buildings_needed(building, recipe, amount, workers)?;
            let per_building = calc.daily_output_per_building(building, recipe, workers)?;
            println!("{}x {} ({}) -> {} @ {:.2}/day", count, building, recipe, recipe, amount);
            println!("  ({:.2} {} per building per day)", per_building, recipe);
        }

        Commands::Inputs {
            faction,
            building,
            recipe,
            count,
            workers,
        } => {
            let repo = open_repository(&conn, &faction)?;
            let calc = Calculator::for_faction(&repo);

            println!("{}x {} making {}:", count, building, recipe);
            let inputs = repo.recipe_inputs(building, recipe)?;
            for input in inputs {
                let demand = calc.daily_input_demand(building, recipe, input.name, count, workers)?;
                println!("  needs {} @ {:.2}/day", input.name, demand);
            }
            if inputs.is_empty() {
                println!("  no inputs");
            }
        }

        Commands::Plan {
            faction,
            good,
            amount,
            beehive,
            verbose,
        } => {
            let repo = open_repository(&conn, &faction)?;
            let calc = Calculator::for_faction(&repo);
            let chain = calc.plan(good, amount, beehive)?;

            if verbose {
                println!("Production chain:\n");
                println!("{}", calculator::format_production_chain(&chain, 0));
            }

            let summary = calculator::summarize_chain(&chain);
            println!("{}", summary);
        }
    }

    Ok(())
}

fn open_repository(conn: &Connection, faction: &str) -> Result<CatalogRepository> {
    let catalog = db::load_catalog(conn, faction)?;
    Ok(CatalogRepository::new(catalog))
}

/// Load the bundled faction catalogs
fn load_sample_data(conn: &mut Connection) -> Result<()> {
    for (file, text) in SAMPLE_CATALOGS {
        let catalog = loader::parse_catalog(text)
            .with_context(|| format!("Bundled sample {} is invalid", file))?;
        db::store_catalog(conn, &catalog)?;
        log::info!("Loaded {} from {}", catalog.name, file);
    }
    Ok(())
}

fn print_catalog(repo: &CatalogRepository) -> Result<()> {
    let catalog = repo.catalog();
    println!("Faction: {}", catalog.name);

    println!("  Difficulty:");
    for level in &catalog.difficulties {
        println!("    {:<8} x{}", level.difficulty, level.modifier);
    }

    println!("  Consumption per beaver per day:");
    for rate in &catalog.consumption {
        println!("    {:<8} {}", rate.kind, rate.per_capita_daily);
    }

    if let Some(beehive) = &catalog.beehive {
        println!("  Beehive modifier: x{}", beehive.modifier);
    }

    if !catalog.crops.is_empty() {
        println!();
        println!("  {:<20} {:>8} {:<18} {:>8} {:>6}", "Crop", "Growth", "Harvest", "Every", "Yield");
        println!("  {}", "-".repeat(64));
        for crop in &catalog.crops {
            let growth = repo
                .crop_growth_time(crop.name)?
                .map_or("-".to_string(), |t| format!("{}d", t));
            println!(
                "  {:<20} {:>8} {:<18} {:>7}d {:>6}",
                crop.name, growth, crop.harvest.name, crop.harvest.time_days, crop.harvest.yield_amount
            );
        }
    }

    if !catalog.trees.is_empty() {
        println!();
        println!("  {:<20} {:>8} {:>6} {:<18}", "Tree", "Growth", "Logs", "Harvest");
        println!("  {}", "-".repeat(56));
        for tree in &catalog.trees {
            let growth = tree.growth_time_days.map_or("-".to_string(), |t| format!("{}d", t));
            let harvest = tree.harvest.as_ref().map_or("-".to_string(), |h| {
                format!("{} x{} every {}d", h.name, h.yield_amount, h.time_days)
            });
            println!("  {:<20} {:>8} {:>6} {}", tree.name, growth, tree.log_output, harvest);
        }
    }

    for building in catalog.buildings() {
        println!();
        let recipes = repo.recipe_count(building.name)?;
        match building.workers {
            Some(w) => println!("  {} ({} workers, {} recipes)", building.name, w, recipes),
            None => println!("  {} ({} recipes)", building.name, recipes),
        }
        for recipe in &building.recipes {
            println!(
                "    {} x{} every {}h",
                recipe.name, recipe.output_quantity, recipe.production_time_hours
            );
            for input in &recipe.inputs {
                println!("      needs {} x{}", input.name, input.quantity);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::names::{
        CropName, FoodProcessingBuildingName, FoodRecipeName, GoodsRecipeName, HarvestName,
        TreeName, WaterBuildingName,
    };
    use crate::models::ProductionSource;

    fn sample_db() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();
        load_sample_data(&mut conn).unwrap();
        conn
    }

    #[test]
    fn bundled_samples_load() {
        let conn = sample_db();
        assert_eq!(db::list_factions(&conn).unwrap(), vec!["Folktails", "Iron Teeth"]);
        let folktails = db::load_catalog(&conn, "Folktails").unwrap();
        assert_eq!(folktails.crops.len(), 8);
        let iron_teeth = db::load_catalog(&conn, "Iron Teeth").unwrap();
        assert!(iron_teeth.beehive.is_none());
    }

    #[test]
    fn reloading_samples_replaces_catalogs() {
        let mut conn = sample_db();
        load_sample_data(&mut conn).unwrap();
        assert_eq!(db::list_factions(&conn).unwrap(), vec!["Folktails", "Iron Teeth"]);
        assert_eq!(db::load_catalog(&conn, "Folktails").unwrap().crops.len(), 8);
    }

    #[test]
    fn sample_recipe_inputs() {
        let conn = sample_db();
        let repo = open_repository(&conn, "Folktails").unwrap();
        let grill: BuildingName = FoodProcessingBuildingName::Grill.into();
        let inputs = repo
            .recipe_inputs(grill, FoodRecipeName::GrilledPotatoes.into())
            .unwrap();
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].name, Good::from(HarvestName::Potatoes));
        assert!(repo
            .recipe_inputs(WaterBuildingName::WaterPump.into(), HarvestName::Water.into())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn folktails_sample_answers() {
        let conn = sample_db();
        let repo = open_repository(&conn, "Folktails").unwrap();
        let calc = Calculator::for_faction(&repo);
        assert_eq!(calc.crop_tiles_needed(CropName::BerryBush, 30.0, false).unwrap(), 120);
        assert_eq!(calc.food_per_type(100, 5, Difficulty::Normal).unwrap(), 55);
        assert_eq!(
            calc.buildings_needed(WaterBuildingName::WaterPump.into(), HarvestName::Water.into(), 15.0, None)
                .unwrap(),
            2
        );
        assert_eq!(
            calc.daily_output_per_building(
                WaterBuildingName::LargeWaterPump.into(),
                HarvestName::Water.into(),
                Some(1)
            )
            .unwrap(),
            288.0
        );
    }

    #[test]
    fn iron_teeth_sample_answers() {
        let conn = sample_db();
        let repo = open_repository(&conn, "iron teeth").unwrap();
        let calc = Calculator::for_faction(&repo);
        // 1 per 0.33h -> 72.7 per day
        assert_eq!(
            calc.buildings_needed(
                WaterBuildingName::DeepWaterPump.into(),
                HarvestName::Water.into(),
                100.0,
                None
            )
            .unwrap(),
            2
        );
        assert_eq!(calc.tree_harvest_tiles_needed(TreeName::MangroveTree, 4.0).unwrap(), 10);
        let fermenter = FoodProcessingBuildingName::Fermenter.into();
        let cassava = FoodRecipeName::FermentedCassava.into();
        assert_eq!(calc.daily_output_per_building(fermenter, cassava, Some(1)).unwrap(), 12.0);
        assert_eq!(calc.daily_output_per_building(fermenter, cassava, None).unwrap(), 24.0);
    }

    #[test]
    fn bundled_chain_reaches_tiles() {
        let conn = sample_db();
        let repo = open_repository(&conn, "Folktails").unwrap();
        let calc = Calculator::for_faction(&repo);
        let chain = calc.plan(FoodRecipeName::Breads.into(), 50.0, false).unwrap();

        let flour = &chain.inputs[0].upstream;
        assert_eq!(flour.good, Good::from(FoodRecipeName::WheatFlour));
        let wheat = &flour.inputs[0].upstream;
        assert!(matches!(wheat.source, ProductionSource::Crop { name: CropName::WheatCrop, .. }));

        let summary = calculator::summarize_chain(&chain);
        assert!(summary.raw_inputs.is_empty());
        assert_eq!(summary.target, Good::from(FoodRecipeName::Breads));

        // Scrap metal is mined without inputs
        let chain = calc.plan(GoodsRecipeName::MetalBlocks.into(), 1.0, false).unwrap();
        assert_eq!(chain.inputs.len(), 2);
        assert!(chain.inputs[0].upstream.inputs.is_empty());
    }

    #[test]
    fn cli_parses_lenient_names() {
        let cli = Cli::try_parse_from([
            "timberborn-calculator",
            "buildings",
            "folktails",
            "large-water-pump",
            "water",
            "--amount",
            "600",
            "--workers",
            "1",
        ])
        .unwrap();
        match cli.command {
            Commands::Buildings { building, recipe, workers, .. } => {
                assert_eq!(building, BuildingName::from(WaterBuildingName::LargeWaterPump));
                assert_eq!(recipe, Good::from(HarvestName::Water));
                assert_eq!(workers, Some(1));
            }
            _ => panic!("expected buildings command"),
        }

        assert!(Cli::try_parse_from(["timberborn-calculator", "tiles", "folktails", "banana", "-a", "3"]).is_err());
    }
}
