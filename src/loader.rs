//! Faction data loading
//!
//! Reads the YAML faction files, resolves every name to its enumeration and
//! checks the numeric ranges. A catalog that comes out of this module is
//! trusted by the rest of the crate.

use std::collections::HashSet;
use std::fs;
use std::hash::Hash;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use rusqlite::Connection;
use serde::Deserialize;
use walkdir::WalkDir;

use crate::db;
use crate::error::CatalogError;
use crate::models::{
    Beehive, ConsumptionRate, Crop, DifficultyLevel, FactionCatalog, Harvest, ProductionBuilding,
    Recipe, RecipeInput, Tree,
};
use crate::names::{
    BuildingName, ConsumptionType, CropName, Difficulty, FoodProcessingBuildingName, Good,
    GoodsBuildingName, HarvestName, TreeName, WaterBuildingName,
};

pub const ROOT_KEY: &str = "faction_data";

#[derive(Debug, Deserialize)]
struct RawFile {
    faction_data: RawFaction,
}

#[derive(Debug, Deserialize)]
struct RawFaction {
    name: String,
    #[serde(default)]
    difficulty: Vec<RawDifficulty>,
    consumption: RawConsumption,
    production: RawProduction,
}

#[derive(Debug, Deserialize)]
struct RawDifficulty {
    name: String,
    modifier: f64,
}

#[derive(Debug, Deserialize)]
struct RawConsumption {
    food: f64,
    water: f64,
}

#[derive(Debug, Deserialize)]
struct RawBeehive {
    modifier: f64,
}

#[derive(Debug, Deserialize)]
struct RawProduction {
    beehive: Option<RawBeehive>,
    #[serde(default)]
    crops: Vec<RawPlant>,
    #[serde(default)]
    trees: Vec<RawPlant>,
    #[serde(default)]
    water: Vec<RawBuilding>,
    #[serde(default)]
    food_processing: Vec<RawBuilding>,
    #[serde(default)]
    goods: Vec<RawBuilding>,
}

/// Crops and trees share one layout in the data files.
#[derive(Debug, Deserialize)]
struct RawPlant {
    name: String,
    growth_time: Option<f64>,
    #[serde(default)]
    harvest: Vec<RawHarvest>,
    log_output: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawHarvest {
    name: String,
    time: f64,
    #[serde(rename = "yield")]
    yield_amount: f64,
}

#[derive(Debug, Deserialize)]
struct RawBuilding {
    name: String,
    workers: Option<u32>,
    #[serde(default)]
    recipes: Vec<RawRecipe>,
}

#[derive(Debug, Deserialize)]
struct RawRecipe {
    name: String,
    production_time: f64,
    output_quantity: f64,
    #[serde(default)]
    inputs: Vec<RawInput>,
}

#[derive(Debug, Deserialize)]
struct RawInput {
    name: String,
    quantity: f64,
}

fn resolve<T>(field: &str, value: &str) -> Result<T>
where
    T: FromStr<Err = CatalogError>,
{
    value
        .parse()
        .with_context(|| format!("{}: unknown name '{}'", field, value))
}

fn positive(field: &str, value: f64) -> Result<f64> {
    if !value.is_finite() || value <= 0.0 {
        bail!("{} must be greater than zero, got {}", field, value);
    }
    Ok(value)
}

fn non_negative(field: &str, value: f64) -> Result<f64> {
    if !value.is_finite() || value < 0.0 {
        bail!("{} cannot be negative, got {}", field, value);
    }
    Ok(value)
}

/// Rejects the second occurrence of a name within one section.
fn check_unique<T>(seen: &mut HashSet<T>, field: &str, name: T) -> Result<()>
where
    T: Hash + Eq + std::fmt::Display,
{
    if seen.contains(&name) {
        bail!("{}: duplicate entry '{}'", field, name);
    }
    seen.insert(name);
    Ok(())
}

fn convert_harvest(field: &str, raw: &RawHarvest) -> Result<Harvest> {
    Ok(Harvest {
        name: resolve::<HarvestName>(&format!("{}.name", field), &raw.name)?,
        time_days: positive(&format!("{}.time", field), raw.time)?,
        yield_amount: non_negative(&format!("{}.yield", field), raw.yield_amount)?,
    })
}

fn convert_crop(index: usize, raw: &RawPlant) -> Result<Crop> {
    let field = format!("crops[{}]", index);
    let name = resolve::<CropName>(&format!("{}.name", field), &raw.name)?;
    let growth_time_days = raw
        .growth_time
        .map(|t| positive(&format!("{}.growth_time", field), t))
        .transpose()?;
    let Some(harvest) = raw.harvest.first() else {
        bail!("{} ({}): crop has no harvest", field, name);
    };
    Ok(Crop {
        name,
        growth_time_days,
        harvest: convert_harvest(&format!("{}.harvest", field), harvest)?,
    })
}

fn convert_tree(index: usize, raw: &RawPlant) -> Result<Tree> {
    let field = format!("trees[{}]", index);
    let name = resolve::<TreeName>(&format!("{}.name", field), &raw.name)?;
    let growth_time_days = raw
        .growth_time
        .map(|t| positive(&format!("{}.growth_time", field), t))
        .transpose()?;
    let log_output = non_negative(&format!("{}.log_output", field), raw.log_output.unwrap_or(0.0))?;
    let harvest = raw
        .harvest
        .first()
        .map(|h| convert_harvest(&format!("{}.harvest", field), h))
        .transpose()?;
    Ok(Tree {
        name,
        growth_time_days,
        log_output,
        harvest,
    })
}

fn convert_recipe(field: &str, raw: &RawRecipe) -> Result<Recipe> {
    let name = resolve::<Good>(&format!("{}.name", field), &raw.name)?;
    let mut seen = HashSet::new();
    let mut inputs = Vec::with_capacity(raw.inputs.len());
    for (i, input) in raw.inputs.iter().enumerate() {
        let input_field = format!("{}.inputs[{}]", field, i);
        let input_name = resolve::<Good>(&format!("{}.name", input_field), &input.name)?;
        check_unique(&mut seen, &input_field, input_name)?;
        inputs.push(RecipeInput {
            name: input_name,
            quantity: non_negative(&format!("{}.quantity", input_field), input.quantity)?,
        });
    }
    Ok(Recipe {
        name,
        production_time_hours: positive(&format!("{}.production_time", field), raw.production_time)?,
        output_quantity: non_negative(&format!("{}.output_quantity", field), raw.output_quantity)?,
        inputs,
    })
}

fn convert_buildings<N>(section: &str, raw: &[RawBuilding]) -> Result<Vec<ProductionBuilding>>
where
    N: FromStr<Err = CatalogError> + Into<BuildingName>,
{
    let mut seen = HashSet::new();
    let mut buildings = Vec::with_capacity(raw.len());
    for (i, building) in raw.iter().enumerate() {
        let field = format!("{}[{}]", section, i);
        let name: BuildingName = resolve::<N>(&format!("{}.name", field), &building.name)?.into();
        check_unique(&mut seen, &field, name)?;

        let mut recipe_names = HashSet::new();
        let mut recipes = Vec::with_capacity(building.recipes.len());
        for (j, recipe) in building.recipes.iter().enumerate() {
            let recipe_field = format!("{}.recipes[{}]", field, j);
            let recipe = convert_recipe(&recipe_field, recipe)?;
            check_unique(&mut recipe_names, &recipe_field, recipe.name)?;
            recipes.push(recipe);
        }

        buildings.push(ProductionBuilding {
            name,
            workers: building.workers,
            recipes,
        });
    }
    Ok(buildings)
}

fn convert(raw: RawFaction) -> Result<FactionCatalog> {
    if raw.name.trim().is_empty() {
        bail!("name: faction name is empty");
    }

    let mut seen_levels = HashSet::new();
    let mut difficulties = Vec::with_capacity(raw.difficulty.len());
    for (i, level) in raw.difficulty.iter().enumerate() {
        let field = format!("difficulty[{}]", i);
        let difficulty = resolve::<Difficulty>(&format!("{}.name", field), &level.name)?;
        check_unique(&mut seen_levels, &field, difficulty)?;
        difficulties.push(DifficultyLevel {
            difficulty,
            modifier: non_negative(&format!("{}.modifier", field), level.modifier)?,
        });
    }

    let consumption = vec![
        ConsumptionRate {
            kind: ConsumptionType::Food,
            per_capita_daily: non_negative("consumption.food", raw.consumption.food)?,
        },
        ConsumptionRate {
            kind: ConsumptionType::Water,
            per_capita_daily: non_negative("consumption.water", raw.consumption.water)?,
        },
    ];

    let production = raw.production;
    let beehive = production
        .beehive
        .map(|b| non_negative("production.beehive.modifier", b.modifier).map(|modifier| Beehive { modifier }))
        .transpose()?;

    let mut seen_crops = HashSet::new();
    let mut crops = Vec::with_capacity(production.crops.len());
    for (i, raw_crop) in production.crops.iter().enumerate() {
        let crop = convert_crop(i, raw_crop)?;
        check_unique(&mut seen_crops, &format!("crops[{}]", i), crop.name)?;
        crops.push(crop);
    }

    let mut seen_trees = HashSet::new();
    let mut trees = Vec::with_capacity(production.trees.len());
    for (i, raw_tree) in production.trees.iter().enumerate() {
        let tree = convert_tree(i, raw_tree)?;
        check_unique(&mut seen_trees, &format!("trees[{}]", i), tree.name)?;
        trees.push(tree);
    }

    Ok(FactionCatalog {
        name: raw.name.trim().to_string(),
        difficulties,
        consumption,
        beehive,
        crops,
        trees,
        water: convert_buildings::<WaterBuildingName>("water", &production.water)?,
        food_processing: convert_buildings::<FoodProcessingBuildingName>(
            "food_processing",
            &production.food_processing,
        )?,
        goods: convert_buildings::<GoodsBuildingName>("goods", &production.goods)?,
    })
}

/// Parse and validate a faction catalog from YAML text
pub fn parse_catalog(text: &str) -> Result<FactionCatalog> {
    let raw: RawFile = serde_yaml::from_str(text).context("Malformed faction data")?;
    convert(raw.faction_data)
}

/// Load and validate a faction catalog file
pub fn load_catalog_file(path: &Path) -> Result<FactionCatalog> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_catalog(&text).with_context(|| format!("Invalid faction data in {}", path.display()))
}

fn has_root_key(path: &Path) -> bool {
    let Ok(text) = fs::read_to_string(path) else {
        return false;
    };
    match serde_yaml::from_str::<serde_yaml::Value>(&text) {
        Ok(value) => value.get(ROOT_KEY).is_some(),
        Err(_) => false,
    }
}

/// Find all YAML files under `dir` that hold faction data
pub fn find_faction_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        bail!("{} is not a directory", dir.display());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        let is_yaml = path
            .extension()
            .is_some_and(|ext| ext == "yml" || ext == "yaml");
        if is_yaml && entry.file_type().is_file() {
            if has_root_key(path) {
                files.push(path.to_path_buf());
            } else {
                log::debug!("Skipping {}: no '{}' key", path.display(), ROOT_KEY);
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Import every faction file under `dir` into the store
pub fn import_directory(conn: &mut Connection, dir: &Path) -> Result<ImportStats> {
    let mut stats = ImportStats::default();

    log::info!("Scanning {} for faction data...", dir.display());
    let files = find_faction_files(dir)?;
    log::info!("Found {} faction data files", files.len());

    for path in &files {
        match load_catalog_file(path) {
            Ok(catalog) => {
                db::store_catalog(conn, &catalog)?;
                let buildings = catalog.buildings().count();
                log::info!(
                    "  Imported: {} ({} crops, {} trees, {} buildings)",
                    catalog.name,
                    catalog.crops.len(),
                    catalog.trees.len(),
                    buildings
                );
                stats.factions += 1;
                stats.crops += catalog.crops.len();
                stats.trees += catalog.trees.len();
                stats.buildings += buildings;
            }
            Err(e) => {
                log::warn!("  {:#}", e);
                stats.errors += 1;
            }
        }
    }

    Ok(stats)
}

#[derive(Debug, Default)]
pub struct ImportStats {
    pub factions: usize,
    pub crops: usize,
    pub trees: usize,
    pub buildings: usize,
    pub errors: usize,
}

impl std::fmt::Display for ImportStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Imported {} factions ({} crops, {} trees, {} buildings). Errors: {}",
            self.factions, self.crops, self.trees, self.buildings, self.errors
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::names::{FoodRecipeName, GoodsRecipeName};

    const MINIMAL: &str = r#"
faction_data:
  name: Folktails
  difficulty:
    - name: easy
      modifier: 0.75
    - name: normal
      modifier: 1.0
  consumption:
    food: 2.75
    water: 2.25
  production:
    beehive:
      modifier: 1.43
    crops:
      - name: Berry Bush
        growth_time: 12
        harvest:
          - name: Berries
            time: 12
            yield: 3
    trees:
      - name: Birch
        growth_time: 7
        log_output: 1
      - name: Chestnut Tree
        log_output: 4
        harvest:
          - name: Chestnuts
            time: 8
            yield: 3
    water:
      - name: Water Pump
        workers: 1
        recipes:
          - name: Water
            production_time: 2.0
            output_quantity: 1
    food_processing:
      - name: Grill
        workers: 1
        recipes:
          - name: Grilled Chestnuts
            production_time: 0.28
            output_quantity: 1
            inputs:
              - name: Chestnuts
                quantity: 1
    goods:
      - name: Lumber Mill
        workers: 1
        recipes:
          - name: Planks
            production_time: 1.3
            output_quantity: 1
            inputs:
              - name: Logs
                quantity: 1
"#;

    #[test]
    fn parses_complete_catalog() {
        let catalog = parse_catalog(MINIMAL).unwrap();
        assert_eq!(catalog.name, "Folktails");
        assert_eq!(catalog.difficulties.len(), 2);
        assert_eq!(catalog.difficulties[0].difficulty, Difficulty::Easy);
        assert_eq!(catalog.consumption[0].per_capita_daily, 2.75);
        assert_eq!(catalog.beehive, Some(Beehive { modifier: 1.43 }));
        assert_eq!(catalog.crops[0].harvest.name, HarvestName::Berries);
        assert_eq!(catalog.trees[0].harvest, None);
        assert_eq!(catalog.trees[1].growth_time_days, None);
        assert_eq!(catalog.water[0].workers, Some(1));
        assert!(catalog.water[0].recipes[0].inputs.is_empty());
        assert_eq!(
            catalog.food_processing[0].recipes[0].name,
            Good::from(FoodRecipeName::GrilledChestnuts)
        );
        assert_eq!(catalog.goods[0].recipes[0].name, Good::from(GoodsRecipeName::Planks));
        assert_eq!(catalog.goods[0].recipes[0].inputs[0].name, Good::from(HarvestName::Logs));
    }

    #[test]
    fn unknown_name_is_rejected_with_field() {
        let text = MINIMAL.replace("name: Berry Bush", "name: Banana Bush");
        let err = parse_catalog(&text).unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("crops[0].name"), "{}", message);
        assert!(message.contains("Banana Bush"), "{}", message);
    }

    #[test]
    fn non_positive_times_are_rejected() {
        let text = MINIMAL.replace("production_time: 1.3", "production_time: 0");
        let err = parse_catalog(&text).unwrap_err();
        assert!(err.to_string().contains("goods[0].recipes[0].production_time"));

        let text = MINIMAL.replace("time: 12", "time: -1");
        assert!(parse_catalog(&text).is_err());
    }

    #[test]
    fn negative_quantities_are_rejected() {
        let text = MINIMAL.replace("log_output: 4", "log_output: -4");
        let err = parse_catalog(&text).unwrap_err();
        assert!(err.to_string().contains("trees[1].log_output"));

        let text = MINIMAL.replace(
            "- name: Chestnuts\n                quantity: 1",
            "- name: Chestnuts\n                quantity: -1",
        );
        assert_ne!(text, MINIMAL);
        let err = parse_catalog(&text).unwrap_err();
        assert!(
            err.to_string().contains("food_processing[0].recipes[0].inputs[0].quantity"),
            "{}",
            err
        );

        let text = MINIMAL.replace("output_quantity: 1", "output_quantity: -1");
        let err = parse_catalog(&text).unwrap_err();
        assert!(
            err.to_string().contains("water[0].recipes[0].output_quantity"),
            "{}",
            err
        );
    }

    #[test]
    fn duplicate_entries_are_rejected() {
        let text = MINIMAL.replace("name: Chestnut Tree", "name: Birch");
        let err = parse_catalog(&text).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn missing_root_key_is_malformed() {
        let err = parse_catalog("name: Folktails\n").unwrap_err();
        assert!(err.to_string().contains("Malformed"));
    }

    #[test]
    fn discovers_only_faction_files() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("factions");
        fs::create_dir(&nested).unwrap();
        fs::write(nested.join("folktails.yml"), MINIMAL).unwrap();
        fs::write(dir.path().join("other.yaml"), "settings:\n  volume: 3\n").unwrap();
        fs::write(dir.path().join("notes.txt"), MINIMAL).unwrap();

        let files = find_faction_files(dir.path()).unwrap();
        assert_eq!(files, vec![nested.join("folktails.yml")]);
    }

    #[test]
    fn load_error_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.yml");
        fs::write(&path, MINIMAL.replace("food: 2.75", "food: -2.75")).unwrap();
        let err = load_catalog_file(&path).unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("broken.yml"), "{}", message);
        assert!(message.contains("consumption.food"), "{}", message);
    }

    #[test]
    fn import_directory_counts_good_and_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("folktails.yml"), MINIMAL).unwrap();
        fs::write(
            dir.path().join("broken.yml"),
            MINIMAL.replace("name: Folktails", "name: Broken").replace("name: Water Pump", "name: Wind Pump"),
        )
        .unwrap();

        let mut conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();
        let stats = import_directory(&mut conn, dir.path()).unwrap();
        assert_eq!(stats.factions, 1);
        assert_eq!(stats.errors, 1);
        assert_eq!(db::list_factions(&conn).unwrap(), vec!["Folktails".to_string()]);
    }
}
