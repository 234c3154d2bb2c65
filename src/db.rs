//! Database schema and operations

use std::str::FromStr;

use anyhow::{Context, Result, bail};
use rusqlite::{Connection, OptionalExtension, Transaction};

use crate::error::CatalogError;
use crate::models::{
    Beehive, ConsumptionRate, Crop, DifficultyLevel, FactionCatalog, Harvest, ProductionBuilding,
    Recipe, RecipeInput, Tree,
};
use crate::names::{BuildingName, FoodProcessingBuildingName, GoodsBuildingName, WaterBuildingName};

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS factions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE COLLATE NOCASE,
            beehive_modifier REAL
        );

        CREATE TABLE IF NOT EXISTS difficulties (
            faction_id INTEGER NOT NULL REFERENCES factions(id) ON DELETE CASCADE,
            position INTEGER NOT NULL,
            name TEXT NOT NULL,
            modifier REAL NOT NULL,
            PRIMARY KEY (faction_id, position)
        );

        CREATE TABLE IF NOT EXISTS consumption (
            faction_id INTEGER NOT NULL REFERENCES factions(id) ON DELETE CASCADE,
            position INTEGER NOT NULL,
            kind TEXT NOT NULL,
            per_capita_daily REAL NOT NULL,
            PRIMARY KEY (faction_id, position)
        );

        CREATE TABLE IF NOT EXISTS crops (
            faction_id INTEGER NOT NULL REFERENCES factions(id) ON DELETE CASCADE,
            position INTEGER NOT NULL,
            name TEXT NOT NULL,
            growth_time_days REAL,
            harvest_name TEXT NOT NULL,
            harvest_time_days REAL NOT NULL,
            harvest_yield REAL NOT NULL,
            PRIMARY KEY (faction_id, position)
        );

        -- Harvest columns are all NULL for trees that only yield logs
        CREATE TABLE IF NOT EXISTS trees (
            faction_id INTEGER NOT NULL REFERENCES factions(id) ON DELETE CASCADE,
            position INTEGER NOT NULL,
            name TEXT NOT NULL,
            growth_time_days REAL,
            log_output REAL NOT NULL,
            harvest_name TEXT,
            harvest_time_days REAL,
            harvest_yield REAL,
            PRIMARY KEY (faction_id, position)
        );

        CREATE TABLE IF NOT EXISTS buildings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            faction_id INTEGER NOT NULL REFERENCES factions(id) ON DELETE CASCADE,
            kind TEXT NOT NULL,
            position INTEGER NOT NULL,
            name TEXT NOT NULL,
            workers INTEGER
        );

        CREATE TABLE IF NOT EXISTS recipes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            building_id INTEGER NOT NULL REFERENCES buildings(id) ON DELETE CASCADE,
            position INTEGER NOT NULL,
            name TEXT NOT NULL,
            production_time_hours REAL NOT NULL,
            output_quantity REAL NOT NULL
        );

        CREATE TABLE IF NOT EXISTS recipe_inputs (
            recipe_id INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
            position INTEGER NOT NULL,
            name TEXT NOT NULL,
            quantity REAL NOT NULL,
            PRIMARY KEY (recipe_id, position)
        );

        CREATE INDEX IF NOT EXISTS idx_buildings_faction ON buildings(faction_id, kind, position);
        CREATE INDEX IF NOT EXISTS idx_recipes_building ON recipes(building_id, position);
        "#,
    )?;
    Ok(())
}

const WATER: &str = "water";
const FOOD_PROCESSING: &str = "food_processing";
const GOODS: &str = "goods";

fn section_of(name: BuildingName) -> &'static str {
    match name {
        BuildingName::Water(_) => WATER,
        BuildingName::FoodProcessing(_) => FOOD_PROCESSING,
        BuildingName::Goods(_) => GOODS,
    }
}

fn parse_stored<T: FromStr<Err = CatalogError>>(value: &str) -> Result<T> {
    value
        .parse()
        .with_context(|| format!("Stored name '{}' is not recognised", value))
}

fn parse_building(kind: &str, name: &str) -> Result<BuildingName> {
    Ok(match kind {
        WATER => parse_stored::<WaterBuildingName>(name)?.into(),
        FOOD_PROCESSING => parse_stored::<FoodProcessingBuildingName>(name)?.into(),
        GOODS => parse_stored::<GoodsBuildingName>(name)?.into(),
        other => bail!("Stored building '{}' has unknown kind '{}'", name, other),
    })
}

fn insert_buildings(tx: &Transaction, faction_id: i64, buildings: &[ProductionBuilding]) -> Result<()> {
    for (position, building) in buildings.iter().enumerate() {
        tx.execute(
            "INSERT INTO buildings (faction_id, kind, position, name, workers)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            (
                faction_id,
                section_of(building.name),
                position as i64,
                building.name.as_str(),
                building.workers,
            ),
        )?;
        let building_id = tx.last_insert_rowid();

        for (position, recipe) in building.recipes.iter().enumerate() {
            tx.execute(
                "INSERT INTO recipes (building_id, position, name, production_time_hours, output_quantity)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (
                    building_id,
                    position as i64,
                    recipe.name.as_str(),
                    recipe.production_time_hours,
                    recipe.output_quantity,
                ),
            )?;
            let recipe_id = tx.last_insert_rowid();

            for (position, input) in recipe.inputs.iter().enumerate() {
                tx.execute(
                    "INSERT INTO recipe_inputs (recipe_id, position, name, quantity)
                     VALUES (?1, ?2, ?3, ?4)",
                    (recipe_id, position as i64, input.name.as_str(), input.quantity),
                )?;
            }
        }
    }
    Ok(())
}

/// Store a catalog, replacing any existing catalog of the same faction
pub fn store_catalog(conn: &mut Connection, catalog: &FactionCatalog) -> Result<()> {
    let tx = conn.transaction()?;

    tx.execute("DELETE FROM factions WHERE name = ?1", [&catalog.name])?;
    tx.execute(
        "INSERT INTO factions (name, beehive_modifier) VALUES (?1, ?2)",
        (&catalog.name, catalog.beehive.as_ref().map(|b| b.modifier)),
    )?;
    let faction_id = tx.last_insert_rowid();

    for (position, level) in catalog.difficulties.iter().enumerate() {
        tx.execute(
            "INSERT INTO difficulties (faction_id, position, name, modifier) VALUES (?1, ?2, ?3, ?4)",
            (faction_id, position as i64, level.difficulty.as_str(), level.modifier),
        )?;
    }

    for (position, rate) in catalog.consumption.iter().enumerate() {
        tx.execute(
            "INSERT INTO consumption (faction_id, position, kind, per_capita_daily) VALUES (?1, ?2, ?3, ?4)",
            (faction_id, position as i64, rate.kind.as_str(), rate.per_capita_daily),
        )?;
    }

    for (position, crop) in catalog.crops.iter().enumerate() {
        tx.execute(
            "INSERT INTO crops (faction_id, position, name, growth_time_days, harvest_name, harvest_time_days, harvest_yield)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            (
                faction_id,
                position as i64,
                crop.name.as_str(),
                crop.growth_time_days,
                crop.harvest.name.as_str(),
                crop.harvest.time_days,
                crop.harvest.yield_amount,
            ),
        )?;
    }

    for (position, tree) in catalog.trees.iter().enumerate() {
        let harvest = tree.harvest.as_ref();
        tx.execute(
            "INSERT INTO trees (faction_id, position, name, growth_time_days, log_output, harvest_name, harvest_time_days, harvest_yield)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            (
                faction_id,
                position as i64,
                tree.name.as_str(),
                tree.growth_time_days,
                tree.log_output,
                harvest.map(|h| h.name.as_str()),
                harvest.map(|h| h.time_days),
                harvest.map(|h| h.yield_amount),
            ),
        )?;
    }

    insert_buildings(&tx, faction_id, &catalog.water)?;
    insert_buildings(&tx, faction_id, &catalog.food_processing)?;
    insert_buildings(&tx, faction_id, &catalog.goods)?;

    tx.commit()?;
    log::debug!("Stored catalog for {}", catalog.name);
    Ok(())
}

fn load_buildings(conn: &Connection, faction_id: i64, kind: &str) -> Result<Vec<ProductionBuilding>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, workers FROM buildings
         WHERE faction_id = ?1 AND kind = ?2
         ORDER BY position",
    )?;
    let rows = stmt.query_map((faction_id, kind), |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, Option<u32>>(2)?,
        ))
    })?;

    let mut recipe_stmt = conn.prepare(
        "SELECT id, name, production_time_hours, output_quantity FROM recipes
         WHERE building_id = ?1
         ORDER BY position",
    )?;
    let mut input_stmt = conn.prepare(
        "SELECT name, quantity FROM recipe_inputs
         WHERE recipe_id = ?1
         ORDER BY position",
    )?;

    let mut results = Vec::new();
    for row in rows {
        let (building_id, name, workers) = row?;

        let recipe_rows = recipe_stmt.query_map([building_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, f64>(3)?,
            ))
        })?;

        let mut recipes = Vec::new();
        for recipe_row in recipe_rows {
            let (recipe_id, recipe_name, production_time_hours, output_quantity) = recipe_row?;

            let input_rows = input_stmt.query_map([recipe_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
            })?;
            let mut inputs = Vec::new();
            for input_row in input_rows {
                let (input_name, quantity) = input_row?;
                inputs.push(RecipeInput {
                    name: parse_stored(&input_name)?,
                    quantity,
                });
            }

            recipes.push(Recipe {
                name: parse_stored(&recipe_name)?,
                production_time_hours,
                output_quantity,
                inputs,
            });
        }

        results.push(ProductionBuilding {
            name: parse_building(kind, &name)?,
            workers,
            recipes,
        });
    }
    Ok(results)
}

/// Load a stored catalog by faction name (case-insensitive)
pub fn load_catalog(conn: &Connection, faction: &str) -> Result<FactionCatalog> {
    let found = conn
        .query_row(
            "SELECT id, name, beehive_modifier FROM factions WHERE name = ?1",
            [faction],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<f64>>(2)?,
                ))
            },
        )
        .optional()?;
    let Some((faction_id, name, beehive_modifier)) = found else {
        bail!(
            "Faction '{}' not found in database. Run 'import' or 'load-sample' first.",
            faction
        );
    };

    let mut stmt = conn.prepare(
        "SELECT name, modifier FROM difficulties WHERE faction_id = ?1 ORDER BY position",
    )?;
    let rows = stmt.query_map([faction_id], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
    })?;
    let mut difficulties = Vec::new();
    for row in rows {
        let (level, modifier) = row?;
        difficulties.push(DifficultyLevel {
            difficulty: parse_stored(&level)?,
            modifier,
        });
    }

    let mut stmt = conn.prepare(
        "SELECT kind, per_capita_daily FROM consumption WHERE faction_id = ?1 ORDER BY position",
    )?;
    let rows = stmt.query_map([faction_id], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
    })?;
    let mut consumption = Vec::new();
    for row in rows {
        let (kind, per_capita_daily) = row?;
        consumption.push(ConsumptionRate {
            kind: parse_stored(&kind)?,
            per_capita_daily,
        });
    }

    let mut stmt = conn.prepare(
        "SELECT name, growth_time_days, harvest_name, harvest_time_days, harvest_yield
         FROM crops WHERE faction_id = ?1 ORDER BY position",
    )?;
    let rows = stmt.query_map([faction_id], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, Option<f64>>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, f64>(3)?,
            row.get::<_, f64>(4)?,
        ))
    })?;
    let mut crops = Vec::new();
    for row in rows {
        let (crop, growth_time_days, harvest, time_days, yield_amount) = row?;
        crops.push(Crop {
            name: parse_stored(&crop)?,
            growth_time_days,
            harvest: Harvest {
                name: parse_stored(&harvest)?,
                time_days,
                yield_amount,
            },
        });
    }

    let mut stmt = conn.prepare(
        "SELECT name, growth_time_days, log_output, harvest_name, harvest_time_days, harvest_yield
         FROM trees WHERE faction_id = ?1 ORDER BY position",
    )?;
    let rows = stmt.query_map([faction_id], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, Option<f64>>(1)?,
            row.get::<_, f64>(2)?,
            row.get::<_, Option<String>>(3)?,
            row.get::<_, Option<f64>>(4)?,
            row.get::<_, Option<f64>>(5)?,
        ))
    })?;
    let mut trees = Vec::new();
    for row in rows {
        let (tree, growth_time_days, log_output, harvest, time_days, yield_amount) = row?;
        let harvest = match (harvest, time_days, yield_amount) {
            (Some(harvest), Some(time_days), Some(yield_amount)) => Some(Harvest {
                name: parse_stored(&harvest)?,
                time_days,
                yield_amount,
            }),
            (None, None, None) => None,
            _ => bail!("Stored tree '{}' has an incomplete harvest", tree),
        };
        trees.push(Tree {
            name: parse_stored(&tree)?,
            growth_time_days,
            log_output,
            harvest,
        });
    }

    Ok(FactionCatalog {
        name,
        difficulties,
        consumption,
        beehive: beehive_modifier.map(|modifier| Beehive { modifier }),
        crops,
        trees,
        water: load_buildings(conn, faction_id, WATER)?,
        food_processing: load_buildings(conn, faction_id, FOOD_PROCESSING)?,
        goods: load_buildings(conn, faction_id, GOODS)?,
    })
}

/// List all stored faction names
pub fn list_factions(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM factions ORDER BY name")?;

    let rows = stmt.query_map([], |row| row.get(0))?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

/// Clear all stored catalogs (for re-import)
pub fn clear_catalogs(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        DELETE FROM recipe_inputs;
        DELETE FROM recipes;
        DELETE FROM buildings;
        DELETE FROM trees;
        DELETE FROM crops;
        DELETE FROM consumption;
        DELETE FROM difficulties;
        DELETE FROM factions;
        "#,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::sample_catalog;

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn stored_catalog_loads_back_identical() {
        let mut conn = memory_db();
        let catalog = sample_catalog();
        store_catalog(&mut conn, &catalog).unwrap();
        assert_eq!(load_catalog(&conn, "Folktails").unwrap(), catalog);
        assert_eq!(load_catalog(&conn, "folktails").unwrap().name, "Folktails");
    }

    #[test]
    fn storing_again_replaces_catalog() {
        let mut conn = memory_db();
        let mut catalog = sample_catalog();
        store_catalog(&mut conn, &catalog).unwrap();

        catalog.crops.truncate(1);
        catalog.goods.clear();
        store_catalog(&mut conn, &catalog).unwrap();

        let loaded = load_catalog(&conn, "Folktails").unwrap();
        assert_eq!(loaded.crops.len(), 1);
        assert!(loaded.goods.is_empty());

        let orphans: i64 = conn
            .query_row("SELECT COUNT(*) FROM recipe_inputs", [], |row| row.get(0))
            .unwrap();
        // Only the grill and fermenter inputs remain
        assert_eq!(orphans, 3);
    }

    #[test]
    fn unknown_faction_is_an_error() {
        let conn = memory_db();
        let err = load_catalog(&conn, "Emberpelts").unwrap_err();
        assert!(err.to_string().contains("Emberpelts"));
    }

    #[test]
    fn list_and_clear() {
        let mut conn = memory_db();
        let mut other = sample_catalog();
        other.name = "Iron Teeth".to_string();
        store_catalog(&mut conn, &sample_catalog()).unwrap();
        store_catalog(&mut conn, &other).unwrap();
        assert_eq!(list_factions(&conn).unwrap(), vec!["Folktails", "Iron Teeth"]);

        clear_catalogs(&conn).unwrap();
        assert!(list_factions(&conn).unwrap().is_empty());
    }

    #[test]
    fn catalog_survives_reopening_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.db");
        {
            let mut conn = Connection::open(&path).unwrap();
            init_schema(&conn).unwrap();
            store_catalog(&mut conn, &sample_catalog()).unwrap();
        }
        let conn = Connection::open(&path).unwrap();
        init_schema(&conn).unwrap();
        assert_eq!(load_catalog(&conn, "Folktails").unwrap(), sample_catalog());
    }
}
