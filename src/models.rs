//! Data models for faction production catalogs

use crate::names::{BuildingName, ConsumptionType, CropName, Difficulty, Good, HarvestName, TreeName};

#[derive(Debug, Clone, PartialEq)]
pub struct DifficultyLevel {
    pub difficulty: Difficulty,
    pub modifier: f64, // Multiplies base consumption
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConsumptionRate {
    pub kind: ConsumptionType,
    pub per_capita_daily: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Beehive {
    pub modifier: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Harvest {
    pub name: HarvestName,
    pub time_days: f64,
    pub yield_amount: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Crop {
    pub name: CropName,
    pub growth_time_days: Option<f64>,
    pub harvest: Harvest,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    pub name: TreeName,
    pub growth_time_days: Option<f64>, // None = already mature when planted
    pub log_output: f64,
    pub harvest: Option<Harvest>, // None = only yields logs
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecipeInput {
    pub name: Good,
    pub quantity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    pub name: Good,
    pub production_time_hours: f64,
    pub output_quantity: f64,
    pub inputs: Vec<RecipeInput>, // Empty for raw extraction
}

/// Shared shape of water, food processing and goods buildings.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductionBuilding {
    pub name: BuildingName,
    pub workers: Option<u32>,
    pub recipes: Vec<Recipe>,
}

/// One faction's complete, validated production data.
#[derive(Debug, Clone, PartialEq)]
pub struct FactionCatalog {
    pub name: String,
    pub difficulties: Vec<DifficultyLevel>,
    pub consumption: Vec<ConsumptionRate>,
    pub beehive: Option<Beehive>,
    pub crops: Vec<Crop>,
    pub trees: Vec<Tree>,
    pub water: Vec<ProductionBuilding>,
    pub food_processing: Vec<ProductionBuilding>,
    pub goods: Vec<ProductionBuilding>,
}

impl FactionCatalog {
    /// Every building regardless of section, in catalog order.
    pub fn buildings(&self) -> impl Iterator<Item = &ProductionBuilding> {
        self.water
            .iter()
            .chain(self.food_processing.iter())
            .chain(self.goods.iter())
    }
}

/// Result of a production chain expansion
#[derive(Debug, Clone, PartialEq)]
pub struct ProductionNode {
    pub good: Good,
    pub rate_per_day: f64,
    pub source: ProductionSource,
    pub inputs: Vec<InputRequirement>,
}

/// What satisfies a node of the chain.
#[derive(Debug, Clone, PartialEq)]
pub enum ProductionSource {
    Crop { name: CropName, tiles: u64 },
    Tree { name: TreeName, tiles: u64 },
    Building { name: BuildingName, recipe: Good, count: u64 },
    Raw, // Nothing in the catalog produces it
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputRequirement {
    pub good: Good,
    pub rate_per_day: f64,
    pub upstream: Box<ProductionNode>,
}
