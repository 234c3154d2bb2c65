//! Read-only lookups over a faction catalog
//!
//! Every query resolves an entry by its enumerated name with a linear scan.
//! Catalogs hold a few dozen entries per section, so nothing is indexed.
//! Scalar accessors resolve their entry first and hand back any lookup
//! failure unchanged.

use crate::error::{CatalogError, Result};
use crate::models::{Crop, FactionCatalog, Harvest, ProductionBuilding, Recipe, RecipeInput, Tree};
use crate::names::{BuildingName, ConsumptionType, CropName, Difficulty, Good, HarvestName, TreeName};

/// A catalog entry able to supply a good.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Producer {
    CropHarvest(CropName),
    TreeHarvest(TreeName),
    TreeLogs(TreeName),
    Building(BuildingName),
}

#[derive(Debug, Clone)]
pub struct CatalogRepository {
    catalog: FactionCatalog,
}

impl CatalogRepository {
    pub fn new(catalog: FactionCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &FactionCatalog {
        &self.catalog
    }

    pub fn faction_name(&self) -> &str {
        &self.catalog.name
    }

    pub fn difficulty_modifier(&self, difficulty: Difficulty) -> Result<f64> {
        self.catalog
            .difficulties
            .iter()
            .find(|level| level.difficulty == difficulty)
            .map(|level| level.modifier)
            .ok_or_else(|| CatalogError::not_found(Difficulty::KIND, difficulty.as_str()))
    }

    pub fn consumption(&self, kind: ConsumptionType) -> Result<f64> {
        self.catalog
            .consumption
            .iter()
            .find(|rate| rate.kind == kind)
            .map(|rate| rate.per_capita_daily)
            .ok_or_else(|| CatalogError::not_found(ConsumptionType::KIND, kind.as_str()))
    }

    pub fn beehive_modifier(&self) -> Result<f64> {
        self.catalog
            .beehive
            .as_ref()
            .map(|beehive| beehive.modifier)
            .ok_or_else(|| {
                CatalogError::Unsupported(format!(
                    "faction '{}' does not have access to beehives",
                    self.catalog.name
                ))
            })
    }

    // --- Crops ---

    pub fn find_crop(&self, name: CropName) -> Result<&Crop> {
        self.catalog
            .crops
            .iter()
            .find(|crop| crop.name == name)
            .ok_or_else(|| CatalogError::not_found(CropName::KIND, name.as_str()))
    }

    /// `None` when the crop needs no initial growth.
    pub fn crop_growth_time(&self, name: CropName) -> Result<Option<f64>> {
        Ok(self.find_crop(name)?.growth_time_days)
    }

    pub fn crop_harvest_name(&self, name: CropName) -> Result<HarvestName> {
        Ok(self.find_crop(name)?.harvest.name)
    }

    pub fn crop_harvest_time(&self, name: CropName) -> Result<f64> {
        Ok(self.find_crop(name)?.harvest.time_days)
    }

    pub fn crop_harvest_yield(&self, name: CropName) -> Result<f64> {
        Ok(self.find_crop(name)?.harvest.yield_amount)
    }

    // --- Trees ---

    pub fn find_tree(&self, name: TreeName) -> Result<&Tree> {
        self.catalog
            .trees
            .iter()
            .find(|tree| tree.name == name)
            .ok_or_else(|| CatalogError::not_found(TreeName::KIND, name.as_str()))
    }

    pub fn tree_growth_time(&self, name: TreeName) -> Result<f64> {
        self.find_tree(name)?.growth_time_days.ok_or_else(|| {
            CatalogError::Unsupported(format!("tree '{}' has no growth time", name))
        })
    }

    pub fn tree_log_output(&self, name: TreeName) -> Result<f64> {
        Ok(self.find_tree(name)?.log_output)
    }

    fn tree_harvest(&self, name: TreeName) -> Result<&Harvest> {
        self.find_tree(name)?.harvest.as_ref().ok_or_else(|| {
            CatalogError::Unsupported(format!(
                "tree '{}' does not produce a harvestable item",
                name
            ))
        })
    }

    pub fn tree_harvest_name(&self, name: TreeName) -> Result<HarvestName> {
        Ok(self.tree_harvest(name)?.name)
    }

    pub fn tree_harvest_time(&self, name: TreeName) -> Result<f64> {
        Ok(self.tree_harvest(name)?.time_days)
    }

    pub fn tree_harvest_yield(&self, name: TreeName) -> Result<f64> {
        Ok(self.tree_harvest(name)?.yield_amount)
    }

    // --- Buildings and recipes ---

    pub fn find_building(&self, name: BuildingName) -> Result<&ProductionBuilding> {
        let section = match name {
            BuildingName::Water(_) => &self.catalog.water,
            BuildingName::FoodProcessing(_) => &self.catalog.food_processing,
            BuildingName::Goods(_) => &self.catalog.goods,
        };
        section
            .iter()
            .find(|building| building.name == name)
            .ok_or_else(|| CatalogError::not_found(name.kind(), name.as_str()))
    }

    /// Declared worker capacity, if the building is staffed at all.
    pub fn workers(&self, building: BuildingName) -> Result<Option<u32>> {
        Ok(self.find_building(building)?.workers)
    }

    pub fn recipe_count(&self, building: BuildingName) -> Result<usize> {
        Ok(self.find_building(building)?.recipes.len())
    }

    pub fn recipe_index(&self, building: BuildingName, recipe: Good) -> Result<usize> {
        self.find_building(building)?
            .recipes
            .iter()
            .position(|r| r.name == recipe)
            .ok_or_else(|| {
                CatalogError::not_found("recipe", format!("{} in {}", recipe, building))
            })
    }

    pub fn recipe(&self, building: BuildingName, index: usize) -> Result<&Recipe> {
        self.find_building(building)?
            .recipes
            .get(index)
            .ok_or_else(|| CatalogError::not_found("recipe", format!("#{} in {}", index, building)))
    }

    pub fn find_recipe(&self, building: BuildingName, recipe: Good) -> Result<&Recipe> {
        let index = self.recipe_index(building, recipe)?;
        self.recipe(building, index)
    }

    /// Inputs of a recipe; empty for raw extraction.
    pub fn recipe_inputs(&self, building: BuildingName, recipe: Good) -> Result<&[RecipeInput]> {
        Ok(&self.find_recipe(building, recipe)?.inputs)
    }

    pub fn input_index(&self, building: BuildingName, recipe: Good, input: Good) -> Result<usize> {
        let inputs = self.recipe_inputs(building, recipe)?;
        if inputs.is_empty() {
            return Err(CatalogError::NoInputs {
                building: building.to_string(),
                recipe: recipe.to_string(),
            });
        }
        inputs
            .iter()
            .position(|i| i.name == input)
            .ok_or_else(|| {
                CatalogError::not_found(
                    "recipe input",
                    format!("{} for {} in {}", input, recipe, building),
                )
            })
    }

    pub fn production_time(&self, building: BuildingName, recipe: Good) -> Result<f64> {
        Ok(self.find_recipe(building, recipe)?.production_time_hours)
    }

    pub fn output_quantity(&self, building: BuildingName, recipe: Good) -> Result<f64> {
        Ok(self.find_recipe(building, recipe)?.output_quantity)
    }

    pub fn input_quantity(&self, building: BuildingName, recipe: Good, input: Good) -> Result<f64> {
        let index = self.input_index(building, recipe, input)?;
        Ok(self.find_recipe(building, recipe)?.inputs[index].quantity)
    }

    /// First catalog entry that yields `good`: crops, then tree harvests,
    /// then tree logs, then building recipes.
    pub fn producer_of(&self, good: Good) -> Option<Producer> {
        if let Good::Harvest(harvest) = good {
            if let Some(crop) = self.catalog.crops.iter().find(|c| c.harvest.name == harvest) {
                return Some(Producer::CropHarvest(crop.name));
            }
            if let Some(tree) = self
                .catalog
                .trees
                .iter()
                .find(|t| t.harvest.as_ref().is_some_and(|h| h.name == harvest))
            {
                return Some(Producer::TreeHarvest(tree.name));
            }
            if harvest == HarvestName::Logs {
                if let Some(tree) = self
                    .catalog
                    .trees
                    .iter()
                    .find(|t| t.growth_time_days.is_some() && t.log_output > 0.0)
                {
                    return Some(Producer::TreeLogs(tree.name));
                }
            }
        }

        self.catalog
            .buildings()
            .find(|b| b.recipes.iter().any(|r| r.name == good))
            .map(|b| Producer::Building(b.name))
    }
}
