//! Production requirement calculator
//!
//! Converts between a target daily output and the number of tiles or
//! buildings that sustain it, and from a building count back to the daily
//! demand for each recipe input. Whole things (tiles, buildings, food units)
//! are rounded up; daily input flows are returned unrounded.

use std::collections::HashMap;

use crate::catalog::{CatalogRepository, Producer};
use crate::error::{CatalogError, Result};
use crate::models::{InputRequirement, ProductionNode, ProductionSource};
use crate::names::{BuildingName, ConsumptionType, CropName, Difficulty, Good, TreeName};
use crate::rules::{FactionRules, WorkerScaling};

pub const HOURS_PER_DAY: f64 = 24.0;

/// Chains deeper than this point to a cycle in the catalog.
const MAX_DEPTH: usize = 20;

fn reject_negative(value: f64, what: &str) -> Result<()> {
    if !value.is_finite() {
        return Err(CatalogError::invalid(format!("{} must be a finite number, got {}", what, value)));
    }
    if value < 0.0 {
        return Err(CatalogError::invalid(format!("{} cannot be negative", what)));
    }
    Ok(())
}

fn reject_negative_workers(workers: Option<i64>) -> Result<()> {
    match workers {
        Some(w) if w < 0 => Err(CatalogError::invalid("worker count cannot be negative")),
        _ => Ok(()),
    }
}

/// Smallest whole count whose combined `rate` covers `amount`.
fn units_needed(amount: f64, rate: f64, what: &str) -> Result<u64> {
    if amount == 0.0 {
        return Ok(0);
    }
    if rate <= 0.0 {
        return Err(CatalogError::invalid(format!(
            "{} produces nothing, cannot reach {}",
            what, amount
        )));
    }
    let units = (amount / rate).ceil();
    if !units.is_finite() || units >= u64::MAX as f64 {
        return Err(CatalogError::invalid(format!(
            "amount {} is too large to size with {}",
            amount, what
        )));
    }
    Ok(units as u64)
}

pub struct Calculator<'a> {
    repo: &'a CatalogRepository,
    rules: FactionRules,
}

impl<'a> Calculator<'a> {
    pub fn new(repo: &'a CatalogRepository, rules: FactionRules) -> Self {
        Self { repo, rules }
    }

    /// Calculator using the built-in rules for the catalog's faction.
    pub fn for_faction(repo: &'a CatalogRepository) -> Self {
        Self::new(repo, FactionRules::for_faction(repo.faction_name()))
    }

    // --- Consumption ---

    pub fn daily_consumption(
        &self,
        population: i64,
        difficulty: Difficulty,
        kind: ConsumptionType,
    ) -> Result<f64> {
        if population < 0 {
            return Err(CatalogError::invalid("population cannot be negative"));
        }
        let base = self.repo.consumption(kind)?;
        let modifier = self.repo.difficulty_modifier(difficulty)?;
        Ok(population as f64 * base * modifier)
    }

    pub fn daily_food_consumption(&self, population: i64, difficulty: Difficulty) -> Result<f64> {
        self.daily_consumption(population, difficulty, ConsumptionType::Food)
    }

    pub fn daily_water_consumption(&self, population: i64, difficulty: Difficulty) -> Result<f64> {
        self.daily_consumption(population, difficulty, ConsumptionType::Water)
    }

    /// Whole food units per type when the diet is split evenly.
    pub fn food_per_type(
        &self,
        population: i64,
        food_type_count: i64,
        difficulty: Difficulty,
    ) -> Result<u64> {
        if population < 0 {
            return Err(CatalogError::invalid("population cannot be negative"));
        }
        if food_type_count <= 0 {
            return Err(CatalogError::invalid("food type count must be positive"));
        }
        let total = self.daily_food_consumption(population, difficulty)?;
        Ok((total / food_type_count as f64).ceil() as u64)
    }

    pub fn log_per_type(&self, total_logs: f64, tree_type_count: i64) -> Result<f64> {
        reject_negative(total_logs, "total log amount")?;
        if tree_type_count <= 0 {
            return Err(CatalogError::invalid("tree type count must be positive"));
        }
        Ok(total_logs / tree_type_count as f64)
    }

    // --- Tiles ---

    /// Daily harvest of one crop tile. The beehive bonus only applies to
    /// crops the faction rules mark as pollinated.
    pub fn crop_rate_per_tile(&self, crop: CropName, use_beehive: bool) -> Result<f64> {
        let time = self.repo.crop_harvest_time(crop)?;
        let harvest_yield = self.repo.crop_harvest_yield(crop)?;
        let mut rate = harvest_yield / time;
        if use_beehive && self.rules.is_beehive_eligible(crop) {
            rate *= self.repo.beehive_modifier()?;
        }
        Ok(rate)
    }

    pub fn crop_tiles_needed(&self, crop: CropName, amount: f64, use_beehive: bool) -> Result<u64> {
        reject_negative(amount, "crop amount")?;
        let rate = self.crop_rate_per_tile(crop, use_beehive)?;
        units_needed(amount, rate, crop.as_str())
    }

    pub fn tree_log_rate_per_tile(&self, tree: TreeName) -> Result<f64> {
        let growth = self.repo.tree_growth_time(tree)?;
        Ok(self.repo.tree_log_output(tree)? / growth)
    }

    pub fn tree_log_tiles_needed(&self, tree: TreeName, amount: f64) -> Result<u64> {
        reject_negative(amount, "log amount")?;
        let rate = self.tree_log_rate_per_tile(tree)?;
        units_needed(amount, rate, tree.as_str())
    }

    pub fn tree_harvest_rate_per_tile(&self, tree: TreeName) -> Result<f64> {
        let time = self.repo.tree_harvest_time(tree)?;
        Ok(self.repo.tree_harvest_yield(tree)? / time)
    }

    pub fn tree_harvest_tiles_needed(&self, tree: TreeName, amount: f64) -> Result<u64> {
        reject_negative(amount, "harvest amount")?;
        let rate = self.tree_harvest_rate_per_tile(tree)?;
        units_needed(amount, rate, tree.as_str())
    }

    // --- Buildings ---

    pub fn cycles_per_day(&self, building: BuildingName, recipe: Good) -> Result<f64> {
        Ok(HOURS_PER_DAY / self.repo.production_time(building, recipe)?)
    }

    /// Output multiplier for `workers` under the building's scaling policy.
    /// `None` means fully staffed.
    fn worker_factor(&self, building: BuildingName, workers: Option<i64>) -> Result<f64> {
        reject_negative_workers(workers)?;
        let capacity = self.repo.workers(building)?;

        if let Some(requested) = workers {
            let max = i64::from(capacity.unwrap_or(0));
            if requested > max {
                return Err(CatalogError::invalid(format!(
                    "{} workers requested, but {} has a capacity of {}",
                    requested, building, max
                )));
            }
        }

        match self.rules.scaling(building) {
            WorkerScaling::Fixed => Ok(1.0),
            WorkerScaling::WorkerLinear => {
                let assigned = workers.unwrap_or_else(|| i64::from(capacity.unwrap_or(1)));
                Ok(assigned as f64)
            }
            WorkerScaling::CapacityRatio => match capacity {
                Some(max) if max > 0 => {
                    let assigned = workers.unwrap_or(i64::from(max));
                    Ok(assigned as f64 / f64::from(max))
                }
                _ => Err(CatalogError::Unsupported(format!(
                    "{} has no worker capacity to derate against",
                    building
                ))),
            },
        }
    }

    pub fn daily_output_per_building(
        &self,
        building: BuildingName,
        recipe: Good,
        workers: Option<i64>,
    ) -> Result<f64> {
        reject_negative_workers(workers)?;
        let cycles = self.cycles_per_day(building, recipe)?;
        let output = self.repo.output_quantity(building, recipe)?;
        Ok(output * cycles * self.worker_factor(building, workers)?)
    }

    pub fn buildings_needed(
        &self,
        building: BuildingName,
        recipe: Good,
        amount: f64,
        workers: Option<i64>,
    ) -> Result<u64> {
        reject_negative(amount, &format!("{} amount", recipe))?;
        reject_negative_workers(workers)?;
        let rate = self.daily_output_per_building(building, recipe, workers)?;
        units_needed(amount, rate, building.as_str())
    }

    pub fn daily_input_per_building(
        &self,
        building: BuildingName,
        recipe: Good,
        input: Good,
        workers: Option<i64>,
    ) -> Result<f64> {
        reject_negative_workers(workers)?;
        let quantity = self.repo.input_quantity(building, recipe, input)?;
        let cycles = self.cycles_per_day(building, recipe)?;
        Ok(quantity * cycles * self.worker_factor(building, workers)?)
    }

    /// Daily flow of `input` consumed by `count` buildings running `recipe`.
    pub fn daily_input_demand(
        &self,
        building: BuildingName,
        recipe: Good,
        input: Good,
        count: i64,
        workers: Option<i64>,
    ) -> Result<f64> {
        if count < 0 {
            return Err(CatalogError::invalid(format!("{} count cannot be negative", building)));
        }
        reject_negative_workers(workers)?;
        let per_building = self.daily_input_per_building(building, recipe, input, workers)?;
        Ok(count as f64 * per_building)
    }

    // --- Production chains ---

    /// Expand the full chain needed to supply `rate_per_day` of `good`.
    ///
    /// Each node is sized from its catalog producer, and the inputs of a
    /// building node are sized from the whole number of buildings placed.
    pub fn plan(&self, good: Good, rate_per_day: f64, use_beehive: bool) -> Result<ProductionNode> {
        reject_negative(rate_per_day, &format!("{} amount", good))?;
        self.plan_recursive(good, rate_per_day, use_beehive, 0)
    }

    fn plan_recursive(
        &self,
        good: Good,
        rate: f64,
        use_beehive: bool,
        depth: usize,
    ) -> Result<ProductionNode> {
        if depth > MAX_DEPTH {
            return Err(CatalogError::Unsupported(format!(
                "chain for {} is deeper than {} levels, the catalog may contain a cycle",
                good, MAX_DEPTH
            )));
        }

        let Some(producer) = self.repo.producer_of(good) else {
            log::debug!("{} has no producer, treating as raw input", good);
            return Ok(ProductionNode {
                good,
                rate_per_day: rate,
                source: ProductionSource::Raw,
                inputs: Vec::new(),
            });
        };

        let (source, inputs) = match producer {
            Producer::CropHarvest(name) => {
                let tiles = self.crop_tiles_needed(name, rate, use_beehive)?;
                (ProductionSource::Crop { name, tiles }, Vec::new())
            }
            Producer::TreeHarvest(name) => {
                let tiles = self.tree_harvest_tiles_needed(name, rate)?;
                (ProductionSource::Tree { name, tiles }, Vec::new())
            }
            Producer::TreeLogs(name) => {
                let tiles = self.tree_log_tiles_needed(name, rate)?;
                (ProductionSource::Tree { name, tiles }, Vec::new())
            }
            Producer::Building(name) => {
                let count = self.buildings_needed(name, good, rate, None)?;
                let placed = i64::try_from(count).map_err(|_| {
                    CatalogError::invalid(format!("{} of {} needs too many {}", rate, good, name))
                })?;
                let mut requirements = Vec::new();
                for input in self.repo.recipe_inputs(name, good)? {
                    let demand =
                        self.daily_input_demand(name, good, input.name, placed, None)?;
                    let upstream = self.plan_recursive(input.name, demand, use_beehive, depth + 1)?;
                    requirements.push(InputRequirement {
                        good: input.name,
                        rate_per_day: demand,
                        upstream: Box::new(upstream),
                    });
                }
                (
                    ProductionSource::Building {
                        name,
                        recipe: good,
                        count,
                    },
                    requirements,
                )
            }
        };

        Ok(ProductionNode {
            good,
            rate_per_day: rate,
            source,
            inputs,
        })
    }
}

/// Format a production chain as an indented tree
pub fn format_production_chain(node: &ProductionNode, indent: usize) -> String {
    let mut output = String::new();
    let prefix = "  ".repeat(indent);

    match &node.source {
        ProductionSource::Raw => {
            output.push_str(&format!(
                "{}-> {} @ {:.2}/day (raw input)\n",
                prefix, node.good, node.rate_per_day
            ));
        }
        ProductionSource::Crop { name, tiles } => {
            output.push_str(&format!(
                "{}{} tiles of {} -> {} @ {:.2}/day\n",
                prefix, tiles, name, node.good, node.rate_per_day
            ));
        }
        ProductionSource::Tree { name, tiles } => {
            output.push_str(&format!(
                "{}{} {} trees -> {} @ {:.2}/day\n",
                prefix, tiles, name, node.good, node.rate_per_day
            ));
        }
        ProductionSource::Building { name, recipe, count } => {
            output.push_str(&format!(
                "{}{}x {} ({}) -> {} @ {:.2}/day\n",
                prefix, count, name, recipe, node.good, node.rate_per_day
            ));
        }
    }

    for input in &node.inputs {
        output.push_str(&format!(
            "{}  needs {} @ {:.2}/day\n",
            prefix, input.good, input.rate_per_day
        ));
        output.push_str(&format_production_chain(&input.upstream, indent + 2));
    }

    output
}

/// Summary of a production chain calculation
#[derive(Debug)]
pub struct ChainSummary {
    pub target: Good,
    pub target_rate: f64,
    pub tile_counts: Vec<(String, u64)>,
    pub building_counts: Vec<(String, u64)>,
    pub raw_inputs: Vec<(String, f64)>,
}

/// Generate a summary of the production chain
pub fn summarize_chain(node: &ProductionNode) -> ChainSummary {
    let mut tiles: HashMap<String, u64> = HashMap::new();
    let mut buildings: HashMap<String, u64> = HashMap::new();
    let mut raw_inputs: HashMap<String, f64> = HashMap::new();

    collect_summary(node, &mut tiles, &mut buildings, &mut raw_inputs);

    let mut tile_list: Vec<_> = tiles.into_iter().collect();
    tile_list.sort_by(|a, b| a.0.cmp(&b.0));

    let mut building_list: Vec<_> = buildings.into_iter().collect();
    building_list.sort_by(|a, b| a.0.cmp(&b.0));

    let mut raw_list: Vec<_> = raw_inputs.into_iter().collect();
    raw_list.sort_by(|a, b| a.0.cmp(&b.0));

    ChainSummary {
        target: node.good,
        target_rate: node.rate_per_day,
        tile_counts: tile_list,
        building_counts: building_list,
        raw_inputs: raw_list,
    }
}

fn collect_summary(
    node: &ProductionNode,
    tiles: &mut HashMap<String, u64>,
    buildings: &mut HashMap<String, u64>,
    raw_inputs: &mut HashMap<String, f64>,
) {
    match &node.source {
        ProductionSource::Raw => {
            *raw_inputs.entry(node.good.to_string()).or_default() += node.rate_per_day;
        }
        ProductionSource::Crop { name, tiles: count } => {
            *tiles.entry(name.to_string()).or_default() += count;
        }
        ProductionSource::Tree { name, tiles: count } => {
            *tiles.entry(format!("{} ({})", name, node.good)).or_default() += count;
        }
        ProductionSource::Building { name, recipe, count } => {
            *buildings.entry(format!("{} ({})", name, recipe)).or_default() += count;
        }
    }

    for input in &node.inputs {
        collect_summary(&input.upstream, tiles, buildings, raw_inputs);
    }
}

impl std::fmt::Display for ChainSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Production Summary ===")?;
        writeln!(f, "Target: {} @ {:.2}/day", self.target, self.target_rate)?;
        writeln!(f)?;

        if !self.tile_counts.is_empty() {
            writeln!(f, "Tiles required:")?;
            for (name, count) in &self.tile_counts {
                writeln!(f, "  {}x {}", count, name)?;
            }
            writeln!(f)?;
        }

        if !self.building_counts.is_empty() {
            writeln!(f, "Buildings required:")?;
            for (name, count) in &self.building_counts {
                writeln!(f, "  {}x {}", count, name)?;
            }
            writeln!(f)?;
        }

        if !self.raw_inputs.is_empty() {
            writeln!(f, "Raw inputs required:")?;
            for (name, rate) in &self.raw_inputs {
                writeln!(f, "  {} @ {:.2}/day", name, rate)?;
            }
        }

        Ok(())
    }
}
