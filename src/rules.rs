//! Faction-specific scaling rules
//!
//! Both playable factions share one set of formulas. What differs is which
//! crops benefit from beehives and how staffing changes a building's output.

use std::collections::{HashMap, HashSet};

use crate::names::{BuildingName, CropName, FoodProcessingBuildingName, WaterBuildingName};

/// How assigned workers change a building's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkerScaling {
    /// Output does not depend on staffing.
    #[default]
    Fixed,
    /// Output is multiplied by the number of assigned workers.
    WorkerLinear,
    /// Output is derated by `assigned / capacity`.
    CapacityRatio,
}

#[derive(Debug, Clone, Default)]
pub struct FactionRules {
    beehive_crops: HashSet<CropName>,
    scaling: HashMap<BuildingName, WorkerScaling>,
}

impl FactionRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_beehive_crop(mut self, crop: CropName) -> Self {
        self.beehive_crops.insert(crop);
        self
    }

    pub fn with_scaling(mut self, building: impl Into<BuildingName>, scaling: WorkerScaling) -> Self {
        self.scaling.insert(building.into(), scaling);
        self
    }

    pub fn folktails() -> Self {
        [
            CropName::CarrotCrop,
            CropName::SunflowerCrop,
            CropName::PotatoCrop,
            CropName::WheatCrop,
            CropName::CattailCrop,
            CropName::SpadderdockCrop,
        ]
        .into_iter()
        .fold(Self::new(), Self::with_beehive_crop)
        .with_scaling(WaterBuildingName::LargeWaterPump, WorkerScaling::CapacityRatio)
    }

    pub fn iron_teeth() -> Self {
        Self::new().with_scaling(FoodProcessingBuildingName::Fermenter, WorkerScaling::WorkerLinear)
    }

    /// Built-in rules for a faction name; unknown factions get no special rules.
    pub fn for_faction(name: &str) -> Self {
        match name.to_lowercase().replace(' ', "").as_str() {
            "folktails" | "folktail" => Self::folktails(),
            "ironteeth" => Self::iron_teeth(),
            _ => {
                log::debug!("No faction rules for '{}', using defaults", name);
                Self::new()
            }
        }
    }

    pub fn is_beehive_eligible(&self, crop: CropName) -> bool {
        self.beehive_crops.contains(&crop)
    }

    pub fn scaling(&self, building: BuildingName) -> WorkerScaling {
        self.scaling.get(&building).copied().unwrap_or_default()
    }
}
