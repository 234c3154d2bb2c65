//! Enumerated catalog names
//!
//! Crops, trees, buildings and recipes are addressed by closed enums rather
//! than free strings. The string form of each variant is the one used in the
//! faction data files, and is resolved once when a catalog is loaded.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::CatalogError;

static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s_-]+").expect("separator pattern is valid"));

/// Fold case and collapse separators so `berry-bush` matches `Berry Bush`.
fn normalize(input: &str) -> String {
    SEPARATORS.replace_all(input.trim(), " ").to_lowercase()
}

macro_rules! named_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];
            pub const KIND: &'static str = $kind;

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            /// Lookup for user input: ignores case and separator style.
            // Not every kind is typed on the command line.
            #[allow(dead_code)]
            pub fn parse_lenient(input: &str) -> Result<Self, CatalogError> {
                let wanted = normalize(input);
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| normalize(v.as_str()) == wanted)
                    .ok_or_else(|| CatalogError::not_found(Self::KIND, input))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.pad(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = CatalogError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == s)
                    .ok_or_else(|| CatalogError::not_found(Self::KIND, s))
            }
        }
    };
}

named_enum!(Difficulty, "difficulty level" {
    Easy => "easy",
    Normal => "normal",
    Hard => "hard",
});

named_enum!(ConsumptionType, "consumption type" {
    Food => "food",
    Water => "water",
});

named_enum!(CropName, "crop" {
    BerryBush => "Berry Bush",
    DandelionBush => "Dandelion Bush",
    CarrotCrop => "Carrot Crop",
    SunflowerCrop => "Sunflower Crop",
    PotatoCrop => "Potato Crop",
    WheatCrop => "Wheat Crop",
    CattailCrop => "Cattail Crop",
    SpadderdockCrop => "Spadderdock Crop",
    CoffeeBush => "Coffee Bush",
    KohlrabiCrop => "Kohlrabi Crop",
    CassavaCrop => "Cassava Crop",
    SoybeanCrop => "Soybean Crop",
    CanolaCrop => "Canola Crop",
    CornCrop => "Corn Crop",
    EggplantCrop => "Eggplant Crop",
});

named_enum!(TreeName, "tree" {
    Birch => "Birch",
    Pine => "Pine",
    Maple => "Maple",
    ChestnutTree => "Chestnut Tree",
    Oak => "Oak",
    MangroveTree => "Mangrove Tree",
});

named_enum!(
    /// Anything gathered from a tile or pumped from the ground.
    HarvestName, "harvest" {
    Berries => "Berries",
    Dandelions => "Dandelions",
    Carrots => "Carrots",
    SunflowerSeeds => "Sunflower Seeds",
    Potatoes => "Potatoes",
    Wheat => "Wheat",
    CattailRoots => "Cattail Roots",
    Spadderdocks => "Spadderdocks",
    CoffeeBeans => "Coffee Beans",
    Kohlrabies => "Kohlrabies",
    Cassavas => "Cassavas",
    Soybeans => "Soybeans",
    CanolaSeeds => "Canola Seeds",
    Corn => "Corn",
    Eggplants => "Eggplants",
    PineResin => "Pine Resin",
    MapleSyrup => "Maple Syrup",
    Chestnuts => "Chestnuts",
    MangroveFruits => "Mangrove Fruits",
    Logs => "Logs",
    Water => "Water",
    Badwater => "Badwater",
});

named_enum!(WaterBuildingName, "water building" {
    WaterPump => "Water Pump",
    LargeWaterPump => "Large Water Pump",
    BadwaterPump => "Badwater Pump",
    DeepWaterPump => "Deep Water Pump",
    DeepBadwaterPump => "Deep Badwater Pump",
});

named_enum!(FoodProcessingBuildingName, "food processing building" {
    Grill => "Grill",
    Gristmill => "Gristmill",
    Bakery => "Bakery",
    CoffeeBrewery => "Coffee Brewery",
    Fermenter => "Fermenter",
    FoodFactory => "Food Factory",
    HydroponicGarden => "Hydroponic Garden",
    OilPress => "Oil Press",
});

named_enum!(FoodRecipeName, "food recipe" {
    GrilledPotatoes => "Grilled Potatoes",
    GrilledChestnuts => "Grilled Chestnuts",
    GrilledSpadderdocks => "Grilled Spadderdocks",
    WheatFlour => "Wheat Flour",
    CattailFlour => "Cattail Flour",
    Breads => "Breads",
    CattailCrackers => "Cattail Crackers",
    MaplePastries => "Maple Pastries",
    Coffee => "Coffee",
    FermentedCassava => "Fermented Cassava",
    FermentedSoybean => "Fermented Soybean",
    FermentedMushroom => "Fermented Mushroom",
    CornRations => "Corn Rations",
    EggplantRations => "Eggplant Rations",
    AlgaeRations => "Algae Rations",
    Mushrooms => "Mushrooms",
    Algae => "Algae",
    CanolaOil => "Canola Oil",
});

named_enum!(GoodsBuildingName, "goods building" {
    LumberMill => "Lumber Mill",
    IndustrialLumberMill => "Industrial Lumber Mill",
    GearWorkshop => "Gear Workshop",
    PaperMill => "Paper Mill",
    PrintingPress => "Printing Press",
    WoodWorkshop => "Wood Workshop",
    Smelter => "Smelter",
    Mine => "Mine",
    EfficientMine => "Efficient Mine",
    Refinery => "Refinery",
    GreaseFactory => "Grease Factory",
    BotPartFactory => "Bot Part Factory",
    BotAssembler => "Bot Assembler",
    ExplosivesFactory => "Explosives Factory",
    Centrifuge => "Centrifuge",
    Herbalist => "Herbalist",
});

named_enum!(GoodsRecipeName, "goods recipe" {
    Planks => "Planks",
    Gears => "Gears",
    Paper => "Paper",
    Books => "Books",
    Punchcards => "Punchcards",
    TreatedPlanks => "Treated Planks",
    MetalBlocks => "Metal Blocks",
    ScrapMetal => "Scrap Metal",
    Biofuel => "Biofuel",
    BiofuelCarrots => "Biofuel Carrots",
    BiofuelPotatoes => "Biofuel Potatoes",
    BiofuelSpadderdocks => "Biofuel Spadderdocks",
    Catalyst => "Catalyst",
    Grease => "Grease",
    BotChassis => "Bot Chassis",
    BotHeads => "Bot Heads",
    BotLimbs => "Bot Limbs",
    Bot => "Bot",
    Explosives => "Explosives",
    Extract => "Extract",
    Antidote => "Antidote",
});

/// Any production building, tagged with the catalog section it lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BuildingName {
    Water(WaterBuildingName),
    FoodProcessing(FoodProcessingBuildingName),
    Goods(GoodsBuildingName),
}

impl BuildingName {
    pub fn as_str(self) -> &'static str {
        match self {
            BuildingName::Water(name) => name.as_str(),
            BuildingName::FoodProcessing(name) => name.as_str(),
            BuildingName::Goods(name) => name.as_str(),
        }
    }

    /// Catalog kind, as reported in lookup failures.
    pub fn kind(self) -> &'static str {
        match self {
            BuildingName::Water(_) => WaterBuildingName::KIND,
            BuildingName::FoodProcessing(_) => FoodProcessingBuildingName::KIND,
            BuildingName::Goods(_) => GoodsBuildingName::KIND,
        }
    }

    pub fn parse_lenient(input: &str) -> Result<Self, CatalogError> {
        WaterBuildingName::parse_lenient(input)
            .map(Self::Water)
            .or_else(|_| FoodProcessingBuildingName::parse_lenient(input).map(Self::FoodProcessing))
            .or_else(|_| GoodsBuildingName::parse_lenient(input).map(Self::Goods))
            .map_err(|_| CatalogError::not_found("building", input))
    }
}

impl fmt::Display for BuildingName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl From<WaterBuildingName> for BuildingName {
    fn from(name: WaterBuildingName) -> Self {
        BuildingName::Water(name)
    }
}

impl From<FoodProcessingBuildingName> for BuildingName {
    fn from(name: FoodProcessingBuildingName) -> Self {
        BuildingName::FoodProcessing(name)
    }
}

impl From<GoodsBuildingName> for BuildingName {
    fn from(name: GoodsBuildingName) -> Self {
        BuildingName::Goods(name)
    }
}

/// A resource that a recipe produces or consumes.
///
/// Recipe names and recipe input names share this space: a recipe is named
/// after the good it yields, and an input may be a raw harvest, a processed
/// food or a manufactured good.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Good {
    Harvest(HarvestName),
    Food(FoodRecipeName),
    Goods(GoodsRecipeName),
}

impl Good {
    pub const KIND: &'static str = "good";

    pub fn as_str(self) -> &'static str {
        match self {
            Good::Harvest(name) => name.as_str(),
            Good::Food(name) => name.as_str(),
            Good::Goods(name) => name.as_str(),
        }
    }

    pub fn parse_lenient(input: &str) -> Result<Self, CatalogError> {
        HarvestName::parse_lenient(input)
            .map(Self::Harvest)
            .or_else(|_| FoodRecipeName::parse_lenient(input).map(Self::Food))
            .or_else(|_| GoodsRecipeName::parse_lenient(input).map(Self::Goods))
            .map_err(|_| CatalogError::not_found(Self::KIND, input))
    }
}

impl fmt::Display for Good {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Good {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HarvestName::from_str(s)
            .map(Self::Harvest)
            .or_else(|_| FoodRecipeName::from_str(s).map(Self::Food))
            .or_else(|_| GoodsRecipeName::from_str(s).map(Self::Goods))
            .map_err(|_| CatalogError::not_found(Self::KIND, s))
    }
}

impl From<HarvestName> for Good {
    fn from(name: HarvestName) -> Self {
        Good::Harvest(name)
    }
}

impl From<FoodRecipeName> for Good {
    fn from(name: FoodRecipeName) -> Self {
        Good::Food(name)
    }
}

impl From<GoodsRecipeName> for Good {
    fn from(name: GoodsRecipeName) -> Self {
        Good::Goods(name)
    }
}

/// A land tile source: either a crop or a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileSource {
    Crop(CropName),
    Tree(TreeName),
}

impl TileSource {
    pub fn parse_lenient(input: &str) -> Result<Self, CatalogError> {
        CropName::parse_lenient(input)
            .map(Self::Crop)
            .or_else(|_| TreeName::parse_lenient(input).map(Self::Tree))
            .map_err(|_| CatalogError::not_found("crop or tree", input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_parse_uses_data_strings() {
        assert_eq!("Berry Bush".parse::<CropName>().unwrap(), CropName::BerryBush);
        assert_eq!("normal".parse::<Difficulty>().unwrap(), Difficulty::Normal);
        assert!("berry bush".parse::<CropName>().is_err());
    }

    #[test]
    fn lenient_parse_ignores_case_and_separators() {
        assert_eq!(CropName::parse_lenient("berry-bush").unwrap(), CropName::BerryBush);
        assert_eq!(CropName::parse_lenient("  BERRY_bush ").unwrap(), CropName::BerryBush);
        assert_eq!(
            BuildingName::parse_lenient("large water pump").unwrap(),
            BuildingName::Water(WaterBuildingName::LargeWaterPump)
        );
        assert_eq!(
            Good::parse_lenient("treated-planks").unwrap(),
            Good::Goods(GoodsRecipeName::TreatedPlanks)
        );
    }

    #[test]
    fn unknown_name_reports_kind_and_name() {
        let err = "Banana Tree".parse::<TreeName>().unwrap_err();
        assert_eq!(err, CatalogError::not_found("tree", "Banana Tree"));
        assert!(err.to_string().contains("Banana Tree"));
        assert!(err.to_string().contains("tree"));
    }

    #[test]
    fn errors_carry_the_kind_constant() {
        assert_eq!(
            "Bread".parse::<HarvestName>().unwrap_err(),
            CatalogError::not_found(HarvestName::KIND, "Bread")
        );
        assert_eq!(
            FoodRecipeName::parse_lenient("toast").unwrap_err(),
            CatalogError::not_found(FoodRecipeName::KIND, "toast")
        );
        assert_eq!(
            "Nails".parse::<GoodsRecipeName>().unwrap_err(),
            CatalogError::not_found("goods recipe", "Nails")
        );
        assert_eq!(ConsumptionType::parse_lenient(" WATER ").unwrap(), ConsumptionType::Water);
    }

    #[test]
    fn good_names_do_not_overlap() {
        for harvest in HarvestName::ALL {
            assert!(FoodRecipeName::from_str(harvest.as_str()).is_err());
            assert!(GoodsRecipeName::from_str(harvest.as_str()).is_err());
        }
        for food in FoodRecipeName::ALL {
            assert!(GoodsRecipeName::from_str(food.as_str()).is_err());
        }
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for crop in CropName::ALL {
            assert_eq!(crop.to_string().parse::<CropName>().unwrap(), *crop);
        }
    }
}
