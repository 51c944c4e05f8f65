//! # Whole-Building Material Quantities
//!
//! Converts a building footprint and construction options into the five
//! material quantities the estimator prices: bricks, cement bags, sand,
//! steel and gravel.
//!
//! ## Model
//!
//! ```text
//! perimeter        = 2 (L + W)
//! wall area        = perimeter × ceiling height × floors
//! + boundary wall  = perimeter × 2.5           (optional, single storey)
//! brick volume     = total wall area × thickness
//! bricks           = ⌈brick volume × 400⌉
//! mortar           = brick volume × 0.3
//! slab concrete    = L × W × floors × 0.15     (optional)
//! cement bags      = ⌈(mortar + concrete) × 7⌉
//! sand             = (mortar + concrete) × 0.5
//! steel            = ⌈concrete × 80⌉
//! gravel           = concrete × 0.8
//! ```
//!
//! Walls are the full perimeter repeated per floor with no deduction for
//! openings. The boundary wall is never multiplied by `floors`.
//!
//! ## Example
//!
//! ```rust
//! use estimator_core::calculations::building::{compute_materials, BuildingSpec};
//!
//! let spec = BuildingSpec {
//!     include_slab: true,
//!     ..BuildingSpec::new(15.0, 12.0, 1)
//! };
//!
//! let q = compute_materials(&spec);
//! assert_eq!(q.bricks, 12960);
//! assert_eq!(q.cement_bags, 258);
//! assert_eq!(q.steel_kg, 2160);
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{ensure_non_negative, EstimateError, EstimateResult};

/// Bricks laid per cubic metre of wall volume
pub const BRICKS_PER_M3_WALL: f64 = 400.0;

/// Mortar volume as a fraction of brick wall volume
pub const MORTAR_FRACTION: f64 = 0.3;

/// Height of the optional boundary wall (m), independent of floor count
pub const PERIMETER_WALL_HEIGHT_M: f64 = 2.5;

/// Thickness of the per-floor concrete slab (m)
pub const SLAB_THICKNESS_M: f64 = 0.15;

/// 50 kg cement bags per cubic metre of mortar + concrete
pub const CEMENT_BAGS_PER_M3: f64 = 7.0;

/// Sand (m³) per cubic metre of mortar + concrete
pub const SAND_M3_PER_M3: f64 = 0.5;

/// Reinforcing steel (kg) per cubic metre of slab concrete
pub const STEEL_KG_PER_M3_CONCRETE: f64 = 80.0;

/// Gravel (m³) per cubic metre of slab concrete
pub const GRAVEL_M3_PER_M3_CONCRETE: f64 = 0.8;

/// Centimetres per metre, for wall thickness conversion
pub(crate) const CM_PER_M: f64 = 100.0;

/// Roof construction type.
///
/// Stored with the project but not consulted by any quantity formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoofType {
    #[default]
    Concrete,
    Tiles,
    None,
}

impl RoofType {
    /// Parse from a user-facing string ("concrete", "tiles", "none")
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "concrete" => Some(RoofType::Concrete),
            "tiles" | "tile" => Some(RoofType::Tiles),
            "none" | "" => Some(RoofType::None),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            RoofType::Concrete => "Concrete",
            RoofType::Tiles => "Tiles",
            RoofType::None => "None",
        }
    }
}

/// Building geometry and construction options.
///
/// ## JSON Example
///
/// ```json
/// {
///   "length_m": 15.0,
///   "width_m": 12.0,
///   "floors": 1,
///   "wall_thickness_cm": 20.0,
///   "ceiling_height_m": 3.0,
///   "include_perimeter_wall": false,
///   "include_slab": true,
///   "roof_type": "concrete",
///   "rooms": 4,
///   "bathrooms": 2
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingSpec {
    /// Footprint length (m)
    pub length_m: f64,

    /// Footprint width (m)
    pub width_m: f64,

    /// Number of storeys
    pub floors: u32,

    /// Wall thickness (cm), typically 10 to 50
    pub wall_thickness_cm: f64,

    /// Ceiling height per floor (m), typically 2.4 to 4.0
    pub ceiling_height_m: f64,

    /// Add a 2.5 m boundary wall around the footprint
    #[serde(default)]
    pub include_perimeter_wall: bool,

    /// Add a 15 cm concrete slab per floor
    #[serde(default)]
    pub include_slab: bool,

    #[serde(default)]
    pub roof_type: RoofType,

    /// Informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rooms: Option<u32>,

    /// Informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bathrooms: Option<u32>,
}

impl BuildingSpec {
    /// Footprint with the stock 20 cm walls and 3.0 m ceilings, no
    /// boundary wall, no slab.
    pub fn new(length_m: f64, width_m: f64, floors: u32) -> Self {
        BuildingSpec {
            length_m,
            width_m,
            floors,
            wall_thickness_cm: 20.0,
            ceiling_height_m: 3.0,
            include_perimeter_wall: false,
            include_slab: false,
            roof_type: RoofType::default(),
            rooms: None,
            bathrooms: None,
        }
    }

    /// Validate input parameters.
    ///
    /// The calculator accepts any non-negative input; this is the check a
    /// front end runs before handing user input to it.
    pub fn validate(&self) -> EstimateResult<()> {
        ensure_non_negative("length_m", self.length_m)?;
        ensure_non_negative("width_m", self.width_m)?;
        ensure_non_negative("wall_thickness_cm", self.wall_thickness_cm)?;
        ensure_non_negative("ceiling_height_m", self.ceiling_height_m)?;
        if self.wall_thickness_cm > 100.0 {
            return Err(EstimateError::invalid_input(
                "wall_thickness_cm",
                self.wall_thickness_cm.to_string(),
                "Wall thickness is given in centimetres and cannot exceed 100",
            ));
        }
        Ok(())
    }

    /// Footprint perimeter 2(L + W) in metres
    pub fn perimeter_m(&self) -> f64 {
        2.0 * (self.length_m + self.width_m)
    }

    /// Footprint area L × W in square metres
    pub fn floor_area_m2(&self) -> f64 {
        self.length_m * self.width_m
    }
}

/// Material quantities for a whole building.
///
/// Counts are rounded up; volumes stay fractional.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MaterialQuantities {
    /// Brick/block count
    pub bricks: u64,

    /// 50 kg cement bags
    pub cement_bags: u64,

    /// Sand (m³)
    pub sand_m3: f64,

    /// Reinforcing steel (kg)
    pub steel_kg: u64,

    /// Gravel (m³)
    pub gravel_m3: f64,
}

impl MaterialQuantities {
    pub fn is_zero(&self) -> bool {
        self.bricks == 0
            && self.cement_bags == 0
            && self.sand_m3 == 0.0
            && self.steel_kg == 0
            && self.gravel_m3 == 0.0
    }
}

/// Intermediate volumes and areas behind a [`MaterialQuantities`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BuildingBreakdown {
    pub perimeter_m: f64,
    pub wall_area_m2: f64,
    pub total_wall_area_m2: f64,
    pub brick_volume_m3: f64,
    pub mortar_volume_m3: f64,
    pub concrete_volume_m3: f64,
    pub total_cement_volume_m3: f64,
}

/// Compute the intermediate geometry for a building.
pub fn breakdown(spec: &BuildingSpec) -> BuildingBreakdown {
    let floors = f64::from(spec.floors);

    let perimeter_m = spec.perimeter_m();
    let wall_area_m2 = perimeter_m * spec.ceiling_height_m * floors;

    let total_wall_area_m2 = if spec.include_perimeter_wall {
        wall_area_m2 + perimeter_m * PERIMETER_WALL_HEIGHT_M
    } else {
        wall_area_m2
    };

    let wall_thickness_m = spec.wall_thickness_cm / CM_PER_M;
    let brick_volume_m3 = total_wall_area_m2 * wall_thickness_m;
    let mortar_volume_m3 = brick_volume_m3 * MORTAR_FRACTION;

    let concrete_volume_m3 = if spec.include_slab {
        spec.floor_area_m2() * floors * SLAB_THICKNESS_M
    } else {
        0.0
    };

    BuildingBreakdown {
        perimeter_m,
        wall_area_m2,
        total_wall_area_m2,
        brick_volume_m3,
        mortar_volume_m3,
        concrete_volume_m3,
        total_cement_volume_m3: mortar_volume_m3 + concrete_volume_m3,
    }
}

/// Compute material quantities for a whole building.
///
/// Pure and total over non-negative inputs; a zero footprint or zero floors
/// yields all-zero quantities.
pub fn compute_materials(spec: &BuildingSpec) -> MaterialQuantities {
    let b = breakdown(spec);

    let quantities = MaterialQuantities {
        bricks: ceil_count(b.brick_volume_m3 * BRICKS_PER_M3_WALL),
        cement_bags: ceil_count(b.total_cement_volume_m3 * CEMENT_BAGS_PER_M3),
        sand_m3: b.total_cement_volume_m3 * SAND_M3_PER_M3,
        steel_kg: ceil_count(b.concrete_volume_m3 * STEEL_KG_PER_M3_CONCRETE),
        gravel_m3: b.concrete_volume_m3 * GRAVEL_M3_PER_M3_CONCRETE,
    };

    debug!(
        length_m = spec.length_m,
        width_m = spec.width_m,
        floors = spec.floors,
        bricks = quantities.bricks,
        cement_bags = quantities.cement_bags,
        steel_kg = quantities.steel_kg,
        "computed building materials"
    );

    quantities
}

/// Round a non-negative amount up to a whole count.
pub(crate) fn ceil_count(value: f64) -> u64 {
    if value <= 0.0 || !value.is_finite() {
        0
    } else {
        value.ceil() as u64
    }
}
