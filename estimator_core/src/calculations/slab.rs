//! # Single Slab Calculation
//!
//! Concrete, sand, gravel and reinforcement for one rectangular slab.

use serde::{Deserialize, Serialize};

use super::building::{ceil_count, CM_PER_M};
use crate::errors::{ensure_non_negative, EstimateResult};

/// 50 kg cement bags per cubic metre of slab concrete
pub const CEMENT_BAGS_PER_M3: f64 = 7.0;

/// Sand (m³) per cubic metre of slab concrete
pub const SAND_M3_PER_M3: f64 = 0.5;

/// Gravel (m³) per cubic metre of slab concrete
pub const GRAVEL_M3_PER_M3: f64 = 0.8;

/// Reinforcing steel (kg) per cubic metre of slab concrete
pub const STEEL_KG_PER_M3: f64 = 80.0;

/// Default slab thickness (cm)
pub const DEFAULT_THICKNESS_CM: f64 = 15.0;

fn default_thickness_cm() -> f64 {
    DEFAULT_THICKNESS_CM
}

/// Input parameters for a slab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlabInput {
    #[serde(default)]
    pub label: String,

    /// Slab length (m)
    pub length_m: f64,

    /// Slab width (m)
    pub width_m: f64,

    /// Slab thickness (cm)
    #[serde(default = "default_thickness_cm")]
    pub thickness_cm: f64,
}

impl SlabInput {
    pub fn new(label: impl Into<String>, length_m: f64, width_m: f64) -> Self {
        SlabInput {
            label: label.into(),
            length_m,
            width_m,
            thickness_cm: DEFAULT_THICKNESS_CM,
        }
    }

    pub fn validate(&self) -> EstimateResult<()> {
        ensure_non_negative("length_m", self.length_m)?;
        ensure_non_negative("width_m", self.width_m)?;
        ensure_non_negative("thickness_cm", self.thickness_cm)?;
        Ok(())
    }

    /// Concrete volume (m³)
    pub fn volume_m3(&self) -> f64 {
        self.length_m * self.width_m * (self.thickness_cm / CM_PER_M)
    }
}

/// Results from a slab calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlabResult {
    pub volume_m3: f64,
    pub cement_bags: u64,
    pub sand_m3: f64,
    pub gravel_m3: f64,
    pub steel_kg: u64,
}

/// Calculate materials for a slab.
pub fn calculate(input: &SlabInput) -> EstimateResult<SlabResult> {
    input.validate()?;

    let volume_m3 = input.volume_m3();

    Ok(SlabResult {
        volume_m3,
        cement_bags: ceil_count(volume_m3 * CEMENT_BAGS_PER_M3),
        sand_m3: volume_m3 * SAND_M3_PER_M3,
        gravel_m3: volume_m3 * GRAVEL_M3_PER_M3,
        steel_kg: ceil_count(volume_m3 * STEEL_KG_PER_M3),
    })
}
