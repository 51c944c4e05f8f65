//! # Foundation Calculation
//!
//! Quantities for a single rectangular footing. Foundations use a leaner mix
//! than slabs in this model: fewer cement bags and less steel per cubic
//! metre, more sand and gravel.

use serde::{Deserialize, Serialize};

use super::building::ceil_count;
use crate::errors::{ensure_non_negative, EstimateResult};

/// 50 kg cement bags per cubic metre of footing
pub const CEMENT_BAGS_PER_M3: f64 = 6.0;

/// Sand (m³) per cubic metre of footing
pub const SAND_M3_PER_M3: f64 = 0.6;

/// Gravel (m³) per cubic metre of footing
pub const GRAVEL_M3_PER_M3: f64 = 0.9;

/// Reinforcing steel (kg) per cubic metre of footing
pub const STEEL_KG_PER_M3: f64 = 60.0;

/// Default footing depth (m)
pub const DEFAULT_DEPTH_M: f64 = 1.5;

fn default_depth_m() -> f64 {
    DEFAULT_DEPTH_M
}

/// Input parameters for a footing.
///
/// ## JSON Example
///
/// ```json
/// {
///   "label": "F-1",
///   "length_m": 2.0,
///   "width_m": 2.0,
///   "depth_m": 1.5
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoundationInput {
    #[serde(default)]
    pub label: String,

    /// Footing length (m)
    pub length_m: f64,

    /// Footing width (m)
    pub width_m: f64,

    /// Footing depth (m)
    #[serde(default = "default_depth_m")]
    pub depth_m: f64,
}

impl FoundationInput {
    pub fn new(label: impl Into<String>, length_m: f64, width_m: f64) -> Self {
        FoundationInput {
            label: label.into(),
            length_m,
            width_m,
            depth_m: DEFAULT_DEPTH_M,
        }
    }

    pub fn validate(&self) -> EstimateResult<()> {
        ensure_non_negative("length_m", self.length_m)?;
        ensure_non_negative("width_m", self.width_m)?;
        ensure_non_negative("depth_m", self.depth_m)?;
        Ok(())
    }

    pub fn volume_m3(&self) -> f64 {
        self.length_m * self.width_m * self.depth_m
    }
}

/// Results from a footing calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoundationResult {
    pub volume_m3: f64,
    pub cement_bags: u64,
    pub sand_m3: f64,
    pub gravel_m3: f64,
    pub steel_kg: u64,
}

/// Calculate materials for a footing.
pub fn calculate(input: &FoundationInput) -> EstimateResult<FoundationResult> {
    input.validate()?;

    let volume_m3 = input.volume_m3();

    Ok(FoundationResult {
        volume_m3,
        cement_bags: ceil_count(volume_m3 * CEMENT_BAGS_PER_M3),
        sand_m3: volume_m3 * SAND_M3_PER_M3,
        gravel_m3: volume_m3 * GRAVEL_M3_PER_M3,
        steel_kg: ceil_count(volume_m3 * STEEL_KG_PER_M3),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::slab::{self, SlabInput};

    #[test]
    fn test_footing_calculation() {
        // 2 × 2 × 1.5 = 6 m³
        let result = calculate(&FoundationInput::new("F-1", 2.0, 2.0)).unwrap();
        assert!((result.volume_m3 - 6.0).abs() < 1e-9);
        assert_eq!(result.cement_bags, 36);
        assert!((result.sand_m3 - 3.6).abs() < 1e-9);
        assert!((result.gravel_m3 - 5.4).abs() < 1e-9);
        assert_eq!(result.steel_kg, 360);
    }

    #[test]
    fn test_leaner_than_slab_for_same_volume() {
        // 4 × 2.5 × 0.1 m footing and 4 × 2.5 × 10 cm slab are both 1 m³
        let footing = FoundationInput {
            depth_m: 0.1,
            ..FoundationInput::new("F", 4.0, 2.5)
        };
        let slab_input = SlabInput {
            thickness_cm: 10.0,
            ..SlabInput::new("S", 4.0, 2.5)
        };

        let f = calculate(&footing).unwrap();
        let s = slab::calculate(&slab_input).unwrap();
        assert!((f.volume_m3 - s.volume_m3).abs() < 1e-9);
        assert!(f.cement_bags < s.cement_bags);
        assert!(f.steel_kg < s.steel_kg);
        assert!(f.gravel_m3 > s.gravel_m3);
    }

    #[test]
    fn test_default_depth_from_json() {
        let input: FoundationInput =
            serde_json::from_str(r#"{"length_m": 1.0, "width_m": 1.0}"#).unwrap();
        assert_eq!(input.depth_m, DEFAULT_DEPTH_M);
    }

    #[test]
    fn test_negative_depth_rejected() {
        let input = FoundationInput {
            depth_m: -1.0,
            ..FoundationInput::new("F", 1.0, 1.0)
        };
        assert!(calculate(&input).is_err());
    }
}
