//! # Single Wall Calculation
//!
//! Quantities for one straight masonry wall. Bricks are counted per square
//! metre of face area, which is a different empirical model from the
//! per-cubic-metre count used for whole buildings.
//!
//! ## Example
//!
//! ```rust
//! use estimator_core::calculations::wall::{calculate, WallInput};
//!
//! let input = WallInput::new("Garden wall", 10.0, 3.0);
//! let result = calculate(&input).unwrap();
//! assert_eq!(result.bricks, 1500);
//! assert_eq!(result.cement_bags, 42);
//! ```

use serde::{Deserialize, Serialize};

use super::building::{ceil_count, CM_PER_M};
use crate::errors::{ensure_non_negative, EstimateResult};

/// Bricks per square metre of wall face
pub const BRICKS_PER_M2_FACE: f64 = 50.0;

/// 50 kg cement bags per cubic metre of wall
pub const CEMENT_BAGS_PER_M3: f64 = 7.0;

/// Sand (m³) per cubic metre of wall
pub const SAND_M3_PER_M3: f64 = 0.5;

/// Mortar (m³) per cubic metre of wall
pub const MORTAR_M3_PER_M3: f64 = 0.3;

/// Default wall thickness (cm)
pub const DEFAULT_THICKNESS_CM: f64 = 20.0;

fn default_thickness_cm() -> f64 {
    DEFAULT_THICKNESS_CM
}

/// Input parameters for a single wall.
///
/// ## JSON Example
///
/// ```json
/// {
///   "label": "W-1",
///   "length_m": 10.0,
///   "height_m": 3.0,
///   "thickness_cm": 20.0
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WallInput {
    /// User label for this wall (e.g., "W-1", "Garden wall")
    #[serde(default)]
    pub label: String,

    /// Wall length (m)
    pub length_m: f64,

    /// Wall height (m)
    pub height_m: f64,

    /// Wall thickness (cm)
    #[serde(default = "default_thickness_cm")]
    pub thickness_cm: f64,
}

impl WallInput {
    pub fn new(label: impl Into<String>, length_m: f64, height_m: f64) -> Self {
        WallInput {
            label: label.into(),
            length_m,
            height_m,
            thickness_cm: DEFAULT_THICKNESS_CM,
        }
    }

    /// Validate input parameters.
    pub fn validate(&self) -> EstimateResult<()> {
        ensure_non_negative("length_m", self.length_m)?;
        ensure_non_negative("height_m", self.height_m)?;
        ensure_non_negative("thickness_cm", self.thickness_cm)?;
        Ok(())
    }

    /// Face area (m²)
    pub fn area_m2(&self) -> f64 {
        self.length_m * self.height_m
    }

    /// Wall volume (m³)
    pub fn volume_m3(&self) -> f64 {
        self.area_m2() * (self.thickness_cm / CM_PER_M)
    }
}

/// Results from a single wall calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WallResult {
    pub area_m2: f64,
    pub volume_m3: f64,
    pub bricks: u64,
    pub cement_bags: u64,
    pub sand_m3: f64,
    pub mortar_m3: f64,
}

/// Calculate materials for a single wall.
pub fn calculate(input: &WallInput) -> EstimateResult<WallResult> {
    input.validate()?;

    let area_m2 = input.area_m2();
    let volume_m3 = input.volume_m3();

    Ok(WallResult {
        area_m2,
        volume_m3,
        bricks: ceil_count(area_m2 * BRICKS_PER_M2_FACE),
        cement_bags: ceil_count(volume_m3 * CEMENT_BAGS_PER_M3),
        sand_m3: volume_m3 * SAND_M3_PER_M3,
        mortar_m3: volume_m3 * MORTAR_M3_PER_M3,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_wall() {
        let result = calculate(&WallInput::new("W-1", 10.0, 3.0)).unwrap();
        assert!((result.area_m2 - 30.0).abs() < 1e-9);
        assert!((result.volume_m3 - 6.0).abs() < 1e-9);
        assert_eq!(result.bricks, 1500);
        assert_eq!(result.cement_bags, 42);
        assert!((result.sand_m3 - 3.0).abs() < 1e-9);
        assert!((result.mortar_m3 - 1.8).abs() < 1e-9);
    }

    #[test]
    fn test_bricks_follow_face_area_not_thickness() {
        let thin = WallInput {
            thickness_cm: 10.0,
            ..WallInput::new("thin", 4.0, 2.5)
        };
        let thick = WallInput {
            thickness_cm: 40.0,
            ..thin.clone()
        };
        let a = calculate(&thin).unwrap();
        let b = calculate(&thick).unwrap();
        assert_eq!(a.bricks, b.bricks);
        assert!(b.cement_bags > a.cement_bags);
    }

    #[test]
    fn test_counts_round_up() {
        // 1.01 m² face -> 50.5 bricks
        let input = WallInput::new("stub", 1.01, 1.0);
        assert_eq!(calculate(&input).unwrap().bricks, 51);
    }

    #[test]
    fn test_default_thickness_from_json() {
        let input: WallInput =
            serde_json::from_str(r#"{"length_m": 5.0, "height_m": 2.0}"#).unwrap();
        assert_eq!(input.thickness_cm, DEFAULT_THICKNESS_CM);
        assert_eq!(input.label, "");
    }

    #[test]
    fn test_negative_length_rejected() {
        let input = WallInput::new("bad", -3.0, 2.0);
        assert!(calculate(&input).is_err());
    }
}
