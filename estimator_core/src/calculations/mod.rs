//! # Material Calculations
//!
//! Two independent families of quantity formulas:
//!
//! - [`building`] - whole-building estimate from footprint, floors and options
//! - [`wall`], [`slab`], [`foundation`] - single-component tools
//!
//! The component tools use their own coefficients (bricks per m² of wall
//! face, leaner foundation mix) and are never blended with the whole-building
//! model. Each follows the pattern:
//!
//! - `*Input` - Input parameters (JSON-serializable)
//! - `*Result` - Calculation results (JSON-serializable)
//! - `calculate(input) -> EstimateResult<*Result>` - Pure calculation function

pub mod building;
pub mod foundation;
pub mod slab;
pub mod wall;

use serde::{Deserialize, Serialize};

use crate::errors::EstimateResult;

// Re-export commonly used types
pub use building::{compute_materials, BuildingSpec, MaterialQuantities, RoofType};
pub use foundation::{FoundationInput, FoundationResult};
pub use slab::{SlabInput, SlabResult};
pub use wall::{WallInput, WallResult};

/// Enum wrapper for the single-component tools.
///
/// ## JSON Example
///
/// ```json
/// { "type": "Wall", "label": "W-1", "length_m": 10.0, "height_m": 3.0 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ComponentItem {
    Wall(WallInput),
    Slab(SlabInput),
    Foundation(FoundationInput),
}

/// Result of a [`ComponentItem`] calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ComponentResult {
    Wall(WallResult),
    Slab(SlabResult),
    Foundation(FoundationResult),
}

impl ComponentItem {
    /// Get the user-provided label for this component
    pub fn label(&self) -> &str {
        match self {
            ComponentItem::Wall(w) => &w.label,
            ComponentItem::Slab(s) => &s.label,
            ComponentItem::Foundation(f) => &f.label,
        }
    }

    /// Get the component type as a string
    pub fn component_type(&self) -> &'static str {
        match self {
            ComponentItem::Wall(_) => "Wall",
            ComponentItem::Slab(_) => "Slab",
            ComponentItem::Foundation(_) => "Foundation",
        }
    }

    /// Run the matching calculator.
    pub fn calculate(&self) -> EstimateResult<ComponentResult> {
        Ok(match self {
            ComponentItem::Wall(input) => ComponentResult::Wall(wall::calculate(input)?),
            ComponentItem::Slab(input) => ComponentResult::Slab(slab::calculate(input)?),
            ComponentItem::Foundation(input) => {
                ComponentResult::Foundation(foundation::calculate(input)?)
            }
        })
    }
}
