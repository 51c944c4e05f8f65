//! # Cost Aggregation
//!
//! Combines material quantities with a [`PriceTable`] and a contingency
//! percentage. No rounding is applied here; presentation layers format the
//! figures.
//!
//! ```text
//! total  = Σ quantityᵢ × priceᵢ        (bricks, cement, sand, steel, gravel)
//! final  = total × (1 + contingency / 100)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use estimator_core::calculations::MaterialQuantities;
//! use estimator_core::cost::compute_cost;
//! use estimator_core::pricing::PriceTable;
//!
//! let q = MaterialQuantities { bricks: 1000, ..Default::default() };
//! let summary = compute_cost(&q, &PriceTable::default(), 10.0);
//! assert_eq!(summary.total_material_cost, 15_000.0);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::calculations::MaterialQuantities;
use crate::pricing::PriceTable;

/// The five priced materials, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Material {
    Bricks,
    Cement,
    Sand,
    Steel,
    Gravel,
}

impl Material {
    pub const ALL: [Material; 5] = [
        Material::Bricks,
        Material::Cement,
        Material::Sand,
        Material::Steel,
        Material::Gravel,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            Material::Bricks => "Bricks/Blocks",
            Material::Cement => "Cement",
            Material::Sand => "Sand",
            Material::Steel => "Steel",
            Material::Gravel => "Gravel",
        }
    }

    /// Unit the quantity is counted in
    pub fn unit(&self) -> &'static str {
        match self {
            Material::Bricks => "unit",
            Material::Cement => "bag (50 kg)",
            Material::Sand | Material::Gravel => "m³",
            Material::Steel => "kg",
        }
    }

    /// Whether the quantity is a whole count rather than a volume
    pub fn is_counted(&self) -> bool {
        !matches!(self, Material::Sand | Material::Gravel)
    }

    /// Quantity of this material in a bundle
    pub fn quantity_in(&self, q: &MaterialQuantities) -> f64 {
        match self {
            Material::Bricks => q.bricks as f64,
            Material::Cement => q.cement_bags as f64,
            Material::Sand => q.sand_m3,
            Material::Steel => q.steel_kg as f64,
            Material::Gravel => q.gravel_m3,
        }
    }

    /// Unit price of this material
    pub fn price_in(&self, prices: &PriceTable) -> f64 {
        match self {
            Material::Bricks => prices.brick,
            Material::Cement => prices.cement_bag,
            Material::Sand => prices.sand_m3,
            Material::Steel => prices.steel_kg,
            Material::Gravel => prices.gravel_m3,
        }
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// One material's contribution to the total.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostLine {
    pub material: Material,
    pub quantity: f64,
    pub unit_price: f64,
    pub cost: f64,
}

/// Per-material cost lines, bricks first, gravel last.
pub fn line_items(quantities: &MaterialQuantities, prices: &PriceTable) -> [CostLine; 5] {
    Material::ALL.map(|material| {
        let quantity = material.quantity_in(quantities);
        let unit_price = material.price_in(prices);
        CostLine {
            material,
            quantity,
            unit_price,
            cost: quantity * unit_price,
        }
    })
}

/// Total and final cost of a set of quantities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostSummary {
    /// Σ quantity × unit price
    pub total_material_cost: f64,

    /// Contingency allowance (%)
    pub contingency_percent: f64,

    /// Total with contingency applied
    pub final_cost: f64,
}

impl CostSummary {
    /// Absolute contingency allowance (final − total)
    pub fn contingency_amount(&self) -> f64 {
        self.final_cost - self.total_material_cost
    }

    /// Same material total with a different contingency
    pub fn with_contingency(&self, contingency_percent: f64) -> CostSummary {
        CostSummary {
            total_material_cost: self.total_material_cost,
            contingency_percent,
            final_cost: apply_contingency(self.total_material_cost, contingency_percent),
        }
    }
}

/// total × (1 + percent / 100)
pub fn apply_contingency(total_material_cost: f64, contingency_percent: f64) -> f64 {
    total_material_cost * (1.0 + contingency_percent / 100.0)
}

/// Compute the cost summary for a set of quantities.
///
/// Negative contingency is applied arithmetically; rejecting it is the
/// caller's input validation.
pub fn compute_cost(
    quantities: &MaterialQuantities,
    prices: &PriceTable,
    contingency_percent: f64,
) -> CostSummary {
    let total_material_cost = line_items(quantities, prices)
        .iter()
        .fold(0.0, |acc, line| acc + line.cost);

    CostSummary {
        total_material_cost,
        contingency_percent,
        final_cost: apply_contingency(total_material_cost, contingency_percent),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::{compute_materials, BuildingSpec};

    fn reference_quantities() -> MaterialQuantities {
        MaterialQuantities {
            bricks: 12960,
            cement_bags: 258,
            sand_m3: 18.36,
            steel_kg: 2160,
            gravel_m3: 21.6,
        }
    }

    #[test]
    fn test_reference_house_cost() {
        let summary = compute_cost(&reference_quantities(), &PriceTable::default(), 10.0);
        // 194400 + 206400 + 64260 + 388800 + 86400
        assert!((summary.total_material_cost - 940_260.0).abs() < 1e-6);
        assert!((summary.final_cost - 1_034_286.0).abs() < 1e-6);
        assert!((summary.contingency_amount() - 94_026.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_contingency_is_exact() {
        let summary = compute_cost(&reference_quantities(), &PriceTable::default(), 0.0);
        assert_eq!(summary.final_cost, summary.total_material_cost);
    }

    #[test]
    fn test_final_never_below_total_for_non_negative_contingency() {
        let q = reference_quantities();
        for pct in [0.0, 5.0, 12.5, 50.0] {
            let s = compute_cost(&q, &PriceTable::default(), pct);
            assert!(s.final_cost >= s.total_material_cost);
        }
    }

    #[test]
    fn test_sum_is_order_independent_for_fixed_vector() {
        let q = reference_quantities();
        let p = PriceTable::default();
        let lines = line_items(&q, &p);

        let forward: f64 = lines.iter().fold(0.0, |acc, l| acc + l.cost);
        let backward: f64 = lines.iter().rev().fold(0.0, |acc, l| acc + l.cost);
        assert!((forward - backward).abs() < 1e-6);
        assert_eq!(compute_cost(&q, &p, 10.0), compute_cost(&q, &p, 10.0));
    }

    #[test]
    fn test_contingency_edit_only_moves_final_cost() {
        let summary = CostSummary {
            total_material_cost: 100_000.0,
            contingency_percent: 10.0,
            final_cost: apply_contingency(100_000.0, 10.0),
        };
        assert!((summary.final_cost - 110_000.0).abs() < 1e-6);

        let edited = summary.with_contingency(15.0);
        assert_eq!(edited.total_material_cost, 100_000.0);
        assert!((edited.final_cost - 115_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_line_items_order_and_units() {
        let q = compute_materials(&BuildingSpec {
            include_slab: true,
            ..BuildingSpec::new(15.0, 12.0, 1)
        });
        let lines = line_items(&q, &PriceTable::default());
        let order: Vec<Material> = lines.iter().map(|l| l.material).collect();
        assert_eq!(order, Material::ALL.to_vec());
        assert_eq!(lines[0].quantity, 12960.0);
        assert_eq!(lines[3].unit_price, 180.0);
        assert_eq!(Material::Sand.unit(), "m³");
        assert!(!Material::Gravel.is_counted());
    }

    #[test]
    fn test_negative_contingency_is_arithmetic() {
        let q = MaterialQuantities { bricks: 100, ..Default::default() };
        let s = compute_cost(&q, &PriceTable::default(), -10.0);
        assert!((s.final_cost - 1350.0).abs() < 1e-9);
    }
}
