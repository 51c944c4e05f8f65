//! # Project Records
//!
//! A `Project` is the persisted result of one whole-building estimate:
//! the inputs, the material quantities computed from them, the prices in
//! force at the time, and the resulting costs.
//!
//! ## Structure
//!
//! ```text
//! Project
//! ├── id: Option<Uuid>          (assigned by the store on first save)
//! ├── name, created_at, updated_at
//! ├── building: BuildingSpec    (frozen)
//! ├── quantities: MaterialQuantities  (frozen)
//! ├── prices: PriceTable        (editable)
//! └── cost: CostSummary         (recomputed from prices + contingency)
//! ```
//!
//! Quantities are fixed when the project is assembled. Editing prices or the
//! contingency afterwards re-runs only the cost aggregation.
//!
//! ## Example
//!
//! ```rust
//! use chrono::Utc;
//! use estimator_core::calculations::BuildingSpec;
//! use estimator_core::pricing::AppSettings;
//! use estimator_core::project::estimate;
//!
//! let spec = BuildingSpec { include_slab: true, ..BuildingSpec::new(15.0, 12.0, 1) };
//! let project = estimate(&spec, &AppSettings::default(), None, Utc::now()).unwrap();
//!
//! assert_eq!(project.name(), "Project 15×12");
//! assert_eq!(project.quantities().bricks, 12960);
//! assert!(project.id().is_none());
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calculations::{compute_materials, BuildingSpec, MaterialQuantities};
use crate::cost::{compute_cost, CostSummary};
use crate::errors::EstimateResult;
use crate::pricing::{AppSettings, PriceTable};

/// Current schema version for persisted records
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Persisted estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<Uuid>,

    name: String,

    created_at: DateTime<Utc>,

    updated_at: DateTime<Utc>,

    building: BuildingSpec,

    quantities: MaterialQuantities,

    prices: PriceTable,

    cost: CostSummary,
}

/// Name used when the caller supplies none, e.g. "Project 15×12".
pub fn default_name(spec: &BuildingSpec) -> String {
    format!("Project {}×{}", spec.length_m, spec.width_m)
}

/// Assemble an unsaved project from already-computed quantities.
///
/// Pure apart from the supplied timestamp; persisting is the caller's job.
/// A missing or blank `name` falls back to [`default_name`].
pub fn assemble_project(
    spec: &BuildingSpec,
    quantities: MaterialQuantities,
    prices: PriceTable,
    contingency_percent: f64,
    name: Option<&str>,
    now: DateTime<Utc>,
) -> Project {
    let name = match name.map(str::trim) {
        Some(n) if !n.is_empty() => n.to_string(),
        _ => default_name(spec),
    };

    Project {
        id: None,
        name,
        created_at: now,
        updated_at: now,
        building: spec.clone(),
        quantities,
        prices,
        cost: compute_cost(&quantities, &prices, contingency_percent),
    }
}

/// Validate `spec`, compute its materials and assemble a project priced with
/// the current settings.
pub fn estimate(
    spec: &BuildingSpec,
    settings: &AppSettings,
    name: Option<&str>,
    now: DateTime<Utc>,
) -> EstimateResult<Project> {
    spec.validate()?;
    let quantities = compute_materials(spec);
    Ok(assemble_project(
        spec,
        quantities,
        settings.prices,
        settings.default_contingency_percent,
        name,
        now,
    ))
}

impl Project {
    pub fn id(&self) -> Option<Uuid> {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn building(&self) -> &BuildingSpec {
        &self.building
    }

    pub fn quantities(&self) -> &MaterialQuantities {
        &self.quantities
    }

    pub fn prices(&self) -> &PriceTable {
        &self.prices
    }

    pub fn cost(&self) -> &CostSummary {
        &self.cost
    }

    /// Footprint area (m²)
    pub fn floor_area_m2(&self) -> f64 {
        self.building.floor_area_m2()
    }

    /// Apply new prices and contingency. Quantities are left as they were.
    pub fn reprice(&mut self, prices: PriceTable, contingency_percent: f64, now: DateTime<Utc>) {
        self.prices = prices;
        self.cost = compute_cost(&self.quantities, &self.prices, contingency_percent);
        self.updated_at = now;
    }

    /// Change only the contingency.
    pub fn set_contingency(&mut self, contingency_percent: f64, now: DateTime<Utc>) {
        self.reprice(self.prices, contingency_percent, now);
    }

    /// Rename; a blank name falls back to the default.
    pub fn rename(&mut self, name: &str, now: DateTime<Utc>) {
        let trimmed = name.trim();
        self.name = if trimmed.is_empty() {
            default_name(&self.building)
        } else {
            trimmed.to_string()
        };
        self.updated_at = now;
    }

    /// Case-insensitive substring match on the name; an empty term matches all.
    pub fn name_matches(&self, term: &str) -> bool {
        self.name.to_lowercase().contains(&term.trim().to_lowercase())
    }

    /// Called by stores when the record is first saved.
    pub(crate) fn assign_id(&mut self, id: Uuid) {
        self.id = Some(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn reference_spec() -> BuildingSpec {
        BuildingSpec {
            include_slab: true,
            ..BuildingSpec::new(15.0, 12.0, 1)
        }
    }

    #[test]
    fn test_assemble_stamps_both_timestamps() {
        let now = Utc::now();
        let spec = reference_spec();
        let project = assemble_project(
            &spec,
            compute_materials(&spec),
            PriceTable::default(),
            10.0,
            Some("House"),
            now,
        );
        assert_eq!(project.name(), "House");
        assert_eq!(project.created_at(), now);
        assert_eq!(project.updated_at(), now);
        assert_eq!(project.building(), &spec);
        assert!(project.id().is_none());
    }

    #[test]
    fn test_default_name_embeds_dimensions() {
        let spec = BuildingSpec::new(12.5, 8.0, 2);
        assert_eq!(default_name(&spec), "Project 12.5×8");

        let project = assemble_project(
            &spec,
            compute_materials(&spec),
            PriceTable::default(),
            0.0,
            Some("   "),
            Utc::now(),
        );
        assert_eq!(project.name(), "Project 12.5×8");
    }

    #[test]
    fn test_estimate_uses_settings() {
        let settings = AppSettings {
            default_contingency_percent: 20.0,
            ..AppSettings::default()
        };
        let project = estimate(&reference_spec(), &settings, None, Utc::now()).unwrap();
        assert_eq!(project.cost().contingency_percent, 20.0);
        assert_eq!(project.prices(), &settings.prices);
        assert_eq!(project.quantities().cement_bags, 258);
    }

    #[test]
    fn test_estimate_rejects_invalid_spec() {
        let spec = BuildingSpec::new(10.0, -2.0, 1);
        assert!(estimate(&spec, &AppSettings::default(), None, Utc::now()).is_err());
    }

    #[test]
    fn test_contingency_edit_keeps_quantities() {
        // Prices chosen so the material total is exactly 100 000
        let quantities = MaterialQuantities {
            bricks: 2000,
            cement_bags: 50,
            sand_m3: 0.0,
            steel_kg: 0,
            gravel_m3: 0.0,
        };
        let prices = PriceTable {
            brick: 30.0,
            cement_bag: 800.0,
            ..PriceTable::default()
        };
        let created = Utc::now();
        let spec = BuildingSpec::new(10.0, 10.0, 1);
        let mut project = assemble_project(&spec, quantities, prices, 10.0, None, created);
        assert!((project.cost().total_material_cost - 100_000.0).abs() < 1e-9);
        assert!((project.cost().final_cost - 110_000.0).abs() < 1e-6);

        let later = created + Duration::minutes(5);
        project.set_contingency(15.0, later);

        assert!((project.cost().final_cost - 115_000.0).abs() < 1e-6);
        assert_eq!(project.quantities(), &quantities);
        assert_eq!(project.updated_at(), later);
        assert_eq!(project.created_at(), created);
    }

    #[test]
    fn test_reprice_recomputes_from_frozen_quantities() {
        let spec = reference_spec();
        let mut project = estimate(&spec, &AppSettings::default(), None, Utc::now()).unwrap();
        let before = *project.quantities();

        let doubled = PriceTable {
            brick: 30.0,
            cement_bag: 1600.0,
            sand_m3: 7000.0,
            steel_kg: 360.0,
            gravel_m3: 8000.0,
        };
        let old_total = project.cost().total_material_cost;
        project.reprice(doubled, 10.0, Utc::now());

        assert_eq!(project.quantities(), &before);
        assert!((project.cost().total_material_cost - 2.0 * old_total).abs() < 1e-6);
    }

    #[test]
    fn test_rename() {
        let settings = AppSettings::default();
        let mut project = estimate(&reference_spec(), &settings, Some("Old"), Utc::now()).unwrap();
        project.rename("New villa", Utc::now());
        assert_eq!(project.name(), "New villa");
        project.rename("", Utc::now());
        assert_eq!(project.name(), "Project 15×12");
    }

    #[test]
    fn test_project_serialization() {
        let settings = AppSettings::default();
        let mut project =
            estimate(&reference_spec(), &settings, Some("Villa"), Utc::now()).unwrap();
        let unsaved = serde_json::to_string(&project).unwrap();
        assert!(!unsaved.contains("\"id\""));

        project.assign_id(Uuid::new_v4());
        let json = serde_json::to_string_pretty(&project).unwrap();
        assert!(json.contains("\"cement_bags\": 258"));

        let roundtrip: Project = serde_json::from_str(&json).unwrap();
        assert_eq!(roundtrip, project);
    }

    #[test]
    fn test_name_search_ignores_case() {
        let settings = AppSettings::default();
        let project =
            estimate(&reference_spec(), &settings, Some("Garden Villa"), Utc::now()).unwrap();

        assert!(project.name_matches("villa"));
        assert!(project.name_matches("GARDEN"));
        assert!(project.name_matches("den vi"));
        assert!(project.name_matches(""));
        assert!(!project.name_matches("annex"));
    }
}
