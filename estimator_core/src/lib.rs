//! # estimator_core - Construction Material and Cost Estimation Engine
//!
//! `estimator_core` turns building dimensions into material quantities
//! (bricks, cement, sand, steel, gravel), prices them against an editable
//! price table, and keeps the results as projects in a local store. All
//! inputs and outputs are JSON-serializable.
//!
//! ## Design Philosophy
//!
//! - **Pure formulas**: quantity and cost functions take inputs and return results
//! - **Frozen quantities**: repricing a project never recomputes its materials
//! - **Rich Errors**: Structured error types, not just strings
//! - **Injected storage**: the engine talks to an [`EstimateStore`], not a database
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::Utc;
//! use estimator_core::{BuildingSpec, Defaults, EstimateStore, MemoryStore};
//! use estimator_core::project::estimate;
//!
//! let mut store = MemoryStore::new();
//! let defaults = Defaults::new();
//! let settings = defaults.get_or_init(&mut store).unwrap().clone();
//!
//! let spec = BuildingSpec { include_slab: true, ..BuildingSpec::new(15.0, 12.0, 1) };
//! let project = estimate(&spec, &settings, Some("Villa"), Utc::now()).unwrap();
//! let saved = store.insert_project(project).unwrap();
//!
//! assert!(saved.id().is_some());
//! assert_eq!(saved.quantities().cement_bags, 258);
//! ```
//!
//! ## Modules
//!
//! - [`calculations`] - Whole-building and single-component quantity formulas
//! - [`pricing`] - Price table and application settings
//! - [`cost`] - Cost aggregation and contingency
//! - [`project`] - Persisted estimate records
//! - [`store`] - Storage trait and in-memory store
//! - [`file_io`] - JSON directory store with atomic saves and locking
//! - [`backup`] - Export and restore of a whole store
//! - [`analytics`] - Portfolio statistics and project comparison
//! - [`report`] - Text and PDF reports
//! - [`errors`] - Structured error types

pub mod analytics;
pub mod backup;
pub mod calculations;
pub mod cost;
pub mod errors;
pub mod file_io;
pub mod pricing;
pub mod project;
pub mod report;
pub mod store;

// Re-export commonly used types at crate root for convenience
pub use calculations::{compute_materials, BuildingSpec, MaterialQuantities, RoofType};
pub use cost::{compute_cost, CostSummary, Material};
pub use errors::{EstimateError, EstimateResult};
pub use file_io::{FileLock, JsonFileStore};
pub use pricing::{get_or_init_defaults, AppSettings, Defaults, PriceTable};
pub use project::{estimate, Project};
pub use store::{EstimateStore, MemoryStore};
