//! # Pricing and Construction Defaults
//!
//! Unit prices and default construction parameters. The persisted
//! [`AppSettings`] record is created once per install with fixed seed values
//! and read thereafter.
//!
//! Rather than a process-wide global, callers own a [`Defaults`] handle: it
//! loads (or initialises) the settings from an [`EstimateStore`] the first
//! time it is asked and hands out a reference afterwards.
//!
//! ## Example
//!
//! ```rust
//! use estimator_core::pricing::Defaults;
//! use estimator_core::store::MemoryStore;
//!
//! let mut store = MemoryStore::new();
//! let defaults = Defaults::new();
//!
//! let settings = defaults.get_or_init(&mut store).unwrap();
//! assert_eq!(settings.prices.cement_bag, 800.0);
//! assert_eq!(settings.default_contingency_percent, 10.0);
//! ```

use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::errors::{ensure_non_negative, EstimateResult};
use crate::store::EstimateStore;

/// Seed price per brick
pub const SEED_BRICK_PRICE: f64 = 15.0;
/// Seed price per 50 kg cement bag
pub const SEED_CEMENT_BAG_PRICE: f64 = 800.0;
/// Seed price per m³ of sand
pub const SEED_SAND_M3_PRICE: f64 = 3500.0;
/// Seed price per kg of steel
pub const SEED_STEEL_KG_PRICE: f64 = 180.0;
/// Seed price per m³ of gravel
pub const SEED_GRAVEL_M3_PRICE: f64 = 4000.0;

/// Seed wall thickness (cm)
pub const SEED_WALL_THICKNESS_CM: f64 = 20.0;
/// Seed ceiling height (m)
pub const SEED_CEILING_HEIGHT_M: f64 = 3.0;
/// Seed contingency (%)
pub const SEED_CONTINGENCY_PERCENT: f64 = 10.0;

/// Unit price of each material, in a single unnamed currency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceTable {
    /// Per brick/block
    pub brick: f64,
    /// Per 50 kg cement bag
    pub cement_bag: f64,
    /// Per m³ of sand
    pub sand_m3: f64,
    /// Per kg of steel
    pub steel_kg: f64,
    /// Per m³ of gravel
    pub gravel_m3: f64,
}

impl Default for PriceTable {
    fn default() -> Self {
        PriceTable {
            brick: SEED_BRICK_PRICE,
            cement_bag: SEED_CEMENT_BAG_PRICE,
            sand_m3: SEED_SAND_M3_PRICE,
            steel_kg: SEED_STEEL_KG_PRICE,
            gravel_m3: SEED_GRAVEL_M3_PRICE,
        }
    }
}

impl PriceTable {
    /// All prices must be finite and non-negative.
    pub fn validate(&self) -> EstimateResult<()> {
        ensure_non_negative("brick", self.brick)?;
        ensure_non_negative("cement_bag", self.cement_bag)?;
        ensure_non_negative("sand_m3", self.sand_m3)?;
        ensure_non_negative("steel_kg", self.steel_kg)?;
        ensure_non_negative("gravel_m3", self.gravel_m3)?;
        Ok(())
    }
}

/// Contingency must be finite and non-negative when entered by a user.
pub fn validate_contingency(contingency_percent: f64) -> EstimateResult<()> {
    ensure_non_negative("contingency_percent", contingency_percent)
}

/// Install-wide settings record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    /// Prices applied to new projects
    pub prices: PriceTable,

    pub default_wall_thickness_cm: f64,

    pub default_ceiling_height_m: f64,

    pub default_contingency_percent: f64,

    /// Front-end preference: show the first-run walkthrough
    #[serde(default = "default_show_tutorial")]
    pub show_tutorial: bool,

    /// When the last backup was exported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_backup_at: Option<DateTime<Utc>>,

    pub updated_at: DateTime<Utc>,
}

fn default_show_tutorial() -> bool {
    true
}

impl Default for AppSettings {
    fn default() -> Self {
        AppSettings {
            prices: PriceTable::default(),
            default_wall_thickness_cm: SEED_WALL_THICKNESS_CM,
            default_ceiling_height_m: SEED_CEILING_HEIGHT_M,
            default_contingency_percent: SEED_CONTINGENCY_PERCENT,
            show_tutorial: true,
            last_backup_at: None,
            updated_at: Utc::now(),
        }
    }
}

impl AppSettings {
    pub fn validate(&self) -> EstimateResult<()> {
        self.prices.validate()?;
        ensure_non_negative("default_wall_thickness_cm", self.default_wall_thickness_cm)?;
        ensure_non_negative("default_ceiling_height_m", self.default_ceiling_height_m)?;
        validate_contingency(self.default_contingency_percent)?;
        Ok(())
    }
}

/// Return the stored settings, creating the seed record if none exists.
///
/// Fails if the seed cannot be persisted; callers never continue with
/// in-memory-only defaults.
pub fn get_or_init_defaults<S: EstimateStore + ?Sized>(
    store: &mut S,
) -> EstimateResult<AppSettings> {
    store.init_settings_if_absent(AppSettings::default())
}

/// Load-once handle over the persisted [`AppSettings`].
#[derive(Debug, Default)]
pub struct Defaults {
    settings: OnceCell<AppSettings>,
}

impl Defaults {
    pub fn new() -> Self {
        Defaults {
            settings: OnceCell::new(),
        }
    }

    /// Settings, loading or seeding them from `store` on first use.
    pub fn get_or_init<S: EstimateStore + ?Sized>(
        &self,
        store: &mut S,
    ) -> EstimateResult<&AppSettings> {
        self.settings.get_or_try_init(|| get_or_init_defaults(store))
    }

    /// Settings if already loaded.
    pub fn get(&self) -> Option<&AppSettings> {
        self.settings.get()
    }

    /// Validate, persist and cache new settings.
    pub fn replace<S: EstimateStore + ?Sized>(
        &mut self,
        store: &mut S,
        mut settings: AppSettings,
        now: DateTime<Utc>,
    ) -> EstimateResult<&AppSettings> {
        settings.validate()?;
        settings.updated_at = now;
        store.save_settings(&settings)?;

        self.settings = OnceCell::new();
        Ok(self.settings.get_or_init(|| settings))
    }

    /// Restore the seed prices and construction parameters.
    ///
    /// Front-end state (`show_tutorial`, `last_backup_at`) is kept.
    pub fn reset<S: EstimateStore + ?Sized>(
        &mut self,
        store: &mut S,
        now: DateTime<Utc>,
    ) -> EstimateResult<&AppSettings> {
        let current = self.get_or_init(store)?;
        let seeded = AppSettings {
            show_tutorial: current.show_tutorial,
            last_backup_at: current.last_backup_at,
            ..AppSettings::default()
        };
        self.replace(store, seeded, now)
    }
}
