//! # Portfolio Analytics
//!
//! Aggregates across saved projects: totals and averages, spend per material,
//! a six-month activity trend, and side-by-side comparison of two projects.
//! All figures are derived from the stored costs and quantities; nothing is
//! recomputed from building inputs.

use chrono::{DateTime, Datelike, Months, Utc};
use serde::{Deserialize, Serialize};

use crate::cost::Material;
use crate::project::Project;

/// Number of monthly buckets in [`PortfolioAnalytics::monthly`]
pub const TREND_MONTHS: u32 = 6;

/// Spend on one material across all projects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaterialSpend {
    pub material: Material,
    pub cost: f64,
}

/// Projects created in one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyBucket {
    pub year: i32,
    /// 1-12
    pub month: u32,
    pub projects: usize,
    /// Σ final cost
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioAnalytics {
    pub total_projects: usize,
    /// Σ final cost
    pub total_cost: f64,
    pub average_cost: f64,
    pub average_area_m2: f64,
    /// Average cost over average footprint; 0 when the footprint average is 0
    pub average_cost_per_m2: f64,
    pub material_breakdown: Vec<MaterialSpend>,
    /// Oldest first, ending with the month containing `now`
    pub monthly: Vec<MonthlyBucket>,
}

impl PortfolioAnalytics {
    /// Aggregate `projects`; `None` when there are none.
    pub fn from_projects(projects: &[Project], now: DateTime<Utc>) -> Option<Self> {
        if projects.is_empty() {
            return None;
        }

        let count = projects.len() as f64;
        let total_cost: f64 = projects.iter().map(|p| p.cost().final_cost).sum();
        let average_cost = total_cost / count;
        let average_area_m2 = projects.iter().map(|p| p.floor_area_m2()).sum::<f64>() / count;
        let average_cost_per_m2 = if average_area_m2 > 0.0 {
            average_cost / average_area_m2
        } else {
            0.0
        };

        let material_breakdown = Material::ALL
            .iter()
            .map(|&material| MaterialSpend {
                material,
                cost: projects
                    .iter()
                    .map(|p| material.quantity_in(p.quantities()) * material.price_in(p.prices()))
                    .sum(),
            })
            .collect();

        Some(PortfolioAnalytics {
            total_projects: projects.len(),
            total_cost,
            average_cost,
            average_area_m2,
            average_cost_per_m2,
            material_breakdown,
            monthly: monthly_trend(projects, now),
        })
    }

    /// Share of total material spend per material, in percent.
    pub fn material_shares(&self) -> Vec<(Material, f64)> {
        let total: f64 = self.material_breakdown.iter().map(|m| m.cost).sum();
        self.material_breakdown
            .iter()
            .map(|m| {
                let share = if total > 0.0 { m.cost / total * 100.0 } else { 0.0 };
                (m.material, share)
            })
            .collect()
    }
}

fn monthly_trend(projects: &[Project], now: DateTime<Utc>) -> Vec<MonthlyBucket> {
    (0..TREND_MONTHS)
        .rev()
        .filter_map(|back| now.checked_sub_months(Months::new(back)))
        .map(|date| {
            let in_month: Vec<&Project> = projects
                .iter()
                .filter(|p| {
                    p.created_at().year() == date.year() && p.created_at().month() == date.month()
                })
                .collect();
            MonthlyBucket {
                year: date.year(),
                month: date.month(),
                projects: in_month.len(),
                cost: in_month.iter().map(|p| p.cost().final_cost).sum(),
            }
        })
        .collect()
}

/// Per-material quantity change from one project to another.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuantityDelta {
    pub material: Material,
    pub from: f64,
    pub to: f64,
    pub difference: f64,
}

/// Differences going from project `a` to project `b`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectComparison {
    pub from_name: String,
    pub to_name: String,
    /// b.final − a.final
    pub cost_difference: f64,
    /// Relative to a.final, one decimal; `None` when a.final is 0
    pub cost_difference_percent: Option<f64>,
    /// area(b) − area(a)
    pub area_difference_m2: f64,
    pub quantities: Vec<QuantityDelta>,
}

pub fn compare(a: &Project, b: &Project) -> ProjectComparison {
    let cost_difference = b.cost().final_cost - a.cost().final_cost;
    let cost_difference_percent = if a.cost().final_cost != 0.0 {
        Some(round_one_decimal(cost_difference / a.cost().final_cost * 100.0))
    } else {
        None
    };

    let quantities = Material::ALL
        .iter()
        .map(|&material| {
            let from = material.quantity_in(a.quantities());
            let to = material.quantity_in(b.quantities());
            QuantityDelta {
                material,
                from,
                to,
                difference: to - from,
            }
        })
        .collect();

    ProjectComparison {
        from_name: a.name().to_string(),
        to_name: b.name().to_string(),
        cost_difference,
        cost_difference_percent,
        area_difference_m2: b.floor_area_m2() - a.floor_area_m2(),
        quantities,
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::BuildingSpec;
    use crate::pricing::AppSettings;
    use crate::project::estimate;
    use chrono::TimeZone;

    fn project_at(length: f64, width: f64, created: DateTime<Utc>) -> Project {
        let spec = BuildingSpec {
            include_slab: true,
            ..BuildingSpec::new(length, width, 1)
        };
        estimate(&spec, &AppSettings::default(), None, created).unwrap()
    }

    #[test]
    fn test_empty_portfolio() {
        assert!(PortfolioAnalytics::from_projects(&[], Utc::now()).is_none());
    }

    #[test]
    fn test_totals_and_averages() {
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
        let a = project_at(15.0, 12.0, now);
        let b = project_at(10.0, 9.0, now);
        let stats = PortfolioAnalytics::from_projects(&[a.clone(), b.clone()], now).unwrap();

        let total = a.cost().final_cost + b.cost().final_cost;
        assert_eq!(stats.total_projects, 2);
        assert!((stats.total_cost - total).abs() < 1e-6);
        assert!((stats.average_cost - total / 2.0).abs() < 1e-6);
        assert!((stats.average_area_m2 - 135.0).abs() < 1e-9);
        assert!((stats.average_cost_per_m2 - total / 2.0 / 135.0).abs() < 1e-6);
    }

    #[test]
    fn test_material_breakdown_sums_to_material_totals() {
        let now = Utc::now();
        let projects = vec![project_at(15.0, 12.0, now), project_at(8.0, 6.0, now)];
        let stats = PortfolioAnalytics::from_projects(&projects, now).unwrap();

        assert_eq!(stats.material_breakdown.len(), 5);
        let spend: f64 = stats.material_breakdown.iter().map(|m| m.cost).sum();
        let materials: f64 = projects.iter().map(|p| p.cost().total_material_cost).sum();
        assert!((spend - materials).abs() < 1e-6);

        let shares: f64 = stats.material_shares().iter().map(|(_, s)| s).sum();
        assert!((shares - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_monthly_trend_buckets() {
        let now = Utc.with_ymd_and_hms(2026, 3, 31, 9, 0, 0).unwrap();
        let projects = vec![
            project_at(10.0, 10.0, Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap()),
            project_at(10.0, 10.0, Utc.with_ymd_and_hms(2026, 2, 14, 0, 0, 0).unwrap()),
            project_at(10.0, 10.0, Utc.with_ymd_and_hms(2026, 2, 20, 0, 0, 0).unwrap()),
            project_at(10.0, 10.0, Utc.with_ymd_and_hms(2025, 10, 1, 0, 0, 0).unwrap()),
            // Outside the window
            project_at(10.0, 10.0, Utc.with_ymd_and_hms(2025, 9, 30, 0, 0, 0).unwrap()),
        ];
        let stats = PortfolioAnalytics::from_projects(&projects, now).unwrap();

        let months: Vec<(i32, u32)> = stats.monthly.iter().map(|b| (b.year, b.month)).collect();
        assert_eq!(
            months,
            vec![(2025, 10), (2025, 11), (2025, 12), (2026, 1), (2026, 2), (2026, 3)]
        );
        let counts: Vec<usize> = stats.monthly.iter().map(|b| b.projects).collect();
        assert_eq!(counts, vec![1, 0, 0, 0, 2, 1]);
        assert!((stats.monthly[4].cost - 2.0 * projects[1].cost().final_cost).abs() < 1e-6);
    }

    #[test]
    fn test_compare_projects() {
        let now = Utc::now();
        let small = project_at(10.0, 10.0, now);
        let large = project_at(20.0, 10.0, now);
        let cmp = compare(&small, &large);

        assert!((cmp.area_difference_m2 - 100.0).abs() < 1e-9);
        assert!(cmp.cost_difference > 0.0);
        let pct = cmp.cost_difference_percent.unwrap();
        assert_eq!(pct, round_one_decimal(pct));
        assert_eq!(cmp.quantities.len(), 5);
        assert!(cmp.quantities.iter().all(|d| d.difference >= 0.0));
    }

    #[test]
    fn test_compare_against_zero_cost_project() {
        let now = Utc::now();
        let empty = project_at(0.0, 0.0, now);
        let house = project_at(10.0, 10.0, now);
        let cmp = compare(&empty, &house);
        assert!(cmp.cost_difference_percent.is_none());
        assert!(cmp.cost_difference > 0.0);
    }

    #[test]
    fn test_round_one_decimal() {
        assert_eq!(round_one_decimal(12.345), 12.3);
        assert_eq!(round_one_decimal(-4.06), -4.1);
    }
}
