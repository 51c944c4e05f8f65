//! Console formatting for command results.

use chrono::Month;
use estimator_core::analytics::{PortfolioAnalytics, ProjectComparison};
use estimator_core::calculations::{FoundationResult, SlabResult, WallResult};
use estimator_core::cost::Material;
use estimator_core::pricing::AppSettings;
use estimator_core::report::{format_amount, format_quantity};
use estimator_core::Project;
use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_project_list(projects: &[Project]) {
    if projects.is_empty() {
        println!("No saved projects. Run 'estimate' to create one.");
        return;
    }

    println!(
        "{:<36}  {:<24} {:<10} {:>10} {:>16}",
        "ID", "Name", "Created", "Area m²", "Final cost"
    );
    println!("{}", "-".repeat(100));
    for p in projects {
        let id = p.id().map(|id| id.to_string()).unwrap_or_default();
        println!(
            "{:<36}  {:<24} {:<10} {:>10.2} {:>16}",
            id,
            truncate(p.name(), 24),
            p.created_at().format("%Y-%m-%d"),
            p.floor_area_m2(),
            format_amount(p.cost().final_cost)
        );
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max - 1).collect();
        out.push('…');
        out
    }
}

pub fn print_wall(result: &WallResult) {
    println!("Wall");
    println!("  Area:     {:.2} m²", result.area_m2);
    println!("  Volume:   {:.2} m³", result.volume_m3);
    println!("  Bricks:   {}", result.bricks);
    println!("  Cement:   {} bags", result.cement_bags);
    println!("  Sand:     {:.2} m³", result.sand_m3);
    println!("  Mortar:   {:.2} m³", result.mortar_m3);
}

pub fn print_slab(result: &SlabResult) {
    println!("Slab");
    println!("  Volume:   {:.2} m³", result.volume_m3);
    println!("  Cement:   {} bags", result.cement_bags);
    println!("  Sand:     {:.2} m³", result.sand_m3);
    println!("  Gravel:   {:.2} m³", result.gravel_m3);
    println!("  Steel:    {} kg", result.steel_kg);
}

pub fn print_foundation(result: &FoundationResult) {
    println!("Foundation");
    println!("  Volume:   {:.2} m³", result.volume_m3);
    println!("  Cement:   {} bags", result.cement_bags);
    println!("  Sand:     {:.2} m³", result.sand_m3);
    println!("  Gravel:   {:.2} m³", result.gravel_m3);
    println!("  Steel:    {} kg", result.steel_kg);
}

pub fn print_settings(settings: &AppSettings) {
    println!("Prices");
    for material in Material::ALL {
        println!(
            "  {:<15} {:>12} per {}",
            material.display_name(),
            format_amount(material.price_in(&settings.prices)),
            material.unit()
        );
    }
    println!();
    println!("Defaults");
    println!("  Wall thickness:  {} cm", settings.default_wall_thickness_cm);
    println!("  Ceiling height:  {} m", settings.default_ceiling_height_m);
    println!("  Contingency:     {}%", settings.default_contingency_percent);
    println!("  Show tutorial:   {}", settings.show_tutorial);
    match settings.last_backup_at {
        Some(at) => println!("  Last backup:     {}", at.format("%Y-%m-%d %H:%M UTC")),
        None => println!("  Last backup:     never"),
    }
}

pub fn print_analytics(stats: &PortfolioAnalytics) {
    println!("Projects:              {}", stats.total_projects);
    println!("Total cost:            {}", format_amount(stats.total_cost));
    println!("Average cost:          {}", format_amount(stats.average_cost));
    println!("Average floor area:    {:.2} m²", stats.average_area_m2);
    println!("Average cost per m²:   {}", format_amount(stats.average_cost_per_m2));
    println!();

    println!("{:<15} {:>16} {:>8}", "Material", "Spend", "Share");
    for (spend, (_, share)) in stats.material_breakdown.iter().zip(stats.material_shares()) {
        println!(
            "{:<15} {:>16} {:>7.1}%",
            spend.material.display_name(),
            format_amount(spend.cost),
            share
        );
    }
    println!();

    println!("{:<10} {:>8} {:>16}", "Month", "Projects", "Cost");
    for bucket in &stats.monthly {
        let month = u8::try_from(bucket.month)
            .ok()
            .and_then(|m| Month::try_from(m).ok())
            .map(|m| m.name()[..3].to_string())
            .unwrap_or_else(|| bucket.month.to_string());
        println!(
            "{:<10} {:>8} {:>16}",
            format!("{} {}", month, bucket.year),
            bucket.projects,
            format_amount(bucket.cost)
        );
    }
}

pub fn print_comparison(cmp: &ProjectComparison) {
    println!("{}  →  {}", cmp.from_name, cmp.to_name);
    println!();
    let pct = cmp
        .cost_difference_percent
        .map(|p| format!(" ({:+.1}%)", p))
        .unwrap_or_default();
    println!("Cost difference:   {}{}", signed_amount(cmp.cost_difference), pct);
    println!("Area difference:   {:+.2} m²", cmp.area_difference_m2);
    println!();

    println!("{:<15} {:>12} {:>12} {:>12}", "Material", "From", "To", "Change");
    for delta in &cmp.quantities {
        let change = format_quantity(delta.material, delta.difference.abs());
        let sign = if delta.difference < 0.0 { "-" } else { "+" };
        println!(
            "{:<15} {:>12} {:>12} {:>12}",
            delta.material.display_name(),
            format_quantity(delta.material, delta.from),
            format_quantity(delta.material, delta.to),
            format!("{}{}", sign, change)
        );
    }
}

fn signed_amount(value: f64) -> String {
    if value < 0.0 {
        format_amount(value)
    } else {
        format!("+{}", format_amount(value))
    }
}
