//! # Construction Estimator CLI
//!
//! Estimate material quantities and costs for a building, keep the results
//! as projects in a local data directory, and produce reports.

mod output;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use estimator_core::analytics::{compare, PortfolioAnalytics};
use estimator_core::backup::{import_backup, read_backup_file, write_backup_file};
use estimator_core::calculations::{
    foundation, slab, wall, FoundationInput, SlabInput, WallInput,
};
use estimator_core::pricing::validate_contingency;
use estimator_core::report::{render_pdf, render_text};
use estimator_core::{
    estimate, BuildingSpec, Defaults, EstimateStore, JsonFileStore, PriceTable, RoofType,
};

#[derive(Parser)]
#[command(name = "estimator")]
#[command(about = "Construction material and cost estimator")]
struct Cli {
    /// Directory holding settings and saved projects
    #[arg(long, env = "ESTIMATOR_DATA_DIR", default_value = "estimator_data", global = true)]
    data_dir: PathBuf,

    /// Log debug events to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Component(ComponentCommand),

    #[command(flatten)]
    Store(StoreCommand),
}

/// Single-component tools; these never touch the data directory.
#[derive(Subcommand)]
enum ComponentCommand {
    /// Materials for a single wall
    Wall {
        /// Wall length (m)
        #[arg(long)]
        length: f64,

        /// Wall height (m)
        #[arg(long)]
        height: f64,

        /// Wall thickness (cm)
        #[arg(long, default_value_t = wall::DEFAULT_THICKNESS_CM)]
        thickness: f64,

        #[arg(long)]
        json: bool,
    },

    /// Materials for a single concrete slab
    Slab {
        /// Slab length (m)
        #[arg(long)]
        length: f64,

        /// Slab width (m)
        #[arg(long)]
        width: f64,

        /// Slab thickness (cm)
        #[arg(long, default_value_t = slab::DEFAULT_THICKNESS_CM)]
        thickness: f64,

        #[arg(long)]
        json: bool,
    },

    /// Materials for a single foundation pad
    Foundation {
        /// Foundation length (m)
        #[arg(long)]
        length: f64,

        /// Foundation width (m)
        #[arg(long)]
        width: f64,

        /// Foundation depth (m)
        #[arg(long, default_value_t = foundation::DEFAULT_DEPTH_M)]
        depth: f64,

        #[arg(long)]
        json: bool,
    },
}

/// Commands that read or write the data directory.
#[derive(Subcommand)]
enum StoreCommand {
    /// Estimate a whole building and save it as a project
    Estimate {
        #[command(flatten)]
        building: BuildingArgs,

        /// Project name (defaults to "Project <length>×<width>")
        #[arg(long)]
        name: Option<String>,

        /// Print the estimate without saving it
        #[arg(long)]
        no_save: bool,

        /// Print the project as JSON
        #[arg(long)]
        json: bool,
    },

    /// List saved projects, newest first
    List {
        /// Only projects whose name contains this text (case-insensitive)
        #[arg(long)]
        search: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Show a saved project
    Show {
        id: Uuid,

        #[arg(long)]
        json: bool,
    },

    /// Change a project's prices or contingency; quantities are kept
    Reprice {
        id: Uuid,

        #[command(flatten)]
        prices: PriceArgs,

        /// Contingency (%)
        #[arg(long)]
        contingency: Option<f64>,

        /// Replace every price with the current settings first
        #[arg(long)]
        use_settings: bool,
    },

    /// Rename a project
    Rename { id: Uuid, name: String },

    /// Delete a project
    Delete { id: Uuid },

    /// Show or change default prices and settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Totals, averages and trends across all projects
    Analytics {
        #[arg(long)]
        json: bool,
    },

    /// Compare two projects
    Compare {
        from: Uuid,
        to: Uuid,

        #[arg(long)]
        json: bool,
    },

    /// Print a project report, or write it as PDF
    Report {
        id: Uuid,

        /// Write a PDF report to this path instead of printing text
        #[arg(long)]
        pdf: Option<PathBuf>,
    },

    /// Export settings and every project to a JSON file
    Backup { path: PathBuf },

    /// Restore settings and projects from a backup file
    Restore { path: PathBuf },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print the current settings
    Show {
        #[arg(long)]
        json: bool,
    },

    /// Update prices or defaults
    Set {
        #[command(flatten)]
        prices: PriceArgs,

        /// Default wall thickness (cm)
        #[arg(long)]
        wall_thickness: Option<f64>,

        /// Default ceiling height (m)
        #[arg(long)]
        ceiling_height: Option<f64>,

        /// Default contingency (%)
        #[arg(long)]
        contingency: Option<f64>,

        /// Show the first-run walkthrough in front ends
        #[arg(long)]
        show_tutorial: Option<bool>,
    },

    /// Restore the seed prices and defaults
    Reset,
}

#[derive(Args)]
struct BuildingArgs {
    /// Building length (m)
    #[arg(long)]
    length: f64,

    /// Building width (m)
    #[arg(long)]
    width: f64,

    /// Number of floors
    #[arg(long, default_value_t = 1)]
    floors: u32,

    /// Wall thickness (cm); defaults to the settings value
    #[arg(long)]
    wall_thickness: Option<f64>,

    /// Ceiling height (m); defaults to the settings value
    #[arg(long)]
    ceiling_height: Option<f64>,

    /// Include a boundary wall around the plot
    #[arg(long)]
    perimeter_wall: bool,

    /// Include a concrete slab per floor
    #[arg(long)]
    slab: bool,

    /// Roof type: concrete, tiles or none
    #[arg(long, default_value = "concrete", value_parser = parse_roof)]
    roof: RoofType,

    #[arg(long)]
    rooms: Option<u32>,

    #[arg(long)]
    bathrooms: Option<u32>,
}

/// Per-material price overrides.
#[derive(Args)]
struct PriceArgs {
    /// Price per brick/block
    #[arg(long)]
    brick: Option<f64>,

    /// Price per 50 kg cement bag
    #[arg(long)]
    cement: Option<f64>,

    /// Price per m³ of sand
    #[arg(long)]
    sand: Option<f64>,

    /// Price per kg of steel
    #[arg(long)]
    steel: Option<f64>,

    /// Price per m³ of gravel
    #[arg(long)]
    gravel: Option<f64>,
}

impl PriceArgs {
    fn apply(&self, base: PriceTable) -> PriceTable {
        PriceTable {
            brick: self.brick.unwrap_or(base.brick),
            cement_bag: self.cement.unwrap_or(base.cement_bag),
            sand_m3: self.sand.unwrap_or(base.sand_m3),
            steel_kg: self.steel.unwrap_or(base.steel_kg),
            gravel_m3: self.gravel.unwrap_or(base.gravel_m3),
        }
    }
}

fn parse_roof(s: &str) -> Result<RoofType, String> {
    RoofType::from_str_loose(s)
        .ok_or_else(|| format!("unknown roof type '{}' (concrete, tiles, none)", s))
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_store(data_dir: &Path) -> Result<JsonFileStore> {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "estimator".to_string());
    JsonFileStore::open(data_dir, user)
        .with_context(|| format!("opening data directory {}", data_dir.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    debug!(data_dir = %cli.data_dir.display(), "starting");

    match cli.command {
        Commands::Component(tool) => run_component(tool),
        Commands::Store(command) => run_with_store(&cli.data_dir, command),
    }
}

fn run_component(tool: ComponentCommand) -> Result<()> {
    match tool {
        ComponentCommand::Wall { length, height, thickness, json } => {
            let input = WallInput {
                thickness_cm: thickness,
                ..WallInput::new("", length, height)
            };
            let result = wall::calculate(&input)?;
            if json {
                output::print_json(&result)?;
            } else {
                output::print_wall(&result);
            }
        }

        ComponentCommand::Slab { length, width, thickness, json } => {
            let input = SlabInput {
                thickness_cm: thickness,
                ..SlabInput::new("", length, width)
            };
            let result = slab::calculate(&input)?;
            if json {
                output::print_json(&result)?;
            } else {
                output::print_slab(&result);
            }
        }

        ComponentCommand::Foundation { length, width, depth, json } => {
            let input = FoundationInput {
                depth_m: depth,
                ..FoundationInput::new("", length, width)
            };
            let result = foundation::calculate(&input)?;
            if json {
                output::print_json(&result)?;
            } else {
                output::print_foundation(&result);
            }
        }
    }

    Ok(())
}

fn run_with_store(data_dir: &Path, command: StoreCommand) -> Result<()> {
    let mut store = open_store(data_dir)?;
    let mut defaults = Defaults::new();

    match command {
        StoreCommand::Estimate { building, name, no_save, json } => {
            let settings = defaults.get_or_init(&mut store)?.clone();
            let spec = BuildingSpec {
                length_m: building.length,
                width_m: building.width,
                floors: building.floors,
                wall_thickness_cm: building
                    .wall_thickness
                    .unwrap_or(settings.default_wall_thickness_cm),
                ceiling_height_m: building
                    .ceiling_height
                    .unwrap_or(settings.default_ceiling_height_m),
                include_perimeter_wall: building.perimeter_wall,
                include_slab: building.slab,
                roof_type: building.roof,
                rooms: building.rooms,
                bathrooms: building.bathrooms,
            };

            let mut project = estimate(&spec, &settings, name.as_deref(), Utc::now())?;
            if !no_save {
                project = store.insert_project(project)?;
            }

            if json {
                output::print_json(&project)?;
            } else {
                print!("{}", render_text(&project));
                if let Some(id) = project.id() {
                    println!();
                    println!("Saved as {}", id);
                }
            }
        }

        StoreCommand::List { search, json } => {
            let mut projects = store.list_projects()?;
            if let Some(term) = search {
                projects.retain(|p| p.name_matches(&term));
            }
            if json {
                output::print_json(&projects)?;
            } else {
                output::print_project_list(&projects);
            }
        }

        StoreCommand::Show { id, json } => {
            let project = store.require_project(id)?;
            if json {
                output::print_json(&project)?;
            } else {
                print!("{}", render_text(&project));
            }
        }

        StoreCommand::Reprice { id, prices, contingency, use_settings } => {
            let mut project = store.require_project(id)?;
            let base = if use_settings {
                defaults.get_or_init(&mut store)?.prices
            } else {
                *project.prices()
            };
            let new_prices = prices.apply(base);
            let contingency = contingency.unwrap_or(project.cost().contingency_percent);

            new_prices.validate()?;
            validate_contingency(contingency)?;

            project.reprice(new_prices, contingency, Utc::now());
            store.update_project(&project)?;
            print!("{}", render_text(&project));
        }

        StoreCommand::Rename { id, name } => {
            let mut project = store.require_project(id)?;
            project.rename(&name, Utc::now());
            store.update_project(&project)?;
            println!("Renamed {} to \"{}\"", id, project.name());
        }

        StoreCommand::Delete { id } => {
            if !store.delete_project(id)? {
                bail!("no project with id {}", id);
            }
            println!("Deleted {}", id);
        }

        StoreCommand::Settings { action } => match action {
            SettingsAction::Show { json } => {
                let settings = defaults.get_or_init(&mut store)?;
                if json {
                    output::print_json(settings)?;
                } else {
                    output::print_settings(settings);
                }
            }
            SettingsAction::Set {
                prices,
                wall_thickness,
                ceiling_height,
                contingency,
                show_tutorial,
            } => {
                let mut settings = defaults.get_or_init(&mut store)?.clone();
                settings.prices = prices.apply(settings.prices);
                if let Some(t) = wall_thickness {
                    settings.default_wall_thickness_cm = t;
                }
                if let Some(h) = ceiling_height {
                    settings.default_ceiling_height_m = h;
                }
                if let Some(c) = contingency {
                    settings.default_contingency_percent = c;
                }
                if let Some(show) = show_tutorial {
                    settings.show_tutorial = show;
                }

                let saved = defaults.replace(&mut store, settings, Utc::now())?;
                output::print_settings(saved);
            }
            SettingsAction::Reset => {
                let saved = defaults.reset(&mut store, Utc::now())?;
                output::print_settings(saved);
            }
        },

        StoreCommand::Analytics { json } => {
            let projects = store.list_projects()?;
            match PortfolioAnalytics::from_projects(&projects, Utc::now()) {
                Some(stats) if json => output::print_json(&stats)?,
                Some(stats) => output::print_analytics(&stats),
                None => println!("No saved projects yet."),
            }
        }

        StoreCommand::Compare { from, to, json } => {
            let a = store.require_project(from)?;
            let b = store.require_project(to)?;
            let cmp = compare(&a, &b);
            if json {
                output::print_json(&cmp)?;
            } else {
                output::print_comparison(&cmp);
            }
        }

        StoreCommand::Report { id, pdf } => {
            let project = store.require_project(id)?;
            match pdf {
                Some(path) => {
                    let bytes = render_pdf(&project)?;
                    fs::write(&path, bytes)
                        .with_context(|| format!("writing {}", path.display()))?;
                    println!("Wrote {}", path.display());
                }
                None => print!("{}", render_text(&project)),
            }
        }

        StoreCommand::Backup { path } => {
            let backup = write_backup_file(&mut store, &path, Utc::now())?;
            println!("Backed up {} project(s) to {}", backup.projects.len(), path.display());
        }

        StoreCommand::Restore { path } => {
            let backup = read_backup_file(&path)?;
            let imported = import_backup(&mut store, backup)?;
            println!("Restored {} project(s) from {}", imported, path.display());
        }
    }

    Ok(())
}
