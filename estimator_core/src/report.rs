//! # Project Reports
//!
//! Human-readable renderings of a saved [`Project`]: a plain-text summary for
//! sharing and a PDF report compiled with Typst. Reports only format the
//! stored figures; they never recompute quantities or costs.
//!
//! ## Example
//!
//! ```rust,no_run
//! use chrono::Utc;
//! use estimator_core::calculations::BuildingSpec;
//! use estimator_core::pricing::AppSettings;
//! use estimator_core::project::estimate;
//! use estimator_core::report::{render_pdf, render_text};
//!
//! let spec = BuildingSpec { include_slab: true, ..BuildingSpec::new(15.0, 12.0, 1) };
//! let project = estimate(&spec, &AppSettings::default(), Some("Villa"), Utc::now()).unwrap();
//!
//! println!("{}", render_text(&project));
//! std::fs::write("villa.pdf", render_pdf(&project).unwrap()).unwrap();
//! ```

use std::fmt::Write as _;

use chrono::{Datelike, Utc};
use typst::diag::{FileError, FileResult};
use typst::foundations::{Bytes, Datetime};
use typst::syntax::{FileId, Source};
use typst::text::{Font, FontBook};
use typst::utils::LazyHash;
use typst::{Library, LibraryExt, World};
use typst_pdf::PdfOptions;

use crate::cost::{line_items, CostLine, Material};
use crate::errors::{EstimateError, EstimateResult};
use crate::project::Project;

// ============================================================================
// Number formatting
// ============================================================================

/// Group the integer part with commas: 1234567.891 -> "1,234,567.89"
pub fn format_amount(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac_part)
}

/// Counts as whole numbers, volumes to two decimals
pub fn format_quantity(material: Material, quantity: f64) -> String {
    if material.is_counted() {
        let whole = format_amount(quantity);
        whole.trim_end_matches(".00").to_string()
    } else {
        format!("{:.2}", quantity)
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

// ============================================================================
// Plain text
// ============================================================================

/// Plain-text summary suitable for sharing.
pub fn render_text(project: &Project) -> String {
    let spec = project.building();
    let cost = project.cost();
    let mut out = String::new();

    // Writing to a String cannot fail
    let _ = writeln!(out, "CONSTRUCTION ESTIMATE: {}", project.name());
    let _ = writeln!(
        out,
        "Created {}  |  Updated {}",
        project.created_at().format("%Y-%m-%d"),
        project.updated_at().format("%Y-%m-%d")
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "Building");
    let _ = writeln!(
        out,
        "  Footprint:       {} m × {} m ({} m²), {} floor(s)",
        spec.length_m,
        spec.width_m,
        spec.floor_area_m2(),
        spec.floors
    );
    let _ = writeln!(out, "  Wall thickness:  {} cm", spec.wall_thickness_cm);
    let _ = writeln!(out, "  Ceiling height:  {} m", spec.ceiling_height_m);
    let _ = writeln!(out, "  Boundary wall:   {}", yes_no(spec.include_perimeter_wall));
    let _ = writeln!(out, "  Concrete slab:   {}", yes_no(spec.include_slab));
    let _ = writeln!(out, "  Roof:            {}", spec.roof_type.display_name());
    if let Some(rooms) = spec.rooms {
        let _ = writeln!(out, "  Rooms:           {}", rooms);
    }
    if let Some(bathrooms) = spec.bathrooms {
        let _ = writeln!(out, "  Bathrooms:       {}", bathrooms);
    }
    let _ = writeln!(out);

    let _ = writeln!(
        out,
        "{:<15} {:>12}  {:<12} {:>12} {:>16}",
        "Material", "Quantity", "Unit", "Unit price", "Cost"
    );
    for line in line_items(project.quantities(), project.prices()) {
        let _ = writeln!(
            out,
            "{:<15} {:>12}  {:<12} {:>12} {:>16}",
            line.material.display_name(),
            format_quantity(line.material, line.quantity),
            line.material.unit(),
            format_amount(line.unit_price),
            format_amount(line.cost)
        );
    }
    let _ = writeln!(out);

    let contingency_label = format!("Contingency ({}%):", cost.contingency_percent);
    let subtotal = format_amount(cost.total_material_cost);
    let _ = writeln!(out, "{:<26}{}", "Materials subtotal:", subtotal);
    let _ = writeln!(out, "{:<26}{}", contingency_label, format_amount(cost.contingency_amount()));
    let _ = writeln!(out, "{:<26}{}", "FINAL COST:", format_amount(cost.final_cost));

    out
}

// ============================================================================
// Typst World Implementation
// ============================================================================

/// A minimal Typst world: one in-memory source, bundled fonts, no files.
struct ReportWorld {
    main: Source,
    book: LazyHash<FontBook>,
    fonts: Vec<Font>,
    library: LazyHash<Library>,
}

impl ReportWorld {
    fn new(source: String) -> Self {
        let fonts: Vec<Font> = typst_assets::fonts()
            .flat_map(|bytes| Font::iter(Bytes::new(bytes.to_vec())))
            .collect();
        let book = FontBook::from_fonts(&fonts);

        ReportWorld {
            main: Source::detached(source),
            book: LazyHash::new(book),
            fonts,
            library: LazyHash::new(Library::default()),
        }
    }
}

impl World for ReportWorld {
    fn library(&self) -> &LazyHash<Library> {
        &self.library
    }

    fn book(&self) -> &LazyHash<FontBook> {
        &self.book
    }

    fn main(&self) -> FileId {
        self.main.id()
    }

    fn source(&self, id: FileId) -> FileResult<Source> {
        if id == self.main.id() {
            Ok(self.main.clone())
        } else {
            Err(FileError::NotFound(id.vpath().as_rootless_path().into()))
        }
    }

    fn file(&self, id: FileId) -> FileResult<Bytes> {
        Err(FileError::NotFound(id.vpath().as_rootless_path().into()))
    }

    fn font(&self, index: usize) -> Option<Font> {
        self.fonts.get(index).cloned()
    }

    fn today(&self, _offset: Option<i64>) -> Option<Datetime> {
        let now = Utc::now();
        Datetime::from_ymd(now.year(), now.month().try_into().ok()?, now.day().try_into().ok()?)
    }
}

// ============================================================================
// PDF
// ============================================================================

const PROJECT_TEMPLATE: &str = r##"
#set page(
  paper: "a4",
  margin: (top: 2cm, bottom: 2cm, left: 2cm, right: 2cm),
  footer: context [
    #line(length: 100%, stroke: 0.5pt + gray)
    #v(4pt)
    #grid(
      columns: (1fr, 1fr),
      align(left)[#text(size: 9pt)[{{NAME}}]],
      align(right)[#text(size: 9pt)[Page #counter(page).display()]],
    )
  ]
)

#set text(size: 11pt)

#align(center)[
  #block(width: 100%, fill: rgb("#e3f2fd"), inset: 12pt, radius: 4pt)[
    #text(size: 18pt, weight: "bold")[Construction Estimate]
    #v(4pt)
    #text(size: 14pt)[{{NAME}}]
  ]
]

#v(12pt)

#table(
  columns: (auto, 1fr),
  stroke: none,
  row-gutter: 4pt,
  [Created:], [{{CREATED}}],
  [Updated:], [{{UPDATED}}],
)

== Building

#table(
  columns: (1fr, auto),
  inset: 8pt,
  stroke: 0.5pt,
  align: (left, right),
  [Footprint], [{{LENGTH}} m × {{WIDTH}} m],
  [Floor area], [{{AREA}} m²],
  [Floors], [{{FLOORS}}],
  [Wall thickness], [{{WALL_CM}} cm],
  [Ceiling height], [{{CEILING_M}} m],
  [Boundary wall], [{{PERIMETER_WALL}}],
  [Concrete slab], [{{SLAB}}],
  [Roof], [{{ROOF}}],
)

== Materials

#table(
  columns: (1fr, auto, auto, auto, auto),
  inset: 8pt,
  stroke: 0.5pt,
  align: (left, right, left, right, right),
  table.header([*Material*], [*Quantity*], [*Unit*], [*Unit price*], [*Cost*]),
{{MATERIAL_ROWS}}
)

#v(12pt)

#block(width: 100%, fill: rgb("#f0f0f0"), inset: 12pt, radius: 4pt)[
  #grid(
    columns: (1fr, auto),
    row-gutter: 6pt,
    [Materials subtotal], [{{SUBTOTAL}}],
    [Contingency ({{CONTINGENCY_PCT}}%)], [{{CONTINGENCY}}],
    [*Final cost*], [*{{FINAL}}*],
  )
]
"##;

/// Fill the report template for `project`.
fn report_source(project: &Project) -> String {
    let spec = project.building();
    let cost = project.cost();
    let lines = line_items(project.quantities(), project.prices());
    let date = |at: chrono::DateTime<Utc>| at.format("%Y-%m-%d").to_string();

    // User text goes in last so placeholder-like names are never substituted
    PROJECT_TEMPLATE
        .replace("{{CREATED}}", &date(project.created_at()))
        .replace("{{UPDATED}}", &date(project.updated_at()))
        .replace("{{LENGTH}}", &spec.length_m.to_string())
        .replace("{{WIDTH}}", &spec.width_m.to_string())
        .replace("{{AREA}}", &format!("{:.2}", spec.floor_area_m2()))
        .replace("{{FLOORS}}", &spec.floors.to_string())
        .replace("{{WALL_CM}}", &spec.wall_thickness_cm.to_string())
        .replace("{{CEILING_M}}", &spec.ceiling_height_m.to_string())
        .replace("{{PERIMETER_WALL}}", yes_no(spec.include_perimeter_wall))
        .replace("{{SLAB}}", yes_no(spec.include_slab))
        .replace("{{ROOF}}", spec.roof_type.display_name())
        .replace("{{MATERIAL_ROWS}}", &material_rows(&lines))
        .replace("{{SUBTOTAL}}", &format_amount(cost.total_material_cost))
        .replace("{{CONTINGENCY_PCT}}", &cost.contingency_percent.to_string())
        .replace("{{CONTINGENCY}}", &format_amount(cost.contingency_amount()))
        .replace("{{FINAL}}", &format_amount(cost.final_cost))
        .replace("{{NAME}}", &escape_typst(project.name()))
}

/// Render a project report to PDF bytes.
pub fn render_pdf(project: &Project) -> EstimateResult<Vec<u8>> {
    let source = report_source(project);

    let world = ReportWorld::new(source);
    let warned = typst::compile(&world);

    let document = warned.output.map_err(|errors| {
        let msgs: Vec<String> = errors.iter().map(|e| e.message.to_string()).collect();
        EstimateError::ReportFailed {
            reason: format!("Typst compilation failed: {}", msgs.join("; ")),
        }
    })?;

    typst_pdf::pdf(&document, &PdfOptions::default()).map_err(|errors| {
        let msgs: Vec<String> = errors.iter().map(|e| e.message.to_string()).collect();
        EstimateError::ReportFailed {
            reason: format!("PDF rendering failed: {}", msgs.join("; ")),
        }
    })
}

fn material_rows(lines: &[CostLine]) -> String {
    lines
        .iter()
        .map(|line| {
            format!(
                "  [{}], [{}], [{}], [{}], [{}],",
                escape_typst(line.material.display_name()),
                format_quantity(line.material, line.quantity),
                line.material.unit(),
                format_amount(line.unit_price),
                format_amount(line.cost)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Escape special Typst characters in user-provided text
fn escape_typst(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(
            c,
            '*' | '_' | '#' | '$' | '@' | '<' | '>' | '\\' | '`' | '[' | ']' | '/' | '{' | '}'
        ) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
