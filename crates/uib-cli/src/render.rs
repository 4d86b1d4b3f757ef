//! Terminal rendering: the indented tree outline and comfy-table reports.

use std::fmt::Write as _;

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use uib_core::{
    CheckReport, EditReport, Materialize, NodeEntity, NodeResolution, PropertyState,
    ResolutionStatus, ResolvedValue, Severity,
};
use uib_model::Root;

/// Renders a whole walk: one line per node, two spaces per level, then the
/// diagnostics the walk collected.
///
/// ```text
/// screen:home
///   element:header <box>
///     instance:card_2 -> component:card
///       element:card_root <box> [in card_2]
/// ```
pub fn tree_outline(root: &Root, mut walk: Materialize<'_>) -> String {
    let mut out = format!("{root}\n");
    for node in walk.by_ref() {
        let indent = "  ".repeat(node.depth + 1);
        let _ = write!(out, "{indent}{}", node.entity.node_ref());
        match node.entity {
            NodeEntity::Element(element) => {
                let _ = write!(out, " <{}>", element.tag);
            }
            NodeEntity::Instance(instance) => {
                let _ = write!(out, " -> component:{}", instance.component_id);
            }
        }
        if let Some(context) = node.instance_context {
            let _ = write!(out, " [in {context}]");
        }
        out.push('\n');
    }
    let diagnostics = walk.into_diagnostics();
    if !diagnostics.is_empty() {
        out.push_str("diagnostics:\n");
        for diagnostic in diagnostics {
            let _ = writeln!(out, "  ! {diagnostic}");
        }
    }
    out
}

/// One row per property of a resolved node.
pub fn node_table(resolution: &NodeResolution) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Property"),
        header_cell("Status"),
        header_cell("Value"),
        header_cell("Source"),
    ]);
    apply_table_style(&mut table);
    for (name, state) in &resolution.properties {
        let (value, detail) = match state {
            PropertyState::Unbound(value) | PropertyState::Resolved(value) => {
                (value.value.to_string(), value.source.to_string())
            }
            PropertyState::Broken(error) => ("-".to_string(), error.to_string()),
        };
        table.add_row(vec![
            Cell::new(name).add_attribute(Attribute::Bold),
            status_cell(state.status()),
            Cell::new(value),
            dim_cell(detail),
        ]);
    }
    table
}

/// A single resolved value and where it came from.
pub fn value_table(subject: &str, value: &ResolvedValue) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Subject"),
        header_cell("Value"),
        header_cell("Source"),
    ]);
    apply_table_style(&mut table);
    table.add_row(vec![
        Cell::new(subject).add_attribute(Attribute::Bold),
        Cell::new(value.value.to_string()),
        dim_cell(value.source.to_string()),
    ]);
    table
}

pub fn check_table(report: &CheckReport) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Severity"),
        header_cell("Code"),
        header_cell("Entity"),
        header_cell("Message"),
    ]);
    apply_issue_table_style(&mut table);
    for issue in &report.issues {
        table.add_row(vec![
            severity_cell(issue.severity),
            Cell::new(issue.code.as_str()),
            Cell::new(issue.entity.to_string()),
            Cell::new(&issue.message),
        ]);
    }
    table
}

/// One-line totals printed under the check table.
pub fn check_totals(report: &CheckReport) -> String {
    format!(
        "{} error(s), {} warning(s)",
        report.error_count(),
        report.warning_count()
    )
}

/// Plain-text account of an accepted batch, for stderr.
pub fn edit_summary(report: &EditReport) -> String {
    let mut out = format!("applied {} edit(s)\n", report.applied);
    for entity in &report.removed {
        let _ = writeln!(out, "  removed {entity}");
    }
    for pruned in &report.pruned_overrides {
        let _ = writeln!(
            out,
            "  pruned override of prop {} on instance {}",
            pruned.prop, pruned.instance
        );
    }
    for dangling in &report.dangling {
        let _ = writeln!(
            out,
            "  dangling {} {} -> {}",
            dangling.holder, dangling.slot, dangling.target
        );
    }
    out
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_issue_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(160);
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn status_cell(status: ResolutionStatus) -> Cell {
    let color = match status {
        ResolutionStatus::Resolved => Color::Green,
        ResolutionStatus::Unbound => Color::Grey,
        _ => Color::Red,
    };
    Cell::new(status.as_str()).fg(color)
}

fn severity_cell(severity: Severity) -> Cell {
    let color = match severity {
        Severity::Error => Color::Red,
        Severity::Warning => Color::Yellow,
    };
    Cell::new(severity.as_str())
        .fg(color)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value.to_string()).fg(Color::DarkGrey)
}
