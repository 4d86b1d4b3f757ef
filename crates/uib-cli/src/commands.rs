//! Command runners. Each returns what the command prints on stdout so the
//! binary only decides where output and exit codes go.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, info_span, warn};

use uib_core::{
    ActiveModes, CheckReport, Edit, EditReport, NodeResolution, PropertyState, ResolvedValue,
    Resolver, apply, check,
};
use uib_model::{EntityStore, InstanceId, NodeRef, PresetId, PropId, Root, TokenId};

use crate::render::{check_table, check_totals, node_table, tree_outline, value_table};

/// How report-style commands print their result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

pub fn load_document(path: &Path) -> Result<EntityStore> {
    let store = EntityStore::load(path)
        .with_context(|| format!("load document {}", path.display()))?;
    info!(
        path = %path.display(),
        nodes = store.owned_len(),
        components = store.components.len(),
        tokens = store.tokens.len(),
        "loaded document"
    );
    Ok(store)
}

pub fn run_tree(store: &EntityStore, root: &Root) -> String {
    let _span = info_span!("tree", %root).entered();
    let resolver = Resolver::new(store);
    tree_outline(root, resolver.materialize(root))
}

/// What `resolve` should look at.
#[derive(Debug, Clone)]
pub struct ResolveTarget {
    pub node: NodeRef,
    /// Resolve as seen inside this instance's expansion.
    pub within: Option<InstanceId>,
    /// Only this property instead of every property the node names.
    pub property: Option<String>,
}

pub fn run_resolve(
    store: &EntityStore,
    target: &ResolveTarget,
    modes: &ActiveModes,
    format: OutputFormat,
) -> Result<String> {
    let _span = info_span!("resolve", node = %target.node).entered();
    let resolver = Resolver::new(store);
    let context = match &target.within {
        Some(instance) => {
            anyhow::ensure!(
                store.instances.contains(instance),
                "instance:{instance} does not exist"
            );
            resolver
                .context_within(&target.node, instance)
                .with_context(|| format!("locate {} inside instance:{instance}", target.node))?
        }
        None => resolver
            .context_for(&target.node)
            .with_context(|| format!("locate {}", target.node))?,
    };
    let mut resolution = resolver
        .resolve_node(&context, modes)
        .with_context(|| format!("resolve {context}"))?;
    if let Some(property) = &target.property {
        narrow_to(&mut resolution, property);
    }
    let broken = resolution.broken_count();
    if broken > 0 {
        warn!(broken, "broken bindings");
    }
    info!(properties = resolution.properties.len(), broken, "resolved");
    render(format, &resolution, node_table)
}

/// Keeps only `property`. A name the node never mentions shows as unset.
fn narrow_to(resolution: &mut NodeResolution, property: &str) {
    resolution.properties.retain(|name, _| name == property);
    resolution
        .properties
        .entry(property.to_string())
        .or_insert_with(|| PropertyState::Unbound(ResolvedValue::unset()));
}

pub fn run_prop(
    store: &EntityStore,
    instance: &InstanceId,
    prop: &PropId,
    format: OutputFormat,
) -> Result<String> {
    let _span = info_span!("prop", %instance, %prop).entered();
    let value = Resolver::new(store)
        .resolve_prop(instance, prop)
        .with_context(|| format!("resolve prop {prop} on instance:{instance}"))?;
    let subject = format!("instance:{instance} prop:{prop}");
    render(format, &value, |value| value_table(&subject, value))
}

/// Token (or preset, when `preset` is set) lookup under `modes`.
pub fn run_token(
    store: &EntityStore,
    id: &str,
    preset: bool,
    modes: &ActiveModes,
    format: OutputFormat,
) -> Result<String> {
    let _span = info_span!("token", id, preset).entered();
    let resolver = Resolver::new(store);
    let (subject, value) = if preset {
        let id = PresetId::new(id)?;
        let value = resolver
            .resolve_preset(&id, modes)
            .with_context(|| format!("resolve preset {id}"))?;
        (format!("preset:{id}"), value)
    } else {
        let id = TokenId::new(id)?;
        let value = resolver
            .resolve_token(&id, modes)
            .with_context(|| format!("resolve token {id}"))?;
        (format!("token:{id}"), value)
    };
    render(format, &value, |value| value_table(&subject, value))
}

pub fn run_check(store: &EntityStore, format: OutputFormat) -> Result<(String, CheckReport)> {
    let _span = info_span!("check").entered();
    let report = check(store);
    info!(
        errors = report.error_count(),
        warnings = report.warning_count(),
        "check complete"
    );
    let output = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&report).context("encode report")?,
        OutputFormat::Table if report.issues.is_empty() => check_totals(&report),
        OutputFormat::Table => format!("{}\n{}", check_table(&report), check_totals(&report)),
    };
    Ok((output, report))
}

/// Reads a JSON array of edits from `edits_path` and applies it as one
/// batch.
pub fn run_apply(store: &EntityStore, edits_path: &Path) -> Result<(EntityStore, EditReport)> {
    let _span = info_span!("apply", edits = %edits_path.display()).entered();
    let contents = fs::read_to_string(edits_path)
        .with_context(|| format!("read edits {}", edits_path.display()))?;
    let edits: Vec<Edit> = serde_json::from_str(&contents)
        .with_context(|| format!("parse edits {}", edits_path.display()))?;
    let (next, report) = apply(store, &edits).context("edit batch rejected")?;
    info!(
        applied = report.applied,
        removed = report.removed.len(),
        dangling = report.dangling.len(),
        "batch applied"
    );
    Ok((next, report))
}

fn render<T: Serialize>(
    format: OutputFormat,
    value: &T,
    table: impl FnOnce(&T) -> comfy_table::Table,
) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(table(value).to_string()),
        OutputFormat::Json => serde_json::to_string_pretty(value).context("encode output"),
    }
}
