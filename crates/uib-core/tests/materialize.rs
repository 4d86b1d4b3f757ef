//! Tests for tree reconstruction from ownership pointers.

mod common;

use std::collections::HashMap;

use common::{component, element, instance, sample, screen, with_nested_badge};
use uib_core::{Diagnostic, Resolver, TreeNode};
use uib_model::{Instance, NodeRef, Owner, Root};

fn outline(nodes: &[TreeNode<'_>]) -> Vec<String> {
    nodes
        .iter()
        .map(|node| {
            let context = node
                .instance_context
                .map(|id| format!(" [{id}]"))
                .unwrap_or_default();
            format!(
                "{}{}{}",
                "  ".repeat(node.depth),
                node.entity.node_ref(),
                context
            )
        })
        .collect()
}

// ============================================================================
// Traversal order and instance expansion
// ============================================================================

#[test]
fn expands_instances_through_their_component() {
    let store = sample();
    let resolver = Resolver::new(&store);
    let root = Root::Screen(screen("home"));
    let nodes: Vec<_> = resolver.materialize(&root).collect();

    assert_eq!(
        outline(&nodes),
        vec![
            "element:header",
            "  element:title",
            "  instance:card_2",
            "    element:card_root [card_2]",
            "      element:card_label [card_2]",
            "instance:card_1",
            "  element:card_root [card_1]",
            "    element:card_label [card_1]",
        ]
    );
}

#[test]
fn component_root_walks_its_definition() {
    let store = sample();
    let resolver = Resolver::new(&store);
    let root = Root::Component(component("card"));
    let nodes: Vec<_> = resolver.materialize(&root).collect();
    assert_eq!(
        outline(&nodes),
        vec!["element:card_root", "  element:card_label"]
    );
    assert!(nodes.iter().all(|node| node.root == &root));
}

#[test]
fn each_screen_node_is_visited_once() {
    let store = sample();
    let resolver = Resolver::new(&store);
    let root = Root::Screen(screen("home"));
    let mut seen: HashMap<NodeRef, usize> = HashMap::new();
    for node in resolver
        .materialize(&root)
        .filter(|node| node.instance_context.is_none())
    {
        *seen.entry(node.entity.node_ref()).or_default() += 1;
    }
    assert_eq!(seen.len(), 4);
    assert!(seen.values().all(|count| *count == 1));
}

#[test]
fn walk_is_restartable() {
    let store = sample();
    let resolver = Resolver::new(&store);
    let root = Root::Screen(screen("home"));
    let mut walk = resolver.materialize(&root);
    walk.next();
    let resumed = walk.clone();
    assert_eq!(walk.count(), resumed.count());
    assert_eq!(resolver.materialize(&root).count(), 8);
}

// ============================================================================
// Partial failure
// ============================================================================

#[test]
fn missing_component_is_reported_not_fatal() {
    let mut store = sample();
    store.instances.insert(Instance::new(
        instance("ghost_1"),
        component("ghost"),
        Owner::Screen(screen("home")),
    ));
    let resolver = Resolver::new(&store);
    let root = Root::Screen(screen("home"));
    let mut walk = resolver.materialize(&root);
    let nodes: Vec<_> = walk.by_ref().collect();

    assert_eq!(nodes.len(), 9);
    assert_eq!(
        nodes.last().map(|node| node.entity.node_ref()),
        Some(NodeRef::Instance(instance("ghost_1")))
    );
    assert_eq!(
        walk.diagnostics(),
        &[Diagnostic::MissingComponent {
            instance: instance("ghost_1"),
            component: component("ghost"),
        }]
    );
}

#[test]
fn nested_instance_becomes_the_innermost_context() {
    let mut store = sample();
    with_nested_badge(&mut store);
    let resolver = Resolver::new(&store);
    let root = Root::Screen(screen("home"));
    let mut walk = resolver.materialize(&root);
    let nodes: Vec<_> = walk.by_ref().collect();

    assert!(walk.diagnostics().is_empty());
    assert_eq!(
        outline(&nodes),
        vec![
            "element:header",
            "  element:title",
            "  instance:card_2",
            "    element:card_root [card_2]",
            "      element:card_label [card_2]",
            "        instance:badge_1 [card_2]",
            "          element:badge_root [badge_1]",
            "instance:card_1",
            "  element:card_root [card_1]",
            "    element:card_label [card_1]",
            "      instance:badge_1 [card_1]",
            "        element:badge_root [badge_1]",
        ]
    );
}

#[test]
fn recursive_expansion_stops_with_a_diagnostic() {
    let mut store = sample();
    store.instances.insert(Instance::new(
        instance("inner_card"),
        component("card"),
        Owner::Element(element("card_label")),
    ));
    let resolver = Resolver::new(&store);
    let root = Root::Screen(screen("home"));
    let mut walk = resolver.materialize(&root);
    let count = walk.by_ref().count();

    // Every card expansion shows its nested instance once, unexpanded.
    assert_eq!(count, 10);
    assert_eq!(walk.diagnostics().len(), 2);
    assert!(walk.diagnostics().iter().all(|diagnostic| matches!(
        diagnostic,
        Diagnostic::RecursiveInstance { instance, .. } if *instance == common::instance("inner_card")
    )));
}

#[test]
fn unknown_root_yields_nothing() {
    let store = sample();
    let resolver = Resolver::new(&store);
    let root = Root::Screen(screen("nowhere"));
    let walk = resolver.materialize(&root);
    assert_eq!(walk.diagnostics().len(), 1);
    assert_eq!(walk.count(), 0);
}
