//! Walks over ownership pointers and component expansion edges.
//!
//! Used at the write boundary to reject cycles, by the consistency check on
//! loaded documents, and to derive a node's definition-site root.

use std::collections::{BTreeSet, HashMap};

use uib_model::{ComponentId, ElementId, EntityStore, InstanceId, NodeRef, Owner, Root};

/// Where walking up from an owner ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootWalk {
    Root(Root),
    /// The chain reaches an owner that does not exist.
    Missing(Owner),
    /// The chain revisits an element.
    Cycle(ElementId),
}

/// Follows ownership pointers from `owner` to the Screen or Component at the
/// top of the chain.
pub fn walk_to_root(store: &EntityStore, owner: &Owner) -> RootWalk {
    let mut current = owner.clone();
    let mut steps = 0usize;
    loop {
        let id = match current {
            Owner::Screen(id) => {
                return if store.screens.contains(&id) {
                    RootWalk::Root(Root::Screen(id))
                } else {
                    RootWalk::Missing(Owner::Screen(id))
                };
            }
            Owner::Component(id) => {
                return if store.components.contains(&id) {
                    RootWalk::Root(Root::Component(id))
                } else {
                    RootWalk::Missing(Owner::Component(id))
                };
            }
            Owner::Element(id) => id,
        };
        steps += 1;
        if steps > store.elements.len() {
            return RootWalk::Cycle(id);
        }
        match store.elements.get(&id) {
            Some(element) => current = element.ownership.clone(),
            None => return RootWalk::Missing(Owner::Element(id)),
        }
    }
}

/// The root a node's own ownership chain ends at.
pub fn root_of(store: &EntityStore, node: &NodeRef) -> Option<RootWalk> {
    store.owner_of(node).map(|owner| walk_to_root(store, owner))
}

/// True when `element`'s ownership chain leads back to `element`.
pub fn owns_itself(store: &EntityStore, element: &ElementId) -> bool {
    let Some(start) = store.elements.get(element) else {
        return false;
    };
    let mut current = &start.ownership;
    for _ in 0..=store.elements.len() {
        match current {
            Owner::Element(id) if id == element => return true,
            Owner::Element(id) => match store.elements.get(id) {
                Some(parent) => current = &parent.ownership,
                None => return false,
            },
            Owner::Screen(_) | Owner::Component(_) => return false,
        }
    }
    false
}

/// Component -> components instantiated anywhere inside its definition.
pub fn expansion_edges(store: &EntityStore) -> HashMap<ComponentId, BTreeSet<ComponentId>> {
    let mut edges: HashMap<ComponentId, BTreeSet<ComponentId>> = HashMap::new();
    for instance in store.instances.iter() {
        if let RootWalk::Root(Root::Component(host)) = walk_to_root(store, &instance.ownership) {
            edges
                .entry(host)
                .or_default()
                .insert(instance.component_id.clone());
        }
    }
    edges
}

/// True when expanding `from` eventually instantiates `target`.
pub fn expansion_reaches(
    edges: &HashMap<ComponentId, BTreeSet<ComponentId>>,
    from: &ComponentId,
    target: &ComponentId,
) -> bool {
    let mut stack = vec![from];
    let mut seen = BTreeSet::new();
    while let Some(component) = stack.pop() {
        if component == target {
            return true;
        }
        if !seen.insert(component) {
            continue;
        }
        if let Some(next) = edges.get(component) {
            stack.extend(next.iter());
        }
    }
    false
}

/// True when placing `instance` where it sits makes its host component
/// expand itself.
pub fn instance_recurses(
    store: &EntityStore,
    edges: &HashMap<ComponentId, BTreeSet<ComponentId>>,
    instance: &InstanceId,
) -> bool {
    let Some(instance) = store.instances.get(instance) else {
        return false;
    };
    match walk_to_root(store, &instance.ownership) {
        RootWalk::Root(Root::Component(host)) => {
            expansion_reaches(edges, &instance.component_id, &host)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use uib_model::{Component, Element, Instance, Screen, ScreenId};

    use super::*;

    fn element(id: &str, owner: Owner) -> Element {
        Element::new(ElementId::new(id).unwrap(), owner, "box")
    }

    #[test]
    fn walk_reports_cycles_and_missing_owners() {
        let mut store = EntityStore::new();
        let s1 = ScreenId::new("s1").unwrap();
        store.screens.insert(Screen {
            id: s1.clone(),
            name: String::new(),
        });
        let a = ElementId::new("a").unwrap();
        let b = ElementId::new("b").unwrap();
        store.elements.insert(element("a", Owner::Element(b.clone())));
        store.elements.insert(element("b", Owner::Element(a.clone())));
        store.elements.insert(element("c", Owner::Screen(s1.clone())));
        store
            .elements
            .insert(element("d", Owner::Element(ElementId::new("gone").unwrap())));

        assert!(matches!(
            walk_to_root(&store, &Owner::Element(a.clone())),
            RootWalk::Cycle(_)
        ));
        assert!(owns_itself(&store, &a));
        assert_eq!(
            walk_to_root(&store, &Owner::Element(ElementId::new("c").unwrap())),
            RootWalk::Root(Root::Screen(s1))
        );
        assert!(matches!(
            walk_to_root(&store, &Owner::Element(ElementId::new("d").unwrap())),
            RootWalk::Missing(Owner::Element(_))
        ));
    }

    #[test]
    fn detects_mutual_component_recursion() {
        let mut store = EntityStore::new();
        let a = ComponentId::new("A").unwrap();
        let b = ComponentId::new("B").unwrap();
        for id in [&a, &b] {
            store.components.insert(Component {
                id: id.clone(),
                name: String::new(),
                props: vec![],
            });
        }
        store.instances.insert(Instance::new(
            InstanceId::new("b_in_a").unwrap(),
            b.clone(),
            Owner::Component(a.clone()),
        ));
        store.instances.insert(Instance::new(
            InstanceId::new("a_in_b").unwrap(),
            a.clone(),
            Owner::Component(b.clone()),
        ));

        let edges = expansion_edges(&store);
        assert!(expansion_reaches(&edges, &a, &a));
        assert!(instance_recurses(
            &store,
            &edges,
            &InstanceId::new("a_in_b").unwrap()
        ));
    }
}
