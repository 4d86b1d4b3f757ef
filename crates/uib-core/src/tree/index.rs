use std::collections::HashMap;

use tracing::debug;

use uib_model::{EntityStore, NodeRef, Owner};

/// `owner -> ordered owned nodes`, across Elements and Instances.
///
/// Siblings are ordered elements first, then instances, each in store order.
/// Incremental updates append a re-parented node at the end of its new
/// owner's list.
#[derive(Debug, Clone, Default)]
pub struct TreeIndex {
    children: HashMap<Owner, Vec<NodeRef>>,
    owners: HashMap<NodeRef, Owner>,
}

impl TreeIndex {
    /// Builds the index in one pass over every owned entity.
    pub fn build(store: &EntityStore) -> Self {
        let mut index = TreeIndex {
            children: HashMap::new(),
            owners: HashMap::with_capacity(store.owned_len()),
        };
        for element in store.elements.iter() {
            index.attach(NodeRef::Element(element.id.clone()), element.ownership.clone());
        }
        for instance in store.instances.iter() {
            index.attach(
                NodeRef::Instance(instance.id.clone()),
                instance.ownership.clone(),
            );
        }
        debug!(
            nodes = index.owners.len(),
            owners = index.children.len(),
            "built tree index"
        );
        index
    }

    /// Re-reads one node's ownership from `store`: moves it if its owner
    /// changed, adds it if new, drops it if it no longer exists.
    pub fn rebuild_one(&mut self, store: &EntityStore, node: &NodeRef) {
        let current = store.owner_of(node);
        if self.owners.get(node) == current {
            return;
        }
        self.detach(node);
        if let Some(owner) = current {
            self.attach(node.clone(), owner.clone());
        }
    }

    pub fn children(&self, owner: &Owner) -> &[NodeRef] {
        self.children.get(owner).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn owner(&self, node: &NodeRef) -> Option<&Owner> {
        self.owners.get(node)
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    fn attach(&mut self, node: NodeRef, owner: Owner) {
        self.children
            .entry(owner.clone())
            .or_default()
            .push(node.clone());
        self.owners.insert(node, owner);
    }

    fn detach(&mut self, node: &NodeRef) {
        let Some(owner) = self.owners.remove(node) else {
            return;
        };
        if let Some(siblings) = self.children.get_mut(&owner) {
            siblings.retain(|sibling| sibling != node);
            if siblings.is_empty() {
                self.children.remove(&owner);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use uib_model::{
        ComponentId, Element, ElementId, Instance, InstanceId, Screen, ScreenId,
    };

    use super::*;

    fn screen_owner(id: &str) -> Owner {
        Owner::Screen(ScreenId::new(id).unwrap())
    }

    fn store() -> EntityStore {
        let mut store = EntityStore::new();
        store.screens.insert(Screen {
            id: ScreenId::new("s1").unwrap(),
            name: "Home".to_string(),
        });
        for id in ["a", "b"] {
            store.elements.insert(Element::new(
                ElementId::new(id).unwrap(),
                screen_owner("s1"),
                "box",
            ));
        }
        store.instances.insert(Instance::new(
            InstanceId::new("i1").unwrap(),
            ComponentId::new("c1").unwrap(),
            screen_owner("s1"),
        ));
        store
    }

    #[test]
    fn groups_heterogeneous_children_by_owner() {
        let store = store();
        let index = TreeIndex::build(&store);
        let children = index.children(&screen_owner("s1"));
        assert_eq!(
            children,
            &[
                NodeRef::Element(ElementId::new("a").unwrap()),
                NodeRef::Element(ElementId::new("b").unwrap()),
                NodeRef::Instance(InstanceId::new("i1").unwrap()),
            ]
        );
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn rebuild_one_moves_and_drops() {
        let mut store = store();
        let mut index = TreeIndex::build(&store);
        let a = ElementId::new("a").unwrap();
        let b_ref = NodeRef::Element(ElementId::new("b").unwrap());

        if let Some(element) = store.elements.get_mut(&ElementId::new("b").unwrap()) {
            element.ownership = Owner::Element(a.clone());
        }
        index.rebuild_one(&store, &b_ref);
        assert_eq!(index.children(&Owner::Element(a.clone())), &[b_ref.clone()]);
        assert_eq!(index.children(&screen_owner("s1")).len(), 2);

        store.elements.remove(&ElementId::new("b").unwrap());
        index.rebuild_one(&store, &b_ref);
        assert!(index.children(&Owner::Element(a)).is_empty());
        assert!(index.owner(&b_ref).is_none());
    }
}
