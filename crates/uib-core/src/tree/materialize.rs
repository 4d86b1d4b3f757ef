use std::slice;

use serde::Serialize;
use tracing::warn;

use uib_model::{
    ComponentId, Element, EntityStore, Instance, InstanceId, NodeRef, Owner, Root,
};

use crate::resolve::NodeContext;
use crate::tree::TreeIndex;

/// The entity a tree node shows.
#[derive(Debug, Clone, Copy)]
pub enum NodeEntity<'a> {
    Element(&'a Element),
    Instance(&'a Instance),
}

impl NodeEntity<'_> {
    pub fn node_ref(&self) -> NodeRef {
        match self {
            NodeEntity::Element(element) => NodeRef::Element(element.id.clone()),
            NodeEntity::Instance(instance) => NodeRef::Instance(instance.id.clone()),
        }
    }
}

/// One visited node of a materialized tree.
#[derive(Debug, Clone)]
pub struct TreeNode<'a> {
    pub entity: NodeEntity<'a>,
    /// 0 for the root's direct children.
    pub depth: usize,
    /// Nearest enclosing Instance. An Instance node itself carries the
    /// context it is placed in, not itself.
    pub instance_context: Option<&'a InstanceId>,
    pub root: &'a Root,
}

impl TreeNode<'_> {
    /// The resolution context for this node.
    pub fn context(&self) -> NodeContext {
        NodeContext {
            node: self.entity.node_ref(),
            instance_context: self.instance_context.cloned(),
            root: self.root.clone(),
        }
    }
}

/// A node that contributed no descendants, reported instead of failing the
/// whole traversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Diagnostic {
    MissingRoot {
        root: Root,
    },
    MissingNode {
        node: NodeRef,
    },
    MissingComponent {
        instance: InstanceId,
        component: ComponentId,
    },
    RecursiveInstance {
        instance: InstanceId,
        component: ComponentId,
    },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::MissingRoot { root } => write!(f, "root {root} does not exist"),
            Diagnostic::MissingNode { node } => write!(f, "{node} is indexed but missing"),
            Diagnostic::MissingComponent {
                instance,
                component,
            } => write!(f, "instance {instance} references missing component {component}"),
            Diagnostic::RecursiveInstance {
                instance,
                component,
            } => write!(
                f,
                "instance {instance} would expand component {component} inside itself"
            ),
        }
    }
}

#[derive(Debug, Clone)]
struct Frame<'a> {
    children: slice::Iter<'a, NodeRef>,
    depth: usize,
    instance_context: Option<&'a InstanceId>,
    expanding: Option<&'a ComponentId>,
}

/// Lazy depth-first pre-order walk of a root's tree.
///
/// Instances are expanded through their Component's definition subtree with
/// the instance as context. Cloning the iterator restarts from the same
/// position; calling [`materialize`] again restarts from the top.
#[derive(Debug, Clone)]
pub struct Materialize<'a> {
    store: &'a EntityStore,
    index: &'a TreeIndex,
    root: &'a Root,
    frames: Vec<Frame<'a>>,
    diagnostics: Vec<Diagnostic>,
}

/// Starts a walk at `root`'s owned children.
pub fn materialize<'a>(
    store: &'a EntityStore,
    index: &'a TreeIndex,
    root: &'a Root,
) -> Materialize<'a> {
    let mut walk = Materialize {
        store,
        index,
        root,
        frames: Vec::new(),
        diagnostics: Vec::new(),
    };
    let exists = match root {
        Root::Screen(id) => store.screens.contains(id),
        Root::Component(id) => store.components.contains(id),
    };
    if exists {
        walk.frames.push(Frame {
            children: index.children(&root.as_owner()).iter(),
            depth: 0,
            instance_context: None,
            expanding: None,
        });
    } else {
        walk.report(Diagnostic::MissingRoot { root: root.clone() });
    }
    walk
}

impl<'a> Materialize<'a> {
    /// Problems met so far. Complete once the iterator is exhausted.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        warn!(root = %self.root, %diagnostic, "partial tree");
        self.diagnostics.push(diagnostic);
    }

    fn is_expanding(&self, component: &ComponentId) -> bool {
        matches!(self.root, Root::Component(root) if root == component)
            || self
                .frames
                .iter()
                .any(|frame| frame.expanding == Some(component))
    }

    fn push_children(
        &mut self,
        owner: &Owner,
        depth: usize,
        instance_context: Option<&'a InstanceId>,
        expanding: Option<&'a ComponentId>,
    ) {
        let children = self.index.children(owner);
        if children.is_empty() {
            return;
        }
        self.frames.push(Frame {
            children: children.iter(),
            depth,
            instance_context,
            expanding,
        });
    }

    fn visit_instance(&mut self, instance: &'a Instance, depth: usize) {
        let store = self.store;
        let Some(component) = store.components.get(&instance.component_id) else {
            self.report(Diagnostic::MissingComponent {
                instance: instance.id.clone(),
                component: instance.component_id.clone(),
            });
            return;
        };
        if self.is_expanding(&component.id) {
            self.report(Diagnostic::RecursiveInstance {
                instance: instance.id.clone(),
                component: component.id.clone(),
            });
            return;
        }
        self.push_children(
            &Owner::Component(component.id.clone()),
            depth + 1,
            Some(&instance.id),
            Some(&component.id),
        );
    }
}

impl<'a> Iterator for Materialize<'a> {
    type Item = TreeNode<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let store = self.store;
        loop {
            let frame = self.frames.last_mut()?;
            let Some(node) = frame.children.next() else {
                self.frames.pop();
                continue;
            };
            let depth = frame.depth;
            let instance_context = frame.instance_context;
            match node {
                NodeRef::Element(id) => {
                    let Some(element) = store.elements.get(id) else {
                        self.report(Diagnostic::MissingNode { node: node.clone() });
                        continue;
                    };
                    self.push_children(
                        &Owner::Element(element.id.clone()),
                        depth + 1,
                        instance_context,
                        None,
                    );
                    return Some(TreeNode {
                        entity: NodeEntity::Element(element),
                        depth,
                        instance_context,
                        root: self.root,
                    });
                }
                NodeRef::Instance(id) => {
                    let Some(instance) = store.instances.get(id) else {
                        self.report(Diagnostic::MissingNode { node: node.clone() });
                        continue;
                    };
                    self.visit_instance(instance, depth);
                    return Some(TreeNode {
                        entity: NodeEntity::Instance(instance),
                        depth,
                        instance_context,
                        root: self.root,
                    });
                }
            }
        }
    }
}
