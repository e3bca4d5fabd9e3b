//! In-memory document tree implementing [`LiveTree`], used as a fixture for
//! locator synthesis and by hosts that keep their own DOM mirror.

use std::collections::HashMap;

use crate::dom::tree::{ElementCategory, LiveTree, NodeView, TreeError};
use crate::dom::xpath::{self, Axis, NameTest, Origin, PathExpr, Predicate, Step};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    Html,
    Svg,
    MathMl,
    /// Unrecognized foreign element
    Other,
}

/// Element description used to build a [`MemoryTree`].
#[derive(Debug, Clone)]
pub struct Element {
    tag: String,
    namespace: Namespace,
    attrs: Vec<(String, String)>,
    value: Option<String>,
    files: Vec<String>,
    origin: (f64, f64),
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self::in_namespace(tag, Namespace::Html)
    }

    pub fn in_namespace(tag: &str, namespace: Namespace) -> Self {
        Element {
            tag: tag.to_lowercase(),
            namespace,
            attrs: Vec::new(),
            value: None,
            files: Vec::new(),
            origin: (0.0, 0.0),
        }
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.retain(|(k, _)| k != name);
        self.attrs.push((name.to_string(), value.to_string()));
        self
    }

    /// Set the live value without touching the `value` attribute.
    pub fn value(mut self, value: &str) -> Self {
        self.value = Some(value.to_string());
        self
    }

    pub fn files(mut self, files: &[&str]) -> Self {
        self.files = files.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn at(mut self, left: f64, top: f64) -> Self {
        self.origin = (left, top);
        self
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn category(&self) -> Option<ElementCategory> {
        match self.namespace {
            Namespace::Svg => Some(ElementCategory::Svg),
            Namespace::MathMl => Some(ElementCategory::MathMl),
            Namespace::Other => None,
            Namespace::Html => Some(match self.tag.as_str() {
                "input" => ElementCategory::Input,
                "select" => ElementCategory::Select,
                "textarea" => ElementCategory::TextArea,
                "button" => ElementCategory::Button,
                "img" => ElementCategory::Image,
                _ => ElementCategory::Html,
            }),
        }
    }
}

#[derive(Debug, Clone)]
enum NodeKind {
    Document,
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

/// Arena-backed document. Starts as `#document > html > body`.
#[derive(Debug, Clone)]
pub struct MemoryTree {
    nodes: Vec<Node>,
    root: NodeId,
    body: NodeId,
}

impl Default for MemoryTree {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTree {
    pub fn new() -> Self {
        let mut tree = MemoryTree {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                kind: NodeKind::Document,
            }],
            root: NodeId(0),
            body: NodeId(0),
        };
        let html = tree.create(tree.root, NodeKind::Element(Element::new("html")));
        tree.body = tree.create(html, NodeKind::Element(Element::new("body")));
        tree
    }

    pub fn body_id(&self) -> NodeId {
        self.body
    }

    pub fn append(&mut self, parent: NodeId, element: Element) -> NodeId {
        self.create(parent, NodeKind::Element(element))
    }

    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        self.create(parent, NodeKind::Text(text.to_string()))
    }

    /// Detach a node (and its subtree) from its parent.
    pub fn remove(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes.get(node.0).and_then(|n| n.parent) {
            self.nodes[parent.0].children.retain(|c| *c != node);
            self.nodes[node.0].parent = None;
        }
    }

    fn create(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: Some(parent),
            children: Vec::new(),
            kind,
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    fn element(&self, node: NodeId) -> Option<&Element> {
        match &self.nodes.get(node.0)?.kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    fn element_children(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[node.0]
            .children
            .iter()
            .copied()
            .filter(|c| self.element(*c).is_some())
    }

    fn descendants_or_self(&self, node: NodeId, out: &mut Vec<NodeId>) {
        out.push(node);
        for child in self.element_children(node).collect::<Vec<_>>() {
            self.descendants_or_self(child, out);
        }
    }

    fn document_order(&self) -> HashMap<NodeId, usize> {
        let mut order = Vec::new();
        self.descendants_or_self(self.root, &mut order);
        order.into_iter().enumerate().map(|(i, n)| (n, i)).collect()
    }

    fn evaluate(&self, expr: &PathExpr, scope: Option<NodeId>) -> Vec<NodeId> {
        let start = match expr.origin {
            Origin::Root => self.root,
            Origin::Context => scope.unwrap_or(self.root),
        };
        let order = self.document_order();

        let mut context = vec![start];
        for step in &expr.steps {
            let mut next = Vec::new();
            for ctx in &context {
                let mut parents = Vec::new();
                match step.axis {
                    Axis::Child => parents.push(*ctx),
                    Axis::Descendant => self.descendants_or_self(*ctx, &mut parents),
                }
                for parent in parents {
                    next.extend(self.apply_step(step, parent));
                }
            }
            // Detached nodes have no document position and drop out here.
            next.retain(|n| order.contains_key(n));
            next.sort_by_key(|n| order[n]);
            next.dedup();
            context = next;
        }
        context
    }

    fn apply_step(&self, step: &Step, parent: NodeId) -> Vec<NodeId> {
        let mut candidates: Vec<NodeId> = self
            .element_children(parent)
            .filter(|c| match &step.name {
                NameTest::Any => true,
                NameTest::Tag(tag) => self.element(*c).is_some_and(|el| &el.tag == tag),
            })
            .collect();

        for predicate in &step.predicates {
            candidates = match predicate {
                Predicate::Position(pos) => candidates
                    .get(pos.wrapping_sub(1))
                    .copied()
                    .into_iter()
                    .collect(),
                _ => candidates
                    .into_iter()
                    .filter(|c| self.matches(*c, predicate))
                    .collect(),
            };
        }
        candidates
    }

    fn matches(&self, node: NodeId, predicate: &Predicate) -> bool {
        let Some(el) = self.element(node) else {
            return false;
        };
        match predicate {
            Predicate::Position(_) => true,
            Predicate::Attribute { name, value } | Predicate::Bare { name, value } => {
                el.get(name) == Some(value.as_str())
            }
            Predicate::Text(value) => self.nodes[node.0].children.iter().any(|c| {
                matches!(&self.nodes[c.0].kind, NodeKind::Text(t) if t == value)
            }),
        }
    }
}

impl LiveTree for MemoryTree {
    type Node = NodeId;

    fn query(&self, pattern: &str, scope: Option<NodeId>) -> Result<Vec<NodeId>, TreeError> {
        let expr = xpath::parse(pattern)?;
        Ok(self.evaluate(&expr, scope))
    }

    fn view(&self, node: NodeId) -> Option<NodeView> {
        let el = self.element(node)?;
        let category = el.category();
        let attr = |name: &str| el.get(name).unwrap_or_default().to_string();

        let is_control = matches!(
            category,
            Some(
                ElementCategory::Input
                    | ElementCategory::Select
                    | ElementCategory::TextArea
                    | ElementCategory::Button
            )
        );
        let input_type = if category == Some(ElementCategory::Input) {
            el.get("type").unwrap_or("text").to_lowercase()
        } else {
            String::new()
        };
        let value = match &el.value {
            Some(v) => v.clone(),
            None if is_control || el.tag == "option" => attr("value"),
            None => String::new(),
        };
        let text_nodes = self.nodes[node.0]
            .children
            .iter()
            .filter_map(|c| match &self.nodes[c.0].kind {
                NodeKind::Text(t) => Some(t.clone()),
                _ => None,
            })
            .collect();

        Some(NodeView {
            category,
            tag: el.tag.clone(),
            id: attr("id"),
            classes: el
                .get("class")
                .unwrap_or_default()
                .split_whitespace()
                .map(str::to_string)
                .collect(),
            name_property: if is_control { attr("name") } else { String::new() },
            name_attribute: attr("name"),
            input_type,
            value,
            aria_label: attr("aria-label"),
            data_id: attr("data-id"),
            text_nodes,
            files: el.files.clone(),
            origin: el.origin,
        })
    }

    fn parent_element(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.nodes.get(node.0)?.parent?;
        self.element(parent).map(|_| parent)
    }

    fn previous_element_siblings(&self, node: NodeId) -> Vec<NodeId> {
        let Some(parent) = self.nodes.get(node.0).and_then(|n| n.parent) else {
            return Vec::new();
        };
        let siblings: Vec<NodeId> = self.element_children(parent).collect();
        match siblings.iter().position(|s| *s == node) {
            Some(idx) => siblings[..idx].iter().rev().copied().collect(),
            None => Vec::new(),
        }
    }

    fn body(&self) -> Option<NodeId> {
        Some(self.body)
    }
}
