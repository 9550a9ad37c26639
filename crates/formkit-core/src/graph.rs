//! Dependency graph between derived fields and their parents.
//!
//! Edges run from a derived field to each of its parent fields. Plain input
//! fields are sources; derived fields may depend on other derived fields as
//! long as the graph stays acyclic. Evaluation order is topological and, among
//! fields that are ready at the same time, follows the form's field order.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::field::Field;

/// Structural problems in the derived-field graph.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("field {0} cannot derive from itself")]
    SelfReference(String),

    #[error("field {field} derives from unknown field {parent}")]
    MissingParent { field: String, parent: String },

    #[error("derived fields form a cycle: {}", .0.join(" -> "))]
    Cycle(Vec<String>),
}

/// Evaluation order for derived fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvaluationPlan {
    /// Derived fields in an order where every parent precedes its children.
    pub order: Vec<String>,
    /// Derived fields caught in (or downstream of) a cycle; they cannot be
    /// ordered and are left out of `order`.
    pub cyclic: Vec<String>,
}

/// Parent/child relations for one form's fields.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Every field id, in form order.
    ids: Vec<String>,
    /// Derived field id -> parent ids.
    parents: HashMap<String, Vec<String>>,
    /// Field id -> derived fields that read it, in form order.
    children: HashMap<String, Vec<String>>,
}

impl DependencyGraph {
    /// Builds the graph for a form's field list.
    pub fn build(fields: &[Field]) -> Self {
        let mut graph = Self {
            ids: fields.iter().map(|f| f.id.clone()).collect(),
            ..Self::default()
        };
        for field in fields {
            if let Some(ref derived) = field.derived {
                graph
                    .parents
                    .insert(field.id.clone(), derived.parent_field_ids.clone());
                for parent in &derived.parent_field_ids {
                    let kids = graph.children.entry(parent.clone()).or_default();
                    if !kids.contains(&field.id) {
                        kids.push(field.id.clone());
                    }
                }
            }
        }
        graph
    }

    /// Returns `true` if `id` is a field of the form.
    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|i| i == id)
    }

    /// Returns `true` if `id` is a derived field.
    pub fn is_derived(&self, id: &str) -> bool {
        self.parents.contains_key(id)
    }

    /// Direct parents of a derived field (empty for inputs).
    pub fn parents(&self, id: &str) -> &[String] {
        self.parents.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Derived fields that read `id` directly.
    pub fn children(&self, id: &str) -> &[String] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Checks the edges touching one field: no self reference, every parent
    /// exists, and the field cannot reach itself through its parents.
    pub fn check_field(&self, id: &str) -> Result<(), GraphError> {
        let parents = self.parents(id);
        if parents.iter().any(|p| p == id) {
            return Err(GraphError::SelfReference(id.to_owned()));
        }
        if let Some(missing) = parents.iter().find(|p| !self.contains(p)) {
            return Err(GraphError::MissingParent {
                field: id.to_owned(),
                parent: missing.clone(),
            });
        }
        if let Some(path) = self.path_between(id, id) {
            return Err(GraphError::Cycle(path));
        }
        Ok(())
    }

    /// Checks every derived field.
    pub fn check(&self) -> Result<(), GraphError> {
        for id in &self.ids {
            if self.is_derived(id) {
                self.check_field(id)?;
            }
        }
        Ok(())
    }

    /// Topological order over all derived fields.
    pub fn plan(&self) -> EvaluationPlan {
        let derived: Vec<&str> = self
            .ids
            .iter()
            .map(String::as_str)
            .filter(|id| self.is_derived(id))
            .collect();
        let mut done: HashSet<&str> = HashSet::new();
        let mut order = Vec::with_capacity(derived.len());

        // Repeatedly take the first field (in form order) whose derived
        // parents are all placed. Quadratic, but forms are small.
        loop {
            let next = derived.iter().copied().find(|id| {
                !done.contains(id)
                    && self
                        .parents(id)
                        .iter()
                        .all(|p| !self.is_derived(p) || done.contains(p.as_str()))
            });
            match next {
                Some(id) => {
                    done.insert(id);
                    order.push(id.to_owned());
                }
                None => break,
            }
        }

        let cyclic = derived
            .into_iter()
            .filter(|id| !done.contains(id))
            .map(str::to_owned)
            .collect();
        EvaluationPlan { order, cyclic }
    }

    /// All derived fields in evaluation order, or the cycle that prevents one.
    pub fn evaluation_order(&self) -> Result<Vec<String>, GraphError> {
        let plan = self.plan();
        if plan.cyclic.is_empty() {
            Ok(plan.order)
        } else {
            Err(GraphError::Cycle(plan.cyclic))
        }
    }

    /// Every derived field that transitively reads `id`, as an evaluation
    /// plan restricted to those fields.
    pub fn descendants(&self, id: &str) -> EvaluationPlan {
        let mut reached: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::from([id]);
        while let Some(current) = queue.pop_front() {
            for child in self.children(current) {
                if reached.insert(child.as_str()) {
                    queue.push_back(child.as_str());
                }
            }
        }

        let plan = self.plan();
        EvaluationPlan {
            order: plan
                .order
                .into_iter()
                .filter(|f| reached.contains(f.as_str()))
                .collect(),
            cyclic: plan
                .cyclic
                .into_iter()
                .filter(|f| reached.contains(f.as_str()))
                .collect(),
        }
    }

    /// Finds a parent path `from -> .. -> to` of length at least one.
    fn path_between(&self, from: &str, to: &str) -> Option<Vec<String>> {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut stack: Vec<(&str, Vec<String>)> = vec![(from, vec![from.to_owned()])];
        while let Some((current, path)) = stack.pop() {
            for parent in self.parents(current) {
                if parent == to {
                    let mut full = path.clone();
                    full.push(parent.clone());
                    return Some(full);
                }
                if visited.insert(parent.as_str()) {
                    let mut next = path.clone();
                    next.push(parent.clone());
                    stack.push((parent.as_str(), next));
                }
            }
        }
        None
    }
}
