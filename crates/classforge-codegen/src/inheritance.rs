//! Inheritance resolution: one parent-pointer map per run.
//!
//! For an `inheritance` edge the endpoint whose multiplicity is exactly `"1"`
//! is the parent and the endpoint whose multiplicity contains `*` is the
//! child. A class has at most one parent; the first qualifying edge wins.

use crate::diagnostics::Diagnostics;
use classforge_diagram::{ClassId, Diagram, RelationshipKind};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct InheritanceMap {
    parent_of: BTreeMap<ClassId, ClassId>,
    children_of: BTreeMap<ClassId, Vec<ClassId>>,
}

impl InheritanceMap {
    pub fn resolve(diagram: &Diagram, diags: &mut Diagnostics) -> Self {
        let mut map = Self::default();

        for rel in diagram
            .relationships
            .iter()
            .filter(|r| r.kind == RelationshipKind::Inheritance)
        {
            let (parent, child) = if rel.source_multiplicity.is_exactly_one()
                && rel.target_multiplicity.is_many()
            {
                (&rel.source, &rel.target)
            } else if rel.target_multiplicity.is_exactly_one() && rel.source_multiplicity.is_many() {
                (&rel.target, &rel.source)
            } else {
                diags.classification(
                    Some(rel.source.as_str()),
                    None,
                    format!(
                        "inheritance edge `{}` has multiplicities `{}`/`{}`; expected one side `1` and the other `*`; edge ignored",
                        rel.id,
                        rel.source_multiplicity.as_str(),
                        rel.target_multiplicity.as_str()
                    ),
                );
                continue;
            };

            if diagram.class(parent).is_none() || diagram.class(child).is_none() {
                diags.classification(
                    Some(child.as_str()),
                    None,
                    format!("inheritance edge `{}` references an unknown class; edge ignored", rel.id),
                );
                continue;
            }
            if parent == child {
                diags.classification(
                    Some(child.as_str()),
                    None,
                    format!("inheritance edge `{}` is a self reference; edge ignored", rel.id),
                );
                continue;
            }
            if let Some(existing) = map.parent_of.get(child) {
                tracing::debug!(
                    child = %child,
                    kept = %existing,
                    ignored = %parent,
                    "class already has a parent; later inheritance edge ignored"
                );
                continue;
            }
            if map.chain(parent).iter().any(|a| a == child) {
                diags.classification(
                    Some(child.as_str()),
                    None,
                    format!("inheritance edge `{}` would create a cycle; edge ignored", rel.id),
                );
                continue;
            }

            map.parent_of.insert(child.clone(), parent.clone());
            map.children_of
                .entry(parent.clone())
                .or_default()
                .push(child.clone());
        }

        tracing::debug!(children = map.parent_of.len(), "inheritance resolved");
        map
    }

    pub fn parent(&self, class_id: &str) -> Option<&str> {
        self.parent_of.get(class_id).map(String::as_str)
    }

    pub fn is_child(&self, class_id: &str) -> bool {
        self.parent_of.contains_key(class_id)
    }

    pub fn is_parent(&self, class_id: &str) -> bool {
        self.children_of.contains_key(class_id)
    }

    pub fn children(&self, class_id: &str) -> &[ClassId] {
        self.children_of
            .get(class_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Ancestors, nearest first.
    pub fn ancestors(&self, class_id: &str) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        let mut cursor = self.parent(class_id);
        while let Some(parent) = cursor {
            if parent == class_id || out.contains(&parent) {
                break;
            }
            out.push(parent);
            cursor = self.parent(parent);
        }
        out
    }

    /// The class followed by its ancestors, nearest first.
    fn chain(&self, class_id: &str) -> Vec<String> {
        std::iter::once(class_id)
            .chain(self.ancestors(class_id))
            .map(str::to_string)
            .collect()
    }

    /// Topmost ancestor, or the class itself.
    pub fn root<'a>(&'a self, class_id: &'a str) -> &'a str {
        self.ancestors(class_id).last().copied().unwrap_or(class_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use classforge_diagram::{ClassNode, Relationship};

    fn diagram(edges: Vec<Relationship>) -> Diagram {
        Diagram {
            classes: vec![
                ClassNode::new("animal", "Animal"),
                ClassNode::new("dog", "Dog"),
                ClassNode::new("puppy", "Puppy"),
            ],
            relationships: edges,
            association_tables: Vec::new(),
        }
    }

    fn inherit(id: &str, src: &str, tgt: &str, sm: &str, tm: &str) -> Relationship {
        Relationship::new(id, src, tgt, RelationshipKind::Inheritance, sm, tm)
    }

    #[test]
    fn exact_one_side_is_parent_in_either_direction() {
        let mut diags = Diagnostics::new();
        let map = InheritanceMap::resolve(
            &diagram(vec![
                inherit("r1", "animal", "dog", "1", "*"),
                inherit("r2", "puppy", "dog", "*", "1"),
            ]),
            &mut diags,
        );
        assert_eq!(map.parent("dog"), Some("animal"));
        assert_eq!(map.parent("puppy"), Some("dog"));
        assert_eq!(map.ancestors("puppy"), vec!["dog", "animal"]);
        assert_eq!(map.root("puppy"), "animal");
        assert!(map.is_parent("animal"));
        assert_eq!(map.children("dog"), ["puppy".to_string()]);
        assert!(diags.is_empty());
    }

    #[test]
    fn non_conforming_multiplicities_warn_and_ignore() {
        let mut diags = Diagnostics::new();
        let map = InheritanceMap::resolve(
            &diagram(vec![inherit("r1", "animal", "dog", "0..1", "*")]),
            &mut diags,
        );
        assert!(!map.is_child("dog"));
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn first_parent_wins() {
        let mut diags = Diagnostics::new();
        let map = InheritanceMap::resolve(
            &diagram(vec![
                inherit("r1", "animal", "dog", "1", "*"),
                inherit("r2", "puppy", "dog", "1", "*"),
            ]),
            &mut diags,
        );
        assert_eq!(map.parent("dog"), Some("animal"));
        assert!(diags.is_empty());
    }

    #[test]
    fn cycles_are_rejected() {
        let mut diags = Diagnostics::new();
        let map = InheritanceMap::resolve(
            &diagram(vec![
                inherit("r1", "animal", "dog", "1", "*"),
                inherit("r2", "dog", "animal", "1", "*"),
            ]),
            &mut diags,
        );
        assert_eq!(map.parent("dog"), Some("animal"));
        assert_eq!(map.parent("animal"), None);
        assert_eq!(diags.len(), 1);
    }
}
