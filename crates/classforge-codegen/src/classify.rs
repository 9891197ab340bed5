//! Relationship classification.
//!
//! Decision order per edge:
//! 1. `inheritance` / `implementation` / `dependency` are terminal and never
//!    produce fields.
//! 2. Both multiplicities many and no FK attribute between the pair: a
//!    many-to-many, provided the edge is `many-to-many-direct` or an
//!    association table joins the pair.
//! 3. One side many: one-to-many oriented toward the "one" side. An FK
//!    attribute decides the "many" side when present.
//! 4. Otherwise one-to-one.
//!
//! Unrecognized edge types fall back to `association`; edges that touch
//! unknown classes are ignored. Both cases are recorded as classification
//! warnings.

use crate::diagnostics::Diagnostics;
use classforge_diagram::{ClassId, ClassNode, Diagram, Relationship, RelationshipKind};
use serde::Serialize;

/// Effective relation category, as seen from one endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    OneToOne,
    ManyToOne,
    OneToMany,
    ManyToMany,
    Inheritance,
    Implementation,
    Dependency,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    Inheritance,
    Implementation,
    Dependency,
    OneToMany { one: ClassId, many: ClassId },
    OneToOne { owner: ClassId, inverse: ClassId },
    /// `join_table` is the id of the association table realizing the pair,
    /// if any. Without one the pair becomes a transparent collection pair.
    ManyToMany {
        owner: ClassId,
        inverse: ClassId,
        join_table: Option<ClassId>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedEdge {
    pub relationship_id: String,
    pub source: ClassId,
    pub target: ClassId,
    /// Kind after the unrecognized-type fallback.
    pub kind: RelationshipKind,
    pub shape: Shape,
    /// Some endpoint declares an FK attribute referencing the other.
    pub explicit_fk: bool,
}

impl ClassifiedEdge {
    pub fn involves(&self, class_id: &str) -> bool {
        self.source == class_id || self.target == class_id
    }

    pub fn is_composition(&self) -> bool {
        self.kind == RelationshipKind::Composition
    }

    pub fn category_from(&self, class_id: &str) -> Category {
        match &self.shape {
            Shape::Inheritance => Category::Inheritance,
            Shape::Implementation => Category::Implementation,
            Shape::Dependency => Category::Dependency,
            Shape::OneToOne { .. } => Category::OneToOne,
            Shape::ManyToMany { .. } => Category::ManyToMany,
            Shape::OneToMany { many, .. } if many == class_id => Category::ManyToOne,
            Shape::OneToMany { .. } => Category::OneToMany,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RelationIndex {
    edges: Vec<ClassifiedEdge>,
}

impl RelationIndex {
    pub fn classify(diagram: &Diagram, diags: &mut Diagnostics) -> Self {
        let mut index = Self::default();
        for rel in &diagram.relationships {
            if let Some(edge) = classify_edge(diagram, rel, &index, diags) {
                tracing::trace!(
                    id = %edge.relationship_id,
                    category = ?edge.category_from(&edge.source),
                    "classified relationship"
                );
                index.edges.push(edge);
            }
        }
        tracing::debug!(edges = index.edges.len(), "relationships classified");
        index
    }

    pub fn edges(&self) -> &[ClassifiedEdge] {
        &self.edges
    }

    pub fn edge(&self, relationship_id: &str) -> Option<&ClassifiedEdge> {
        self.edges.iter().find(|e| e.relationship_id == relationship_id)
    }

    /// Edges connecting `a` and `b`, in either direction.
    pub fn between<'s>(
        &'s self,
        a: &'s str,
        b: &'s str,
    ) -> impl Iterator<Item = &'s ClassifiedEdge> + 's {
        self.edges.iter().filter(move |e| {
            (e.source == a && e.target == b) || (e.source == b && e.target == a)
        })
    }

    pub fn composition_between(&self, a: &str, b: &str) -> bool {
        self.between(a, b).any(ClassifiedEdge::is_composition)
    }

    pub fn one_to_one_between(&self, a: &str, b: &str) -> bool {
        self.between(a, b)
            .any(|e| matches!(e.shape, Shape::OneToOne { .. }))
    }

    pub fn involving<'s>(&'s self, class_id: &'s str) -> impl Iterator<Item = &'s ClassifiedEdge> + 's {
        self.edges.iter().filter(move |e| e.involves(class_id))
    }
}

fn classify_edge(
    diagram: &Diagram,
    rel: &Relationship,
    index: &RelationIndex,
    diags: &mut Diagnostics,
) -> Option<ClassifiedEdge> {
    if diagram.is_association_table(&rel.source) || diagram.is_association_table(&rel.target) {
        tracing::debug!(id = %rel.id, "edge to an association table is structural; skipped");
        return None;
    }
    let (Some(source), Some(target)) = (diagram.class(&rel.source), diagram.class(&rel.target)) else {
        diags.classification(
            None,
            None,
            format!(
                "relationship `{}` references unknown class `{}` or `{}`; ignored",
                rel.id, rel.source, rel.target
            ),
        );
        return None;
    };

    let kind = match &rel.kind {
        RelationshipKind::Unrecognized(raw) => {
            diags.classification(
                Some(source.id.as_str()),
                None,
                format!(
                    "relationship `{}` has unrecognized type `{raw}`; treated as association",
                    rel.id
                ),
            );
            RelationshipKind::Association
        }
        other => other.clone(),
    };

    let fk_source_to_target = source.has_foreign_key_to(&target.name);
    let fk_target_to_source = target.has_foreign_key_to(&source.name);
    let explicit_fk = fk_source_to_target || fk_target_to_source;

    let edge = |shape| ClassifiedEdge {
        relationship_id: rel.id.clone(),
        source: source.id.clone(),
        target: target.id.clone(),
        kind: kind.clone(),
        shape,
        explicit_fk,
    };

    match kind {
        RelationshipKind::Inheritance => return Some(edge(Shape::Inheritance)),
        RelationshipKind::Implementation => return Some(edge(Shape::Implementation)),
        RelationshipKind::Dependency => return Some(edge(Shape::Dependency)),
        _ => {}
    }

    let source_many = rel.source_multiplicity.is_many();
    let target_many = rel.target_multiplicity.is_many();

    if source_many && target_many && !explicit_fk {
        let join_table = join_table_for(diagram, rel, source, target, diags);
        if kind == RelationshipKind::ManyToManyDirect || join_table.is_some() {
            let duplicate = index
                .between(&source.id, &target.id)
                .any(|e| matches!(e.shape, Shape::ManyToMany { .. }));
            if duplicate {
                tracing::debug!(id = %rel.id, "many-to-many pair already classified; edge merged");
                return None;
            }
            return Some(edge(Shape::ManyToMany {
                owner: source.id.clone(),
                inverse: target.id.clone(),
                join_table,
            }));
        }
    }

    if source_many || target_many {
        let (one, many) = orient_one_to_many(
            rel,
            source,
            target,
            (source_many, target_many),
            (fk_source_to_target, fk_target_to_source),
            diags,
        );
        return Some(edge(Shape::OneToMany { one, many }));
    }

    let (owner, inverse) = if fk_target_to_source && !fk_source_to_target {
        (target.id.clone(), source.id.clone())
    } else {
        (source.id.clone(), target.id.clone())
    };
    Some(edge(Shape::OneToOne { owner, inverse }))
}

/// Returns `(one, many)`.
fn orient_one_to_many(
    rel: &Relationship,
    source: &ClassNode,
    target: &ClassNode,
    (source_many, target_many): (bool, bool),
    (fk_source_to_target, fk_target_to_source): (bool, bool),
    diags: &mut Diagnostics,
) -> (ClassId, ClassId) {
    let source_side = (target.id.clone(), source.id.clone());
    let target_side = (source.id.clone(), target.id.clone());

    // The FK holder is always the many side.
    if fk_source_to_target != fk_target_to_source {
        let by_fk = if fk_source_to_target { source_side } else { target_side };
        let by_multiplicity_agrees = if fk_source_to_target { source_many } else { target_many };
        if !by_multiplicity_agrees {
            diags.classification(
                Some(source.id.as_str()),
                None,
                format!(
                    "relationship `{}` multiplicities contradict the foreign key; the FK holder is used as the many side",
                    rel.id
                ),
            );
        }
        return by_fk;
    }

    match (source_many, target_many) {
        (true, false) => source_side,
        (false, true) => target_side,
        _ => {
            diags.classification(
                Some(source.id.as_str()),
                None,
                format!(
                    "relationship `{}` is many on both ends but not a direct many-to-many; `{}` treated as the many side",
                    rel.id, target.name
                ),
            );
            target_side
        }
    }
}

fn join_table_for(
    diagram: &Diagram,
    rel: &Relationship,
    source: &ClassNode,
    target: &ClassNode,
    diags: &mut Diagnostics,
) -> Option<ClassId> {
    if let Some(id) = rel.association_table.as_deref() {
        match diagram.association_table(id) {
            Some(table) => return Some(table.id().to_string()),
            None => diags.classification(
                Some(source.id.as_str()),
                None,
                format!(
                    "relationship `{}` names association table `{id}` which does not exist",
                    rel.id
                ),
            ),
        }
    }
    diagram
        .association_tables
        .iter()
        .find(|t| t.joins(&source.name, &target.name))
        .map(|t| t.id().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use classforge_diagram::{AssociationTable, Attribute};

    fn class(id: &str, name: &str) -> ClassNode {
        ClassNode::new(id, name).with_attribute(Attribute::new("id", "Long").primary_key())
    }

    fn classify(diagram: &Diagram) -> (RelationIndex, Diagnostics) {
        let mut diags = Diagnostics::new();
        let index = RelationIndex::classify(diagram, &mut diags);
        (index, diags)
    }

    fn rel(kind: RelationshipKind, sm: &str, tm: &str) -> Relationship {
        Relationship::new("r1", "a", "b", kind, sm, tm)
    }

    fn pair(rel: Relationship) -> Diagram {
        Diagram {
            classes: vec![class("a", "Author"), class("b", "Book")],
            relationships: vec![rel],
            association_tables: Vec::new(),
        }
    }

    #[test]
    fn terminal_kinds_never_become_fields() {
        for kind in [
            RelationshipKind::Inheritance,
            RelationshipKind::Implementation,
            RelationshipKind::Dependency,
        ] {
            let (index, _) = classify(&pair(rel(kind, "*", "*")));
            assert!(matches!(
                index.edges()[0].shape,
                Shape::Inheritance | Shape::Implementation | Shape::Dependency
            ));
        }
    }

    #[test]
    fn one_to_many_oriented_by_multiplicity() {
        let (index, diags) = classify(&pair(rel(RelationshipKind::Association, "1", "*")));
        let edge = &index.edges()[0];
        assert_eq!(
            edge.shape,
            Shape::OneToMany { one: "a".into(), many: "b".into() }
        );
        assert_eq!(edge.category_from("a"), Category::OneToMany);
        assert_eq!(edge.category_from("b"), Category::ManyToOne);
        assert!(diags.is_empty());
    }

    #[test]
    fn fk_holder_is_the_many_side() {
        let mut diagram = pair(rel(RelationshipKind::Association, "*", "1"));
        diagram.classes[1]
            .attributes
            .push(Attribute::new("author", "Long").foreign_key("Author"));
        let (index, diags) = classify(&diagram);
        assert_eq!(
            index.edges()[0].shape,
            Shape::OneToMany { one: "a".into(), many: "b".into() }
        );
        assert!(index.edges()[0].explicit_fk);
        assert_eq!(diags.len(), 1, "multiplicities contradict the FK");
    }

    #[test]
    fn direct_many_to_many_without_fk() {
        let (index, _) = classify(&pair(rel(RelationshipKind::ManyToManyDirect, "*", "*")));
        assert_eq!(
            index.edges()[0].shape,
            Shape::ManyToMany { owner: "a".into(), inverse: "b".into(), join_table: None }
        );
    }

    #[test]
    fn direct_many_to_many_with_fk_degrades_to_one_to_many() {
        let mut diagram = pair(rel(RelationshipKind::ManyToManyDirect, "*", "*"));
        diagram.classes[1]
            .attributes
            .push(Attribute::new("author", "Long").foreign_key("Author"));
        let (index, _) = classify(&diagram);
        assert_eq!(
            index.edges()[0].shape,
            Shape::OneToMany { one: "a".into(), many: "b".into() }
        );
    }

    #[test]
    fn association_table_is_linked_by_fk_targets() {
        let mut diagram = pair(rel(RelationshipKind::ManyToManyDirect, "*", "*"));
        diagram.association_tables.push(AssociationTable {
            class: ClassNode::new("j", "Authorship")
                .with_attribute(Attribute::new("author", "Long").foreign_key("Author"))
                .with_attribute(Attribute::new("book", "Long").foreign_key("Book")),
        });
        let (index, _) = classify(&diagram);
        assert_eq!(
            index.edges()[0].shape,
            Shape::ManyToMany { owner: "a".into(), inverse: "b".into(), join_table: Some("j".into()) }
        );
    }

    #[test]
    fn neither_side_many_is_one_to_one() {
        let (index, _) = classify(&pair(rel(RelationshipKind::Composition, "1", "0..1")));
        let edge = &index.edges()[0];
        assert_eq!(edge.shape, Shape::OneToOne { owner: "a".into(), inverse: "b".into() });
        assert!(edge.is_composition());
    }

    #[test]
    fn unrecognized_type_defaults_to_association_with_warning() {
        let (index, diags) =
            classify(&pair(rel(RelationshipKind::Unrecognized("friendship".into()), "1", "*")));
        assert_eq!(index.edges()[0].kind, RelationshipKind::Association);
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn unknown_endpoint_is_ignored_with_warning() {
        let mut diagram = pair(rel(RelationshipKind::Association, "1", "*"));
        diagram.relationships[0].target = "ghost".into();
        let (index, diags) = classify(&diagram);
        assert!(index.edges().is_empty());
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn duplicate_many_to_many_edges_merge() {
        let mut diagram = pair(rel(RelationshipKind::ManyToManyDirect, "*", "*"));
        let mut second = Relationship::new("r2", "b", "a", RelationshipKind::ManyToManyDirect, "*", "*");
        second.many_to_many_group = Some("g".into());
        diagram.relationships.push(second);
        let (index, _) = classify(&diagram);
        assert_eq!(index.edges().len(), 1);
    }
}
