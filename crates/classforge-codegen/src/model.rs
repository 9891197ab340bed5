//! Read-only analysis shared by every generator in one run: the diagram, the
//! config, the inheritance map, classified relationships, resolved primary
//! keys and per-class attribute roles.

use crate::classify::RelationIndex;
use crate::config::GeneratorConfig;
use crate::diagnostics::Diagnostics;
use crate::inheritance::InheritanceMap;
use crate::java_types::map_type;
use crate::naming;
use classforge_diagram::{Attribute, ClassId, ClassNode, Diagram};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// How an attribute takes part in generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeRole {
    PrimaryKey,
    Column,
    Static,
    ForeignKey { target: ClassId },
    /// FK pointing at the class's own inheritance parent. The entity has no
    /// relation field for it; the DTO still carries the id.
    ParentForeignKey { target: ClassId },
    /// Relationship marker without an FK. Expressed through edges instead.
    Relationship,
}

#[derive(Debug, Clone)]
pub struct ResolvedAttribute<'a> {
    pub attribute: &'a Attribute,
    pub role: AttributeRole,
}

/// Resolved primary key of a class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimaryKey {
    /// Declared attribute name, nearest in the chain; `id` when synthesized.
    pub name: String,
    /// Own PK attribute type, else the nearest ancestor's, else the default.
    pub java_type: String,
    pub declared_in: Option<ClassId>,
    /// The `@Id` property living on the hierarchy root.
    pub property: String,
    pub property_type: String,
    /// `GenerationType` constant for the root's `@GeneratedValue`, if any.
    pub generation: Option<&'static str>,
}

impl PrimaryKey {
    pub fn is_synthesized(&self) -> bool {
        self.declared_in.is_none()
    }
}

pub struct Model<'a> {
    pub diagram: &'a Diagram,
    pub config: &'a GeneratorConfig,
    pub inheritance: InheritanceMap,
    pub relations: RelationIndex,
    primary_keys: BTreeMap<ClassId, PrimaryKey>,
    attributes: BTreeMap<ClassId, Vec<ResolvedAttribute<'a>>>,
}

impl<'a> Model<'a> {
    pub fn build(diagram: &'a Diagram, config: &'a GeneratorConfig, diags: &mut Diagnostics) -> Self {
        warn_duplicate_class_names(diagram, diags);

        let inheritance = InheritanceMap::resolve(diagram, diags);
        let relations = RelationIndex::classify(diagram, diags);

        let mut model = Self {
            diagram,
            config,
            inheritance,
            relations,
            primary_keys: BTreeMap::new(),
            attributes: BTreeMap::new(),
        };

        for class in &diagram.classes {
            let pk = model.resolve_primary_key(&class.id);
            if let Some(own) = class.primary_key_attribute() {
                let own_type = map_type(&own.ty);
                if model.inheritance.is_child(&class.id) && own_type != pk.property_type {
                    diags.classification(
                        Some(class.id.as_str()),
                        Some(own.name.as_str()),
                        format!(
                            "primary key type `{own_type}` differs from inherited id type `{}`",
                            pk.property_type
                        ),
                    );
                }
            }
            model.primary_keys.insert(class.id.clone(), pk);
        }

        for class in &diagram.classes {
            let resolved = model.resolve_attributes(class, diags);
            model.attributes.insert(class.id.clone(), resolved);
        }

        tracing::debug!(classes = diagram.classes.len(), "model built");
        model
    }

    pub fn class(&self, id: &str) -> Option<&'a ClassNode> {
        self.diagram.class(id)
    }

    pub fn class_by_name(&self, name: &str) -> Option<&'a ClassNode> {
        self.diagram.class_by_name(name)
    }

    pub fn parent_class(&self, id: &str) -> Option<&'a ClassNode> {
        self.inheritance.parent(id).and_then(|p| self.diagram.class(p))
    }

    /// Ancestors whose fields a class must not redeclare: the whole chain, or
    /// only the immediate parent when `skip_ancestor_fields` is off.
    pub fn shadowing_ancestors(&self, id: &str) -> Vec<&str> {
        if self.config.skip_ancestor_fields {
            self.inheritance.ancestors(id)
        } else {
            self.inheritance.parent(id).into_iter().collect()
        }
    }

    pub fn type_name(&self, id: &str) -> String {
        self.class(id)
            .map(|c| naming::type_name(&c.name))
            .unwrap_or_else(|| naming::type_name(id))
    }

    /// Primary key of a known class. Unknown ids get the synthesized default.
    pub fn primary_key(&self, id: &str) -> PrimaryKey {
        self.primary_keys
            .get(id)
            .cloned()
            .unwrap_or_else(|| self.synthesized_key())
    }

    pub fn attributes(&self, id: &str) -> &[ResolvedAttribute<'a>] {
        self.attributes.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    fn synthesized_key(&self) -> PrimaryKey {
        let java_type = map_type(&self.config.default_id_type);
        PrimaryKey {
            name: "id".to_string(),
            generation: generation_for(&java_type),
            java_type: java_type.clone(),
            declared_in: None,
            property: "id".to_string(),
            property_type: java_type,
        }
    }

    fn resolve_primary_key(&self, id: &str) -> PrimaryKey {
        let chain = std::iter::once(id).chain(self.inheritance.ancestors(id));
        let nearest = chain
            .filter_map(|c| self.diagram.class(c))
            .find_map(|c| c.primary_key_attribute().map(|a| (c, a)));

        let root = self.inheritance.root(id);
        let root_key = self
            .diagram
            .class(root)
            .and_then(ClassNode::primary_key_attribute);

        let mut key = self.synthesized_key();
        if let Some(attr) = root_key {
            key.property = naming::field_name(&attr.name);
            key.property_type = map_type(&attr.ty);
            key.generation = generation_for(&key.property_type);
        }
        if let Some((class, attr)) = nearest {
            key.name = attr.name.clone();
            key.java_type = map_type(&attr.ty);
            key.declared_in = Some(class.id.clone());
        }
        key
    }

    fn resolve_attributes(
        &self,
        class: &'a ClassNode,
        diags: &mut Diagnostics,
    ) -> Vec<ResolvedAttribute<'a>> {
        let parent = self.parent_class(&class.id);
        let parent_names: BTreeSet<&str> = parent
            .map(|p| p.attributes.iter().map(|a| a.name.as_str()).collect())
            .unwrap_or_default();

        let mut seen = BTreeSet::new();
        let mut primary_key_seen = false;
        let mut out = Vec::new();

        for attribute in &class.attributes {
            let field = naming::field_name(&attribute.name);
            if !seen.insert(field) {
                diags.classification(
                    Some(class.id.as_str()),
                    Some(attribute.name.as_str()),
                    "duplicate attribute name; later declaration ignored",
                );
                continue;
            }
            if parent_names.contains(attribute.name.as_str()) && !attribute.is_primary_key {
                tracing::debug!(
                    class = %class.id,
                    attribute = %attribute.name,
                    "attribute already declared by parent; excluded"
                );
                continue;
            }

            let role = if attribute.is_primary_key && !primary_key_seen {
                primary_key_seen = true;
                AttributeRole::PrimaryKey
            } else if attribute.is_primary_key {
                diags.classification(
                    Some(class.id.as_str()),
                    Some(attribute.name.as_str()),
                    "additional primary key attribute; generated as a plain column",
                );
                AttributeRole::Column
            } else if attribute.is_static {
                AttributeRole::Static
            } else if let Some(target_name) = attribute.foreign_target() {
                self.foreign_key_role(class, attribute, target_name, parent, diags)
            } else if attribute.is_relationship_attribute {
                AttributeRole::Relationship
            } else {
                AttributeRole::Column
            };
            out.push(ResolvedAttribute { attribute, role });
        }
        out
    }

    fn foreign_key_role(
        &self,
        class: &ClassNode,
        attribute: &Attribute,
        target_name: &str,
        parent: Option<&ClassNode>,
        diags: &mut Diagnostics,
    ) -> AttributeRole {
        let Some(target) = self.diagram.class_by_name(target_name) else {
            let message = if self
                .diagram
                .association_tables
                .iter()
                .any(|t| t.name().eq_ignore_ascii_case(target_name))
            {
                format!("foreign key references association table `{target_name}`; generated as a plain column")
            } else {
                format!("foreign key references unknown class `{target_name}`; generated as a plain column")
            };
            diags.classification(Some(class.id.as_str()), Some(attribute.name.as_str()), message);
            return AttributeRole::Column;
        };

        if parent.is_some_and(|p| p.id == target.id) {
            diags.note(
                &class.id,
                Some(attribute.name.as_str()),
                format!(
                    "foreign key targets inheritance parent `{}`; no relation field generated",
                    target.name
                ),
            );
            return AttributeRole::ParentForeignKey {
                target: target.id.clone(),
            };
        }
        AttributeRole::ForeignKey {
            target: target.id.clone(),
        }
    }
}

fn generation_for(java_type: &str) -> Option<&'static str> {
    match java_type {
        "Long" | "Integer" => Some("IDENTITY"),
        "UUID" => Some("UUID"),
        _ => None,
    }
}

fn warn_duplicate_class_names(diagram: &Diagram, diags: &mut Diagnostics) {
    let mut seen: BTreeMap<String, &str> = BTreeMap::new();
    for class in &diagram.classes {
        let type_name = naming::type_name(&class.name);
        if let Some(first) = seen.get(&type_name) {
            diags.classification(
                Some(class.id.as_str()),
                None,
                format!("class name `{type_name}` is also used by `{first}`; artifacts will collide"),
            );
        } else {
            seen.insert(type_name, &class.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use classforge_diagram::{Relationship, RelationshipKind};

    fn build<'a>(diagram: &'a Diagram, config: &'a GeneratorConfig) -> (Model<'a>, Diagnostics) {
        let mut diags = Diagnostics::new();
        let model = Model::build(diagram, config, &mut diags);
        (model, diags)
    }

    fn animal_dog(dog_pk: Option<(&str, &str)>) -> Diagram {
        let mut dog = ClassNode::new("dog", "Dog")
            .with_attribute(Attribute::new("name", "String"))
            .with_attribute(Attribute::new("breed", "String"));
        if let Some((name, ty)) = dog_pk {
            dog.attributes.insert(0, Attribute::new(name, ty).primary_key());
        }
        Diagram {
            classes: vec![
                ClassNode::new("animal", "Animal")
                    .with_attribute(Attribute::new("animalId", "Long").primary_key())
                    .with_attribute(Attribute::new("name", "String")),
                dog,
            ],
            relationships: vec![Relationship::new(
                "inh",
                "animal",
                "dog",
                RelationshipKind::Inheritance,
                "1",
                "*",
            )],
            association_tables: Vec::new(),
        }
    }

    #[test]
    fn primary_key_prefers_own_attribute() {
        let diagram = animal_dog(Some(("dogId", "Long")));
        let config = GeneratorConfig::default();
        let (model, _) = build(&diagram, &config);
        let pk = model.primary_key("dog");
        assert_eq!(pk.name, "dogId");
        assert_eq!(pk.java_type, "Long");
        assert_eq!(pk.declared_in.as_deref(), Some("dog"));
        assert_eq!(pk.property, "animalId");
    }

    #[test]
    fn primary_key_falls_back_to_nearest_ancestor() {
        let diagram = animal_dog(None);
        let config = GeneratorConfig::default();
        let (model, _) = build(&diagram, &config);
        let pk = model.primary_key("dog");
        assert_eq!(pk.name, "animalId");
        assert_eq!(pk.declared_in.as_deref(), Some("animal"));
    }

    #[test]
    fn primary_key_is_synthesized_when_absent_everywhere() {
        let diagram = Diagram {
            classes: vec![ClassNode::new("tag", "Tag").with_attribute(Attribute::new("label", "String"))],
            ..Diagram::default()
        };
        let config = GeneratorConfig::default();
        let (model, _) = build(&diagram, &config);
        let pk = model.primary_key("tag");
        assert!(pk.is_synthesized());
        assert_eq!(pk.property, "id");
        assert_eq!(pk.java_type, "Long");
        assert_eq!(pk.generation, Some("IDENTITY"));
    }

    #[test]
    fn child_excludes_immediate_parent_attribute_names() {
        let diagram = animal_dog(Some(("dogId", "Long")));
        let config = GeneratorConfig::default();
        let (model, _) = build(&diagram, &config);
        let names: Vec<&str> = model
            .attributes("dog")
            .iter()
            .map(|a| a.attribute.name.as_str())
            .collect();
        assert_eq!(names, vec!["dogId", "breed"]);
    }

    #[test]
    fn foreign_key_roles() {
        let diagram = Diagram {
            classes: vec![
                ClassNode::new("person", "Person"),
                ClassNode::new("animal", "Animal")
                    .with_attribute(Attribute::new("owner", "Long").foreign_key("Person")),
                ClassNode::new("dog", "Dog")
                    .with_attribute(Attribute::new("mother", "Long").foreign_key("Animal"))
                    .with_attribute(Attribute::new("vet", "Long").foreign_key("Clinic")),
            ],
            relationships: vec![Relationship::new(
                "inh",
                "animal",
                "dog",
                RelationshipKind::Inheritance,
                "1",
                "*",
            )],
            association_tables: Vec::new(),
        };
        let config = GeneratorConfig::default();
        let (model, diags) = build(&diagram, &config);
        assert_eq!(
            model.attributes("animal")[0].role,
            AttributeRole::ForeignKey { target: "person".into() }
        );
        let dog = model.attributes("dog");
        assert_eq!(dog[0].role, AttributeRole::ParentForeignKey { target: "animal".into() });
        assert_eq!(dog[1].role, AttributeRole::Column);
        assert_eq!(diags.len(), 2);
    }

    #[test]
    fn duplicate_attributes_keep_the_first() {
        let diagram = Diagram {
            classes: vec![ClassNode::new("a", "A")
                .with_attribute(Attribute::new("title", "String"))
                .with_attribute(Attribute::new("title", "Integer"))],
            ..Diagram::default()
        };
        let config = GeneratorConfig::default();
        let (model, diags) = build(&diagram, &config);
        assert_eq!(model.attributes("a").len(), 1);
        assert_eq!(model.attributes("a")[0].attribute.ty, "String");
        assert_eq!(diags.len(), 1);
    }
}
