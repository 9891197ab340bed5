//! JPA entity generation.
//!
//! Planning and rendering are split: the metadata builder calls [`plan_all`]
//! to learn every field (and therefore every accessor) before any artifact is
//! rendered, and [`render`] later emits exactly those plans.

use crate::classify::Shape;
use crate::diagnostics::Diagnostics;
use crate::java_types::{default_literal, map_type};
use crate::metadata::Metadata;
use crate::model::{AttributeRole, Model, PrimaryKey};
use crate::naming;
use crate::source::JavaSource;
use crate::{Artifact, ArtifactKind};
use classforge_diagram::{Attribute, ClassId, ClassNode};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Id {
        column: String,
        generation: Option<&'static str>,
        sql_type: Option<String>,
    },
    Column {
        column: String,
        sql_type: Option<String>,
        default: Option<String>,
    },
    /// Class-level constant. Not persisted, no accessors.
    Static { default: Option<String> },
    ManyToOne {
        target: ClassId,
        join_column: String,
        referenced_column: Option<String>,
    },
    OneToOne {
        target: ClassId,
        join_column: String,
        cascade: bool,
    },
    OneToOneInverse { target: ClassId, mapped_by: String },
    OneToMany {
        target: ClassId,
        mapped_by: String,
        cascade: bool,
    },
    ManyToManyOwner {
        target: ClassId,
        join_table: String,
        join_column: String,
        inverse_join_column: String,
    },
    ManyToManyInverse { target: ClassId, mapped_by: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityField {
    pub name: String,
    pub java_type: String,
    pub kind: FieldKind,
    /// Diagram attribute behind the field; `None` when implied by an edge.
    pub source_attribute: Option<String>,
}

impl EntityField {
    pub fn has_accessors(&self) -> bool {
        !matches!(self.kind, FieldKind::Static { .. })
    }

    pub fn is_collection(&self) -> bool {
        matches!(
            self.kind,
            FieldKind::OneToMany { .. } | FieldKind::ManyToManyOwner { .. } | FieldKind::ManyToManyInverse { .. }
        )
    }

    /// Single-valued relation whose FK column lives in this entity's table.
    pub fn owning_reference_target(&self) -> Option<&str> {
        match &self.kind {
            FieldKind::ManyToOne { target, .. } | FieldKind::OneToOne { target, .. } => Some(target),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EntityPlan {
    pub class_id: ClassId,
    pub class_name: String,
    pub type_name: String,
    pub table: String,
    pub parent: Option<ClassId>,
    pub parent_type: Option<String>,
    pub is_parent: bool,
    pub primary_key: PrimaryKey,
    /// Set for inheritance children.
    pub pk_join_column: Option<String>,
    pub own_primary_key: bool,
    pub fields: Vec<EntityField>,
    pub description: Option<String>,
    pub methods: Vec<String>,
}

impl EntityPlan {
    pub fn field(&self, name: &str) -> Option<&EntityField> {
        self.fields.iter().find(|f| f.name == name)
    }

    fn push(&mut self, field: EntityField, diags: &mut Diagnostics) {
        if self.field(&field.name).is_some() {
            diags.classification(
                Some(self.class_id.as_str()),
                Some(field.name.as_str()),
                format!("entity field `{}` already exists; second definition skipped", field.name),
            );
            return;
        }
        self.fields.push(field);
    }
}

// ============================================================================
// Planning
// ============================================================================

pub fn plan_all(model: &Model<'_>, diags: &mut Diagnostics) -> BTreeMap<ClassId, EntityPlan> {
    let mut plans = BTreeMap::new();
    for class in &model.diagram.classes {
        plans.insert(class.id.clone(), plan_outbound(model, class, diags));
    }
    add_inbound(model, &mut plans, diags);
    drop_shadowed_fields(model, &mut plans, diags);
    tracing::debug!(entities = plans.len(), "entity plans built");
    plans
}

fn plan_outbound(model: &Model<'_>, class: &ClassNode, diags: &mut Diagnostics) -> EntityPlan {
    let primary_key = model.primary_key(&class.id);
    let parent = model.inheritance.parent(&class.id).map(str::to_string);
    let own_pk = class.primary_key_attribute();

    let pk_join_column = parent.as_ref().map(|_| {
        let declared = own_pk.map_or(primary_key.name.as_str(), |a| a.name.as_str());
        naming::column_name(&naming::field_name(declared))
    });

    let mut plan = EntityPlan {
        class_id: class.id.clone(),
        class_name: class.name.clone(),
        type_name: naming::type_name(&class.name),
        table: naming::table_name(&class.name),
        parent_type: parent.as_deref().map(|p| model.type_name(p)),
        parent,
        is_parent: model.inheritance.is_parent(&class.id),
        primary_key: primary_key.clone(),
        pk_join_column,
        own_primary_key: own_pk.is_some(),
        fields: Vec::new(),
        description: class.description.clone(),
        methods: class.methods.clone(),
    };

    if plan.parent.is_none() {
        plan.push(
            EntityField {
                name: primary_key.property.clone(),
                java_type: primary_key.property_type.clone(),
                kind: FieldKind::Id {
                    column: naming::column_name(&primary_key.property),
                    generation: primary_key.generation,
                    sql_type: own_pk.and_then(|a| a.sql_type.clone()),
                },
                source_attribute: own_pk.map(|a| a.name.clone()),
            },
            diags,
        );
    }

    for resolved in model.attributes(&class.id) {
        let attr = resolved.attribute;
        let field = match &resolved.role {
            AttributeRole::PrimaryKey
            | AttributeRole::Relationship
            | AttributeRole::ParentForeignKey { .. } => continue,
            AttributeRole::Column => column_field(attr),
            AttributeRole::Static => {
                let java_type = map_type(&attr.ty);
                EntityField {
                    name: naming::field_name(&attr.name),
                    kind: FieldKind::Static {
                        default: attr
                            .default_value
                            .as_deref()
                            .and_then(|d| default_literal(&java_type, d)),
                    },
                    java_type,
                    source_attribute: Some(attr.name.clone()),
                }
            }
            AttributeRole::ForeignKey { target } => reference_field(model, class, attr, target),
        };
        plan.push(field, diags);
    }

    for edge in model.relations.involving(&class.id) {
        if edge.explicit_fk {
            continue;
        }
        let composition = edge.is_composition();
        match &edge.shape {
            Shape::OneToMany { one, many } if *many == class.id => {
                let name = naming::reference_field_name(&class_name(model, one));
                plan.push(
                    EntityField {
                        java_type: model.type_name(one),
                        kind: FieldKind::ManyToOne {
                            target: one.clone(),
                            join_column: naming::join_column_name(&name),
                            referenced_column: None,
                        },
                        name,
                        source_attribute: None,
                    },
                    diags,
                );
            }
            Shape::OneToOne { owner, inverse } if *owner == class.id => {
                let name = naming::reference_field_name(&class_name(model, inverse));
                plan.push(
                    EntityField {
                        java_type: model.type_name(inverse),
                        kind: FieldKind::OneToOne {
                            target: inverse.clone(),
                            join_column: naming::join_column_name(&name),
                            cascade: composition,
                        },
                        name,
                        source_attribute: None,
                    },
                    diags,
                );
            }
            Shape::ManyToMany {
                owner,
                inverse,
                join_table: None,
            } if *owner == class.id => {
                let owner_name = class_name(model, owner);
                let inverse_name = class_name(model, inverse);
                let owner_snake = naming::snake_case(&owner_name);
                let inverse_join_column = if owner == inverse {
                    format!("related_{owner_snake}_id")
                } else {
                    format!("{}_id", naming::snake_case(&inverse_name))
                };
                plan.push(
                    EntityField {
                        name: naming::collection_field_name(&inverse_name),
                        java_type: format!("List<{}>", model.type_name(inverse)),
                        kind: FieldKind::ManyToManyOwner {
                            target: inverse.clone(),
                            join_table: naming::join_table_name(&owner_name, &inverse_name),
                            join_column: format!("{owner_snake}_id"),
                            inverse_join_column,
                        },
                        source_attribute: None,
                    },
                    diags,
                );
            }
            _ => {}
        }
    }

    plan
}

fn class_name(model: &Model<'_>, id: &str) -> String {
    model
        .class(id)
        .map_or_else(|| id.to_string(), |c| c.name.clone())
}

pub(crate) fn column_field(attr: &Attribute) -> EntityField {
    let name = naming::field_name(&attr.name);
    let java_type = map_type(&attr.ty);
    EntityField {
        kind: FieldKind::Column {
            column: naming::column_name(&name),
            sql_type: attr.sql_type.clone(),
            default: attr
                .default_value
                .as_deref()
                .and_then(|d| default_literal(&java_type, d)),
        },
        name,
        java_type,
        source_attribute: Some(attr.name.clone()),
    }
}

fn reference_field(model: &Model<'_>, class: &ClassNode, attr: &Attribute, target: &str) -> EntityField {
    let name = naming::relation_base_name(&attr.name);
    let join_column = naming::join_column_name(&name);
    let kind = if model.relations.one_to_one_between(&class.id, target) {
        FieldKind::OneToOne {
            target: target.to_string(),
            join_column,
            cascade: model.relations.composition_between(&class.id, target),
        }
    } else {
        let key = model.primary_key(target);
        let referenced_column = attr
            .referenced_field
            .as_deref()
            .map(naming::field_name)
            .filter(|f| *f != key.property)
            .map(|f| naming::column_name(&f));
        FieldKind::ManyToOne {
            target: target.to_string(),
            join_column,
            referenced_column,
        }
    };
    EntityField {
        name,
        java_type: model.type_name(target),
        kind,
        source_attribute: Some(attr.name.clone()),
    }
}

/// Inverse sides: one-to-many collections for inbound many-to-one fields,
/// mapped-by one-to-one fields, and many-to-many inverse collections.
fn add_inbound(model: &Model<'_>, plans: &mut BTreeMap<ClassId, EntityPlan>, diags: &mut Diagnostics) {
    let mut additions: Vec<(ClassId, EntityField)> = Vec::new();

    for holder in &model.diagram.classes {
        let Some(plan) = plans.get(&holder.id) else {
            continue;
        };
        for field in &plan.fields {
            let (target, inverse) = match &field.kind {
                FieldKind::ManyToOne { target, .. } if *target != holder.id => (
                    target,
                    EntityField {
                        name: naming::collection_field_name(&holder.name),
                        java_type: format!("List<{}>", plan.type_name),
                        kind: FieldKind::OneToMany {
                            target: holder.id.clone(),
                            mapped_by: field.name.clone(),
                            cascade: model.relations.composition_between(&holder.id, target),
                        },
                        source_attribute: None,
                    },
                ),
                FieldKind::OneToOne { target, .. } if *target != holder.id => (
                    target,
                    EntityField {
                        name: naming::reference_field_name(&holder.name),
                        java_type: plan.type_name.clone(),
                        kind: FieldKind::OneToOneInverse {
                            target: holder.id.clone(),
                            mapped_by: field.name.clone(),
                        },
                        source_attribute: None,
                    },
                ),
                FieldKind::ManyToManyOwner { target, .. } if *target != holder.id => (
                    target,
                    EntityField {
                        name: naming::collection_field_name(&holder.name),
                        java_type: format!("List<{}>", plan.type_name),
                        kind: FieldKind::ManyToManyInverse {
                            target: holder.id.clone(),
                            mapped_by: field.name.clone(),
                        },
                        source_attribute: None,
                    },
                ),
                _ => continue,
            };
            additions.push((target.clone(), inverse));
        }
    }

    for (target, field) in additions {
        let Some(plan) = plans.get_mut(&target) else {
            continue;
        };
        if let FieldKind::OneToMany { target: related, .. } = &field.kind {
            let already = plan
                .fields
                .iter()
                .any(|f| matches!(&f.kind, FieldKind::OneToMany { target: t, .. } if t == related));
            if already {
                tracing::debug!(
                    class = %plan.class_id,
                    related = %related,
                    "one-to-many collection for related class already present; extra FK ignored"
                );
                continue;
            }
        }
        plan.push(field, diags);
    }
}

/// A child must not redeclare a field an ancestor already declares.
fn drop_shadowed_fields(
    model: &Model<'_>,
    plans: &mut BTreeMap<ClassId, EntityPlan>,
    diags: &mut Diagnostics,
) {
    for class in &model.diagram.classes {
        let inherited: BTreeSet<String> = model
            .shadowing_ancestors(&class.id)
            .iter()
            .filter_map(|a| plans.get(*a))
            .flat_map(|p| p.fields.iter().map(|f| f.name.clone()))
            .collect();
        if inherited.is_empty() {
            continue;
        }
        let Some(plan) = plans.get_mut(&class.id) else {
            continue;
        };
        plan.fields.retain(|f| {
            if inherited.contains(&f.name) {
                diags.classification(
                    Some(class.id.as_str()),
                    Some(f.name.as_str()),
                    "field is already declared by an ancestor entity; skipped",
                );
                false
            } else {
                true
            }
        });
    }
}

// ============================================================================
// Rendering
// ============================================================================

pub fn render(model: &Model<'_>, metadata: &Metadata, plan: &EntityPlan, diags: &mut Diagnostics) -> Artifact {
    let mut src = JavaSource::new(model.config.package("entities"));
    src.import("jakarta.persistence.*");

    let mut doc = Vec::new();
    if let Some(description) = plan.description.as_deref().filter(|d| !d.trim().is_empty()) {
        doc.push(description.trim().to_string());
    }
    if !plan.methods.is_empty() {
        if !doc.is_empty() {
            doc.push(String::new());
        }
        doc.push("Declared operations:".to_string());
        doc.extend(plan.methods.iter().map(|m| format!("- {m}")));
    }
    src.doc(&doc);

    src.line("@Entity");
    src.line(format!("@Table(name = \"{}\")", plan.table));
    if plan.is_parent {
        src.line("@Inheritance(strategy = InheritanceType.JOINED)");
    }
    if let Some(column) = &plan.pk_join_column {
        src.line(format!("@PrimaryKeyJoinColumn(name = \"{column}\")"));
    }
    match &plan.parent_type {
        Some(parent) => src.open(format!("public class {} extends {parent}", plan.type_name)),
        None => src.open(format!("public class {}", plan.type_name)),
    }

    for field in &plan.fields {
        src.import_type(&field.java_type);
        if field.is_collection() {
            src.import("java.util.ArrayList");
        }
        src.blank();
        render_field(&mut src, field);
    }

    src.blank();
    src.open(format!("public {}()", plan.type_name));
    src.close();

    for field in plan.fields.iter().filter(|f| f.has_accessors()) {
        src.blank();
        src.open(format!("public {} {}()", field.java_type, naming::getter_name(&field.name)));
        src.line(format!("return {};", field.name));
        src.close();
        src.blank();
        src.open(format!(
            "public void {}({} {})",
            naming::setter_name(&field.name),
            field.java_type,
            field.name
        ));
        src.line(format!("this.{0} = {0};", field.name));
        src.close();
    }

    render_equality(&mut src, metadata, plan, diags);
    src.close();

    Artifact::new(ArtifactKind::Entity, &plan.type_name, src.finish())
}

pub(crate) fn render_field(src: &mut JavaSource, field: &EntityField) {
    let name = &field.name;
    let ty = &field.java_type;
    match &field.kind {
        FieldKind::Id {
            column,
            generation,
            sql_type,
        } => {
            src.line("@Id");
            if let Some(strategy) = generation {
                src.line(format!("@GeneratedValue(strategy = GenerationType.{strategy})"));
            }
            src.line(column_annotation(column, sql_type.as_deref()));
            src.line(format!("private {ty} {name};"));
        }
        FieldKind::Column {
            column,
            sql_type,
            default,
        } => {
            src.line(column_annotation(column, sql_type.as_deref()));
            match default {
                Some(value) => src.line(format!("private {ty} {name} = {value};")),
                None => src.line(format!("private {ty} {name};")),
            }
        }
        FieldKind::Static { default } => match default {
            Some(value) => src.line(format!("private static {ty} {name} = {value};")),
            None => src.line(format!("private static {ty} {name};")),
        },
        FieldKind::ManyToOne {
            join_column,
            referenced_column,
            ..
        } => {
            src.line("@ManyToOne(fetch = FetchType.LAZY)");
            match referenced_column {
                Some(referenced) => src.line(format!(
                    "@JoinColumn(name = \"{join_column}\", referencedColumnName = \"{referenced}\")"
                )),
                None => src.line(format!("@JoinColumn(name = \"{join_column}\")")),
            }
            src.line(format!("private {ty} {name};"));
        }
        FieldKind::OneToOne {
            join_column,
            cascade,
            ..
        } => {
            if *cascade {
                src.line("@OneToOne(fetch = FetchType.LAZY, cascade = CascadeType.ALL)");
            } else {
                src.line("@OneToOne(fetch = FetchType.LAZY)");
            }
            src.line(format!("@JoinColumn(name = \"{join_column}\")"));
            src.line(format!("private {ty} {name};"));
        }
        FieldKind::OneToOneInverse { mapped_by, .. } => {
            src.line(format!("@OneToOne(mappedBy = \"{mapped_by}\")"));
            src.line(format!("private {ty} {name};"));
        }
        FieldKind::OneToMany {
            mapped_by, cascade, ..
        } => {
            if *cascade {
                src.line(format!(
                    "@OneToMany(mappedBy = \"{mapped_by}\", cascade = CascadeType.ALL, orphanRemoval = true)"
                ));
            } else {
                src.line(format!("@OneToMany(mappedBy = \"{mapped_by}\")"));
            }
            src.line(format!("private {ty} {name} = new ArrayList<>();"));
        }
        FieldKind::ManyToManyOwner {
            join_table,
            join_column,
            inverse_join_column,
            ..
        } => {
            src.line("@ManyToMany");
            src.line("@JoinTable(");
            src.line(format!("        name = \"{join_table}\","));
            src.line(format!("        joinColumns = @JoinColumn(name = \"{join_column}\"),"));
            src.line(format!(
                "        inverseJoinColumns = @JoinColumn(name = \"{inverse_join_column}\"))"
            ));
            src.line(format!("private {ty} {name} = new ArrayList<>();"));
        }
        FieldKind::ManyToManyInverse { mapped_by, .. } => {
            src.line(format!("@ManyToMany(mappedBy = \"{mapped_by}\")"));
            src.line(format!("private {ty} {name} = new ArrayList<>();"));
        }
    }
}

fn column_annotation(column: &str, sql_type: Option<&str>) -> String {
    match sql_type.map(str::trim).filter(|s| !s.is_empty()) {
        Some(definition) => format!(
            "@Column(name = \"{column}\", columnDefinition = \"{}\")",
            definition.replace('"', "\\\"")
        ),
        None => format!("@Column(name = \"{column}\")"),
    }
}

/// Equality and hashing use only the primary key. A child without its own key
/// delegates to its parent.
fn render_equality(src: &mut JavaSource, metadata: &Metadata, plan: &EntityPlan, diags: &mut Diagnostics) {
    let key = &plan.primary_key.property;
    let delegate = plan.parent.is_some() && !plan.own_primary_key;

    let comparison = if delegate {
        None
    } else if plan.parent.is_none() {
        Some((key.clone(), format!("other.{key}")))
    } else {
        match metadata.entity_accessor(&plan.class_id, key) {
            Some(accessor) => Some((
                format!("{}()", accessor.getter),
                format!("other.{}()", accessor.getter),
            )),
            None => {
                diags.consistency(
                    &plan.class_id,
                    key,
                    format!(
                        "equals/hashCode: key accessor `{}` not predicted; delegating to parent",
                        naming::getter_name(key)
                    ),
                );
                None
            }
        }
    };

    src.blank();
    src.line("@Override");
    src.open("public boolean equals(Object o)");
    match &comparison {
        None => src.line("return super.equals(o);"),
        Some((mine, theirs)) => {
            src.import("java.util.Objects");
            src.open("if (this == o)");
            src.line("return true;");
            src.close();
            src.open("if (o == null || getClass() != o.getClass())");
            src.line("return false;");
            src.close();
            src.line(format!("{0} other = ({0}) o;", plan.type_name));
            src.line(format!("return {mine} != null && Objects.equals({mine}, {theirs});"));
        }
    }
    src.close();

    src.blank();
    src.line("@Override");
    src.open("public int hashCode()");
    match &comparison {
        None => src.line("return super.hashCode();"),
        Some((mine, _)) => src.line(format!("return Objects.hash({mine});")),
    }
    src.close();
}
