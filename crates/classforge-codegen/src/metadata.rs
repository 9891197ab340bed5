//! Accessor-surface prediction.
//!
//! Built once, before any artifact is rendered, from the same plans the
//! entity, join-entity and DTO renderers later emit. Generators that call
//! into another artifact (mapper → entity getter, service → repository
//! lookup, controller → navigation getter) ask this module first; a missing
//! prediction means that single reference is skipped with a consistency
//! warning.

use crate::diagnostics::Diagnostics;
use crate::dto::{self, DtoField, DtoFieldKind, DtoPlan};
use crate::entity::{self, EntityPlan};
use crate::join_entity::{self, JoinPlan};
use crate::model::Model;
use crate::naming;
use classforge_diagram::ClassId;
use serde::Serialize;
use std::collections::BTreeMap;

/// Predicted getter/setter pair for one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Accessor {
    pub getter: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub setter: Option<String>,
    pub java_type: String,
    /// Class whose artifact actually declares the field.
    pub declared_in: ClassId,
}

impl Accessor {
    fn read_write(field: &str, java_type: &str, declared_in: &str) -> Self {
        Self {
            getter: naming::getter_name(field),
            setter: Some(naming::setter_name(field)),
            java_type: java_type.to_string(),
            declared_in: declared_in.to_string(),
        }
    }

    fn read_only(field: &str, java_type: &str, declared_in: &str) -> Self {
        Self {
            setter: None,
            ..Self::read_write(field, java_type, declared_in)
        }
    }
}

/// Per-class prediction: field name → accessor, for the entity and the DTO.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MethodSurface {
    pub entity: BTreeMap<String, Accessor>,
    pub dto: BTreeMap<String, Accessor>,
}

/// A DTO `<relation>Id` field together with everything needed to turn it back
/// into an entity reference.
#[derive(Debug, Clone)]
pub struct ReferenceLink<'m> {
    pub dto_field: &'m DtoField,
    pub relation: &'m str,
    pub target: &'m str,
    pub target_type: String,
    pub target_key_type: String,
    pub relation_accessor: Option<&'m Accessor>,
    pub target_key: Option<&'m Accessor>,
}

impl ReferenceLink<'_> {
    /// Why this link cannot be emitted, if it cannot.
    pub fn missing(&self) -> Option<String> {
        let relation_ok = self
            .relation_accessor
            .is_some_and(|a| a.setter.is_some());
        if !relation_ok {
            return Some(format!(
                "entity accessor pair `{}`/`{}` not predicted",
                naming::getter_name(self.relation),
                naming::setter_name(self.relation)
            ));
        }
        let Some(key) = self.target_key.filter(|k| k.setter.is_some()) else {
            return Some(format!("key accessors of `{}` not predicted", self.target_type));
        };
        if key.java_type != self.dto_field.java_type {
            return Some(format!(
                "`{}` is `{}` but the `{}` key is `{}`",
                self.dto_field.name, self.dto_field.java_type, self.target_type, key.java_type
            ));
        }
        None
    }
}

#[derive(Debug, Clone, Default)]
pub struct Metadata {
    entities: BTreeMap<ClassId, EntityPlan>,
    dtos: BTreeMap<ClassId, DtoPlan>,
    joins: BTreeMap<ClassId, JoinPlan>,
    surfaces: BTreeMap<ClassId, MethodSurface>,
}

impl Metadata {
    pub fn build(model: &Model<'_>, diags: &mut Diagnostics) -> Self {
        let entities = entity::plan_all(model, diags);
        let dtos = dto::plan_all(model, &entities, diags);
        let joins: BTreeMap<ClassId, JoinPlan> = model
            .diagram
            .association_tables
            .iter()
            .map(|t| (t.id().to_string(), join_entity::plan(model, t, diags)))
            .collect();

        let mut surfaces = BTreeMap::new();
        for class in &model.diagram.classes {
            let mut chain: Vec<&str> = model.inheritance.ancestors(&class.id);
            chain.reverse();
            chain.push(&class.id);

            let mut surface = MethodSurface::default();
            for id in chain {
                if let Some(plan) = entities.get(id) {
                    for field in plan.fields.iter().filter(|f| f.has_accessors()) {
                        surface.entity.insert(
                            field.name.clone(),
                            Accessor::read_write(&field.name, &field.java_type, id),
                        );
                    }
                }
                if let Some(plan) = dtos.get(id) {
                    for field in &plan.fields {
                        surface.dto.insert(
                            field.name.clone(),
                            Accessor::read_write(&field.name, &field.java_type, id),
                        );
                    }
                }
            }
            surfaces.insert(class.id.clone(), surface);
        }

        for (id, plan) in &joins {
            let mut surface = MethodSurface::default();
            surface
                .entity
                .insert("id".to_string(), Accessor::read_only("id", &plan.key_type_name, id));
            for key in &plan.keys {
                let (field, java_type) = match key.target_type.as_deref() {
                    Some(target_type) => (&key.relation, target_type),
                    None => (&key.key_field, key.java_type.as_str()),
                };
                surface
                    .entity
                    .insert(field.clone(), Accessor::read_write(field, java_type, id));
            }
            for column in &plan.columns {
                surface.entity.insert(
                    column.name.clone(),
                    Accessor::read_write(&column.name, &column.java_type, id),
                );
            }
            surfaces.insert(id.clone(), surface);
        }

        tracing::debug!(surfaces = surfaces.len(), "accessor surfaces predicted");
        Self {
            entities,
            dtos,
            joins,
            surfaces,
        }
    }

    pub fn entity(&self, class_id: &str) -> Option<&EntityPlan> {
        self.entities.get(class_id)
    }

    pub fn dto(&self, class_id: &str) -> Option<&DtoPlan> {
        self.dtos.get(class_id)
    }

    pub fn join(&self, table_id: &str) -> Option<&JoinPlan> {
        self.joins.get(table_id)
    }

    pub fn surface(&self, class_id: &str) -> Option<&MethodSurface> {
        self.surfaces.get(class_id)
    }

    pub fn surfaces(&self) -> &BTreeMap<ClassId, MethodSurface> {
        &self.surfaces
    }

    pub fn entity_accessor(&self, class_id: &str, field: &str) -> Option<&Accessor> {
        self.surface(class_id).and_then(|s| s.entity.get(field))
    }

    /// Accessor of the `@Id` property as seen on `class_id`'s entity.
    pub fn key_accessor(&self, class_id: &str) -> Option<&Accessor> {
        let plan = self.entity(class_id)?;
        self.entity_accessor(class_id, &plan.primary_key.property)
    }

    /// DTO fields visible on `class_id`, ancestors' first.
    pub fn dto_fields<'m>(&'m self, model: &Model<'_>, class_id: &str) -> Vec<&'m DtoField> {
        let mut chain: Vec<&str> = model.inheritance.ancestors(class_id);
        chain.reverse();
        chain.push(class_id);
        chain
            .into_iter()
            .filter_map(|id| self.dtos.get(id))
            .flat_map(|p| p.fields.iter())
            .collect()
    }

    /// Every FK-id DTO field visible on `class_id`, resolved against the
    /// predicted entity surfaces.
    pub fn references<'m>(&'m self, model: &Model<'_>, class_id: &str) -> Vec<ReferenceLink<'m>> {
        self.dto_fields(model, class_id)
            .into_iter()
            .filter_map(|field| match &field.kind {
                DtoFieldKind::ForeignKeyId { target, relation } => Some(ReferenceLink {
                    dto_field: field,
                    relation: relation.as_str(),
                    target: target.as_str(),
                    target_type: model.type_name(target),
                    target_key_type: self
                        .entity(target)
                        .map(|p| p.primary_key.property_type.clone())
                        .unwrap_or_else(|| model.primary_key(target).property_type),
                    relation_accessor: self.entity_accessor(class_id, relation),
                    target_key: self.key_accessor(target),
                }),
                _ => None,
            })
            .collect()
    }
}
