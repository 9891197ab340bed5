//! Transfer objects. FK relations travel as `<relation>Id` scalars.

use crate::diagnostics::Diagnostics;
use crate::entity::EntityPlan;
use crate::java_types::map_type;
use crate::model::{AttributeRole, Model};
use crate::naming;
use crate::source::JavaSource;
use crate::{Artifact, ArtifactKind};
use classforge_diagram::ClassId;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DtoFieldKind {
    Id,
    Scalar,
    /// Id of a related entity; `relation` names the entity-side field.
    ForeignKeyId { target: ClassId, relation: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DtoField {
    pub name: String,
    pub java_type: String,
    pub kind: DtoFieldKind,
}

#[derive(Debug, Clone)]
pub struct DtoPlan {
    pub class_id: ClassId,
    pub type_name: String,
    pub parent: Option<ClassId>,
    pub parent_type: Option<String>,
    pub fields: Vec<DtoField>,
}

impl DtoPlan {
    pub fn field(&self, name: &str) -> Option<&DtoField> {
        self.fields.iter().find(|f| f.name == name)
    }

    fn push(&mut self, field: DtoField, diags: &mut Diagnostics) {
        if self.field(&field.name).is_some() {
            diags.classification(
                Some(self.class_id.as_str()),
                Some(field.name.as_str()),
                format!("DTO field `{}` already exists; second definition skipped", field.name),
            );
            return;
        }
        self.fields.push(field);
    }
}

pub fn plan_all(
    model: &Model<'_>,
    entities: &BTreeMap<ClassId, EntityPlan>,
    diags: &mut Diagnostics,
) -> BTreeMap<ClassId, DtoPlan> {
    let mut plans = BTreeMap::new();
    for class in &model.diagram.classes {
        let Some(entity) = entities.get(&class.id) else {
            continue;
        };
        plans.insert(class.id.clone(), plan(model, entity, diags));
    }

    // children never redeclare what an ancestor DTO already carries
    for class in &model.diagram.classes {
        let inherited: Vec<String> = model
            .shadowing_ancestors(&class.id)
            .iter()
            .filter_map(|a| plans.get(*a))
            .flat_map(|p: &DtoPlan| p.fields.iter().map(|f| f.name.clone()))
            .collect();
        if let Some(plan) = plans.get_mut(&class.id) {
            plan.fields.retain(|f| !inherited.contains(&f.name));
        }
    }
    plans
}

pub fn plan(model: &Model<'_>, entity: &EntityPlan, diags: &mut Diagnostics) -> DtoPlan {
    let class_id = &entity.class_id;
    let mut plan = DtoPlan {
        class_id: class_id.clone(),
        type_name: naming::dto_type_name(&entity.class_name),
        parent: entity.parent.clone(),
        parent_type: entity
            .parent
            .as_deref()
            .and_then(|p| model.class(p))
            .map(|p| naming::dto_type_name(&p.name)),
        fields: Vec::new(),
    };

    if entity.parent.is_none() {
        plan.push(
            DtoField {
                name: entity.primary_key.property.clone(),
                java_type: entity.primary_key.property_type.clone(),
                kind: DtoFieldKind::Id,
            },
            diags,
        );
    }

    for resolved in model.attributes(class_id) {
        let attr = resolved.attribute;
        let field = match &resolved.role {
            AttributeRole::PrimaryKey | AttributeRole::Static | AttributeRole::Relationship => continue,
            AttributeRole::Column => DtoField {
                name: naming::field_name(&attr.name),
                java_type: map_type(&attr.ty),
                kind: DtoFieldKind::Scalar,
            },
            AttributeRole::ForeignKey { target } | AttributeRole::ParentForeignKey { target } => DtoField {
                name: naming::foreign_key_id_field(&attr.name),
                java_type: model.primary_key(target).java_type,
                kind: DtoFieldKind::ForeignKeyId {
                    target: target.clone(),
                    relation: naming::relation_base_name(&attr.name),
                },
            },
        };
        plan.push(field, diags);
    }

    // relation fields implied by edges rather than FK attributes
    for field in entity.fields.iter().filter(|f| f.source_attribute.is_none()) {
        if let Some(target) = field.owning_reference_target() {
            plan.push(
                DtoField {
                    name: format!("{}Id", field.name),
                    java_type: model.primary_key(target).java_type,
                    kind: DtoFieldKind::ForeignKeyId {
                        target: target.to_string(),
                        relation: field.name.clone(),
                    },
                },
                diags,
            );
        }
    }

    plan
}

pub fn render(model: &Model<'_>, plan: &DtoPlan) -> Artifact {
    let mut src = JavaSource::new(model.config.package("dto"));
    for field in &plan.fields {
        src.import_type(&field.java_type);
    }

    match &plan.parent_type {
        Some(parent) => src.open(format!("public class {} extends {parent}", plan.type_name)),
        None => src.open(format!("public class {}", plan.type_name)),
    }

    for field in &plan.fields {
        src.blank();
        src.line(format!("private {} {};", field.java_type, field.name));
    }

    src.blank();
    src.open(format!("public {}()", plan.type_name));
    src.close();

    for field in &plan.fields {
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
    src.close();

    Artifact::new(ArtifactKind::Dto, &plan.type_name, src.finish())
}
