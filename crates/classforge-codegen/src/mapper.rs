//! Entity ↔ DTO mappers.
//!
//! Every line a mapper emits calls accessors on two other artifacts, so each
//! field is checked against the predicted surfaces first. Unpredicted fields
//! are left out of all three conversion methods and reported once.

use crate::diagnostics::Diagnostics;
use crate::dto::{DtoField, DtoFieldKind};
use crate::metadata::{Accessor, Metadata, ReferenceLink};
use crate::model::Model;
use crate::naming;
use crate::source::JavaSource;
use crate::{Artifact, ArtifactKind};

enum Mapping<'m> {
    Direct {
        dto: &'m DtoField,
        entity: &'m Accessor,
    },
    Reference(ReferenceLink<'m>),
}

/// Variable names the mapper methods already use.
const RESERVED_LOCALS: &[&str] = &["entity", "dto", "entities", "dtos"];

fn mappings<'m>(
    model: &Model<'_>,
    metadata: &'m Metadata,
    class_id: &str,
    diags: &mut Diagnostics,
) -> Vec<Mapping<'m>> {
    let references = metadata.references(model, class_id);
    let mut out = Vec::new();

    for field in metadata.dto_fields(model, class_id) {
        match &field.kind {
            DtoFieldKind::Id | DtoFieldKind::Scalar => {
                match metadata
                    .entity_accessor(class_id, &field.name)
                    .filter(|a| a.setter.is_some())
                {
                    Some(entity) => out.push(Mapping::Direct { dto: field, entity }),
                    None => diags.consistency(
                        class_id,
                        &field.name,
                        format!(
                            "mapper: entity accessors for `{}` not predicted; field not mapped",
                            field.name
                        ),
                    ),
                }
            }
            DtoFieldKind::ForeignKeyId { .. } => {
                let Some(link) = references
                    .iter()
                    .find(|l| std::ptr::eq(l.dto_field, field))
                    .cloned()
                else {
                    continue;
                };
                match link.missing() {
                    None => out.push(Mapping::Reference(link)),
                    Some(reason) => diags.consistency(
                        class_id,
                        &field.name,
                        format!("mapper: {reason}; `{}` not mapped", field.name),
                    ),
                }
            }
        }
    }
    out
}

fn local_name(relation: &str) -> String {
    if RESERVED_LOCALS.contains(&relation) {
        format!("{relation}Ref")
    } else {
        relation.to_string()
    }
}

fn setter(accessor: &Accessor) -> &str {
    accessor.setter.as_deref().unwrap_or_default()
}

pub fn render(model: &Model<'_>, metadata: &Metadata, class_id: &str, diags: &mut Diagnostics) -> Option<Artifact> {
    let entity_plan = metadata.entity(class_id)?;
    let dto_plan = metadata.dto(class_id)?;
    let entity = &entity_plan.type_name;
    let dto = &dto_plan.type_name;
    let mapper = format!("{entity}Mapper");

    let mappings = mappings(model, metadata, class_id, diags);

    let mut src = JavaSource::new(model.config.package("mappers"));
    src.import(format!("{}.{dto}", model.config.package("dto")));
    src.import(format!("{}.{entity}", model.config.package("entities")));
    src.import("java.util.List");
    src.import("java.util.stream.Collectors");
    src.import("org.springframework.stereotype.Component");
    for mapping in &mappings {
        if let Mapping::Reference(link) = mapping {
            src.import(format!("{}.{}", model.config.package("entities"), link.target_type));
        }
    }

    src.line("@Component");
    src.open(format!("public class {mapper}"));

    // toDTO
    src.blank();
    src.open(format!("public {dto} toDTO({entity} entity)"));
    src.open("if (entity == null)");
    src.line("return null;");
    src.close();
    src.line(format!("{dto} dto = new {dto}();"));
    for mapping in &mappings {
        match mapping {
            Mapping::Direct { dto: field, entity: accessor } => src.line(format!(
                "dto.{}(entity.{}());",
                naming::setter_name(&field.name),
                accessor.getter
            )),
            Mapping::Reference(link) => {
                let (Some(relation), Some(key)) = (link.relation_accessor, link.target_key) else {
                    continue;
                };
                src.open(format!("if (entity.{}() != null)", relation.getter));
                src.line(format!(
                    "dto.{}(entity.{}().{}());",
                    naming::setter_name(&link.dto_field.name),
                    relation.getter,
                    key.getter
                ));
                src.close();
            }
        }
    }
    src.line("return dto;");
    src.close();

    // toEntity
    src.blank();
    src.open(format!("public {entity} toEntity({dto} dto)"));
    src.open("if (dto == null)");
    src.line("return null;");
    src.close();
    src.line(format!("{entity} entity = new {entity}();"));
    for mapping in &mappings {
        match mapping {
            Mapping::Direct { dto: field, entity: accessor } => src.line(format!(
                "entity.{}(dto.{}());",
                setter(accessor),
                naming::getter_name(&field.name)
            )),
            Mapping::Reference(link) => render_reference_assignment(&mut src, link),
        }
    }
    src.line("return entity;");
    src.close();

    // updateEntityFromDTO: partial, null means unchanged, key never touched
    src.blank();
    src.open(format!("public void updateEntityFromDTO({dto} dto, {entity} entity)"));
    src.open("if (dto == null || entity == null)");
    src.line("return;");
    src.close();
    for mapping in &mappings {
        match mapping {
            Mapping::Direct { dto: field, .. } if field.kind == DtoFieldKind::Id => {}
            Mapping::Direct { dto: field, entity: accessor } => {
                let getter = naming::getter_name(&field.name);
                src.open(format!("if (dto.{getter}() != null)"));
                src.line(format!("entity.{}(dto.{getter}());", setter(accessor)));
                src.close();
            }
            Mapping::Reference(link) => render_reference_assignment(&mut src, link),
        }
    }
    src.close();

    // list variants
    src.blank();
    src.open(format!("public List<{dto}> toDTOList(List<{entity}> entities)"));
    src.open("if (entities == null)");
    src.line("return List.of();");
    src.close();
    src.line("return entities.stream().map(this::toDTO).collect(Collectors.toList());");
    src.close();

    src.blank();
    src.open(format!("public List<{entity}> toEntityList(List<{dto}> dtos)"));
    src.open("if (dtos == null)");
    src.line("return List.of();");
    src.close();
    src.line("return dtos.stream().map(this::toEntity).collect(Collectors.toList());");
    src.close();

    src.close();
    Some(Artifact::new(ArtifactKind::Mapper, &mapper, src.finish()))
}

/// `if (dto.getAuthorId() != null) { Author author = new Author(); ... }`
fn render_reference_assignment(src: &mut JavaSource, link: &ReferenceLink<'_>) {
    let (Some(relation), Some(key)) = (link.relation_accessor, link.target_key) else {
        return;
    };
    let local = local_name(link.relation);
    let getter = naming::getter_name(&link.dto_field.name);
    src.open(format!("if (dto.{getter}() != null)"));
    src.line(format!("{0} {local} = new {0}();", link.target_type));
    src.line(format!("{local}.{}(dto.{getter}());", setter(key)));
    src.line(format!("entity.{}({local});", setter(relation)));
    src.close();
}
