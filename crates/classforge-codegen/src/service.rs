//! Transactional services.
//!
//! CRUD goes through the class's own repository and mapper. Before anything
//! is saved, `resolveReferences` swaps every id-only reference the mapper
//! built for the managed entity loaded from the target's repository; a
//! missing target throws before `save` is reached.

use crate::diagnostics::Diagnostics;
use crate::metadata::{Metadata, ReferenceLink};
use crate::model::Model;
use crate::naming;
use crate::repository::{derived_query_fields, relation_key_method, usable_references};
use crate::source::JavaSource;
use crate::{Artifact, ArtifactKind};

pub(crate) fn repository_field(type_name: &str) -> String {
    format!("{}Repository", naming::uncapitalize(type_name))
}

pub fn render(model: &Model<'_>, metadata: &Metadata, class_id: &str, diags: &mut Diagnostics) -> Option<Artifact> {
    let plan = metadata.entity(class_id)?;
    let entity = &plan.type_name;
    let dto = naming::dto_type_name(&plan.class_name);
    let service = format!("{entity}Service");
    let repository = repository_field(entity);
    let mapper = format!("{}Mapper", naming::uncapitalize(entity));
    let id_type = &plan.primary_key.property_type;
    let not_found = format!("new EntityNotFoundException(\"{entity} not found with id \" + id)");

    let links = usable_references(model, metadata, class_id, "service", diags);
    let key_setter = metadata
        .key_accessor(class_id)
        .and_then(|a| a.setter.as_deref());
    if key_setter.is_none() {
        diags.consistency(
            class_id,
            &plan.primary_key.property,
            format!("service: key setter of {entity} not predicted; update keeps the mapped id"),
        );
    }

    // injected target repositories, one per distinct target type
    let mut targets: Vec<&str> = Vec::new();
    for link in &links {
        if link.target_type != *entity && !targets.contains(&link.target_type.as_str()) {
            targets.push(&link.target_type);
        }
    }

    let mut src = JavaSource::new(model.config.package("services"));
    src.import(format!("{}.{dto}", model.config.package("dto")));
    src.import(format!("{}.{entity}", model.config.package("entities")));
    src.import(format!("{}.{entity}Mapper", model.config.package("mappers")));
    src.import(format!("{}.{entity}Repository", model.config.package("repositories")));
    src.import("jakarta.persistence.EntityNotFoundException");
    src.import("java.util.List");
    src.import("java.util.Optional");
    src.import("org.springframework.stereotype.Service");
    src.import("org.springframework.transaction.annotation.Transactional");
    src.import_type(id_type);
    for target in &targets {
        src.import(format!("{}.{target}", model.config.package("entities")));
        src.import(format!("{}.{target}Repository", model.config.package("repositories")));
    }

    src.line("@Service");
    src.line("@Transactional");
    src.open(format!("public class {service}"));

    src.blank();
    src.line(format!("private final {entity}Repository {repository};"));
    src.line(format!("private final {entity}Mapper {mapper};"));
    for target in &targets {
        src.line(format!("private final {target}Repository {};", repository_field(target)));
    }

    let mut params = vec![
        format!("{entity}Repository {repository}"),
        format!("{entity}Mapper {mapper}"),
    ];
    params.extend(
        targets
            .iter()
            .map(|t| format!("{t}Repository {}", repository_field(t))),
    );
    src.blank();
    src.open(format!("public {service}({})", params.join(", ")));
    src.line(format!("this.{0} = {0};", repository));
    src.line(format!("this.{0} = {0};", mapper));
    for target in &targets {
        src.line(format!("this.{0} = {0};", repository_field(target)));
    }
    src.close();

    src.blank();
    src.line("@Transactional(readOnly = true)");
    src.open(format!("public List<{dto}> findAll()"));
    src.line(format!("return {mapper}.toDTOList({repository}.findAll());"));
    src.close();

    src.blank();
    src.line("@Transactional(readOnly = true)");
    src.open(format!("public Optional<{dto}> findById({id_type} id)"));
    src.line(format!("return {repository}.findById(id).map({mapper}::toDTO);"));
    src.close();

    src.blank();
    src.open(format!("public {dto} create({dto} dto)"));
    src.line(format!("{entity} entity = {mapper}.toEntity(dto);"));
    if let (Some(setter), Some(_)) = (key_setter, plan.primary_key.generation) {
        src.line(format!("entity.{setter}(null);"));
    }
    src.line("resolveReferences(entity);");
    src.line(format!("return {mapper}.toDTO({repository}.save(entity));"));
    src.close();

    src.blank();
    src.open(format!("public {dto} update({id_type} id, {dto} dto)"));
    src.open(format!("if (!{repository}.existsById(id))"));
    src.line(format!("throw {not_found};"));
    src.close();
    src.line(format!("{entity} entity = {mapper}.toEntity(dto);"));
    if let Some(setter) = key_setter {
        src.line(format!("entity.{setter}(id);"));
    }
    src.line("resolveReferences(entity);");
    src.line(format!("return {mapper}.toDTO({repository}.save(entity));"));
    src.close();

    src.blank();
    src.open(format!("public {dto} partialUpdate({id_type} id, {dto} dto)"));
    src.line(format!("{entity} entity = {repository}.findById(id)"));
    src.line(format!("        .orElseThrow(() -> {not_found});"));
    src.line(format!("{mapper}.updateEntityFromDTO(dto, entity);"));
    src.line("resolveReferences(entity);");
    src.line(format!("return {mapper}.toDTO({repository}.save(entity));"));
    src.close();

    src.blank();
    src.open(format!("public void delete({id_type} id)"));
    src.open(format!("if (!{repository}.existsById(id))"));
    src.line(format!("throw {not_found};"));
    src.close();
    src.line(format!("{repository}.deleteById(id);"));
    src.close();

    src.blank();
    src.line("@Transactional(readOnly = true)");
    src.open(format!("public boolean existsById({id_type} id)"));
    src.line(format!("return {repository}.existsById(id);"));
    src.close();

    src.blank();
    src.line("@Transactional(readOnly = true)");
    src.open("public long count()");
    src.line(format!("return {repository}.count();"));
    src.close();

    for field in derived_query_fields(model, metadata, class_id) {
        let suffix = naming::capitalize(&field.name);
        let (ty, name) = (&field.java_type, &field.name);
        src.import_type(ty);

        src.blank();
        src.line("@Transactional(readOnly = true)");
        src.open(format!("public List<{dto}> findBy{suffix}({ty} {name})"));
        src.line(format!("return {mapper}.toDTOList({repository}.findBy{suffix}({name}));"));
        src.close();

        src.blank();
        src.line("@Transactional(readOnly = true)");
        src.open(format!("public boolean existsBy{suffix}({ty} {name})"));
        src.line(format!("return {repository}.existsBy{suffix}({name});"));
        src.close();

        src.blank();
        src.line("@Transactional(readOnly = true)");
        src.open(format!("public long countBy{suffix}({ty} {name})"));
        src.line(format!("return {repository}.countBy{suffix}({name});"));
        src.close();
    }

    for link in &links {
        render_relation_queries(&mut src, link, entity, &dto, &repository, &mapper, id_type);
    }

    src.blank();
    src.open(format!("private void resolveReferences({entity} entity)"));
    for link in &links {
        render_resolution(&mut src, link, entity);
    }
    src.close();

    src.close();
    Some(Artifact::new(ArtifactKind::Service, &service, src.finish()))
}

fn target_repository(link: &ReferenceLink<'_>, own_type: &str) -> String {
    if link.target_type == own_type {
        repository_field(own_type)
    } else {
        repository_field(&link.target_type)
    }
}

fn render_relation_queries(
    src: &mut JavaSource,
    link: &ReferenceLink<'_>,
    entity: &str,
    dto: &str,
    repository: &str,
    mapper: &str,
    id_type: &str,
) {
    let (Some(relation), Some(key)) = (link.relation_accessor, link.target_key) else {
        return;
    };
    let rel = naming::capitalize(link.relation);
    let key_type = &link.target_key_type;
    let param = &link.dto_field.name;
    let find_by_key = relation_key_method("findBy", link);
    src.import_type(key_type);

    src.blank();
    src.line("@Transactional(readOnly = true)");
    src.open(format!("public List<{dto}> {find_by_key}({key_type} {param})"));
    src.line(format!("return {mapper}.toDTOList({repository}.{find_by_key}({param}));"));
    src.close();

    src.blank();
    src.line("@Transactional(readOnly = true)");
    src.open(format!("public long countBy{rel}({key_type} {param})"));
    src.line(format!(
        "return {}.findById({param}).map({repository}::countBy{rel}).orElse(0L);",
        target_repository(link, entity)
    ));
    src.close();

    src.blank();
    src.line("@Transactional(readOnly = true)");
    src.open(format!(
        "public Optional<{key_type}> {}({id_type} id)",
        naming::getter_name(param)
    ));
    src.line(format!(
        "return {repository}.findById(id).map({entity}::{}).map({}::{});",
        relation.getter, link.target_type, key.getter
    ));
    src.close();
}

/// `Author author = entity.getAuthor(); if (author != null && author.getId() != null) ...`
fn render_resolution(src: &mut JavaSource, link: &ReferenceLink<'_>, entity: &str) {
    let (Some(relation), Some(key)) = (link.relation_accessor, link.target_key) else {
        return;
    };
    let Some(setter) = relation.setter.as_deref() else {
        return;
    };
    let target = &link.target_type;
    let local = format!("{}Ref", link.relation);
    let key_local = &link.dto_field.name;
    src.line(format!("{target} {local} = entity.{}();", relation.getter));
    src.open(format!("if ({local} != null && {local}.{}() != null)", key.getter));
    src.line(format!("{} {key_local} = {local}.{}();", link.target_key_type, key.getter));
    src.line(format!(
        "entity.{setter}({}.findById({key_local})",
        target_repository(link, entity)
    ));
    src.line(format!(
        "        .orElseThrow(() -> new EntityNotFoundException(\"Related {target} not found with id \" + {key_local})));"
    ));
    src.close();
}
