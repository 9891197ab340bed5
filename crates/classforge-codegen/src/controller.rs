//! REST controllers over the generated services.

use crate::diagnostics::Diagnostics;
use crate::metadata::Metadata;
use crate::model::Model;
use crate::naming;
use crate::repository::{relation_key_method, usable_references};
use crate::source::JavaSource;
use crate::{Artifact, ArtifactKind};

pub fn render(model: &Model<'_>, metadata: &Metadata, class_id: &str, diags: &mut Diagnostics) -> Option<Artifact> {
    let plan = metadata.entity(class_id)?;
    let entity = &plan.type_name;
    let dto = naming::dto_type_name(&plan.class_name);
    let controller = format!("{entity}Controller");
    let service = format!("{}Service", naming::uncapitalize(entity));
    let id_type = &plan.primary_key.property_type;
    let base = model.config.api_path(&naming::resource_path(&plan.class_name));

    let mut src = JavaSource::new(model.config.package("controllers"));
    src.import(format!("{}.{dto}", model.config.package("dto")));
    src.import(format!("{}.{entity}Service", model.config.package("services")));
    src.import("jakarta.persistence.EntityNotFoundException");
    src.import("java.util.List");
    src.import("org.springframework.http.HttpStatus");
    src.import("org.springframework.http.ResponseEntity");
    src.import("org.springframework.web.bind.annotation.*");
    src.import_type(id_type);

    src.line("@RestController");
    src.line(format!("@RequestMapping(\"{base}\")"));
    src.open(format!("public class {controller}"));

    src.blank();
    src.line(format!("private final {entity}Service {service};"));
    src.blank();
    src.open(format!("public {controller}({entity}Service {service})"));
    src.line(format!("this.{0} = {0};", service));
    src.close();

    src.blank();
    src.line("@GetMapping");
    src.open(format!("public List<{dto}> findAll()"));
    src.line(format!("return {service}.findAll();"));
    src.close();

    src.blank();
    src.line("@GetMapping(\"/{id}\")");
    src.open(format!("public ResponseEntity<{dto}> findById(@PathVariable {id_type} id)"));
    src.line(format!("return {service}.findById(id)"));
    src.line("        .map(ResponseEntity::ok)");
    src.line("        .orElse(ResponseEntity.notFound().build());");
    src.close();

    src.blank();
    src.line("@PostMapping");
    src.open(format!("public ResponseEntity<{dto}> create(@RequestBody {dto} dto)"));
    src.line(format!("return ResponseEntity.status(HttpStatus.CREATED).body({service}.create(dto));"));
    src.close();

    src.blank();
    src.line("@PutMapping(\"/{id}\")");
    src.open(format!(
        "public {dto} update(@PathVariable {id_type} id, @RequestBody {dto} dto)"
    ));
    src.line(format!("return {service}.update(id, dto);"));
    src.close();

    src.blank();
    src.line("@PatchMapping(\"/{id}\")");
    src.open(format!(
        "public {dto} partialUpdate(@PathVariable {id_type} id, @RequestBody {dto} dto)"
    ));
    src.line(format!("return {service}.partialUpdate(id, dto);"));
    src.close();

    src.blank();
    src.line("@DeleteMapping(\"/{id}\")");
    src.open(format!("public ResponseEntity<Void> delete(@PathVariable {id_type} id)"));
    src.line(format!("{service}.delete(id);"));
    src.line("return ResponseEntity.noContent().build();");
    src.close();

    src.blank();
    src.line("@GetMapping(\"/count\")");
    src.open("public long count()");
    src.line(format!("return {service}.count();"));
    src.close();

    src.blank();
    src.line("@GetMapping(\"/exists/{id}\")");
    src.open(format!("public boolean existsById(@PathVariable {id_type} id)"));
    src.line(format!("return {service}.existsById(id);"));
    src.close();

    for link in usable_references(model, metadata, class_id, "controller", diags) {
        let segment = naming::kebab_case(link.relation);
        let key_type = &link.target_key_type;
        let param = &link.dto_field.name;
        src.import_type(key_type);

        src.blank();
        src.line(format!("@GetMapping(\"/by-{segment}/{{{param}}}\")"));
        src.open(format!(
            "public List<{dto}> {0}(@PathVariable {key_type} {param})",
            relation_key_method("findBy", &link)
        ));
        src.line(format!(
            "return {service}.{}({param});",
            relation_key_method("findBy", &link)
        ));
        src.close();

        let getter = naming::getter_name(param);
        src.blank();
        src.line(format!("@GetMapping(\"/{{id}}/{segment}-id\")"));
        src.open(format!(
            "public ResponseEntity<{key_type}> {getter}(@PathVariable {id_type} id)"
        ));
        src.line(format!("return {service}.{getter}(id)"));
        src.line("        .map(ResponseEntity::ok)");
        src.line("        .orElse(ResponseEntity.notFound().build());");
        src.close();
    }

    src.blank();
    src.line("@ExceptionHandler(EntityNotFoundException.class)");
    src.open("public ResponseEntity<String> handleNotFound(EntityNotFoundException ex)");
    src.line("return ResponseEntity.status(HttpStatus.NOT_FOUND).body(ex.getMessage());");
    src.close();

    src.close();
    Some(Artifact::new(ArtifactKind::Controller, &controller, src.finish()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use classforge_diagram::{Attribute, ClassNode, Diagram, Relationship, RelationshipKind};

    #[test]
    fn exposes_crud_and_navigation_endpoints() {
        let diagram = Diagram {
            classes: vec![
                ClassNode::new("p", "Person").with_attribute(Attribute::new("id", "Long").primary_key()),
                ClassNode::new("o", "PurchaseOrder")
                    .with_attribute(Attribute::new("id", "uuid").primary_key())
                    .with_attribute(Attribute::new("placedBy", "Long").foreign_key("Person")),
            ],
            ..Diagram::default()
        };
        let config = GeneratorConfig::default();
        let mut diags = Diagnostics::new();
        let model = Model::build(&diagram, &config, &mut diags);
        let metadata = Metadata::build(&model, &mut diags);
        let text = render(&model, &metadata, "o", &mut diags).unwrap().content;

        assert!(text.contains("@RequestMapping(\"/api/purchase-orders\")"));
        assert!(text.contains("import java.util.UUID;"));
        assert!(text.contains("public ResponseEntity<PurchaseOrderDTO> findById(@PathVariable UUID id)"));
        assert!(text.contains("@GetMapping(\"/by-placed-by/{placedById}\")"));
        assert!(text.contains("public List<PurchaseOrderDTO> findByPlacedById(@PathVariable Long placedById)"));
        assert!(text.contains("@GetMapping(\"/{id}/placed-by-id\")"));
        assert!(text.contains("public ResponseEntity<Long> getPlacedById(@PathVariable UUID id)"));
        assert!(text.contains("@ExceptionHandler(EntityNotFoundException.class)"));
    }

    #[test]
    fn navigation_is_skipped_without_a_relation_accessor() {
        let diagram = Diagram {
            classes: vec![
                ClassNode::new("animal", "Animal").with_attribute(Attribute::new("id", "Long").primary_key()),
                ClassNode::new("dog", "Dog").with_attribute(Attribute::new("mother", "Long").foreign_key("Animal")),
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
        let mut diags = Diagnostics::new();
        let model = Model::build(&diagram, &config, &mut diags);
        let metadata = Metadata::build(&model, &mut diags);
        let text = render(&model, &metadata, "dog", &mut diags).unwrap().content;

        assert!(text.contains("@RequestMapping(\"/api/dogs\")"));
        assert!(!text.contains("by-mother"));
        assert!(diags
            .entries()
            .iter()
            .any(|d| d.message.starts_with("controller:")));
    }
}
