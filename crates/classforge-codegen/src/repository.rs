//! Spring Data repositories.

use crate::diagnostics::Diagnostics;
use crate::dto::{DtoField, DtoFieldKind};
use crate::java_types::is_collection;
use crate::join_entity::JoinPlan;
use crate::metadata::{Metadata, ReferenceLink};
use crate::model::Model;
use crate::naming;
use crate::source::JavaSource;
use crate::{Artifact, ArtifactKind};

/// Scalars that get `findByX` / `existsByX` / `countByX`. Shared with the
/// service generator so both sides agree on the method set.
pub(crate) fn derived_query_fields<'m>(
    model: &Model<'_>,
    metadata: &'m Metadata,
    class_id: &str,
) -> Vec<&'m DtoField> {
    metadata
        .dto_fields(model, class_id)
        .into_iter()
        .filter(|f| f.kind == DtoFieldKind::Scalar)
        .filter(|f| !is_collection(&f.java_type))
        .filter(|f| metadata.entity_accessor(class_id, &f.name).is_some())
        .take(model.config.derived_query_limit)
        .collect()
}

/// Reference links usable for relation queries; unusable ones are reported
/// against `artifact`.
pub(crate) fn usable_references<'m>(
    model: &Model<'_>,
    metadata: &'m Metadata,
    class_id: &str,
    artifact: &str,
    diags: &mut Diagnostics,
) -> Vec<ReferenceLink<'m>> {
    metadata
        .references(model, class_id)
        .into_iter()
        .filter(|link| match link.missing() {
            None => true,
            Some(reason) => {
                diags.consistency(
                    class_id,
                    &link.dto_field.name,
                    format!("{artifact}: {reason}; relation methods for `{}` skipped", link.relation),
                );
                false
            }
        })
        .collect()
}

/// `findByAuthorId`: relation name followed by the target's key property.
pub(crate) fn relation_key_method(prefix: &str, link: &ReferenceLink<'_>) -> String {
    let key_property = link
        .target_key
        .map(|k| k.getter.trim_start_matches("get").to_string())
        .unwrap_or_else(|| "Id".to_string());
    format!("{prefix}{}{key_property}", naming::capitalize(link.relation))
}

pub fn render(model: &Model<'_>, metadata: &Metadata, class_id: &str, diags: &mut Diagnostics) -> Option<Artifact> {
    let plan = metadata.entity(class_id)?;
    let entity = &plan.type_name;
    let repository = format!("{entity}Repository");
    let key_type = &plan.primary_key.property_type;

    let mut src = JavaSource::new(model.config.package("repositories"));
    src.import(format!("{}.{entity}", model.config.package("entities")));
    src.import("org.springframework.data.jpa.repository.JpaRepository");
    src.import("org.springframework.stereotype.Repository");
    src.import_type(key_type);

    src.line("@Repository");
    src.open(format!(
        "public interface {repository} extends JpaRepository<{entity}, {key_type}>"
    ));

    for field in derived_query_fields(model, metadata, class_id) {
        let suffix = naming::capitalize(&field.name);
        let param = format!("{} {}", field.java_type, field.name);
        src.import("java.util.List");
        src.import_type(&field.java_type);
        src.blank();
        src.line(format!("List<{entity}> findBy{suffix}({param});"));
        src.blank();
        src.line(format!("boolean existsBy{suffix}({param});"));
        src.blank();
        src.line(format!("long countBy{suffix}({param});"));
    }

    for link in usable_references(model, metadata, class_id, "repository", diags) {
        let relation = naming::capitalize(link.relation);
        let target = &link.target_type;
        src.import("java.util.List");
        src.import(format!("{}.{target}", model.config.package("entities")));
        src.import_type(&link.target_key_type);
        src.blank();
        src.line(format!("List<{entity}> findBy{relation}({target} {});", link.relation));
        src.blank();
        src.line(format!(
            "List<{entity}> {}({} {});",
            relation_key_method("findBy", &link),
            link.target_key_type,
            link.dto_field.name
        ));
        src.blank();
        src.line(format!("long countBy{relation}({target} {});", link.relation));
    }

    src.close();
    Some(Artifact::new(ArtifactKind::Repository, &repository, src.finish()))
}

pub fn render_join(model: &Model<'_>, metadata: &Metadata, plan: &JoinPlan) -> Artifact {
    let entity = &plan.type_name;
    let repository = format!("{entity}Repository");

    let mut src = JavaSource::new(model.config.package("repositories"));
    src.import(format!("{}.{entity}", model.config.package("entities")));
    src.import(format!("{}.{}", model.config.package("entities"), plan.key_type_name));
    src.import("org.springframework.data.jpa.repository.JpaRepository");
    src.import("org.springframework.stereotype.Repository");

    src.line("@Repository");
    src.open(format!(
        "public interface {repository} extends JpaRepository<{entity}, {}>",
        plan.key_type_name
    ));

    for (key, _) in plan.relations() {
        if metadata.entity_accessor(&plan.table_id, &key.relation).is_none() {
            continue;
        }
        let Some(target) = key.target_type.as_deref() else {
            continue;
        };
        src.import("java.util.List");
        src.import(format!("{}.{target}", model.config.package("entities")));
        src.import_type(&key.java_type);
        src.blank();
        src.line(format!(
            "List<{entity}> findBy{}({target} {});",
            naming::capitalize(&key.relation),
            key.relation
        ));
        src.blank();
        src.line(format!(
            "List<{entity}> findById_{}({} {});",
            naming::capitalize(&key.key_field),
            key.java_type,
            key.key_field
        ));
    }

    src.close();
    Artifact::new(ArtifactKind::Repository, &repository, src.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use classforge_diagram::{Attribute, ClassNode, Diagram};

    fn library() -> Diagram {
        Diagram {
            classes: vec![
                ClassNode::new("a", "Author").with_attribute(Attribute::new("id", "Long").primary_key()),
                ClassNode::new("b", "Book")
                    .with_attribute(Attribute::new("isbn", "String").primary_key())
                    .with_attribute(Attribute::new("title", "String"))
                    .with_attribute(Attribute::new("pages", "int"))
                    .with_attribute(Attribute::new("price", "decimal"))
                    .with_attribute(Attribute::new("published", "date"))
                    .with_attribute(Attribute::new("author", "Long").foreign_key("Author")),
            ],
            ..Diagram::default()
        }
    }

    #[test]
    fn derived_queries_are_capped_and_relation_queries_added() {
        let diagram = library();
        let config = GeneratorConfig::default();
        let mut diags = Diagnostics::new();
        let model = Model::build(&diagram, &config, &mut diags);
        let metadata = Metadata::build(&model, &mut diags);
        let text = render(&model, &metadata, "b", &mut diags).unwrap().content;

        assert!(text.contains("extends JpaRepository<Book, String>"));
        assert!(text.contains("List<Book> findByTitle(String title);"));
        assert!(text.contains("long countByPrice(BigDecimal price);"));
        assert!(!text.contains("findByPublished"), "limit of three scalars");
        assert!(text.contains("List<Book> findByAuthor(Author author);"));
        assert!(text.contains("List<Book> findByAuthorId(Long authorId);"));
        assert!(text.contains("long countByAuthor(Author author);"));
        assert!(text.contains("import java.math.BigDecimal;"));
    }

    #[test]
    fn limit_is_configurable() {
        let diagram = library();
        let config = GeneratorConfig {
            derived_query_limit: 1,
            ..GeneratorConfig::default()
        };
        let mut diags = Diagnostics::new();
        let model = Model::build(&diagram, &config, &mut diags);
        let metadata = Metadata::build(&model, &mut diags);
        let fields = derived_query_fields(&model, &metadata, "b");
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, "title");
    }
}
