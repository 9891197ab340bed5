//! Association tables → composite-key join entities.
//!
//! Each FK column of the table becomes one sub-field of an `@Embeddable`
//! key and one `@MapsId` relation on the entity. The relation setter is the
//! only writer of its key sub-field, so the two cannot drift apart.

use crate::diagnostics::Diagnostics;
use crate::entity::{self, EntityField};
use crate::java_types::{is_scalar, map_type};
use crate::metadata::Metadata;
use crate::model::Model;
use crate::naming;
use crate::source::JavaSource;
use crate::{Artifact, ArtifactKind};
use classforge_diagram::{AssociationTable, Attribute, ClassId, ClassNode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinKey {
    /// Sub-field on the embeddable key: `studentId`.
    pub key_field: String,
    pub column: String,
    pub java_type: String,
    /// Relation field on the join entity: `student`.
    pub relation: String,
    pub target: Option<ClassId>,
    pub target_type: Option<String>,
}

#[derive(Debug, Clone)]
pub struct JoinPlan {
    pub table_id: ClassId,
    pub type_name: String,
    pub key_type_name: String,
    pub table: String,
    pub keys: Vec<JoinKey>,
    pub columns: Vec<EntityField>,
}

impl JoinPlan {
    pub fn relations(&self) -> impl Iterator<Item = (&JoinKey, &str)> {
        self.keys
            .iter()
            .filter_map(|k| k.target.as_deref().map(|t| (k, t)))
    }
}

pub fn plan(model: &Model<'_>, table: &AssociationTable, diags: &mut Diagnostics) -> JoinPlan {
    let mut keys: Vec<JoinKey> = Vec::new();
    for attr in table.key_columns() {
        let relation = naming::relation_base_name(&attr.name);
        let target = attr.foreign_target().and_then(|name| model.class_by_name(name));
        if target.is_none() {
            diags.classification(
                Some(table.id()),
                Some(attr.name.as_str()),
                format!(
                    "join column references unknown class `{}`; kept as a bare key column",
                    attr.foreign_target().unwrap_or_default()
                ),
            );
        }
        let key = JoinKey {
            key_field: format!("{relation}Id"),
            column: naming::join_column_name(&relation),
            java_type: key_type(model, table, attr, target, diags),
            target_type: target.map(|t| naming::type_name(&t.name)),
            target: target.map(|t| t.id.clone()),
            relation,
        };
        if keys.iter().any(|k| k.key_field == key.key_field) {
            diags.classification(
                Some(table.id()),
                Some(attr.name.as_str()),
                format!("duplicate join key `{}`; skipped", key.key_field),
            );
            continue;
        }
        keys.push(key);
    }

    if keys.len() < 2 {
        diags.classification(
            Some(table.id()),
            None,
            format!(
                "association table `{}` has {} foreign key column(s); expected at least two",
                table.name(),
                keys.len()
            ),
        );
    }

    let mut columns: Vec<EntityField> = Vec::new();
    for attr in table.columns() {
        if attr.is_primary_key {
            diags.note(
                table.id(),
                Some(attr.name.as_str()),
                "primary key on an association table is replaced by the composite key",
            );
            continue;
        }
        if attr.is_static || attr.is_relationship_attribute {
            continue;
        }
        let field = entity::column_field(attr);
        let clashes = columns.iter().any(|c| c.name == field.name)
            || keys.iter().any(|k| k.relation == field.name || k.key_field == field.name)
            || field.name == "id";
        if clashes {
            diags.classification(
                Some(table.id()),
                Some(attr.name.as_str()),
                "join entity column clashes with a key field; skipped",
            );
            continue;
        }
        columns.push(field);
    }

    JoinPlan {
        table_id: table.id().to_string(),
        type_name: naming::type_name(table.name()),
        key_type_name: format!("{}Id", naming::type_name(table.name())),
        table: naming::table_name(table.name()),
        keys,
        columns,
    }
}

/// The referenced class's `@Id` type when the class is known, else the
/// declared referenced type, else the declared scalar, else the configured
/// default. A declared type that disagrees with the target key is reported.
fn key_type(
    model: &Model<'_>,
    table: &AssociationTable,
    attr: &Attribute,
    target: Option<&ClassNode>,
    diags: &mut Diagnostics,
) -> String {
    let declared = attr
        .referenced_type
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .map(map_type)
        .or_else(|| Some(map_type(&attr.ty)).filter(|t| is_scalar(t)));

    let Some(class) = target else {
        return declared.unwrap_or_else(|| map_type(&model.config.default_id_type));
    };
    let target_key = model.primary_key(&class.id).property_type;
    if let Some(declared) = declared.filter(|d| *d != target_key) {
        diags.classification(
            Some(table.id()),
            Some(attr.name.as_str()),
            format!(
                "join column type `{declared}` differs from `{}` key type `{target_key}`; key type used",
                naming::type_name(&class.name)
            ),
        );
    }
    target_key
}

pub fn render(model: &Model<'_>, metadata: &Metadata, plan: &JoinPlan, diags: &mut Diagnostics) -> Vec<Artifact> {
    vec![
        render_entity(model, metadata, plan, diags),
        render_key(model, plan),
    ]
}

fn render_entity(model: &Model<'_>, metadata: &Metadata, plan: &JoinPlan, diags: &mut Diagnostics) -> Artifact {
    let mut src = JavaSource::new(model.config.package("entities"));
    src.import("jakarta.persistence.*");
    src.import("java.util.Objects");

    src.line("@Entity");
    src.line(format!("@Table(name = \"{}\")", plan.table));
    src.open(format!("public class {}", plan.type_name));

    src.blank();
    src.line("@EmbeddedId");
    src.line(format!("private {0} id = new {0}();", plan.key_type_name));

    for (key, _) in plan.relations() {
        let target_type = key.target_type.as_deref().unwrap_or("Object");
        src.blank();
        src.line("@ManyToOne(fetch = FetchType.LAZY)");
        src.line(format!("@MapsId(\"{}\")", key.key_field));
        src.line(format!("@JoinColumn(name = \"{}\")", key.column));
        src.line(format!("private {target_type} {};", key.relation));
    }

    for column in &plan.columns {
        src.import_type(&column.java_type);
        src.blank();
        entity::render_field(&mut src, column);
    }

    src.blank();
    src.open(format!("protected {}()", plan.type_name));
    src.close();

    let params: Vec<String> = plan
        .relations()
        .map(|(k, _)| format!("{} {}", k.target_type.as_deref().unwrap_or("Object"), k.relation))
        .collect();
    if !params.is_empty() {
        src.blank();
        src.open(format!("public {}({})", plan.type_name, params.join(", ")));
        for (key, _) in plan.relations() {
            src.line(format!("{}({});", naming::setter_name(&key.relation), key.relation));
        }
        src.close();
    }

    src.blank();
    src.open(format!("public {} getId()", plan.key_type_name));
    src.line("return id;");
    src.close();

    for key in &plan.keys {
        match key.target.as_deref() {
            Some(target) => render_relation_accessors(&mut src, metadata, plan, key, target, diags),
            None => {
                // no relation to derive it from, so the sub-field is written directly
                src.blank();
                src.open(format!("public {} {}()", key.java_type, naming::getter_name(&key.key_field)));
                src.line(format!("return id.{}();", naming::getter_name(&key.key_field)));
                src.close();
                src.blank();
                src.open(format!(
                    "public void {}({} {})",
                    naming::setter_name(&key.key_field),
                    key.java_type,
                    key.key_field
                ));
                src.line(format!("id.{}({});", naming::setter_name(&key.key_field), key.key_field));
                src.close();
            }
        }
    }

    for column in &plan.columns {
        src.blank();
        src.open(format!("public {} {}()", column.java_type, naming::getter_name(&column.name)));
        src.line(format!("return {};", column.name));
        src.close();
        src.blank();
        src.open(format!(
            "public void {}({} {})",
            naming::setter_name(&column.name),
            column.java_type,
            column.name
        ));
        src.line(format!("this.{0} = {0};", column.name));
        src.close();
    }

    src.blank();
    src.line("@Override");
    src.open("public boolean equals(Object o)");
    src.open("if (this == o)");
    src.line("return true;");
    src.close();
    src.open("if (o == null || getClass() != o.getClass())");
    src.line("return false;");
    src.close();
    src.line(format!("{0} other = ({0}) o;", plan.type_name));
    src.line("return Objects.equals(id, other.id);");
    src.close();

    src.blank();
    src.line("@Override");
    src.open("public int hashCode()");
    src.line("return Objects.hash(id);");
    src.close();

    src.close();
    Artifact::new(ArtifactKind::Entity, &plan.type_name, src.finish())
}

fn render_relation_accessors(
    src: &mut JavaSource,
    metadata: &Metadata,
    plan: &JoinPlan,
    key: &JoinKey,
    target: &str,
    diags: &mut Diagnostics,
) {
    let target_type = key.target_type.as_deref().unwrap_or("Object");
    let relation = &key.relation;

    src.blank();
    src.open(format!("public {target_type} {}()", naming::getter_name(relation)));
    src.line(format!("return {relation};"));
    src.close();

    src.blank();
    src.open(format!(
        "public void {}({target_type} {relation})",
        naming::setter_name(relation)
    ));
    src.line(format!("this.{relation} = {relation};"));
    match metadata.key_accessor(target) {
        Some(accessor) => src.line(format!(
            "this.id.{}({relation} != null ? {relation}.{}() : null);",
            naming::setter_name(&key.key_field),
            accessor.getter
        )),
        None => diags.consistency(
            &plan.table_id,
            relation,
            format!("{target_type} key accessor not predicted; `{}` is left to @MapsId", key.key_field),
        ),
    }
    src.close();
}

fn render_key(model: &Model<'_>, plan: &JoinPlan) -> Artifact {
    let mut src = JavaSource::new(model.config.package("entities"));
    src.import("jakarta.persistence.Column");
    src.import("jakarta.persistence.Embeddable");
    src.import("java.io.Serializable");
    src.import("java.util.Objects");

    src.line("@Embeddable");
    src.open(format!("public class {} implements Serializable", plan.key_type_name));
    src.blank();
    src.line("private static final long serialVersionUID = 1L;");

    for key in &plan.keys {
        src.import_type(&key.java_type);
        src.blank();
        src.line(format!("@Column(name = \"{}\")", key.column));
        src.line(format!("private {} {};", key.java_type, key.key_field));
    }

    src.blank();
    src.open(format!("public {}()", plan.key_type_name));
    src.close();

    if !plan.keys.is_empty() {
        let params: Vec<String> = plan
            .keys
            .iter()
            .map(|k| format!("{} {}", k.java_type, k.key_field))
            .collect();
        src.blank();
        src.open(format!("public {}({})", plan.key_type_name, params.join(", ")));
        for key in &plan.keys {
            src.line(format!("this.{0} = {0};", key.key_field));
        }
        src.close();
    }

    for key in &plan.keys {
        src.blank();
        src.open(format!("public {} {}()", key.java_type, naming::getter_name(&key.key_field)));
        src.line(format!("return {};", key.key_field));
        src.close();
        // package-private: only the join entity writes key components
        src.blank();
        src.open(format!(
            "void {}({} {})",
            naming::setter_name(&key.key_field),
            key.java_type,
            key.key_field
        ));
        src.line(format!("this.{0} = {0};", key.key_field));
        src.close();
    }

    let fields: Vec<&str> = plan.keys.iter().map(|k| k.key_field.as_str()).collect();
    src.blank();
    src.line("@Override");
    src.open("public boolean equals(Object o)");
    src.open("if (this == o)");
    src.line("return true;");
    src.close();
    src.open("if (o == null || getClass() != o.getClass())");
    src.line("return false;");
    src.close();
    if fields.is_empty() {
        src.line("return true;");
    } else {
        src.line(format!("{0} other = ({0}) o;", plan.key_type_name));
        let comparisons: Vec<String> = fields
            .iter()
            .map(|f| format!("Objects.equals({f}, other.{f})"))
            .collect();
        src.line(format!("return {};", comparisons.join("\n                && ")));
    }
    src.close();

    src.blank();
    src.line("@Override");
    src.open("public int hashCode()");
    src.line(format!("return Objects.hash({});", fields.join(", ")));
    src.close();

    src.close();
    Artifact::new(ArtifactKind::Entity, &plan.key_type_name, src.finish())
}
