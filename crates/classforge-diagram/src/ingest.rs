//! Diagram ingestion (JSON → IR).
//!
//! Accepted document shape:
//!
//! ```json
//! { "elements": { "<id>": { ... } } | [ { ... } ],
//!   "connections": { "<id>": { ... } } | [ { ... } ] }
//! }
//! ```
//!
//! Normalization rules:
//! - attributes arrive as `"name: type"` shorthand or as structured objects and
//!   both become `ir::Attribute`,
//! - elements stereotyped `association_table` are moved out of `classes` into
//!   `association_tables`,
//! - connections without an `id` get a deterministic one (see `digest`).
//!
//! Failure to parse the document, or a class element without `id`/`name`, is
//! fatal: the caller gets a `ParseError` and no partial IR.

use crate::digest::ordered_id;
use crate::ir::{
    AssociationTable, Attribute, ClassNode, Diagram, Multiplicity, Relationship,
    RelationshipKind, Stereotype, Visibility,
};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid diagram JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("diagram document must be a JSON object")]
    NotAnObject,

    #[error("`{section}` must be an object map or an array")]
    Section { section: &'static str },

    #[error("element #{index} is malformed: {message}")]
    Element { index: usize, message: String },

    #[error("class element #{index} is missing `{field}`")]
    MissingField { index: usize, field: &'static str },

    #[error("class `{class}` attribute #{index} is invalid: {message}")]
    InvalidAttribute {
        class: String,
        index: usize,
        message: String,
    },

    #[error("connection #{index} is malformed: {message}")]
    Connection { index: usize, message: String },
}

// ============================================================================
// Raw (surface) forms
// ============================================================================

/// Accept strings, numbers and booleans wherever the document uses an id or a
/// multiplicity; editors are not consistent about quoting them.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        Some(other) => Some(other.to_string()),
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawElement {
    #[serde(default, deserialize_with = "lenient_string")]
    id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    name: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    stereotype: Option<String>,
    #[serde(default)]
    visibility: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    attributes: Vec<RawAttribute>,
    #[serde(default)]
    methods: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawAttribute {
    Shorthand(String),
    Structured(RawStructuredAttribute),
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawStructuredAttribute {
    name: Option<String>,
    #[serde(rename = "type")]
    ty: Option<String>,
    sql_type: Option<String>,
    visibility: Option<String>,
    is_static: bool,
    is_primary_key: bool,
    is_foreign_key: bool,
    referenced_entity: Option<String>,
    referenced_field: Option<String>,
    referenced_type: Option<String>,
    is_relationship_attribute: bool,
    #[serde(deserialize_with = "lenient_string")]
    default_value: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConnection {
    #[serde(default, deserialize_with = "lenient_string")]
    id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    source: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    target: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    source_multiplicity: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    target_multiplicity: Option<String>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    association_table: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    many_to_many_group: Option<String>,
}

// ============================================================================
// Public API
// ============================================================================

/// Parse a diagram document from JSON text.
pub fn parse_diagram(text: &str) -> Result<Diagram, ParseError> {
    let value: Value = serde_json::from_str(text)?;
    parse_diagram_value(&value)
}

/// Parse a diagram document that has already been decoded into a JSON value.
pub fn parse_diagram_value(value: &Value) -> Result<Diagram, ParseError> {
    let document = value.as_object().ok_or(ParseError::NotAnObject)?;

    let elements = section_items(document.get("elements"), "elements")?;
    let connections = section_items(document.get("connections"), "connections")?;

    let mut diagram = Diagram::default();

    for (index, element) in elements.into_iter().enumerate() {
        let Some(class) = ingest_element(index, element)? else {
            continue;
        };
        if class.is_association_table() {
            diagram.association_tables.push(AssociationTable { class });
        } else {
            diagram.classes.push(class);
        }
    }

    for (index, connection) in connections.into_iter().enumerate() {
        diagram
            .relationships
            .push(ingest_connection(index, connection)?);
    }

    tracing::debug!(
        classes = diagram.classes.len(),
        relationships = diagram.relationships.len(),
        association_tables = diagram.association_tables.len(),
        "ingested diagram"
    );

    Ok(diagram)
}

/// Parse UML attribute shorthand: `[+|-|#|~] name [: type] [= default]`.
///
/// A missing type defaults to `String`.
pub fn parse_attribute_shorthand(text: &str) -> Result<Attribute, String> {
    let mut rest = text.trim();
    let mut visibility = Visibility::Private;
    if let Some(marker) = rest.chars().next() {
        if let Some(v) = Visibility::from_marker(marker) {
            visibility = v;
            rest = rest[marker.len_utf8()..].trim_start();
        }
    }

    let (declaration, default_value) = match rest.split_once('=') {
        Some((decl, default)) => (decl.trim(), Some(default.trim().to_string())),
        None => (rest, None),
    };

    let (name, ty) = match declaration.split_once(':') {
        Some((name, ty)) => (name.trim(), ty.trim()),
        None => (declaration.trim(), ""),
    };

    if name.is_empty() {
        return Err(format!("shorthand `{text}` has no attribute name"));
    }

    let mut attribute = Attribute::new(name, if ty.is_empty() { "String" } else { ty });
    attribute.visibility = visibility;
    attribute.default_value = default_value.filter(|d| !d.is_empty());
    Ok(attribute)
}

// ============================================================================
// Internals
// ============================================================================

/// Flatten an object-map or array section into an ordered list of values.
///
/// Missing or `null` sections are empty. Object maps iterate in key order.
fn section_items<'a>(
    section: Option<&'a Value>,
    name: &'static str,
) -> Result<Vec<&'a Value>, ParseError> {
    match section {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items.iter().collect()),
        Some(Value::Object(map)) => Ok(map.values().collect()),
        Some(_) => Err(ParseError::Section { section: name }),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn ingest_element(index: usize, value: &Value) -> Result<Option<ClassNode>, ParseError> {
    if !value.is_object() {
        return Err(ParseError::Element {
            index,
            message: "expected an object".to_string(),
        });
    }

    let raw = RawElement::deserialize(value).map_err(|e| ParseError::Element {
        index,
        message: e.to_string(),
    })?;

    if let Some(kind) = raw.kind.as_deref() {
        if !kind.trim().eq_ignore_ascii_case("class") {
            tracing::debug!(index, kind, "skipping non-class element");
            return Ok(None);
        }
    }

    let id = non_empty(raw.id).ok_or(ParseError::MissingField { index, field: "id" })?;
    let name = non_empty(raw.name).ok_or(ParseError::MissingField {
        index,
        field: "name",
    })?;

    let mut attributes = Vec::with_capacity(raw.attributes.len());
    for (attr_index, attribute) in raw.attributes.into_iter().enumerate() {
        let attribute =
            normalize_attribute(attribute).map_err(|message| ParseError::InvalidAttribute {
                class: name.clone(),
                index: attr_index,
                message,
            })?;
        attributes.push(attribute);
    }

    let methods = raw
        .methods
        .into_iter()
        .map(|m| match m {
            Value::String(s) => s,
            other => other.to_string(),
        })
        .collect();

    Ok(Some(ClassNode {
        id,
        name,
        attributes,
        methods,
        stereotype: raw.stereotype.as_deref().and_then(Stereotype::parse),
        visibility: raw
            .visibility
            .as_deref()
            .and_then(Visibility::parse)
            .unwrap_or_default(),
        description: non_empty(raw.description),
    }))
}

fn normalize_attribute(raw: RawAttribute) -> Result<Attribute, String> {
    match raw {
        RawAttribute::Shorthand(text) => parse_attribute_shorthand(&text),
        RawAttribute::Structured(s) => {
            let name = non_empty(s.name).ok_or_else(|| "attribute has no name".to_string())?;
            let ty = non_empty(s.ty).unwrap_or_else(|| "String".to_string());
            Ok(Attribute {
                name,
                ty,
                sql_type: non_empty(s.sql_type),
                visibility: s
                    .visibility
                    .as_deref()
                    .and_then(Visibility::parse)
                    .unwrap_or(Visibility::Private),
                is_static: s.is_static,
                is_primary_key: s.is_primary_key,
                is_foreign_key: s.is_foreign_key,
                referenced_entity: non_empty(s.referenced_entity),
                referenced_field: non_empty(s.referenced_field),
                referenced_type: non_empty(s.referenced_type),
                is_relationship_attribute: s.is_relationship_attribute,
                default_value: non_empty(s.default_value),
            })
        }
    }
}

fn ingest_connection(index: usize, value: &Value) -> Result<Relationship, ParseError> {
    let raw = RawConnection::deserialize(value).map_err(|e| ParseError::Connection {
        index,
        message: e.to_string(),
    })?;

    let source = non_empty(raw.source).unwrap_or_default();
    let target = non_empty(raw.target).unwrap_or_default();
    let kind = RelationshipKind::parse(raw.kind.as_deref().unwrap_or_default());
    let position = index.to_string();
    let id = non_empty(raw.id)
        .unwrap_or_else(|| ordered_id(
            "rel",
            &[source.as_str(), target.as_str(), kind.as_str(), position.as_str()],
        ));

    Ok(Relationship {
        id,
        source,
        target,
        kind,
        source_multiplicity: Multiplicity::new(
            raw.source_multiplicity.unwrap_or_default().trim(),
        ),
        target_multiplicity: Multiplicity::new(
            raw.target_multiplicity.unwrap_or_default().trim(),
        ),
        label: non_empty(raw.label),
        association_table: non_empty(raw.association_table),
        many_to_many_group: non_empty(raw.many_to_many_group),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn shorthand_with_visibility_and_default() {
        let attr = parse_attribute_shorthand("+ count: int = 0").unwrap();
        assert_eq!(attr.name, "count");
        assert_eq!(attr.ty, "int");
        assert_eq!(attr.visibility, Visibility::Public);
        assert_eq!(attr.default_value.as_deref(), Some("0"));
    }

    #[test]
    fn shorthand_without_type_defaults_to_string() {
        let attr = parse_attribute_shorthand("nickname").unwrap();
        assert_eq!(attr.ty, "String");
        assert_eq!(attr.visibility, Visibility::Private);
    }

    #[test]
    fn shorthand_without_name_is_rejected() {
        assert!(parse_attribute_shorthand(": String").is_err());
        assert!(parse_attribute_shorthand("  ").is_err());
    }

    #[test]
    fn elements_as_map_and_array_are_equivalent() {
        let as_array = json!({
            "elements": [{ "id": "a", "name": "A", "type": "class", "attributes": ["x: int"] }],
            "connections": []
        });
        let as_map = json!({
            "elements": { "a": { "id": "a", "name": "A", "type": "class", "attributes": ["x: int"] } },
            "connections": {}
        });
        assert_eq!(
            parse_diagram_value(&as_array).unwrap(),
            parse_diagram_value(&as_map).unwrap()
        );
    }

    #[test]
    fn association_table_is_split_out() {
        let doc = json!({
            "elements": [
                { "id": "s", "name": "Student", "type": "class" },
                { "id": "e", "name": "Enrollment", "type": "class", "stereotype": "association_table" }
            ],
            "connections": []
        });
        let diagram = parse_diagram_value(&doc).unwrap();
        assert_eq!(diagram.classes.len(), 1);
        assert_eq!(diagram.association_tables.len(), 1);
        assert_eq!(diagram.association_tables[0].name(), "Enrollment");
    }

    #[test]
    fn missing_name_is_fatal() {
        let doc = json!({ "elements": [{ "id": "a", "type": "class" }], "connections": [] });
        let err = parse_diagram_value(&doc).unwrap_err();
        assert!(matches!(err, ParseError::MissingField { field: "name", .. }));
    }

    #[test]
    fn missing_id_is_fatal() {
        let doc = json!({ "elements": [{ "name": "A" }], "connections": [] });
        let err = parse_diagram_value(&doc).unwrap_err();
        assert!(matches!(err, ParseError::MissingField { field: "id", .. }));
    }

    #[test]
    fn non_class_elements_are_skipped() {
        let doc = json!({
            "elements": [{ "type": "note", "text": "hello" }],
            "connections": []
        });
        let diagram = parse_diagram_value(&doc).unwrap();
        assert!(diagram.classes.is_empty());
    }

    #[test]
    fn malformed_json_is_fatal() {
        assert!(matches!(parse_diagram("{ nope"), Err(ParseError::Json(_))));
        assert!(matches!(parse_diagram("[]"), Err(ParseError::NotAnObject)));
    }

    #[test]
    fn connection_ids_are_deterministic_when_missing() {
        let doc = json!({
            "elements": [],
            "connections": [{ "source": "a", "target": "b", "type": "association",
                              "sourceMultiplicity": 1, "targetMultiplicity": "*" }]
        });
        let first = parse_diagram_value(&doc).unwrap();
        let second = parse_diagram_value(&doc).unwrap();
        assert_eq!(first.relationships[0].id, second.relationships[0].id);
        assert!(first.relationships[0].id.starts_with("rel_"));
        assert!(first.relationships[0].source_multiplicity.is_exactly_one());
    }
}
