use classforge_diagram::digest::ordered_id;
use classforge_diagram::ingest::parse_attribute_shorthand;
use classforge_diagram::{parse_diagram_value, ParseError, Visibility};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

fn ident() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[A-Za-z][A-Za-z0-9_]{0,10}").unwrap()
}

fn marker() -> impl Strategy<Value = (&'static str, Visibility)> {
    prop::sample::select(vec![
        ("", Visibility::Private),
        ("+", Visibility::Public),
        ("-", Visibility::Private),
        ("#", Visibility::Protected),
        ("~", Visibility::Package),
    ])
}

proptest! {
    #[test]
    fn shorthand_recovers_name_type_and_visibility(
        (prefix, visibility) in marker(),
        name in ident(),
        ty in ident(),
    ) {
        let attr = parse_attribute_shorthand(&format!("{prefix}{name} : {ty}")).unwrap();
        prop_assert_eq!(attr.name, name);
        prop_assert_eq!(attr.ty, ty);
        prop_assert_eq!(attr.visibility, visibility);
        prop_assert!(!attr.is_primary_key && !attr.is_foreign_key);
    }

    #[test]
    fn map_and_array_sections_parse_identically(names in proptest::collection::btree_set(ident(), 1..6)) {
        let elements: Vec<Value> = names
            .iter()
            .map(|n| json!({ "id": n, "name": n, "type": "class", "attributes": [format!("{n}Field: int")] }))
            .collect();
        let as_map: Map<String, Value> = names
            .iter()
            .zip(&elements)
            .map(|(n, e)| (n.clone(), e.clone()))
            .collect();

        let from_array = parse_diagram_value(&json!({ "elements": elements })).unwrap();
        let from_map = parse_diagram_value(&json!({ "elements": as_map })).unwrap();
        prop_assert_eq!(from_array, from_map);
    }

    #[test]
    fn missing_connection_ids_are_stable(source in ident(), target in ident()) {
        let document = json!({
            "elements": [],
            "connections": [{ "source": source, "target": target, "type": "association" }]
        });
        let first = parse_diagram_value(&document).unwrap();
        let second = parse_diagram_value(&document).unwrap();
        prop_assert_eq!(&first.relationships[0].id, &second.relationships[0].id);
        prop_assert_eq!(
            &first.relationships[0].id,
            &ordered_id("rel", &[source.as_str(), target.as_str(), "association", "0"])
        );
    }
}

#[test]
fn element_without_name_is_fatal() {
    let err = parse_diagram_value(&json!({ "elements": [{ "id": "a", "type": "class" }] })).unwrap_err();
    assert!(matches!(err, ParseError::MissingField { index: 0, field: "name" }));
}

#[test]
fn association_table_elements_are_split_out() {
    let diagram = parse_diagram_value(&json!({
        "elements": [
            { "id": "s", "name": "Student", "type": "class" },
            { "id": "e", "name": "Enrollment", "type": "class", "stereotype": "<<association_table>>",
              "attributes": [
                  { "name": "studentId", "type": "Long", "isForeignKey": true, "referencedEntity": "Student" }
              ] }
        ]
    }))
    .unwrap();

    assert_eq!(diagram.classes.len(), 1);
    assert_eq!(diagram.association_tables.len(), 1);
    assert!(diagram.is_association_table("e"));
    assert_eq!(diagram.association_tables[0].key_columns().count(), 1);
}
