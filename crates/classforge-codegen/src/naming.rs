//! Naming conventions shared by every generator.
//!
//! The metadata builder predicts accessor names with exactly these functions
//! and the generators emit with exactly these functions. Nothing else in the
//! crate is allowed to build a Java identifier from a diagram name.

use heck::{ToKebabCase, ToLowerCamelCase, ToSnakeCase};

/// Java keywords (and `Object` method names) that cannot be used verbatim as a
/// field name.
const RESERVED_FIELD_NAMES: &[&str] = &[
    "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class", "const",
    "continue", "default", "do", "double", "else", "enum", "extends", "final", "finally",
    "float", "for", "goto", "if", "implements", "import", "instanceof", "int", "interface",
    "long", "native", "new", "package", "private", "protected", "public", "return", "short",
    "static", "strictfp", "super", "switch", "synchronized", "this", "throw", "throws",
    "transient", "try", "void", "volatile", "while", "true", "false", "null",
];

/// Table names that collide with SQL keywords and must be quoted.
const RESERVED_TABLE_NAMES: &[&str] = &[
    "user", "order", "group", "table", "select", "where", "from", "key", "index", "column",
    "check", "default", "references", "grant", "role", "session", "transaction",
];

/// `first_name` / `FirstName` / `first-name` → `firstName`.
pub fn camel_case(name: &str) -> String {
    name.trim().to_lower_camel_case()
}

/// Upper-case the first character, leave the rest untouched.
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Lower-case the first character, leave the rest untouched.
pub fn uncapitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `capitalize(camelCase(name))`.
pub fn pascal_case(name: &str) -> String {
    capitalize(&camel_case(name))
}

pub fn snake_case(name: &str) -> String {
    name.trim().to_snake_case()
}

pub fn kebab_case(name: &str) -> String {
    name.trim().to_kebab_case()
}

/// English pluralization, good enough for entity names.
pub fn pluralize(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }
    let lower = word.to_ascii_lowercase();
    if ["s", "x", "z", "ch", "sh"].iter().any(|s| lower.ends_with(s)) {
        return format!("{word}es");
    }
    if lower.ends_with('y') {
        let before_y = lower.chars().rev().nth(1);
        if before_y.is_some_and(|c| !"aeiou".contains(c)) {
            return format!("{}ies", &word[..word.len() - 1]);
        }
    }
    format!("{word}s")
}

/// Java type name for a diagram class name.
pub fn type_name(class_name: &str) -> String {
    pascal_case(class_name)
}

pub fn dto_type_name(class_name: &str) -> String {
    format!("{}DTO", type_name(class_name))
}

/// Java field name for an attribute name.
pub fn field_name(attribute_name: &str) -> String {
    let camel = camel_case(attribute_name);
    if camel.is_empty() {
        return "value".to_string();
    }
    if RESERVED_FIELD_NAMES.contains(&camel.as_str()) {
        return format!("{camel}Value");
    }
    if camel.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        return format!("f{camel}");
    }
    camel
}

pub fn getter_name(field: &str) -> String {
    format!("get{}", capitalize(field))
}

pub fn setter_name(field: &str) -> String {
    format!("set{}", capitalize(field))
}

/// Relation field name behind an FK attribute: `author`, `authorId` and
/// `author_id` all become `author`.
pub fn relation_base_name(attribute_name: &str) -> String {
    let field = field_name(attribute_name);
    match field.strip_suffix("Id") {
        Some(base) if !base.is_empty() => field_name(base),
        _ => field,
    }
}

/// DTO-side scalar for an FK attribute: `author` → `authorId`.
pub fn foreign_key_id_field(attribute_name: &str) -> String {
    format!("{}Id", relation_base_name(attribute_name))
}

/// Collection field pointing at many instances of `class_name`.
pub fn collection_field_name(class_name: &str) -> String {
    pluralize(&field_name(class_name))
}

/// Single-valued relation field pointing at `class_name`.
pub fn reference_field_name(class_name: &str) -> String {
    field_name(class_name)
}

pub fn column_name(field: &str) -> String {
    snake_case(field)
}

/// FK join column for a relation field: `author` → `author_id`.
pub fn join_column_name(relation_field: &str) -> String {
    format!("{}_id", snake_case(relation_field))
}

/// Table name for a class, quoted for Hibernate when it is an SQL keyword.
pub fn table_name(class_name: &str) -> String {
    let snake = snake_case(class_name);
    if RESERVED_TABLE_NAMES.contains(&snake.as_str()) {
        format!("`{snake}`")
    } else {
        snake
    }
}

/// Join table for a transparent many-to-many pair.
pub fn join_table_name(owner_class: &str, inverse_class: &str) -> String {
    format!("{}_{}", snake_case(owner_class), snake_case(inverse_class))
}

/// REST resource segment: `OrderItem` → `order-items`.
pub fn resource_path(class_name: &str) -> String {
    pluralize(&kebab_case(class_name))
}
