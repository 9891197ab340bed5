//! Declared attribute types → Java types, and the imports they need.

use std::collections::BTreeSet;

/// Map a declared type (as written in the diagram) to a boxed Java type.
///
/// Generic collections recurse into their argument; unknown names pass
/// through untouched so class names and already-qualified types survive.
pub fn map_type(declared: &str) -> String {
    let declared = declared.trim();
    if declared.is_empty() {
        return "String".to_string();
    }

    if let Some(element) = declared.strip_suffix("[]") {
        return format!("{}[]", map_type(element));
    }

    if let Some((outer, inner)) = split_generic(declared) {
        let args: Vec<String> = split_top_level(inner).iter().map(|a| map_type(a)).collect();
        let outer = match outer.to_ascii_lowercase().as_str() {
            "list" | "arraylist" | "collection" => "List".to_string(),
            "set" | "hashset" => "Set".to_string(),
            "map" | "hashmap" => "Map".to_string(),
            _ => outer.to_string(),
        };
        return format!("{outer}<{}>", args.join(", "));
    }

    let lower = declared.to_ascii_lowercase();
    let mapped = match lower.as_str() {
        "int" | "integer" => "Integer",
        "long" => "Long",
        "short" => "Short",
        "byte" => "Byte",
        "float" => "Float",
        "double" | "number" => "Double",
        "bool" | "boolean" => "Boolean",
        "char" | "character" => "Character",
        "string" | "str" | "text" | "varchar" => "String",
        "decimal" | "bigdecimal" | "numeric" | "money" => "BigDecimal",
        "biginteger" => "BigInteger",
        "date" | "localdate" => "LocalDate",
        "datetime" | "timestamp" | "localdatetime" => "LocalDateTime",
        "time" | "localtime" => "LocalTime",
        "instant" => "Instant",
        "uuid" => "UUID",
        _ if lower.starts_with("varchar(") || lower.starts_with("char(") => "String",
        _ if lower.starts_with("decimal(") || lower.starts_with("numeric(") => "BigDecimal",
        _ => return declared.to_string(),
    };
    mapped.to_string()
}

/// Types that can be a column and a composite-key component without a
/// relation behind them.
pub fn is_scalar(java_type: &str) -> bool {
    matches!(
        java_type,
        "Integer"
            | "Long"
            | "Short"
            | "Byte"
            | "Float"
            | "Double"
            | "Boolean"
            | "Character"
            | "String"
            | "BigDecimal"
            | "BigInteger"
            | "LocalDate"
            | "LocalDateTime"
            | "LocalTime"
            | "Instant"
            | "UUID"
    )
}

/// Collection-typed attributes are excluded from derived queries.
pub fn is_collection(java_type: &str) -> bool {
    java_type.ends_with("[]")
        || ["List<", "Set<", "Map<"]
            .iter()
            .any(|p| java_type.starts_with(p))
}

/// Fully qualified imports needed to mention `java_type`.
pub fn imports_for(java_type: &str) -> BTreeSet<&'static str> {
    let mut out = BTreeSet::new();
    for token in java_type.split(|c: char| !c.is_ascii_alphanumeric() && c != '_') {
        if let Some(import) = import_of(token) {
            out.insert(import);
        }
    }
    out
}

fn import_of(simple_name: &str) -> Option<&'static str> {
    Some(match simple_name {
        "List" => "java.util.List",
        "Set" => "java.util.Set",
        "Map" => "java.util.Map",
        "UUID" => "java.util.UUID",
        "BigDecimal" => "java.math.BigDecimal",
        "BigInteger" => "java.math.BigInteger",
        "LocalDate" => "java.time.LocalDate",
        "LocalDateTime" => "java.time.LocalDateTime",
        "LocalTime" => "java.time.LocalTime",
        "Instant" => "java.time.Instant",
        _ => return None,
    })
}

/// Java literal for a declared default value, or `None` when it cannot be
/// expressed safely for the field type.
pub fn default_literal(java_type: &str, raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let unquoted = raw
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| raw.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')));

    match java_type {
        "String" => {
            let text = unquoted.unwrap_or(raw);
            Some(format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\"")))
        }
        "Boolean" => match raw.to_ascii_lowercase().as_str() {
            "true" => Some("true".to_string()),
            "false" => Some("false".to_string()),
            _ => None,
        },
        "Integer" | "Short" | "Byte" => raw
            .parse::<i64>()
            .ok()
            .map(|n| match java_type {
                "Integer" => n.to_string(),
                other => format!("({}) {n}", other.to_ascii_lowercase()),
            }),
        "Long" => raw
            .trim_end_matches(['L', 'l'])
            .parse::<i64>()
            .ok()
            .map(|n| format!("{n}L")),
        "Double" => raw.parse::<f64>().ok().map(|_| {
            if raw.contains('.') {
                raw.to_string()
            } else {
                format!("{raw}.0")
            }
        }),
        "Float" => raw
            .trim_end_matches(['F', 'f'])
            .parse::<f32>()
            .ok()
            .map(|_| format!("{}F", raw.trim_end_matches(['F', 'f']))),
        "BigDecimal" => raw
            .parse::<f64>()
            .ok()
            .map(|_| format!("new BigDecimal(\"{raw}\")")),
        _ => None,
    }
}

fn split_generic(declared: &str) -> Option<(&str, &str)> {
    let open = declared.find('<')?;
    let inner = declared[open + 1..].strip_suffix('>')?;
    Some((declared[..open].trim(), inner))
}

fn split_top_level(args: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, c) in args.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                out.push(args[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(args[start..].trim());
    out
}
