//! Normalized diagram IR.
//!
//! All values here are built once by the ingestor and never mutated afterwards.
//! Downstream stages take `&Diagram` and derive their own read-only views.

use serde::Serialize;

pub type ClassId = String;

// ============================================================================
// Visibility / stereotype
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Private,
    Protected,
    Package,
}

impl Visibility {
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "public" | "+" => Some(Self::Public),
            "private" | "-" => Some(Self::Private),
            "protected" | "#" => Some(Self::Protected),
            "package" | "internal" | "~" => Some(Self::Package),
            _ => None,
        }
    }

    /// UML shorthand marker (`+`, `-`, `#`, `~`).
    pub fn from_marker(marker: char) -> Option<Self> {
        match marker {
            '+' => Some(Self::Public),
            '-' => Some(Self::Private),
            '#' => Some(Self::Protected),
            '~' => Some(Self::Package),
            _ => None,
        }
    }
}

pub const ASSOCIATION_TABLE_STEREOTYPE: &str = "association_table";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stereotype {
    AssociationTable,
    Other(String),
}

impl Stereotype {
    pub fn parse(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        let normalized = trimmed
            .trim_start_matches("<<")
            .trim_end_matches(">>")
            .trim()
            .to_ascii_lowercase()
            .replace(['-', ' '], "_");
        if normalized == ASSOCIATION_TABLE_STEREOTYPE {
            Some(Self::AssociationTable)
        } else {
            Some(Self::Other(trimmed.to_string()))
        }
    }
}

// ============================================================================
// Attributes
// ============================================================================

/// Canonical attribute. Shorthand strings and structured objects both end up
/// here; nothing downstream knows which surface form was used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    pub sql_type: Option<String>,
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_primary_key: bool,
    pub is_foreign_key: bool,
    pub referenced_entity: Option<String>,
    pub referenced_field: Option<String>,
    pub referenced_type: Option<String>,
    pub is_relationship_attribute: bool,
    pub default_value: Option<String>,
}

impl Attribute {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            sql_type: None,
            visibility: Visibility::Private,
            is_static: false,
            is_primary_key: false,
            is_foreign_key: false,
            referenced_entity: None,
            referenced_field: None,
            referenced_type: None,
            is_relationship_attribute: false,
            default_value: None,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self
    }

    pub fn foreign_key(mut self, referenced_entity: impl Into<String>) -> Self {
        self.is_foreign_key = true;
        self.referenced_entity = Some(referenced_entity.into());
        self
    }

    /// Name of the class this FK points at, if this is an FK attribute.
    pub fn foreign_target(&self) -> Option<&str> {
        if !self.is_foreign_key {
            return None;
        }
        self.referenced_entity
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

// ============================================================================
// Classes
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassNode {
    pub id: ClassId,
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub methods: Vec<String>,
    pub stereotype: Option<Stereotype>,
    pub visibility: Visibility,
    pub description: Option<String>,
}

impl ClassNode {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            attributes: Vec::new(),
            methods: Vec::new(),
            stereotype: None,
            visibility: Visibility::Public,
            description: None,
        }
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn is_association_table(&self) -> bool {
        matches!(self.stereotype, Some(Stereotype::AssociationTable))
    }

    /// First attribute flagged as primary key.
    pub fn primary_key_attribute(&self) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.is_primary_key)
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn foreign_keys(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter().filter(|a| a.foreign_target().is_some())
    }

    /// True if any FK attribute of this class references `class_name`.
    pub fn has_foreign_key_to(&self, class_name: &str) -> bool {
        self.foreign_keys()
            .any(|a| names_match(a.foreign_target().unwrap_or_default(), class_name))
    }
}

/// Class-name comparison used for FK `referencedEntity` lookups.
///
/// Exact match first; otherwise ASCII case-insensitive.
pub fn names_match(reference: &str, class_name: &str) -> bool {
    let reference = reference.trim();
    reference == class_name || reference.eq_ignore_ascii_case(class_name)
}

// ============================================================================
// Relationships
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationshipKind {
    Association,
    Aggregation,
    Composition,
    Dependency,
    Inheritance,
    Implementation,
    ManyToManyDirect,
    /// Kept verbatim; the classifier decides how to recover.
    Unrecognized(String),
}

impl RelationshipKind {
    pub fn parse(text: &str) -> Self {
        let normalized = text.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "" | "association" => Self::Association,
            "aggregation" => Self::Aggregation,
            "composition" => Self::Composition,
            "dependency" => Self::Dependency,
            "inheritance" | "generalization" => Self::Inheritance,
            "implementation" | "realization" => Self::Implementation,
            "many-to-many-direct" => Self::ManyToManyDirect,
            _ => Self::Unrecognized(text.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Association => "association",
            Self::Aggregation => "aggregation",
            Self::Composition => "composition",
            Self::Dependency => "dependency",
            Self::Inheritance => "inheritance",
            Self::Implementation => "implementation",
            Self::ManyToManyDirect => "many-to-many-direct",
            Self::Unrecognized(raw) => raw,
        }
    }
}

/// Free-form endpoint multiplicity (`"1"`, `"*"`, `"0..1"`, `"1..*"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Multiplicity(pub String);

impl Multiplicity {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_many(&self) -> bool {
        self.0.contains('*')
    }

    pub fn is_exactly_one(&self) -> bool {
        self.0.trim() == "1"
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub id: String,
    pub source: ClassId,
    pub target: ClassId,
    pub kind: RelationshipKind,
    pub source_multiplicity: Multiplicity,
    pub target_multiplicity: Multiplicity,
    pub label: Option<String>,
    pub association_table: Option<ClassId>,
    pub many_to_many_group: Option<String>,
}

impl Relationship {
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
        kind: RelationshipKind,
        source_multiplicity: &str,
        target_multiplicity: &str,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            kind,
            source_multiplicity: Multiplicity::new(source_multiplicity),
            target_multiplicity: Multiplicity::new(target_multiplicity),
            label: None,
            association_table: None,
            many_to_many_group: None,
        }
    }
}

// ============================================================================
// Association tables
// ============================================================================

/// Explicit join class (stereotype `association_table`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssociationTable {
    pub class: ClassNode,
}

impl AssociationTable {
    pub fn id(&self) -> &str {
        &self.class.id
    }

    pub fn name(&self) -> &str {
        &self.class.name
    }

    /// FK attributes, in declaration order. These become the composite key.
    pub fn key_columns(&self) -> impl Iterator<Item = &Attribute> {
        self.class.foreign_keys()
    }

    /// Everything that is not part of the composite key.
    pub fn columns(&self) -> impl Iterator<Item = &Attribute> {
        self.class
            .attributes
            .iter()
            .filter(|a| a.foreign_target().is_none())
    }

    /// True when the key columns reference both named classes.
    pub fn joins(&self, a_name: &str, b_name: &str) -> bool {
        let targets: Vec<&str> = self.key_columns().filter_map(Attribute::foreign_target).collect();
        let has = |name: &str| targets.iter().any(|t| names_match(t, name));
        if names_match(a_name, b_name) {
            return targets.iter().filter(|t| names_match(t, a_name)).count() >= 2;
        }
        has(a_name) && has(b_name)
    }
}

// ============================================================================
// Diagram
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagram {
    pub classes: Vec<ClassNode>,
    pub relationships: Vec<Relationship>,
    pub association_tables: Vec<AssociationTable>,
}

impl Diagram {
    pub fn class(&self, id: &str) -> Option<&ClassNode> {
        self.classes.iter().find(|c| c.id == id)
    }

    /// Lookup used for `referencedEntity`: exact name first, then case-insensitive.
    pub fn class_by_name(&self, name: &str) -> Option<&ClassNode> {
        let name = name.trim();
        self.classes
            .iter()
            .find(|c| c.name == name)
            .or_else(|| self.classes.iter().find(|c| c.name.eq_ignore_ascii_case(name)))
    }

    pub fn association_table(&self, id: &str) -> Option<&AssociationTable> {
        self.association_tables.iter().find(|t| t.id() == id)
    }

    pub fn is_association_table(&self, id: &str) -> bool {
        self.association_table(id).is_some()
    }
}
