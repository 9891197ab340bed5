use serde::{Deserialize, Serialize};

/// Knobs for one generation run. Every field has a default, so `{}` is a
/// valid config document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneratorConfig {
    /// Java package root; artifact kinds live in sub-packages.
    pub base_package: String,
    /// Key type when no primary key is declared anywhere in a class's chain.
    pub default_id_type: String,
    /// Max scalar attributes per class that get `findByX`/`existsByX`/`countByX`.
    pub derived_query_limit: usize,
    /// Controller base path prefix.
    pub api_prefix: String,
    /// Drop child fields already declared anywhere up the inheritance chain,
    /// not just by the immediate parent.
    pub skip_ancestor_fields: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            base_package: "com.example.demo".to_string(),
            default_id_type: "Long".to_string(),
            derived_query_limit: 3,
            api_prefix: "/api".to_string(),
            skip_ancestor_fields: true,
        }
    }
}

impl GeneratorConfig {
    pub fn with_base_package(mut self, base_package: impl Into<String>) -> Self {
        self.base_package = base_package.into();
        self
    }

    pub fn package(&self, sub: &str) -> String {
        format!("{}.{sub}", self.base_package)
    }

    /// `"/api"` + `"books"` → `"/api/books"`, tolerant of stray slashes.
    pub fn api_path(&self, resource: &str) -> String {
        let prefix = self.api_prefix.trim().trim_end_matches('/');
        let prefix = if prefix.is_empty() || prefix.starts_with('/') {
            prefix.to_string()
        } else {
            format!("/{prefix}")
        };
        format!("{prefix}/{}", resource.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config: GeneratorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, GeneratorConfig::default());
    }

    #[test]
    fn partial_document_overrides_only_named_fields() {
        let config: GeneratorConfig =
            serde_json::from_str(r#"{"basePackage":"org.library","derivedQueryLimit":1}"#).unwrap();
        assert_eq!(config.base_package, "org.library");
        assert_eq!(config.derived_query_limit, 1);
        assert_eq!(config.default_id_type, "Long");
        assert!(config.skip_ancestor_fields);
        assert_eq!(config.package("entities"), "org.library.entities");
    }

    #[test]
    fn api_path_normalizes_slashes() {
        let mut config = GeneratorConfig::default();
        assert_eq!(config.api_path("books"), "/api/books");
        config.api_prefix = "v1/".to_string();
        assert_eq!(config.api_path("/books"), "/v1/books");
        config.api_prefix = String::new();
        assert_eq!(config.api_path("books"), "/books");
    }
}
