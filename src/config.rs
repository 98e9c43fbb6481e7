//! Loading render configuration from TOML
//!
//! ```toml
//! [render]
//! default_alias = "MODEL"
//! strict_variables = true
//!
//! [types.Foo]
//! [types.Bar]
//! extends = "Foo"
//! fields = ["title", "count"]
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::contract::{TypeDescriptor, TypeRegistryError};
use crate::render::RenderConfig;

/// Errors that can occur when loading a configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid type declaration: {0}")]
    InvalidType(#[from] TypeRegistryError),
}

/// TOML structure for deserializing configuration
#[derive(Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
struct TomlConfig {
    render: TomlRender,
    types: BTreeMap<String, TomlType>,
}

#[derive(Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
struct TomlRender {
    default_alias: Option<String>,
    strict_variables: Option<bool>,
}

#[derive(Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
struct TomlType {
    extends: Option<String>,
    fields: Vec<String>,
}

impl RenderConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load configuration from a TOML string
    ///
    /// Keys left out keep their defaults; declared types are added to the builtins.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let parsed: TomlConfig = toml::from_str(content)?;

        let mut config = RenderConfig::default();
        if let Some(alias) = parsed.render.default_alias {
            config.default_alias = alias;
        }
        if let Some(strict) = parsed.render.strict_variables {
            config.strict_variables = strict;
        }

        for (name, decl) in parsed.types {
            let mut desc = TypeDescriptor::new(name).with_fields(decl.fields);
            if let Some(parent) = decl.extends {
                desc = desc.extends(parent);
            }
            config.types.register(desc)?;
        }
        // Parents may be declared after their children
        config.types.check_parents()?;

        debug!(
            default_alias = %config.default_alias,
            strict_variables = config.strict_variables,
            "loaded render config"
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = RenderConfig::from_toml("").unwrap();
        assert_eq!(config.default_alias, "MODEL");
        assert!(!config.strict_variables);
        assert!(config.types.contains("Object"));
    }

    #[test]
    fn test_full_config() {
        let config = RenderConfig::from_toml(
            r#"
[render]
default_alias = "VIEW"
strict_variables = true

[types.Bar]
extends = "Foo"
fields = ["title", "count"]

[types.Foo]
"#,
        )
        .unwrap();

        assert_eq!(config.default_alias, "VIEW");
        assert!(config.strict_variables);
        assert!(config.types.is_subtype("Bar", "Foo"));
        assert_eq!(config.types.get("Bar").unwrap().fields, vec!["title", "count"]);
    }

    #[test]
    fn test_unknown_parent_is_rejected() {
        let err = RenderConfig::from_toml("[types.Bar]\nextends = \"Nope\"\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidType(TypeRegistryError::UnknownParent { .. })
        ));
    }

    #[test]
    fn test_redeclaring_builtin_is_rejected() {
        let err = RenderConfig::from_toml("[types.Object]\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidType(TypeRegistryError::Duplicate { .. })
        ));
    }

    #[test]
    fn test_invalid_toml() {
        let err = RenderConfig::from_toml("[render\n").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = RenderConfig::from_file(Path::new("/nonexistent/powerpack.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
