//! Run configuration for one generation invocation.
//!
//! Configuration files may be written as TOML, JSON or YAML; the format is
//! picked from the file extension. All keys use camelCase and every key is
//! optional:
//!
//! ```toml
//! serviceName = "Trippin"
//! modelSuffix = "Model"
//! v4BigNumberAsString = true
//!
//! [[converters]]
//! module = "@odata2ts/test-converters"
//! use = ["guidToGuidStringConverter"]
//!
//! [naming.services]
//! suffix = "Srv"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::naming::{NameSettings, NamingOptions};

/// Configuration errors: unreadable files and invalid option combinations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error(
        "Unsupported config file {}: expected a .toml, .json, .yaml or .yml extension",
        path.display()
    )]
    UnsupportedFormat { path: PathBuf },

    #[error(
        "Naming for {first} and {second} is indistinguishable; give one of them a different prefix, suffix or naming strategy"
    )]
    IndistinguishableNaming {
        first: &'static str,
        second: &'static str,
    },

    #[error("Converter declaration for module '{module}' lists no converters to use")]
    EmptyConverterList { module: String },

    #[error("Converter declaration has an empty module name")]
    EmptyConverterModule,
}

/// Converter declaration: passed through to the generated code untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConverterDeclaration {
    pub module: String,
    #[serde(rename = "use", default)]
    pub converters: Vec<String>,
}

/// Read-only options of a generation run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RunOptions {
    /// Overrides the service name derived from the schema namespace.
    pub service_name: Option<String>,
    pub model_prefix: String,
    pub model_suffix: String,
    /// Map `Edm.Int64` and `Edm.Decimal` to strings instead of numbers.
    #[serde(alias = "bigNumberAsString")]
    pub v4_big_number_as_string: bool,
    /// Generate collection services for primitive and enum collections.
    pub enable_primitive_property_services: bool,
    pub skip_editable_models: bool,
    /// Copy inherited properties into derived models instead of `extends`.
    pub flatten_base_properties: bool,
    pub converters: Vec<ConverterDeclaration>,
    pub naming: NamingOptions,
}

impl RunOptions {
    /// Load options from a file, choosing the format by extension.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        let options = match extension.as_deref() {
            Some("toml") => Self::from_toml_str(&contents),
            Some("json") => Self::from_json_str(&contents),
            Some("yaml" | "yml") => Self::from_yaml_str(&contents),
            _ => {
                return Err(ConfigError::UnsupportedFormat {
                    path: path.to_path_buf(),
                });
            }
        };

        options.map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, String> {
        toml::from_str(contents).map_err(|e| e.to_string())
    }

    pub fn from_json_str(contents: &str) -> Result<Self, String> {
        serde_json::from_str(contents).map_err(|e| e.to_string())
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, String> {
        serde_yaml::from_str(contents).map_err(|e| e.to_string())
    }

    /// Reject option combinations the generators cannot honour.
    ///
    /// Kinds that end up side by side in one emitted scope must not map a
    /// raw identifier to the same symbol.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let naming = &self.naming;
        let models = self.effective_model_settings();

        let pairs: [(&'static str, &NameSettings, &'static str, &NameSettings); 4] = [
            ("models", &models, "editableModels", &naming.editable_models),
            ("models", &models, "queryObjects", &naming.query_objects),
            ("services", &naming.services, "collectionServices", &naming.collection_services),
            ("modelProperties", &naming.model_properties, "privateProps", &naming.private_props),
        ];

        for (first, a, second, b) in pairs {
            if a.is_indistinguishable_from(b) {
                return Err(ConfigError::IndistinguishableNaming { first, second });
            }
        }

        for converter in &self.converters {
            if converter.module.trim().is_empty() {
                return Err(ConfigError::EmptyConverterModule);
            }
            if converter.converters.is_empty() {
                return Err(ConfigError::EmptyConverterList {
                    module: converter.module.clone(),
                });
            }
        }

        Ok(())
    }

    /// Model naming with the top-level `modelPrefix`/`modelSuffix` folded in.
    pub fn effective_model_settings(&self) -> NameSettings {
        let models = &self.naming.models;
        NameSettings {
            naming_strategy: models.naming_strategy,
            prefix: format!("{}{}", self.model_prefix, models.prefix),
            suffix: format!("{}{}", models.suffix, self.model_suffix),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::naming::NamingStrategy;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let options = RunOptions::default();
        assert!(!options.v4_big_number_as_string);
        assert!(options.converters.is_empty());
        assert_eq!(options.naming.query_objects.prefix, "Q");
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_from_toml() {
        let options = RunOptions::from_toml_str(
            r#"
serviceName = "Trippin"
modelSuffix = "Model"
v4BigNumberAsString = true

[[converters]]
module = "@odata2ts/test-converters"
use = ["guidToGuidStringConverter"]

[naming.services]
namingStrategy = "CONSTANT_CASE"
suffix = "srv"
"#,
        )
        .unwrap();

        assert_eq!(options.service_name.as_deref(), Some("Trippin"));
        assert!(options.v4_big_number_as_string);
        assert_eq!(options.converters[0].converters, ["guidToGuidStringConverter"]);
        assert_eq!(
            options.naming.services.naming_strategy,
            Some(NamingStrategy::ConstantCase)
        );
        assert_eq!(options.effective_model_settings().suffix, "Model");
    }

    #[test]
    fn test_from_json_and_yaml_agree() {
        let json = RunOptions::from_json_str(
            r#"{ "modelPrefix": "I", "enablePrimitivePropertyServices": true }"#,
        )
        .unwrap();
        let yaml =
            RunOptions::from_yaml_str("modelPrefix: I\nenablePrimitivePropertyServices: true\n")
                .unwrap();
        assert_eq!(json, yaml);
        assert_eq!(json.effective_model_settings().prefix, "I");
    }

    #[test]
    fn test_big_number_alias() {
        let options = RunOptions::from_json_str(r#"{ "bigNumberAsString": true }"#).unwrap();
        assert!(options.v4_big_number_as_string);
    }

    #[test]
    fn test_validate_rejects_colliding_model_naming() {
        let mut options = RunOptions::default();
        options.naming.editable_models.prefix = String::new();
        let err = options.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::IndistinguishableNaming {
                first: "models",
                second: "editableModels"
            }
        ));
    }

    #[test]
    fn test_model_prefix_disambiguates() {
        let mut options = RunOptions::default();
        options.naming.query_objects.prefix = String::new();
        assert!(options.validate().is_err());

        options.model_prefix = "I".into();
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_converter_list() {
        let options = RunOptions {
            converters: vec![ConverterDeclaration {
                module: "my-converters".into(),
                converters: vec![],
            }],
            ..RunOptions::default()
        };
        assert!(matches!(
            options.validate(),
            Err(ConfigError::EmptyConverterList { .. })
        ));
    }

    #[test]
    fn test_load_picks_format_by_extension() {
        let dir = tempfile::TempDir::new().unwrap();

        let path = dir.path().join("odata2ts.json");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(br#"{ "skipEditableModels": true }"#).unwrap();
        assert!(RunOptions::load(&path).unwrap().skip_editable_models);

        let bad = dir.path().join("odata2ts.ini");
        fs::write(&bad, "x=1").unwrap();
        assert!(matches!(
            RunOptions::load(&bad),
            Err(ConfigError::UnsupportedFormat { .. })
        ));

        let missing = dir.path().join("missing.toml");
        assert!(matches!(RunOptions::load(&missing), Err(ConfigError::Io { .. })));
    }
}
