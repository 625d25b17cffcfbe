//! Naming configuration per generated artifact kind.

use serde::{Deserialize, Serialize};

/// Case conversion applied to a raw OData identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NamingStrategy {
    /// `UpperCamelCase`
    PascalCase,
    /// `lowerCamelCase`
    CamelCase,
    /// `ALL_CAPS_WITH_UNDERSCORES`
    ConstantCase,
    /// `lower_with_underscores`
    SnakeCase,
}

/// Prefix and suffix wrapped around a converted name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Affixes {
    pub prefix: String,
    pub suffix: String,
}

impl Affixes {
    pub fn new(prefix: &str, suffix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
        }
    }
}

/// Naming rule for one artifact kind.
///
/// A missing strategy keeps the raw identifier as is; affixes are applied
/// after case conversion.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NameSettings {
    pub naming_strategy: Option<NamingStrategy>,
    pub prefix: String,
    pub suffix: String,
}

impl NameSettings {
    pub fn new(strategy: Option<NamingStrategy>, prefix: &str, suffix: &str) -> Self {
        Self {
            naming_strategy: strategy,
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
        }
    }

    pub fn with_strategy(strategy: NamingStrategy) -> Self {
        Self::new(Some(strategy), "", "")
    }

    /// Whether two settings would turn the same raw name into the same symbol.
    pub fn is_indistinguishable_from(&self, other: &NameSettings) -> bool {
        self.naming_strategy == other.naming_strategy
            && self.prefix == other.prefix
            && self.suffix == other.suffix
    }
}

/// Operations share one strategy but carry separate function/action affixes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OperationNameSettings {
    pub naming_strategy: Option<NamingStrategy>,
    pub function: Affixes,
    pub action: Affixes,
}

impl Default for OperationNameSettings {
    fn default() -> Self {
        Self {
            naming_strategy: Some(NamingStrategy::CamelCase),
            function: Affixes::default(),
            action: Affixes::default(),
        }
    }
}

/// Names of the emitted files, derived from the service name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileNameSettings {
    pub naming_strategy: Option<NamingStrategy>,
    pub model: Affixes,
    pub query_object: Affixes,
    pub service: Affixes,
}

impl Default for FileNameSettings {
    fn default() -> Self {
        Self {
            naming_strategy: Some(NamingStrategy::PascalCase),
            model: Affixes::new("", "Model"),
            query_object: Affixes::new("Q", ""),
            service: Affixes::new("", "Service"),
        }
    }
}

/// Naming rules for every artifact kind the generators emit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NamingOptions {
    pub models: NameSettings,
    pub editable_models: NameSettings,
    pub model_properties: NameSettings,
    pub enums: NameSettings,
    pub enum_members: NameSettings,
    pub query_objects: NameSettings,
    pub query_object_properties: NameSettings,
    pub operations: OperationNameSettings,
    pub entry_points: NameSettings,
    pub services: NameSettings,
    pub collection_services: NameSettings,
    pub private_props: NameSettings,
    pub related_service_getter: NameSettings,
    pub main_service: NameSettings,
    pub file_names: FileNameSettings,
}

impl Default for NamingOptions {
    fn default() -> Self {
        use NamingStrategy::{CamelCase, PascalCase};

        Self {
            models: NameSettings::with_strategy(PascalCase),
            editable_models: NameSettings::new(Some(PascalCase), "Editable", ""),
            model_properties: NameSettings::with_strategy(CamelCase),
            enums: NameSettings::with_strategy(PascalCase),
            enum_members: NameSettings::default(),
            query_objects: NameSettings::new(Some(PascalCase), "Q", ""),
            query_object_properties: NameSettings::with_strategy(CamelCase),
            operations: OperationNameSettings::default(),
            entry_points: NameSettings::with_strategy(CamelCase),
            services: NameSettings::new(Some(PascalCase), "", "Service"),
            collection_services: NameSettings::new(Some(PascalCase), "", "CollectionService"),
            private_props: NameSettings::new(Some(CamelCase), "_", ""),
            related_service_getter: NameSettings::with_strategy(CamelCase),
            main_service: NameSettings::new(Some(PascalCase), "", "Service"),
            file_names: FileNameSettings::default(),
        }
    }
}
