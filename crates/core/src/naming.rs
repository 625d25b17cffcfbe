//! Generated identifiers.
//!
//! [`NamingHelper`] turns raw OData identifiers into TypeScript symbols
//! according to the per-kind rules of [`NamingOptions`]. Conversion is pure:
//! the same raw name and kind always produce the same symbol.
//! [`SymbolScope`] detects two raw names landing on one symbol.

use std::collections::HashMap;

use odata2ts_common::{NameSettings, NamingOptions, NamingStrategy, RunOptions};

use crate::edmx::Schema;
use crate::error::{Error, Result};

/// Artifact kinds with their own naming rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Model,
    EditableModel,
    ModelProperty,
    Enum,
    EnumMember,
    QueryObject,
    QueryObjectProperty,
    Function,
    Action,
    EntryPoint,
    Service,
    CollectionService,
    PrivateProp,
    RelatedServiceGetter,
    MainService,
}

#[derive(Debug, Clone)]
pub struct NamingHelper {
    naming: NamingOptions,
    models: NameSettings,
    service_name: String,
    /// Longest first so nested namespaces strip before their parents.
    namespaces: Vec<String>,
}

impl NamingHelper {
    pub fn new(options: &RunOptions, service_name: &str, namespaces: &[String]) -> Self {
        let mut namespaces = namespaces.to_vec();
        namespaces.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        namespaces.dedup();

        Self {
            naming: options.naming.clone(),
            models: options.effective_model_settings(),
            service_name: service_name.to_string(),
            namespaces,
        }
    }

    /// Derive service name and namespaces from the parsed schemas.
    ///
    /// The service name is the configured one, else the last segment of the
    /// namespace declaring the entity container.
    pub fn from_schemas(options: &RunOptions, schemas: &[Schema]) -> Self {
        let namespaces: Vec<String> = schemas
            .iter()
            .flat_map(|s| std::iter::once(s.namespace.clone()).chain(s.alias.clone()))
            .collect();

        let service_name = options.service_name.clone().unwrap_or_else(|| {
            schemas
                .iter()
                .find(|s| !s.entity_containers.is_empty())
                .or_else(|| schemas.first())
                .and_then(|s| s.namespace.rsplit('.').next())
                .unwrap_or("OData")
                .to_string()
        });

        Self::new(options, &service_name, &namespaces)
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn namespaces(&self) -> &[String] {
        &self.namespaces
    }

    /// Local part of a name qualified by a known namespace or alias.
    pub fn strip_namespace<'a>(&self, name: &'a str) -> Option<&'a str> {
        self.namespaces.iter().find_map(|ns| {
            name.strip_prefix(ns.as_str())
                .and_then(|rest| rest.strip_prefix('.'))
                .filter(|local| !local.is_empty())
        })
    }

    pub fn local_name<'a>(&self, name: &'a str) -> &'a str {
        self.strip_namespace(name).unwrap_or(name)
    }

    pub fn name_for(&self, raw: &str, kind: ArtifactKind) -> String {
        let (strategy, prefix, suffix) = self.settings(kind);
        compose(self.local_name(raw), strategy, prefix, suffix)
    }

    fn settings(&self, kind: ArtifactKind) -> (Option<NamingStrategy>, &str, &str) {
        let n = &self.naming;
        let rule = match kind {
            ArtifactKind::Model => &self.models,
            ArtifactKind::EditableModel => &n.editable_models,
            ArtifactKind::ModelProperty => &n.model_properties,
            ArtifactKind::Enum => &n.enums,
            ArtifactKind::EnumMember => &n.enum_members,
            ArtifactKind::QueryObject => &n.query_objects,
            ArtifactKind::QueryObjectProperty => &n.query_object_properties,
            ArtifactKind::EntryPoint => &n.entry_points,
            ArtifactKind::Service => &n.services,
            ArtifactKind::CollectionService => &n.collection_services,
            ArtifactKind::PrivateProp => &n.private_props,
            ArtifactKind::RelatedServiceGetter => &n.related_service_getter,
            ArtifactKind::MainService => &n.main_service,
            ArtifactKind::Function => {
                let ops = &n.operations;
                return (ops.naming_strategy, &ops.function.prefix, &ops.function.suffix);
            }
            ArtifactKind::Action => {
                let ops = &n.operations;
                return (ops.naming_strategy, &ops.action.prefix, &ops.action.suffix);
            }
        };
        (rule.naming_strategy, &rule.prefix, &rule.suffix)
    }

    pub fn model_name(&self, raw: &str) -> String {
        self.name_for(raw, ArtifactKind::Model)
    }

    pub fn editable_model_name(&self, raw: &str) -> String {
        self.name_for(raw, ArtifactKind::EditableModel)
    }

    pub fn qobject_name(&self, raw: &str) -> String {
        self.name_for(raw, ArtifactKind::QueryObject)
    }

    /// Exported instance of a query-object class: `QPerson` -> `qPerson`.
    pub fn qobject_instance_name(&self, qobject_name: &str) -> String {
        lower_first(qobject_name)
    }

    pub fn property_name(&self, raw: &str) -> String {
        self.name_for(raw, ArtifactKind::ModelProperty)
    }

    pub fn qobject_property_name(&self, raw: &str) -> String {
        self.name_for(raw, ArtifactKind::QueryObjectProperty)
    }

    pub fn enum_name(&self, raw: &str) -> String {
        self.name_for(raw, ArtifactKind::Enum)
    }

    pub fn enum_member_name(&self, raw: &str) -> String {
        self.name_for(raw, ArtifactKind::EnumMember)
    }

    pub fn operation_name(&self, raw: &str, is_action: bool) -> String {
        let kind = if is_action {
            ArtifactKind::Action
        } else {
            ArtifactKind::Function
        };
        self.name_for(raw, kind)
    }

    pub fn entry_point_name(&self, raw: &str) -> String {
        self.name_for(raw, ArtifactKind::EntryPoint)
    }

    pub fn service_class_name(&self, raw: &str) -> String {
        self.name_for(raw, ArtifactKind::Service)
    }

    pub fn collection_service_name(&self, raw: &str) -> String {
        self.name_for(raw, ArtifactKind::CollectionService)
    }

    pub fn private_prop_name(&self, raw: &str) -> String {
        self.name_for(raw, ArtifactKind::PrivateProp)
    }

    pub fn related_service_getter(&self, raw: &str) -> String {
        self.name_for(raw, ArtifactKind::RelatedServiceGetter)
    }

    pub fn main_service_name(&self) -> String {
        self.name_for(&self.service_name, ArtifactKind::MainService)
    }

    pub fn model_file_name(&self) -> String {
        let files = &self.naming.file_names;
        compose(
            &self.service_name,
            files.naming_strategy,
            &files.model.prefix,
            &files.model.suffix,
        )
    }

    pub fn qobject_file_name(&self) -> String {
        let files = &self.naming.file_names;
        compose(
            &self.service_name,
            files.naming_strategy,
            &files.query_object.prefix,
            &files.query_object.suffix,
        )
    }

    pub fn service_file_name(&self) -> String {
        let files = &self.naming.file_names;
        compose(
            &self.service_name,
            files.naming_strategy,
            &files.service.prefix,
            &files.service.suffix,
        )
    }
}

/// Registry of symbols emitted into one scope.
#[derive(Debug)]
pub struct SymbolScope {
    kind: &'static str,
    scope: String,
    symbols: HashMap<String, String>,
}

impl SymbolScope {
    pub fn new(kind: &'static str, scope: impl Into<String>) -> Self {
        Self {
            kind,
            scope: scope.into(),
            symbols: HashMap::new(),
        }
    }

    /// Record that `raw` generates `symbol`. Re-registering the same raw name is allowed.
    pub fn register(&mut self, raw: &str, symbol: &str) -> Result<()> {
        match self.symbols.get(symbol) {
            Some(existing) if existing != raw => Err(Error::NameCollision {
                kind: self.kind,
                scope: self.scope.clone(),
                symbol: symbol.to_string(),
                first: existing.clone(),
                second: raw.to_string(),
            }),
            Some(_) => Ok(()),
            None => {
                self.symbols.insert(symbol.to_string(), raw.to_string());
                Ok(())
            }
        }
    }
}

/// Apply a naming rule. Non-alphanumeric affix edges (`_`, `$`) are kept
/// verbatim; the rest of the affixes take part in case conversion.
fn compose(raw: &str, strategy: Option<NamingStrategy>, prefix: &str, suffix: &str) -> String {
    let Some(strategy) = strategy else {
        return sanitize_identifier(format!("{prefix}{raw}{suffix}"));
    };

    let prefix_core = prefix.trim_start_matches(|c: char| !c.is_alphanumeric());
    let lead = &prefix[..prefix.len() - prefix_core.len()];
    let suffix_core = suffix.trim_end_matches(|c: char| !c.is_alphanumeric());
    let trail = &suffix[suffix_core.len()..];

    let mut words = split_words(prefix_core);
    words.extend(split_words(raw));
    words.extend(split_words(suffix_core));

    sanitize_identifier(format!("{lead}{}{trail}", join_words(&words, strategy)))
}

/// Split an identifier into words at separators and case boundaries.
///
/// `ICAOCode` splits into `ICAO`, `Code`; digits stay attached to the
/// preceding letters.
pub fn split_words(s: &str) -> Vec<String> {
    let mut words = Vec::new();

    for chunk in s.split(|c: char| !c.is_alphanumeric()) {
        let chars: Vec<char> = chunk.chars().collect();
        let mut current = String::new();

        for (i, &c) in chars.iter().enumerate() {
            if i > 0 && c.is_uppercase() {
                let prev = chars[i - 1];
                let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
                if prev.is_lowercase() || prev.is_numeric() || (prev.is_uppercase() && next_is_lower)
                {
                    words.push(std::mem::take(&mut current));
                }
            }
            current.push(c);
        }

        if !current.is_empty() {
            words.push(current);
        }
    }

    words
}

fn join_words(words: &[String], strategy: NamingStrategy) -> String {
    match strategy {
        NamingStrategy::PascalCase => words.iter().map(|w| capitalize(w)).collect(),
        NamingStrategy::CamelCase => words
            .iter()
            .enumerate()
            .map(|(i, w)| if i == 0 { w.to_lowercase() } else { capitalize(w) })
            .collect(),
        NamingStrategy::ConstantCase => words
            .iter()
            .map(|w| w.to_uppercase())
            .collect::<Vec<_>>()
            .join("_"),
        NamingStrategy::SnakeCase => words
            .iter()
            .map(|w| w.to_lowercase())
            .collect::<Vec<_>>()
            .join("_"),
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn lower_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn sanitize_identifier(name: String) -> String {
    match name.chars().next() {
        None => "_".to_string(),
        Some(c) if c.is_ascii_digit() => format!("_{name}"),
        Some(_) => name,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn helper(options: &RunOptions) -> NamingHelper {
        NamingHelper::new(
            options,
            "Trippin",
            &["Trippin".to_string(), "Microsoft.OData.Trippin".to_string()],
        )
    }

    #[test]
    fn test_split_words() {
        assert_eq!(split_words("getNearestAirport"), ["get", "Nearest", "Airport"]);
        assert_eq!(split_words("ICAOCode"), ["ICAO", "Code"]);
        assert_eq!(split_words("Ch1ld1shF4n"), ["Ch1ld1sh", "F4n"]);
        assert_eq!(split_words("first_name-x"), ["first", "name", "x"]);
        assert!(split_words("__").is_empty());
    }

    #[test]
    fn test_default_names() {
        let naming = helper(&RunOptions::default());
        assert_eq!(naming.model_name("Trippin.Person"), "Person");
        assert_eq!(naming.editable_model_name("Person"), "EditablePerson");
        assert_eq!(naming.qobject_name("Person"), "QPerson");
        assert_eq!(naming.qobject_instance_name("QPerson"), "qPerson");
        assert_eq!(naming.property_name("UserName"), "userName");
        assert_eq!(naming.operation_name("GetNearestAirport", false), "getNearestAirport");
        assert_eq!(naming.entry_point_name("People"), "people");
        assert_eq!(naming.service_class_name("Person"), "PersonService");
        assert_eq!(naming.collection_service_name("Person"), "PersonCollectionService");
        assert_eq!(naming.private_prop_name("BestFriend"), "_bestFriend");
        assert_eq!(naming.enum_member_name("Feature1"), "Feature1");
        assert_eq!(naming.main_service_name(), "TrippinService");
    }

    #[test]
    fn test_file_names() {
        let naming = helper(&RunOptions::default());
        assert_eq!(naming.model_file_name(), "TrippinModel");
        assert_eq!(naming.qobject_file_name(), "QTrippin");
        assert_eq!(naming.service_file_name(), "TrippinService");
    }

    #[test]
    fn test_longest_namespace_strips_first() {
        let naming = helper(&RunOptions::default());
        assert_eq!(naming.strip_namespace("Microsoft.OData.Trippin.Person"), Some("Person"));
        assert_eq!(naming.strip_namespace("Other.Person"), None);
        assert_eq!(naming.strip_namespace("Trippin."), None);
    }

    #[test]
    fn test_configured_strategy_and_affixes() {
        let mut options = RunOptions::default();
        options.naming.services = NameSettings::new(Some(NamingStrategy::ConstantCase), "", "srv");
        options.model_suffix = "Model".into();
        let naming = helper(&options);
        assert_eq!(naming.service_class_name("TestEntity"), "TEST_ENTITY_SRV");
        assert_eq!(naming.model_name("TestEntity"), "TestEntityModel");
        assert_eq!(naming.editable_model_name("TestEntity"), "EditableTestEntity");
    }

    #[test]
    fn test_no_strategy_keeps_raw() {
        let mut options = RunOptions::default();
        options.naming.model_properties = NameSettings::default();
        let naming = helper(&options);
        assert_eq!(naming.property_name("User_Name"), "User_Name");
        assert_eq!(naming.enum_member_name("1st"), "_1st");
    }

    #[test]
    fn test_name_for_is_pure() {
        let naming = helper(&RunOptions::default());
        let first = naming.name_for("BestFriend", ArtifactKind::RelatedServiceGetter);
        let second = naming.name_for("BestFriend", ArtifactKind::RelatedServiceGetter);
        assert_eq!(first, second);
        assert_eq!(first, "bestFriend");
    }

    #[test]
    fn test_symbol_scope_detects_collision() {
        let mut scope = SymbolScope::new("model property", "Person");
        scope.register("UserName", "userName").unwrap();
        scope.register("UserName", "userName").unwrap();
        let err = scope.register("userName", "userName").unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("Person"));
    }

    #[test]
    fn test_service_name_from_container_namespace() {
        let edmx = crate::edmx::Edmx::from_xml(
            r#"<Edmx Version="4.0"><DataServices>
<Schema Namespace="Microsoft.OData.SampleService.Models.TripPin"><EntityContainer Name="C" /></Schema>
</DataServices></Edmx>"#,
        )
        .unwrap();
        let naming = NamingHelper::from_schemas(&RunOptions::default(), edmx.schemas());
        assert_eq!(naming.service_name(), "TripPin");
        assert_eq!(naming.main_service_name(), "TripPinService");

        let options = RunOptions {
            service_name: Some("Custom".into()),
            ..RunOptions::default()
        };
        let naming = NamingHelper::from_schemas(&options, edmx.schemas());
        assert_eq!(naming.main_service_name(), "CustomService");
    }
}
