//! Errors raised while parsing, digesting and generating.
//!
//! Every failure aborts the run: no partial data model and no partial
//! artifact set is ever handed out.

use std::fmt;

use odata2ts_common::ConfigError;

/// What a failed lookup was looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    ModelType,
    EnumType,
    BaseType,
    RootOperation,
    BoundOperation,
    EntitySet,
    Singleton,
    ContainerEntry,
    NavigationTarget,
    KeyProperty,
    Association,
    Property,
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LookupKind::ModelType => "model type",
            LookupKind::EnumType => "enum type",
            LookupKind::BaseType => "base type",
            LookupKind::RootOperation => "root operation",
            LookupKind::BoundOperation => "bound operation",
            LookupKind::EntitySet => "entity set",
            LookupKind::Singleton => "singleton",
            LookupKind::ContainerEntry => "container entry",
            LookupKind::NavigationTarget => "navigation target",
            LookupKind::KeyProperty => "key property",
            LookupKind::Association => "association",
            LookupKind::Property => "property",
        };
        f.write_str(label)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A type token matched none of the recognized shapes.
    #[error("Unknown type [{identifier}]: {expected}")]
    Schema { identifier: String, expected: String },

    /// The metadata is structurally impossible to model.
    #[error("IllegalState: {identifier}: {reason}")]
    IllegalState { identifier: String, reason: String },

    #[error("Couldn't find {kind} with name [{identifier}]")]
    Lookup { kind: LookupKind, identifier: String },

    #[error("Lookup of {kind} [{identifier}] is ambiguous: {candidates} declarations match")]
    AmbiguousLookup {
        kind: LookupKind,
        identifier: String,
        candidates: usize,
    },

    #[error(transparent)]
    Configuration(#[from] ConfigError),

    /// Two distinct raw identifiers map to one generated symbol.
    #[error(
        "Naming collision in {scope}: '{first}' and '{second}' both become {kind} '{symbol}'"
    )]
    NameCollision {
        kind: &'static str,
        scope: String,
        symbol: String,
        first: String,
        second: String,
    },

    #[error("Failed to parse EDMX document: {0}")]
    Xml(#[from] quick_xml::DeError),

    #[error("Unsupported EDMX version '{0}': expected 1.0 (OData V2) or 4.0 (OData V4)")]
    UnsupportedVersion(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub fn schema(identifier: impl Into<String>, expected: impl Into<String>) -> Self {
        Error::Schema {
            identifier: identifier.into(),
            expected: expected.into(),
        }
    }

    pub fn illegal_state(identifier: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::IllegalState {
            identifier: identifier.into(),
            reason: reason.into(),
        }
    }

    pub fn lookup(kind: LookupKind, identifier: impl Into<String>) -> Self {
        Error::Lookup {
            kind,
            identifier: identifier.into(),
        }
    }

    pub fn is_lookup(&self) -> bool {
        matches!(self, Error::Lookup { .. } | Error::AmbiguousLookup { .. })
    }

    /// Invalid options, including naming rules that collide on real input.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Configuration(_) | Error::NameCollision { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_message() {
        let err = Error::lookup(LookupKind::RootOperation, "getBestsellers");
        assert_eq!(
            err.to_string(),
            "Couldn't find root operation with name [getBestsellers]"
        );
        assert!(err.is_lookup());
        assert!(!err.is_configuration());
    }

    #[test]
    fn test_schema_message_names_token() {
        let err = Error::schema("Foo.Bar", "expected Collection(...), a namespaced type or Edm.*");
        assert!(err.to_string().starts_with("Unknown type [Foo.Bar]"));
    }

    #[test]
    fn test_collision_is_configuration() {
        let err = Error::NameCollision {
            kind: "model",
            scope: "model file".into(),
            symbol: "Person".into(),
            first: "Trippin.Person".into(),
            second: "Trippin.person".into(),
        };
        assert!(err.is_configuration());
        assert!(err.to_string().contains("'Person'"));
    }
}
