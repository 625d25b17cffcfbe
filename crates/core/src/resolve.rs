//! Type token resolution.
//!
//! Classifies a raw type token (`Collection(NS.Person)`, `NS.Gender`,
//! `Edm.Int32`) into a [`ResolvedType`]. Resolution is pure; the wrapper
//! type a primitive needs is returned to the caller instead of being
//! recorded here.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{Error, Result};
use crate::ir::{DataType, EDM_PREFIX, EdmPrimitive, ODataVersion, WrapperType};
use crate::naming::NamingHelper;

const COLLECTION_PREFIX: &str = "Collection(";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedType {
    pub data_type: DataType,
    pub is_collection: bool,
    /// Generated model or enum name, or the TS type of a primitive.
    pub type_name: String,
    pub import: Option<WrapperType>,
}

pub struct TypeResolver<'a> {
    naming: &'a NamingHelper,
    /// Local OData enum name to generated enum name.
    enums: &'a HashMap<String, String>,
    version: ODataVersion,
    big_number_as_string: bool,
}

impl<'a> TypeResolver<'a> {
    pub fn new(
        naming: &'a NamingHelper,
        enums: &'a HashMap<String, String>,
        version: ODataVersion,
        big_number_as_string: bool,
    ) -> Self {
        Self {
            naming,
            enums,
            version,
            big_number_as_string,
        }
    }

    pub fn resolve(&self, token: &str) -> Result<ResolvedType> {
        let (is_collection, element) = match token
            .strip_prefix(COLLECTION_PREFIX)
            .and_then(|rest| rest.strip_suffix(')'))
        {
            Some(inner) => (true, inner.trim()),
            None => (false, token.trim()),
        };

        if let Some(local) = self.naming.strip_namespace(element) {
            let resolved = match self.enums.get(local) {
                Some(enum_name) => ResolvedType {
                    data_type: DataType::EnumType,
                    is_collection,
                    type_name: enum_name.clone(),
                    import: None,
                },
                None => ResolvedType {
                    data_type: DataType::ModelType,
                    is_collection,
                    type_name: self.naming.model_name(local),
                    import: None,
                },
            };
            return Ok(resolved);
        }

        if let Some(edm_name) = element.strip_prefix(EDM_PREFIX) {
            let primitive = EdmPrimitive::from_edm_name(edm_name);
            if primitive == EdmPrimitive::Other {
                debug!(token, "unmapped primitive type, falling back to string");
            }
            let (type_name, import) = map_primitive(primitive, self.big_number_as_string);
            return Ok(ResolvedType {
                data_type: DataType::Primitive(primitive),
                is_collection,
                type_name: type_name.to_string(),
                import,
            });
        }

        Err(Error::schema(
            token,
            format!(
                "Not 'Collection(...)', not a type of the service namespaces [{}], not OData type '{EDM_PREFIX}*' ({} metadata)",
                self.naming.namespaces().join(", "),
                self.version
            ),
        ))
    }
}

/// TS type of a primitive, plus the wrapper type it has to import.
pub fn map_primitive(
    primitive: EdmPrimitive,
    big_number_as_string: bool,
) -> (&'static str, Option<WrapperType>) {
    match primitive {
        EdmPrimitive::Boolean => ("boolean", None),
        p if p.is_big_number() && big_number_as_string => ("string", None),
        p if p.is_numeric() => ("number", None),
        EdmPrimitive::Date => ("DateString", Some(WrapperType::DateString)),
        EdmPrimitive::TimeOfDay | EdmPrimitive::Time => {
            ("TimeOfDayString", Some(WrapperType::TimeOfDayString))
        }
        EdmPrimitive::DateTimeOffset | EdmPrimitive::DateTime => {
            ("DateTimeOffsetString", Some(WrapperType::DateTimeOffsetString))
        }
        EdmPrimitive::Binary => ("BinaryString", Some(WrapperType::BinaryString)),
        EdmPrimitive::Guid => ("GuidString", Some(WrapperType::GuidString)),
        _ => ("string", None),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use odata2ts_common::RunOptions;

    fn naming() -> NamingHelper {
        NamingHelper::new(&RunOptions::default(), "Tester", &["Tester".to_string()])
    }

    fn enums() -> HashMap<String, String> {
        HashMap::from([("Feature".to_string(), "Feature".to_string())])
    }

    #[test]
    fn test_primitive_table() {
        let cases = [
            ("Edm.Boolean", "boolean", None),
            ("Edm.Byte", "number", None),
            ("Edm.Int32", "number", None),
            ("Edm.Int64", "number", None),
            ("Edm.Decimal", "number", None),
            ("Edm.Single", "number", None),
            ("Edm.String", "string", None),
            ("Edm.Date", "DateString", Some(WrapperType::DateString)),
            ("Edm.TimeOfDay", "TimeOfDayString", Some(WrapperType::TimeOfDayString)),
            (
                "Edm.DateTimeOffset",
                "DateTimeOffsetString",
                Some(WrapperType::DateTimeOffsetString),
            ),
            ("Edm.Binary", "BinaryString", Some(WrapperType::BinaryString)),
            ("Edm.Guid", "GuidString", Some(WrapperType::GuidString)),
            ("Edm.GeographyPoint", "string", None),
        ];

        let naming = naming();
        let enums = enums();
        let resolver = TypeResolver::new(&naming, &enums, ODataVersion::V4, false);
        for (token, ts, import) in cases {
            let resolved = resolver.resolve(token).unwrap();
            assert_eq!(resolved.type_name, ts, "{token}");
            assert_eq!(resolved.import, import, "{token}");
            assert!(!resolved.is_collection);
        }
    }

    #[test]
    fn test_big_number_as_string() {
        let naming = naming();
        let enums = enums();
        let resolver = TypeResolver::new(&naming, &enums, ODataVersion::V4, true);
        assert_eq!(resolver.resolve("Edm.Int64").unwrap().type_name, "string");
        assert_eq!(resolver.resolve("Edm.Decimal").unwrap().type_name, "string");
        assert_eq!(resolver.resolve("Edm.Int32").unwrap().type_name, "number");
    }

    #[test]
    fn test_collection_resolves_like_element() {
        let naming = naming();
        let enums = enums();
        let resolver = TypeResolver::new(&naming, &enums, ODataVersion::V4, false);

        let element = resolver.resolve("Tester.Person").unwrap();
        let collection = resolver.resolve("Collection(Tester.Person)").unwrap();
        assert!(collection.is_collection);
        assert_eq!(element.data_type, collection.data_type);
        assert_eq!(element.type_name, collection.type_name);
        assert_eq!(collection.data_type, DataType::ModelType);
    }

    #[test]
    fn test_registered_enum_wins() {
        let naming = naming();
        let enums = enums();
        let resolver = TypeResolver::new(&naming, &enums, ODataVersion::V4, false);
        let resolved = resolver.resolve("Collection(Tester.Feature)").unwrap();
        assert_eq!(resolved.data_type, DataType::EnumType);
        assert_eq!(resolved.type_name, "Feature");
    }

    #[test]
    fn test_unknown_token_is_schema_error() {
        let naming = naming();
        let enums = enums();
        let resolver = TypeResolver::new(&naming, &enums, ODataVersion::V2, false);
        let err = resolver.resolve("Other.Thing").unwrap_err();
        assert!(matches!(err, Error::Schema { ref identifier, .. } if identifier == "Other.Thing"));
    }
}
