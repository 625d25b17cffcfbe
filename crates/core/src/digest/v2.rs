//! OData V2 (and V3) schema adapter.
//!
//! V2 navigation properties name an association and a target role instead
//! of a type; the association end's multiplicity decides between a single
//! entity and a collection. Function imports declare their operation inline
//! and become unbound operations: `POST` imports are actions, everything
//! else is a function.

use std::collections::HashMap;

use odata2ts_common::RunOptions;

use super::{Digester, NavigationDecl, OperationDecl};
use crate::edmx::{Association, FunctionImport, NavigationProperty, Schema};
use crate::error::{Error, LookupKind, Result};
use crate::ir::{DataModel, ODataVersion, OperationKind};
use crate::naming::NamingHelper;

pub(super) fn digest(
    schemas: &[Schema],
    options: &RunOptions,
    naming: &NamingHelper,
) -> Result<DataModel> {
    let mut digester = Digester::new(ODataVersion::V2, options, naming);
    let associations = index_associations(schemas);

    for schema in schemas {
        for enum_type in &schema.enum_types {
            digester.add_enum(enum_type, &schema.namespace)?;
        }
    }

    for schema in schemas {
        for (types, is_entity) in [(&schema.entity_types, true), (&schema.complex_types, false)] {
            for declared in types {
                let navigations = declared
                    .navigation_properties
                    .iter()
                    .map(|nav| navigation_decl(nav, &associations))
                    .collect::<Result<Vec<_>>>()?;
                digester.add_model(declared, &schema.namespace, is_entity, navigations)?;
            }
        }
    }

    for schema in schemas {
        for container in &schema.entity_containers {
            for import in &container.function_imports {
                digester.add_operation(OperationDecl {
                    name: &import.name,
                    namespace: &schema.namespace,
                    kind: import_kind(import),
                    is_bound: false,
                    parameters: &import.parameters,
                    return_type: import.return_type.as_deref().map(|token| (token, None)),
                })?;
            }
        }
    }

    for schema in schemas {
        for container in &schema.entity_containers {
            for set in &container.entity_sets {
                digester.add_entity_set(&set.name, &set.entity_type, &set.navigation_bindings)?;
            }
            for import in &container.function_imports {
                digester.add_operation_import(
                    &import.name,
                    &import.name,
                    import_kind(import),
                    import.entity_set.as_deref(),
                )?;
            }
        }
    }

    digester.finish()
}

fn import_kind(import: &FunctionImport) -> OperationKind {
    match import.http_method.as_deref() {
        Some(method) if method.eq_ignore_ascii_case("POST") => OperationKind::Action,
        _ => OperationKind::Function,
    }
}

/// Associations by namespace- and alias-qualified name.
fn index_associations(schemas: &[Schema]) -> HashMap<String, &Association> {
    let mut index = HashMap::new();
    for schema in schemas {
        for association in &schema.associations {
            index.insert(format!("{}.{}", schema.namespace, association.name), association);
            if let Some(alias) = &schema.alias {
                index.insert(format!("{alias}.{}", association.name), association);
            }
        }
    }
    index
}

fn navigation_decl(
    nav: &NavigationProperty,
    associations: &HashMap<String, &Association>,
) -> Result<NavigationDecl> {
    let relationship = nav
        .relationship
        .as_deref()
        .ok_or_else(|| Error::lookup(LookupKind::Association, &nav.name))?;
    let association = associations
        .get(relationship)
        .ok_or_else(|| Error::lookup(LookupKind::Association, relationship))?;
    let to_role = nav.to_role.as_deref().unwrap_or_default();
    let end = association
        .ends
        .iter()
        .find(|end| end.role == to_role)
        .ok_or_else(|| Error::lookup(LookupKind::Association, format!("{relationship}/{to_role}")))?;

    let (type_token, nullable) = match end.multiplicity.as_str() {
        "*" => (format!("Collection({})", end.type_name), None),
        "1" => (end.type_name.clone(), Some(false)),
        _ => (end.type_name.clone(), None),
    };

    Ok(NavigationDecl {
        name: nav.name.clone(),
        type_token,
        nullable,
    })
}
