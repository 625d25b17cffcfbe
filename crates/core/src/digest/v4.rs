//! OData V4 schema adapter.

use odata2ts_common::RunOptions;

use super::{Digester, NavigationDecl, OperationDecl};
use crate::edmx::{Operation, Schema};
use crate::error::{Error, Result};
use crate::ir::{DataModel, ODataVersion, OperationKind};
use crate::naming::NamingHelper;

pub(super) fn digest(
    schemas: &[Schema],
    options: &RunOptions,
    naming: &NamingHelper,
) -> Result<DataModel> {
    let mut digester = Digester::new(ODataVersion::V4, options, naming);

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
                    .map(|nav| {
                        let type_token = nav.type_name.clone().ok_or_else(|| {
                            Error::schema(
                                format!("{}/{}", declared.name, nav.name),
                                "navigation property without a Type attribute",
                            )
                        })?;
                        Ok(NavigationDecl {
                            name: nav.name.clone(),
                            type_token,
                            nullable: nav.nullable,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                digester.add_model(declared, &schema.namespace, is_entity, navigations)?;
            }
        }
    }

    for schema in schemas {
        for (operations, kind) in [
            (&schema.functions, OperationKind::Function),
            (&schema.actions, OperationKind::Action),
        ] {
            for operation in operations {
                digester.add_operation(operation_decl(operation, &schema.namespace, kind)?)?;
            }
        }
    }

    for schema in schemas {
        for container in &schema.entity_containers {
            for set in &container.entity_sets {
                digester.add_entity_set(&set.name, &set.entity_type, &set.navigation_bindings)?;
            }
            for singleton in &container.singletons {
                digester.add_singleton(singleton)?;
            }
            for import in &container.function_imports {
                let function = import.function.as_deref().ok_or_else(|| {
                    Error::schema(&import.name, "function import without a Function attribute")
                })?;
                digester.add_operation_import(
                    &import.name,
                    function,
                    OperationKind::Function,
                    import.entity_set.as_deref(),
                )?;
            }
            for import in &container.action_imports {
                digester.add_operation_import(
                    &import.name,
                    &import.action,
                    OperationKind::Action,
                    import.entity_set.as_deref(),
                )?;
            }
        }
    }

    digester.finish()
}

fn operation_decl<'s>(
    operation: &'s Operation,
    namespace: &'s str,
    kind: OperationKind,
) -> Result<OperationDecl<'s>> {
    let return_type = match operation.return_types.as_slice() {
        [] => None,
        [single] => Some((single.type_name.as_str(), single.nullable)),
        _ => {
            return Err(Error::schema(
                &operation.name,
                "an operation declares at most one ReturnType",
            ));
        }
    };

    Ok(OperationDecl {
        name: &operation.name,
        namespace,
        kind,
        is_bound: operation.is_bound == Some(true),
        parameters: &operation.parameters,
        return_type,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use crate::ir::{ContainerTarget, DataType, EdmPrimitive, OperationKind};
    use crate::test_support::{TRIPPIN, digest_v4};

    #[test]
    fn test_trippin_models() {
        let (model, _) = digest_v4(TRIPPIN);
        let names: Vec<_> = model.models().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "Person", "Employee", "Airline", "Airport", "Trip", "Location", "AirportLocation",
                "City"
            ]
        );

        let person = model.require_model("Person").unwrap();
        assert!(person.is_entity);
        assert_eq!(person.keys, ["UserName"]);

        let emails = person.props.iter().find(|p| p.name == "emails").unwrap();
        assert!(emails.is_collection);
        assert_eq!(emails.data_type, DataType::Primitive(EdmPrimitive::String));

        let friends = person.props.iter().find(|p| p.name == "friends").unwrap();
        assert!(friends.navigation);
        assert!(friends.is_collection);
        assert_eq!(friends.type_name, "Person");

        let employee = model.require_model("Employee").unwrap();
        assert_eq!(employee.base_type.as_deref(), Some("Person"));
        assert!(employee.keys.is_empty());
    }

    #[test]
    fn test_trippin_container() {
        let (model, _) = digest_v4(TRIPPIN);
        let container = model.container();

        let people = &container.entity_sets["people"];
        assert_eq!(people.odata_name, "People");
        assert_eq!(people.entity_type, "Person");
        assert_eq!(people.navigation_bindings[0].path, "Friends");

        let me = &container.singletons["me"];
        assert_eq!(me.entity_type, "Person");

        let nearest = &container.functions["getNearestAirport"];
        assert_eq!(nearest.operation, "getNearestAirport");
        assert_eq!(nearest.entity_set.as_deref(), Some("Airports"));

        let reset = &container.actions["resetDataSource"];
        assert_eq!(reset.kind, OperationKind::Action);
    }

    #[test]
    fn test_type_cast_segment_stripped_from_binding_path() {
        let (model, _) = digest_v4(TRIPPIN);
        let airports = &model.container().entity_sets["airports"];
        let binding = airports
            .navigation_bindings
            .iter()
            .find(|b| b.target == "Airlines")
            .unwrap();
        assert_eq!(binding.path, "Location/AirportLocation/Airline");
        assert!(matches!(
            model.resolve_navigation_target(&binding.target).unwrap(),
            ContainerTarget::EntitySet(_)
        ));
    }

    #[test]
    fn test_multiple_return_types_rejected() {
        let xml = r#"<Edmx Version="4.0"><DataServices><Schema Namespace="T">
<Function Name="Twice"><ReturnType Type="Edm.String" /><ReturnType Type="Edm.Int32" /></Function>
</Schema></DataServices></Edmx>"#;
        let edmx = crate::edmx::Edmx::from_xml(xml).unwrap();
        let result = super::super::digest_documents(&[edmx], &Default::default());
        assert!(matches!(result, Err(crate::Error::Schema { .. })));
    }
}
