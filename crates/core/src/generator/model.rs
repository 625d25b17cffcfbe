//! Model family: read interfaces, editable interfaces, key types, enums and
//! operation parameter interfaces.

use odata2ts_common::RunOptions;
use tracing::debug;

use super::{Artifact, ArtifactFamily, ArtifactSource, ImportCollector, ODATA_CORE};
use super::{id_type_name, params_type_name};
use crate::error::Result;
use crate::ir::{BindingKey, DataModel, DataType, EnumType, ModelType, PropertyModel};
use crate::naming::NamingHelper;
use crate::ts::{
    TsDecl, TsLiteral, TsModule, TsPrimitive, TsProp, TsType, TsTypeDef, TypeDefKind,
};

pub fn generate(
    model: &DataModel,
    naming: &NamingHelper,
    options: &RunOptions,
) -> Result<Vec<Artifact>> {
    let mut artifacts = Vec::new();

    for enum_type in model.enums() {
        artifacts.push(enum_artifact(enum_type, naming));
    }

    for declared in model.models() {
        artifacts.push(model_artifact(model, declared, options)?);
    }

    for (binding, operations) in model.operation_groups() {
        let mut imports = ImportCollector::default();
        let decls: Vec<_> = operations
            .iter()
            .filter(|op| !op.call_parameters().is_empty())
            .map(|op| {
                let properties = op
                    .call_parameters()
                    .iter()
                    .map(|p| read_prop(model, p, &mut imports))
                    .collect();
                TsDecl::TypeDef(TsTypeDef {
                    name: params_type_name(op),
                    kind: TypeDefKind::Interface {
                        extends: Vec::new(),
                        properties,
                    },
                })
            })
            .collect();
        if decls.is_empty() {
            continue;
        }

        let name = match binding {
            BindingKey::Root => "OperationParams".to_string(),
            BindingKey::Bound(model_name) => format!("{model_name}Params"),
        };
        artifacts.push(Artifact {
            name,
            family: ArtifactFamily::Model,
            source: ArtifactSource::OperationGroup(binding.clone()),
            module: TsModule {
                imports: imports.into_imports(),
                decls,
            },
        });
    }

    debug!(artifacts = artifacts.len(), "generated model artifacts");
    Ok(artifacts)
}

fn enum_artifact(enum_type: &EnumType, naming: &NamingHelper) -> Artifact {
    let members = enum_type
        .members
        .iter()
        .map(|m| (naming.enum_member_name(m), TsLiteral::String(m.clone())))
        .collect();

    Artifact {
        name: enum_type.name.clone(),
        family: ArtifactFamily::Model,
        source: ArtifactSource::EnumType(enum_type.name.clone()),
        module: TsModule {
            imports: Vec::new(),
            decls: vec![TsDecl::TypeDef(TsTypeDef {
                name: enum_type.name.clone(),
                kind: TypeDefKind::Enum { members },
            })],
        },
    }
}

fn model_artifact(model: &DataModel, declared: &ModelType, options: &RunOptions) -> Result<Artifact> {
    let mut imports = ImportCollector::default();
    let mut decls = Vec::new();

    if !declared.keys.is_empty() {
        decls.push(TsDecl::TypeDef(id_type(model, declared, &mut imports)?));
    }

    let (props, base) = if options.flatten_base_properties {
        (model.flattened_properties(declared)?, None)
    } else {
        let base = match &declared.base_type {
            Some(base) => Some(model.require_model(base)?),
            None => None,
        };
        (declared.props.iter().collect(), base)
    };

    decls.push(TsDecl::TypeDef(TsTypeDef {
        name: declared.name.clone(),
        kind: TypeDefKind::Interface {
            extends: base.map(|b| TsType::reference(&b.name)).into_iter().collect(),
            properties: props.iter().map(|p| read_prop(model, p, &mut imports)).collect(),
        },
    }));

    if !options.skip_editable_models {
        let properties = props
            .iter()
            .filter(|p| !p.navigation && !p.read_only)
            .map(|p| editable_prop(model, p, &mut imports))
            .collect();
        decls.push(TsDecl::TypeDef(TsTypeDef {
            name: declared.editable_name.clone(),
            kind: TypeDefKind::Interface {
                extends: base
                    .map(|b| TsType::reference(&b.editable_name))
                    .into_iter()
                    .collect(),
                properties,
            },
        }));
    }

    Ok(Artifact {
        name: declared.name.clone(),
        family: ArtifactFamily::Model,
        source: ArtifactSource::ModelType(declared.name.clone()),
        module: TsModule {
            imports: imports.into_imports(),
            decls,
        },
    })
}

/// `export type PersonId = string | { userName: string };`
fn id_type(
    model: &DataModel,
    declared: &ModelType,
    imports: &mut ImportCollector,
) -> Result<TsTypeDef> {
    let keys = model.key_spec(declared)?;
    let structured = TsType::Object(
        keys.iter()
            .map(|k| TsProp {
                name: k.name.clone(),
                ty: element_type(model, k, false, imports),
                optional: false,
            })
            .collect(),
    );

    let ty = match keys.as_slice() {
        [single] => TsType::Union(vec![element_type(model, single, false, imports), structured]),
        _ => structured,
    };

    Ok(TsTypeDef {
        name: id_type_name(model, declared)?.unwrap_or_else(|| format!("{}Id", declared.name)),
        kind: TypeDefKind::TypeAlias { ty },
    })
}

fn read_prop(model: &DataModel, prop: &PropertyModel, imports: &mut ImportCollector) -> TsProp {
    shaped_prop(prop, element_type(model, prop, false, imports))
}

fn editable_prop(model: &DataModel, prop: &PropertyModel, imports: &mut ImportCollector) -> TsProp {
    shaped_prop(prop, element_type(model, prop, true, imports))
}

/// Apply multiplicity and optionality to an element type.
fn shaped_prop(prop: &PropertyModel, element: TsType) -> TsProp {
    let ty = if prop.is_collection {
        TsType::Array(Box::new(element))
    } else if prop.required {
        element
    } else {
        element.nullable()
    };

    TsProp {
        name: prop.name.clone(),
        ty,
        optional: !prop.required,
    }
}

pub(super) fn element_type(
    model: &DataModel,
    prop: &PropertyModel,
    editable: bool,
    imports: &mut ImportCollector,
) -> TsType {
    match prop.data_type {
        DataType::Primitive(_) => {
            if let Some(wrapper) = prop.wrapper {
                imports.type_only(ODATA_CORE, wrapper.as_str());
            }
            match prop.type_name.as_str() {
                "string" => TsType::Primitive(TsPrimitive::String),
                "number" => TsType::Primitive(TsPrimitive::Number),
                "boolean" => TsType::Primitive(TsPrimitive::Boolean),
                other => TsType::reference(other),
            }
        }
        DataType::EnumType => TsType::reference(&prop.type_name),
        DataType::ModelType => match model.model(&prop.type_name) {
            Some(target) if editable => TsType::reference(&target.editable_name),
            _ => TsType::reference(&prop.type_name),
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::ts::Emit;
    use crate::test_support::{TRIPPIN, digest_v4, digest_with};

    fn emitted(artifacts: &[Artifact], name: &str) -> String {
        artifacts
            .iter()
            .find(|a| a.name == name)
            .unwrap()
            .module
            .emit()
    }

    #[test]
    fn test_enum_comes_first() {
        let (model, naming) = digest_v4(TRIPPIN);
        let artifacts = generate(&model, &naming, &RunOptions::default()).unwrap();
        assert_eq!(artifacts[0].source, ArtifactSource::EnumType("PersonGender".into()));
        assert_eq!(
            emitted(&artifacts, "PersonGender"),
            "export enum PersonGender {\n  Male = \"Male\",\n  Female = \"Female\",\n  Unknown = \"Unknown\",\n}\n"
        );
    }

    #[test]
    fn test_person_read_shape() {
        let (model, naming) = digest_v4(TRIPPIN);
        let artifacts = generate(&model, &naming, &RunOptions::default()).unwrap();
        let person = emitted(&artifacts, "Person");

        assert!(person.contains("export type PersonId = string | { userName: string };\n"));
        assert!(person.contains("export interface Person {\n  userName: string;\n"));
        assert!(person.contains("  lastName?: string | null;\n"));
        assert!(person.contains("  gender: PersonGender;\n"));
        assert!(person.contains("  emails?: Array<string>;\n"));
        assert!(person.contains("  homeAddress?: Location | null;\n"));
        assert!(person.contains("  bestFriend?: Person | null;\n"));
        assert!(person.contains("  friends?: Array<Person>;\n"));
    }

    #[test]
    fn test_editable_shape_skips_navigation_and_read_only() {
        let (model, naming) = digest_v4(TRIPPIN);
        let artifacts = generate(&model, &naming, &RunOptions::default()).unwrap();

        let person = emitted(&artifacts, "Person");
        let editable = person.split("export interface EditablePerson").nth(1).unwrap();
        assert!(editable.contains("  homeAddress?: EditableLocation | null;\n"));
        assert!(editable.contains("  addressInfo?: Array<EditableLocation>;\n"));
        assert!(!editable.contains("bestFriend"));

        let trip = emitted(&artifacts, "Trip");
        let editable_trip = trip.split("export interface EditableTrip").nth(1).unwrap();
        assert!(!editable_trip.contains("tripId"));
        assert!(editable_trip.contains("  shareId: GuidString;\n"));
        let imports = &artifacts.iter().find(|a| a.name == "Trip").unwrap().module.imports;
        assert_eq!(imports[0].items, ["DateTimeOffsetString", "GuidString"]);
    }

    #[test]
    fn test_derived_type_extends_base() {
        let (model, naming) = digest_v4(TRIPPIN);
        let artifacts = generate(&model, &naming, &RunOptions::default()).unwrap();
        let employee = emitted(&artifacts, "Employee");
        assert!(!employee.contains("EmployeeId"));
        assert!(employee.contains("export interface Employee extends Person {\n  cost: number;\n"));
        assert!(employee.contains("export interface EditableEmployee extends EditablePerson {\n"));
    }

    #[test]
    fn test_flatten_and_skip_editable() {
        let options = RunOptions {
            flatten_base_properties: true,
            skip_editable_models: true,
            ..RunOptions::default()
        };
        let (model, naming) = digest_with(TRIPPIN, &options);
        let artifacts = generate(&model, &naming, &options).unwrap();
        let employee = emitted(&artifacts, "Employee");
        assert!(employee.contains("export interface Employee {\n  userName: string;\n"));
        assert!(!employee.contains("Editable"));
    }

    #[test]
    fn test_operation_params() {
        let (model, naming) = digest_v4(TRIPPIN);
        let artifacts = generate(&model, &naming, &RunOptions::default()).unwrap();

        let root = artifacts
            .iter()
            .find(|a| a.source == ArtifactSource::OperationGroup(BindingKey::Root))
            .unwrap();
        assert_eq!(
            root.module.emit(),
            "export interface GetNearestAirportParams {\n  lat: number;\n  lon: number;\n}\n"
        );

        let person_ops = emitted(&artifacts, "PersonParams");
        assert!(person_ops.contains("export interface PersonShareTripParams {\n  userName: string;\n  tripId: number;\n}\n"));
    }

    #[test]
    fn test_big_numbers_as_string() {
        let options = RunOptions {
            v4_big_number_as_string: true,
            ..RunOptions::default()
        };
        let (model, naming) = digest_with(TRIPPIN, &options);
        let artifacts = generate(&model, &naming, &options).unwrap();
        assert!(emitted(&artifacts, "Employee").contains("  cost: string;\n"));
    }
}
