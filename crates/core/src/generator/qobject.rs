//! Query-object family.
//!
//! Every model type becomes a `Q*` class of typed path fields. Model-valued
//! fields hand the nested class over as a thunk (`() => QPerson`) so that
//! self-referencing types construct lazily. Operations become
//! `QFunction`/`QAction` classes carrying typed parameter nodes.

use std::collections::HashSet;

use odata2ts_common::RunOptions;
use tracing::debug;

use super::{
    Artifact, ArtifactFamily, ArtifactSource, ImportCollector, QUERY_OBJECTS, local_module,
    params_type_name,
};
use crate::error::{Error, LookupKind, Result};
use crate::ir::{
    BindingKey, DataModel, DataType, EdmPrimitive, EnumType, ModelType, ODataVersion,
    OperationKind, OperationType, PropertyModel,
};
use crate::naming::NamingHelper;
use crate::ts::{
    TsClass, TsClassMember, TsConst, TsDecl, TsExpr, TsField, TsImport, TsLiteral, TsMethod,
    TsModule, TsParam, TsPrimitive, TsStmt, TsType, Visibility,
};

pub fn generate(
    model: &DataModel,
    naming: &NamingHelper,
    options: &RunOptions,
) -> Result<Vec<Artifact>> {
    let mut artifacts = Vec::new();

    for declared in base_first(model)? {
        artifacts.push(model_artifact(model, naming, declared, options)?);
    }

    for enum_type in model.enums() {
        artifacts.push(enum_collection_artifact(naming, enum_type));
    }

    for (binding, operations) in model.operation_groups() {
        let mut imports = ImportCollector::default();
        let decls = operations
            .iter()
            .map(|op| operation_class(model, naming, op, &mut imports).map(TsDecl::Class))
            .collect::<Result<Vec<_>>>()?;

        let name = match binding {
            BindingKey::Root => "QOperations".to_string(),
            BindingKey::Bound(model_name) => format!("Q{model_name}Operations"),
        };
        artifacts.push(Artifact {
            name,
            family: ArtifactFamily::QueryObject,
            source: ArtifactSource::OperationGroup(binding.clone()),
            module: TsModule {
                imports: imports.into_imports(),
                decls,
            },
        });
    }

    debug!(artifacts = artifacts.len(), "generated query object artifacts");
    Ok(artifacts)
}

/// Models in declaration order, except that a base class always precedes its subclasses.
fn base_first(model: &DataModel) -> Result<Vec<&ModelType>> {
    let mut seen = HashSet::new();
    let mut ordered = Vec::with_capacity(model.models().len());
    for declared in model.models() {
        for entry in model.base_chain(declared)?.into_iter().rev() {
            if seen.insert(entry.name.as_str()) {
                ordered.push(entry);
            }
        }
    }
    Ok(ordered)
}

/// `QFeatureCollection` for enum `Feature`.
pub(crate) fn enum_collection_name(naming: &NamingHelper, enum_type: &EnumType) -> String {
    format!("{}Collection", naming.qobject_name(&enum_type.odata_name))
}

/// Class name stem of the path, collection and param nodes for a primitive.
pub(crate) fn primitive_stem(prop: &PropertyModel, version: ODataVersion) -> &'static str {
    let Some(primitive) = prop.primitive() else {
        return "String";
    };
    match primitive {
        EdmPrimitive::Boolean => "Boolean",
        p if p.is_numeric() && prop.type_name == "string" => "StringNumber",
        p if p.is_numeric() => "Number",
        EdmPrimitive::Date => "Date",
        EdmPrimitive::TimeOfDay => "TimeOfDay",
        EdmPrimitive::DateTimeOffset => "DateTimeOffset",
        EdmPrimitive::Binary => "Binary",
        EdmPrimitive::Guid if version == ODataVersion::V2 => "GuidV2",
        EdmPrimitive::Guid => "Guid",
        EdmPrimitive::DateTime => "DateTimeV2",
        EdmPrimitive::Time => "TimeV2",
        _ => "String",
    }
}

fn with_prefix(odata_name: &str) -> TsExpr {
    TsExpr::this_member("withPrefix").call(vec![TsExpr::string(odata_name)])
}

fn thunk(class_name: &str) -> TsExpr {
    TsExpr::Thunk(Box::new(TsExpr::ident(class_name)))
}

fn readonly_field(name: String, init: TsExpr) -> TsClassMember {
    TsClassMember::Field(TsField {
        visibility: Visibility::Public,
        readonly: true,
        name,
        optional: false,
        ty: None,
        init: Some(init),
    })
}

fn path_field(
    model: &DataModel,
    naming: &NamingHelper,
    prop: &PropertyModel,
    imports: &mut ImportCollector,
) -> Result<TsClassMember> {
    let prefix = with_prefix(&prop.odata_name);
    let (class, args) = match prop.data_type {
        DataType::ModelType => {
            let target = model.require_model(&prop.type_name)?;
            let class = if prop.is_collection {
                "QEntityCollectionPath"
            } else {
                "QEntityPath"
            };
            (class.to_string(), vec![prefix, thunk(&target.qobject_name)])
        }
        DataType::EnumType if prop.is_collection => {
            let collection = model
                .enum_type(&prop.type_name)
                .map(|e| enum_collection_name(naming, e))
                .ok_or_else(|| Error::lookup(LookupKind::EnumType, &prop.type_name))?;
            ("QCollectionPath".to_string(), vec![prefix, thunk(&collection)])
        }
        DataType::EnumType => ("QEnumPath".to_string(), vec![prefix]),
        DataType::Primitive(_) if prop.is_collection => {
            let collection = format!("Q{}Collection", primitive_stem(prop, model.version()));
            imports.value(QUERY_OBJECTS, collection.as_str());
            ("QCollectionPath".to_string(), vec![prefix, thunk(&collection)])
        }
        DataType::Primitive(_) => (
            format!("Q{}Path", primitive_stem(prop, model.version())),
            vec![prefix],
        ),
    };

    imports.value(QUERY_OBJECTS, class.as_str());
    Ok(readonly_field(
        naming.qobject_property_name(&prop.odata_name),
        TsExpr::new_instance(class, args),
    ))
}

fn model_artifact(
    model: &DataModel,
    naming: &NamingHelper,
    declared: &ModelType,
    options: &RunOptions,
) -> Result<Artifact> {
    let mut imports = ImportCollector::default();

    let (props, operations, extends) = if options.flatten_base_properties {
        let chain = model.base_chain(declared)?;
        let operations: Vec<_> = chain
            .iter()
            .flat_map(|m| model.bound_operations(&m.name))
            .collect();
        (model.flattened_properties(declared)?, operations, None)
    } else {
        let base = match &declared.base_type {
            Some(base) => Some(model.require_model(base)?.qobject_name.clone()),
            None => None,
        };
        (
            declared.props.iter().collect(),
            model.bound_operations(&declared.name).iter().collect(),
            base,
        )
    };

    let mut members = props
        .iter()
        .map(|p| path_field(model, naming, p, &mut imports))
        .collect::<Result<Vec<_>>>()?;

    for op in operations {
        members.push(TsClassMember::Method(TsMethod {
            visibility: Visibility::Public,
            name: op.name.clone(),
            params: Vec::new(),
            return_type: None,
            body: vec![TsStmt::Return(Some(TsExpr::new_instance(
                op.qobject_name.as_str(),
                Vec::new(),
            )))],
            is_async: false,
        }));
    }

    let extends = extends.unwrap_or_else(|| {
        imports.value(QUERY_OBJECTS, "QueryObject");
        "QueryObject".to_string()
    });

    let class = TsClass {
        name: declared.qobject_name.clone(),
        type_params: Vec::new(),
        extends: Some(TsType::reference(extends)),
        members,
    };
    let instance = TsConst {
        name: naming.qobject_instance_name(&declared.qobject_name),
        init: TsExpr::new_instance(declared.qobject_name.as_str(), Vec::new()),
    };

    Ok(Artifact {
        name: declared.qobject_name.clone(),
        family: ArtifactFamily::QueryObject,
        source: ArtifactSource::ModelType(declared.name.clone()),
        module: TsModule {
            imports: imports.into_imports(),
            decls: vec![TsDecl::Class(class), TsDecl::Const(instance)],
        },
    })
}

fn enum_collection_artifact(naming: &NamingHelper, enum_type: &EnumType) -> Artifact {
    let name = enum_collection_name(naming, enum_type);
    let class = TsClass {
        name: name.clone(),
        type_params: Vec::new(),
        extends: Some(TsType::reference("QueryObject")),
        members: vec![readonly_field(
            "it".to_string(),
            TsExpr::new_instance("QEnumPath", vec![with_prefix("$it")]),
        )],
    };
    let instance = TsConst {
        name: naming.qobject_instance_name(&name),
        init: TsExpr::new_instance(name.as_str(), Vec::new()),
    };

    Artifact {
        name,
        family: ArtifactFamily::QueryObject,
        source: ArtifactSource::EnumType(enum_type.name.clone()),
        module: TsModule {
            imports: vec![TsImport::new(
                QUERY_OBJECTS,
                vec!["QEnumPath".into(), "QueryObject".into()],
            )],
            decls: vec![TsDecl::Class(class), TsDecl::Const(instance)],
        },
    }
}

fn param_node(
    model: &DataModel,
    param: &PropertyModel,
    imports: &mut ImportCollector,
) -> Result<TsExpr> {
    let mut args = vec![TsExpr::string(&param.odata_name)];
    let class = match param.data_type {
        DataType::ModelType => {
            let target = model.require_model(&param.type_name)?;
            args.push(TsExpr::new_instance(target.qobject_name.as_str(), Vec::new()));
            if param.is_collection {
                "QComplexCollectionParam".to_string()
            } else {
                "QComplexParam".to_string()
            }
        }
        DataType::EnumType if param.is_collection => "QEnumCollectionParam".to_string(),
        DataType::EnumType => "QEnumParam".to_string(),
        DataType::Primitive(_) if param.is_collection => "QPrimitiveCollectionParam".to_string(),
        DataType::Primitive(_) => format!("Q{}Param", primitive_stem(param, model.version())),
    };
    if param.name != param.odata_name {
        args.push(TsExpr::string(&param.name));
    }

    imports.value(QUERY_OBJECTS, class.as_str());
    Ok(TsExpr::new_instance(class, args))
}

fn operation_class(
    model: &DataModel,
    naming: &NamingHelper,
    op: &OperationType,
    imports: &mut ImportCollector,
) -> Result<TsClass> {
    let base = match op.kind {
        OperationKind::Function => "QFunction",
        OperationKind::Action => "QAction",
    };
    imports.value(QUERY_OBJECTS, base);

    let extends = if op.call_parameters().is_empty() {
        TsType::reference(base)
    } else {
        let params_type = params_type_name(op);
        imports.type_only(&local_module(&naming.model_file_name()), params_type.as_str());
        TsType::generic(base, vec![TsType::reference(params_type)])
    };

    let params = op
        .call_parameters()
        .iter()
        .map(|p| param_node(model, p, imports))
        .collect::<Result<Vec<_>>>()?;

    let default_name = if op.is_bound() {
        &op.qualified_name
    } else {
        &op.odata_name
    };

    let mut config = Vec::new();
    if op.is_bound() {
        config.push(("bound".to_string(), TsExpr::Literal(TsLiteral::Bool(true))));
    }
    if model.version() == ODataVersion::V2 {
        config.push(("v2Mode".to_string(), TsExpr::Literal(TsLiteral::Bool(true))));
    }
    let mut super_args = vec![TsExpr::ident("name")];
    if !config.is_empty() {
        super_args.push(TsExpr::Object(config));
    }

    Ok(TsClass {
        name: op.qobject_name.clone(),
        type_params: Vec::new(),
        extends: Some(extends),
        members: vec![
            TsClassMember::Field(TsField {
                visibility: Visibility::Private,
                readonly: true,
                name: "params".to_string(),
                optional: false,
                ty: None,
                init: Some(TsExpr::Array(params)),
            }),
            TsClassMember::Constructor {
                params: vec![TsParam {
                    name: "name".to_string(),
                    ty: Some(TsType::Primitive(TsPrimitive::String)),
                    optional: false,
                    default: Some(TsExpr::string(default_name)),
                }],
                body: vec![TsStmt::Expr(TsExpr::ident("super").call(super_args))],
            },
            TsClassMember::Method(TsMethod {
                visibility: Visibility::Public,
                name: "getParams".to_string(),
                params: Vec::new(),
                return_type: None,
                body: vec![TsStmt::Return(Some(TsExpr::this_member("params")))],
                is_async: false,
            }),
        ],
    })
}
