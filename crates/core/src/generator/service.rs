//! Service family.
//!
//! Per model type an entity service (navigation getters, bound operations)
//! and, for keyed entity types, a collection service; one main service
//! with the container's entry points and unbound operations. Every request
//! goes through the injected `ODataHttpClient`.

use odata2ts_common::RunOptions;
use tracing::debug;

use super::{
    Artifact, ArtifactFamily, ArtifactSource, HTTP_CLIENT_API, ImportCollector, ODATA_SERVICE,
    QUERY_OBJECTS, local_module, params_type_name,
};
use super::qobject::{enum_collection_name, primitive_stem};
use crate::error::{Error, LookupKind, Result};
use crate::ir::{
    DataModel, DataType, EdmPrimitive, ModelType, ODataVersion, OperationKind, OperationType,
    PropertyModel,
};
use crate::naming::{NamingHelper, SymbolScope};
use crate::ts::{
    TsClass, TsClassMember, TsConst, TsDecl, TsExpr, TsField, TsLiteral, TsMethod, TsModule,
    TsParam, TsPrimitive, TsStmt, TsType, TsTypeParam, Visibility,
};

const CLIENT_TYPE: &str = "ClientType";

struct Context<'a> {
    model: &'a DataModel,
    naming: &'a NamingHelper,
    options: &'a RunOptions,
    model_module: String,
    qobject_module: String,
}

impl Context<'_> {
    fn entity_base(&self) -> &'static str {
        match self.model.version() {
            ODataVersion::V4 => "EntityTypeServiceV4",
            ODataVersion::V2 => "EntityTypeServiceV2",
        }
    }

    fn entity_set_base(&self) -> &'static str {
        match self.model.version() {
            ODataVersion::V4 => "EntitySetServiceV4",
            ODataVersion::V2 => "EntitySetServiceV2",
        }
    }

    fn collection_base(&self) -> &'static str {
        match self.model.version() {
            ODataVersion::V4 => "CollectionServiceV4",
            ODataVersion::V2 => "CollectionServiceV2",
        }
    }

    fn editable_name<'m>(&self, declared: &'m ModelType) -> &'m str {
        if self.options.skip_editable_models {
            &declared.name
        } else {
            &declared.editable_name
        }
    }

    /// Collection service for keyed entity types, else none.
    fn collection_service_name(&self, declared: &ModelType) -> Result<Option<String>> {
        if !declared.is_entity || self.model.key_spec(declared)?.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.naming.collection_service_name(&declared.odata_name)))
    }
}

pub fn generate(
    model: &DataModel,
    naming: &NamingHelper,
    options: &RunOptions,
) -> Result<Vec<Artifact>> {
    let ctx = Context {
        model,
        naming,
        options,
        model_module: local_module(&naming.model_file_name()),
        qobject_module: local_module(&naming.qobject_file_name()),
    };
    let mut symbols = SymbolScope::new("service", "service file");
    let mut artifacts = Vec::new();

    for declared in model.models() {
        let mut imports = ImportCollector::default();
        let service_name = naming.service_class_name(&declared.odata_name);
        symbols.register(&declared.qualified_name, &service_name)?;

        let mut decls = vec![TsDecl::Class(entity_service(&ctx, declared, &service_name, &mut imports)?)];
        if let Some(collection_name) = ctx.collection_service_name(declared)? {
            symbols.register(&format!("{}#collection", declared.qualified_name), &collection_name)?;
            decls.push(TsDecl::Class(collection_service(
                &ctx,
                declared,
                &service_name,
                &collection_name,
                &mut imports,
            )?));
        }

        artifacts.push(Artifact {
            name: service_name,
            family: ArtifactFamily::Service,
            source: ArtifactSource::ModelType(declared.name.clone()),
            module: TsModule {
                imports: imports.into_imports(),
                decls,
            },
        });
    }

    let main_name = naming.main_service_name();
    symbols.register(naming.service_name(), &main_name)?;
    artifacts.push(main_service(&ctx, &main_name)?);

    debug!(artifacts = artifacts.len(), "generated service artifacts");
    Ok(artifacts)
}

fn client_type() -> TsType {
    TsType::reference(CLIENT_TYPE)
}

fn client_type_param(imports: &mut ImportCollector) -> TsTypeParam {
    imports.type_only(HTTP_CLIENT_API, "ODataHttpClient");
    TsTypeParam {
        name: CLIENT_TYPE.to_string(),
        constraint: Some(TsType::reference("ODataHttpClient")),
    }
}

fn private_field(name: String, ty: TsType) -> TsClassMember {
    TsClassMember::Field(TsField {
        visibility: Visibility::Private,
        readonly: false,
        name,
        optional: true,
        ty: Some(ty),
        init: None,
    })
}

/// `if (!this._x) { this._x = <init>; }`
fn memoize(field: &str, init: TsExpr) -> TsStmt {
    TsStmt::If {
        cond: TsExpr::Not(Box::new(TsExpr::this_member(field))),
        then_body: vec![TsStmt::Expr(TsExpr::Assign {
            target: Box::new(TsExpr::this_member(field)),
            value: Box::new(init),
        })],
    }
}

fn service_constructor(super_args: Vec<TsExpr>) -> TsClassMember {
    let mut args = vec![
        TsExpr::ident("client"),
        TsExpr::ident("basePath"),
        TsExpr::ident("name"),
    ];
    args.extend(super_args);
    TsClassMember::Constructor {
        params: vec![
            TsParam::new("client", client_type()),
            TsParam::new("basePath", TsType::Primitive(TsPrimitive::String)),
            TsParam::new("name", TsType::Primitive(TsPrimitive::String)),
        ],
        body: vec![TsStmt::Expr(TsExpr::ident("super").call(args))],
    }
}

/// A memoized getter for a nested service.
struct Accessor {
    getter: String,
    field: String,
    ty: TsType,
    init: TsExpr,
}

impl Accessor {
    fn members(self) -> (TsClassMember, TsClassMember) {
        let field = private_field(self.field.clone(), self.ty);
        let getter = TsClassMember::Getter(TsMethod {
            visibility: Visibility::Public,
            name: self.getter,
            params: Vec::new(),
            return_type: None,
            body: vec![
                memoize(&self.field, self.init),
                TsStmt::Return(Some(TsExpr::this_member(&self.field))),
            ],
            is_async: false,
        });
        (field, getter)
    }
}

fn nested_service(class: &str, path: TsExpr, odata_name: &str, extra: Vec<TsExpr>) -> TsExpr {
    let mut args = vec![TsExpr::this_member("client"), path, TsExpr::string(odata_name)];
    args.extend(extra);
    TsExpr::new_instance(class, args)
}

fn get_path() -> TsExpr {
    TsExpr::this_member("getPath").call(Vec::new())
}

/// Accessor for a navigation, complex or (when enabled) primitive collection property.
fn property_accessor(
    ctx: &Context<'_>,
    prop: &PropertyModel,
    imports: &mut ImportCollector,
) -> Result<Option<Accessor>> {
    let getter = ctx.naming.related_service_getter(&prop.odata_name);
    let field = ctx.naming.private_prop_name(&prop.odata_name);
    let collection_base = ctx.collection_base();

    let (ty, init) = match prop.data_type {
        DataType::ModelType => {
            let target = ctx.model.require_model(&prop.type_name)?;
            let keyed_collection = if prop.is_collection {
                ctx.collection_service_name(target)?
            } else {
                None
            };

            match keyed_collection {
                Some(collection) => (
                    TsType::generic(&collection, vec![client_type()]),
                    nested_service(&collection, get_path(), &prop.odata_name, Vec::new()),
                ),
                None if !prop.is_collection => {
                    let service = ctx.naming.service_class_name(&target.odata_name);
                    (
                        TsType::generic(&service, vec![client_type()]),
                        nested_service(&service, get_path(), &prop.odata_name, Vec::new()),
                    )
                }
                None => {
                    let instance = ctx.naming.qobject_instance_name(&target.qobject_name);
                    imports.value(ODATA_SERVICE, collection_base);
                    imports.type_only(&ctx.model_module, target.name.as_str());
                    imports.type_only(&ctx.model_module, ctx.editable_name(target));
                    imports.value(&ctx.qobject_module, target.qobject_name.as_str());
                    imports.value(&ctx.qobject_module, instance.as_str());
                    (
                        TsType::generic(
                            collection_base,
                            vec![
                                client_type(),
                                TsType::reference(&target.name),
                                TsType::reference(&target.qobject_name),
                                TsType::reference(ctx.editable_name(target)),
                            ],
                        ),
                        nested_service(
                            collection_base,
                            get_path(),
                            &prop.odata_name,
                            vec![TsExpr::ident(instance)],
                        ),
                    )
                }
            }
        }
        DataType::EnumType if prop.is_collection && ctx.options.enable_primitive_property_services => {
            let enum_type = ctx
                .model
                .enum_type(&prop.type_name)
                .ok_or_else(|| Error::lookup(LookupKind::EnumType, &prop.type_name))?;
            let qcollection = enum_collection_name(ctx.naming, enum_type);
            let instance = ctx.naming.qobject_instance_name(&qcollection);
            imports.value(ODATA_SERVICE, collection_base);
            imports.type_only(&ctx.model_module, enum_type.name.as_str());
            imports.value(&ctx.qobject_module, qcollection.as_str());
            imports.value(&ctx.qobject_module, instance.as_str());
            (
                TsType::generic(
                    collection_base,
                    vec![
                        client_type(),
                        TsType::reference(&enum_type.name),
                        TsType::reference(&qcollection),
                    ],
                ),
                nested_service(collection_base, get_path(), &prop.odata_name, vec![TsExpr::ident(instance)]),
            )
        }
        DataType::Primitive(_) if prop.is_collection && ctx.options.enable_primitive_property_services => {
            let qcollection = format!("Q{}Collection", primitive_stem(prop, ctx.model.version()));
            let instance = ctx.naming.qobject_instance_name(&qcollection);
            let element = super::model::element_type(ctx.model, prop, false, imports);
            imports.value(ODATA_SERVICE, collection_base);
            imports.value(QUERY_OBJECTS, qcollection.as_str());
            imports.value(QUERY_OBJECTS, instance.as_str());
            (
                TsType::generic(
                    collection_base,
                    vec![client_type(), element, TsType::reference(&qcollection)],
                ),
                nested_service(collection_base, get_path(), &prop.odata_name, vec![TsExpr::ident(instance)]),
            )
        }
        _ => return Ok(None),
    };

    Ok(Some(Accessor {
        getter,
        field,
        ty,
        init,
    }))
}

/// Response payload type of an operation.
fn response_type(ctx: &Context<'_>, op: &OperationType, imports: &mut ImportCollector) -> TsType {
    let Some(ret) = &op.return_type else {
        return TsType::Primitive(TsPrimitive::Void);
    };
    let element = super::model::element_type(ctx.model, ret, false, imports);
    if matches!(ret.data_type, DataType::ModelType | DataType::EnumType) {
        imports.type_only(&ctx.model_module, ret.type_name.as_str());
    }
    if ret.is_collection {
        TsType::Array(Box::new(element))
    } else {
        element
    }
}

/// Memo field plus async method calling an operation through its query object.
fn operation_members(
    ctx: &Context<'_>,
    op: &OperationType,
    method_name: &str,
    url_name: Option<&str>,
    imports: &mut ImportCollector,
) -> (TsClassMember, TsClassMember) {
    let field = ctx.naming.private_prop_name(&op.qobject_name);
    imports.value(&ctx.qobject_module, op.qobject_name.as_str());
    imports.type_only(HTTP_CLIENT_API, "ODataHttpClientConfig");
    imports.type_only(HTTP_CLIENT_API, "ODataResponse");

    let has_params = !op.call_parameters().is_empty();
    let mut params = Vec::new();
    if has_params {
        let params_type = params_type_name(op);
        imports.type_only(&ctx.model_module, params_type.as_str());
        params.push(TsParam::new("params", TsType::reference(params_type)));
    }
    params.push(
        TsParam::new(
            "requestConfig",
            TsType::generic("ODataHttpClientConfig", vec![client_type()]),
        )
        .optional(),
    );

    let qobject = TsExpr::this_member(&field);
    let params_arg = || {
        if has_params {
            vec![TsExpr::ident("params")]
        } else {
            Vec::new()
        }
    };
    let ctor_args = url_name.map(|n| vec![TsExpr::string(n)]).unwrap_or_default();

    let (url_args, call) = match op.kind {
        OperationKind::Function => (
            params_arg(),
            TsExpr::this_member("client").member("get").call(vec![
                TsExpr::ident("url"),
                TsExpr::ident("requestConfig"),
            ]),
        ),
        OperationKind::Action => {
            let body = if has_params {
                qobject.clone().member("buildBody").call(params_arg())
            } else {
                TsExpr::Object(Vec::new())
            };
            (
                Vec::new(),
                TsExpr::this_member("client").member("post").call(vec![
                    TsExpr::ident("url"),
                    body,
                    TsExpr::ident("requestConfig"),
                ]),
            )
        }
    };

    let body = vec![
        memoize(&field, TsExpr::new_instance(op.qobject_name.as_str(), ctor_args)),
        TsStmt::Const {
            name: "url".to_string(),
            init: TsExpr::this_member("addFullPath")
                .call(vec![qobject.member("buildUrl").call(url_args)]),
        },
        TsStmt::Return(Some(call)),
    ];

    let method = TsClassMember::Method(TsMethod {
        visibility: Visibility::Public,
        name: method_name.to_string(),
        params,
        return_type: Some(TsType::generic(
            "ODataResponse",
            vec![response_type(ctx, op, imports)],
        )),
        body,
        is_async: true,
    });
    (private_field(field, TsType::reference(&op.qobject_name)), method)
}

/// Fields first, then the constructor, getters and methods.
fn class_members(
    fields: Vec<TsClassMember>,
    constructor: TsClassMember,
    rest: Vec<TsClassMember>,
) -> Vec<TsClassMember> {
    let mut members = fields;
    members.push(constructor);
    members.extend(rest);
    members
}

fn entity_service(
    ctx: &Context<'_>,
    declared: &ModelType,
    service_name: &str,
    imports: &mut ImportCollector,
) -> Result<TsClass> {
    let base = ctx.entity_base();
    let qinstance = ctx.naming.qobject_instance_name(&declared.qobject_name);
    imports.value(ODATA_SERVICE, base);
    imports.type_only(&ctx.model_module, declared.name.as_str());
    imports.type_only(&ctx.model_module, ctx.editable_name(declared));
    imports.value(&ctx.qobject_module, declared.qobject_name.as_str());
    imports.value(&ctx.qobject_module, qinstance.as_str());

    let mut fields = Vec::new();
    let mut getters = Vec::new();
    for prop in ctx.model.flattened_properties(declared)? {
        if let Some(accessor) = property_accessor(ctx, prop, imports)? {
            let (field, getter) = accessor.members();
            fields.push(field);
            getters.push(getter);
        }
    }

    for op in ctx.model.inherited_bound_operations(declared, false)? {
        let (field, method) = operation_members(ctx, op, &op.name, None, imports);
        fields.push(field);
        getters.push(method);
    }

    Ok(TsClass {
        name: service_name.to_string(),
        type_params: vec![client_type_param(imports)],
        extends: Some(TsType::generic(
            base,
            vec![
                client_type(),
                TsType::reference(&declared.name),
                TsType::reference(ctx.editable_name(declared)),
                TsType::reference(&declared.qobject_name),
            ],
        )),
        members: class_members(
            fields,
            service_constructor(vec![TsExpr::ident(qinstance)]),
            getters,
        ),
    })
}

/// Keys rendered without quotes.
fn is_literal_key(prop: &PropertyModel, version: ODataVersion) -> bool {
    let Some(primitive) = prop.primitive() else {
        return false;
    };
    match version {
        ODataVersion::V4 => {
            primitive.is_numeric()
                || matches!(
                    primitive,
                    EdmPrimitive::Boolean
                        | EdmPrimitive::Guid
                        | EdmPrimitive::Date
                        | EdmPrimitive::DateTimeOffset
                        | EdmPrimitive::TimeOfDay
                )
        }
        ODataVersion::V2 => {
            (primitive.is_numeric() && !primitive.is_big_number())
                || primitive == EdmPrimitive::Boolean
        }
    }
}

fn key_type(prop: &PropertyModel) -> &'static str {
    match prop.type_name.as_str() {
        "number" => "number",
        "boolean" => "boolean",
        _ => "string",
    }
}

fn collection_service(
    ctx: &Context<'_>,
    declared: &ModelType,
    service_name: &str,
    collection_name: &str,
    imports: &mut ImportCollector,
) -> Result<TsClass> {
    let base = ctx.entity_set_base();
    let qinstance = ctx.naming.qobject_instance_name(&declared.qobject_name);
    let id_type = super::id_type_name(ctx.model, declared)?
        .ok_or_else(|| Error::lookup(LookupKind::KeyProperty, &declared.name))?;
    imports.value(ODATA_SERVICE, base);
    imports.type_only(&ctx.model_module, id_type.as_str());

    let key_spec = ctx
        .model
        .key_spec(declared)?
        .into_iter()
        .map(|key| {
            TsExpr::Object(vec![
                (
                    "isLiteral".to_string(),
                    TsExpr::Literal(TsLiteral::Bool(is_literal_key(key, ctx.model.version()))),
                ),
                ("type".to_string(), TsExpr::string(key_type(key))),
                ("name".to_string(), TsExpr::string(&key.name)),
                ("odataName".to_string(), TsExpr::string(&key.odata_name)),
            ])
        })
        .collect();

    let get = TsClassMember::Method(TsMethod {
        visibility: Visibility::Public,
        name: "get".to_string(),
        params: vec![TsParam::new("id", TsType::reference(&id_type))],
        return_type: None,
        body: vec![TsStmt::Return(Some(TsExpr::new_instance(
            service_name,
            vec![
                TsExpr::this_member("client"),
                TsExpr::this_member("basePath"),
                TsExpr::this_member("createKeyedName").call(vec![TsExpr::ident("id")]),
            ],
        )))],
        is_async: false,
    });

    let mut fields = Vec::new();
    let mut methods = vec![get];
    for op in ctx.model.inherited_bound_operations(declared, true)? {
        let (field, method) = operation_members(ctx, op, &op.name, None, imports);
        fields.push(field);
        methods.push(method);
    }

    Ok(TsClass {
        name: collection_name.to_string(),
        type_params: vec![client_type_param(imports)],
        extends: Some(TsType::generic(
            base,
            vec![
                client_type(),
                TsType::reference(&declared.name),
                TsType::reference(ctx.editable_name(declared)),
                TsType::reference(&declared.qobject_name),
                TsType::reference(&id_type),
            ],
        )),
        members: class_members(
            fields,
            service_constructor(vec![TsExpr::ident(qinstance), TsExpr::Array(key_spec)]),
            methods,
        ),
    })
}

fn main_service(ctx: &Context<'_>, main_name: &str) -> Result<Artifact> {
    let mut imports = ImportCollector::default();
    imports.value(ODATA_SERVICE, "ODataService");
    let container = ctx.model.container();

    let mut fields = Vec::new();
    let mut members = Vec::new();

    let entry_points = container
        .entity_sets
        .values()
        .map(|set| (&set.odata_name, &set.entity_type, true))
        .chain(
            container
                .singletons
                .values()
                .map(|s| (&s.odata_name, &s.entity_type, false)),
        );
    for (odata_name, entity_type, is_set) in entry_points {
        let target = ctx.model.require_model(entity_type)?;
        let class = match ctx.collection_service_name(target)? {
            Some(collection) if is_set => collection,
            _ => ctx.naming.service_class_name(&target.odata_name),
        };
        let (field, getter) = Accessor {
            getter: ctx.naming.entry_point_name(odata_name),
            field: ctx.naming.private_prop_name(odata_name),
            ty: TsType::generic(&class, vec![client_type()]),
            init: nested_service(&class, TsExpr::this_member("basePath"), odata_name, Vec::new()),
        }
        .members();
        fields.push(field);
        members.push(getter);
    }

    for import in container.functions.values().chain(container.actions.values()) {
        let op = ctx.model.root_operation(&import.operation, import.kind)?;
        let (field, method) =
            operation_members(ctx, op, &import.name, Some(import.odata_name.as_str()), &mut imports);
        fields.push(field);
        members.push(method);
    }

    let class = TsClass {
        name: main_name.to_string(),
        type_params: vec![client_type_param(&mut imports)],
        extends: Some(TsType::generic("ODataService", vec![client_type()])),
        members: fields.into_iter().chain(members).collect(),
    };

    let mut decls = vec![TsDecl::Class(class)];
    let converters = ctx.model.converters();
    if !converters.is_empty() {
        let mut names = Vec::new();
        for declaration in converters {
            for converter in &declaration.converters {
                imports.value(&declaration.module, converter.as_str());
                names.push(TsExpr::ident(converter));
            }
        }
        decls.push(TsDecl::Const(TsConst {
            name: "converters".to_string(),
            init: TsExpr::Array(names),
        }));
    }

    Ok(Artifact {
        name: main_name.to_string(),
        family: ArtifactFamily::Service,
        source: ArtifactSource::MainService,
        module: TsModule {
            imports: imports.into_imports(),
            decls,
        },
    })
}
