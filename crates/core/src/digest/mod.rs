//! Digestion of parsed EDMX schemas into a [`DataModel`].
//!
//! Version adapters ([`v4`], [`v2`]) walk their dialect and feed a shared
//! [`Digester`], always in the same order: enum types, then entity and
//! complex types, then operations, then the entity container. Digestion is
//! all-or-nothing; the first error aborts the run.

mod v2;
mod v4;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use odata2ts_common::RunOptions;
use tracing::{debug, info};

use crate::edmx::{self, Edmx, Schema};
use crate::error::{Error, LookupKind, Result};
use crate::ir::{
    BindingKey, DataModel, EntityContainerModel, EntitySetEntry, EnumType, ModelType,
    NavigationBinding, ODataVersion, OperationImport, OperationKind, OperationType, PropertyModel,
    SingletonEntry, WrapperType, find_operation,
};
use crate::naming::{NamingHelper, SymbolScope};
use crate::resolve::{ResolvedType, TypeResolver};

/// Digest one or more metadata documents of the same protocol version.
pub fn digest_documents(
    documents: &[Edmx],
    options: &RunOptions,
) -> Result<(DataModel, NamingHelper)> {
    let mut versions = documents.iter().map(Edmx::odata_version);
    let version = versions
        .next()
        .ok_or_else(|| Error::illegal_state("edmx", "no metadata documents given"))??;
    for other in versions {
        if other? != version {
            return Err(Error::illegal_state(
                "edmx",
                "metadata documents mix OData V2 and V4",
            ));
        }
    }

    let schemas: Vec<Schema> = documents
        .iter()
        .flat_map(|doc| doc.schemas().iter().cloned())
        .collect();
    let naming = NamingHelper::from_schemas(options, &schemas);
    let model = digest(version, &schemas, options, &naming)?;

    Ok((model, naming))
}

/// Digest schemas with the adapter for `version`.
pub fn digest(
    version: ODataVersion,
    schemas: &[Schema],
    options: &RunOptions,
    naming: &NamingHelper,
) -> Result<DataModel> {
    debug!(%version, schemas = schemas.len(), "digesting metadata");
    match version {
        ODataVersion::V4 => v4::digest(schemas, options, naming),
        ODataVersion::V2 => v2::digest(schemas, options, naming),
    }
}

/// Navigation property with its type token already worked out by the adapter.
pub(crate) struct NavigationDecl {
    pub name: String,
    pub type_token: String,
    pub nullable: Option<bool>,
}

pub(crate) struct OperationDecl<'s> {
    pub name: &'s str,
    pub namespace: &'s str,
    pub kind: OperationKind,
    pub is_bound: bool,
    pub parameters: &'s [edmx::Parameter],
    pub return_type: Option<(&'s str, Option<bool>)>,
}

/// Accumulates the data model while a version adapter walks the schemas.
pub(crate) struct Digester<'a> {
    options: &'a RunOptions,
    naming: &'a NamingHelper,
    version: ODataVersion,
    enum_names: HashMap<String, String>,
    enums: Vec<EnumType>,
    models: Vec<ModelType>,
    operations: BTreeMap<BindingKey, Vec<OperationType>>,
    container: EntityContainerModel,
    imports: BTreeSet<WrapperType>,
    type_symbols: SymbolScope,
    operation_symbols: HashMap<BindingKey, SymbolScope>,
    entry_symbols: SymbolScope,
}

impl<'a> Digester<'a> {
    pub(crate) fn new(
        version: ODataVersion,
        options: &'a RunOptions,
        naming: &'a NamingHelper,
    ) -> Self {
        Self {
            options,
            naming,
            version,
            enum_names: HashMap::new(),
            enums: Vec::new(),
            models: Vec::new(),
            operations: BTreeMap::new(),
            container: EntityContainerModel::default(),
            imports: BTreeSet::new(),
            type_symbols: SymbolScope::new("type", "model file"),
            operation_symbols: HashMap::new(),
            entry_symbols: SymbolScope::new("entry point", "main service"),
        }
    }

    fn resolve(&self, token: &str) -> Result<ResolvedType> {
        let big_numbers = self.version == ODataVersion::V4 && self.options.v4_big_number_as_string;
        TypeResolver::new(self.naming, &self.enum_names, self.version, big_numbers).resolve(token)
    }

    pub(crate) fn add_enum(&mut self, enum_type: &edmx::EnumType, namespace: &str) -> Result<()> {
        let name = self.naming.enum_name(&enum_type.name);
        self.type_symbols
            .register(&format!("{namespace}.{}", enum_type.name), &name)?;

        let mut members = SymbolScope::new("enum member", name.as_str());
        for member in &enum_type.members {
            members.register(&member.name, &self.naming.enum_member_name(&member.name))?;
        }

        self.enum_names.insert(enum_type.name.clone(), name.clone());
        self.enums.push(EnumType {
            odata_name: enum_type.name.clone(),
            name,
            members: enum_type.members.iter().map(|m| m.name.clone()).collect(),
        });
        Ok(())
    }

    /// Map a property or parameter and record the wrapper type it needs.
    pub(crate) fn map_property(
        &mut self,
        odata_name: &str,
        type_token: &str,
        nullable: Option<bool>,
    ) -> Result<PropertyModel> {
        let resolved = self.resolve(type_token)?;
        if let Some(import) = resolved.import {
            self.imports.insert(import);
        }

        Ok(PropertyModel {
            odata_name: odata_name.to_string(),
            name: self.naming.property_name(odata_name),
            odata_type: type_token.to_string(),
            data_type: resolved.data_type,
            type_name: resolved.type_name,
            is_collection: resolved.is_collection,
            required: nullable == Some(false),
            navigation: false,
            read_only: false,
            wrapper: resolved.import,
        })
    }

    pub(crate) fn add_model(
        &mut self,
        declared: &edmx::StructuredType,
        namespace: &str,
        is_entity: bool,
        navigations: Vec<NavigationDecl>,
    ) -> Result<()> {
        let qualified_name = format!("{namespace}.{}", declared.name);
        let name = self.naming.model_name(&declared.name);
        self.type_symbols.register(&qualified_name, &name)?;

        let keys = declared.key_names();
        let mut prop_symbols = SymbolScope::new("property", name.as_str());
        let mut props = Vec::with_capacity(
            declared.properties.len() + declared.navigation_properties.len(),
        );

        for property in &declared.properties {
            let mut prop = self.map_property(&property.name, &property.type_name, property.nullable)?;
            prop.read_only = property.is_read_only();
            // key properties can never be null
            prop.required |= keys.contains(&property.name);
            prop_symbols.register(&prop.odata_name, &prop.name)?;
            props.push(prop);
        }

        for navigation in navigations {
            let mut prop =
                self.map_property(&navigation.name, &navigation.type_token, navigation.nullable)?;
            prop.navigation = true;
            prop_symbols.register(&prop.odata_name, &prop.name)?;
            props.push(prop);
        }

        debug!(model = %name, props = props.len(), is_entity, "registered model type");
        self.models.push(ModelType {
            odata_name: declared.name.clone(),
            qualified_name,
            editable_name: self.naming.editable_model_name(&declared.name),
            qobject_name: self.naming.qobject_name(&declared.name),
            name,
            base_type: declared
                .base_type
                .as_deref()
                .map(|base| self.naming.model_name(base)),
            keys,
            props,
            is_entity,
            is_abstract: declared.is_abstract == Some(true),
        });
        Ok(())
    }

    pub(crate) fn add_operation(&mut self, decl: OperationDecl<'_>) -> Result<()> {
        let parameters = decl
            .parameters
            .iter()
            .map(|p| self.map_property(&p.name, &p.type_name, p.nullable))
            .collect::<Result<Vec<_>>>()?;
        let return_type = decl
            .return_type
            .map(|(token, nullable)| self.map_property("ReturnType", token, nullable))
            .transpose()?;

        let (binding, bound_to_collection) = if decl.is_bound {
            let binding_param = parameters.first().ok_or_else(|| {
                Error::illegal_state(
                    decl.name,
                    format!("Operation '{}' is bound, but has no parameters!", decl.name),
                )
            })?;
            (
                BindingKey::Bound(binding_param.type_name.clone()),
                binding_param.is_collection,
            )
        } else {
            (BindingKey::Root, false)
        };

        let name = self
            .naming
            .operation_name(decl.name, decl.kind == OperationKind::Action);
        let qobject_name = match &binding {
            BindingKey::Root => self.naming.qobject_name(decl.name),
            BindingKey::Bound(type_name) => {
                self.naming.qobject_name(&format!("{type_name}_{}", decl.name))
            }
        };
        let qualified_name = format!("{}.{}", decl.namespace, decl.name);

        self.operation_symbols
            .entry(binding.clone())
            .or_insert_with(|| SymbolScope::new("operation", binding.to_string()))
            .register(&qualified_name, &name)?;

        debug!(operation = %name, %binding, kind = %decl.kind, "registered operation");
        self.operations.entry(binding.clone()).or_default().push(OperationType {
            odata_name: decl.name.to_string(),
            qualified_name,
            name,
            qobject_name,
            kind: decl.kind,
            parameters,
            return_type,
            binding,
            bound_to_collection,
        });
        Ok(())
    }

    pub(crate) fn add_entity_set(
        &mut self,
        odata_name: &str,
        entity_type: &str,
        bindings: &[edmx::NavigationPropertyBinding],
    ) -> Result<()> {
        let name = self.naming.entry_point_name(odata_name);
        self.entry_symbols.register(odata_name, &name)?;

        let entry = EntitySetEntry {
            odata_name: odata_name.to_string(),
            name: name.clone(),
            entity_type: self.entry_type_name(entity_type)?,
            navigation_bindings: self.navigation_bindings(bindings),
        };
        self.container.entity_sets.insert(name, entry);
        Ok(())
    }

    pub(crate) fn add_singleton(&mut self, singleton: &edmx::Singleton) -> Result<()> {
        let name = self.naming.entry_point_name(&singleton.name);
        self.entry_symbols.register(&singleton.name, &name)?;

        let entry = SingletonEntry {
            odata_name: singleton.name.clone(),
            name: name.clone(),
            entity_type: self.entry_type_name(&singleton.type_name)?,
            navigation_bindings: self.navigation_bindings(&singleton.navigation_bindings),
        };
        self.container.singletons.insert(name, entry);
        Ok(())
    }

    /// Register an import; `operation_ref` must name an existing unbound operation.
    pub(crate) fn add_operation_import(
        &mut self,
        odata_name: &str,
        operation_ref: &str,
        kind: OperationKind,
        entity_set: Option<&str>,
    ) -> Result<()> {
        let is_action = kind == OperationKind::Action;
        let operation_name = self.naming.operation_name(operation_ref, is_action);
        let operation = find_operation(
            self.operations
                .get(&BindingKey::Root)
                .map(Vec::as_slice)
                .unwrap_or_default(),
            &operation_name,
            kind,
        )?
        .name
        .clone();

        let name = self.naming.entry_point_name(odata_name);
        self.entry_symbols.register(odata_name, &name)?;

        let entry = OperationImport {
            odata_name: odata_name.to_string(),
            name: name.clone(),
            operation,
            kind,
            entity_set: entity_set.map(str::to_string),
        };
        let imports = if is_action {
            &mut self.container.actions
        } else {
            &mut self.container.functions
        };
        imports.insert(name, entry);
        Ok(())
    }

    /// Model name for an entry point's type; the namespace must belong to this service.
    fn entry_type_name(&self, raw: &str) -> Result<String> {
        if self.naming.strip_namespace(raw).is_none() {
            return Err(Error::lookup(LookupKind::ModelType, raw));
        }
        Ok(self.naming.model_name(raw))
    }

    fn navigation_bindings(
        &self,
        bindings: &[edmx::NavigationPropertyBinding],
    ) -> Vec<NavigationBinding> {
        bindings
            .iter()
            .map(|binding| NavigationBinding {
                path: binding
                    .path
                    .split('/')
                    .map(|segment| self.naming.local_name(segment))
                    .collect::<Vec<_>>()
                    .join("/"),
                target: binding.target.clone(),
            })
            .collect()
    }

    /// Seal the model after checking that every reference resolves.
    pub(crate) fn finish(self) -> Result<DataModel> {
        let model_index = self
            .models
            .iter()
            .enumerate()
            .map(|(i, m)| (m.name.clone(), i))
            .collect();
        let enum_index = self
            .enums
            .iter()
            .enumerate()
            .map(|(i, e)| (e.name.clone(), i))
            .collect();

        let model = DataModel {
            version: self.version,
            service_name: self.naming.service_name().to_string(),
            namespaces: self.naming.namespaces().to_vec(),
            models: self.models,
            model_index,
            enums: self.enums,
            enum_index,
            operations: self.operations,
            container: self.container,
            primitive_imports: self.imports,
            converters: self.options.converters.clone(),
        };
        model.validate_closure()?;

        info!(
            version = %model.version,
            models = model.models.len(),
            enums = model.enums.len(),
            operation_groups = model.operations.len(),
            entity_sets = model.container.entity_sets.len(),
            "digested metadata"
        );
        Ok(model)
    }
}
