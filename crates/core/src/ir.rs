//! Version-independent data model built from EDMX metadata.
//!
//! The digesters in [`crate::digest`] produce one [`DataModel`] per run.
//! It is immutable once built: generators and the runtime façades only read
//! it, and the derived views below (inherited properties, key specs,
//! navigation targets) are computed on demand from the stored entries.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;

use odata2ts_common::ConverterDeclaration;

use crate::error::{Error, LookupKind, Result};

/// Prefix of every primitive type token.
pub const EDM_PREFIX: &str = "Edm.";

/// Display label of the binding key of unbound operations.
pub const ROOT_OPERATION: &str = "/";

/// Protocol dialect of the source metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ODataVersion {
    V2,
    V4,
}

impl fmt::Display for ODataVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ODataVersion::V2 => f.write_str("V2"),
            ODataVersion::V4 => f.write_str("V4"),
        }
    }
}

/// Primitive `Edm.*` type kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EdmPrimitive {
    Boolean,
    Byte,
    SByte,
    Int16,
    Int32,
    Int64,
    Decimal,
    Double,
    Single,
    String,
    Date,
    TimeOfDay,
    DateTimeOffset,
    /// V2 only.
    DateTime,
    /// V2 only.
    Time,
    Duration,
    Binary,
    Guid,
    Stream,
    /// Anything not listed above.
    Other,
}

impl EdmPrimitive {
    /// Kind for a type name with the `Edm.` prefix already removed.
    pub fn from_edm_name(name: &str) -> Self {
        match name {
            "Boolean" => EdmPrimitive::Boolean,
            "Byte" => EdmPrimitive::Byte,
            "SByte" => EdmPrimitive::SByte,
            "Int16" => EdmPrimitive::Int16,
            "Int32" => EdmPrimitive::Int32,
            "Int64" => EdmPrimitive::Int64,
            "Decimal" => EdmPrimitive::Decimal,
            "Double" => EdmPrimitive::Double,
            "Single" => EdmPrimitive::Single,
            "String" => EdmPrimitive::String,
            "Date" => EdmPrimitive::Date,
            "TimeOfDay" => EdmPrimitive::TimeOfDay,
            "DateTimeOffset" => EdmPrimitive::DateTimeOffset,
            "DateTime" => EdmPrimitive::DateTime,
            "Time" => EdmPrimitive::Time,
            "Duration" => EdmPrimitive::Duration,
            "Binary" => EdmPrimitive::Binary,
            "Guid" => EdmPrimitive::Guid,
            "Stream" => EdmPrimitive::Stream,
            _ => EdmPrimitive::Other,
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            EdmPrimitive::Byte
                | EdmPrimitive::SByte
                | EdmPrimitive::Int16
                | EdmPrimitive::Int32
                | EdmPrimitive::Int64
                | EdmPrimitive::Decimal
                | EdmPrimitive::Double
                | EdmPrimitive::Single
        )
    }

    /// Numbers that lose precision as JS numbers.
    pub fn is_big_number(self) -> bool {
        matches!(self, EdmPrimitive::Int64 | EdmPrimitive::Decimal)
    }
}

/// Branded string types imported by generated models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WrapperType {
    DateString,
    TimeOfDayString,
    DateTimeOffsetString,
    BinaryString,
    GuidString,
}

impl WrapperType {
    pub fn as_str(self) -> &'static str {
        match self {
            WrapperType::DateString => "DateString",
            WrapperType::TimeOfDayString => "TimeOfDayString",
            WrapperType::DateTimeOffsetString => "DateTimeOffsetString",
            WrapperType::BinaryString => "BinaryString",
            WrapperType::GuidString => "GuidString",
        }
    }
}

/// Classification of a resolved type token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Primitive(EdmPrimitive),
    ModelType,
    EnumType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyModel {
    pub odata_name: String,
    pub name: String,
    /// Type token as written in the metadata.
    pub odata_type: String,
    pub data_type: DataType,
    /// Element type: a TS primitive, a wrapper type, a model or an enum name.
    pub type_name: String,
    pub is_collection: bool,
    pub required: bool,
    pub navigation: bool,
    /// Server-computed or immutable; excluded from editable shapes.
    pub read_only: bool,
    pub wrapper: Option<WrapperType>,
}

impl PropertyModel {
    pub fn primitive(&self) -> Option<EdmPrimitive> {
        match self.data_type {
            DataType::Primitive(p) => Some(p),
            _ => None,
        }
    }

    pub fn is_model(&self) -> bool {
        self.data_type == DataType::ModelType
    }
}

/// Entity or complex type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelType {
    pub odata_name: String,
    /// Namespace-qualified name as declared.
    pub qualified_name: String,
    pub name: String,
    pub editable_name: String,
    pub qobject_name: String,
    /// Generated name of the base type.
    pub base_type: Option<String>,
    /// Key property OData names declared on this type itself.
    pub keys: Vec<String>,
    pub props: Vec<PropertyModel>,
    pub is_entity: bool,
    pub is_abstract: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    pub odata_name: String,
    pub name: String,
    pub members: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OperationKind {
    Function,
    Action,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Function => f.write_str("function"),
            OperationKind::Action => f.write_str("action"),
        }
    }
}

/// Grouping key of operations: the root group or the bound type's name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BindingKey {
    Root,
    Bound(String),
}

impl fmt::Display for BindingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingKey::Root => f.write_str(ROOT_OPERATION),
            BindingKey::Bound(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationType {
    pub odata_name: String,
    /// Namespace-qualified name; bound calls address the operation by it.
    pub qualified_name: String,
    pub name: String,
    pub qobject_name: String,
    pub kind: OperationKind,
    /// Declared parameters, including the binding parameter of bound operations.
    pub parameters: Vec<PropertyModel>,
    pub return_type: Option<PropertyModel>,
    pub binding: BindingKey,
    /// Bound to `Collection(T)` rather than `T`.
    pub bound_to_collection: bool,
}

impl OperationType {
    /// Parameters a caller supplies: the binding parameter is implicit.
    pub fn call_parameters(&self) -> &[PropertyModel] {
        match self.binding {
            BindingKey::Root => &self.parameters,
            BindingKey::Bound(_) => self.parameters.get(1..).unwrap_or_default(),
        }
    }

    pub fn is_bound(&self) -> bool {
        self.binding != BindingKey::Root
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationBinding {
    /// Navigation path with namespace qualifiers removed.
    pub path: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySetEntry {
    pub odata_name: String,
    pub name: String,
    /// Generated name of the element type.
    pub entity_type: String,
    pub navigation_bindings: Vec<NavigationBinding>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingletonEntry {
    pub odata_name: String,
    pub name: String,
    pub entity_type: String,
    pub navigation_bindings: Vec<NavigationBinding>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationImport {
    pub odata_name: String,
    pub name: String,
    /// Generated name of the root operation this import exposes.
    pub operation: String,
    pub kind: OperationKind,
    pub entity_set: Option<String>,
}

/// Service entry points, keyed by generated name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityContainerModel {
    pub entity_sets: BTreeMap<String, EntitySetEntry>,
    pub singletons: BTreeMap<String, SingletonEntry>,
    pub functions: BTreeMap<String, OperationImport>,
    pub actions: BTreeMap<String, OperationImport>,
}

/// Entity set or singleton a navigation binding points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerTarget<'m> {
    EntitySet(&'m EntitySetEntry),
    Singleton(&'m SingletonEntry),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataModel {
    pub(crate) version: ODataVersion,
    pub(crate) service_name: String,
    pub(crate) namespaces: Vec<String>,
    pub(crate) models: Vec<ModelType>,
    pub(crate) model_index: HashMap<String, usize>,
    pub(crate) enums: Vec<EnumType>,
    pub(crate) enum_index: HashMap<String, usize>,
    pub(crate) operations: BTreeMap<BindingKey, Vec<OperationType>>,
    pub(crate) container: EntityContainerModel,
    pub(crate) primitive_imports: BTreeSet<WrapperType>,
    pub(crate) converters: Vec<ConverterDeclaration>,
}

impl DataModel {
    pub fn version(&self) -> ODataVersion {
        self.version
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Schema namespaces and aliases.
    pub fn namespaces(&self) -> &[String] {
        &self.namespaces
    }

    /// Model types in declaration order.
    pub fn models(&self) -> &[ModelType] {
        &self.models
    }

    pub fn model(&self, name: &str) -> Option<&ModelType> {
        self.model_index.get(name).and_then(|&i| self.models.get(i))
    }

    pub fn require_model(&self, name: &str) -> Result<&ModelType> {
        self.model(name)
            .ok_or_else(|| Error::lookup(LookupKind::ModelType, name))
    }

    pub fn enums(&self) -> &[EnumType] {
        &self.enums
    }

    pub fn enum_type(&self, name: &str) -> Option<&EnumType> {
        self.enum_index.get(name).and_then(|&i| self.enums.get(i))
    }

    /// Operation groups ordered by binding key, root group first.
    pub fn operation_groups(&self) -> impl Iterator<Item = (&BindingKey, &[OperationType])> {
        self.operations.iter().map(|(k, v)| (k, v.as_slice()))
    }

    pub fn operations_for(&self, binding: &BindingKey) -> &[OperationType] {
        self.operations.get(binding).map(Vec::as_slice).unwrap_or_default()
    }

    /// Operations bound to the given model type.
    pub fn bound_operations(&self, model_name: &str) -> &[OperationType] {
        self.operations_for(&BindingKey::Bound(model_name.to_string()))
    }

    /// Operations callable on an instance (or a collection) of `model`,
    /// including those bound to its ancestors.
    pub fn inherited_bound_operations<'m>(
        &'m self,
        model: &'m ModelType,
        collection: bool,
    ) -> Result<Vec<&'m OperationType>> {
        let chain = self.base_chain(model)?;
        Ok(chain
            .iter()
            .flat_map(|m| self.bound_operations(&m.name))
            .filter(|op| op.bound_to_collection == collection)
            .collect())
    }

    /// The unique unbound operation with the given generated name and kind.
    pub fn root_operation(&self, name: &str, kind: OperationKind) -> Result<&OperationType> {
        find_operation(self.operations_for(&BindingKey::Root), name, kind)
    }

    pub fn container(&self) -> &EntityContainerModel {
        &self.container
    }

    /// Every wrapper type referenced anywhere in the model.
    pub fn primitive_imports(&self) -> &BTreeSet<WrapperType> {
        &self.primitive_imports
    }

    pub fn converters(&self) -> &[ConverterDeclaration] {
        &self.converters
    }

    /// The type followed by its ancestors, most derived first.
    pub fn base_chain<'m>(&'m self, model: &'m ModelType) -> Result<Vec<&'m ModelType>> {
        let mut chain = vec![model];
        let mut seen = HashSet::from([model.name.as_str()]);
        let mut current = model;

        while let Some(base_name) = &current.base_type {
            let base = self
                .model(base_name)
                .ok_or_else(|| Error::lookup(LookupKind::BaseType, base_name))?;
            if !seen.insert(base.name.as_str()) {
                return Err(Error::illegal_state(
                    &model.qualified_name,
                    format!("inheritance cycle through base type '{base_name}'"),
                ));
            }
            chain.push(base);
            current = base;
        }

        Ok(chain)
    }

    /// Own and inherited properties, base-most properties first.
    pub fn flattened_properties<'m>(
        &'m self,
        model: &'m ModelType,
    ) -> Result<Vec<&'m PropertyModel>> {
        let chain = self.base_chain(model)?;
        Ok(chain.iter().rev().flat_map(|m| m.props.iter()).collect())
    }

    /// Key properties in declared key order, inherited from the nearest keyed ancestor.
    pub fn key_spec<'m>(&'m self, model: &'m ModelType) -> Result<Vec<&'m PropertyModel>> {
        let chain = self.base_chain(model)?;
        let Some(keyed) = chain.iter().find(|m| !m.keys.is_empty()) else {
            return Ok(Vec::new());
        };

        let props = self.flattened_properties(model)?;
        keyed
            .keys
            .iter()
            .map(|key| {
                props
                    .iter()
                    .find(|p| &p.odata_name == key)
                    .copied()
                    .ok_or_else(|| {
                        Error::lookup(LookupKind::KeyProperty, format!("{}/{key}", model.name))
                    })
            })
            .collect()
    }

    /// Resolve a navigation binding target such as `People` or `NS.Container/People`.
    pub fn resolve_navigation_target(&self, target: &str) -> Result<ContainerTarget<'_>> {
        let local = target.rsplit('/').next().unwrap_or(target);

        if let Some(set) = self
            .container
            .entity_sets
            .values()
            .find(|s| s.odata_name == local)
        {
            return Ok(ContainerTarget::EntitySet(set));
        }
        if let Some(singleton) = self
            .container
            .singletons
            .values()
            .find(|s| s.odata_name == local)
        {
            return Ok(ContainerTarget::Singleton(singleton));
        }

        Err(Error::lookup(LookupKind::NavigationTarget, target))
    }

    /// Check that every type reference resolves inside this model.
    pub(crate) fn validate_closure(&self) -> Result<()> {
        for model in &self.models {
            self.base_chain(model)?;
            for prop in &model.props {
                self.check_reference(prop)?;
            }
            self.key_spec(model)?;
        }

        for ops in self.operations.values() {
            for op in ops {
                for param in op.parameters.iter().chain(op.return_type.iter()) {
                    self.check_reference(param)?;
                }
            }
        }

        // Binding targets stay unresolved until a caller asks for them.
        for set in self.container.entity_sets.values() {
            self.require_model(&set.entity_type)?;
        }
        for singleton in self.container.singletons.values() {
            self.require_model(&singleton.entity_type)?;
        }

        Ok(())
    }

    fn check_reference(&self, prop: &PropertyModel) -> Result<()> {
        match prop.data_type {
            DataType::ModelType => self.require_model(&prop.type_name).map(|_| ()),
            DataType::EnumType => self
                .enum_type(&prop.type_name)
                .map(|_| ())
                .ok_or_else(|| Error::lookup(LookupKind::EnumType, &prop.type_name)),
            DataType::Primitive(_) => Ok(()),
        }
    }
}

/// The single operation of `kind` named `name`; overloads make the lookup ambiguous.
pub(crate) fn find_operation<'o>(
    operations: &'o [OperationType],
    name: &str,
    kind: OperationKind,
) -> Result<&'o OperationType> {
    let matches: Vec<_> = operations
        .iter()
        .filter(|op| op.name == name && op.kind == kind)
        .collect();

    match matches.as_slice() {
        [op] => Ok(op),
        [] => Err(Error::lookup(LookupKind::RootOperation, name)),
        many => Err(Error::AmbiguousLookup {
            kind: LookupKind::RootOperation,
            identifier: name.to_string(),
            candidates: many.len(),
        }),
    }
}
