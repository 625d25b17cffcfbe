//! Service façades over an injected [`ODataClient`].
//!
//! The façades mirror the generated TypeScript services: they build URLs
//! and bodies from the data model and hand every request to the client.
//! Nothing here performs I/O itself.

use std::fmt;

use serde_json::{Map, Value};
use tracing::debug;

use super::client::{ClientError, HttpMethod, ODataClient, ODataRequest};
use super::literal::{EntityKey, action_body, render_function_call, render_key};
use super::qobject::QueryObject;
use crate::error::{Error, LookupKind};
use crate::ir::{DataModel, DataType, ModelType, OperationKind, OperationType, PropertyModel};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Model(#[from] Error),

    #[error("Invalid key for '{entity}': {reason}")]
    InvalidKey { entity: String, reason: String },

    #[error("Invalid argument '{name}': {reason}")]
    InvalidArgument { name: String, reason: String },

    #[error("Property '{0}' has no service")]
    NotNavigable(String),

    #[error("Base path must not be empty")]
    MissingBasePath,

    #[error(transparent)]
    Client(#[from] ClientError),
}

/// What every façade shares: the client, the model and the service toggles.
struct Session<'a, C> {
    client: &'a C,
    model: &'a DataModel,
    primitive_services: bool,
}

impl<C> Clone for Session<'_, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for Session<'_, C> {}

impl<C> fmt::Debug for Session<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("service", &self.model.service_name())
            .field("primitive_services", &self.primitive_services)
            .finish_non_exhaustive()
    }
}

impl<C: ODataClient> Session<'_, C> {
    async fn send(
        self,
        method: HttpMethod,
        url: String,
        body: Option<Value>,
    ) -> Result<Value, ServiceError> {
        debug!(%method, %url, has_body = body.is_some(), "dispatching request");
        let response = self
            .client
            .execute(ODataRequest { method, url, body })
            .await?;
        Ok(response)
    }
}

/// Entry point: entity sets, singletons and unbound operations.
#[derive(Debug)]
pub struct MainService<'a, C> {
    session: Session<'a, C>,
    base_path: String,
}

impl<'a, C: ODataClient> MainService<'a, C> {
    pub fn new(client: &'a C, model: &'a DataModel, base_path: &str) -> Result<Self, ServiceError> {
        let base_path = base_path.trim_end_matches('/');
        if base_path.is_empty() {
            return Err(ServiceError::MissingBasePath);
        }
        Ok(Self {
            session: Session {
                client,
                model,
                primitive_services: false,
            },
            base_path: base_path.to_string(),
        })
    }

    #[must_use]
    pub fn with_primitive_property_services(mut self, enabled: bool) -> Self {
        self.session.primitive_services = enabled;
        self
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Entity set by generated or OData name.
    pub fn entity_set(&self, name: &str) -> Result<EntitySetService<'a, C>, ServiceError> {
        let model = self.session.model;
        let set = model
            .container()
            .entity_sets
            .values()
            .find(|s| s.name == name || s.odata_name == name)
            .ok_or_else(|| Error::lookup(LookupKind::EntitySet, name))?;

        Ok(EntitySetService {
            session: self.session,
            path: format!("{}/{}", self.base_path, set.odata_name),
            entity_type: model.require_model(&set.entity_type)?,
        })
    }

    pub fn singleton(&self, name: &str) -> Result<EntityService<'a, C>, ServiceError> {
        let model = self.session.model;
        let singleton = model
            .container()
            .singletons
            .values()
            .find(|s| s.name == name || s.odata_name == name)
            .ok_or_else(|| Error::lookup(LookupKind::Singleton, name))?;

        Ok(EntityService {
            session: self.session,
            path: format!("{}/{}", self.base_path, singleton.odata_name),
            entity_type: model.require_model(&singleton.entity_type)?,
        })
    }

    fn import(&self, name: &str, kind: OperationKind) -> Result<(&'a str, &'a OperationType), ServiceError> {
        let model = self.session.model;
        let imports = match kind {
            OperationKind::Function => &model.container().functions,
            OperationKind::Action => &model.container().actions,
        };
        let import = imports
            .values()
            .find(|i| i.name == name || i.odata_name == name)
            .ok_or_else(|| Error::lookup(LookupKind::ContainerEntry, name))?;
        let op = model.root_operation(&import.operation, kind)?;
        Ok((import.odata_name.as_str(), op))
    }

    /// URL of an unbound function call, e.g. `<base>/GetNearestAirport(lat=1,lon=2)`.
    pub fn function_url(&self, name: &str, params: &Map<String, Value>) -> Result<String, ServiceError> {
        let (odata_name, op) = self.import(name, OperationKind::Function)?;
        let call = render_function_call(odata_name, op, params, self.session.model.version())?;
        Ok(format!("{}/{call}", self.base_path))
    }

    pub async fn call_function(
        &self,
        name: &str,
        params: &Map<String, Value>,
    ) -> Result<Value, ServiceError> {
        let url = self.function_url(name, params)?;
        self.session.send(HttpMethod::Get, url, None).await
    }

    pub async fn call_action(
        &self,
        name: &str,
        params: &Map<String, Value>,
    ) -> Result<Value, ServiceError> {
        let (odata_name, op) = self.import(name, OperationKind::Action)?;
        let body = action_body(op, params)?;
        let url = format!("{}/{odata_name}", self.base_path);
        self.session.send(HttpMethod::Post, url, Some(body)).await
    }
}

/// Façade over an entity collection: an entity set or a collection navigation.
#[derive(Debug)]
pub struct EntitySetService<'a, C> {
    session: Session<'a, C>,
    path: String,
    entity_type: &'a ModelType,
}

impl<'a, C: ODataClient> EntitySetService<'a, C> {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn entity_type(&self) -> &'a ModelType {
        self.entity_type
    }

    pub fn query_object(&self) -> Result<QueryObject<'a>, ServiceError> {
        QueryObject::new(self.session.model, self.entity_type)
    }

    pub fn key_spec(&self) -> Result<Vec<&'a PropertyModel>, ServiceError> {
        Ok(self.session.model.key_spec(self.entity_type)?)
    }

    /// Service of the entity addressed by `key`.
    pub fn get(&self, key: impl Into<EntityKey>) -> Result<EntityService<'a, C>, ServiceError> {
        let segment = render_key(
            &self.entity_type.name,
            &key.into(),
            &self.key_spec()?,
            self.session.model.version(),
        )?;
        Ok(EntityService {
            session: self.session,
            path: format!("{}{segment}", self.path),
            entity_type: self.entity_type,
        })
    }

    pub async fn query(&self) -> Result<Value, ServiceError> {
        self.session.send(HttpMethod::Get, self.path.clone(), None).await
    }

    pub async fn create(&self, entity: Value) -> Result<Value, ServiceError> {
        self.session
            .send(HttpMethod::Post, self.path.clone(), Some(entity))
            .await
    }

    /// URL of a function bound to the collection.
    pub fn function_url(&self, name: &str, params: &Map<String, Value>) -> Result<String, ServiceError> {
        let op = bound_operation(self.session.model, self.entity_type, true, name, OperationKind::Function)?;
        bound_function_url(self.session, &self.path, op, params)
    }

    pub async fn call_function(
        &self,
        name: &str,
        params: &Map<String, Value>,
    ) -> Result<Value, ServiceError> {
        let url = self.function_url(name, params)?;
        self.session.send(HttpMethod::Get, url, None).await
    }

    pub async fn call_action(
        &self,
        name: &str,
        params: &Map<String, Value>,
    ) -> Result<Value, ServiceError> {
        let op = bound_operation(self.session.model, self.entity_type, true, name, OperationKind::Action)?;
        call_bound_action(self.session, &self.path, op, params).await
    }
}

/// Façade over a single entity: a keyed entity, a singleton or a single-valued navigation.
#[derive(Debug)]
pub struct EntityService<'a, C> {
    session: Session<'a, C>,
    path: String,
    entity_type: &'a ModelType,
}

impl<'a, C: ODataClient> EntityService<'a, C> {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn entity_type(&self) -> &'a ModelType {
        self.entity_type
    }

    pub async fn query(&self) -> Result<Value, ServiceError> {
        self.session.send(HttpMethod::Get, self.path.clone(), None).await
    }

    /// Full replacement.
    pub async fn update(&self, entity: Value) -> Result<Value, ServiceError> {
        self.session
            .send(HttpMethod::Put, self.path.clone(), Some(entity))
            .await
    }

    /// Partial merge.
    pub async fn patch(&self, changes: Value) -> Result<Value, ServiceError> {
        self.session
            .send(HttpMethod::Patch, self.path.clone(), Some(changes))
            .await
    }

    pub async fn delete(&self) -> Result<Value, ServiceError> {
        self.session
            .send(HttpMethod::Delete, self.path.clone(), None)
            .await
    }

    pub fn navigate(&self, name: &str) -> Result<Navigation<'a, C>, ServiceError> {
        navigate(self.session, &self.path, self.entity_type, name)
    }

    pub fn function_url(&self, name: &str, params: &Map<String, Value>) -> Result<String, ServiceError> {
        let op = bound_operation(self.session.model, self.entity_type, false, name, OperationKind::Function)?;
        bound_function_url(self.session, &self.path, op, params)
    }

    pub async fn call_function(
        &self,
        name: &str,
        params: &Map<String, Value>,
    ) -> Result<Value, ServiceError> {
        let url = self.function_url(name, params)?;
        self.session.send(HttpMethod::Get, url, None).await
    }

    pub async fn call_action(
        &self,
        name: &str,
        params: &Map<String, Value>,
    ) -> Result<Value, ServiceError> {
        let op = bound_operation(self.session.model, self.entity_type, false, name, OperationKind::Action)?;
        call_bound_action(self.session, &self.path, op, params).await
    }
}

/// Single-valued complex property.
#[derive(Debug)]
pub struct ComplexService<'a, C> {
    session: Session<'a, C>,
    path: String,
    complex_type: &'a ModelType,
}

impl<'a, C: ODataClient> ComplexService<'a, C> {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn complex_type(&self) -> &'a ModelType {
        self.complex_type
    }

    pub async fn query(&self) -> Result<Value, ServiceError> {
        self.session.send(HttpMethod::Get, self.path.clone(), None).await
    }

    pub async fn update(&self, value: Value) -> Result<Value, ServiceError> {
        self.session
            .send(HttpMethod::Put, self.path.clone(), Some(value))
            .await
    }

    pub async fn patch(&self, changes: Value) -> Result<Value, ServiceError> {
        self.session
            .send(HttpMethod::Patch, self.path.clone(), Some(changes))
            .await
    }

    pub fn navigate(&self, name: &str) -> Result<Navigation<'a, C>, ServiceError> {
        navigate(self.session, &self.path, self.complex_type, name)
    }
}

/// Collection-valued complex, enum or primitive property.
#[derive(Debug)]
pub struct CollectionService<'a, C> {
    session: Session<'a, C>,
    path: String,
    property: &'a PropertyModel,
}

impl<'a, C: ODataClient> CollectionService<'a, C> {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn property(&self) -> &'a PropertyModel {
        self.property
    }

    pub async fn query(&self) -> Result<Value, ServiceError> {
        self.session.send(HttpMethod::Get, self.path.clone(), None).await
    }

    pub async fn add(&self, item: Value) -> Result<Value, ServiceError> {
        self.session
            .send(HttpMethod::Post, self.path.clone(), Some(item))
            .await
    }

    /// Replace the whole collection.
    pub async fn update(&self, items: Vec<Value>) -> Result<Value, ServiceError> {
        self.session
            .send(HttpMethod::Put, self.path.clone(), Some(Value::Array(items)))
            .await
    }

    pub async fn delete(&self) -> Result<Value, ServiceError> {
        self.session
            .send(HttpMethod::Delete, self.path.clone(), None)
            .await
    }
}

/// Service reached through a property.
#[derive(Debug)]
pub enum Navigation<'a, C> {
    Entity(EntityService<'a, C>),
    EntityCollection(EntitySetService<'a, C>),
    Complex(ComplexService<'a, C>),
    Collection(CollectionService<'a, C>),
}

impl<'a, C> Navigation<'a, C> {
    pub fn into_entity(self) -> Option<EntityService<'a, C>> {
        match self {
            Navigation::Entity(service) => Some(service),
            _ => None,
        }
    }

    pub fn into_entity_collection(self) -> Option<EntitySetService<'a, C>> {
        match self {
            Navigation::EntityCollection(service) => Some(service),
            _ => None,
        }
    }

    pub fn into_complex(self) -> Option<ComplexService<'a, C>> {
        match self {
            Navigation::Complex(service) => Some(service),
            _ => None,
        }
    }

    pub fn into_collection(self) -> Option<CollectionService<'a, C>> {
        match self {
            Navigation::Collection(service) => Some(service),
            _ => None,
        }
    }
}

fn navigate<'a, C>(
    session: Session<'a, C>,
    parent_path: &str,
    owner: &'a ModelType,
    name: &str,
) -> Result<Navigation<'a, C>, ServiceError> {
    let model = session.model;
    let prop = model
        .flattened_properties(owner)?
        .into_iter()
        .find(|p| p.name == name || p.odata_name == name)
        .ok_or_else(|| Error::lookup(LookupKind::Property, format!("{}/{name}", owner.name)))?;
    let path = format!("{parent_path}/{}", prop.odata_name);

    let navigation = match prop.data_type {
        DataType::ModelType => {
            let target = model.require_model(&prop.type_name)?;
            match (prop.is_collection, target.is_entity) {
                (true, true) => Navigation::EntityCollection(EntitySetService {
                    session,
                    path,
                    entity_type: target,
                }),
                (false, true) => Navigation::Entity(EntityService {
                    session,
                    path,
                    entity_type: target,
                }),
                (false, false) => Navigation::Complex(ComplexService {
                    session,
                    path,
                    complex_type: target,
                }),
                (true, false) => Navigation::Collection(CollectionService {
                    session,
                    path,
                    property: prop,
                }),
            }
        }
        DataType::Primitive(_) | DataType::EnumType
            if prop.is_collection && session.primitive_services =>
        {
            Navigation::Collection(CollectionService {
                session,
                path,
                property: prop,
            })
        }
        DataType::Primitive(_) | DataType::EnumType => {
            return Err(ServiceError::NotNavigable(prop.name.clone()));
        }
    };
    Ok(navigation)
}

/// Bound operation by generated name, searched along the base chain.
fn bound_operation<'m>(
    model: &'m DataModel,
    binding: &'m ModelType,
    collection: bool,
    name: &str,
    kind: OperationKind,
) -> Result<&'m OperationType, ServiceError> {
    let candidates: Vec<_> = model
        .inherited_bound_operations(binding, collection)?
        .into_iter()
        .filter(|op| op.kind == kind && (op.name == name || op.odata_name == name))
        .collect();

    match candidates.as_slice() {
        [op] => Ok(*op),
        [] => Err(Error::lookup(LookupKind::BoundOperation, format!("{}/{name}", binding.name)).into()),
        many => Err(Error::AmbiguousLookup {
            kind: LookupKind::BoundOperation,
            identifier: format!("{}/{name}", binding.name),
            candidates: many.len(),
        }
        .into()),
    }
}

fn bound_function_url<C>(
    session: Session<'_, C>,
    path: &str,
    op: &OperationType,
    params: &Map<String, Value>,
) -> Result<String, ServiceError> {
    let call = render_function_call(&op.qualified_name, op, params, session.model.version())?;
    Ok(format!("{path}/{call}"))
}

async fn call_bound_action<C: ODataClient>(
    session: Session<'_, C>,
    path: &str,
    op: &OperationType,
    params: &Map<String, Value>,
) -> Result<Value, ServiceError> {
    let body = action_body(op, params)?;
    let url = format!("{path}/{}", op.qualified_name);
    session.send(HttpMethod::Post, url, Some(body)).await
}
