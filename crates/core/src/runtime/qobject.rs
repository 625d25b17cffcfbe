//! Query objects: path nodes over a model type's property graph.
//!
//! Nested nodes for model-typed properties are built on first access and
//! cached, so self-referential types (a person's best friend is a person)
//! can be walked to any depth.

use std::cell::OnceCell;
use std::fmt;

use super::service::ServiceError;
use crate::error::{Error, LookupKind};
use crate::ir::{DataModel, ModelType, PropertyModel};

pub struct QueryObject<'m> {
    model: &'m DataModel,
    model_type: &'m ModelType,
    /// Path of this node relative to the entity root; empty at the root.
    prefix: String,
    props: Vec<&'m PropertyModel>,
    children: Vec<OnceCell<QueryObject<'m>>>,
}

impl fmt::Debug for QueryObject<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryObject")
            .field("model_type", &self.model_type.name)
            .field("prefix", &self.prefix)
            .field("built_children", &self.built_children())
            .finish_non_exhaustive()
    }
}

impl<'m> QueryObject<'m> {
    pub fn new(model: &'m DataModel, model_type: &'m ModelType) -> Result<Self, ServiceError> {
        Self::with_prefix(model, model_type, String::new())
    }

    fn with_prefix(
        model: &'m DataModel,
        model_type: &'m ModelType,
        prefix: String,
    ) -> Result<Self, ServiceError> {
        let props = model.flattened_properties(model_type)?;
        let children = props.iter().map(|_| OnceCell::new()).collect();
        Ok(Self {
            model,
            model_type,
            prefix,
            props,
            children,
        })
    }

    pub fn model_type(&self) -> &'m ModelType {
        self.model_type
    }

    /// Properties in declaration order, base-most first.
    pub fn properties(&self) -> &[&'m PropertyModel] {
        &self.props
    }

    fn position(&self, name: &str) -> Result<usize, ServiceError> {
        self.props
            .iter()
            .position(|p| p.name == name || p.odata_name == name)
            .ok_or_else(|| {
                Error::lookup(
                    LookupKind::Property,
                    format!("{}/{name}", self.model_type.name),
                )
                .into()
            })
    }

    /// Property by generated or OData name.
    pub fn property(&self, name: &str) -> Result<&'m PropertyModel, ServiceError> {
        let index = self.position(name)?;
        self.props
            .get(index)
            .copied()
            .ok_or_else(|| Error::lookup(LookupKind::Property, name).into())
    }

    /// OData path of a property, e.g. `BestFriend/UserName`.
    pub fn path(&self, name: &str) -> Result<String, ServiceError> {
        let prop = self.property(name)?;
        Ok(self.join(&prop.odata_name))
    }

    fn join(&self, segment: &str) -> String {
        if self.prefix.is_empty() {
            segment.to_string()
        } else {
            format!("{}/{segment}", self.prefix)
        }
    }

    /// Nested node of a model-typed property, built on first access.
    pub fn nav(&self, name: &str) -> Result<&QueryObject<'m>, ServiceError> {
        let index = self.position(name)?;
        let (Some(prop), Some(cell)) = (self.props.get(index), self.children.get(index)) else {
            return Err(Error::lookup(LookupKind::Property, name).into());
        };
        if let Some(built) = cell.get() {
            return Ok(built);
        }
        if !prop.is_model() {
            return Err(ServiceError::NotNavigable(prop.name.clone()));
        }

        let target = self.model.require_model(&prop.type_name)?;
        let child = Self::with_prefix(self.model, target, self.join(&prop.odata_name))?;
        Ok(cell.get_or_init(|| child))
    }

    /// Number of nested nodes built so far.
    pub fn built_children(&self) -> usize {
        self.children.iter().filter(|c| c.get().is_some()).count()
    }

    /// Generated property names; equal shapes mean equal query objects.
    pub fn shape(&self) -> Vec<&'m str> {
        self.props.iter().map(|p| p.name.as_str()).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::test_support::{TRIPPIN, digest_v4};

    #[test]
    fn test_self_reference_is_lazy() {
        let (model, _) = digest_v4(TRIPPIN);
        let person = model.require_model("Person").unwrap();
        let q = QueryObject::new(&model, person).unwrap();
        assert_eq!(q.built_children(), 0);

        let mut node = &q;
        for _ in 0..50 {
            node = node.nav("bestFriend").unwrap();
        }
        assert_eq!(node.model_type().name, "Person");
        assert_eq!(q.built_children(), 1);
        assert!(
            node.path("userName")
                .unwrap()
                .starts_with("BestFriend/BestFriend/")
        );
        assert!(node.path("userName").unwrap().ends_with("/BestFriend/UserName"));
    }

    #[test]
    fn test_nav_is_memoized() {
        let (model, _) = digest_v4(TRIPPIN);
        let person = model.require_model("Person").unwrap();
        let q = QueryObject::new(&model, person).unwrap();
        let first: *const QueryObject<'_> = q.nav("bestFriend").unwrap();
        let second: *const QueryObject<'_> = q.nav("BestFriend").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_scalar_and_collection_complex_share_shape() {
        let (model, _) = digest_v4(TRIPPIN);
        let person = model.require_model("Person").unwrap();
        let q = QueryObject::new(&model, person).unwrap();

        let home = q.nav("homeAddress").unwrap();
        let info = q.nav("addressInfo").unwrap();
        assert_eq!(home.shape(), info.shape());
        assert_eq!(home.shape(), ["address", "city"]);
        assert_eq!(home.path("city").unwrap(), "HomeAddress/City");
    }

    #[test]
    fn test_primitive_is_not_navigable() {
        let (model, _) = digest_v4(TRIPPIN);
        let person = model.require_model("Person").unwrap();
        let q = QueryObject::new(&model, person).unwrap();
        assert!(matches!(
            q.nav("userName").unwrap_err(),
            ServiceError::NotNavigable(name) if name == "userName"
        ));
        assert!(q.path("nope").is_err());
    }

    #[test]
    fn test_inherited_properties() {
        let (model, _) = digest_v4(TRIPPIN);
        let employee = model.require_model("Employee").unwrap();
        let q = QueryObject::new(&model, employee).unwrap();
        assert_eq!(q.path("userName").unwrap(), "UserName");
        assert_eq!(q.nav("peers").unwrap().model_type().name, "Person");
    }
}
