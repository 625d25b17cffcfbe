//! EDMX metadata document structures.
//!
//! Serde shapes for the subset of CSDL that drives generation. Element and
//! attribute names are matched on their local part, so `edmx:DataServices`
//! and `m:HttpMethod` land in plain `DataServices` / `@HttpMethod` fields.
//! Both the V4 (`Version="4.0"`) and the V2/V3 (`Version="1.0"`) dialects
//! deserialize into the same structs; dialect-only fields are optional.

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::ir::ODataVersion;

/// Root `edmx:Edmx` element.
#[derive(Debug, Clone, Deserialize)]
pub struct Edmx {
    #[serde(rename = "@Version")]
    pub version: String,
    #[serde(rename = "DataServices")]
    pub data_services: DataServices,
}

impl Edmx {
    /// Parse a metadata document.
    pub fn from_xml(xml: &str) -> Result<Self> {
        Ok(quick_xml::de::from_str(xml)?)
    }

    /// Protocol dialect of this document; V3 documents use the V2 dialect.
    pub fn odata_version(&self) -> Result<ODataVersion> {
        match self.version.trim() {
            "4.0" | "4.01" => Ok(ODataVersion::V4),
            "1.0" => Ok(ODataVersion::V2),
            other => Err(Error::UnsupportedVersion(other.to_string())),
        }
    }

    pub fn schemas(&self) -> &[Schema] {
        &self.data_services.schemas
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataServices {
    #[serde(rename = "Schema", default)]
    pub schemas: Vec<Schema>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Schema {
    #[serde(rename = "@Namespace")]
    pub namespace: String,
    #[serde(rename = "@Alias")]
    pub alias: Option<String>,
    #[serde(rename = "EnumType", default)]
    pub enum_types: Vec<EnumType>,
    #[serde(rename = "EntityType", default)]
    pub entity_types: Vec<StructuredType>,
    #[serde(rename = "ComplexType", default)]
    pub complex_types: Vec<StructuredType>,
    #[serde(rename = "Function", default)]
    pub functions: Vec<Operation>,
    #[serde(rename = "Action", default)]
    pub actions: Vec<Operation>,
    /// V2 only: navigation ends are declared through associations.
    #[serde(rename = "Association", default)]
    pub associations: Vec<Association>,
    #[serde(rename = "EntityContainer", default)]
    pub entity_containers: Vec<EntityContainer>,
}

/// `EntityType` or `ComplexType`.
#[derive(Debug, Clone, Deserialize)]
pub struct StructuredType {
    #[serde(rename = "@Name")]
    pub name: String,
    #[serde(rename = "@BaseType")]
    pub base_type: Option<String>,
    #[serde(rename = "@Abstract")]
    pub is_abstract: Option<bool>,
    #[serde(rename = "Key")]
    pub key: Option<Key>,
    #[serde(rename = "Property", default)]
    pub properties: Vec<Property>,
    #[serde(rename = "NavigationProperty", default)]
    pub navigation_properties: Vec<NavigationProperty>,
}

impl StructuredType {
    /// Declared key property names, in declaration order.
    pub fn key_names(&self) -> Vec<String> {
        self.key
            .as_ref()
            .map(|key| key.property_refs.iter().map(|r| r.name.clone()).collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Key {
    #[serde(rename = "PropertyRef", default)]
    pub property_refs: Vec<PropertyRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PropertyRef {
    #[serde(rename = "@Name")]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Property {
    #[serde(rename = "@Name")]
    pub name: String,
    #[serde(rename = "@Type")]
    pub type_name: String,
    #[serde(rename = "@Nullable")]
    pub nullable: Option<bool>,
    #[serde(rename = "Annotation", default)]
    pub annotations: Vec<Annotation>,
}

impl Property {
    /// `Core.Computed` or `Core.Immutable` make a property read-only for clients.
    pub fn is_read_only(&self) -> bool {
        self.annotations.iter().any(|a| {
            let term = a.term.rsplit('.').next().unwrap_or(&a.term);
            matches!(term, "Computed" | "Immutable") && a.bool_value != Some(false)
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NavigationProperty {
    #[serde(rename = "@Name")]
    pub name: String,
    /// V4 only.
    #[serde(rename = "@Type")]
    pub type_name: Option<String>,
    #[serde(rename = "@Nullable")]
    pub nullable: Option<bool>,
    /// V2 only: qualified association name.
    #[serde(rename = "@Relationship")]
    pub relationship: Option<String>,
    #[serde(rename = "@ToRole")]
    pub to_role: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Annotation {
    #[serde(rename = "@Term")]
    pub term: String,
    #[serde(rename = "@Bool")]
    pub bool_value: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnumType {
    #[serde(rename = "@Name")]
    pub name: String,
    #[serde(rename = "Member", default)]
    pub members: Vec<EnumMember>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnumMember {
    #[serde(rename = "@Name")]
    pub name: String,
    #[serde(rename = "@Value")]
    pub value: Option<String>,
}

/// `Function` or `Action`.
#[derive(Debug, Clone, Deserialize)]
pub struct Operation {
    #[serde(rename = "@Name")]
    pub name: String,
    #[serde(rename = "@IsBound")]
    pub is_bound: Option<bool>,
    #[serde(rename = "Parameter", default)]
    pub parameters: Vec<Parameter>,
    #[serde(rename = "ReturnType", default)]
    pub return_types: Vec<ReturnType>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Parameter {
    #[serde(rename = "@Name")]
    pub name: String,
    #[serde(rename = "@Type")]
    pub type_name: String,
    #[serde(rename = "@Nullable")]
    pub nullable: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReturnType {
    #[serde(rename = "@Type")]
    pub type_name: String,
    #[serde(rename = "@Nullable")]
    pub nullable: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Association {
    #[serde(rename = "@Name")]
    pub name: String,
    #[serde(rename = "End", default)]
    pub ends: Vec<AssociationEnd>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssociationEnd {
    #[serde(rename = "@Role")]
    pub role: String,
    #[serde(rename = "@Type")]
    pub type_name: String,
    #[serde(rename = "@Multiplicity")]
    pub multiplicity: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntityContainer {
    #[serde(rename = "@Name")]
    pub name: String,
    #[serde(rename = "EntitySet", default)]
    pub entity_sets: Vec<EntitySet>,
    #[serde(rename = "Singleton", default)]
    pub singletons: Vec<Singleton>,
    #[serde(rename = "FunctionImport", default)]
    pub function_imports: Vec<FunctionImport>,
    #[serde(rename = "ActionImport", default)]
    pub action_imports: Vec<ActionImport>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntitySet {
    #[serde(rename = "@Name")]
    pub name: String,
    #[serde(rename = "@EntityType")]
    pub entity_type: String,
    #[serde(rename = "NavigationPropertyBinding", default)]
    pub navigation_bindings: Vec<NavigationPropertyBinding>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Singleton {
    #[serde(rename = "@Name")]
    pub name: String,
    #[serde(rename = "@Type")]
    pub type_name: String,
    #[serde(rename = "NavigationPropertyBinding", default)]
    pub navigation_bindings: Vec<NavigationPropertyBinding>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NavigationPropertyBinding {
    #[serde(rename = "@Path")]
    pub path: String,
    #[serde(rename = "@Target")]
    pub target: String,
}

/// V4 imports reference a `Function`; V2 imports declare the operation inline.
#[derive(Debug, Clone, Deserialize)]
pub struct FunctionImport {
    #[serde(rename = "@Name")]
    pub name: String,
    #[serde(rename = "@Function")]
    pub function: Option<String>,
    #[serde(rename = "@EntitySet")]
    pub entity_set: Option<String>,
    #[serde(rename = "@ReturnType")]
    pub return_type: Option<String>,
    #[serde(rename = "@HttpMethod")]
    pub http_method: Option<String>,
    #[serde(rename = "Parameter", default)]
    pub parameters: Vec<Parameter>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActionImport {
    #[serde(rename = "@Name")]
    pub name: String,
    #[serde(rename = "@Action")]
    pub action: String,
    #[serde(rename = "@EntitySet")]
    pub entity_set: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const V4: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<edmx:Edmx Version="4.0" xmlns:edmx="http://docs.oasis-open.org/odata/ns/edmx">
  <edmx:DataServices>
    <Schema Namespace="Tester" Alias="T" xmlns="http://docs.oasis-open.org/odata/ns/edm">
      <EnumType Name="Feature">
        <Member Name="Feature1" Value="0" />
        <Member Name="Feature2" Value="1" />
      </EnumType>
      <EntityType Name="Book">
        <Key><PropertyRef Name="ID" /></Key>
        <Property Name="ID" Type="Edm.Guid" Nullable="false">
          <Annotation Term="Org.OData.Core.V1.Computed" Bool="true" />
        </Property>
        <NavigationProperty Name="Author" Type="Tester.Author" />
        <Property Name="Title" Type="Edm.String" />
      </EntityType>
      <Function Name="BestBook" IsBound="true">
        <Parameter Name="books" Type="Collection(Tester.Book)" />
        <ReturnType Type="Tester.Book" />
      </Function>
      <EntityContainer Name="Container">
        <EntitySet Name="Books" EntityType="Tester.Book">
          <NavigationPropertyBinding Path="Author" Target="Authors" />
        </EntitySet>
        <ActionImport Name="Reset" Action="Tester.Reset" />
      </EntityContainer>
    </Schema>
  </edmx:DataServices>
</edmx:Edmx>"#;

    #[test]
    fn test_parse_v4_document() {
        let edmx = Edmx::from_xml(V4).unwrap();
        assert_eq!(edmx.odata_version().unwrap(), ODataVersion::V4);

        let schema = &edmx.schemas()[0];
        assert_eq!(schema.namespace, "Tester");
        assert_eq!(schema.alias.as_deref(), Some("T"));
        assert_eq!(schema.enum_types[0].members.len(), 2);

        let book = &schema.entity_types[0];
        assert_eq!(book.key_names(), ["ID"]);
        // interleaved Property/NavigationProperty elements are both collected
        assert_eq!(book.properties.len(), 2);
        assert_eq!(book.navigation_properties.len(), 1);
        assert_eq!(book.properties[0].nullable, Some(false));
        assert!(book.properties[0].is_read_only());
        assert!(!book.properties[1].is_read_only());

        let function = &schema.functions[0];
        assert_eq!(function.is_bound, Some(true));
        assert_eq!(function.parameters[0].type_name, "Collection(Tester.Book)");

        let container = &schema.entity_containers[0];
        assert_eq!(container.entity_sets[0].navigation_bindings[0].target, "Authors");
        assert_eq!(container.action_imports[0].action, "Tester.Reset");
    }

    #[test]
    fn test_parse_v2_function_import() {
        let xml = r#"<edmx:Edmx Version="1.0" xmlns:edmx="http://schemas.microsoft.com/ado/2007/06/edmx">
  <edmx:DataServices xmlns:m="http://schemas.microsoft.com/ado/2007/08/dataservices/metadata" m:DataServiceVersion="2.0">
    <Schema Namespace="ODataDemo">
      <EntityContainer Name="DemoService" m:IsDefaultEntityContainer="true">
        <FunctionImport Name="GetProductsByRating" EntitySet="Products" ReturnType="Collection(ODataDemo.Product)" m:HttpMethod="GET">
          <Parameter Name="rating" Type="Edm.Int32" Mode="In" />
        </FunctionImport>
      </EntityContainer>
    </Schema>
  </edmx:DataServices>
</edmx:Edmx>"#;
        let edmx = Edmx::from_xml(xml).unwrap();
        assert_eq!(edmx.odata_version().unwrap(), ODataVersion::V2);

        let import = &edmx.schemas()[0].entity_containers[0].function_imports[0];
        assert_eq!(import.http_method.as_deref(), Some("GET"));
        assert_eq!(import.entity_set.as_deref(), Some("Products"));
        assert_eq!(import.parameters[0].name, "rating");
    }

    #[test]
    fn test_unsupported_version() {
        let xml = r#"<Edmx Version="3.5"><DataServices /></Edmx>"#;
        let edmx = Edmx::from_xml(xml).unwrap();
        assert!(matches!(
            edmx.odata_version(),
            Err(Error::UnsupportedVersion(v)) if v == "3.5"
        ));
    }

    #[test]
    fn test_malformed_xml_is_xml_error() {
        assert!(matches!(Edmx::from_xml("<Edmx Version="), Err(Error::Xml(_))));
    }
}
