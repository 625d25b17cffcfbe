#![allow(clippy::unwrap_used, clippy::expect_used)]

use odata2ts_common::RunOptions;
use odata2ts_core::generate;
use odata2ts_core::runtime::{
    EntityKey, HttpMethod, MainService, QueryObject, RecordingClient, ServiceError,
};
use serde_json::{Map, Value, json};

const TRIPPIN: &str = include_str!("fixtures/trippin.xml");
const NORTHWIND: &str = include_str!("fixtures/northwind.xml");
const BASE: &str = "http://localhost/odata";

const TESTER: &str = r#"<edmx:Edmx Version="4.0" xmlns:edmx="http://docs.oasis-open.org/odata/ns/edmx">
  <edmx:DataServices>
    <Schema Namespace="Tester" xmlns="http://docs.oasis-open.org/odata/ns/edm">
      <EntityType Name="TestEntity">
        <Key><PropertyRef Name="id" /></Key>
        <Property Name="id" Type="Edm.String" Nullable="false" />
      </EntityType>
      <EntityContainer Name="Container">
        <EntitySet Name="Ents" EntityType="Tester.TestEntity" />
      </EntityContainer>
    </Schema>
  </edmx:DataServices>
</edmx:Edmx>"#;

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[test]
fn test_entity_set_and_key_paths() {
    let output = generate(&[TESTER], &RunOptions::default()).unwrap();
    let client = RecordingClient::new();
    let service = MainService::new(&client, &output.model, "http://localhost/").unwrap();

    let ents = service.entity_set("ents").unwrap();
    assert_eq!(ents.path(), "http://localhost/Ents");
    assert_eq!(ents.get("x").unwrap().path(), "http://localhost/Ents('x')");
}

#[tokio::test]
async fn test_keyed_access_by_literal_and_structured_key() {
    let output = generate(&[TRIPPIN], &RunOptions::default()).unwrap();
    let client = RecordingClient::new();
    let service = MainService::new(&client, &output.model, BASE).unwrap();
    let people = service.entity_set("people").unwrap();

    let by_literal = people.get("russell").unwrap();
    let by_record = people
        .get(EntityKey::Structured(object(json!({ "userName": "russell" }))))
        .unwrap();
    assert_eq!(by_literal.path(), format!("{BASE}/People('russell')"));
    assert_eq!(by_literal.path(), by_record.path());

    by_record.query().await.unwrap();
    let request = client.last_request().unwrap();
    assert_eq!(request.method, HttpMethod::Get);
    assert_eq!(request.url, format!("{BASE}/People('russell')"));
    assert_eq!(request.body, None);
}

#[tokio::test]
async fn test_unbound_function_and_action() {
    let output = generate(&[TRIPPIN], &RunOptions::default()).unwrap();
    let client = RecordingClient::new();
    let service = MainService::new(&client, &output.model, BASE).unwrap();

    service
        .call_function("getNearestAirport", &object(json!({ "lat": 123, "lon": 345 })))
        .await
        .unwrap();
    assert_eq!(
        client.last_request().unwrap().url,
        format!("{BASE}/GetNearestAirport(lat=123,lon=345)")
    );

    service.call_action("ResetDataSource", &Map::new()).await.unwrap();
    let request = client.last_request().unwrap();
    assert_eq!(request.method, HttpMethod::Post);
    assert_eq!(request.url, format!("{BASE}/ResetDataSource"));
    assert_eq!(request.body, Some(json!({})));

    let err = service
        .function_url("getNearestAirport", &object(json!({ "lat": 1 })))
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidArgument { name, .. } if name == "lon"));
}

#[tokio::test]
async fn test_singleton_navigation_chain() {
    let output = generate(&[TRIPPIN], &RunOptions::default()).unwrap();
    let client = RecordingClient::new();
    let service = MainService::new(&client, &output.model, BASE).unwrap();

    let me = service.singleton("Me").unwrap();
    let trips = me.navigate("trips").unwrap().into_entity_collection().unwrap();
    let trip = trips.get(7_i64).unwrap();
    trip.patch(json!({ "Name": "Holiday" })).await.unwrap();

    let request = client.last_request().unwrap();
    assert_eq!(request.method, HttpMethod::Patch);
    assert_eq!(request.url, format!("{BASE}/Me/Trips(7)"));
    assert_eq!(request.body, Some(json!({ "Name": "Holiday" })));
}

#[test]
fn test_query_object_walks_cycles() {
    let output = generate(&[TRIPPIN], &RunOptions::default()).unwrap();
    let person = output.model.require_model("Person").unwrap();
    let q = QueryObject::new(&output.model, person).unwrap();

    let deep = q
        .nav("bestFriend")
        .and_then(|n| n.nav("bestFriend"))
        .and_then(|n| n.nav("bestFriend"))
        .unwrap();
    assert_eq!(
        deep.path("lastName").unwrap(),
        "BestFriend/BestFriend/BestFriend/LastName"
    );
    assert_eq!(q.built_children(), 1);
}

#[tokio::test]
async fn test_complex_scalar_and_collection_services() {
    let output = generate(&[TRIPPIN], &RunOptions::default()).unwrap();
    let client = RecordingClient::new();
    let service = MainService::new(&client, &output.model, BASE).unwrap();
    let russell = service.entity_set("people").unwrap().get("russell").unwrap();

    let home = russell.navigate("homeAddress").unwrap().into_complex().unwrap();
    let addresses = russell.navigate("addressInfo").unwrap().into_collection().unwrap();
    assert_eq!(home.complex_type().name, addresses.property().type_name);

    home.update(json!({ "Address": "1 Main St" })).await.unwrap();
    addresses.add(json!({ "Address": "2 Main St" })).await.unwrap();
    addresses.update(vec![json!({ "Address": "3 Main St" })]).await.unwrap();
    addresses.delete().await.unwrap();

    let methods: Vec<_> = client.requests().iter().map(|r| r.method).collect();
    assert_eq!(
        methods,
        [HttpMethod::Put, HttpMethod::Post, HttpMethod::Put, HttpMethod::Delete]
    );
    assert_eq!(
        client.last_request().unwrap().url,
        format!("{BASE}/People('russell')/AddressInfo")
    );
}

#[tokio::test]
async fn test_v2_literals_and_function_calls() {
    let output = generate(&[NORTHWIND], &RunOptions::default()).unwrap();
    let client = RecordingClient::new();
    let service = MainService::new(&client, &output.model, BASE).unwrap();

    let product = service.entity_set("Products").unwrap().get(1_i64).unwrap();
    assert_eq!(product.path(), format!("{BASE}/Products(1)"));

    assert_eq!(
        service
            .function_url("getProductsByRating", &object(json!({ "rating": 5 })))
            .unwrap(),
        format!("{BASE}/GetProductsByRating?rating=5")
    );

    service
        .call_action("discontinue", &object(json!({ "ProductID": 3 })))
        .await
        .unwrap();
    let request = client.last_request().unwrap();
    assert_eq!(request.url, format!("{BASE}/Discontinue"));
    assert_eq!(request.body, Some(json!({ "ProductID": 3 })));
}
