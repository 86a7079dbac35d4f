use async_graphql::{Request, Response};
use serde_json::{Value, json};
use strawchemy_core::{FieldType, ModelRegistry, ModelType, RootDeclaration};
use strawchemy_db_memory::{DynDatabase, create_database};
use strawchemy_graphql::{
    BindingError, GraphQLError, PartialMissPolicy, StrawchemyBuilder, StrawchemyConfig,
    StrawchemySchema, UNHANDLED_ERROR_MESSAGE,
};

fn registry() -> ModelRegistry {
    ModelRegistry::from_models([
        ModelType::new("Dataset")
            .field("id", FieldType::int())
            .field("name", FieldType::string())
            .field("datafiles", FieldType::list(FieldType::model("Datafile")))
            .field("crs", FieldType::model("Crs")),
        ModelType::new("Datafile")
            .field("id", FieldType::int())
            .field("name", FieldType::string()),
        ModelType::new("Crs")
            .lookup()
            .field("id", FieldType::int())
            .field("name", FieldType::string()),
    ])
    .unwrap()
}

fn query() -> RootDeclaration {
    RootDeclaration::query()
        .field("FetchAllDatasets", FieldType::list(FieldType::model("Dataset")))
        .field("FetchDatasetById", FieldType::model("Dataset"))
        .field("FetchCrsById", FieldType::optional(FieldType::model("Crs")))
}

fn mutation() -> RootDeclaration {
    RootDeclaration::mutation()
        .field("CreateDataset", FieldType::model("Dataset"))
        .field("UpdateDataset", FieldType::model("Dataset"))
        .field("DeleteDataset", FieldType::model("Dataset"))
        .field("CreateCrs", FieldType::model("Crs"))
}

fn build(config: StrawchemyConfig) -> (StrawchemySchema, DynDatabase) {
    let schema = StrawchemyBuilder::new(registry())
        .query(query())
        .mutation(mutation())
        .config(config)
        .build()
        .unwrap();
    let database = create_database(schema.storage_schema().clone());
    (schema.with_database(database.clone()), database)
}

fn schema() -> (StrawchemySchema, DynDatabase) {
    build(StrawchemyConfig::default())
}

async fn run(schema: &StrawchemySchema, request: &str) -> Response {
    schema.execute(Request::new(request)).await
}

fn data(response: Response) -> Value {
    assert!(response.errors.is_empty(), "unexpected errors: {:?}", response.errors);
    response.data.into_json().unwrap()
}

fn error_message(response: &Response) -> &str {
    assert!(!response.errors.is_empty(), "expected an error");
    &response.errors[0].message
}

async fn count(database: &DynDatabase, table: &str) -> usize {
    let session = database.open().await.unwrap();
    session.scan(table).await.unwrap().len()
}

/// Creates a Crs and a Dataset with two datafiles; returns the dataset id.
async fn seed(schema: &StrawchemySchema) -> i64 {
    data(run(schema, r#"mutation { CreateCrs(input: { name: "WGS84" }) { id } }"#).await);
    let created = data(
        run(
            schema,
            r#"mutation {
                CreateDataset(input: {
                    name: "rivers",
                    crs: { id: 1, name: "WGS84" },
                    datafiles: [{ name: "a.csv" }, { name: "b.csv" }]
                }) { id }
            }"#,
        )
        .await,
    );
    created["CreateDataset"]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_create_with_nested_rows() {
    let (schema, database) = schema();
    data(run(&schema, r#"mutation { CreateCrs(input: { name: "WGS84" }) { id } }"#).await);

    let created = data(
        run(
            &schema,
            r#"mutation {
                CreateDataset(input: {
                    name: "rivers",
                    crs: { id: 1, name: "ignored" },
                    datafiles: [{ name: "a.csv" }]
                }) {
                    id
                    name
                    crs { id name }
                    datafiles { id name }
                }
            }"#,
        )
        .await,
    );

    assert_eq!(
        created,
        json!({
            "CreateDataset": {
                "id": 1,
                "name": "rivers",
                "crs": { "id": 1, "name": "WGS84" },
                "datafiles": [{ "id": 1, "name": "a.csv" }]
            }
        })
    );
    assert_eq!(count(&database, "dataset").await, 1);
    assert_eq!(count(&database, "datafile").await, 1);
    // The Crs given by id was attached, not copied.
    assert_eq!(count(&database, "crs").await, 1);
}

#[tokio::test]
async fn test_create_with_unknown_nested_id_fails() {
    let (schema, database) = schema();

    let response = run(
        &schema,
        r#"mutation {
            CreateDataset(input: { name: "rivers", crs: { id: 7, name: "x" }, datafiles: [] }) { id }
        }"#,
    )
    .await;

    assert_eq!(error_message(&response), "Could not find Crs with id: '7'");
    assert_eq!(count(&database, "dataset").await, 0);
}

#[tokio::test]
async fn test_fetch_all_and_by_id() {
    let (schema, _) = schema();
    let id = seed(&schema).await;

    let all = data(run(&schema, "{ FetchAllDatasets { id name datafiles { name } } }").await);
    assert_eq!(
        all,
        json!({
            "FetchAllDatasets": [
                { "id": id, "name": "rivers", "datafiles": [{ "name": "a.csv" }, { "name": "b.csv" }] }
            ]
        })
    );

    let one = data(run(&schema, &format!("{{ FetchDatasetById(id: {id}) {{ crs {{ name }} }} }}")).await);
    assert_eq!(one, json!({ "FetchDatasetById": { "crs": { "name": "WGS84" } } }));
}

#[tokio::test]
async fn test_fetch_by_id_miss_depends_on_nullability() {
    let (schema, _) = schema();

    let optional = data(run(&schema, "{ FetchCrsById(id: 3) { id } }").await);
    assert_eq!(optional, json!({ "FetchCrsById": null }));

    let required = run(&schema, "{ FetchDatasetById(id: 3) { id } }").await;
    assert_eq!(error_message(&required), "Could not find Dataset with id: '3'");
}

#[tokio::test]
async fn test_lazy_loading_matches_eager_loading() {
    let config = StrawchemyConfig {
        eager_load: false,
        ..StrawchemyConfig::default()
    };
    let (schema, _) = build(config);
    seed(&schema).await;

    let all = data(run(&schema, "{ FetchAllDatasets { name crs { name } datafiles { name } } }").await);
    assert_eq!(
        all,
        json!({
            "FetchAllDatasets": [{
                "name": "rivers",
                "crs": { "name": "WGS84" },
                "datafiles": [{ "name": "a.csv" }, { "name": "b.csv" }]
            }]
        })
    );
}

#[tokio::test]
async fn test_fetch_all_ids_and_page() {
    let (schema, _) = schema();
    seed(&schema).await;
    for name in ["lakes", "roads"] {
        let request = format!(
            r#"mutation {{ CreateDataset(input: {{ name: "{name}", crs: {{ id: 1, name: "WGS84" }}, datafiles: [] }}) {{ id }} }}"#
        );
        data(run(&schema, &request).await);
    }

    let by_ids = data(run(&schema, "{ FetchAllDatasets(ids: [3, 1, 3, 42]) { id } }").await);
    assert_eq!(by_ids, json!({ "FetchAllDatasets": [{ "id": 1 }, { "id": 3 }] }));

    let paged = data(run(&schema, "{ FetchAllDatasets(page: { page: 2, pageSize: 2 }) { name } }").await);
    assert_eq!(paged, json!({ "FetchAllDatasets": [{ "name": "roads" }] }));

    let invalid = run(&schema, "{ FetchAllDatasets(page: { page: 0, pageSize: 2 }) { id } }").await;
    assert_eq!(error_message(&invalid), "page and pageSize must be at least 1");
}

#[tokio::test]
async fn test_fetch_all_ids_error_policy() {
    let config = StrawchemyConfig {
        fetch_by_ids_partial_miss: PartialMissPolicy::Error,
        ..StrawchemyConfig::default()
    };
    let (schema, _) = build(config);
    seed(&schema).await;

    let response = run(&schema, "{ FetchAllDatasets(ids: [1, 42]) { id } }").await;
    assert_eq!(error_message(&response), "Could not find Dataset with id: '42'");
}

#[tokio::test]
async fn test_update_merges_collection() {
    let (schema, database) = schema();
    let id = seed(&schema).await;

    let updated = data(
        run(
            &schema,
            &format!(
                r#"mutation {{
                    UpdateDataset(input: {{
                        id: {id},
                        name: "streams",
                        datafiles: [{{ id: 2, name: "b2.csv" }}, {{ name: "c.csv" }}]
                    }}) {{ name datafiles {{ id name }} }}
                }}"#
            ),
        )
        .await,
    );

    assert_eq!(
        updated,
        json!({
            "UpdateDataset": {
                "name": "streams",
                "datafiles": [
                    { "id": 1, "name": "a.csv" },
                    { "id": 2, "name": "b2.csv" },
                    { "id": 3, "name": "c.csv" }
                ]
            }
        })
    );
    assert_eq!(count(&database, "datafile").await, 3);
}

#[tokio::test]
async fn test_update_with_foreign_collection_element_is_rejected() {
    let (schema, _) = schema();
    let id = seed(&schema).await;

    let response = run(
        &schema,
        &format!(r#"mutation {{ UpdateDataset(input: {{ id: {id}, name: "x", datafiles: [{{ id: 99 }}] }}) {{ id }} }}"#),
    )
    .await;
    assert!(error_message(&response).starts_with("Could not find Datafile with id: '99'"));

    // Nothing from the failed mutation was kept.
    let after = data(run(&schema, &format!("{{ FetchDatasetById(id: {id}) {{ name }} }}")).await);
    assert_eq!(after, json!({ "FetchDatasetById": { "name": "rivers" } }));
}

#[tokio::test]
async fn test_update_requires_id_and_existing_row() {
    let (schema, _) = schema();

    let missing_id = run(&schema, r#"mutation { UpdateDataset(input: { name: "x" }) { id } }"#).await;
    assert_eq!(error_message(&missing_id), "Missing 'id' on update mutation input parameter");

    let missing_row = run(&schema, r#"mutation { UpdateDataset(input: { id: 5, name: "x" }) { id } }"#).await;
    assert_eq!(error_message(&missing_row), "Could not find Dataset with id: '5'");
}

#[tokio::test]
async fn test_delete_cascades_to_owned_rows_only() {
    let (schema, database) = schema();
    let id = seed(&schema).await;

    let deleted = data(
        run(
            &schema,
            &format!("mutation {{ DeleteDataset(id: {id}) {{ name crs {{ name }} datafiles {{ name }} }} }}"),
        )
        .await,
    );
    assert_eq!(
        deleted,
        json!({
            "DeleteDataset": {
                "name": "rivers",
                "crs": { "name": "WGS84" },
                "datafiles": [{ "name": "a.csv" }, { "name": "b.csv" }]
            }
        })
    );

    assert_eq!(count(&database, "dataset").await, 0);
    assert_eq!(count(&database, "datafile").await, 0);
    assert_eq!(count(&database, "crs").await, 1);

    let again = run(&schema, &format!("mutation {{ DeleteDataset(id: {id}) {{ id }} }}")).await;
    assert_eq!(error_message(&again), format!("Could not find Dataset with id: '{id}'"));
}

#[tokio::test]
async fn test_requests_without_session_are_unhandled() {
    let schema = StrawchemyBuilder::new(registry()).query(query()).build().unwrap();

    let no_database = run(&schema, "{ FetchAllDatasets { id } }").await;
    assert_eq!(error_message(&no_database), UNHANDLED_ERROR_MESSAGE);

    let no_session = schema
        .dynamic_schema()
        .execute(Request::new("{ FetchAllDatasets { id } }"))
        .await;
    assert_eq!(error_message(&no_session), UNHANDLED_ERROR_MESSAGE);
}

#[test]
fn test_list_by_id_is_rejected_at_build() {
    let query = RootDeclaration::query()
        .field("FetchDatasetById", FieldType::list(FieldType::model("Dataset")));
    let err = StrawchemyBuilder::new(registry()).query(query).build().unwrap_err();

    assert!(matches!(
        err,
        GraphQLError::Binding(BindingError::ListByIdReturn { ref field }) if field == "FetchDatasetById"
    ));
}

#[test]
fn test_sdl_lists_derived_types() {
    let (schema, _) = schema();
    let sdl = schema.sdl();

    assert!(sdl.contains("type Dataset {"));
    assert!(sdl.contains("input DatasetCreate {"));
    assert!(sdl.contains("input DatasetUpdate {"));
    assert!(!schema.ddl().is_empty());
}

#[test]
fn test_query_only_schema_has_no_mutation_root() {
    let schema = StrawchemyBuilder::new(registry()).query(query()).build().unwrap();
    assert!(!schema.sdl().contains("type Mutation"));
}
