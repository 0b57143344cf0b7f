use super::*;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{TimeZone, Utc};
use shared::domain::{SortBy, SortOrder};
use std::sync::Arc;
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone, Default)]
struct ServerState {
    list_queries: Arc<Mutex<Vec<CarListQuery>>>,
    deleted: Arc<Mutex<Vec<i64>>>,
}

fn sample_car(id: i64, name: &str) -> Car {
    Car {
        id: CarId(id),
        name: name.to_string(),
        description: format!("{name} description"),
        image_url: format!("https://images.example.com/{id}.jpg"),
        car_type: "manual".to_string(),
        tags: vec!["sport".to_string()],
        specifications: None,
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
    }
}

async fn handle_list(
    State(state): State<ServerState>,
    Query(query): Query<CarListQuery>,
) -> Json<Vec<CarListItem>> {
    state.list_queries.lock().await.push(query);
    Json(vec![CarListItem::from(&sample_car(1, "Beetle"))])
}

async fn handle_get(Path(id): Path<i64>) -> axum::response::Response {
    if id == 1 {
        Json(sample_car(1, "Beetle")).into_response()
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "statusCode": 404, "message": "Car not found" })),
        )
            .into_response()
    }
}

async fn handle_create(Json(car): Json<NewCar>) -> axum::response::Response {
    if car.name.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "statusCode": 400,
                "message": ["name should not be empty"],
                "error": "Bad Request"
            })),
        )
            .into_response();
    }
    let mut created = sample_car(42, &car.name);
    created.car_type = car.car_type;
    created.tags = car.tags;
    (StatusCode::CREATED, Json(created)).into_response()
}

async fn handle_delete(State(state): State<ServerState>, Path(id): Path<i64>) -> StatusCode {
    state.deleted.lock().await.push(id);
    StatusCode::NO_CONTENT
}

async fn spawn_car_server() -> anyhow::Result<(String, ServerState)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = ServerState::default();
    let app = Router::new()
        .route("/api/cars", get(handle_list).post(handle_create))
        .route(
            "/api/cars/types",
            get(|| async { Json(vec!["automatic", "manual"]) }),
        )
        .route("/api/cars/tags", get(|| async { "not json" }))
        .route(
            "/api/cars/reset",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        )
        .route("/api/cars/:id", get(handle_get).delete(handle_delete))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}"), state))
}

#[tokio::test]
async fn list_sends_only_non_empty_filters() {
    let (server_url, state) = spawn_car_server().await.expect("spawn server");
    let api = HttpCarApi::new(&server_url).expect("api");

    let query = CarListQuery {
        search: Some("bee".into()),
        car_type: None,
        tags: Some("sport,classic".into()),
        sort_by: Some(SortBy::CreatedAt),
        sort_order: Some(SortOrder::Descending),
    };
    let items = api.list_cars(&query).await.expect("list");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].name, "Beetle");

    let seen = state.list_queries.lock().await;
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0], query);
}

#[tokio::test]
async fn get_by_id_maps_not_found_body_message() {
    let (server_url, _) = spawn_car_server().await.expect("spawn server");
    let api = HttpCarApi::new(&server_url).expect("api");

    let car = api.get_car(CarId(1)).await.expect("found");
    assert_eq!(car.name, "Beetle");

    let err = api.get_car(CarId(99)).await.expect_err("missing");
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "Error 404: Car not found");
}

#[tokio::test]
async fn create_returns_server_assigned_fields() {
    let (server_url, _) = spawn_car_server().await.expect("spawn server");
    let api = HttpCarApi::new(&server_url).expect("api");

    let created = api
        .create_car(&NewCar {
            name: "Golf".into(),
            description: "Hatchback".into(),
            image_url: "https://images.example.com/golf.jpg".into(),
            car_type: "automatic".into(),
            tags: vec!["family".into()],
        })
        .await
        .expect("create");
    assert_eq!(created.id, CarId(42));
    assert_eq!(created.car_type, "automatic");
    assert_eq!(created.tags, vec!["family"]);
}

#[tokio::test]
async fn validation_rejection_joins_message_list() {
    let (server_url, _) = spawn_car_server().await.expect("spawn server");
    let api = HttpCarApi::new(&server_url).expect("api");

    let err = api
        .create_car(&NewCar {
            name: String::new(),
            description: "x".into(),
            image_url: "https://x.example".into(),
            car_type: "manual".into(),
            tags: Vec::new(),
        })
        .await
        .expect_err("rejected");
    assert_eq!(
        err,
        ApiFailure::ServerRejection {
            status: 400,
            message: "name should not be empty".into()
        }
    );
}

#[tokio::test]
async fn rejection_without_json_body_falls_back_to_bad_request() {
    let (server_url, _) = spawn_car_server().await.expect("spawn server");
    let api = HttpCarApi::new(&server_url).expect("api");

    let err = api.reset_catalog().await.expect_err("rejected");
    assert_eq!(err.to_string(), "Error 500: Bad Request");
}

#[tokio::test]
async fn undecodable_body_is_a_client_failure() {
    let (server_url, _) = spawn_car_server().await.expect("spawn server");
    let api = HttpCarApi::new(&server_url).expect("api");

    let err = api.car_tags().await.expect_err("not json");
    assert!(matches!(err, ApiFailure::ClientFailure { .. }), "{err:?}");
    assert_eq!(err.to_string(), "Unexpected error occurred");

    let types = api.car_types().await.expect("types");
    assert_eq!(types, vec!["automatic", "manual"]);
}

#[tokio::test]
async fn delete_hits_item_path() {
    let (server_url, state) = spawn_car_server().await.expect("spawn server");
    let api = HttpCarApi::new(&format!("{server_url}/")).expect("api");

    api.delete_car(CarId(7)).await.expect("delete");
    assert_eq!(*state.deleted.lock().await, vec![7]);
}

#[tokio::test]
async fn unreachable_server_is_no_response() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let api = HttpCarApi::new(&format!("http://{addr}")).expect("api");
    let err = api.car_types().await.expect_err("refused");
    assert!(matches!(err, ApiFailure::NoResponse { .. }), "{err:?}");
    assert_eq!(err.to_string(), "No response received from the server.");
}

#[test]
fn base_url_keeps_path_prefix_and_rejects_other_schemes() {
    let url = parse_base_url("http://localhost:3000/catalog").expect("url");
    assert_eq!(
        url.join(CARS_PATH).expect("join").as_str(),
        "http://localhost:3000/catalog/api/cars"
    );

    assert!(parse_base_url("ftp://localhost").is_err());
    assert!(parse_base_url("not a url").is_err());
}
