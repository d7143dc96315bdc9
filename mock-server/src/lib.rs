//! Fixture web server used to exercise the REST client in integration tests.
//!
//! # Design
//! A small axum app exposing the `/api/test` endpoints the client tests
//! rely on: JSON and XML fixtures, echo endpoints for text and structured
//! bodies, header echoes, and endpoints producing every interesting status
//! class (204, 302, 4xx with JSON and non-JSON error bodies). The server
//! holds no state; every handler is a pure function of the request.

use axum::extract::{Path, Query};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;

/// The model served and echoed by the fixture endpoints. Serialized with
/// PascalCase keys, matching the client-side test DTOs.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct TestModel {
    pub id: i32,
    pub name: String,
}

fn models() -> Vec<TestModel> {
    vec![
        TestModel {
            id: 1,
            name: "Gino".to_string(),
        },
        TestModel {
            id: 2,
            name: "Pino".to_string(),
        },
    ]
}

pub fn app() -> Router {
    Router::new()
        .route("/api/test", get(list_models).post(echo_model))
        .route("/api/test/{id}", get(get_model).put(put_model).delete(delete_model))
        .route("/api/test/error", get(error_json))
        .route("/api/test/errorashtml", get(error_as_html))
        .route("/api/test/textecho", post(text_echo).put(text_echo))
        .route("/api/test/text", post(text_if_plain))
        .route("/api/test/mykey", get(echo_mykey))
        .route("/api/test/authorization", get(echo_authorization))
        .route("/api/test/date", get(echo_date))
        .route("/api/test/returnnocontent", get(no_content))
        .route("/api/test/html", get(html))
        .route("/api/test/redirect", get(redirect))
        .route("/api/test/xml", get(xml_model))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn list_models() -> Json<Vec<TestModel>> {
    Json(models())
}

async fn get_model(Path(id): Path<i32>) -> Result<impl IntoResponse, StatusCode> {
    let model = models()
        .into_iter()
        .find(|m| m.id == id)
        .ok_or(StatusCode::NOT_FOUND)?;
    let name = model.name.to_lowercase();
    Ok(([("x-name", name)], Json(model)))
}

async fn echo_model(Json(model): Json<TestModel>) -> Json<TestModel> {
    Json(model)
}

async fn put_model(Path(_id): Path<i32>, Json(model): Json<TestModel>) -> Json<TestModel> {
    Json(model)
}

#[derive(Deserialize)]
struct DeleteParams {
    #[serde(rename = "errorCode")]
    error_code: Option<u16>,
}

async fn delete_model(Path(_id): Path<i32>, Query(params): Query<DeleteParams>) -> StatusCode {
    match params.error_code {
        Some(code) => StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        None => StatusCode::OK,
    }
}

async fn error_json() -> impl IntoResponse {
    let body = json!({
        "Error": {
            "Code": "MyErrorCode",
            "Message": "MyErrorMessage"
        }
    });
    (StatusCode::BAD_REQUEST, Json(body))
}

/// A 400 whose body is HTML but whose declared content type is XML, for
/// exercising the error-body parse-failure path.
async fn error_as_html() -> impl IntoResponse {
    (
        StatusCode::BAD_REQUEST,
        [(header::CONTENT_TYPE, "application/xml")],
        "<html><body>bad request</body></html>",
    )
}

async fn text_echo(body: String) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/plain")], body)
}

/// Echoes the body only when the request declared a `text/plain` content
/// type; otherwise answers with an empty body.
async fn text_if_plain(headers: HeaderMap, body: String) -> impl IntoResponse {
    let is_plain = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("text/plain"));
    let body = if is_plain { body } else { String::new() };
    ([(header::CONTENT_TYPE, "text/plain")], body)
}

fn header_value(headers: &HeaderMap, key: &str) -> String {
    headers
        .get(key)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

async fn echo_mykey(headers: HeaderMap) -> String {
    header_value(&headers, "MyKey")
}

async fn echo_authorization(headers: HeaderMap) -> String {
    header_value(&headers, "Authorization")
}

async fn echo_date(headers: HeaderMap) -> String {
    header_value(&headers, "Date")
}

async fn no_content() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn html() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/html")],
        "<html><body>Ciao</body></html>",
    )
}

async fn redirect() -> impl IntoResponse {
    (
        StatusCode::FOUND,
        [(header::LOCATION, "http://www.example.com/")],
    )
}

async fn xml_model() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/xml")],
        "<TestModel><Id>1</Id><Name>Gino</Name></TestModel>",
    )
}
