//! Local HTTP services used to exercise the dispatcher over real sockets.
//!
//! Routes:
//! - `/greeting`: GET/DELETE answer a fixed greeting, POST/PUT/PATCH echo
//!   the `name` form field back.
//! - `/echo`: any method; reports what the server received.
//! - `/status/{code}`: replies with that status and an empty body.
//! - `/malformed`: 200 with a body that is not JSON.
//! - `/slow/{ms}`: waits, then replies `{}`.
//! - `/cities?name=`, `/population?id=`, `/weather?id=`: three independent
//!   lookups keyed by city name or id.

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    extract::{Path, Query, RawQuery},
    http::{header, HeaderMap, Method, StatusCode},
    routing::{any, get},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tracing::debug;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    pub id: u32,
    pub name: String,
    pub state: String,
}

const CITIES: [(u32, &str, &str, u64, i32); 3] = [
    (1, "New York", "New York", 8_804_190, 46),
    (2, "Los Angeles", "California", 3_898_747, 60),
    (3, "Chicago", "Illinois", 2_746_388, 54),
];

#[derive(Deserialize)]
pub struct NameForm {
    pub name: Option<String>,
}

#[derive(Deserialize)]
pub struct IdQuery {
    pub id: u32,
}

/// What `/echo` saw of the incoming request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Echo {
    pub method: String,
    pub query: Option<String>,
    pub body: String,
    pub content_type: Option<String>,
    pub content_length: Option<String>,
}

pub fn app() -> Router {
    Router::new()
        .route(
            "/greeting",
            get(greet)
                .delete(greet)
                .post(greet_by_name)
                .put(greet_by_name)
                .patch(greet_by_name),
        )
        .route("/echo", any(echo))
        .route("/status/{code}", any(status))
        .route("/malformed", any(malformed))
        .route("/slow/{ms}", any(slow))
        .route("/cities", get(find_city))
        .route("/population", get(population))
        .route("/weather", get(weather))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Start the server on an ephemeral local port in a background thread and
/// return its address. The server lives until the process exits.
pub fn spawn_background() -> std::io::Result<SocketAddr> {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    let addr = std_listener.local_addr()?;
    std_listener.set_nonblocking(true)?;

    std::thread::spawn(move || -> std::io::Result<()> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        rt.block_on(async {
            let listener = TcpListener::from_std(std_listener)?;
            run(listener).await
        })
    });

    Ok(addr)
}

async fn greet() -> Json<Value> {
    Json(json!({ "word": "hello", "name": "Rob" }))
}

async fn greet_by_name(Form(input): Form<NameForm>) -> Json<Value> {
    match input.name {
        Some(name) => Json(json!({ "word": "hello", "name": name })),
        None => Json(json!({ "word": "hello" })),
    }
}

async fn echo(method: Method, RawQuery(query): RawQuery, headers: HeaderMap, body: String) -> Json<Echo> {
    let header_value = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };
    Json(Echo {
        method: method.to_string(),
        query,
        body,
        content_type: header_value(header::CONTENT_TYPE),
        content_length: header_value(header::CONTENT_LENGTH),
    })
}

async fn status(Path(code): Path<u16>) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

async fn malformed() -> (StatusCode, &'static str) {
    (StatusCode::OK, "this is not json")
}

async fn slow(Path(ms): Path<u64>) -> Json<Value> {
    tokio::time::sleep(Duration::from_millis(ms)).await;
    Json(json!({}))
}

async fn find_city(Query(input): Query<NameForm>) -> Result<Json<City>, StatusCode> {
    let name = input.name.ok_or(StatusCode::BAD_REQUEST)?;
    debug!(%name, "city lookup");
    CITIES
        .iter()
        .find(|(_, city, ..)| *city == name)
        .map(|&(id, name, state, ..)| {
            Json(City {
                id,
                name: name.to_string(),
                state: state.to_string(),
            })
        })
        .ok_or(StatusCode::NOT_FOUND)
}

async fn population(Query(input): Query<IdQuery>) -> Result<Json<Value>, StatusCode> {
    CITIES
        .iter()
        .find(|(id, ..)| *id == input.id)
        .map(|&(id, _, _, population, _)| Json(json!({ "id": id, "population": population })))
        .ok_or(StatusCode::NOT_FOUND)
}

async fn weather(Query(input): Query<IdQuery>) -> Result<Json<Value>, StatusCode> {
    CITIES
        .iter()
        .find(|(id, ..)| *id == input.id)
        .map(|&(id, _, _, _, temperature)| Json(json!({ "id": id, "temperature": temperature })))
        .ok_or(StatusCode::NOT_FOUND)
}
