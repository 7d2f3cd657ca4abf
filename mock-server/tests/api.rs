use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, City, Echo};
use serde_json::Value;
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn empty_request(method: &str, uri: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(String::new())
        .unwrap()
}

fn form_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(body.to_string())
        .unwrap()
}

// --- greeting ---

#[tokio::test]
async fn greeting_get_and_delete_answer_fixed_greeting() {
    for method in ["GET", "DELETE"] {
        let resp = app().oneshot(empty_request(method, "/greeting")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = body_json(resp).await;
        assert_eq!(body, serde_json::json!({ "word": "hello", "name": "Rob" }));
    }
}

#[tokio::test]
async fn greeting_form_methods_echo_name() {
    for method in ["POST", "PUT", "PATCH"] {
        let resp = app()
            .oneshot(form_request(method, "/greeting", "name=Roberto"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = body_json(resp).await;
        assert_eq!(body["name"], "Roberto");
        assert_eq!(body["word"], "hello");
    }
}

#[tokio::test]
async fn greeting_post_without_form_is_rejected() {
    let resp = app().oneshot(empty_request("POST", "/greeting")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

// --- echo ---

#[tokio::test]
async fn echo_reports_query_body_and_headers() {
    let resp = app()
        .oneshot(form_request("PATCH", "/echo?a=1&a=2", "x=y"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.method, "PATCH");
    assert_eq!(echo.query.as_deref(), Some("a=1&a=2"));
    assert_eq!(echo.body, "x=y");
    assert_eq!(echo.content_type.as_deref(), Some("application/x-www-form-urlencoded"));
}

#[tokio::test]
async fn echo_without_query_reports_none() {
    let resp = app().oneshot(empty_request("GET", "/echo")).await.unwrap();
    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.query, None);
    assert!(echo.body.is_empty());
    assert_eq!(echo.content_type, None);
}

// --- status / malformed ---

#[tokio::test]
async fn status_route_returns_requested_code_with_empty_body() {
    for code in [201u16, 400, 404, 503] {
        let resp = app()
            .oneshot(empty_request("GET", &format!("/status/{code}")))
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), code);
        assert!(body_bytes(resp).await.is_empty());
    }
}

#[tokio::test]
async fn malformed_route_returns_non_json() {
    let resp = app().oneshot(empty_request("GET", "/malformed")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_bytes(resp).await;
    assert!(serde_json::from_slice::<Value>(&body).is_err());
}

#[tokio::test]
async fn slow_route_eventually_answers() {
    let resp = app().oneshot(empty_request("GET", "/slow/10")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert_eq!(body, serde_json::json!({}));
}

// --- city services ---

#[tokio::test]
async fn city_lookup_by_name() {
    let resp = app()
        .oneshot(empty_request("GET", "/cities?name=Los+Angeles"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let city: City = body_json(resp).await;
    assert_eq!(city.id, 2);
    assert_eq!(city.state, "California");
}

#[tokio::test]
async fn city_lookup_unknown_is_404() {
    let resp = app()
        .oneshot(empty_request("GET", "/cities?name=Atlantis"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn city_lookup_without_name_is_400() {
    let resp = app().oneshot(empty_request("GET", "/cities")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn population_and_weather_by_id() {
    let resp = app().oneshot(empty_request("GET", "/population?id=3")).await.unwrap();
    let body: Value = body_json(resp).await;
    assert_eq!(body, serde_json::json!({ "id": 3, "population": 2_746_388 }));

    let resp = app().oneshot(empty_request("GET", "/weather?id=3")).await.unwrap();
    let body: Value = body_json(resp).await;
    assert_eq!(body, serde_json::json!({ "id": 3, "temperature": 54 }));
}

#[tokio::test]
async fn population_unknown_id_is_404() {
    let resp = app().oneshot(empty_request("GET", "/population?id=99")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn weather_bad_id_is_400() {
    let resp = app().oneshot(empty_request("GET", "/weather?id=abc")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
