//! Requests that must be answered without touching the store.
//!
//! The pool points at an unreachable address and is never connected, so any
//! test here that reached the database would fail.

use nc_news::db;
use rocket::http::{ContentType, Status};
use rocket::local::blocking::Client;
use rstest::{fixture, rstest};
use serde_json::Value;

const UNREACHABLE: &str = "postgres://nc_news@127.0.0.1:1/unreachable";

#[fixture]
fn client() -> Client {
    let pool = db::init_pool_unchecked(UNREACHABLE);
    Client::tracked(nc_news::rocket(pool)).expect("valid rocket instance")
}

fn msg(body: Option<Value>) -> String {
    body.and_then(|b| b["msg"].as_str().map(str::to_owned))
        .unwrap_or_default()
}

#[rstest]
fn api_documents_endpoints(client: Client) {
    let response = client.get("/api").dispatch();
    assert_eq!(response.status(), Status::Ok);
    let body = response.into_json::<Value>().unwrap();
    let endpoints = body["endpoints"].as_object().unwrap();
    assert!(endpoints.contains_key("GET /api/articles"));
    assert!(endpoints.contains_key("PATCH /api/comments/:comment_id"));
}

#[rstest]
#[case("/api/topix")]
#[case("/api/articles/1/comments/2")]
#[case("/nowhere")]
fn unknown_routes_are_not_found(client: Client, #[case] path: &str) {
    let response = client.get(path).dispatch();
    assert_eq!(response.status(), Status::NotFound);
    assert_eq!(msg(response.into_json()), "Route not found");
}

#[rstest]
fn unsupported_method_is_not_found(client: Client) {
    let response = client.post("/api/users").dispatch();
    assert_eq!(response.status(), Status::NotFound);
    assert_eq!(msg(response.into_json()), "Route not found");
}

#[rstest]
#[case("/api/articles?sort_by=body", "Invalid sort_by query")]
#[case("/api/articles?sort_by=votes%3B%20DROP%20TABLE%20articles", "Invalid sort_by query")]
#[case("/api/articles?order=sideways", "Invalid order query")]
#[case("/api/articles?sort_by=nope&order=nope", "Invalid sort_by query")]
#[case("/api/articles?p=0", "Limit and page number must be greater than 0")]
#[case("/api/articles?limit=0", "Limit and page number must be greater than 0")]
#[case("/api/articles?limit=-5", "Limit and page number must be greater than 0")]
#[case("/api/articles?limit=ten", "Bad request")]
#[case("/api/articles?p=second", "Bad request")]
#[case("/api/articles/banana", "Bad request")]
#[case("/api/articles/banana/comments", "Bad request")]
#[case("/api/articles/1/comments?p=0", "Limit and page number must be greater than 0")]
#[case("/api/articles/1/comments?limit=many", "Bad request")]
#[case("/api/comments/first", "Bad request")]
fn invalid_queries_are_rejected(client: Client, #[case] uri: &str, #[case] expected: &str) {
    let response = client.get(uri).dispatch();
    assert_eq!(response.status(), Status::BadRequest);
    assert_eq!(msg(response.into_json()), expected);
}

#[rstest]
#[case("/api/articles/1", r#"{"inc_votes":"one"}"#)]
#[case("/api/articles/1", r#"{}"#)]
#[case("/api/articles/1", r#"{"inc_votes":1.5}"#)]
#[case("/api/articles/one", r#"{"inc_votes":1}"#)]
#[case("/api/comments/1", r#"{"votes":1}"#)]
#[case("/api/comments/1", "{")]
fn invalid_vote_updates_are_rejected(client: Client, #[case] uri: &str, #[case] body: &str) {
    let response = client
        .patch(uri)
        .header(ContentType::JSON)
        .body(body)
        .dispatch();
    assert_eq!(response.status(), Status::BadRequest);
    assert_eq!(msg(response.into_json()), "Bad request");
}

#[rstest]
#[case("/api/articles/1/comments", r#"{"username":5,"body":"hi"}"#)]
#[case("/api/articles/1/comments", r#"{"username":"lurker"}"#)]
#[case("/api/articles/1/comments", r#"{"username":"lurker","body":"   "}"#)]
#[case("/api/articles/nine/comments", r#"{"username":"lurker","body":"hi"}"#)]
#[case("/api/articles", r#"{"author":"lurker","title":"t","body":"b"}"#)]
#[case("/api/articles", r#"{"author":"lurker","title":"t","body":"b","topic":false}"#)]
#[case("/api/topics", r#"{"slug":"dogs"}"#)]
#[case("/api/topics", r#"{"slug":"dogs","description":["woof"]}"#)]
#[case("/api/topics", "not json")]
fn invalid_bodies_are_rejected(client: Client, #[case] uri: &str, #[case] body: &str) {
    let response = client
        .post(uri)
        .header(ContentType::JSON)
        .body(body)
        .dispatch();
    assert_eq!(response.status(), Status::BadRequest);
    assert_eq!(msg(response.into_json()), "Bad request");
}

#[rstest]
#[case("/api/articles/abc")]
#[case("/api/comments/abc")]
fn delete_with_malformed_id(client: Client, #[case] uri: &str) {
    let response = client.delete(uri).dispatch();
    assert_eq!(response.status(), Status::BadRequest);
}

#[test]
fn missing_pool_state_is_internal_error() {
    let rocket = rocket::build().mount("/api/topics", rocket::routes![nc_news::topic::list]);
    let client = Client::tracked(rocket).expect("valid rocket instance");
    let response = client.get("/api/topics").dispatch();
    assert_eq!(response.status(), Status::InternalServerError);
}
