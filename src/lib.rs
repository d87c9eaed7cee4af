#[macro_use]
extern crate error_chain;

pub mod api;
pub mod article;
pub mod comment;
pub mod db;
pub mod listing;
pub mod topic;
pub mod types;
pub mod users;
pub mod utils;

use rocket::http::Status;
use rocket::request::Request;
use rocket::serde::json::Json;
use rocket::{catch, catchers, routes, Build, Rocket};
use serde_json::{json, Value};

use crate::types::{ApiError, Resource};

pub const LOG_TARGET: &str = "nc_news";

fn error_body(error: ApiError) -> Json<Value> {
    Json(json!({ "msg": error.message() }))
}

#[catch(404)]
fn not_found(_req: &Request) -> Json<Value> {
    error_body(ApiError::NotFound(Resource::Route))
}

#[catch(400)]
fn bad_request(_req: &Request) -> Json<Value> {
    error_body(ApiError::BadRequest)
}

#[catch(422)]
fn unprocessable(_req: &Request) -> (Status, Json<Value>) {
    (Status::BadRequest, error_body(ApiError::BadRequest))
}

#[catch(500)]
fn internal_error(_req: &Request) -> Json<Value> {
    error_body(ApiError::Internal)
}

/// Assembles the application around an existing pool.
pub fn rocket(pool: db::Pool) -> Rocket<Build> {
    rocket::build()
        .manage(pool)
        .mount("/api", routes![api::endpoints])
        .mount("/api/topics", routes![topic::list, topic::create])
        .mount(
            "/api/articles",
            routes![
                article::list,
                article::fetch,
                article::create,
                article::update_votes,
                article::remove,
                comment::list_for_article,
                comment::add,
            ],
        )
        .mount(
            "/api/comments",
            routes![comment::fetch, comment::update_votes, comment::remove],
        )
        .mount("/api/users", routes![users::list, users::fetch])
        .register(
            "/",
            catchers![not_found, bad_request, unprocessable, internal_error],
        )
}
