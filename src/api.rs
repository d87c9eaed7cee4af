use lazy_static::lazy_static;
use rocket::get;
use rocket::serde::json::Json;
use serde_json::{json, Value};

lazy_static! {
    static ref ENDPOINTS: Value = serde_json::from_str(include_str!("../endpoints.json"))
        .expect("endpoints.json is valid JSON");
}

#[get("/")]
pub fn endpoints() -> Json<Value> {
    Json(json!({ "endpoints": ENDPOINTS.clone() }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let documented = ENDPOINTS.as_object().unwrap();
        for route in [
            "GET /api",
            "GET /api/topics",
            "POST /api/topics",
            "GET /api/articles",
            "POST /api/articles",
            "GET /api/articles/:article_id",
            "PATCH /api/articles/:article_id",
            "DELETE /api/articles/:article_id",
            "GET /api/articles/:article_id/comments",
            "POST /api/articles/:article_id/comments",
            "GET /api/comments/:comment_id",
            "PATCH /api/comments/:comment_id",
            "DELETE /api/comments/:comment_id",
            "GET /api/users",
            "GET /api/users/:username",
        ] {
            assert!(documented.contains_key(route), "{} is undocumented", route);
        }
    }
}
