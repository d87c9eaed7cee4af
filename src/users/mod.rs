use rocket::get;
use rocket::serde::json::Json;
use serde_derive::Serialize;

use crate::db::DbConnection;
use crate::types::ApiResult;

pub mod models;

use self::models::User;

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    users: Vec<User>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    user: User,
}

#[get("/")]
pub async fn list(connection: DbConnection) -> ApiResult<UsersResponse> {
    let users = connection.run(User::load_all).await?;
    Ok(Json(UsersResponse { users }))
}

#[get("/<username>")]
pub async fn fetch(connection: DbConnection, username: String) -> ApiResult<UserResponse> {
    let user = connection
        .run(move |conn| User::load_by_name(&username, conn))
        .await?;
    Ok(Json(UserResponse { user }))
}
