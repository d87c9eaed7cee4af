use diesel::pg::PgConnection;
use diesel::prelude::*;
use serde_derive::Serialize;

use crate::db::schema::users;
use crate::types::{ApiError, Resource};

#[derive(Debug, Queryable, Selectable, Serialize)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub username: String,
    pub name: String,
    pub avatar_url: String,
}

impl User {
    pub fn load_all(connection: &mut PgConnection) -> Result<Vec<User>, ApiError> {
        let all = users::table
            .order(users::username.asc())
            .select(User::as_select())
            .load::<User>(connection)?;
        Ok(all)
    }

    pub fn load_by_name(name: &str, connection: &mut PgConnection) -> Result<User, ApiError> {
        users::table
            .find(name)
            .select(User::as_select())
            .first::<User>(connection)
            .optional()?
            .ok_or(ApiError::NotFound(Resource::User))
    }
}
