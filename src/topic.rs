use diesel::insert_into;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use rocket::http::Status;
use rocket::serde::json::{self, Json};
use rocket::{get, post};
use serde_derive::{Deserialize, Serialize};

use crate::db::schema::topics;
use crate::db::DbConnection;
use crate::types::*;

#[derive(Debug, Queryable, Selectable, Insertable, Serialize, Deserialize)]
#[diesel(table_name = topics)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Topic {
    pub slug: String,
    pub description: String,
}

impl Validate for Topic {
    type Error = ApiError;
    fn validate(self) -> Result<Self, ApiError> {
        require_text(&[self.slug.as_str(), self.description.as_str()])?;
        Ok(self)
    }
}

#[derive(Debug, Serialize)]
pub struct TopicsResponse {
    topics: Vec<Topic>,
}

#[derive(Debug, Serialize)]
pub struct TopicResponse {
    topic: Topic,
}

pub fn select_topics(connection: &mut PgConnection) -> Result<Vec<Topic>, ApiError> {
    let all = topics::table
        .order(topics::slug.asc())
        .select(Topic::as_select())
        .load::<Topic>(connection)?;
    Ok(all)
}

pub fn insert_topic(topic: Topic, connection: &mut PgConnection) -> Result<Topic, ApiError> {
    let created = insert_into(topics::table)
        .values(&topic)
        .get_result::<Topic>(connection)?;
    Ok(created)
}

#[get("/")]
pub async fn list(connection: DbConnection) -> ApiResult<TopicsResponse> {
    let topics = connection.run(select_topics).await?;
    Ok(Json(TopicsResponse { topics }))
}

#[post("/", data = "<topic>")]
pub async fn create(
    connection: DbConnection,
    topic: Result<Json<Topic>, json::Error<'_>>,
) -> CreatedResult<TopicResponse> {
    let topic = topic?.validate()?.into_inner();
    let topic = connection
        .run(move |conn| insert_topic(topic, conn))
        .await?;
    Ok((Status::Created, Json(TopicResponse { topic })))
}
