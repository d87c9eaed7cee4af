use chrono::NaiveDateTime;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::{delete as diesel_delete, insert_into, update as diesel_update};
use rocket::http::Status;
use rocket::serde::json::{self, Json};
use rocket::{delete, get, patch, post};
use serde_derive::{Deserialize, Serialize};

use crate::db::schema::comments;
use crate::db::{ArticleRow, CheckExists, DbConnection};
use crate::listing::{PageParams, Pagination};
use crate::types::*;
use crate::utils::serialize_date;

#[derive(Debug, Queryable, Selectable, Serialize)]
#[diesel(table_name = comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Comment {
    pub comment_id: i32,
    pub body: String,
    pub article_id: i32,
    pub author: String,
    pub votes: i32,
    #[serde(serialize_with = "serialize_date")]
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = comments)]
pub struct NewComment {
    body: String,
    article_id: i32,
    author: String,
}

/// Request body: `username` becomes the comment's author.
#[derive(Debug, Deserialize)]
pub struct CommentDraft {
    username: String,
    body: String,
}

impl Validate for CommentDraft {
    type Error = ApiError;
    fn validate(self) -> Result<Self, ApiError> {
        require_text(&[self.username.as_str(), self.body.as_str()])?;
        Ok(self)
    }
}

impl CommentDraft {
    fn into_new_comment(self, article_id: i32) -> NewComment {
        NewComment {
            body: self.body,
            article_id,
            author: self.username,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CommentContainer<T> {
    comment: T,
}

#[derive(Debug, Serialize)]
pub struct CommentsContainer<T> {
    comments: T,
}

/// Newest first. A missing article is `NotFound`, an article without
/// comments is an empty page.
pub fn select_comments_by_article_id(
    article_id: i32,
    pagination: Pagination,
    connection: &mut PgConnection,
) -> Result<Vec<Comment>, ApiError> {
    connection
        .build_transaction()
        .read_only()
        .repeatable_read()
        .run(|conn| {
            ArticleRow::check_exists(&article_id, conn)?;
            let page = comments::table
                .filter(comments::article_id.eq(article_id))
                .order(comments::created_at.desc())
                .limit(pagination.limit)
                .offset(pagination.offset)
                .select(Comment::as_select())
                .load::<Comment>(conn)?;
            Ok(page)
        })
}

pub fn select_comment_by_id(comment_id: i32, connection: &mut PgConnection) -> Result<Comment, ApiError> {
    comments::table
        .find(comment_id)
        .select(Comment::as_select())
        .first::<Comment>(connection)
        .optional()?
        .ok_or(ApiError::NotFound(Resource::Comment))
}

pub fn insert_comment(new_comment: NewComment, connection: &mut PgConnection) -> Result<Comment, ApiError> {
    connection.transaction(|conn| {
        ArticleRow::check_exists(&new_comment.article_id, conn)?;
        let comment = insert_into(comments::table)
            .values(&new_comment)
            .get_result::<Comment>(conn)?;
        Ok(comment)
    })
}

pub fn update_comment_votes(
    comment_id: i32,
    update: VoteUpdate,
    connection: &mut PgConnection,
) -> Result<Comment, ApiError> {
    connection.transaction(|conn| {
        let votes = comments::table
            .find(comment_id)
            .select(comments::votes)
            .for_update()
            .first::<i32>(conn)
            .optional()?
            .ok_or(ApiError::NotFound(Resource::Comment))?;
        let votes = update.apply_to(votes)?;
        let updated = diesel_update(comments::table.find(comment_id))
            .set(comments::votes.eq(votes))
            .get_result::<Comment>(conn)?;
        Ok(updated)
    })
}

pub fn remove_comment_by_id(comment_id: i32, connection: &mut PgConnection) -> Result<(), ApiError> {
    let deleted = diesel_delete(comments::table.find(comment_id)).execute(connection)?;
    if deleted == 0 {
        Err(ApiError::NotFound(Resource::Comment))
    } else {
        Ok(())
    }
}

#[get("/<article_id>/comments?<params..>")]
pub async fn list_for_article(
    connection: DbConnection,
    article_id: Result<i32, &str>,
    params: PageParams,
) -> ApiResult<CommentsContainer<Vec<Comment>>> {
    let article_id = parse_id(article_id)?;
    let pagination = Pagination::from_params(&params)?;
    let comments = connection
        .run(move |conn| select_comments_by_article_id(article_id, pagination, conn))
        .await?;
    Ok(Json(CommentsContainer { comments }))
}

#[post("/<article_id>/comments", data = "<details>")]
pub async fn add(
    connection: DbConnection,
    article_id: Result<i32, &str>,
    details: Result<Json<CommentDraft>, json::Error<'_>>,
) -> CreatedResult<CommentContainer<Comment>> {
    let article_id = parse_id(article_id)?;
    let new_comment = details?.validate()?.into_inner().into_new_comment(article_id);
    let comment = connection
        .run(move |conn| insert_comment(new_comment, conn))
        .await?;
    Ok((Status::Created, Json(CommentContainer { comment })))
}

#[get("/<comment_id>")]
pub async fn fetch(
    connection: DbConnection,
    comment_id: Result<i32, &str>,
) -> ApiResult<CommentContainer<Comment>> {
    let comment_id = parse_id(comment_id)?;
    let comment = connection
        .run(move |conn| select_comment_by_id(comment_id, conn))
        .await?;
    Ok(Json(CommentContainer { comment }))
}

#[patch("/<comment_id>", data = "<update>")]
pub async fn update_votes(
    connection: DbConnection,
    comment_id: Result<i32, &str>,
    update: Result<Json<VoteUpdate>, json::Error<'_>>,
) -> ApiResult<CommentContainer<Comment>> {
    let comment_id = parse_id(comment_id)?;
    let update = update?.into_inner();
    let comment = connection
        .run(move |conn| update_comment_votes(comment_id, update, conn))
        .await?;
    Ok(Json(CommentContainer { comment }))
}

#[delete("/<comment_id>")]
pub async fn remove(connection: DbConnection, comment_id: Result<i32, &str>) -> Result<Status, ApiError> {
    let comment_id = parse_id(comment_id)?;
    connection
        .run(move |conn| remove_comment_by_id(comment_id, conn))
        .await?;
    Ok(Status::NoContent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_becomes_author() {
        let draft: CommentDraft =
            serde_json::from_str(r#"{"username":"lurker","body":"first!"}"#).unwrap();
        let new_comment = draft.validate().unwrap().into_new_comment(3);
        assert_eq!(new_comment.author, "lurker");
        assert_eq!(new_comment.article_id, 3);
        assert_eq!(new_comment.body, "first!");
    }

    #[test]
    fn draft_shape_is_checked() {
        assert!(serde_json::from_str::<CommentDraft>(r#"{"username":1,"body":"x"}"#).is_err());
        assert!(serde_json::from_str::<CommentDraft>(r#"{"body":"x"}"#).is_err());
        let blank: CommentDraft =
            serde_json::from_str(r#"{"username":"lurker","body":""}"#).unwrap();
        assert!(matches!(blank.validate(), Err(ApiError::BadRequest)));
    }

    #[test]
    fn vote_update_requires_integer() {
        assert!(serde_json::from_str::<VoteUpdate>(r#"{"inc_votes":"one"}"#).is_err());
        assert!(serde_json::from_str::<VoteUpdate>(r#"{}"#).is_err());
        assert!(serde_json::from_str::<VoteUpdate>(r#"{"inc_votes":1.5}"#).is_err());
        let update: VoteUpdate = serde_json::from_str(r#"{"inc_votes":-1}"#).unwrap();
        assert_eq!(update.inc_votes, -1);
    }
}
