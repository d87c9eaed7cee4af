use chrono::NaiveDateTime;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Integer, Nullable, Text, Timestamp};
use diesel::{delete as diesel_delete, insert_into, sql_query, update as diesel_update};
use rocket::http::Status;
use rocket::serde::json::{self, Json};
use rocket::{delete, get, patch, post, FromForm};
use serde_derive::{Deserialize, Serialize};

use crate::db::schema::{articles, comments};
use crate::db::{CheckExists, DbConnection, TopicRow};
use crate::listing::{Pagination, SortColumn, SortOrder};
use crate::types::*;
use crate::utils::serialize_date;

pub const DEFAULT_ARTICLE_IMG_URL: &str =
    "https://images.pexels.com/photos/97050/pexels-photo-97050.jpeg?w=700&h=700";

// $1 is the optional topic filter.
static SELECT_ARTICLE_SUMMARIES: &str = "SELECT articles.author,
       articles.title,
       articles.article_id,
       articles.topic,
       articles.created_at,
       articles.votes,
       articles.article_img_url,
       COUNT(comments.comment_id)::INT AS comment_count
  FROM articles
  LEFT JOIN comments ON comments.article_id = articles.article_id
 WHERE ($1::VARCHAR IS NULL OR articles.topic = $1)
 GROUP BY articles.article_id";

static SELECT_ARTICLE: &str = "SELECT articles.article_id,
       articles.title,
       articles.topic,
       articles.author,
       articles.body,
       articles.created_at,
       articles.votes,
       articles.article_img_url,
       COUNT(comments.comment_id)::INT AS comment_count
  FROM articles
  LEFT JOIN comments ON comments.article_id = articles.article_id
 WHERE articles.article_id = $1
 GROUP BY articles.article_id";

#[derive(Debug, Queryable, Selectable, Serialize)]
#[diesel(table_name = articles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Article {
    pub article_id: i32,
    pub title: String,
    pub topic: String,
    pub author: String,
    pub body: String,
    #[serde(serialize_with = "serialize_date")]
    pub created_at: NaiveDateTime,
    pub votes: i32,
    pub article_img_url: String,
}

/// Listing row: no body, plus the live comment count.
#[derive(Debug, QueryableByName, Serialize)]
pub struct ArticleSummary {
    #[diesel(sql_type = Text)]
    pub author: String,
    #[diesel(sql_type = Text)]
    pub title: String,
    #[diesel(sql_type = Integer)]
    pub article_id: i32,
    #[diesel(sql_type = Text)]
    pub topic: String,
    #[diesel(sql_type = Timestamp)]
    #[serde(serialize_with = "serialize_date")]
    pub created_at: NaiveDateTime,
    #[diesel(sql_type = Integer)]
    pub votes: i32,
    #[diesel(sql_type = Text)]
    pub article_img_url: String,
    #[diesel(sql_type = Integer)]
    pub comment_count: i32,
}

#[derive(Debug, QueryableByName, Serialize)]
pub struct ArticleDetail {
    #[diesel(sql_type = Integer)]
    pub article_id: i32,
    #[diesel(sql_type = Text)]
    pub title: String,
    #[diesel(sql_type = Text)]
    pub topic: String,
    #[diesel(sql_type = Text)]
    pub author: String,
    #[diesel(sql_type = Text)]
    pub body: String,
    #[diesel(sql_type = Timestamp)]
    #[serde(serialize_with = "serialize_date")]
    pub created_at: NaiveDateTime,
    #[diesel(sql_type = Integer)]
    pub votes: i32,
    #[diesel(sql_type = Text)]
    pub article_img_url: String,
    #[diesel(sql_type = Integer)]
    pub comment_count: i32,
}

impl ArticleDetail {
    fn from(article: Article, comment_count: i32) -> Self {
        ArticleDetail {
            article_id: article.article_id,
            title: article.title,
            topic: article.topic,
            author: article.author,
            body: article.body,
            created_at: article.created_at,
            votes: article.votes,
            article_img_url: article.article_img_url,
            comment_count,
        }
    }
}

#[derive(Debug, Default, FromForm)]
pub struct ArticleListParams {
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub topic: Option<String>,
    pub limit: Option<String>,
    pub p: Option<String>,
}

/// A validated article listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleListing {
    pub sort: SortColumn,
    pub order: SortOrder,
    pub topic: Option<String>,
    pub pagination: Pagination,
}

impl ArticleListing {
    pub fn parse(params: ArticleListParams) -> Result<ArticleListing, ApiError> {
        let sort = SortColumn::parse(params.sort_by.as_deref())?;
        let order = SortOrder::parse(params.order.as_deref())?;
        let pagination = Pagination::parse(params.limit.as_deref(), params.p.as_deref())?;
        Ok(ArticleListing {
            sort,
            order,
            topic: params.topic,
            pagination,
        })
    }

    /// $1 topic (nullable), $2 limit, $3 offset.
    pub fn sql(&self) -> String {
        format!(
            "{} ORDER BY {} {}, articles.article_id DESC LIMIT $2 OFFSET $3",
            SELECT_ARTICLE_SUMMARIES,
            self.sort.column(),
            self.order.keyword()
        )
    }
}

#[derive(Debug, Serialize)]
pub struct ArticlePage {
    pub articles: Vec<ArticleSummary>,
    pub total_count: i64,
}

#[derive(Debug, Serialize)]
pub struct ArticleResponse<T> {
    article: T,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = articles)]
pub struct NewArticle {
    title: String,
    topic: String,
    author: String,
    body: String,
    article_img_url: String,
}

#[derive(Debug, Deserialize)]
pub struct ArticleDraft {
    author: String,
    title: String,
    body: String,
    topic: String,
    article_img_url: Option<String>,
}

impl Validate for ArticleDraft {
    type Error = ApiError;
    fn validate(self) -> Result<Self, ApiError> {
        require_text(&[
            self.author.as_str(),
            self.title.as_str(),
            self.body.as_str(),
            self.topic.as_str(),
        ])?;
        if let Some(url) = &self.article_img_url {
            require_text(&[url.as_str()])?;
        }
        Ok(self)
    }
}

impl From<ArticleDraft> for NewArticle {
    fn from(draft: ArticleDraft) -> Self {
        NewArticle {
            title: draft.title,
            topic: draft.topic,
            author: draft.author,
            body: draft.body,
            article_img_url: draft
                .article_img_url
                .unwrap_or_else(|| DEFAULT_ARTICLE_IMG_URL.to_owned()),
        }
    }
}

fn count_articles(topic: Option<&str>, connection: &mut PgConnection) -> Result<i64, ApiError> {
    let count = match topic {
        Some(topic) => articles::table
            .filter(articles::topic.eq(topic))
            .count()
            .get_result::<i64>(connection)?,
        None => articles::table.count().get_result::<i64>(connection)?,
    };
    Ok(count)
}

pub fn select_articles(
    listing: &ArticleListing,
    connection: &mut PgConnection,
) -> Result<ArticlePage, ApiError> {
    connection
        .build_transaction()
        .read_only()
        .repeatable_read()
        .run(|conn| {
            if let Some(topic) = &listing.topic {
                TopicRow::check_exists(topic, conn)?;
            }
            let articles = sql_query(listing.sql())
                .bind::<Nullable<Text>, _>(listing.topic.clone())
                .bind::<BigInt, _>(listing.pagination.limit)
                .bind::<BigInt, _>(listing.pagination.offset)
                .load::<ArticleSummary>(conn)?;
            let total_count = count_articles(listing.topic.as_deref(), conn)?;
            Ok(ArticlePage {
                articles,
                total_count,
            })
        })
}

pub fn select_article_by_id(
    article_id: i32,
    connection: &mut PgConnection,
) -> Result<ArticleDetail, ApiError> {
    sql_query(SELECT_ARTICLE)
        .bind::<Integer, _>(article_id)
        .get_result::<ArticleDetail>(connection)
        .optional()?
        .ok_or(ApiError::NotFound(Resource::Article))
}

pub fn insert_article(
    new_article: NewArticle,
    connection: &mut PgConnection,
) -> Result<ArticleDetail, ApiError> {
    let article = insert_into(articles::table)
        .values(&new_article)
        .get_result::<Article>(connection)?;
    Ok(ArticleDetail::from(article, 0))
}

pub fn update_article_votes(
    article_id: i32,
    update: VoteUpdate,
    connection: &mut PgConnection,
) -> Result<Article, ApiError> {
    connection.transaction(|conn| {
        let votes = articles::table
            .find(article_id)
            .select(articles::votes)
            .for_update()
            .first::<i32>(conn)
            .optional()?
            .ok_or(ApiError::NotFound(Resource::Article))?;
        let votes = update.apply_to(votes)?;
        let updated = diesel_update(articles::table.find(article_id))
            .set(articles::votes.eq(votes))
            .get_result::<Article>(conn)?;
        Ok(updated)
    })
}

/// Deletes the article together with its comments.
pub fn remove_article_by_id(article_id: i32, connection: &mut PgConnection) -> Result<(), ApiError> {
    connection.transaction(|conn| {
        diesel_delete(comments::table.filter(comments::article_id.eq(article_id))).execute(conn)?;
        let deleted = diesel_delete(articles::table.find(article_id)).execute(conn)?;
        if deleted == 0 {
            Err(ApiError::NotFound(Resource::Article))
        } else {
            Ok(())
        }
    })
}

#[get("/?<params..>")]
pub async fn list(connection: DbConnection, params: ArticleListParams) -> ApiResult<ArticlePage> {
    let listing = ArticleListing::parse(params)?;
    let page = connection
        .run(move |conn| select_articles(&listing, conn))
        .await?;
    Ok(Json(page))
}

#[get("/<article_id>")]
pub async fn fetch(
    connection: DbConnection,
    article_id: Result<i32, &str>,
) -> ApiResult<ArticleResponse<ArticleDetail>> {
    let article_id = parse_id(article_id)?;
    let article = connection
        .run(move |conn| select_article_by_id(article_id, conn))
        .await?;
    Ok(Json(ArticleResponse { article }))
}

#[post("/", data = "<create>")]
pub async fn create(
    connection: DbConnection,
    create: Result<Json<ArticleDraft>, json::Error<'_>>,
) -> CreatedResult<ArticleResponse<ArticleDetail>> {
    let draft = create?.validate()?.into_inner();
    let new_article = NewArticle::from(draft);
    let article = connection
        .run(move |conn| insert_article(new_article, conn))
        .await?;
    Ok((Status::Created, Json(ArticleResponse { article })))
}

#[patch("/<article_id>", data = "<update>")]
pub async fn update_votes(
    connection: DbConnection,
    article_id: Result<i32, &str>,
    update: Result<Json<VoteUpdate>, json::Error<'_>>,
) -> ApiResult<ArticleResponse<Article>> {
    let article_id = parse_id(article_id)?;
    let update = update?.into_inner();
    let article = connection
        .run(move |conn| update_article_votes(article_id, update, conn))
        .await?;
    Ok(Json(ArticleResponse { article }))
}

#[delete("/<article_id>")]
pub async fn remove(connection: DbConnection, article_id: Result<i32, &str>) -> Result<Status, ApiError> {
    let article_id = parse_id(article_id)?;
    connection
        .run(move |conn| remove_article_by_id(article_id, conn))
        .await?;
    Ok(Status::NoContent)
}
