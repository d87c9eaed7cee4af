use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::connection::SimpleConnection;
use diesel::insert_into;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use serde_derive::Deserialize;
use tracing::info;

use super::schema::{articles, comments, topics, users};
use super::Result;
use crate::LOG_TARGET;

const CREATE_TABLES: &str = "
DROP TABLE IF EXISTS comments;
DROP TABLE IF EXISTS articles;
DROP TABLE IF EXISTS users;
DROP TABLE IF EXISTS topics;

CREATE TABLE topics (
    slug VARCHAR PRIMARY KEY,
    description VARCHAR NOT NULL
);

CREATE TABLE users (
    username VARCHAR PRIMARY KEY,
    name VARCHAR NOT NULL,
    avatar_url VARCHAR NOT NULL
);

CREATE TABLE articles (
    article_id SERIAL PRIMARY KEY,
    title VARCHAR NOT NULL,
    topic VARCHAR NOT NULL REFERENCES topics(slug),
    author VARCHAR NOT NULL REFERENCES users(username),
    body VARCHAR NOT NULL,
    created_at TIMESTAMP NOT NULL DEFAULT NOW(),
    votes INT NOT NULL DEFAULT 0,
    article_img_url VARCHAR NOT NULL
        DEFAULT 'https://images.pexels.com/photos/97050/pexels-photo-97050.jpeg?w=700&h=700'
);

CREATE TABLE comments (
    comment_id SERIAL PRIMARY KEY,
    body VARCHAR NOT NULL,
    article_id INT NOT NULL REFERENCES articles(article_id) ON DELETE CASCADE,
    author VARCHAR NOT NULL REFERENCES users(username),
    votes INT NOT NULL DEFAULT 0,
    created_at TIMESTAMP NOT NULL DEFAULT NOW()
);
";

const FIXTURE: &str = include_str!("fixture.json");

#[derive(Debug, Deserialize)]
pub struct SeedData {
    pub topics: Vec<SeedTopic>,
    pub users: Vec<SeedUser>,
    pub articles: Vec<SeedArticle>,
    pub comments: Vec<SeedComment>,
}

#[derive(Debug, Deserialize, Insertable)]
#[diesel(table_name = topics)]
pub struct SeedTopic {
    pub slug: String,
    pub description: String,
}

#[derive(Debug, Deserialize, Insertable)]
#[diesel(table_name = users)]
pub struct SeedUser {
    pub username: String,
    pub name: String,
    pub avatar_url: String,
}

#[derive(Debug, Deserialize)]
pub struct SeedArticle {
    pub title: String,
    pub topic: String,
    pub author: String,
    pub body: String,
    pub created_at: i64,
    pub votes: i32,
    pub article_img_url: String,
}

/// Comments reference their article by position (1-based) in `articles`.
#[derive(Debug, Deserialize)]
pub struct SeedComment {
    pub body: String,
    pub article: i32,
    pub author: String,
    pub votes: i32,
    pub created_at: i64,
}

#[derive(Insertable)]
#[diesel(table_name = articles)]
struct ArticleInsert<'a> {
    title: &'a str,
    topic: &'a str,
    author: &'a str,
    body: &'a str,
    created_at: NaiveDateTime,
    votes: i32,
    article_img_url: &'a str,
}

#[derive(Insertable)]
#[diesel(table_name = comments)]
struct CommentInsert<'a> {
    body: &'a str,
    article_id: i32,
    author: &'a str,
    votes: i32,
    created_at: NaiveDateTime,
}

impl SeedData {
    pub fn fixture() -> Result<SeedData> {
        Ok(serde_json::from_str(FIXTURE)?)
    }
}

fn from_millis(millis: i64) -> Result<NaiveDateTime> {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| format!("timestamp out of range: {}", millis).into())
}

/// Drops and recreates every table, then inserts `data`.
pub fn seed(connection: &mut PgConnection, data: &SeedData) -> Result<()> {
    connection.batch_execute(CREATE_TABLES)?;

    let article_rows = data
        .articles
        .iter()
        .map(|a| {
            Ok(ArticleInsert {
                title: &a.title,
                topic: &a.topic,
                author: &a.author,
                body: &a.body,
                created_at: from_millis(a.created_at)?,
                votes: a.votes,
                article_img_url: &a.article_img_url,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let comment_rows = data
        .comments
        .iter()
        .map(|c| {
            Ok(CommentInsert {
                body: &c.body,
                article_id: c.article,
                author: &c.author,
                votes: c.votes,
                created_at: from_millis(c.created_at)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    connection.transaction::<_, super::Error, _>(|conn| {
        insert_into(topics::table).values(&data.topics).execute(conn)?;
        insert_into(users::table).values(&data.users).execute(conn)?;
        insert_into(articles::table).values(&article_rows).execute(conn)?;
        insert_into(comments::table).values(&comment_rows).execute(conn)?;
        Ok(())
    })?;

    info!(
        target: LOG_TARGET,
        topics = data.topics.len(),
        users = data.users.len(),
        articles = data.articles.len(),
        comments = data.comments.len(),
        "Seeded database"
    );
    Ok(())
}
