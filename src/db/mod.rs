use std::env;

use diesel::dsl::exists;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::ConnectionManager;
use diesel::result::Error as DieselError;
use diesel::select;
use dotenv::dotenv;
use rocket::http::Status;
use rocket::outcome::Outcome;
use rocket::request::{self, FromRequest};
use rocket::{Request, State};
use tracing::{error, info};

use crate::types::{ApiError, Resource};
use crate::LOG_TARGET;

pub mod schema;
pub mod seed;

// An alias to the type for a pool of Diesel Postgres connections.
pub type Pool = r2d2::Pool<ConnectionManager<PgConnection>>;

error_chain! {
    foreign_links {
        Var(::std::env::VarError);
        ParseInt(::std::num::ParseIntError);
        Json(::serde_json::Error);
        R2D2(r2d2::Error);
        Diesel(DieselError);
    }
}

const DEFAULT_POOL_SIZE: u32 = 10;

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub pool_size: u32,
}

impl DbConfig {
    /// Reads the profile from `NC_NEWS_ENV`, defaulting to `development`.
    pub fn from_env() -> Result<DbConfig> {
        let profile = env::var("NC_NEWS_ENV").unwrap_or_else(|_| "development".to_owned());
        DbConfig::for_profile(&profile)
    }

    pub fn for_profile(profile: &str) -> Result<DbConfig> {
        dotenv::from_filename(format!(".env.{}", profile)).ok();
        dotenv().ok();
        let url = env::var("DATABASE_URL")?;
        let pool_size = match env::var("DATABASE_POOL_SIZE") {
            Ok(size) => size.parse()?,
            Err(_) => DEFAULT_POOL_SIZE,
        };
        Ok(DbConfig { url, pool_size })
    }
}

pub fn init_pool(config: &DbConfig) -> Result<Pool> {
    let manager = ConnectionManager::<PgConnection>::new(config.url.as_str());
    let pool = Pool::builder().max_size(config.pool_size).build(manager)?;
    info!(target: LOG_TARGET, pool_size = config.pool_size, "Database pool ready");
    Ok(pool)
}

/// Builds a pool without opening any connection up front.
pub fn init_pool_unchecked(url: &str) -> Pool {
    Pool::builder().build_unchecked(ConnectionManager::<PgConnection>::new(url))
}

/// Request guard handing out access to the managed pool. Connections are only
/// checked out inside [`DbConnection::run`].
pub struct DbConnection(Pool);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for DbConnection {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> request::Outcome<DbConnection, ()> {
        match request.guard::<&State<Pool>>().await {
            Outcome::Success(pool) => Outcome::Success(DbConnection(pool.inner().clone())),
            _ => {
                error!(target: LOG_TARGET, "Database pool is not managed");
                Outcome::Error((Status::InternalServerError, ()))
            }
        }
    }
}

impl DbConnection {
    /// Runs blocking Diesel work on the blocking thread pool.
    pub async fn run<F, T>(&self, f: F) -> std::result::Result<T, ApiError>
    where
        F: FnOnce(&mut PgConnection) -> std::result::Result<T, ApiError> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.0.clone();
        rocket::tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            f(&mut conn)
        })
        .await
        .map_err(|_| ApiError::Internal)?
    }
}

/// Precondition lookup: succeeds silently when the keyed row exists.
pub trait CheckExists {
    type Key: ?Sized;
    fn check_exists(key: &Self::Key, connection: &mut PgConnection)
        -> std::result::Result<(), ApiError>;
}

pub struct ArticleRow;
pub struct TopicRow;

impl CheckExists for ArticleRow {
    type Key = i32;
    fn check_exists(id: &i32, connection: &mut PgConnection) -> std::result::Result<(), ApiError> {
        use self::schema::articles::dsl::*;
        let found = select(exists(articles.find(*id))).get_result::<bool>(connection)?;
        if found {
            Ok(())
        } else {
            Err(ApiError::NotFound(Resource::Article))
        }
    }
}

impl CheckExists for TopicRow {
    type Key = str;
    fn check_exists(key: &str, connection: &mut PgConnection) -> std::result::Result<(), ApiError> {
        use self::schema::topics::dsl::*;
        let found = select(exists(topics.filter(slug.eq(key)))).get_result::<bool>(connection)?;
        if found {
            Ok(())
        } else {
            Err(ApiError::NotFound(Resource::Topic))
        }
    }
}
