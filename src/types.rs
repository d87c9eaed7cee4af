use std::fmt;

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use rocket::http::Status;
use rocket::request::Request;
use rocket::response::{self, Responder};
use rocket::serde::json::{Error as JsonError, Json};
use serde_derive::Deserialize;
use serde_json::json;
use tracing::{debug, error};

use crate::utils::try_respond;
use crate::LOG_TARGET;

pub trait Validate
where
    Self: Sized,
{
    type Error;
    fn validate(self) -> Result<Self, Self::Error>;
}

/// Kind of row (or route) a lookup failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Article,
    Comment,
    Topic,
    User,
    Route,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Resource::Article => "Article",
            Resource::Comment => "Comment",
            Resource::Topic => "Topic",
            Resource::User => "User",
            Resource::Route => "Route",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest,
    InvalidSortColumn,
    InvalidOrder,
    InvalidPagination,
    NotFound(Resource),
    Diesel(DieselError),
    Pool(r2d2::Error),
    Internal,
}

impl From<DieselError> for ApiError {
    fn from(err: DieselError) -> ApiError {
        ApiError::Diesel(err)
    }
}

impl From<r2d2::Error> for ApiError {
    fn from(err: r2d2::Error) -> ApiError {
        ApiError::Pool(err)
    }
}

impl<'r> From<JsonError<'r>> for ApiError {
    fn from(err: JsonError<'r>) -> ApiError {
        debug!(target: LOG_TARGET, err = ?err, "Rejected request body");
        ApiError::BadRequest
    }
}

impl ApiError {
    pub fn status(&self) -> Status {
        match self {
            ApiError::BadRequest
            | ApiError::InvalidSortColumn
            | ApiError::InvalidOrder
            | ApiError::InvalidPagination => Status::BadRequest,
            ApiError::NotFound(_) => Status::NotFound,
            ApiError::Diesel(error) => match error {
                DieselError::NotFound => Status::NotFound,
                DieselError::DatabaseError(kind, _) if is_constraint_violation(kind) => {
                    Status::BadRequest
                }
                _ => Status::InternalServerError,
            },
            ApiError::Pool(_) | ApiError::Internal => Status::InternalServerError,
        }
    }

    pub fn message(&self) -> String {
        match self {
            ApiError::InvalidSortColumn => "Invalid sort_by query".to_owned(),
            ApiError::InvalidOrder => "Invalid order query".to_owned(),
            ApiError::InvalidPagination => {
                "Limit and page number must be greater than 0".to_owned()
            }
            ApiError::NotFound(resource) => format!("{} not found", resource),
            _ => {
                let status = self.status();
                if status == Status::BadRequest {
                    "Bad request".to_owned()
                } else if status == Status::NotFound {
                    "Not found".to_owned()
                } else {
                    "Internal Server Error".to_owned()
                }
            }
        }
    }
}

fn is_constraint_violation(kind: &DatabaseErrorKind) -> bool {
    matches!(
        kind,
        DatabaseErrorKind::ForeignKeyViolation
            | DatabaseErrorKind::NotNullViolation
            | DatabaseErrorKind::UniqueViolation
            | DatabaseErrorKind::CheckViolation
    )
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        if status == Status::InternalServerError {
            error!(target: LOG_TARGET, err = ?self, uri = %req.uri(), "Unhandled error");
        } else if let ApiError::Diesel(err) = &self {
            debug!(target: LOG_TARGET, err = %err, "Store rejected request");
        }
        let body = json!({ "msg": self.message() });
        try_respond(req, &body, status)
    }
}

pub type ApiResult<T> = Result<Json<T>, ApiError>;

pub type CreatedResult<T> = Result<(Status, Json<T>), ApiError>;

impl<T> Validate for Json<T>
where
    T: Validate,
{
    type Error = <T as Validate>::Error;
    fn validate(self) -> Result<Self, Self::Error> {
        let inner = self.into_inner();
        let validated = inner.validate()?;
        Ok(Json(validated))
    }
}

/// Rejects required text fields that are empty once trimmed.
pub fn require_text(fields: &[&str]) -> Result<(), ApiError> {
    if fields.iter().any(|field| field.trim().is_empty()) {
        Err(ApiError::BadRequest)
    } else {
        Ok(())
    }
}

/// `{ "inc_votes": n }`, shared by article and comment vote updates.
#[derive(Debug, Deserialize)]
pub struct VoteUpdate {
    pub inc_votes: i32,
}

impl VoteUpdate {
    /// New tally, or `BadRequest` when it leaves the `INT4` range.
    pub fn apply_to(&self, votes: i32) -> Result<i32, ApiError> {
        votes.checked_add(self.inc_votes).ok_or(ApiError::BadRequest)
    }
}

/// Maps a path segment that failed to parse as an id.
pub fn parse_id(raw: Result<i32, &str>) -> Result<i32, ApiError> {
    raw.map_err(|_| ApiError::BadRequest)
}
