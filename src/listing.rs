//! Validation of listing query parameters.
//!
//! Everything here is pure: callers validate first and only then touch the
//! store. Sort columns and directions resolve to fixed SQL fragments, so no
//! caller-supplied text ever reaches a query string.

use rocket::FromForm;

use crate::types::ApiError;

pub const DEFAULT_LIMIT: i64 = 10;
pub const DEFAULT_PAGE: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortColumn {
    Title,
    Topic,
    Author,
    #[default]
    CreatedAt,
    Votes,
}

impl SortColumn {
    pub fn parse(raw: Option<&str>) -> Result<SortColumn, ApiError> {
        match raw {
            None => Ok(SortColumn::default()),
            Some("title") => Ok(SortColumn::Title),
            Some("topic") => Ok(SortColumn::Topic),
            Some("author") => Ok(SortColumn::Author),
            Some("created_at") => Ok(SortColumn::CreatedAt),
            Some("votes") => Ok(SortColumn::Votes),
            Some(_) => Err(ApiError::InvalidSortColumn),
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            SortColumn::Title => "articles.title",
            SortColumn::Topic => "articles.topic",
            SortColumn::Author => "articles.author",
            SortColumn::CreatedAt => "articles.created_at",
            SortColumn::Votes => "articles.votes",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Case-insensitive.
    pub fn parse(raw: Option<&str>) -> Result<SortOrder, ApiError> {
        match raw {
            None => Ok(SortOrder::default()),
            Some(order) if order.eq_ignore_ascii_case("asc") => Ok(SortOrder::Asc),
            Some(order) if order.eq_ignore_ascii_case("desc") => Ok(SortOrder::Desc),
            Some(_) => Err(ApiError::InvalidOrder),
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Raw `limit` and `p` query parameters.
#[derive(Debug, Default, FromForm)]
pub struct PageParams {
    pub limit: Option<String>,
    pub p: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: i64,
    pub page: i64,
    pub offset: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination {
            limit: DEFAULT_LIMIT,
            page: DEFAULT_PAGE,
            offset: 0,
        }
    }
}

impl Pagination {
    pub fn parse(limit: Option<&str>, page: Option<&str>) -> Result<Pagination, ApiError> {
        let limit = parse_positive(limit, DEFAULT_LIMIT)?;
        let page = parse_positive(page, DEFAULT_PAGE)?;
        let offset = (page - 1)
            .checked_mul(limit)
            .ok_or(ApiError::BadRequest)?;
        Ok(Pagination {
            limit,
            page,
            offset,
        })
    }

    pub fn from_params(params: &PageParams) -> Result<Pagination, ApiError> {
        Pagination::parse(params.limit.as_deref(), params.p.as_deref())
    }
}

fn parse_positive(raw: Option<&str>, default: i64) -> Result<i64, ApiError> {
    let value = match raw {
        None => return Ok(default),
        Some(raw) => raw.trim().parse::<i64>().map_err(|_| ApiError::BadRequest)?,
    };
    if value < 1 {
        Err(ApiError::InvalidPagination)
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("title", SortColumn::Title, "articles.title")]
    #[case("topic", SortColumn::Topic, "articles.topic")]
    #[case("author", SortColumn::Author, "articles.author")]
    #[case("created_at", SortColumn::CreatedAt, "articles.created_at")]
    #[case("votes", SortColumn::Votes, "articles.votes")]
    fn sort_columns_resolve_to_fixed_clauses(
        #[case] raw: &str,
        #[case] expected: SortColumn,
        #[case] clause: &str,
    ) {
        let column = SortColumn::parse(Some(raw)).unwrap();
        assert_eq!(column, expected);
        assert_eq!(column.column(), clause);
    }

    #[rstest]
    #[case("body")]
    #[case("comment_count")]
    #[case("VOTES")]
    #[case("votes; DROP TABLE articles")]
    #[case("")]
    fn unknown_sort_columns_are_rejected(#[case] raw: &str) {
        assert!(matches!(
            SortColumn::parse(Some(raw)),
            Err(ApiError::InvalidSortColumn)
        ));
    }

    #[test]
    fn sort_defaults_to_created_at_desc() {
        assert_eq!(SortColumn::parse(None).unwrap(), SortColumn::CreatedAt);
        assert_eq!(SortOrder::parse(None).unwrap(), SortOrder::Desc);
    }

    #[rstest]
    #[case("asc", SortOrder::Asc)]
    #[case("ASC", SortOrder::Asc)]
    #[case("Asc", SortOrder::Asc)]
    #[case("desc", SortOrder::Desc)]
    #[case("DeSc", SortOrder::Desc)]
    fn order_is_case_insensitive(#[case] raw: &str, #[case] expected: SortOrder) {
        assert_eq!(SortOrder::parse(Some(raw)).unwrap(), expected);
    }

    #[rstest]
    #[case("up")]
    #[case("ascending")]
    #[case("")]
    fn unknown_orders_are_rejected(#[case] raw: &str) {
        assert!(matches!(
            SortOrder::parse(Some(raw)),
            Err(ApiError::InvalidOrder)
        ));
    }

    #[test]
    fn pagination_defaults() {
        let page = Pagination::parse(None, None).unwrap();
        assert_eq!(page, Pagination::default());
        assert_eq!(page.limit, 10);
        assert_eq!(page.page, 1);
        assert_eq!(page.offset, 0);
    }

    #[rstest]
    #[case(Some("5"), Some("1"), 5, 0)]
    #[case(Some("5"), Some("3"), 5, 10)]
    #[case(None, Some("2"), 10, 10)]
    #[case(Some("1"), Some("13"), 1, 12)]
    #[case(Some(" 4 "), None, 4, 0)]
    fn pagination_offsets(
        #[case] limit: Option<&str>,
        #[case] page: Option<&str>,
        #[case] expected_limit: i64,
        #[case] expected_offset: i64,
    ) {
        let pagination = Pagination::parse(limit, page).unwrap();
        assert_eq!(pagination.limit, expected_limit);
        assert_eq!(pagination.offset, expected_offset);
    }

    #[rstest]
    #[case(Some("0"), None)]
    #[case(None, Some("0"))]
    #[case(Some("-3"), None)]
    #[case(None, Some("-1"))]
    fn out_of_range_pagination(#[case] limit: Option<&str>, #[case] page: Option<&str>) {
        assert!(matches!(
            Pagination::parse(limit, page),
            Err(ApiError::InvalidPagination)
        ));
    }

    #[rstest]
    #[case(Some("ten"), None)]
    #[case(None, Some("two"))]
    #[case(Some("1.5"), None)]
    #[case(Some(""), None)]
    fn non_numeric_pagination(#[case] limit: Option<&str>, #[case] page: Option<&str>) {
        assert!(matches!(
            Pagination::parse(limit, page),
            Err(ApiError::BadRequest)
        ));
    }

    #[test]
    fn overflowing_offset_is_rejected() {
        let huge = i64::MAX.to_string();
        assert!(matches!(
            Pagination::parse(Some(&huge), Some(&huge)),
            Err(ApiError::BadRequest)
        ));
    }
}
