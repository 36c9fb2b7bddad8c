//! Request validation module
//!
//! Checks raw query and path parameters and converts them into store queries.
//! All failures of one request are collected into a single validation error.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::error::{ApiError, FieldError};
use crate::store::{ListQuery, SortOrder};

/// Page size used when the request does not specify one
pub const DEFAULT_PAGE_LIMIT: u32 = 15;

const POSITIVE_NUMBER: &str = "must be positive number";
const INVALID_VALUE: &str = "Invalid value";

/// Raw query parameters of the image listing
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListImagesParams {
    /// Page number (1-indexed)
    #[param(value_type = Option<u32>, minimum = 1)]
    pub page: Option<String>,

    /// Items per page
    #[param(value_type = Option<u32>, minimum = 1, default = 15)]
    pub limit: Option<String>,

    /// Sort direction on creation date: "asc" or "desc" (default)
    #[param(value_type = Option<String>, example = "desc")]
    pub sort: Option<String>,

    /// Inclusive lower bound on creation date (ISO-8601)
    #[param(value_type = Option<String>, format = DateTime)]
    pub date_start: Option<String>,

    /// Exclusive upper bound on creation date (ISO-8601)
    #[param(value_type = Option<String>, format = DateTime)]
    pub date_end: Option<String>,
}

impl ListImagesParams {
    /// Validate and normalize into a store query.
    ///
    /// `page` is converted from 1-based to zero-based; absent values fall
    /// back to the first page, `DEFAULT_PAGE_LIMIT` and descending order.
    pub fn validate(&self) -> Result<ListQuery, ApiError> {
        let mut errors = Vec::new();

        let page = check(
            &mut errors,
            "page",
            self.page.as_deref(),
            parse_positive,
            POSITIVE_NUMBER,
        );
        let limit = check(
            &mut errors,
            "limit",
            self.limit.as_deref(),
            parse_positive,
            POSITIVE_NUMBER,
        );
        let sort = check(
            &mut errors,
            "sort",
            self.sort.as_deref(),
            |s| s.parse::<SortOrder>().ok(),
            INVALID_VALUE,
        );
        let date_start = check(
            &mut errors,
            "dateStart",
            self.date_start.as_deref(),
            parse_iso8601,
            INVALID_VALUE,
        );
        let date_end = check(
            &mut errors,
            "dateEnd",
            self.date_end.as_deref(),
            parse_iso8601,
            INVALID_VALUE,
        );

        if !errors.is_empty() {
            return Err(ApiError::validation(errors));
        }

        Ok(ListQuery {
            page: page.map_or(0, |p| p - 1),
            limit: limit.unwrap_or(DEFAULT_PAGE_LIMIT),
            sort: sort.unwrap_or_default(),
            date_start,
            date_end,
        })
    }
}

/// Run `parse` on an optional query value, recording a failure
fn check<T>(
    errors: &mut Vec<FieldError>,
    param: &str,
    raw: Option<&str>,
    parse: impl Fn(&str) -> Option<T>,
    msg: &str,
) -> Option<T> {
    let raw = raw?;
    let parsed = parse(raw);
    if parsed.is_none() {
        errors.push(FieldError::new("query", param, Some(raw), msg));
    }
    parsed
}

/// Validate an image id path parameter
pub fn validate_image_id(id: &str) -> Result<&str, ApiError> {
    if id.is_empty() {
        return Err(ApiError::validation(vec![FieldError::new(
            "params",
            "id",
            Some(id),
            "must be string",
        )]));
    }
    Ok(id)
}

/// Parse an integer greater than zero
///
/// Values above `u32::MAX` are clamped; such a page is past the end of any
/// listing and yields no records.
pub fn parse_positive(raw: &str) -> Option<u32> {
    raw.parse::<u64>()
        .ok()
        .filter(|n| *n > 0)
        .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
}

/// Parse an ISO-8601 date or date-time.
///
/// Accepts RFC 3339 timestamps, date-times without offset and plain dates.
/// Values without an offset are interpreted as UTC.
pub fn parse_iso8601(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn params(pairs: &[(&str, &str)]) -> ListImagesParams {
        let mut p = ListImagesParams::default();
        for (key, value) in pairs {
            let value = Some(value.to_string());
            match *key {
                "page" => p.page = value,
                "limit" => p.limit = value,
                "sort" => p.sort = value,
                "dateStart" => p.date_start = value,
                "dateEnd" => p.date_end = value,
                other => panic!("unknown param {other}"),
            }
        }
        p
    }

    #[test]
    fn test_defaults() {
        let query = ListImagesParams::default().validate().unwrap();
        assert_eq!(query.page, 0);
        assert_eq!(query.limit, 15);
        assert_eq!(query.sort, SortOrder::Desc);
        assert!(query.date_start.is_none());
        assert!(query.date_end.is_none());
    }

    #[test]
    fn test_page_is_converted_to_zero_based() {
        let query = params(&[("page", "2"), ("limit", "2")]).validate().unwrap();
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, 2);
        assert_eq!(query.offset(), 2);
    }

    #[test]
    fn test_huge_page_is_clamped() {
        let query = params(&[("page", "99999999999")]).validate().unwrap();
        assert_eq!(query.page, u32::MAX - 1);
        assert_eq!(query.limit, 15);
    }

    #[test]
    fn test_rejects_non_positive_numbers() {
        for bad in ["0", "-1", "abc", "1.5", ""] {
            let err = params(&[("page", bad)]).validate().unwrap_err();
            match err {
                ApiError::Validation(errors) => {
                    assert_eq!(errors.len(), 1);
                    assert_eq!(errors[0].param, "page");
                    assert_eq!(errors[0].msg, "must be positive number");
                    assert_eq!(errors[0].value.as_deref(), Some(bad));
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[test]
    fn test_collects_all_failures() {
        let err = params(&[("limit", "0"), ("sort", "sideways"), ("dateEnd", "yesterday")])
            .validate()
            .unwrap_err();
        match err {
            ApiError::Validation(errors) => {
                let names: Vec<_> = errors.iter().map(|e| e.param.as_str()).collect();
                assert_eq!(names, vec!["limit", "sort", "dateEnd"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_sort_and_dates() {
        let query = params(&[
            ("sort", "asc"),
            ("dateStart", "2024-01-01"),
            ("dateEnd", "2024-02-01T10:30:00+02:00"),
        ])
        .validate()
        .unwrap();
        assert_eq!(query.sort, SortOrder::Asc);
        assert_eq!(
            query.date_start,
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(
            query.date_end,
            Some(Utc.with_ymd_and_hms(2024, 2, 1, 8, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_parse_iso8601_forms() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();
        assert_eq!(parse_iso8601("2024-05-06T07:08:09Z"), Some(expected));
        assert_eq!(parse_iso8601("2024-05-06T07:08:09"), Some(expected));
        assert_eq!(parse_iso8601("2024-05-06T07:08:09.000Z"), Some(expected));
        assert!(parse_iso8601("2024-13-01").is_none());
        assert!(parse_iso8601("06/05/2024").is_none());
    }

    #[test]
    fn test_validate_image_id() {
        assert_eq!(validate_image_id("abc").unwrap(), "abc");
        assert!(matches!(
            validate_image_id(""),
            Err(ApiError::Validation(ref errors)) if errors[0].location == "params"
        ));
    }
}
