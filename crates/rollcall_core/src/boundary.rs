//! Helpers shared by every external boundary.
//!
//! # Responsibility
//! - Parse raw boundary inputs (ids, `YYYY-MM-DD` date ranges).
//! - Map [`ErrorKind`] to a status code.
//! - Encode results in the `{success, code, message, result}` envelope.
//!
//! # Invariants
//! - Parsing failures are caller errors and always map to status 400.
//! - Persistence failure details stay in logs; the envelope carries a
//!   generic message.

use crate::service::{ErrorKind, ServiceError, ServiceResult};
use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use log::error;
use serde::Serialize;

const DATE_FORMAT: &str = "%Y-%m-%d";
const CODE_SUCCESS: &str = "00";
const CODE_ERROR: &str = "01";
const MESSAGE_SUCCESS: &str = "Success";
const MESSAGE_INTERNAL: &str = "internal server error";

pub const STATUS_OK: u16 = 200;
pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_NOT_FOUND: u16 = 404;
pub const STATUS_INTERNAL: u16 = 500;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoundaryError {
    #[error("invalid id")]
    InvalidId,
    #[error("start and end date parameters are required")]
    MissingRange,
    #[error("invalid {field} date format (use YYYY-MM-DD)")]
    InvalidDate { field: &'static str },
}

impl BoundaryError {
    pub fn status_code(&self) -> u16 {
        STATUS_BAD_REQUEST
    }
}

/// Parses a path id; only positive integers are accepted.
pub fn parse_id(raw: &str) -> Result<i64, BoundaryError> {
    match raw.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(BoundaryError::InvalidId),
    }
}

/// Parses a joined-date range given as two `YYYY-MM-DD` dates.
///
/// Both bounds are UTC midnight; `end` is moved one day forward so the whole
/// end day is included by the inclusive range query.
pub fn parse_joined_range(
    start: Option<&str>,
    end: Option<&str>,
) -> Result<(DateTime<Utc>, DateTime<Utc>), BoundaryError> {
    let (start, end) = match (non_blank(start), non_blank(end)) {
        (Some(start), Some(end)) => (start, end),
        _ => return Err(BoundaryError::MissingRange),
    };

    let start = parse_date(start, "start")?;
    let end = parse_date(end, "end")?
        .checked_add_days(Days::new(1))
        .ok_or(BoundaryError::InvalidDate { field: "end" })?;

    Ok((midnight_utc(start), midnight_utc(end)))
}

/// Status code for a classified service failure.
pub fn status_code(kind: ErrorKind) -> u16 {
    match kind {
        ErrorKind::Validation | ErrorKind::Conflict => STATUS_BAD_REQUEST,
        ErrorKind::NotFound => STATUS_NOT_FOUND,
        ErrorKind::Persistence => STATUS_INTERNAL,
    }
}

/// Uniform response body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseEnvelope<T> {
    pub success: bool,
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
}

impl<T> ResponseEnvelope<T> {
    pub fn success(result: T) -> Self {
        Self {
            success: true,
            code: CODE_SUCCESS,
            message: MESSAGE_SUCCESS.to_string(),
            result: Some(result),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            code: CODE_ERROR,
            message: message.into(),
            result: None,
        }
    }
}

/// Converts a service outcome into `(status, envelope)`.
pub fn respond<T>(result: ServiceResult<T>) -> (u16, ResponseEnvelope<T>) {
    match result {
        Ok(value) => (STATUS_OK, ResponseEnvelope::success(value)),
        Err(err) => {
            let status = status_code(err.kind());
            (status, ResponseEnvelope::error(public_message(&err, status)))
        }
    }
}

/// Envelope for input the boundary rejected before calling a service.
pub fn reject<T>(err: &BoundaryError) -> (u16, ResponseEnvelope<T>) {
    (err.status_code(), ResponseEnvelope::error(err.to_string()))
}

/// Turns an absent lookup result into the matching `NotFound` error.
pub fn require_found<T>(
    entity: &'static str,
    id: i64,
    found: ServiceResult<Option<T>>,
) -> ServiceResult<T> {
    found?.ok_or(ServiceError::NotFound { entity, id })
}

fn public_message(err: &ServiceError, status: u16) -> String {
    if status >= STATUS_INTERNAL {
        error!(
            "event=request_failed module=boundary status=error kind=persistence error={}",
            err
        );
        MESSAGE_INTERNAL.to_string()
    } else {
        err.to_string()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn parse_date(raw: &str, field: &'static str) -> Result<NaiveDate, BoundaryError> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| BoundaryError::InvalidDate { field })
}

fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}
