// handlers/mod.rs - two security tiers
//
// Public (no auth): /api/auth/login, /api/health
// Protected (bearer token, optional role gate): everything else under /api

pub mod protected;
pub mod public;

use axum::Json;

use crate::error::ApiError;

pub type ApiResult<T> = Result<Json<T>, ApiError>;

/// Numeric ids from paths and query strings. Anything unparseable or
/// non-positive is treated as absent.
pub(crate) fn parse_id(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|id| *id > 0)
}

#[cfg(test)]
mod tests {
    use super::parse_id;

    #[test]
    fn ids_are_lenient() {
        assert_eq!(parse_id(Some(" 12 ")), Some(12));
        assert_eq!(parse_id(Some("0")), None);
        assert_eq!(parse_id(Some("abc")), None);
        assert_eq!(parse_id(None), None);
    }
}
