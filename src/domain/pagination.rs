use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// Raw `page` and `limit` query parameters. Kept as strings so that
/// non-numeric values fall back to the defaults instead of failing the request.
/// Only the leading integer counts, so `2abc` reads as 2 and `10.5` as 10.
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

impl Pagination {
    pub fn new(page: i64, limit: i64) -> Pagination {
        let page = if page < 1 { DEFAULT_PAGE } else { page };
        let limit = if limit < 1 {
            DEFAULT_LIMIT
        } else {
            limit.min(MAX_LIMIT)
        };

        Self { page, limit }
    }

    /// Saturates instead of overflowing on absurd page numbers.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn summary(&self, total: i64) -> PageSummary {
        PageSummary {
            page: self.page,
            limit: self.limit,
            total,
            total_pages: (total + self.limit - 1) / self.limit,
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE, DEFAULT_LIMIT)
    }
}

impl From<PaginationParams> for Pagination {
    fn from(params: PaginationParams) -> Self {
        let parse = |value: Option<String>, default: i64| {
            value
                .as_deref()
                .and_then(leading_integer)
                .unwrap_or(default)
        };

        Self::new(
            parse(params.page, DEFAULT_PAGE),
            parse(params.limit, DEFAULT_LIMIT),
        )
    }
}

/// Reads an optional sign followed by digits from the start of `value`,
/// ignoring whatever comes after. Out-of-range numbers saturate.
fn leading_integer(value: &str) -> Option<i64> {
    let value = value.trim_start();
    let (negative, rest) = match value.as_bytes().first() {
        Some(b'-') => (true, &value[1..]),
        Some(b'+') => (false, &value[1..]),
        _ => (false, value),
    };
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }

    let number = rest[..digits].parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -number } else { number })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSummary {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}
