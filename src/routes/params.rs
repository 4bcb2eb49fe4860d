//! Query parameter helpers shared by list endpoints.
//!
//! The types follow Rocket's `FromForm` conventions and derive `JsonSchema` so
//! the generated OpenAPI document reflects the available parameters and their
//! defaults.

use rocket_okapi::okapi::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};

const fn default_page() -> i64 {
    1
}

const fn default_page_size() -> i64 {
    50
}

const MAX_PAGE_SIZE: i64 = 100;

/// Common pagination parameters applied to list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, rocket::form::FromForm)]
#[serde(rename_all = "camelCase")]
pub struct PaginationParams {
    /// One-based page index (defaults to the first page).
    #[field(default = 1)]
    #[serde(default = "default_page")]
    pub page: i64,
    /// Number of items per page (clamped between 1 and 100, default 50).
    #[field(default = 50)]
    #[serde(default = "default_page_size")]
    pub size: i64,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            size: default_page_size(),
        }
    }
}

impl PaginationParams {
    pub fn page(&self) -> i64 {
        self.page.max(1)
    }

    /// Page size capped at [`MAX_PAGE_SIZE`].
    pub fn size(&self) -> i64 {
        self.size.clamp(1, MAX_PAGE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rocket::form::Form;

    #[test]
    fn defaults_apply_when_query_is_empty() {
        let parsed: PaginationParams = Form::parse("").unwrap();
        assert_eq!(parsed.page(), 1);
        assert_eq!(parsed.size(), 50);
    }

    #[test]
    fn out_of_range_values_are_normalized() {
        let parsed: PaginationParams = Form::parse("page=0&size=1000").unwrap();
        assert_eq!(parsed.page(), 1);
        assert_eq!(parsed.size(), MAX_PAGE_SIZE);

        let parsed: PaginationParams = Form::parse("page=3&size=-4").unwrap();
        assert_eq!(parsed.page(), 3);
        assert_eq!(parsed.size(), 1);
    }
}
