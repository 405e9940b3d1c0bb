use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Page size bounds applied when deriving a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationSettings {
    pub default_page_size: i64,
    pub max_page_size: i64,
}

impl Default for PaginationSettings {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
        }
    }
}

/// Client pagination request. `limit`/`offset` are accepted alongside
/// `page`/`pageSize`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PaginationInput {
    /// 1-based page number
    #[schema(example = 1)]
    pub page: Option<i64>,
    /// Rows per page
    #[schema(example = 10)]
    pub page_size: Option<i64>,
    /// Overrides `pageSize`
    pub limit: Option<i64>,
    /// Overrides `page`
    pub offset: Option<i64>,
}

impl PaginationInput {
    pub fn page(page: i64, page_size: i64) -> Self {
        Self {
            page: Some(page),
            page_size: Some(page_size),
            ..Self::default()
        }
    }
}

/// Resolved limit/offset plus the page it corresponds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub limit: i64,
    pub offset: i64,
    pub page: i64,
    pub page_size: i64,
}

impl PaginationSettings {
    pub fn derive(&self, input: &PaginationInput) -> PageWindow {
        let max = self.max_page_size.max(1);
        let page_size = input
            .limit
            .or(input.page_size)
            .unwrap_or(self.default_page_size)
            .clamp(1, max);

        let (page, offset) = match input.offset {
            Some(offset) => {
                let offset = offset.max(0);
                (offset / page_size + 1, offset)
            }
            None => {
                let page = input.page.unwrap_or(1).max(1);
                (page, (page - 1).saturating_mul(page_size))
            }
        };

        PageWindow {
            limit: page_size,
            offset,
            page,
            page_size,
        }
    }
}

/// Derive a window with the default page size bounds.
pub fn derive(input: &PaginationInput) -> PageWindow {
    PaginationSettings::default().derive(input)
}

/// `ceil(total / page_size)`, zero when there are no rows.
pub fn page_count(total: i64, page_size: i64) -> i64 {
    if total <= 0 || page_size <= 0 {
        return 0;
    }
    (total + page_size - 1) / page_size
}

pub fn has_more(offset: i64, fetched: usize, total: i64) -> bool {
    offset.saturating_add(fetched as i64) < total
}

/// Paginated response envelope
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    /// Rows on this page
    pub data: Vec<T>,
    /// Rows matching the filters across all pages
    #[schema(example = 42)]
    pub total: i64,
    #[schema(example = 1)]
    pub page: i64,
    #[schema(example = 10)]
    pub page_size: i64,
    #[schema(example = 5)]
    pub page_count: i64,
    pub has_more: bool,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, total: i64, window: &PageWindow) -> Self {
        Self {
            has_more: has_more(window.offset, data.len(), total),
            page_count: page_count(total, window.page_size),
            page: window.page,
            page_size: window.page_size,
            total,
            data,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            data: self.data.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
            page_count: self.page_count,
            has_more: self.has_more,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let window = derive(&PaginationInput::default());
        assert_eq!(
            window,
            PageWindow {
                limit: 10,
                offset: 0,
                page: 1,
                page_size: 10
            }
        );
    }

    #[test]
    fn test_page_three_of_twenty() {
        let window = derive(&PaginationInput::page(3, 20));
        assert_eq!(
            window,
            PageWindow {
                limit: 20,
                offset: 40,
                page: 3,
                page_size: 20
            }
        );
    }

    #[test]
    fn test_non_positive_page_is_clamped() {
        for page in [0, -1, -100] {
            let window = derive(&PaginationInput::page(page, 10));
            assert_eq!(window.page, 1);
            assert_eq!(window.offset, 0);
        }
    }

    #[test]
    fn test_page_size_is_capped() {
        assert_eq!(derive(&PaginationInput::page(1, 1000)).page_size, MAX_PAGE_SIZE);
        assert_eq!(derive(&PaginationInput::page(1, 0)).page_size, 1);
    }

    #[test]
    fn test_offset_and_limit_override_page() {
        let input = PaginationInput {
            page: Some(9),
            page_size: Some(50),
            limit: Some(25),
            offset: Some(60),
        };
        assert_eq!(
            derive(&input),
            PageWindow {
                limit: 25,
                offset: 60,
                page: 3,
                page_size: 25
            }
        );
    }

    #[test]
    fn test_custom_settings() {
        let settings = PaginationSettings {
            default_page_size: 25,
            max_page_size: 30,
        };
        assert_eq!(settings.derive(&PaginationInput::default()).limit, 25);
        assert_eq!(settings.derive(&PaginationInput::page(2, 99)).offset, 30);
    }

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(0, 10), 0);
        assert_eq!(page_count(10, 10), 1);
        assert_eq!(page_count(11, 10), 2);
        assert_eq!(page_count(1, 100), 1);
    }

    #[test]
    fn test_has_more() {
        assert!(has_more(0, 10, 11));
        assert!(!has_more(10, 1, 11));
        assert!(!has_more(0, 0, 0));
    }

    #[test]
    fn test_paginated_envelope() {
        let window = derive(&PaginationInput::page(2, 2));
        let page = Paginated::new(vec!["c", "d"], 5, &window).map(str::to_uppercase);
        assert_eq!(page.data, vec!["C".to_string(), "D".to_string()]);
        assert_eq!(page.page_count, 3);
        assert!(page.has_more);
    }
}
