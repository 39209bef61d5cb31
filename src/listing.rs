//! Query shaping for post listings: pagination, sort order, category
//! filtering and search-term cleanup.

use serde::Deserialize;

pub const HOME_PAGE_SIZE: u32 = 10;
pub const DASHBOARD_PAGE_SIZE: u32 = 5;
pub const SEARCH_PAGE_SIZE: u32 = 10;

/// Category value that disables filtering.
pub const ALL_CATEGORIES: &str = "all";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sort {
    #[default]
    Latest,
    Oldest,
    TitleAsc,
    TitleDesc,
}

impl Sort {
    /// Unknown or missing values fall back to `Latest`.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("oldest") => Sort::Oldest,
            Some("title_asc") => Sort::TitleAsc,
            Some("title_desc") => Sort::TitleDesc,
            _ => Sort::Latest,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sort::Latest => "latest",
            Sort::Oldest => "oldest",
            Sort::TitleAsc => "title_asc",
            Sort::TitleDesc => "title_desc",
        }
    }

    pub fn order_by(&self) -> &'static str {
        match self {
            Sort::Latest => "created_at DESC, id DESC",
            Sort::Oldest => "created_at ASC, id ASC",
            Sort::TitleAsc => "title ASC, id ASC",
            Sort::TitleDesc => "title DESC, id DESC",
        }
    }
}

/// Raw listing parameters as they arrive in a query string or form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingParams {
    pub page: Option<String>,
    pub sort: Option<String>,
    pub category: Option<String>,
}

/// Resolved listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub page: u32,
    pub page_size: u32,
    pub sort: Sort,
    pub category: Option<String>,
}

impl Listing {
    pub fn from_params(params: &ListingParams, page_size: u32) -> Self {
        Self {
            page: parse_page(params.page.as_deref()),
            page_size,
            sort: Sort::parse(params.sort.as_deref()),
            category: category_filter(params.category.as_deref()),
        }
    }

    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.page_size as u64
    }
}

/// 1-indexed page number; anything unparsable or zero becomes 1.
pub fn parse_page(value: Option<&str>) -> u32 {
    value
        .and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|&p| p >= 1)
        .unwrap_or(1)
}

pub fn category_filter(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case(ALL_CATEGORIES))
        .map(str::to_string)
}

pub fn total_pages(total: u64, page_size: u32) -> u64 {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size as u64)
}

pub fn has_next_page(page: u32, page_size: u32, total: u64) -> bool {
    (page as u64) < total_pages(total, page_size)
}

/// Keep only ASCII letters, digits and spaces.
pub fn sanitize_search_term(term: &str) -> String {
    term.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
        .collect()
}

/// One page of results plus navigation state.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub total: u64,
    pub has_next: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, listing: &Listing, total: u64) -> Self {
        Self {
            items,
            page: listing.page,
            total,
            has_next: has_next_page(listing.page, listing.page_size, total),
        }
    }

    pub fn next_page(&self) -> Option<u32> {
        self.page.checked_add(1).filter(|_| self.has_next)
    }

    pub fn prev_page(&self) -> Option<u32> {
        (self.page > 1).then(|| self.page - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_parsing_defaults_to_one() {
        assert_eq!(parse_page(None), 1);
        assert_eq!(parse_page(Some("")), 1);
        assert_eq!(parse_page(Some("0")), 1);
        assert_eq!(parse_page(Some("-3")), 1);
        assert_eq!(parse_page(Some("abc")), 1);
        assert_eq!(parse_page(Some("4")), 4);
    }

    #[test]
    fn offset_is_page_minus_one_times_size() {
        let listing = Listing::from_params(
            &ListingParams {
                page: Some("3".into()),
                ..Default::default()
            },
            5,
        );
        assert_eq!(listing.offset(), 10);
    }

    #[test]
    fn sort_parsing() {
        assert_eq!(Sort::parse(None), Sort::Latest);
        assert_eq!(Sort::parse(Some("oldest")), Sort::Oldest);
        assert_eq!(Sort::parse(Some("title_asc")), Sort::TitleAsc);
        assert_eq!(Sort::parse(Some("title_desc")), Sort::TitleDesc);
        assert_eq!(Sort::parse(Some("random")), Sort::Latest);
    }

    #[test]
    fn all_category_disables_filter() {
        assert_eq!(category_filter(Some("all")), None);
        assert_eq!(category_filter(Some("ALL")), None);
        assert_eq!(category_filter(Some("")), None);
        assert_eq!(category_filter(None), None);
        assert_eq!(category_filter(Some("tech")), Some("tech".to_string()));
    }

    #[test]
    fn has_next_page_compares_against_ceiling() {
        assert!(!has_next_page(1, 10, 0));
        assert!(!has_next_page(1, 10, 10));
        assert!(has_next_page(1, 10, 11));
        assert!(!has_next_page(2, 10, 11));
        assert!(has_next_page(2, 5, 11));
        assert!(!has_next_page(3, 5, 11));
        assert!(!has_next_page(7, 5, 11));
    }

    #[test]
    fn empty_collection_first_page() {
        let listing = Listing::from_params(&ListingParams::default(), 10);
        let page: Page<()> = Page::new(vec![], &listing, 0);
        assert!(page.items.is_empty());
        assert!(!page.has_next);
        assert_eq!(page.next_page(), None);
        assert_eq!(page.prev_page(), None);
    }

    #[test]
    fn last_representable_page_has_no_next() {
        let listing = Listing::from_params(
            &ListingParams {
                page: Some(u32::MAX.to_string()),
                ..Default::default()
            },
            10,
        );
        assert_eq!(listing.page, u32::MAX);
        let page: Page<()> = Page::new(vec![], &listing, 3);
        assert!(!page.has_next);
        assert_eq!(page.next_page(), None);
        assert_eq!(page.prev_page(), Some(u32::MAX - 1));
    }

    #[test]
    fn search_term_is_stripped() {
        assert_eq!(sanitize_search_term("don't stop!"), "dont stop");
        assert_eq!(sanitize_search_term("100% (rust)"), "100 rust");
        assert_eq!(sanitize_search_term("%_'"), "");
        assert_eq!(sanitize_search_term("café"), "caf");
    }
}
