//! Search and pagination over fetched rows

use serde::Deserialize;
use serde::Serialize;

use crate::error::Error;
use crate::model::Row;

/// Rows per page. Only 5, 10, 15 and 20 are allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct PageSize(usize);

impl PageSize {
    pub const ALLOWED: [usize; 4] = [5, 10, 15, 20];

    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self(5)
    }
}

impl TryFrom<usize> for PageSize {
    type Error = Error;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        if Self::ALLOWED.contains(&value) {
            Ok(Self(value))
        } else {
            Err(Error::InvalidOperation(format!(
                "page size must be one of 5, 10, 15, 20 (got {})",
                value
            )))
        }
    }
}

impl From<PageSize> for usize {
    fn from(size: PageSize) -> Self {
        size.0
    }
}

impl std::fmt::Display for PageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Search term and page position of one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    search_term: String,
    page: usize,
    page_size: PageSize,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(PageSize::default())
    }
}

impl ViewState {
    pub fn new(page_size: PageSize) -> Self {
        Self {
            search_term: String::new(),
            page: 1,
            page_size,
        }
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    /// Current page, starting at 1.
    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    /// Changes the search term and returns to the first page.
    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
        self.page = 1;
    }

    /// Changes the page size and returns to the first page.
    pub fn set_page_size(&mut self, size: PageSize) {
        self.page_size = size;
        self.page = 1;
    }

    /// Moves forward unless already on the last page.
    pub fn next_page(&mut self, total_pages: usize) -> bool {
        if self.page < total_pages {
            self.page += 1;
            true
        } else {
            false
        }
    }

    /// Moves back unless already on the first page.
    pub fn prev_page(&mut self) -> bool {
        if self.page > 1 {
            self.page -= 1;
            true
        } else {
            false
        }
    }

    /// Jumps to a page in `1..=total_pages`; anything else is ignored.
    pub fn go_to(&mut self, page: usize, total_pages: usize) -> bool {
        if (1..=total_pages).contains(&page) {
            self.page = page;
            true
        } else {
            false
        }
    }

    /// Applies search then pagination.
    pub fn window<'a>(&self, rows: impl IntoIterator<Item = &'a Row>) -> PageWindow<'a> {
        paginate(filter(rows, &self.search_term), self.page, self.page_size)
    }
}

/// The visible slice of a filtered row list.
#[derive(Debug, Clone, PartialEq)]
pub struct PageWindow<'a> {
    pub rows: Vec<&'a Row>,
    pub page: usize,
    pub total_pages: usize,
    /// Rows matching the search, across all pages.
    pub matched: usize,
    pub can_prev: bool,
    pub can_next: bool,
}

/// Keeps rows where any field, stringified, contains `term` ignoring case.
///
/// Null values stringify to the empty string. Order is preserved.
pub fn filter<'a>(rows: impl IntoIterator<Item = &'a Row>, term: &str) -> Vec<&'a Row> {
    let needle = term.to_lowercase();
    if needle.is_empty() {
        return rows.into_iter().collect();
    }
    rows.into_iter()
        .filter(|row| row.matches_lowercase(&needle))
        .collect()
}

/// Cuts one page out of `rows`.
///
/// `total_pages` is at least 1. A page past the end yields no rows and
/// disables forward navigation.
pub fn paginate(rows: Vec<&Row>, page: usize, page_size: PageSize) -> PageWindow<'_> {
    let size = page_size.get();
    let matched = rows.len();
    let total_pages = matched.div_ceil(size).max(1);
    let page = page.max(1);

    let start = (page - 1).saturating_mul(size).min(matched);
    let end = start.saturating_add(size).min(matched);
    let rows = rows[start..end].to_vec();

    PageWindow {
        rows,
        page,
        total_pages,
        matched,
        can_prev: page > 1,
        can_next: page < total_pages,
    }
}
