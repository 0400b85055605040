//! Page cursor and derived totals.

/// Row and page counts derived from a dataset or a remote response.
///
/// `total_pages` is the zero-based index of the last page, not a count: a
/// dataset of exactly `page_size` rows has `total_pages == 0`, and so does an
/// empty one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Totals {
    /// Number of rows across all pages.
    pub total_rows: usize,
    /// Index of the last page.
    pub total_pages: usize,
}

impl Totals {
    /// Derives totals for `total_rows` rows split into pages of `page_size`.
    pub fn new(total_rows: usize, page_size: usize) -> Self {
        let total_pages = total_rows.div_ceil(page_size.max(1)).saturating_sub(1);
        Self {
            total_rows,
            total_pages,
        }
    }

    /// Returns `true` if there are no rows.
    pub fn is_empty(&self) -> bool {
        self.total_rows == 0
    }
}

/// Which navigation buttons are enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Navigator {
    pub first: bool,
    pub previous: bool,
    pub next: bool,
    pub last: bool,
}

/// Current page position and page size.
///
/// Navigation never fails: requests past either end are clamped. Every
/// navigation records the index it started from in [`previous`](Self::previous),
/// which is `None` until the first navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor {
    current: usize,
    previous: Option<usize>,
    page_size: usize,
}

impl PageCursor {
    /// Creates a cursor on the first page.
    pub fn new(page_size: usize) -> Self {
        Self {
            current: 0,
            previous: None,
            page_size: page_size.max(1),
        }
    }

    /// Zero-based index of the current page.
    pub fn current(&self) -> usize {
        self.current
    }

    /// Index before the most recent navigation.
    pub fn previous(&self) -> Option<usize> {
        self.previous
    }

    /// Rows per page.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    fn move_to(&mut self, index: usize) -> bool {
        self.previous = Some(self.current);
        let changed = self.current != index;
        self.current = index;
        changed
    }

    /// Moves to the first page. Returns `true` if the index changed.
    pub fn go_first(&mut self) -> bool {
        self.move_to(0)
    }

    /// Moves back one page, stopping at the first.
    pub fn go_previous(&mut self) -> bool {
        self.move_to(self.current.saturating_sub(1))
    }

    /// Moves forward one page, stopping at `total_pages`.
    pub fn go_next(&mut self, total_pages: usize) -> bool {
        self.move_to((self.current + 1).min(total_pages))
    }

    /// Moves to the last page.
    pub fn go_last(&mut self, total_pages: usize) -> bool {
        self.move_to(total_pages)
    }

    /// Changes the page size.
    ///
    /// The current index is left as is; it is clamped once the totals for
    /// the new size are known.
    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
    }

    /// Pulls the current index back to `total_pages` if it is past it.
    ///
    /// Returns `true` if the index changed. `previous` is not touched.
    pub fn clamp(&mut self, total_pages: usize) -> bool {
        if self.current > total_pages {
            self.current = total_pages;
            true
        } else {
            false
        }
    }

    /// Zero-based offset of the first row of the current page.
    pub fn offset(&self) -> usize {
        self.current * self.page_size
    }

    /// Navigation affordances for the current position.
    pub fn navigator(&self, total_pages: usize) -> Navigator {
        let at_start = self.current == 0;
        let at_end = self.current == total_pages;
        Navigator {
            first: !at_start,
            previous: !at_start,
            next: !at_end,
            last: !at_end,
        }
    }
}
