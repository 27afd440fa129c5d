use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PaginationError {
    #[error("Page size must be at least 1")]
    ZeroPageSize,
    #[error("Invalid page number {page_number}, expected 1..={total_pages}")]
    InvalidPageNumber { page_number: u64, total_pages: u64 },
}

/// The `pagination_summary` of a paginated response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page_number: u64,
    pub page_size: u64,
    pub total_pages: u64,
    pub total_entries: u64,
}

impl Pagination {
    /// Pages are numbered from 1; a page outside `1..=total_pages` is an
    /// error, so an empty collection has no valid page.
    pub fn new(
        page_number: u64,
        page_size: u64,
        total_entries: u64,
    ) -> Result<Self, PaginationError> {
        if page_size == 0 {
            return Err(PaginationError::ZeroPageSize);
        }
        let total_pages = total_entries.div_ceil(page_size);
        if page_number < 1 || page_number > total_pages {
            return Err(PaginationError::InvalidPageNumber {
                page_number,
                total_pages,
            });
        }
        Ok(Self {
            page_number,
            page_size,
            total_pages,
            total_entries,
        })
    }

    /// Entries before this page.
    pub fn offset(&self) -> u64 {
        (self.page_number - 1) * self.page_size
    }

    /// Number of entries on this page.
    pub fn len(&self) -> u64 {
        self.page_size
            .min(self.total_entries.saturating_sub(self.offset()))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ids on this page when entries are ids `0..total_entries` listed
    /// newest first, highest id first.
    pub fn descending_ids(&self) -> impl Iterator<Item = u64> {
        let first = self.total_entries - 1 - self.offset();
        (0..self.len()).map(move |i| first - i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_pages_by_rounding_up() {
        let p = Pagination::new(3, 10, 25).unwrap();
        assert_eq!(p.total_pages, 3);
        assert_eq!(p.offset(), 20);
        assert_eq!(p.len(), 5);
        assert_eq!(
            Pagination::new(4, 10, 25),
            Err(PaginationError::InvalidPageNumber {
                page_number: 4,
                total_pages: 3
            })
        );
        assert!(Pagination::new(0, 10, 25).is_err());
        assert_eq!(Pagination::new(1, 0, 25), Err(PaginationError::ZeroPageSize));
        assert!(Pagination::new(1, 10, 0).is_err());
    }

    #[test]
    fn lists_ids_newest_first() {
        let first = Pagination::new(1, 10, 25).unwrap();
        assert_eq!(
            first.descending_ids().collect::<Vec<_>>(),
            (15..=24).rev().collect::<Vec<_>>()
        );
        let last = Pagination::new(3, 10, 25).unwrap();
        assert_eq!(last.descending_ids().collect::<Vec<_>>(), [4, 3, 2, 1, 0]);
    }
}
