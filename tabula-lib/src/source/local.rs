//! In-memory pagination

use std::sync::Arc;

use super::PageResult;
use crate::cursor::Totals;
use crate::model::Record;

/// Pages through an in-memory dataset.
///
/// The dataset is shared, so cloning a slicer is cheap.
#[derive(Debug, Clone, Default)]
pub struct LocalSlicer {
    rows: Arc<[Record]>,
}

impl LocalSlicer {
    /// Creates a slicer over `rows`.
    pub fn new(rows: Vec<Record>) -> Self {
        Self { rows: rows.into() }
    }

    /// Returns the whole dataset.
    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    /// Returns the number of rows in the dataset.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Replaces the dataset.
    pub fn replace(&mut self, rows: Vec<Record>) {
        self.rows = rows.into();
    }

    /// Returns the chunk of `page_size` rows at `index`.
    ///
    /// An index past the last chunk (after the dataset shrank) yields the
    /// last chunk.
    pub fn slice(&self, index: usize, page_size: usize) -> PageResult {
        let page_size = page_size.max(1);
        let totals = Totals::new(self.rows.len(), page_size);
        let index = index.min(totals.total_pages);
        let rows = self
            .rows
            .chunks(page_size)
            .nth(index)
            .map(<[Record]>::to_vec)
            .unwrap_or_default();
        PageResult::new(rows, totals.total_rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(n: usize) -> LocalSlicer {
        LocalSlicer::new((0..n).map(|i| Record::new(i).set("n", i as i64)).collect())
    }

    fn ids(result: &PageResult) -> Vec<String> {
        result.rows.iter().map(|r| r.id().to_string()).collect()
    }

    #[test]
    fn test_slices_23_rows() {
        let slicer = dataset(23);
        assert_eq!(slicer.slice(0, 10).rows.len(), 10);
        assert_eq!(slicer.slice(1, 10).rows.len(), 10);
        let last = slicer.slice(2, 10);
        assert_eq!(ids(&last), vec!["20", "21", "22"]);
        assert_eq!(last.total_rows, 23);
    }

    #[test]
    fn test_index_past_end_yields_last_chunk() {
        let slicer = dataset(23);
        assert_eq!(ids(&slicer.slice(7, 10)), vec!["20", "21", "22"]);
    }

    #[test]
    fn test_empty_dataset() {
        let result = dataset(0).slice(3, 10);
        assert!(result.rows.is_empty());
        assert_eq!(result.total_rows, 0);
    }

    #[test]
    fn test_replace_dataset() {
        let mut slicer = dataset(30);
        slicer.replace(dataset(4).rows().to_vec());
        assert_eq!(slicer.len(), 4);
        assert_eq!(slicer.slice(2, 10).rows.len(), 4);
    }
}
