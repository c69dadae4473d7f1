use crate::group::AuthorBucket;
use crate::post::{Category, CategoryMap, Post};

/// Maximum number of items in one row.
pub const ROW_CAPACITY: usize = 12;

/// Splits a newest-first sequence into rows of at most `capacity` items.
///
/// When the count does not divide evenly, the first row carries the
/// remainder (the newest items) and every later row is full. A capacity of
/// zero is treated as [`ROW_CAPACITY`].
pub fn chunk_rows<T>(items: &[T], capacity: usize) -> Vec<&[T]> {
    let capacity = if capacity == 0 { ROW_CAPACITY } else { capacity };
    let total = items.len();
    if total == 0 {
        return Vec::new();
    }
    if total <= capacity {
        return vec![items];
    }

    let remainder = total % capacity;
    let mut rows = Vec::with_capacity(total / capacity + 1);
    if remainder > 0 {
        rows.push(&items[..remainder]);
    }
    rows.extend(items[remainder..].chunks(capacity));
    rows
}

/// A subject's category lists cut into rows, ready for alignment.
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectRows<'a> {
    pub rows: CategoryMap<Vec<&'a [Post]>>,
}

impl<'a> SubjectRows<'a> {
    pub fn from_lists(lists: CategoryMap<&'a [Post]>, capacity: usize) -> Self {
        Self {
            rows: lists.map(|_, posts| chunk_rows(*posts, capacity)),
        }
    }

    pub fn from_bucket(bucket: &'a AuthorBucket, capacity: usize) -> Self {
        Self::from_lists(bucket.posts.map(|_, posts| posts.as_slice()), capacity)
    }

    /// Unified row count: the largest row count of any category.
    pub fn row_count(&self) -> usize {
        self.rows
            .iter()
            .map(|(_, rows)| rows.len())
            .max()
            .unwrap_or(0)
    }

    /// Items of `category` at `row`; empty when that category has fewer rows.
    pub fn row(&self, category: Category, row: usize) -> &'a [Post] {
        self.rows.get(category).get(row).copied().unwrap_or(&[])
    }

    pub fn row_slices(&self, row: usize) -> CategoryMap<&'a [Post]> {
        CategoryMap::from_fn(|category| self.row(category, row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::post::Timestamp;

    fn sizes(total: usize) -> Vec<usize> {
        let items: Vec<usize> = (0..total).collect();
        chunk_rows(&items, ROW_CAPACITY)
            .iter()
            .map(|row| row.len())
            .collect()
    }

    #[test]
    fn remainder_goes_first() {
        assert_eq!(sizes(0), Vec::<usize>::new());
        assert_eq!(sizes(5), [5]);
        assert_eq!(sizes(12), [12]);
        assert_eq!(sizes(13), [1, 12]);
        assert_eq!(sizes(15), [3, 12]);
        assert_eq!(sizes(24), [12, 12]);
        assert_eq!(sizes(25), [1, 12, 12]);
    }

    #[test]
    fn newest_items_land_in_row_zero() {
        let items: Vec<usize> = (0..15).collect();
        let rows = chunk_rows(&items, ROW_CAPACITY);
        assert_eq!(rows[0], &[0, 1, 2]);
        assert_eq!(rows[1].first(), Some(&3));
        assert_eq!(rows[1].last(), Some(&14));
    }

    #[test]
    fn zero_capacity_uses_default() {
        let items: Vec<usize> = (0..13).collect();
        assert_eq!(chunk_rows(&items, 0).len(), 2);
    }

    #[test]
    fn row_count_is_widest_category() {
        let thoughts: Vec<Post> = (0..25)
            .map(|i| Post::new(format!("t{i}"), Category::Thoughts, Timestamp::EPOCH))
            .collect();
        let media: Vec<Post> = (0..4)
            .map(|i| Post::new(format!("m{i}"), Category::Media, Timestamp::EPOCH))
            .collect();
        let lists = CategoryMap {
            thoughts: thoughts.as_slice(),
            media: media.as_slice(),
            milestones: &[][..],
        };
        let rows = SubjectRows::from_lists(lists, ROW_CAPACITY);
        assert_eq!(rows.row_count(), 3);
        assert_eq!(rows.row(Category::Thoughts, 0).len(), 1);
        assert_eq!(rows.row(Category::Media, 0).len(), 4);
        assert!(rows.row(Category::Media, 1).is_empty());
        assert!(rows.row(Category::Milestones, 0).is_empty());
    }
}
