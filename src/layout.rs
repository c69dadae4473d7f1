use tracing::debug;

use crate::deck::{DeckKey, Subject};
use crate::group::{AuthorBucket, AuthorIdentity};
use crate::post::{Category, CategoryMap, Post};
use crate::recency::most_recent_category;
use crate::rows::SubjectRows;

pub fn profile_path(handle: &str) -> String {
    format!("/profile/{handle}")
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedColumn<'a> {
    pub category: Category,
    pub posts: &'a [Post],
    pub deck: DeckKey,
    pub recent: bool,
}

/// One feed row. Categories without items at this row are left out, so a
/// row has between one and three columns.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedRow<'a> {
    pub index: usize,
    pub columns: Vec<FeedColumn<'a>>,
    pub recent: Option<Category>,
}

impl FeedRow<'_> {
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, category: Category) -> Option<&FeedColumn<'_>> {
        self.columns.iter().find(|column| column.category == category)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedSubject<'a> {
    pub author: &'a AuthorIdentity,
    pub subject: Subject,
    pub rows: Vec<FeedRow<'a>>,
}

impl FeedSubject<'_> {
    pub fn profile_path(&self) -> String {
        profile_path(self.author.handle())
    }
}

pub fn feed_subject(bucket: &AuthorBucket, capacity: usize) -> FeedSubject<'_> {
    let subject = Subject::user(bucket.author.handle());
    let chunked = SubjectRows::from_bucket(bucket, capacity);
    let rows = (0..chunked.row_count())
        .map(|index| {
            let slices = chunked.row_slices(index);
            let recent = most_recent_category(&slices);
            let columns = slices
                .iter()
                .filter(|(_, posts)| !posts.is_empty())
                .map(|(category, posts)| FeedColumn {
                    category,
                    posts: *posts,
                    deck: DeckKey::new(subject.clone(), category, index),
                    recent: recent == Some(category),
                })
                .collect();
            FeedRow {
                index,
                columns,
                recent,
            }
        })
        .collect();
    FeedSubject {
        author: &bucket.author,
        subject,
        rows,
    }
}

pub fn feed_layout<'a, I>(buckets: I, capacity: usize) -> Vec<FeedSubject<'a>>
where
    I: IntoIterator<Item = &'a AuthorBucket>,
{
    let subjects: Vec<FeedSubject<'a>> = buckets
        .into_iter()
        .map(|bucket| feed_subject(bucket, capacity))
        .collect();
    debug!(subjects = subjects.len(), "feed layout built");
    subjects
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineCell<'a> {
    Posts(&'a [Post]),
    /// Row 0 carries the category's empty-state message; later rows are blank.
    Empty { message: Option<&'static str> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimelineColumn<'a> {
    pub category: Category,
    pub cell: TimelineCell<'a>,
    pub deck: DeckKey,
}

/// One timeline row. Every category is present at every row.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineRow<'a> {
    pub index: usize,
    pub columns: CategoryMap<TimelineColumn<'a>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryLabel {
    pub category: Category,
    pub count: usize,
    pub recent: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimelineLayout<'a> {
    pub subject: Subject,
    pub labels: CategoryMap<CategoryLabel>,
    pub recent: Option<Category>,
    pub rows: Vec<TimelineRow<'a>>,
}

pub fn timeline_layout(
    subject: Subject,
    lists: CategoryMap<&[Post]>,
    capacity: usize,
) -> TimelineLayout<'_> {
    let recent = most_recent_category(&lists);
    let labels = lists.map(|category, posts| CategoryLabel {
        category,
        count: posts.len(),
        recent: recent == Some(category),
    });
    let chunked = SubjectRows::from_lists(lists, capacity);
    let rows: Vec<TimelineRow<'_>> = (0..chunked.row_count())
        .map(|index| TimelineRow {
            index,
            columns: CategoryMap::from_fn(|category| {
                let posts = chunked.row(category, index);
                let cell = if posts.is_empty() {
                    TimelineCell::Empty {
                        message: (index == 0).then(|| category.empty_message()),
                    }
                } else {
                    TimelineCell::Posts(posts)
                };
                TimelineColumn {
                    category,
                    cell,
                    deck: DeckKey::new(subject.clone(), category, index),
                }
            }),
        })
        .collect();
    debug!(%subject, rows = rows.len(), ?recent, "timeline layout built");
    TimelineLayout {
        subject,
        labels,
        recent,
        rows,
    }
}
