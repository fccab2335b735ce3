//! Presentation helpers for loaded bookmark lists.

use chrono::{DateTime, Datelike, Utc};
use vayo_core::models::bookmark::Bookmark;

/// Bookmarks created in one calendar month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthGroup<'a> {
    /// e.g. `March 2024`.
    pub label: String,
    pub bookmarks: Vec<&'a Bookmark>,
}

/// Case-insensitive substring search over url, title and description.
///
/// A blank query matches everything. Input order is kept.
pub fn filter_bookmarks<'a, I>(bookmarks: I, query: &str) -> Vec<&'a Bookmark>
where
    I: IntoIterator<Item = &'a Bookmark>,
{
    let needle = query.trim().to_lowercase();
    bookmarks
        .into_iter()
        .filter(|bookmark| {
            needle.is_empty()
                || bookmark.url.to_lowercase().contains(&needle)
                || bookmark.title.to_lowercase().contains(&needle)
                || bookmark
                    .description
                    .as_deref()
                    .is_some_and(|description| description.to_lowercase().contains(&needle))
        })
        .collect()
}

/// Bucket bookmarks by creation month (UTC), newest month first.
///
/// Within a bucket the input order is kept.
pub fn group_by_month<'a, I>(bookmarks: I) -> Vec<MonthGroup<'a>>
where
    I: IntoIterator<Item = &'a Bookmark>,
{
    let mut buckets: Vec<((i32, u32), MonthGroup<'a>)> = Vec::new();
    for bookmark in bookmarks {
        let month = (bookmark.created_at.year(), bookmark.created_at.month());
        match buckets.iter_mut().find(|(key, _)| *key == month) {
            Some((_, group)) => group.bookmarks.push(bookmark),
            None => buckets.push((
                month,
                MonthGroup {
                    label: bookmark.created_at.format("%B %Y").to_string(),
                    bookmarks: vec![bookmark],
                },
            )),
        }
    }
    buckets.sort_by(|(a, _), (b, _)| b.cmp(a));
    buckets.into_iter().map(|(_, group)| group).collect()
}

/// Compact date: `Mar 6` within the current year, `Mar 6, 2024` otherwise.
pub fn format_date(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    if at.year() == now.year() {
        at.format("%b %-d").to_string()
    } else {
        at.format("%b %-d, %Y").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::bookmark;
    use chrono::TimeZone;

    fn dated(id: &str, year: i32, month: u32, day: u32) -> Bookmark {
        let mut row = bookmark(id, "f");
        row.created_at = Utc
            .with_ymd_and_hms(year, month, day, 12, 0, 0)
            .single()
            .expect("date");
        row
    }

    #[test]
    fn filter_matches_url_title_and_description() {
        let mut rust = bookmark("rust", "f");
        rust.title = "The Rust Book".to_string();
        let mut docs = bookmark("docs", "f");
        docs.url = "https://docs.rs/redb".to_string();
        let mut notes = bookmark("notes", "f");
        notes.description = Some("Notes on REDB internals".to_string());
        let rows = vec![rust, docs, notes];

        let ids = |hits: Vec<&Bookmark>| hits.iter().map(|b| b.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(filter_bookmarks(&rows, "rust")), vec!["rust"]);
        assert_eq!(ids(filter_bookmarks(&rows, "  ReDb ")), vec!["docs", "notes"]);
        assert_eq!(filter_bookmarks(&rows, "").len(), 3);
        assert!(filter_bookmarks(&rows, "nothing").is_empty());
    }

    #[test]
    fn groups_are_labelled_and_newest_first() {
        let rows = vec![
            dated("a", 2024, 3, 20),
            dated("b", 2024, 3, 2),
            dated("c", 2023, 12, 31),
            dated("d", 2024, 5, 1),
        ];
        let groups = group_by_month(&rows);
        let labels: Vec<&str> = groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["May 2024", "March 2024", "December 2023"]);
        let march: Vec<&str> = groups[1].bookmarks.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(march, vec!["a", "b"]);
    }

    #[test]
    fn empty_input_has_no_groups() {
        assert!(group_by_month(&Vec::<Bookmark>::new()).is_empty());
    }

    #[test]
    fn dates_include_year_only_when_different() {
        let now = Utc
            .with_ymd_and_hms(2025, 7, 1, 0, 0, 0)
            .single()
            .expect("now");
        let this_year = dated("a", 2025, 3, 6).created_at;
        let last_year = dated("b", 2024, 3, 6).created_at;
        assert_eq!(format_date(this_year, now), "Mar 6");
        assert_eq!(format_date(last_year, now), "Mar 6, 2024");
    }
}
