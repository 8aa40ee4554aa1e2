//! Navigation counts, always derived from the current hydrated set.

use crate::models::{Bookmark, Category, Collection, Tag};

pub fn category_counts<'a>(
    categories: &'a [Category],
    bookmarks: &[Bookmark],
) -> Vec<(&'a Category, usize)> {
    categories
        .iter()
        .map(|c| (c, bookmarks.iter().filter(|b| b.has_category(&c.id)).count()))
        .collect()
}

pub fn collection_counts<'a>(
    collections: &'a [Collection],
    bookmarks: &[Bookmark],
) -> Vec<(&'a Collection, usize)> {
    collections
        .iter()
        .map(|c| (c, bookmarks.iter().filter(|b| b.has_collection(&c.id)).count()))
        .collect()
}

pub fn tag_counts<'a>(tags: &'a [Tag], bookmarks: &[Bookmark]) -> Vec<(&'a Tag, usize)> {
    tags.iter()
        .map(|t| (t, bookmarks.iter().filter(|b| b.has_tag(&t.id)).count()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fake::{category, collection, raw, tag};
    use crate::store::{hydrate_all, Lookups};

    #[test]
    fn test_category_counts_match_membership() {
        let lookups = Lookups::new(
            vec![category("dev-1", "Dev"), category("news-1", "News"), category("misc", "Misc")],
            vec![],
            vec![],
        );
        let input: Vec<_> = (0..10)
            .map(|i| {
                let category = match i {
                    0..=2 => Some("dev-1"),
                    3..=7 => Some("news-1"),
                    8 => Some("deleted"),
                    _ => None,
                };
                raw(&format!("b{i}"), &[], &[], category)
            })
            .collect();
        let bookmarks = hydrate_all(&input, &lookups);

        let counts: Vec<(&str, usize)> = category_counts(&lookups.categories, &bookmarks)
            .into_iter()
            .map(|(c, n)| (c.id.as_str(), n))
            .collect();

        assert_eq!(counts, vec![("dev-1", 3), ("news-1", 5), ("misc", 0)]);
    }

    #[test]
    fn test_collection_and_tag_counts() {
        let lookups = Lookups::new(
            vec![],
            vec![collection("col-1", "Reading"), collection("col-2", "Later")],
            vec![tag("t1", "rust"), tag("t2", "web")],
        );
        let bookmarks = hydrate_all(
            &[
                raw("b1", &["t1", "t2"], &["col-1", "col-2"], None),
                raw("b2", &["t1"], &["col-1"], None),
                raw("b3", &[], &["gone"], None),
            ],
            &lookups,
        );

        let collections: Vec<usize> = collection_counts(&lookups.collections, &bookmarks)
            .into_iter()
            .map(|(_, n)| n)
            .collect();
        let tags: Vec<usize> = tag_counts(&lookups.tags, &bookmarks)
            .into_iter()
            .map(|(_, n)| n)
            .collect();

        assert_eq!(collections, vec![2, 1]);
        assert_eq!(tags, vec![2, 1]);
    }
}
