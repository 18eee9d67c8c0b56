//! Public catalog views over items: released collaborations, upcoming
//! releases and the featured carousel. Pure functions; the caller supplies
//! `now` so results are reproducible.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Item, Record, UnknownVariant};

pub const COLLABS_PAGE_SIZE: usize = 10;
pub const RELEASES_PAGE_SIZE: usize = 12;
pub const MAX_PAGE_SIZE: usize = 100;

/// Releases younger than this are badged as new.
pub const NEW_RELEASE_WINDOW_DAYS: i64 = 14;

/// Category labels the site uses for "no category filter".
const ALL_CATEGORIES: &[&str] = &["All", "Alle categorieën"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    /// Active items already released, or without a release date.
    Collabs,
    /// Active items with a release date in the future.
    Releases,
}

impl View {
    pub fn page_size(self) -> usize {
        match self {
            View::Collabs => COLLABS_PAGE_SIZE,
            View::Releases => RELEASES_PAGE_SIZE,
        }
    }

    fn default_sort(self) -> SortOrder {
        match self {
            View::Collabs => SortOrder::Newest,
            View::Releases => SortOrder::Soonest,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Newest,
    Oldest,
    Soonest,
    Latest,
    Alphabetical,
}

impl FromStr for SortOrder {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "newest" => Ok(SortOrder::Newest),
            "oldest" => Ok(SortOrder::Oldest),
            "soonest" => Ok(SortOrder::Soonest),
            "latest" => Ok(SortOrder::Latest),
            "alphabetical" => Ok(SortOrder::Alphabetical),
            other => Err(UnknownVariant { kind: "sort order", value: other.to_string() }),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    pub sort: Option<String>,
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

/// An item as listed in a catalog view, badged when recently released.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    #[serde(flatten)]
    pub record: Record<Item>,
    pub is_new_release: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogPage {
    pub items: Vec<CatalogEntry>,
    pub categories: Vec<String>,
    pub page: usize,
    pub limit: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

pub fn is_released(item: &Item, now: DateTime<Utc>) -> bool {
    item.release_date.is_none_or(|date| date <= now)
}

/// Released, and no more than [`NEW_RELEASE_WINDOW_DAYS`] ago.
pub fn is_new_release(item: &Item, now: DateTime<Utc>) -> bool {
    item.release_date
        .is_some_and(|date| date <= now && now - date <= Duration::days(NEW_RELEASE_WINDOW_DAYS))
}

fn in_view(item: &Item, view: View, now: DateTime<Utc>) -> bool {
    if !item.is_active {
        return false;
    }
    match view {
        View::Collabs => is_released(item, now),
        View::Releases => item.release_date.is_some_and(|date| date > now),
    }
}

/// Case-insensitive match against name, description, brands and tags.
pub fn matches_search(item: &Item, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    let hit = |s: &str| s.to_lowercase().contains(&needle);

    hit(&item.name)
        || hit(&item.description)
        || item.brands.iter().any(|b| hit(b))
        || item.tags.iter().any(|t| hit(t))
}

fn matches_category(item: &Item, category: Option<&str>) -> bool {
    match category.map(str::trim) {
        None | Some("") => true,
        Some(c) if ALL_CATEGORIES.contains(&c) => true,
        Some(c) => item.category.as_deref() == Some(c),
    }
}

/// Dated items first in the requested direction, then undated items with the
/// most recently edited first.
fn by_release(a: &Record<Item>, b: &Record<Item>, descending: bool) -> Ordering {
    match (a.doc.release_date, b.doc.release_date) {
        (Some(x), Some(y)) if descending => y.cmp(&x),
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => b.updated_at.cmp(&a.updated_at),
    }
}

pub fn sort_items(items: &mut [Record<Item>], order: SortOrder) {
    match order {
        SortOrder::Newest | SortOrder::Latest => items.sort_by(|a, b| by_release(a, b, true)),
        SortOrder::Oldest | SortOrder::Soonest => items.sort_by(|a, b| by_release(a, b, false)),
        SortOrder::Alphabetical => {
            items.sort_by(|a, b| a.doc.name.to_lowercase().cmp(&b.doc.name.to_lowercase()))
        }
    }
}

/// Distinct non-empty categories, sorted.
pub fn categories(items: &[Record<Item>]) -> Vec<String> {
    items
        .iter()
        .filter_map(|r| r.doc.category.as_deref())
        .filter(|c| !c.trim().is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// `total_pages` is at least 1; a page past the end falls back to page 1.
pub fn paginate<T>(items: Vec<T>, page: usize, limit: usize) -> (Vec<T>, usize, usize) {
    let limit = limit.clamp(1, MAX_PAGE_SIZE);
    let total_pages = items.len().div_ceil(limit).max(1);
    let page = if page == 0 || page > total_pages { 1 } else { page };

    let slice = items.into_iter().skip((page - 1) * limit).take(limit).collect();
    (slice, page, total_pages)
}

/// Runs one catalog page: view selection, category, search, sort, pagination.
/// Fails only on an unknown `sort` value.
pub fn browse(
    items: Vec<Record<Item>>,
    view: View,
    query: &CatalogQuery,
    now: DateTime<Utc>,
) -> Result<CatalogPage, UnknownVariant> {
    let sort = match query.sort.as_deref().map(str::trim) {
        None | Some("") => view.default_sort(),
        Some(raw) => raw.parse()?,
    };

    let visible: Vec<Record<Item>> = items
        .into_iter()
        .filter(|r| in_view(&r.doc, view, now))
        .collect();
    let categories = categories(&visible);

    let mut matching: Vec<Record<Item>> = visible
        .into_iter()
        .filter(|r| matches_category(&r.doc, query.category.as_deref()))
        .filter(|r| matches_search(&r.doc, query.q.as_deref().unwrap_or("")))
        .collect();
    sort_items(&mut matching, sort);

    let total_items = matching.len();
    let limit = query.limit.unwrap_or(view.page_size()).clamp(1, MAX_PAGE_SIZE);
    let (items, page, total_pages) = paginate(matching, query.page.unwrap_or(1), limit);
    let items = items
        .into_iter()
        .map(|record| CatalogEntry {
            is_new_release: is_new_release(&record.doc, now),
            record,
        })
        .collect();

    Ok(CatalogPage {
        items,
        categories,
        page,
        limit,
        total_items,
        total_pages,
    })
}

/// Items for the homepage carousel: active, featured, newest release first.
pub fn featured(items: Vec<Record<Item>>) -> Vec<Record<Item>> {
    let mut featured: Vec<Record<Item>> = items
        .into_iter()
        .filter(|r| r.doc.is_active && r.doc.is_featured)
        .collect();
    sort_items(&mut featured, SortOrder::Newest);
    featured
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn item(name: &str, days_from_now: Option<i64>) -> Record<Item> {
        Record {
            id: name.to_lowercase(),
            doc: Item {
                name: name.to_string(),
                description: String::new(),
                brands: vec![],
                category: None,
                tags: vec![],
                image: None,
                link: None,
                release_date: days_from_now.map(|d| now() + Duration::days(d)),
                is_featured: false,
                is_active: true,
            },
            created_at: now(),
            updated_at: now(),
        }
    }

    fn names(items: &[Record<Item>]) -> Vec<&str> {
        items.iter().map(|r| r.doc.name.as_str()).collect()
    }

    fn page_names(page: &CatalogPage) -> Vec<&str> {
        page.items.iter().map(|e| e.record.doc.name.as_str()).collect()
    }

    #[test]
    fn collabs_show_released_and_undated_newest_first() {
        let mut inactive = item("Hidden", Some(-1));
        inactive.doc.is_active = false;
        let items = vec![
            item("Old", Some(-30)),
            item("Undated", None),
            item("Future", Some(5)),
            item("Recent", Some(-2)),
            inactive,
        ];

        let page = browse(items, View::Collabs, &CatalogQuery::default(), now()).unwrap();
        assert_eq!(page_names(&page), ["Recent", "Old", "Undated"]);
        assert_eq!(page.total_items, 3);
        let badges: Vec<bool> = page.items.iter().map(|e| e.is_new_release).collect();
        assert_eq!(badges, [true, false, false]);
    }

    #[test]
    fn releases_show_future_items_soonest_first() {
        let items = vec![
            item("Later", Some(20)),
            item("Past", Some(-1)),
            item("Undated", None),
            item("Sooner", Some(2)),
        ];

        let page = browse(items, View::Releases, &CatalogQuery::default(), now()).unwrap();
        assert_eq!(page_names(&page), ["Sooner", "Later"]);
        assert_eq!(page.limit, RELEASES_PAGE_SIZE);
        assert!(page.items.iter().all(|e| !e.is_new_release));
    }

    #[test]
    fn search_covers_brands_and_tags_case_insensitively() {
        let mut sneaker = item("Runner", Some(-1));
        sneaker.doc.brands = vec!["Nike".to_string()];
        let mut tee = item("Shirt", Some(-1));
        tee.doc.tags = vec!["Summer".to_string()];

        assert!(matches_search(&sneaker.doc, "nIKe"));
        assert!(matches_search(&tee.doc, "summer"));
        assert!(!matches_search(&tee.doc, "winter"));
        assert!(matches_search(&tee.doc, "   "));
    }

    #[test]
    fn category_filter_ignores_all_label_and_lists_categories() {
        let mut a = item("A", Some(-1));
        a.doc.category = Some("Shoes".to_string());
        let mut b = item("B", Some(-2));
        b.doc.category = Some("Apparel".to_string());
        let items = vec![a, b];

        let query = CatalogQuery {
            category: Some("Shoes".to_string()),
            ..Default::default()
        };
        let page = browse(items.clone(), View::Collabs, &query, now()).unwrap();
        assert_eq!(page_names(&page), ["A"]);
        assert_eq!(page.categories, ["Apparel", "Shoes"]);

        let query = CatalogQuery {
            category: Some("All".to_string()),
            ..Default::default()
        };
        assert_eq!(browse(items, View::Collabs, &query, now()).unwrap().total_items, 2);
    }

    #[test]
    fn pagination_clamps_out_of_range_pages() {
        let (slice, page, total) = paginate((1..=25).collect::<Vec<_>>(), 3, 10);
        assert_eq!(slice, vec![21, 22, 23, 24, 25]);
        assert_eq!((page, total), (3, 3));

        let (slice, page, _) = paginate((1..=25).collect::<Vec<_>>(), 9, 10);
        assert_eq!(page, 1);
        assert_eq!(slice.len(), 10);

        let (slice, page, total) = paginate(Vec::<u8>::new(), 1, 10);
        assert!(slice.is_empty());
        assert_eq!((page, total), (1, 1));
    }

    #[test]
    fn alphabetical_sort_ignores_case() {
        let mut items = vec![item("beta", None), item("Alpha", None), item("gamma", None)];
        sort_items(&mut items, SortOrder::Alphabetical);
        assert_eq!(names(&items), ["Alpha", "beta", "gamma"]);
    }

    #[test]
    fn featured_keeps_active_featured_items() {
        let mut a = item("A", Some(-10));
        a.doc.is_featured = true;
        let mut b = item("B", Some(-1));
        b.doc.is_featured = true;
        let mut c = item("C", Some(-1));
        c.doc.is_featured = true;
        c.doc.is_active = false;

        assert_eq!(names(&featured(vec![a, b, c, item("D", None)])), ["B", "A"]);
    }

    #[test]
    fn new_release_window_is_fourteen_days() {
        assert!(is_new_release(&item("x", Some(-3)).doc, now()));
        assert!(!is_new_release(&item("x", Some(-15)).doc, now()));
        assert!(!is_new_release(&item("x", None).doc, now()));
        assert!(!is_new_release(&item("x", Some(2)).doc, now()));
    }

    #[test]
    fn sort_is_parsed_from_the_query_string() {
        let items = vec![item("b", Some(-1)), item("A", Some(-2))];
        let query = CatalogQuery {
            sort: Some("alphabetical".to_string()),
            ..Default::default()
        };
        let page = browse(items.clone(), View::Collabs, &query, now()).unwrap();
        assert_eq!(page_names(&page), ["A", "b"]);

        let query = CatalogQuery {
            sort: Some("random".to_string()),
            ..Default::default()
        };
        let err = browse(items, View::Collabs, &query, now()).unwrap_err();
        assert_eq!(err.to_string(), "invalid sort order: 'random'");
    }
}
