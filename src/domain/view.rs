//! Derived posts view: filter by search text and author, then sort by title.
//!
//! Everything here is pure. The input slice is never mutated and repeated
//! calls with the same arguments yield the same ordered output.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use icu_collator::options::CollatorOptions;
use icu_collator::{Collator, CollatorBorrowed};
use postdeck_api_types::{Post, User};
use tracing::warn;

use super::preferences::{SortOrder, ViewMode};

/// Author selector; `All` disables author filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthorFilter {
    #[default]
    All,
    User(u64),
}

impl AuthorFilter {
    pub fn matches(self, post: &Post) -> bool {
        match self {
            Self::All => true,
            Self::User(id) => post.user_id == id,
        }
    }
}

impl fmt::Display for AuthorFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::User(id) => write!(f, "{id}"),
        }
    }
}

impl FromStr for AuthorFilter {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        trimmed.parse().map(Self::User)
    }
}

/// Session filter state. Only `sort_order` and `view_mode` are persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterState {
    pub search_term: String,
    pub selected_author: AuthorFilter,
    pub sort_order: SortOrder,
    pub view_mode: ViewMode,
}

impl FilterState {
    /// Clear search and author, restore the default sort. View mode is kept.
    pub fn reset(&mut self) {
        self.search_term.clear();
        self.selected_author = AuthorFilter::All;
        self.sort_order = SortOrder::default();
    }

    pub fn apply(&self, posts: &[Post]) -> Vec<Post> {
        derive_view(
            posts,
            &self.search_term,
            self.selected_author,
            self.sort_order,
        )
    }
}

pub fn derive_view(
    posts: &[Post],
    search_term: &str,
    selected_author: AuthorFilter,
    sort_order: SortOrder,
) -> Vec<Post> {
    let needle = search_term.to_lowercase();
    let mut view: Vec<Post> = posts
        .iter()
        .filter(|post| matches_search(post, &needle) && selected_author.matches(post))
        .cloned()
        .collect();

    // `sort_by` is stable, so equal titles keep their input order in both directions.
    match sort_order {
        SortOrder::Asc => view.sort_by(|a, b| compare_titles(&a.title, &b.title)),
        SortOrder::Desc => view.sort_by(|a, b| compare_titles(&b.title, &a.title)),
    }
    view
}

fn matches_search(post: &Post, needle: &str) -> bool {
    needle.is_empty()
        || post.title.to_lowercase().contains(needle)
        || post.body.to_lowercase().contains(needle)
}

/// Root-locale collator at default (tertiary) strength. `None` only when the
/// compiled collation data cannot be loaded.
static TITLE_COLLATOR: LazyLock<Option<CollatorBorrowed<'static>>> = LazyLock::new(|| {
    Collator::try_new(Default::default(), CollatorOptions::default())
        .inspect_err(|err| warn!(error = %err, "Title collator unavailable; using case-folded order"))
        .ok()
});

/// Locale-aware title order: accents and case are secondary to the base
/// letters, and on a case-only difference lowercase sorts first.
pub fn compare_titles(a: &str, b: &str) -> Ordering {
    match TITLE_COLLATOR.as_ref() {
        Some(collator) => collator.compare(a, b),
        None => folded_order(a, b),
    }
}

fn folded_order(a: &str, b: &str) -> Ordering {
    let folded_a = a.chars().flat_map(char::to_lowercase);
    let folded_b = b.chars().flat_map(char::to_lowercase);
    folded_a.cmp(folded_b).then_with(|| case_order(a, b))
}

fn case_order(a: &str, b: &str) -> Ordering {
    for (x, y) in a.chars().zip(b.chars()) {
        if x == y {
            continue;
        }
        return match (x.is_lowercase(), y.is_lowercase()) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => x.cmp(&y),
        };
    }
    a.chars().count().cmp(&b.chars().count())
}

/// Display name for an author id, with a fallback for unknown users.
pub fn author_label(users: &[User], user_id: u64) -> String {
    users
        .iter()
        .find(|user| user.id == user_id)
        .map_or_else(|| format!("User {user_id}"), |user| user.name.clone())
}
