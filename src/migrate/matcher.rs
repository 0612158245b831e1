use tracing::warn;

use crate::normalization::file_name::match_token;
use crate::store::{CatalogStore, ProductRecord};

/// How a product is chosen when the lookup returns several candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchPolicy {
    /// Take the first row the store returned. Heuristic; may misattribute.
    #[default]
    First,
    /// Refuse to pick when more than one product matches.
    Strict,
}

/// All catalog rows whose name contains the token derived from one file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchSet {
    pub token: Option<String>,
    pub products: Vec<ProductRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection<'m> {
    Chosen(&'m ProductRecord),
    NoMatch,
    Ambiguous(usize),
}

impl MatchPolicy {
    pub fn select<'m>(&self, products: &'m [ProductRecord]) -> Selection<'m> {
        match (products, self) {
            ([], _) => Selection::NoMatch,
            ([only], _) => Selection::Chosen(only),
            ([first, ..], MatchPolicy::First) => Selection::Chosen(first),
            (many, MatchPolicy::Strict) => Selection::Ambiguous(many.len()),
        }
    }
}

pub struct ProductMatcher<'a, C> {
    catalog: &'a C,
}

impl<'a, C: CatalogStore> ProductMatcher<'a, C> {
    pub fn new(catalog: &'a C) -> Self {
        Self { catalog }
    }

    /// Look up every product matching `file_name`'s token. A name with no
    /// token, or a failed query, yields an empty set; neither is an error.
    pub async fn find_matches(&self, file_name: &str) -> MatchSet {
        let Some(token) = match_token(file_name) else {
            return MatchSet {
                token: None,
                products: Vec::new(),
            };
        };

        let products = match self.catalog.find_products_by_name(&token).await {
            Ok(rows) => rows,
            Err(err) => {
                warn!(target = "match", file = file_name, token = %token, error = %err, "catalog query failed; treating as no match");
                println!("   ⚠️  Product lookup failed for \"{token}\": {err}");
                Vec::new()
            }
        };
        MatchSet {
            token: Some(token),
            products,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::fakes::{product, RecordingStore};

    #[tokio::test]
    async fn substring_matches_are_case_insensitive() {
        let store = RecordingStore::with_products(vec![
            product("1", "AFSTPU Standard", &[]),
            product("2", "Hygienic afstpu unit", &[]),
            product("3", "FCU 400", &[]),
        ]);
        let set = ProductMatcher::new(&store)
            .find_matches("AFSTPU(STANDARD).webp")
            .await;
        assert_eq!(set.token.as_deref(), Some("afstpu"));
        let ids: Vec<&str> = set.products.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(store.queries.lock().unwrap().as_slice(), ["afstpu"]);
    }

    #[tokio::test]
    async fn zero_matches_is_empty_not_error() {
        let store = RecordingStore::with_products(vec![product("1", "FCU 400", &[])]);
        let set = ProductMatcher::new(&store).find_matches("chiller.png").await;
        assert_eq!(set.token.as_deref(), Some("chiller"));
        assert!(set.products.is_empty());
    }

    #[tokio::test]
    async fn query_failure_becomes_empty_set() {
        let store = RecordingStore {
            fail_queries: true,
            ..RecordingStore::with_products(vec![product("1", "FCU 400", &[])])
        };
        let set = ProductMatcher::new(&store).find_matches("FCU.png").await;
        assert!(set.products.is_empty());
        assert_eq!(store.query_calls(), 1);
    }

    #[tokio::test]
    async fn tokenless_names_skip_the_query() {
        let store = RecordingStore::default();
        let set = ProductMatcher::new(&store).find_matches("(-).png").await;
        assert_eq!(set.token, None);
        assert_eq!(store.query_calls(), 0);
    }

    #[test]
    fn first_policy_takes_first_row() {
        let rows = vec![product("a", "X1", &[]), product("b", "X2", &[])];
        assert_eq!(MatchPolicy::First.select(&rows), Selection::Chosen(&rows[0]));
        assert_eq!(MatchPolicy::First.select(&[]), Selection::NoMatch);
    }

    #[test]
    fn strict_policy_refuses_ambiguity() {
        let rows = vec![product("a", "X1", &[]), product("b", "X2", &[])];
        assert_eq!(MatchPolicy::Strict.select(&rows), Selection::Ambiguous(2));
        assert_eq!(
            MatchPolicy::Strict.select(&rows[..1]),
            Selection::Chosen(&rows[0])
        );
    }
}
