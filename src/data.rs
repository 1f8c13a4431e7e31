use async_trait::async_trait;
use gloo_net::http::Request;
use log::{debug, error};
use rand::seq::SliceRandom;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cell::RefCell;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cat {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl Cat {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            metadata: Map::new(),
        }
    }

    /// Tags attached to the cat by the API, if any. Non-string entries are skipped.
    pub fn tags(&self) -> Vec<&str> {
        self.metadata
            .get("tags")
            .and_then(Value::as_array)
            .map(|tags| tags.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Error)]
pub enum DataError {
    #[error("network error: {0}")]
    Network(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("preload error: {0}")]
    Preload(String),
}

impl DataError {
    fn network<E: std::fmt::Display>(err: E) -> Self {
        Self::Network(err.to_string())
    }

    fn parse<E: std::fmt::Display>(err: E) -> Self {
        Self::Parse(err.to_string())
    }
}

pub fn image_url(host: &str, id: &str, width: u32) -> String {
    format!("{}/cat/{}?w={}", host.trim_end_matches('/'), id, width)
}

pub fn pool_url(api_base: &str, limit: u32, skip: u32) -> String {
    format!(
        "{}/api/cats?limit={}&skip={}",
        api_base.trim_end_matches('/'),
        limit,
        skip
    )
}

/// The remote collection the batches are drawn from.
#[async_trait(?Send)]
pub trait CatPool {
    async fn fetch_pool(&self) -> Result<Vec<Cat>, DataError>;
}

/// Anything that can hand the deck a batch of cats. Never fails: an empty
/// batch is the failure signal.
#[async_trait(?Send)]
pub trait CatSource {
    async fn fetch_batch(&self, count: usize) -> Vec<Cat>;
}

pub struct HttpCatPool {
    url: String,
}

impl HttpCatPool {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait(?Send)]
impl CatPool for HttpCatPool {
    async fn fetch_pool(&self) -> Result<Vec<Cat>, DataError> {
        let response = Request::get(&self.url)
            .send()
            .await
            .map_err(DataError::network)?;

        if !response.ok() {
            return Err(DataError::Network(format!(
                "HTTP {} while fetching {}",
                response.status(),
                self.url
            )));
        }

        let text = response.text().await.map_err(DataError::network)?;
        parse_pool(&text)
    }
}

pub fn parse_pool(text: &str) -> Result<Vec<Cat>, DataError> {
    serde_json::from_str(text).map_err(DataError::parse)
}

/// Shuffles the pool in place and keeps the first `count` cats.
pub fn pick_batch<R: RngCore + ?Sized>(mut pool: Vec<Cat>, count: usize, rng: &mut R) -> Vec<Cat> {
    pool.shuffle(rng);
    pool.truncate(count);
    pool
}

pub struct CatFetcher<P> {
    pool: P,
    rng: RefCell<Box<dyn RngCore>>,
}

impl<P: CatPool> CatFetcher<P> {
    pub fn new(pool: P) -> Self {
        Self::with_rng(pool, Box::new(rand::thread_rng()))
    }

    pub fn with_rng(pool: P, rng: Box<dyn RngCore>) -> Self {
        Self {
            pool,
            rng: RefCell::new(rng),
        }
    }
}

#[async_trait(?Send)]
impl<P: CatPool> CatSource for CatFetcher<P> {
    async fn fetch_batch(&self, count: usize) -> Vec<Cat> {
        match self.pool.fetch_pool().await {
            Ok(pool) => {
                debug!("Fetched a pool of {} cats", pool.len());
                let mut rng = self.rng.borrow_mut();
                pick_batch(pool, count, &mut **rng)
            }
            Err(err) => {
                error!("Failed to fetch cats: {}", err);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::cell::Cell;

    struct FixedPool {
        cats: Vec<Cat>,
        calls: Cell<usize>,
    }

    impl FixedPool {
        fn of(ids: &[&str]) -> Self {
            Self {
                cats: ids.iter().map(|id| Cat::new(*id)).collect(),
                calls: Cell::new(0),
            }
        }
    }

    #[async_trait(?Send)]
    impl CatPool for FixedPool {
        async fn fetch_pool(&self) -> Result<Vec<Cat>, DataError> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.cats.clone())
        }
    }

    struct BrokenPool;

    #[async_trait(?Send)]
    impl CatPool for BrokenPool {
        async fn fetch_pool(&self) -> Result<Vec<Cat>, DataError> {
            Err(DataError::Network("connection refused".into()))
        }
    }

    fn ids(cats: &[Cat]) -> Vec<String> {
        cats.iter().map(|cat| cat.id.clone()).collect()
    }

    #[test]
    fn batch_is_a_prefix_of_the_requested_size() {
        let pool = FixedPool::of(&["a", "b", "c", "d", "e"]);
        let fetcher = CatFetcher::with_rng(pool, Box::new(StdRng::seed_from_u64(7)));

        let batch = block_on(fetcher.fetch_batch(3));
        assert_eq!(batch.len(), 3);
        for cat in &batch {
            assert!(["a", "b", "c", "d", "e"].contains(&cat.id.as_str()));
        }
        let mut unique = ids(&batch);
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 3);
    }

    #[test]
    fn oversized_request_returns_whole_pool() {
        let fetcher = CatFetcher::new(FixedPool::of(&["a", "b", "c"]));
        let mut batch = ids(&block_on(fetcher.fetch_batch(15)));
        batch.sort();
        assert_eq!(batch, vec!["a", "b", "c"]);
    }

    #[test]
    fn each_call_hits_the_pool_once() {
        let fetcher = CatFetcher::new(FixedPool::of(&["a", "b"]));
        block_on(fetcher.fetch_batch(1));
        block_on(fetcher.fetch_batch(1));
        assert_eq!(fetcher.pool.calls.get(), 2);
    }

    #[test]
    fn failures_become_an_empty_batch() {
        let fetcher = CatFetcher::new(BrokenPool);
        assert!(block_on(fetcher.fetch_batch(15)).is_empty());
    }

    #[test]
    fn shuffle_preserves_the_multiset() {
        let pool: Vec<Cat> = ["a", "b", "b", "c", "d"].iter().map(|id| Cat::new(*id)).collect();
        let mut rng = StdRng::seed_from_u64(42);
        let mut shuffled = ids(&pick_batch(pool.clone(), pool.len(), &mut rng));
        let mut original = ids(&pool);
        shuffled.sort();
        original.sort();
        assert_eq!(shuffled, original);
    }

    #[test]
    fn shuffle_has_no_positional_bias() {
        const RUNS: usize = 24_000;
        let pool: Vec<Cat> = ["a", "b", "c", "d"].iter().map(|id| Cat::new(*id)).collect();
        let mut rng = StdRng::seed_from_u64(1234);
        let mut first_counts = [0usize; 4];
        let mut orderings = std::collections::HashSet::new();

        for _ in 0..RUNS {
            let shuffled = pick_batch(pool.clone(), pool.len(), &mut rng);
            let first = pool.iter().position(|cat| cat.id == shuffled[0].id).unwrap();
            first_counts[first] += 1;
            orderings.insert(ids(&shuffled).join(""));
        }

        // 4! orderings must all be reachable.
        assert_eq!(orderings.len(), 24);
        let expected = RUNS as f64 / 4.0;
        for count in first_counts {
            let deviation = (count as f64 - expected).abs() / expected;
            assert!(deviation < 0.05, "positional bias: {:?}", first_counts);
        }
    }

    #[test]
    fn zero_count_yields_nothing() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(pick_batch(vec![Cat::new("a")], 0, &mut rng).is_empty());
    }

    #[test]
    fn parses_records_and_keeps_metadata() {
        let json = r#"[
            {"_id": "abc", "tags": ["cute", "orange", 3], "mimetype": "image/jpeg"},
            {"id": "def"}
        ]"#;
        let cats = parse_pool(json).unwrap();
        assert_eq!(ids(&cats), vec!["abc", "def"]);
        assert_eq!(cats[0].tags(), vec!["cute", "orange"]);
        assert_eq!(cats[0].metadata["mimetype"], "image/jpeg");
        assert!(cats[1].tags().is_empty());
    }

    #[test]
    fn rejects_records_without_string_id() {
        assert!(matches!(parse_pool(r#"[{"id": 5}]"#), Err(DataError::Parse(_))));
        assert!(matches!(parse_pool(r#"{"id": "a"}"#), Err(DataError::Parse(_))));
    }

    #[test]
    fn urls_follow_the_templates() {
        assert_eq!(
            image_url("https://cataas.com/", "xyz", 600),
            "https://cataas.com/cat/xyz?w=600"
        );
        assert_eq!(
            pool_url("https://cataas.com", 30, 0),
            "https://cataas.com/api/cats?limit=30&skip=0"
        );
    }
}
