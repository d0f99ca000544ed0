//! # Use Case Integration Tests
//!
//! Reusable mock implementations and end-to-end aggregation scenarios over
//! in-process sources.
//!
//! # Test Categories
//!
//! - **Mocks**: scripted sources, a poisoned cache, fixture builders
//! - **Scenarios**: retries before success, exhausted sources, latency bound

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::application::services::retry::RetryPolicy;
use crate::application::services::source_client::SourceClient;
use crate::application::use_cases::aggregate_transactions::{
    AggregateTransactionsConfig, AggregateTransactionsUseCase,
};
use crate::application::use_cases::collect_transactions::{
    CollectTransactionsConfig, CollectTransactionsUseCase,
};
use crate::domain::entities::{Transaction, TransactionList};
use crate::domain::value_objects::{AccountId, SourceId, Timestamp, TransactionId};
use crate::infrastructure::cache::{AggregationCache, CacheError, CacheResult, ShardedCache};
use crate::infrastructure::sources::error::{SourceError, SourceResult};
use crate::infrastructure::sources::registry::SourceRegistry;
use crate::infrastructure::sources::traits::TransactionSource;

// ============================================================================
// Fixtures
// ============================================================================

/// Base instant `T` of the scenarios.
pub fn base_time() -> Timestamp {
    Timestamp::parse("2024-05-01T10:00:00").unwrap()
}

/// Transaction `id` from `source` for account "X" at `T + offset_secs`.
pub fn tx(id: &str, source: &str, offset_secs: i64) -> Transaction {
    Transaction::new(
        TransactionId::new(id),
        SourceId::new(source),
        AccountId::new("X"),
        "100",
        base_time().add_secs(offset_secs),
    )
}

// ============================================================================
// Reusable Mock Implementations
// ============================================================================

/// One scripted response of a [`ScriptedSource`].
#[derive(Debug, Clone)]
pub struct Step {
    delay: Duration,
    result: SourceResult<Vec<Transaction>>,
}

impl Step {
    pub fn ok(transactions: Vec<Transaction>) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Ok(transactions),
        }
    }

    pub fn fail(error: SourceError) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Err(error),
        }
    }

    pub fn slow(delay: Duration, transactions: Vec<Transaction>) -> Self {
        Self {
            delay,
            result: Ok(transactions),
        }
    }
}

/// Source replaying a fixed script; the last step repeats once exhausted.
#[derive(Debug)]
pub struct ScriptedSource {
    id: SourceId,
    steps: Vec<Step>,
    calls: AtomicU32,
}

impl ScriptedSource {
    pub fn new(id: &str, steps: Vec<Step>) -> Self {
        Self {
            id: SourceId::new(id),
            steps,
            calls: AtomicU32::new(0),
        }
    }

    pub fn shared(id: &str, steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self::new(id, steps))
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TransactionSource for ScriptedSource {
    fn source_id(&self) -> &SourceId {
        &self.id
    }

    async fn fetch_transactions(&self, _account: &AccountId) -> SourceResult<Vec<Transaction>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
        let Some(step) = self.steps.get(call).or_else(|| self.steps.last()) else {
            return Ok(Vec::new());
        };
        if !step.delay.is_zero() {
            tokio::time::sleep(step.delay).await;
        }
        step.result.clone()
    }
}

/// Cache whose every operation reports corruption.
#[derive(Debug)]
pub struct PoisonedCache;

impl AggregationCache for PoisonedCache {
    fn get(&self, _account: &AccountId) -> CacheResult<Option<TransactionList>> {
        Err(CacheError::Poisoned { shard: 0 })
    }

    fn put(&self, _account: &AccountId, _transactions: TransactionList) -> CacheResult<()> {
        Err(CacheError::Poisoned { shard: 0 })
    }

    fn invalidate(&self, _account: &AccountId) -> CacheResult<bool> {
        Err(CacheError::Poisoned { shard: 0 })
    }
}

pub fn registry_of(sources: &[Arc<ScriptedSource>]) -> SourceRegistry {
    SourceRegistry::new(
        sources
            .iter()
            .map(|s| Arc::clone(s) as Arc<dyn TransactionSource>)
            .collect(),
    )
    .unwrap()
}

fn collector(sources: &[Arc<ScriptedSource>], deadline_ms: u64) -> CollectTransactionsUseCase {
    let client = SourceClient::new(
        RetryPolicy::new(5, 5, 20, 2.0, 0.0),
        Duration::from_millis(1_000),
    );
    CollectTransactionsUseCase::new(
        Arc::new(registry_of(sources)),
        Arc::new(client),
        CollectTransactionsConfig::with_deadline(deadline_ms),
    )
}

/// Facade over `sources` with a fresh unbounded cache it also returns.
pub fn facade(
    sources: Vec<Arc<ScriptedSource>>,
    config: AggregateTransactionsConfig,
) -> (AggregateTransactionsUseCase, Arc<ShardedCache>) {
    let cache = Arc::new(ShardedCache::without_expiry());
    let use_case = facade_with(sources, Arc::clone(&cache) as Arc<dyn AggregationCache>, config);
    (use_case, cache)
}

pub fn facade_with(
    sources: Vec<Arc<ScriptedSource>>,
    cache: Arc<dyn AggregationCache>,
    config: AggregateTransactionsConfig,
) -> AggregateTransactionsUseCase {
    AggregateTransactionsUseCase::new(Arc::new(collector(&sources, 2_000)), cache, config)
}

// ============================================================================
// Scenarios
// ============================================================================

fn ids_and_offsets(list: &TransactionList) -> Vec<(String, String)> {
    list.iter()
        .map(|t| (t.id().to_string(), t.timestamp().to_string()))
        .collect()
}

#[tokio::test]
async fn source_recovering_after_two_failures_is_merged_in_order() {
    let a = ScriptedSource::shared(
        "A",
        vec![
            Step::fail(SourceError::Throttled { status: 503 }),
            Step::fail(SourceError::Throttled { status: 529 }),
            Step::ok(vec![tx("1", "A", 2)]),
        ],
    );
    let b = ScriptedSource::shared("B", vec![Step::ok(vec![tx("2", "B", 5)])]);
    let (use_case, _) = facade(
        vec![Arc::clone(&a), Arc::clone(&b)],
        AggregateTransactionsConfig::default(),
    );

    let started = tokio::time::Instant::now();
    let result = use_case.execute(&AccountId::new("X")).await.unwrap();

    assert_eq!(
        ids_and_offsets(&result),
        vec![
            ("2".to_string(), base_time().add_secs(5).to_string()),
            ("1".to_string(), base_time().add_secs(2).to_string()),
        ]
    );
    assert_eq!(a.calls(), 3);
    assert_eq!(b.calls(), 1);
    assert!(started.elapsed() < Duration::from_millis(2_000));
}

#[tokio::test]
async fn exhausted_source_degrades_to_the_others() {
    let a = ScriptedSource::shared(
        "A",
        vec![Step::fail(SourceError::Throttled { status: 503 })],
    );
    let b = ScriptedSource::shared("B", vec![Step::ok(vec![tx("3", "B", 0)])]);
    let (use_case, _) = facade(vec![a, b], AggregateTransactionsConfig::default());

    let result = use_case.execute(&AccountId::new("Y")).await.unwrap();

    let ids: Vec<&str> = result.iter().map(|t| t.id().as_str()).collect();
    assert_eq!(ids, vec!["3"]);
}

#[tokio::test]
async fn repeated_aggregation_is_idempotent_and_offline() {
    let a = ScriptedSource::shared("A", vec![Step::ok(vec![tx("1", "A", 2), tx("0", "A", 2)])]);
    let b = ScriptedSource::shared("B", vec![Step::ok(vec![tx("2", "B", 5)])]);
    let (use_case, _) = facade(
        vec![Arc::clone(&a), Arc::clone(&b)],
        AggregateTransactionsConfig::default(),
    );
    let account = AccountId::new("X");

    let first = use_case.execute(&account).await.unwrap();
    let second = use_case.execute(&account).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(a.calls() + b.calls(), 2);
}

#[tokio::test]
async fn all_sources_failing_still_succeeds_with_no_records() {
    let a = ScriptedSource::shared("A", vec![Step::fail(SourceError::transport("refused"))]);
    let b = ScriptedSource::shared("B", vec![Step::fail(SourceError::decode("not json"))]);
    let (use_case, _) = facade(vec![a, b], AggregateTransactionsConfig::default());

    let result = use_case.execute(&AccountId::new("Z")).await.unwrap();

    assert!(result.is_empty());
}

#[tokio::test]
async fn latency_is_bounded_by_the_deadline() {
    let sources: Vec<_> = (0..10)
        .map(|i| {
            ScriptedSource::shared(
                &format!("s{i}"),
                vec![Step::slow(Duration::from_secs(30), Vec::new())],
            )
        })
        .collect();
    let use_case = AggregateTransactionsUseCase::new(
        Arc::new(collector(&sources, 200)),
        Arc::new(ShardedCache::without_expiry()),
        AggregateTransactionsConfig::default(),
    );

    let started = tokio::time::Instant::now();
    let result = use_case.execute(&AccountId::new("X")).await.unwrap();

    assert!(result.is_empty());
    assert!(started.elapsed() < Duration::from_millis(800));
}
