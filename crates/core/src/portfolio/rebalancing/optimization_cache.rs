//! Bounded LRU cache of prior analysis results.
//!
//! Lookup, compute-on-miss and insert run under one lock so that concurrent
//! callers asking for the same analysis never compute it twice.

use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{debug, info};
use lru::LruCache;
use rust_decimal::Decimal;

use super::rebalancing_model::{
    AnalysisRequest, AnalysisResult, RebalanceOverrides, RiskTolerance, StrategyKind,
};
use crate::constants::DEFAULT_CACHE_CAPACITY;
use crate::portfolio::holdings::portfolio_signature;

/// Identity of a cached analysis: portfolio composition plus every request
/// parameter that changes the outcome.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub signature: String,
    pub strategy: StrategyKind,
    pub risk_tolerance: RiskTolerance,
    pub overrides: RebalanceOverrides,
}

impl CacheKey {
    pub fn for_request(request: &AnalysisRequest) -> Self {
        Self {
            signature: portfolio_signature(&request.holdings),
            strategy: request.strategy,
            risk_tolerance: request.risk_tolerance,
            overrides: request.overrides,
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    request: AnalysisRequest,
    /// Prices the result was computed with.
    prices: BTreeMap<String, Decimal>,
    result: AnalysisResult,
}

/// Result of a cache lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheLookup {
    pub result: AnalysisResult,
    pub hit: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
}

pub struct OptimizationCache {
    entries: Mutex<LruCache<CacheKey, CacheEntry>>,
}

impl Default for OptimizationCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl OptimizationCache {
    /// Creates a cache holding at most `capacity` results (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<CacheKey, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the cached result when one exists for `request` and was
    /// computed with exactly `prices`; otherwise runs `compute` and stores
    /// its output. Results carrying data warnings are returned but not stored.
    pub fn get_or_compute<F>(
        &self,
        request: &AnalysisRequest,
        prices: &BTreeMap<String, Decimal>,
        compute: F,
    ) -> CacheLookup
    where
        F: FnOnce() -> AnalysisResult,
    {
        let key = CacheKey::for_request(request);
        let mut entries = self.lock();

        if let Some(entry) = entries.get(&key) {
            if &entry.prices == prices {
                debug!("Optimization cache hit for {}", key.signature);
                return CacheLookup {
                    result: entry.result.clone(),
                    hit: true,
                };
            }
        }

        let result = compute();
        if result.data_warnings.is_empty() {
            entries.put(
                key,
                CacheEntry {
                    request: request.clone(),
                    prices: prices.clone(),
                    result: result.clone(),
                },
            );
        } else {
            entries.pop(&key);
        }
        CacheLookup { result, hit: false }
    }

    /// Stores a freshly computed result, replacing any previous one.
    pub fn put(
        &self,
        request: &AnalysisRequest,
        prices: BTreeMap<String, Decimal>,
        result: AnalysisResult,
    ) {
        self.lock().put(
            CacheKey::for_request(request),
            CacheEntry {
                request: request.clone(),
                prices,
                result,
            },
        );
    }

    pub fn get(&self, request: &AnalysisRequest) -> Option<AnalysisResult> {
        self.lock()
            .peek(&CacheKey::for_request(request))
            .map(|entry| entry.result.clone())
    }

    pub fn remove(&self, request: &AnalysisRequest) -> bool {
        self.lock().pop(&CacheKey::for_request(request)).is_some()
    }

    /// Drops entries that hold `symbol` at a price other than `price`.
    pub fn invalidate_price(&self, symbol: &str, price: Decimal) -> usize {
        let removed = self.remove_where(|entry| {
            entry
                .prices
                .get(symbol)
                .is_some_and(|cached| *cached != price)
        });
        if removed > 0 {
            info!(
                "Invalidated {} cached analyses after {} moved to {}",
                removed, symbol, price
            );
        }
        removed
    }

    /// Drops entries whose portfolio contains any of `symbols`.
    pub fn invalidate_symbols(&self, symbols: &[String]) -> usize {
        let removed = self.remove_where(|entry| {
            entry
                .request
                .holdings
                .iter()
                .any(|h| symbols.iter().any(|s| s.eq_ignore_ascii_case(&h.symbol)))
        });
        if removed > 0 {
            info!(
                "Invalidated {} cached analyses after holdings change for {:?}",
                removed, symbols
            );
        }
        removed
    }

    pub fn clear(&self) -> usize {
        let mut entries = self.lock();
        let removed = entries.len();
        entries.clear();
        removed
    }

    fn remove_where<P>(&self, predicate: P) -> usize
    where
        P: Fn(&CacheEntry) -> bool,
    {
        let mut entries = self.lock();
        let stale: Vec<CacheKey> = entries
            .iter()
            .filter(|(_, entry)| predicate(entry))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &stale {
            entries.pop(key);
        }
        stale.len()
    }

    /// Requests of every cached entry, most recently used first.
    pub fn requests(&self) -> Vec<AnalysisRequest> {
        self.lock()
            .iter()
            .map(|(_, entry)| entry.request.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.lock().cap().get()
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.lock();
        CacheStats {
            entries: entries.len(),
            capacity: entries.cap().get(),
        }
    }
}
