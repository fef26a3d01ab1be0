use chrono::Utc;
use futures::try_join;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::watch;

use crate::cache::CacheStore;
use crate::models::{normalize_code, RatesPayload, SymbolInfo};
use crate::rates::RatesSource;

/// Where the controller currently stands for its selected base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Ready,
    Error,
}

/// Read-only snapshot handed to consumers. Always internally consistent:
/// rates, symbols and date all belong to `base`.
#[derive(Debug, Clone)]
pub struct RatesView {
    pub base: String,
    pub date: Option<String>,
    pub rates: HashMap<String, f64>,
    pub symbols: HashMap<String, SymbolInfo>,
    pub last_updated: Option<i64>,
    pub loading: bool,
    pub error: Option<String>,
}

impl RatesView {
    fn new(base: &str) -> Self {
        Self {
            base: base.to_string(),
            date: None,
            rates: HashMap::new(),
            symbols: HashMap::new(),
            last_updated: None,
            loading: false,
            error: None,
        }
    }

    pub fn phase(&self) -> Phase {
        if self.loading {
            Phase::Loading
        } else if self.error.is_some() {
            Phase::Error
        } else if self.last_updated.is_some() {
            Phase::Ready
        } else {
            Phase::Idle
        }
    }

    fn apply(&mut self, payload: RatesPayload) {
        self.date = payload.date;
        self.rates = payload.rates;
        self.symbols = payload.symbols;
        self.last_updated = Some(payload.last_updated);
        self.loading = false;
        self.error = None;
    }
}

struct Inner {
    view: RatesView,
    /// Single-flight guard: set while a load cycle is outstanding.
    in_flight: bool,
    /// Bumped on base switches so a late result for an abandoned base is
    /// recognized and discarded instead of overwriting the current state.
    epoch: u64,
}

/// Orchestrates cache reads, the joined symbols+rates fetch, and state
/// transitions. Owns the view; everyone else gets snapshots.
pub struct RatesController<S> {
    source: S,
    cache: CacheStore,
    inner: Mutex<Inner>,
    tx: watch::Sender<RatesView>,
}

impl<S: RatesSource> RatesController<S> {
    pub fn new(source: S, cache: CacheStore, base: &str) -> Self {
        let view = RatesView::new(&normalize_code(base));
        let (tx, _) = watch::channel(view.clone());
        Self {
            source,
            cache,
            inner: Mutex::new(Inner {
                view,
                in_flight: false,
                epoch: 0,
            }),
            tx,
        }
    }

    pub fn state(&self) -> RatesView {
        self.inner.lock().unwrap().view.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RatesView> {
        self.tx.subscribe()
    }

    /// Equivalent to `load(true)`: skip the cache and hit the network.
    pub async fn refresh(&self) {
        self.load(true).await;
    }

    /// Load rates for the current base. A valid cache entry satisfies an
    /// unforced load without a network round. While one cycle is in flight,
    /// further calls are no-ops.
    pub async fn load(&self, force: bool) {
        let (base, epoch) = {
            let mut inner = self.inner.lock().unwrap();
            if inner.in_flight {
                return;
            }
            inner.in_flight = true;
            (inner.view.base.clone(), inner.epoch)
        };

        if !force {
            if let Some(payload) = self.cache.read(&base).await {
                let mut inner = self.inner.lock().unwrap();
                if inner.epoch == epoch {
                    inner.in_flight = false;
                    inner.view.apply(payload);
                    self.tx.send_replace(inner.view.clone());
                }
                return;
            }
        }

        {
            let mut inner = self.inner.lock().unwrap();
            if inner.epoch != epoch {
                return;
            }
            inner.view.loading = true;
            inner.view.error = None;
            self.tx.send_replace(inner.view.clone());
        }

        // Both halves must succeed; a half-fetched payload is never exposed.
        let fetched = try_join!(self.source.symbols(), self.source.daily_rates(&base));

        match fetched {
            Ok((symbols, daily)) => {
                let payload = RatesPayload {
                    base: base.clone(),
                    date: daily.date,
                    rates: daily.rates,
                    symbols,
                    last_updated: Utc::now().timestamp_millis(),
                };
                {
                    let mut inner = self.inner.lock().unwrap();
                    if inner.epoch != epoch {
                        // Base switched while we were fetching; this result
                        // belongs to an abandoned base.
                        return;
                    }
                    inner.in_flight = false;
                    inner.view.apply(payload.clone());
                    self.tx.send_replace(inner.view.clone());
                }
                // Best effort; a failed write never undoes the Ready state.
                self.cache.write(&payload).await;
            }
            Err(e) => {
                let mut inner = self.inner.lock().unwrap();
                if inner.epoch != epoch {
                    return;
                }
                inner.in_flight = false;
                inner.view.loading = false;
                // Previous data (same base) stays visible; retry via refresh().
                inner.view.error = Some(e.to_string());
                self.tx.send_replace(inner.view.clone());
            }
        }
    }

    /// Switch the selected base. Any in-flight fetch for the old base is
    /// abandoned, the view is reset for the new base, and an unforced load
    /// starts immediately.
    pub async fn set_base(&self, code: &str) {
        let code = normalize_code(code);
        {
            let mut inner = self.inner.lock().unwrap();
            if inner.view.base == code {
                return;
            }
            inner.epoch += 1;
            inner.in_flight = false;
            inner.view = RatesView::new(&code);
            self.tx.send_replace(inner.view.clone());
        }
        self.load(false).await;
    }
}
