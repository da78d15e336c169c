//! Keyed query cache with an explicit per-query state machine.
//!
//! ```text
//!   (absent) --begin_fetch--> Refetching --commit--> Fresh
//!   Fresh --invalidate--> Stale(Invalidated) --begin_fetch--> Refetching
//!   Refetching --failure--> Stale(FetchFailed)
//! ```
//!
//! Every `begin_fetch` and `invalidate` bumps the entry's generation and
//! cancels the fetch in flight, so only the most recently issued fetch can
//! commit. A result that arrives for an older generation is discarded.
//! Data read while an entry is not `Fresh` is the last known value and is
//! not authoritative.
//!
//! Readers that find a fetch in flight wait for it via [`QueryCache::in_flight`]
//! instead of starting their own.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::error::ClientError;
use crate::query::{QueryData, QueryKey};

/// Default buffer capacity for the state-change channel.
const DEFAULT_CAPACITY: usize = 256;

/// Why an entry stopped being authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleReason {
    /// A mutation could have changed the result.
    Invalidated { by: &'static str },
    /// The last refetch failed; the previous data (if any) is kept.
    FetchFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryState {
    Fresh,
    Stale(StaleReason),
    Refetching,
}

/// A state transition for one key, as seen by subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryEvent {
    pub key: QueryKey,
    pub state: QueryState,
}

/// Permission to commit one fetch for one key.
///
/// Dropping the ticket without completing it leaves the entry `Refetching`
/// until the next `begin_fetch` or `invalidate`, but wakes every reader
/// waiting on it.
#[derive(Debug)]
pub struct FetchTicket {
    pub key: QueryKey,
    generation: u64,
    cancel: CancellationToken,
    _settled: DropGuard,
}

impl FetchTicket {
    /// Fires when a newer fetch or an invalidation supersedes this one.
    pub fn cancelled(&self) -> tokio_util::sync::WaitForCancellationFuture<'_> {
        self.cancel.cancelled()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// What `complete_fetch` did with a result.
#[derive(Debug)]
pub enum FetchCommit {
    Committed(QueryData),
    /// The fetch failed; the entry is now `Stale(FetchFailed)`.
    Failed(ClientError),
    /// A newer fetch or invalidation overtook this one; its result was dropped.
    Superseded,
}

/// Point-in-time copy of one entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub data: Option<QueryData>,
    pub state: QueryState,
}

impl Snapshot {
    /// The data, only if it is authoritative.
    pub fn fresh(&self) -> Option<&QueryData> {
        match self.state {
            QueryState::Fresh => self.data.as_ref(),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Entry {
    data: Option<QueryData>,
    state: QueryState,
    generation: u64,
    cancel: Option<CancellationToken>,
    /// Cancelled once the current ticket is completed or dropped.
    settled: Option<CancellationToken>,
    last_error: Option<ClientError>,
}

impl Entry {
    fn new() -> Self {
        Self {
            data: None,
            state: QueryState::Refetching,
            generation: 0,
            cancel: None,
            settled: None,
            last_error: None,
        }
    }

    /// Bump the generation and cancel whatever was in flight.
    fn supersede(&mut self, key: &QueryKey) -> u64 {
        if let Some(cancel) = self.cancel.take() {
            if !cancel.is_cancelled() {
                tracing::debug!(query = %key, generation = self.generation, "Superseding in-flight fetch");
                cancel.cancel();
            }
        }
        self.generation += 1;
        self.generation
    }
}

/// Shared cache of query results. Designed to be held in an `Arc`.
pub struct QueryCache {
    entries: Mutex<HashMap<QueryKey, Entry>>,
    events: broadcast::Sender<QueryEvent>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a cache whose event channel buffers `capacity` events.
    pub fn with_capacity(capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity);
        Self {
            entries: Mutex::new(HashMap::new()),
            events,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<QueryKey, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, key: &QueryKey, state: QueryState) {
        // Only fails when nobody is subscribed.
        let _ = self.events.send(QueryEvent {
            key: key.clone(),
            state,
        });
    }

    pub fn get(&self, key: &QueryKey) -> Option<Snapshot> {
        self.lock().get(key).map(|entry| Snapshot {
            data: entry.data.clone(),
            state: entry.state,
        })
    }

    pub fn state(&self, key: &QueryKey) -> Option<QueryState> {
        self.lock().get(key).map(|entry| entry.state)
    }

    /// A token that fires when the fetch in flight for `key` settles, or
    /// `None` if no live fetch is running.
    ///
    /// A fetch settles when it commits, fails, is superseded, or its ticket
    /// is dropped.
    pub fn in_flight(&self, key: &QueryKey) -> Option<CancellationToken> {
        let entries = self.lock();
        let entry = entries.get(key)?;
        if entry.state != QueryState::Refetching {
            return None;
        }
        entry.settled.clone().filter(|settled| !settled.is_cancelled())
    }

    /// The error that left `key` in `Stale(FetchFailed)`.
    pub fn last_error(&self, key: &QueryKey) -> Option<ClientError> {
        let entries = self.lock();
        let entry = entries.get(key)?;
        match entry.state {
            QueryState::Stale(StaleReason::FetchFailed) => entry.last_error.clone(),
            _ => None,
        }
    }

    /// Every key that has been fetched or is being fetched.
    pub fn keys(&self) -> Vec<QueryKey> {
        self.lock().keys().cloned().collect()
    }

    pub fn stale_keys(&self) -> Vec<QueryKey> {
        self.lock()
            .iter()
            .filter(|(_, entry)| matches!(entry.state, QueryState::Stale(_)))
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Start a fetch for `key`, superseding any fetch already in flight.
    pub fn begin_fetch(&self, key: &QueryKey) -> FetchTicket {
        let cancel = CancellationToken::new();
        let settled = CancellationToken::new();
        let generation = {
            let mut entries = self.lock();
            let entry = entries.entry(key.clone()).or_insert_with(Entry::new);
            let generation = entry.supersede(key);
            entry.cancel = Some(cancel.clone());
            entry.settled = Some(settled.clone());
            entry.state = QueryState::Refetching;
            generation
        };
        tracing::debug!(query = %key, generation, "Fetch started");
        self.publish(key, QueryState::Refetching);
        FetchTicket {
            key: key.clone(),
            generation,
            cancel,
            _settled: settled.drop_guard(),
        }
    }

    /// Commit the outcome of the fetch `ticket` was issued for.
    ///
    /// Only the latest generation commits. A failure keeps the previous data
    /// and leaves the entry `Stale(FetchFailed)`. Waiting readers are woken
    /// after the entry is updated.
    pub fn complete_fetch(
        &self,
        ticket: FetchTicket,
        result: Result<QueryData, ClientError>,
    ) -> FetchCommit {
        let key = ticket.key;
        let (state, commit) = {
            let mut entries = self.lock();
            let Some(entry) = entries.get_mut(&key) else {
                return FetchCommit::Superseded;
            };
            if entry.generation != ticket.generation || ticket.cancel.is_cancelled() {
                tracing::debug!(
                    query = %key,
                    generation = ticket.generation,
                    latest = entry.generation,
                    "Discarding superseded fetch result"
                );
                return FetchCommit::Superseded;
            }
            entry.cancel = None;
            match result {
                Ok(data) => {
                    entry.data = Some(data.clone());
                    entry.last_error = None;
                    entry.state = QueryState::Fresh;
                    (QueryState::Fresh, FetchCommit::Committed(data))
                }
                Err(err) => {
                    tracing::warn!(query = %key, error = %err, "Fetch failed");
                    entry.state = QueryState::Stale(StaleReason::FetchFailed);
                    entry.last_error = Some(err.clone());
                    (
                        QueryState::Stale(StaleReason::FetchFailed),
                        FetchCommit::Failed(err),
                    )
                }
            }
        };
        self.publish(&key, state);
        commit
    }

    /// Mark `keys` stale, superseding any fetch in flight for them.
    ///
    /// Keys the cache has never seen are ignored.
    pub fn invalidate<'a>(
        &self,
        keys: impl IntoIterator<Item = &'a QueryKey>,
        by: &'static str,
    ) -> Vec<QueryKey> {
        let reason = QueryState::Stale(StaleReason::Invalidated { by });
        let invalidated: Vec<QueryKey> = {
            let mut entries = self.lock();
            keys.into_iter()
                .filter_map(|key| {
                    let entry = entries.get_mut(key)?;
                    entry.supersede(key);
                    entry.state = reason;
                    Some(key.clone())
                })
                .collect()
        };
        for key in &invalidated {
            self.publish(key, reason);
        }
        if !invalidated.is_empty() {
            tracing::debug!(mutation = by, count = invalidated.len(), "Invalidated cached queries");
        }
        invalidated
    }

    /// Mark stale every cached key `pred` selects. The predicate also sees
    /// the last known data, which is `None` until a fetch has committed.
    pub fn invalidate_where(
        &self,
        by: &'static str,
        pred: impl Fn(&QueryKey, Option<&QueryData>) -> bool,
    ) -> Vec<QueryKey> {
        let keys: Vec<QueryKey> = self
            .lock()
            .iter()
            .filter(|(key, entry)| pred(key, entry.data.as_ref()))
            .map(|(key, _)| key.clone())
            .collect();
        self.invalidate(&keys, by)
    }

    /// Receive every state change for every key.
    pub fn subscribe(&self) -> broadcast::Receiver<QueryEvent> {
        self.events.subscribe()
    }

    /// Receive state changes for one key.
    pub fn watch(&self, key: QueryKey) -> QuerySubscription {
        QuerySubscription {
            key,
            receiver: self.events.subscribe(),
        }
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

/// An observer registered for one query key.
pub struct QuerySubscription {
    key: QueryKey,
    receiver: broadcast::Receiver<QueryEvent>,
}

impl QuerySubscription {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    /// Wait for the next state change of the watched key.
    ///
    /// Returns `None` once the cache is dropped. If the observer fell behind,
    /// missed events are skipped; the cache itself stays the source of truth.
    pub async fn changed(&mut self) -> Option<QueryState> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if event.key == self.key => return Some(event.state),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(query = %self.key, skipped, "Subscriber lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking variant of [`changed`](Self::changed).
    pub fn try_changed(&mut self) -> Option<QueryState> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if event.key == self.key => return Some(event.state),
                Ok(_) | Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }
}
