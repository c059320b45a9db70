//! Gated, sequence-numbered lookup dispatch.
//!
//! A lookup is keyed by `(term, identity)`. Issuing a new key supersedes the
//! previous one: every request carries a monotonically increasing sequence
//! number and only the response to the latest request is applied, so a slow
//! response can never overwrite a newer query's results or resurrect results
//! after the query was cleared.

use tracing::{debug, info, warn};

use crate::model::types::{RawResults, SessionIdentity};
use crate::search::provider::LookupError;

/// Minimum trimmed query length before a lookup is issued.
pub const DEFAULT_MIN_QUERY_LEN: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchKey {
    pub term: String,
    pub identity: SessionIdentity,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupRequest {
    pub seq: u64,
    pub key: SearchKey,
}

#[derive(Debug)]
pub struct LookupResponse {
    pub seq: u64,
    pub outcome: Result<RawResults, LookupError>,
}

/// Returns the lookup key when the gate is open, `None` for "skip".
pub fn gate(term: &str, identity: Option<&SessionIdentity>, min_len: usize) -> Option<SearchKey> {
    let identity = identity?;
    if term.trim().chars().count() < min_len {
        return None;
    }
    Some(SearchKey {
        term: term.to_string(),
        identity: identity.clone(),
    })
}

#[derive(Debug)]
pub struct QueryDispatcher {
    min_len: usize,
    identity: Option<SessionIdentity>,
    term: String,
    active: Option<SearchKey>,
    latest_seq: u64,
    results: Option<RawResults>,
}

impl QueryDispatcher {
    pub fn new(min_len: usize, identity: Option<SessionIdentity>) -> Self {
        Self {
            min_len,
            identity,
            term: String::new(),
            active: None,
            latest_seq: 0,
            results: None,
        }
    }

    pub fn min_len(&self) -> usize {
        self.min_len
    }

    pub fn identity(&self) -> Option<&SessionIdentity> {
        self.identity.as_ref()
    }

    pub fn latest_seq(&self) -> u64 {
        self.latest_seq
    }

    /// Feed a new debounced term. Returns the request to send, if any.
    pub fn update_term(&mut self, term: &str) -> Option<LookupRequest> {
        self.term = term.to_string();
        self.reconcile()
    }

    pub fn set_identity(&mut self, identity: Option<SessionIdentity>) -> Option<LookupRequest> {
        self.identity = identity;
        self.reconcile()
    }

    /// Re-issue the live key after the backend reported a data change.
    ///
    /// Current results stay visible until the fresh response lands.
    pub fn refresh(&mut self) -> Option<LookupRequest> {
        let key = self.active.clone()?;
        Some(self.issue(key))
    }

    /// Apply a response. Returns `true` when it replaced the visible results.
    pub fn accept(&mut self, response: LookupResponse) -> bool {
        if self.active.is_none() || response.seq != self.latest_seq {
            debug!(
                seq = response.seq,
                latest = self.latest_seq,
                "search_stale_discarded"
            );
            return false;
        }
        let results = match response.outcome {
            Ok(results) => results,
            Err(err) => {
                warn!(seq = response.seq, error = %err, "lookup_failed");
                RawResults::default()
            }
        };
        debug!(seq = response.seq, total = results.total(), "search_resolved");
        self.results = Some(results);
        true
    }

    /// A lookup for the live key is in flight and nothing has resolved yet.
    pub fn is_searching(&self) -> bool {
        self.active.is_some() && self.results.is_none()
    }

    pub fn is_skipped(&self) -> bool {
        self.active.is_none()
    }

    pub fn results(&self) -> Option<&RawResults> {
        self.results.as_ref()
    }

    /// Back to idle. The sequence counter is kept so late responses stay stale.
    pub fn reset(&mut self) {
        self.term.clear();
        self.active = None;
        self.results = None;
    }

    fn reconcile(&mut self) -> Option<LookupRequest> {
        let key = gate(&self.term, self.identity.as_ref(), self.min_len);
        if key == self.active {
            return None;
        }
        self.results = None;
        self.active = key.clone();
        match key {
            Some(key) => Some(self.issue(key)),
            None => {
                debug!(term_len = self.term.len(), "search_skip");
                None
            }
        }
    }

    fn issue(&mut self, key: SearchKey) -> LookupRequest {
        self.latest_seq += 1;
        info!(seq = self.latest_seq, term = %key.term, "search_dispatch");
        LookupRequest {
            seq: self.latest_seq,
            key,
        }
    }
}
