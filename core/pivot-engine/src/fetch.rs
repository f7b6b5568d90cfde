//! FILENAME: core/pivot-engine/src/fetch.rs
// PURPOSE: Orders result fetches so a late response never overwrites a newer one.
// CONTEXT: Every configuration change (axis reassignment, measure change)
// issues a new ticket. Only the response for the latest ticket is applied;
// earlier responses are dropped when they arrive.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{PivotError, PivotResult};
use crate::log_debug;

/// Identifies one outstanding fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FetchTicket(u64);

impl FetchTicket {
    pub fn id(self) -> u64 {
        self.0
    }
}

/// Hands out tickets and accepts only the latest one's response.
#[derive(Debug, Default)]
pub struct FetchSequencer {
    latest: AtomicU64,
}

impl FetchSequencer {
    pub fn new() -> Self {
        FetchSequencer {
            latest: AtomicU64::new(0),
        }
    }

    /// Starts a fetch, superseding every earlier ticket.
    pub fn begin(&self) -> FetchTicket {
        FetchTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn latest(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    pub fn is_current(&self, ticket: FetchTicket) -> bool {
        ticket.0 == self.latest()
    }

    /// Passes `response` through if `ticket` is still the latest.
    pub fn accept<T>(&self, ticket: FetchTicket, response: T) -> PivotResult<T> {
        let latest = self.latest();
        if ticket.0 == latest {
            Ok(response)
        } else {
            log_debug!("FETCH", "ignoring stale response {} (latest {})", ticket.0, latest);
            Err(PivotError::StaleFetchIgnored {
                ticket: ticket.0,
                latest,
            })
        }
    }
}
