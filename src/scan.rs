//! Cursor-driven `SCAN` iteration.
//!
//! Pages are fetched one at a time: each request carries the cursor from the
//! previous reply, so nothing can be pipelined. The cursor `"0"` both starts
//! and ends an iteration.

use crate::commands::Commands;
use crate::error::{CallError, Result};
use crate::target::CommandTarget;

pub const START_CURSOR: &str = "0";

#[derive(Debug, Clone, PartialEq)]
pub enum ScanState {
    /// Waiting to request the page at this cursor.
    Ready(String),
    /// A request for this cursor is in flight.
    Fetching(String),
    Done,
    Failed(CallError),
}

pub struct ScanIterator<T> {
    target: T,
    pattern: Option<String>,
    count: Option<usize>,
    state: ScanState,
}

impl<T: CommandTarget> ScanIterator<T> {
    pub fn new(target: T, pattern: Option<String>, count: Option<usize>) -> Self {
        Self {
            target,
            pattern,
            count,
            state: ScanState::Ready(START_CURSOR.to_string()),
        }
    }

    pub fn state(&self) -> &ScanState {
        &self.state
    }

    /// Fetch until a page with keys arrives. Empty pages are skipped.
    ///
    /// Returns `None` once the iteration is done or has failed. A failure is
    /// returned exactly once and is not retried.
    pub async fn next_page(&mut self) -> Option<Result<Vec<String>>> {
        loop {
            let cursor = match &self.state {
                ScanState::Ready(cursor) | ScanState::Fetching(cursor) => cursor.clone(),
                ScanState::Done | ScanState::Failed(_) => return None,
            };

            self.state = ScanState::Fetching(cursor.clone());
            let reply = self
                .target
                .scan(&cursor, self.pattern.as_deref(), self.count)
                .await;

            match reply {
                Ok((next, keys)) => {
                    tracing::debug!(cursor = %cursor, next = %next, keys = keys.len(), "scan page");
                    self.state = if next == START_CURSOR {
                        ScanState::Done
                    } else {
                        ScanState::Ready(next)
                    };
                    if !keys.is_empty() {
                        return Some(Ok(keys));
                    }
                }
                Err(e) => {
                    self.state = ScanState::Failed(e.clone());
                    return Some(Err(e));
                }
            }
        }
    }

    /// Run to completion, handing every non-empty page to `on_page` in order.
    pub async fn drive<F>(mut self, mut on_page: F) -> Result<()>
    where
        F: FnMut(Vec<String>),
    {
        while let Some(page) = self.next_page().await {
            on_page(page?);
        }
        Ok(())
    }
}
