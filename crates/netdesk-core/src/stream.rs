// ── Reactive state stream ──
//
// Subscription handle for consumers that render the console as it changes.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::state::ConsoleState;

/// A subscription to the console read model.
///
/// Every published state is a complete, consistent `ConsoleState`; a slow
/// reader skips intermediate states rather than queueing them.
pub struct StateStream {
    current: Arc<ConsoleState>,
    receiver: watch::Receiver<Arc<ConsoleState>>,
}

impl StateStream {
    pub(crate) fn new(receiver: watch::Receiver<Arc<ConsoleState>>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// The state captured at creation time or by the last `changed()`.
    pub fn current(&self) -> &Arc<ConsoleState> {
        &self.current
    }

    /// The latest published state.
    pub fn latest(&self) -> Arc<ConsoleState> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next change. Returns `None` once the console has shut down.
    pub async fn changed(&mut self) -> Option<Arc<ConsoleState>> {
        self.receiver.changed().await.ok()?;
        let state = self.receiver.borrow_and_update().clone();
        self.current = state.clone();
        Some(state)
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    pub fn into_stream(self) -> StateWatchStream {
        StateWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by a `watch::Receiver`; yields the current state
/// first, then each new one.
pub struct StateWatchStream {
    inner: WatchStream<Arc<ConsoleState>>,
}

impl Stream for StateWatchStream {
    type Item = Arc<ConsoleState>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
