// ── Async slots ──
//
// Every asynchronous operation the console tracks lives in an `AsyncSlot`:
// the token of the request currently in flight, the last good value and the
// last failure. A settlement only lands when its token is the one in
// flight, so a superseded request can finish whenever it likes and change
// nothing.

use serde::Serialize;
use std::fmt;

use crate::error::CollaboratorError;

/// Monotonic request token, issued per slot kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct RequestToken(u64);

impl RequestToken {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Issues strictly increasing tokens.
#[derive(Debug, Clone, Default)]
pub(crate) struct TokenCounter(u64);

impl TokenCounter {
    pub(crate) fn issue(&mut self) -> RequestToken {
        self.0 += 1;
        RequestToken(self.0)
    }
}

/// What happened when a settlement was offered to a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    /// The value was stored.
    Applied,
    /// The request failed; the previous value is untouched.
    Failed(CollaboratorError),
    /// The token is not the one in flight; nothing changed.
    Stale,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AsyncSlot<T> {
    in_flight: Option<RequestToken>,
    value: Option<T>,
    error: Option<CollaboratorError>,
}

impl<T> Default for AsyncSlot<T> {
    fn default() -> Self {
        Self {
            in_flight: None,
            value: None,
            error: None,
        }
    }
}

impl<T> AsyncSlot<T> {
    /// True while the latest request has not settled.
    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn in_flight(&self) -> Option<RequestToken> {
        self.in_flight
    }

    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Failure of the most recent settled request, cleared by the next success.
    pub fn last_error(&self) -> Option<&CollaboratorError> {
        self.error.as_ref()
    }

    /// Start a request. Any request already in flight becomes stale.
    pub(crate) fn begin(&mut self, token: RequestToken) {
        self.in_flight = Some(token);
    }

    /// Abandon the in-flight request without starting another.
    pub(crate) fn supersede(&mut self) {
        self.in_flight = None;
    }

    /// Abandon everything, including the stored value.
    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn settle(
        &mut self,
        token: RequestToken,
        outcome: Result<T, CollaboratorError>,
    ) -> Settlement {
        if self.in_flight != Some(token) {
            return Settlement::Stale;
        }
        self.in_flight = None;
        match outcome {
            Ok(value) => {
                self.value = Some(value);
                self.error = None;
                Settlement::Applied
            }
            Err(err) => {
                self.error = Some(err.clone());
                Settlement::Failed(err)
            }
        }
    }
}
