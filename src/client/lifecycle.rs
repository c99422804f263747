//! Exchange lifecycle state machine.
//!
//! Transitions are pure functions of `(current state, aborted flag, signal)`,
//! so the whole lifecycle is testable without a transport: feed any signal
//! sequence and assert on the resulting states and effects.
//!
//! ```text
//! READY → OPENED → LOADING → DONE
//!               └→ ERROR | TIMEOUT | ABORTED
//! ```
//!
//! Exactly one of DONE/ERROR/TIMEOUT/ABORTED is reached; once terminal, every
//! further signal is ignored. A locally aborted exchange ignores every signal
//! except `Abort`, which is the only path left to settlement; this is what
//! keeps a racing completion from double-settling the exchange.

use crate::transport::TransportSignal;
use crate::types::ProgressEvent;
use std::fmt;

/// Lifecycle state of one exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    /// Constructed, not yet dispatched; the only state allowing mutation.
    Ready,
    /// Dispatched to the transport.
    Opened,
    /// The transport reported the exchange moving.
    Loading,
    /// Terminal: response received.
    Done,
    /// Terminal: transport-level failure.
    Error,
    /// Terminal: the transport's timer fired.
    Timeout,
    /// Terminal: cancelled.
    Aborted,
}

impl ExchangeState {
    /// Whether no further transitions can occur.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExchangeState::Done
                | ExchangeState::Error
                | ExchangeState::Timeout
                | ExchangeState::Aborted
        )
    }
}

impl fmt::Display for ExchangeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExchangeState::Ready => "ready",
            ExchangeState::Opened => "opened",
            ExchangeState::Loading => "loading",
            ExchangeState::Done => "done",
            ExchangeState::Error => "error",
            ExchangeState::Timeout => "timeout",
            ExchangeState::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Side effect a transition asks the exchange driver to perform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effect {
    /// Nothing; the signal is dropped.
    Ignore,
    /// Invoke the `on_start` callback.
    InvokeStart,
    /// Update the progress percentage and invoke `on_progress`.
    InvokeProgress(ProgressEvent),
    /// Build the terminal response and settle the exchange.
    Settle,
    /// A signal arrived after a local abort; re-forward abort to the transport.
    ForwardAbort,
}

/// Result of one transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    /// The state after the signal.
    pub next: ExchangeState,
    /// What the driver must do.
    pub effect: Effect,
}

fn step(next: ExchangeState, effect: Effect) -> Step {
    Step { next, effect }
}

/// Apply one transport signal to the state machine.
pub fn transition(state: ExchangeState, aborted: bool, signal: &TransportSignal) -> Step {
    if state.is_terminal() {
        return step(state, Effect::Ignore);
    }

    match signal {
        TransportSignal::Start => {
            if aborted {
                step(state, Effect::Ignore)
            } else {
                step(ExchangeState::Loading, Effect::InvokeStart)
            }
        }
        TransportSignal::Progress { loaded, total } => {
            if aborted {
                step(state, Effect::ForwardAbort)
            } else {
                step(
                    state,
                    Effect::InvokeProgress(ProgressEvent {
                        loaded: *loaded,
                        total: *total,
                    }),
                )
            }
        }
        TransportSignal::Load { .. } => {
            if aborted {
                step(state, Effect::Ignore)
            } else {
                step(ExchangeState::Done, Effect::Settle)
            }
        }
        TransportSignal::Error(_) => {
            if aborted {
                step(state, Effect::Ignore)
            } else {
                step(ExchangeState::Error, Effect::Settle)
            }
        }
        TransportSignal::Timeout => {
            if aborted {
                step(state, Effect::Ignore)
            } else {
                step(ExchangeState::Timeout, Effect::Settle)
            }
        }
        TransportSignal::Abort => step(ExchangeState::Aborted, Effect::Settle),
    }
}
