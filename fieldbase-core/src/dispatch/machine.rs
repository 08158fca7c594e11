//! Dispatch state machine
//!
//! Tracks where the dispatcher is within one step. Transitions are pure;
//! the dispatcher feeds events as it does the work.

use crate::classify::MessageKind;

/// Dispatch states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DispatchState {
    /// Waiting for the radio to report a datagram
    #[default]
    Idle,
    /// Pulling one datagram into the receive buffer
    Receiving,
    /// Datagram kind decided
    Classified(MessageKind),
    /// Datagram handed to its consumers
    Routed(MessageKind),
}

/// Events that move the dispatcher between states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DispatchEvent {
    /// Radio reports a datagram waiting
    DatagramAvailable,
    /// Radio yielded nothing (duplicate, not for us, or gone)
    ReceiveFailed,
    /// Classifier decided the kind
    Classified(MessageKind),
    /// Routing to consumers started
    Routing,
    /// All consumers done
    RouteComplete,
}

impl DispatchState {
    /// True while a datagram is being handled
    pub fn is_busy(&self) -> bool {
        !matches!(self, DispatchState::Idle)
    }

    /// Process an event and return the next state
    pub fn transition(self, event: DispatchEvent) -> Self {
        use DispatchEvent as E;
        use DispatchState::*;

        match (self, event) {
            (Idle, E::DatagramAvailable) => Receiving,

            (Receiving, E::Classified(kind)) => Classified(kind),
            (Receiving, E::ReceiveFailed) => Idle,

            (Classified(kind), E::Routing) => Routed(kind),

            (Routed(_), E::RouteComplete) => Idle,

            // Default: stay in current state
            _ => self,
        }
    }
}
