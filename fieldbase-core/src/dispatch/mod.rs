//! Receive-and-relay dispatch
//!
//! One dispatch step handles at most one datagram: receive it, classify it,
//! then route it to the data log, the status panel and, for time requests,
//! a radio reply. Nothing is queued between steps.

pub mod dispatcher;
pub mod machine;

pub use dispatcher::{Dispatcher, ReplyOutcome, StartupReport, StepOutcome};
pub use machine::{DispatchEvent, DispatchState};
