//! Async tasks

mod dispatch;

pub use dispatch::dispatch_task;
