//! Task lifetime helpers.
//!
//! Long-lived background tasks are bound to their owner through a
//! [`Shutdown`] future: the owner keeps the [`Signal`] half and fires it (or
//! drops it) to stop the task, then awaits the task's join handle.

#![warn(missing_docs, unreachable_pub)]

pub mod shutdown;

pub use shutdown::{signal, Shutdown, Signal};
