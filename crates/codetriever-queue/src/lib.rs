//! The bounded queue and self-terminating worker primitives (§4.1, §4.2).
//!
//! These two types are the only synchronization primitive this workspace's
//! pipeline kernel uses across worker threads: no channel shares state
//! directly, every hop is a [`BoundedQueue`] put/get, and every long-lived
//! consumer is a [`SelfTerminatingWorker`] that exits when idle and is
//! resurrected by the queue's wake hook on the next `put`.

pub mod bounded;
pub mod error;
pub mod worker;

pub use bounded::BoundedQueue;
pub use error::QueueError;
pub use worker::{SelfTerminatingWorker, WorkerActivity};
