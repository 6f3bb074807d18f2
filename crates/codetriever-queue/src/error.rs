//! Errors raised by [`crate::BoundedQueue`].

use codetriever_common::kind::{ErrorKind, HasErrorKind};
use thiserror::Error;

/// Failure modes for queue operations.
///
/// The variants carry the items that could not be placed/were never
/// available, so a caller can recover them instead of losing work.
#[derive(Debug, Error)]
pub enum QueueError<T> {
    /// `put_nowait`/`put_many` found no room and all retries were
    /// exhausted. Carries the items that were never enqueued.
    #[error("queue is full, {} item(s) not enqueued", .0.len())]
    Full(Vec<T>),

    /// `get_nowait` found nothing to return.
    #[error("queue is empty")]
    Empty,

    /// The queue has been closed and no further operations are possible.
    #[error("queue is closed")]
    Closed,
}

impl<T> HasErrorKind for QueueError<T> {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Full(_) => ErrorKind::Dependency,
            Self::Empty | Self::Closed => ErrorKind::Internal,
        }
    }
}
