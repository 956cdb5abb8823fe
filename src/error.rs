use thiserror::Error;

/// Errors returned by fallible heap operations
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum HeapError {
    /// The heap holds no elements
    #[error("heap is empty")]
    EmptyHeap,

    /// The proposed key is greater than the node's current key
    #[error("new key is greater than the current key")]
    InvalidDecrease,

    /// The handle refers to a removed node or to another heap
    #[error("handle does not refer to a live node of this heap")]
    InvalidHandle,
}

/// Result alias for heap operations
pub type Result<T> = std::result::Result<T, HeapError>;
