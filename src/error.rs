#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RingError {
    /// None of the node's replica slots are present in the ring.
    #[error("Node not found: {0}")]
    NodeNotFound(String),
}

pub type RingResult<T> = Result<T, RingError>;
