pub type Result<T, E = FurrowError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum FurrowError {
    #[error("{0}")]
    String(String),

    #[error("Not implemented: {0}")]
    Unimplemented(String),

    #[error("Hash table capacity exhausted (capacity: {capacity})")]
    CapacityExhausted { capacity: usize },

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

impl FurrowError {
    pub fn new(msg: impl Into<String>) -> Self {
        FurrowError::String(msg.into())
    }

    pub fn unimplemented(msg: impl Into<String>) -> Self {
        FurrowError::Unimplemented(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        FurrowError::InvariantViolation(msg.into())
    }
}

pub fn err(msg: impl Into<String>) -> FurrowError {
    FurrowError::new(msg)
}

/// Return early with an `Unimplemented` error.
#[macro_export]
macro_rules! not_implemented {
    ($($arg:tt)*) => {
        return Err($crate::FurrowError::Unimplemented(format!($($arg)*)).into())
    };
}
