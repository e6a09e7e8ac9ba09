use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Status codes reported by build-phase operations. `Success` is what an `Ok` maps to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResultCode {
    Success,
    BadAllocation,
    OutOfBounds,
    InvalidInput,
    BadOperation,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("bad allocation: requested {requested} bytes, {available} available")]
    BadAllocation { requested: usize, available: usize },

    #[error("out of bounds: {len} bytes at offset {offset} in a region of {size} bytes")]
    OutOfBounds { offset: usize, len: usize, size: usize },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("bad operation: {0}")]
    BadOperation(String),
}

impl Error {
    /// A tag that decodes to a kind this crate has no implementation for.
    pub fn unsupported(kind: impl std::fmt::Debug) -> Self {
        Error::BadOperation(format!("unsupported kind {:?}", kind))
    }

    pub fn code(&self) -> ResultCode {
        match self {
            Error::BadAllocation { .. } => ResultCode::BadAllocation,
            Error::OutOfBounds { .. } => ResultCode::OutOfBounds,
            Error::InvalidInput(_) => ResultCode::InvalidInput,
            Error::BadOperation(_) => ResultCode::BadOperation,
        }
    }
}

impl ResultCode {
    pub fn of<T>(res: &Result<T>) -> Self {
        match res {
            Ok(_) => ResultCode::Success,
            Err(e) => e.code(),
        }
    }
}
