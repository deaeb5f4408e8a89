//! Error types for the builder.

use thiserror::Error;

/// Main error type for build and validation operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A tree was requested over zero primitives
    #[error("cannot build a radix tree over zero primitives")]
    EmptyInput,

    /// Flattened index array length is not a multiple of the primitive stride
    #[error("index array of length {len} is not a multiple of stride {stride}")]
    IndexStride { len: usize, stride: usize },

    /// A parent chain was longer than the supported maximum depth
    #[error("parent chain from node {node} exceeded the maximum depth of {depth}")]
    DepthExceeded { node: usize, depth: usize },

    /// A structural invariant failed during validation
    #[error("tree invariant violated: {0}")]
    Invariant(String),
}

impl Error {
    /// Create an invariant-violation error.
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::Invariant(msg.into())
    }
}

/// Result type alias for build operations.
pub type Result<T> = std::result::Result<T, Error>;

#[test]
fn error_display() {
    let e = Error::IndexStride { len: 7, stride: 3 };
    assert!(e.to_string().contains("7"));
    assert!(e.to_string().contains("3"));

    let e = Error::invariant("node 4: bad parent");
    assert!(e.to_string().contains("node 4"));
}
