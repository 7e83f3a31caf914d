//! Backend implementations.

#[cfg(any(test, feature = "mock"))]
pub mod mock;

#[cfg(feature = "aws")]
pub mod aws;
