use thiserror::Error;

/// Returned by checked value access when the requested key is not in the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("key not found")]
pub struct KeyError;
