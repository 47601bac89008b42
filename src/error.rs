use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    #[error("Arrival buffer full (capacity {capacity})")]
    Full { capacity: usize },
    #[error("Arrival buffer empty")]
    Empty,
}

/// Failures classified inside the destination index. These never leave the
/// public `DestinationIndex` API; they are counted, logged and recovered from.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    #[error("Invalid destination city")]
    InvalidCity,
    #[error("Invalid parcel ID")]
    InvalidParcelId,
    #[error("System state inconsistency: {0}")]
    StateInconsistency(String),
    #[error("Queue overflow for city {city}: {source}")]
    Overflow { city: String, source: BufferError },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Invalid parcel ID")]
    InvalidParcelId,
    #[error("Invalid destination city")]
    InvalidCity,
    #[error("Invalid priority value: {0}")]
    InvalidPriority(u8),
    #[error("Invalid size value: {0}")]
    InvalidSize(String),
    #[error("Parcel already exists: {0}")]
    DuplicateParcel(String),
    #[error("Parcel not found: {0}")]
    NotFound(String),
}
