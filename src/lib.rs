//! ParcelSort - routing index and lifecycle registry for a parcel-sorting simulator

pub mod buffer;
pub mod clock;
pub mod config;
pub mod destination;
pub mod error;
pub mod logging;
pub mod models;
pub mod registry;
pub mod statistics;

pub use buffer::ArrivalBuffer;
pub use clock::{SimulationClock, StubClock, TickSource};
pub use config::Settings;
pub use destination::DestinationIndex;
pub use error::{BufferError, IndexError, RegistryError};
pub use models::{Parcel, ParcelSize, ParcelStatus, Tick};
pub use registry::{ParcelRecord, ParcelRegistry};
pub use statistics::{RegistryStatistics, SystemStats};
