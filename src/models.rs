use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

/// Discrete unit of simulated time.
pub type Tick = i64;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Copy, Serialize, Deserialize)]
pub enum ParcelSize {
    Small,
    Medium,
    Large,
}

impl ParcelSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParcelSize::Small => "Small",
            ParcelSize::Medium => "Medium",
            ParcelSize::Large => "Large",
        }
    }
}

impl FromStr for ParcelSize {
    type Err = RegistryError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "Small" => Ok(ParcelSize::Small),
            "Medium" => Ok(ParcelSize::Medium),
            "Large" => Ok(ParcelSize::Large),
            other => Err(RegistryError::InvalidSize(other.to_string())),
        }
    }
}

impl fmt::Display for ParcelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state tracked by the registry. Any state may move to any other.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Copy, Serialize, Deserialize)]
pub enum ParcelStatus {
    InQueue,
    Sorted,
    Dispatched,
    Returned,
}

impl ParcelStatus {
    pub const ALL: [ParcelStatus; 4] = [
        ParcelStatus::InQueue,
        ParcelStatus::Sorted,
        ParcelStatus::Dispatched,
        ParcelStatus::Returned,
    ];

    pub(crate) fn ordinal(self) -> usize {
        match self {
            ParcelStatus::InQueue => 0,
            ParcelStatus::Sorted => 1,
            ParcelStatus::Dispatched => 2,
            ParcelStatus::Returned => 3,
        }
    }
}

impl fmt::Display for ParcelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ParcelStatus::InQueue => "IN_QUEUE",
            ParcelStatus::Sorted => "SORTED",
            ParcelStatus::Dispatched => "DISPATCHED",
            ParcelStatus::Returned => "RETURNED",
        };
        f.write_str(label)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parcel {
    pub id: String,
    pub destination_city: String,
    pub priority: u8,
    pub size: ParcelSize,
    pub arrival_tick: Tick,
}

impl Parcel {
    pub fn new(id: &str, destination_city: &str, priority: u8, size: ParcelSize) -> Self {
        Self {
            id: id.to_string(),
            destination_city: destination_city.to_string(),
            priority,
            size,
            arrival_tick: 0,
        }
    }

    pub fn arriving_at(mut self, tick: Tick) -> Self {
        self.arrival_tick = tick;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn destination_city(&self) -> &str {
        &self.destination_city
    }

    pub fn priority(&self) -> u8 {
        self.priority
    }

    pub fn size(&self) -> ParcelSize {
        self.size
    }

    pub fn arrival_tick(&self) -> Tick {
        self.arrival_tick
    }
}
