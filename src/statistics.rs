//! Aggregate report snapshots for the index and the registry.

use std::fmt;

use serde::Serialize;

use crate::models::{ParcelStatus, Tick};
use crate::registry::ParcelRecord;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SystemStats {
    pub total_sorted: u64,
    pub total_dispatched: u64,
    pub failed_operations: u64,
    pub recovery_attempts: u64,
    pub height: usize,
    pub city_count: usize,
}

impl fmt::Display for SystemStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "===+ System Statistics +===")?;
        writeln!(f, "Total Parcels Sorted: {}", self.total_sorted)?;
        writeln!(f, "Total Parcels Dispatched: {}", self.total_dispatched)?;
        writeln!(f, "Failed Operations: {}", self.failed_operations)?;
        writeln!(f, "Recovery Attempts: {}", self.recovery_attempts)?;
        writeln!(f, "BST Height: {}", self.height)?;
        writeln!(f, "Total Cities: {}", self.city_count)?;
        writeln!(f, "===+ End Statistics +===")
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RegistryStatistics {
    pub total_parcels: usize,
    pub capacity: usize,
    pub load_factor: f64,
    /// Indexed by status declaration order.
    pub status_counts: [usize; 4],
    pub parcels_in_system: usize,
    pub total_returns: u64,
    pub max_returns: u32,
    pub most_returned_parcel: Option<String>,
    pub returned_more_than_once: usize,
    pub processed_parcels: usize,
    pub average_latency: Option<f64>,
    pub max_latency: Tick,
    pub longest_delay_parcel: Option<String>,
}

impl RegistryStatistics {
    /// Single pass over `records` in table scan order. Ties on the maximum
    /// return count or latency keep the first record seen.
    pub(crate) fn collect<'a, I>(records: I, capacity: usize) -> Self
    where
        I: IntoIterator<Item = &'a ParcelRecord>,
    {
        let mut stats = RegistryStatistics {
            capacity,
            ..Default::default()
        };
        let mut total_latency: i128 = 0;

        for record in records {
            stats.total_parcels += 1;
            stats.status_counts[record.status.ordinal()] += 1;

            stats.total_returns += u64::from(record.return_count);
            if record.return_count > stats.max_returns {
                stats.max_returns = record.return_count;
                stats.most_returned_parcel = Some(record.parcel_id.clone());
            }
            if record.return_count > 1 {
                stats.returned_more_than_once += 1;
            }

            if let Some(latency) = record.dispatch_latency() {
                total_latency += i128::from(latency);
                stats.processed_parcels += 1;
                if latency > stats.max_latency {
                    stats.max_latency = latency;
                    stats.longest_delay_parcel = Some(record.parcel_id.clone());
                }
            }
        }

        stats.parcels_in_system = stats.count_for(ParcelStatus::InQueue) + stats.count_for(ParcelStatus::Sorted);
        if capacity > 0 {
            stats.load_factor = stats.total_parcels as f64 / capacity as f64;
        }
        if stats.processed_parcels > 0 {
            stats.average_latency = Some(total_latency as f64 / stats.processed_parcels as f64);
        }
        stats
    }

    pub fn count_for(&self, status: ParcelStatus) -> usize {
        self.status_counts[status.ordinal()]
    }
}

impl fmt::Display for RegistryStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "===+ ParcelTracker Statistics +===")?;
        writeln!(f, "Total Parcels: {}", self.total_parcels)?;
        writeln!(f, "Table Capacity: {}", self.capacity)?;
        writeln!(f, "Load Factor: {:.2}", self.load_factor)?;

        writeln!(f, "\nStatus Breakdown:")?;
        for status in ParcelStatus::ALL {
            writeln!(f, "  {}: {}", status, self.count_for(status))?;
        }
        writeln!(f, "\nParcels Still in System: {}", self.parcels_in_system)?;

        writeln!(f, "\nReturn Statistics:")?;
        writeln!(f, "  Total Returns: {}", self.total_returns)?;
        writeln!(
            f,
            "  Most Returns: {} (Parcel {})",
            self.max_returns,
            self.most_returned_parcel.as_deref().unwrap_or("None")
        )?;
        writeln!(f, "  Parcels Returned More Than Once: {}", self.returned_more_than_once)?;

        writeln!(f, "\nTiming Statistics:")?;
        match self.average_latency {
            Some(average) => {
                writeln!(f, "  Average Processing Time: {:.2} ticks", average)?;
                writeln!(
                    f,
                    "  Longest Delay: {} ticks (Parcel {})",
                    self.max_latency,
                    self.longest_delay_parcel.as_deref().unwrap_or("None")
                )?;
            }
            None => writeln!(f, "  No parcels have been processed yet")?,
        }
        writeln!(f, "===+ End Statistics +===")
    }
}
