//! Parcel identity registry.
//!
//! Open-chaining hash table keyed on parcel ID. Records live in an arena and
//! bucket chains link them by index, so growing the table only rewrites the
//! links; records are never reallocated or copied.

use config::ConfigError;
use tracing::{debug, error, info};

use crate::clock::{StubClock, TickSource};
use crate::config::{RegistrySettings, DEFAULT_INITIAL_CAPACITY, DEFAULT_LOAD_FACTOR_THRESHOLD};
use crate::error::RegistryError;
use crate::models::{ParcelSize, ParcelStatus, Tick};
use crate::statistics::RegistryStatistics;

#[derive(Clone, Debug)]
pub struct ParcelRecord {
    pub parcel_id: String,
    pub status: ParcelStatus,
    pub arrival_tick: Tick,
    /// `None` until the parcel is first dispatched.
    pub dispatch_tick: Option<Tick>,
    pub return_count: u32,
    pub destination_city: String,
    pub priority: u8,
    pub size: ParcelSize,
    next: Option<usize>,
}

// Chain links are table layout, not record content.
impl PartialEq for ParcelRecord {
    fn eq(&self, other: &Self) -> bool {
        self.parcel_id == other.parcel_id
            && self.status == other.status
            && self.arrival_tick == other.arrival_tick
            && self.dispatch_tick == other.dispatch_tick
            && self.return_count == other.return_count
            && self.destination_city == other.destination_city
            && self.priority == other.priority
            && self.size == other.size
    }
}

impl ParcelRecord {
    /// Ticks between arrival and dispatch, for parcels currently dispatched.
    pub fn dispatch_latency(&self) -> Option<Tick> {
        match (self.status, self.dispatch_tick) {
            (ParcelStatus::Dispatched, Some(dispatched)) => Some(dispatched - self.arrival_tick),
            _ => None,
        }
    }
}

/// Polynomial string hash reduced into `capacity` buckets.
pub(crate) fn bucket_index(parcel_id: &str, capacity: usize) -> usize {
    parcel_id
        .encode_utf16()
        .fold(0usize, |hash, unit| (hash * 31 + usize::from(unit)) % capacity)
}

pub struct ParcelRegistry<C = StubClock> {
    records: Vec<ParcelRecord>,
    buckets: Vec<Option<usize>>,
    load_factor_threshold: f64,
    clock: C,
}

impl ParcelRegistry<StubClock> {
    pub fn new() -> Self {
        Self::with_clock(StubClock)
    }

    pub fn with_settings(settings: &RegistrySettings) -> Result<Self, ConfigError> {
        Self::with_settings_and_clock(settings, StubClock)
    }
}

impl Default for ParcelRegistry<StubClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: TickSource> ParcelRegistry<C> {
    pub fn with_clock(clock: C) -> Self {
        Self::build(DEFAULT_INITIAL_CAPACITY, DEFAULT_LOAD_FACTOR_THRESHOLD, clock)
    }

    /// Rejects settings `RegistrySettings::validate` rejects; a threshold
    /// outside (0, 1] would grow the table on every insert.
    pub fn with_settings_and_clock(settings: &RegistrySettings, clock: C) -> Result<Self, ConfigError> {
        settings.validate()?;
        Ok(Self::build(settings.initial_capacity, settings.load_factor_threshold, clock))
    }

    fn build(capacity: usize, load_factor_threshold: f64, clock: C) -> Self {
        info!(capacity, "ParcelRegistry created");
        Self {
            records: Vec::new(),
            buckets: vec![None; capacity],
            load_factor_threshold,
            clock,
        }
    }

    pub fn insert(
        &mut self,
        parcel_id: &str,
        status: ParcelStatus,
        arrival_tick: Tick,
        destination_city: &str,
        priority: u8,
        size: ParcelSize,
    ) -> Result<(), RegistryError> {
        self.try_insert(parcel_id, status, arrival_tick, destination_city, priority, size)
            .map_err(|e| report_failure("insert", parcel_id, e))
    }

    /// Like [`insert`](Self::insert), for callers holding an unparsed size label.
    pub fn insert_raw(
        &mut self,
        parcel_id: &str,
        status: ParcelStatus,
        arrival_tick: Tick,
        destination_city: &str,
        priority: u8,
        size: &str,
    ) -> Result<(), RegistryError> {
        let size = size
            .parse::<ParcelSize>()
            .map_err(|e| report_failure("insert", parcel_id, e))?;
        self.insert(parcel_id, status, arrival_tick, destination_city, priority, size)
    }

    fn try_insert(
        &mut self,
        parcel_id: &str,
        status: ParcelStatus,
        arrival_tick: Tick,
        destination_city: &str,
        priority: u8,
        size: ParcelSize,
    ) -> Result<(), RegistryError> {
        if parcel_id.trim().is_empty() {
            return Err(RegistryError::InvalidParcelId);
        }
        if destination_city.trim().is_empty() {
            return Err(RegistryError::InvalidCity);
        }
        if !(1..=3).contains(&priority) {
            return Err(RegistryError::InvalidPriority(priority));
        }
        if self.exists(parcel_id) {
            return Err(RegistryError::DuplicateParcel(parcel_id.to_string()));
        }

        if self.load_factor() >= self.load_factor_threshold {
            self.resize();
        }

        let bucket = bucket_index(parcel_id, self.capacity());
        let slot = self.records.len();
        self.records.push(ParcelRecord {
            parcel_id: parcel_id.to_string(),
            status,
            arrival_tick,
            dispatch_tick: None,
            return_count: 0,
            destination_city: destination_city.to_string(),
            priority,
            size,
            next: self.buckets[bucket],
        });
        self.buckets[bucket] = Some(slot);

        info!(parcel_id, %status, bucket, "Parcel tracked");
        Ok(())
    }

    /// Moves a parcel to `new_status` and returns the previous status.
    /// Entering `Dispatched` stamps the dispatch tick from the clock.
    pub fn update_status(&mut self, parcel_id: &str, new_status: ParcelStatus) -> Result<ParcelStatus, RegistryError> {
        let slot = self
            .find(parcel_id)
            .ok_or_else(|| report_failure("update_status", parcel_id, RegistryError::NotFound(parcel_id.to_string())))?;

        let now = (new_status == ParcelStatus::Dispatched).then(|| self.clock.current_tick());
        let record = &mut self.records[slot];
        let old_status = record.status;
        record.status = new_status;
        if let Some(tick) = now {
            record.dispatch_tick = Some(tick);
        }

        info!(parcel_id, from = %old_status, to = %new_status, "Parcel status updated");
        Ok(old_status)
    }

    pub fn get(&self, parcel_id: &str) -> Result<&ParcelRecord, RegistryError> {
        match self.find(parcel_id) {
            Some(slot) => Ok(&self.records[slot]),
            None => Err(report_failure("get", parcel_id, RegistryError::NotFound(parcel_id.to_string()))),
        }
    }

    /// Records one more return for the parcel and yields the new count.
    pub fn increment_return_count(&mut self, parcel_id: &str) -> Result<u32, RegistryError> {
        let slot = self.find(parcel_id).ok_or_else(|| {
            report_failure("increment_return_count", parcel_id, RegistryError::NotFound(parcel_id.to_string()))
        })?;

        let record = &mut self.records[slot];
        record.return_count += 1;
        info!(parcel_id, return_count = record.return_count, "Parcel returned");
        Ok(record.return_count)
    }

    pub fn exists(&self, parcel_id: &str) -> bool {
        self.find(parcel_id).is_some()
    }

    fn find(&self, parcel_id: &str) -> Option<usize> {
        let mut cursor = self.buckets[bucket_index(parcel_id, self.capacity())];
        while let Some(slot) = cursor {
            let record = &self.records[slot];
            if record.parcel_id == parcel_id {
                return Some(slot);
            }
            cursor = record.next;
        }
        None
    }

    fn resize(&mut self) {
        let capacity = self.capacity() * 2;
        let mut buckets = vec![None; capacity];

        for (slot, record) in self.records.iter_mut().enumerate() {
            let bucket = bucket_index(&record.parcel_id, capacity);
            record.next = buckets[bucket];
            buckets[bucket] = Some(slot);
        }
        self.buckets = buckets;

        info!(capacity, parcels = self.records.len(), "ParcelRegistry resized");
    }

    /// Records in table order: bucket by bucket, each chain head first.
    pub fn iter(&self) -> impl Iterator<Item = &ParcelRecord> + '_ {
        self.buckets.iter().flat_map(move |head| {
            std::iter::successors(head.map(|slot| &self.records[slot]), move |record| {
                record.next.map(|slot| &self.records[slot])
            })
        })
    }

    pub fn statistics(&self) -> RegistryStatistics {
        let stats = RegistryStatistics::collect(self.iter(), self.capacity());
        debug!(parcels = stats.total_parcels, capacity = stats.capacity, "Registry statistics collected");
        stats
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    pub fn load_factor(&self) -> f64 {
        self.records.len() as f64 / self.capacity() as f64
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}

fn report_failure(operation: &str, parcel_id: &str, err: RegistryError) -> RegistryError {
    error!(operation, parcel_id, error = %err, "Registry operation failed");
    err
}
