//! Destination routing index.
//!
//! An unbalanced binary search tree keyed on destination city (compared
//! case-insensitively), each node owning the FIFO of parcels bound for that
//! city. Nodes live in an arena and link to their children by index.
//!
//! Public operations never return errors. Invalid input is counted, logged and
//! followed by a recovery pass that re-checks the counter invariants; the
//! caller gets a neutral value (`false`, `0`, `None`). Recovery only observes,
//! it does not repair state.

use std::cell::Cell;
use std::cmp::Ordering;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::buffer::ArrivalBuffer;
use crate::config::IndexSettings;
use crate::error::IndexError;
use crate::models::Parcel;
use crate::statistics::SystemStats;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct IndexCounters {
    pub total_sorted: u64,
    pub total_dispatched: u64,
    pub failed_operations: u64,
    pub recovery_attempts: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CitySummary {
    pub city: String,
    pub parcel_count: usize,
}

struct CityNode {
    /// Casing of the first parcel that created the node.
    city_name: String,
    parcels: ArrivalBuffer<Parcel>,
    left: Option<usize>,
    right: Option<usize>,
}

/// Case-insensitive lexicographic ordering of city names.
pub fn compare_cities(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

pub struct DestinationIndex {
    nodes: Vec<CityNode>,
    root: Option<usize>,
    queue_capacity: usize,
    counters: Cell<IndexCounters>,
}

impl Default for DestinationIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl DestinationIndex {
    pub fn new() -> Self {
        Self::with_queue_capacity(usize::MAX)
    }

    /// Every city queue created by this index is bounded by `queue_capacity`.
    pub fn with_queue_capacity(queue_capacity: usize) -> Self {
        Self {
            nodes: Vec::new(),
            root: None,
            queue_capacity,
            counters: Cell::new(IndexCounters::default()),
        }
    }

    pub fn with_settings(settings: &IndexSettings) -> Self {
        Self::with_queue_capacity(settings.queue_capacity())
    }

    /// Routes `parcel` into its city's queue, creating the city node on first
    /// sight. Returns whether the parcel was accepted.
    pub fn insert(&mut self, parcel: Parcel) -> bool {
        match self.try_insert(parcel) {
            Ok(()) => true,
            Err(err) => {
                self.fail("insert", err);
                false
            }
        }
    }

    fn try_insert(&mut self, parcel: Parcel) -> Result<(), IndexError> {
        if is_blank(parcel.destination_city()) {
            return Err(IndexError::InvalidCity);
        }
        if is_blank(parcel.id()) {
            return Err(IndexError::InvalidParcelId);
        }
        self.check_consistency()?;

        let parcel_id = parcel.id().to_string();
        let priority = parcel.priority();
        let slot = match self.locate(parcel.destination_city()) {
            Ok(slot) => slot,
            Err(parent) => self.attach(parent, parcel.destination_city()),
        };

        let node = &mut self.nodes[slot];
        node.parcels.enqueue(parcel).map_err(|source| IndexError::Overflow {
            city: node.city_name.clone(),
            source,
        })?;

        info!(parcel_id = %parcel_id, city = %node.city_name, priority, "Parcel sorted");
        self.bump(|c| c.total_sorted += 1);
        Ok(())
    }

    /// `Ok(slot)` for the node matching `city`, or `Err` with the parent the
    /// missing node would hang from and on which side.
    fn locate(&self, city: &str) -> Result<usize, Option<(usize, Ordering)>> {
        let mut cursor = self.root;
        let mut parent = None;
        while let Some(slot) = cursor {
            let node = &self.nodes[slot];
            let ordering = compare_cities(city, &node.city_name);
            cursor = match ordering {
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
                Ordering::Equal => return Ok(slot),
            };
            parent = Some((slot, ordering));
        }
        Err(parent)
    }

    fn attach(&mut self, parent: Option<(usize, Ordering)>, city: &str) -> usize {
        let slot = self.nodes.len();
        self.nodes.push(CityNode {
            city_name: city.to_string(),
            parcels: ArrivalBuffer::new(self.queue_capacity),
            left: None,
            right: None,
        });
        match parent {
            None => self.root = Some(slot),
            Some((parent, Ordering::Less)) => self.nodes[parent].left = Some(slot),
            Some((parent, _)) => self.nodes[parent].right = Some(slot),
        }
        info!(city, "New city node created");
        slot
    }

    fn search(&self, city: &str) -> Option<&CityNode> {
        self.locate(city).ok().map(|slot| &self.nodes[slot])
    }

    /// Live queue for `city`, neither copied nor drained.
    pub fn city_parcels(&self, city: &str) -> Option<&ArrivalBuffer<Parcel>> {
        if is_blank(city) {
            self.fail("city_parcels", IndexError::InvalidCity);
            return None;
        }
        let node = self.search(city)?;
        debug!(city, parcels = node.parcels.size(), "City queue status");
        Some(&node.parcels)
    }

    /// Dispatches the first parcel with `parcel_id` from `city`'s queue,
    /// keeping the remaining parcels in arrival order.
    pub fn remove_parcel(&mut self, city: &str, parcel_id: &str) -> bool {
        self.take_parcel(city, parcel_id).is_some()
    }

    /// As [`remove_parcel`](Self::remove_parcel), handing back the dispatched parcel.
    pub fn take_parcel(&mut self, city: &str, parcel_id: &str) -> Option<Parcel> {
        match self.try_take(city, parcel_id) {
            Ok(taken) => taken,
            Err(err) => {
                self.fail("remove_parcel", err);
                None
            }
        }
    }

    fn try_take(&mut self, city: &str, parcel_id: &str) -> Result<Option<Parcel>, IndexError> {
        if is_blank(city) {
            return Err(IndexError::InvalidCity);
        }
        if is_blank(parcel_id) {
            return Err(IndexError::InvalidParcelId);
        }

        let slot = match self.locate(city) {
            Ok(slot) if !self.nodes[slot].parcels.is_empty() => slot,
            _ => {
                debug!(city, parcel_id, "No queued parcel to dispatch");
                return Ok(None);
            }
        };

        let node = &mut self.nodes[slot];
        let mut held = ArrivalBuffer::unbounded();
        let mut taken = None;
        while let Ok(parcel) = node.parcels.dequeue() {
            if taken.is_none() && parcel.id() == parcel_id {
                taken = Some(parcel);
            } else {
                held.enqueue(parcel).map_err(|source| IndexError::Overflow {
                    city: node.city_name.clone(),
                    source,
                })?;
            }
        }
        while let Ok(parcel) = held.dequeue() {
            node.parcels.enqueue(parcel).map_err(|source| IndexError::Overflow {
                city: node.city_name.clone(),
                source,
            })?;
        }

        if taken.is_some() {
            self.bump(|c| c.total_dispatched += 1);
            info!(parcel_id, city, "Parcel dispatched");
        }
        Ok(taken)
    }

    /// Cities in ascending order with their queue lengths.
    pub fn in_order_traversal(&self) -> Vec<CitySummary> {
        debug!("===+ Current BST Status +===");
        let mut visited = Vec::with_capacity(self.nodes.len());
        let mut stack = Vec::new();
        let mut cursor = self.root;
        loop {
            while let Some(slot) = cursor {
                stack.push(slot);
                cursor = self.nodes[slot].left;
            }
            let Some(slot) = stack.pop() else { break };
            let node = &self.nodes[slot];
            debug!(city = %node.city_name, parcels = node.parcels.size(), "City queue");
            visited.push(CitySummary {
                city: node.city_name.clone(),
                parcel_count: node.parcels.size(),
            });
            cursor = node.right;
        }
        debug!("===+ End BST Status +===");
        visited
    }

    pub fn count_city_parcels(&self, city: &str) -> usize {
        if is_blank(city) {
            self.fail("count_city_parcels", IndexError::InvalidCity);
            return 0;
        }
        let count = self.search(city).map_or(0, |node| node.parcels.size());
        debug!(city, count, "City parcel count");
        count
    }

    /// Nodes on the longest root-to-leaf path; 0 for an empty tree.
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut stack: Vec<(usize, usize)> = self.root.map(|slot| (slot, 1)).into_iter().collect();
        while let Some((slot, depth)) = stack.pop() {
            height = height.max(depth);
            let node = &self.nodes[slot];
            stack.extend(node.left.map(|child| (child, depth + 1)));
            stack.extend(node.right.map(|child| (child, depth + 1)));
        }
        debug!(height, "BST height");
        height
    }

    pub fn city_count(&self) -> usize {
        debug!(cities = self.nodes.len(), "Total cities in BST");
        self.nodes.len()
    }

    /// City with the strictly largest queue. On ties the first node met in
    /// pre-order (root, left, right) wins. `None` when every queue is empty.
    pub fn busiest_city(&self) -> Option<&str> {
        let mut busiest: Option<&CityNode> = None;
        let mut max_count = 0;
        let mut stack: Vec<usize> = self.root.into_iter().collect();
        while let Some(slot) = stack.pop() {
            let node = &self.nodes[slot];
            if node.parcels.size() > max_count {
                max_count = node.parcels.size();
                busiest = Some(node);
            }
            stack.extend(node.right);
            stack.extend(node.left);
        }

        let node = busiest?;
        debug!(city = %node.city_name, parcels = max_count, "Busiest city");
        Some(node.city_name.as_str())
    }

    pub fn counters(&self) -> IndexCounters {
        self.counters.get()
    }

    pub fn system_stats(&self) -> SystemStats {
        let counters = self.counters();
        SystemStats {
            total_sorted: counters.total_sorted,
            total_dispatched: counters.total_dispatched,
            failed_operations: counters.failed_operations,
            recovery_attempts: counters.recovery_attempts,
            height: self.height(),
            city_count: self.city_count(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Counter invariants: nothing dispatched that was never sorted, and a
    /// non-zero sorted count implies a non-empty tree.
    pub fn check_consistency(&self) -> Result<(), IndexError> {
        let counters = self.counters();
        if self.root.is_none() && counters.total_sorted > 0 {
            return Err(IndexError::StateInconsistency(
                "parcels exist but BST is empty".to_string(),
            ));
        }
        if counters.total_dispatched > counters.total_sorted {
            return Err(IndexError::StateInconsistency(
                "more parcels dispatched than sorted".to_string(),
            ));
        }
        Ok(())
    }

    fn bump(&self, update: impl FnOnce(&mut IndexCounters)) {
        let mut counters = self.counters.get();
        update(&mut counters);
        self.counters.set(counters);
    }

    fn fail(&self, operation: &str, err: IndexError) {
        self.bump(|c| c.failed_operations += 1);
        error!(operation, error = %err, "Destination index operation failed");
        self.recover(&err);
    }

    fn recover(&self, cause: &IndexError) {
        self.bump(|c| c.recovery_attempts += 1);
        let attempt = self.counters().recovery_attempts;
        warn!(attempt, cause = %cause, "Recovery attempt");
        if let Err(err) = self.check_consistency() {
            error!(error = %err, "Recovery failed");
        }
    }
}
