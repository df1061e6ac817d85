//! The time-ordered queue behind `Context::add_plan`.
//!
//! A plan is a payload with a firing time. The queue hands plans back in
//! increasing time order; plans with equal times come back in the order they
//! were added. Insertion and removal cost *O*(log *n*).

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::log::trace;
use crate::HashMap;

/// Plans keyed by a monotonically increasing counter. The heap holds only
/// `(time, id)` pairs; payloads live in `data_map` until they fire.
pub struct Queue<T> {
    queue: BinaryHeap<Entry>,
    data_map: HashMap<u64, T>,
    plan_counter: u64,
}

impl<T> Queue<T> {
    /// Create a new empty `Queue<T>`
    #[must_use]
    pub fn new() -> Queue<T> {
        Queue {
            queue: BinaryHeap::new(),
            data_map: HashMap::default(),
            plan_counter: 0,
        }
    }

    /// Schedules `data` at `time`.
    pub fn add_plan(&mut self, time: f64, data: T) {
        trace!("adding plan at {time}");
        let id = self.plan_counter;
        self.queue.push(Entry { time, id });
        self.data_map.insert(id, data);
        self.plan_counter += 1;
    }

    /// Removes and returns the earliest plan.
    pub fn get_next_plan(&mut self) -> Option<Plan<T>> {
        let entry = self.queue.pop()?;
        let data = self.data_map.remove(&entry.id)?;
        Some(Plan {
            time: entry.time,
            data,
        })
    }

    /// Drops every pending plan.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.data_map.clear();
    }

    /// Number of plans that have not been executed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data_map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data_map.is_empty()
    }
}

impl<T> Default for Queue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(PartialEq, Debug)]
struct Entry {
    time: f64,
    id: u64,
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Earliest time first, then lowest id. Reversed for the max-heap.
impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        let time_ordering = self.time.partial_cmp(&other.time).unwrap().reverse();
        match time_ordering {
            Ordering::Equal => self.id.cmp(&other.id).reverse(),
            _ => time_ordering,
        }
    }
}

pub struct Plan<T> {
    pub time: f64,
    pub data: T,
}
