use std::cell::Cell;
use std::rc::Rc;

use crate::models::Tick;

/// Supplies the current simulation tick.
pub trait TickSource {
    fn current_tick(&self) -> Tick;
}

/// Placeholder clock for callers without a simulation engine; always tick 0.
#[derive(Clone, Copy, Debug, Default)]
pub struct StubClock;

impl TickSource for StubClock {
    fn current_tick(&self) -> Tick {
        0
    }
}

/// Manually advanced clock. Clones share the same tick, so a driver can keep
/// one handle while the registry holds another.
#[derive(Clone, Debug, Default)]
pub struct SimulationClock {
    tick: Rc<Cell<Tick>>,
}

impl SimulationClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, ticks: Tick) -> Tick {
        let next = self.tick.get() + ticks;
        self.tick.set(next);
        next
    }

    pub fn set(&self, tick: Tick) {
        self.tick.set(tick);
    }
}

impl TickSource for SimulationClock {
    fn current_tick(&self) -> Tick {
        self.tick.get()
    }
}
