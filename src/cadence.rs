// Counter for "every N events" log lines
//
// Fires when the count reaches N, then wraps to zero, so the first line comes
// after N quiet events and later ones every N + 1. No arithmetic overflows,
// whatever N is.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    every: u32,
    count: u32,
}

impl Cadence {
    pub fn new(every: u32) -> Self {
        Self { every, count: 0 }
    }

    /// Record one event; true if this one should be logged
    pub fn tick(&mut self) -> bool {
        let fire = self.count >= self.every;
        self.count = if fire { 0 } else { self.count + 1 };
        fire
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}
