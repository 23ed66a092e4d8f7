//! Machine metrics

use std::{
    cmp::max,
    time::{Duration, Instant},
};

/// Record some metrics as we execute code
#[derive(Default, Debug, Clone)]
pub struct Metrics {
    allocs: u64,
    collections: u64,
    freed: u64,
    max_stack: usize,
}

impl Metrics {
    pub fn alloc(&mut self, count: usize) {
        self.allocs += count as u64;
    }

    pub fn allocs(&self) -> u64 {
        self.allocs
    }

    pub fn collection(&mut self, freed: usize) {
        self.collections += 1;
        self.freed += freed as u64;
    }

    pub fn collections(&self) -> u64 {
        self.collections
    }

    pub fn freed(&self) -> u64 {
        self.freed
    }

    pub fn stack(&mut self, size: usize) {
        self.max_stack = max(self.max_stack, size);
    }

    pub fn max_stack(&self) -> usize {
        self.max_stack
    }
}

/// What the (single) thread is currently doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadOccupation {
    Mutator = 0,
    CollectorMark = 1,
    CollectorSweep = 2,
}

impl ThreadOccupation {
    pub fn name(&self) -> &'static str {
        match self {
            ThreadOccupation::Mutator => "mutator",
            ThreadOccupation::CollectorMark => "gc-mark",
            ThreadOccupation::CollectorSweep => "gc-sweep",
        }
    }
}

/// Accumulates time spent in each occupation
#[derive(Default, Debug, Clone)]
pub struct Clock {
    running: Option<(ThreadOccupation, Instant)>,
    totals: [Duration; 3],
}

impl Clock {
    /// Stop timing the current occupation and start timing `occupation`
    pub fn switch(&mut self, occupation: ThreadOccupation) {
        self.stop();
        self.running = Some((occupation, Instant::now()));
    }

    /// Stop timing altogether
    pub fn stop(&mut self) {
        if let Some((occupation, start)) = self.running.take() {
            self.totals[occupation as usize] += start.elapsed();
        }
    }

    /// Total recorded time for `occupation`
    pub fn elapsed(&self, occupation: ThreadOccupation) -> Duration {
        self.totals[occupation as usize]
    }

    /// Recorded times for all occupations
    pub fn report(&self) -> Vec<(&'static str, Duration)> {
        [
            ThreadOccupation::Mutator,
            ThreadOccupation::CollectorMark,
            ThreadOccupation::CollectorSweep,
        ]
        .iter()
        .map(|o| (o.name(), self.elapsed(*o)))
        .collect()
    }
}
