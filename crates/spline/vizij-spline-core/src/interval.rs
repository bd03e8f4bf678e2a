//! Time intervals with per-end closedness.

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeInterval {
    pub min: f64,
    pub max: f64,
    #[serde(default = "closed")]
    pub min_closed: bool,
    #[serde(default = "closed")]
    pub max_closed: bool,
}

fn closed() -> bool {
    true
}

impl TimeInterval {
    /// Closed interval `[min, max]`.
    pub fn new(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            min_closed: true,
            max_closed: true,
        }
    }

    /// The whole time line.
    pub fn everything() -> Self {
        Self {
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
            min_closed: false,
            max_closed: false,
        }
    }

    pub fn with_closed(mut self, min_closed: bool, max_closed: bool) -> Self {
        self.min_closed = min_closed;
        self.max_closed = max_closed;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.min > self.max || (self.min == self.max && !(self.min_closed && self.max_closed))
    }

    pub fn contains(&self, time: f64) -> bool {
        let above = if self.min_closed {
            time >= self.min
        } else {
            time > self.min
        };
        let below = if self.max_closed {
            time <= self.max
        } else {
            time < self.max
        };
        above && below
    }

    /// Smallest interval covering both.
    pub fn union(&self, other: &TimeInterval) -> TimeInterval {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let (min, min_closed) = if self.min < other.min {
            (self.min, self.min_closed)
        } else if other.min < self.min {
            (other.min, other.min_closed)
        } else {
            (self.min, self.min_closed || other.min_closed)
        };
        let (max, max_closed) = if self.max > other.max {
            (self.max, self.max_closed)
        } else if other.max > self.max {
            (other.max, other.max_closed)
        } else {
            (self.max, self.max_closed || other.max_closed)
        };
        TimeInterval {
            min,
            max,
            min_closed,
            max_closed,
        }
    }

    /// Push the lower bound out to negative infinity.
    pub fn extend_to_negative_infinity(&mut self) {
        self.min = f64::NEG_INFINITY;
        self.min_closed = false;
    }

    pub fn extend_to_positive_infinity(&mut self) {
        self.max = f64::INFINITY;
        self.max_closed = false;
    }
}
