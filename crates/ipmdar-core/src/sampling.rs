//! Random draws used for simulated response times, training scores and follow-up prompts.

use rand::Rng;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Source of uniform random values. Production uses the thread RNG; tests script the values.
pub trait Sampler: Send + Sync {
    /// Uniform draw from `[low, high]`.
    fn uniform(&self, low: f64, high: f64) -> f64;

    /// Uniform index in `0..len`. `len` must be non-zero.
    fn index(&self, len: usize) -> usize;
}

/// `rand::thread_rng` backed sampler.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngSampler;

impl Sampler for ThreadRngSampler {
    fn uniform(&self, low: f64, high: f64) -> f64 {
        rand::thread_rng().gen_range(low..=high)
    }

    fn index(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}

/// Replays a fixed sequence of values.
///
/// `uniform` returns the next scripted value as-is (no range mapping); `index` uses the next
/// value truncated and wrapped into `0..len`. Once exhausted, the last value repeats, or
/// `low` / `0` when nothing was scripted.
#[derive(Debug, Default)]
pub struct ScriptedSampler {
    values: Mutex<VecDeque<f64>>,
    last: Mutex<Option<f64>>,
}

impl ScriptedSampler {
    pub fn new(values: impl IntoIterator<Item = f64>) -> Self {
        Self {
            values: Mutex::new(values.into_iter().collect()),
            last: Mutex::new(None),
        }
    }

    /// Sampler that always yields `value`.
    pub fn constant(value: f64) -> Self {
        Self::new([value])
    }

    fn next(&self) -> Option<f64> {
        let popped = self
            .values
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(v) = popped {
            *last = Some(v);
        }
        *last
    }
}

impl Sampler for ScriptedSampler {
    fn uniform(&self, low: f64, _high: f64) -> f64 {
        self.next().unwrap_or(low)
    }

    fn index(&self, len: usize) -> usize {
        match self.next() {
            Some(v) if len > 0 => (v.max(0.0) as usize) % len,
            _ => 0,
        }
    }
}
