//! Shared, externally mutable model parameters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

#[derive(Debug)]
struct ParamCell {
    value: RwLock<f64>,
    version: AtomicU64,
}

/// A scalar parameter shared between the caller and property models.
///
/// Clones refer to the same cell. Every `set` bumps a version counter so that
/// memoizing wrappers can tell when a cached evaluation went stale.
#[derive(Debug, Clone)]
pub struct Param {
    cell: Arc<ParamCell>,
}

impl Param {
    pub fn new(value: f64) -> Self {
        Self {
            cell: Arc::new(ParamCell {
                value: RwLock::new(value),
                version: AtomicU64::new(0),
            }),
        }
    }

    /// Current value.
    pub fn value(&self) -> f64 {
        match self.cell.value.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    /// Replace the value and bump the version.
    pub fn set(&self, value: f64) {
        match self.cell.value.write() {
            Ok(mut guard) => *guard = value,
            Err(poisoned) => *poisoned.into_inner() = value,
        }
        self.cell.version.fetch_add(1, Ordering::AcqRel);
    }

    /// Number of times `set` has been called.
    pub fn version(&self) -> u64 {
        self.cell.version.load(Ordering::Acquire)
    }

    /// Whether two handles share the same cell.
    pub fn ptr_eq(&self, other: &Param) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }
}
