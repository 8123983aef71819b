//! Statistic domain types

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One measured aspect of a finished job's execution
///
/// The monitor treats statistics as opaque values; only equality and hashing
/// matter to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Statistic {
    pub name: String,
    pub value: i64,
    pub unit: Option<String>,
}

impl Statistic {
    pub fn new(name: impl Into<String>, value: i64) -> Self {
        Self {
            name: name.into(),
            value,
            unit: None,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }
}

/// All statistics computed for one job
pub type StatisticSet = HashSet<Statistic>;
