//! Exported-symbol registry
//!
//! The registry maps every exported function name found in the source tree
//! to its usage record. It is filled once by the export scan, mutated only by
//! assertion attribution, and read by the report formatter.

use std::collections::HashMap;

/// Usage statistics for a single exported function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageRecord {
    /// Function identifier as declared
    pub name: String,
    /// Number of assertion hits attributed to this function
    pub usage_count: u64,
    /// Number of formal parameters seen at declaration time
    pub param_count: usize,
}

impl UsageRecord {
    pub fn new(name: impl Into<String>, param_count: usize) -> Self {
        Self {
            name: name.into(),
            usage_count: 0,
            param_count,
        }
    }
}

/// Mapping from exported function name to its usage record
#[derive(Debug, Clone, Default)]
pub struct Registry {
    records: HashMap<String, UsageRecord>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the record for `name`
    ///
    /// Re-declaring a name overwrites the previous record, resetting its usage
    /// count to zero. The last declaration seen wins.
    pub fn declare(&mut self, name: &str, param_count: usize) {
        self.records
            .insert(name.to_string(), UsageRecord::new(name, param_count));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.records.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&UsageRecord> {
        self.records.get(name)
    }

    /// Add `amount` hits to a registered function
    ///
    /// Returns `false` (and changes nothing) when `name` is not registered.
    pub fn record_usage(&mut self, name: &str, amount: u64) -> bool {
        match self.records.get_mut(name) {
            Some(record) => {
                record.usage_count = record.usage_count.saturating_add(amount);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sum of all usage counts
    pub fn total_usage(&self) -> u64 {
        self.records
            .values()
            .fold(0u64, |acc, r| acc.saturating_add(r.usage_count))
    }

    /// Records ordered for reporting: usage descending, then name ascending
    pub fn ranked(&self) -> Vec<&UsageRecord> {
        let mut ranked: Vec<&UsageRecord> = self.records.values().collect();
        ranked.sort_by(|a, b| {
            b.usage_count
                .cmp(&a.usage_count)
                .then_with(|| a.name.cmp(&b.name))
        });
        ranked
    }
}
