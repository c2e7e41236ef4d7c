use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::Serialize;

/// Counters for one decoding pass
#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ParseStats {
    /// Lines or frames examined
    pub units_read: u64,
    pub records: u64,
    pub formats_registered: u32,
    pub unknown_format: u32,
    pub malformed: u32,
    pub bad_sync: u32,
    pub bytes_consumed: u64,
    pub per_type: BTreeMap<String, u64>,
}

impl ParseStats {
    pub fn count_record(&mut self, name: &str) {
        self.records += 1;
        *self.per_type.entry(name.to_string()).or_insert(0) += 1;
    }

    /// Total lines or frames that produced no record
    pub fn skipped(&self) -> u64 {
        (self.unknown_format + self.malformed + self.bad_sync) as u64
    }

    pub fn count_for(&self, name: &str) -> u64 {
        self.per_type.get(name).copied().unwrap_or(0)
    }
}
