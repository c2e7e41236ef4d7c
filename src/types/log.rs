use crate::parser::FormatRegistry;
use crate::types::{ParseStats, Record};
use crate::vehicle::VehicleType;

/// On-disk encoding of a DataFlash log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogEncoding {
    Binary,
    Text,
}

impl LogEncoding {
    pub fn as_str(self) -> &'static str {
        match self {
            LogEncoding::Binary => "binary",
            LogEncoding::Text => "text",
        }
    }
}

/// A fully collected DataFlash log
#[derive(Debug)]
pub struct DataFlashLog {
    pub encoding: LogEncoding,
    pub records: Vec<Record>,
    pub registry: FormatRegistry,
    pub stats: ParseStats,
}

impl DataFlashLog {
    pub fn vehicle(&self) -> Option<VehicleType> {
        self.registry.vehicle()
    }

    /// Records of one message type, in log order
    pub fn records_named<'l>(&'l self, name: &'l str) -> impl Iterator<Item = &'l Record> + 'l {
        self.records.iter().filter(move |r| r.name() == name)
    }

    /// Names of every message type that produced at least one record
    pub fn message_types(&self) -> Vec<&str> {
        self.stats.per_type.keys().map(String::as_str).collect()
    }

    /// First GPS-derived absolute time in the log, microseconds since 1970
    pub fn first_gps_time_us(&self) -> Option<u64> {
        self.records.iter().find_map(Record::gps_time_us)
    }
}
