use crate::conversion::gps_time_to_unix_us;
use crate::error::{DFError, Result};
use crate::types::{FormatDescriptor, TypedValue};
use std::fmt;
use std::sync::Arc;

/// Field names of well-known ArduPilot messages
pub mod fields {
    // timing
    pub const TIME_US: &str = "TimeUS";
    pub const TIME_MS: &str = "TimeMS";

    // GPS
    pub const GPS_STATUS: &str = "Status";
    pub const GPS_WEEK: &str = "GWk";
    pub const GPS_WEEK_LEGACY: &str = "Week";
    pub const GPS_MS: &str = "GMS";
    pub const GPS_ABS_TIME: &str = "GPSTime";
    pub const GPS_SATS: &str = "NSats";
    pub const GPS_HDOP: &str = "HDop";
    pub const LAT: &str = "Lat";
    pub const LNG: &str = "Lng";
    pub const ALT: &str = "Alt";
    pub const GPS_SPEED: &str = "Spd";
    pub const GPS_COURSE: &str = "GCrs";

    // CMD
    pub const CMD_TOTAL: &str = "CTot";
    pub const CMD_NUMBER: &str = "CNum";
    pub const CMD_ID: &str = "CId";
    pub const CMD_PARAMS: [&str; 4] = ["Prm1", "Prm2", "Prm3", "Prm4"];

    // MODE
    pub const MODE: &str = "Mode";
    pub const MODE_NUM: &str = "ModeNum";
    pub const MODE_REASON: &str = "Rsn";

    // PARM
    pub const PARAM_NAME: &str = "Name";
    pub const PARAM_VALUE: &str = "Value";
    pub const PARAM_DEFAULT: &str = "Default";

    // MSG
    pub const MESSAGE: &str = "Message";

    // VER
    pub const BOARD_TYPE: &str = "BT";
    pub const BOARD_SUBTYPE: &str = "BST";
    pub const VERSION_MAJOR: &str = "Maj";
    pub const VERSION_MINOR: &str = "Min";
    pub const VERSION_PATCH: &str = "Pat";
    pub const FIRMWARE_TYPE: &str = "FWT";
    pub const GIT_HASH: &str = "GH";
    pub const FIRMWARE_STRING: &str = "FWS";
    pub const BUILD_TYPE: &str = "BU";

    // ERR / EV
    pub const ERR_SUBSYSTEM: &str = "Subsys";
    pub const ERR_CODE: &str = "ECode";
    pub const EVENT_ID: &str = "Id";
}

/// One decoded log record: a descriptor plus its values in column order
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    format: Arc<FormatDescriptor>,
    values: Vec<TypedValue>,
}

impl Record {
    pub fn new(format: Arc<FormatDescriptor>, values: Vec<TypedValue>) -> Self {
        Self { format, values }
    }

    pub fn name(&self) -> &str {
        &self.format.name
    }

    pub fn format(&self) -> &Arc<FormatDescriptor> {
        &self.format
    }

    pub fn values(&self) -> &[TypedValue] {
        &self.values
    }

    pub fn is_schema_definition(&self) -> bool {
        self.format.is_schema_definition()
    }

    /// (column name, value) pairs in declaration order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &TypedValue)> {
        self.format
            .columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    pub fn get(&self, column: &str) -> Option<&TypedValue> {
        self.format
            .column_position(column)
            .and_then(|i| self.values.get(i))
    }

    pub fn field(&self, column: &str) -> Result<&TypedValue> {
        self.get(column)
            .ok_or_else(|| DFError::MissingField(format!("{}.{}", self.name(), column)))
    }

    pub fn get_i64(&self, column: &str) -> Result<i64> {
        self.field(column)?.as_i64()
    }

    pub fn get_u64(&self, column: &str) -> Result<u64> {
        self.field(column)?.as_u64()
    }

    pub fn get_f64(&self, column: &str) -> Result<f64> {
        self.field(column)?.as_f64()
    }

    pub fn get_str(&self, column: &str) -> Result<&str> {
        self.field(column)?.as_str()
    }

    fn opt_i64(&self, column: &str) -> Option<i64> {
        self.get_i64(column).ok()
    }

    fn opt_u64(&self, column: &str) -> Option<u64> {
        self.get_u64(column).ok()
    }

    fn opt_f64(&self, column: &str) -> Option<f64> {
        self.get_f64(column).ok()
    }

    fn opt_str(&self, column: &str) -> Option<&str> {
        self.get_str(column).ok()
    }

    /// Render as one canonical text-log line: `NAME, v1, v2, ...`
    pub fn to_text_line(&self) -> String {
        let mut line = self.format.name.clone();
        for value in &self.values {
            line.push_str(", ");
            line.push_str(&value.to_string());
        }
        line
    }

    // timing

    pub fn time_us(&self) -> Option<u64> {
        self.opt_u64(fields::TIME_US)
    }

    pub fn time_ms(&self) -> Option<u64> {
        self.opt_u64(fields::TIME_MS)
    }

    /// Boot timestamp in microseconds from `TimeUS`, or `TimeMS` scaled up
    pub fn timestamp_us(&self) -> Option<u64> {
        self.time_us()
            .or_else(|| self.time_ms().map(|ms| ms.saturating_mul(1000)))
    }

    // GPS

    pub fn gps_status(&self) -> Option<i64> {
        self.opt_i64(fields::GPS_STATUS)
    }

    pub fn gps_week(&self) -> Option<u64> {
        self.opt_u64(fields::GPS_WEEK)
            .or_else(|| self.opt_u64(fields::GPS_WEEK_LEGACY))
    }

    /// Milliseconds into the GPS week. Older logs store it in `TimeMS`
    /// alongside `Week`.
    pub fn gps_ms(&self) -> Option<u64> {
        self.opt_u64(fields::GPS_MS).or_else(|| {
            self.get(fields::GPS_WEEK_LEGACY)?;
            self.time_ms()
        })
    }

    pub fn num_sats(&self) -> Option<i64> {
        self.opt_i64(fields::GPS_SATS)
    }

    pub fn hdop(&self) -> Option<f64> {
        self.opt_f64(fields::GPS_HDOP)
    }

    pub fn latitude(&self) -> Option<f64> {
        self.opt_f64(fields::LAT)
    }

    pub fn longitude(&self) -> Option<f64> {
        self.opt_f64(fields::LNG)
    }

    pub fn altitude(&self) -> Option<f64> {
        self.opt_f64(fields::ALT)
    }

    pub fn ground_speed(&self) -> Option<f64> {
        self.opt_f64(fields::GPS_SPEED)
    }

    pub fn ground_course(&self) -> Option<f64> {
        self.opt_f64(fields::GPS_COURSE)
    }

    /// Absolute time of a GPS record in microseconds since 1970.
    ///
    /// Uses the week/ms pair when the week is plausible, otherwise a
    /// `GPSTime` field if the format carries one. Never fails.
    pub fn gps_time_us(&self) -> Option<u64> {
        let from_week = match (self.gps_week(), self.gps_ms()) {
            (Some(week), Some(ms)) => gps_time_to_unix_us(week, ms),
            _ => None,
        };
        from_week.or_else(|| self.opt_u64(fields::GPS_ABS_TIME))
    }

    // CMD

    pub fn command_total(&self) -> Option<u64> {
        self.opt_u64(fields::CMD_TOTAL)
    }

    pub fn command_number(&self) -> Option<u64> {
        self.opt_u64(fields::CMD_NUMBER)
    }

    pub fn command_id(&self) -> Option<u64> {
        self.opt_u64(fields::CMD_ID)
    }

    pub fn command_params(&self) -> Option<[f64; 4]> {
        let mut params = [0.0; 4];
        for (slot, name) in params.iter_mut().zip(fields::CMD_PARAMS) {
            *slot = self.opt_f64(name)?;
        }
        Some(params)
    }

    // MODE

    pub fn mode(&self) -> Option<&str> {
        self.opt_str(fields::MODE)
    }

    pub fn mode_number(&self) -> Option<u64> {
        self.opt_u64(fields::MODE_NUM)
    }

    pub fn mode_reason(&self) -> Option<u64> {
        self.opt_u64(fields::MODE_REASON)
    }

    // PARM

    pub fn param_name(&self) -> Option<&str> {
        self.opt_str(fields::PARAM_NAME)
    }

    pub fn param_value(&self) -> Option<f64> {
        self.opt_f64(fields::PARAM_VALUE)
    }

    pub fn param_default(&self) -> Option<f64> {
        self.opt_f64(fields::PARAM_DEFAULT)
    }

    // MSG

    pub fn message(&self) -> Option<&str> {
        self.opt_str(fields::MESSAGE)
    }

    // VER

    pub fn board_type(&self) -> Option<u64> {
        self.opt_u64(fields::BOARD_TYPE)
    }

    pub fn board_subtype(&self) -> Option<u64> {
        self.opt_u64(fields::BOARD_SUBTYPE)
    }

    /// `(major, minor, patch)` from a VER record
    pub fn firmware_version(&self) -> Option<(u64, u64, u64)> {
        Some((
            self.opt_u64(fields::VERSION_MAJOR)?,
            self.opt_u64(fields::VERSION_MINOR)?,
            self.opt_u64(fields::VERSION_PATCH)?,
        ))
    }

    pub fn firmware_type(&self) -> Option<u64> {
        self.opt_u64(fields::FIRMWARE_TYPE)
    }

    pub fn git_hash(&self) -> Option<u64> {
        self.opt_u64(fields::GIT_HASH)
    }

    pub fn firmware_string(&self) -> Option<&str> {
        self.opt_str(fields::FIRMWARE_STRING)
    }

    pub fn build_type(&self) -> Option<u64> {
        self.opt_u64(fields::BUILD_TYPE)
    }

    // ERR / EV

    pub fn error_subsystem(&self) -> Option<u64> {
        self.opt_u64(fields::ERR_SUBSYSTEM)
    }

    pub fn error_code(&self) -> Option<u64> {
        self.opt_u64(fields::ERR_CODE)
    }

    pub fn event_id(&self) -> Option<u64> {
        self.opt_u64(fields::EVENT_ID)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text_line())
    }
}

/// Serialized as `{"name": ..., "fields": {column: value, ...}}`
#[cfg(feature = "serde")]
impl serde::Serialize for Record {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("Record", 2)?;
        state.serialize_field("name", self.name())?;
        state.serialize_field("fields", &FieldMap(self))?;
        state.end()
    }
}

#[cfg(feature = "serde")]
struct FieldMap<'r>(&'r Record);

#[cfg(feature = "serde")]
impl serde::Serialize for FieldMap<'_> {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.fields())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, types: &str, columns: &[&str], values: Vec<TypedValue>) -> Record {
        let desc = FormatDescriptor::new(
            140,
            name,
            0,
            types,
            columns.iter().map(|c| c.to_string()).collect(),
        )
        .unwrap();
        Record::new(Arc::new(desc), values)
    }

    #[test]
    fn test_field_access() {
        let rec = record(
            "PARM",
            "QNf",
            &["TimeUS", "Name", "Value"],
            vec![
                TypedValue::UInt(1000),
                TypedValue::from("RATE_RLL_P"),
                TypedValue::Float(0.135),
            ],
        );
        assert_eq!(rec.param_name(), Some("RATE_RLL_P"));
        assert_eq!(rec.param_value(), Some(0.135));
        assert_eq!(rec.time_us(), Some(1000));
        assert_eq!(rec.param_default(), None);
        assert!(matches!(rec.get_f64("Nope"), Err(DFError::MissingField(_))));
        assert!(matches!(
            rec.get_f64("Name"),
            Err(DFError::TypeMismatch { .. })
        ));

        let names: Vec<&str> = rec.fields().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["TimeUS", "Name", "Value"]);
    }

    #[test]
    fn test_text_line() {
        let rec = record(
            "MODE",
            "QMB",
            &["TimeUS", "Mode", "ModeNum"],
            vec![
                TypedValue::UInt(5),
                TypedValue::from("LOITER"),
                TypedValue::UInt(5),
            ],
        );
        assert_eq!(rec.to_text_line(), "MODE, 5, LOITER, 5");
        assert_eq!(rec.mode(), Some("LOITER"));
        assert_eq!(rec.mode_number(), Some(5));
    }

    #[test]
    fn test_gps_time_from_week() {
        let rec = record(
            "GPS",
            "QBIH",
            &["TimeUS", "Status", "GMS", "GWk"],
            vec![
                TypedValue::UInt(1),
                TypedValue::UInt(3),
                TypedValue::UInt(1000),
                TypedValue::UInt(2190),
            ],
        );
        let expected = (315_964_800u64 + 2190 * 604_800 - 15) * 1_000_000 + 1_000_000;
        assert_eq!(rec.gps_time_us(), Some(expected));
    }

    #[test]
    fn test_gps_time_implausible_week() {
        for week in [0u64, 3001] {
            let rec = record(
                "GPS",
                "IH",
                &["GMS", "GWk"],
                vec![TypedValue::UInt(1000), TypedValue::UInt(week)],
            );
            assert_eq!(rec.gps_time_us(), None, "week {}", week);
        }
    }

    #[test]
    fn test_gps_time_absolute_field() {
        let rec = record(
            "GPS",
            "QB",
            &["GPSTime", "Fix"],
            vec![TypedValue::UInt(1_600_000_000_000_000), TypedValue::UInt(3)],
        );
        assert_eq!(rec.gps_time_us(), Some(1_600_000_000_000_000));

        let rec = record("ATT", "Q", &["TimeUS"], vec![TypedValue::UInt(1)]);
        assert_eq!(rec.gps_time_us(), None);
    }

    #[test]
    fn test_legacy_gps_fields() {
        let rec = record(
            "GPS",
            "IH",
            &["TimeMS", "Week"],
            vec![TypedValue::UInt(500), TypedValue::UInt(1800)],
        );
        assert_eq!(rec.gps_ms(), Some(500));
        assert_eq!(rec.gps_week(), Some(1800));
        assert!(rec.gps_time_us().is_some());

        // TimeMS alone is boot time, not GPS time
        let rec = record("ATT", "I", &["TimeMS"], vec![TypedValue::UInt(500)]);
        assert_eq!(rec.gps_ms(), None);
        assert_eq!(rec.timestamp_us(), Some(500_000));
    }

    #[test]
    fn test_command_params() {
        let rec = record(
            "CMD",
            "HHHffff",
            &["CTot", "CNum", "CId", "Prm1", "Prm2", "Prm3", "Prm4"],
            vec![
                TypedValue::UInt(5),
                TypedValue::UInt(1),
                TypedValue::UInt(16),
                TypedValue::Float(0.0),
                TypedValue::Float(1.0),
                TypedValue::Float(2.0),
                TypedValue::Float(3.0),
            ],
        );
        assert_eq!(rec.command_id(), Some(16));
        assert_eq!(rec.command_params(), Some([0.0, 1.0, 2.0, 3.0]));
    }
}
