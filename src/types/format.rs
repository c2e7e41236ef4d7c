use crate::error::{DFError, Result};
use crate::parser::converter::TypeConverter;
use crate::parser::stream::DFDataStream;
use crate::types::{Record, TypedValue};
use crate::vehicle::VehicleType;
use std::collections::HashMap;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::Serialize;

/// Name of the schema-definition format
pub const FMT_NAME: &str = "FMT";
/// Numeric type code of the schema-definition format
pub const FMT_TYPE: u8 = 128;
/// Frame length of an FMT record: header + B + B + n + N + Z
pub const FMT_LENGTH: usize = 89;
pub const FMT_TYPES: &str = "BBnNZ";
pub const FMT_COLUMNS: [&str; 5] = ["Type", "Length", "Name", "Format", "Columns"];

/// Sync bytes + type code
pub const FRAME_HEADER_LEN: usize = 3;

/// Layout of one record type
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct FormatDescriptor {
    pub type_code: u8,
    pub name: String,
    /// Frame length including the 3-byte header
    pub length: usize,
    pub types: String,
    pub columns: Vec<String>,
    #[cfg_attr(feature = "serde", serde(skip))]
    column_index: HashMap<String, usize>,
    #[cfg_attr(feature = "serde", serde(skip))]
    converters: std::result::Result<Vec<TypeConverter>, char>,
}

impl PartialEq for FormatDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.type_code == other.type_code
            && self.name == other.name
            && self.length == other.length
            && self.types == other.types
            && self.columns == other.columns
    }
}

impl FormatDescriptor {
    pub fn new(
        type_code: u8,
        name: &str,
        length: usize,
        types: &str,
        columns: Vec<String>,
    ) -> Result<Self> {
        let type_count = types.chars().count();
        if type_count != columns.len() {
            return Err(DFError::MalformedRecord(format!(
                "format {} declares {} types but {} columns",
                name,
                type_count,
                columns.len()
            )));
        }

        Ok(Self::assemble(type_code, name, length, types, columns))
    }

    fn assemble(type_code: u8, name: &str, length: usize, types: &str, columns: Vec<String>) -> Self {
        let column_index = columns
            .iter()
            .enumerate()
            .map(|(i, column)| (column.clone(), i))
            .collect();

        // Unknown type characters only fail when a record of this format is built
        let converters = types
            .chars()
            .map(|c| TypeConverter::for_code(c).map_err(|_| c))
            .collect();

        Self {
            type_code,
            name: name.to_string(),
            length,
            types: types.to_string(),
            columns,
            column_index,
            converters,
        }
    }

    /// The bootstrap descriptor that describes all other descriptors
    pub fn bootstrap() -> Self {
        let columns = FMT_COLUMNS.iter().map(|c| c.to_string()).collect();
        Self::assemble(FMT_TYPE, FMT_NAME, FMT_LENGTH, FMT_TYPES, columns)
    }

    /// Build a descriptor from a decoded FMT record
    pub fn from_schema_record(record: &Record) -> Result<Self> {
        let type_code = record.get_u64("Type")?;
        let type_code = u8::try_from(type_code).map_err(|_| {
            DFError::MalformedRecord(format!("format type code {} out of range", type_code))
        })?;
        let length = record.get_u64("Length")? as usize;
        let name = record.get_str("Name")?;
        let types = record.get_str("Format")?;
        let columns = split_columns(record.get_str("Columns")?);
        Self::new(type_code, name, length, types, columns)
    }

    pub fn is_schema_definition(&self) -> bool {
        self.name == FMT_NAME
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_position(&self, column: &str) -> Option<usize> {
        self.column_index.get(column).copied()
    }

    /// Resolved converters, one per column
    pub fn converters(&self) -> Result<&[TypeConverter]> {
        self.converters
            .as_deref()
            .map_err(|&code| DFError::UnknownTypeCode(code))
    }

    /// Sum of converter widths, which may differ from `length - 3`
    pub fn payload_width(&self) -> Result<usize> {
        Ok(self.converters()?.iter().map(|c| c.width()).sum())
    }

    /// Materialize a record from trimmed text fields (format name excluded).
    ///
    /// Fields beyond the declared columns are folded into the last column as
    /// one comma-joined string. The text parser splits lines so that the last
    /// field already carries the rest of the line.
    pub fn decode_text(
        self: &Arc<Self>,
        fields: &[&str],
        vehicle: Option<VehicleType>,
    ) -> Result<Record> {
        let converters = self.converters()?;
        let count = converters.len();
        if fields.len() < count {
            return Err(DFError::MalformedRecord(format!(
                "{} expects {} fields, got {}",
                self.name,
                count,
                fields.len()
            )));
        }

        let mut values = Vec::with_capacity(count);
        for (i, converter) in converters.iter().enumerate() {
            let value = if i + 1 == count && fields.len() > count {
                TypedValue::Text(fields[i..].join(","))
            } else {
                converter.from_text(fields[i], vehicle)?
            };
            values.push(value);
        }

        Ok(Record::new(Arc::clone(self), values))
    }

    /// Materialize a record from the payload at the stream cursor.
    ///
    /// Returns the record and the number of payload bytes consumed.
    pub fn decode_binary(
        self: &Arc<Self>,
        stream: &mut DFDataStream,
        vehicle: Option<VehicleType>,
    ) -> Result<(Record, usize)> {
        let converters = self.converters()?;
        let mut values = Vec::with_capacity(converters.len());
        let mut consumed = 0;
        for converter in converters {
            let (value, width) = converter.from_binary(stream, vehicle)?;
            consumed += width;
            values.push(value);
        }
        Ok((Record::new(Arc::clone(self), values), consumed))
    }
}

/// Split a comma-joined column list, dropping surrounding whitespace
pub fn split_columns(columns: &str) -> Vec<String> {
    if columns.trim().is_empty() {
        return Vec::new();
    }
    columns.split(',').map(|c| c.trim().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bootstrap_layout() {
        let fmt = FormatDescriptor::bootstrap();
        assert!(fmt.is_schema_definition());
        assert_eq!(fmt.type_code, 128);
        assert_eq!(fmt.payload_width().unwrap() + FRAME_HEADER_LEN, FMT_LENGTH);
        assert_eq!(fmt.column_position("Columns"), Some(4));
    }

    #[test]
    fn test_mismatched_columns_rejected() {
        let result = FormatDescriptor::new(
            130,
            "GPS",
            10,
            "QBI",
            vec!["TimeUS".to_string(), "Status".to_string()],
        );
        assert!(matches!(result, Err(DFError::MalformedRecord(_))));
    }

    #[test]
    fn test_unknown_type_deferred_to_decode() {
        let desc = Arc::new(
            FormatDescriptor::new(131, "ODD", 5, "Bx", vec!["A".to_string(), "B".to_string()])
                .unwrap(),
        );
        assert!(matches!(
            desc.decode_text(&["1", "2"], None),
            Err(DFError::UnknownTypeCode('x'))
        ));
    }

    #[test]
    fn test_decode_text_folds_extra_fields() {
        let fmt = Arc::new(FormatDescriptor::bootstrap());
        let fields = ["129", "23", "PARM", "QNf", "TimeUS", "Name", "Value"];
        let record = fmt.decode_text(&fields, None).unwrap();
        assert_eq!(record.get_str("Columns").unwrap(), "TimeUS,Name,Value");

        let desc = FormatDescriptor::from_schema_record(&record).unwrap();
        assert_eq!(desc.name, "PARM");
        assert_eq!(desc.type_code, 129);
        assert_eq!(desc.length, 23);
        assert_eq!(desc.columns, vec!["TimeUS", "Name", "Value"]);
    }

    #[test]
    fn test_decode_text_insufficient_fields() {
        let fmt = Arc::new(FormatDescriptor::bootstrap());
        assert!(matches!(
            fmt.decode_text(&["129", "23", "PARM"], None),
            Err(DFError::MalformedRecord(_))
        ));
    }

    #[test]
    fn test_split_columns() {
        assert_eq!(split_columns("A, B ,C"), vec!["A", "B", "C"]);
        assert!(split_columns("").is_empty());
    }
}
