//! Loading and saving record collections.
//!
//! Inputs are JSON arrays of flat objects. Output can be written as a compact
//! JSON array, a pretty-printed JSON array, or NDJSON.

use crate::record::Record;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::str::FromStr;

/// Error type for serialization operations
#[derive(Debug)]
pub enum SerializationError {
    JsonError(serde_json::Error),
    IoError(std::io::Error),
    /// The document's top level is not an array.
    NotAnArray { found: &'static str },
    /// An array element is not an object.
    NotAnObject { index: usize },
}

impl From<serde_json::Error> for SerializationError {
    fn from(err: serde_json::Error) -> Self {
        SerializationError::JsonError(err)
    }
}

impl From<std::io::Error> for SerializationError {
    fn from(err: std::io::Error) -> Self {
        SerializationError::IoError(err)
    }
}

impl std::fmt::Display for SerializationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SerializationError::JsonError(e) => write!(f, "JSON error: {}", e),
            SerializationError::IoError(e) => write!(f, "IO error: {}", e),
            SerializationError::NotAnArray { found } => {
                write!(f, "Expected a JSON array of records, found {}", found)
            }
            SerializationError::NotAnObject { index } => {
                write!(f, "Element {} of the record array is not an object", index)
            }
        }
    }
}

impl std::error::Error for SerializationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SerializationError::JsonError(e) => Some(e),
            SerializationError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

/// Layout of saved output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Single-line JSON array
    #[default]
    Json,
    /// Indented JSON array
    JsonPretty,
    /// One JSON object per line
    Ndjson,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "json-pretty" | "pretty" => Ok(OutputFormat::JsonPretty),
            "ndjson" | "jsonl" => Ok(OutputFormat::Ndjson),
            other => Err(format!(
                "Unsupported output format: '{}'. Supported formats: json, json-pretty, ndjson",
                other
            )),
        }
    }
}

/// Convert a parsed JSON document into records.
pub fn records_from_value(value: Value) -> Result<Vec<Record>, SerializationError> {
    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(SerializationError::NotAnArray {
                found: json_type_name(&other),
            })
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            Record::from_value(item).ok_or(SerializationError::NotAnObject { index })
        })
        .collect()
}

/// Read a JSON array of records from any reader.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<Record>, SerializationError> {
    let value: Value = serde_json::from_reader(reader)?;
    records_from_value(value)
}

/// Load a JSON array of records from a file.
pub fn load_records<P: AsRef<Path>>(path: P) -> Result<Vec<Record>, SerializationError> {
    let file = File::open(path.as_ref())?;
    let records = read_records(BufReader::new(file))?;
    tracing::debug!(path = %path.as_ref().display(), count = records.len(), "Loaded records");
    Ok(records)
}

/// Write records to any writer in the given format.
pub fn write_records<W: Write>(
    writer: W,
    records: &[Record],
    format: OutputFormat,
) -> Result<(), SerializationError> {
    match format {
        OutputFormat::Json => {
            let mut array = JsonArrayWriter::new(writer)?;
            for record in records {
                array.write(record)?;
            }
            array.finish()?;
        }
        OutputFormat::JsonPretty => {
            let mut writer = writer;
            serde_json::to_writer_pretty(&mut writer, records)?;
            writeln!(writer)?;
            writer.flush()?;
        }
        OutputFormat::Ndjson => {
            let mut lines = NdjsonWriter::new(writer);
            lines.write_all(records)?;
            lines.flush()?;
        }
    }
    Ok(())
}

/// Save records to a file, replacing any existing content.
pub fn save_records<P: AsRef<Path>>(
    path: P,
    records: &[Record],
    format: OutputFormat,
) -> Result<(), SerializationError> {
    let file = File::create(path.as_ref())?;
    write_records(BufWriter::new(file), records, format)?;
    tracing::debug!(path = %path.as_ref().display(), count = records.len(), "Saved records");
    Ok(())
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "a null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// NDJSON (Newline Delimited JSON) writer
///
/// Writes records as NDJSON, one JSON object per line.
pub struct NdjsonWriter<W: Write> {
    writer: W,
}

impl<W: Write> NdjsonWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Write a single record as an NDJSON line
    pub fn write<T: Serialize>(&mut self, record: &T) -> Result<(), SerializationError> {
        let json = serde_json::to_string(record)?;
        writeln!(self.writer, "{}", json)?;
        Ok(())
    }

    pub fn write_all<T: Serialize>(&mut self, records: &[T]) -> Result<(), SerializationError> {
        for record in records {
            self.write(record)?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), SerializationError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Streaming JSON array writer
///
/// Opens the array on construction and closes it in [`JsonArrayWriter::finish`].
pub struct JsonArrayWriter<W: Write> {
    writer: W,
    written: usize,
}

impl<W: Write> JsonArrayWriter<W> {
    /// Create a new JSON array writer and write the opening bracket
    pub fn new(mut writer: W) -> Result<Self, SerializationError> {
        write!(writer, "[")?;
        Ok(Self { writer, written: 0 })
    }

    pub fn write<T: Serialize>(&mut self, record: &T) -> Result<(), SerializationError> {
        if self.written > 0 {
            write!(self.writer, ",")?;
        }
        serde_json::to_writer(&mut self.writer, record)?;
        self.written += 1;
        Ok(())
    }

    /// Close the array and flush. Returns the number of elements written.
    pub fn finish(mut self) -> Result<usize, SerializationError> {
        write!(self.writer, "]")?;
        self.writer.flush()?;
        Ok(self.written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        Record::from_value(value).unwrap()
    }

    fn people() -> Vec<Record> {
        vec![
            record(json!({"forename": "Alice", "surname": "Smith"})),
            record(json!({"forename": "Bob", "surname": "Jones"})),
        ]
    }

    #[test]
    fn test_read_records() {
        let input = br#"[{"id": 1, "name": "Head Journal"}, {"id": 2, "name": "Au Revoir Health"}]"#;
        let records = read_records(&input[..]).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[1].get("name"), Some(&json!("Au Revoir Health")));
    }

    #[test]
    fn test_read_rejects_non_array() {
        let err = read_records(&br#"{"id": 1}"#[..]).unwrap_err();
        assert!(matches!(err, SerializationError::NotAnArray { found: "an object" }));
    }

    #[test]
    fn test_non_array_message_names_the_type() {
        let err = read_records(&b"null"[..]).unwrap_err();
        assert!(matches!(err, SerializationError::NotAnArray { found: "a null" }));
        assert_eq!(err.to_string(), "Expected a JSON array of records, found a null");

        let err = read_records(&b"true"[..]).unwrap_err();
        assert_eq!(err.to_string(), "Expected a JSON array of records, found a boolean");
    }

    #[test]
    fn test_read_rejects_non_object_elements() {
        let err = read_records(&br#"[{"id": 1}, 2]"#[..]).unwrap_err();
        assert!(matches!(err, SerializationError::NotAnObject { index: 1 }));
    }

    #[test]
    fn test_read_rejects_invalid_json() {
        let err = read_records(&b"[{"[..]).unwrap_err();
        assert!(matches!(err, SerializationError::JsonError(_)));
    }

    #[test]
    fn test_json_array_writer() {
        let mut buf = Vec::new();
        let mut writer = JsonArrayWriter::new(&mut buf).unwrap();
        for person in people() {
            writer.write(&person).unwrap();
        }
        assert_eq!(writer.finish().unwrap(), 2);

        let output = String::from_utf8(buf).unwrap();
        assert_eq!(
            output,
            r#"[{"forename":"Alice","surname":"Smith"},{"forename":"Bob","surname":"Jones"}]"#
        );
    }

    #[test]
    fn test_empty_json_array() {
        let mut buf = Vec::new();
        write_records(&mut buf, &[], OutputFormat::Json).unwrap();
        assert_eq!(buf, b"[]");
    }

    #[test]
    fn test_ndjson_output() {
        let mut buf = Vec::new();
        write_records(&mut buf, &people(), OutputFormat::Ndjson).unwrap();

        let output = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("Alice"));
        assert!(lines[1].contains("Bob"));
    }

    #[test]
    fn test_pretty_output_reads_back() {
        let mut buf = Vec::new();
        write_records(&mut buf, &people(), OutputFormat::JsonPretty).unwrap();

        assert!(String::from_utf8_lossy(&buf).contains("\n  {"));
        assert_eq!(read_records(&buf[..]).unwrap(), people());
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("json".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!("JSON-PRETTY".parse::<OutputFormat>(), Ok(OutputFormat::JsonPretty));
        assert_eq!("jsonl".parse::<OutputFormat>(), Ok(OutputFormat::Ndjson));
        assert!("csv".parse::<OutputFormat>().is_err());
    }
}
