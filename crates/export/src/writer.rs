//! Low-level line writers shared by both exporter backends.

use crate::errors::ExportError;
use flate2::{write::GzEncoder, Compression};
use serde_json::{Map, Value};
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

/// Output encoding of an item stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileFormat {
    /// One JSON object per line.
    Json,
    /// CSV with a header row.
    Csv,
}

impl FileFormat {
    /// The filename extension of this format.
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

impl std::str::FromStr for FileFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(format!("unsupported file format {other:?}, use json or csv")),
        }
    }
}

/// Projects a serialized record onto the configured field list, in order.
/// Fields the record does not carry project as null.
pub(crate) fn project(record: &Value, fields: &[&str]) -> Map<String, Value> {
    let mut projected = Map::with_capacity(fields.len());
    for &field in fields {
        let value = record.get(field).cloned().unwrap_or(Value::Null);
        projected.insert(field.to_string(), value);
    }
    projected
}

pub(crate) fn io_error(path: &Path, source: std::io::Error) -> ExportError {
    ExportError::Io { path: path.display().to_string(), source }
}

/// A line-oriented writer over a file, optionally gzipped.
pub(crate) enum LineWriter {
    Plain(BufWriter<File>),
    Gz(GzEncoder<BufWriter<File>>),
}

impl std::fmt::Debug for LineWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain(_) => f.write_str("LineWriter::Plain"),
            Self::Gz(_) => f.write_str("LineWriter::Gz"),
        }
    }
}

impl LineWriter {
    /// Creates the file, and its parent directories if needed.
    pub(crate) fn create(path: &Path, compress: bool) -> Result<Self, ExportError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|err| io_error(path, err))?;
            }
        }
        let file = BufWriter::new(File::create(path).map_err(|err| io_error(path, err))?);
        Ok(if compress {
            Self::Gz(GzEncoder::new(file, Compression::default()))
        } else {
            Self::Plain(file)
        })
    }

    /// Flushes and, for gzip, writes the trailer.
    pub(crate) fn finish(self, path: &Path) -> Result<(), ExportError> {
        match self {
            Self::Plain(mut file) => file.flush().map_err(|err| io_error(path, err)),
            Self::Gz(encoder) => encoder
                .finish()
                .and_then(|mut file| file.flush())
                .map_err(|err| io_error(path, err)),
        }
    }
}

impl Write for LineWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            Self::Plain(file) => file.write(buf),
            Self::Gz(encoder) => encoder.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Self::Plain(file) => file.flush(),
            Self::Gz(encoder) => encoder.flush(),
        }
    }
}

/// Encodes one projected record in the given format.
#[derive(Debug)]
pub(crate) enum RecordEncoder {
    Json(LineWriter),
    Csv(csv::Writer<LineWriter>),
}

impl RecordEncoder {
    /// Wraps a writer, emitting the CSV header row up front.
    pub(crate) fn new(
        writer: LineWriter,
        format: FileFormat,
        fields: &[&str],
    ) -> Result<Self, ExportError> {
        match format {
            FileFormat::Json => Ok(Self::Json(writer)),
            FileFormat::Csv => {
                let mut csv_writer = csv::Writer::from_writer(writer);
                csv_writer.write_record(fields)?;
                Ok(Self::Csv(csv_writer))
            }
        }
    }

    /// Writes one projected record as a line or row.
    pub(crate) fn encode(
        &mut self,
        projected: &Map<String, Value>,
        path: &Path,
    ) -> Result<(), ExportError> {
        match self {
            Self::Json(writer) => {
                serde_json::to_writer(&mut *writer, projected)?;
                writer.write_all(b"\n").map_err(|err| io_error(path, err))?;
            }
            Self::Csv(writer) => {
                let row: Vec<String> = projected.values().map(csv_cell).collect();
                writer.write_record(&row)?;
            }
        }
        Ok(())
    }

    /// Finishes the underlying writer.
    pub(crate) fn finish(self, path: &Path) -> Result<(), ExportError> {
        match self {
            Self::Json(writer) => writer.finish(path),
            Self::Csv(writer) => writer
                .into_inner()
                .map_err(|err| {
                    io_error(path, std::io::Error::new(std::io::ErrorKind::Other, err.to_string()))
                })?
                .finish(path),
        }
    }
}

/// Scalar cells render bare; lists and objects render as JSON text.
fn csv_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        nested => nested.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn projection_preserves_field_order_and_fills_nulls() {
        let record = json!({"b": 2, "a": 1});
        let projected = project(&record, &["a", "b", "missing"]);
        let keys: Vec<&String> = projected.keys().collect();
        assert_eq!(keys, ["a", "b", "missing"]);
        assert_eq!(projected["missing"], Value::Null);
    }

    #[test]
    fn csv_cells_render_scalars_bare() {
        assert_eq!(csv_cell(&json!(null)), "");
        assert_eq!(csv_cell(&json!("0xabc")), "0xabc");
        assert_eq!(csv_cell(&json!(7)), "7");
        assert_eq!(csv_cell(&json!([1, 2])), "[1,2]");
    }
}
