//! Backend selection.

use crate::{
    exporter::ItemExporter, fields::TypeSink, multi::MultifileItemExporter,
    single::SinglefileItemExporter, writer::FileFormat,
};

/// Output options shared by every export command.
#[derive(Clone, Copy, Debug)]
pub struct ExporterOptions {
    /// Output encoding.
    pub format: FileFormat,
    /// Rows per file; `None` selects the single-file backend.
    pub file_maxlines: Option<u64>,
    /// Gzip the output files.
    pub compress: bool,
}

impl Default for ExporterOptions {
    fn default() -> Self {
        Self { format: FileFormat::Json, file_maxlines: None, compress: false }
    }
}

/// Builds the exporter for the configured sinks: rotating multi-file when
/// `file_maxlines` is set to a positive value, single-file otherwise.
pub fn item_exporter(sinks: Vec<TypeSink>, options: &ExporterOptions) -> Box<dyn ItemExporter> {
    match options.file_maxlines {
        Some(maxlines) if maxlines > 0 => Box::new(MultifileItemExporter::new(
            sinks,
            options.format,
            maxlines,
            options.compress,
        )),
        _ => Box::new(SinglefileItemExporter::new(sinks, options.format, options.compress)),
    }
}
