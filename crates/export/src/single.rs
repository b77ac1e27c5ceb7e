//! The single-file backend: one output file per item type.

use crate::{
    errors::ExportError,
    exporter::ItemExporter,
    fields::TypeSink,
    writer::{project, FileFormat, LineWriter, RecordEncoder},
};
use klay_domain::ExportRecord;
use std::{collections::HashMap, path::PathBuf, sync::Mutex};
use tracing::info;

struct TypeState {
    sink: TypeSink,
    encoder: Option<RecordEncoder>,
    exported: u64,
}

/// Writes each item type to a single file.
#[derive(Debug)]
pub struct SinglefileItemExporter {
    format: FileFormat,
    compress: bool,
    state: Mutex<HashMap<&'static str, TypeState>>,
}

impl std::fmt::Debug for TypeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeState").field("sink", &self.sink.kind).finish_non_exhaustive()
    }
}

impl SinglefileItemExporter {
    /// Creates the exporter for the configured sinks.
    pub fn new(sinks: Vec<TypeSink>, format: FileFormat, compress: bool) -> Self {
        let state = sinks
            .into_iter()
            .map(|sink| (sink.kind, TypeState { sink, encoder: None, exported: 0 }))
            .collect();
        Self { format, compress, state: Mutex::new(state) }
    }

    fn output_path(&self, sink: &TypeSink) -> PathBuf {
        if self.compress {
            let mut name = sink.path.as_os_str().to_os_string();
            name.push(".gz");
            PathBuf::from(name)
        } else {
            sink.path.clone()
        }
    }
}

impl ItemExporter for SinglefileItemExporter {
    fn open(&self) -> Result<(), ExportError> {
        let mut state = self.state.lock().expect("poisoned");
        for type_state in state.values_mut() {
            let path = self.output_path(&type_state.sink);
            let writer = LineWriter::create(&path, self.compress)?;
            type_state.encoder =
                Some(RecordEncoder::new(writer, self.format, type_state.sink.fields)?);
        }
        Ok(())
    }

    fn export_item(&self, record: &ExportRecord) -> Result<(), ExportError> {
        let mut state = self.state.lock().expect("poisoned");
        let type_state = state
            .get_mut(record.kind())
            .ok_or_else(|| ExportError::UnknownItemType(record.kind().to_string()))?;
        let serialized = serde_json::to_value(record)?;
        let projected = project(&serialized, type_state.sink.fields);
        let path = type_state.sink.path.clone();
        type_state
            .encoder
            .as_mut()
            .ok_or_else(|| ExportError::UnknownItemType(record.kind().to_string()))?
            .encode(&projected, &path)?;
        type_state.exported += 1;
        Ok(())
    }

    fn close(&self) -> Result<(), ExportError> {
        let mut state = self.state.lock().expect("poisoned");
        for type_state in state.values_mut() {
            if let Some(encoder) = type_state.encoder.take() {
                encoder.finish(&type_state.sink.path)?;
            }
            info!(
                target: "exporter",
                kind = type_state.sink.kind,
                exported = type_state.exported,
                "{} items exported: {}",
                type_state.sink.kind,
                type_state.exported
            );
        }
        Ok(())
    }
}
