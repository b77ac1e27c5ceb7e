//! The rotating multi-file backend.

use crate::{
    errors::ExportError,
    exporter::ItemExporter,
    fields::TypeSink,
    writer::{project, FileFormat, LineWriter, RecordEncoder},
};
use klay_domain::ExportRecord;
use serde_json::{Map, Value};
use std::{
    collections::{HashMap, VecDeque},
    sync::Mutex,
};
use tracing::info;

/// Buffers one type's records and cuts a numbered file per `maxlines`.
struct BufferedTypeExporter {
    sink: TypeSink,
    buffer: VecDeque<Map<String, Value>>,
    counter: u64,
}

/// Writes each item type to a directory of sequentially numbered files of
/// exactly `file_maxlines` rows each, except possibly the last.
///
/// Rotation is synchronous within `export_item`: when the per-type counter
/// reaches a multiple of `file_maxlines`, the first `file_maxlines` buffered
/// records flush to `data-<index:012>.<fmt>[.gz]`. Close flushes the tail
/// to the next index.
#[derive(Debug)]
pub struct MultifileItemExporter {
    format: FileFormat,
    compress: bool,
    maxlines: u64,
    state: Mutex<HashMap<&'static str, BufferedTypeExporter>>,
}

impl std::fmt::Debug for BufferedTypeExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferedTypeExporter")
            .field("kind", &self.sink.kind)
            .field("buffered", &self.buffer.len())
            .field("counter", &self.counter)
            .finish()
    }
}

impl MultifileItemExporter {
    /// Creates the exporter; `maxlines` is clamped to at least 1.
    pub fn new(sinks: Vec<TypeSink>, format: FileFormat, maxlines: u64, compress: bool) -> Self {
        let state = sinks
            .into_iter()
            .map(|sink| {
                (sink.kind, BufferedTypeExporter { sink, buffer: VecDeque::new(), counter: 0 })
            })
            .collect();
        Self { format, compress, maxlines: maxlines.max(1), state: Mutex::new(state) }
    }

    fn flush_rows(
        &self,
        exporter: &mut BufferedTypeExporter,
        rows: u64,
    ) -> Result<(), ExportError> {
        let index = (exporter.counter - 1) / self.maxlines;
        let suffix = if self.compress { ".gz" } else { "" };
        let path = exporter
            .sink
            .path
            .join(format!("data-{index:012}.{}{suffix}", self.format.extension()));

        let writer = LineWriter::create(&path, self.compress)?;
        let mut encoder = RecordEncoder::new(writer, self.format, exporter.sink.fields)?;
        for _ in 0..rows {
            let projected = exporter.buffer.pop_front().expect("buffer holds the flushed rows");
            encoder.encode(&projected, &path)?;
        }
        encoder.finish(&path)
    }
}

impl ItemExporter for MultifileItemExporter {
    fn open(&self) -> Result<(), ExportError> {
        let state = self.state.lock().expect("poisoned");
        for exporter in state.values() {
            std::fs::create_dir_all(&exporter.sink.path)
                .map_err(|err| crate::writer::io_error(&exporter.sink.path, err))?;
        }
        Ok(())
    }

    fn export_item(&self, record: &ExportRecord) -> Result<(), ExportError> {
        let mut state = self.state.lock().expect("poisoned");
        let exporter = state
            .get_mut(record.kind())
            .ok_or_else(|| ExportError::UnknownItemType(record.kind().to_string()))?;

        let serialized = serde_json::to_value(record)?;
        exporter.buffer.push_back(project(&serialized, exporter.sink.fields));
        exporter.counter += 1;

        if exporter.counter % self.maxlines == 0 {
            self.flush_rows(exporter, self.maxlines)?;
        }
        Ok(())
    }

    fn close(&self) -> Result<(), ExportError> {
        let mut state = self.state.lock().expect("poisoned");
        for exporter in state.values_mut() {
            let tail = exporter.buffer.len() as u64;
            if tail > 0 {
                self.flush_rows(exporter, tail)?;
            }
            info!(
                target: "exporter",
                kind = exporter.sink.kind,
                exported = exporter.counter,
                "{} items exported: {}",
                exporter.sink.kind,
                exporter.counter
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::TRACE_FIELDS;
    use alloy_primitives::U256;
    use klay_domain::Trace;
    use std::io::Read;

    fn trace(index: u64) -> ExportRecord {
        ExportRecord::Trace(Trace {
            block_number: 1,
            transaction_hash: None,
            transaction_index: 0,
            trace_index: index,
            from_address: None,
            to_address: None,
            value: U256::ZERO,
            input: Some("0x".to_string()),
            output: Some("0x".to_string()),
            trace_type: "call".to_string(),
            call_type: Some("call".to_string()),
            gas: 0,
            gas_used: 0,
            subtraces: 0,
            trace_address: Vec::new(),
            error: None,
            status: 1,
            enrichment: None,
        })
    }

    fn exporter_in(dir: &std::path::Path, maxlines: u64) -> MultifileItemExporter {
        MultifileItemExporter::new(
            vec![TypeSink { kind: "trace", path: dir.to_path_buf(), fields: TRACE_FIELDS }],
            FileFormat::Json,
            maxlines,
            false,
        )
    }

    fn line_counts(dir: &std::path::Path) -> Vec<(String, usize)> {
        let mut files: Vec<_> = std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect();
        files.sort();
        files
            .into_iter()
            .map(|path| {
                let mut content = String::new();
                std::fs::File::open(&path).unwrap().read_to_string(&mut content).unwrap();
                (
                    path.file_name().unwrap().to_string_lossy().into_owned(),
                    content.lines().count(),
                )
            })
            .collect()
    }

    #[test]
    fn rotates_every_maxlines_with_tail() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = exporter_in(dir.path(), 3);
        exporter.open().unwrap();
        for index in 0..7 {
            exporter.export_item(&trace(index)).unwrap();
        }
        exporter.close().unwrap();

        assert_eq!(
            line_counts(dir.path()),
            vec![
                ("data-000000000000.json".to_string(), 3),
                ("data-000000000001.json".to_string(), 3),
                ("data-000000000002.json".to_string(), 1),
            ]
        );
    }

    #[test]
    fn exact_multiple_leaves_no_tail_file() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = exporter_in(dir.path(), 3);
        exporter.open().unwrap();
        for index in 0..6 {
            exporter.export_item(&trace(index)).unwrap();
        }
        exporter.close().unwrap();

        assert_eq!(line_counts(dir.path()).len(), 2);
    }

    #[test]
    fn unknown_type_raises() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = exporter_in(dir.path(), 3);
        exporter.open().unwrap();
        let block_record = {
            // any non-trace record
            use klay_domain::TokenTransfer;
            use alloy_primitives::{Address, B256};
            ExportRecord::TokenTransfer(TokenTransfer {
                token_address: Address::ZERO,
                from_address: Address::ZERO,
                to_address: Address::ZERO,
                value: U256::ZERO,
                log_index: 0,
                transaction_hash: B256::ZERO,
                transaction_index: 0,
                block_hash: B256::ZERO,
                block_number: 0,
                enrichment: None,
            })
        };
        assert!(matches!(
            exporter.export_item(&block_record),
            Err(ExportError::UnknownItemType(_))
        ));
    }

    proptest::proptest! {
        /// N records at maxlines M produce ceil(N/M) files; all but the tail
        /// hold exactly M rows.
        #[test]
        fn rotation_file_count_property(records in 1usize..40, maxlines in 1u64..8) {
            let dir = tempfile::tempdir().unwrap();
            let exporter = exporter_in(dir.path(), maxlines);
            exporter.open().unwrap();
            for index in 0..records {
                exporter.export_item(&trace(index as u64)).unwrap();
            }
            exporter.close().unwrap();

            let counts = line_counts(dir.path());
            let expected_files = records.div_ceil(maxlines as usize);
            proptest::prop_assert_eq!(counts.len(), expected_files);
            for (position, (_, lines)) in counts.iter().enumerate() {
                if position + 1 < expected_files {
                    proptest::prop_assert_eq!(*lines, maxlines as usize);
                }
            }
            let total: usize = counts.iter().map(|(_, lines)| lines).sum();
            proptest::prop_assert_eq!(total, records);
        }
    }
}
