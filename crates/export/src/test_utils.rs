//! Test utilities for the exporter front.

use crate::{errors::ExportError, exporter::ItemExporter};
use klay_domain::ExportRecord;
use std::sync::Mutex;

/// An [ItemExporter] that keeps every record in memory.
#[derive(Debug, Default)]
pub struct CollectingExporter {
    records: Mutex<Vec<ExportRecord>>,
}

impl CollectingExporter {
    /// Creates an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every record exported so far, in arrival order.
    pub fn records(&self) -> Vec<ExportRecord> {
        self.records.lock().expect("poisoned").clone()
    }

    /// The records of one kind.
    pub fn records_of(&self, kind: &str) -> Vec<ExportRecord> {
        self.records().into_iter().filter(|record| record.kind() == kind).collect()
    }
}

impl ItemExporter for CollectingExporter {
    fn open(&self) -> Result<(), ExportError> {
        Ok(())
    }

    fn export_item(&self, record: &ExportRecord) -> Result<(), ExportError> {
        self.records.lock().expect("poisoned").push(record.clone());
        Ok(())
    }

    fn close(&self) -> Result<(), ExportError> {
        Ok(())
    }
}
