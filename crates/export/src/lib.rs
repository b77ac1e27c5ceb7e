#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod errors;
pub use errors::ExportError;

mod exporter;
pub use exporter::ItemExporter;

pub mod fields;
pub use fields::TypeSink;

mod writer;
pub use writer::FileFormat;

mod single;
pub use single::SinglefileItemExporter;

mod multi;
pub use multi::MultifileItemExporter;

mod options;
pub use options::{item_exporter, ExporterOptions};

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
