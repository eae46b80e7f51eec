//! Export module - CSV downloads

mod serializer;

pub use serializer::{Artifact, ExportError, ExportSerializer, CSV_MIME};
