//! CMDI documents: export, profile checks, repair, import and bulk archives.

pub mod archive;
pub mod export;
pub mod import;
pub mod profile;
pub mod repair;
pub mod tree;

pub use archive::{write_archive, ArchiveFormat, BulkExport, ExportedDocument};
pub use export::{export_collection, Cardinality, CollectionExporter, ExportOptions, FieldValue};
pub use import::{read_collection, ImportOutcome, ImportStatus};
pub use profile::{check_profile, ProfileIssue};
pub use repair::{proxy_id, repair, RepairOutcome, XmlSource};
pub use tree::{Element, Node, XmlDocument};
