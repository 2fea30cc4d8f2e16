//! Publication of records to the registry and ingestion feed.
//!
//! A record is published as two identical files: the registry copy,
//! served at the URL its PID resolves to, and a `.cmdi.xml` copy picked up
//! by the harvester feed. [`PublicationState`] compares the registry copy
//! against the record's last edit.

pub mod atomic;
mod tracker;

pub use atomic::{atomic_write, stage, StagedFile};
pub use tracker::{state_for, FileOutcome, PublicationState, PublicationTracker, PublishReport};
