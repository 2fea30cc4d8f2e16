//! API implementation submodules.
//!
//! Each submodule contains `impl CollbankApi` blocks that extend the public
//! API with domain-specific methods. The struct definition remains in
//! `lib.rs`.

mod builder;
mod collections;
mod vlo;
mod vocabulary;

pub use builder::CollbankApiBuilder;
pub use collections::ExportedXml;
