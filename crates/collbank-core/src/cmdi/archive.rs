//! Bulk export of several collections into one file on disk.

use super::export::{CollectionExporter, ExportOptions};
use super::tree::{Element, XmlDocument};
use crate::error::{CollbankError, Result};
use crate::store::CatalogueStore;
use crate::vocabulary::{CodeList, Vocabulary};
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{info, warn};

/// Output container of a bulk export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ArchiveFormat {
    /// One XML file with every `CMD` record under a `CMDs` root.
    #[default]
    #[serde(rename = "xml")]
    Xml,
    #[serde(rename = "tar.gz")]
    TarGz,
    #[serde(rename = "zip")]
    Zip,
}

impl ArchiveFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "xml" => Some(ArchiveFormat::Xml),
            "tar.gz" | "tgz" | "tar" => Some(ArchiveFormat::TarGz),
            "zip" => Some(ArchiveFormat::Zip),
            _ => None,
        }
    }
}

/// A rendered collection ready to be bundled.
#[derive(Debug, Clone)]
pub struct ExportedDocument {
    /// Entry name without extension, `cbmetadata_{id:05}`.
    pub file_name: String,
    pub doc: XmlDocument,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkExport {
    pub output_path: PathBuf,
    pub count: usize,
    pub format: ArchiveFormat,
    /// Collections left out because they could not be exported.
    pub skipped: Vec<i64>,
}

fn archive_error(err: impl std::fmt::Display, path: &Path) -> CollbankError {
    CollbankError::Io {
        message: format!("Failed to write archive: {}", err),
        path: Some(path.to_path_buf()),
        source: None,
    }
}

fn write_combined_xml(docs: &[ExportedDocument], out: &mut impl Write) -> Result<()> {
    let mut root = Element::new("CMDs");
    root.set_attr("count", docs.len().to_string());
    for exported in docs {
        root.push(exported.doc.root.clone());
    }
    let text = XmlDocument::new(root).to_xml_string()?;
    out.write_all(text.as_bytes())?;
    Ok(())
}

fn write_tar_gz(docs: &[ExportedDocument], out: &mut impl Write, path: &Path) -> Result<()> {
    let encoder = GzEncoder::new(out, Compression::default());
    let mut builder = tar::Builder::new(encoder);
    let mtime = chrono::Utc::now().timestamp().max(0) as u64;

    for exported in docs {
        let bytes = exported.doc.to_xml_string()?.into_bytes();
        let mut header = tar::Header::new_gnu();
        header.set_size(bytes.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(mtime);
        header.set_cksum();
        builder
            .append_data(&mut header, format!("{}.xml", exported.file_name), bytes.as_slice())
            .map_err(|e| CollbankError::io_with_path(e, path))?;
    }

    let encoder = builder
        .into_inner()
        .map_err(|e| CollbankError::io_with_path(e, path))?;
    encoder
        .finish()
        .map_err(|e| CollbankError::io_with_path(e, path))?;
    Ok(())
}

fn write_zip(docs: &[ExportedDocument], out: &mut std::fs::File, path: &Path) -> Result<()> {
    let mut writer = zip::ZipWriter::new(out);
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);

    for exported in docs {
        writer
            .start_file(format!("{}.xml", exported.file_name), options)
            .map_err(|e| archive_error(e, path))?;
        writer.write_all(exported.doc.to_xml_string()?.as_bytes())?;
    }
    writer.finish().map_err(|e| archive_error(e, path))?;
    Ok(())
}

/// Write `docs` to `output_path` in the requested format.
///
/// The archive is assembled in a temp file next to the target and moved
/// into place once complete.
pub fn write_archive(docs: &[ExportedDocument], output_path: &Path, format: ArchiveFormat) -> Result<()> {
    let parent = output_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent).map_err(|e| CollbankError::io_with_path(e, parent))?;

    let mut staged = NamedTempFile::new_in(parent).map_err(|e| CollbankError::io_with_path(e, parent))?;
    match format {
        ArchiveFormat::Xml => write_combined_xml(docs, staged.as_file_mut())?,
        ArchiveFormat::TarGz => write_tar_gz(docs, staged.as_file_mut(), output_path)?,
        ArchiveFormat::Zip => write_zip(docs, staged.as_file_mut(), output_path)?,
    }
    staged
        .as_file()
        .sync_all()
        .map_err(|e| CollbankError::io_with_path(e, output_path))?;
    staged
        .persist(output_path)
        .map_err(|e| CollbankError::io_with_path(e.error, output_path))?;
    Ok(())
}

impl CatalogueStore {
    /// Export the given collections into one file.
    ///
    /// Collections that fail to export are logged and listed in
    /// [`BulkExport::skipped`]; an unknown id is an error.
    pub fn export_collections(
        &self,
        ids: &[i64],
        vocab: &Vocabulary,
        codes: &CodeList,
        options: &ExportOptions,
        output_path: &Path,
        format: ArchiveFormat,
    ) -> Result<BulkExport> {
        if ids.is_empty() {
            return Err(CollbankError::validation("collection_ids", "nothing to export"));
        }

        let exporter = CollectionExporter::new(vocab, codes, options);
        let mut docs = Vec::with_capacity(ids.len());
        let mut skipped = Vec::new();
        for &id in ids {
            let coll = self.get_collection(id)?;
            match exporter.export(&coll) {
                Ok(doc) => docs.push(ExportedDocument {
                    file_name: coll.xml_file_name(),
                    doc,
                }),
                Err(e) => {
                    warn!("Leaving collection {} out of bulk export: {}", id, e);
                    skipped.push(id);
                }
            }
        }

        write_archive(&docs, output_path, format)?;
        info!(
            "Exported {} collection(s) to {} ({:?})",
            docs.len(),
            output_path.display(),
            format
        );
        Ok(BulkExport {
            output_path: output_path.to_path_buf(),
            count: docs.len(),
            format,
            skipped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Collection;
    use crate::store::test_support::create_test_store;
    use flate2::read::GzDecoder;
    use std::io::Read;

    fn seed(store: &CatalogueStore) -> Vec<i64> {
        let mut ids = Vec::new();
        for ident in ["ALPHA", "BETA"] {
            let mut coll = Collection {
                identifier: ident.into(),
                titles: vec![format!("{} corpus", ident)],
                ..Default::default()
            };
            ids.push(store.save_collection(&mut coll).unwrap());
        }
        ids
    }

    fn export(store: &CatalogueStore, ids: &[i64], path: &Path, format: ArchiveFormat) -> BulkExport {
        store
            .export_collections(
                ids,
                &Vocabulary::unavailable(),
                &CodeList::default(),
                &ExportOptions::default(),
                path,
                format,
            )
            .unwrap()
    }

    #[test]
    fn test_combined_xml() {
        let (store, temp_dir) = create_test_store();
        let ids = seed(&store);
        let path = temp_dir.path().join("out").join("all.xml");
        let report = export(&store, &ids, &path, ArchiveFormat::Xml);
        assert_eq!(report.count, 2);

        let doc = XmlDocument::parse(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(doc.root.is("CMDs"));
        assert_eq!(doc.root.elements().filter(|e| e.is("CMD")).count(), 2);
    }

    #[test]
    fn test_tar_gz_entries() {
        let (store, temp_dir) = create_test_store();
        let ids = seed(&store);
        let path = temp_dir.path().join("all.tar.gz");
        export(&store, &ids, &path, ArchiveFormat::TarGz);

        let file = std::fs::File::open(&path).unwrap();
        let mut archive = tar::Archive::new(GzDecoder::new(file));
        let mut names = Vec::new();
        for entry in archive.entries().unwrap() {
            let mut entry = entry.unwrap();
            names.push(entry.path().unwrap().display().to_string());
            let mut body = String::new();
            entry.read_to_string(&mut body).unwrap();
            assert!(body.starts_with("<?xml"));
        }
        assert_eq!(
            names,
            vec![
                format!("cbmetadata_{:05}.xml", ids[0]),
                format!("cbmetadata_{:05}.xml", ids[1])
            ]
        );
    }

    #[test]
    fn test_zip_entries() {
        let (store, temp_dir) = create_test_store();
        let ids = seed(&store);
        let path = temp_dir.path().join("all.zip");
        export(&store, &ids, &path, ArchiveFormat::Zip);

        let mut archive = zip::ZipArchive::new(std::fs::File::open(&path).unwrap()).unwrap();
        assert_eq!(archive.len(), 2);
        let mut body = String::new();
        archive.by_index(0).unwrap().read_to_string(&mut body).unwrap();
        assert!(body.contains("<title>ALPHA corpus</title>"));
    }

    #[test]
    fn test_empty_selection_and_unknown_id() {
        let (store, temp_dir) = create_test_store();
        let path = temp_dir.path().join("none.xml");
        let err = store
            .export_collections(
                &[],
                &Vocabulary::unavailable(),
                &CodeList::default(),
                &ExportOptions::default(),
                &path,
                ArchiveFormat::Xml,
            )
            .unwrap_err();
        assert!(matches!(err, CollbankError::Validation { .. }));

        let err = store
            .export_collections(
                &[999],
                &Vocabulary::unavailable(),
                &CodeList::default(),
                &ExportOptions::default(),
                &path,
                ArchiveFormat::Xml,
            )
            .unwrap_err();
        assert!(matches!(err, CollbankError::NotFound { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!(ArchiveFormat::parse("ZIP"), Some(ArchiveFormat::Zip));
        assert_eq!(ArchiveFormat::parse("tar.gz"), Some(ArchiveFormat::TarGz));
        assert_eq!(ArchiveFormat::parse("rar"), None);
    }
}
