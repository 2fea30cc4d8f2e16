//! Vocabulary and code list snapshots.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::error::{CollbankError, Result};
use crate::vocabulary::{Choice, ChoicePosition, CodeList, ImportSummary, Vocabulary};
use crate::CollbankApi;

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| CollbankError::io_with_path(e, path))
}

impl CollbankApi {
    /// Current vocabulary snapshot.
    pub async fn vocabulary(&self) -> Arc<Vocabulary> {
        self.vocab.read().await.clone()
    }

    /// Current ISO code list snapshot.
    pub async fn codes(&self) -> Arc<CodeList> {
        self.codes.read().await.clone()
    }

    pub async fn get_choice_list(&self, field: &str, position: &ChoicePosition) -> Vec<Choice> {
        self.vocabulary().await.build_choice_list(field, position)
    }

    /// Import a vocabulary fixture and swap in the rebuilt vocabulary.
    pub async fn import_vocabulary(&self, path: &Path) -> Result<ImportSummary> {
        let summary = self.store.import_fixture(&read_text(path)?)?;
        let rebuilt = Arc::new(Vocabulary::load(&self.store));
        info!("Vocabulary reloaded with {} rows", rebuilt.len());
        *self.vocab.write().await = rebuilt;
        Ok(summary)
    }

    /// Import an ISO code list file and swap in the rebuilt lists.
    pub async fn import_code_list(&self, path: &Path) -> Result<usize> {
        let count = self.store.import_code_list(&read_text(path)?)?;
        let rebuilt = Arc::new(self.store.code_list()?);
        *self.codes.write().await = rebuilt;
        Ok(count)
    }
}
