//! One-time data migrations run before serving traffic.
//!
//! Every step is idempotent and rewrites collections without touching
//! `updated_at`.

use crate::error::Result;
use crate::store::CatalogueStore;
use crate::vocabulary::Vocabulary;
use serde::Serialize;
use tracing::info;

/// Counts reported by [`run_startup_migrations`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    /// Annotations whose format list was seeded from the legacy value.
    pub formats_materialized: usize,
    /// Resources whose legacy type was split into DCtype and subtype.
    pub types_split: usize,
    /// Blank resources, provenances and projects removed.
    pub blank_entries_pruned: usize,
    /// Collections written back.
    pub collections_rewritten: usize,
}

impl MigrationReport {
    pub fn is_noop(&self) -> bool {
        self.collections_rewritten == 0
    }
}

/// Run all startup migrations over every stored collection.
pub fn run_startup_migrations(store: &CatalogueStore, vocab: &Vocabulary) -> Result<MigrationReport> {
    let mut report = MigrationReport::default();

    for mut coll in store.all_collections()? {
        let mut dirty = false;

        for resource in &mut coll.resources {
            for annotation in &mut resource.annotations {
                if annotation.materialize_formats() {
                    report.formats_materialized += 1;
                    dirty = true;
                }
            }
            if resource.split_legacy_type(vocab) {
                report.types_split += 1;
                dirty = true;
            }
        }

        let pruned = coll.prune_blank();
        if pruned > 0 {
            report.blank_entries_pruned += pruned;
            dirty = true;
        }

        if dirty {
            store.rewrite_collection(&mut coll)?;
            report.collections_rewritten += 1;
        }
    }

    info!(
        "Startup migrations: {} formats materialized, {} types split, {} blank entries pruned, {} collections rewritten",
        report.formats_materialized,
        report.types_split,
        report.blank_entries_pruned,
        report.collections_rewritten
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Annotation, Collection, Resource};
    use crate::store::test_support::create_test_store;
    use crate::vocabulary::{keys, FieldChoice};

    fn vocab() -> Vocabulary {
        Vocabulary::from_choices([(1, "text"), (2, "text: corpus")].iter().map(|(mv, label)| {
            FieldChoice {
                field: keys::RESOURCE_TYPE.into(),
                machine_value: *mv,
                english_name: (*label).into(),
                dutch_name: String::new(),
            }
        }))
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let (store, _temp_dir) = create_test_store();
        let mut coll = Collection {
            identifier: "OLD".into(),
            resources: vec![
                Resource {
                    type_mv: Some(2),
                    annotations: vec![Annotation {
                        legacy_format: Some(4),
                        ..Default::default()
                    }],
                    ..Default::default()
                },
                Resource::default(),
            ],
            ..Default::default()
        };
        let id = store.save_collection(&mut coll).unwrap();
        let stamped = coll.updated_at;

        let first = run_startup_migrations(&store, &vocab()).unwrap();
        assert_eq!(first.formats_materialized, 1);
        assert_eq!(first.types_split, 1);
        assert_eq!(first.blank_entries_pruned, 1);
        assert_eq!(first.collections_rewritten, 1);

        let migrated = store.get_collection(id).unwrap();
        assert_eq!(migrated.resources.len(), 1);
        assert_eq!(migrated.resources[0].dc_type, Some(1));
        assert_eq!(migrated.resources[0].subtype, Some(2));
        assert_eq!(migrated.resources[0].annotations[0].formats, vec![4]);
        assert_eq!(migrated.updated_at, stamped);

        let second = run_startup_migrations(&store, &vocab()).unwrap();
        assert!(second.is_noop());
    }
}
