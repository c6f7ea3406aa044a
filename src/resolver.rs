use std::collections::HashMap;

use tracing::{debug, warn};

use crate::error::StoreError;
use crate::model::PlantRecord;
use crate::slug::{candidate_name, decode_slug, slugify};
use crate::store::{Column, RecordStore};

/// Slug → record lookup table built from a full scan.
///
/// When two names slugify identically the record seen first (lowest id, as
/// scans are id-ordered) keeps the slug.
#[derive(Debug, Default)]
pub struct SlugIndex {
    by_slug: HashMap<String, PlantRecord>,
}

impl SlugIndex {
    pub fn build(records: impl IntoIterator<Item = PlantRecord>) -> Self {
        let mut by_slug = HashMap::new();
        for record in records {
            by_slug.entry(record.slug()).or_insert(record);
        }
        SlugIndex { by_slug }
    }

    pub fn get(&self, slug: &str) -> Option<&PlantRecord> {
        self.by_slug.get(slug)
    }

    pub fn len(&self) -> usize {
        self.by_slug.len()
    }
}

/// Phase 1: case-insensitive lookup of the de-slugged name.
///
/// The store's answer is only trusted when the name equals the candidate
/// ignoring case and its own slug is the one requested. Collapsing hyphen
/// runs is lossy, so `neem--tree` must not land on "Neem Tree".
pub async fn direct_match(
    store: &dyn RecordStore,
    requested: &str,
) -> Result<Option<PlantRecord>, StoreError> {
    let candidate = candidate_name(requested);
    let wanted = slugify(&decode_slug(requested));
    let hit = store.filter_one(Column::Name, &candidate).await?;
    Ok(hit.filter(|r| r.name.to_lowercase() == candidate.to_lowercase() && r.slug() == wanted))
}

/// Resolve a requested slug to at most one record.
///
/// Never fails: store errors are logged and read as "no match". Phase 2 uses
/// `index` when present and fills it from a full scan otherwise.
pub async fn resolve(
    store: &dyn RecordStore,
    requested: &str,
    index: &mut Option<SlugIndex>,
) -> Option<PlantRecord> {
    match direct_match(store, requested).await {
        Ok(Some(record)) => {
            debug!(slug = requested, id = record.id, "Resolved by name lookup");
            return Some(record);
        }
        Ok(None) => {}
        Err(e) => {
            warn!(slug = requested, error = %e, "Name lookup failed");
            return None;
        }
    }

    if index.is_none() {
        match store.list(Some(Column::Id)).await {
            Ok(records) => {
                let built = SlugIndex::build(records);
                debug!(entries = built.len(), "Built slug index");
                *index = Some(built);
            }
            Err(e) => {
                warn!(slug = requested, error = %e, "Fallback scan failed");
                return None;
            }
        }
    }

    let found = index.as_ref().and_then(|idx| idx.get(requested)).cloned();
    match &found {
        Some(record) => debug!(slug = requested, id = record.id, "Resolved by slug scan"),
        None => debug!(slug = requested, "No plant for slug"),
    }
    found
}
