use tracing::{error, info, warn};

use crate::auth::Capability;
use crate::editor::FormState;
use crate::error::{CatalogError, Result};
use crate::model::{PlantFields, PlantRecord};
use crate::resolver::{self, SlugIndex};
use crate::store::{Column, RecordStore};

/// Page-level controller: the listing state plus every read and write the
/// listing and detail views make against the record store.
pub struct Catalog {
    store: Box<dyn RecordStore>,
    plants: Vec<PlantRecord>,
    slug_index: Option<SlugIndex>,
}

impl Catalog {
    pub fn new(store: Box<dyn RecordStore>) -> Self {
        Catalog {
            store,
            plants: Vec::new(),
            slug_index: None,
        }
    }

    /// Reload the listing, ordered by name.
    pub async fn refresh(&mut self) -> Result<&[PlantRecord]> {
        let plants = self.store.list(Some(Column::Name)).await.map_err(|e| {
            error!(error = %e, "Failed to fetch plants");
            CatalogError::from(e)
        })?;
        info!("Loaded {} plants", plants.len());
        self.plants = plants;
        Ok(&self.plants)
    }

    pub fn plants(&self) -> &[PlantRecord] {
        &self.plants
    }

    /// Listing entry by id (the listing must have been loaded).
    pub fn plant(&self, id: i64) -> Option<&PlantRecord> {
        self.plants.iter().find(|p| p.id == id)
    }

    /// Detail view lookup. Store trouble surfaces as `NotFound`.
    pub async fn find(&mut self, slug: &str) -> Result<PlantRecord> {
        resolver::resolve(self.store.as_ref(), slug, &mut self.slug_index)
            .await
            .ok_or_else(|| CatalogError::NotFound(slug.to_string()))
    }

    pub async fn create(&mut self, _admin: &Capability, form: FormState) -> Result<PlantRecord> {
        form.validate()?;
        let fields = form.into_fields();
        self.ensure_unique_slug(&fields, None).await?;

        let created = self.store.insert(&fields).await.map_err(|e| {
            error!(name = %fields.name, error = %e, "Failed to add plant");
            CatalogError::from(e)
        })?;
        self.slug_index = None;
        self.plants.push(created.clone());
        Ok(created)
    }

    pub async fn update(
        &mut self,
        _admin: &Capability,
        id: i64,
        form: FormState,
    ) -> Result<PlantRecord> {
        form.validate()?;
        let fields = form.into_fields();
        self.ensure_unique_slug(&fields, Some(id)).await?;

        let updated = self.store.update(id, &fields).await.map_err(|e| {
            error!(id, error = %e, "Failed to update plant");
            CatalogError::from(e)
        })?;
        self.slug_index = None;
        match self.plants.iter_mut().find(|p| p.id == id) {
            Some(slot) => *slot = updated.clone(),
            None => self.plants.push(updated.clone()),
        }
        Ok(updated)
    }

    pub async fn delete(&mut self, _admin: &Capability, id: i64) -> Result<()> {
        self.store.delete(id).await.map_err(|e| {
            error!(id, error = %e, "Failed to delete plant");
            CatalogError::from(e)
        })?;
        self.slug_index = None;
        self.plants.retain(|p| p.id != id);
        info!(id, "Deleted plant");
        Ok(())
    }

    /// Reject a write whose name would share a slug with another record.
    ///
    /// An update that keeps the record's current slug always passes, so
    /// records that already collide can still be edited.
    async fn ensure_unique_slug(&self, fields: &PlantFields, own_id: Option<i64>) -> Result<()> {
        let slug = fields.slug();
        let existing = self.store.list(Some(Column::Id)).await?;
        if existing
            .iter()
            .any(|p| Some(p.id) == own_id && p.slug() == slug)
        {
            return Ok(());
        }
        if let Some(other) = existing
            .iter()
            .find(|p| Some(p.id) != own_id && p.slug() == slug)
        {
            warn!(slug = %slug, existing_id = other.id, "Slug already taken");
            return Err(CatalogError::SlugConflict {
                slug,
                existing_id: other.id,
            });
        }
        Ok(())
    }
}
