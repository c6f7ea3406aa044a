pub mod postgrest;
pub mod sqlite;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::StoreError;
use crate::model::{PlantFields, PlantRecord};
use crate::taxonomy::{self, Clade};

pub use postgrest::PostgrestStore;
pub use sqlite::SqliteStore;

pub const PLANTS_TABLE: &str = "plants";

/// Columns the catalog filters or orders by, under their storage names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Id,
    Name,
}

impl Column {
    pub fn as_str(self) -> &'static str {
        match self {
            Column::Id => "id",
            Column::Name => "name",
        }
    }
}

/// The persistence service behind the catalog, limited to the plants table.
///
/// Every call is a single remote operation: it either applies fully or fails.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn list(&self, order_by: Option<Column>) -> Result<Vec<PlantRecord>, StoreError>;

    /// First record (lowest id) whose `column` equals `pattern` ignoring case.
    async fn filter_one(
        &self,
        column: Column,
        pattern: &str,
    ) -> Result<Option<PlantRecord>, StoreError>;

    async fn insert(&self, plant: &PlantFields) -> Result<PlantRecord, StoreError>;

    async fn update(&self, id: i64, plant: &PlantFields) -> Result<PlantRecord, StoreError>;

    async fn delete(&self, id: i64) -> Result<(), StoreError>;
}

// ── Storage row shape ──

/// A plants row under its external (snake-case) keys.
#[derive(Debug, Clone, Deserialize)]
pub struct PlantRow {
    pub id: i64,
    #[serde(default, deserialize_with = "nullable_string")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub scientific_name: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub description: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub kingdom: String,
    #[serde(default, deserialize_with = "taxonomy::deserialize_nullable")]
    pub clade: Clade,
    #[serde(default, deserialize_with = "nullable_string")]
    pub order: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub family: String,
    #[serde(default)]
    pub subfamily: Option<String>,
    #[serde(default, deserialize_with = "nullable_string")]
    pub genus: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub species: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub image: String,
}

impl From<PlantRow> for PlantRecord {
    fn from(row: PlantRow) -> Self {
        PlantRecord {
            id: row.id,
            name: row.name,
            scientific_name: row.scientific_name,
            description: row.description,
            kingdom: row.kingdom,
            clade: row.clade.into_stored(),
            order: row.order,
            family: row.family,
            subfamily: row.subfamily.filter(|s| !s.trim().is_empty()),
            genus: row.genus,
            species: row.species,
            image: row.image,
        }
    }
}

/// Body of an insert or update, under the external keys.
#[derive(Debug, Serialize)]
pub struct PlantWrite<'a> {
    pub name: &'a str,
    pub scientific_name: &'a str,
    pub description: &'a str,
    pub kingdom: &'a str,
    pub clade: &'a [String],
    pub order: &'a str,
    pub family: &'a str,
    pub genus: &'a str,
    pub species: &'a str,
    pub image: &'a str,
}

impl<'a> From<&'a PlantFields> for PlantWrite<'a> {
    fn from(p: &'a PlantFields) -> Self {
        PlantWrite {
            name: &p.name,
            scientific_name: &p.scientific_name,
            description: &p.description,
            kingdom: &p.kingdom,
            clade: &p.clade,
            order: &p.order,
            family: &p.family,
            genus: &p.genus,
            species: &p.species,
            image: &p.image,
        }
    }
}

fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Escape `LIKE` wildcards so a pattern only matches itself.
pub fn escape_like(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
pub mod testing {
    use super::*;

    /// A store whose every call fails, standing in for a backend outage.
    pub struct UnavailableStore;

    fn outage() -> StoreError {
        StoreError::Status {
            status: 503,
            body: "service unavailable".into(),
        }
    }

    #[async_trait]
    impl RecordStore for UnavailableStore {
        async fn list(&self, _: Option<Column>) -> Result<Vec<PlantRecord>, StoreError> {
            Err(outage())
        }

        async fn filter_one(&self, _: Column, _: &str) -> Result<Option<PlantRecord>, StoreError> {
            Err(outage())
        }

        async fn insert(&self, _: &PlantFields) -> Result<PlantRecord, StoreError> {
            Err(outage())
        }

        async fn update(&self, _: i64, _: &PlantFields) -> Result<PlantRecord, StoreError> {
            Err(outage())
        }

        async fn delete(&self, _: i64) -> Result<(), StoreError> {
            Err(outage())
        }
    }

    pub fn fields(name: &str) -> PlantFields {
        PlantFields {
            name: name.to_string(),
            scientific_name: format!("{} scientifica", name),
            description: format!("About {}.", name),
            kingdom: "Plantae".into(),
            clade: vec!["Tracheophytes".into(), "Angiosperms".into()],
            order: "Lamiales".into(),
            family: "Lamiaceae".into(),
            genus: "Ocimum".into(),
            species: "O. tenuiflorum".into(),
            image: format!("https://res.cloudinary.com/demo/{}.jpg", name.len()),
        }
    }
}
