use serde::Serialize;

use crate::slug::slugify;

pub const DEFAULT_KINGDOM: &str = "Plantae";

/// A catalog entry as the rest of the program sees it.
///
/// The clade is always the structured list here; raw text from legacy rows is
/// split when the row is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlantRecord {
    pub id: i64,
    pub name: String,
    pub scientific_name: String,
    pub description: String,
    pub kingdom: String,
    pub clade: Vec<String>,
    pub order: String,
    pub family: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subfamily: Option<String>,
    pub genus: String,
    pub species: String,
    pub image: String,
}

impl PlantRecord {
    pub fn slug(&self) -> String {
        slugify(&self.name)
    }
}

/// Everything an insert or update writes. `subfamily` is display-only and
/// never part of a write.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlantFields {
    pub name: String,
    pub scientific_name: String,
    pub description: String,
    pub kingdom: String,
    pub clade: Vec<String>,
    pub order: String,
    pub family: String,
    pub genus: String,
    pub species: String,
    pub image: String,
}

impl PlantFields {
    pub fn slug(&self) -> String {
        slugify(&self.name)
    }
}
