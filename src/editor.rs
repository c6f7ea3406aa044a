use tracing::info;

use crate::auth::Capability;
use crate::catalog::Catalog;
use crate::error::{CatalogError, Result};
use crate::model::{PlantFields, PlantRecord, DEFAULT_KINGDOM};
use crate::taxonomy::{split_clade, to_stored_clade, Clade};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Name,
    ScientificName,
    Description,
    Kingdom,
    Clade,
    Order,
    Family,
    Genus,
    Species,
    Image,
}

/// Editable copy of a plant, alive only while the add/edit form is open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState {
    pub name: String,
    pub scientific_name: String,
    pub description: String,
    pub kingdom: String,
    pub clade: Clade,
    pub order: String,
    pub family: String,
    pub genus: String,
    pub species: String,
    pub image: String,
}

impl Default for FormState {
    fn default() -> Self {
        FormState {
            name: String::new(),
            scientific_name: String::new(),
            description: String::new(),
            kingdom: DEFAULT_KINGDOM.to_string(),
            clade: Clade::Raw(String::new()),
            order: String::new(),
            family: String::new(),
            genus: String::new(),
            species: String::new(),
            image: String::new(),
        }
    }
}

impl FormState {
    /// Load a record for editing; the clade becomes the comma-joined text.
    pub fn from_record(record: &PlantRecord) -> Self {
        FormState {
            name: record.name.clone(),
            scientific_name: record.scientific_name.clone(),
            description: record.description.clone(),
            kingdom: record.kingdom.clone(),
            clade: Clade::Raw(Clade::Parsed(record.clade.clone()).editable()),
            order: record.order.clone(),
            family: record.family.clone(),
            genus: record.genus.clone(),
            species: record.species.clone(),
            image: record.image.clone(),
        }
    }

    /// Apply one keystroke-level change. Clade text is split immediately.
    pub fn set(&mut self, field: FormField, value: &str) {
        let value = value.to_string();
        match field {
            FormField::Name => self.name = value,
            FormField::ScientificName => self.scientific_name = value,
            FormField::Description => self.description = value,
            FormField::Kingdom => self.kingdom = value,
            FormField::Clade => self.clade = Clade::Parsed(split_clade(&value)),
            FormField::Order => self.order = value,
            FormField::Family => self.family = value,
            FormField::Genus => self.genus = value,
            FormField::Species => self.species = value,
            FormField::Image => self.image = value,
        }
    }

    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("name", &self.name),
            ("scientific name", &self.scientific_name),
            ("description", &self.description),
            ("image", &self.image),
        ]
        .into_iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(k, _)| k)
        .collect()
    }

    pub fn validate(&self) -> Result<()> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(CatalogError::ValidationFailed { missing })
        }
    }

    pub fn into_fields(self) -> PlantFields {
        PlantFields {
            name: self.name,
            scientific_name: self.scientific_name,
            description: self.description,
            kingdom: self.kingdom,
            clade: to_stored_clade(self.clade),
            order: self.order,
            family: self.family,
            genus: self.genus,
            species: self.species,
            image: self.image,
        }
    }
}

/// The add/edit form: which record (if any) is being edited and its state.
#[derive(Debug, Default)]
pub struct Editor {
    pub editing: Option<i64>,
    pub form: FormState,
}

impl Editor {
    /// Open the form for a new plant, dropping any edit in progress.
    pub fn start_add(&mut self) {
        self.editing = None;
        self.form = FormState::default();
    }

    pub fn start_edit(&mut self, record: &PlantRecord) {
        self.editing = Some(record.id);
        self.form = FormState::from_record(record);
    }

    /// Send the form to the catalog. The form resets only on success.
    pub async fn submit(&mut self, catalog: &mut Catalog, admin: &Capability) -> Result<PlantRecord> {
        let form = self.form.clone();
        let saved = match self.editing {
            Some(id) => catalog.update(admin, id, form).await?,
            None => catalog.create(admin, form).await?,
        };
        info!(id = saved.id, name = %saved.name, "Saved plant");
        self.start_add();
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record() -> PlantRecord {
        PlantRecord {
            id: 3,
            name: "Tulsi".into(),
            scientific_name: "Ocimum tenuiflorum".into(),
            description: "Sacred basil.".into(),
            kingdom: "Plantae".into(),
            clade: vec!["Tracheophytes".into(), "Angiosperms".into(), "Eudicots".into()],
            order: "Lamiales".into(),
            family: "Lamiaceae".into(),
            subfamily: Some("Nepetoideae".into()),
            genus: "Ocimum".into(),
            species: "O. tenuiflorum".into(),
            image: "https://res.cloudinary.com/demo/tulsi.jpg".into(),
        }
    }

    #[test]
    fn empty_form_defaults_kingdom() {
        let form = FormState::default();
        assert_eq!(form.kingdom, "Plantae");
        assert_eq!(form.clade.editable(), "");
    }

    #[test]
    fn loading_a_record_joins_the_clade() {
        let form = FormState::from_record(&record());
        assert_eq!(form.clade, Clade::Raw("Tracheophytes, Angiosperms, Eudicots".into()));
    }

    #[test]
    fn editing_the_clade_splits_eagerly() {
        let mut form = FormState::default();
        form.set(FormField::Clade, "Angiosperms,  Monocots ,,");
        assert_eq!(
            form.clade,
            Clade::Parsed(vec!["Angiosperms".into(), "Monocots".into()])
        );
    }

    #[test]
    fn load_then_save_keeps_the_clade() {
        let original = record();
        let fields = FormState::from_record(&original).into_fields();
        assert_eq!(fields.clade, original.clade);
        assert_eq!(fields.name, original.name);
    }

    #[test]
    fn validation_lists_missing_required_fields() {
        let mut form = FormState::default();
        form.set(FormField::Name, "Tulsi");
        form.set(FormField::Description, "   ");
        match form.validate() {
            Err(CatalogError::ValidationFailed { missing }) => {
                assert_eq!(missing, vec!["scientific name", "description", "image"]);
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn start_add_discards_an_edit() {
        let mut editor = Editor::default();
        editor.start_edit(&record());
        assert_eq!(editor.editing, Some(3));

        editor.start_add();
        assert_eq!(editor.editing, None);
        assert_eq!(&editor.form, &FormState::default());
    }
}
