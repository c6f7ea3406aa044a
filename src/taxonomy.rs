use serde::{Deserialize, Deserializer, Serialize};

pub const CLADE_SEPARATOR: &str = ", ";
pub const CLADE_CHAIN_SEPARATOR: &str = " → ";

/// Clade ancestry as it shows up at the boundaries: either the comma-separated
/// text a person typed or the ordered root-to-specific list that gets stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Clade {
    Parsed(Vec<String>),
    Raw(String),
}

impl Default for Clade {
    fn default() -> Self {
        Clade::Parsed(Vec::new())
    }
}

impl Clade {
    pub fn editable(&self) -> String {
        to_editable_clade(self)
    }

    pub fn into_stored(self) -> Vec<String> {
        to_stored_clade(self)
    }
}

/// Text shown in the clade field of the editor.
pub fn to_editable_clade(clade: &Clade) -> String {
    match clade {
        Clade::Parsed(terms) => terms.join(CLADE_SEPARATOR),
        Clade::Raw(text) => text.clone(),
    }
}

/// Ordered list written to the store. Lists pass through untouched.
pub fn to_stored_clade(clade: Clade) -> Vec<String> {
    match clade {
        Clade::Parsed(terms) => terms,
        Clade::Raw(text) => split_clade(&text),
    }
}

/// Split on `,`, trim each term and drop the empty ones.
pub fn split_clade(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(str::to_string)
        .collect()
}

/// Deserialize a stored clade column, treating `null` as an empty list.
pub fn deserialize_nullable<'de, D>(deserializer: D) -> Result<Clade, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Clade>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn terms(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn split_drops_blank_segments() {
        assert!(split_clade("").is_empty());
        assert!(split_clade(" , ,").is_empty());
        assert_eq!(split_clade("a,  b ,,c"), terms(&["a", "b", "c"]));
        assert_eq!(split_clade("Angiosperms, Eudicots,"), terms(&["Angiosperms", "Eudicots"]));
    }

    #[test]
    fn editable_joins_lists_and_passes_raw_text() {
        let parsed = Clade::Parsed(terms(&["Angiosperms", "Eudicots", "Rosids"]));
        assert_eq!(parsed.editable(), "Angiosperms, Eudicots, Rosids");

        let raw = Clade::Raw("Angiosperms,Monocots ".into());
        assert_eq!(raw.editable(), "Angiosperms,Monocots ");
    }

    #[test]
    fn stored_list_is_returned_as_is() {
        let list = terms(&["Tracheophytes", " odd spacing ", ""]);
        assert_eq!(to_stored_clade(Clade::Parsed(list.clone())), list);
    }

    #[test]
    fn round_trip_through_editor_text() {
        for list in [
            terms(&[]),
            terms(&["Angiosperms"]),
            terms(&["Tracheophytes", "Angiosperms", "Eudicots", "Rosids"]),
            terms(&["Angiosperms", "Commelinids", "Poales grasses"]),
        ] {
            let text = to_editable_clade(&Clade::Parsed(list.clone()));
            assert_eq!(to_stored_clade(Clade::Raw(text)), list);
        }
    }

    #[test]
    fn stored_column_accepts_list_text_or_null() {
        #[derive(Deserialize)]
        struct Row {
            #[serde(deserialize_with = "deserialize_nullable")]
            clade: Clade,
        }

        let list: Row = serde_json::from_str(r#"{"clade":["Angiosperms","Eudicots"]}"#).unwrap();
        assert_eq!(list.clade, Clade::Parsed(terms(&["Angiosperms", "Eudicots"])));

        let raw: Row = serde_json::from_str(r#"{"clade":"Angiosperms, Eudicots"}"#).unwrap();
        assert_eq!(raw.clade, Clade::Raw("Angiosperms, Eudicots".into()));

        let null: Row = serde_json::from_str(r#"{"clade":null}"#).unwrap();
        assert_eq!(null.clade, Clade::default());
    }
}
