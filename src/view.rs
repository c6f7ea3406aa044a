use crate::model::PlantRecord;
use crate::slug::plant_path;
use crate::taxonomy::CLADE_CHAIN_SEPARATOR;

const PREVIEW_CHARS: usize = 100;

pub fn render_listing(plants: &[PlantRecord]) -> String {
    if plants.is_empty() {
        return "No plants found. Add your first plant to get started!\n".to_string();
    }

    let mut out = format!(
        "{:>4} | {:<24} | {:<28} | {:<32}\n",
        "#", "Plant", "Scientific name", "Link"
    );
    out.push_str(&format!("{}\n", "-".repeat(98)));
    for p in plants {
        out.push_str(&format!(
            "{:>4} | {:<24} | {:<28} | {:<32}\n",
            p.id,
            truncate(&p.name, 24),
            truncate(&p.scientific_name, 28),
            plant_path(&p.name)
        ));
        out.push_str(&format!("     | {}\n", preview(&p.description)));
    }
    out.push_str(&format!("\n{} plants\n", plants.len()));
    out
}

pub fn render_detail(plant: &PlantRecord) -> String {
    let image = if plant.image.is_empty() {
        "(no image)"
    } else {
        plant.image.as_str()
    };
    let mut out = format!(
        "{}\n{}\nImage: {}\n\nDescription\n{}\n\nTaxonomy\n",
        plant.name, plant.scientific_name, image, plant.description
    );

    let clades = plant.clade.join(CLADE_CHAIN_SEPARATOR);
    let rows = [
        ("Kingdom", Some(plant.kingdom.as_str())),
        ("Clades", Some(clades.as_str()).filter(|c| !c.is_empty())),
        ("Order", Some(plant.order.as_str())),
        ("Family", Some(plant.family.as_str())),
        ("Subfamily", plant.subfamily.as_deref()),
        ("Genus", Some(plant.genus.as_str())),
        ("Species", Some(plant.species.as_str())),
    ];
    for (label, value) in rows {
        if let Some(value) = value {
            out.push_str(&format!("  {:<11}{}\n", format!("{}:", label), value));
        }
    }
    out
}

pub fn render_not_found() -> String {
    "Plant Not Found\nSorry, we could not find information about this plant.\nBack to Plants List: /\n"
        .to_string()
}

fn preview(description: &str) -> String {
    let head: String = description.chars().take(PREVIEW_CHARS).collect();
    format!("{}...", head)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}
