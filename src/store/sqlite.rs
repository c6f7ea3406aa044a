use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use super::{escape_like, Column, PlantRow, RecordStore, PLANTS_TABLE};
use crate::error::StoreError;
use crate::model::{PlantFields, PlantRecord};
use crate::taxonomy::Clade;

const SELECT_COLUMNS: &str = "id, name, scientific_name, description, kingdom, clade, \"order\", \
                              family, subfamily, genus, species, image";

/// Local record store backed by a single SQLite file.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::with_schema(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_schema(Connection::open_in_memory()?)
    }

    fn with_schema(conn: Connection) -> Result<Self, StoreError> {
        init_schema(&conn)?;
        Ok(SqliteStore {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn fetch_by_id(conn: &Connection, id: i64) -> Result<PlantRecord, StoreError> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM {PLANTS_TABLE} WHERE id = ?1");
        conn.query_row(&sql, [id], read_row)
            .optional()?
            .map(PlantRecord::from)
            .ok_or(StoreError::MissingRow(id))
    }
}

pub fn init_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS plants (
            id              INTEGER PRIMARY KEY,
            name            TEXT NOT NULL,
            scientific_name TEXT NOT NULL DEFAULT '',
            description     TEXT NOT NULL DEFAULT '',
            kingdom         TEXT NOT NULL DEFAULT '',
            clade           TEXT NOT NULL DEFAULT '[]',
            \"order\"         TEXT NOT NULL DEFAULT '',
            family          TEXT NOT NULL DEFAULT '',
            subfamily       TEXT,
            genus           TEXT NOT NULL DEFAULT '',
            species         TEXT NOT NULL DEFAULT '',
            image           TEXT NOT NULL DEFAULT '',
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_plants_name ON plants(name COLLATE NOCASE);
        ",
    )?;
    Ok(())
}

/// Map a row selected with `SELECT_COLUMNS`.
///
/// `clade` holds a JSON array; anything else in that column is legacy free
/// text and comes back as `Clade::Raw`.
fn read_row(row: &rusqlite::Row) -> rusqlite::Result<PlantRow> {
    let clade_text: Option<String> = row.get(5)?;
    let clade = match clade_text {
        None => Clade::default(),
        Some(text) => serde_json::from_str::<Clade>(&text).unwrap_or(Clade::Raw(text)),
    };
    Ok(PlantRow {
        id: row.get(0)?,
        name: row.get(1)?,
        scientific_name: row.get(2)?,
        description: row.get(3)?,
        kingdom: row.get(4)?,
        clade,
        order: row.get(6)?,
        family: row.get(7)?,
        subfamily: row.get(8)?,
        genus: row.get(9)?,
        species: row.get(10)?,
        image: row.get(11)?,
    })
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn list(&self, order_by: Option<Column>) -> Result<Vec<PlantRecord>, StoreError> {
        let sql = match order_by {
            Some(col) => format!(
                "SELECT {SELECT_COLUMNS} FROM {PLANTS_TABLE} ORDER BY {}, id",
                col.as_str()
            ),
            None => format!("SELECT {SELECT_COLUMNS} FROM {PLANTS_TABLE}"),
        };
        let conn = self.conn();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], read_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows.into_iter().map(PlantRecord::from).collect())
    }

    async fn filter_one(
        &self,
        column: Column,
        pattern: &str,
    ) -> Result<Option<PlantRecord>, StoreError> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM {PLANTS_TABLE}
             WHERE {} LIKE ?1 ESCAPE '\\'
             ORDER BY id LIMIT 1",
            column.as_str()
        );
        let conn = self.conn();
        let row = conn
            .query_row(&sql, [escape_like(pattern)], read_row)
            .optional()?;
        Ok(row.map(PlantRecord::from))
    }

    async fn insert(&self, plant: &PlantFields) -> Result<PlantRecord, StoreError> {
        let clade = serde_json::to_string(&plant.clade)?;
        let conn = self.conn();
        conn.execute(
            "INSERT INTO plants
             (name, scientific_name, description, kingdom, clade, \"order\", family, genus, species, image)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                plant.name, plant.scientific_name, plant.description, plant.kingdom, clade,
                plant.order, plant.family, plant.genus, plant.species, plant.image,
            ],
        )?;
        Self::fetch_by_id(&conn, conn.last_insert_rowid())
    }

    async fn update(&self, id: i64, plant: &PlantFields) -> Result<PlantRecord, StoreError> {
        let clade = serde_json::to_string(&plant.clade)?;
        let conn = self.conn();
        let changed = conn.execute(
            "UPDATE plants SET
                name = ?1, scientific_name = ?2, description = ?3, kingdom = ?4, clade = ?5,
                \"order\" = ?6, family = ?7, genus = ?8, species = ?9, image = ?10
             WHERE id = ?11",
            params![
                plant.name, plant.scientific_name, plant.description, plant.kingdom, clade,
                plant.order, plant.family, plant.genus, plant.species, plant.image, id,
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::MissingRow(id));
        }
        Self::fetch_by_id(&conn, id)
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        self.conn()
            .execute("DELETE FROM plants WHERE id = ?1", [id])?;
        Ok(())
    }
}
