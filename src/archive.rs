use anyhow::{anyhow, Result};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::logging::{log, obj, v_num, v_str, Domain, Level};
use crate::measurements::Measurements;
use crate::render::ViewModel;
use crate::species::Species;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Specimen {
    pub id: i64,
    pub ts_ms: u64,
    pub input: Measurements,
    pub species: Species,
    pub confidence: f64,
}

/// Archived specimens, one row per "save".
pub struct SpecimenStore {
    conn: Connection,
}

impl SpecimenStore {
    pub fn new(path: &str) -> Result<Self> {
        Ok(Self { conn: Connection::open(path)? })
    }

    pub fn in_memory() -> Result<Self> {
        Ok(Self { conn: Connection::open_in_memory()? })
    }

    pub fn init(&mut self) -> Result<()> {
        self.conn.execute_batch(
            "BEGIN;
            CREATE TABLE IF NOT EXISTS specimens (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ts INTEGER NOT NULL,
                sepal_length REAL NOT NULL,
                sepal_width REAL NOT NULL,
                petal_length REAL NOT NULL,
                petal_width REAL NOT NULL,
                species TEXT NOT NULL,
                confidence REAL NOT NULL
            );
            COMMIT;",
        )?;
        Ok(())
    }

    /// Archives the view currently on screen. Returns the new row id.
    pub fn save(&mut self, ts_ms: u64, view: &ViewModel) -> Result<i64> {
        let m = view.input;
        let confidence = view.probabilities.get(view.species);
        self.conn.execute(
            "INSERT INTO specimens (ts, sepal_length, sepal_width, petal_length, petal_width, species, confidence)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                ts_ms as i64,
                m.sepal_length,
                m.sepal_width,
                m.petal_length,
                m.petal_width,
                view.species.short_name(),
                confidence
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        log(
            Level::Info,
            Domain::Archive,
            "saved",
            obj(&[
                ("id", json!(id)),
                ("species", v_str(view.species.short_name())),
                ("confidence", v_num(confidence)),
            ]),
        );
        Ok(id)
    }

    /// Most recent specimens first.
    pub fn recent(&self, limit: usize) -> Result<Vec<Specimen>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, ts, sepal_length, sepal_width, petal_length, petal_width, species, confidence
             FROM specimens ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                Measurements {
                    sepal_length: row.get(2)?,
                    sepal_width: row.get(3)?,
                    petal_length: row.get(4)?,
                    petal_width: row.get(5)?,
                },
                row.get::<_, String>(6)?,
                row.get::<_, f64>(7)?,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (id, ts, input, species, confidence) = row?;
            let species = Species::from_label(&species)
                .map_err(|e| anyhow!("specimen {}: {}", id, e))?;
            out.push(Specimen {
                id,
                ts_ms: ts as u64,
                input,
                species,
                confidence,
            });
        }
        Ok(out)
    }

    pub fn count(&self) -> Result<u64> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM specimens", [], |row| row.get(0))?;
        Ok(n as u64)
    }
}
