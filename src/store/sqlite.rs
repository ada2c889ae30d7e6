//! SQLite-backed row store

use std::path::{Path, PathBuf};

use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{Connection, params_from_iter};
use serde_json::Value;

use super::{Filter, Order, Row, RowStore, StoreError, Table};

const SCHEMA: &str = "
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS dictionaries (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL DEFAULT '',
    description TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS dictionary_entries (
    id TEXT PRIMARY KEY,
    dictionary_id TEXT NOT NULL REFERENCES dictionaries(id) ON DELETE CASCADE,
    word TEXT NOT NULL,
    ipa TEXT NOT NULL DEFAULT '',
    origin TEXT NOT NULL DEFAULT '',
    audio_url TEXT,
    color_combo INTEGER NOT NULL DEFAULT 1,
    position INTEGER NOT NULL DEFAULT 0,
    slug TEXT
);

CREATE TABLE IF NOT EXISTS definitions (
    id TEXT PRIMARY KEY,
    entry_id TEXT NOT NULL REFERENCES dictionary_entries(id) ON DELETE CASCADE,
    grammatical_class TEXT NOT NULL DEFAULT '',
    meaning TEXT NOT NULL DEFAULT '',
    example TEXT,
    position INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS dictionary_translations (
    dictionary_id TEXT NOT NULL REFERENCES dictionaries(id) ON DELETE CASCADE,
    language TEXT NOT NULL,
    title TEXT,
    description TEXT,
    PRIMARY KEY (dictionary_id, language)
);

CREATE TABLE IF NOT EXISTS entry_translations (
    entry_id TEXT NOT NULL REFERENCES dictionary_entries(id) ON DELETE CASCADE,
    language TEXT NOT NULL,
    origin TEXT,
    PRIMARY KEY (entry_id, language)
);

CREATE TABLE IF NOT EXISTS definition_translations (
    definition_id TEXT NOT NULL REFERENCES definitions(id) ON DELETE CASCADE,
    language TEXT NOT NULL,
    grammatical_class TEXT,
    meaning TEXT,
    example TEXT,
    PRIMARY KEY (definition_id, language)
);

CREATE INDEX IF NOT EXISTS idx_entries_dictionary
    ON dictionary_entries(dictionary_id, word);

CREATE INDEX IF NOT EXISTS idx_definitions_entry
    ON definitions(entry_id, position);
";

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Location(format!("{}: {}", parent.display(), e)))?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }
}

/// Default database location under the platform data directory.
pub fn default_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("lexikeep").join("dictionary.db"))
}

fn sql_value(column: &str, value: &Value) -> Result<SqlValue, StoreError> {
    match value {
        Value::Null => Ok(SqlValue::Null),
        Value::Bool(b) => Ok(SqlValue::Integer(i64::from(*b))),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(SqlValue::Integer(i))
            } else if let Some(f) = n.as_f64() {
                Ok(SqlValue::Real(f))
            } else {
                Err(StoreError::BadValue(column.to_string()))
            }
        }
        Value::String(s) => Ok(SqlValue::Text(s.clone())),
        Value::Array(_) | Value::Object(_) => Err(StoreError::BadValue(column.to_string())),
    }
}

fn json_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(t) => Value::from(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(_) => Value::Null,
    }
}

/// Render a filter as a WHERE fragment, pushing bound values in order.
fn where_clause(filter: &Filter, params: &mut Vec<SqlValue>) -> Result<String, StoreError> {
    match filter {
        Filter::All => Ok("1 = 1".to_string()),
        Filter::Eq(column, value) => {
            params.push(sql_value(column, value)?);
            Ok(format!("{} = ?", column))
        }
        Filter::In(column, values) => {
            if values.is_empty() {
                // An empty id set must match nothing.
                return Ok("1 = 0".to_string());
            }
            let mut marks = Vec::with_capacity(values.len());
            for value in values {
                params.push(sql_value(column, value)?);
                marks.push("?");
            }
            Ok(format!("{} IN ({})", column, marks.join(", ")))
        }
        Filter::And(filters) => {
            let mut parts = Vec::with_capacity(filters.len());
            for f in filters {
                parts.push(where_clause(f, params)?);
            }
            if parts.is_empty() {
                Ok("1 = 1".to_string())
            } else {
                Ok(parts.join(" AND "))
            }
        }
    }
}

impl RowStore for SqliteStore {
    fn select(
        &self,
        table: Table,
        filter: &Filter,
        order: Option<Order>,
    ) -> Result<Vec<Row>, StoreError> {
        let mut params: Vec<SqlValue> = Vec::new();
        let mut sql = format!(
            "SELECT * FROM {} WHERE {}",
            table.name(),
            where_clause(filter, &mut params)?
        );
        if let Some(order) = order {
            sql.push_str(&format!(
                " ORDER BY {} {}",
                order.column,
                if order.ascending { "ASC" } else { "DESC" }
            ));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
        let mut rows = stmt.query(params_from_iter(params))?;

        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut record = Row::new();
            for (i, column) in columns.iter().enumerate() {
                record.insert(column.clone(), json_value(row.get_ref(i)?));
            }
            out.push(record);
        }
        Ok(out)
    }

    fn insert(&self, table: Table, rows: &[Row]) -> Result<(), StoreError> {
        for row in rows {
            let mut params: Vec<SqlValue> = Vec::with_capacity(row.len());
            let mut columns = Vec::with_capacity(row.len());
            let mut marks = Vec::with_capacity(row.len());
            for (column, value) in row {
                params.push(sql_value(column, value)?);
                columns.push(column.as_str());
                marks.push("?");
            }
            let sql = format!(
                "INSERT INTO {} ({}) VALUES ({})",
                table.name(),
                columns.join(", "),
                marks.join(", ")
            );
            self.conn.execute(&sql, params_from_iter(params))?;
        }
        Ok(())
    }

    fn update(&self, table: Table, filter: &Filter, patch: &Row) -> Result<usize, StoreError> {
        if patch.is_empty() {
            return Ok(0);
        }
        let mut params: Vec<SqlValue> = Vec::with_capacity(patch.len());
        let mut assignments = Vec::with_capacity(patch.len());
        for (column, value) in patch {
            params.push(sql_value(column, value)?);
            assignments.push(format!("{} = ?", column));
        }
        let clause = where_clause(filter, &mut params)?;
        let sql = format!(
            "UPDATE {} SET {} WHERE {}",
            table.name(),
            assignments.join(", "),
            clause
        );
        Ok(self.conn.execute(&sql, params_from_iter(params))?)
    }

    fn upsert(
        &self,
        table: Table,
        rows: &[Row],
        conflict_columns: &[&str],
    ) -> Result<(), StoreError> {
        for row in rows {
            let mut params: Vec<SqlValue> = Vec::with_capacity(row.len());
            let mut columns = Vec::with_capacity(row.len());
            let mut marks = Vec::with_capacity(row.len());
            for (column, value) in row {
                params.push(sql_value(column, value)?);
                columns.push(column.as_str());
                marks.push("?");
            }
            let updates: Vec<String> = columns
                .iter()
                .filter(|c| !conflict_columns.contains(c))
                .map(|c| format!("{} = excluded.{}", c, c))
                .collect();
            let action = if updates.is_empty() {
                "NOTHING".to_string()
            } else {
                format!("UPDATE SET {}", updates.join(", "))
            };
            let sql = format!(
                "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT({}) DO {}",
                table.name(),
                columns.join(", "),
                marks.join(", "),
                conflict_columns.join(", "),
                action
            );
            self.conn.execute(&sql, params_from_iter(params))?;
        }
        Ok(())
    }

    fn delete(&self, table: Table, filter: &Filter) -> Result<usize, StoreError> {
        let mut params: Vec<SqlValue> = Vec::new();
        let clause = where_clause(filter, &mut params)?;
        let sql = format!("DELETE FROM {} WHERE {}", table.name(), clause);
        Ok(self.conn.execute(&sql, params_from_iter(params))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: serde_json::Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn seeded() -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .insert(
                Table::Dictionaries,
                &[row(json!({"id": "d1", "title": "T", "description": ""}))],
            )
            .unwrap();
        store
            .insert(
                Table::Entries,
                &[
                    row(json!({
                        "id": "e1", "dictionary_id": "d1", "word": "zebra",
                        "ipa": "", "origin": "", "audio_url": null,
                        "color_combo": 2, "position": 1, "slug": "zebra"
                    })),
                    row(json!({
                        "id": "e2", "dictionary_id": "d1", "word": "apple",
                        "ipa": "", "origin": "", "audio_url": null,
                        "color_combo": 1, "position": 0, "slug": "apple"
                    })),
                ],
            )
            .unwrap();
        store
    }

    #[test]
    fn test_select_with_order() {
        let store = seeded();
        let rows = store
            .select(Table::Entries, &Filter::All, Some(Order::asc("word")))
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["word"], "apple");
        assert_eq!(rows[1]["word"], "zebra");
    }

    #[test]
    fn test_eq_and_in_filters() {
        let store = seeded();
        let rows = store
            .select(Table::Entries, &Filter::eq("id", "e1"), None)
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["word"], "zebra");

        let rows = store
            .select(
                Table::Entries,
                &Filter::id_set("id", &["e1".to_string(), "e2".to_string()]),
                None,
            )
            .unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_empty_id_set_matches_nothing() {
        let store = seeded();
        let rows = store
            .select(Table::Entries, &Filter::id_set("id", &[]), None)
            .unwrap();
        assert!(rows.is_empty());

        let removed = store
            .delete(Table::Entries, &Filter::id_set("id", &[]))
            .unwrap();
        assert_eq!(removed, 0);
    }

    #[test]
    fn test_update_reports_affected_rows() {
        let store = seeded();
        let affected = store
            .update(
                Table::Entries,
                &Filter::eq("id", "e1"),
                &row(json!({"word": "zorilla"})),
            )
            .unwrap();
        assert_eq!(affected, 1);

        let affected = store
            .update(
                Table::Entries,
                &Filter::eq("id", "missing"),
                &row(json!({"word": "x"})),
            )
            .unwrap();
        assert_eq!(affected, 0);
    }

    #[test]
    fn test_upsert_by_conflict_key() {
        let store = seeded();
        let tr = row(json!({
            "entry_id": "e1", "language": "de", "origin": "Ursprung"
        }));
        store
            .upsert(Table::EntryTranslations, &[tr], &["entry_id", "language"])
            .unwrap();

        let tr = row(json!({
            "entry_id": "e1", "language": "de", "origin": "Neuer Ursprung"
        }));
        store
            .upsert(Table::EntryTranslations, &[tr], &["entry_id", "language"])
            .unwrap();

        let rows = store
            .select(
                Table::EntryTranslations,
                &Filter::eq("entry_id", "e1"),
                None,
            )
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["origin"], "Neuer Ursprung");
    }

    #[test]
    fn test_and_filter() {
        let store = seeded();
        let rows = store
            .select(
                Table::Entries,
                &Filter::And(vec![
                    Filter::eq("dictionary_id", "d1"),
                    Filter::eq("word", "apple"),
                ]),
                None,
            )
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], "e2");
    }
}
