use anyhow::{Result, anyhow};
use rusqlite::{Connection, OptionalExtension, params};
use uuid::Uuid;

use showroom_types::Record;

use crate::models::{DocumentRow, format_timestamp, now, parse_timestamp};
use crate::{Database, Document, Sequenced};

/// Result of a write guarded by a unique field.
#[derive(Debug)]
pub enum Unique<T> {
    Written(Record<T>),
    /// Another document already holds the value; nothing was written.
    Taken,
}

const SELECT_DOCUMENT: &str = "SELECT id, body, created_at, updated_at FROM documents";

fn json_path(field: &str) -> String {
    format!("$.{}", field)
}

impl Database {
    // -- Create --

    pub fn insert<T: Document>(&self, doc: &T) -> Result<Record<T>> {
        self.with_conn_mut(|conn| insert_row(conn, doc))
    }

    /// Insert a document whose sequential number is drawn inside the same
    /// transaction, so two concurrent creates can never share a number.
    pub fn insert_sequenced<T, F>(&self, build: F) -> Result<Record<T>>
    where
        T: Sequenced,
        F: FnOnce(String) -> T,
    {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let next = next_sequence(&tx, T::COLLECTION, T::SEQUENCE_FIELD)?;
            let record = insert_row(&tx, &build(next.to_string()))?;
            tx.commit()?;
            Ok(record)
        })
    }

    /// Insert unless another document already has `field` equal to `value`.
    /// The check and the write happen under one lock.
    pub fn insert_unique<T: Document>(&self, field: &str, value: &str, doc: &T) -> Result<Unique<T>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            if value_taken(&tx, T::COLLECTION, field, value, None)? {
                return Ok(Unique::Taken);
            }
            let record = insert_row(&tx, doc)?;
            tx.commit()?;
            Ok(Unique::Written(record))
        })
    }

    // -- Read --

    pub fn get<T: Document>(&self, id: &str) -> Result<Option<Record<T>>> {
        self.with_conn(|conn| query_by_id(conn, T::COLLECTION, id)?.map(DocumentRow::decode).transpose())
    }

    /// All documents of a collection, oldest first.
    pub fn find_all<T: Document>(&self) -> Result<Vec<Record<T>>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{SELECT_DOCUMENT} WHERE collection = ?1 ORDER BY created_at, id"
            ))?;
            let rows = stmt
                .query_map([T::COLLECTION], DocumentRow::from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows.into_iter().map(DocumentRow::decode).collect()
        })
    }

    /// Documents whose top-level string `field` equals `value`, oldest first.
    pub fn find_by<T: Document>(&self, field: &str, value: &str) -> Result<Vec<Record<T>>> {
        self.with_conn(|conn| {
            query_by_field(conn, T::COLLECTION, field, value)?
                .into_iter()
                .map(DocumentRow::decode)
                .collect()
        })
    }

    pub fn find_one_by<T: Document>(&self, field: &str, value: &str) -> Result<Option<Record<T>>> {
        Ok(self.find_by(field, value)?.into_iter().next())
    }

    pub fn count<T: Document>(&self) -> Result<usize> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row(
                "SELECT COUNT(*) FROM documents WHERE collection = ?1",
                [T::COLLECTION],
                |r| r.get(0),
            )?;
            Ok(n as usize)
        })
    }

    // -- Update --

    /// Overwrite a document. Returns `None` when no such id exists.
    pub fn replace<T: Document>(&self, id: &str, doc: &T) -> Result<Option<Record<T>>> {
        self.with_conn_mut(|conn| write_row(conn, id, doc))
    }

    /// Read-modify-write under the connection lock. `f` may reject the change
    /// by returning an error, in which case nothing is written.
    pub fn modify<T, F>(&self, id: &str, f: F) -> Result<Option<Record<T>>>
    where
        T: Document,
        F: FnOnce(&mut T) -> Result<()>,
    {
        self.with_conn_mut(|conn| {
            let Some(row) = query_by_id(conn, T::COLLECTION, id)? else {
                return Ok(None);
            };
            let mut doc = row.decode::<T>()?.doc;
            f(&mut doc)?;
            write_row(conn, id, &doc)
        })
    }

    /// Like [`Database::modify`], but refuses the write when the edited
    /// document's `field` collides with another document's. `None` when no
    /// such id exists.
    pub fn modify_unique<T, F>(&self, id: &str, field: &str, f: F) -> Result<Option<Unique<T>>>
    where
        T: Document,
        F: FnOnce(&mut T) -> Result<()>,
    {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let Some(row) = query_by_id(&tx, T::COLLECTION, id)? else {
                return Ok(None);
            };
            let mut doc = row.decode::<T>()?.doc;
            f(&mut doc)?;

            if let Some(value) = field_value(&doc, field)? {
                if value_taken(&tx, T::COLLECTION, field, &value, Some(id))? {
                    return Ok(Some(Unique::Taken));
                }
            }
            let record = write_row(&tx, id, &doc)?;
            tx.commit()?;
            Ok(record.map(Unique::Written))
        })
    }

    /// Like [`Database::modify`], addressing the first document whose `field`
    /// equals `value`.
    pub fn modify_one_by<T, F>(&self, field: &str, value: &str, f: F) -> Result<Option<Record<T>>>
    where
        T: Document,
        F: FnOnce(&mut T) -> Result<()>,
    {
        self.with_conn_mut(|conn| {
            let Some(row) = query_by_field(conn, T::COLLECTION, field, value)?.into_iter().next() else {
                return Ok(None);
            };
            let id = row.id.clone();
            let mut doc = row.decode::<T>()?.doc;
            f(&mut doc)?;
            write_row(conn, &id, &doc)
        })
    }

    /// Set `field` to `value` on every document that lacks it entirely.
    /// Returns the number of documents changed.
    pub fn backfill_missing_field<T: Document>(
        &self,
        field: &str,
        value: &serde_json::Value,
    ) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE documents
                 SET body = json_set(body, ?2, json(?3)), updated_at = ?4
                 WHERE collection = ?1 AND json_type(body, ?2) IS NULL",
                params![
                    T::COLLECTION,
                    json_path(field),
                    value.to_string(),
                    format_timestamp(now())
                ],
            )?;
            Ok(changed)
        })
    }

    // -- Delete --

    /// Remove a document, returning what was removed.
    pub fn delete<T: Document>(&self, id: &str) -> Result<Option<Record<T>>> {
        self.with_conn_mut(|conn| {
            conn.query_row(
                "DELETE FROM documents WHERE collection = ?1 AND id = ?2
                 RETURNING id, body, created_at, updated_at",
                params![T::COLLECTION, id],
                DocumentRow::from_row,
            )
            .optional()?
            .map(DocumentRow::decode)
            .transpose()
        })
    }

    pub fn delete_one_by<T: Document>(&self, field: &str, value: &str) -> Result<Option<Record<T>>> {
        self.with_conn_mut(|conn| {
            let Some(row) = query_by_field(conn, T::COLLECTION, field, value)?.into_iter().next() else {
                return Ok(None);
            };
            conn.execute(
                "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
                params![T::COLLECTION, &row.id],
            )?;
            row.decode().map(Some)
        })
    }

    // -- Singletons --

    /// The one document of a settings collection, if it was ever written.
    pub fn singleton<T: Document>(&self) -> Result<Option<Record<T>>> {
        self.with_conn(|conn| query_first(conn, T::COLLECTION)?.map(DocumentRow::decode).transpose())
    }

    pub fn singleton_or_insert<T, F>(&self, default: F) -> Result<Record<T>>
    where
        T: Document,
        F: FnOnce() -> T,
    {
        self.with_conn_mut(|conn| match query_first(conn, T::COLLECTION)? {
            Some(row) => row.decode(),
            None => insert_row(conn, &default()),
        })
    }

    /// Overwrite the singleton, creating it on first write.
    pub fn put_singleton<T: Document>(&self, doc: &T) -> Result<Record<T>> {
        self.with_conn_mut(|conn| {
            if let Some(row) = query_first(conn, T::COLLECTION)? {
                if let Some(record) = write_row(conn, &row.id, doc)? {
                    return Ok(record);
                }
            }
            insert_row(conn, doc)
        })
    }

    /// Drop every document of the collection and start over from `doc`.
    pub fn reset_singleton<T: Document>(&self, doc: &T) -> Result<Record<T>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM documents WHERE collection = ?1", [T::COLLECTION])?;
            let record = insert_row(&tx, doc)?;
            tx.commit()?;
            Ok(record)
        })
    }
}

fn insert_row<T: Document>(conn: &Connection, doc: &T) -> Result<Record<T>> {
    let id = Uuid::new_v4().to_string();
    let now = now();
    let stamp = format_timestamp(now);

    conn.execute(
        "INSERT INTO documents (collection, id, body, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?4)",
        params![T::COLLECTION, &id, serde_json::to_string(doc)?, &stamp],
    )?;

    Ok(Record {
        id,
        doc: doc.clone(),
        created_at: now,
        updated_at: now,
    })
}

/// Writes the body and bumps `updated_at`.
fn write_row<T: Document>(conn: &Connection, id: &str, doc: &T) -> Result<Option<Record<T>>> {
    let now = now();
    let created_at: Option<String> = conn
        .query_row(
            "UPDATE documents SET body = ?3, updated_at = ?4
             WHERE collection = ?1 AND id = ?2
             RETURNING created_at",
            params![T::COLLECTION, id, serde_json::to_string(doc)?, format_timestamp(now)],
            |r| r.get(0),
        )
        .optional()?;

    let Some(created_at) = created_at else {
        return Ok(None);
    };
    Ok(Some(Record {
        id: id.to_string(),
        doc: doc.clone(),
        created_at: parse_timestamp(&created_at)?,
        updated_at: now,
    }))
}

fn query_by_id(conn: &Connection, collection: &str, id: &str) -> Result<Option<DocumentRow>> {
    let row = conn
        .query_row(
            &format!("{SELECT_DOCUMENT} WHERE collection = ?1 AND id = ?2"),
            params![collection, id],
            DocumentRow::from_row,
        )
        .optional()?;
    Ok(row)
}

fn query_by_field(
    conn: &Connection,
    collection: &str,
    field: &str,
    value: &str,
) -> Result<Vec<DocumentRow>> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_DOCUMENT} WHERE collection = ?1 AND json_extract(body, ?2) = ?3 ORDER BY created_at, id"
    ))?;
    let rows = stmt
        .query_map(params![collection, json_path(field), value], DocumentRow::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn query_first(conn: &Connection, collection: &str) -> Result<Option<DocumentRow>> {
    let row = conn
        .query_row(
            &format!("{SELECT_DOCUMENT} WHERE collection = ?1 ORDER BY created_at, id LIMIT 1"),
            [collection],
            DocumentRow::from_row,
        )
        .optional()?;
    Ok(row)
}

/// Next number for a sequenced collection. Never repeats a value, even after
/// deletes, and skips past any larger number already stored in `field`
/// (e.g. one set by hand on an edit).
fn next_sequence(conn: &Connection, collection: &str, field: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO sequences (name, value) VALUES (?1, 0) ON CONFLICT(name) DO NOTHING",
        [collection],
    )?;

    let stored: i64 = conn.query_row(
        "SELECT value FROM sequences WHERE name = ?1",
        [collection],
        |r| r.get(0),
    )?;
    let highest: i64 = conn.query_row(
        "SELECT COALESCE(MAX(CAST(json_extract(body, ?2) AS INTEGER)), 0)
         FROM documents
         WHERE collection = ?1
           AND json_extract(body, ?2) <> ''
           AND json_extract(body, ?2) NOT GLOB '*[^0-9]*'",
        params![collection, json_path(field)],
        |r| r.get(0),
    )?;

    let next = stored
        .max(highest)
        .checked_add(1)
        .ok_or_else(|| anyhow!("Sequence '{}' is exhausted", collection))?;
    conn.execute(
        "UPDATE sequences SET value = ?2 WHERE name = ?1",
        params![collection, next],
    )?;
    Ok(next)
}

/// True when a document other than `except` has `field` equal to `value`.
fn value_taken(
    conn: &Connection,
    collection: &str,
    field: &str,
    value: &str,
    except: Option<&str>,
) -> Result<bool> {
    Ok(query_by_field(conn, collection, field, value)?
        .iter()
        .any(|row| Some(row.id.as_str()) != except))
}

/// String value of a top-level field once serialized.
fn field_value<T: Document>(doc: &T, field: &str) -> Result<Option<String>> {
    Ok(serde_json::to_value(doc)?
        .get(field)
        .and_then(serde_json::Value::as_str)
        .map(str::to_string))
}
