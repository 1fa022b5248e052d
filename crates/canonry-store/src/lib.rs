//! Canonry Storage Layer
//!
//! Implements the [`GovernanceStore`] trait on SQLite.
//!
//! # Architecture
//!
//! - One connection behind a mutex; every multi-statement write runs in a
//!   transaction, so `upsert_canonical` is atomic per canonical id
//! - Scope, structured form and axis values are stored as JSON columns
//! - Leases are rows with an expiry; an expired lease can be taken over
//!
//! # Examples
//!
//! ```no_run
//! use canonry_store::SqliteStore;
//!
//! let store = SqliteStore::new(":memory:").unwrap();
//! // Store is now ready for governance operations
//! ```

#![warn(missing_docs)]

use canonry_domain::traits::{ClaimFilter, GovernanceStore};
use canonry_domain::{
    ApplicabilityAxis, AuthorityLevel, AxisParts, AxisValue, CanonicalClaim, CanonicalEdge,
    CanonicalId, CanonicalStatus, Claim, ClaimId, ClaimKey, ClaimStatus, ClaimType, Confidence,
    DocumentId, EvidencePassage, OrderType, OrderingConfidence, PassageId, SourceDocument,
};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// JSON column could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The connection mutex was poisoned by a panicking writer
    #[error("Connection lock poisoned")]
    Poisoned,
}

/// SQLite-based implementation of [`GovernanceStore`]
///
/// The connection is guarded by a mutex so one store can be shared (behind an
/// `Arc`) by the worker tasks of a batch.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Create a new SqliteStore with the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use canonry_store::SqliteStore;
    ///
    /// let store = SqliteStore::new("canonry.db").unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(include_str!("schema.sql"))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Convert a 128-bit id to bytes for storage
    fn id_to_bytes(value: u128) -> Vec<u8> {
        value.to_be_bytes().to_vec()
    }

    /// Convert bytes back to a 128-bit id
    fn bytes_to_id(bytes: &[u8]) -> Result<u128, StoreError> {
        if bytes.len() != 16 {
            return Err(StoreError::InvalidData(format!(
                "Expected 16 bytes for id, got {}",
                bytes.len()
            )));
        }
        let mut arr = [0u8; 16];
        arr.copy_from_slice(bytes);
        Ok(u128::from_be_bytes(arr))
    }

    fn now_millis() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }

    fn key_columns(key: &Option<ClaimKey>) -> (Option<&str>, Option<&str>) {
        match key {
            Some(k) => (Some(k.domain.as_str()), Some(k.key.as_str())),
            None => (None, None),
        }
    }

    fn key_from_columns(domain: Option<String>, key: Option<String>) -> Option<ClaimKey> {
        match (domain, key) {
            (Some(d), Some(k)) => Some(ClaimKey::new(d, k)),
            _ => None,
        }
    }

    /// Raw claim row, before evidence units are attached
    fn row_to_claim(row: &rusqlite::Row) -> Result<Claim, StoreError> {
        let id_bytes: Vec<u8> = row.get(0)?;
        let document_id: String = row.get(2)?;
        let claim_type: String = row.get(4)?;
        let scope_json: String = row.get(5)?;
        let confidence: f64 = row.get(7)?;
        let structured_json: Option<String> = row.get(8)?;
        let status: String = row.get(12)?;
        let created_at: i64 = row.get(15)?;

        Ok(Claim {
            id: ClaimId::from_value(Self::bytes_to_id(&id_bytes)?),
            tenant: row.get(1)?,
            document_id: DocumentId::new(document_id)
                .map_err(|e| StoreError::InvalidData(e.to_string()))?,
            text: row.get(3)?,
            claim_type: ClaimType::parse(&claim_type).ok_or_else(|| {
                StoreError::InvalidData(format!("Unknown claim type: {}", claim_type))
            })?,
            scope: serde_json::from_str(&scope_json)?,
            verbatim_quote: row.get(6)?,
            unit_ids: Vec::new(),
            confidence: Confidence::new(confidence)
                .map_err(|e| StoreError::InvalidData(e.to_string()))?,
            structured_form: structured_json
                .as_deref()
                .map(serde_json::from_str)
                .transpose()?,
            claim_key: Self::key_from_columns(row.get(9)?, row.get(10)?),
            value: row.get(11)?,
            status: ClaimStatus::parse(&status).ok_or_else(|| {
                StoreError::InvalidData(format!("Unknown claim status: {}", status))
            })?,
            fingerprint: row.get(13)?,
            content_fingerprint: row.get(14)?,
            created_at: created_at as u64,
        })
    }

    fn load_units(conn: &Connection, id: ClaimId) -> Result<Vec<PassageId>, StoreError> {
        let mut stmt = conn.prepare(
            "SELECT passage_id FROM claim_units WHERE claim_id = ?1 ORDER BY position",
        )?;
        let ids = stmt
            .query_map(params![Self::id_to_bytes(id.value())], |row| {
                row.get::<_, String>(0)
            })?
            .collect::<Result<Vec<_>, _>>()?;
        ids.into_iter()
            .map(|s| PassageId::new(s).map_err(|e| StoreError::InvalidData(e.to_string())))
            .collect()
    }

    fn load_canonical(conn: &Connection, id: CanonicalId) -> Result<Option<CanonicalClaim>, StoreError> {
        let id_bytes = Self::id_to_bytes(id.value());
        let row = conn
            .query_row(
                "SELECT tenant, text, content_fingerprint, scope_key, key_domain, key_name,
                        value, authority, status, updated_at
                 FROM canonical_claims WHERE id = ?1",
                params![id_bytes],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, Option<String>>(4)?,
                        row.get::<_, Option<String>>(5)?,
                        row.get::<_, Option<String>>(6)?,
                        row.get::<_, String>(7)?,
                        row.get::<_, String>(8)?,
                        row.get::<_, i64>(9)?,
                    ))
                },
            )
            .optional()?;

        let Some((tenant, text, fp, scope_key, key_domain, key_name, value, authority, status, updated_at)) = row
        else {
            return Ok(None);
        };

        let mut stmt = conn.prepare("SELECT claim_id FROM canonical_support WHERE canonical_id = ?1")?;
        let supporting_claims = stmt
            .query_map(params![id_bytes], |row| row.get::<_, Vec<u8>>(0))?
            .collect::<Result<Vec<_>, _>>()?
            .iter()
            .map(|b| Self::bytes_to_id(b).map(ClaimId::from_value))
            .collect::<Result<BTreeSet<_>, _>>()?;

        let mut stmt = conn.prepare("SELECT document_id FROM canonical_documents WHERE canonical_id = ?1")?;
        let documents = stmt
            .query_map(params![id_bytes], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(|s| DocumentId::new(s).map_err(|e| StoreError::InvalidData(e.to_string())))
            .collect::<Result<BTreeSet<_>, _>>()?;

        Ok(Some(CanonicalClaim {
            id,
            tenant,
            text,
            content_fingerprint: fp,
            scope_key,
            claim_key: Self::key_from_columns(key_domain, key_name),
            value,
            authority: AuthorityLevel::parse(&authority).ok_or_else(|| {
                StoreError::InvalidData(format!("Unknown authority: {}", authority))
            })?,
            status: CanonicalStatus::parse(&status).ok_or_else(|| {
                StoreError::InvalidData(format!("Unknown canonical status: {}", status))
            })?,
            supporting_claims,
            documents,
            updated_at: updated_at as u64,
        }))
    }

    fn write_canonical(tx: &Transaction, canonical: &CanonicalClaim) -> Result<(), StoreError> {
        let id_bytes = Self::id_to_bytes(canonical.id.value());
        let (key_domain, key_name) = Self::key_columns(&canonical.claim_key);
        tx.execute(
            "INSERT INTO canonical_claims
                 (id, tenant, text, content_fingerprint, scope_key, key_domain, key_name,
                  value, authority, status, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             ON CONFLICT(id) DO UPDATE SET
                 key_domain = excluded.key_domain,
                 key_name = excluded.key_name,
                 value = excluded.value,
                 authority = excluded.authority,
                 status = excluded.status,
                 updated_at = excluded.updated_at",
            params![
                id_bytes,
                canonical.tenant,
                canonical.text,
                canonical.content_fingerprint,
                canonical.scope_key,
                key_domain,
                key_name,
                canonical.value,
                canonical.authority.as_str(),
                canonical.status.as_str(),
                canonical.updated_at as i64,
            ],
        )?;
        for claim in &canonical.supporting_claims {
            tx.execute(
                "INSERT OR IGNORE INTO canonical_support (canonical_id, claim_id) VALUES (?1, ?2)",
                params![id_bytes, Self::id_to_bytes(claim.value())],
            )?;
        }
        for document in &canonical.documents {
            tx.execute(
                "INSERT OR IGNORE INTO canonical_documents (canonical_id, document_id) VALUES (?1, ?2)",
                params![id_bytes, document.as_str()],
            )?;
        }
        Ok(())
    }

    fn edge_columns(edge: &CanonicalEdge) -> (u128, u128) {
        match edge {
            CanonicalEdge::Supports { claim, canonical } => (claim.value(), canonical.value()),
            CanonicalEdge::ConflictsWith { a, b } => (a.value(), b.value()),
            CanonicalEdge::Supersedes { newer, older } => (newer.value(), older.value()),
        }
    }

    fn edge_from_columns(kind: &str, from: u128, to: u128) -> Result<CanonicalEdge, StoreError> {
        match kind {
            "supports" => Ok(CanonicalEdge::Supports {
                claim: ClaimId::from_value(from),
                canonical: CanonicalId::from_value(to),
            }),
            "conflicts_with" => Ok(CanonicalEdge::ConflictsWith {
                a: CanonicalId::from_value(from),
                b: CanonicalId::from_value(to),
            }),
            "supersedes" => Ok(CanonicalEdge::Supersedes {
                newer: CanonicalId::from_value(from),
                older: CanonicalId::from_value(to),
            }),
            other => Err(StoreError::InvalidData(format!("Unknown edge kind: {}", other))),
        }
    }

    fn load_axis(conn: &Connection, tenant: &str, axis_key: &str) -> Result<Option<ApplicabilityAxis>, StoreError> {
        let header = conn
            .query_row(
                "SELECT label, order_type, ordering_confidence, value_order_json
                 FROM axes WHERE tenant = ?1 AND axis_key = ?2",
                params![tenant, axis_key],
                |row| {
                    Ok((
                        row.get::<_, Option<String>>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Option<String>>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((label, order_type, confidence, order_json)) = header else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(
            "SELECT kind_json, evidence_json, document_id FROM axis_values
             WHERE tenant = ?1 AND axis_key = ?2 ORDER BY seq",
        )?;
        let rows = stmt
            .query_map(params![tenant, axis_key], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut values = Vec::with_capacity(rows.len());
        for (kind_json, evidence_json, document_id) in rows {
            values.push(AxisValue {
                kind: serde_json::from_str(&kind_json)?,
                evidence: serde_json::from_str(&evidence_json)?,
                document_id: DocumentId::new(document_id)
                    .map_err(|e| StoreError::InvalidData(e.to_string()))?,
            });
        }

        let parts = AxisParts {
            tenant: tenant.to_string(),
            axis_key: axis_key.to_string(),
            label,
            order_type: OrderType::parse(&order_type).ok_or_else(|| {
                StoreError::InvalidData(format!("Unknown order type: {}", order_type))
            })?,
            ordering_confidence: OrderingConfidence::parse(&confidence).ok_or_else(|| {
                StoreError::InvalidData(format!("Unknown ordering confidence: {}", confidence))
            })?,
            value_order: order_json.as_deref().map(serde_json::from_str).transpose()?,
            values,
        };

        ApplicabilityAxis::restore(parts)
            .map(Some)
            .map_err(|e| StoreError::InvalidData(e.to_string()))
    }
}

impl GovernanceStore for SqliteStore {
    type Error = StoreError;

    fn put_document(&self, document: &SourceDocument) -> Result<(), Self::Error> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO documents (id, tenant, family, revision, authority)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                 tenant = excluded.tenant,
                 family = excluded.family,
                 revision = excluded.revision,
                 authority = excluded.authority",
            params![
                document.id.as_str(),
                document.tenant,
                document.family,
                document.revision,
                document.authority.as_str(),
            ],
        )?;
        Ok(())
    }

    fn get_document(&self, id: &DocumentId) -> Result<Option<SourceDocument>, Self::Error> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT tenant, family, revision, authority FROM documents WHERE id = ?1",
                params![id.as_str()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, u32>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(tenant, family, revision, authority)| {
            let authority = AuthorityLevel::parse(&authority).ok_or_else(|| {
                StoreError::InvalidData(format!("Unknown authority: {}", authority))
            })?;
            Ok(SourceDocument::new(id.clone(), tenant, family, revision, authority))
        })
        .transpose()
    }

    fn put_passage(&self, passage: &EvidencePassage) -> Result<(), Self::Error> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO passages (id, document_id, text) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET document_id = excluded.document_id, text = excluded.text",
            params![passage.id.as_str(), passage.document_id.as_str(), passage.text],
        )?;
        Ok(())
    }

    fn count_passages(&self, document_id: &DocumentId) -> Result<usize, Self::Error> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM passages WHERE document_id = ?1",
            params![document_id.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn save_claim(&self, claim: &Claim) -> Result<(), Self::Error> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let id_bytes = Self::id_to_bytes(claim.id.value());
        let scope_json = serde_json::to_string(&claim.scope)?;
        let structured_json = claim
            .structured_form
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let (key_domain, key_name) = Self::key_columns(&claim.claim_key);

        tx.execute(
            "INSERT INTO claims
                 (id, tenant, document_id, text, claim_type, scope_json, verbatim_quote,
                  confidence, structured_json, key_domain, key_name, value, status,
                  fingerprint, content_fingerprint, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
             ON CONFLICT(id) DO UPDATE SET
                 text = excluded.text,
                 claim_type = excluded.claim_type,
                 scope_json = excluded.scope_json,
                 verbatim_quote = excluded.verbatim_quote,
                 confidence = excluded.confidence,
                 structured_json = excluded.structured_json,
                 key_domain = excluded.key_domain,
                 key_name = excluded.key_name,
                 value = excluded.value,
                 status = excluded.status,
                 fingerprint = excluded.fingerprint,
                 content_fingerprint = excluded.content_fingerprint",
            params![
                id_bytes,
                claim.tenant,
                claim.document_id.as_str(),
                claim.text,
                claim.claim_type.as_str(),
                scope_json,
                claim.verbatim_quote,
                claim.confidence.value(),
                structured_json,
                key_domain,
                key_name,
                claim.value,
                claim.status.as_str(),
                claim.fingerprint,
                claim.content_fingerprint,
                claim.created_at as i64,
            ],
        )?;

        tx.execute("DELETE FROM claim_units WHERE claim_id = ?1", params![id_bytes])?;
        for (position, unit) in claim.unit_ids.iter().enumerate() {
            tx.execute(
                "INSERT OR IGNORE INTO claim_units (claim_id, passage_id, position) VALUES (?1, ?2, ?3)",
                params![id_bytes, unit.as_str(), position as i64],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn get_claim(&self, id: ClaimId) -> Result<Option<Claim>, Self::Error> {
        let conn = self.lock()?;
        let claim = {
            let mut stmt = conn.prepare(
                "SELECT id, tenant, document_id, text, claim_type, scope_json, verbatim_quote,
                        confidence, structured_json, key_domain, key_name, value, status,
                        fingerprint, content_fingerprint, created_at
                 FROM claims WHERE id = ?1",
            )?;
            let mut rows = stmt.query(params![Self::id_to_bytes(id.value())])?;
            match rows.next()? {
                Some(row) => Some(Self::row_to_claim(row)?),
                None => None,
            }
        };

        match claim {
            Some(mut claim) => {
                claim.unit_ids = Self::load_units(&conn, claim.id)?;
                Ok(Some(claim))
            }
            None => Ok(None),
        }
    }

    fn fetch_claims(&self, tenant: &str, filter: &ClaimFilter) -> Result<Vec<Claim>, Self::Error> {
        let conn = self.lock()?;
        let mut sql = String::from(
            "SELECT id, tenant, document_id, text, claim_type, scope_json, verbatim_quote,
                    confidence, structured_json, key_domain, key_name, value, status,
                    fingerprint, content_fingerprint, created_at
             FROM claims WHERE tenant = ?",
        );
        let mut bind: Vec<String> = vec![tenant.to_string()];

        if let Some(document_id) = &filter.document_id {
            sql.push_str(" AND document_id = ?");
            bind.push(document_id.as_str().to_string());
        }
        if let Some(status) = filter.status {
            sql.push_str(" AND status = ?");
            bind.push(status.as_str().to_string());
        }
        sql.push_str(" ORDER BY created_at, id");
        if let Some(limit) = filter.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        let mut claims = Vec::new();
        {
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query(rusqlite::params_from_iter(bind.iter()))?;
            while let Some(row) = rows.next()? {
                claims.push(Self::row_to_claim(row)?);
            }
        }
        for claim in &mut claims {
            claim.unit_ids = Self::load_units(&conn, claim.id)?;
        }
        Ok(claims)
    }

    fn delete_claim(&self, id: ClaimId) -> Result<usize, Self::Error> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let id_bytes = Self::id_to_bytes(id.value());

        let units: Vec<String> = {
            let mut stmt = tx.prepare("SELECT passage_id FROM claim_units WHERE claim_id = ?1")?;
            let rows = stmt
                .query_map(params![id_bytes], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };

        tx.execute("DELETE FROM claim_units WHERE claim_id = ?1", params![id_bytes])?;
        let deleted = tx.execute("DELETE FROM claims WHERE id = ?1", params![id_bytes])?;
        if deleted == 0 {
            return Err(StoreError::NotFound(format!("claim {}", id)));
        }

        let mut orphaned = 0;
        for passage in &units {
            let still_used: i64 = tx.query_row(
                "SELECT COUNT(*) FROM claim_units WHERE passage_id = ?1",
                params![passage],
                |row| row.get(0),
            )?;
            if still_used == 0 {
                orphaned += tx.execute("DELETE FROM passages WHERE id = ?1", params![passage])?;
            }
        }
        tx.commit()?;

        debug!(claim = %id, orphaned, "Deleted claim");
        Ok(orphaned)
    }

    fn upsert_canonical(&self, canonical: &CanonicalClaim) -> Result<CanonicalClaim, Self::Error> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let merged = match Self::load_canonical(&tx, canonical.id)? {
            Some(mut existing) => {
                existing.merge(canonical);
                existing
            }
            None => canonical.clone(),
        };
        Self::write_canonical(&tx, &merged)?;
        tx.commit()?;
        Ok(merged)
    }

    fn get_canonical(&self, id: CanonicalId) -> Result<Option<CanonicalClaim>, Self::Error> {
        let conn = self.lock()?;
        Self::load_canonical(&conn, id)
    }

    fn fetch_canonicals(&self, tenant: &str) -> Result<Vec<CanonicalClaim>, Self::Error> {
        let conn = self.lock()?;
        let ids: Vec<Vec<u8>> = {
            let mut stmt = conn.prepare("SELECT id FROM canonical_claims WHERE tenant = ?1 ORDER BY id")?;
            let rows = stmt
                .query_map(params![tenant], |row| row.get::<_, Vec<u8>>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };

        let mut canonicals = Vec::with_capacity(ids.len());
        for bytes in ids {
            let id = CanonicalId::from_value(Self::bytes_to_id(&bytes)?);
            if let Some(canonical) = Self::load_canonical(&conn, id)? {
                canonicals.push(canonical);
            }
        }
        Ok(canonicals)
    }

    fn add_edge(&self, tenant: &str, edge: &CanonicalEdge) -> Result<(), Self::Error> {
        let conn = self.lock()?;
        let (from, to) = Self::edge_columns(edge);
        conn.execute(
            "INSERT OR IGNORE INTO canonical_edges (tenant, kind, from_id, to_id) VALUES (?1, ?2, ?3, ?4)",
            params![tenant, edge.kind_str(), Self::id_to_bytes(from), Self::id_to_bytes(to)],
        )?;
        Ok(())
    }

    fn edges_for(&self, id: CanonicalId) -> Result<Vec<CanonicalEdge>, Self::Error> {
        let conn = self.lock()?;
        let id_bytes = Self::id_to_bytes(id.value());
        let mut stmt = conn.prepare(
            "SELECT kind, from_id, to_id FROM canonical_edges
             WHERE to_id = ?1 OR (from_id = ?1 AND kind != 'supports')
             ORDER BY kind, from_id, to_id",
        )?;
        let rows = stmt
            .query_map(params![id_bytes], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Vec<u8>>(1)?,
                    row.get::<_, Vec<u8>>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.iter()
            .map(|(kind, from, to)| {
                Self::edge_from_columns(kind, Self::bytes_to_id(from)?, Self::bytes_to_id(to)?)
            })
            .collect()
    }

    fn mark_superseded(&self, id: CanonicalId) -> Result<(), Self::Error> {
        let conn = self.lock()?;
        let updated = conn.execute(
            "UPDATE canonical_claims SET status = ?1 WHERE id = ?2",
            params![CanonicalStatus::Superseded.as_str(), Self::id_to_bytes(id.value())],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound(format!("canonical claim {}", id)));
        }
        Ok(())
    }

    fn fetch_axis(&self, tenant: &str, axis_key: &str) -> Result<Option<ApplicabilityAxis>, Self::Error> {
        let conn = self.lock()?;
        Self::load_axis(&conn, tenant, axis_key)
    }

    fn upsert_axis_value(
        &self,
        tenant: &str,
        axis_key: &str,
        value: &AxisValue,
    ) -> Result<ApplicabilityAxis, Self::Error> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT OR IGNORE INTO axes (tenant, axis_key, label, order_type, ordering_confidence, value_order_json)
             VALUES (?1, ?2, NULL, ?3, ?4, NULL)",
            params![
                tenant,
                axis_key,
                OrderType::None.as_str(),
                OrderingConfidence::Unknown.as_str(),
            ],
        )?;
        // The same observation recorded twice is kept once
        tx.execute(
            "INSERT OR IGNORE INTO axis_values (tenant, axis_key, kind_json, evidence_json, document_id)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                tenant,
                axis_key,
                serde_json::to_string(&value.kind)?,
                serde_json::to_string(&value.evidence)?,
                value.document_id.as_str(),
            ],
        )?;
        let axis = Self::load_axis(&tx, tenant, axis_key)?
            .ok_or_else(|| StoreError::NotFound(format!("axis {}", axis_key)))?;
        tx.commit()?;
        Ok(axis)
    }

    fn save_axis_ordering(&self, axis: &ApplicabilityAxis) -> Result<(), Self::Error> {
        let conn = self.lock()?;
        let order_json = axis
            .value_order()
            .map(serde_json::to_string)
            .transpose()?;
        conn.execute(
            "INSERT INTO axes (tenant, axis_key, label, order_type, ordering_confidence, value_order_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(tenant, axis_key) DO UPDATE SET
                 label = excluded.label,
                 order_type = excluded.order_type,
                 ordering_confidence = excluded.ordering_confidence,
                 value_order_json = excluded.value_order_json",
            params![
                axis.tenant(),
                axis.axis_key(),
                axis.label(),
                axis.order_type().as_str(),
                axis.ordering_confidence().as_str(),
                order_json,
            ],
        )?;
        Ok(())
    }

    fn try_acquire_lease(&self, name: &str, holder: &str, ttl: Duration) -> Result<bool, Self::Error> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let now = Self::now_millis();
        let expires_at = now + ttl.as_millis() as i64;

        tx.execute(
            "DELETE FROM leases WHERE name = ?1 AND expires_at <= ?2",
            params![name, now],
        )?;
        let inserted = tx.execute(
            "INSERT OR IGNORE INTO leases (name, holder, expires_at) VALUES (?1, ?2, ?3)",
            params![name, holder, expires_at],
        )?;
        let acquired = if inserted == 1 {
            true
        } else {
            // Re-acquiring a lease we already hold extends it
            tx.execute(
                "UPDATE leases SET expires_at = ?1 WHERE name = ?2 AND holder = ?3",
                params![expires_at, name, holder],
            )? == 1
        };
        tx.commit()?;

        debug!(lease = name, holder, acquired, "Lease attempt");
        Ok(acquired)
    }

    fn release_lease(&self, name: &str, holder: &str) -> Result<(), Self::Error> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM leases WHERE name = ?1 AND holder = ?2",
            params![name, holder],
        )?;
        Ok(())
    }
}
