use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::AuditError;
use crate::guidelines::{GuidelineCatalog, ParameterCategory, ParameterStatus};
use crate::session::{AuditSession, AuditStatus};

use super::types::{AuditEntry, AuditStatistics, AuditSummary, FarmRecord};

/// SQLite store for audits, their evaluated entries and the farm registry.
/// All operations are synchronous (rusqlite is blocking).
/// Callers in async contexts should use `tokio::task::spawn_blocking`.
pub struct AuditStore {
    conn: Connection,
}

impl AuditStore {
    /// Create or open the audit database.
    /// The db_path is the full path to the SQLite file.
    pub fn new(db_path: &Path) -> Result<Self, AuditError> {
        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path)?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS audits (
                id TEXT PRIMARY KEY,
                farm_id TEXT,
                farm_name TEXT,
                technician TEXT,
                notes TEXT NOT NULL DEFAULT '',
                status TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                farm_info_json TEXT,
                milking_time_json TEXT,
                detacher_json TEXT,
                pulsator_json TEXT,
                pulsation_avg_json TEXT,
                voltage_json TEXT,
                diagnostics_json TEXT,
                recommendations_json TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_audits_status ON audits(status);
            CREATE INDEX IF NOT EXISTS idx_audits_updated ON audits(updated_at DESC);
            CREATE TABLE IF NOT EXISTS audit_entries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                audit_id TEXT NOT NULL,
                parameter TEXT NOT NULL,
                value REAL NOT NULL,
                unit TEXT NOT NULL,
                category TEXT NOT NULL,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_entries_audit ON audit_entries(audit_id);
            CREATE TABLE IF NOT EXISTS farms (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                location TEXT NOT NULL DEFAULT '',
                contact_person TEXT NOT NULL DEFAULT '',
                phone TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_farms_name ON farms(name);",
        )?;

        info!("Opened audit database at {:?}", db_path);
        Ok(Self { conn })
    }

    // -------------------------------------------------------------------------
    // Audit load / save
    // -------------------------------------------------------------------------

    /// Load the audit with the given id, creating a blank draft if it
    /// does not exist yet. Resuming a draft and starting a new audit are
    /// the same call.
    pub fn load_or_create(&self, id: Uuid) -> Result<AuditSession, AuditError> {
        if let Some(session) = self.get(id)? {
            debug!("Loaded audit {}", id);
            return Ok(session);
        }

        let session = AuditSession::new(id);
        self.save(&session)?;
        info!("Created new draft audit {}", id);
        Ok(session)
    }

    /// Look up an audit by id. Returns None if it does not exist.
    pub fn get(&self, id: Uuid) -> Result<Option<AuditSession>, AuditError> {
        let result = self.conn.query_row(
            "SELECT farm_id, notes, status, created_at, updated_at,
                    farm_info_json, milking_time_json, detacher_json,
                    pulsator_json, pulsation_avg_json, voltage_json,
                    diagnostics_json, recommendations_json
             FROM audits WHERE id = ?1",
            params![id.to_string()],
            |row| {
                Ok(AuditRow {
                    farm_id: row.get(0)?,
                    notes: row.get(1)?,
                    status: row.get(2)?,
                    created_at: row.get(3)?,
                    updated_at: row.get(4)?,
                    farm_info: row.get(5)?,
                    milking_time: row.get(6)?,
                    detacher: row.get(7)?,
                    pulsator: row.get(8)?,
                    pulsation_avg: row.get(9)?,
                    voltage: row.get(10)?,
                    diagnostics: row.get(11)?,
                    recommendations: row.get(12)?,
                })
            },
        );

        match result {
            Ok(row) => Ok(Some(row.into_session(id)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Persist the full session in one statement. Saving the same
    /// session twice is a no-op; the write either lands completely or
    /// not at all, so a concurrent reload never sees a half-saved audit.
    pub fn save(&self, session: &AuditSession) -> Result<(), AuditError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO audits
             (id, farm_id, farm_name, technician, notes, status,
              created_at, updated_at,
              farm_info_json, milking_time_json, detacher_json,
              pulsator_json, pulsation_avg_json, voltage_json,
              diagnostics_json, recommendations_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8,
                     ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
            params![
                session.id.to_string(),
                session.farm_id,
                session.farm_name(),
                session.technician(),
                session.notes,
                session.status.as_str(),
                session.created_at.to_rfc3339(),
                session.updated_at.to_rfc3339(),
                serde_json::to_string(&session.farm_info)?,
                serde_json::to_string(&session.milking_time_rows)?,
                serde_json::to_string(&session.detacher_settings)?,
                serde_json::to_string(&session.pulsator_rows)?,
                serde_json::to_string(&session.pulsation_averages)?,
                serde_json::to_string(&session.voltage_checks)?,
                serde_json::to_string(&session.diagnostics)?,
                serde_json::to_string(&session.recommendations)?,
            ],
        )?;

        debug!("Saved audit {} ({})", session.id, session.status.as_str());
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Listings
    // -------------------------------------------------------------------------

    /// All draft audits, most recently edited first.
    pub fn list_drafts(&self) -> Result<Vec<AuditSummary>, AuditError> {
        self.list_by_status(AuditStatus::Draft)
    }

    /// All completed audits, most recently updated first.
    pub fn list_completed(&self) -> Result<Vec<AuditSummary>, AuditError> {
        self.list_by_status(AuditStatus::Completed)
    }

    fn list_by_status(&self, status: AuditStatus) -> Result<Vec<AuditSummary>, AuditError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, farm_id, farm_name, technician, notes, status,
                    created_at, updated_at
             FROM audits WHERE status = ?1
             ORDER BY updated_at DESC",
        )?;
        let rows = stmt.query_map(params![status.as_str()], summary_columns)?;
        collect_summaries(rows)
    }

    /// All audits for one farm, most recently updated first.
    pub fn list_for_farm(&self, farm_id: &str) -> Result<Vec<AuditSummary>, AuditError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, farm_id, farm_name, technician, notes, status,
                    created_at, updated_at
             FROM audits WHERE farm_id = ?1
             ORDER BY updated_at DESC",
        )?;
        let rows = stmt.query_map(params![farm_id], summary_columns)?;
        collect_summaries(rows)
    }

    /// Delete an audit and its entries. Deleting an id that does not
    /// exist is a silent no-op.
    pub fn delete_audit(&self, id: Uuid) -> Result<(), AuditError> {
        let id_text = id.to_string();
        self.conn.execute(
            "DELETE FROM audit_entries WHERE audit_id = ?1",
            params![id_text],
        )?;
        let removed = self
            .conn
            .execute("DELETE FROM audits WHERE id = ?1", params![id_text])?;

        if removed > 0 {
            info!("Deleted audit {}", id);
        } else {
            debug!("Delete of missing audit {} ignored", id);
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Completion
    // -------------------------------------------------------------------------

    /// Complete a draft: derive its measurable readings, evaluate each
    /// against the catalog, materialize them as entry rows and flip the
    /// status, all in one transaction.
    ///
    /// Completing an audit that is already completed returns its
    /// existing entries unchanged. Completing an unknown id is an error.
    pub fn complete_draft(
        &mut self,
        id: Uuid,
        catalog: &GuidelineCatalog,
    ) -> Result<Vec<AuditEntry>, AuditError> {
        let session = self.get(id)?.ok_or(AuditError::AuditNotFound(id))?;
        if session.status == AuditStatus::Completed {
            debug!("Audit {} already completed", id);
            return self.entries(id);
        }

        let readings = derive_readings(&session);
        let now = Utc::now();
        let now_text = now.to_rfc3339();
        let id_text = id.to_string();

        let tx = self.conn.transaction()?;
        let mut entries = Vec::with_capacity(readings.len());
        for (parameter, value) in readings {
            // A custom catalog may not define every derivable parameter
            let Some(def) = catalog.get(parameter) else {
                warn!("No guideline for '{}', skipping reading", parameter);
                continue;
            };
            let status = catalog.evaluate(parameter, value);
            tx.execute(
                "INSERT INTO audit_entries
                 (audit_id, parameter, value, unit, category, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    id_text,
                    parameter,
                    value,
                    def.unit,
                    def.category.as_str(),
                    status.as_str(),
                    now_text,
                ],
            )?;
            entries.push(AuditEntry {
                id: tx.last_insert_rowid(),
                audit_id: id,
                parameter: parameter.to_string(),
                value,
                unit: def.unit.clone(),
                category: def.category,
                status,
                created_at: now,
            });
        }
        tx.execute(
            "UPDATE audits SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![AuditStatus::Completed.as_str(), now_text, id_text],
        )?;
        tx.commit()?;

        info!("Completed audit {} with {} entries", id, entries.len());
        Ok(entries)
    }

    /// Entries of an audit in insertion order. Empty for drafts.
    pub fn entries(&self, audit_id: Uuid) -> Result<Vec<AuditEntry>, AuditError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, parameter, value, unit, category, status, created_at
             FROM audit_entries WHERE audit_id = ?1
             ORDER BY id",
        )?;
        let rows = stmt.query_map(params![audit_id.to_string()], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (id, parameter, value, unit, category, status, created_at) = row?;
            entries.push(AuditEntry {
                id,
                audit_id,
                parameter,
                value,
                unit,
                category: ParameterCategory::from_str(&category),
                status: ParameterStatus::from_str(&status),
                created_at: parse_timestamp(&created_at)?,
            });
        }
        Ok(entries)
    }

    /// Correct one entry's value after completion; its status is
    /// recomputed against the catalog in the same update.
    pub fn correct_entry_value(
        &self,
        entry_id: i64,
        value: f64,
        catalog: &GuidelineCatalog,
    ) -> Result<AuditEntry, AuditError> {
        let mut entry = self
            .entry_by_id(entry_id)?
            .ok_or(AuditError::EntryNotFound(entry_id))?;

        let status = catalog.evaluate(&entry.parameter, value);
        self.conn.execute(
            "UPDATE audit_entries SET value = ?1, status = ?2 WHERE id = ?3",
            params![value, status.as_str(), entry_id],
        )?;

        info!(
            "Corrected entry {} ({}) to {} [{}]",
            entry_id,
            entry.parameter,
            value,
            status.as_str()
        );
        entry.value = value;
        entry.status = status;
        Ok(entry)
    }

    fn entry_by_id(&self, entry_id: i64) -> Result<Option<AuditEntry>, AuditError> {
        let result = self.conn.query_row(
            "SELECT id, audit_id, parameter, value, unit, category, status, created_at
             FROM audit_entries WHERE id = ?1",
            params![entry_id],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, f64>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, String>(7)?,
                ))
            },
        );

        match result {
            Ok((id, audit_id, parameter, value, unit, category, status, created_at)) => {
                Ok(Some(AuditEntry {
                    id,
                    audit_id: parse_uuid(&audit_id)?,
                    parameter,
                    value,
                    unit,
                    category: ParameterCategory::from_str(&category),
                    status: ParameterStatus::from_str(&status),
                    created_at: parse_timestamp(&created_at)?,
                }))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    // -------------------------------------------------------------------------
    // Farm registry
    // -------------------------------------------------------------------------

    /// Register a farm. Returns the stored record.
    pub fn create_farm(
        &self,
        name: &str,
        location: &str,
        contact_person: &str,
        phone: &str,
    ) -> Result<FarmRecord, AuditError> {
        let record = FarmRecord {
            id: Uuid::new_v4(),
            name: name.to_string(),
            location: location.to_string(),
            contact_person: contact_person.to_string(),
            phone: phone.to_string(),
            created_at: Utc::now(),
        };
        self.conn.execute(
            "INSERT INTO farms (id, name, location, contact_person, phone, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.id.to_string(),
                record.name,
                record.location,
                record.contact_person,
                record.phone,
                record.created_at.to_rfc3339(),
            ],
        )?;
        info!("Registered farm '{}' ({})", record.name, record.id);
        Ok(record)
    }

    /// All farms, by name.
    pub fn list_farms(&self) -> Result<Vec<FarmRecord>, AuditError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, location, contact_person, phone, created_at
             FROM farms ORDER BY name ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;

        let mut farms = Vec::new();
        for row in rows {
            let (id, name, location, contact_person, phone, created_at) = row?;
            farms.push(FarmRecord {
                id: parse_uuid(&id)?,
                name,
                location,
                contact_person,
                phone,
                created_at: parse_timestamp(&created_at)?,
            });
        }
        Ok(farms)
    }

    /// Update a farm's contact details.
    pub fn update_farm(&self, farm: &FarmRecord) -> Result<(), AuditError> {
        let changed = self.conn.execute(
            "UPDATE farms SET name = ?1, location = ?2, contact_person = ?3, phone = ?4
             WHERE id = ?5",
            params![
                farm.name,
                farm.location,
                farm.contact_person,
                farm.phone,
                farm.id.to_string(),
            ],
        )?;
        if changed == 0 {
            return Err(AuditError::FarmNotFound(farm.id));
        }
        Ok(())
    }

    /// Remove a farm from the registry. Audits that reference it keep
    /// their farm_id. Deleting a missing id is a silent no-op.
    pub fn delete_farm(&self, id: Uuid) -> Result<(), AuditError> {
        self.conn
            .execute("DELETE FROM farms WHERE id = ?1", params![id.to_string()])?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Statistics
    // -------------------------------------------------------------------------

    /// Reading counts over completed audits, optionally scoped to one
    /// farm. Warning counts Low and High readings together.
    pub fn statistics(&self, farm_id: Option<&str>) -> Result<AuditStatistics, AuditError> {
        let total_audits: usize = self.conn.query_row(
            "SELECT COUNT(*) FROM audits
             WHERE status = 'completed' AND (?1 IS NULL OR farm_id = ?1)",
            params![farm_id],
            |row| row.get::<_, i64>(0),
        )? as usize;

        let mut stmt = self.conn.prepare(
            "SELECT e.status, COUNT(*)
             FROM audit_entries e
             JOIN audits a ON a.id = e.audit_id
             WHERE a.status = 'completed' AND (?1 IS NULL OR a.farm_id = ?1)
             GROUP BY e.status",
        )?;
        let rows = stmt.query_map(params![farm_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut stats = AuditStatistics {
            total_audits,
            critical_issues: 0,
            warning_issues: 0,
            normal_readings: 0,
        };
        for row in rows {
            let (status, count) = row?;
            let count = count as usize;
            match ParameterStatus::from_str(&status) {
                ParameterStatus::Critical => stats.critical_issues += count,
                ParameterStatus::Low | ParameterStatus::High => stats.warning_issues += count,
                ParameterStatus::Normal => stats.normal_readings += count,
            }
        }
        Ok(stats)
    }
}

// =============================================================================
// Row mapping helpers
// =============================================================================

/// Raw audit row as read from SQLite, before JSON decoding.
struct AuditRow {
    farm_id: Option<String>,
    notes: String,
    status: String,
    created_at: String,
    updated_at: String,
    farm_info: Option<String>,
    milking_time: Option<String>,
    detacher: Option<String>,
    pulsator: Option<String>,
    pulsation_avg: Option<String>,
    voltage: Option<String>,
    diagnostics: Option<String>,
    recommendations: Option<String>,
}

impl AuditRow {
    fn into_session(self, id: Uuid) -> Result<AuditSession, AuditError> {
        Ok(AuditSession {
            id,
            farm_id: self.farm_id,
            notes: self.notes,
            status: AuditStatus::from_str(&self.status),
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
            farm_info: decode_section(id, "farm_info", self.farm_info),
            milking_time_rows: decode_section(id, "milking_time", self.milking_time),
            detacher_settings: decode_section(id, "detacher", self.detacher),
            pulsator_rows: decode_section(id, "pulsator", self.pulsator),
            pulsation_averages: decode_section(id, "pulsation_avg", self.pulsation_avg),
            voltage_checks: decode_section(id, "voltage", self.voltage),
            diagnostics: decode_section(id, "diagnostics", self.diagnostics),
            recommendations: decode_section(id, "recommendations", self.recommendations),
        })
    }
}

/// Decode one section blob. A malformed blob is logged and replaced with
/// the section's initial value; it never fails the whole load and never
/// touches the other sections.
fn decode_section<T: DeserializeOwned + Default>(
    audit_id: Uuid,
    section: &str,
    json: Option<String>,
) -> T {
    let Some(text) = json else {
        return T::default();
    };
    match serde_json::from_str(&text) {
        Ok(value) => value,
        Err(e) => {
            warn!(
                "Discarding unreadable {} section of audit {}: {}",
                section, audit_id, e
            );
            T::default()
        }
    }
}

type SummaryRow = (
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    String,
    String,
    String,
    String,
);

fn summary_columns(row: &rusqlite::Row<'_>) -> rusqlite::Result<SummaryRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
    ))
}

fn collect_summaries(
    rows: impl Iterator<Item = rusqlite::Result<SummaryRow>>,
) -> Result<Vec<AuditSummary>, AuditError> {
    let mut summaries = Vec::new();
    for row in rows {
        let (id, farm_id, farm_name, technician, notes, status, created_at, updated_at) = row?;
        summaries.push(AuditSummary {
            id: parse_uuid(&id)?,
            farm_id,
            farm_name,
            technician,
            notes,
            status: AuditStatus::from_str(&status),
            created_at: parse_timestamp(&created_at)?,
            updated_at: parse_timestamp(&updated_at)?,
        });
    }
    Ok(summaries)
}

fn parse_uuid(text: &str) -> Result<Uuid, AuditError> {
    Uuid::parse_str(text)
        .map_err(|e| AuditError::Corrupt(format!("bad uuid '{}': {}", text, e)))
}

fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, AuditError> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AuditError::Corrupt(format!("bad timestamp '{}': {}", text, e)))
}

// =============================================================================
// Reading derivation
// =============================================================================

/// Derive the catalog readings a session's measurements support.
/// Readings whose inputs were never captured are skipped, not zero-filled.
fn derive_readings(session: &AuditSession) -> Vec<(&'static str, f64)> {
    let mut readings = Vec::new();
    let diag = session.diagnostics.as_ref();
    let averages = session.pulsation_averages.as_ref();
    let detacher = session.detacher_settings.as_ref();

    // Vacuum
    if let Some(v) = mean(session.milking_time_rows.iter().filter_map(|r| r.avg_vac)) {
        readings.push(("Claw Vacuum", v));
    }
    if let Some(v) = diag.and_then(|d| d.step1_receiver_vac) {
        readings.push(("Milk Line Vacuum", v));
    }
    if let (Some(inlet), Some(receiver)) = (
        diag.and_then(|d| d.step1_pump_inlet_vac),
        diag.and_then(|d| d.step1_receiver_vac),
    ) {
        readings.push(("Vacuum Reserve", inlet - receiver));
    }

    // Pulsation
    if let Some(v) = averages.and_then(|a| a.rate) {
        readings.push(("Pulsation Rate", v));
    }
    if let Some(v) = averages.and_then(|a| mean([a.ratio1, a.ratio2].into_iter().flatten())) {
        readings.push(("Pulsation Ratio", v));
    }
    if let Some(v) = diag.and_then(|d| d.step1_pulsator_airline_vac) {
        readings.push(("Pulsation Vacuum", v));
    }

    // Flow
    let flows = || session.milking_time_rows.iter().filter_map(|r| r.flow_rate);
    if let Some(v) = flows().reduce(f64::max) {
        readings.push(("Peak Flow Rate", v));
    }
    if let Some(v) = mean(flows()) {
        readings.push(("Average Flow Rate", v));
    }

    // Detacher
    if let Some(v) = detacher.and_then(|d| d.detach_flow_setting) {
        readings.push(("Detach Flow Rate", v));
    }
    if let Some(v) = detacher.and_then(|d| d.cluster_removal_delay) {
        readings.push(("Detach Delay", v));
    }

    readings
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let mut sum = 0.0;
    let mut count = 0usize;
    for v in values {
        sum += v;
        count += 1;
    }
    (count > 0).then(|| sum / count as f64)
}
