//! Hash-only audit trail.
//!
//! The recorder turns a finished verdict into an [`AuditRecord`] and hands it
//! to an [`AuditSink`]. Writes are retried with exponential backoff; a write
//! that still fails is reported to the caller and never changes the verdict.
//!
//! The bundled sink is an append-only JSONL file, one record per line, with
//! an exclusive file lock held for each append. A failed append is rolled
//! back to the previous file length. Reads skip lines that do not parse
//! and keep the first record seen for each id.

use std::collections::HashSet;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs::{self, File};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::domain::{AuditRecord, ValidationRequest, ValidationResult};
use crate::error::GovernanceError;

/// SHA-256 of the text, hex encoded (64 chars)
pub fn hash_text(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

/// Destination for audit records. Implementations must be append-only.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Human-readable sink name
    fn name(&self) -> &str;

    /// Durably append one record
    async fn append(&self, record: &AuditRecord) -> Result<()>;
}

/// Retry policy for failed audit writes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including first try)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial delay between retries in milliseconds
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,

    /// Maximum delay between retries in milliseconds
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,

    /// Backoff multiplier (delay *= multiplier after each retry)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

fn default_max_attempts() -> u32 {
    3
}
fn default_initial_delay() -> u64 {
    200
}
fn default_max_delay() -> u64 {
    5000
}
fn default_backoff_multiplier() -> f64 {
    2.0
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay(),
            max_delay_ms: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

impl RetryPolicy {
    /// Calculate delay after a failed attempt (1-indexed)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::from_millis(self.initial_delay_ms);
        }

        let delay = self.initial_delay_ms as f64
            * self.backoff_multiplier.powi((attempt - 1) as i32);

        let capped = delay.min(self.max_delay_ms as f64) as u64;
        Duration::from_millis(capped)
    }

    /// Check if we should retry based on attempt count
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

/// Builds audit records and writes them with retries
pub struct AuditRecorder {
    sink: Arc<dyn AuditSink>,
    retry: RetryPolicy,
}

impl AuditRecorder {
    pub fn new(sink: Arc<dyn AuditSink>, retry: RetryPolicy) -> Self {
        Self { sink, retry }
    }

    /// Shape a record from a finished verdict. Raw text never leaves here.
    pub fn build_record(request: &ValidationRequest, result: &ValidationResult) -> AuditRecord {
        AuditRecord {
            id: Uuid::new_v4(),
            user_id: request.user_id.clone(),
            action_type: request.intent,
            original_text_hash: hash_text(&request.original_text),
            proposed_text_hash: hash_text(&request.proposed_text),
            similarity_score: result.similarity_score,
            risk_label: result.risk_label,
            decision: result.decision,
            created_at: Utc::now(),
        }
    }

    /// Write a record, retrying per policy
    pub async fn write(&self, record: AuditRecord) -> Result<AuditRecord, GovernanceError> {
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            match self.sink.append(&record).await {
                Ok(()) => {
                    debug!(audit_id = %record.id, sink = self.sink.name(), attempt, "Audit record written");
                    return Ok(record);
                }
                Err(e) if self.retry.should_retry(attempt) => {
                    let delay = self.retry.delay_for_attempt(attempt);
                    warn!(
                        audit_id = %record.id,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Audit write failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    error!(audit_id = %record.id, attempt, error = %e, "Audit write failed permanently");
                    return Err(GovernanceError::AuditWriteFailed {
                        attempts: attempt,
                        reason: format!("{:#}", e),
                    });
                }
            }
        }
    }

    /// Build and write on a background task
    pub fn spawn(
        self: &Arc<Self>,
        request: &ValidationRequest,
        result: &ValidationResult,
    ) -> AuditHandle {
        let record = Self::build_record(request, result);
        let recorder = Arc::clone(self);
        AuditHandle {
            audit_id: record.id,
            task: tokio::spawn(async move { recorder.write(record).await }),
        }
    }
}

/// Pending audit write.
///
/// Dropping the handle leaves the write running in the background.
pub struct AuditHandle {
    audit_id: Uuid,
    task: JoinHandle<Result<AuditRecord, GovernanceError>>,
}

impl AuditHandle {
    /// Id the record will carry once written
    pub fn audit_id(&self) -> Uuid {
        self.audit_id
    }

    /// Wait for the write to become durable (or to fail for good)
    pub async fn wait(self) -> Result<AuditRecord, GovernanceError> {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => Err(GovernanceError::AuditWriteFailed {
                attempts: 0,
                reason: format!("audit task cancelled: {}", e),
            }),
        }
    }
}

/// Append-only JSONL audit log
pub struct JsonlAuditStore {
    path: PathBuf,
}

impl JsonlAuditStore {
    /// Open (creating parent directories) a store at the given file path
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create audit directory: {}", parent.display()))?;
        }
        Ok(Self { path })
    }

    /// Open the store in the configured home directory
    pub async fn open_default() -> Result<Self> {
        Self::open(crate::config::audit_log_path()?).await
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every record in write order.
    ///
    /// Torn lines are skipped with a warning and repeated ids are dropped.
    pub async fn replay(&self) -> Result<Vec<AuditRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)
            .await
            .with_context(|| format!("Failed to open audit log: {}", self.path.display()))?;

        let mut lines = BufReader::new(file).lines();
        let mut records = Vec::new();
        let mut seen = HashSet::new();
        let mut line_number = 0usize;

        while let Some(line) = lines.next_line().await? {
            line_number += 1;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<AuditRecord>(&line) {
                Ok(record) => {
                    if seen.insert(record.id) {
                        records.push(record);
                    }
                }
                Err(e) => {
                    warn!(
                        path = %self.path.display(),
                        line = line_number,
                        error = %e,
                        "Skipping unreadable audit line"
                    );
                }
            }
        }

        Ok(records)
    }

    /// A user's records, newest first
    pub async fn list_for_user(&self, user_id: &str, limit: usize) -> Result<Vec<AuditRecord>> {
        let mut records: Vec<AuditRecord> = self
            .replay()
            .await?
            .into_iter()
            .filter(|r| r.user_id == user_id)
            .collect();

        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records.truncate(limit);
        Ok(records)
    }
}

#[async_trait]
impl AuditSink for JsonlAuditStore {
    fn name(&self) -> &str {
        "jsonl"
    }

    async fn append(&self, record: &AuditRecord) -> Result<()> {
        let json = serde_json::to_string(record).context("Failed to serialize audit record")?;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || append_locked(&path, &json))
            .await
            .context("Audit append task failed")?
    }
}

fn append_locked(path: &Path, line: &str) -> Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .read(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open audit log: {}", path.display()))?;

    file.lock_exclusive()
        .context("Failed to acquire file lock on audit log")?;

    let start = file
        .metadata()
        .context("Failed to stat audit log")?
        .len();

    let written = write_line(&mut file, start, line);
    if written.is_err() {
        // A retry must not find a partial or duplicate record
        if let Err(e) = file.set_len(start) {
            warn!(path = %path.display(), error = %e, "Failed to roll back audit append");
        }
    }

    // Lock is released when file is dropped
    written
}

fn write_line(file: &mut std::fs::File, start: u64, line: &str) -> Result<()> {
    let mut buffer = String::with_capacity(line.len() + 2);
    if start > 0 && !ends_with_newline(file)? {
        // Terminate a torn line left by an earlier crash
        buffer.push('\n');
    }
    buffer.push_str(line);
    buffer.push('\n');

    file.write_all(buffer.as_bytes())
        .context("Failed to write audit record")?;
    file.flush().context("Failed to flush audit record")?;
    file.sync_data().context("Failed to sync audit log")?;
    Ok(())
}

fn ends_with_newline(file: &mut std::fs::File) -> Result<bool> {
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))
        .context("Failed to seek audit log")?;
    file.read_exact(&mut last)
        .context("Failed to read audit log tail")?;
    Ok(last[0] == b'\n')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Decision, Intent, RiskLabel};
    use tempfile::TempDir;

    fn sample_record(user_id: &str) -> AuditRecord {
        AuditRecord {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            action_type: Intent::Rewrite,
            original_text_hash: hash_text("original"),
            proposed_text_hash: hash_text("proposed"),
            similarity_score: Some(0.91),
            risk_label: RiskLabel::Safe,
            decision: Decision::Allowed,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_hash_is_full_sha256_hex() {
        let digest = hash_text("The study found a 25% increase in 2023.");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(digest, hash_text("The study found a 25% increase in 2023."));
        assert_ne!(digest, hash_text("The study found a 25% increase in 2024."));
    }

    #[test]
    fn test_known_digest() {
        assert_eq!(
            hash_text("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_retry_policy_delays() {
        let policy = RetryPolicy {
            initial_delay_ms: 100,
            backoff_multiplier: 2.0,
            max_delay_ms: 500,
            ..Default::default()
        };

        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(400));
        assert_eq!(policy.delay_for_attempt(4), Duration::from_millis(500)); // Capped
        assert!(policy.should_retry(2));
        assert!(!policy.should_retry(3));
    }

    #[tokio::test]
    async fn test_jsonl_append_and_replay_order() {
        let temp = TempDir::new().unwrap();
        let store = JsonlAuditStore::open(temp.path().join("nested").join("audit.jsonl"))
            .await
            .unwrap();

        let first = sample_record("alice");
        let second = sample_record("bob");
        store.append(&first).await.unwrap();
        store.append(&second).await.unwrap();

        let records = store.replay().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, first.id);
        assert_eq!(records[1].id, second.id);
    }

    #[tokio::test]
    async fn test_replay_of_missing_file_is_empty() {
        let temp = TempDir::new().unwrap();
        let store = JsonlAuditStore::open(temp.path().join("audit.jsonl")).await.unwrap();
        assert!(store.replay().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_append_after_torn_line_starts_fresh() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("audit.jsonl");
        let store = JsonlAuditStore::open(&path).await.unwrap();

        let first = sample_record("alice");
        store.append(&first).await.unwrap();

        // Simulate a crash mid-append
        let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(br#"{"id":"abc"#).unwrap();
        drop(file);

        let second = sample_record("alice");
        store.append(&second).await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert_eq!(raw.lines().count(), 3);
        assert!(raw.ends_with('\n'));

        let records = store.replay().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, first.id);
        assert_eq!(records[1].id, second.id);
    }

    #[tokio::test]
    async fn test_repeated_id_is_read_once() {
        let temp = TempDir::new().unwrap();
        let store = JsonlAuditStore::open(temp.path().join("audit.jsonl")).await.unwrap();

        let record = sample_record("alice");
        store.append(&record).await.unwrap();
        store.append(&record).await.unwrap();
        store.append(&sample_record("alice")).await.unwrap();

        let records = store.replay().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, record.id);
        assert_ne!(records[1].id, record.id);
    }
}
