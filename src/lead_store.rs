use serde_json::Value;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::domain::lead::Lead;

/// JSON file holding every captured lead.
///
/// Records are kept exactly as found in the file, unknown fields included; an
/// append only pushes one more record. Each append is a full read-modify-write
/// without locking, so two concurrent appends may race and the last writer wins.
pub struct LeadStore {
    data_dir: PathBuf,
    file_path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    Stored,
    AlreadyPresent,
    Failed,
}

#[derive(thiserror::Error, Debug)]
pub enum LeadStoreError {
    #[error("Failed to create the data directory {0}.")]
    CreateDir(PathBuf, #[source] std::io::Error),
    #[error("Failed to serialize the lead list.")]
    Serialize(#[from] serde_json::Error),
    #[error("Failed to write the lead file {0}.")]
    Write(PathBuf, #[source] std::io::Error),
    #[error("The lead file writer task did not complete.")]
    Join(#[from] tokio::task::JoinError),
}

impl LeadStore {
    pub fn new(data_dir: impl Into<PathBuf>, file_name: &str) -> LeadStore {
        let data_dir = data_dir.into();
        let file_path = data_dir.join(file_name);

        LeadStore {
            data_dir,
            file_path,
        }
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Appends the lead unless one with the same email (ignoring case) exists.
    ///
    /// Storage failures are logged and reported in the outcome, never returned.
    #[tracing::instrument(
        name = "Append a lead to the lead store",
        skip(self, lead),
        fields(lead_email = %lead.email)
    )]
    pub async fn append(&self, lead: Lead) -> StoreOutcome {
        match self.try_append(lead).await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::error!("Failed to persist lead: {:?}", err);
                StoreOutcome::Failed
            }
        }
    }

    async fn try_append(&self, lead: Lead) -> Result<StoreOutcome, LeadStoreError> {
        tokio::fs::create_dir_all(&self.data_dir)
            .await
            .map_err(|err| LeadStoreError::CreateDir(self.data_dir.clone(), err))?;

        let mut records = self.read_records().await;
        let email = lead.email.to_lowercase();
        let is_duplicate = records.iter().any(|record| {
            record
                .get("email")
                .and_then(Value::as_str)
                .map_or(false, |existing| existing.to_lowercase() == email)
        });

        if is_duplicate {
            tracing::info!("Lead already present, nothing to store");
            return Ok(StoreOutcome::AlreadyPresent);
        }

        records.push(serde_json::to_value(&lead)?);

        let content = serde_json::to_string_pretty(&records)?;
        let data_dir = self.data_dir.clone();
        let file_path = self.file_path.clone();

        tokio::task::spawn_blocking(move || write_atomic(&data_dir, &file_path, &content))
            .await??;

        Ok(StoreOutcome::Stored)
    }

    /// Every stored lead. A missing or unreadable file counts as an empty list.
    pub async fn read_all(&self) -> Vec<Lead> {
        self.read_records().await.iter().map(Lead::from_record).collect()
    }

    // Raw records as stored; anything but a JSON array reads as empty
    async fn read_records(&self) -> Vec<Value> {
        let raw = match tokio::fs::read_to_string(&self.file_path).await {
            Ok(raw) => raw,
            Err(err) => {
                tracing::debug!("Lead file not readable, using an empty list: {:?}", err);
                return Vec::new();
            }
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(records)) => records,
            Ok(_) => {
                tracing::warn!("Lead file does not hold a list, ignoring it");
                Vec::new()
            }
            Err(err) => {
                tracing::warn!("Lead file is not valid JSON, ignoring it: {:?}", err);
                Vec::new()
            }
        }
    }
}

/// Replaces the lead file through a temporary file in the same directory, so a
/// failed write never leaves a truncated list behind.
fn write_atomic(data_dir: &Path, file_path: &Path, content: &str) -> Result<(), LeadStoreError> {
    let to_write_error = |err: std::io::Error| LeadStoreError::Write(file_path.to_path_buf(), err);

    let mut temp_file = tempfile::NamedTempFile::new_in(data_dir).map_err(to_write_error)?;

    temp_file
        .write_all(content.as_bytes())
        .map_err(to_write_error)?;
    temp_file
        .persist(file_path)
        .map_err(|err| to_write_error(err.error))?;

    Ok(())
}
