//! Hash-tracked backups of property files
//!
//! A backup is taken once and then preserved across edits. The sidecar
//! records the file hash at backup time and after the last edit made by this
//! tool; a file matching neither was replaced externally and gets a fresh
//! backup.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackupMetadata {
    /// Hash of the property file when the backup was created
    pub original_hash: String,

    /// Hash of the property file after the last edit
    pub last_edit_hash: String,
}

impl BackupMetadata {
    pub fn new(hash: String) -> Self {
        BackupMetadata {
            original_hash: hash.clone(),
            last_edit_hash: hash,
        }
    }
}

/// SHA-256 of a file as lowercase hex
pub fn hash_file(path: &Path) -> Result<String> {
    let data = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(hex::encode(Sha256::digest(&data)))
}

/// Backup and sidecar paths: `Table.uexp` -> `Table.uexp.bak`, `Table.uexp.bak.json`
pub fn backup_paths(path: &Path) -> (PathBuf, PathBuf) {
    let mut backup = path.as_os_str().to_owned();
    backup.push(".bak");
    let mut metadata = backup.clone();
    metadata.push(".json");
    (PathBuf::from(backup), PathBuf::from(metadata))
}

fn read_metadata(metadata_path: &Path) -> Result<Option<BackupMetadata>> {
    if !metadata_path.exists() {
        return Ok(None);
    }
    let data = fs::read_to_string(metadata_path)
        .with_context(|| format!("Failed to read {}", metadata_path.display()))?;
    let metadata = serde_json::from_str(&data)
        .with_context(|| format!("Failed to parse {}", metadata_path.display()))?;
    Ok(Some(metadata))
}

fn write_metadata(metadata_path: &Path, metadata: &BackupMetadata) -> Result<()> {
    let json = serde_json::to_string_pretty(metadata)?;
    fs::write(metadata_path, json)
        .with_context(|| format!("Failed to write {}", metadata_path.display()))
}

/// Whether the current file needs a new backup
pub fn should_create_backup(path: &Path, backup_path: &Path, metadata_path: &Path) -> Result<bool> {
    if !backup_path.exists() {
        return Ok(true);
    }

    // A backup we know nothing about is never overwritten
    let Some(metadata) = read_metadata(metadata_path)? else {
        return Ok(false);
    };

    let current = hash_file(path)?;
    Ok(current != metadata.original_hash && current != metadata.last_edit_hash)
}

/// Back up `path` if needed; returns whether a backup was written
pub fn smart_backup(path: &Path) -> Result<bool> {
    let (backup_path, metadata_path) = backup_paths(path);

    if !should_create_backup(path, &backup_path, &metadata_path)? {
        debug!(backup = %backup_path.display(), "keeping existing backup");
        return Ok(false);
    }

    fs::copy(path, &backup_path)
        .with_context(|| format!("Failed to copy {} to backup", path.display()))?;
    write_metadata(&metadata_path, &BackupMetadata::new(hash_file(path)?))?;
    info!(backup = %backup_path.display(), "created backup");
    Ok(true)
}

/// Record the hash of the freshly written file
pub fn update_after_edit(path: &Path) -> Result<()> {
    let (_, metadata_path) = backup_paths(path);
    let current = hash_file(path)?;
    let mut metadata =
        read_metadata(&metadata_path)?.unwrap_or_else(|| BackupMetadata::new(current.clone()));
    metadata.last_edit_hash = current;
    write_metadata(&metadata_path, &metadata)
}
