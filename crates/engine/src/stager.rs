// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Directory staging: clearing leftovers and promoting staged output.
//!
//! Every step pushes a human-readable note before and after it runs. The
//! orchestrator copies those notes into the job log, so a polling client
//! sees exactly which renames happened.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use wg_core::StageLayout;

/// Errors from staging filesystem operations.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("staging directory missing: {}", .0.display())]
    StagingMissing(PathBuf),

    #[error("failed to {op} {}: {source}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// What a successful promotion did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Promotion {
    /// A previous live directory was replaced
    pub replaced_previous: bool,
    /// Transient files removed from the new live directory
    pub removed_transient: usize,
}

impl std::fmt::Display for Promotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let previous = if self.replaced_previous { "replaced previous data" } else { "no previous data" };
        write!(f, "Promoted new data ({}, {} transient file(s) removed)", previous, self.removed_transient)
    }
}

/// Filesystem operations that move generated data into place.
pub trait Stager: Send + Sync {
    fn layout(&self) -> &StageLayout;

    /// Remove `staging` and any leftover `backup`.
    ///
    /// Not-found is success. When `live` is missing but `backup` exists, the
    /// backup is an interrupted promotion's rollback point and is restored
    /// to `live` rather than deleted.
    fn clear_staging(&self, notes: &mut Vec<String>) -> Result<(), StageError>;

    /// Swap `staging` into `live`, keeping the old `live` as `backup` until
    /// the swap succeeded.
    ///
    /// Fails without touching `live` when `staging` does not exist.
    fn promote(&self, notes: &mut Vec<String>) -> Result<Promotion, StageError>;
}

type RenameFn = fn(&Path, &Path) -> io::Result<()>;
type RemoveTreeFn = fn(&Path) -> io::Result<()>;

/// [`Stager`] over the local filesystem.
pub struct FsStager {
    layout: StageLayout,
    transient_extension: String,
    rename: RenameFn,
    remove_tree: RemoveTreeFn,
}

impl FsStager {
    pub fn new(layout: StageLayout, transient_extension: impl Into<String>) -> Self {
        let transient_extension = transient_extension.into();
        let transient_extension = transient_extension.trim_start_matches('.').to_string();
        Self { layout, transient_extension, rename: rename_dir, remove_tree }
    }

    #[cfg(test)]
    fn with_rename(mut self, rename: RenameFn) -> Self {
        self.rename = rename;
        self
    }

    #[cfg(test)]
    fn with_remove_tree(mut self, remove_tree: RemoveTreeFn) -> Self {
        self.remove_tree = remove_tree;
        self
    }

    /// Remove a directory tree (or a stray file). Returns whether anything existed.
    fn remove_if_exists(&self, path: &Path) -> Result<bool, StageError> {
        let meta = match fs::symlink_metadata(path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(source) => return Err(StageError::Io { op: "stat", path: path.to_path_buf(), source }),
        };
        let result = if meta.is_dir() { (self.remove_tree)(path) } else { fs::remove_file(path) };
        match result {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(StageError::Io { op: "remove", path: path.to_path_buf(), source }),
        }
    }

    fn remove_transient(&self, notes: &mut Vec<String>) -> usize {
        let live = self.layout.live();
        if self.transient_extension.is_empty() {
            return 0;
        }
        notes.push(format!("Deleting *.{} files in: {}", self.transient_extension, live.display()));

        let entries = match fs::read_dir(live) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(path = %live.display(), error = %e, "failed to list live directory");
                notes.push(format!("Error: failed to list {}: {}", live.display(), e));
                return 0;
            }
        };

        let mut removed = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            let matches = path
                .extension()
                .is_some_and(|ext| ext.to_string_lossy() == self.transient_extension.as_str());
            if !is_file || !matches {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to remove transient file");
                    notes.push(format!("Error: failed to remove {}: {}", path.display(), e));
                }
            }
        }
        notes.push(format!("Deleted {} transient file(s)", removed));
        removed
    }
}

impl Stager for FsStager {
    fn layout(&self) -> &StageLayout {
        &self.layout
    }

    fn clear_staging(&self, notes: &mut Vec<String>) -> Result<(), StageError> {
        let mut first_err = None;

        let staging = self.layout.staging();
        notes.push(format!("Deleting directory: {}", staging.display()));
        if let Err(e) = self.remove_if_exists(staging) {
            tracing::warn!(error = %e, "failed to clear staging directory");
            notes.push(format!("Error: {}", e));
            first_err.get_or_insert(e);
        }

        let (live, backup) = (self.layout.live(), self.layout.backup());
        if !exists(live) && exists(backup) {
            notes.push(format!(
                "Restoring directory: {} to {}",
                backup.display(),
                live.display()
            ));
            tracing::warn!(
                backup = %backup.display(),
                "live directory missing; restoring backup from interrupted promotion"
            );
            if let Err(source) = (self.rename)(backup, live) {
                let e = StageError::Io { op: "restore", path: backup.to_path_buf(), source };
                notes.push(format!("Error: {}", e));
                first_err.get_or_insert(e);
            }
        } else {
            notes.push(format!("Deleting directory: {}", backup.display()));
            if let Err(e) = self.remove_if_exists(backup) {
                tracing::warn!(error = %e, "failed to clear backup directory");
                notes.push(format!("Error: {}", e));
                first_err.get_or_insert(e);
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn promote(&self, notes: &mut Vec<String>) -> Result<Promotion, StageError> {
        let (live, staging, backup) =
            (self.layout.live(), self.layout.staging(), self.layout.backup());

        if !staging.is_dir() {
            notes.push(format!("Error: staging directory missing: {}", staging.display()));
            return Err(StageError::StagingMissing(staging.to_path_buf()));
        }

        // 1. live -> backup
        let replaced_previous = exists(live);
        if replaced_previous {
            // Stale backup from an earlier run; live is present so it is not needed
            if exists(backup) {
                notes.push(format!("Deleting directory: {}", backup.display()));
                if let Err(e) = self.remove_if_exists(backup) {
                    tracing::warn!(error = %e, "failed to remove stale backup directory");
                    notes.push(format!("Error: {}", e));
                    return Err(e);
                }
                notes.push(format!("Deleted directory: {}", backup.display()));
            }
            notes.push(format!("Renaming directory: {} to {}", live.display(), backup.display()));
            if let Err(source) = (self.rename)(live, backup) {
                let e = StageError::Io { op: "rename", path: live.to_path_buf(), source };
                notes.push(format!("Error: {}", e));
                return Err(e);
            }
            notes.push(format!("Renamed directory: {} to {}", live.display(), backup.display()));
        }

        // 2. staging -> live
        notes.push(format!("Renaming directory: {} to {}", staging.display(), live.display()));
        if let Err(source) = (self.rename)(staging, live) {
            let err = StageError::Io { op: "rename", path: staging.to_path_buf(), source };
            notes.push(format!("Error: {}", err));
            if replaced_previous {
                notes.push(format!(
                    "Restoring directory: {} to {}",
                    backup.display(),
                    live.display()
                ));
                if let Err(e) = (self.rename)(backup, live) {
                    tracing::error!(
                        backup = %backup.display(),
                        error = %e,
                        "rollback failed; previous data left in backup directory"
                    );
                    notes.push(format!("Error: rollback failed: {}", e));
                }
            }
            return Err(err);
        }
        notes.push(format!("Renamed directory: {} to {}", staging.display(), live.display()));

        // 3. transient cleanup
        let removed_transient = self.remove_transient(notes);

        // 4. drop backup
        if exists(backup) {
            notes.push(format!("Deleting directory: {}", backup.display()));
            match self.remove_if_exists(backup) {
                Ok(_) => notes.push(format!("Deleted directory: {}", backup.display())),
                Err(e) => {
                    tracing::warn!(error = %e, "failed to remove backup after promotion");
                    notes.push(format!("Error: {}", e));
                }
            }
        }

        tracing::info!(
            live = %live.display(),
            replaced_previous,
            removed_transient,
            "promoted staging directory"
        );
        Ok(Promotion { replaced_previous, removed_transient })
    }
}

fn rename_dir(from: &Path, to: &Path) -> io::Result<()> {
    fs::rename(from, to)
}

fn remove_tree(path: &Path) -> io::Result<()> {
    fs::remove_dir_all(path)
}

fn exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

#[cfg(test)]
#[path = "stager_tests.rs"]
mod tests;
