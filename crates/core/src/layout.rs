// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The three sibling directories a dataset moves through.

use std::path::{Path, PathBuf};

/// `live`, `staging` (`<name>.new`) and `backup` (`<name>.bak`) under one root.
///
/// All three live in the same parent so renames between them stay on one
/// filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageLayout {
    root: PathBuf,
    live: PathBuf,
    staging: PathBuf,
    backup: PathBuf,
}

impl StageLayout {
    pub fn new(root: impl Into<PathBuf>, dataset: &str) -> Self {
        let root = root.into();
        Self {
            live: root.join(dataset),
            staging: root.join(format!("{}.new", dataset)),
            backup: root.join(format!("{}.bak", dataset)),
            root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory consumers read from
    pub fn live(&self) -> &Path {
        &self.live
    }

    /// Directory the generator writes into
    pub fn staging(&self) -> &Path {
        &self.staging
    }

    /// Previous `live`, held only while a promotion is in flight
    pub fn backup(&self) -> &Path {
        &self.backup
    }
}
