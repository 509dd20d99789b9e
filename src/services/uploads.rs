// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Uploaded file storage.
//!
//! Files get a random name that keeps the original extension and are served
//! back under `/uploads`. Content type and size are not checked.

use crate::error::{AppError, Result};
use std::path::{Path, PathBuf};

/// URL prefix uploaded files are served from.
pub const PUBLIC_PREFIX: &str = "/uploads";

#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

/// Extension of the client's file name, without the dot.
fn extension(original_name: &str) -> Option<&str> {
    // Only the final path component counts; clients may send full paths.
    let file_name = original_name.rsplit(['/', '\\']).next().unwrap_or(original_name);
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Store a file and return its public path.
    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> Result<String> {
        let name = match extension(original_name) {
            Some(ext) => format!("{}.{}", uuid::Uuid::new_v4(), ext),
            None => uuid::Uuid::new_v4().to_string(),
        };

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("create upload dir: {}", e)))?;
        tokio::fs::write(self.dir.join(&name), bytes)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("write upload: {}", e)))?;

        tracing::info!(file = %name, size = bytes.len(), "File uploaded");
        Ok(format!("{}/{}", PUBLIC_PREFIX, name))
    }
}
