// ABOUTME: Data presets: YAML files naming CSV files to load into registered models
// ABOUTME: Lists presets from the presets folder and applies one, optionally clearing the database first
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Presets
//!
//! A preset is a YAML file in the presets folder:
//!
//! ```yaml
//! id: demo
//! name: Demo data
//! description: Users with a few posts
//! files:
//!   users: csv/users.csv
//!   posts: csv/posts.csv
//! ```
//!
//! Files load in the order written, so referenced models go first. Relative
//! CSV paths resolve against the directory of the preset file.

use crate::csv_import::{upload_csv, UploadReport};
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::hashing::HashMethod;
use crate::schema::ModelRegistry;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A loadable preset
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Preset {
    /// Identifier used in URLs, defaults to the file stem
    pub id: String,
    /// Display name
    pub name: String,
    /// Free-form description
    pub description: String,
    /// Model id and CSV path, in load order
    pub files: Vec<(String, PathBuf)>,
    /// Preset file the definition came from
    pub source: PathBuf,
}

#[derive(Debug, Deserialize)]
struct PresetFile {
    id: Option<String>,
    name: Option<String>,
    #[serde(default)]
    description: String,
    files: serde_yaml::Mapping,
}

impl Preset {
    /// Parse a preset definition read from `source`
    ///
    /// # Errors
    ///
    /// Returns `InvalidFormat` if the YAML is malformed or `files` is not a map of strings
    pub fn parse(yaml: &str, source: &Path) -> AppResult<Self> {
        let file: PresetFile = serde_yaml::from_str(yaml).map_err(|e| {
            AppError::invalid_input(format!("Invalid preset {}: {e}", source.display()))
        })?;

        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let base = source.parent().unwrap_or_else(|| Path::new("."));

        let files = file
            .files
            .iter()
            .map(|(model, path)| match (model.as_str(), path.as_str()) {
                (Some(model), Some(path)) => Ok((model.to_owned(), base.join(path))),
                _ => Err(AppError::invalid_input(format!(
                    "Invalid preset {}: files must map model ids to CSV paths",
                    source.display()
                ))),
            })
            .collect::<AppResult<Vec<_>>>()?;

        let id = file.id.unwrap_or(stem);
        Ok(Self {
            name: file.name.unwrap_or_else(|| id.clone()),
            id,
            description: file.description,
            files,
            source: source.to_path_buf(),
        })
    }
}

/// Load every `.yml`/`.yaml` preset in `folder`, sorted by file name.
///
/// A missing folder yields no presets; unreadable files are skipped with a warning.
///
/// # Errors
///
/// Returns an error if the folder exists but cannot be listed
pub async fn load_presets(folder: &Path) -> AppResult<Vec<Preset>> {
    let mut entries = match tokio::fs::read_dir(folder).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(folder = %folder.display(), "Presets folder does not exist");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };

    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yml" | "yaml")
        ) {
            paths.push(path);
        }
    }
    paths.sort();

    let mut presets = Vec::with_capacity(paths.len());
    for path in paths {
        let loaded = match tokio::fs::read_to_string(&path).await {
            Ok(yaml) => Preset::parse(&yaml, &path),
            Err(e) => Err(e.into()),
        };
        match loaded {
            Ok(preset) => presets.push(preset),
            Err(e) => warn!(path = %path.display(), "Skipping preset: {}", e.message),
        }
    }
    Ok(presets)
}

/// Find a preset by id
///
/// # Errors
///
/// Returns `ResourceNotFound` if no preset has that id
pub async fn find_preset(folder: &Path, preset_id: &str) -> AppResult<Preset> {
    load_presets(folder)
        .await?
        .into_iter()
        .find(|p| p.id == preset_id)
        .ok_or_else(|| AppError::not_found(format!("Preset {preset_id}")))
}

/// Options for [`apply_preset`]
#[derive(Debug, Clone, Copy, Default)]
pub struct PresetOptions {
    /// Delete all rows of registered models first
    pub with_drop: bool,
    /// Hash method for hashed columns named by display name
    pub hash_method: HashMethod,
    /// Update rows whose identity already exists
    pub update_existing: bool,
}

/// Per-model results of loading a preset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PresetReport {
    /// Preset id
    pub preset_id: String,
    /// Import report per model, in load order
    pub models: Vec<(String, UploadReport)>,
}

/// Load every CSV file of a preset into its model
///
/// # Errors
///
/// Returns an error if clearing fails, a model is not registered, a file cannot be
/// read, or a CSV file is malformed
pub async fn apply_preset(
    database: &Database,
    registry: &ModelRegistry,
    preset: &Preset,
    options: PresetOptions,
) -> AppResult<PresetReport> {
    for (model_id, _) in &preset.files {
        if !registry.contains(model_id) {
            return Err(AppError::invalid_input(format!(
                "Preset {} refers to model {model_id} which is not registered",
                preset.id
            )));
        }
    }

    if options.with_drop {
        database.clear_all(registry).await?;
    }

    let mut report = PresetReport {
        preset_id: preset.id.clone(),
        models: Vec::with_capacity(preset.files.len()),
    };
    for (model_id, path) in &preset.files {
        let Some(details) = registry.get(model_id) else {
            continue;
        };
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            AppError::storage(format!("Cannot read {}: {e}", path.display()))
        })?;
        let model_report = upload_csv(
            database,
            details,
            bytes.as_slice(),
            options.hash_method,
            options.update_existing,
        )
        .await?;
        report.models.push((model_id.clone(), model_report));
    }

    info!(preset = %preset.id, drop = options.with_drop, "Preset loaded");
    Ok(report)
}
