// ABOUTME: Schema introspection and the registry of models exposed in the admin panel
// ABOUTME: Maps model ids to table details and orders models for bulk deletion
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Schema
//!
//! The admin panel never declares tables itself. At startup it reads the schema of
//! each declared model from the database ([`introspect`]), derives per-column
//! metadata ([`metadata`]), and keeps the result in a [`ModelRegistry`].

/// Raw schema introspection via `SQLite` pragmas
pub mod introspect;
/// Derivation of admin metadata from raw table descriptions
pub mod metadata;

pub use crud_admin_core::models::{ColumnData, ColumnType, TableDetails};
pub use metadata::{capitalize, extract_column_data, extract_models_metadata};

use std::collections::{BTreeSet, HashMap};

/// Models exposed in the admin panel, in declaration order
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: Vec<TableDetails>,
    index: HashMap<String, usize>,
}

impl ModelRegistry {
    /// Build a registry from extracted table details
    #[must_use]
    pub fn new(models: Vec<TableDetails>) -> Self {
        let index = models
            .iter()
            .enumerate()
            .map(|(i, m)| (m.model_id.clone(), i))
            .collect();
        Self { models, index }
    }

    /// Details of a model
    #[must_use]
    pub fn get(&self, model_id: &str) -> Option<&TableDetails> {
        self.index.get(model_id).map(|&i| &self.models[i])
    }

    /// Whether a model is registered
    #[must_use]
    pub fn contains(&self, model_id: &str) -> bool {
        self.index.contains_key(model_id)
    }

    /// Registered model ids in declaration order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.models.iter().map(|m| m.model_id.as_str())
    }

    /// Registered models in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &TableDetails> {
        self.models.iter()
    }

    /// Number of registered models
    #[must_use]
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Whether no model is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Model ids ordered so that referencing models come before the models they reference.
    ///
    /// Deleting in this order never trips a foreign key between registered models.
    /// Models caught in a reference cycle keep their declaration order at the end.
    #[must_use]
    pub fn deletion_order(&self) -> Vec<&str> {
        let mut remaining: Vec<&TableDetails> = self.models.iter().collect();
        let mut ordered = Vec::with_capacity(remaining.len());

        while !remaining.is_empty() {
            let referenced: BTreeSet<&str> = remaining
                .iter()
                .flat_map(|m| {
                    m.foreign_keys
                        .keys()
                        .map(String::as_str)
                        .filter(move |target| *target != m.model_id)
                })
                .collect();

            let (free, blocked): (Vec<_>, Vec<_>) = remaining
                .into_iter()
                .partition(|m| !referenced.contains(m.model_id.as_str()));

            if free.is_empty() {
                ordered.extend(blocked.iter().map(|m| m.model_id.as_str()));
                break;
            }
            ordered.extend(free.iter().map(|m| m.model_id.as_str()));
            remaining = blocked;
        }

        ordered
    }
}
