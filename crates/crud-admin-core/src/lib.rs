// ABOUTME: Core types and constants for the crud_admin panel
// ABOUTME: Foundation crate with error handling, column metadata, and form value coercion
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

#![deny(unsafe_code)]

//! # crud-admin core
//!
//! Foundation crate providing shared types for the admin panel. Nothing in here
//! touches the network or the database pool, which keeps it cheap to compile and
//! easy to unit test.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError` and `ErrorCode`
//! - **constants**: Defaults and naming conventions (hash suffix, table names)
//! - **models**: Column metadata, table details, and dynamically typed cell values
//! - **coercion**: Conversion of raw form strings into typed cell values

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// Application constants and default configuration values
pub mod constants;

/// Column metadata, table details, and cell values
pub mod models;

/// Form value coercion driven by column metadata
pub mod coercion;
