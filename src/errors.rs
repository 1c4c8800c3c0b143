// ABOUTME: Unified error handling for the admin panel, re-exported from crud-admin-core
// ABOUTME: Library code returns AppResult; handlers turn AppError into JSON responses
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Unified Error Handling System
//!
//! Error codes, the [`AppError`] type and its HTTP rendering live in
//! `crud-admin-core` so they can be shared without pulling in the web stack.
//! Constraint failures on user writes are not errors at this level: handlers
//! classify them with [`crate::database::ConstraintViolation`] and flash them.

pub use crud_admin_core::coercion::CoercionError;
pub use crud_admin_core::errors::{
    AppError, AppResult, ErrorCode, ErrorResponse, ErrorResponseDetails,
};
