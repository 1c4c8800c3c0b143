// ABOUTME: Hash methods applied to `_hash` columns before they are stored
// ABOUTME: bcrypt by default, hex SHA-256 for tables that expect plain digests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Hashing of secret columns.
//!
//! Columns named `<field>_hash` are shown as `<field>` in forms and the submitted
//! value is hashed with the configured [`HashMethod`] before it is written.

use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use subtle::ConstantTimeEq;

/// Hash function applied to hashed columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashMethod {
    /// bcrypt with the library's default cost
    #[default]
    Bcrypt,
    /// Hex encoded SHA-256 digest
    Sha256,
}

impl HashMethod {
    /// Hash a plain value
    ///
    /// # Errors
    ///
    /// Returns an error if bcrypt hashing fails
    pub fn hash(self, value: &str) -> AppResult<String> {
        match self {
            Self::Bcrypt => bcrypt::hash(value, bcrypt::DEFAULT_COST)
                .map_err(|e| AppError::internal(format!("Failed to hash value: {e}"))),
            Self::Sha256 => Ok(sha256_hex(value)),
        }
    }

    /// Check a plain value against a stored hash
    ///
    /// # Errors
    ///
    /// Returns an error if the stored bcrypt hash is malformed
    pub fn verify(self, value: &str, hash: &str) -> AppResult<bool> {
        match self {
            Self::Bcrypt => bcrypt::verify(value, hash)
                .map_err(|e| AppError::internal(format!("Failed to verify hash: {e}"))),
            Self::Sha256 => Ok(sha256_hex(value).as_bytes().ct_eq(hash.as_bytes()).into()),
        }
    }
}

impl FromStr for HashMethod {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bcrypt" => Ok(Self::Bcrypt),
            "sha256" | "sha-256" => Ok(Self::Sha256),
            other => Err(AppError::config(format!("Unknown hash method: {other}"))),
        }
    }
}

impl fmt::Display for HashMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bcrypt => write!(f, "bcrypt"),
            Self::Sha256 => write!(f, "sha256"),
        }
    }
}

fn sha256_hex(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_is_hex_digest() {
        let hash = HashMethod::Sha256.hash("secret").unwrap();
        assert_eq!(hash.len(), 64);
        assert!(HashMethod::Sha256.verify("secret", &hash).unwrap());
        assert!(!HashMethod::Sha256.verify("other", &hash).unwrap());
    }

    #[test]
    fn test_bcrypt_round_trip() {
        let hash = HashMethod::Bcrypt.hash("secret").unwrap();
        assert!(hash.starts_with("$2"));
        assert!(HashMethod::Bcrypt.verify("secret", &hash).unwrap());
    }

    #[test]
    fn test_parse_hash_method() {
        assert_eq!("SHA256".parse::<HashMethod>().unwrap(), HashMethod::Sha256);
        assert!("md5".parse::<HashMethod>().is_err());
    }
}
