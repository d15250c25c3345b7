//! Accumulator checkpoints.
//!
//! A checkpoint file is framed as
//!
//! ```text
//! "STHULL" | version u32 | Checkpoint | blake3(all preceding bytes) [32]
//! ```
//!
//! with the version and the checkpoint encoded by bincode's standard
//! configuration. `next_offset` is the resume offset a following run should
//! pass so its labels continue where this run stopped.

use crate::field::HullField;
use bincode::config;
use bincode::error::{DecodeError, EncodeError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

const MAGIC: &[u8; 6] = b"STHULL";
const VERSION: u32 = 2;
const DIGEST_LEN: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("checkpoint I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("not a hull checkpoint")]
    BadMagic,
    #[error("unsupported checkpoint version {0}")]
    UnsupportedVersion(u32),
    #[error("checkpoint truncated: expected at least {expected} bytes, found {actual}")]
    Truncated { expected: usize, actual: usize },
    #[error("checkpoint digest mismatch")]
    DigestMismatch,
    #[error("failed to encode checkpoint: {0}")]
    Encode(#[from] EncodeError),
    #[error("failed to decode checkpoint: {0}")]
    Decode(#[from] DecodeError),
    #[error("checkpoint has {0} unread trailing bytes")]
    TrailingBytes(usize),
    #[error("checkpoint holds a {found:?} hull, expected {expected:?}")]
    ShapeMismatch {
        expected: (usize, usize, usize),
        found: (usize, usize, usize),
    },
}

/// A persisted accumulator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub cells: HullField,
    pub next_offset: u64,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl Checkpoint {
    pub fn new(cells: HullField, next_offset: u64) -> Self {
        Self {
            cells,
            next_offset,
            created_at: Utc::now(),
        }
    }

    /// Serializes the checkpoint, digest last.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CheckpointError> {
        seal(VERSION, self)
    }

    /// Parses and verifies a serialized checkpoint.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CheckpointError> {
        let body_len = bytes
            .len()
            .checked_sub(DIGEST_LEN)
            .filter(|&n| n >= MAGIC.len())
            .ok_or(CheckpointError::Truncated {
                expected: MAGIC.len() + DIGEST_LEN,
                actual: bytes.len(),
            })?;
        let (body, digest) = bytes.split_at(body_len);
        if !body.starts_with(MAGIC) {
            return Err(CheckpointError::BadMagic);
        }
        if blake3::hash(body).as_bytes()[..] != digest[..] {
            return Err(CheckpointError::DigestMismatch);
        }

        let payload = &body[MAGIC.len()..];
        let (version, header_len): (u32, usize) = bincode::serde::decode_from_slice(payload, config::standard())?;
        if version != VERSION {
            return Err(CheckpointError::UnsupportedVersion(version));
        }

        let (checkpoint, used): (Checkpoint, usize) =
            bincode::serde::decode_from_slice(&payload[header_len..], config::standard())?;
        let trailing = payload.len() - header_len - used;
        if trailing > 0 {
            return Err(CheckpointError::TrailingBytes(trailing));
        }
        Ok(checkpoint)
    }

    /// Writes the checkpoint to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), CheckpointError> {
        std::fs::write(path.as_ref(), self.to_bytes()?)?;
        tracing::info!(
            path = %path.as_ref().display(),
            next_offset = self.next_offset,
            "Checkpoint saved"
        );
        Ok(())
    }

    /// Reads and verifies a checkpoint from `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CheckpointError> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_bytes(&bytes)
    }
}

fn seal(version: u32, checkpoint: &Checkpoint) -> Result<Vec<u8>, CheckpointError> {
    let mut bytes = MAGIC.to_vec();
    bincode::serde::encode_into_std_write(version, &mut bytes, config::standard())?;
    bincode::serde::encode_into_std_write(checkpoint, &mut bytes, config::standard())?;
    let digest = blake3::hash(&bytes);
    bytes.extend_from_slice(digest.as_bytes());
    Ok(bytes)
}
