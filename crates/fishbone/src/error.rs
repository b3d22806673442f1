//! Error types for Fishbone operations.
//!
//! This module provides the main error type [`FishboneError`] which wraps
//! the error conditions the engine can report. None of them is fatal to an
//! editing session: a rejected import keeps the current model, a rejected
//! drag leaves the drag state untouched.

use std::io;

use thiserror::Error;

use fishbone_core::identifier::Id;

use crate::{document::ImportError, drag::DragError};

/// The main error type for Fishbone operations.
#[derive(Debug, Error)]
pub enum FishboneError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Import rejected: {0}")]
    Import(#[from] ImportError),

    #[error("Drag error: {0}")]
    Drag(#[from] DragError),

    #[error("Unknown block `{0}`")]
    UnknownBlock(Id),

    #[error("Unknown category `{0}`")]
    UnknownCategory(Id),

    #[error("Category `{0}` must keep at least one heading")]
    LastBlock(Id),

    #[error("Invalid appearance: {0}")]
    Appearance(String),

    #[error("Export error: {0}")]
    Export(Box<dyn std::error::Error>),
}
