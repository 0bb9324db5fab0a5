//! Field identities and the lock registry.
//!
//! Every quantity the calculator tracks is one of seven [`FieldKind`]
//! variants; the solver dispatches on the variant exhaustively, never on
//! string ids. A field is either locked (user-authoritative) or free
//! (solver-authoritative); the registry enforces that at least one field
//! stays free.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// The seven logical quantities the calculator tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldKind {
    Pieces,
    Thickness,
    Width,
    Length,
    Price,
    #[serde(rename = "total-board-feet")]
    TotalVolume,
    TotalCost,
}

impl FieldKind {
    /// All fields in display order.
    pub const ALL: [FieldKind; 7] = [
        FieldKind::Pieces,
        FieldKind::Thickness,
        FieldKind::Width,
        FieldKind::Length,
        FieldKind::Price,
        FieldKind::TotalVolume,
        FieldKind::TotalCost,
    ];

    /// Stable key used for persistence and the wire protocol.
    pub fn storage_key(&self) -> &'static str {
        match self {
            Self::Pieces => "pieces",
            Self::Thickness => "thickness",
            Self::Width => "width",
            Self::Length => "length",
            Self::Price => "price",
            Self::TotalVolume => "total-board-feet",
            Self::TotalCost => "total-cost",
        }
    }

    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.storage_key() == key)
    }

    /// Human-readable name for notices.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Pieces => "Number of Pieces",
            Self::Thickness => "Thickness",
            Self::Width => "Width",
            Self::Length => "Length",
            Self::Price => "Price per Board Foot",
            Self::TotalVolume => "Total Board Feet",
            Self::TotalCost => "Total Cost",
        }
    }

    pub fn is_dimension(&self) -> bool {
        matches!(self, Self::Thickness | Self::Width | Self::Length)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.storage_key())
    }
}

/// Raised when a lock request would leave the solver with nothing to compute.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LockError {
    #[error("At least one field must remain unlocked for calculation")]
    NoFreeFields,
}

/// Tracks which fields are user-fixed versus solver-computed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LockRegistry {
    locked: HashSet<FieldKind>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock a field. Rejected when every other field is already locked;
    /// the registry is unchanged on rejection.
    pub fn lock(&mut self, field: FieldKind) -> Result<(), LockError> {
        if !self.locked.contains(&field) && self.free_count() <= 1 {
            return Err(LockError::NoFreeFields);
        }
        self.locked.insert(field);
        Ok(())
    }

    /// Unlocking only adds freedom, so it always succeeds.
    pub fn unlock(&mut self, field: FieldKind) {
        self.locked.remove(&field);
    }

    pub fn is_locked(&self, field: FieldKind) -> bool {
        self.locked.contains(&field)
    }

    /// Locked fields in [`FieldKind::ALL`] order.
    pub fn locked_fields(&self) -> Vec<FieldKind> {
        FieldKind::ALL
            .into_iter()
            .filter(|f| self.locked.contains(f))
            .collect()
    }

    /// Free fields in [`FieldKind::ALL`] order.
    pub fn free_fields(&self) -> Vec<FieldKind> {
        FieldKind::ALL
            .into_iter()
            .filter(|f| !self.locked.contains(f))
            .collect()
    }

    fn free_count(&self) -> usize {
        FieldKind::ALL.len() - self.locked.len()
    }
}
