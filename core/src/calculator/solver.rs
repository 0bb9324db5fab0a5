//! The constraint-solving pass.
//!
//! Forward direction: board feet from the dimensions, cost from board feet.
//! Reverse direction: a locked total determines at most one free factor
//! (pieces or a single dimension), and a locked cost determines a free
//! price. Only free fields are ever written; locked fields are read-only
//! inputs for the pass.

use super::types::CalculatorState;
use crate::fields::{FieldKind, LockRegistry};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One board foot is 144 cubic inches.
const BOARD_FOOT_CUBIC_INCHES: f64 = 144.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolveError {
    /// The pass would have written a non-finite value; the caller must keep
    /// the previous state.
    #[error("solve produced a non-finite value for {field}")]
    NonFinite { field: FieldKind },
}

/// Outcome of one solver pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveResult {
    /// State with every writable free field recomputed.
    pub state: CalculatorState,
    /// Free fields the pass wrote, in evaluation order.
    pub updated: Vec<FieldKind>,
}

pub struct VolumeSolver;

impl VolumeSolver {
    /// Run one pass. Pure: the same values, units, and lock set always
    /// produce the same result, and re-running on the result is a fixed
    /// point.
    pub fn solve(
        state: &CalculatorState,
        locks: &LockRegistry,
    ) -> Result<SolveResult, SolveError> {
        let mut next = state.clone();
        let mut updated = Vec::new();

        // Units participate regardless of lock state; only values are locked.
        let thickness_in = next.thickness.to_inches();
        let width_in = next.width.to_inches();
        let length_in = next.length.to_inches();
        let pieces = next.pieces;

        // Forward: board feet from the dimensions.
        if !locks.is_locked(FieldKind::TotalVolume) {
            next.total_volume = if thickness_in > 0.0
                && width_in > 0.0
                && length_in > 0.0
                && pieces > 0.0
            {
                thickness_in * width_in * length_in / BOARD_FOOT_CUBIC_INCHES * pieces
            } else {
                0.0
            };
            Self::check(next.total_volume, FieldKind::TotalVolume)?;
            updated.push(FieldKind::TotalVolume);
        }

        // Forward: cost from the volume (locked or just computed).
        if !locks.is_locked(FieldKind::TotalCost) {
            next.total_cost = next.total_volume * next.price;
            Self::check(next.total_cost, FieldKind::TotalCost)?;
            updated.push(FieldKind::TotalCost);
        }

        // Reverse: a locked total determines at most one free factor. With
        // zero or two-plus free factors the system is under- or
        // over-determined and those fields keep their previous values.
        if locks.is_locked(FieldKind::TotalVolume) && next.total_volume > 0.0 {
            let free: Vec<FieldKind> = [
                FieldKind::Pieces,
                FieldKind::Thickness,
                FieldKind::Width,
                FieldKind::Length,
            ]
            .into_iter()
            .filter(|f| !locks.is_locked(*f))
            .collect();

            if let [unknown] = free[..] {
                let volume_in = next.total_volume * BOARD_FOOT_CUBIC_INCHES;
                match unknown {
                    FieldKind::Pieces
                        if thickness_in > 0.0 && width_in > 0.0 && length_in > 0.0 =>
                    {
                        let solved = volume_in / (thickness_in * width_in * length_in);
                        Self::check(solved, FieldKind::Pieces)?;
                        next.pieces = solved.round();
                        updated.push(FieldKind::Pieces);
                    }
                    FieldKind::Thickness
                        if pieces > 0.0 && width_in > 0.0 && length_in > 0.0 =>
                    {
                        let solved = volume_in / (pieces * width_in * length_in);
                        Self::check(solved, FieldKind::Thickness)?;
                        next.thickness.set_from_inches(solved);
                        updated.push(FieldKind::Thickness);
                    }
                    FieldKind::Width
                        if pieces > 0.0 && thickness_in > 0.0 && length_in > 0.0 =>
                    {
                        let solved = volume_in / (pieces * thickness_in * length_in);
                        Self::check(solved, FieldKind::Width)?;
                        next.width.set_from_inches(solved);
                        updated.push(FieldKind::Width);
                    }
                    FieldKind::Length
                        if pieces > 0.0 && thickness_in > 0.0 && width_in > 0.0 =>
                    {
                        let solved = volume_in / (pieces * thickness_in * width_in);
                        Self::check(solved, FieldKind::Length)?;
                        next.length.set_from_inches(solved);
                        updated.push(FieldKind::Length);
                    }
                    _ => {}
                }
            }
        }

        // Reverse: price against a locked cost, or re-derive the cost from a
        // locked price (same formula as the forward step, so idempotent).
        if locks.is_locked(FieldKind::TotalCost)
            && next.total_cost > 0.0
            && next.total_volume > 0.0
            && !locks.is_locked(FieldKind::Price)
        {
            next.price = next.total_cost / next.total_volume;
            Self::check(next.price, FieldKind::Price)?;
            updated.push(FieldKind::Price);
        } else if locks.is_locked(FieldKind::Price)
            && next.price > 0.0
            && next.total_volume > 0.0
            && !locks.is_locked(FieldKind::TotalCost)
        {
            next.total_cost = next.total_volume * next.price;
            Self::check(next.total_cost, FieldKind::TotalCost)?;
            if !updated.contains(&FieldKind::TotalCost) {
                updated.push(FieldKind::TotalCost);
            }
        }

        Ok(SolveResult { state: next, updated })
    }

    fn check(value: f64, field: FieldKind) -> Result<(), SolveError> {
        if value.is_finite() {
            Ok(())
        } else {
            Err(SolveError::NonFinite { field })
        }
    }
}
