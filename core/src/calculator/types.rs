//! Value objects for the calculator: state, commands, and presentation
//! effects.

use crate::fields::FieldKind;
use crate::units::{Dimension, DimensionUnit};
use serde::{Deserialize, Serialize};

/// The full numeric state of the calculator: the five inputs of the board
/// foot law plus the two derived totals. A plain value object; the solver
/// takes it by reference and returns a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculatorState {
    pub pieces: f64,
    pub thickness: Dimension,
    pub width: Dimension,
    pub length: Dimension,
    pub price: f64,
    pub total_volume: f64,
    pub total_cost: f64,
}

impl Default for CalculatorState {
    fn default() -> Self {
        Self {
            pieces: 1.0,
            thickness: Dimension::new(DimensionUnit::Inch),
            width: Dimension::new(DimensionUnit::Inch),
            length: Dimension::new(DimensionUnit::Foot),
            price: 0.0,
            total_volume: 0.0,
            total_cost: 0.0,
        }
    }
}

impl CalculatorState {
    pub fn dimension(&self, field: FieldKind) -> Option<&Dimension> {
        match field {
            FieldKind::Thickness => Some(&self.thickness),
            FieldKind::Width => Some(&self.width),
            FieldKind::Length => Some(&self.length),
            _ => None,
        }
    }

    pub fn dimension_mut(&mut self, field: FieldKind) -> Option<&mut Dimension> {
        match field {
            FieldKind::Thickness => Some(&mut self.thickness),
            FieldKind::Width => Some(&mut self.width),
            FieldKind::Length => Some(&mut self.length),
            _ => None,
        }
    }
}

/// Which numeric input of a field an edit targets. `Fraction` only applies
/// to dimension fields shown in a composite unit; it is ignored elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Component {
    Main,
    Fraction,
}

/// A discrete user action. Each command triggers exactly one solver pass;
/// passes never interleave.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    Edit {
        field: FieldKind,
        component: Component,
        raw: String,
    },
    UnitChange {
        field: FieldKind,
        unit: DimensionUnit,
    },
    ToggleLock {
        field: FieldKind,
    },
    Blur {
        field: FieldKind,
    },
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Info,
    Warning,
}

/// Outputs consumed by the presentation adapter. The core never renders
/// anything itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Effect {
    /// A free field was recomputed; `display` is the formatted value.
    FieldComputed { field: FieldKind, display: String },
    /// A field's lock state flipped.
    LockChanged { field: FieldKind, locked: bool },
    /// A command was refused; state is unchanged.
    Rejected { reason: String },
    /// Transient banner message.
    Notice { message: String, level: NoticeKind },
}
