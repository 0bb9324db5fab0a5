//! Session layer: owns the state, the lock registry, the persistence store,
//! and the edit-settle window; turns commands into solver passes and
//! presentation effects.

use super::solver::{SolveResult, VolumeSolver};
use super::types::{CalculatorState, Command, Component, Effect, NoticeKind};
use crate::fields::{FieldKind, LockRegistry};
use crate::format::{format_number, parse_number};
use crate::persistence::KeyValueStore;
use crate::units::DimensionUnit;
use std::time::{Duration, Instant};
use tracing::warn;

/// Settle window after a keystroke during which the edited field is never
/// overwritten by a solver pass. Blur closes the window immediately.
pub const EDIT_SETTLE: Duration = Duration::from_millis(100);

/// Prefix for every persisted key, so a host can clear them wholesale.
pub const STORAGE_PREFIX: &str = "bf_calc_";

const FEEDBACK_KEY: &str = "bf_calc_feedback";

/// Marks the field the user is typing into, with the deadline after which
/// solver writes may resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditingSession {
    pub field: FieldKind,
    pub deadline: Instant,
}

/// One interactive calculator: numeric state, lock set, persistence, and
/// the in-flight edit marker. Single-threaded by construction; every
/// command runs exactly one solver pass to completion before returning.
pub struct CalculatorSession<S: KeyValueStore> {
    state: CalculatorState,
    locks: LockRegistry,
    store: S,
    editing: Option<EditingSession>,
}

impl<S: KeyValueStore> CalculatorSession<S> {
    /// Create a session, rehydrating locked fields from the store and
    /// running an initial pass so free fields reflect the restored inputs.
    pub fn new(store: S) -> Self {
        let mut session = Self {
            state: CalculatorState::default(),
            locks: LockRegistry::new(),
            store,
            editing: None,
        };
        session.load_saved();
        session.run_solver();
        session
    }

    pub fn state(&self) -> &CalculatorState {
        &self.state
    }

    pub fn locks(&self) -> &LockRegistry {
        &self.locks
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn handle(&mut self, command: Command) -> Vec<Effect> {
        match command {
            Command::Edit { field, component, raw } => self.on_edit(field, component, &raw),
            Command::UnitChange { field, unit } => self.on_unit_change(field, unit),
            Command::ToggleLock { field } => self.on_toggle_lock(field),
            Command::Blur { field } => self.on_blur(field),
            Command::Reset => self.on_reset(),
        }
    }

    /// Query-string encoding of the current raw inputs (lock state is not
    /// part of a share link).
    pub fn share_query(&self) -> String {
        crate::share::encode(&self.state)
    }

    /// Apply share-link parameters over the current inputs and re-solve.
    pub fn load_share_query(&mut self, query: &str) -> Vec<Effect> {
        crate::share::decode(query, &mut self.state);
        self.run_solver()
    }

    /// Re-save every locked field, e.g. before the hosting connection goes
    /// away.
    pub fn persist_locked(&mut self) {
        for field in FieldKind::ALL {
            if self.locks.is_locked(field) {
                self.save_field(field);
            }
        }
    }

    /// Store the thumbs-up/down survey answer.
    pub fn record_feedback(&mut self, positive: bool) -> Vec<Effect> {
        self.store
            .set(FEEDBACK_KEY, if positive { "positive" } else { "negative" });
        let message = if positive {
            "Thank you for your positive feedback!"
        } else {
            "Thank you for your feedback, we will continue to improve."
        };
        vec![Effect::Notice {
            message: message.to_string(),
            level: NoticeKind::Success,
        }]
    }

    fn on_edit(&mut self, field: FieldKind, component: Component, raw: &str) -> Vec<Effect> {
        let value = parse_number(raw);
        match field {
            FieldKind::Pieces => self.state.pieces = value.max(0.0),
            FieldKind::Price => self.state.price = value,
            FieldKind::TotalVolume => self.state.total_volume = value,
            FieldKind::TotalCost => self.state.total_cost = value,
            _ => {
                if let Some(dim) = self.state.dimension_mut(field) {
                    match component {
                        Component::Main => dim.main = value.max(0.0),
                        Component::Fraction if dim.unit.is_composite() => {
                            dim.fraction = value.max(0.0)
                        }
                        // No sub-unit input exists for simple units
                        Component::Fraction => {}
                    }
                }
            }
        }

        self.editing = Some(EditingSession {
            field,
            deadline: Instant::now() + EDIT_SETTLE,
        });
        let effects = self.run_solver();
        if self.locks.is_locked(field) {
            self.save_field(field);
        }
        effects
    }

    fn on_unit_change(&mut self, field: FieldKind, unit: DimensionUnit) -> Vec<Effect> {
        let Some(dim) = self.state.dimension_mut(field) else {
            return vec![Effect::Rejected {
                reason: format!("{} has no unit selection", field.display_name()),
            }];
        };
        dim.set_unit(unit);
        let effects = self.run_solver();
        if self.locks.is_locked(field) {
            self.save_field(field);
        }
        effects
    }

    fn on_toggle_lock(&mut self, field: FieldKind) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.locks.is_locked(field) {
            self.locks.unlock(field);
            self.clear_saved(field);
            effects.push(Effect::LockChanged { field, locked: false });
            effects.push(Effect::Notice {
                message: format!(
                    "{} will now be calculated automatically",
                    field.display_name()
                ),
                level: NoticeKind::Info,
            });
        } else {
            if let Err(e) = self.locks.lock(field) {
                return vec![
                    Effect::Rejected { reason: e.to_string() },
                    Effect::Notice {
                        message: e.to_string(),
                        level: NoticeKind::Warning,
                    },
                ];
            }
            self.save_field(field);
            effects.push(Effect::LockChanged { field, locked: true });
            effects.push(Effect::Notice {
                message: format!("{} is now locked to its current value", field.display_name()),
                level: NoticeKind::Success,
            });
        }
        effects.extend(self.run_solver());
        effects
    }

    fn on_blur(&mut self, field: FieldKind) -> Vec<Effect> {
        if self.editing.map(|e| e.field) == Some(field) {
            self.editing = None;
        }
        // Re-format a locked total the user just finished typing into
        if self.locks.is_locked(field)
            && matches!(field, FieldKind::TotalVolume | FieldKind::TotalCost)
        {
            return vec![Effect::FieldComputed {
                field,
                display: display_value(&self.state, field),
            }];
        }
        Vec::new()
    }

    fn on_reset(&mut self) -> Vec<Effect> {
        self.state = CalculatorState::default();
        self.locks = LockRegistry::new();
        self.editing = None;
        for field in FieldKind::ALL {
            self.clear_saved(field);
        }
        self.store.remove(FEEDBACK_KEY);

        let mut effects: Vec<Effect> = FieldKind::ALL
            .into_iter()
            .map(|field| Effect::LockChanged { field, locked: false })
            .collect();
        effects.extend(self.run_solver());
        effects.push(Effect::Notice {
            message: "All values and lock states have been reset to default".to_string(),
            level: NoticeKind::Success,
        });
        effects
    }

    /// One pass. On a computation fault the previous state is kept and the
    /// failure logged; the caller sees no effects for that pass.
    fn run_solver(&mut self) -> Vec<Effect> {
        match VolumeSolver::solve(&self.state, &self.locks) {
            Ok(result) => self.apply(result),
            Err(e) => {
                warn!("solver pass failed: {}", e);
                Vec::new()
            }
        }
    }

    fn apply(&mut self, result: SolveResult) -> Vec<Effect> {
        let now = Instant::now();
        let shielded = self
            .editing
            .filter(|e| e.deadline > now)
            .map(|e| e.field);

        let mut effects = Vec::new();
        for field in result.updated {
            if Some(field) == shielded {
                continue;
            }
            let before = display_value(&self.state, field);
            copy_field(&mut self.state, &result.state, field);
            let after = display_value(&self.state, field);
            if before != after {
                effects.push(Effect::FieldComputed { field, display: after });
            }
        }
        effects
    }

    fn save_field(&mut self, field: FieldKind) {
        if let Some(dim) = self.state.dimension(field) {
            let dim = *dim;
            self.store.set(&value_key(field), &format!("{}", dim.main));
            self.store.set(&unit_key(field), &dim.unit.to_string());
            self.store
                .set(&fraction_key(field), &format!("{}", dim.fraction));
            return;
        }
        let value = match field {
            FieldKind::Pieces => self.state.pieces,
            FieldKind::Price => self.state.price,
            FieldKind::TotalVolume => self.state.total_volume,
            FieldKind::TotalCost => self.state.total_cost,
            _ => return,
        };
        self.store.set(&value_key(field), &format!("{}", value));
    }

    fn clear_saved(&mut self, field: FieldKind) {
        self.store.remove(&value_key(field));
        self.store.remove(&unit_key(field));
        self.store.remove(&fraction_key(field));
    }

    fn load_saved(&mut self) {
        for field in FieldKind::ALL {
            let Some(text) = self.store.get(&value_key(field)) else {
                continue;
            };
            // A saved set that locked everything would leave nothing to
            // solve; stop re-locking at the last allowed field.
            if self.locks.lock(field).is_err() {
                warn!("ignoring saved lock on {}: no free field would remain", field);
                continue;
            }
            let value = parse_number(&text);
            let unit = self
                .store
                .get(&unit_key(field))
                .and_then(|t| DimensionUnit::parse(&t));
            let fraction = self.store.get(&fraction_key(field)).map(|t| parse_number(&t));

            match field {
                FieldKind::Pieces => self.state.pieces = value.max(0.0),
                FieldKind::Price => self.state.price = value,
                FieldKind::TotalVolume => self.state.total_volume = value,
                FieldKind::TotalCost => self.state.total_cost = value,
                _ => {
                    if let Some(dim) = self.state.dimension_mut(field) {
                        if let Some(unit) = unit {
                            dim.unit = unit;
                        }
                        dim.main = value.max(0.0);
                        dim.fraction = if dim.unit.is_composite() {
                            fraction.unwrap_or(0.0).max(0.0)
                        } else {
                            0.0
                        };
                    }
                }
            }
        }
    }
}

/// Display string for a field per the presentation contract: totals grouped
/// at two decimals, price at two, dimension components at three, pieces as
/// an integer.
pub fn display_value(state: &CalculatorState, field: FieldKind) -> String {
    match field {
        FieldKind::Pieces => format!("{}", state.pieces.round() as i64),
        FieldKind::Price => format!("{:.2}", state.price),
        FieldKind::TotalVolume => format_number(state.total_volume, 2),
        FieldKind::TotalCost => format_number(state.total_cost, 2),
        FieldKind::Thickness => state.thickness.to_string(),
        FieldKind::Width => state.width.to_string(),
        FieldKind::Length => state.length.to_string(),
    }
}

fn copy_field(dst: &mut CalculatorState, src: &CalculatorState, field: FieldKind) {
    match field {
        FieldKind::Pieces => dst.pieces = src.pieces,
        FieldKind::Thickness => dst.thickness = src.thickness,
        FieldKind::Width => dst.width = src.width,
        FieldKind::Length => dst.length = src.length,
        FieldKind::Price => dst.price = src.price,
        FieldKind::TotalVolume => dst.total_volume = src.total_volume,
        FieldKind::TotalCost => dst.total_cost = src.total_cost,
    }
}

fn value_key(field: FieldKind) -> String {
    format!("{}{}", STORAGE_PREFIX, field.storage_key())
}

fn unit_key(field: FieldKind) -> String {
    format!("{}{}_unit", STORAGE_PREFIX, field.storage_key())
}

fn fraction_key(field: FieldKind) -> String {
    format!("{}{}_fraction", STORAGE_PREFIX, field.storage_key())
}
