pub mod session;
pub mod solver;
pub mod types;

pub use session::{display_value, CalculatorSession, EditingSession, EDIT_SETTLE, STORAGE_PREFIX};
pub use solver::{SolveError, SolveResult, VolumeSolver};
pub use types::{CalculatorState, Command, Component, Effect, NoticeKind};

#[cfg(test)]
mod tests_session;
