pub mod calculator;
pub mod fields;
pub mod format;
pub mod persistence;
pub mod share;
pub mod units;

pub fn version() -> &'static str {
    "0.1.0"
}
