//! Deep-link encoding of the raw calculator inputs as a query string.
//!
//! Eleven parameters cover the inputs (`pieces`, the three dimensions with
//! their units and fractions, `price`); anything equal to its default is
//! omitted, and lock state is never encoded.

use crate::calculator::types::CalculatorState;
use crate::format::parse_number;
use crate::units::{Dimension, DimensionUnit};

/// Encode the raw inputs, omitting parameters equal to their defaults.
/// Returns the bare query string (no leading `?`).
pub fn encode(state: &CalculatorState) -> String {
    let defaults = CalculatorState::default();
    let mut params: Vec<(String, String)> = Vec::new();

    if state.pieces != defaults.pieces {
        params.push(("pieces".to_string(), number(state.pieces)));
    }
    push_dimension(&mut params, "thickness", &state.thickness, defaults.thickness.unit);
    push_dimension(&mut params, "width", &state.width, defaults.width.unit);
    push_dimension(&mut params, "length", &state.length, defaults.length.unit);
    if state.price != 0.0 {
        params.push(("price".to_string(), number(state.price)));
    }

    params
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&")
}

/// Apply query parameters over `state`. Unknown keys and unparseable units
/// are ignored; numeric values go through the tolerant parser.
pub fn decode(query: &str, state: &mut CalculatorState) {
    for pair in query.trim_start_matches('?').split('&') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        // Composite unit tokens arrive with their slash percent-encoded
        let value = value.replace("%2F", "/").replace("%2f", "/");
        match key {
            "pieces" => state.pieces = parse_number(&value).max(0.0),
            "price" => state.price = parse_number(&value),
            "thickness" => state.thickness.main = parse_number(&value).max(0.0),
            "thicknessFraction" => state.thickness.fraction = parse_number(&value).max(0.0),
            "thicknessUnit" => apply_unit(&mut state.thickness, &value),
            "width" => state.width.main = parse_number(&value).max(0.0),
            "widthFraction" => state.width.fraction = parse_number(&value).max(0.0),
            "widthUnit" => apply_unit(&mut state.width, &value),
            "length" => state.length.main = parse_number(&value).max(0.0),
            "lengthFraction" => state.length.fraction = parse_number(&value).max(0.0),
            "lengthUnit" => apply_unit(&mut state.length, &value),
            _ => {}
        }
    }
}

fn push_dimension(
    params: &mut Vec<(String, String)>,
    name: &str,
    dim: &Dimension,
    default_unit: DimensionUnit,
) {
    if dim.main != 0.0 {
        params.push((name.to_string(), number(dim.main)));
    }
    if dim.unit != default_unit {
        params.push((format!("{}Unit", name), dim.unit.to_string()));
    }
    if dim.fraction != 0.0 {
        params.push((format!("{}Fraction", name), number(dim.fraction)));
    }
}

fn apply_unit(dim: &mut Dimension, token: &str) {
    if let Some(unit) = DimensionUnit::parse(token) {
        dim.unit = unit;
    }
}

fn number(value: f64) -> String {
    format!("{}", value)
}
