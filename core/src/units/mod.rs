use serde::{Deserialize, Serialize};
use std::fmt;

/// Units a dimension field can be entered in. Canonical unit is inches.
///
/// The two composite units take a second "fraction" component in their sub
/// unit (inches under feet, centimeters under meters).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DimensionUnit {
    #[default]
    #[serde(rename = "in")]
    Inch,
    #[serde(rename = "ft")]
    Foot,
    #[serde(rename = "mm")]
    Millimeter,
    #[serde(rename = "cm")]
    Centimeter,
    #[serde(rename = "m")]
    Meter,
    /// Feet with an inch remainder (12 in per ft)
    #[serde(rename = "ft/in")]
    FootInch,
    /// Meters with a centimeter remainder (100 cm per m)
    #[serde(rename = "m/cm")]
    MeterCentimeter,
}

impl DimensionUnit {
    pub fn is_composite(&self) -> bool {
        matches!(self, Self::FootInch | Self::MeterCentimeter)
    }

    /// Convert a (main, fraction) pair in this unit to canonical inches.
    /// The fraction component only contributes for composite units.
    pub fn to_inches(&self, main: f64, fraction: f64) -> f64 {
        match self {
            Self::Inch => main,
            Self::Foot => main * 12.0,
            Self::Millimeter => main / 25.4,
            Self::Centimeter => main / 2.54,
            Self::Meter => main / 0.0254,
            Self::FootInch => main * 12.0 + fraction,
            Self::MeterCentimeter => main / 0.0254 + fraction / 2.54,
        }
    }

    /// Convert canonical inches back to a (main, fraction) pair in this unit.
    /// Simple units report everything in `main`; composite units split the
    /// whole part from the sub-unit remainder.
    pub fn from_inches(&self, inches: f64) -> (f64, f64) {
        match self {
            Self::Inch => (inches, 0.0),
            Self::Foot => (inches / 12.0, 0.0),
            Self::Millimeter => (inches * 25.4, 0.0),
            Self::Centimeter => (inches * 2.54, 0.0),
            Self::Meter => (inches * 0.0254, 0.0),
            Self::FootInch => ((inches / 12.0).floor(), inches % 12.0),
            Self::MeterCentimeter => {
                let meters = inches * 0.0254;
                (meters.floor(), (meters - meters.floor()) * 100.0)
            }
        }
    }

    /// Parse a unit token as it appears in the wire protocol and share links.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "in" => Some(Self::Inch),
            "ft" => Some(Self::Foot),
            "mm" => Some(Self::Millimeter),
            "cm" => Some(Self::Centimeter),
            "m" => Some(Self::Meter),
            "ft/in" => Some(Self::FootInch),
            "m/cm" => Some(Self::MeterCentimeter),
            _ => None,
        }
    }

    /// Label for the main numeric input.
    pub fn main_label(&self) -> &'static str {
        match self {
            Self::Inch => "in",
            Self::Foot => "ft",
            Self::Millimeter => "mm",
            Self::Centimeter => "cm",
            Self::Meter => "m",
            Self::FootInch => "ft",
            Self::MeterCentimeter => "m",
        }
    }

    /// Label for the fraction input; None for simple units.
    pub fn sub_label(&self) -> Option<&'static str> {
        match self {
            Self::FootInch => Some("in"),
            Self::MeterCentimeter => Some("cm"),
            _ => None,
        }
    }
}

impl fmt::Display for DimensionUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inch => write!(f, "in"),
            Self::Foot => write!(f, "ft"),
            Self::Millimeter => write!(f, "mm"),
            Self::Centimeter => write!(f, "cm"),
            Self::Meter => write!(f, "m"),
            Self::FootInch => write!(f, "ft/in"),
            Self::MeterCentimeter => write!(f, "m/cm"),
        }
    }
}

/// A dimension input: main value, sub-unit fraction, and the selected unit.
///
/// `fraction` is meaningful only while `unit` is composite; switching to a
/// simple unit zeroes it. Both components are kept non-negative by the
/// command layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    pub main: f64,
    pub fraction: f64,
    pub unit: DimensionUnit,
}

impl Dimension {
    pub fn new(unit: DimensionUnit) -> Self {
        Self { main: 0.0, fraction: 0.0, unit }
    }

    pub fn to_inches(&self) -> f64 {
        self.unit.to_inches(self.main, self.fraction)
    }

    /// Overwrite both components from a canonical inch value, in the
    /// currently selected unit.
    pub fn set_from_inches(&mut self, inches: f64) {
        let (main, fraction) = self.unit.from_inches(inches);
        self.main = main;
        self.fraction = fraction;
    }

    pub fn set_unit(&mut self, unit: DimensionUnit) {
        self.unit = unit;
        if !unit.is_composite() {
            self.fraction = 0.0;
        }
    }
}

impl Default for Dimension {
    fn default() -> Self {
        Self::new(DimensionUnit::Inch)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.unit.sub_label() {
            Some(sub) => write!(
                f,
                "{:.3} {} {:.3} {}",
                self.main,
                self.unit.main_label(),
                self.fraction,
                sub
            ),
            None => write!(f, "{:.3} {}", self.main, self.unit.main_label()),
        }
    }
}
