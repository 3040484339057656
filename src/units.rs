//! Hydration units and conversion constants
//!
//! Cups are stored in whatever unit the user entered (ml, l or fl oz);
//! everything is normalised through milliliters.

use serde::{Deserialize, Serialize};

// ============================================================================
// Volume Conversion Constants (to milliliters)
// ============================================================================

/// Milliliters per fluid ounce (US)
pub const ML_PER_FL_OZ: f64 = 29.5735;
/// Milliliters per liter
pub const ML_PER_LITER: f64 = 1000.0;

/// Unit a cup's capacity is recorded in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeUnit {
    Ml,
    Oz,
    L,
}

impl VolumeUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            VolumeUnit::Ml => "ml",
            VolumeUnit::Oz => "oz",
            VolumeUnit::L => "l",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "ml" | "milliliter" | "milliliters" | "millilitre" | "millilitres" => {
                Some(VolumeUnit::Ml)
            }
            "oz" | "fl oz" | "floz" | "fluid ounce" | "fluid ounces" => Some(VolumeUnit::Oz),
            "l" | "liter" | "liters" | "litre" | "litres" => Some(VolumeUnit::L),
            _ => None,
        }
    }

    /// Conversion factor from this unit to milliliters
    pub fn ml_per_unit(&self) -> f64 {
        match self {
            VolumeUnit::Ml => 1.0,
            VolumeUnit::Oz => ML_PER_FL_OZ,
            VolumeUnit::L => ML_PER_LITER,
        }
    }
}

/// Convert a volume to milliliters
pub fn to_ml(amount: f64, unit: VolumeUnit) -> f64 {
    amount * unit.ml_per_unit()
}

/// Convert a volume to fluid ounces
pub fn to_fl_oz(amount: f64, unit: VolumeUnit) -> f64 {
    match unit {
        VolumeUnit::Oz => amount,
        _ => to_ml(amount, unit) / ML_PER_FL_OZ,
    }
}

/// Convert a volume between any two units
pub fn convert(amount: f64, from: VolumeUnit, to: VolumeUnit) -> f64 {
    match to {
        _ if from == to => amount,
        VolumeUnit::Oz => to_fl_oz(amount, from),
        _ => to_ml(amount, from) / to.ml_per_unit(),
    }
}
