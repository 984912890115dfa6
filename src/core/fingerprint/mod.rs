//! # Fingerprint Module
//!
//! Content-derived dedup key for a recipe, independent of its image and of
//! who submitted it.
//!
//! ## Canonical Form
//! ```text
//! <name>|<ingredient>|<ingredient>|...
//! ingredient = lower(trim(name)) ":" amount ":" lower(trim(unit))
//! ```
//! Ingredient components are sorted, so the order an extractor happened to
//! list them in never matters. The canonical string is MD5-hashed: this is
//! a dedup key, not a security boundary.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Length of a recipe fingerprint rendered as hex
pub const FINGERPRINT_HEX_LEN: usize = 32;

/// One extracted ingredient line: name plus optional amount and unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientLine {
    pub name: String,
    pub amount: Option<f64>,
    pub unit: Option<String>,
}

impl IngredientLine {
    /// Create an ingredient line
    pub fn new(name: impl Into<String>, amount: Option<f64>, unit: Option<&str>) -> Self {
        Self {
            name: name.into(),
            amount,
            unit: unit.map(str::to_string),
        }
    }

    /// Canonical `name:amount:unit` component, or `None` for a blank name
    fn component(&self) -> Option<String> {
        let name = normalize(&self.name);
        if name.is_empty() {
            return None;
        }
        let unit = self.unit.as_deref().map(normalize).unwrap_or_default();
        Some(format!("{}:{}:{}", name, format_amount(self.amount), unit))
    }
}

impl<S: Into<String>> From<(S, Option<f64>, Option<&str>)> for IngredientLine {
    fn from((name, amount, unit): (S, Option<f64>, Option<&str>)) -> Self {
        Self::new(name, amount, unit)
    }
}

/// Error parsing a `NAME[:AMOUNT[:UNIT]]` ingredient argument
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid ingredient {0:?}: expected NAME[:AMOUNT[:UNIT]]")]
pub struct ParseIngredientError(String);

impl FromStr for IngredientLine {
    type Err = ParseIngredientError;

    /// Parse `NAME[:AMOUNT[:UNIT]]`, e.g. `Tequila:2:oz` or `Mint`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':');
        let name = parts.next().unwrap_or_default().trim();
        if name.is_empty() {
            return Err(ParseIngredientError(s.to_string()));
        }

        let amount = match parts.next().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                raw.parse::<f64>()
                    .map_err(|_| ParseIngredientError(s.to_string()))?,
            ),
        };
        let unit = parts.next().map(str::trim).filter(|u| !u.is_empty());

        Ok(Self::new(name, amount, unit))
    }
}

/// Builds order-independent recipe fingerprints
#[derive(Debug, Default, Clone, Copy)]
pub struct FingerprintBuilder;

impl FingerprintBuilder {
    /// Create a new fingerprint builder
    pub fn new() -> Self {
        Self
    }

    /// The normalized string that gets hashed
    pub fn canonical_form(&self, name: &str, ingredients: &[IngredientLine]) -> String {
        let mut components: Vec<String> =
            ingredients.iter().filter_map(IngredientLine::component).collect();
        components.sort();

        format!("{}|{}", normalize(name), components.join("|"))
    }

    /// 32-character MD5 hex fingerprint of name + ingredients.
    ///
    /// A recipe without usable ingredients still gets a (weaker) name-only
    /// fingerprint.
    pub fn fingerprint(&self, name: &str, ingredients: &[IngredientLine]) -> String {
        format!("{:x}", md5::compute(self.canonical_form(name, ingredients)))
    }
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Render an amount the way stored fingerprints were built: whole numbers
/// keep one decimal (`2.0`) and a zero amount counts as missing. Magnitudes
/// below `1e-4` or from `1e16` up use scientific notation with a signed,
/// two-digit minimum exponent (`1e-05`, `2.5e+16`).
fn format_amount(amount: Option<f64>) -> String {
    match amount {
        None => String::new(),
        Some(a) if a == 0.0 => String::new(),
        Some(a) if !a.is_finite() => a.to_string().to_lowercase(),
        Some(a) if !(1e-4..1e16).contains(&a.abs()) => format_scientific(a),
        Some(a) if a.fract() == 0.0 => format!("{:.1}", a),
        Some(a) => a.to_string(),
    }
}

fn format_scientific(amount: f64) -> String {
    let shortest = format!("{:e}", amount);
    match shortest.split_once('e') {
        Some((mantissa, exponent)) => match exponent.parse::<i32>() {
            Ok(exp) => {
                let sign = if exp < 0 { '-' } else { '+' };
                format!("{}e{}{:02}", mantissa, sign, exp.unsigned_abs())
            }
            Err(_) => shortest,
        },
        None => shortest,
    }
}
