//! Chemical formula parsing.
//!
//! Accepted grammar (informal):
//! - element symbols (`H`, `Ca`, `Cl`) with optional counts (`H2`, `O3`, `C1.5`)
//! - parenthesised groups with multipliers (`CaMg(CO3)2`)
//! - a trailing charge: `+`, `++`, `-`, `--`, `+2`, `-3`
//! - an optional aggregate-state suffix: `(aq)`, `(g)`, `(s)`, `(cr)`, `(l)`

use crate::element;
use crate::error::{ChemError, ChemResult};
use crate::species::AggregateState;

/// Elemental composition and charge parsed from a formula string.
#[derive(Debug, Clone, PartialEq)]
pub struct ChemicalFormula {
    text: String,
    elements: Vec<(String, f64)>,
    charge: f64,
    state_suffix: Option<AggregateState>,
}

impl ChemicalFormula {
    /// Parse a formula string such as `CaMg(CO3)2(s)` or `HCO3-`.
    pub fn parse(text: &str) -> ChemResult<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(invalid(text, "empty formula"));
        }

        let (body, state_suffix) = split_state_suffix(trimmed);
        let (body, charge) = split_charge(text, body)?;
        if body.is_empty() {
            return Err(invalid(text, "formula has no elements"));
        }
        let elements = parse_body(text, body)?;

        Ok(Self {
            text: trimmed.to_string(),
            elements,
            charge,
            state_suffix,
        })
    }

    /// Formula string as given (suffix included).
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Elements and their coefficients, in order of first appearance.
    pub fn elements(&self) -> &[(String, f64)] {
        &self.elements
    }

    /// Coefficient of `symbol` (0.0 if absent).
    pub fn coefficient(&self, symbol: &str) -> f64 {
        self.elements
            .iter()
            .find(|(s, _)| s == symbol)
            .map(|(_, c)| *c)
            .unwrap_or(0.0)
    }

    /// Electrical charge.
    pub fn charge(&self) -> f64 {
        self.charge
    }

    /// Aggregate state implied by a `(g)`, `(aq)`, ... suffix, if any.
    pub fn state_suffix(&self) -> Option<AggregateState> {
        self.state_suffix
    }

    /// Molar mass [kg/mol] from the element table.
    pub fn molar_mass(&self) -> f64 {
        self.elements
            .iter()
            .map(|(s, c)| element::molar_mass(s).unwrap_or(0.0) * c)
            .sum()
    }
}

fn invalid(formula: &str, reason: &str) -> ChemError {
    ChemError::InvalidFormula {
        formula: formula.to_string(),
        reason: reason.to_string(),
    }
}

fn split_state_suffix(text: &str) -> (&str, Option<AggregateState>) {
    const SUFFIXES: [(&str, AggregateState); 5] = [
        ("(aq)", AggregateState::Aqueous),
        ("(g)", AggregateState::Gas),
        ("(s)", AggregateState::Solid),
        ("(cr)", AggregateState::Solid),
        ("(l)", AggregateState::Liquid),
    ];
    for (suffix, state) in SUFFIXES {
        if let Some(body) = text.strip_suffix(suffix) {
            return (body, Some(state));
        }
    }
    (text, None)
}

fn split_charge<'a>(original: &str, body: &'a str) -> ChemResult<(&'a str, f64)> {
    // Explicit magnitude: "Ca+2", "SO4-2"
    if let Some(pos) = body.rfind(['+', '-']) {
        let digits = &body[pos + 1..];
        if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
            let magnitude: f64 = digits
                .parse()
                .map_err(|_| invalid(original, "bad charge magnitude"))?;
            let sign = if body[pos..].starts_with('+') { 1.0 } else { -1.0 };
            return Ok((&body[..pos], sign * magnitude));
        }
    }

    // Repeated signs: "Ca++", "CO3--"
    let trimmed = body.trim_end_matches('+');
    let plus = body.len() - trimmed.len();
    if plus > 0 {
        return Ok((trimmed, plus as f64));
    }
    let trimmed = body.trim_end_matches('-');
    let minus = body.len() - trimmed.len();
    if minus > 0 {
        return Ok((trimmed, -(minus as f64)));
    }
    Ok((body, 0.0))
}

fn parse_body(original: &str, body: &str) -> ChemResult<Vec<(String, f64)>> {
    let chars: Vec<char> = body.chars().collect();
    // Each open group collects (symbol, coefficient) pairs until its ')'.
    let mut stack: Vec<Vec<(String, f64)>> = vec![Vec::new()];
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_ascii_uppercase() {
            let start = i;
            i += 1;
            while i < chars.len() && chars[i].is_ascii_lowercase() {
                i += 1;
            }
            let symbol: String = chars[start..i].iter().collect();
            if !element::is_element(&symbol) {
                return Err(ChemError::UnknownElement { symbol });
            }
            let (count, next) = read_number(original, &chars, i)?;
            i = next;
            if let Some(group) = stack.last_mut() {
                group.push((symbol, count.unwrap_or(1.0)));
            }
        } else if c == '(' || c == '[' {
            stack.push(Vec::new());
            i += 1;
        } else if c == ')' || c == ']' {
            if stack.len() < 2 {
                return Err(invalid(original, "unbalanced parenthesis"));
            }
            i += 1;
            let (count, next) = read_number(original, &chars, i)?;
            i = next;
            let multiplier = count.unwrap_or(1.0);
            let group = stack.pop().unwrap_or_default();
            if let Some(parent) = stack.last_mut() {
                parent.extend(group.into_iter().map(|(s, n)| (s, n * multiplier)));
            }
        } else {
            return Err(invalid(original, &format!("unexpected character '{c}'")));
        }
    }

    if stack.len() != 1 {
        return Err(invalid(original, "unbalanced parenthesis"));
    }

    // Merge repeated symbols keeping first-appearance order.
    let mut merged: Vec<(String, f64)> = Vec::new();
    for (symbol, count) in stack.pop().unwrap_or_default() {
        match merged.iter_mut().find(|(s, _)| *s == symbol) {
            Some(entry) => entry.1 += count,
            None => merged.push((symbol, count)),
        }
    }
    Ok(merged)
}

fn read_number(original: &str, chars: &[char], start: usize) -> ChemResult<(Option<f64>, usize)> {
    let mut end = start;
    while end < chars.len() && (chars[end].is_ascii_digit() || chars[end] == '.') {
        end += 1;
    }
    if end == start {
        return Ok((None, start));
    }
    let text: String = chars[start..end].iter().collect();
    let value: f64 = text
        .parse()
        .map_err(|_| invalid(original, &format!("bad count '{text}'")))?;
    Ok((Some(value), end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_neutral_formula() {
        let f = ChemicalFormula::parse("H2O").unwrap();
        assert_eq!(f.coefficient("H"), 2.0);
        assert_eq!(f.coefficient("O"), 1.0);
        assert_eq!(f.charge(), 0.0);
        assert_eq!(f.state_suffix(), None);
        assert!((f.molar_mass() - 0.018_015_28).abs() < 1e-9);
    }

    #[test]
    fn repeated_sign_charges() {
        assert_eq!(ChemicalFormula::parse("Ca++").unwrap().charge(), 2.0);
        assert_eq!(ChemicalFormula::parse("CO3--").unwrap().charge(), -2.0);
        assert_eq!(ChemicalFormula::parse("OH-").unwrap().charge(), -1.0);
        assert_eq!(ChemicalFormula::parse("H+").unwrap().charge(), 1.0);
    }

    #[test]
    fn explicit_charge_magnitude() {
        let f = ChemicalFormula::parse("AlOH+2").unwrap();
        assert_eq!(f.charge(), 2.0);
        assert_eq!(f.coefficient("Al"), 1.0);
        assert_eq!(f.coefficient("H"), 1.0);
    }

    #[test]
    fn groups_and_suffix() {
        let f = ChemicalFormula::parse("CaMg(CO3)2(s)").unwrap();
        assert_eq!(f.coefficient("Ca"), 1.0);
        assert_eq!(f.coefficient("Mg"), 1.0);
        assert_eq!(f.coefficient("C"), 2.0);
        assert_eq!(f.coefficient("O"), 6.0);
        assert_eq!(f.state_suffix(), Some(AggregateState::Solid));
    }

    #[test]
    fn gas_suffix() {
        let f = ChemicalFormula::parse("CO2(g)").unwrap();
        assert_eq!(f.state_suffix(), Some(AggregateState::Gas));
        assert_eq!(f.elements().len(), 2);
    }

    #[test]
    fn repeated_elements_are_merged() {
        let f = ChemicalFormula::parse("CH3COOH").unwrap();
        assert_eq!(f.coefficient("C"), 2.0);
        assert_eq!(f.coefficient("H"), 4.0);
        assert_eq!(f.coefficient("O"), 2.0);
        assert_eq!(f.elements()[0].0, "C");
    }

    #[test]
    fn invalid_formulas() {
        assert!(ChemicalFormula::parse("").is_err());
        assert!(ChemicalFormula::parse("Ca(OH2").is_err());
        assert!(ChemicalFormula::parse("CaOH)2").is_err());
        assert!(matches!(
            ChemicalFormula::parse("Xx2"),
            Err(ChemError::UnknownElement { .. })
        ));
        assert!(ChemicalFormula::parse("h2o").is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn counts_round_trip(h in 1u32..20, o in 1u32..20, z in 0u32..4) {
            let charge = "+".repeat(z as usize);
            let text = format!("H{h}O{o}{charge}");
            let f = ChemicalFormula::parse(&text).unwrap();
            prop_assert_eq!(f.coefficient("H"), h as f64);
            prop_assert_eq!(f.coefficient("O"), o as f64);
            prop_assert_eq!(f.charge(), z as f64);
        }
    }
}
