use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::digits::{self, Parity, Structure, SumCategory};

pub const DRAW_LEN: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DrawError {
    #[error("Tirage invalide '{text}' : {reason}")]
    InvalidDraw { text: String, reason: String },

    #[error("Historique vide : le tirage de référence est obligatoire")]
    EmptyHistory,

    #[error("Historique incomplet : le tirage {position}-back est fourni sans le tirage {missing}-back")]
    HistoryGap { position: usize, missing: usize },

    #[error("Liste de chiffres invalide '{text}' : {reason}")]
    InvalidDigitList { text: String, reason: String },
}

fn parse_digits(text: &str) -> Result<[u8; DRAW_LEN], DrawError> {
    let trimmed = text.trim();
    let invalid = |reason: String| DrawError::InvalidDraw {
        text: text.to_string(),
        reason,
    };

    if let Some(c) = trimmed.chars().find(|c| !c.is_ascii_digit()) {
        return Err(invalid(format!("caractère non numérique '{c}'")));
    }
    if trimmed.len() != DRAW_LEN {
        return Err(invalid(format!(
            "{} chiffres au lieu de {DRAW_LEN}",
            trimmed.len()
        )));
    }

    let mut digits = [0u8; DRAW_LEN];
    for (slot, b) in digits.iter_mut().zip(trimmed.bytes()) {
        *slot = b - b'0';
    }
    Ok(digits)
}

fn check_digits(digits: &[u8; DRAW_LEN]) -> Result<(), DrawError> {
    if let Some(&d) = digits.iter().find(|&&d| d > 9) {
        return Err(DrawError::InvalidDraw {
            text: format!("{digits:?}"),
            reason: format!("chiffre {d} hors limites (0-9)"),
        });
    }
    Ok(())
}

/// Un tirage historique : 5 chiffres dans l'ordre du tirage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Draw {
    digits: [u8; DRAW_LEN],
}

impl Draw {
    pub fn new(digits: [u8; DRAW_LEN]) -> Result<Self, DrawError> {
        check_digits(&digits)?;
        Ok(Self { digits })
    }

    pub fn parse(text: &str) -> Result<Self, DrawError> {
        Ok(Self {
            digits: parse_digits(text)?,
        })
    }

    pub fn digits(&self) -> &[u8; DRAW_LEN] {
        &self.digits
    }

    pub fn digit_set(&self) -> BTreeSet<u8> {
        self.digits.iter().copied().collect()
    }

    pub fn value(&self) -> u32 {
        self.digits.iter().fold(0u32, |acc, &d| acc * 10 + d as u32)
    }

    pub fn sum(&self) -> u32 {
        self.digits.iter().map(|&d| d as u32).sum()
    }

    pub fn parity(&self) -> Parity {
        digits::parity(self.sum())
    }

    pub fn sum_category(&self) -> SumCategory {
        digits::sum_category(self.sum())
    }

    pub fn structure(&self) -> Structure {
        digits::structure_of(&self.digits)
    }

    pub fn vtracs(&self) -> BTreeSet<u8> {
        digits::vtrac_set(&self.digits)
    }
}

impl FromStr for Draw {
    type Err = DrawError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Draw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for d in &self.digits {
            write!(f, "{d}")?;
        }
        Ok(())
    }
}

/// Une combinaison candidate, toujours stockée triée (forme canonique) pour
/// que les permutations d'un même multiensemble se confondent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Combo {
    digits: [u8; DRAW_LEN],
}

impl Combo {
    pub fn new(mut digits: [u8; DRAW_LEN]) -> Result<Self, DrawError> {
        check_digits(&digits)?;
        digits.sort_unstable();
        Ok(Self { digits })
    }

    pub fn parse(text: &str) -> Result<Self, DrawError> {
        let mut digits = parse_digits(text)?;
        digits.sort_unstable();
        Ok(Self { digits })
    }

    pub fn digits(&self) -> &[u8; DRAW_LEN] {
        &self.digits
    }

    pub fn sum(&self) -> u32 {
        self.digits.iter().map(|&d| d as u32).sum()
    }

    pub fn parity(&self) -> Parity {
        digits::parity(self.sum())
    }

    pub fn sum_category(&self) -> SumCategory {
        digits::sum_category(self.sum())
    }

    pub fn structure(&self) -> Structure {
        digits::structure_of(&self.digits)
    }

    pub fn vtracs(&self) -> BTreeSet<u8> {
        digits::vtrac_set(&self.digits)
    }
}

impl From<Draw> for Combo {
    fn from(draw: Draw) -> Self {
        let mut digits = draw.digits;
        digits.sort_unstable();
        Self { digits }
    }
}

impl FromStr for Combo {
    type Err = DrawError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Combo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for d in &self.digits {
            write!(f, "{d}")?;
        }
        Ok(())
    }
}

/// Historique des tirages, du plus récent (le seed) au plus ancien.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct History {
    draws: Vec<Draw>,
}

impl History {
    pub fn new(draws: Vec<Draw>) -> Result<Self, DrawError> {
        if draws.is_empty() {
            return Err(DrawError::EmptyHistory);
        }
        Ok(Self { draws })
    }

    /// `entries[0]` est le seed (obligatoire) ; une entrée vide signifie
    /// « tirage absent ». Un tirage plus ancien ne peut pas suivre un trou.
    pub fn parse<S: AsRef<str>>(entries: &[S]) -> Result<Self, DrawError> {
        let mut draws = Vec::with_capacity(entries.len());
        let mut gap_at: Option<usize> = None;

        for (i, entry) in entries.iter().enumerate() {
            let text = entry.as_ref().trim();
            if text.is_empty() {
                if i == 0 {
                    return Err(DrawError::EmptyHistory);
                }
                gap_at.get_or_insert(i);
                continue;
            }
            if let Some(missing) = gap_at {
                return Err(DrawError::HistoryGap {
                    position: i + 1,
                    missing: missing + 1,
                });
            }
            draws.push(Draw::parse(text)?);
        }

        Self::new(draws)
    }

    pub fn seed(&self) -> &Draw {
        &self.draws[0]
    }

    pub fn get(&self, back: usize) -> Option<&Draw> {
        self.draws.get(back)
    }

    pub fn draws(&self) -> &[Draw] {
        &self.draws
    }

    pub fn len(&self) -> usize {
        self.draws.len()
    }

    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }
}

/// Liste de chiffres saisie sous la forme "1,2,3" (espaces tolérés).
pub fn parse_digit_list(text: &str) -> Result<Vec<u8>, DrawError> {
    let mut digits = Vec::new();
    for token in text.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        match token.parse::<u8>() {
            Ok(d) if d <= 9 => {
                if !digits.contains(&d) {
                    digits.push(d);
                }
            }
            _ => {
                return Err(DrawError::InvalidDigitList {
                    text: text.to_string(),
                    reason: format!("'{token}' n'est pas un chiffre 0-9"),
                })
            }
        }
    }
    Ok(digits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_parse_ok() {
        let draw = Draw::parse("11323").unwrap();
        assert_eq!(draw.digits(), &[1, 1, 3, 2, 3]);
        assert_eq!(draw.sum(), 10);
        assert_eq!(draw.parity(), Parity::Even);
        assert_eq!(draw.to_string(), "11323");
    }

    #[test]
    fn test_draw_parse_trims() {
        assert!(Draw::parse("  01234 ").is_ok());
    }

    #[test]
    fn test_draw_parse_wrong_length() {
        assert!(matches!(Draw::parse("1234"), Err(DrawError::InvalidDraw { .. })));
        assert!(matches!(Draw::parse("123456"), Err(DrawError::InvalidDraw { .. })));
        assert!(Draw::parse("").is_err());
    }

    #[test]
    fn test_draw_parse_non_digit() {
        assert!(matches!(Draw::parse("12a45"), Err(DrawError::InvalidDraw { .. })));
        assert!(Draw::parse("1 345").is_err());
    }

    #[test]
    fn test_draw_new_out_of_range() {
        assert!(Draw::new([1, 2, 3, 4, 10]).is_err());
        assert!(Draw::new([0, 0, 0, 0, 9]).is_ok());
    }

    #[test]
    fn test_draw_value() {
        assert_eq!(Draw::parse("01234").unwrap().value(), 1234);
    }

    #[test]
    fn test_combo_canonical_form() {
        let a = Combo::parse("54321").unwrap();
        let b = Combo::parse("12345").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "12345");
        assert_eq!(a.digits(), &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_combo_from_draw() {
        let draw = Draw::parse("11323").unwrap();
        assert_eq!(Combo::from(draw).to_string(), "11233");
    }

    #[test]
    fn test_combo_derived_attributes() {
        let combo = Combo::parse("22244").unwrap();
        assert_eq!(combo.sum(), 14);
        assert_eq!(combo.parity(), Parity::Even);
        assert_eq!(combo.structure(), Structure::TripleDouble);
        assert_eq!(combo.sum_category(), SumCategory::VeryLow);
        assert_eq!(combo.vtracs().into_iter().collect::<Vec<_>>(), vec![3, 5]);
    }

    #[test]
    fn test_history_parse() {
        let history = History::parse(&["11323", "45678", ""]).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history.seed().to_string(), "11323");
        assert_eq!(history.get(1).unwrap().to_string(), "45678");
        assert!(history.get(2).is_none());
    }

    #[test]
    fn test_history_requires_seed() {
        assert_eq!(History::parse(&["", "12345"]), Err(DrawError::EmptyHistory));
        assert_eq!(History::new(vec![]), Err(DrawError::EmptyHistory));
    }

    #[test]
    fn test_history_rejects_gap() {
        let err = History::parse(&["11323", "", "12345"]).unwrap_err();
        assert_eq!(err, DrawError::HistoryGap { position: 3, missing: 2 });
    }

    #[test]
    fn test_history_rejects_malformed_older_draw() {
        assert!(matches!(
            History::parse(&["11323", "1234"]),
            Err(DrawError::InvalidDraw { .. })
        ));
    }

    #[test]
    fn test_parse_digit_list() {
        assert_eq!(parse_digit_list("1, 2,3").unwrap(), vec![1, 2, 3]);
        assert_eq!(parse_digit_list("").unwrap(), Vec::<u8>::new());
        assert_eq!(parse_digit_list("4,4").unwrap(), vec![4]);
        assert!(parse_digit_list("1,12").is_err());
        assert!(parse_digit_list("x").is_err());
    }
}
