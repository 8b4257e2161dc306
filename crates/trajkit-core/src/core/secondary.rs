//! Secondary-structure classes and the seam to external predictors.

use crate::core::models::atom::Atom;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// DSSP secondary-structure classes with their integer codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum SecondaryStructure {
    AlphaHelix = 1,
    Helix310 = 2,
    PiHelix = 3,
    Polyproline = 4,
    Strand = 5,
    Bridge = 6,
    Turn = 7,
    Bend = 8,
    Coil = 9,
}

impl SecondaryStructure {
    pub const ALL: [SecondaryStructure; 9] = [
        SecondaryStructure::AlphaHelix,
        SecondaryStructure::Helix310,
        SecondaryStructure::PiHelix,
        SecondaryStructure::Polyproline,
        SecondaryStructure::Strand,
        SecondaryStructure::Bridge,
        SecondaryStructure::Turn,
        SecondaryStructure::Bend,
        SecondaryStructure::Coil,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(usize::from(code).checked_sub(1)?).copied()
    }

    /// The DSSP one-letter code.
    pub fn letter(self) -> char {
        match self {
            SecondaryStructure::AlphaHelix => 'H',
            SecondaryStructure::Helix310 => 'G',
            SecondaryStructure::PiHelix => 'I',
            SecondaryStructure::Polyproline => 'P',
            SecondaryStructure::Strand => 'E',
            SecondaryStructure::Bridge => 'B',
            SecondaryStructure::Turn => 'T',
            SecondaryStructure::Bend => 'S',
            SecondaryStructure::Coil => 'C',
        }
    }

    pub fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_uppercase() {
            'H' => Some(SecondaryStructure::AlphaHelix),
            'G' => Some(SecondaryStructure::Helix310),
            'I' => Some(SecondaryStructure::PiHelix),
            'P' => Some(SecondaryStructure::Polyproline),
            'E' => Some(SecondaryStructure::Strand),
            'B' => Some(SecondaryStructure::Bridge),
            'T' => Some(SecondaryStructure::Turn),
            'S' => Some(SecondaryStructure::Bend),
            'C' | 'L' | '-' | ' ' => Some(SecondaryStructure::Coil),
            _ => None,
        }
    }

    pub fn is_helix(self) -> bool {
        matches!(
            self,
            SecondaryStructure::AlphaHelix | SecondaryStructure::Helix310 | SecondaryStructure::PiHelix
        )
    }

    pub fn is_strand(self) -> bool {
        matches!(self, SecondaryStructure::Strand | SecondaryStructure::Bridge)
    }
}

impl fmt::Display for SecondaryStructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown secondary-structure class '{0}'")]
pub struct ParseSecondaryStructureError(pub String);

impl FromStr for SecondaryStructure {
    type Err = ParseSecondaryStructureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_letter(c),
            (None, _) => Some(SecondaryStructure::Coil),
            _ => None,
        }
        .ok_or_else(|| ParseSecondaryStructureError(s.to_string()))
    }
}

/// Failure reported by an external secondary-structure predictor.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ClassifierError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ClassifierError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Assigns one class per residue to a set of atom records.
///
/// The atoms arrive in topology order with up-to-date positions; residues are
/// runs of consecutive atoms sharing chain, number and name.
pub trait SecondaryStructureClassifier {
    /// # Errors
    ///
    /// Returns a [`ClassifierError`] if the predictor fails.
    fn classify(&mut self, atoms: &[Atom]) -> Result<Vec<SecondaryStructure>, ClassifierError>;
}

impl<F> SecondaryStructureClassifier for F
where
    F: FnMut(&[Atom]) -> Result<Vec<SecondaryStructure>, ClassifierError>,
{
    fn classify(&mut self, atoms: &[Atom]) -> Result<Vec<SecondaryStructure>, ClassifierError> {
        self(atoms)
    }
}

/// Parses a DSSP-style string (`"HHHEE--T"`), one letter per residue.
///
/// # Errors
///
/// Returns the first unknown letter.
pub fn parse_letters(letters: &str) -> Result<Vec<SecondaryStructure>, ParseSecondaryStructureError> {
    letters
        .chars()
        .map(|c| SecondaryStructure::from_letter(c).ok_or_else(|| ParseSecondaryStructureError(c.to_string())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    #[test]
    fn codes_follow_dssp_order() {
        let codes: Vec<u8> = SecondaryStructure::ALL.iter().map(|s| s.code()).collect();
        assert_eq!(codes, (1..=9).collect::<Vec<u8>>());
        for class in SecondaryStructure::ALL {
            assert_eq!(SecondaryStructure::from_code(class.code()), Some(class));
            assert_eq!(SecondaryStructure::from_letter(class.letter()), Some(class));
        }
        assert_eq!(SecondaryStructure::from_code(0), None);
        assert_eq!(SecondaryStructure::from_code(10), None);
    }

    #[test]
    fn blank_and_loop_letters_parse_as_coil() {
        for s in [" ", "-", "L", "c", ""] {
            assert_eq!(s.parse::<SecondaryStructure>().unwrap(), SecondaryStructure::Coil);
        }
        assert!("X".parse::<SecondaryStructure>().is_err());
        assert!("HE".parse::<SecondaryStructure>().is_err());
    }

    #[test]
    fn helix_and_strand_families() {
        assert!(SecondaryStructure::PiHelix.is_helix());
        assert!(!SecondaryStructure::Turn.is_helix());
        assert!(SecondaryStructure::Bridge.is_strand());
        assert!(!SecondaryStructure::Polyproline.is_strand());
    }

    #[test]
    fn parse_letters_reports_unknown_letter() {
        assert_eq!(
            parse_letters("HG-").unwrap(),
            vec![
                SecondaryStructure::AlphaHelix,
                SecondaryStructure::Helix310,
                SecondaryStructure::Coil
            ]
        );
        assert_eq!(parse_letters("HQ").unwrap_err().0, "Q");
    }

    #[test]
    fn closures_act_as_classifiers() {
        let mut calls = 0;
        let mut classifier = |atoms: &[Atom]| {
            calls += 1;
            Ok::<_, ClassifierError>(vec![SecondaryStructure::Coil; atoms.len()])
        };
        let atoms = vec![Atom::new(1, "CA", Point3::origin())];
        let classes = classifier.classify(&atoms).unwrap();
        assert_eq!(classes, vec![SecondaryStructure::Coil]);
        assert_eq!(calls, 1);
    }
}
