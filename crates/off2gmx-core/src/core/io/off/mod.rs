//! # CRYOFF `.off` File Parser
//!
//! ## Overview
//!
//! An `.off` file is the output of a CRYOFF force-matching run: the original
//! `.ff` input echoed at the top, followed by the fitted intra- and
//! inter-molecular parameter blocks. Parsing proceeds in file order:
//!
//! 1. [`sections`] carves the text into the five marker-delimited sections.
//! 2. [`keywords`] scans the echoed input for bracket tokens, classifies
//!    them, and segments the bonded tokens into molecules.
//! 3. [`bonded`] parses each molecule's sections, pulling fitted parameter
//!    blocks from the [`fitted`] cursor in strict file order.
//! 4. [`nonbonded`] parses the fitted pair interactions.
//!
//! The parsed result is a list of [`Molecule`]s plus a [`NonbondedModel`];
//! the molecular-definition and table-potential sections are captured but
//! feed no downstream operation.

pub(crate) mod bonded;
pub(crate) mod fitted;
pub(crate) mod keywords;
pub(crate) mod nonbonded;
pub mod sections;

use crate::core::models::bonded::Molecule;
use crate::core::models::nonbonded::NonbondedModel;
use sections::Sections;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum OffError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Missing section marker '{0}'")]
    MissingMarker(&'static str),
    #[error("Section marker '{0}' appears out of order")]
    MarkerOutOfOrder(&'static str),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: OffParseErrorKind },
}

#[derive(Debug, Error)]
pub enum OffParseErrorKind {
    #[error("Molecule name missing after [MOL]")]
    MissingMoleculeName,
    #[error("Bonded keyword [{keyword}] appears before the first [MOL]")]
    KeywordBeforeMolecule { keyword: &'static str },
    #[error("Atom line in [ATO] must carry index, type, and name")]
    IncompleteAtomLine,
    #[error("Invalid atom index '{value}' in [{section}]")]
    InvalidAtomIndex {
        section: &'static str,
        value: String,
    },
    #[error("Expected {expected} atom indices in [{section}], found {found}")]
    AtomIndexCount {
        section: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("No fitted parameter block left for [{section}] {subtype}")]
    MissingFittedBlock {
        section: &'static str,
        subtype: &'static str,
    },
    #[error("Fitted block for [{section}] {subtype} has {found} parameters, expected {expected}")]
    FittedParamCount {
        section: &'static str,
        subtype: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("Invalid fitted parameter '{value}' for [{section}] {subtype}")]
    InvalidFittedParam {
        section: &'static str,
        subtype: &'static str,
        value: String,
    },
    #[error("Interaction line must carry a pair, a name, and the four fit-report fields")]
    IncompleteInteractionLine,
    #[error("Atom pair '{value}' is not of the form At1~At2")]
    MalformedAtomPair { value: String },
    #[error("Invalid interaction parameter '{value}'")]
    InvalidInteractionParam { value: String },
}

/// Everything a downstream generator needs from one `.off` file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedOff {
    pub molecules: Vec<Molecule>,
    pub nonbonded: NonbondedModel,
}

/// Entry point for `.off` parsing.
pub struct OffFile;

impl OffFile {
    pub fn read_from(reader: &mut impl BufRead) -> Result<ParsedOff, OffError> {
        let mut source = String::new();
        reader.read_to_string(&mut source)?;
        Self::parse_str(&source)
    }

    pub fn read_path(path: impl AsRef<Path>) -> Result<ParsedOff, OffError> {
        let mut reader = BufReader::new(File::open(path)?);
        Self::read_from(&mut reader)
    }

    pub fn parse_str(source: &str) -> Result<ParsedOff, OffError> {
        let sections = Sections::split(source)?;

        let hits = keywords::scan(sections.ff_input);
        let (bonded_hits, _) = keywords::classify(&hits);
        let spans = keywords::segment_molecules(&bonded_hits, sections.ff_input)?;

        let mut cursor = fitted::FittedCursor::new(sections.intra_potential);
        let mut molecules = Vec::with_capacity(spans.len());
        for span in &spans {
            molecules.push(bonded::parse_molecule(span, sections.ff_input, &mut cursor)?);
        }

        let nonbonded =
            nonbonded::parse_inter_potential(sections.inter_potential, sections.inter_potential_line)?;

        debug!(
            molecules = molecules.len(),
            pairs = nonbonded.len(),
            fitted_blocks = cursor.consumed(),
            "parsed off file"
        );
        Ok(ParsedOff {
            molecules,
            nonbonded,
        })
    }
}

/// 1-based line number of a byte offset, for parse diagnostics.
pub(crate) fn line_number(source: &str, offset: usize) -> usize {
    source[..offset].bytes().filter(|&b| b == b'\n').count() + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::nonbonded::PairKey;

    const FIXTURE: &str = "\
CRYOFF run input
 [ MOL ] WAT 1
 [ ATO ] 3
  1  OW   O1
  2  HW   H1
 [ BON ]
  HAR
  1 2
Atom Types:
 OW HW
Intra-Potential:
 [ BON HAR WAT ]  0.9572  450.0
Inter-Potential:
 OW~OW : COU :  0.49 : 0 0 0 0
 OW~HW : EXP :  50.0  3.5 : 0 0 0 0
End Inter-Potential
Molecular-Definition:
mol here
Table-Potential:
table here
";

    #[test]
    fn parse_str_populates_molecules_and_nonbonded() {
        let parsed = OffFile::parse_str(FIXTURE).unwrap();

        assert_eq!(parsed.molecules.len(), 1);
        let wat = &parsed.molecules[0];
        assert_eq!(wat.name, "WAT");
        assert_eq!(wat.bonded.atoms.len(), 2);
        assert_eq!(wat.bonded.harmonic_bonds.len(), 1);
        assert_eq!(wat.bonded.harmonic_bonds[0].params.r0, 0.9572);
        assert_eq!(wat.bonded.harmonic_bonds[0].params.k, 450.0);
        assert_eq!(wat.bonded.harmonic_bonds[0].atoms, vec![[1, 2]]);

        assert_eq!(parsed.nonbonded.len(), 2);
        let ow_hw = parsed
            .nonbonded
            .get(&PairKey::new("OW", "HW"))
            .unwrap();
        assert_eq!(ow_hw.get("EXP"), Some(&[vec![50.0, 3.5]][..]));
    }

    #[test]
    fn missing_marker_is_a_fatal_error() {
        let err = OffFile::parse_str("no markers at all").unwrap_err();
        assert!(matches!(err, OffError::MissingMarker("Atom Types:")));
    }

    #[test]
    fn line_number_counts_from_one() {
        let text = "a\nb\nc";
        assert_eq!(line_number(text, 0), 1);
        assert_eq!(line_number(text, 2), 2);
        assert_eq!(line_number(text, 4), 3);
    }
}
