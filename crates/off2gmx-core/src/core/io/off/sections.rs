//! Carving an `.off` file into its five marker-delimited sections.

use super::{OffError, line_number};

pub const ATOM_TYPES_MARKER: &str = "Atom Types:";
pub const INTRA_POTENTIAL_MARKER: &str = "Intra-Potential:\n";
pub const INTER_POTENTIAL_MARKER: &str = "Inter-Potential:\n";
pub const MOLECULAR_DEFINITION_MARKER: &str = "Molecular-Definition:\n";
pub const TABLE_POTENTIAL_MARKER: &str = "Table-Potential:\n";

/// The five sections of an `.off` file.
///
/// `ff_input` is the echoed CRYOFF input (everything before the atom-type
/// listing); `intra_potential` and `inter_potential` hold the fitted
/// parameters. The last two sections are captured for completeness only;
/// nothing downstream consumes them.
#[derive(Debug, Clone, PartialEq)]
pub struct Sections<'a> {
    pub ff_input: &'a str,
    pub intra_potential: &'a str,
    pub inter_potential: &'a str,
    pub molecular_definition: &'a str,
    pub table_potential: &'a str,
    /// 1-based line of the inter-potential marker, for diagnostics.
    pub(crate) inter_potential_line: usize,
}

impl<'a> Sections<'a> {
    /// Splits the file text at the first occurrence of each marker.
    ///
    /// Every marker is required, and they must appear in file order;
    /// anything else fails before downstream parsing starts.
    pub fn split(source: &'a str) -> Result<Self, OffError> {
        let mut previous_end = 0usize;
        let mut locate = |marker: &'static str| -> Result<usize, OffError> {
            let at = source.find(marker).ok_or(OffError::MissingMarker(marker))?;
            if at < previous_end {
                return Err(OffError::MarkerOutOfOrder(marker));
            }
            previous_end = at;
            Ok(at)
        };

        let atom_types = locate(ATOM_TYPES_MARKER)?;
        let intra = locate(INTRA_POTENTIAL_MARKER)?;
        let inter = locate(INTER_POTENTIAL_MARKER)?;
        let molecular = locate(MOLECULAR_DEFINITION_MARKER)?;
        let table = locate(TABLE_POTENTIAL_MARKER)?;

        let table_potential = source[table..].strip_suffix('\n').unwrap_or(&source[table..]);
        Ok(Self {
            ff_input: &source[..atom_types],
            intra_potential: &source[intra..inter],
            inter_potential: &source[inter..molecular],
            molecular_definition: &source[molecular..table],
            table_potential,
            inter_potential_line: line_number(source, inter),
        })
    }
}
