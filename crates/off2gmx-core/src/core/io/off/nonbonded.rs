//! Parsing the fitted inter-potential lines.
//!
//! Every line is `At1~At2 : NAME : P1 P2 ... : <four fit-report fields>`;
//! the colons are decorative and stripped wholesale. The marker line and
//! the two trailer lines at the end of the section carry no interactions.

use super::{OffError, OffParseErrorKind};
use crate::core::models::nonbonded::{COULOMB, NonbondedModel, PairKey};

/// Number of trailing bookkeeping fields on every interaction line.
const FIT_REPORT_FIELDS: usize = 4;

pub(crate) fn parse_inter_potential(
    section: &str,
    first_line: usize,
) -> Result<NonbondedModel, OffError> {
    let cleaned: String = section.chars().filter(|&c| c != ':').collect();
    let lines: Vec<&str> = cleaned.split('\n').collect();
    let mut model = NonbondedModel::default();
    if lines.len() < 3 {
        return Ok(model);
    }

    for (i, line) in lines[1..lines.len() - 2].iter().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let line_no = first_line + 1 + i;
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < FIT_REPORT_FIELDS + 2 {
            return Err(OffError::Parse {
                line: line_no,
                kind: OffParseErrorKind::IncompleteInteractionLine,
            });
        }
        let kept = &fields[..fields.len() - FIT_REPORT_FIELDS];

        let mut pair_parts = kept[0].split('~');
        let pair = match (pair_parts.next(), pair_parts.next(), pair_parts.next()) {
            (Some(a), Some(b), None) if !a.is_empty() && !b.is_empty() => PairKey::new(a, b),
            _ => {
                return Err(OffError::Parse {
                    line: line_no,
                    kind: OffParseErrorKind::MalformedAtomPair {
                        value: kept[0].to_string(),
                    },
                });
            }
        };

        // Coulomb entries are written with decorated names; they collapse
        // to the canonical key.
        let raw_name = kept[1];
        let name = if raw_name.contains(COULOMB) {
            COULOMB
        } else {
            raw_name
        };

        let params = kept[2..]
            .iter()
            .map(|field| {
                field.parse::<f64>().map_err(|_| OffError::Parse {
                    line: line_no,
                    kind: OffParseErrorKind::InvalidInteractionParam {
                        value: (*field).to_string(),
                    },
                })
            })
            .collect::<Result<Vec<f64>, OffError>>()?;

        model.push(pair, name, params);
    }
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECTION: &str = "\
Inter-Potential:
 OW~OW : BUCWATER :  100.0  200.0  3.0 : 1 2 3 4
 OW~OW : COULOMB :  0.49 : 1 2 3 4
 HW~OW : EXP :  50.0  3.5 : 1 2 3 4
 OW~HW : EXP :  60.0  4.5 : 1 2 3 4
End Inter-Potential
";

    #[test]
    fn lines_accumulate_per_sorted_pair_and_name() {
        let model = parse_inter_potential(SECTION, 1).unwrap();
        assert_eq!(model.len(), 2);

        let ow_ow = model.get(&PairKey::new("OW", "OW")).unwrap();
        assert_eq!(
            ow_ow.get("BUCWATER"),
            Some(&[vec![100.0, 200.0, 3.0]][..])
        );
        // The decorated Coulomb name collapses to the canonical key.
        assert_eq!(ow_ow.coulomb(), Some(&[vec![0.49]][..]));
        assert!(ow_ow.get("COULOMB").is_none());

        // HW~OW and OW~HW land on the same sorted pair, in file order.
        let mixed = model.get(&PairKey::new("OW", "HW")).unwrap();
        assert_eq!(
            mixed.get("EXP"),
            Some(&[vec![50.0, 3.5], vec![60.0, 4.5]][..])
        );
    }

    #[test]
    fn marker_and_trailer_lines_are_not_interactions() {
        let section = "Inter-Potential:\nEnd Inter-Potential\n";
        let model = parse_inter_potential(section, 1).unwrap();
        assert!(model.is_empty());
    }

    #[test]
    fn short_lines_are_fatal_with_their_line_number() {
        let section = "\
Inter-Potential:
 OW~OW : EXP : 1 2 3 4
 OW~OW COU
End Inter-Potential
";
        let err = parse_inter_potential(section, 10).unwrap_err();
        assert!(matches!(
            err,
            OffError::Parse {
                line: 12,
                kind: OffParseErrorKind::IncompleteInteractionLine
            }
        ));
    }

    #[test]
    fn malformed_pairs_are_fatal() {
        let section = "\
Inter-Potential:
 OWHW : EXP : 1.0 2.0 : 1 2 3 4
End Inter-Potential
";
        let err = parse_inter_potential(section, 1).unwrap_err();
        assert!(matches!(
            err,
            OffError::Parse {
                line: 2,
                kind: OffParseErrorKind::MalformedAtomPair { .. }
            }
        ));
    }
}
