//! Per-molecule bonded section parsing.
//!
//! Inside a section body, a non-blank line either names a sub-type (the
//! code appears anywhere on the line) or lists atom indices with the exact
//! arity of the section. Naming a sub-type pulls the next fitted block from
//! the cursor and opens a group; atom lines accumulate under the most
//! recent group. Atom lines before any declaration parse but land nowhere,
//! which is how CRYOFF files pad sections.

use super::fitted::{FittedCursor, ParamError, leading_params};
use super::keywords::{Keyword, MoleculeSpan};
use super::{OffError, OffParseErrorKind, line_number};
use crate::core::models::bonded::{
    AngleGroup, AtomRecord, AtomTable, BondGroup, BondedModel, CosineDihedral, CoupledDihedral,
    DihedralGroup, HarmonicAngle, HarmonicBond, HarmonicDihedral, Molecule, MubTerm, QbbCross,
    QuarticAngle, QuarticBond, TermGroup, VirtualSite,
};

/// Parses every section of one molecule, consuming fitted blocks in file
/// order. A repeated top-level keyword replaces the earlier section; the
/// blocks the replaced section consumed stay consumed.
pub(crate) fn parse_molecule(
    span: &MoleculeSpan,
    ff_input: &str,
    fitted: &mut FittedCursor<'_>,
) -> Result<Molecule, OffError> {
    let mut model = BondedModel::default();
    for section in &span.sections {
        let body = &ff_input[section.start..section.end];
        match section.keyword {
            Keyword::Ato => model.atoms = parse_atoms(body, section.start, ff_input)?,
            Keyword::Bon => {
                let (harmonic, quartic) = parse_bonds(body, section.start, ff_input, fitted)?;
                model.harmonic_bonds = harmonic;
                model.quartic_bonds = quartic;
            }
            Keyword::Ang => {
                let (harmonic, quartic) = parse_angles(body, section.start, ff_input, fitted)?;
                model.harmonic_angles = harmonic;
                model.quartic_angles = quartic;
            }
            Keyword::Bd3 => {
                let (qbb, mub) = parse_three_center(body, section.start, ff_input, fitted)?;
                model.qbb_terms = qbb;
                model.mub_terms = mub;
            }
            Keyword::Dih => {
                let (harmonic, periodic, cosine) =
                    parse_dihedrals(body, section.start, ff_input, fitted)?;
                model.harmonic_dihedrals = harmonic;
                model.periodic_dihedrals = periodic;
                model.cosine_dihedrals = cosine;
            }
            Keyword::Cdih => {
                let (periodic, cosine) =
                    parse_coupled_dihedrals(body, section.start, ff_input, fitted)?;
                model.coupled_periodic_dihedrals = periodic;
                model.coupled_cosine_dihedrals = cosine;
            }
            Keyword::Exc => model.exclusions = parse_exclusions(body, section.start, ff_input)?,
            // segment_molecules only emits the section keywords above.
            _ => {}
        }
    }
    Ok(Molecule {
        name: span.name.clone(),
        bonded: model,
    })
}

/// Content lines of a section body with their absolute byte offsets. The
/// first line is the remainder of the header line; blank lines carry
/// nothing. Both are dropped.
fn content_lines<'a>(body: &'a str, base: usize) -> Vec<(usize, &'a str)> {
    let mut lines = Vec::new();
    let mut offset = 0usize;
    for (i, line) in body.split('\n').enumerate() {
        if i > 0 && !line.trim().is_empty() {
            lines.push((base + offset, line));
        }
        offset += line.len() + 1;
    }
    lines
}

fn parse_atoms(body: &str, base: usize, ff_input: &str) -> Result<AtomTable, OffError> {
    const SECTION: &str = "ATO";
    let mut table = AtomTable::default();
    for (offset, line) in content_lines(body, base) {
        let line_no = line_number(ff_input, offset);
        if line.contains('*') {
            // Virtual site: the star is decoration, the fields after
            // index/type/name define the site position.
            let cleaned: String = line.chars().filter(|&c| c != '*').collect();
            let fields: Vec<&str> = cleaned.split_whitespace().collect();
            if fields.len() < 3 {
                return Err(OffError::Parse {
                    line: line_no,
                    kind: OffParseErrorKind::IncompleteAtomLine,
                });
            }
            let index = parse_index(fields[0], SECTION, line_no)?;
            table.push_virtual(VirtualSite {
                index,
                ff_type: fields[1].to_string(),
                name: fields[2].to_string(),
                definition: fields[3..].iter().map(|s| s.to_string()).collect(),
            });
            table.push(AtomRecord::new(index, fields[1], fields[2]));
        } else {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 3 {
                return Err(OffError::Parse {
                    line: line_no,
                    kind: OffParseErrorKind::IncompleteAtomLine,
                });
            }
            let index = parse_index(fields[0], SECTION, line_no)?;
            table.push(AtomRecord::new(index, fields[1], fields[2]));
        }
    }
    Ok(table)
}

fn parse_bonds(
    body: &str,
    base: usize,
    ff_input: &str,
    fitted: &mut FittedCursor<'_>,
) -> Result<(Vec<BondGroup<HarmonicBond>>, Vec<BondGroup<QuarticBond>>), OffError> {
    const SECTION: &str = "BON";
    let mut harmonic = Vec::new();
    let mut quartic = Vec::new();
    let mut current = Current::None;

    for (offset, line) in content_lines(body, base) {
        let line_no = line_number(ff_input, offset);
        if line.contains("QUA") {
            let p = pull_params(fitted, 4, SECTION, "QUA", line_no)?;
            let params = QuarticBond {
                r0: p[0],
                k2: p[1],
                k3: p[2],
                k4: p[3],
            };
            current = Current::A(declare(&mut quartic, params));
            continue;
        }
        if line.contains("HAR") {
            let p = pull_params(fitted, 2, SECTION, "HAR", line_no)?;
            let params = HarmonicBond { r0: p[0], k: p[1] };
            current = Current::B(declare(&mut harmonic, params));
            continue;
        }
        let atoms = parse_atom_tuple::<2>(line, SECTION, line_no)?;
        match current {
            Current::A(i) => quartic[i].atoms.push(atoms),
            Current::B(i) => harmonic[i].atoms.push(atoms),
            _ => {}
        }
    }
    Ok((harmonic, quartic))
}

fn parse_angles(
    body: &str,
    base: usize,
    ff_input: &str,
    fitted: &mut FittedCursor<'_>,
) -> Result<(Vec<AngleGroup<HarmonicAngle>>, Vec<AngleGroup<QuarticAngle>>), OffError> {
    const SECTION: &str = "ANG";
    let mut harmonic = Vec::new();
    let mut quartic = Vec::new();
    let mut current = Current::None;

    for (offset, line) in content_lines(body, base) {
        let line_no = line_number(ff_input, offset);
        if line.contains("QUA") {
            let p = pull_params(fitted, 4, SECTION, "QUA", line_no)?;
            let params = QuarticAngle {
                theta0: p[0],
                k2: p[1],
                k3: p[2],
                k4: p[3],
            };
            current = Current::A(declare(&mut quartic, params));
            continue;
        }
        if line.contains("HAR") {
            let p = pull_params(fitted, 2, SECTION, "HAR", line_no)?;
            let params = HarmonicAngle {
                theta0: p[0],
                k: p[1],
            };
            current = Current::B(declare(&mut harmonic, params));
            continue;
        }
        let atoms = parse_atom_tuple::<3>(line, SECTION, line_no)?;
        match current {
            Current::A(i) => quartic[i].atoms.push(atoms),
            Current::B(i) => harmonic[i].atoms.push(atoms),
            _ => {}
        }
    }
    Ok((harmonic, quartic))
}

fn parse_three_center(
    body: &str,
    base: usize,
    ff_input: &str,
    fitted: &mut FittedCursor<'_>,
) -> Result<(Vec<AngleGroup<QbbCross>>, Vec<AngleGroup<MubTerm>>), OffError> {
    const SECTION: &str = "BD3";
    let mut qbb = Vec::new();
    let mut mub = Vec::new();
    let mut current = Current::None;

    for (offset, line) in content_lines(body, base) {
        let line_no = line_number(ff_input, offset);
        if line.contains("QBB") {
            let p = pull_params(fitted, 5, SECTION, "QBB", line_no)?;
            let params = QbbCross {
                r0: p[0],
                krr: p[1],
                k2: p[2],
                k3: p[3],
                k4: p[4],
            };
            current = Current::A(declare(&mut qbb, params));
            continue;
        }
        if line.contains("MUB") {
            let p = pull_params(fitted, 4, SECTION, "MUB", line_no)?;
            let params = MubTerm {
                p1: p[0],
                p2: p[1],
                p3: p[2],
                p4: p[3],
            };
            current = Current::B(declare(&mut mub, params));
            continue;
        }
        let atoms = parse_atom_tuple::<3>(line, SECTION, line_no)?;
        match current {
            Current::A(i) => qbb[i].atoms.push(atoms),
            Current::B(i) => mub[i].atoms.push(atoms),
            _ => {}
        }
    }
    Ok((qbb, mub))
}

fn parse_dihedrals(
    body: &str,
    base: usize,
    ff_input: &str,
    fitted: &mut FittedCursor<'_>,
) -> Result<
    (
        Vec<DihedralGroup<HarmonicDihedral>>,
        Vec<DihedralGroup<CosineDihedral>>,
        Vec<DihedralGroup<CosineDihedral>>,
    ),
    OffError,
> {
    const SECTION: &str = "DIH";
    let mut harmonic = Vec::new();
    let mut periodic = Vec::new();
    let mut cosine = Vec::new();
    let mut current = Current::None;

    for (offset, line) in content_lines(body, base) {
        let line_no = line_number(ff_input, offset);
        if line.contains("HAR") {
            let p = pull_params(fitted, 2, SECTION, "HAR", line_no)?;
            let params = HarmonicDihedral { p1: p[0], p2: p[1] };
            current = Current::A(declare(&mut harmonic, params));
            continue;
        }
        if line.contains("NCO") {
            let p = pull_params(fitted, 3, SECTION, "NCO", line_no)?;
            let params = CosineDihedral {
                p1: p[0],
                p2: p[1],
                p3: p[2],
            };
            current = Current::B(declare(&mut periodic, params));
            continue;
        }
        if line.contains("COS") {
            let p = pull_params(fitted, 3, SECTION, "COS", line_no)?;
            let params = CosineDihedral {
                p1: p[0],
                p2: p[1],
                p3: p[2],
            };
            current = Current::C(declare(&mut cosine, params));
            continue;
        }
        let atoms = parse_atom_tuple::<4>(line, SECTION, line_no)?;
        match current {
            Current::A(i) => harmonic[i].atoms.push(atoms),
            Current::B(i) => periodic[i].atoms.push(atoms),
            Current::C(i) => cosine[i].atoms.push(atoms),
            Current::None => {}
        }
    }
    Ok((harmonic, periodic, cosine))
}

fn parse_coupled_dihedrals(
    body: &str,
    base: usize,
    ff_input: &str,
    fitted: &mut FittedCursor<'_>,
) -> Result<
    (
        Vec<DihedralGroup<CoupledDihedral>>,
        Vec<DihedralGroup<CoupledDihedral>>,
    ),
    OffError,
> {
    const SECTION: &str = "CDIH";
    let mut periodic = Vec::new();
    let mut cosine = Vec::new();
    let mut current = Current::None;

    for (offset, line) in content_lines(body, base) {
        let line_no = line_number(ff_input, offset);
        if line.contains("CNCO") {
            let p = pull_params(fitted, 4, SECTION, "CNCO", line_no)?;
            let params = CoupledDihedral {
                p1: p[0],
                p2: p[1],
                p3: p[2],
                p4: p[3],
            };
            current = Current::A(declare(&mut periodic, params));
            continue;
        }
        if line.contains("CCOS") {
            let p = pull_params(fitted, 4, SECTION, "CCOS", line_no)?;
            let params = CoupledDihedral {
                p1: p[0],
                p2: p[1],
                p3: p[2],
                p4: p[3],
            };
            current = Current::B(declare(&mut cosine, params));
            continue;
        }
        let atoms = parse_atom_tuple::<4>(line, SECTION, line_no)?;
        match current {
            Current::A(i) => periodic[i].atoms.push(atoms),
            Current::B(i) => cosine[i].atoms.push(atoms),
            _ => {}
        }
    }
    Ok((periodic, cosine))
}

fn parse_exclusions(body: &str, base: usize, ff_input: &str) -> Result<Vec<Vec<u32>>, OffError> {
    const SECTION: &str = "EXC";
    let mut exclusions = Vec::new();
    for (offset, line) in content_lines(body, base) {
        let line_no = line_number(ff_input, offset);
        let indices = line
            .split_whitespace()
            .map(|field| parse_index(field, SECTION, line_no))
            .collect::<Result<Vec<u32>, OffError>>()?;
        exclusions.push(indices);
    }
    Ok(exclusions)
}

/// Which group the next atom lines belong to; sections have at most three
/// sub-types.
enum Current {
    None,
    A(usize),
    B(usize),
    C(usize),
}

/// Opens a group for `params`, reusing (and emptying) an existing group
/// with identical parameters so re-declarations behave like map entries.
fn declare<P: PartialEq, const N: usize>(groups: &mut Vec<TermGroup<P, N>>, params: P) -> usize {
    if let Some(i) = groups.iter().position(|g| g.params == params) {
        groups[i].atoms.clear();
        i
    } else {
        groups.push(TermGroup::new(params));
        groups.len() - 1
    }
}

fn pull_params(
    fitted: &mut FittedCursor<'_>,
    count: usize,
    section: &'static str,
    subtype: &'static str,
    line: usize,
) -> Result<Vec<f64>, OffError> {
    let block = fitted.pull().ok_or(OffError::Parse {
        line,
        kind: OffParseErrorKind::MissingFittedBlock { section, subtype },
    })?;
    leading_params(block, count).map_err(|e| OffError::Parse {
        line,
        kind: match e {
            ParamError::Count(found) => OffParseErrorKind::FittedParamCount {
                section,
                subtype,
                expected: count,
                found,
            },
            ParamError::Float(value) => OffParseErrorKind::InvalidFittedParam {
                section,
                subtype,
                value,
            },
        },
    })
}

fn parse_index(field: &str, section: &'static str, line: usize) -> Result<u32, OffError> {
    field.parse::<u32>().map_err(|_| OffError::Parse {
        line,
        kind: OffParseErrorKind::InvalidAtomIndex {
            section,
            value: field.to_string(),
        },
    })
}

fn parse_atom_tuple<const N: usize>(
    line: &str,
    section: &'static str,
    line_no: usize,
) -> Result<[u32; N], OffError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != N {
        return Err(OffError::Parse {
            line: line_no,
            kind: OffParseErrorKind::AtomIndexCount {
                section,
                expected: N,
                found: fields.len(),
            },
        });
    }
    let mut atoms = [0u32; N];
    for (slot, field) in atoms.iter_mut().zip(&fields) {
        *slot = parse_index(field, section, line_no)?;
    }
    Ok(atoms)
}
