use crate::cli::InspectArgs;
use crate::error::{CliError, Result};
use off2gmx::workflows::convert::OffForceField;
use tracing::info;

pub fn run(args: InspectArgs) -> Result<()> {
    info!("Loading force field from {:?}", &args.input);
    let forcefield = OffForceField::from_path(&args.input).map_err(|e| CliError::FileParsing {
        path: args.input.clone(),
        source: e.into(),
    })?;

    print!("{}", report(&forcefield));
    Ok(())
}

fn report(forcefield: &OffForceField) -> String {
    let mut out = String::new();
    out.push_str(&format!("Molecules: {}\n", forcefield.molecules.len()));
    for molecule in &forcefield.molecules {
        let bonded = &molecule.bonded;
        let atoms = bonded.atoms.physical().count();
        let virtuals = bonded.atoms.virtual_sites().len();
        let bonds = bonded.harmonic_bonds.len() + bonded.quartic_bonds.len();
        let angles = bonded.harmonic_angles.len()
            + bonded.quartic_angles.len()
            + bonded.qbb_terms.len()
            + bonded.mub_terms.len();
        let dihedrals = bonded.harmonic_dihedrals.len()
            + bonded.periodic_dihedrals.len()
            + bonded.cosine_dihedrals.len()
            + bonded.coupled_periodic_dihedrals.len()
            + bonded.coupled_cosine_dihedrals.len();
        out.push_str(&format!(
            "  {}: {} atom(s), {} virtual site(s), {} bond group(s), {} angle group(s), {} dihedral group(s)\n",
            molecule.name, atoms, virtuals, bonds, angles, dihedrals
        ));
        if bonded.has_table_terms() {
            out.push_str("    uses tabulated bonded potentials\n");
        }
    }

    out.push_str(&format!(
        "Pair interactions: {}\n",
        forcefield.nonbonded.len()
    ));
    for (pair, interactions) in forcefield.nonbonded.iter() {
        let names: Vec<String> = interactions
            .iter()
            .map(|(name, sets)| {
                if sets.len() > 1 {
                    format!("{} x{}", name, sets.len())
                } else {
                    name.to_string()
                }
            })
            .collect();
        out.push_str(&format!("  {}: {}\n", pair, names.join(", ")));
    }
    out
}
