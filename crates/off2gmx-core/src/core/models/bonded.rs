//! Typed bonded-interaction model for a single molecule.
//!
//! CRYOFF groups each bonded interaction under a parameter set followed by
//! the atom tuples the set applies to; this module mirrors that shape with
//! one [`TermGroup`] per fitted parameter set, in declaration order.

/// Pseudo-atom name CRYOFF uses for the net-force constraint row.
pub const NET_FORCE_SENTINEL: &str = "NETF";
/// Pseudo-atom name CRYOFF uses for the torque constraint row.
pub const TORQUE_SENTINEL: &str = "TORQ";

/// A single entry of a molecule's atom table.
///
/// The force-field type (`ff_type`) keys nonbonded pairs and tabulated
/// potential files; the atom name (`name`) keys per-atom charges.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomRecord {
    /// One-based atom index as written in the file.
    pub index: u32,
    /// Force-field atom type (first name column).
    pub ff_type: String,
    /// Atom name (second name column).
    pub name: String,
}

impl AtomRecord {
    pub fn new(index: u32, ff_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            index,
            ff_type: ff_type.into(),
            name: name.into(),
        }
    }

    /// Whether this record is one of the `NETF`/`TORQ` constraint rows.
    ///
    /// Sentinel rows carry fit bookkeeping, not atoms; they are excluded from
    /// every physical-atom, charge, and residue projection.
    pub fn is_sentinel(&self) -> bool {
        let matches = |s: &str| s == NET_FORCE_SENTINEL || s == TORQUE_SENTINEL;
        matches(&self.ff_type) || matches(&self.name)
    }
}

/// A virtual (massless) site declared with a `*` prefix in the atom table.
///
/// The definition tokens describe how the site position is constructed from
/// real atoms; they are carried through verbatim for topology rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualSite {
    pub index: u32,
    pub ff_type: String,
    pub name: String,
    pub definition: Vec<String>,
}

/// The atom table of one molecule, in file order.
///
/// Virtual sites appear both in the main record list (so indices resolve
/// uniformly) and in a dedicated side list that keeps their definitions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AtomTable {
    records: Vec<AtomRecord>,
    virtual_sites: Vec<VirtualSite>,
}

impl AtomTable {
    /// Adds a record, replacing any existing record with the same index.
    pub fn push(&mut self, record: AtomRecord) {
        if let Some(existing) = self.records.iter_mut().find(|r| r.index == record.index) {
            *existing = record;
        } else {
            self.records.push(record);
        }
    }

    /// Adds a virtual site, replacing any existing site with the same
    /// index/type/name triple.
    pub fn push_virtual(&mut self, site: VirtualSite) {
        if let Some(existing) = self.virtual_sites.iter_mut().find(|s| {
            s.index == site.index && s.ff_type == site.ff_type && s.name == site.name
        }) {
            *existing = site;
        } else {
            self.virtual_sites.push(site);
        }
    }

    pub fn get(&self, index: u32) -> Option<&AtomRecord> {
        self.records.iter().find(|r| r.index == index)
    }

    /// All records in file order, sentinels included.
    pub fn iter(&self) -> impl Iterator<Item = &AtomRecord> {
        self.records.iter()
    }

    /// Records that describe real or virtual atoms, i.e. everything except
    /// the `NETF`/`TORQ` constraint rows.
    pub fn physical(&self) -> impl Iterator<Item = &AtomRecord> {
        self.records.iter().filter(|r| !r.is_sentinel())
    }

    pub fn virtual_sites(&self) -> &[VirtualSite] {
        &self.virtual_sites
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Harmonic bond parameters: equilibrium length (Å) and force constant
/// (kcal/mol/Å²).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HarmonicBond {
    pub r0: f64,
    pub k: f64,
}

/// Quartic bond parameters: equilibrium length (Å) and the quadratic, cubic,
/// and quartic force constants (kcal/mol/Åⁿ).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuarticBond {
    pub r0: f64,
    pub k2: f64,
    pub k3: f64,
    pub k4: f64,
}

/// Harmonic angle parameters: equilibrium angle (degrees) and force constant
/// (kcal/mol/rad²).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HarmonicAngle {
    pub theta0: f64,
    pub k: f64,
}

/// Quartic angle parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuarticAngle {
    pub theta0: f64,
    pub k2: f64,
    pub k3: f64,
    pub k4: f64,
}

/// Quartic bond-bond cross term over an atom triple: shared equilibrium
/// length, the bond-bond coupling constant, and the quartic constants of the
/// two bonds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QbbCross {
    pub r0: f64,
    pub krr: f64,
    pub k2: f64,
    pub k3: f64,
    pub k4: f64,
}

/// MUB three-center parameters, kept as written; the CRYOFF manual leaves
/// their mapping onto a simulation functional form unresolved, so these terms
/// never reach table generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MubTerm {
    pub p1: f64,
    pub p2: f64,
    pub p3: f64,
    pub p4: f64,
}

/// Harmonic dihedral parameters as written (two values).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HarmonicDihedral {
    pub p1: f64,
    pub p2: f64,
}

/// Cosine-series dihedral parameters (three values), used by both the `NCO`
/// and `COS` forms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CosineDihedral {
    pub p1: f64,
    pub p2: f64,
    pub p3: f64,
}

/// Coupled-dihedral parameters (four values), used by both the `CNCO` and
/// `CCOS` forms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoupledDihedral {
    pub p1: f64,
    pub p2: f64,
    pub p3: f64,
    pub p4: f64,
}

/// One fitted parameter set together with the atom tuples it applies to.
#[derive(Debug, Clone, PartialEq)]
pub struct TermGroup<P, const N: usize> {
    pub params: P,
    pub atoms: Vec<[u32; N]>,
}

impl<P, const N: usize> TermGroup<P, N> {
    pub fn new(params: P) -> Self {
        Self {
            params,
            atoms: Vec::new(),
        }
    }
}

pub type BondGroup<P> = TermGroup<P, 2>;
pub type AngleGroup<P> = TermGroup<P, 3>;
pub type DihedralGroup<P> = TermGroup<P, 4>;

/// Every bonded interaction of one molecule, grouped by functional form.
///
/// Group vectors preserve declaration order; bonded table numbers are
/// assigned by walking quartic bonds first, then bond-bond cross terms, in
/// exactly this order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BondedModel {
    pub atoms: AtomTable,
    pub harmonic_bonds: Vec<BondGroup<HarmonicBond>>,
    pub quartic_bonds: Vec<BondGroup<QuarticBond>>,
    pub harmonic_angles: Vec<AngleGroup<HarmonicAngle>>,
    pub quartic_angles: Vec<AngleGroup<QuarticAngle>>,
    pub qbb_terms: Vec<AngleGroup<QbbCross>>,
    pub mub_terms: Vec<AngleGroup<MubTerm>>,
    pub harmonic_dihedrals: Vec<DihedralGroup<HarmonicDihedral>>,
    pub periodic_dihedrals: Vec<DihedralGroup<CosineDihedral>>,
    pub cosine_dihedrals: Vec<DihedralGroup<CosineDihedral>>,
    pub coupled_periodic_dihedrals: Vec<DihedralGroup<CoupledDihedral>>,
    pub coupled_cosine_dihedrals: Vec<DihedralGroup<CoupledDihedral>>,
    pub exclusions: Vec<Vec<u32>>,
}

impl BondedModel {
    /// Whether any group in this molecule produces a bonded lookup table.
    pub fn has_table_terms(&self) -> bool {
        !self.quartic_bonds.is_empty() || !self.qbb_terms.is_empty()
    }
}

/// A parsed molecule: its name and its bonded model.
#[derive(Debug, Clone, PartialEq)]
pub struct Molecule {
    pub name: String,
    pub bonded: BondedModel,
}
