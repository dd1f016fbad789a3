//! Unit conversion from fitted CRYOFF forms to evaluable potentials.
//!
//! Fitted parameters arrive in kcal/mol and Angstrom; GROMACS tables need
//! kJ/mol and nm. Each supported interaction form gets its distance-bearing
//! parameters rescaled here before evaluation, so the pure functions in
//! [`super::potentials`] never see unit conversion.

use super::potentials;
use crate::core::models::nonbonded::InteractionKey;
use tracing::warn;

/// kcal/mol to kJ/mol.
pub(crate) const KCAL_TO_KJ: f64 = 4.184;

/// Angstrom to nm.
pub(crate) const ANGSTROM_TO_NM: f64 = 0.1;

/// A nonbonded interaction converted to GROMACS units, ready to evaluate.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PairPotential {
    Exponential { a: f64, alpha: f64 },
    ShiftedTruncated { p1: f64, p2: f64, p3: f64 },
    PowerLaw { p1: f64, p2: f64 },
    ScreenedDispersion { p1: f64, p2: f64, p3: f64 },
}

impl PairPotential {
    /// Converts one fitted parameter set and picks the potential form for
    /// `key`.
    ///
    /// An attractive interaction under C6 scaling gets a unit prefactor;
    /// the magnitude then travels through the scaled C6 in
    /// `[ nonbond_params ]` and GROMACS multiplies it back in. Returns
    /// `None`, with a warning, for forms this generator cannot produce and
    /// for parameter sets shorter than their form requires.
    pub(crate) fn prepare(
        key: &InteractionKey,
        params: &[f64],
        attractive: bool,
        scale_c6: bool,
    ) -> Option<Self> {
        match key.code() {
            "EXP" => {
                let [p1, p2] = leading(key, params)?;
                Some(Self::Exponential {
                    a: KCAL_TO_KJ * p1,
                    alpha: 10.0 * p2,
                })
            }
            "STR" => {
                let [p1, p2, p3] = leading(key, params)?;
                Some(Self::ShiftedTruncated {
                    p1: KCAL_TO_KJ * p1 * ANGSTROM_TO_NM.powf(p2.abs()),
                    p2,
                    p3: ANGSTROM_TO_NM * p3,
                })
            }
            "POW" => {
                let [p1, p2] = leading(key, params)?;
                let prefactor = if attractive && scale_c6 {
                    -1.0
                } else {
                    KCAL_TO_KJ * p1 * ANGSTROM_TO_NM.powf(p2.abs())
                };
                Some(Self::PowerLaw {
                    p1: prefactor,
                    p2,
                })
            }
            "SRD" => {
                let [p1, p2, p3] = leading(key, params)?;
                let prefactor = if attractive && scale_c6 {
                    -1.0
                } else {
                    KCAL_TO_KJ * p1 * ANGSTROM_TO_NM.powf(p2.abs())
                };
                Some(Self::ScreenedDispersion {
                    p1: prefactor,
                    p2: p2.abs(),
                    p3: ANGSTROM_TO_NM * p3,
                })
            }
            "PEX" | "DPO" => {
                warn!(
                    interaction = %key,
                    "no analytic form implemented for this interaction, skipping"
                );
                None
            }
            other => {
                warn!(interaction = other, "unrecognized interaction form, skipping");
                None
            }
        }
    }

    pub(crate) fn evaluate(&self, r: f64) -> (f64, f64) {
        match *self {
            Self::Exponential { a, alpha } => potentials::exp_decay(r, a, alpha),
            Self::ShiftedTruncated { p1, p2, p3 } => potentials::shifted_truncated(r, p1, p2, p3),
            Self::PowerLaw { p1, p2 } => potentials::power_law(r, p1, p2),
            Self::ScreenedDispersion { p1, p2, p3 } => {
                potentials::screened_dispersion(r, p1, p2, p3)
            }
        }
    }
}

/// Splits a Buckingham `[P1, P2, P3]` parameter set into its r^-6
/// dispersion part and its exponential repulsion part.
///
/// The dispersion part behaves like an attractive `POW` set `[P2, -6]`,
/// including the unit prefactor under C6 scaling; the repulsion part is an
/// `EXP` set `[P1, P3]`.
pub(crate) fn buckingham_parts(
    p1: f64,
    p2: f64,
    p3: f64,
    scale_c6: bool,
) -> (PairPotential, PairPotential) {
    let dispersion_prefactor = if scale_c6 {
        -1.0
    } else {
        KCAL_TO_KJ * p2 * ANGSTROM_TO_NM.powf(6.0)
    };
    let dispersion = PairPotential::PowerLaw {
        p1: dispersion_prefactor,
        p2: -6.0,
    };
    let repulsion = PairPotential::Exponential {
        a: KCAL_TO_KJ * p1,
        alpha: 10.0 * p3,
    };
    (dispersion, repulsion)
}

fn leading<const N: usize>(key: &InteractionKey, params: &[f64]) -> Option<[f64; N]> {
    match params.first_chunk::<N>() {
        Some(chunk) => Some(*chunk),
        None => {
            warn!(
                interaction = %key,
                found = params.len(),
                needed = N,
                "parameter set too short for this interaction form, skipping"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(raw: &str, params: &[f64]) -> InteractionKey {
        InteractionKey::classify(raw, params).unwrap()
    }

    #[test]
    fn exponential_converts_prefactor_and_inverse_length() {
        let params = [50.0, 3.5];
        let prepared = PairPotential::prepare(&key("EXPREP", &params), &params, false, false);
        assert_eq!(
            prepared,
            Some(PairPotential::Exponential {
                a: 4.184 * 50.0,
                alpha: 35.0,
            })
        );
    }

    #[test]
    fn power_law_scales_by_the_distance_power() {
        let params = [1000.0, -6.0];
        let prepared = PairPotential::prepare(&key("POW", &params), &params, false, false);
        assert_eq!(
            prepared,
            Some(PairPotential::PowerLaw {
                p1: 4.184 * 1000.0 * 0.1_f64.powf(6.0),
                p2: -6.0,
            })
        );
    }

    #[test]
    fn attractive_prefactor_becomes_unit_under_c6_scaling() {
        let params = [1000.0, -6.0];
        let prepared = PairPotential::prepare(&key("POW", &params), &params, true, true);
        assert_eq!(
            prepared,
            Some(PairPotential::PowerLaw {
                p1: -1.0,
                p2: -6.0,
            })
        );
    }

    #[test]
    fn screened_dispersion_takes_magnitude_power_and_scaled_screening() {
        let params = [100.0, -6.0, 2.0];
        let prepared = PairPotential::prepare(&key("SRD", &params), &params, false, false);
        assert_eq!(
            prepared,
            Some(PairPotential::ScreenedDispersion {
                p1: 4.184 * 100.0 * 0.1_f64.powf(6.0),
                p2: 6.0,
                p3: 0.2,
            })
        );
    }

    #[test]
    fn unsupported_and_short_parameter_sets_are_skipped() {
        let short = [1.0];
        assert_eq!(
            PairPotential::prepare(&key("EXP", &short), &short, false, false),
            None
        );
        let pex = [1.0, 6.0, 0.5];
        assert_eq!(
            PairPotential::prepare(&key("PEX", &pex), &pex, false, false),
            None
        );
        let unknown = [1.0, 2.0];
        assert_eq!(
            PairPotential::prepare(&key("GLJ", &unknown), &unknown, false, false),
            None
        );
    }

    #[test]
    fn buckingham_decomposes_into_dispersion_and_repulsion() {
        let (dispersion, repulsion) = buckingham_parts(600.0, 1200.0, 3.0, false);
        assert_eq!(
            dispersion,
            PairPotential::PowerLaw {
                p1: 4.184 * 1200.0 * 0.1_f64.powf(6.0),
                p2: -6.0,
            }
        );
        assert_eq!(
            repulsion,
            PairPotential::Exponential {
                a: 4.184 * 600.0,
                alpha: 30.0,
            }
        );

        let (scaled, _) = buckingham_parts(600.0, 1200.0, 3.0, true);
        assert_eq!(
            scaled,
            PairPotential::PowerLaw {
                p1: -1.0,
                p2: -6.0,
            }
        );
    }

    #[test]
    fn evaluation_dispatches_to_the_matching_potential() {
        let exponential = PairPotential::Exponential { a: 2.0, alpha: 3.0 };
        assert_eq!(exponential.evaluate(0.0), (2.0, 6.0));
        let power = PairPotential::PowerLaw { p1: -1.0, p2: -6.0 };
        assert_eq!(power.evaluate(1.0), (-1.0, -6.0));
    }
}
