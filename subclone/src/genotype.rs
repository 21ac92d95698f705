use anyhow::{bail, Result};

/// One candidate latent genotype state at a locus: copy numbers and
/// expected variant-allele probabilities for the normal, reference and
/// variant populations, plus the log prior weight of the state.
#[derive(Debug, Clone, PartialEq)]
pub struct GenotypeState {
    pub cn_n: f64,
    pub cn_r: f64,
    pub cn_v: f64,
    pub mu_n: f64,
    pub mu_r: f64,
    pub mu_v: f64,
    pub log_pi: f64,
}

/// Prior over which genotype states a mutation may occupy.
///
/// AB and BB assume diploid loci; the copy-number-aware priors build
/// states from the predicted total (`C = major + minor`) or parental
/// copy numbers at the locus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenotypePrior {
    /// Diploid heterozygous variant genotype (AB).
    Ab,
    /// Diploid homozygous variant genotype (BB).
    Bb,
    /// Variant genotype has total copy number C with exactly one
    /// variant allele.
    NoZygosity,
    /// Variant genotype has total copy number C and any number of
    /// variant alleles in 1..=C; the reference population is AA or
    /// (C, 0) with equal probability.
    TotalCopyNumber,
    /// Variant alleles number 1, major or minor; one variant allele
    /// means the mutation postdates the copy-number event.
    ParentalCopyNumber,
}

impl std::str::FromStr for GenotypePrior {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "AB" => Ok(Self::Ab),
            "BB" => Ok(Self::Bb),
            "NoZygosity" => Ok(Self::NoZygosity),
            "TCN" => Ok(Self::TotalCopyNumber),
            "PCN" => Ok(Self::ParentalCopyNumber),
            _ => bail!(
                "{s} is not an implemented prior; available priors are \
                 AB, BB, NoZygosity, TCN and PCN"
            ),
        }
    }
}

/// Probability of sampling a variant allele from a cell carrying `b`
/// variant alleles out of `c` copies, with sequencing error rate `eps`.
fn allele_sampling_probability(b: u64, c: u64, eps: f64) -> f64 {
    if b == 0 {
        eps
    } else if b == c {
        1.0 - eps
    } else {
        b as f64 / c as f64
    }
}

/// Candidate state before weight normalization. The normal population
/// is always diploid AA.
struct RawState {
    cn_r: f64,
    mu_r: f64,
    cn_v: f64,
    mu_v: f64,
    weight: f64,
}

/// Enumerate the candidate genotype states for one mutation under the
/// given prior and predicted copy numbers. Identical states are merged
/// (weights summed) and the weights normalized to one.
pub fn genotype_states(
    prior: GenotypePrior,
    major_cn: u64,
    minor_cn: u64,
    error_rate: f64,
) -> Result<Vec<GenotypeState>> {
    let total_cn = major_cn + minor_cn;

    if total_cn == 0 {
        bail!("total copy number is zero ({major_cn} + {minor_cn})");
    }

    if error_rate <= 0.0 || error_rate >= 1.0 {
        bail!("error rate {error_rate} outside (0, 1)");
    }

    let eps = error_rate;
    let diploid_ref = (2.0, eps);

    let mut raw: Vec<RawState> = Vec::new();

    match prior {
        GenotypePrior::Ab => {
            raw.push(RawState {
                cn_r: 2.0,
                mu_r: eps,
                cn_v: 2.0,
                mu_v: allele_sampling_probability(1, 2, eps),
                weight: 1.0,
            });
        }

        GenotypePrior::Bb => {
            raw.push(RawState {
                cn_r: 2.0,
                mu_r: eps,
                cn_v: 2.0,
                mu_v: allele_sampling_probability(2, 2, eps),
                weight: 1.0,
            });
        }

        GenotypePrior::NoZygosity => {
            raw.push(RawState {
                cn_r: 2.0,
                mu_r: eps,
                cn_v: total_cn as f64,
                mu_v: allele_sampling_probability(1, total_cn, eps),
                weight: 1.0,
            });
        }

        GenotypePrior::TotalCopyNumber => {
            // Reference population is AA, or has the predicted copy
            // number with no variant alleles, with equal probability.
            let ref_options = [diploid_ref, (total_cn as f64, eps)];

            for (cn_r, mu_r) in ref_options {
                for b_v in 1..=total_cn {
                    raw.push(RawState {
                        cn_r,
                        mu_r,
                        cn_v: total_cn as f64,
                        mu_v: allele_sampling_probability(b_v, total_cn, eps),
                        weight: 0.5 / total_cn as f64,
                    });
                }
            }
        }

        GenotypePrior::ParentalCopyNumber => {
            let candidates: std::collections::BTreeSet<u64> = [1, major_cn, minor_cn]
                .into_iter()
                .filter(|&b_v| b_v > 0)
                .collect();

            let weight = 1.0 / candidates.len() as f64;

            for b_v in candidates {
                // One variant allele: the mutation postdates the
                // copy-number event, so the reference population
                // already carries the predicted copy number.
                let (cn_r, mu_r) = if b_v == 1 {
                    (total_cn as f64, eps)
                } else {
                    diploid_ref
                };

                raw.push(RawState {
                    cn_r,
                    mu_r,
                    cn_v: total_cn as f64,
                    mu_v: allele_sampling_probability(b_v, total_cn, eps),
                    weight,
                });
            }
        }
    }

    Ok(merge_and_normalize(raw, eps))
}

fn merge_and_normalize(raw: Vec<RawState>, eps: f64) -> Vec<GenotypeState> {
    let mut merged: Vec<RawState> = Vec::with_capacity(raw.len());

    for state in raw {
        match merged.iter_mut().find(|s| {
            s.cn_r == state.cn_r
                && s.mu_r == state.mu_r
                && s.cn_v == state.cn_v
                && s.mu_v == state.mu_v
        }) {
            Some(existing) => existing.weight += state.weight,
            None => merged.push(state),
        }
    }

    let total_weight: f64 = merged.iter().map(|s| s.weight).sum();

    merged
        .into_iter()
        .map(|s| GenotypeState {
            cn_n: 2.0,
            cn_r: s.cn_r,
            cn_v: s.cn_v,
            mu_n: eps,
            mu_r: s.mu_r,
            mu_v: s.mu_v,
            log_pi: (s.weight / total_weight).ln(),
        })
        .collect()
}
