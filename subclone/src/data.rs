use std::collections::BTreeMap;

use anyhow::{bail, Result};

use crate::genotype::GenotypeState;
use dpmm_util::traits::{DataId, SampleId};
use stats_util::logspace::log_sum_exp;

/// Observed read counts for one mutation in one sample, together with
/// its candidate genotype states. Immutable once built; `data_id` is
/// the mutation's load-time index and keys the density memo cache.
#[derive(Debug, Clone)]
pub struct SampleDataPoint {
    data_id: usize,
    b: u64,
    d: u64,
    states: Vec<GenotypeState>,
}

impl SampleDataPoint {
    /// Build a data point, renormalizing the state prior weights so
    /// they sum to one in log-space.
    pub fn new(data_id: usize, b: u64, d: u64, states: Vec<GenotypeState>) -> Result<Self> {
        if b > d {
            bail!("variant reads {b} exceed depth {d}");
        }

        if states.is_empty() {
            bail!("data point needs at least one genotype state");
        }

        let log_pis: Vec<f64> = states.iter().map(|s| s.log_pi).collect();
        let log_norm = log_sum_exp(&log_pis);

        if !log_norm.is_finite() {
            bail!("genotype state prior weights sum to zero");
        }

        let states = states
            .into_iter()
            .map(|mut s| {
                s.log_pi -= log_norm;
                s
            })
            .collect();

        Ok(Self {
            data_id,
            b,
            d,
            states,
        })
    }

    /// Variant read count.
    pub fn b(&self) -> u64 {
        self.b
    }

    /// Total read depth.
    pub fn d(&self) -> u64 {
        self.d
    }

    pub fn states(&self) -> &[GenotypeState] {
        &self.states
    }
}

impl DataId for SampleDataPoint {
    fn data_id(&self) -> usize {
        self.data_id
    }
}

/// One mutation observed across samples.
pub type MultiSampleDataPoint = BTreeMap<SampleId, SampleDataPoint>;
