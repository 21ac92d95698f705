use std::collections::BTreeMap;

use anyhow::{anyhow, bail, Result};
use rand::Rng;
use rand_distr::{Beta, Distribution};

use crate::traits::{BaseMeasure, SampleId};
use stats_util::logspace::log_beta_pdf;

/// Beta(a, b) prior over a cluster's cellular frequency in (0, 1).
#[derive(Debug, Clone)]
pub struct BetaBaseMeasure {
    a: f64,
    b: f64,
    dist: Beta<f64>,
}

impl BetaBaseMeasure {
    pub fn new(a: f64, b: f64) -> Result<Self> {
        let dist =
            Beta::new(a, b).map_err(|e| anyhow!("invalid Beta base measure ({a}, {b}): {e}"))?;

        Ok(Self { a, b, dist })
    }

    pub fn shape(&self) -> (f64, f64) {
        (self.a, self.b)
    }
}

impl BaseMeasure for BetaBaseMeasure {
    type Value = f64;

    fn log_p(&self, value: &f64) -> Result<f64> {
        Ok(log_beta_pdf(*value, self.a, self.b))
    }

    fn random<R: Rng>(&self, rng: &mut R) -> f64 {
        self.dist.sample(rng)
    }
}

/// One base measure per sample, with the per-sample draws assumed
/// independent. Sample order is the sorted map order, so iteration is
/// deterministic.
pub struct MultiSampleBaseMeasure<M> {
    base_measures: BTreeMap<SampleId, M>,
}

impl<M> MultiSampleBaseMeasure<M> {
    pub fn new(base_measures: BTreeMap<SampleId, M>) -> Result<Self> {
        if base_measures.is_empty() {
            bail!("multi-sample base measure needs at least one sample");
        }

        Ok(Self { base_measures })
    }

    pub fn sample_ids(&self) -> impl Iterator<Item = &SampleId> {
        self.base_measures.keys()
    }
}

impl<M: BaseMeasure> BaseMeasure for MultiSampleBaseMeasure<M> {
    type Value = BTreeMap<SampleId, M::Value>;

    fn log_p(&self, value: &Self::Value) -> Result<f64> {
        let mut log_p = 0.0;

        for (sample_id, base_measure) in &self.base_measures {
            let v = value
                .get(sample_id)
                .ok_or_else(|| anyhow!("no value for sample {sample_id}"))?;

            log_p += base_measure.log_p(v)?;
        }

        Ok(log_p)
    }

    fn random<R: Rng>(&self, rng: &mut R) -> Self::Value {
        self.base_measures
            .iter()
            .map(|(sample_id, base_measure)| (sample_id.clone(), base_measure.random(rng)))
            .collect()
    }
}
