use std::cell::RefCell;
use std::collections::BTreeMap;

use anyhow::{anyhow, bail, Result};

use crate::cache::FifoCache;
use crate::traits::{ClusterDensity, DataId, LogDensity, ParamKey, SampleId};

/// Memoizing wrapper around a pure likelihood kernel.
///
/// Hyperparameters are fixed per instance (a new instance means a fresh
/// cache), so the memo key is just (data identity, parameter bits).
/// The cache uses interior mutability and is not safe to share across
/// threads.
pub struct CachedDensity<M: LogDensity> {
    model: M,
    cache: RefCell<FifoCache<(usize, u64), f64>>,
}

impl<M: LogDensity> CachedDensity<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            cache: RefCell::new(FifoCache::new()),
        }
    }

    pub fn with_cache_size(model: M, capacity: usize) -> Self {
        Self {
            model,
            cache: RefCell::new(FifoCache::with_capacity(capacity)),
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn cache_len(&self) -> usize {
        self.cache.borrow().len()
    }
}

impl<M> ClusterDensity for CachedDensity<M>
where
    M: LogDensity,
    M::Data: DataId,
    M::Value: ParamKey,
{
    type Data = M::Data;
    type Value = M::Value;
    type Hyper = M::Hyper;

    fn log_p(&self, data: &Self::Data, value: &Self::Value) -> Result<f64> {
        let key = (data.data_id(), value.param_key());

        if let Some(&log_p) = self.cache.borrow().get(&key) {
            return Ok(log_p);
        }

        let log_p = self.model.compute(data, value)?;
        self.cache.borrow_mut().insert(key, log_p);

        Ok(log_p)
    }

    fn params(&self) -> M::Hyper {
        self.model.hyper().clone()
    }

    fn with_params(&self, params: M::Hyper) -> Result<Self> {
        let capacity = self.cache.borrow().capacity();
        Ok(Self::with_cache_size(self.model.with_hyper(params)?, capacity))
    }
}

/// Hyperparameters of a multi-sample density: one shared value, or one
/// value per sample.
#[derive(Debug, Clone, PartialEq)]
pub enum MultiSampleParams<H> {
    Shared(H),
    PerSample(BTreeMap<SampleId, H>),
}

/// One density per sample, with samples conditionally independent given
/// their cluster parameters.
///
/// In shared-parameter mode every constituent density must hold an
/// identical hyperparameter value; `new` and `with_params` are the only
/// construction paths and both enforce it.
pub struct MultiSampleDensity<D> {
    densities: BTreeMap<SampleId, D>,
    shared_params: bool,
}

impl<D: ClusterDensity> MultiSampleDensity<D>
where
    D::Hyper: PartialEq,
{
    pub fn new(densities: BTreeMap<SampleId, D>, shared_params: bool) -> Result<Self> {
        if densities.is_empty() {
            bail!("multi-sample density needs at least one sample");
        }

        let result = Self {
            densities,
            shared_params,
        };

        if shared_params && !result.constituents_agree() {
            bail!("shared-parameter mode requires identical hyperparameters in every sample");
        }

        Ok(result)
    }

    pub fn shared_params(&self) -> bool {
        self.shared_params
    }

    pub fn sample_ids(&self) -> impl Iterator<Item = &SampleId> {
        self.densities.keys()
    }

    pub fn density(&self, sample_id: &str) -> Option<&D> {
        self.densities.get(sample_id)
    }

    fn constituents_agree(&self) -> bool {
        let mut hypers = self.densities.values().map(|d| d.params());
        match hypers.next() {
            Some(first) => hypers.all(|h| h == first),
            None => true,
        }
    }
}

impl<D: ClusterDensity> ClusterDensity for MultiSampleDensity<D>
where
    D::Hyper: PartialEq,
{
    type Data = BTreeMap<SampleId, D::Data>;
    type Value = BTreeMap<SampleId, D::Value>;
    type Hyper = MultiSampleParams<D::Hyper>;

    fn log_p(&self, data: &Self::Data, value: &Self::Value) -> Result<f64> {
        let mut log_p = 0.0;

        for (sample_id, density) in &self.densities {
            let x = data
                .get(sample_id)
                .ok_or_else(|| anyhow!("no data for sample {sample_id}"))?;
            let v = value
                .get(sample_id)
                .ok_or_else(|| anyhow!("no value for sample {sample_id}"))?;

            log_p += density.log_p(x, v)?;
        }

        Ok(log_p)
    }

    fn params(&self) -> Self::Hyper {
        if self.shared_params {
            debug_assert!(self.constituents_agree());

            // All constituents agree by construction; report any one.
            let first = self
                .densities
                .values()
                .next()
                .map(|d| d.params())
                .unwrap_or_else(|| unreachable!("constructor rejects empty sample sets"));

            MultiSampleParams::Shared(first)
        } else {
            MultiSampleParams::PerSample(
                self.densities
                    .iter()
                    .map(|(sample_id, d)| (sample_id.clone(), d.params()))
                    .collect(),
            )
        }
    }

    fn with_params(&self, params: Self::Hyper) -> Result<Self> {
        let densities = match (self.shared_params, params) {
            (true, MultiSampleParams::Shared(h)) => self
                .densities
                .iter()
                .map(|(sample_id, d)| Ok((sample_id.clone(), d.with_params(h.clone())?)))
                .collect::<Result<BTreeMap<_, _>>>()?,

            (false, MultiSampleParams::PerSample(per_sample)) => {
                if per_sample.len() != self.densities.len() {
                    bail!(
                        "{} parameter values for {} samples",
                        per_sample.len(),
                        self.densities.len()
                    );
                }

                self.densities
                    .iter()
                    .map(|(sample_id, d)| {
                        let h = per_sample
                            .get(sample_id)
                            .ok_or_else(|| anyhow!("no parameters for sample {sample_id}"))?;
                        Ok((sample_id.clone(), d.with_params(h.clone())?))
                    })
                    .collect::<Result<BTreeMap<_, _>>>()?
            }

            (true, MultiSampleParams::PerSample(_)) => {
                bail!("shared-parameter density takes a single shared value")
            }

            (false, MultiSampleParams::Shared(_)) => {
                bail!("independent-parameter density takes per-sample values")
            }
        };

        Self::new(densities, self.shared_params)
    }
}
