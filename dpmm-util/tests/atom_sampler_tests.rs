use std::collections::BTreeMap;

use anyhow::Result;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use dpmm_util::atom::{AtomSampler, BaseMeasureAtomSampler, MultiSampleAtomSampler};
use dpmm_util::density::CachedDensity;
use dpmm_util::measure::BetaBaseMeasure;
use dpmm_util::partition::{Partition, PartitionCell};
use dpmm_util::traits::{DataId, LogDensity};
use stats_util::logspace::log_binomial_pdf;

/// Minimal read-count observation for exercising the samplers.
#[derive(Debug, Clone)]
struct Obs {
    id: usize,
    b: u64,
    d: u64,
}

impl DataId for Obs {
    fn data_id(&self) -> usize {
        self.id
    }
}

/// Plain Binomial(b | d, f) likelihood in the cluster parameter f.
struct BinomialKernel;

impl LogDensity for BinomialKernel {
    type Data = Obs;
    type Value = f64;
    type Hyper = ();

    fn compute(&self, data: &Obs, value: &f64) -> Result<f64> {
        Ok(log_binomial_pdf(data.b, data.d, *value))
    }

    fn hyper(&self) -> &() {
        &()
    }

    fn with_hyper(&self, _hyper: ()) -> Result<Self> {
        Ok(Self)
    }
}

fn binomial_sampler() -> Result<BaseMeasureAtomSampler<BetaBaseMeasure, CachedDensity<BinomialKernel>>>
{
    let g0 = BetaBaseMeasure::new(1.0, 1.0)?;
    let density = CachedDensity::new(BinomialKernel);
    Ok(BaseMeasureAtomSampler::from_base_measure(g0, density))
}

// ─────────────────────────────────────────────────────
// Conjugate posterior convergence
// ─────────────────────────────────────────────────────

/// With a Beta(1,1) prior and a single Binomial(b, d) observation the
/// posterior is Beta(1 + b, 1 + d - b); the MH chain's empirical
/// moments must match its analytic moments.
fn check_conjugate_posterior(b: u64, d: u64, seed: u64) -> Result<()> {
    let sampler = binomial_sampler()?;
    let data = vec![Obs { id: 0, b, d }];

    let mut partition = Partition::new();
    partition.add_cell(PartitionCell::with_items(0.5f64, vec![0]));

    let mut rng = SmallRng::seed_from_u64(seed);

    let warmup = 5_000;
    let sweeps = 40_000;
    let mut draws = Vec::with_capacity(sweeps - warmup);

    for i in 0..sweeps {
        sampler.sample(&data, &mut partition, &mut rng)?;
        if i >= warmup {
            draws.push(*partition.cells()[0].value());
        }
    }

    let a_post = 1.0 + b as f64;
    let b_post = 1.0 + (d - b) as f64;
    let mean_post = a_post / (a_post + b_post);
    let var_post =
        a_post * b_post / ((a_post + b_post).powi(2) * (a_post + b_post + 1.0));

    let n = draws.len() as f64;
    let mean = draws.iter().sum::<f64>() / n;
    let var = draws.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);

    assert!(
        (mean - mean_post).abs() < 0.02,
        "mean: {mean}, expected: {mean_post}"
    );
    assert!(
        (var - var_post).abs() < 0.005,
        "var: {var}, expected: {var_post}"
    );

    Ok(())
}

#[test]
fn mh_chain_matches_conjugate_posterior() -> Result<()> {
    check_conjugate_posterior(7, 10, 42)
}

#[test]
fn mh_chain_matches_skewed_conjugate_posterior() -> Result<()> {
    check_conjugate_posterior(2, 20, 99)
}

#[test]
fn empty_cell_samples_the_prior() -> Result<()> {
    // A cell with no assigned items accepts every prior draw.
    let sampler = binomial_sampler()?;
    let data: Vec<Obs> = vec![];

    let mut partition = Partition::new();
    partition.add_cell(PartitionCell::new(0.5f64));

    let mut rng = SmallRng::seed_from_u64(1);
    for _ in 0..100 {
        sampler.sample(&data, &mut partition, &mut rng)?;
        let value = *partition.cells()[0].value();
        assert!(value > 0.0 && value < 1.0);
    }

    Ok(())
}

#[test]
fn cell_item_out_of_range_is_an_error() -> Result<()> {
    let sampler = binomial_sampler()?;
    let data = vec![Obs { id: 0, b: 1, d: 2 }];

    let mut partition = Partition::new();
    partition.add_cell(PartitionCell::with_items(0.5f64, vec![3]));

    let mut rng = SmallRng::seed_from_u64(1);
    assert!(sampler.sample(&data, &mut partition, &mut rng).is_err());

    Ok(())
}

// ─────────────────────────────────────────────────────
// Multi-sample composition
// ─────────────────────────────────────────────────────

fn multi_point(a: Obs, b: Obs) -> BTreeMap<String, Obs> {
    let mut point = BTreeMap::new();
    point.insert("a".to_string(), a);
    point.insert("b".to_string(), b);
    point
}

fn multi_sampler() -> Result<
    MultiSampleAtomSampler<BaseMeasureAtomSampler<BetaBaseMeasure, CachedDensity<BinomialKernel>>>,
> {
    let mut samplers = BTreeMap::new();
    samplers.insert("a".to_string(), binomial_sampler()?);
    samplers.insert("b".to_string(), binomial_sampler()?);
    MultiSampleAtomSampler::new(samplers)
}

/// Per-sample MH decisions are independent: changing only sample b's
/// read counts must not move sample a's chain under a fixed seed.
#[test]
fn per_sample_updates_are_independent() -> Result<()> {
    let run = |b_counts: (u64, u64)| -> Result<Vec<f64>> {
        let sampler = multi_sampler()?;
        let data = vec![multi_point(
            Obs { id: 0, b: 5, d: 10 },
            Obs {
                id: 0,
                b: b_counts.0,
                d: b_counts.1,
            },
        )];
        let data_refs: Vec<_> = data.iter().collect();

        let mut value = BTreeMap::new();
        value.insert("a".to_string(), 0.5f64);
        value.insert("b".to_string(), 0.5f64);

        let mut rng = SmallRng::seed_from_u64(2026);
        let mut a_trace = Vec::new();

        for _ in 0..200 {
            value = sampler.sample_atom(&data_refs, &value, &[0], &mut rng)?;
            a_trace.push(value["a"]);
        }

        Ok(a_trace)
    };

    let with_trivial_b = run((0, 0))?;
    let with_heavy_b = run((11, 12))?;

    assert_eq!(with_trivial_b, with_heavy_b);

    Ok(())
}

#[test]
fn multi_sample_atom_has_every_sample_id() -> Result<()> {
    let sampler = multi_sampler()?;
    let data = vec![multi_point(
        Obs { id: 0, b: 5, d: 10 },
        Obs { id: 0, b: 2, d: 9 },
    )];
    let data_refs: Vec<_> = data.iter().collect();

    let mut value = BTreeMap::new();
    value.insert("a".to_string(), 0.5f64);
    value.insert("b".to_string(), 0.5f64);

    let mut rng = SmallRng::seed_from_u64(5);
    let atom = sampler.sample_atom(&data_refs, &value, &[0], &mut rng)?;

    assert_eq!(atom.len(), 2);
    assert!(atom.contains_key("a") && atom.contains_key("b"));
    assert!(atom.values().all(|&f| f > 0.0 && f < 1.0));

    Ok(())
}

#[test]
fn missing_sample_value_is_an_error() -> Result<()> {
    let sampler = multi_sampler()?;
    let data = vec![multi_point(
        Obs { id: 0, b: 5, d: 10 },
        Obs { id: 0, b: 2, d: 9 },
    )];
    let data_refs: Vec<_> = data.iter().collect();

    let mut value = BTreeMap::new();
    value.insert("a".to_string(), 0.5f64);

    let mut rng = SmallRng::seed_from_u64(5);
    assert!(sampler.sample_atom(&data_refs, &value, &[0], &mut rng).is_err());

    Ok(())
}
