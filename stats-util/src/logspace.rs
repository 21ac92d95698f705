//! Log-space probability primitives.
//!
//! Everything here works on natural-log densities so that products of
//! many small probabilities stay finite. Invalid-domain inputs map to
//! `-inf` ("impossible under this model") rather than errors.

use special::Gamma;

/// `log(sum(exp(x) for x in xs))` computed with a max-shift.
///
/// Stable for inputs of extreme magnitude (|x| up to ~1e6). An empty
/// slice is the union of no events and returns `-inf`. If the maximum
/// is non-finite it is returned directly; in particular an all `-inf`
/// input yields `-inf` instead of the `NaN` a naive shift would give.
pub fn log_sum_exp(xs: &[f64]) -> f64 {
    let max_exp = xs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    if max_exp.is_infinite() {
        return max_exp;
    }

    let total: f64 = xs.iter().map(|&x| (x - max_exp).exp()).sum();

    total.ln() + max_exp
}

/// Log of the Beta function `B(a, b)` via `ln_gamma`.
///
/// Non-positive shapes are outside the domain and give `-inf`.
pub fn ln_beta(a: f64, b: f64) -> f64 {
    if a <= 0.0 || b <= 0.0 {
        return f64::NEG_INFINITY;
    }

    a.ln_gamma().0 + b.ln_gamma().0 - (a + b).ln_gamma().0
}

/// Log-density of `Beta(a, b)` at `x`.
///
/// The density is zero (log `-inf`) on the boundary `x = 0` or `x = 1`
/// and for non-positive shape parameters.
pub fn log_beta_pdf(x: f64, a: f64, b: f64) -> f64 {
    if x <= 0.0 || x >= 1.0 || a <= 0.0 || b <= 0.0 {
        return f64::NEG_INFINITY;
    }

    (a - 1.0) * x.ln() + (b - 1.0) * (1.0 - x).ln() - ln_beta(a, b)
}

/// `log(n choose x)` via `ln_gamma`, stable for large `n`.
///
/// There is no way to choose more than `n` items, so `x > n` gives
/// `-inf` rather than evaluating `ln_gamma` outside its domain.
pub fn log_binomial_coefficient(n: u64, x: u64) -> f64 {
    if x > n {
        return f64::NEG_INFINITY;
    }

    let n = n as f64;
    let x = x as f64;

    (n + 1.0).ln_gamma().0 - (x + 1.0).ln_gamma().0 - (n - x + 1.0).ln_gamma().0
}

/// Log-probability of `x` successes in `n` Bernoulli(`p`) trials.
///
/// Boundary policy at the simplex edge: `p = 0` puts all mass on
/// `x = 0` and `p = 1` on `x = n`, so those outcomes get log-probability
/// zero and everything else `-inf` (no `log(0)` singularities).
pub fn log_binomial_pdf(x: u64, n: u64, p: f64) -> f64 {
    if x > n {
        return f64::NEG_INFINITY;
    }

    if p <= 0.0 {
        return if x == 0 { 0.0 } else { f64::NEG_INFINITY };
    }

    if p >= 1.0 {
        return if x == n { 0.0 } else { f64::NEG_INFINITY };
    }

    log_binomial_coefficient(n, x) + (x as f64) * p.ln() + ((n - x) as f64) * (1.0 - p).ln()
}
