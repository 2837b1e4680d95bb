//! Reliability math primitives
//!
//! Stateless survival and composition formulas under the exponential
//! (constant failure rate) model. Every function validates its inputs and
//! returns a [`ReliabilityError`] instead of producing NaN.

use crate::core::error::{ReliabilityError, Result};

/// Survival probability `R(t) = exp(-lambda * t)`
pub fn survival(lambda: f64, t: f64) -> Result<f64> {
    check_rate(lambda)?;
    check_time(t)?;
    Ok((-lambda * t).exp())
}

/// Series composition: every constituent must survive
pub fn series(reliabilities: &[f64]) -> Result<f64> {
    check_reliabilities(reliabilities)?;
    Ok(reliabilities.iter().product())
}

/// Parallel composition: at least one constituent must survive
pub fn parallel(reliabilities: &[f64]) -> Result<f64> {
    check_reliabilities(reliabilities)?;
    let all_fail: f64 = reliabilities.iter().map(|r| 1.0 - r).product();
    Ok(1.0 - all_fail)
}

/// Probability that at least `k` of `n` independent units survive
///
/// Equal reliabilities use the closed-form binomial sum. Unequal ones use
/// the exact Poisson-binomial recurrence, which sums the same subset
/// probabilities as enumerating every subset of size >= k without the
/// exponential cost.
pub fn k_out_of_n(reliabilities: &[f64], k: usize) -> Result<f64> {
    check_reliabilities(reliabilities)?;
    let n = reliabilities.len();
    if k < 1 || k > n {
        return Err(ReliabilityError::invalid(
            "k",
            format!("must be within [1, {}], got {}", n, k),
        ));
    }

    let first = reliabilities[0];
    if reliabilities.iter().all(|&r| r == first) {
        return Ok(binomial_at_least(first, n, k));
    }

    // survivors[j] = P(exactly j of the units seen so far survive)
    let mut survivors = vec![0.0_f64; n + 1];
    survivors[0] = 1.0;
    for (seen, &r) in reliabilities.iter().enumerate() {
        for j in (0..=seen + 1).rev() {
            let up = if j > 0 { survivors[j - 1] * r } else { 0.0 };
            survivors[j] = survivors[j] * (1.0 - r) + up;
        }
    }

    Ok(survivors[k..].iter().sum::<f64>().clamp(0.0, 1.0))
}

fn binomial_at_least(r: f64, n: usize, k: usize) -> f64 {
    (k..=n)
        .map(|i| binomial_coefficient(n, i) * r.powi(i as i32) * (1.0 - r).powi((n - i) as i32))
        .sum::<f64>()
        .clamp(0.0, 1.0)
}

fn binomial_coefficient(n: usize, k: usize) -> f64 {
    let k = k.min(n - k);
    (0..k).fold(1.0, |acc, i| acc * (n - i) as f64 / (i + 1) as f64)
}

/// `quantity` identical units in parallel: `1 - (1 - R)^q`
pub fn redundant(reliability: f64, quantity: u32) -> Result<f64> {
    check_reliabilities(&[reliability])?;
    if quantity == 0 {
        return Err(ReliabilityError::invalid("quantity", "must be >= 1"));
    }
    Ok(1.0 - (1.0 - reliability).powf(f64::from(quantity)))
}

/// Mean time between failures `1 / lambda`
///
/// A zero rate yields [`ReliabilityError::DivisionByZero`]; callers are
/// expected to recover it as an undefined (infinite) MTBF.
pub fn mtbf(lambda: f64) -> Result<f64> {
    check_rate(lambda)?;
    if lambda == 0.0 {
        return Err(ReliabilityError::DivisionByZero);
    }
    Ok(1.0 / lambda)
}

/// Equivalent constant failure rate of a system with reliability `R` at `t`
pub fn failure_rate_from_reliability(reliability: f64, t: f64) -> Result<f64> {
    if !(reliability > 0.0 && reliability <= 1.0) {
        return Err(ReliabilityError::invalid(
            "reliability",
            format!("must be within (0, 1], got {}", reliability),
        ));
    }
    if !(t > 0.0 && t.is_finite()) {
        return Err(ReliabilityError::invalid(
            "t",
            format!("must be > 0, got {}", t),
        ));
    }
    Ok((-reliability.ln() / t).max(0.0))
}

/// MTBF of the exponential system equivalent to `R` at `t`
///
/// `None` means undefined (a system that never fails within the model).
pub fn system_mtbf(reliability: f64, t: f64) -> Result<Option<f64>> {
    let lambda = failure_rate_from_reliability(reliability, t)?;
    match mtbf(lambda) {
        Ok(value) => Ok(Some(value)),
        Err(ReliabilityError::DivisionByZero) => Ok(None),
        Err(e) => Err(e),
    }
}

fn check_rate(lambda: f64) -> Result<()> {
    if !(lambda >= 0.0 && lambda.is_finite()) {
        return Err(ReliabilityError::invalid(
            "lambda",
            format!("must be a finite value >= 0, got {}", lambda),
        ));
    }
    Ok(())
}

pub(crate) fn check_time(t: f64) -> Result<()> {
    if !(t >= 0.0 && t.is_finite()) {
        return Err(ReliabilityError::invalid(
            "t",
            format!("must be a finite value >= 0, got {}", t),
        ));
    }
    Ok(())
}

fn check_reliabilities(reliabilities: &[f64]) -> Result<()> {
    if reliabilities.is_empty() {
        return Err(ReliabilityError::EmptyBlock {
            block: "<inputs>".to_string(),
        });
    }
    if let Some(bad) = reliabilities.iter().find(|r| !(0.0..=1.0).contains(*r)) {
        return Err(ReliabilityError::invalid(
            "reliability",
            format!("must be within [0, 1], got {}", bad),
        ));
    }
    Ok(())
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn reliability_vec(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<f64>> {
        proptest::collection::vec(0.0_f64..=1.0, min_len..=max_len)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(300))]

        #[test]
        fn survival_of_zero_rate_is_one(t in 0.0_f64..1e7) {
            prop_assert_eq!(survival(0.0, t).unwrap(), 1.0);
        }

        #[test]
        fn series_is_commutative(rs in reliability_vec(1, 12)) {
            let forward = series(&rs).unwrap();
            let mut reversed = rs.clone();
            reversed.reverse();
            prop_assert!((forward - series(&reversed).unwrap()).abs() < 1e-12);
        }

        #[test]
        fn series_is_associative(rs in reliability_vec(2, 12), split in 1_usize..11) {
            let split = split.min(rs.len() - 1);
            let left = series(&rs[..split]).unwrap();
            let right = series(&rs[split..]).unwrap();
            prop_assert!((series(&[left, right]).unwrap() - series(&rs).unwrap()).abs() < 1e-12);
        }

        #[test]
        fn series_of_one_is_identity(r in 0.0_f64..=1.0) {
            prop_assert_eq!(series(&[r]).unwrap(), r);
        }

        #[test]
        fn parallel_with_perfect_unit_is_perfect(rs in reliability_vec(0, 10)) {
            let mut rs = rs;
            rs.push(1.0);
            prop_assert_eq!(parallel(&rs).unwrap(), 1.0);
        }

        #[test]
        fn one_out_of_n_is_parallel(rs in reliability_vec(1, 10)) {
            let k1 = k_out_of_n(&rs, 1).unwrap();
            prop_assert!((k1 - parallel(&rs).unwrap()).abs() < 1e-9);
        }

        #[test]
        fn n_out_of_n_is_series(rs in reliability_vec(1, 10)) {
            let kn = k_out_of_n(&rs, rs.len()).unwrap();
            prop_assert!((kn - series(&rs).unwrap()).abs() < 1e-9);
        }

        #[test]
        fn k_out_of_n_is_monotonic_in_k(rs in reliability_vec(2, 10)) {
            let mut previous = 1.0;
            for k in 1..=rs.len() {
                let value = k_out_of_n(&rs, k).unwrap();
                prop_assert!(value <= previous + 1e-12);
                previous = value;
            }
        }
    }
}
