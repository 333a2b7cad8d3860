//! Moment accumulation.
//!
//! [`CompensatedSum`] keeps shard-local sums accurate over tens of thousands
//! of payoffs; [`Moments`] is the `(count, sum, sum_sq)` triple that shards
//! report and the aggregator combines.

use rayon::join;

/// Below this many triples the pairwise tree is reduced sequentially.
const PARALLEL_THRESHOLD: usize = 64;

/// Neumaier compensated summation.
///
/// # Examples
///
/// ```rust
/// use pricer_sharding::stats::CompensatedSum;
///
/// let mut sum = CompensatedSum::default();
/// for x in [1.0, 1e100, 1.0, -1e100] {
///     sum.add(x);
/// }
/// assert_eq!(sum.value(), 2.0);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CompensatedSum {
    sum: f64,
    compensation: f64,
}

impl CompensatedSum {
    /// Adds one term.
    #[inline]
    pub fn add(&mut self, x: f64) {
        let t = self.sum + x;
        if self.sum.abs() >= x.abs() {
            self.compensation += (self.sum - t) + x;
        } else {
            self.compensation += (x - t) + self.sum;
        }
        self.sum = t;
    }

    /// Compensated total.
    #[inline]
    pub fn value(&self) -> f64 {
        self.sum + self.compensation
    }
}

/// First and second raw moments of a sample.
///
/// Combination is a plain component-wise sum, so it is associative and
/// commutative up to floating-point rounding. [`Moments::pairwise`] fixes
/// the shape of the reduction tree so that a given input order always
/// produces the same bits.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Moments {
    /// Number of samples.
    pub count: usize,
    /// Σx
    pub sum: f64,
    /// Σx²
    pub sum_sq: f64,
}

impl Moments {
    /// Adds one sample.
    #[inline]
    pub fn push(&mut self, x: f64) {
        self.count += 1;
        self.sum += x;
        self.sum_sq += x * x;
    }

    /// Combines two triples.
    #[inline]
    pub fn merge(self, other: Moments) -> Moments {
        Moments {
            count: self.count + other.count,
            sum: self.sum + other.sum,
            sum_sq: self.sum_sq + other.sum_sq,
        }
    }

    /// Reduces a slice of triples with a balanced pairwise tree.
    ///
    /// Halves above a size threshold are reduced in parallel via
    /// `rayon::join`; the tree shape depends only on the slice length.
    pub fn pairwise(parts: &[Moments]) -> Moments {
        match parts.len() {
            0 => Moments::default(),
            1 => parts[0],
            n => {
                let (left, right) = parts.split_at(n / 2);
                if n > PARALLEL_THRESHOLD {
                    let (l, r) = join(|| Moments::pairwise(left), || Moments::pairwise(right));
                    l.merge(r)
                } else {
                    Moments::pairwise(left).merge(Moments::pairwise(right))
                }
            }
        }
    }

    /// Sample mean; NaN for an empty sample.
    #[inline]
    pub fn mean(&self) -> f64 {
        self.sum / self.count as f64
    }

    /// Population variance `Σx²/n − mean²`, clamped at 0.
    #[inline]
    pub fn variance(&self) -> f64 {
        let mean = self.mean();
        (self.sum_sq / self.count as f64 - mean * mean).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_compensated_sum_beats_naive() {
        let mut compensated = CompensatedSum::default();
        let mut naive = 0.0;
        for _ in 0..10_000_000 {
            compensated.add(0.1);
            naive += 0.1;
        }
        assert!((compensated.value() - 1_000_000.0).abs() < 1e-6);
        assert!((naive - 1_000_000.0_f64).abs() > (compensated.value() - 1_000_000.0).abs());
    }

    #[test]
    fn test_push_and_moments() {
        let mut m = Moments::default();
        for x in [1.0, 2.0, 3.0, 4.0] {
            m.push(x);
        }
        assert_eq!(m.count, 4);
        assert_relative_eq!(m.mean(), 2.5);
        assert_relative_eq!(m.variance(), 1.25);
    }

    #[test]
    fn test_variance_clamped_non_negative() {
        // Σx²/n one ulp below mean²
        let m = Moments {
            count: 2,
            sum: 2.0,
            sum_sq: 1.999_999_999_999_999_8,
        };
        assert!(m.sum_sq / 2.0 - m.mean() * m.mean() < 0.0);
        assert_eq!(m.variance(), 0.0);
    }

    #[test]
    fn test_constant_sample_has_zero_variance() {
        let mut m = Moments::default();
        for _ in 0..1_000 {
            m.push(10.0);
        }
        assert_eq!(m.variance(), 0.0);
    }

    #[test]
    fn test_pairwise_empty_and_single() {
        assert_eq!(Moments::pairwise(&[]), Moments::default());
        let one = Moments {
            count: 2,
            sum: 3.0,
            sum_sq: 5.0,
        };
        assert_eq!(Moments::pairwise(&[one]), one);
    }

    #[test]
    fn test_pairwise_parallel_matches_sequential_shape() {
        let parts: Vec<Moments> = (0..1_000)
            .map(|i| Moments {
                count: 10,
                sum: (i as f64).sin() * 10.0,
                sum_sq: (i as f64).cos().powi(2) * 10.0,
            })
            .collect();
        let a = Moments::pairwise(&parts);
        let b = Moments::pairwise(&parts);
        assert_eq!(a, b);
        assert_eq!(a.count, 10_000);
    }

    proptest! {
        #[test]
        fn prop_merge_matches_direct_accumulation(
            xs in prop::collection::vec(-100.0f64..100.0, 1..200),
            split in 0usize..200,
        ) {
            let split = split.min(xs.len());
            let (left, right) = xs.split_at(split);

            let mut a = Moments::default();
            left.iter().for_each(|&x| a.push(x));
            let mut b = Moments::default();
            right.iter().for_each(|&x| b.push(x));
            let mut all = Moments::default();
            xs.iter().for_each(|&x| all.push(x));

            let merged = a.merge(b);
            prop_assert_eq!(merged.count, all.count);
            prop_assert!((merged.sum - all.sum).abs() <= 1e-9 * (1.0 + all.sum.abs()));
            prop_assert!((merged.sum_sq - all.sum_sq).abs() <= 1e-9 * (1.0 + all.sum_sq));
            prop_assert!(merged.variance() >= 0.0);
        }
    }
}
