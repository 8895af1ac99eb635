//! Streaming statistical accumulators
//!
//! Plain value types holding only sufficient statistics: `push` consumes
//! one sample, `+=` combines two accumulators built over disjoint sample
//! sets into the exact statistics of the union, independent of split
//! point and sample order. All arithmetic is double precision regardless
//! of the source sample type.

use std::ops::AddAssign;

/// Running minimum and maximum
///
/// The empty state carries +inf/-inf so merging with a worker that saw no
/// samples is a no-op.
#[derive(Debug, Clone, Copy)]
pub struct MinMaxAccumulator {
    min: f64,
    max: f64,
}

impl Default for MinMaxAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl MinMaxAccumulator {
    /// Empty accumulator
    #[must_use]
    pub fn new() -> Self {
        Self {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    /// Add one sample
    pub fn push(&mut self, value: f64) {
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
    }

    /// Add two samples, ordering the pair first so only one of min/max is
    /// tested against each; merged results are identical to pushing the
    /// samples one at a time
    pub fn push_pair(&mut self, first: f64, second: f64) {
        let (lo, hi) = if first <= second {
            (first, second)
        } else {
            (second, first)
        };
        if lo < self.min {
            self.min = lo;
        }
        if hi > self.max {
            self.max = hi;
        }
    }

    /// Smallest sample seen, +inf when empty
    #[must_use]
    pub fn minimum(&self) -> f64 {
        self.min
    }

    /// Largest sample seen, -inf when empty
    #[must_use]
    pub fn maximum(&self) -> f64 {
        self.max
    }
}

impl AddAssign for MinMaxAccumulator {
    fn add_assign(&mut self, other: Self) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }
}

/// Single-pass mean and central moments up to 4th order
///
/// Uses the extended Welford update (Pébay's formulas) per sample and the
/// pairwise parallel-moments recombination when two accumulators merge,
/// so a merged result equals a single pass over the union of samples.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatisticsAccumulator {
    n: u64,
    mean: f64,
    m2: f64,
    m3: f64,
    m4: f64,
}

impl StatisticsAccumulator {
    /// Empty accumulator
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one sample
    pub fn push(&mut self, value: f64) {
        let n1 = self.n as f64;
        self.n += 1;
        let n = self.n as f64;
        let delta = value - self.mean;
        let delta_n = delta / n;
        let delta_n2 = delta_n * delta_n;
        let term = delta * delta_n * n1;
        self.m4 += term * delta_n2 * (n * n - 3.0 * n + 3.0) + 6.0 * delta_n2 * self.m2
            - 4.0 * delta_n * self.m3;
        self.m3 += term * delta_n * (n - 2.0) - 3.0 * delta_n * self.m2;
        self.m2 += term;
        self.mean += delta_n;
    }

    /// Number of samples seen
    #[must_use]
    pub fn number(&self) -> u64 {
        self.n
    }

    /// Sample mean, 0 when empty
    #[must_use]
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Unbiased sample variance, 0 with fewer than two samples
    #[must_use]
    pub fn variance(&self) -> f64 {
        if self.n > 1 {
            self.m2 / (self.n as f64 - 1.0)
        } else {
            0.0
        }
    }

    /// Square root of the unbiased variance
    #[must_use]
    pub fn standard_deviation(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Population skewness g1, 0 when undefined
    #[must_use]
    pub fn skewness(&self) -> f64 {
        if self.n > 1 && self.m2 > 0.0 {
            (self.n as f64).sqrt() * self.m3 / self.m2.powf(1.5)
        } else {
            0.0
        }
    }

    /// Population excess kurtosis g2, 0 when undefined
    #[must_use]
    pub fn excess_kurtosis(&self) -> f64 {
        if self.n > 1 && self.m2 > 0.0 {
            self.n as f64 * self.m4 / (self.m2 * self.m2) - 3.0
        } else {
            0.0
        }
    }
}

impl AddAssign for StatisticsAccumulator {
    fn add_assign(&mut self, other: Self) {
        if other.n == 0 {
            return;
        }
        if self.n == 0 {
            *self = other;
            return;
        }
        let na = self.n as f64;
        let nb = other.n as f64;
        let n = na + nb;
        let delta = other.mean - self.mean;
        let delta_n = delta / n;
        // Chan et al. pairwise recombination, highest moment first so each
        // update reads the lower moments before they change.
        self.m4 += other.m4
            + delta * delta_n * delta_n * delta_n * na * nb * (na * na - na * nb + nb * nb)
            + 6.0 * delta_n * delta_n * (na * na * other.m2 + nb * nb * self.m2)
            + 4.0 * delta_n * (na * other.m3 - nb * self.m3);
        self.m3 += other.m3 + delta * delta_n * delta_n * na * nb * (na - nb)
            + 3.0 * delta_n * (na * other.m2 - nb * self.m2);
        self.m2 += other.m2 + delta * delta_n * na * nb;
        self.mean += delta_n * nb;
        self.n += other.n;
    }
}

/// Single-pass covariance of a paired sample stream
///
/// Tracks both means, both second central-moment sums, and the running
/// cross-deviation sum; merge uses the bivariate analogue of the pairwise
/// combination formula.
#[derive(Debug, Clone, Copy, Default)]
pub struct CovarianceAccumulator {
    n: u64,
    mean_x: f64,
    mean_y: f64,
    m2_x: f64,
    m2_y: f64,
    c: f64,
}

impl CovarianceAccumulator {
    /// Empty accumulator
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one sample pair
    pub fn push(&mut self, x: f64, y: f64) {
        self.n += 1;
        let n = self.n as f64;
        let delta_x = x - self.mean_x;
        self.mean_x += delta_x / n;
        self.m2_x += delta_x * (x - self.mean_x);
        let delta_y = y - self.mean_y;
        self.mean_y += delta_y / n;
        self.m2_y += delta_y * (y - self.mean_y);
        self.c += delta_x * (y - self.mean_y);
    }

    /// Number of sample pairs seen
    #[must_use]
    pub fn number(&self) -> u64 {
        self.n
    }

    /// Mean of the first variable
    #[must_use]
    pub fn mean_x(&self) -> f64 {
        self.mean_x
    }

    /// Mean of the second variable
    #[must_use]
    pub fn mean_y(&self) -> f64 {
        self.mean_y
    }

    /// Unbiased variance of the first variable
    #[must_use]
    pub fn variance_x(&self) -> f64 {
        if self.n > 1 {
            self.m2_x / (self.n as f64 - 1.0)
        } else {
            0.0
        }
    }

    /// Unbiased variance of the second variable
    #[must_use]
    pub fn variance_y(&self) -> f64 {
        if self.n > 1 {
            self.m2_y / (self.n as f64 - 1.0)
        } else {
            0.0
        }
    }

    /// Unbiased sample covariance, 0 with fewer than two pairs
    #[must_use]
    pub fn covariance(&self) -> f64 {
        if self.n > 1 {
            self.c / (self.n as f64 - 1.0)
        } else {
            0.0
        }
    }

    /// Pearson correlation coefficient, 0 when undefined
    #[must_use]
    pub fn correlation(&self) -> f64 {
        let denominator = (self.m2_x * self.m2_y).sqrt();
        if denominator > 0.0 {
            self.c / denominator
        } else {
            0.0
        }
    }

    /// Slope of the least-squares regression of y onto x
    #[must_use]
    pub fn slope(&self) -> f64 {
        if self.m2_x > 0.0 {
            self.c / self.m2_x
        } else {
            0.0
        }
    }
}

impl AddAssign for CovarianceAccumulator {
    fn add_assign(&mut self, other: Self) {
        if other.n == 0 {
            return;
        }
        if self.n == 0 {
            *self = other;
            return;
        }
        let na = self.n as f64;
        let nb = other.n as f64;
        let n = na + nb;
        let delta_x = other.mean_x - self.mean_x;
        let delta_y = other.mean_y - self.mean_y;
        let ratio = na * nb / n;
        self.c += other.c + delta_x * delta_y * ratio;
        self.m2_x += other.m2_x + delta_x * delta_x * ratio;
        self.m2_y += other.m2_y + delta_y * delta_y * ratio;
        self.mean_x += delta_x * nb / n;
        self.mean_y += delta_y * nb / n;
        self.n += other.n;
    }
}

/// Raw spatial moments up to 2nd order of an N-dimensional mass
/// distribution
///
/// Holds the mass sum m0, the first-order sums m1 (one per axis), and the
/// upper triangle of the symmetric second-order matrix, nD*(nD+1)/2
/// entries in row-major upper-triangle order.
#[derive(Debug, Clone)]
pub struct MomentAccumulator {
    m0: f64,
    m1: Vec<f64>,
    m2: Vec<f64>,
}

impl MomentAccumulator {
    /// Empty accumulator for an `nd`-dimensional distribution
    #[must_use]
    pub fn new(nd: usize) -> Self {
        Self {
            m0: 0.0,
            m1: vec![0.0; nd],
            m2: vec![0.0; nd * (nd + 1) / 2],
        }
    }

    /// Dimensionality of the distribution
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.m1.len()
    }

    /// Add `value` mass at `position`
    ///
    /// `position` must have the accumulator's dimensionality.
    pub fn push(&mut self, position: &[f64], value: f64) {
        debug_assert_eq!(position.len(), self.m1.len());
        self.m0 += value;
        let mut k = 0;
        for (i, &pi) in position.iter().enumerate() {
            self.m1[i] += pi * value;
            for &pj in &position[i..] {
                self.m2[k] += pi * pj * value;
                k += 1;
            }
        }
    }

    /// Total mass
    #[must_use]
    pub fn sum(&self) -> f64 {
        self.m0
    }

    /// First-order moments normalized by the mass sum; the zero vector
    /// when the mass is exactly zero
    #[must_use]
    pub fn first_order(&self) -> Vec<f64> {
        if self.m0 == 0.0 {
            vec![0.0; self.m1.len()]
        } else {
            self.m1.iter().map(|&m| m / self.m0).collect()
        }
    }

    /// Upper triangle of the second-order moments normalized by the mass
    /// sum; zeros when the mass is exactly zero
    #[must_use]
    pub fn second_order(&self) -> Vec<f64> {
        if self.m0 == 0.0 {
            vec![0.0; self.m2.len()]
        } else {
            self.m2.iter().map(|&m| m / self.m0).collect()
        }
    }

    /// Raw (unnormalized) second-order sums, upper triangle
    #[must_use]
    pub fn plain_second_order(&self) -> &[f64] {
        &self.m2
    }
}

impl AddAssign for MomentAccumulator {
    fn add_assign(&mut self, other: Self) {
        debug_assert_eq!(self.m1.len(), other.m1.len());
        self.m0 += other.m0;
        for (a, b) in self.m1.iter_mut().zip(&other.m1) {
            *a += b;
        }
        for (a, b) in self.m2.iter_mut().zip(&other.m2) {
            *a += b;
        }
    }
}
