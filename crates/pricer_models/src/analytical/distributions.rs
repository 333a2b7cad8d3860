//! Standard normal distribution functions.
//!
//! - `norm_cdf`: cumulative distribution function, double-precision accurate
//! - `norm_pdf`: probability density function
//!
//! Both are generic over `T: Float`.

use num_traits::Float;

use super::lit;

/// 1 / sqrt(2 * pi)
const FRAC_1_SQRT_2PI: f64 = 0.398_942_280_401_432_7;

/// sqrt(2 * pi)
const SQRT_2PI: f64 = 2.506_628_274_631;

/// Beyond this |x| the tail mass is below the smallest positive f64.
const TAIL_CUTOFF: f64 = 37.0;

/// Switch point between the rational and continued-fraction regimes (5·√2).
const RATIONAL_LIMIT: f64 = 7.071_067_811_865_47;

/// Hart (1968) rational approximation coefficients, numerator (high → low).
const NUMERATOR: [f64; 7] = [
    3.526_249_659_989_11e-2,
    0.700_383_064_443_688,
    6.373_962_203_531_65,
    33.912_866_078_383,
    112.079_291_497_871,
    221.213_596_169_931,
    220.206_867_912_376,
];

/// Hart (1968) rational approximation coefficients, denominator (high → low).
const DENOMINATOR: [f64; 8] = [
    8.838_834_764_831_84e-2,
    1.755_667_163_182_64,
    16.064_177_579_207,
    86.780_732_202_946_1,
    296.564_248_779_674,
    637.333_633_378_831,
    793.826_512_519_948,
    440.413_735_824_752,
];

#[inline]
fn horner<T: Float>(coefficients: &[f64], x: T) -> T {
    coefficients
        .iter()
        .fold(T::zero(), |acc, &c| acc * x + lit::<T>(c))
}

/// Upper tail probability P(X > a) for a >= 0.
#[inline]
fn upper_tail<T: Float>(a: T) -> T {
    if a > lit(TAIL_CUTOFF) {
        return T::zero();
    }

    let gauss = (-a * a * lit(0.5)).exp();

    if a < lit(RATIONAL_LIMIT) {
        gauss * horner(&NUMERATOR, a) / horner(&DENOMINATOR, a)
    } else {
        // Continued fraction for the far tail
        let mut cf = a + lit(0.65);
        for k in [4.0, 3.0, 2.0, 1.0] {
            cf = a + lit::<T>(k) / cf;
        }
        gauss / cf / lit(SQRT_2PI)
    }
}

/// Standard normal cumulative distribution function.
///
/// Computes P(X <= x) where X ~ N(0, 1) using Hart's double-precision
/// rational approximation (as popularised by West, 2005) below |x| = 7.07
/// and a continued fraction beyond.
///
/// # Accuracy
/// Absolute error below 1e-14 for all finite x.
///
/// # Examples
/// ```
/// use pricer_models::analytical::distributions::norm_cdf;
///
/// assert!((norm_cdf(0.0_f64) - 0.5).abs() < 1e-15);
/// assert!((norm_cdf(1.96_f64) - 0.9750021048517795).abs() < 1e-13);
/// ```
#[inline]
pub fn norm_cdf<T: Float>(x: T) -> T {
    let tail = upper_tail(x.abs());
    if x > T::zero() {
        T::one() - tail
    } else {
        tail
    }
}

/// Standard normal probability density function.
///
/// φ(x) = (1 / sqrt(2π)) * exp(-x² / 2)
///
/// # Examples
/// ```
/// use pricer_models::analytical::distributions::norm_pdf;
///
/// assert!((norm_pdf(0.0_f64) - 0.3989422804014327).abs() < 1e-15);
/// ```
#[inline]
pub fn norm_pdf<T: Float>(x: T) -> T {
    lit::<T>(FRAC_1_SQRT_2PI) * (-x * x * lit(0.5)).exp()
}
