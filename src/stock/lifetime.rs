//! Lifetime distributions describing how long stock stays in service.
//!
//! A [`LifetimeSpec`] is the user-facing description of a distribution family and its parameters.
//! It is resolved once into a [`Lifetime`], which checks every parameter up front and is then used
//! to evaluate survival curves.
//!
//! # Age convention
//!
//! All families share one rule. A cohort is counted in full in its inception year, i.e.
//! `survival_fraction(0) == 1`, and an item whose age equals its lifetime has already left service.
//! With a fixed lifetime of `L` years the whole cohort is therefore removed in the year it reaches
//! age `L`, and no cohort ever loses stock in its own inception year.
use super::error::{DsmError, DsmResult};
use serde::{Deserialize, Serialize};
use statrs::function::erf::erfc;
use std::f64::consts::SQRT_2;

/// Survival fractions below this value are set to exactly zero
pub const SURVIVAL_CUTOFF: f64 = f64::EPSILON;

/// A lifetime parameter: either one value for all cohorts or one value per cohort
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawCohortParameter", into = "RawCohortParameter")]
pub struct CohortParameter(Vec<f64>);

/// How a [`CohortParameter`] is written in input files
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawCohortParameter {
    Constant(f64),
    PerCohort(Vec<f64>),
}

impl From<RawCohortParameter> for CohortParameter {
    fn from(raw: RawCohortParameter) -> Self {
        match raw {
            RawCohortParameter::Constant(value) => Self::constant(value),
            RawCohortParameter::PerCohort(values) => Self::per_cohort(values),
        }
    }
}

impl From<CohortParameter> for RawCohortParameter {
    fn from(param: CohortParameter) -> Self {
        match param.0.as_slice() {
            [value] => Self::Constant(*value),
            _ => Self::PerCohort(param.0),
        }
    }
}

impl From<f64> for CohortParameter {
    fn from(value: f64) -> Self {
        Self::constant(value)
    }
}

impl From<Vec<f64>> for CohortParameter {
    fn from(values: Vec<f64>) -> Self {
        Self::per_cohort(values)
    }
}

impl CohortParameter {
    /// A parameter shared by all cohorts
    pub fn constant(value: f64) -> Self {
        Self(vec![value])
    }

    /// A parameter with one entry per cohort
    pub fn per_cohort(values: Vec<f64>) -> Self {
        Self(values)
    }

    /// The raw values
    pub fn values(&self) -> &[f64] {
        &self.0
    }

    /// Get the value for the given cohort
    pub fn get(&self, cohort: usize) -> f64 {
        match self.0.as_slice() {
            [value] => *value,
            values => values[cohort],
        }
    }

    /// Drop the first `count` cohorts (no-op for constant parameters)
    fn skip_cohorts(&self, count: usize) -> Self {
        match self.0.as_slice() {
            [_] => self.clone(),
            values => Self(values.iter().skip(count).copied().collect()),
        }
    }

    /// Check the length against the number of cohorts and that all values are positive
    fn validate(&self, name: &str, n_cohorts: usize) -> DsmResult<()> {
        let len = self.0.len();
        if len != 1 && len != n_cohorts {
            return Err(DsmError::mismatch(
                format!("lifetime parameter `{name}`"),
                n_cohorts,
                len,
            ));
        }

        if let Some(value) = self.0.iter().find(|v| !(v.is_finite() && **v > 0.0)) {
            return Err(DsmError::invalid(format!(
                "lifetime parameter `{name}` must be a finite number greater than zero (found {value})"
            )));
        }

        Ok(())
    }
}

/// A lifetime distribution family along with its parameters.
///
/// The log-normal and gamma families are reserved: they can be written in input files but are
/// always rejected when resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "distribution", rename_all = "snake_case")]
pub enum LifetimeSpec {
    /// Every item of a cohort leaves service at exactly `mean` years of age
    Fixed {
        /// Lifetime in years
        mean: CohortParameter,
    },
    /// Normally distributed lifetimes
    Normal {
        /// Mean lifetime in years
        mean: CohortParameter,
        /// Standard deviation in years
        std_dev: CohortParameter,
    },
    /// Weibull distributed lifetimes
    Weibull {
        /// Shape parameter (k)
        shape: CohortParameter,
        /// Scale parameter (lambda) in years
        scale: CohortParameter,
    },
    /// Log-normally distributed lifetimes (not supported)
    LogNormal {
        /// Mean lifetime in years
        mean: CohortParameter,
        /// Standard deviation in years
        std_dev: CohortParameter,
    },
    /// Gamma distributed lifetimes (not supported)
    Gamma {
        /// Shape parameter
        shape: CohortParameter,
        /// Scale parameter in years
        scale: CohortParameter,
    },
}

impl LifetimeSpec {
    /// A fixed lifetime shared by all cohorts
    pub fn fixed(mean: f64) -> Self {
        Self::Fixed { mean: mean.into() }
    }

    /// A normal distribution shared by all cohorts
    pub fn normal(mean: f64, std_dev: f64) -> Self {
        Self::Normal {
            mean: mean.into(),
            std_dev: std_dev.into(),
        }
    }

    /// A Weibull distribution shared by all cohorts
    pub fn weibull(shape: f64, scale: f64) -> Self {
        Self::Weibull {
            shape: shape.into(),
            scale: scale.into(),
        }
    }

    /// The name of the distribution family as written in input files
    pub fn name(&self) -> &'static str {
        match self {
            Self::Fixed { .. } => "fixed",
            Self::Normal { .. } => "normal",
            Self::Weibull { .. } => "weibull",
            Self::LogNormal { .. } => "log_normal",
            Self::Gamma { .. } => "gamma",
        }
    }

    /// A copy of this spec without the parameters of the first `count` cohorts.
    ///
    /// Used when a model runs on the tail of a time axis. Constant parameters are unaffected.
    pub fn skip_cohorts(&self, count: usize) -> Self {
        match self {
            Self::Fixed { mean } => Self::Fixed {
                mean: mean.skip_cohorts(count),
            },
            Self::Normal { mean, std_dev } => Self::Normal {
                mean: mean.skip_cohorts(count),
                std_dev: std_dev.skip_cohorts(count),
            },
            Self::Weibull { shape, scale } => Self::Weibull {
                shape: shape.skip_cohorts(count),
                scale: scale.skip_cohorts(count),
            },
            Self::LogNormal { mean, std_dev } => Self::LogNormal {
                mean: mean.skip_cohorts(count),
                std_dev: std_dev.skip_cohorts(count),
            },
            Self::Gamma { shape, scale } => Self::Gamma {
                shape: shape.skip_cohorts(count),
                scale: scale.skip_cohorts(count),
            },
        }
    }

    /// Validate the parameters for a model with `n_cohorts` cohorts.
    ///
    /// # Returns
    ///
    /// A [`Lifetime`] which can be evaluated, or an error if a parameter is non-positive, has the
    /// wrong length or the family is not supported.
    pub fn resolve(&self, n_cohorts: usize) -> DsmResult<Lifetime> {
        let family = match self {
            Self::Fixed { mean } => {
                mean.validate("mean", n_cohorts)?;
                Family::Fixed { mean: mean.clone() }
            }
            Self::Normal { mean, std_dev } => {
                mean.validate("mean", n_cohorts)?;
                std_dev.validate("std_dev", n_cohorts)?;
                Family::Normal {
                    mean: mean.clone(),
                    std_dev: std_dev.clone(),
                }
            }
            Self::Weibull { shape, scale } => {
                shape.validate("shape", n_cohorts)?;
                scale.validate("scale", n_cohorts)?;
                Family::Weibull {
                    shape: shape.clone(),
                    scale: scale.clone(),
                }
            }
            Self::LogNormal { .. } | Self::Gamma { .. } => {
                return Err(DsmError::invalid(format!(
                    "{} lifetime distributions are not supported",
                    self.name()
                )));
            }
        };

        Ok(Lifetime { family, n_cohorts })
    }
}

/// The supported families, with validated parameters
#[derive(Debug, Clone, PartialEq)]
enum Family {
    Fixed {
        mean: CohortParameter,
    },
    Normal {
        mean: CohortParameter,
        std_dev: CohortParameter,
    },
    Weibull {
        shape: CohortParameter,
        scale: CohortParameter,
    },
}

/// A validated lifetime distribution for a fixed number of cohorts
#[derive(Debug, Clone, PartialEq)]
pub struct Lifetime {
    family: Family,
    n_cohorts: usize,
}

impl Lifetime {
    /// The number of cohorts this lifetime was validated for
    pub fn n_cohorts(&self) -> usize {
        self.n_cohorts
    }

    /// The fraction of cohort `cohort` still in service at `age` years.
    ///
    /// The result is in `[0, 1]`, equal to 1 at age zero and non-increasing with age.
    pub fn survival_fraction(&self, age: u32, cohort: usize) -> f64 {
        if age == 0 {
            return 1.0;
        }

        let age = f64::from(age);
        let fraction = match &self.family {
            Family::Fixed { mean } => {
                if age < mean.get(cohort) {
                    1.0
                } else {
                    0.0
                }
            }
            Family::Normal { mean, std_dev } => {
                // Upper tail of the normal CDF, without the cancellation of 1 - cdf
                let z = (age - mean.get(cohort)) / std_dev.get(cohort);
                0.5 * erfc(z / SQRT_2)
            }
            Family::Weibull { shape, scale } => {
                (-(age / scale.get(cohort)).powf(shape.get(cohort))).exp()
            }
        };

        if fraction < SURVIVAL_CUTOFF {
            0.0
        } else {
            fraction.min(1.0)
        }
    }

    /// The fraction of the original cohort which leaves service between `age - 1` and `age`
    pub fn outflow_fraction(&self, age: u32, cohort: usize) -> f64 {
        if age == 0 {
            return 0.0;
        }

        self.survival_fraction(age - 1, cohort) - self.survival_fraction(age, cohort)
    }

    /// Evaluate the survival curve of one cohort at each of the given ages
    pub fn survival_curve<I>(&self, cohort: usize, ages: I) -> Vec<f64>
    where
        I: IntoIterator<Item = u32>,
    {
        ages.into_iter()
            .map(|age| self.survival_fraction(age, cohort))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;
    use itertools::Itertools;
    use rstest::rstest;

    #[rstest]
    #[case(LifetimeSpec::fixed(3.0), 2, 1.0)]
    #[case(LifetimeSpec::fixed(3.0), 3, 0.0)] // removed when age reaches the lifetime
    #[case(LifetimeSpec::fixed(2.5), 2, 1.0)]
    #[case(LifetimeSpec::fixed(2.5), 3, 0.0)]
    #[case(LifetimeSpec::normal(10.0, 2.0), 10, 0.5)]
    #[case(LifetimeSpec::normal(10.0, 2.0), 12, 0.158_655_253_931_457_07)]
    #[case(LifetimeSpec::normal(10.0, 2.0), 8, 0.841_344_746_068_542_9)]
    #[case(LifetimeSpec::weibull(3.0, 10.0), 10, 0.367_879_441_171_442_33)]
    #[case(LifetimeSpec::weibull(1.0, 5.0), 5, 0.367_879_441_171_442_33)]
    fn test_survival_fraction(#[case] spec: LifetimeSpec, #[case] age: u32, #[case] expected: f64) {
        // statrs' erfc is accurate to around 1e-11
        let lifetime = spec.resolve(1).unwrap();
        assert_approx_eq!(
            f64,
            lifetime.survival_fraction(age, 0),
            expected,
            epsilon = 1e-10
        );
    }

    #[rstest]
    #[case(LifetimeSpec::fixed(40.0))]
    #[case(LifetimeSpec::normal(40.0, 8.0))]
    #[case(LifetimeSpec::normal(0.5, 0.1))]
    #[case(LifetimeSpec::weibull(3.0, 40.0))]
    #[case(LifetimeSpec::weibull(0.5, 40.0))]
    fn test_survival_curve_monotone(#[case] spec: LifetimeSpec) {
        let lifetime = spec.resolve(1).unwrap();
        let curve = lifetime.survival_curve(0, 0..300);
        assert_eq!(curve[0], 1.0);
        assert!(curve.iter().all(|sf| (0.0..=1.0).contains(sf)));
        assert!(curve.iter().tuple_windows().all(|(a, b)| b <= a));
    }

    #[test]
    fn test_normal_far_tail_clamped() {
        let lifetime = LifetimeSpec::normal(10.0, 1.0).resolve(1).unwrap();
        assert_eq!(lifetime.survival_fraction(30, 0), 0.0);
        assert!(lifetime.survival_fraction(15, 0) > 0.0);
    }

    #[test]
    fn test_outflow_fraction() {
        let lifetime = LifetimeSpec::fixed(3.0).resolve(1).unwrap();
        let outflow = (0..6).map(|age| lifetime.outflow_fraction(age, 0)).collect_vec();
        assert_eq!(outflow, [0.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

        let lifetime = LifetimeSpec::weibull(2.0, 20.0).resolve(1).unwrap();
        let total: f64 = (0..500).map(|age| lifetime.outflow_fraction(age, 0)).sum();
        assert_approx_eq!(f64, total, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_per_cohort_parameters() {
        let spec = LifetimeSpec::Fixed {
            mean: vec![1.0, 2.0, 3.0].into(),
        };
        let lifetime = spec.resolve(3).unwrap();
        assert_eq!(lifetime.survival_fraction(1, 0), 0.0);
        assert_eq!(lifetime.survival_fraction(1, 1), 1.0);
        assert_eq!(lifetime.survival_fraction(2, 1), 0.0);
        assert_eq!(lifetime.survival_fraction(2, 2), 1.0);
    }

    #[rstest]
    #[case(LifetimeSpec::fixed(0.0))]
    #[case(LifetimeSpec::fixed(f64::NAN))]
    #[case(LifetimeSpec::normal(10.0, 0.0))]
    #[case(LifetimeSpec::normal(-1.0, 1.0))]
    #[case(LifetimeSpec::weibull(0.0, 10.0))]
    #[case(LifetimeSpec::weibull(3.0, -10.0))]
    #[case(LifetimeSpec::weibull(3.0, f64::INFINITY))]
    fn test_resolve_invalid_parameter(#[case] spec: LifetimeSpec) {
        assert!(matches!(
            spec.resolve(5),
            Err(DsmError::InvalidParameter { .. })
        ));
    }

    #[rstest]
    #[case(LifetimeSpec::LogNormal { mean: 50.0.into(), std_dev: 10.0.into() })]
    #[case(LifetimeSpec::Gamma { shape: 32.9.into(), scale: 2.7.into() })]
    fn test_resolve_reserved_family(#[case] spec: LifetimeSpec) {
        let err = spec.resolve(5).unwrap_err();
        assert_eq!(
            err,
            DsmError::InvalidParameter {
                what: format!("{} lifetime distributions are not supported", spec.name())
            }
        );
    }

    #[rstest]
    #[case(vec![10.0, 10.0], 3)]
    #[case(vec![], 3)]
    #[case(vec![10.0; 4], 3)]
    fn test_resolve_dimension_mismatch(#[case] mean: Vec<f64>, #[case] n_cohorts: usize) {
        let spec = LifetimeSpec::Fixed { mean: mean.into() };
        assert!(matches!(
            spec.resolve(n_cohorts),
            Err(DsmError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_skip_cohorts() {
        let spec = LifetimeSpec::Normal {
            mean: vec![1.0, 2.0, 3.0, 4.0].into(),
            std_dev: 0.5.into(),
        };
        assert_eq!(
            spec.skip_cohorts(2),
            LifetimeSpec::Normal {
                mean: vec![3.0, 4.0].into(),
                std_dev: 0.5.into(),
            }
        );
    }

    #[test]
    fn test_deserialise_lifetime_spec() {
        let spec: LifetimeSpec =
            toml::from_str("distribution = \"weibull\"\nshape = 3.0\nscale = 140.0").unwrap();
        assert_eq!(spec, LifetimeSpec::weibull(3.0, 140.0));

        let spec: LifetimeSpec =
            toml::from_str("distribution = \"fixed\"\nmean = [70.0, 80.0]").unwrap();
        assert_eq!(
            spec,
            LifetimeSpec::Fixed {
                mean: vec![70.0, 80.0].into()
            }
        );

        assert!(toml::from_str::<LifetimeSpec>("distribution = \"exponential\"").is_err());
    }
}
