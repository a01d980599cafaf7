//! Interpolation of sparse anchor points (e.g. five-yearly population projections) onto every model
//! year.
use crate::input::is_sorted_and_unique;
use anyhow::{Result, bail, ensure};
use itertools::Itertools;
use serde_string_enum::{DeserializeLabeledStringEnum, SerializeLabeledStringEnum};

/// How to fill in the years between anchor points
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, SerializeLabeledStringEnum, DeserializeLabeledStringEnum,
)]
pub enum InterpolationMethod {
    /// Straight lines between neighbouring anchors
    #[string = "linear"]
    Linear,
    /// A cubic spline through all anchors with not-a-knot end conditions
    #[default]
    #[string = "cubic"]
    Cubic,
    /// The value of the closest anchor (the earlier one on a tie)
    #[string = "nearest"]
    Nearest,
    /// The value of the last anchor at or before the year
    #[string = "previous"]
    Previous,
    /// The value of the first anchor at or after the year
    #[string = "next"]
    Next,
}

/// A series of values known at a handful of years
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorSeries {
    anchor_years: Vec<u32>,
    years: Vec<f64>,
    values: Vec<f64>,
}

impl AnchorSeries {
    /// Create a series from `(year, value)` pairs, which must be in increasing order of year
    pub fn new<I>(points: I) -> Result<Self>
    where
        I: IntoIterator<Item = (u32, f64)>,
    {
        let (years, values): (Vec<u32>, Vec<f64>) = points.into_iter().unzip();
        ensure!(!years.is_empty(), "No anchor points provided");
        ensure!(
            is_sorted_and_unique(&years),
            "Anchor years must be unique and in increasing order"
        );
        ensure!(
            values.iter().all(|v| v.is_finite()),
            "Anchor values must be finite"
        );

        Ok(Self {
            years: years.iter().copied().map(f64::from).collect(),
            anchor_years: years,
            values,
        })
    }

    /// The first and last anchor years
    pub fn year_range(&self) -> (u32, u32) {
        (
            self.anchor_years[0],
            self.anchor_years[self.anchor_years.len() - 1],
        )
    }

    /// The anchor values
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Evaluate the series at every year in `years`.
    ///
    /// Years outside the anchor range are an error: the series is never extrapolated.
    pub fn interpolate(&self, years: &[u32], method: InterpolationMethod) -> Result<Vec<f64>> {
        let (first, last) = self.year_range();
        if let Some(year) = years.iter().find(|year| !(first..=last).contains(*year)) {
            bail!("Year {year} is outside the range of anchor years ({first}-{last})");
        }

        let second_derivatives = match method {
            InterpolationMethod::Cubic => {
                not_a_knot_second_derivatives(&self.years, &self.values)
            }
            _ => Vec::new(),
        };

        Ok(years
            .iter()
            .map(|year| {
                let x = f64::from(*year);
                match method {
                    InterpolationMethod::Linear => self.linear(x),
                    InterpolationMethod::Cubic => self.cubic(x, &second_derivatives),
                    InterpolationMethod::Nearest => self.nearest(x),
                    InterpolationMethod::Previous => self.values[self.previous_index(x)],
                    InterpolationMethod::Next => self.values[self.next_index(x)],
                }
            })
            .collect())
    }

    /// Index of the last anchor at or before `x`
    fn previous_index(&self, x: f64) -> usize {
        self.years.partition_point(|year| *year <= x) - 1
    }

    /// Index of the first anchor at or after `x`
    fn next_index(&self, x: f64) -> usize {
        self.years.partition_point(|year| *year < x)
    }

    /// Index of the anchor segment `[i, i + 1]` containing `x`
    fn segment(&self, x: f64) -> usize {
        self.previous_index(x).min(self.years.len().saturating_sub(2))
    }

    fn linear(&self, x: f64) -> f64 {
        if self.years.len() == 1 {
            return self.values[0];
        }

        let i = self.segment(x);
        let (x0, x1) = (self.years[i], self.years[i + 1]);
        let (y0, y1) = (self.values[i], self.values[i + 1]);
        y0 + (y1 - y0) * (x - x0) / (x1 - x0)
    }

    fn cubic(&self, x: f64, m: &[f64]) -> f64 {
        if self.years.len() == 1 {
            return self.values[0];
        }

        let i = self.segment(x);
        let (x0, x1) = (self.years[i], self.years[i + 1]);
        let (y0, y1) = (self.values[i], self.values[i + 1]);
        let h = x1 - x0;
        let (a, b) = (x1 - x, x - x0);

        m[i] * a.powi(3) / (6.0 * h)
            + m[i + 1] * b.powi(3) / (6.0 * h)
            + (y0 / h - m[i] * h / 6.0) * a
            + (y1 / h - m[i + 1] * h / 6.0) * b
    }

    fn nearest(&self, x: f64) -> f64 {
        let previous = self.previous_index(x);
        let next = self.next_index(x);
        if x - self.years[previous] <= self.years[next] - x {
            self.values[previous]
        } else {
            self.values[next]
        }
    }
}

/// Second derivatives at the anchors of the not-a-knot cubic spline through the given points.
///
/// The third derivative is continuous at the second and second-to-last anchors, so the first two
/// and last two segments are each a single cubic. Two points give a straight line and three a
/// parabola.
fn not_a_knot_second_derivatives(x: &[f64], y: &[f64]) -> Vec<f64> {
    let n = x.len();
    if n < 3 {
        return vec![0.0; n];
    }

    let h = x.iter().tuple_windows().map(|(a, b)| b - a).collect_vec();
    let slope = |i: usize| (y[i + 1] - y[i]) / h[i];
    if n == 3 {
        return vec![2.0 * (slope(1) - slope(0)) / (h[0] + h[1]); 3];
    }

    // Continuity of the first derivative at each interior anchor, in unknowns m[1..n - 1]
    let interior = n - 2;
    let mut lower = vec![0.0; interior];
    let mut diag = vec![0.0; interior];
    let mut upper = vec![0.0; interior];
    let mut rhs = vec![0.0; interior];
    for j in 0..interior {
        let i = j + 1;
        lower[j] = h[i - 1];
        diag[j] = 2.0 * (h[i - 1] + h[i]);
        upper[j] = h[i];
        rhs[j] = 6.0 * (slope(i) - slope(i - 1));
    }

    // Substitute the end curvatures implied by the not-a-knot conditions
    let (h0, h1) = (h[0], h[1]);
    diag[0] = (h0 + h1) * (h0 + 2.0 * h1) / h1;
    upper[0] = (h1 * h1 - h0 * h0) / h1;
    let (p, q) = (h[n - 3], h[n - 2]);
    lower[interior - 1] = (p * p - q * q) / p;
    diag[interior - 1] = (p + q) * (2.0 * p + q) / p;

    // Thomas algorithm
    for j in 1..interior {
        let w = lower[j] / diag[j - 1];
        diag[j] -= w * upper[j - 1];
        rhs[j] -= w * rhs[j - 1];
    }
    let mut m = vec![0.0; n];
    m[interior] = rhs[interior - 1] / diag[interior - 1];
    for j in (0..interior - 1).rev() {
        m[j + 1] = (rhs[j] - upper[j] * m[j + 2]) / diag[j];
    }

    m[0] = ((h0 + h1) * m[1] - h0 * m[2]) / h1;
    m[n - 1] = ((p + q) * m[n - 2] - q * m[n - 3]) / p;

    m
}
