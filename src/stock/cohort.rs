//! The age-cohort matrix and the algorithms which fill it.
//!
//! `S[t][c]` is the stock in year `t` which entered service in year `c`. Entries with `c > t` are
//! always zero.
use super::lifetime::Lifetime;
use super::time_axis::TimeAxis;
use log::debug;
use serde_string_enum::{DeserializeLabeledStringEnum, SerializeLabeledStringEnum};

/// A square, lower-triangular matrix indexed by `[year][cohort]`
#[derive(Debug, Clone, PartialEq)]
pub struct CohortMatrix {
    size: usize,
    data: Vec<f64>,
}

impl CohortMatrix {
    /// A matrix of zeros
    pub fn zeros(size: usize) -> Self {
        Self {
            size,
            data: vec![0.0; size * size],
        }
    }

    /// The number of years (and cohorts)
    pub fn size(&self) -> usize {
        self.size
    }

    /// The value for the given year and cohort
    pub fn get(&self, year: usize, cohort: usize) -> f64 {
        self.data[year * self.size + cohort]
    }

    fn set(&mut self, year: usize, cohort: usize, value: f64) {
        debug_assert!(cohort <= year, "Cohort matrix must stay lower-triangular");
        self.data[year * self.size + cohort] = value;
    }

    /// All cohorts for one year, including the structurally zero entries after `year`
    pub fn row(&self, year: usize) -> &[f64] {
        &self.data[year * self.size..(year + 1) * self.size]
    }

    /// The cohorts which can be non-zero in `year`, i.e. `0..=year`
    pub fn cohorts_in_year(&self, year: usize) -> &[f64] {
        &self.row(year)[..=year]
    }

    /// Sum of all cohorts in `year`
    pub fn year_total(&self, year: usize) -> f64 {
        self.cohorts_in_year(year).iter().sum()
    }

    /// Iterate over the rows of the matrix
    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks(self.size.max(1)).take(self.size)
    }
}

impl CohortMatrix {
    /// The outflow by year and cohort implied by a stock matrix and the recorded inflow.
    ///
    /// `O[t][c] = S[t-1][c] - S[t][c]` for `t > c`, and `O[c][c] = I[c] - S[c][c]`.
    pub fn outflow_from(stock: &CohortMatrix, inflow: &[f64]) -> Self {
        let mut outflow = Self::zeros(stock.size);
        for year in 0..stock.size {
            for cohort in 0..year {
                outflow.set(
                    year,
                    cohort,
                    stock.get(year - 1, cohort) - stock.get(year, cohort),
                );
            }
            outflow.set(year, year, inflow[year] - stock.get(year, year));
        }

        outflow
    }
}

/// The survival curve of every cohort over the years remaining on the time axis.
///
/// `curve(c)[k]` is the surviving fraction of cohort `c` in year `c + k`. Each curve is evaluated
/// once and reused for every later year.
#[derive(Debug, Clone)]
pub struct SurvivalTable {
    curves: Vec<Vec<f64>>,
}

impl SurvivalTable {
    /// Evaluate all survival curves for the given axis
    pub fn new(years: &TimeAxis, lifetime: &Lifetime) -> Self {
        let curves = (0..years.len())
            .map(|cohort| {
                let ages = (cohort..years.len()).map(|year| years.age(year, cohort));
                lifetime.survival_curve(cohort, ages)
            })
            .collect();

        Self { curves }
    }

    /// The survival curve of one cohort, starting in its inception year
    pub fn curve(&self, cohort: usize) -> &[f64] {
        &self.curves[cohort]
    }

    /// The surviving fraction of `cohort` in year `year`
    pub fn get(&self, year: usize, cohort: usize) -> f64 {
        self.curves[cohort][year - cohort]
    }

    /// The factor taking the stock of `cohort` from `year - 1` to `year`.
    ///
    /// Once a cohort's survival has reached zero the factor stays zero.
    pub fn step_ratio(&self, year: usize, cohort: usize) -> f64 {
        let curve = &self.curves[cohort];
        let offset = year - cohort;
        let previous = curve[offset - 1];
        if previous > 0.0 {
            curve[offset] / previous
        } else {
            0.0
        }
    }
}

/// What to do when the stock-driven model needs a negative inflow to reach the target stock
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, SerializeLabeledStringEnum, DeserializeLabeledStringEnum,
)]
pub enum NegativeInflowPolicy {
    /// Remove the surplus from every existing cohort in proportion to its size
    #[default]
    #[string = "pro_rata"]
    ProRata,
    /// Remove the surplus from the oldest cohorts first
    #[string = "oldest_first"]
    OldestFirst,
    /// Keep the negative inflow
    #[string = "disabled"]
    Disabled,
}

/// Shortfalls up to this fraction of the carried-over stock are rounding error, not negative inflow
const ROUNDING_TOLERANCE: f64 = 1e-12;

/// A year in which the stock-driven model required a negative inflow
#[derive(Debug, Clone, PartialEq)]
pub struct NegativeInflow {
    /// Index of the year on the time axis
    pub year_index: usize,
    /// The calendar year
    pub year: u32,
    /// How much the surviving stock exceeded the target stock
    pub shortfall: f64,
    /// Whether the surplus was removed as extra outflow (otherwise it was kept as negative inflow)
    pub corrected: bool,
}

/// The filled cohort matrices along with the inflow which produced them
#[derive(Debug, Clone)]
pub struct CohortSolution {
    /// Stock by year and cohort
    pub stock: CohortMatrix,
    /// Outflow by year and cohort
    pub outflow: CohortMatrix,
    /// Recorded inflow for each year
    pub inflow: Vec<f64>,
    /// Years in which a negative inflow was needed
    pub negative_inflows: Vec<NegativeInflow>,
}

/// Carry the stock of every cohort older than `year` forward from the previous year
fn propagate_row(stock: &mut CohortMatrix, survival: &SurvivalTable, year: usize) {
    for cohort in 0..year {
        let carried = stock.get(year - 1, cohort) * survival.step_ratio(year, cohort);
        stock.set(year, cohort, carried);
    }
}

/// Remove `surplus` from the cohorts in `year` which entered service before `year`
fn remove_surplus(
    stock: &mut CohortMatrix,
    year: usize,
    carried: f64,
    surplus: f64,
    policy: NegativeInflowPolicy,
) {
    match policy {
        NegativeInflowPolicy::ProRata => {
            let factor = (carried - surplus) / carried;
            for cohort in 0..year {
                stock.set(year, cohort, stock.get(year, cohort) * factor);
            }
        }
        NegativeInflowPolicy::OldestFirst => {
            let mut remaining = surplus;
            for cohort in 0..year {
                if remaining <= 0.0 {
                    break;
                }

                let available = stock.get(year, cohort);
                let removed = available.min(remaining).max(0.0);
                stock.set(year, cohort, available - removed);
                remaining -= removed;
            }
        }
        NegativeInflowPolicy::Disabled => {}
    }
}

/// Fill the cohort matrix so that the total stock follows `target`.
///
/// Inflow in each year is whatever is needed on top of the surviving older cohorts. See
/// [`NegativeInflowPolicy`] for the handling of years where the survivors exceed the target.
pub fn solve_stock_driven(
    years: &TimeAxis,
    target: &[f64],
    survival: &SurvivalTable,
    policy: NegativeInflowPolicy,
) -> CohortSolution {
    let n = target.len();
    let mut stock = CohortMatrix::zeros(n);
    let mut inflow = vec![0.0; n];
    let mut negative_inflows = Vec::new();

    for year in 0..n {
        if year > 0 {
            propagate_row(&mut stock, survival, year);
        }

        let carried: f64 = stock.cohorts_in_year(year)[..year].iter().sum();
        let mut new_inflow = target[year] - carried;
        if new_inflow < 0.0 && -new_inflow <= carried * ROUNDING_TOLERANCE {
            new_inflow = 0.0;
        } else if new_inflow < 0.0 {
            let shortfall = -new_inflow;
            let corrected = policy != NegativeInflowPolicy::Disabled;
            debug!(
                "Negative inflow of {shortfall} needed in {} ({})",
                years[year],
                if corrected { "corrected" } else { "kept" }
            );

            if corrected {
                remove_surplus(&mut stock, year, carried, shortfall, policy);
                new_inflow = 0.0;
            }

            negative_inflows.push(NegativeInflow {
                year_index: year,
                year: years[year],
                shortfall,
                corrected,
            });
        }

        stock.set(year, year, new_inflow);
        inflow[year] = new_inflow;
    }

    CohortSolution {
        outflow: CohortMatrix::outflow_from(&stock, &inflow),
        stock,
        inflow,
        negative_inflows,
    }
}

/// Fill the cohort matrices from a known inflow series.
///
/// The outflow of each cohort is the inflow times the share of the cohort leaving service at each
/// age passed since the previous time step.
pub fn solve_inflow_driven(
    years: &TimeAxis,
    inflow: &[f64],
    survival: &SurvivalTable,
    lifetime: &Lifetime,
) -> CohortSolution {
    let n = inflow.len();
    let mut stock = CohortMatrix::zeros(n);
    let mut outflow = CohortMatrix::zeros(n);
    for (cohort, cohort_inflow) in inflow.iter().enumerate() {
        for (offset, fraction) in survival.curve(cohort).iter().enumerate() {
            stock.set(cohort + offset, cohort, cohort_inflow * fraction);
        }

        for year in cohort + 1..n {
            let leaving: f64 = (years.age(year - 1, cohort) + 1..=years.age(year, cohort))
                .map(|age| lifetime.outflow_fraction(age, cohort))
                .sum();
            outflow.set(year, cohort, cohort_inflow * leaving);
        }
    }

    CohortSolution {
        stock,
        outflow,
        inflow: inflow.to_vec(),
        negative_inflows: Vec::new(),
    }
}

/// Evolve an existing stock forward from `switch_index` with no new inflow.
///
/// `initial_stock[c]` is the stock of cohort `c` in year `switch_index - 1`. Earlier years are left
/// empty.
pub fn evolve_initial_stock(
    initial_stock: &[f64],
    switch_index: usize,
    survival: &SurvivalTable,
) -> CohortSolution {
    let n = survival.curves.len();
    let mut stock = CohortMatrix::zeros(n);
    for (cohort, value) in initial_stock.iter().enumerate() {
        stock.set(switch_index - 1, cohort, *value);
    }

    for year in switch_index..n {
        propagate_row(&mut stock, survival, year);
    }

    let inflow = vec![0.0; n];
    CohortSolution {
        outflow: CohortMatrix::outflow_from(&stock, &inflow),
        stock,
        inflow,
        negative_inflows: Vec::new(),
    }
}
