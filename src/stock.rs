//! Cohort-based dynamic stock models.
//!
//! A [`DynamicStockModel`] tracks how much stock enters service each year, how long each cohort
//! survives and how much leaves service again. Every quantity is computed when the model is built;
//! afterwards it only offers read-only views. The stock, inflow and outflow of a model always satisfy
//! `S[t] - S[t-1] = I[t] - O[t]`, which can be checked with [`DynamicStockModel::balance_report`].
use itertools::Itertools;
use log::debug;

pub mod cohort;
pub mod error;
pub mod lifetime;
pub mod time_axis;

pub use cohort::{CohortMatrix, NegativeInflow, NegativeInflowPolicy};
pub use error::{DsmError, DsmResult};
pub use lifetime::{CohortParameter, Lifetime, LifetimeSpec};
pub use time_axis::TimeAxis;

use cohort::{
    CohortSolution, SurvivalTable, evolve_initial_stock, solve_inflow_driven, solve_stock_driven,
};

/// Check that a driving series has one finite, non-negative value per year
fn check_series(name: &str, values: &[f64], n_years: usize) -> DsmResult<()> {
    if values.len() != n_years {
        return Err(DsmError::mismatch(name, n_years, values.len()));
    }

    if let Some((index, value)) = values
        .iter()
        .find_position(|v| !(v.is_finite() && **v >= 0.0))
    {
        return Err(DsmError::invalid(format!(
            "{name} must be finite and non-negative (found {value} at index {index})"
        )));
    }

    Ok(())
}

/// The largest absolute value in a series
fn max_abs(values: &[f64]) -> f64 {
    values.iter().fold(0.0, |acc, v| acc.max(v.abs()))
}

/// The largest mass-balance residual of a model, compared against a tolerance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalanceReport {
    /// Largest absolute value of `ΔS[t] - (I[t] - O[t])`
    pub max_abs_residual: f64,
    /// The year in which the largest residual occurs
    pub year: u32,
    /// Absolute tolerance the residual was compared with
    pub tolerance: f64,
}

impl BalanceReport {
    /// Whether the largest residual is within the tolerance
    pub fn is_within_tolerance(&self) -> bool {
        self.max_abs_residual <= self.tolerance
    }
}

/// A dynamic stock model: stock, inflow and outflow by year and cohort
#[derive(Debug, Clone)]
pub struct DynamicStockModel {
    years: TimeAxis,
    stock: CohortMatrix,
    outflow: CohortMatrix,
    inflow: Vec<f64>,
    negative_inflows: Vec<NegativeInflow>,
}

impl DynamicStockModel {
    /// Build a model whose total stock follows `stock`, using the default [`NegativeInflowPolicy`]
    pub fn stock_driven(years: &TimeAxis, stock: &[f64], lifetime: &LifetimeSpec) -> DsmResult<Self> {
        Self::stock_driven_with_policy(years, stock, lifetime, NegativeInflowPolicy::default())
    }

    /// Build a model whose total stock follows `stock`.
    ///
    /// The inflow in each year is the stock which has to be added on top of the surviving older
    /// cohorts. Years in which the survivors already exceed the target are handled according to
    /// `policy` and reported by [`Self::negative_inflows`].
    pub fn stock_driven_with_policy(
        years: &TimeAxis,
        stock: &[f64],
        lifetime: &LifetimeSpec,
        policy: NegativeInflowPolicy,
    ) -> DsmResult<Self> {
        check_series("stock", stock, years.len())?;
        let lifetime = lifetime.resolve(years.len())?;
        let survival = SurvivalTable::new(years, &lifetime);
        let solution = solve_stock_driven(years, stock, &survival, policy);
        debug!(
            "Built stock-driven model for {}-{} ({} negative inflow years)",
            years[0],
            years[years.len() - 1],
            solution.negative_inflows.len()
        );

        Ok(Self::from_solution(years, solution))
    }

    /// Build a model from the inflow entering service each year
    pub fn inflow_driven(
        years: &TimeAxis,
        inflow: &[f64],
        lifetime: &LifetimeSpec,
    ) -> DsmResult<Self> {
        check_series("inflow", inflow, years.len())?;
        let lifetime = lifetime.resolve(years.len())?;
        let survival = SurvivalTable::new(years, &lifetime);

        Ok(Self::from_solution(
            years,
            solve_inflow_driven(years, inflow, &survival, &lifetime),
        ))
    }

    /// Build a model which evolves an existing stock with no further inflow.
    ///
    /// `initial_stock[c]` is the stock of cohort `c` in year `switch_index - 1`, so it must have
    /// exactly `switch_index` entries. Years before that hold no stock. The appearance of the
    /// initial stock is booked as a negative outflow in year `switch_index - 1`.
    pub fn from_initial_stock(
        years: &TimeAxis,
        initial_stock: &[f64],
        switch_index: usize,
        lifetime: &LifetimeSpec,
    ) -> DsmResult<Self> {
        if !(1..=years.len()).contains(&switch_index) {
            return Err(DsmError::mismatch(
                "switch index (between 1 and the number of years)",
                years.len(),
                switch_index,
            ));
        }
        check_series("initial stock", initial_stock, switch_index)?;

        let lifetime = lifetime.resolve(years.len())?;
        let survival = SurvivalTable::new(years, &lifetime);

        Ok(Self::from_solution(
            years,
            evolve_initial_stock(initial_stock, switch_index, &survival),
        ))
    }

    fn from_solution(years: &TimeAxis, solution: CohortSolution) -> Self {
        Self {
            years: years.clone(),
            stock: solution.stock,
            outflow: solution.outflow,
            inflow: solution.inflow,
            negative_inflows: solution.negative_inflows,
        }
    }

    /// The time axis of the model
    pub fn years(&self) -> &TimeAxis {
        &self.years
    }

    /// Total stock in each year
    pub fn total_stock(&self) -> Vec<f64> {
        (0..self.years.len())
            .map(|year| self.stock.year_total(year))
            .collect()
    }

    /// Inflow in each year
    pub fn total_inflow(&self) -> &[f64] {
        &self.inflow
    }

    /// Total outflow in each year
    pub fn total_outflow(&self) -> Vec<f64> {
        (0..self.years.len())
            .map(|year| self.outflow.year_total(year))
            .collect()
    }

    /// Change in total stock from the previous year (the first entry is the first year's stock)
    pub fn stock_change(&self) -> Vec<f64> {
        let stock = self.total_stock();
        let mut previous = 0.0;
        stock
            .into_iter()
            .map(|current| {
                let change = current - previous;
                previous = current;
                change
            })
            .collect()
    }

    /// The mass-balance residual `ΔS[t] - (I[t] - O[t])` for each year
    pub fn check_balance(&self) -> Vec<f64> {
        self.stock_change()
            .into_iter()
            .zip(&self.inflow)
            .zip(self.total_outflow())
            .map(|((change, inflow), outflow)| change - (inflow - outflow))
            .collect()
    }

    /// Compare the largest balance residual with a tolerance relative to the size of the model.
    ///
    /// The absolute tolerance is `rel_tolerance * max(1, max |S|, max |I|)`.
    pub fn balance_report(&self, rel_tolerance: f64) -> BalanceReport {
        let scale = 1.0_f64
            .max(max_abs(&self.total_stock()))
            .max(max_abs(&self.inflow));

        let (index, max_abs_residual) = self
            .check_balance()
            .into_iter()
            .map(f64::abs)
            .enumerate()
            .fold((0, 0.0), |best, (index, residual)| {
                if residual > best.1 {
                    (index, residual)
                } else {
                    best
                }
            });

        BalanceReport {
            max_abs_residual,
            year: self.years[index],
            tolerance: rel_tolerance * scale,
        }
    }

    /// Stock by year and cohort
    pub fn stock_by_cohort(&self) -> &CohortMatrix {
        &self.stock
    }

    /// Outflow by year and cohort
    pub fn outflow_by_cohort(&self) -> &CohortMatrix {
        &self.outflow
    }

    /// Years in which the stock-driven calculation needed a negative inflow
    pub fn negative_inflows(&self) -> &[NegativeInflow] {
        &self.negative_inflows
    }

    /// The share of the stock in year `year` (an index into the time axis) held by each cohort.
    ///
    /// Returns `year + 1` entries, all zero if there is no stock that year.
    pub fn age_distribution(&self, year: usize) -> Vec<f64> {
        let cohorts = self.stock.cohorts_in_year(year);
        let total: f64 = cohorts.iter().sum();
        if total == 0.0 {
            return vec![0.0; cohorts.len()];
        }

        cohorts.iter().map(|value| value / total).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;
    use rstest::{fixture, rstest};
    use statrs::function::gamma::gamma;

    #[fixture]
    fn years() -> TimeAxis {
        TimeAxis::from_range(2000..=2004).unwrap()
    }

    fn assert_balanced(model: &DynamicStockModel) {
        let report = model.balance_report(1e-9);
        assert!(report.is_within_tolerance(), "{report:?}");
    }

    fn assert_lower_triangular(matrix: &CohortMatrix) {
        for year in 0..matrix.size() {
            assert!(matrix.row(year)[year + 1..].iter().all(|v| *v == 0.0));
        }
    }

    #[rstest]
    fn test_stock_driven_fixed_lifetime(years: TimeAxis) {
        let model = DynamicStockModel::stock_driven(
            &years,
            &[10.0, 10.0, 10.0, 0.0, 0.0],
            &LifetimeSpec::fixed(3.0),
        )
        .unwrap();

        assert_eq!(model.total_inflow(), [10.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(model.total_outflow(), [0.0, 0.0, 0.0, 10.0, 0.0]);
        assert_eq!(model.stock_change(), [10.0, 0.0, 0.0, -10.0, 0.0]);
        assert!(model.check_balance().iter().all(|r| *r == 0.0));
        assert!(model.negative_inflows().is_empty());
    }

    #[rstest]
    fn test_all_zero(years: TimeAxis) {
        let model =
            DynamicStockModel::stock_driven(&years, &[0.0; 5], &LifetimeSpec::normal(2.0, 1.0))
                .unwrap();
        assert!(model.total_stock().iter().all(|v| *v == 0.0));
        assert!(model.total_inflow().iter().all(|v| *v == 0.0));
        assert!(model.total_outflow().iter().all(|v| *v == 0.0));
        assert_eq!(model.age_distribution(3), [0.0; 4]);
    }

    #[test]
    fn test_weibull_steady_state() {
        let years = TimeAxis::from_range(0..=50).unwrap();
        let model =
            DynamicStockModel::inflow_driven(&years, &[1.0; 51], &LifetimeSpec::weibull(3.0, 10.0))
                .unwrap();

        // Mean lifetime plus half a year, as the inception year is counted in full
        let mean_lifetime = 10.0 * gamma(1.0 + 1.0 / 3.0);
        let stock = model.total_stock()[50];
        assert!((stock - (mean_lifetime + 0.5)).abs() < 0.05);
        assert!(model.total_outflow().iter().all(|o| *o >= 0.0));
        assert!(
            model
                .outflow_by_cohort()
                .iter_rows()
                .flatten()
                .all(|o| *o >= 0.0)
        );
        assert_balanced(&model);
    }

    #[rstest]
    #[case(LifetimeSpec::fixed(7.0))]
    #[case(LifetimeSpec::normal(20.0, 6.0))]
    #[case(LifetimeSpec::weibull(3.0, 10.0))]
    #[case(LifetimeSpec::weibull(1.3, 7.0))]
    fn test_inflow_stock_round_trip(#[case] lifetime: LifetimeSpec) {
        // Construction in bursts, with runs of years without any inflow
        let years = TimeAxis::from_range(1940..=2020).unwrap();
        let inflow = (0..81)
            .map(|t| match t % 12 {
                0..=3 => 2.0 + f64::from(t % 5),
                _ => 0.0,
            })
            .collect_vec();

        let inflow_driven = DynamicStockModel::inflow_driven(&years, &inflow, &lifetime).unwrap();
        assert!(inflow_driven.total_outflow().iter().all(|o| *o >= 0.0));
        let stock_driven =
            DynamicStockModel::stock_driven(&years, &inflow_driven.total_stock(), &lifetime)
                .unwrap();

        assert!(stock_driven.negative_inflows().is_empty());
        for (actual, expected) in stock_driven.total_inflow().iter().zip(&inflow) {
            assert_approx_eq!(f64, *actual, *expected, epsilon = 1e-9);
        }
        for (actual, expected) in stock_driven
            .total_outflow()
            .iter()
            .zip(inflow_driven.total_outflow())
        {
            assert_approx_eq!(f64, *actual, expected, epsilon = 1e-9);
        }
        assert_balanced(&stock_driven);
    }

    #[rstest]
    #[case(LifetimeSpec::fixed(7.0))]
    #[case(LifetimeSpec::normal(8.0, 2.0))]
    #[case(LifetimeSpec::weibull(2.0, 9.0))]
    fn test_stock_inflow_round_trip(#[case] lifetime: LifetimeSpec) {
        let years = TimeAxis::from_range(1990..=2019).unwrap();
        let stock = (0..30).map(|t| 100.0 + 10.0 * f64::from(t)).collect_vec();

        let stock_driven = DynamicStockModel::stock_driven(&years, &stock, &lifetime).unwrap();
        assert!(stock_driven.negative_inflows().is_empty());
        let inflow_driven =
            DynamicStockModel::inflow_driven(&years, stock_driven.total_inflow(), &lifetime)
                .unwrap();

        for (actual, expected) in inflow_driven.total_stock().iter().zip(&stock) {
            assert_approx_eq!(f64, *actual, *expected, epsilon = 1e-9);
        }
        assert_balanced(&stock_driven);
        assert_balanced(&inflow_driven);
    }

    #[rstest]
    #[case(NegativeInflowPolicy::ProRata)]
    #[case(NegativeInflowPolicy::OldestFirst)]
    fn test_corrected_inflow_non_negative(#[case] policy: NegativeInflowPolicy) {
        let years = TimeAxis::from_range(2000..=2009).unwrap();
        let stock = [10.0, 20.0, 15.0, 15.0, 5.0, 30.0, 8.0, 8.0, 0.0, 12.0];
        let model = DynamicStockModel::stock_driven_with_policy(
            &years,
            &stock,
            &LifetimeSpec::normal(6.0, 2.0),
            policy,
        )
        .unwrap();

        assert!(model.total_inflow().iter().all(|i| *i >= 0.0));
        assert!(!model.negative_inflows().is_empty());
        assert!(model.negative_inflows().iter().all(|n| n.corrected));
        for (actual, expected) in model.total_stock().iter().zip(stock) {
            assert_approx_eq!(f64, *actual, expected, epsilon = 1e-9);
        }
        assert_balanced(&model);
    }

    #[test]
    fn test_negative_inflow_disabled() {
        let years = TimeAxis::from_range(2000..=2003).unwrap();
        let model = DynamicStockModel::stock_driven_with_policy(
            &years,
            &[10.0, 20.0, 15.0, 15.0],
            &LifetimeSpec::fixed(10.0),
            NegativeInflowPolicy::Disabled,
        )
        .unwrap();

        assert_eq!(model.total_inflow(), [10.0, 10.0, -5.0, 0.0]);
        assert_eq!(model.negative_inflows()[0].year, 2002);
        assert!(!model.negative_inflows()[0].corrected);
        assert_balanced(&model);
    }

    #[rstest]
    fn test_lower_triangular(years: TimeAxis) {
        let lifetime = LifetimeSpec::weibull(1.5, 3.0);
        let models = [
            DynamicStockModel::stock_driven(&years, &[1.0, 3.0, 2.0, 2.0, 4.0], &lifetime),
            DynamicStockModel::inflow_driven(&years, &[1.0, 0.5, 0.0, 2.0, 1.0], &lifetime),
            DynamicStockModel::from_initial_stock(&years, &[1.0, 2.0, 3.0], 3, &lifetime),
        ];

        for model in models {
            let model = model.unwrap();
            assert_lower_triangular(model.stock_by_cohort());
            assert_lower_triangular(model.outflow_by_cohort());
            assert_balanced(&model);
        }
    }

    #[rstest]
    fn test_from_initial_stock(years: TimeAxis) {
        let model = DynamicStockModel::from_initial_stock(
            &years,
            &[1.0, 2.0, 4.0],
            3,
            &LifetimeSpec::fixed(3.0),
        )
        .unwrap();

        assert_eq!(model.total_stock(), [0.0, 0.0, 7.0, 6.0, 4.0]);
        assert!(model.total_inflow().iter().all(|i| *i == 0.0));
        // The seeded stock appears as negative outflow
        assert_eq!(model.total_outflow(), [0.0, 0.0, -7.0, 1.0, 2.0]);
        assert_balanced(&model);
    }

    #[rstest]
    fn test_from_initial_stock_whole_axis(years: TimeAxis) {
        let model = DynamicStockModel::from_initial_stock(
            &years,
            &[1.0; 5],
            5,
            &LifetimeSpec::fixed(3.0),
        )
        .unwrap();
        assert_eq!(model.total_stock(), [0.0, 0.0, 0.0, 0.0, 5.0]);
    }

    #[rstest]
    fn test_age_distribution(years: TimeAxis) {
        let model = DynamicStockModel::inflow_driven(
            &years,
            &[1.0, 1.0, 2.0, 0.0, 0.0],
            &LifetimeSpec::fixed(10.0),
        )
        .unwrap();
        assert_eq!(model.age_distribution(2), [0.25, 0.25, 0.5]);
        assert_approx_eq!(f64, model.age_distribution(4).iter().sum::<f64>(), 1.0);
    }

    #[rstest]
    fn test_series_dimension_mismatch(years: TimeAxis) {
        let lifetime = LifetimeSpec::fixed(3.0);
        assert_eq!(
            DynamicStockModel::stock_driven(&years, &[1.0; 4], &lifetime).unwrap_err(),
            DsmError::DimensionMismatch {
                what: "stock".into(),
                expected: 5,
                found: 4
            }
        );
        assert!(matches!(
            DynamicStockModel::inflow_driven(&years, &[1.0; 6], &lifetime),
            Err(DsmError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            DynamicStockModel::from_initial_stock(&years, &[1.0; 2], 3, &lifetime),
            Err(DsmError::DimensionMismatch { .. })
        ));
    }

    #[rstest]
    #[case(0)]
    #[case(6)]
    fn test_switch_index_out_of_range(years: TimeAxis, #[case] switch_index: usize) {
        let initial_stock = vec![1.0; switch_index];
        assert!(matches!(
            DynamicStockModel::from_initial_stock(
                &years,
                &initial_stock,
                switch_index,
                &LifetimeSpec::fixed(3.0)
            ),
            Err(DsmError::DimensionMismatch { .. })
        ));
    }

    #[rstest]
    #[case([1.0, -1.0, 1.0, 1.0, 1.0])]
    #[case([1.0, 1.0, f64::NAN, 1.0, 1.0])]
    #[case([1.0, 1.0, 1.0, f64::INFINITY, 1.0])]
    fn test_invalid_driving_values(years: TimeAxis, #[case] values: [f64; 5]) {
        let lifetime = LifetimeSpec::fixed(3.0);
        assert!(matches!(
            DynamicStockModel::stock_driven(&years, &values, &lifetime),
            Err(DsmError::InvalidParameter { .. })
        ));
        assert!(matches!(
            DynamicStockModel::inflow_driven(&years, &values, &lifetime),
            Err(DsmError::InvalidParameter { .. })
        ));
    }

    #[rstest]
    fn test_invalid_lifetime(years: TimeAxis) {
        assert!(matches!(
            DynamicStockModel::stock_driven(&years, &[1.0; 5], &LifetimeSpec::weibull(-1.0, 3.0)),
            Err(DsmError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_balance_report() {
        let years = TimeAxis::from_range(2000..=2001).unwrap();
        let model =
            DynamicStockModel::inflow_driven(&years, &[4.0, 0.0], &LifetimeSpec::fixed(1.0))
                .unwrap();
        let report = model.balance_report(0.5);
        assert_eq!(report.tolerance, 2.0);
        assert!(report.is_within_tolerance());

        let report = BalanceReport {
            max_abs_residual: 2.0,
            year: 2000,
            tolerance: 1.0,
        };
        assert!(!report.is_within_tolerance());
    }

    #[test]
    fn test_model_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DynamicStockModel>();
    }
}
