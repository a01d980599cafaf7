//! The age structure of the floor area stock, binned for comparison with building surveys.
use crate::stock::DynamicStockModel;

/// Share of the stock in a survey year whose age falls in `min_age..=max_age`
#[derive(Debug, Clone, PartialEq)]
pub struct AgeBin {
    /// The survey year
    pub year: u32,
    /// Youngest age in the bin
    pub min_age: u32,
    /// Oldest age in the bin
    pub max_age: u32,
    /// Share of the year's stock in the bin
    pub share: f64,
}

/// Bin the cohorts standing in `year_index` by age, `bin_width` years to a bin.
///
/// Bins start at age zero and run up to the oldest cohort on the time axis. Shares are all zero if
/// there is no stock in that year.
pub fn binned_age_distribution(
    dsm: &DynamicStockModel,
    year_index: usize,
    bin_width: u32,
) -> Vec<AgeBin> {
    let years = dsm.years();
    let oldest = years.age(year_index, 0);
    let mut bins: Vec<_> = (0..=oldest / bin_width)
        .map(|bin| AgeBin {
            year: years[year_index],
            min_age: bin * bin_width,
            max_age: (bin + 1) * bin_width - 1,
            share: 0.0,
        })
        .collect();

    for (cohort, share) in dsm.age_distribution(year_index).into_iter().enumerate() {
        let age = years.age(year_index, cohort);
        bins[(age / bin_width) as usize].share += share;
    }

    bins
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stock::{LifetimeSpec, TimeAxis};
    use float_cmp::assert_approx_eq;
    use itertools::Itertools;

    #[test]
    fn test_binned_age_distribution() {
        let years = TimeAxis::from_range(2000..=2010).unwrap();
        let mut inflow = [0.0; 11];
        inflow[0] = 2.0; // age 10 in 2010
        inflow[4] = 1.0; // age 6
        inflow[8] = 1.0; // age 2
        let dsm =
            DynamicStockModel::inflow_driven(&years, &inflow, &LifetimeSpec::fixed(50.0)).unwrap();

        let bins = binned_age_distribution(&dsm, 10, 5);
        assert_eq!(
            bins.iter().map(|bin| (bin.min_age, bin.max_age)).collect_vec(),
            [(0, 4), (5, 9), (10, 14)]
        );
        assert!(bins.iter().all(|bin| bin.year == 2010));
        assert_eq!(bins.iter().map(|bin| bin.share).collect_vec(), [0.25, 0.25, 0.5]);
    }

    #[test]
    fn test_binned_age_distribution_demolished() {
        // Only the young cohort survives a 5-year lifetime
        let years = TimeAxis::from_range(2000..=2010).unwrap();
        let mut inflow = [0.0; 11];
        inflow[0] = 3.0;
        inflow[9] = 1.0;
        let dsm =
            DynamicStockModel::inflow_driven(&years, &inflow, &LifetimeSpec::fixed(5.0)).unwrap();

        let bins = binned_age_distribution(&dsm, 10, 10);
        assert_eq!(bins.len(), 2);
        assert_approx_eq!(f64, bins[0].share, 1.0);
        assert_eq!(bins[1].share, 0.0);

        let bins = binned_age_distribution(&dsm, 5, 10);
        assert_eq!(bins.iter().map(|bin| bin.share).collect_vec(), [0.0]);
    }
}
