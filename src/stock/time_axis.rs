//! The years covered by a dynamic stock model.
use super::error::{DsmError, DsmResult};
use itertools::Itertools;
use std::ops::{Deref, RangeInclusive};
use std::sync::Arc;

/// An ordered, evenly spaced sequence of years.
///
/// Cheap to clone: every model built on the same axis shares one allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeAxis(Arc<[u32]>);

impl TimeAxis {
    /// Create a time axis, checking that the years are non-empty, increasing and evenly spaced
    pub fn new(years: Vec<u32>) -> DsmResult<Self> {
        if years.is_empty() {
            return Err(DsmError::invalid("time axis must contain at least one year"));
        }

        if !years.iter().tuple_windows().all(|(a, b)| a < b) {
            return Err(DsmError::invalid(
                "years in time axis must be strictly increasing",
            ));
        }

        if !years.iter().tuple_windows().map(|(a, b)| b - a).all_equal() {
            return Err(DsmError::invalid("years in time axis must be evenly spaced"));
        }

        Ok(Self(years.into()))
    }

    /// A time axis with one entry for every year in `range`
    pub fn from_range(range: RangeInclusive<u32>) -> DsmResult<Self> {
        Self::new(range.collect())
    }

    /// The years as a slice
    pub fn years(&self) -> &[u32] {
        &self.0
    }

    /// The age of cohort `cohort` in year `year` (both indices into the axis)
    pub fn age(&self, year: usize, cohort: usize) -> u32 {
        self.0[year] - self.0[cohort]
    }

    /// The index of a calendar year, if it is on the axis
    pub fn position(&self, year: u32) -> Option<usize> {
        self.0.binary_search(&year).ok()
    }

    /// The axis starting at index `start`
    pub fn tail(&self, start: usize) -> DsmResult<Self> {
        if start >= self.0.len() {
            return Err(DsmError::mismatch("time axis tail", self.0.len(), start));
        }

        Ok(Self(self.0[start..].into()))
    }
}

impl Deref for TimeAxis {
    type Target = [u32];

    fn deref(&self) -> &[u32] {
        &self.0
    }
}
