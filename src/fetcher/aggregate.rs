//! Aggregation of independent failures
//!
//! A page capture keeps going when a single asset fails. Every failure is
//! collected here and reported together once all work has settled.

use crate::FetchError;
use std::fmt;

/// Every failure recorded during one page capture
#[derive(Debug, Default)]
pub struct AggregateError {
    errors: Vec<FetchError>,
}

impl AggregateError {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: FetchError) {
        self.errors.push(error);
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FetchError> {
        self.errors.iter()
    }

    pub fn errors(&self) -> &[FetchError] {
        &self.errors
    }

    /// Returns `Ok(())` when nothing failed, otherwise the aggregate as an error
    pub fn into_result(self) -> Result<(), FetchError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(FetchError::Partial(self))
        }
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.len() {
            1 => write!(f, "1 error occurred:")?,
            n => write!(f, "{} errors occurred:", n)?,
        }
        for error in &self.errors {
            write!(f, "\n\t* {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateError {}

impl FromIterator<FetchError> for AggregateError {
    fn from_iter<I: IntoIterator<Item = FetchError>>(iter: I) -> Self {
        Self {
            errors: iter.into_iter().collect(),
        }
    }
}

impl Extend<FetchError> for AggregateError {
    fn extend<I: IntoIterator<Item = FetchError>>(&mut self, iter: I) {
        self.errors.extend(iter);
    }
}

impl IntoIterator for AggregateError {
    type Item = FetchError;
    type IntoIter = std::vec::IntoIter<FetchError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a AggregateError {
    type Item = &'a FetchError;
    type IntoIter = std::slice::Iter<'a, FetchError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}
