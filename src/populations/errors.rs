use std::error::Error;
use std::fmt;

/// An error type indicating a failure to allot offspring across
/// species.
#[derive(Debug, PartialEq, Eq)]
pub enum OffspringAllotmentError {
    /// The total adjusted fitness is not positive, so proportional
    /// allocation is undefined (e.g. every genome scored zero).
    DegeneratePopulation,
}

impl fmt::Display for OffspringAllotmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DegeneratePopulation => {
                write!(f, "total adjusted fitness is not positive; cannot allot offspring")
            }
        }
    }
}

impl Error for OffspringAllotmentError {}
