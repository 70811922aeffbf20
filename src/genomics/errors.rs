use crate::NeuronId;

use std::error::Error;
use std::fmt;

/// An error type indicating a mutation operator had no legal
/// target in the genome it was applied to.
///
/// These are recoverable: the random-mutation driver retries with
/// fresh draws, and ultimately accepts the unchanged genome.
#[derive(Debug, PartialEq, Eq)]
pub enum MutationError {
    /// The genome has no genes to operate on.
    NoGenes,
    /// No gene is enabled, so there is nothing to split.
    NoEnabledGene,
    /// No gene is disabled, so there is nothing to re-enable.
    NoDisabledGene,
    /// The chosen link already exists in the genome.
    LinkAlreadyExists(NeuronId, NeuronId),
    /// The chosen gene was already split once; applying the recorded
    /// split again would duplicate innovation numbers in the genome.
    SplitAlreadyApplied(NeuronId, NeuronId),
}

impl fmt::Display for MutationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoGenes => write!(f, "mutation on genome without genes"),
            Self::NoEnabledGene => write!(f, "neuron mutation on genome without enabled genes"),
            Self::NoDisabledGene => {
                write!(f, "re-enable mutation on genome without disabled genes")
            }
            Self::LinkAlreadyExists(from, to) => {
                write!(f, "link mutation duplicating existing link {} -> {}", from, to)
            }
            Self::SplitAlreadyApplied(from, to) => {
                write!(f, "neuron mutation re-splitting link {} -> {}", from, to)
            }
        }
    }
}

impl Error for MutationError {}
