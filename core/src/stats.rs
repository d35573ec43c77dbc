use crate::error::{ErrorCode, KgprepError};
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SummaryError {
    #[error("no relations to summarize")]
    EmptyDataset,
}

impl KgprepError for SummaryError {
    fn error_code(&self) -> ErrorCode {
        match self {
            SummaryError::EmptyDataset => ErrorCode::NotFound,
        }
    }
}

/// Relation-frequency profile of a whole (unsplit) dataset.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RelationSummary {
    pub num_nodes: u64,
    pub num_edges: u64,
    pub unique_relations: usize,
    pub min_occurrence: u64,
    pub max_occurrence: u64,
    pub mean_occurrence: f64,
    pub median_occurrence: f64,
}

/// Count how often every relation occurs and reduce the counts to
/// min/max/mean/median. `num_edges` is the number of relation entries seen.
pub fn summarize<T, I>(relations: I, num_nodes: u64) -> Result<RelationSummary, SummaryError>
where
    T: Eq + Hash,
    I: IntoIterator<Item = T>,
{
    let mut counts: HashMap<T, u64> = HashMap::new();
    let mut num_edges = 0u64;
    for relation in relations {
        *counts.entry(relation).or_insert(0) += 1;
        num_edges += 1;
    }

    if counts.is_empty() {
        return Err(SummaryError::EmptyDataset);
    }

    let mut sorted: Vec<u64> = counts.into_values().collect();
    sorted.sort_unstable();

    let unique_relations = sorted.len();
    let mean_occurrence = num_edges as f64 / unique_relations as f64;

    Ok(RelationSummary {
        num_nodes,
        num_edges,
        unique_relations,
        min_occurrence: sorted[0],
        max_occurrence: sorted[unique_relations - 1],
        mean_occurrence,
        median_occurrence: median(&sorted),
    })
}

fn median(sorted: &[u64]) -> f64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] as f64 + sorted[mid] as f64) / 2.0
    } else {
        sorted[mid] as f64
    }
}

impl fmt::Display for RelationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Number of nodes: {}", self.num_nodes)?;
        writeln!(f, "Number of edges: {}", self.num_edges)?;
        writeln!(f, "Unique relations: {}", self.unique_relations)?;
        writeln!(f, "Min relation occurrence: {}", self.min_occurrence)?;
        writeln!(f, "Max relation occurrence: {}", self.max_occurrence)?;
        writeln!(f, "Mean relation occurrence: {:.2}", self.mean_occurrence)?;
        write!(f, "Median relation occurrence: {:.1}", self.median_occurrence)
    }
}
