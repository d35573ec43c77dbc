use crate::error::ExtractionError;
use crate::tensor::{extract_triples, EdgeIndex};
use kgprep_core::model::{Split, Triple};
use serde::Deserialize;

/// Keeps the edges whose mask entry is `true`, in their original order.
pub fn select_edges(
    edge_index: &EdgeIndex,
    edge_types: &[u64],
    mask: &[bool],
) -> Result<(EdgeIndex, Vec<u64>), ExtractionError> {
    if mask.len() != edge_index.len() {
        return Err(ExtractionError::LengthMismatch {
            mask: mask.len(),
            edges: edge_index.len(),
        });
    }
    if edge_types.len() != edge_index.len() {
        return Err(ExtractionError::ShapeMismatch {
            edges: edge_index.len(),
            types: edge_types.len(),
        });
    }

    let selected = mask.iter().filter(|&&keep| keep).count();
    let mut index = EdgeIndex::with_capacity(selected);
    let mut types = Vec::with_capacity(selected);

    for (pos, _) in mask.iter().enumerate().filter(|&(_, &keep)| keep) {
        index.push(edge_index.heads()[pos], edge_index.tails()[pos]);
        types.push(edge_types[pos]);
    }

    Ok((index, types))
}

pub fn split_triples(
    edge_index: &EdgeIndex,
    edge_types: &[u64],
    mask: &[bool],
) -> Result<Vec<Triple>, ExtractionError> {
    let (index, types) = select_edges(edge_index, edge_types, mask)?;
    extract_triples(&index, &types)
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SplitMasks {
    #[serde(rename = "train_mask")]
    pub train: Vec<bool>,
    #[serde(rename = "val_mask")]
    pub validation: Vec<bool>,
    #[serde(rename = "test_mask")]
    pub test: Vec<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskReport {
    pub train: usize,
    pub validation: usize,
    pub test: usize,
    /// Edges that belong to no split.
    pub uncovered: usize,
    /// First edge claimed by two splits, if any.
    pub overlap: Option<(Split, Split, usize)>,
}

impl SplitMasks {
    pub fn get(&self, split: Split) -> &[bool] {
        match split {
            Split::Train => &self.train,
            Split::Validation => &self.validation,
            Split::Test => &self.test,
        }
    }

    /// Counts members per split and looks for edges that fall in no split or
    /// in more than one.
    pub fn check(&self, edge_count: usize) -> Result<MaskReport, ExtractionError> {
        for split in Split::ALL {
            let len = self.get(split).len();
            if len != edge_count {
                return Err(ExtractionError::LengthMismatch {
                    mask: len,
                    edges: edge_count,
                });
            }
        }

        let mut report = MaskReport {
            train: 0,
            validation: 0,
            test: 0,
            uncovered: 0,
            overlap: None,
        };

        for pos in 0..edge_count {
            let mut owner: Option<Split> = None;
            for split in Split::ALL {
                if !self.get(split)[pos] {
                    continue;
                }
                match split {
                    Split::Train => report.train += 1,
                    Split::Validation => report.validation += 1,
                    Split::Test => report.test += 1,
                }
                match owner {
                    Some(first) if report.overlap.is_none() => {
                        report.overlap = Some((first, split, pos));
                    }
                    Some(_) => {}
                    None => owner = Some(split),
                }
            }
            if owner.is_none() {
                report.uncovered += 1;
            }
        }

        Ok(report)
    }
}
