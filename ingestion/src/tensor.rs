use crate::error::ExtractionError;
use kgprep_core::model::{Term, Triple};

/// Dense `[2, E]` edge index: row 0 holds heads, row 1 holds tails.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EdgeIndex {
    heads: Vec<u64>,
    tails: Vec<u64>,
}

impl EdgeIndex {
    pub fn new(heads: Vec<u64>, tails: Vec<u64>) -> Result<Self, ExtractionError> {
        if heads.len() != tails.len() {
            return Err(ExtractionError::InvalidEdgeIndexShape(vec![
                heads.len(),
                tails.len(),
            ]));
        }
        Ok(Self { heads, tails })
    }

    /// Builds from the nested-list form `[[heads...], [tails...]]`.
    pub fn from_rows(rows: Vec<Vec<u64>>) -> Result<Self, ExtractionError> {
        let shape: Vec<usize> = rows.iter().map(Vec::len).collect();
        let mut rows = rows.into_iter();
        match (rows.next(), rows.next(), rows.next()) {
            (Some(heads), Some(tails), None) if heads.len() == tails.len() => {
                Ok(Self { heads, tails })
            }
            _ => Err(ExtractionError::InvalidEdgeIndexShape(shape)),
        }
    }

    /// Builds from a row-major buffer with an explicit `[rows, cols]` shape.
    pub fn from_dense(shape: [usize; 2], data: Vec<u64>) -> Result<Self, ExtractionError> {
        let [rows, cols] = shape;
        if rows != 2 || rows.checked_mul(cols) != Some(data.len()) {
            return Err(ExtractionError::InvalidEdgeIndexShape(vec![
                rows,
                cols,
                data.len(),
            ]));
        }
        let mut heads = data;
        let tails = heads.split_off(cols);
        Ok(Self { heads, tails })
    }

    pub fn len(&self) -> usize {
        self.heads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heads.is_empty()
    }

    pub fn shape(&self) -> [usize; 2] {
        [2, self.len()]
    }

    pub fn heads(&self) -> &[u64] {
        &self.heads
    }

    pub fn tails(&self) -> &[u64] {
        &self.tails
    }

    pub(crate) fn push(&mut self, head: u64, tail: u64) {
        self.heads.push(head);
        self.tails.push(tail);
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            heads: Vec::with_capacity(capacity),
            tails: Vec::with_capacity(capacity),
        }
    }
}

/// Zips an edge index with its edge types into `(head, relation, tail)`
/// triples, one per edge, in edge order.
pub fn extract_triples(
    edge_index: &EdgeIndex,
    edge_types: &[u64],
) -> Result<Vec<Triple>, ExtractionError> {
    if edge_index.len() != edge_types.len() {
        return Err(ExtractionError::ShapeMismatch {
            edges: edge_index.len(),
            types: edge_types.len(),
        });
    }

    Ok(edge_index
        .heads
        .iter()
        .zip(edge_types)
        .zip(&edge_index.tails)
        .map(|((&head, &relation), &tail)| Triple {
            head: Term::Id(head),
            relation: Term::Id(relation),
            tail: Term::Id(tail),
        })
        .collect())
}
