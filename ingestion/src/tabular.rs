use crate::error::ExtractionError;
use kgprep_core::model::{Term, Triple};

pub const FIELD_ORDER: [&str; 3] = ["head", "relation", "tail"];

/// One row of a pre-split table, as an ordered list of named fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabularRecord {
    fields: Vec<(String, Term)>,
}

impl TabularRecord {
    pub fn new(head: impl Into<Term>, relation: impl Into<Term>, tail: impl Into<Term>) -> Self {
        let values = [head.into(), relation.into(), tail.into()];
        Self {
            fields: FIELD_ORDER
                .iter()
                .zip(values)
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
        }
    }

    pub fn from_fields(fields: Vec<(String, Term)>) -> Self {
        Self { fields }
    }

    /// Positional columns get the standard `head`, `relation`, `tail` names;
    /// extra columns are kept as `col<N>` so the record is still rejected.
    pub fn from_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields = columns
            .into_iter()
            .enumerate()
            .map(|(i, value)| {
                let name = FIELD_ORDER
                    .get(i)
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| format!("col{}", i));
                (name, Term::Label(value.into()))
            })
            .collect();
        Self { fields }
    }

    pub fn fields(&self) -> &[(String, Term)] {
        &self.fields
    }
}

/// Projects every record onto its three fields in order. Record order is kept.
pub fn records_to_triples(records: &[TabularRecord]) -> Result<Vec<Triple>, ExtractionError> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| match record.fields.as_slice() {
            [(_, head), (_, relation), (_, tail)] => Ok(Triple {
                head: head.clone(),
                relation: relation.clone(),
                tail: tail.clone(),
            }),
            other => Err(ExtractionError::MalformedRecord {
                index,
                fields: other.len(),
            }),
        })
        .collect()
}
