//! Sources that read datasets exported to local files.
//!
//! - masked tensors: one JSON document with `num_nodes`, `edge_index`,
//!   `edge_type`, `train_mask`, `val_mask`, `test_mask`
//! - pre-split tensors: `train.json`, `valid.json`, `test.json`, each with
//!   `num_nodes`, `edge_index`, `edge_type`
//! - tables: `train.txt`, `valid.txt`, `test.txt`, tab separated, no header

use crate::error::SourceError;
use crate::source::{
    EdgeTensors, MaskedTensorDataset, MaskedTensorSource, PreSplitTensorDataset,
    PreSplitTensorSource, TabularDataset, TabularSource,
};
use crate::tabular::TabularRecord;
use kgprep_core::model::Split;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

async fn read_json<T: DeserializeOwned>(dataset: &str, path: &Path) -> Result<T, SourceError> {
    let bytes = fs::read(path)
        .await
        .map_err(|e| SourceError::unavailable(dataset, format!("{}: {}", path.display(), e)))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| SourceError::unavailable(dataset, format!("{}: {}", path.display(), e)))
}

pub struct JsonMaskedSource {
    name: String,
    path: PathBuf,
}

impl JsonMaskedSource {
    pub fn new(name: impl Into<String>, path: impl AsRef<Path>) -> Self {
        Self {
            name: name.into(),
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait::async_trait]
impl MaskedTensorSource for JsonMaskedSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load(&self) -> Result<MaskedTensorDataset, SourceError> {
        debug!(dataset = %self.name, path = %self.path.display(), "loading masked tensors");
        read_json(&self.name, &self.path).await
    }
}

pub struct JsonPreSplitSource {
    name: String,
    dir: PathBuf,
}

impl JsonPreSplitSource {
    pub fn new(name: impl Into<String>, dir: impl AsRef<Path>) -> Self {
        Self {
            name: name.into(),
            dir: dir.as_ref().to_path_buf(),
        }
    }
}

#[async_trait::async_trait]
impl PreSplitTensorSource for JsonPreSplitSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load(&self) -> Result<PreSplitTensorDataset, SourceError> {
        let mut parts: Vec<EdgeTensors> = Vec::with_capacity(3);
        for split in Split::ALL {
            let path = self.dir.join(format!("{}.json", split));
            debug!(dataset = %self.name, path = %path.display(), "loading split tensors");
            parts.push(read_json(&self.name, &path).await?);
        }
        let mut parts = parts.into_iter();
        match (parts.next(), parts.next(), parts.next()) {
            (Some(train), Some(validation), Some(test)) => Ok(PreSplitTensorDataset {
                train,
                validation,
                test,
            }),
            _ => Err(SourceError::unavailable(&self.name, "missing split tensors")),
        }
    }
}

pub struct TsvTabularSource {
    name: String,
    dir: PathBuf,
}

impl TsvTabularSource {
    pub fn new(name: impl Into<String>, dir: impl AsRef<Path>) -> Self {
        Self {
            name: name.into(),
            dir: dir.as_ref().to_path_buf(),
        }
    }

    async fn read_split(&self, split: Split) -> Result<Vec<TabularRecord>, SourceError> {
        let path = self.dir.join(format!("{}.txt", split));
        debug!(dataset = %self.name, path = %path.display(), "loading split table");
        let bytes = fs::read(&path).await.map_err(|e| {
            SourceError::unavailable(&self.name, format!("{}: {}", path.display(), e))
        })?;
        parse_tsv(&bytes)
            .map_err(|e| SourceError::unavailable(&self.name, format!("{}: {}", path.display(), e)))
    }
}

/// Rows keep whatever column count they have; field-count checks happen when
/// records are turned into triples.
pub fn parse_tsv(bytes: &[u8]) -> Result<Vec<TabularRecord>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(bytes);

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result?;
        records.push(TabularRecord::from_columns(record.iter()));
    }
    Ok(records)
}

#[async_trait::async_trait]
impl TabularSource for TsvTabularSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load(&self) -> Result<TabularDataset, SourceError> {
        Ok(TabularDataset {
            train: self.read_split(Split::Train).await?,
            validation: self.read_split(Split::Validation).await?,
            test: self.read_split(Split::Test).await?,
        })
    }
}
