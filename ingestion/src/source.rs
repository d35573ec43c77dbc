use crate::error::SourceError;
use crate::mask::SplitMasks;
use crate::tabular::TabularRecord;
use kgprep_core::model::Split;
use serde::Deserialize;

/// Edge tensors of one graph object: `edge_index` is `[[heads], [tails]]`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EdgeTensors {
    pub num_nodes: u64,
    pub edge_index: Vec<Vec<u64>>,
    pub edge_type: Vec<u64>,
}

/// A single graph whose edges are assigned to splits by boolean masks
/// (WN18, WN18RR).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MaskedTensorDataset {
    pub num_nodes: u64,
    pub edge_index: Vec<Vec<u64>>,
    pub edge_type: Vec<u64>,
    #[serde(flatten)]
    pub masks: SplitMasks,
}

/// Three independently loaded graphs, one per split (FB15k-237).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreSplitTensorDataset {
    pub train: EdgeTensors,
    pub validation: EdgeTensors,
    pub test: EdgeTensors,
}

impl PreSplitTensorDataset {
    pub fn get(&self, split: Split) -> &EdgeTensors {
        match split {
            Split::Train => &self.train,
            Split::Validation => &self.validation,
            Split::Test => &self.test,
        }
    }
}

/// Three tables of head/relation/tail rows (YAGO3-10).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabularDataset {
    pub train: Vec<TabularRecord>,
    pub validation: Vec<TabularRecord>,
    pub test: Vec<TabularRecord>,
}

impl TabularDataset {
    pub fn get(&self, split: Split) -> &[TabularRecord] {
        match split {
            Split::Train => &self.train,
            Split::Validation => &self.validation,
            Split::Test => &self.test,
        }
    }
}

#[async_trait::async_trait]
pub trait MaskedTensorSource: Send + Sync {
    fn name(&self) -> &str;
    async fn load(&self) -> Result<MaskedTensorDataset, SourceError>;
}

#[async_trait::async_trait]
pub trait PreSplitTensorSource: Send + Sync {
    fn name(&self) -> &str;
    async fn load(&self) -> Result<PreSplitTensorDataset, SourceError>;
}

#[async_trait::async_trait]
pub trait TabularSource: Send + Sync {
    fn name(&self) -> &str;
    async fn load(&self) -> Result<TabularDataset, SourceError>;
}
