use crate::error::{ExtractionError, PipelineError};
use crate::files::{JsonMaskedSource, JsonPreSplitSource, TsvTabularSource};
use crate::mask::split_triples;
use crate::source::{
    MaskedTensorDataset, MaskedTensorSource, PreSplitTensorDataset, PreSplitTensorSource,
    TabularDataset, TabularSource,
};
use crate::tabular::records_to_triples;
use crate::tensor::{extract_triples, EdgeIndex};
use kgprep_core::config::{DatasetConfig, PipelineConfig, SourceKind};
use kgprep_core::model::{Split, Term, Triple};
use kgprep_core::stats::{summarize, RelationSummary, SummaryError};
use std::collections::HashSet;
use storage::cache::{CacheError, SaveOutcome, SplitCache};
use tracing::{error, info, warn};

/// Triples of all three splits of one dataset plus its diagnostics.
#[derive(Debug)]
pub struct PreparedDataset {
    pub name: String,
    pub train: Vec<Triple>,
    pub validation: Vec<Triple>,
    pub test: Vec<Triple>,
    /// `[2, E]` of the full edge index, for masked tensor sources.
    pub edge_index_shape: Option<[usize; 2]>,
    pub summary: Result<RelationSummary, SummaryError>,
}

impl PreparedDataset {
    pub fn split(&self, split: Split) -> &[Triple] {
        match split {
            Split::Train => &self.train,
            Split::Validation => &self.validation,
            Split::Test => &self.test,
        }
    }
}

pub fn prepare_masked(
    name: &str,
    data: MaskedTensorDataset,
    strict_masks: bool,
) -> Result<PreparedDataset, PipelineError> {
    let edge_index =
        EdgeIndex::from_rows(data.edge_index).map_err(|e| PipelineError::dataset(name, e))?;

    let mut splits = Vec::with_capacity(3);
    for split in Split::ALL {
        let triples = split_triples(&edge_index, &data.edge_type, data.masks.get(split))
            .map_err(|e| PipelineError::split(name, split, e))?;
        splits.push(triples);
    }

    let report = data
        .masks
        .check(edge_index.len())
        .map_err(|e| PipelineError::dataset(name, e))?;
    if report.uncovered > 0 {
        warn!(
            dataset = name,
            uncovered = report.uncovered,
            edges = edge_index.len(),
            "edges outside every split mask"
        );
    }
    if let Some((first, second, position)) = report.overlap {
        if strict_masks {
            return Err(PipelineError::dataset(
                name,
                ExtractionError::OverlappingMasks {
                    first,
                    second,
                    position,
                },
            ));
        }
        warn!(dataset = name, %first, %second, position, "split masks overlap");
    }

    let summary = summarize(data.edge_type.iter().copied(), data.num_nodes);
    let mut splits = splits.into_iter();

    Ok(PreparedDataset {
        name: name.to_string(),
        train: splits.next().unwrap_or_default(),
        validation: splits.next().unwrap_or_default(),
        test: splits.next().unwrap_or_default(),
        edge_index_shape: Some(edge_index.shape()),
        summary,
    })
}

pub fn prepare_pre_split(
    name: &str,
    data: PreSplitTensorDataset,
) -> Result<PreparedDataset, PipelineError> {
    let mut splits = Vec::with_capacity(3);
    for split in Split::ALL {
        let part = data.get(split);
        let edge_index = EdgeIndex::from_rows(part.edge_index.clone())
            .map_err(|e| PipelineError::split(name, split, e))?;
        let triples = extract_triples(&edge_index, &part.edge_type)
            .map_err(|e| PipelineError::split(name, split, e))?;
        splits.push(triples);
    }

    let num_nodes = Split::ALL
        .iter()
        .map(|&split| data.get(split).num_nodes)
        .max()
        .unwrap_or(0);
    let relations = Split::ALL
        .iter()
        .flat_map(|&split| data.get(split).edge_type.iter().copied());
    let summary = summarize(relations, num_nodes);
    let mut splits = splits.into_iter();

    Ok(PreparedDataset {
        name: name.to_string(),
        train: splits.next().unwrap_or_default(),
        validation: splits.next().unwrap_or_default(),
        test: splits.next().unwrap_or_default(),
        edge_index_shape: None,
        summary,
    })
}

pub fn prepare_tabular(name: &str, data: TabularDataset) -> Result<PreparedDataset, PipelineError> {
    let mut splits = Vec::with_capacity(3);
    for split in Split::ALL {
        let triples =
            records_to_triples(data.get(split)).map_err(|e| PipelineError::split(name, split, e))?;
        splits.push(triples);
    }

    let num_nodes = splits
        .iter()
        .flatten()
        .flat_map(|t| [&t.head, &t.tail])
        .collect::<HashSet<&Term>>()
        .len() as u64;
    let summary = summarize(splits.iter().flatten().map(|t| &t.relation), num_nodes);
    let mut splits = splits.into_iter();

    Ok(PreparedDataset {
        name: name.to_string(),
        train: splits.next().unwrap_or_default(),
        validation: splits.next().unwrap_or_default(),
        test: splits.next().unwrap_or_default(),
        edge_index_shape: None,
        summary,
    })
}

/// Result of saving one split.
#[derive(Debug)]
pub struct SplitSave {
    pub split: Split,
    pub result: Result<SaveOutcome, CacheError>,
}

#[derive(Debug)]
pub struct DatasetRun {
    pub prepared: PreparedDataset,
    pub saves: Vec<SplitSave>,
}

impl DatasetRun {
    pub fn failed_saves(&self) -> impl Iterator<Item = &SplitSave> {
        self.saves.iter().filter(|s| s.result.is_err())
    }
}

/// Saves every split of `dataset`. A failed save does not stop the others.
pub async fn persist_splits(cache: &SplitCache, dataset: &PreparedDataset) -> Vec<SplitSave> {
    let mut saves = Vec::with_capacity(3);
    for split in Split::ALL {
        let result = cache.save(&dataset.name, split, dataset.split(split)).await;
        if let Err(err) = &result {
            error!(dataset = %dataset.name, %split, error = %err, "failed to cache split");
        }
        saves.push(SplitSave { split, result });
    }
    saves
}

pub fn log_summary(dataset: &PreparedDataset) {
    info!(
        dataset = %dataset.name,
        train = dataset.train.len(),
        valid = dataset.validation.len(),
        test = dataset.test.len(),
        "prepared triples"
    );
    if let Some(shape) = dataset.edge_index_shape {
        info!(dataset = %dataset.name, "Edge index shape: {:?}", shape);
    }
    match &dataset.summary {
        Ok(summary) => info!(dataset = %dataset.name, "relation summary\n{}", summary),
        Err(err) => warn!(dataset = %dataset.name, error = %err, "no relation summary"),
    }
}

/// Runs datasets against one cache, picking the adapter from each
/// dataset's configured `SourceKind`.
pub struct DatasetPipeline {
    cache: SplitCache,
    strict_masks: bool,
}

impl DatasetPipeline {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            cache: SplitCache::new(&config.output_dir),
            strict_masks: config.strict_masks,
        }
    }

    pub fn with_cache(cache: SplitCache, strict_masks: bool) -> Self {
        Self {
            cache,
            strict_masks,
        }
    }

    pub fn cache(&self) -> &SplitCache {
        &self.cache
    }

    pub async fn run(&self, dataset: &DatasetConfig) -> Result<DatasetRun, PipelineError> {
        match dataset.kind {
            SourceKind::MaskedTensor => {
                self.run_masked(&JsonMaskedSource::new(&dataset.name, &dataset.path))
                    .await
            }
            SourceKind::PreSplitTensor => {
                self.run_pre_split(&JsonPreSplitSource::new(&dataset.name, &dataset.path))
                    .await
            }
            SourceKind::Tabular => {
                self.run_tabular(&TsvTabularSource::new(&dataset.name, &dataset.path))
                    .await
            }
        }
    }

    pub async fn run_masked(
        &self,
        source: &dyn MaskedTensorSource,
    ) -> Result<DatasetRun, PipelineError> {
        let data = source.load().await?;
        let prepared = prepare_masked(source.name(), data, self.strict_masks)?;
        Ok(self.finish(prepared).await)
    }

    pub async fn run_pre_split(
        &self,
        source: &dyn PreSplitTensorSource,
    ) -> Result<DatasetRun, PipelineError> {
        let data = source.load().await?;
        let prepared = prepare_pre_split(source.name(), data)?;
        Ok(self.finish(prepared).await)
    }

    pub async fn run_tabular(&self, source: &dyn TabularSource) -> Result<DatasetRun, PipelineError> {
        let data = source.load().await?;
        let prepared = prepare_tabular(source.name(), data)?;
        Ok(self.finish(prepared).await)
    }

    async fn finish(&self, prepared: PreparedDataset) -> DatasetRun {
        log_summary(&prepared);
        let saves = persist_splits(&self.cache, &prepared).await;
        DatasetRun { prepared, saves }
    }
}
