use ingestion::error::{PipelineError, SourceError};
use ingestion::mask::SplitMasks;
use ingestion::processor::DatasetPipeline;
use ingestion::source::{MaskedTensorDataset, MaskedTensorSource, TabularDataset, TabularSource};
use kgprep_core::config::{AppConfig, DatasetConfig, SourceKind};
use kgprep_core::error::{ErrorCode, KgprepError};
use kgprep_core::model::{Split, Triple};
use std::path::PathBuf;
use storage::cache::{SaveOutcome, SplitCache};
use tempfile::tempdir;

struct StaticMasked(MaskedTensorDataset);

#[async_trait::async_trait]
impl MaskedTensorSource for StaticMasked {
    fn name(&self) -> &str {
        "WN18RR"
    }

    async fn load(&self) -> Result<MaskedTensorDataset, SourceError> {
        Ok(self.0.clone())
    }
}

struct Offline;

#[async_trait::async_trait]
impl TabularSource for Offline {
    fn name(&self) -> &str {
        "YAGO3-10"
    }

    async fn load(&self) -> Result<TabularDataset, SourceError> {
        Err(SourceError::unavailable("YAGO3-10", "connection refused"))
    }
}

fn wn18rr() -> MaskedTensorDataset {
    MaskedTensorDataset {
        num_nodes: 40943,
        edge_index: vec![vec![0, 1, 1, 7], vec![9534, 9788, 40217, 8]],
        edge_type: vec![5, 10, 2, 5],
        masks: SplitMasks {
            train: vec![true, true, false, false],
            validation: vec![false, false, true, false],
            test: vec![false, false, false, true],
        },
    }
}

#[tokio::test]
async fn test_masked_dataset_end_to_end() {
    let dir = tempdir().unwrap();
    let pipeline = DatasetPipeline::with_cache(SplitCache::new(dir.path()), true);

    let run = pipeline.run_masked(&StaticMasked(wn18rr())).await.unwrap();
    assert_eq!(run.failed_saves().count(), 0);
    assert!(run.saves.iter().all(|s| s.result.as_ref().unwrap().was_written()));

    let train = pipeline.cache().load("WN18RR", Split::Train).await.unwrap();
    assert_eq!(
        train,
        vec![
            Triple::new(0u64, 5u64, 9534u64),
            Triple::new(1u64, 10u64, 9788u64)
        ]
    );
    let test = pipeline.cache().load("WN18RR", Split::Test).await.unwrap();
    assert_eq!(test, vec![Triple::new(7u64, 5u64, 8u64)]);

    let summary = run.prepared.summary.unwrap();
    assert_eq!(summary.num_edges, 4);
    assert_eq!(summary.unique_relations, 3);
    assert_eq!(summary.max_occurrence, 2);
}

#[tokio::test]
async fn test_rerun_skips_existing_splits() {
    let dir = tempdir().unwrap();
    let pipeline = DatasetPipeline::with_cache(SplitCache::new(dir.path()), true);

    pipeline.run_masked(&StaticMasked(wn18rr())).await.unwrap();
    let again = pipeline.run_masked(&StaticMasked(wn18rr())).await.unwrap();

    for save in &again.saves {
        assert!(matches!(
            save.result.as_ref().unwrap(),
            SaveOutcome::AlreadyExists { .. }
        ));
    }
}

#[tokio::test]
async fn test_unavailable_source_propagates() {
    let dir = tempdir().unwrap();
    let pipeline = DatasetPipeline::with_cache(SplitCache::new(dir.path()), true);

    let err = pipeline.run_tabular(&Offline).await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Source(SourceError::DatasetUnavailable { .. })
    ));
    assert_eq!(err.error_code(), ErrorCode::Unavailable);
    assert!(err.to_string().contains("YAGO3-10"));
}

#[tokio::test]
async fn test_failed_save_does_not_block_other_splits() {
    let dir = tempdir().unwrap();
    let cache = SplitCache::new(dir.path());
    // A directory squatting on the train staging file makes only that save fail.
    std::fs::create_dir_all(cache.staging_path_for("WN18RR", Split::Train)).unwrap();

    let pipeline = DatasetPipeline::with_cache(cache, true);
    let run = pipeline.run_masked(&StaticMasked(wn18rr())).await.unwrap();

    let failed: Vec<Split> = run.failed_saves().map(|s| s.split).collect();
    assert_eq!(failed, vec![Split::Train]);
    let err = run.saves[0].result.as_ref().unwrap_err();
    assert_eq!(err.error_code(), ErrorCode::Internal);

    let valid = pipeline.cache().load("WN18RR", Split::Validation).await.unwrap();
    assert_eq!(valid, vec![Triple::new(1u64, 2u64, 40217u64)]);
}

#[tokio::test]
async fn test_configured_datasets_use_file_sources() {
    let dir = tempdir().unwrap();
    let raw = dir.path().join("raw");
    std::fs::create_dir_all(raw.join("YAGO3-10")).unwrap();
    std::fs::create_dir_all(raw.join("FB15k-237")).unwrap();

    std::fs::write(
        raw.join("WN18RR.json"),
        r#"{
            "num_nodes": 40943,
            "edge_index": [[0, 1, 1], [9534, 9788, 40217]],
            "edge_type": [5, 10, 2],
            "train_mask": [true, true, false],
            "val_mask": [false, false, true],
            "test_mask": [false, false, false]
        }"#,
    )
    .unwrap();

    for (split, body) in [
        ("train", r#"{"num_nodes": 10, "edge_index": [[0, 1], [2, 3]], "edge_type": [0, 1]}"#),
        ("valid", r#"{"num_nodes": 10, "edge_index": [[4], [5]], "edge_type": [1]}"#),
        ("test", r#"{"num_nodes": 12, "edge_index": [[6], [7]], "edge_type": [0]}"#),
    ] {
        std::fs::write(raw.join("FB15k-237").join(format!("{}.json", split)), body).unwrap();
    }

    std::fs::write(
        raw.join("YAGO3-10/train.txt"),
        "Chatou\tisLocatedIn\tFrance\nLyon\tisLocatedIn\tFrance\n",
    )
    .unwrap();
    std::fs::write(raw.join("YAGO3-10/valid.txt"), "Lyon\tisLocatedIn\tFrance\n").unwrap();
    std::fs::write(raw.join("YAGO3-10/test.txt"), "").unwrap();

    let pipeline = DatasetPipeline::with_cache(SplitCache::new(dir.path().join("triples")), true);

    let datasets = [
        DatasetConfig {
            name: "WN18RR".to_string(),
            kind: SourceKind::MaskedTensor,
            path: raw.join("WN18RR.json"),
        },
        DatasetConfig {
            name: "FB15k-237".to_string(),
            kind: SourceKind::PreSplitTensor,
            path: raw.join("FB15k-237"),
        },
        DatasetConfig {
            name: "YAGO3-10".to_string(),
            kind: SourceKind::Tabular,
            path: raw.join("YAGO3-10"),
        },
    ];

    for dataset in &datasets {
        let run = pipeline.run(dataset).await.unwrap();
        assert_eq!(run.failed_saves().count(), 0, "{}", dataset.name);
    }

    let yago = pipeline.cache().load("YAGO3-10", Split::Train).await.unwrap();
    assert_eq!(yago[0], Triple::new("Chatou", "isLocatedIn", "France"));
    assert!(pipeline
        .cache()
        .load("YAGO3-10", Split::Test)
        .await
        .unwrap()
        .is_empty());

    let fb = pipeline.cache().load("FB15k-237", Split::Validation).await.unwrap();
    assert_eq!(fb, vec![Triple::new(4u64, 1u64, 5u64)]);
}

#[test]
fn test_shipped_config_cache_paths() {
    let cfg = AppConfig::load_from(concat!(env!("CARGO_MANIFEST_DIR"), "/../config")).unwrap();
    let cache = SplitCache::new(&cfg.pipeline.output_dir);

    let paths: Vec<PathBuf> = cfg
        .datasets
        .iter()
        .map(|d| cache.path_for(&d.name, Split::Train))
        .collect();
    assert_eq!(
        paths,
        vec![
            PathBuf::from("data/triples/WN18_triples_train.rkyv"),
            PathBuf::from("data/triples/WN18RR_triples_train.rkyv"),
            PathBuf::from("data/triples/FB15k237_triples_train.rkyv"),
            PathBuf::from("data/triples/YAGO_triples_train.rkyv"),
        ]
    );
}

#[tokio::test]
async fn test_missing_file_is_unavailable() {
    let dir = tempdir().unwrap();
    let pipeline = DatasetPipeline::with_cache(SplitCache::new(dir.path()), true);
    let err = pipeline
        .run(&DatasetConfig {
            name: "WN18".to_string(),
            kind: SourceKind::MaskedTensor,
            path: dir.path().join("nope.json"),
        })
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), ErrorCode::Unavailable);
}
