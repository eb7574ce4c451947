use std::path::Path;
use std::sync::mpsc;

use signal_ae::data::npy::encode_npy;
use signal_ae::data::partition;
use signal_ae::{
    train_from_config, Activation, CheckpointManager, Dataset, EpochReport, LoopState,
    OptimizerKind, TrainConfig, Trainer,
};
use tempfile::tempdir;

const SIGNAL_LEN: usize = 12;

fn synthetic(n: usize) -> Dataset {
    let windows = (0..n)
        .map(|i| {
            (0..SIGNAL_LEN)
                .map(|t| ((t as f64 + i as f64 * 0.7) * 0.5).sin() * 0.8)
                .collect()
        })
        .collect();
    Dataset::from_windows(windows).unwrap()
}

fn config(checkpoint_dir: &Path) -> TrainConfig {
    TrainConfig {
        epochs: 3,
        batch_size: 10,
        learning_rate: 1e-3,
        log_interval: 1,
        save_interval: 1,
        signal_len: SIGNAL_LEN,
        hidden_dim: 8,
        latent_dim: 3,
        checkpoint_dir: checkpoint_dir.to_path_buf(),
        use_gpu: false,
        ..TrainConfig::default()
    }
}

#[test]
fn three_epochs_write_three_loadable_checkpoints() {
    let tmp = tempdir().unwrap();
    let ckpt_dir = tmp.path().join("model_saved");
    let ds = synthetic(100);
    let split = partition(&ds, 0).unwrap();
    assert_eq!((split.train.len(), split.validation.len(), split.test.len()), (80, 10, 10));

    let mut trainer = Trainer::new(config(&ckpt_dir)).unwrap();
    assert_eq!(trainer.state(), LoopState::Idle);
    let summary = trainer.run(&ds, &split).unwrap();

    assert_eq!(summary.state, LoopState::Completed);
    assert_eq!(summary.start_epoch, 0);
    assert_eq!(summary.final_epoch, 2);
    // 0, 1, 2 on schedule, then 2 again unconditionally.
    let written: Vec<_> = summary.checkpoints.iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(written, vec![
        "checkpoint_epoch_0.json",
        "checkpoint_epoch_1.json",
        "checkpoint_epoch_2.json",
        "checkpoint_epoch_2.json",
    ]);

    let mgr = CheckpointManager::new(&ckpt_dir);
    let artifacts = mgr.list().unwrap();
    assert_eq!(artifacts.len(), 3);
    let epochs: Vec<usize> = artifacts.iter().map(|p| mgr.load(p).unwrap().epoch).collect();
    assert_eq!(epochs, vec![0, 1, 2]);

    let last = mgr.load(&mgr.path_for(2)).unwrap();
    assert_eq!(last.loss.to_bits(), summary.final_loss.to_bits());
    assert_eq!(last.model_state, trainer.model().state_dict());
    assert_eq!(last.optimizer_state, trainer.optimizer().state_dict());
    // Adam took 8 steps per epoch (80 samples / batch 10).
    assert_eq!(last.optimizer_state["step"].data, vec![24.0]);
}

#[test]
fn final_checkpoint_is_written_off_schedule() {
    let tmp = tempdir().unwrap();
    let ds = synthetic(50);
    let split = partition(&ds, 0).unwrap();
    let cfg = TrainConfig { epochs: 4, save_interval: 3, log_interval: 2, ..config(tmp.path()) };

    let summary = Trainer::new(cfg).unwrap().run(&ds, &split).unwrap();

    let mgr = CheckpointManager::new(tmp.path());
    let epochs: Vec<usize> = mgr.list().unwrap().iter().map(|p| mgr.load(p).unwrap().epoch).collect();
    assert_eq!(epochs, vec![0, 3]);
    assert_eq!(summary.checkpoints.len(), 3);
}

#[test]
fn reports_follow_log_interval_and_carry_last_batch_step() {
    let tmp = tempdir().unwrap();
    let ds = synthetic(100);
    let split = partition(&ds, 0).unwrap();
    let cfg = TrainConfig { epochs: 5, log_interval: 2, batch_size: 30, ..config(tmp.path()) };

    let (tx, rx) = mpsc::channel();
    Trainer::new(cfg).unwrap().with_progress(tx).run(&ds, &split).unwrap();
    let reports: Vec<EpochReport> = rx.try_iter().collect();

    assert_eq!(reports.iter().map(|r| r.epoch).collect::<Vec<_>>(), vec![0, 2, 4]);
    // 80 training samples in batches of 30: steps 0, 1, 2 per epoch.
    assert_eq!(reports.iter().map(|r| r.total_step).collect::<Vec<_>>(), vec![2, 8, 14]);
    assert!(reports.iter().all(|r| r.val_loss.is_some_and(f64::is_finite)));
    assert!(reports.iter().all(|r| r.total_epochs == 5));
}

#[test]
fn disabled_validation_reports_the_sentinel() {
    let tmp = tempdir().unwrap();
    let ds = synthetic(60);
    let split = partition(&ds, 0).unwrap();
    let cfg = TrainConfig { eval_val: false, ..config(tmp.path()) };

    let (tx, rx) = mpsc::channel();
    Trainer::new(cfg).unwrap().with_progress(tx).run(&ds, &split).unwrap();
    let reports: Vec<EpochReport> = rx.try_iter().collect();

    assert_eq!(reports.len(), 3);
    for r in &reports {
        assert_eq!(r.val_loss, None);
        assert!(r.to_string().ends_with("val_loss: not computed"));
        assert_eq!(serde_json::to_value(r).unwrap()["val_loss"], serde_json::Value::Null);
    }
}

#[test]
fn relu_hidden_layers_train_and_persist() {
    let tmp = tempdir().unwrap();
    let ds = synthetic(50);
    let split = partition(&ds, 0).unwrap();
    let cfg = TrainConfig { activation: Activation::Relu, ..config(tmp.path()) };

    let mut trainer = Trainer::new(cfg).unwrap();
    assert_eq!(trainer.model().spec.hidden_activation, Activation::Relu);
    assert!(trainer.model().to_string().contains("activation=ReLU"));
    let summary = trainer.run(&ds, &split).unwrap();

    assert!(summary.final_loss.is_finite());
    let (_, latest) = CheckpointManager::new(tmp.path()).load_latest().unwrap();
    assert_eq!(latest.model_state, trainer.model().state_dict());
}

#[test]
fn too_small_dataset_has_no_training_subset() {
    let tmp = tempdir().unwrap();
    let ds = synthetic(1);
    let split = partition(&ds, 0).unwrap();
    let err = Trainer::new(config(tmp.path())).unwrap().run(&ds, &split).unwrap_err();
    assert!(matches!(err, signal_ae::TrainError::InvalidDataset { .. }));
}

#[test]
fn end_to_end_from_an_npy_file() {
    let tmp = tempdir().unwrap();
    let data_path = tmp.path().join("normal.npy");
    let ds = synthetic(40);
    let flat: Vec<f64> = ds.windows.concat();
    std::fs::write(&data_path, encode_npy(&[40, 1, SIGNAL_LEN], &flat)).unwrap();

    let cfg = TrainConfig {
        epochs: 2,
        train_file: data_path,
        optimizer: OptimizerKind::Sgd,
        num_workers: 2,
        ..config(&tmp.path().join("ckpt"))
    };
    let summary = train_from_config(cfg).unwrap();

    assert_eq!(summary.final_epoch, 1);
    assert!(summary.final_loss.is_finite());
    let mgr = CheckpointManager::new(tmp.path().join("ckpt"));
    let (_, latest) = mgr.load_latest().unwrap();
    assert_eq!(latest.epoch, 1);
    assert!(latest.optimizer_state.is_empty());
}

#[test]
fn missing_dataset_file_is_fatal() {
    let tmp = tempdir().unwrap();
    let cfg = TrainConfig { train_file: tmp.path().join("absent.npy"), ..config(tmp.path()) };
    let err = train_from_config(cfg).unwrap_err();
    assert!(matches!(err, signal_ae::TrainError::InvalidDataset { .. }));
    assert!(CheckpointManager::new(tmp.path()).list().unwrap().is_empty());
}
