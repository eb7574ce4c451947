use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::checkpoint::natural::natural_cmp;
use crate::error::{Result, TrainError};
use crate::math::tensor::StateDict;

const PREFIX: &str = "checkpoint_epoch_";
const EXTENSION: &str = "json";

/// A persisted training snapshot. Written once, never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub epoch: usize,
    pub loss: f64,
    pub model_state: StateDict,
    pub optimizer_state: StateDict,
}

/// Serializes like `Checkpoint` without cloning the state dicts.
#[derive(Serialize)]
struct CheckpointRef<'a> {
    epoch: usize,
    loss: f64,
    model_state: &'a StateDict,
    optimizer_state: &'a StateDict,
}

/// Reads and writes `checkpoint_epoch_<E>.json` files in one directory.
#[derive(Debug, Clone)]
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        CheckpointManager { dir: dir.into() }
    }

    pub fn path_for(&self, epoch: usize) -> PathBuf {
        self.dir.join(format!("{PREFIX}{epoch}.{EXTENSION}"))
    }

    /// Writes the checkpoint for `epoch` and returns its path.
    ///
    /// The JSON goes to a sibling `.tmp` file that is synced and then renamed
    /// into place, so a crash mid-write never leaves a truncated artifact and
    /// never touches an existing one. Saving the same epoch twice replaces the
    /// file with the new content.
    pub fn save(
        &self,
        epoch: usize,
        loss: f64,
        model_state: &StateDict,
        optimizer_state: &StateDict,
    ) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;

        let path = self.path_for(epoch);
        let tmp = path.with_extension(format!("{EXTENSION}.tmp"));

        let record = CheckpointRef { epoch, loss, model_state, optimizer_state };
        let mut writer = BufWriter::new(File::create(&tmp)?);
        serde_json::to_writer_pretty(&mut writer, &record).map_err(std::io::Error::from)?;
        writer.flush()?;
        writer.into_inner().map_err(|e| e.into_error())?.sync_all()?;
        fs::rename(&tmp, &path)?;

        log::info!("wrote checkpoint '{}'", path.display());
        Ok(path)
    }

    /// All checkpoint artifacts in natural order, oldest epoch first.
    /// A missing directory yields an empty list.
    pub fn list(&self) -> Result<Vec<PathBuf>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let name = entry?.file_name();
            let Some(name) = name.to_str() else { continue };
            if is_checkpoint_name(name) {
                names.push(name.to_owned());
            }
        }
        names.sort_by(|a, b| natural_cmp(a, b));

        Ok(names.into_iter().map(|n| self.dir.join(n)).collect())
    }

    /// Loads the highest-epoch artifact.
    pub fn load_latest(&self) -> Result<(PathBuf, Checkpoint)> {
        let latest = self.list()?
            .pop()
            .ok_or_else(|| TrainError::NoCheckpointFound { dir: self.dir.clone() })?;
        let checkpoint = self.load(&latest)?;
        Ok((latest, checkpoint))
    }

    /// Reads one artifact. Anything unreadable, incomplete or inconsistent
    /// is reported as `CorruptCheckpoint`.
    pub fn load(&self, path: &Path) -> Result<Checkpoint> {
        let file = File::open(path)
            .map_err(|e| TrainError::corrupt_checkpoint(path, format!("cannot open: {e}")))?;
        let checkpoint: Checkpoint = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| TrainError::corrupt_checkpoint(path, e.to_string()))?;

        if !checkpoint.loss.is_finite() {
            return Err(TrainError::corrupt_checkpoint(path, "loss is not finite"));
        }
        for (section, state) in [("model_state", &checkpoint.model_state), ("optimizer_state", &checkpoint.optimizer_state)] {
            if let Some((name, t)) = state.iter().find(|(_, t)| !t.is_consistent()) {
                return Err(TrainError::corrupt_checkpoint(path, format!(
                    "{section}.{name}: shape {:?} does not hold {} values",
                    t.shape,
                    t.data.len()
                )));
            }
        }

        Ok(checkpoint)
    }
}

fn is_checkpoint_name(name: &str) -> bool {
    name.strip_prefix(PREFIX)
        .and_then(|rest| rest.strip_suffix(&format!(".{EXTENSION}")))
        .is_some_and(|epoch| !epoch.is_empty() && epoch.bytes().all(|b| b.is_ascii_digit()))
}
