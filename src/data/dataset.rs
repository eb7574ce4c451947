use std::path::{Path, PathBuf};

use crate::data::npy::parse_npy;
use crate::error::{Result, TrainError};

/// The full corpus of signal windows, loaded once and never mutated.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub windows: Vec<Vec<f64>>,
    /// Shape of one sample before flattening, e.g. `[1, 60]`.
    pub sample_shape: Vec<usize>,
    pub source: PathBuf,
}

impl Dataset {
    /// Loads an `(N, *sample_shape)` `.npy` file whose samples flatten to
    /// exactly `signal_len` values.
    pub fn load(path: &Path, signal_len: usize) -> Result<Dataset> {
        let bytes = std::fs::read(path)
            .map_err(|e| TrainError::invalid_dataset(path, format!("cannot read file: {e}")))?;
        let array = parse_npy(&bytes).map_err(|reason| TrainError::invalid_dataset(path, reason))?;

        let n = array.shape[0];
        let sample_shape = array.shape[1..].to_vec();
        let window_len: usize = sample_shape.iter().product();

        if n == 0 {
            return Err(TrainError::invalid_dataset(path, "dataset contains no samples"));
        }
        if window_len == 0 || window_len != signal_len {
            return Err(TrainError::invalid_dataset(path, format!(
                "samples of shape {sample_shape:?} flatten to {window_len} values, expected signal length {signal_len}"
            )));
        }

        let windows = array.data.chunks_exact(window_len).map(<[f64]>::to_vec).collect();
        Ok(Dataset { windows, sample_shape, source: path.to_path_buf() })
    }

    /// Builds an in-memory dataset; every window must have the same length.
    pub fn from_windows(windows: Vec<Vec<f64>>) -> Result<Dataset> {
        let source = PathBuf::from("<memory>");
        let Some(first) = windows.first() else {
            return Err(TrainError::invalid_dataset(source, "dataset contains no samples"));
        };
        let len = first.len();
        if len == 0 {
            return Err(TrainError::invalid_dataset(source, "windows are empty"));
        }
        if let Some(i) = windows.iter().position(|w| w.len() != len) {
            return Err(TrainError::invalid_dataset(source, format!(
                "window {i} has {} values, expected {len}", windows[i].len()
            )));
        }
        Ok(Dataset { windows, sample_shape: vec![len], source })
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn window_len(&self) -> usize {
        self.sample_shape.iter().product()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::npy::encode_npy;

    #[test]
    fn loads_and_flattens_samples() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("normal.npy");
        let data: Vec<f64> = (0..20).map(f64::from).collect();
        std::fs::write(&path, encode_npy(&[5, 1, 4], &data)).unwrap();

        let ds = Dataset::load(&path, 4).unwrap();
        assert_eq!(ds.len(), 5);
        assert_eq!(ds.sample_shape, vec![1, 4]);
        assert_eq!(ds.windows[2], vec![8.0, 9.0, 10.0, 11.0]);
    }

    #[test]
    fn rejects_missing_empty_and_mis_sized_files() {
        let dir = tempfile::tempdir().unwrap();

        let missing = Dataset::load(&dir.path().join("absent.npy"), 4).unwrap_err();
        assert!(matches!(missing, TrainError::InvalidDataset { .. }));

        let empty = dir.path().join("empty.npy");
        std::fs::write(&empty, encode_npy(&[0, 4], &[])).unwrap();
        assert!(matches!(Dataset::load(&empty, 4), Err(TrainError::InvalidDataset { .. })));

        let wrong = dir.path().join("wrong.npy");
        std::fs::write(&wrong, encode_npy(&[2, 3], &[0.0; 6])).unwrap();
        assert!(matches!(Dataset::load(&wrong, 4), Err(TrainError::InvalidDataset { .. })));
    }

    #[test]
    fn in_memory_windows_must_agree() {
        assert!(Dataset::from_windows(vec![]).is_err());
        assert!(Dataset::from_windows(vec![vec![1.0, 2.0], vec![3.0]]).is_err());
        assert_eq!(Dataset::from_windows(vec![vec![1.0, 2.0]]).unwrap().window_len(), 2);
    }
}
