//! 划分的 npz 存档.
//!
//! 每个划分写为一个 npz 文件, 包含以下条目:
//!
//! | 条目 | 类型 | 形状 |
//! |---|---|---|
//! | `images.npy` | `f64` | `(N, H, W, S, 1)` |
//! | `labels.npy` | `u8` | `(N,)` |
//! | `tabular.npy` | `f64` | `(N, 5)`, 仅多模态 |
//! | `ids.npy` | `u8` | 病例名以 `\n` 连接后的 UTF-8 字节 |

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use log::info;
use ndarray::{Array1, Array2, Array5, Ix1, Ix2, Ix5, OwnedRepr};
use ndarray_npy::{NpzReader, NpzWriter, ReadNpzError};

use super::{Dataset, SplitTensors};
use crate::error::{PrepError, Result};

const IMAGES: &str = "images.npy";
const LABELS: &str = "labels.npy";
const TABULAR: &str = "tabular.npy";
const IDS: &str = "ids.npy";

/// 条目名去掉 `.npy` 后缀 (写入时由 [`NpzWriter`] 自动追加).
#[inline]
fn entry(name: &str) -> &str {
    name.trim_end_matches(".npy")
}

/// 将一个划分写到 `path`.
pub fn write_split<P: AsRef<Path>>(path: P, split: &SplitTensors) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| PrepError::io(path, e))?;
    let write_err = |source| PrepError::WriteNpz {
        path: path.to_owned(),
        source,
    };

    let mut npz = NpzWriter::new(file);
    npz.add_array(entry(IMAGES), &split.images).map_err(write_err)?;
    npz.add_array(entry(LABELS), &split.labels).map_err(write_err)?;
    if let Some(tabular) = &split.tabular {
        npz.add_array(entry(TABULAR), tabular).map_err(write_err)?;
    }
    let ids: Array1<u8> = split.ids.join("\n").into_bytes().into();
    npz.add_array(entry(IDS), &ids).map_err(write_err)?;
    npz.finish().map_err(write_err)?;
    Ok(())
}

/// 从 `path` 读回一个划分.
pub fn load_split<P: AsRef<Path>>(path: P) -> Result<SplitTensors> {
    let path = path.as_ref();
    let file = OpenOptions::new()
        .read(true)
        .open(path)
        .map_err(|e| PrepError::io(path, e))?;
    let read_err = |source: ReadNpzError| PrepError::ReadNpz {
        path: path.to_owned(),
        source,
    };

    let mut npz = NpzReader::new(file).map_err(read_err)?;
    let names = npz.names().map_err(read_err)?;
    let images: Array5<f64> = npz.by_name::<OwnedRepr<f64>, Ix5>(IMAGES).map_err(read_err)?;
    let labels: Array1<u8> = npz.by_name::<OwnedRepr<u8>, Ix1>(LABELS).map_err(read_err)?;
    let tabular: Option<Array2<f64>> = if names.iter().any(|n| n == TABULAR) {
        Some(npz.by_name::<OwnedRepr<f64>, Ix2>(TABULAR).map_err(read_err)?)
    } else {
        None
    };
    let ids = if names.iter().any(|n| n == IDS) {
        let bytes = npz.by_name::<OwnedRepr<u8>, Ix1>(IDS).map_err(read_err)?;
        let text = String::from_utf8_lossy(&bytes.to_vec()).into_owned();
        if text.is_empty() {
            Vec::new()
        } else {
            text.split('\n').map(str::to_owned).collect()
        }
    } else {
        Vec::new()
    };

    if images.len_of(ndarray::Axis(0)) != labels.len() {
        return Err(PrepError::ShapeMismatch {
            what: "npz 影像与标签",
            left: images.shape().to_vec(),
            right: labels.shape().to_vec(),
        });
    }
    Ok(SplitTensors {
        ids,
        images,
        labels,
        tabular,
    })
}

impl Dataset {
    /// 将三个划分分别写为 `dir` 下的 `train.npz`、`val.npz`、`test.npz`,
    /// 返回写入的路径.
    pub fn write_npz<P: AsRef<Path>>(&self, dir: P) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|e| PrepError::io(dir, e))?;
        let mut written = Vec::with_capacity(3);
        for (name, split) in [("train", &self.train), ("val", &self.val), ("test", &self.test)] {
            let path = dir.join(format!("{name}.npz"));
            write_split(&path, split)?;
            info!("写入 `{}`: {} 个样本", path.display(), split.len());
            written.push(path);
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array5};

    fn sample(with_tabular: bool) -> SplitTensors {
        SplitTensors {
            ids: vec!["e01".into(), "e01+flip".into(), "n07".into()],
            images: Array5::from_shape_fn((3, 2, 2, 2, 1), |(n, x, y, z, _)| {
                (n * 8 + x * 4 + y * 2 + z) as f64 / 24.0
            }),
            labels: array![1, 1, 0],
            tabular: with_tabular.then(|| Array2::from_elem((3, 5), 0.25)),
        }
    }

    #[test]
    fn test_split_survives_archive() {
        let tmp = tempfile::tempdir().unwrap();
        for with_tabular in [true, false] {
            let path = tmp.path().join(format!("split-{with_tabular}.npz"));
            let split = sample(with_tabular);
            write_split(&path, &split).unwrap();
            assert_eq!(load_split(&path).unwrap(), split);
        }
    }

    #[test]
    fn test_empty_split() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("empty.npz");
        let split = SplitTensors {
            ids: vec![],
            images: Array5::zeros((0, 2, 2, 2, 1)),
            labels: Array1::from(vec![]),
            tabular: None,
        };
        write_split(&path, &split).unwrap();
        let back = load_split(&path).unwrap();
        assert!(back.is_empty());
        assert!(back.ids.is_empty());
    }

    #[test]
    fn test_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_split(tmp.path().join("nope.npz")),
            Err(PrepError::Io { .. })
        ));
    }

    #[test]
    fn test_write_dataset() {
        let tmp = tempfile::tempdir().unwrap();
        let ds = Dataset {
            train: sample(false),
            val: sample(false),
            test: sample(false),
            standardizer: None,
            seed: 0,
        };
        let written = ds.write_npz(tmp.path().join("out")).unwrap();
        assert_eq!(written.len(), 3);
        assert!(written[2].ends_with("test.npz"));
        assert_eq!(load_split(&written[0]).unwrap().labels, ds.train.labels);
    }
}
