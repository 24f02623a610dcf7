//! 病例文件的枚举、配对与加载.
//!
//! 批量加载函数 [`load_cases`] 按给定顺序收集结果, 开启 `rayon` 特性时并行读取.

use std::fs;
use std::path::{Path, PathBuf};

use itertools::Itertools;
use log::debug;
use ndarray::Array3;

use crate::config::{Channel, NormalizeConfig, PairingConfig};
use crate::data::RawVolume;
use crate::error::{PrepError, Result};
use crate::hematoma;
use crate::normalize::{normalize, VolumeKind};

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::prelude::*;
    }
}

const NII: &str = ".nii";
const NII_GZ: &str = ".nii.gz";

/// 去掉 `.nii` / `.nii.gz` 扩展名. 不是 nifti 文件名时返回 `None`.
fn strip_nifti_ext(name: &str) -> Option<&str> {
    name.strip_suffix(NII_GZ).or_else(|| name.strip_suffix(NII))
}

/// 列出 `dir` 下所有 `.nii` / `.nii.gz` 文件, 按文件名字典序排列.
///
/// 目录不存在时返回 [`PrepError::Io`], 没有 nifti 文件时返回 [`PrepError::EmptyDirectory`].
/// nifti 文件名不是合法 UTF-8 时返回 [`PrepError::InvalidConfig`].
pub fn list_volumes<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let entries = fs::read_dir(dir).map_err(|e| PrepError::io(dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| PrepError::io(dir, e))?.path();
        let Some(name) = path.file_name() else {
            continue;
        };
        let lossy = name.to_string_lossy();
        if strip_nifti_ext(&lossy).is_none() || !path.is_file() {
            continue;
        }
        // 病例名参与配对和表格对齐, 不能静默丢弃.
        if name.to_str().is_none() {
            return Err(PrepError::InvalidConfig(format!(
                "文件名 `{}` 不是合法的 UTF-8",
                path.display()
            )));
        }
        files.push(path);
    }
    if files.is_empty() {
        return Err(PrepError::EmptyDirectory(dir.to_owned()));
    }
    Ok(files
        .into_iter()
        .sorted_by(|a, b| a.file_name().cmp(&b.file_name()))
        .collect())
}

/// 病例名: 去掉扩展名以及 (若存在) 后缀 `suffix` 的文件名.
///
/// ```
/// use ich_berry::dataset::scan::case_key;
///
/// assert_eq!(case_key("a/p001.nii.gz", ""), "p001");
/// assert_eq!(case_key("b/p001_mask.nii", "_mask"), "p001");
/// ```
pub fn case_key<P: AsRef<Path>>(path: P, suffix: &str) -> String {
    let name = path
        .as_ref()
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = strip_nifti_ext(&name).unwrap_or(&name);
    let stem = if suffix.is_empty() {
        stem
    } else {
        stem.strip_suffix(suffix).unwrap_or(stem)
    };
    stem.to_owned()
}

/// 单个病例的文件.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CasePair {
    /// 病例名, 取自扫描文件名.
    pub id: String,

    /// 扫描文件.
    pub image: PathBuf,

    /// 标注文件. 只使用原始通道时为空.
    pub mask: Option<PathBuf>,
}

/// 只枚举扫描, 不读取标注.
pub fn image_cases<P: AsRef<Path>>(image_dir: P) -> Result<Vec<CasePair>> {
    Ok(list_volumes(image_dir)?
        .into_iter()
        .map(|image| CasePair {
            id: case_key(&image, ""),
            image,
            mask: None,
        })
        .collect())
}

/// 按排序后的位置配对扫描与标注.
///
/// 两个目录的文件个数必须相同. 若 `rule.verify_keys` 为真, 同一位置的两个文件
/// 还必须有相同的病例名 (标注文件名去掉 `rule.mask_suffix` 后比较).
pub fn pair_cases<P: AsRef<Path>>(
    image_dir: P,
    mask_dir: P,
    rule: &PairingConfig,
) -> Result<Vec<CasePair>> {
    let (image_dir, mask_dir) = (image_dir.as_ref(), mask_dir.as_ref());
    let images = list_volumes(image_dir)?;
    let masks = list_volumes(mask_dir)?;
    if images.len() != masks.len() {
        return Err(PrepError::PairCountMismatch {
            image_dir: image_dir.to_owned(),
            mask_dir: mask_dir.to_owned(),
            images: images.len(),
            masks: masks.len(),
        });
    }

    images
        .into_iter()
        .zip(masks)
        .map(|(image, mask)| {
            let id = case_key(&image, "");
            if rule.verify_keys && id != case_key(&mask, &rule.mask_suffix) {
                return Err(PrepError::PairKeyMismatch { image, mask });
            }
            Ok(CasePair {
                id,
                image,
                mask: Some(mask),
            })
        })
        .collect()
}

/// 枚举某个目录对中的病例. 是否读取标注由 `channel` 决定.
pub fn cases_for_channel<P: AsRef<Path>>(
    image_dir: P,
    mask_dir: P,
    channel: Channel,
    rule: &PairingConfig,
) -> Result<Vec<CasePair>> {
    if channel.uses_masks() {
        pair_cases(image_dir, mask_dir, rule)
    } else {
        image_cases(image_dir)
    }
}

/// 读取并归一化单个病例, 按 `channel` 返回原始通道或血肿通道.
pub fn load_case(pair: &CasePair, channel: Channel, cfg: &NormalizeConfig) -> Result<Array3<f64>> {
    let image = normalize(RawVolume::open(&pair.image)?, VolumeKind::Image, cfg)?;
    let ans = match (channel, &pair.mask) {
        (Channel::Hematoma, Some(mask)) => {
            let mask = normalize(RawVolume::open(mask)?, VolumeKind::Mask, cfg)?;
            hematoma::extract(&image, &mask)?
        }
        (Channel::Hematoma, None) => {
            return Err(PrepError::InvalidConfig(format!(
                "病例 `{}` 缺少标注, 无法提取血肿",
                pair.id
            )))
        }
        (Channel::Original, _) => image,
    };
    debug!("病例 `{}` 归一化完成", pair.id);
    Ok(ans)
}

/// 加载全部病例, 结果顺序与 `pairs` 相同. 任意病例出错即返回该错误.
pub fn load_cases(
    pairs: &[CasePair],
    channel: Channel,
    cfg: &NormalizeConfig,
) -> Result<Vec<Array3<f64>>> {
    cfg_if::cfg_if! {
        if #[cfg(feature = "rayon")] {
            pairs
                .par_iter()
                .map(|p| load_case(p, channel, cfg))
                .collect()
        } else {
            pairs.iter().map(|p| load_case(p, channel, cfg)).collect()
        }
    }
}
