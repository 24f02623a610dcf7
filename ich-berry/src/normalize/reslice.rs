//! z 方向重切片.

use log::warn;
use ndarray::{concatenate, s, Array3, Axis};

use super::VolumeKind;
use crate::config::NormalizeConfig;
use crate::error::{PrepError, Result};
use crate::resample::zoom;

/// 原始层厚先保留两位小数 (半数取偶), 再换算成 z 方向缩放比例.
#[inline]
fn axial_factor(z_mm: f64, target_mm: f64) -> f64 {
    (z_mm * 100.0).round_ties_even() / 100.0 / target_mm
}

/// 将体数据沿 z 方向重采样到 `cfg.target_axial_mm`, 并统一到 `cfg.target_slices` 层.
///
/// 重采样后层数多于目标时丢弃最靠前 (下标最小) 的若干层;
/// 少于目标时在前面补全零层. 标注在插值后重新二值化, 扫描不做截断
/// (截断发生在下一步).
pub fn reslice(
    data: Array3<f64>,
    z_mm: f64,
    kind: VolumeKind,
    cfg: &NormalizeConfig,
) -> Result<Array3<f64>> {
    let factor = axial_factor(z_mm, cfg.target_axial_mm);
    if !(factor.is_finite() && factor > 0.0) {
        return Err(PrepError::DegenerateGeometry(format!(
            "层厚 {z_mm}mm 无法换算到 {}mm",
            cfg.target_axial_mm
        )));
    }
    let data = zoom(data, [1.0, 1.0, factor])?;
    let data = match kind {
        VolumeKind::Image => data,
        VolumeKind::Mask => super::binarize(&data, cfg.mask_threshold),
    };

    let (h, w, count) = data.dim();
    let target = cfg.target_slices;
    if count > target {
        let dropped = count - target;
        warn!("重切片后有 {count} 层, 丢弃最前面的 {dropped} 层");
        Ok(data.slice(s![.., .., dropped..]).to_owned())
    } else if count < target {
        let zeros = Array3::<f64>::zeros((h, w, target - count));
        concatenate(Axis(2), &[zeros.view(), data.view()])
            .map_err(|e| PrepError::DegenerateGeometry(e.to_string()))
    } else {
        Ok(data)
    }
}
