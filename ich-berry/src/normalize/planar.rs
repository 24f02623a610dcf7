//! 水平方向的像素统一与缩放.

use ndarray::{s, Array3};

use super::VolumeKind;
use crate::config::NormalizeConfig;
use crate::error::{PrepError, Result};
use crate::resample::zoom;

/// 把水平像素统一到 `cfg.target_pixel_mm`, 然后在两个水平轴的两侧各补
/// `floor((pad_extent - extent) / 2)` 个零.
///
/// 两侧补零数相同, 所以结果边长为 `pad_extent` 或 `pad_extent - 1`
/// (默认配置下为 513 或 512), 下一步 [`resize`] 对两者都适用.
/// 放大后边长超过 `pad_extent` 时返回 [`PrepError::DegenerateGeometry`].
pub fn unify_pixel_size(
    data: Array3<f64>,
    x_mm: f64,
    kind: VolumeKind,
    cfg: &NormalizeConfig,
) -> Result<Array3<f64>> {
    let magnification = x_mm / cfg.target_pixel_mm;
    if !(magnification.is_finite() && magnification > 0.0) {
        return Err(PrepError::DegenerateGeometry(format!(
            "像素间距 {x_mm}mm 无法换算到 {}mm",
            cfg.target_pixel_mm
        )));
    }
    let data = zoom(data, [magnification, magnification, 1.0])?;
    let (h, w, d) = data.dim();

    let pad_of = |extent: usize| -> Result<usize> {
        if extent > cfg.pad_extent {
            return Err(PrepError::DegenerateGeometry(format!(
                "放大后边长 {extent} 超过补零边长 {}",
                cfg.pad_extent
            )));
        }
        Ok((cfg.pad_extent - extent) / 2)
    };
    let (ph, pw) = (pad_of(h)?, pad_of(w)?);

    let mut padded = Array3::<f64>::zeros((h + 2 * ph, w + 2 * pw, d));
    padded
        .slice_mut(s![ph..ph + h, pw..pw + w, ..])
        .assign(&data);
    Ok(kind.settle(&padded, cfg.mask_threshold))
}

/// 把水平边长缩放到 `cfg.input_extent`, z 方向不变.
///
/// 缩放后的边长不等于目标时返回 [`PrepError::DegenerateGeometry`].
pub fn resize(data: Array3<f64>, kind: VolumeKind, cfg: &NormalizeConfig) -> Result<Array3<f64>> {
    let (h, w, _) = data.dim();
    if h == 0 || w == 0 {
        return Err(PrepError::DegenerateGeometry("水平面为空".into()));
    }
    let target = cfg.input_extent as f64;
    let data = zoom(data, [target / h as f64, target / w as f64, 1.0])?;
    let (h, w, _) = data.dim();
    if h != cfg.input_extent || w != cfg.input_extent {
        return Err(PrepError::DegenerateGeometry(format!(
            "缩放后水平面为 {h}x{w}, 期望 {0}x{0}",
            cfg.input_extent
        )));
    }
    Ok(kind.settle(&data, cfg.mask_threshold))
}
