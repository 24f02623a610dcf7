//! 方向统一.

use ndarray::Array3;

use crate::config::NormalizeConfig;
use crate::resample::rotate_plane;

/// 每个水平面旋转 `cfg.orient_degrees` 度 (形状不变), 再保留 `cfg.round_decimals` 位小数.
///
/// 扫描与标注使用同一变换. 舍入消除了样条插值在整数坐标上留下的浮点误差,
/// 因此标注在旋转后仍只含 0 和 1.
pub fn orient(data: &Array3<f64>, cfg: &NormalizeConfig) -> Array3<f64> {
    let rotated = rotate_plane(data.view(), cfg.orient_degrees);
    super::round_decimals(&rotated, cfg.round_decimals)
}
