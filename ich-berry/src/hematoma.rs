//! 血肿区域提取.

use ndarray::{Array3, Zip};

use crate::error::{PrepError, Result};

/// 由归一化后的扫描与标注得到只保留血肿强度的体数据: `max(original - 1 + mask, 0)`.
///
/// 扫描取值在 \[0, 1\], 标注取值为 0 或 1. 因此标注为 0 处结果为 0,
/// 标注为 1 处结果等于扫描值. 两者形状不同时返回 [`PrepError::ShapeMismatch`].
pub fn extract(original: &Array3<f64>, mask: &Array3<f64>) -> Result<Array3<f64>> {
    if original.shape() != mask.shape() {
        return Err(PrepError::ShapeMismatch {
            what: "扫描与标注",
            left: original.shape().to_vec(),
            right: mask.shape().to_vec(),
        });
    }
    Ok(Zip::from(original)
        .and(mask)
        .map_collect(|o, m| (o - 1.0 + m).max(0.0)))
}
