//! 几何归一化.
//!
//! 将任意分辨率、任意切片数的 3D CT 扫描 (或其血肿标注) 映射到统一坐标系:
//!
//! 1. 强度窗 (仅扫描): 见 [`IntensityWindow`](crate::IntensityWindow);
//! 2. z 方向重切片到 2mm, 并补齐 / 截断到 80 层: [`reslice`];
//! 3. 水平方向统一到 0.5mm 像素, 并补零到 513 边长: [`unify_pixel_size`];
//! 4. 缩小到网络输入边长 256: [`resize`];
//! 5. 水平面内旋转 90 度: [`orient`].
//!
//! 每一步都返回新数组. 扫描在每步插值后截断到 \[0, 1\],
//! 标注在每步插值后按阈值重新二值化.

use ndarray::Array3;

use crate::config::NormalizeConfig;
use crate::data::RawVolume;
use crate::error::Result;

mod orient;
mod planar;
mod reslice;

pub use orient::orient;
pub use planar::{resize, unify_pixel_size};
pub use reslice::reslice;

/// 被归一化的体数据类型. 二者的几何变换完全相同, 只有插值后的修正策略不同.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum VolumeKind {
    /// 原始扫描, 强度在 \[0, 1\] 内.
    Image,

    /// 血肿标注, 取值为 0 或 1.
    Mask,
}

impl VolumeKind {
    /// 插值之后的修正: 扫描截断到 \[0, 1\], 标注按 `threshold` 二值化.
    #[inline]
    pub fn settle(self, volume: &Array3<f64>, threshold: f64) -> Array3<f64> {
        match self {
            VolumeKind::Image => clip_unit(volume),
            VolumeKind::Mask => binarize(volume, threshold),
        }
    }
}

/// 截断到 \[0, 1\].
#[inline]
pub fn clip_unit(volume: &Array3<f64>) -> Array3<f64> {
    volume.mapv(|v| v.clamp(0.0, 1.0))
}

/// `>= threshold` 的体素置 1, 其余置 0.
#[inline]
pub fn binarize(volume: &Array3<f64>, threshold: f64) -> Array3<f64> {
    volume.mapv(|v| if v >= threshold { 1.0 } else { 0.0 })
}

/// 保留 `decimals` 位小数, 半数取偶.
#[inline]
pub fn round_decimals(volume: &Array3<f64>, decimals: i32) -> Array3<f64> {
    let scale = 10f64.powi(decimals);
    volume.mapv(|v| (v * scale).round_ties_even() / scale)
}

/// 对单个原始体数据执行完整的归一化流程, 返回形状为
/// [`NormalizeConfig::output_shape`] 的数组.
///
/// `raw` 按值传入, 流程结束后原始缓冲区即被释放.
pub fn normalize(raw: RawVolume, kind: VolumeKind, cfg: &NormalizeConfig) -> Result<Array3<f64>> {
    let (data, [x_mm, _, z_mm]) = raw.into_parts();
    let data = match kind {
        VolumeKind::Image => cfg.window.apply(&data),
        VolumeKind::Mask => data,
    };
    let data = reslice(data, z_mm, kind, cfg)?;
    let data = unify_pixel_size(data, x_mm, kind, cfg)?;
    let data = resize(data, kind, cfg)?;
    Ok(orient(&data, cfg))
}
