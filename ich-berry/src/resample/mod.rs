//! 体数据重采样.
//!
//! 提供按比例缩放 ([`zoom`], [`zoom_axis`]) 和水平面内旋转 ([`rotate_plane`]) 两种操作,
//! 它们共用 [`spline`] 中的三次 B 样条插值核. 缩放的网格映射为
//! `x_in = k * (n_in - 1) / (n_out - 1)`, 输出长度为 `round_half_even(n_in * factor)`.
//!
//! 所有函数都返回新数组, 不修改输入.

use ndarray::{Array3, ArrayView1, ArrayView3, ArrayViewMut1, Axis, Zip};

use crate::error::{PrepError, Result};

mod rotate;
mod spline;

pub use rotate::rotate_plane;

use spline::{prefilter, Taps};

/// 长度为 `len` 的轴按 `factor` 缩放后的长度. 半数取偶.
#[inline]
pub fn zoomed_len(len: usize, factor: f64) -> usize {
    (len as f64 * factor).round_ties_even() as usize
}

/// 缩放后第 `k` 个输出位置在输入轴上的坐标.
#[inline]
fn source_coord(k: usize, n_in: usize, n_out: usize) -> f64 {
    if n_out > 1 {
        let step = (n_in - 1) as f64 / (n_out - 1) as f64;
        (k as f64 * step).min((n_in - 1) as f64)
    } else {
        0.0
    }
}

/// 沿 `axis` 将 `src` 插值重采样为 `out_len` 个样本, 其余两轴不变.
///
/// # 注意
///
/// `src` 沿 `axis` 的长度和 `out_len` 都必须非零, 否则程序 panic.
pub fn zoom_axis(src: ArrayView3<f64>, axis: Axis, out_len: usize) -> Array3<f64> {
    let n_in = src.len_of(axis);
    assert!(n_in > 0 && out_len > 0, "不能对空轴做插值");

    let mut dim = src.raw_dim();
    dim[axis.index()] = out_len;
    let mut out = Array3::<f64>::zeros(dim);

    let taps: Vec<Taps> = (0..out_len)
        .map(|k| Taps::at(source_coord(k, n_in, out_len), n_in))
        .collect();

    let zip = Zip::from(out.lanes_mut(axis)).and(src.lanes(axis));
    let op = |mut o: ArrayViewMut1<f64>, s: ArrayView1<f64>| {
        let mut c = s.to_vec();
        prefilter(&mut c);
        o.iter_mut()
            .zip(taps.iter())
            .for_each(|(v, t)| *v = t.eval(&c));
    };

    cfg_if::cfg_if! {
        if #[cfg(feature = "rayon")] {
            zip.par_for_each(op);
        } else {
            zip.for_each(op);
        }
    }
    out
}

/// 按每个轴的比例 `factors` 缩放 `src`.
///
/// 缩放后长度与原长度相同的轴不做插值 (此时网格映射是恒等的).
/// 任意轴缩放后长度为 0 时返回 [`PrepError::DegenerateGeometry`].
pub fn zoom(src: Array3<f64>, factors: [f64; 3]) -> Result<Array3<f64>> {
    let mut out = src;
    for (i, factor) in factors.into_iter().enumerate() {
        let axis = Axis(i);
        let n_in = out.len_of(axis);
        let n_out = zoomed_len(n_in, factor);
        if n_in == 0 || n_out == 0 {
            return Err(PrepError::DegenerateGeometry(format!(
                "第 {i} 轴长度 {n_in} 按 {factor} 缩放后为空"
            )));
        }
        if n_out != n_in {
            out = zoom_axis(out.view(), axis, n_out);
        }
    }
    Ok(out)
}
