//! 水平面内旋转.

use ndarray::{Array2, Array3, ArrayView2, ArrayView3, ArrayViewMut2, Axis};

use super::spline::{prefilter_lane, Taps};

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};
    }
}

/// 角度制下的 `(cos, sin)`. 90 度的整数倍给出精确值.
fn cos_sin_deg(degrees: f64) -> (f64, f64) {
    let r = degrees.rem_euclid(360.0);
    if r == 0.0 {
        (1.0, 0.0)
    } else if r == 90.0 {
        (0.0, 1.0)
    } else if r == 180.0 {
        (-1.0, 0.0)
    } else if r == 270.0 {
        (0.0, -1.0)
    } else {
        let rad = degrees.to_radians();
        (rad.cos(), rad.sin())
    }
}

/// 一个水平面的仿射映射: `in = M * out + offset`, 旋转中心为平面中心.
#[derive(Copy, Clone, Debug)]
struct PlaneMap {
    cos: f64,
    sin: f64,
    offset: (f64, f64),
}

impl PlaneMap {
    fn new(degrees: f64, (n0, n1): (usize, usize)) -> Self {
        let (cos, sin) = cos_sin_deg(degrees);
        let c0 = (n0 as f64 - 1.0) / 2.0;
        let c1 = (n1 as f64 - 1.0) / 2.0;
        // 输出形状与输入相同, 两个中心重合.
        let out0 = cos * c0 + sin * c1;
        let out1 = -sin * c0 + cos * c1;
        Self {
            cos,
            sin,
            offset: (c0 - out0, c1 - out1),
        }
    }

    #[inline]
    fn source(&self, o0: usize, o1: usize) -> (f64, f64) {
        let (o0, o1) = (o0 as f64, o1 as f64);
        (
            self.cos * o0 + self.sin * o1 + self.offset.0,
            -self.sin * o0 + self.cos * o1 + self.offset.1,
        )
    }
}

/// 单个平面的旋转. `coeffs` 是已经预滤波的样条系数.
fn rotate_one(coeffs: ArrayView2<f64>, map: &PlaneMap, mut out: ArrayViewMut2<f64>) {
    let (n0, n1) = coeffs.dim();
    let (max0, max1) = ((n0 - 1) as f64, (n1 - 1) as f64);
    for ((o0, o1), v) in out.indexed_iter_mut() {
        let (x0, x1) = map.source(o0, o1);
        // 输入范围外的点直接取 0, 不做插值.
        if !(0.0..=max0).contains(&x0) || !(0.0..=max1).contains(&x1) {
            *v = 0.0;
            continue;
        }
        let t0 = Taps::at(x0, n0);
        let t1 = Taps::at(x1, n1);
        let mut acc = 0.0;
        for (i, wi) in t0.indices().iter().zip(t0.weights()) {
            let mut row = 0.0;
            for (j, wj) in t1.indices().iter().zip(t1.weights()) {
                row += coeffs[(*i, *j)] * wj;
            }
            acc += row * wi;
        }
        *v = acc;
    }
}

/// 预滤波一个平面, 返回样条系数.
fn plane_coefficients(plane: ArrayView2<f64>) -> Array2<f64> {
    let mut coeffs = plane.to_owned();
    coeffs.lanes_mut(Axis(0)).into_iter().for_each(prefilter_lane);
    coeffs.lanes_mut(Axis(1)).into_iter().for_each(prefilter_lane);
    coeffs
}

/// 将体数据的每个水平面 (前两个轴构成的平面) 绕平面中心旋转 `degrees` 度.
///
/// 输出形状与输入相同 (不扩张画布), 转出画布的部分被丢弃, 转入的空白部分填 0.
/// 插值使用三次 B 样条. `degrees` 为 90 的整数倍时, 所有采样点都落在整数坐标上,
/// 结果只含浮点舍入误差.
pub fn rotate_plane(src: ArrayView3<f64>, degrees: f64) -> Array3<f64> {
    let (n0, n1, _) = src.dim();
    let mut out = Array3::<f64>::zeros(src.raw_dim());
    if n0 == 0 || n1 == 0 {
        return out;
    }
    let map = PlaneMap::new(degrees, (n0, n1));

    let op = |(z, plane): (usize, ArrayViewMut2<f64>)| {
        let coeffs = plane_coefficients(src.index_axis(Axis(2), z));
        rotate_one(coeffs.view(), &map, plane);
    };

    cfg_if::cfg_if! {
        if #[cfg(feature = "rayon")] {
            out.axis_iter_mut(Axis(2)).into_par_iter().enumerate().for_each(op);
        } else {
            out.axis_iter_mut(Axis(2)).enumerate().for_each(op);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{cos_sin_deg, rotate_plane};
    use ndarray::{s, Array3};

    fn f64_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_exact_right_angles() {
        assert_eq!(cos_sin_deg(90.0), (0.0, 1.0));
        assert_eq!(cos_sin_deg(-90.0), (0.0, -1.0));
        assert_eq!(cos_sin_deg(450.0), (0.0, 1.0));
        assert_eq!(cos_sin_deg(180.0), (-1.0, 0.0));
        let (c, s) = cos_sin_deg(30.0);
        assert!(f64_eq(c, 3.0_f64.sqrt() / 2.0));
        assert!(f64_eq(s, 0.5));
    }

    /// 90 度旋转等价于 `out[i, j] = in[j, n - 1 - i]`.
    #[test]
    fn test_rotate_90_is_index_permutation() {
        let n = 6;
        let src = Array3::from_shape_fn((n, n, 2), |(x, y, z)| ((x * 7 + y * 3 + z) % 5) as f64);
        let out = rotate_plane(src.view(), 90.0);
        assert_eq!(out.dim(), src.dim());
        for i in 0..n {
            for j in 0..n {
                for z in 0..2 {
                    assert!(f64_eq(out[(i, j, z)], src[(j, n - 1 - i, z)]));
                }
            }
        }
    }

    #[test]
    fn test_rotate_zero_is_identity() {
        let src = Array3::from_shape_fn((5, 4, 3), |(x, y, z)| (x + 2 * y + 3 * z) as f64);
        let out = rotate_plane(src.view(), 0.0);
        assert!(out.iter().zip(src.iter()).all(|(a, b)| f64_eq(*a, *b)));
    }

    #[test]
    fn test_rotate_360_composes() {
        let src = Array3::from_shape_fn((5, 5, 1), |(x, y, _)| (x * 5 + y) as f64);
        let mut v = src.clone();
        for _ in 0..4 {
            v = rotate_plane(v.view(), 90.0);
        }
        assert!(v.iter().zip(src.iter()).all(|(a, b)| f64_eq(*a, *b)));
    }

    /// 5x5 平面旋转 30 度的逐点参考值 (ndimage 约定, order 3, constant 模式).
    #[test]
    fn test_rotate_30_reference_values() {
        let src = Array3::from_shape_fn((5, 5, 1), |(i, j, _)| ((i * 5 + j * 3) % 7) as f64);
        let out = rotate_plane(src.view(), 30.0);
        let expected = [
            [0.0, 0.0, 1.564516948173711, 3.590625669959480, 0.0],
            [1.857163360030276, 4.162846255877010, 2.122124495083274, 2.278793313940717, 0.0],
            [4.326129708563613, 3.194273909376235, 2.0, 4.267808813425360, 5.731112256082132],
            [0.0, 4.725407356065989, 2.339068713928003, 1.461355001298851, 1.408583355280606],
            [0.0, 2.210160386066813, 2.159548914723625, 0.0, 0.0],
        ];
        for (i, row) in expected.iter().enumerate() {
            for (j, e) in row.iter().enumerate() {
                let got = out[(i, j, 0)];
                assert!((got - e).abs() < 1e-9, "({i}, {j}): {got} != {e}");
            }
        }
    }

    /// 30 度旋转: 形状不变, 中心不动, 角落转出画布后为 0.
    #[test]
    fn test_rotate_30_keeps_shape_and_center() {
        let n = 9;
        let mut src = Array3::<f64>::zeros((n, n, 2));
        src.slice_mut(s![3..6, 3..6, ..]).fill(1.0);
        src[(0, 0, 0)] = 1.0;
        let out = rotate_plane(src.view(), 30.0);
        assert_eq!(out.dim(), (n, n, 2));
        assert!(f64_eq(out[(4, 4, 0)], rotate_plane(src.view(), -30.0)[(4, 4, 0)]));
        assert!(out[(4, 4, 1)] > 0.9);
        // 角落的源坐标落在画布之外.
        assert_eq!(out[(0, 0, 1)], 0.0);
        assert_eq!(out[(n - 1, n - 1, 1)], 0.0);
    }
}
