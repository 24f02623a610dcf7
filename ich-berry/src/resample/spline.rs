//! 三次 B 样条插值核.
//!
//! 预滤波将采样值转换为 B 样条系数 (单极点 `z = sqrt(3) - 2` 的因果 + 反因果递推),
//! 边界按镜像 (mirror, 不重复端点) 延拓. 求值时每个位置取 4 个相邻系数加权求和.

use ndarray::{ArrayView1, ArrayViewMut1};

/// 三次 B 样条的极点.
#[inline]
fn pole() -> f64 {
    3.0_f64.sqrt() - 2.0
}

/// 将一条采样线就地转换为三次 B 样条系数. 长度小于 2 时不做任何事.
pub(crate) fn prefilter(c: &mut [f64]) {
    let n = c.len();
    if n < 2 {
        return;
    }
    let z = pole();
    let gain = (1.0 - z) * (1.0 - 1.0 / z);
    c.iter_mut().for_each(|v| *v *= gain);

    // 因果方向初值, 镜像边界.
    let z_n_1 = z.powi(n as i32 - 1);
    let mut z_i = z;
    let mut c0 = c[0] + z_n_1 * c[n - 1];
    for i in 1..(n - 1) {
        c0 += z_i * (c[i] + z_n_1 * c[n - 1 - i]);
        z_i *= z;
    }
    c[0] = c0 / (1.0 - z_n_1 * z_n_1);
    for i in 1..n {
        c[i] += z * c[i - 1];
    }

    // 反因果方向初值, 镜像边界.
    c[n - 1] = (z * c[n - 2] + c[n - 1]) * z / (z * z - 1.0);
    for i in (0..(n - 1)).rev() {
        c[i] = z * (c[i + 1] - c[i]);
    }
}

/// 对一条可能不连续的 lane 就地预滤波.
pub(crate) fn prefilter_lane(mut lane: ArrayViewMut1<f64>) {
    if let Some(s) = lane.as_slice_mut() {
        prefilter(s);
    } else {
        let mut buf = lane.to_vec();
        prefilter(&mut buf);
        lane.assign(&ArrayView1::from(&buf));
    }
}

/// 将任意整数下标按镜像规则折回 `[0, len)`.
#[inline]
fn mirror(i: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let period = 2 * (len as isize - 1);
    let i = i.rem_euclid(period);
    if i >= len as isize {
        (period - i) as usize
    } else {
        i as usize
    }
}

/// 某个采样位置对应的 4 个系数下标及其权重.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Taps {
    idx: [usize; 4],
    w: [f64; 4],
}

impl Taps {
    /// 计算长度为 `len` 的系数线上坐标 `x` 处的插值抽头. 要求 `0 <= x <= len - 1`.
    pub fn at(x: f64, len: usize) -> Self {
        debug_assert!(len > 0);
        let fl = x.floor();
        let t = x - fl;
        let start = fl as isize - 1;

        let u = 1.0 - t;
        let w0 = u * u * u / 6.0;
        let w1 = (t * t * (t - 2.0) * 3.0 + 4.0) / 6.0;
        let w2 = (u * u * (u - 2.0) * 3.0 + 4.0) / 6.0;
        let w3 = 1.0 - w0 - w1 - w2;

        let idx = [0, 1, 2, 3].map(|k| mirror(start + k, len));
        Self {
            idx,
            w: [w0, w1, w2, w3],
        }
    }

    /// 在系数线 `c` 上求值.
    #[inline]
    pub fn eval(&self, c: &[f64]) -> f64 {
        self.idx
            .iter()
            .zip(self.w.iter())
            .map(|(i, w)| c[*i] * w)
            .sum()
    }

    /// 下标.
    #[inline]
    pub fn indices(&self) -> &[usize; 4] {
        &self.idx
    }

    /// 权重.
    #[inline]
    pub fn weights(&self) -> &[f64; 4] {
        &self.w
    }
}

#[cfg(test)]
mod tests {
    use super::{mirror, prefilter, Taps};

    fn f64_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_mirror_index() {
        // len = 4: ... 2 1 | 0 1 2 3 | 2 1 0 ...
        let got: Vec<usize> = (-3..8).map(|i| mirror(i, 4)).collect();
        assert_eq!(got, vec![3, 2, 1, 0, 1, 2, 3, 2, 1, 0, 1]);
        assert_eq!(mirror(-5, 1), 0);
    }

    #[test]
    fn test_weights_partition_unity() {
        for k in 0..=20 {
            let x = 3.0 + k as f64 / 20.0;
            let taps = Taps::at(x, 10);
            assert!(f64_eq(taps.weights().iter().sum::<f64>(), 1.0));
        }
    }

    /// 在整数位置求值应当还原原始采样.
    #[test]
    fn test_interpolating_at_knots() {
        let samples = [0.0, 3.5, -1.0, 2.0, 8.0, 8.0, 0.25];
        let mut c = samples.to_vec();
        prefilter(&mut c);
        for (i, s) in samples.iter().enumerate() {
            assert!(f64_eq(Taps::at(i as f64, c.len()).eval(&c), *s));
        }
    }

    /// 线性函数在远离边界处几乎被精确重建. 镜像边界会在端点附近引入衰减很快的误差.
    #[test]
    fn test_linear_reproduction_away_from_edges() {
        let samples: Vec<f64> = (0..16).map(|i| 2.0 * i as f64 + 1.0).collect();
        let mut c = samples.clone();
        prefilter(&mut c);
        let x = 7.3;
        assert!((Taps::at(x, c.len()).eval(&c) - (2.0 * x + 1.0)).abs() < 1e-4);
    }

    #[test]
    fn test_constant_line() {
        let mut c = vec![0.7; 9];
        prefilter(&mut c);
        for k in 0..=80 {
            let x = k as f64 / 10.0;
            assert!(f64_eq(Taps::at(x, 9).eval(&c), 0.7));
        }
    }

    #[test]
    fn test_short_lines() {
        let mut one = vec![5.0];
        prefilter(&mut one);
        assert_eq!(one, vec![5.0]);
        assert!(f64_eq(Taps::at(0.0, 1).eval(&one), 5.0));

        let samples = [1.0, 4.0];
        let mut two = samples.to_vec();
        prefilter(&mut two);
        assert!(f64_eq(Taps::at(0.0, 2).eval(&two), 1.0));
        assert!(f64_eq(Taps::at(1.0, 2).eval(&two), 4.0));
    }
}
