use crate::consts::intensity::{HU_LOWER, HU_UPPER};
use ndarray::Array3;
use serde::{Deserialize, Serialize};

/// HU 强度窗, 包含下限和上限.
///
/// 与一般的显示窗不同, 窗外的值不会被截断到边界, 而是直接置零:
/// 骨骼、空气和伪影都被视为背景. 窗内的值再除以窗上限, 映射到 \[0, 1\].
///
/// 该窗口是只读的. 若要修改窗口参数, 你应该创建新的实例.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntensityWindow {
    lower: f64,
    upper: f64,
}

impl Default for IntensityWindow {
    #[inline]
    fn default() -> Self {
        Self::brain()
    }
}

impl IntensityWindow {
    /// 构建强度窗.
    ///
    /// 需要 `0 <= lower < upper <= 1e5`, 否则返回 `None`.
    /// 下限不能为负, 否则归一化结果会超出 \[0, 1\].
    pub fn new(lower: f64, upper: f64) -> Option<IntensityWindow> {
        if (0.0..upper).contains(&lower) && upper <= 1e5 {
            Some(Self { lower, upper })
        } else {
            None
        }
    }

    /// 覆盖脑组织和新鲜血肿的强度窗, 即 \[0, 100\] HU.
    #[inline]
    pub const fn brain() -> IntensityWindow {
        Self {
            lower: HU_LOWER,
            upper: HU_UPPER,
        }
    }

    /// 窗下限.
    #[inline]
    pub fn lower_bound(&self) -> f64 {
        self.lower
    }

    /// 窗上限.
    #[inline]
    pub fn upper_bound(&self) -> f64 {
        self.upper
    }

    /// 求 `hu` 对应的归一化强度 (0.0 <= value <= 1.0).
    ///
    /// 窗外的值和无意义的值 (如 inf, NaN) 都映射为 0.
    #[inline]
    pub fn eval(&self, hu: f64) -> f64 {
        if hu.is_finite() && (self.lower..=self.upper).contains(&hu) {
            hu / self.upper
        } else {
            0.0
        }
    }

    /// 对整个体数据应用该窗口, 返回新的数组.
    pub fn apply(&self, volume: &Array3<f64>) -> Array3<f64> {
        volume.mapv(|v| self.eval(v))
    }
}
