//! 流程配置.
//!
//! 所有阶段都只读取显式传入的配置, 不存在全局可变状态.
//! 配置可以通过 serde 从文件加载, 缺省字段取默认值.

use serde::{Deserialize, Serialize};

use crate::consts::{assemble, geometry, intensity};
use crate::data::IntensityWindow;
use crate::error::{PrepError, Result};

/// 几何 / 强度归一化配置.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    /// 原始扫描的强度窗.
    pub window: IntensityWindow,

    /// 目标 z 方向体素分辨率 (毫米).
    pub target_axial_mm: f64,

    /// 目标切片个数.
    pub target_slices: usize,

    /// 目标水平方向像素分辨率 (毫米).
    pub target_pixel_mm: f64,

    /// 补零后的水平边长, 见 [`geometry::PAD_EXTENT`].
    pub pad_extent: usize,

    /// 网络输入的水平边长.
    pub input_extent: usize,

    /// 标注重新二值化的阈值.
    pub mask_threshold: f64,

    /// 方向统一时的旋转角度 (度).
    pub orient_degrees: f64,

    /// 方向统一后保留的小数位数.
    pub round_decimals: i32,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            window: IntensityWindow::brain(),
            target_axial_mm: geometry::TARGET_AXIAL_MM,
            target_slices: geometry::TARGET_SLICES,
            target_pixel_mm: geometry::TARGET_PIXEL_MM,
            pad_extent: geometry::PAD_EXTENT,
            input_extent: geometry::INPUT_EXTENT,
            mask_threshold: intensity::MASK_THRESHOLD,
            orient_degrees: geometry::ORIENT_DEGREES,
            round_decimals: geometry::ROUND_DECIMALS,
        }
    }
}

impl NormalizeConfig {
    /// 归一化后体数据的形状 `(H, W, S)`.
    #[inline]
    pub fn output_shape(&self) -> (usize, usize, usize) {
        (self.input_extent, self.input_extent, self.target_slices)
    }

    /// 检查配置是否有意义.
    pub fn validate(&self) -> Result<()> {
        let (lower, upper) = (self.window.lower_bound(), self.window.upper_bound());
        if IntensityWindow::new(lower, upper).is_none() {
            return Err(PrepError::InvalidConfig(format!(
                "强度窗 [{lower}, {upper}] 无意义"
            )));
        }
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(self.target_axial_mm) || !positive(self.target_pixel_mm) {
            return Err(PrepError::InvalidConfig("目标体素分辨率必须为正".into()));
        }
        if self.target_slices == 0 || self.pad_extent == 0 || self.input_extent == 0 {
            return Err(PrepError::InvalidConfig("目标形状不能为空".into()));
        }
        if !(self.mask_threshold > 0.0 && self.mask_threshold <= 1.0) {
            return Err(PrepError::InvalidConfig(format!(
                "标注阈值 {} 不在 (0, 1] 内",
                self.mask_threshold
            )));
        }
        if !(0..=15).contains(&self.round_decimals) {
            return Err(PrepError::InvalidConfig(format!(
                "小数位数 {} 不在 [0, 15] 内",
                self.round_decimals
            )));
        }
        Ok(())
    }
}

/// 流程变体. 两个变体使用不同的默认打乱种子, 不要求彼此的划分一致.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    /// 仅影像.
    #[default]
    ImageOnly,

    /// 影像 + 临床表格.
    Multimodal,
}

impl Variant {
    /// 该变体的默认打乱种子.
    #[inline]
    pub const fn default_seed(self) -> u64 {
        match self {
            Variant::ImageOnly => assemble::IMAGE_ONLY_SEED,
            Variant::Multimodal => assemble::MULTIMODAL_SEED,
        }
    }

    /// 是否需要临床表格.
    #[inline]
    pub const fn uses_tabular(self) -> bool {
        matches!(self, Variant::Multimodal)
    }
}

/// 送入网络的影像通道.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Channel {
    /// 归一化后的原始扫描, 不读取标注.
    Original,

    /// 只保留血肿区域的强度, 需要标注.
    #[default]
    Hematoma,
}

impl Channel {
    /// 是否需要读取标注.
    #[inline]
    pub const fn uses_masks(self) -> bool {
        matches!(self, Channel::Hematoma)
    }
}

/// 哪些类别的训练集会被增强.
///
/// 默认只增强血肿扩大组. 这种不对称是为了缓解类别不平衡, 改成两组都增强会改变训练数据.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum AugmentTarget {
    /// 仅血肿扩大组.
    #[default]
    Expansion,

    /// 两组都增强.
    AllClasses,

    /// 不增强.
    Disabled,
}

/// 训练集增强配置.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AugmentConfig {
    /// 被增强的类别.
    pub target: AugmentTarget,

    /// 旋转角度 (度). 每个角度把当前集合翻倍.
    pub rotations: Vec<f64>,

    /// 是否追加沿 Y 轴镜像的副本 (在所有旋转之后, 再翻倍一次).
    pub flip: bool,
}

impl Default for AugmentConfig {
    fn default() -> Self {
        Self {
            target: AugmentTarget::Expansion,
            rotations: vec![assemble::ROTATION_DEGREES],
            flip: true,
        }
    }
}

/// 扫描 / 标注配对的校验规则.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairingConfig {
    /// 是否要求排序后同一位置的扫描与标注有相同的病例名.
    /// 关闭后只校验文件个数.
    pub verify_keys: bool,

    /// 标注文件名相对扫描文件名多出的后缀 (扩展名之前), 如 `_mask`.
    pub mask_suffix: String,
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            verify_keys: true,
            mask_suffix: String::new(),
        }
    }
}

/// 整个预处理 + 数据集组装流程的配置.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// 流程变体.
    pub variant: Variant,

    /// 打乱种子. 为空时使用变体的默认种子.
    pub seed: Option<u64>,

    /// 训练集所占比例.
    pub train_fraction: f64,

    /// 影像通道.
    pub channel: Channel,

    /// 归一化配置.
    pub normalize: NormalizeConfig,

    /// 增强配置.
    pub augment: AugmentConfig,

    /// 配对校验配置.
    pub pairing: PairingConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::for_variant(Variant::ImageOnly)
    }
}

impl PipelineConfig {
    /// 指定变体, 其余取默认值.
    pub fn for_variant(variant: Variant) -> Self {
        Self {
            variant,
            seed: None,
            train_fraction: assemble::TRAIN_FRACTION,
            channel: Channel::Hematoma,
            normalize: NormalizeConfig::default(),
            augment: AugmentConfig::default(),
            pairing: PairingConfig::default(),
        }
    }

    /// 实际使用的打乱种子.
    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed.unwrap_or_else(|| self.variant.default_seed())
    }

    /// 检查配置是否有意义.
    pub fn validate(&self) -> Result<()> {
        if !(self.train_fraction > 0.0 && self.train_fraction <= 1.0) {
            return Err(PrepError::InvalidConfig(format!(
                "训练集比例 {} 不在 (0, 1] 内",
                self.train_fraction
            )));
        }
        if self.augment.rotations.iter().any(|d| !d.is_finite()) {
            return Err(PrepError::InvalidConfig("旋转角度必须是有限值".into()));
        }
        self.normalize.validate()
    }
}
