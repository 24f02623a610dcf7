//! 通用常量.
//!
//! 这些值都是预处理流程的默认参数, 实际运行时以 [`crate::config`] 中的配置为准.

/// 几何归一化相关常量.
pub mod geometry {
    /// 目标 z 方向 (相邻切片方向) 体素分辨率, 以毫米为单位.
    pub const TARGET_AXIAL_MM: f64 = 2.0;

    /// 目标水平切片个数.
    pub const TARGET_SLICES: usize = 80;

    /// 目标水平方向像素分辨率, 以毫米为单位.
    pub const TARGET_PIXEL_MM: f64 = 0.5;

    /// 水平方向补零后的边长.
    ///
    /// 注意是 513 而不是 512, 这是有意为之. 补零量按
    /// `floor((513 - extent) / 2)` 计算, 因此结果边长可能是 512 或 513.
    /// 不要把它 "修正" 为 512, 否则所有病例的体素值都会改变.
    pub const PAD_EXTENT: usize = 513;

    /// 网络输入的水平方向边长.
    pub const INPUT_EXTENT: usize = 256;

    /// 方向统一时的旋转角度 (度).
    pub const ORIENT_DEGREES: f64 = 90.0;

    /// 方向统一后保留的小数位数.
    pub const ROUND_DECIMALS: i32 = 10;
}

/// 强度相关常量.
pub mod intensity {
    /// 默认 HU 窗下限.
    pub const HU_LOWER: f64 = 0.0;

    /// 默认 HU 窗上限.
    pub const HU_UPPER: f64 = 100.0;

    /// 插值后重新二值化标注的阈值. `>= MASK_THRESHOLD` 的体素为前景.
    pub const MASK_THRESHOLD: f64 = 0.2;
}

/// 数据集组装相关常量.
pub mod assemble {
    /// 训练集在 (训练 + 验证) 池中所占比例. 分界点向下取整.
    pub const TRAIN_FRACTION: f64 = 0.7;

    /// 仅影像流程使用的打乱种子.
    pub const IMAGE_ONLY_SEED: u64 = 0;

    /// 多模态 (影像 + 临床表格) 流程使用的打乱种子.
    pub const MULTIMODAL_SEED: u64 = 42;

    /// 默认的旋转增强角度 (度).
    pub const ROTATION_DEGREES: f64 = 30.0;

    /// 血肿扩大组标签.
    pub const LABEL_EXPANSION: u8 = 1;

    /// 血肿未扩大组标签.
    pub const LABEL_NO_EXPANSION: u8 = 0;

    /// 临床表格的列数 (抗凝药物, 收缩压, 舒张压, PT-INR, 发病至扫描时间).
    pub const TABULAR_COLUMNS: usize = 5;
}
