#![warn(missing_docs)] // <= 合适时移除它.
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 将脑出血 (ICH) 病例的 3D CT nifti 扫描与血肿标注预处理为统一形状,
//! 并组装成用于血肿扩大预测的训练 / 验证 / 测试集.
//!
//! 该 crate 只提供 `safe` 接口. 所有可能失败的操作都返回 [`Result`],
//! 批处理中任意病例出错都会中止整个流程, 不产出部分结果.
//!
//! # 注意
//!
//! 1. 体数据始终按 nifti 原生的 `(X, Y, Z)` 顺序保存为 `f64`, 输出张量形状为
//!   `(N, H, W, S, 1)`, 其中 `(H, W, S)` 即归一化后的 `(X, Y, Z)`.
//! 2. 库本身只通过 `log` 门面输出日志, 不安装任何 logger.
//!
//! # 开发计划
//!
//! ### nifti 读取与强度窗 ✅
//!
//! 读取 `.nii` / `.nii.gz`, 应用 `scl_slope`/`scl_inter`, HU 窗 \[0, 100\] 归一化到 \[0, 1\].
//!
//! 实现位于 `ich-berry/src/data`.
//!
//! ### 三次 B 样条重采样 ✅
//!
//! 按轴缩放与水平面内旋转, 镜像边界预滤波. 旋转时画布外取 0.
//!
//! 实现位于 `ich-berry/src/resample`.
//!
//! ### 几何归一化 ✅
//!
//! 1. z 方向 2mm / 80 层, 多余层从前面丢弃, 不足时在前面补零; ✅
//! 2. 水平 0.5mm 像素, 补零到 513 (因此边长为 512 或 513); ✅
//! 3. 缩放到 256; ✅
//! 4. 旋转 90 度并保留 10 位小数. ✅
//!
//! 实现位于 `ich-berry/src/normalize`.
//!
//! ### 血肿提取 ✅
//!
//! `max(original - 1 + mask, 0)`.
//!
//! 实现位于 `ich-berry/src/hematoma.rs`.
//!
//! ### 数据集组装 ✅
//!
//! 1. 扫描 / 标注按文件名排序后配对, 并校验病例名; ✅
//! 2. 按类别打乱、按 0.7 划分; ✅
//! 3. 仅对扩大组训练集做 30 度旋转与 Y 轴镜像增强; ✅
//! 4. 临床表格编码与标准化; ✅
//! 5. npz 输出. ✅
//!
//! 实现位于 `ich-berry/src/dataset`.
//!
//! ### 流程配置 ✅
//!
//! 所有常量都可以通过 [`PipelineConfig`] 覆盖, 配置可以 serde 序列化.
//!
//! ### 完善代码文档 ⌛️
//!
//! 给每个 public API 提供文档, 并视情况给 private
//! API 提供文档.

/// 三维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx3d = (usize, usize, usize);

/// 3D CT nii 文件基础数据结构.
pub mod data;

pub use data::{IntensityWindow, NiftiHeaderAttr, RawVolume};

pub mod config;
pub mod consts;
mod error;

pub use config::{AugmentConfig, AugmentTarget, Channel, NormalizeConfig, PipelineConfig, Variant};
pub use error::{PrepError, Result};

pub mod resample;

pub mod normalize;

pub mod hematoma;

pub mod dataset;
pub mod prelude;
