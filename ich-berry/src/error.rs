//! 运行时错误.
//!
//! 预处理是一次性的离线批处理任务, 任何错误都会中止整个队列的构建,
//! 因此每个变体都尽量携带出错的文件或病例信息.

use std::path::PathBuf;

/// 预处理 / 数据集组装的运行时错误.
#[derive(Debug, thiserror::Error)]
pub enum PrepError {
    /// 底层 I/O 错误.
    #[error("无法访问 `{path}`: {source}")]
    Io {
        /// 出错路径.
        path: PathBuf,
        /// 底层错误.
        source: std::io::Error,
    },

    /// nifti 文件无法解析.
    #[error("无法读取 nifti 文件 `{path}`: {source}")]
    Nifti {
        /// 出错路径.
        path: PathBuf,
        /// 底层错误.
        source: nifti::NiftiError,
    },

    /// nifti 数据维度不是 3D (或末维为 1 的 4D).
    #[error("`{path}` 的数据维度 {shape:?} 不是 3D 体数据")]
    NotAVolume {
        /// 出错路径.
        path: PathBuf,
        /// 实际形状.
        shape: Vec<usize>,
    },

    /// 临床表格无法解析.
    #[error("无法读取临床表格 `{path}`: {source}")]
    Csv {
        /// 出错路径.
        path: PathBuf,
        /// 底层错误.
        source: csv::Error,
    },

    /// 写入 npz 失败.
    #[error("无法写入 npz 文件 `{path}`: {source}")]
    WriteNpz {
        /// 出错路径.
        path: PathBuf,
        /// 底层错误.
        source: ndarray_npy::WriteNpzError,
    },

    /// 读取 npz 失败.
    #[error("无法读取 npz 文件 `{path}`: {source}")]
    ReadNpz {
        /// 出错路径.
        path: PathBuf,
        /// 底层错误.
        source: ndarray_npy::ReadNpzError,
    },

    /// 目录下没有任何 nifti 文件.
    #[error("目录 `{0}` 下没有 nifti 文件")]
    EmptyDirectory(PathBuf),

    /// 扫描目录与标注目录中的文件个数不一致.
    #[error("扫描目录 `{image_dir}` 有 {images} 个文件, 但标注目录 `{mask_dir}` 有 {masks} 个")]
    PairCountMismatch {
        /// 扫描目录.
        image_dir: PathBuf,
        /// 标注目录.
        mask_dir: PathBuf,
        /// 扫描文件个数.
        images: usize,
        /// 标注文件个数.
        masks: usize,
    },

    /// 排序后同一位置的扫描与标注不属于同一病例.
    #[error("扫描 `{image}` 与标注 `{mask}` 不是同一病例")]
    PairKeyMismatch {
        /// 扫描文件.
        image: PathBuf,
        /// 标注文件.
        mask: PathBuf,
    },

    /// 临床表格行数与病例数不一致.
    #[error("临床表格 `{table}` 有 {rows} 行, 但对应目录有 {cases} 个病例")]
    TableRowMismatch {
        /// 表格路径.
        table: PathBuf,
        /// 表格行数.
        rows: usize,
        /// 病例数.
        cases: usize,
    },

    /// 两个体数据形状不一致.
    #[error("{what}: 形状 {left:?} 与 {right:?} 不一致")]
    ShapeMismatch {
        /// 发生位置.
        what: &'static str,
        /// 左侧形状.
        left: Vec<usize>,
        /// 右侧形状.
        right: Vec<usize>,
    },

    /// 原始几何信息导致负的补零量 / 空切片等无意义结果.
    #[error("退化的几何信息: {0}")]
    DegenerateGeometry(String),

    /// 配置错误.
    #[error("配置错误: {0}")]
    InvalidConfig(String),
}

impl PrepError {
    /// 包装 I/O 错误.
    #[inline]
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// 预处理运行时结果.
pub type Result<T> = std::result::Result<T, PrepError>;
