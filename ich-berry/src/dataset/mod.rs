//! 数据集操作.
//!
//! 数据集按如下目录结构组织 (见 [`CohortLayout`]):
//!
//! ```text
//! {root}/
//!   expansion/           血肿扩大组
//!     trainval/
//!       image/*.nii.gz
//!       mask/*.nii.gz
//!       clinical.csv     (仅多模态流程需要)
//!     test/
//!       ...
//!   no_expansion/        未扩大组
//!     ...
//! ```

use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

pub mod assemble;
pub mod augment;
pub mod npz;
pub mod scan;
pub mod split;
pub mod tabular;

pub use assemble::{assemble, CaseRecord, Dataset, SplitTensors};
pub use npz::{load_split, write_split};

/// 指定数据集根目录的环境变量.
pub const DATASET_DIR_ENV: &str = "ICH_DATASET_DIR";

/// 获取 `{用户主目录}/dataset` 目录.
pub fn home_dataset_dir() -> Option<PathBuf> {
    let mut ans = dirs::home_dir()?;
    ans.push("dataset");
    Some(ans)
}

/// 获取 `{用户主目录}/dataset` 目录下给定继续项组成的全路径.
pub fn home_dataset_dir_with<P: AsRef<Path>, I: IntoIterator<Item = P>>(it: I) -> Option<PathBuf> {
    let mut ans = home_dataset_dir()?;
    ans.extend(it);
    Some(ans)
}

/// 获取数据集根目录.
///
/// 1. 若环境变量 `$ICH_DATASET_DIR` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/dataset/ich`. 无法确定主目录时返回 `None`.
pub fn dataset_dir_from_env_or_home() -> Option<PathBuf> {
    match env::var(DATASET_DIR_ENV) {
        Ok(d) if !d.is_empty() => Some(PathBuf::from(d)),
        _ => home_dataset_dir_with(["ich"]),
    }
}

/// 病例类别, 由所在目录决定.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CohortClass {
    /// 血肿扩大.
    Expansion,

    /// 血肿未扩大.
    NoExpansion,
}

impl CohortClass {
    /// 两个类别, 按组装时的拼接顺序排列.
    pub const ALL: [CohortClass; 2] = [CohortClass::Expansion, CohortClass::NoExpansion];

    /// 类别对应的目录名.
    #[inline]
    pub const fn dir_name(self) -> &'static str {
        match self {
            CohortClass::Expansion => "expansion",
            CohortClass::NoExpansion => "no_expansion",
        }
    }

    /// 类别标签.
    #[inline]
    pub const fn label(self) -> u8 {
        use crate::consts::assemble::{LABEL_EXPANSION, LABEL_NO_EXPANSION};
        match self {
            CohortClass::Expansion => LABEL_EXPANSION,
            CohortClass::NoExpansion => LABEL_NO_EXPANSION,
        }
    }
}

impl fmt::Display for CohortClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// 病例池的用途.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    /// 训练 + 验证池, 打乱后按比例划分.
    TrainVal,

    /// 测试集, 保持文件顺序.
    Test,
}

impl Role {
    /// 用途对应的目录名.
    #[inline]
    pub const fn dir_name(self) -> &'static str {
        match self {
            Role::TrainVal => "trainval",
            Role::Test => "test",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// 数据集目录结构.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CohortLayout {
    root: PathBuf,
}

impl CohortLayout {
    /// 扫描所在子目录名.
    pub const IMAGE_DIR: &'static str = "image";

    /// 标注所在子目录名.
    pub const MASK_DIR: &'static str = "mask";

    /// 临床表格文件名.
    pub const TABLE_FILE: &'static str = "clinical.csv";

    /// 以 `root` 为根目录.
    #[inline]
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// 以 [`dataset_dir_from_env_or_home`] 为根目录.
    pub fn from_env_or_home() -> Option<Self> {
        dataset_dir_from_env_or_home().map(Self::new)
    }

    /// 根目录.
    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `{root}/{class}/{role}`.
    pub fn pool_dir(&self, class: CohortClass, role: Role) -> PathBuf {
        self.root.join(class.dir_name()).join(role.dir_name())
    }

    /// 扫描目录.
    #[inline]
    pub fn image_dir(&self, class: CohortClass, role: Role) -> PathBuf {
        self.pool_dir(class, role).join(Self::IMAGE_DIR)
    }

    /// 标注目录.
    #[inline]
    pub fn mask_dir(&self, class: CohortClass, role: Role) -> PathBuf {
        self.pool_dir(class, role).join(Self::MASK_DIR)
    }

    /// 临床表格路径.
    #[inline]
    pub fn table_path(&self, class: CohortClass, role: Role) -> PathBuf {
        self.pool_dir(class, role).join(Self::TABLE_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_paths() {
        let layout = CohortLayout::new("/data/ich");
        assert_eq!(
            layout.image_dir(CohortClass::Expansion, Role::TrainVal),
            PathBuf::from("/data/ich/expansion/trainval/image")
        );
        assert_eq!(
            layout.mask_dir(CohortClass::NoExpansion, Role::Test),
            PathBuf::from("/data/ich/no_expansion/test/mask")
        );
        assert_eq!(
            layout.table_path(CohortClass::NoExpansion, Role::TrainVal),
            PathBuf::from("/data/ich/no_expansion/trainval/clinical.csv")
        );
    }

    #[test]
    fn test_labels() {
        assert_eq!(CohortClass::Expansion.label(), 1);
        assert_eq!(CohortClass::NoExpansion.label(), 0);
        assert_eq!(CohortClass::ALL[0], CohortClass::Expansion);
    }
}
