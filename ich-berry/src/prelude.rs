//! 🧠欢迎光临🩸
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::Idx3d;

pub use crate::data::{IntensityWindow, NiftiHeaderAttr, RawVolume};
pub use crate::{PrepError, Result};

pub use crate::config::{
    AugmentConfig, AugmentTarget, Channel, NormalizeConfig, PairingConfig, PipelineConfig, Variant,
};

pub use crate::normalize::{normalize, VolumeKind};

pub use crate::dataset::scan::{pair_cases, CasePair};
pub use crate::dataset::{
    assemble, dataset_dir_from_env_or_home, home_dataset_dir_with, load_split, CaseRecord,
    CohortClass, CohortLayout, Dataset, Role, SplitTensors,
};
