//! 数据集组装.
//!
//! 流程: 加载 -> 按类别分池 -> 打乱 -> 划分 -> 增强 (训练集) -> 打标签
//! -> 拼接 (扩大组在前) -> 附加临床表格 -> 输出张量.

use log::{debug, info};
use ndarray::{stack, Array1, Array2, Array3, Array5, ArrayView1, ArrayView3, Axis};

use super::augment::augment;
use super::scan::{cases_for_channel, load_cases};
use super::split::{shuffle, split_at_fraction};
use super::tabular::{load_table, Standardizer};
use super::{CohortClass, CohortLayout, Role};
use crate::config::PipelineConfig;
use crate::consts::assemble::TABULAR_COLUMNS;
use crate::error::{PrepError, Result};
use crate::Idx3d;

/// 一个病例 (或其增强副本).
#[derive(Clone, Debug, PartialEq)]
pub struct CaseRecord {
    /// 病例名. 增强副本带有 `+rot30`、`+flip` 之类的后缀.
    pub id: String,

    /// 归一化后的体数据, 形状 `(H, W, S)`.
    pub volume: Array3<f64>,

    /// 标准化后的临床表格行, 仅多模态流程有.
    pub tabular: Option<Array1<f64>>,

    /// 类别标签.
    pub label: u8,
}

impl CaseRecord {
    /// 以新的体数据创建副本, 病例名追加 `+tag`. 标签与表格行不变.
    pub fn derive(&self, tag: String, volume: Array3<f64>) -> Self {
        Self {
            id: format!("{}+{tag}", self.id),
            volume,
            tabular: self.tabular.clone(),
            label: self.label,
        }
    }
}

/// 一个划分的张量形式.
#[derive(Clone, Debug, PartialEq)]
pub struct SplitTensors {
    /// 病例名, 与张量第 0 维一一对应.
    pub ids: Vec<String>,

    /// 影像, 形状 `(N, H, W, S, 1)`.
    pub images: Array5<f64>,

    /// 标签, 形状 `(N,)`.
    pub labels: Array1<u8>,

    /// 临床表格, 形状 `(N, 5)`. 仅多模态流程有.
    pub tabular: Option<Array2<f64>>,
}

impl SplitTensors {
    /// 将记录按顺序拼成张量. 每条记录的体数据形状必须是 `shape`.
    pub fn from_records(
        records: Vec<CaseRecord>,
        shape: Idx3d,
        with_tabular: bool,
    ) -> Result<Self> {
        let (h, w, s) = shape;
        if let Some(bad) = records.iter().find(|r| r.volume.dim() != shape) {
            return Err(PrepError::ShapeMismatch {
                what: "拼接影像",
                left: vec![h, w, s],
                right: bad.volume.shape().to_vec(),
            });
        }
        let stack_err = |e: ndarray::ShapeError| PrepError::DegenerateGeometry(e.to_string());

        let images = if records.is_empty() {
            Array5::zeros((0, h, w, s, 1))
        } else {
            let views: Vec<ArrayView3<f64>> = records.iter().map(|r| r.volume.view()).collect();
            stack(Axis(0), &views).map_err(stack_err)?.insert_axis(Axis(4))
        };

        let tabular = if !with_tabular {
            None
        } else if records.is_empty() {
            Some(Array2::zeros((0, TABULAR_COLUMNS)))
        } else {
            let rows: Vec<ArrayView1<f64>> = records
                .iter()
                .map(|r| {
                    r.tabular.as_ref().map(|t| t.view()).ok_or_else(|| {
                        PrepError::InvalidConfig(format!("病例 `{}` 缺少临床表格行", r.id))
                    })
                })
                .collect::<Result<_>>()?;
            Some(stack(Axis(0), &rows).map_err(stack_err)?)
        };

        let labels = records.iter().map(|r| r.label).collect();
        let ids = records.into_iter().map(|r| r.id).collect();
        Ok(Self {
            ids,
            images,
            labels,
            tabular,
        })
    }

    /// 样本个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// 是否为空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// 标签为 `label` 的样本个数.
    pub fn count_label(&self, label: u8) -> usize {
        self.labels.iter().filter(|l| **l == label).count()
    }
}

/// 组装好的数据集.
#[derive(Clone, Debug)]
pub struct Dataset {
    /// 训练集 (已增强).
    pub train: SplitTensors,

    /// 验证集.
    pub val: SplitTensors,

    /// 测试集, 保持文件顺序.
    pub test: SplitTensors,

    /// 临床表格的标准化参数, 仅多模态流程有.
    pub standardizer: Option<Standardizer>,

    /// 实际使用的打乱种子.
    pub seed: u64,
}

/// 一个 (类别, 用途) 病例池.
struct Pool {
    class: CohortClass,
    role: Role,
    ids: Vec<String>,
    volumes: Vec<Array3<f64>>,
    table: Option<Array2<f64>>,
}

impl Pool {
    fn load(
        layout: &CohortLayout,
        class: CohortClass,
        role: Role,
        cfg: &PipelineConfig,
    ) -> Result<Self> {
        let pairs = cases_for_channel(
            layout.image_dir(class, role),
            layout.mask_dir(class, role),
            cfg.channel,
            &cfg.pairing,
        )?;
        info!("{class}/{role}: {} 个病例", pairs.len());

        let table = if cfg.variant.uses_tabular() {
            Some(load_table(layout.table_path(class, role), pairs.len())?)
        } else {
            None
        };
        let volumes = load_cases(&pairs, cfg.channel, &cfg.normalize)?;
        Ok(Self {
            class,
            role,
            ids: pairs.into_iter().map(|p| p.id).collect(),
            volumes,
            table,
        })
    }

    fn into_records(self) -> Vec<CaseRecord> {
        let label = self.class.label();
        let rows: Vec<Option<Array1<f64>>> = match &self.table {
            Some(t) => t.rows().into_iter().map(|r| Some(r.to_owned())).collect(),
            None => vec![None; self.ids.len()],
        };
        self.ids
            .into_iter()
            .zip(self.volumes)
            .zip(rows)
            .map(|((id, volume), tabular)| CaseRecord {
                id,
                volume,
                tabular,
                label,
            })
            .collect()
    }
}

/// 按 `cfg` 从 `layout` 组装训练 / 验证 / 测试集.
///
/// 每个类别的训练 + 验证池用同一种子各自打乱, 前 `floor(fraction * len)` 个为训练集.
/// 训练集按 [`crate::config::AugmentConfig`] 增强, 验证集与测试集不增强, 测试集不打乱.
/// 三个划分中扩大组都排在未扩大组之前.
///
/// 多模态流程的临床表格在两个类别的训练 + 验证表格上拟合标准化参数,
/// 然后应用到所有表格.
pub fn assemble(layout: &CohortLayout, cfg: &PipelineConfig) -> Result<Dataset> {
    cfg.validate()?;
    let seed = cfg.seed();
    info!(
        "组装数据集: 变体 {:?}, 通道 {:?}, 种子 {seed}",
        cfg.variant, cfg.channel
    );

    let mut pools = Vec::with_capacity(4);
    for class in CohortClass::ALL {
        for role in [Role::TrainVal, Role::Test] {
            pools.push(Pool::load(layout, class, role, cfg)?);
        }
    }

    let standardizer = if cfg.variant.uses_tabular() {
        let fitted = Standardizer::fit(
            pools
                .iter()
                .filter(|p| p.role == Role::TrainVal)
                .filter_map(|p| p.table.as_ref().map(|t| t.view())),
        )
        .ok_or_else(|| PrepError::InvalidConfig("训练 + 验证集临床表格为空".into()))?;
        for table in pools.iter_mut().filter_map(|p| p.table.as_mut()) {
            fitted.transform(table);
        }
        info!("临床表格标准化: 均值 {:?}, 标准差 {:?}", fitted.mean(), fitted.scale());
        Some(fitted)
    } else {
        None
    };

    let (mut train, mut val, mut test) = (Vec::new(), Vec::new(), Vec::new());
    for pool in pools {
        let (class, role) = (pool.class, pool.role);
        let records = pool.into_records();
        match role {
            Role::Test => test.extend(records),
            Role::TrainVal => {
                let (class_train, class_val) =
                    split_at_fraction(shuffle(records, seed), cfg.train_fraction);
                let before = class_train.len();
                let class_train = if cfg.augment.target.covers(class) {
                    augment(class_train, &cfg.augment)
                } else {
                    class_train
                };
                debug!(
                    "{class}: 训练 {before} -> {}, 验证 {}",
                    class_train.len(),
                    class_val.len()
                );
                train.extend(class_train);
                val.extend(class_val);
            }
        }
    }

    let shape = cfg.normalize.output_shape();
    let with_tabular = cfg.variant.uses_tabular();
    let dataset = Dataset {
        train: SplitTensors::from_records(train, shape, with_tabular)?,
        val: SplitTensors::from_records(val, shape, with_tabular)?,
        test: SplitTensors::from_records(test, shape, with_tabular)?,
        standardizer,
        seed,
    };
    info!(
        "组装完成: 训练 {}, 验证 {}, 测试 {}",
        dataset.train.len(),
        dataset.val.len(),
        dataset.test.len()
    );
    Ok(dataset)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::{Channel, NormalizeConfig, Variant};
    use crate::dataset::scan::tests::write_nifti;
    use std::path::Path;

    pub(crate) fn tiny_normalize() -> NormalizeConfig {
        NormalizeConfig {
            target_slices: 6,
            pad_extent: 17,
            input_extent: 8,
            ..NormalizeConfig::default()
        }
    }

    /// 在 `root` 下写一个病例池: `n` 个 4x4x3 的扫描与标注, 以及临床表格.
    fn write_pool(root: &Path, class: CohortClass, role: Role, n: usize) {
        let layout = CohortLayout::new(root);
        let (img, msk) = (layout.image_dir(class, role), layout.mask_dir(class, role));
        std::fs::create_dir_all(&img).unwrap();
        std::fs::create_dir_all(&msk).unwrap();

        let prefix = &class.dir_name()[..1];
        let mut csv = String::from("anticoagulant,sbp,dbp,pt_inr,onset_to_scan\n");
        for i in 0..n {
            let name = format!("{prefix}{i:02}.nii.gz");
            let hu = 5.0 + 9.0 * i as f64;
            let scan = Array3::from_shape_fn((4, 4, 3), |(x, y, _)| hu + (x + y) as f64);
            let mask = Array3::from_shape_fn((4, 4, 3), |(x, _, _)| (x > 0) as u8 as f64);
            write_nifti(&img.join(&name), &scan, [2.0, 2.0, 4.0]);
            write_nifti(&msk.join(&name), &mask, [2.0, 2.0, 4.0]);
            let drug = ["none", "warfarin", "doac"][i % 3];
            let (sbp, dbp, inr) = (120 + 3 * i, 70 + i, 1.0 + 0.1 * i as f64);
            csv.push_str(&format!("{drug},{sbp},{dbp},{inr},{}\n", i + 1));
        }
        std::fs::write(layout.table_path(class, role), csv).unwrap();
    }

    /// 扩大组与未扩大组各 10 个训练 + 验证病例, 测试集各 2 / 3 个.
    pub(crate) fn write_cohort(root: &Path) {
        write_pool(root, CohortClass::Expansion, Role::TrainVal, 10);
        write_pool(root, CohortClass::NoExpansion, Role::TrainVal, 10);
        write_pool(root, CohortClass::Expansion, Role::Test, 2);
        write_pool(root, CohortClass::NoExpansion, Role::Test, 3);
    }

    fn multimodal_config() -> PipelineConfig {
        let mut cfg = PipelineConfig::for_variant(Variant::Multimodal);
        cfg.normalize = tiny_normalize();
        cfg
    }

    #[test]
    fn test_end_to_end_counts_and_labels() {
        let tmp = tempfile::tempdir().unwrap();
        write_cohort(tmp.path());
        let layout = CohortLayout::new(tmp.path());
        let ds = assemble(&layout, &multimodal_config()).unwrap();

        // 扩大组 7 * 4 = 28, 未扩大组 7.
        assert_eq!(ds.train.len(), 35);
        assert_eq!(ds.train.images.dim(), (35, 8, 8, 6, 1));
        let expected: Vec<u8> = [1u8; 28].into_iter().chain([0u8; 7]).collect();
        assert_eq!(ds.train.labels.to_vec(), expected);

        assert_eq!(ds.val.len(), 6);
        assert_eq!(ds.val.labels.to_vec(), vec![1, 1, 1, 0, 0, 0]);

        assert_eq!(ds.test.ids, ["e00", "e01", "n00", "n01", "n02"]);
        assert_eq!(ds.test.labels.to_vec(), vec![1, 1, 0, 0, 0]);
        assert_eq!(ds.test.tabular.as_ref().map(|t| t.dim()), Some((5, 5)));
        assert!(ds.train.images.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_train_val_disjoint_and_complete() {
        let tmp = tempfile::tempdir().unwrap();
        write_cohort(tmp.path());
        let ds = assemble(&CohortLayout::new(tmp.path()), &multimodal_config()).unwrap();

        let mut originals: Vec<&str> = ds.train.ids[..7]
            .iter()
            .chain(&ds.train.ids[28..])
            .chain(&ds.val.ids)
            .map(String::as_str)
            .collect();
        originals.sort_unstable();
        let mut expected: Vec<String> = (0..10).map(|i| format!("e{i:02}")).collect();
        expected.extend((0..10).map(|i| format!("n{i:02}")));
        assert_eq!(originals, expected);
        assert!(ds.train.ids[7..28].iter().all(|id| id.contains('+')));
    }

    /// 标准化参数来自两个类别的全部训练 + 验证表格.
    #[test]
    fn test_tabular_uses_trainval_statistics() {
        let tmp = tempfile::tempdir().unwrap();
        write_cohort(tmp.path());
        let ds = assemble(&CohortLayout::new(tmp.path()), &multimodal_config()).unwrap();

        let s = ds.standardizer.as_ref().unwrap();
        // sbp = 120 + 3i, i = 0..10, 两个类别相同.
        assert!((s.mean()[0] - 133.5).abs() < 1e-9);

        let train = ds.train.tabular.as_ref().unwrap();
        let val = ds.val.tabular.as_ref().unwrap();
        let sum: f64 = (0..7)
            .chain(28..35)
            .map(|i| train[(i, 1)])
            .chain(val.column(1).iter().copied())
            .sum();
        assert!(sum.abs() < 1e-9);
        // 增强副本携带原始行.
        assert_eq!(train.row(0), train.row(7));
    }

    #[test]
    fn test_deterministic_and_seed_sensitive() {
        let tmp = tempfile::tempdir().unwrap();
        write_cohort(tmp.path());
        let layout = CohortLayout::new(tmp.path());
        let cfg = multimodal_config();
        let a = assemble(&layout, &cfg).unwrap();
        let b = assemble(&layout, &cfg).unwrap();
        assert_eq!(a.train, b.train);
        assert_eq!(a.val, b.val);
        assert_eq!(a.test, b.test);

        let mut other = cfg.clone();
        other.seed = Some(1);
        let c = assemble(&layout, &other).unwrap();
        assert_ne!(a.train.ids, c.train.ids);
        assert_eq!(a.test, c.test);
    }

    #[test]
    fn test_image_only_original_channel() {
        let tmp = tempfile::tempdir().unwrap();
        write_cohort(tmp.path());
        let mut cfg = PipelineConfig::default();
        cfg.normalize = tiny_normalize();
        cfg.channel = Channel::Original;
        cfg.augment.target = crate::config::AugmentTarget::Disabled;
        let ds = assemble(&CohortLayout::new(tmp.path()), &cfg).unwrap();
        assert_eq!(ds.train.len(), 14);
        assert!(ds.train.tabular.is_none());
        assert!(ds.standardizer.is_none());
        assert_eq!(ds.seed, 0);
    }

    #[test]
    fn test_missing_pool_is_err() {
        let tmp = tempfile::tempdir().unwrap();
        write_pool(tmp.path(), CohortClass::Expansion, Role::TrainVal, 3);
        assert!(assemble(&CohortLayout::new(tmp.path()), &multimodal_config()).is_err());
    }

    #[test]
    fn test_from_records_empty_and_mismatch() {
        let empty = SplitTensors::from_records(vec![], (2, 2, 2), true).unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.images.dim(), (0, 2, 2, 2, 1));
        assert_eq!(empty.tabular.map(|t| t.dim()), Some((0, 5)));

        let bad = CaseRecord {
            id: "x".into(),
            volume: Array3::zeros((2, 2, 3)),
            tabular: None,
            label: 0,
        };
        assert!(SplitTensors::from_records(vec![bad], (2, 2, 2), false).is_err());
    }
}
