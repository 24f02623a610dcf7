//! 训练集增强.

use ndarray::{s, Array3};

use super::{CaseRecord, CohortClass};
use crate::config::{AugmentConfig, AugmentTarget};
use crate::normalize::clip_unit;
use crate::resample::rotate_plane;

impl AugmentTarget {
    /// 该策略是否增强类别 `class` 的训练集.
    #[inline]
    pub const fn covers(self, class: CohortClass) -> bool {
        match self {
            AugmentTarget::Expansion => matches!(class, CohortClass::Expansion),
            AugmentTarget::AllClasses => true,
            AugmentTarget::Disabled => false,
        }
    }
}

/// 每个水平面旋转 `degrees` 度, 并截断到 \[0, 1\].
pub fn rotated(volume: &Array3<f64>, degrees: f64) -> Array3<f64> {
    clip_unit(&rotate_plane(volume.view(), degrees))
}

/// 沿 Y 轴 (第 1 轴) 镜像.
pub fn flipped(volume: &Array3<f64>) -> Array3<f64> {
    volume.slice(s![.., ..;-1, ..]).to_owned()
}

/// 增强一个类别的训练集, 返回原始记录在前、增强副本在后的新集合.
///
/// 按 `cfg.rotations` 的顺序, 每个角度把当前集合的全部记录旋转一份追加到末尾;
/// 之后若 `cfg.flip` 为真, 再把当前集合的全部记录镜像一份追加到末尾.
/// 因此 `K` 条记录在默认配置下得到 `4K` 条. 临床表格行随记录一起复制.
pub fn augment(records: Vec<CaseRecord>, cfg: &AugmentConfig) -> Vec<CaseRecord> {
    let mut ans = records;
    for &degrees in cfg.rotations.iter() {
        let copies: Vec<CaseRecord> = ans
            .iter()
            .map(|r| r.derive(format!("rot{degrees}"), rotated(&r.volume, degrees)))
            .collect();
        ans.extend(copies);
    }
    if cfg.flip {
        let copies: Vec<CaseRecord> = ans
            .iter()
            .map(|r| r.derive("flip".to_owned(), flipped(&r.volume)))
            .collect();
        ans.extend(copies);
    }
    ans
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array3};

    fn record(id: &str, fill: f64) -> CaseRecord {
        CaseRecord {
            id: id.to_owned(),
            volume: Array3::from_shape_fn((7, 7, 2), |(x, y, _)| {
                if x > 1 && x < 5 && y > 1 && y < 5 {
                    fill
                } else {
                    0.0
                }
            }),
            tabular: Some(array![1.0, 0.5, -0.5, 0.0, 2.0]),
            label: 1,
        }
    }

    #[test]
    fn test_target_policy() {
        assert!(AugmentTarget::Expansion.covers(CohortClass::Expansion));
        assert!(!AugmentTarget::Expansion.covers(CohortClass::NoExpansion));
        assert!(AugmentTarget::AllClasses.covers(CohortClass::NoExpansion));
        assert!(!AugmentTarget::Disabled.covers(CohortClass::Expansion));
    }

    #[test]
    fn test_flip_y() {
        let v = Array3::from_shape_fn((2, 3, 1), |(x, y, _)| (x * 3 + y) as f64);
        let f = flipped(&v);
        assert_eq!(f[(0, 0, 0)], 2.0);
        assert_eq!(f[(1, 2, 0)], 3.0);
        assert_eq!(flipped(&f), v);
    }

    /// 默认配置下 K 条记录得到 4K 条, 顺序为 原始, 旋转, 原始镜像, 旋转镜像.
    #[test]
    fn test_default_augment_quadruples() {
        let cfg = AugmentConfig::default();
        let out = augment(vec![record("a", 0.9), record("b", 0.4), record("c", 1.0)], &cfg);
        assert_eq!(out.len(), 12);
        let ids: Vec<&str> = out.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(&ids[..4], ["a", "b", "c", "a+rot30"]);
        assert_eq!(ids[6], "a+flip");
        assert_eq!(ids[9], "a+rot30+flip");
        for r in out.iter() {
            assert_eq!(r.label, 1);
            assert_eq!(r.tabular, Some(array![1.0, 0.5, -0.5, 0.0, 2.0]));
            assert_eq!(r.volume.dim(), (7, 7, 2));
            assert!(r.volume.iter().all(|v| (0.0..=1.0).contains(v)));
        }
        assert_eq!(out[6].volume, flipped(&out[0].volume));
    }

    #[test]
    fn test_augment_custom_rotations() {
        let cfg = AugmentConfig {
            rotations: vec![15.0, -15.0],
            flip: false,
            ..AugmentConfig::default()
        };
        assert_eq!(augment(vec![record("a", 0.5)], &cfg).len(), 4);
        let none = AugmentConfig {
            rotations: vec![],
            flip: false,
            ..AugmentConfig::default()
        };
        assert_eq!(augment(vec![record("a", 0.5)], &none).len(), 1);
    }
}
