//! 临床表格.
//!
//! 每个病例池目录下的 `clinical.csv` 按行与排序后的病例一一对应, 表头为
//! `anticoagulant,sbp,dbp,pt_inr,onset_to_scan`. 编码后的每行有 5 列:
//! 抗凝药编码、收缩压、舒张压、PT-INR、发病到扫描的时间.

use std::path::Path;

use ndarray::{Array2, ArrayView2, ArrayViewMut1, Axis};
use serde::Deserialize;

use crate::consts::assemble::TABULAR_COLUMNS;
use crate::error::{PrepError, Result};

/// 数值列个数 (第一列之后的全部列).
const NUMERIC_COLUMNS: usize = TABULAR_COLUMNS - 1;

/// 临床表格的一行.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ClinicalRow {
    /// 抗凝药物 (类别变量).
    pub anticoagulant: String,

    /// 收缩压.
    pub sbp: f64,

    /// 舒张压.
    pub dbp: f64,

    /// PT-INR.
    pub pt_inr: f64,

    /// 发病到扫描的时间.
    pub onset_to_scan: f64,
}

/// 读取临床表格.
pub fn read_table<P: AsRef<Path>>(path: P) -> Result<Vec<ClinicalRow>> {
    let path = path.as_ref();
    let csv_err = |source| PrepError::Csv {
        path: path.to_owned(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_err)?;
    reader
        .deserialize::<ClinicalRow>()
        .map(|r| r.map_err(csv_err))
        .collect()
}

/// 编码为 `(行数, 5)` 的数值矩阵.
///
/// 类别列按该表格内首次出现的顺序编码为 0, 1, 2, ...,
/// 因此不同表格中的同一取值可能得到不同的编码.
pub fn encode(rows: &[ClinicalRow]) -> Array2<f64> {
    let mut seen: Vec<&str> = Vec::new();
    let mut ans = Array2::<f64>::zeros((rows.len(), TABULAR_COLUMNS));
    for (row, mut out) in rows.iter().zip(ans.axis_iter_mut(Axis(0))) {
        let code = match seen.iter().position(|s| *s == row.anticoagulant) {
            Some(c) => c,
            None => {
                seen.push(&row.anticoagulant);
                seen.len() - 1
            }
        };
        out[0] = code as f64;
        out[1] = row.sbp;
        out[2] = row.dbp;
        out[3] = row.pt_inr;
        out[4] = row.onset_to_scan;
    }
    ans
}

/// 读取并编码, 同时检查行数是否等于病例数.
pub fn load_table<P: AsRef<Path>>(path: P, cases: usize) -> Result<Array2<f64>> {
    let path = path.as_ref();
    let rows = read_table(path)?;
    if rows.len() != cases {
        return Err(PrepError::TableRowMismatch {
            table: path.to_owned(),
            rows: rows.len(),
            cases,
        });
    }
    Ok(encode(&rows))
}

/// 数值列的标准化 `(x - mean) / std`. 标准差使用总体标准差, 为 0 时不缩放.
#[derive(Clone, Debug, PartialEq)]
pub struct Standardizer {
    mean: [f64; NUMERIC_COLUMNS],
    scale: [f64; NUMERIC_COLUMNS],
}

impl Standardizer {
    /// 在所有 `tables` 的全部行上拟合均值与标准差. 没有任何行时返回 `None`.
    pub fn fit<'a, I: IntoIterator<Item = ArrayView2<'a, f64>>>(tables: I) -> Option<Self> {
        let mut n = 0usize;
        let mut sum = [0.0; NUMERIC_COLUMNS];
        let mut sq = [0.0; NUMERIC_COLUMNS];
        let tables: Vec<ArrayView2<'a, f64>> = tables.into_iter().collect();

        for row in tables.iter().flat_map(|t| t.axis_iter(Axis(0))) {
            n += 1;
            for (k, s) in sum.iter_mut().enumerate() {
                *s += row[k + 1];
            }
        }
        if n == 0 {
            return None;
        }
        let mean = sum.map(|s| s / n as f64);
        for row in tables.iter().flat_map(|t| t.axis_iter(Axis(0))) {
            for (k, q) in sq.iter_mut().enumerate() {
                let d = row[k + 1] - mean[k];
                *q += d * d;
            }
        }
        let scale = sq.map(|q| {
            let std = (q / n as f64).sqrt();
            if std > 0.0 {
                std
            } else {
                1.0
            }
        });
        Some(Self { mean, scale })
    }

    /// 各数值列均值.
    #[inline]
    pub fn mean(&self) -> &[f64; NUMERIC_COLUMNS] {
        &self.mean
    }

    /// 各数值列缩放系数.
    #[inline]
    pub fn scale(&self) -> &[f64; NUMERIC_COLUMNS] {
        &self.scale
    }

    /// 就地标准化一行. 第一列 (类别编码) 不变.
    pub fn transform_row(&self, mut row: ArrayViewMut1<f64>) {
        for k in 0..NUMERIC_COLUMNS {
            row[k + 1] = (row[k + 1] - self.mean[k]) / self.scale[k];
        }
    }

    /// 就地标准化整张表.
    pub fn transform(&self, table: &mut Array2<f64>) {
        table
            .axis_iter_mut(Axis(0))
            .for_each(|row| self.transform_row(row));
    }
}
