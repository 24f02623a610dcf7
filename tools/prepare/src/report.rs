//! 运行结果.

use ich_berry::consts::assemble::{LABEL_EXPANSION, LABEL_NO_EXPANSION};
use ich_berry::prelude::*;
use std::io::{self, Write};
use std::path::PathBuf;

const SEP: &str = "--------------------------------------------------------";

/// 单个划分的统计.
struct SplitSummary {
    name: &'static str,
    samples: usize,
    expansion: usize,
    no_expansion: usize,
    shape: Vec<usize>,
    tabular: bool,
}

impl SplitSummary {
    fn new(name: &'static str, split: &SplitTensors) -> Self {
        Self {
            name,
            samples: split.len(),
            expansion: split.count_label(LABEL_EXPANSION),
            no_expansion: split.count_label(LABEL_NO_EXPANSION),
            shape: split.images.shape().to_vec(),
            tabular: split.tabular.is_some(),
        }
    }
}

/// 将 `s` 的结果写进 `w` 中.
fn describe_into<W: Write>(s: &SplitSummary, w: &mut W) -> io::Result<()> {
    const S4: &str = "    ";

    writeln!(w, "Split `{}`:", s.name)?;
    writeln!(w, "{S4}Samples: {}", s.samples)?;
    writeln!(w, "{S4}Expansion (label 1): {}", s.expansion)?;
    writeln!(w, "{S4}No expansion (label 0): {}", s.no_expansion)?;
    writeln!(w, "{S4}Image tensor: {:?}", s.shape)?;
    write!(
        w,
        "{S4}Tabular: {}",
        if s.tabular { "yes" } else { "/" }
    )?;
    Ok(())
}

/// 预处理最终结果.
pub struct Summary {
    seed: u64,
    splits: Vec<SplitSummary>,
    written: Vec<PathBuf>,
}

impl Summary {
    /// 从组装好的数据集和写出的文件列表创建.
    pub fn from_dataset(ds: &Dataset, written: Vec<PathBuf>) -> Self {
        Self {
            seed: ds.seed,
            splits: vec![
                SplitSummary::new("train", &ds.train),
                SplitSummary::new("val", &ds.val),
                SplitSummary::new("test", &ds.test),
            ],
            written,
        }
    }

    /// 输出运行结果.
    pub fn analyze(&self) {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        // 标准输出被关闭时不再打印.
        let _ = self.describe(&mut out);
    }

    fn describe<W: Write>(&self, w: &mut W) -> io::Result<()> {
        writeln!(w, "{SEP}")?;
        writeln!(w, "Shuffle seed: {}", self.seed)?;
        for s in self.splits.iter() {
            writeln!(w, "{SEP}")?;
            describe_into(s, w)?;
            writeln!(w)?;
        }
        writeln!(w, "{SEP}")?;
        for p in self.written.iter() {
            writeln!(w, "Written: {}", p.display())?;
        }
        Ok(())
    }
}
