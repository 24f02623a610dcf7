//! 程序运行函数.

use crate::report::Summary;
use crate::Cli;
use anyhow::{ensure, Context};
use ich_berry::prelude::*;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

/// 清单文件名.
const MANIFEST: &str = "manifest.json";

/// 读取配置: 有配置文件时以其为基础, 否则取变体默认值; 再应用命令行覆盖项.
pub fn load_config(cli: &Cli) -> anyhow::Result<PipelineConfig> {
    let mut cfg = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("无法读取配置文件 `{}`", path.display()))?;
            serde_json::from_str::<PipelineConfig>(&text)
                .with_context(|| format!("无法解析配置文件 `{}`", path.display()))?
        }
        None => PipelineConfig::for_variant(cli.variant.map_or(Variant::ImageOnly, Variant::from)),
    };
    if let Some(v) = cli.variant {
        cfg.variant = v.into();
    }
    if let Some(c) = cli.channel {
        cfg.channel = c.into();
    }
    if cli.seed.is_some() {
        cfg.seed = cli.seed;
    }
    cfg.validate().context("配置无效")?;
    Ok(cfg)
}

/// 获取数据集目录结构.
///
/// 1. 若命令行给出 `--root`, 则以其为根目录;
/// 2. 否则读取 `$ICH_DATASET_DIR`, 或使用 `$HOME/dataset/ich`.
pub fn layout_from_cli_env_or_home(cli: &Cli) -> anyhow::Result<CohortLayout> {
    match &cli.root {
        Some(root) => Ok(CohortLayout::new(root.clone())),
        None => CohortLayout::from_env_or_home().context("无法确定数据集根目录, 请指定 --root"),
    }
}

/// 写出 `manifest.json`: 实际使用的配置、种子、各划分的病例名和标准化参数.
fn write_manifest(out: &Path, cfg: &PipelineConfig, ds: &Dataset) -> anyhow::Result<PathBuf> {
    let standardizer = ds.standardizer.as_ref().map(|s| {
        serde_json::json!({
            "mean": s.mean(),
            "scale": s.scale(),
        })
    });
    let manifest = serde_json::json!({
        "config": cfg,
        "seed": ds.seed,
        "standardizer": standardizer,
        "train": ds.train.ids,
        "val": ds.val.ids,
        "test": ds.test.ids,
    });
    let path = out.join(MANIFEST);
    let text = serde_json::to_string_pretty(&manifest)?;
    fs::write(&path, text).with_context(|| format!("无法写入 `{}`", path.display()))?;
    Ok(path)
}

/// 实际运行.
pub fn run(cli: &Cli) -> anyhow::Result<Summary> {
    let cfg = load_config(cli)?;
    let layout = layout_from_cli_env_or_home(cli)?;
    let root = layout.root();
    ensure!(root.is_dir(), "数据集根目录 `{}` 不存在", root.display());

    info!("数据集根目录: `{}`", root.display());
    let ds = assemble(&layout, &cfg).context("数据集组装失败")?;

    let mut written = ds.write_npz(&cli.out).context("写出 npz 失败")?;
    written.push(write_manifest(&cli.out, &cfg, &ds)?);

    Ok(Summary::from_dataset(&ds, written))
}
