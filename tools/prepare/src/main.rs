//! 血肿扩大预测数据集的预处理工具.
//!
//! 读取 `{root}/{expansion,no_expansion}/{trainval,test}` 下的 nifti 扫描与标注,
//! 归一化并组装后写出 `train.npz`、`val.npz`、`test.npz` 和 `manifest.json`.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

mod report;
mod runner;

/// 命令行参数.
#[derive(Parser, Debug)]
#[command(version, about = "脑出血 CT 预处理与数据集组装")]
pub struct Cli {
    /// 数据集根目录. 缺省时读取 `$ICH_DATASET_DIR`, 否则为 `$HOME/dataset/ich`.
    #[arg(long, short = 'D')]
    root: Option<PathBuf>,

    /// 输出目录.
    #[arg(long, short, default_value = "prepared")]
    out: PathBuf,

    /// JSON 配置文件. 命令行参数会覆盖其中的同名项.
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// 流程变体.
    #[arg(long, value_enum)]
    variant: Option<VariantArg>,

    /// 影像通道.
    #[arg(long, value_enum)]
    channel: Option<ChannelArg>,

    /// 打乱种子. 缺省时使用变体的默认种子.
    #[arg(long)]
    seed: Option<u64>,

    /// 日志详细程度, 可重复 (`-v` 为 debug, `-vv` 为 trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// 流程变体.
#[derive(ValueEnum, Clone, Copy, Debug)]
enum VariantArg {
    /// 仅影像, 默认种子 0.
    ImageOnly,
    /// 影像 + 临床表格, 默认种子 42.
    Multimodal,
}

impl From<VariantArg> for ich_berry::Variant {
    #[inline]
    fn from(v: VariantArg) -> Self {
        match v {
            VariantArg::ImageOnly => ich_berry::Variant::ImageOnly,
            VariantArg::Multimodal => ich_berry::Variant::Multimodal,
        }
    }
}

/// 影像通道.
#[derive(ValueEnum, Clone, Copy, Debug)]
enum ChannelArg {
    /// 归一化后的原始扫描.
    Original,
    /// 只保留血肿区域.
    Hematoma,
}

impl From<ChannelArg> for ich_berry::Channel {
    #[inline]
    fn from(c: ChannelArg) -> Self {
        match c {
            ChannelArg::Original => ich_berry::Channel::Original,
            ChannelArg::Hematoma => ich_berry::Channel::Hematoma,
        }
    }
}

impl Cli {
    #[inline]
    fn log_level(&self) -> log::Level {
        match self.verbose {
            0 => log::Level::Info,
            1 => log::Level::Debug,
            _ => log::Level::Trace,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    simple_logger::init_with_level(cli.log_level())?;

    let summary = runner::run(&cli)?;
    summary.analyze();
    Ok(())
}
