// Hashbench - 运行配置管理模块
// 负责把命令行参数或套件转换为单次运行的用例列表，并做校验

use crate::algorithm::HashAlgorithm;
use crate::case::BenchCase;
use crate::hasher::{chunk_size, Strategy, MAX_CHUNK_SIZE};
use crate::store::Suite;
use crate::utils::is_lower_hex;
use anyhow::{bail, Result};
use std::path::PathBuf;

/// 单次运行的配置
///
/// 定义一次基准测试运行的全部参数：要执行的用例、
/// 工作线程数量，以及遇到失败时是否立即停止。
#[derive(Debug, Clone)]
pub struct BenchConfig {
    /// 要执行的用例（按顺序报告）
    pub cases: Vec<BenchCase>,

    /// 工作线程数量
    pub workers: usize,

    /// 遇到第一个失败时停止整个运行
    pub fail_fast: bool,
}

/// 单文件模式的参数
#[derive(Debug, Clone)]
pub struct FileArgs {
    pub path: PathBuf,
    pub algorithms: Vec<HashAlgorithm>,
    pub strategies: Vec<Strategy>,
    pub repetitions: u32,
    pub chunk_blocks: usize,
    pub expected: Option<String>,
}

impl BenchConfig {
    /// 从单个文件的命令行参数创建配置
    ///
    /// 按 算法 × 策略 展开用例。期望摘要只能在单一算法时使用。
    ///
    /// # 返回
    /// * `Ok(BenchConfig)` - 校验通过的配置
    /// * `Err(anyhow::Error)` - 参数不合法
    pub fn from_file_args(args: FileArgs, workers: usize, fail_fast: bool) -> Result<Self> {
        let algorithms = dedup(args.algorithms);
        let strategies = dedup(args.strategies);

        if args.expected.is_some() && algorithms.len() != 1 {
            bail!("--expect requires exactly one --algorithm");
        }

        let mut cases = Vec::new();
        for &algorithm in &algorithms {
            for &strategy in &strategies {
                let mut case = BenchCase::new(args.path.clone(), algorithm, strategy);
                case.chunk_blocks = args.chunk_blocks;
                case.repetitions = args.repetitions;
                case.expected = args.expected.as_deref().map(normalize_checksum);
                cases.push(case);
            }
        }

        let config = Self {
            cases,
            workers,
            fail_fast,
        };
        config.validate()?;
        Ok(config)
    }

    /// 从测试套件创建配置
    pub fn from_suite(suite: &Suite, workers: usize, fail_fast: bool) -> Result<Self> {
        let mut cases = Vec::new();
        for spec in &suite.cases {
            for strategy in dedup(spec.strategies.clone()) {
                let mut case = BenchCase::new(spec.path.clone(), spec.algorithm, strategy);
                if let Some(name) = &spec.name {
                    case.name = format!("{} ({})", name, strategy);
                }
                case.chunk_blocks = spec.chunk_blocks;
                case.repetitions = spec.repetitions;
                case.expected = spec.expected.as_deref().map(normalize_checksum);
                cases.push(case);
            }
        }

        let config = Self {
            cases,
            workers,
            fail_fast,
        };
        config.validate()?;
        Ok(config)
    }

    /// 校验配置
    ///
    /// 拒绝空用例列表、0 个工作线程、0 次重复、超出范围的块数量，
    /// 以及长度或字符不符合算法的期望摘要。
    pub fn validate(&self) -> Result<()> {
        if self.cases.is_empty() {
            bail!("Nothing to run: no benchmark cases configured");
        }
        if self.workers == 0 {
            bail!("Worker count must be at least 1");
        }

        for case in &self.cases {
            if case.repetitions == 0 {
                bail!("Case '{}': repetitions must be at least 1", case.name);
            }
            if case.strategy == Strategy::Chunked
                && chunk_size(case.algorithm, case.chunk_blocks).is_none()
            {
                bail!(
                    "Case '{}': chunk_blocks must be between 1 and {} for {}",
                    case.name,
                    MAX_CHUNK_SIZE / case.algorithm.block_size(),
                    case.algorithm
                );
            }
            if let Some(expected) = &case.expected {
                let len = case.algorithm.digest_len();
                if !is_lower_hex(expected, len) {
                    bail!(
                        "Case '{}': expected checksum must be {} hex characters for {}",
                        case.name,
                        len,
                        case.algorithm
                    );
                }
            }
        }
        Ok(())
    }
}

/// 统一期望摘要的写法（去空白、转小写），之后按原样比较
fn normalize_checksum(s: &str) -> String {
    s.trim().to_ascii_lowercase()
}

/// 去重并保持原有顺序
fn dedup<T: PartialEq>(items: Vec<T>) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}
