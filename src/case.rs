// Hashbench - 基准测试用例定义
// 定义了单个基准测试用例、测试结果和统计信息

use crate::algorithm::HashAlgorithm;
use crate::hasher::Strategy;
use crate::utils::{format_bytes, format_throughput};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// 基准测试用例
/// 描述一次“对某个文件、用某种算法和策略、重复若干次”的计时任务
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchCase {
    /// 显示名称
    pub name: String,

    /// 要哈希的文件
    pub path: PathBuf,

    /// 哈希算法
    pub algorithm: HashAlgorithm,

    /// 读取策略
    pub strategy: Strategy,

    /// 分块策略的块数量
    pub chunk_blocks: usize,

    /// 期望摘要（小写十六进制）
    pub expected: Option<String>,

    /// 重复次数
    pub repetitions: u32,
}

impl BenchCase {
    /// 创建新的测试用例
    ///
    /// 名称默认取 `<算法>_<策略> <文件名>`。
    pub fn new(path: PathBuf, algorithm: HashAlgorithm, strategy: Strategy) -> Self {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());
        Self {
            name: format!("{}_{} {}", algorithm, strategy, file_name),
            path,
            algorithm,
            strategy,
            chunk_blocks: crate::hasher::DEFAULT_CHUNK_BLOCKS,
            expected: None,
            repetitions: 1,
        }
    }
}

/// 单个用例的计时结果
#[derive(Debug, Clone)]
pub struct BenchResult {
    /// 对应的用例
    pub case: BenchCase,

    /// 计算得到的摘要
    pub digest: String,

    /// 每次运行哈希的字节数
    pub bytes_per_run: u64,

    /// 所有重复次数的总耗时
    pub elapsed: Duration,
}

impl BenchResult {
    /// 总吞吐量（字节/秒）
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        (self.bytes_per_run as f64 * self.case.repetitions as f64) / secs
    }

    /// 报告行，例如 `md5_chunked 1.00 GB, 10x: 16.044s (638.21 MB/s)`
    pub fn summary_line(&self) -> String {
        format!(
            "{}_{} {}, {}x: {:.3}s ({})",
            self.case.algorithm,
            self.case.strategy,
            format_bytes(self.bytes_per_run),
            self.case.repetitions,
            self.elapsed.as_secs_f64(),
            format_throughput(self.throughput())
        )
    }
}

/// 同一文件、同一算法在不同策略下得到了不同摘要
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inconsistency {
    pub path: PathBuf,
    pub algorithm: HashAlgorithm,
    /// 每个策略得到的摘要
    pub digests: Vec<(Strategy, String)>,
}

/// 检查策略无关性
///
/// 按 (文件, 算法) 分组，组内所有策略的摘要必须相同。
pub fn find_inconsistencies(results: &[BenchResult]) -> Vec<Inconsistency> {
    let mut groups: BTreeMap<(PathBuf, &'static str), Vec<&BenchResult>> = BTreeMap::new();
    for r in results {
        groups
            .entry((r.case.path.clone(), r.case.algorithm.name()))
            .or_default()
            .push(r);
    }

    groups
        .into_values()
        .filter(|group| group.iter().any(|r| r.digest != group[0].digest))
        .map(|group| Inconsistency {
            path: group[0].case.path.clone(),
            algorithm: group[0].case.algorithm,
            digests: group
                .iter()
                .map(|r| (r.case.strategy, r.digest.clone()))
                .collect(),
        })
        .collect()
}

/// 基准测试统计信息
#[derive(Debug, Default, Clone)]
pub struct BenchStats {
    /// 运行的用例总数
    pub total_cases: u64,

    /// 成功（且校验通过）的用例数
    pub passed: u64,

    /// 失败的用例数
    pub failed: u64,

    /// 未运行的用例数（遇到失败后中止）
    pub skipped: u64,

    /// 哈希的总字节数（包含所有重复次数）
    pub bytes_hashed: u64,

    /// 哈希总耗时
    pub hashing_time: Duration,
}

impl BenchStats {
    /// 创建新的空统计信息
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一个成功的结果
    pub fn record(&mut self, result: &BenchResult) {
        self.passed += 1;
        self.bytes_hashed += result.bytes_per_run * result.case.repetitions as u64;
        self.hashing_time += result.elapsed;
    }
}
