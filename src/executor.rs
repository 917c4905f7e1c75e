// Hashbench - 基准测试执行器模块
// 负责重复计时、并行调度用例并汇总结果

use crate::case::{BenchCase, BenchResult, BenchStats};
use crate::hasher::{hash_file, HashError};
use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// 重复执行并计时
///
/// 运行 `f` 共 `repetitions` 次（至少一次），返回最后一次的输出和总耗时。
/// 任意一次失败都会立即返回该错误。
pub fn measure<T, E, F>(repetitions: u32, mut f: F) -> Result<(T, Duration), E>
where
    F: FnMut() -> Result<T, E>,
{
    let start = Instant::now();
    let mut last = f()?;
    for _ in 1..repetitions {
        last = f()?;
    }
    Ok((last, start.elapsed()))
}

/// 运行单个用例
///
/// 每次重复都会重新打开文件、重新计算并校验摘要。
pub fn run_case(case: &BenchCase) -> Result<BenchResult, HashError> {
    let (outcome, elapsed) = measure(case.repetitions, || {
        hash_file(
            &case.path,
            case.strategy,
            case.algorithm,
            case.chunk_blocks,
            case.expected.as_deref(),
        )
    })?;

    Ok(BenchResult {
        case: case.clone(),
        digest: outcome.hex,
        bytes_per_run: outcome.bytes,
        elapsed,
    })
}

/// 基准测试执行器
///
/// 在线程池中运行用例，结果通过通道回到调用线程并实时输出。
pub struct BenchExecutor {
    /// 遇到第一个失败时停止
    fail_fast: bool,
}

impl BenchExecutor {
    /// 创建新的执行器
    ///
    /// # 参数
    /// * `fail_fast` - 是否在第一个失败后停止启动新的用例
    pub fn new(fail_fast: bool) -> Self {
        Self { fail_fast }
    }

    /// 执行所有用例
    ///
    /// 使用 `workers` 个线程运行用例，结果按完成顺序打印，
    /// 返回时按用例顺序排列。
    ///
    /// # 参数
    /// * `cases` - 要执行的用例
    /// * `workers` - 工作线程数量
    ///
    /// # 返回
    /// * `Ok((Vec<BenchResult>, BenchStats))` - 成功的结果和统计信息
    /// * `Err(anyhow::Error)` - 启用 fail_fast 时的第一个失败，或线程池创建失败
    pub fn execute(
        &self,
        cases: &[BenchCase],
        workers: usize,
    ) -> Result<(Vec<BenchResult>, BenchStats)> {
        let mut stats = BenchStats::new();
        stats.total_cases = cases.len() as u64;

        // 创建进度条样式
        let pb_style = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {pos}/{len} cases {msg}")?
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");

        let pb = ProgressBar::new(cases.len() as u64);
        pb.set_style(pb_style);
        pb.set_message("Hashing...");
        pb.enable_steady_tick(Duration::from_millis(100));

        // 创建线程池
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .context("Failed to build thread pool")?;

        // 中止标志和结果通道
        let abort = AtomicBool::new(false);
        let (tx, rx) = crossbeam_channel::unbounded::<(usize, Result<BenchResult, HashError>)>();

        let mut slots: Vec<Option<BenchResult>> = vec![None; cases.len()];
        let mut first_error: Option<anyhow::Error> = None;

        thread::scope(|s| {
            s.spawn(|| {
                pool.install(|| {
                    cases
                        .par_iter()
                        .enumerate()
                        .for_each_with(tx, |tx, (index, case)| {
                            // 已有用例失败时不再启动新的用例
                            if self.fail_fast && abort.load(Ordering::SeqCst) {
                                return;
                            }
                            info!("Running case '{}' on {:?}", case.name, case.path);
                            let res = run_case(case);
                            if res.is_err() {
                                abort.store(true, Ordering::SeqCst);
                            }
                            // 接收端只会在全部结果到达后关闭
                            let _ = tx.send((index, res));
                        });
                });
            });

            // 在调用线程按完成顺序处理结果
            for (index, res) in rx.iter() {
                let case = &cases[index];
                match res {
                    Ok(result) => {
                        // 输出结果并累计统计
                        pb.println(format!(
                            "{} {}",
                            style("✓").green(),
                            result.summary_line()
                        ));
                        stats.record(&result);
                        slots[index] = Some(result);
                    }
                    Err(e) => {
                        pb.println(format!(
                            "{} {}: {}",
                            style("✗").red().bold(),
                            case.name,
                            e
                        ));
                        warn!("Case '{}' failed: {}", case.name, e);
                        stats.failed += 1;
                        // 只保留第一个错误
                        if first_error.is_none() {
                            first_error = Some(
                                anyhow::Error::new(e)
                                    .context(format!("Benchmark case '{}' failed", case.name)),
                            );
                        }
                    }
                }
                pb.inc(1);
            }
        });

        // 未收到结果的用例视为跳过
        stats.skipped = stats.total_cases - stats.passed - stats.failed;

        pb.finish_with_message(format!(
            "done in {:.2}s",
            stats.hashing_time.as_secs_f64()
        ));

        if self.fail_fast {
            if let Some(err) = first_error {
                return Err(err);
            }
        }

        Ok((slots.into_iter().flatten().collect(), stats))
    }
}
