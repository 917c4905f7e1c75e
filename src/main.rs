// Hashbench - 大文件整文件哈希吞吐量基准测试工具
//
// 主程序入口，负责命令行参数解析和基准测试流程协调
//
// 功能特性：
// - 两种读取策略：分块读取与复用缓冲区读取
// - 多种算法：MD5、BLAKE2b-512、SHA-256
// - 每次计算后校验期望摘要，并检查不同策略结果一致
// - 测试套件：保存、加载和交互式管理
// - 夹具生成：创建指定大小的全零文件

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use console::style;
use hashbench::algorithm::HashAlgorithm;
use hashbench::case::find_inconsistencies;
use hashbench::cli::run_interactive_mode;
use hashbench::config::{BenchConfig, FileArgs};
use hashbench::executor::BenchExecutor;
use hashbench::fixture::{create_fixture, FixtureOptions};
use hashbench::hasher::{hash_file, Strategy, DEFAULT_CHUNK_BLOCKS};
use hashbench::store::{AppConfig, Suite, BUILTIN_SUITE};
use hashbench::utils::{format_bytes, format_duration, format_throughput, parse_size};
use std::path::PathBuf;
use std::process::ExitCode;

/// 子命令枚举
#[derive(Subcommand, Debug)]
enum Commands {
    /// 计算单个文件的摘要（输出格式与 sha256sum 相同）
    Hash {
        /// 要计算的文件
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// 哈希算法
        #[arg(long, short, value_enum, default_value_t = HashAlgorithm::Md5)]
        algorithm: HashAlgorithm,

        /// 读取策略
        #[arg(long, short, value_enum, default_value_t = Strategy::Buffered)]
        strategy: Strategy,

        /// 分块策略每块包含的算法块数量
        #[arg(long, default_value_t = DEFAULT_CHUNK_BLOCKS)]
        chunk_blocks: usize,

        /// 期望摘要，不一致时以非零状态退出
        #[arg(long)]
        expect: Option<String>,
    },

    /// 创建指定大小的全零夹具文件
    Fixture {
        /// 文件路径
        #[arg(value_name = "PATH")]
        path: PathBuf,

        /// 文件大小，例如 1G、100G、512M
        #[arg(value_name = "SIZE")]
        size: String,

        /// 实际写入每个字节，而不是创建稀疏文件
        #[arg(long)]
        allocate: bool,

        /// 覆盖已存在的文件
        #[arg(long)]
        force: bool,

        /// 试运行模式（不实际创建文件）
        #[arg(long)]
        dry_run: bool,
    },

    /// 列出保存的测试套件
    Suites,
}

/// 命令行参数结构体
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 子命令
    #[command(subcommand)]
    command: Option<Commands>,

    /// 要测试的文件（省略时使用套件或进入交互模式）
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// 哈希算法（可重复指定）
    #[arg(long, short, value_enum, default_values_t = [HashAlgorithm::Md5, HashAlgorithm::Blake2b])]
    algorithm: Vec<HashAlgorithm>,

    /// 读取策略（可重复指定）
    #[arg(long, short, value_enum, default_values_t = Strategy::ALL)]
    strategy: Vec<Strategy>,

    /// 每个用例的重复次数
    #[arg(long, short = 'n', default_value_t = 10)]
    repeat: u32,

    /// 分块策略每块包含的算法块数量
    #[arg(long, default_value_t = DEFAULT_CHUNK_BLOCKS)]
    chunk_blocks: usize,

    /// 期望摘要（仅在指定单一算法时可用）
    #[arg(long)]
    expect: Option<String>,

    /// 使用保存的测试套件
    #[arg(long, conflicts_with = "suite_file")]
    suite: Option<String>,

    /// 从 TOML 文件加载测试套件
    #[arg(long, value_name = "PATH")]
    suite_file: Option<PathBuf>,

    /// 工作线程数量（大于 1 时用例会并发运行，计时会互相影响）
    #[arg(long, default_value_t = 1)]
    workers: usize,

    /// 遇到失败时继续运行其余用例
    #[arg(long)]
    keep_going: bool,
}

/// 程序入口
fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();

    match args.command {
        Some(Commands::Hash {
            ref file,
            algorithm,
            strategy,
            chunk_blocks,
            ref expect,
        }) => {
            let expect = expect.as_deref().map(|e| e.trim().to_ascii_lowercase());
            let outcome = hash_file(file, strategy, algorithm, chunk_blocks, expect.as_deref())?;
            println!("{}  {}", outcome.hex, file.display());
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Fixture {
            ref path,
            ref size,
            allocate,
            force,
            dry_run,
        }) => {
            let bytes = parse_size(size)?;
            let options = FixtureOptions {
                allocate,
                force,
                dry_run,
            };
            create_fixture(path, bytes, options)?;
            if !dry_run {
                println!(
                    "{} {:?} ({})",
                    style("Created").green(),
                    path,
                    format_bytes(bytes)
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Suites) => {
            list_suites()?;
            Ok(ExitCode::SUCCESS)
        }
        None => run_benchmark(args),
    }
}

/// 列出保存的套件和内置套件
fn list_suites() -> Result<()> {
    let config = AppConfig::load()?;
    println!("Config: {:?}", style(AppConfig::get_config_path()?).blue());
    for (name, suite) in &config.suites {
        println!("  {} ({} case(s))", style(name).green(), suite.cases.len());
    }
    if !config.suites.contains_key(BUILTIN_SUITE) {
        println!(
            "  {} ({} case(s), built-in)",
            style(BUILTIN_SUITE).green(),
            Suite::builtin().cases.len()
        );
    }
    Ok(())
}

/// 执行基准测试
fn run_benchmark(args: Args) -> Result<ExitCode> {
    let fail_fast = !args.keep_going;

    // 准备运行配置：文件 → 套件文件 → 保存的套件 → 交互模式
    let (config, source) = if let Some(file) = args.file {
        let file_args = FileArgs {
            path: file.clone(),
            algorithms: args.algorithm,
            strategies: args.strategy,
            repetitions: args.repeat,
            chunk_blocks: args.chunk_blocks,
            expected: args.expect,
        };
        (
            BenchConfig::from_file_args(file_args, args.workers, fail_fast)?,
            format!("{:?}", file),
        )
    } else if let Some(suite_file) = args.suite_file {
        let suite = Suite::load_file(&suite_file)?;
        (
            BenchConfig::from_suite(&suite, args.workers, fail_fast)?,
            format!("suite file {:?}", suite_file),
        )
    } else if let Some(name) = args.suite {
        let suite = AppConfig::load()?
            .suite(&name)
            .with_context(|| format!("No suite named '{}'", name))?;
        (
            BenchConfig::from_suite(&suite, args.workers, fail_fast)?,
            format!("suite '{}'", name),
        )
    } else {
        match run_interactive_mode()? {
            Some((name, suite)) => (
                BenchConfig::from_suite(&suite, args.workers, fail_fast)?,
                format!("suite '{}'", name),
            ),
            None => return Ok(ExitCode::SUCCESS),
        }
    };

    let start_time = std::time::Instant::now();
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

    // 打印运行信息
    println!("{}", style(format!("Hashbench v{}", env!("CARGO_PKG_VERSION"))).cyan().bold());
    println!("Source:  {}", style(&source).blue());
    println!("Cases:   {}", config.cases.len());
    println!("Workers: {}", config.workers);
    println!("Time:    {}", style(&timestamp).yellow());
    println!("{}", style("----------------------------------------").dim());

    let executor = BenchExecutor::new(config.fail_fast);
    let (results, stats) = executor.execute(&config.cases, config.workers)?;

    // 同一文件、同一算法在不同策略下的摘要必须一致
    let inconsistencies = find_inconsistencies(&results);
    for found in &inconsistencies {
        eprintln!(
            "{} strategies disagree for {} on {:?}",
            style("Error:").red().bold(),
            found.algorithm,
            found.path
        );
        for (strategy, digest) in &found.digests {
            eprintln!("    {:<9} {}", strategy, digest);
        }
    }

    // 打印统计信息
    println!("{}", style("----------------------------------------").dim());
    let throughput = if stats.hashing_time.is_zero() {
        0.0
    } else {
        stats.bytes_hashed as f64 / stats.hashing_time.as_secs_f64()
    };
    println!("Passed:          {}", style(stats.passed).green());
    println!("Failed:          {}", style(stats.failed).red().bold());
    println!("Skipped:         {}", style(stats.skipped).dim());
    println!("Data Hashed:     {}", style(format_bytes(stats.bytes_hashed)).cyan());
    println!("Avg Throughput:  {}", style(format_throughput(throughput)).cyan());
    println!(
        "Total Duration:  {}",
        style(format_duration(start_time.elapsed().as_secs())).bold()
    );

    if !inconsistencies.is_empty() {
        bail!("{} strategy inconsistency(ies) found", inconsistencies.len());
    }
    if stats.failed > 0 {
        println!("{}", style("Benchmark finished with failures.").red().bold());
        return Ok(ExitCode::FAILURE);
    }

    println!("{}", style("Benchmark Completed Successfully!").green().bold());
    Ok(ExitCode::SUCCESS)
}
