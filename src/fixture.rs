// Hashbench - 测试夹具模块
// 创建指定大小的全零文件，替代 mkfile / fallocate 命令

use anyhow::{bail, Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use log::debug;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

/// 写入全零数据时每次写入的大小
const WRITE_CHUNK: usize = 1024 * 1024;

/// 夹具创建选项
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureOptions {
    /// 实际写入每个字节（否则创建稀疏文件）
    pub allocate: bool,

    /// 覆盖已存在的文件
    pub force: bool,

    /// 试运行模式（不实际创建文件）
    pub dry_run: bool,
}

/// 创建全零夹具文件
///
/// 默认通过 `set_len` 创建稀疏文件，内容与 `mkfile` / `fallocate` 生成的文件相同（全零）。
/// 启用 `allocate` 时逐块写入零字节，确保磁盘上真实分配了空间，并显示进度条。
///
/// # 参数
/// * `path` - 要创建的文件
/// * `size` - 文件大小（字节）
/// * `options` - 创建选项
///
/// # 返回
/// * `Ok(())` - 创建完成（试运行时不做任何修改）
/// * `Err(anyhow::Error)` - 文件已存在且未指定 `force`，或写入失败
pub fn create_fixture(path: &Path, size: u64, options: FixtureOptions) -> Result<()> {
    // 已存在的文件只有在 force 时才覆盖
    if path.exists() {
        if !options.force {
            bail!("Fixture {:?} already exists (use --force to overwrite)", path);
        }
        if path.is_dir() {
            bail!("Fixture path {:?} is a directory", path);
        }
    }

    if options.dry_run {
        println!(
            "{} Would create {:?} ({} bytes, {})",
            style("Dry run:").yellow(),
            path,
            size,
            if options.allocate { "allocated" } else { "sparse" }
        );
        return Ok(());
    }

    // 创建父目录
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create parent dir for {:?}", path))?;
    }

    // 创建（或截断）文件
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .with_context(|| format!("Failed to create fixture {:?}", path))?;

    // 写入零字节，或只设置长度生成稀疏文件
    if options.allocate {
        write_zeros(file, size).with_context(|| format!("Failed to write fixture {:?}", path))?;
    } else {
        file.set_len(size)
            .with_context(|| format!("Failed to set length of {:?}", path))?;
    }

    debug!("Created fixture {:?} with {} bytes", path, size);
    Ok(())
}

/// 逐块写入零字节并显示进度
fn write_zeros(file: File, size: u64) -> Result<()> {
    let pb = ProgressBar::new(size);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")?
            .progress_chars("#>-"),
    );

    let zeros = vec![0u8; WRITE_CHUNK];
    let mut writer = BufWriter::new(file);
    let mut remaining = size;
    while remaining > 0 {
        let n = remaining.min(WRITE_CHUNK as u64) as usize;
        writer.write_all(&zeros[..n])?;
        remaining -= n as u64;
        pb.inc(n as u64);
    }

    // 刷新缓冲并落盘
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;
    pb.finish_and_clear();
    Ok(())
}
