// Hashbench - 工具函数模块
// 提供大小解析、格式化等辅助功能

use anyhow::{bail, Context, Result};

/// 格式化字节数为人类可读的单位
///
/// 将字节数自动转换为 B、KB、MB、GB 或 TB 单位。
///
/// # 示例
/// ```
/// use hashbench::utils::format_bytes;
/// assert_eq!(format_bytes(1024), "1.00 KB");
/// assert_eq!(format_bytes(500), "500 B");
/// ```
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    const TB: u64 = GB * 1024;

    if bytes >= TB {
        format!("{:.2} TB", bytes as f64 / TB as f64)
    } else if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// 格式化吞吐量（字节/秒）
pub fn format_throughput(bytes_per_sec: f64) -> String {
    if !bytes_per_sec.is_finite() || bytes_per_sec <= 0.0 {
        return "n/a".to_string();
    }
    format!("{}/s", format_bytes(bytes_per_sec.round() as u64))
}

/// 格式化秒数为人类可读的时间长度
///
/// 将秒数转换为 "Xh Ym Zs" 或 "Xm Ys" 或 "Xs" 格式。
pub fn format_duration(secs: u64) -> String {
    if secs >= 3600 {
        let hours = secs / 3600;
        let mins = (secs % 3600) / 60;
        let secs = secs % 60;
        format!("{}h {}m {}s", hours, mins, secs)
    } else if secs >= 60 {
        let mins = secs / 60;
        let secs = secs % 60;
        format!("{}m {}s", mins, secs)
    } else {
        format!("{}s", secs)
    }
}

/// 解析带单位的大小字符串
///
/// 与 `fallocate -l` / `mkfile` 相同，单位按 1024 进制计算：
/// `512`、`64K`、`1G`、`100g`、`2TiB`、`10GB` 都是合法输入。
///
/// # 返回
/// * `Ok(u64)` - 字节数
/// * `Err(anyhow::Error)` - 格式错误或数值溢出
pub fn parse_size(input: &str) -> Result<u64> {
    let s = input.trim();
    let split = s
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len());
    let (digits, unit) = s.split_at(split);
    if digits.is_empty() {
        bail!("Invalid size '{}': expected a number with an optional unit", input);
    }

    let value: u64 = digits
        .parse()
        .with_context(|| format!("Invalid size '{}'", input))?;

    let shift = match unit.trim().to_ascii_uppercase().as_str() {
        "" | "B" => 0,
        "K" | "KB" | "KIB" => 10,
        "M" | "MB" | "MIB" => 20,
        "G" | "GB" | "GIB" => 30,
        "T" | "TB" | "TIB" => 40,
        other => bail!("Unknown size unit '{}' in '{}'", other, input),
    };

    value
        .checked_mul(1u64 << shift)
        .with_context(|| format!("Size '{}' is too large", input))
}

/// 检查字符串是否是指定长度的小写十六进制
pub fn is_lower_hex(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
