// Hashbench - 文件哈希计算模块
// 提供两种整文件哈希策略：分块读取与复用缓冲区读取

use crate::algorithm::HashAlgorithm;
use clap::ValueEnum;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};

/// 分块策略默认的块数量（乘以算法块大小得到分块字节数）
pub const DEFAULT_CHUNK_BLOCKS: usize = 128;

/// 复用缓冲区策略的缓冲区容量（128 KiB）
pub const BUFFER_CAPACITY: usize = 128 * 1024;

/// 分块策略单块的最大字节数（1 GiB）
pub const MAX_CHUNK_SIZE: usize = 1024 * 1024 * 1024;

/// 每块预先分配的最大容量，更大的块由 `read_to_end` 按需增长
const CHUNK_RESERVE_LIMIT: usize = BUFFER_CAPACITY * 64;

/// 哈希计算错误
#[derive(Debug, thiserror::Error)]
pub enum HashError {
    /// 文件不存在、不可读，或读取中途失败
    #[error("failed to read '{}': {source}", .path.display())]
    FileAccess { path: PathBuf, source: io::Error },

    /// 计算得到的摘要与期望值不一致
    #[error("checksum mismatch for '{}': expected {expected}, got {actual}", .path.display())]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    /// 块数量为 0，或块大小溢出、超过 [`MAX_CHUNK_SIZE`]
    #[error("chunk block count {chunk_blocks} is out of range (chunk must be 1 byte to 1 GiB)")]
    InvalidChunkSize { chunk_blocks: usize },
}

/// 读取策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// 分块读取：每块都是新分配的字节序列
    Chunked,

    /// 复用缓冲区读取：只分配一次缓冲区，反复读入
    Buffered,
}

impl Strategy {
    pub const ALL: [Strategy; 2] = [Strategy::Chunked, Strategy::Buffered];

    pub fn name(self) -> &'static str {
        match self {
            Strategy::Chunked => "chunked",
            Strategy::Buffered => "buffered",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 计算分块字节数
///
/// `chunk_blocks` 为 0、乘积溢出或超过 [`MAX_CHUNK_SIZE`] 时返回 `None`。
pub fn chunk_size(algorithm: HashAlgorithm, chunk_blocks: usize) -> Option<usize> {
    chunk_blocks
        .checked_mul(algorithm.block_size())
        .filter(|&size| size > 0 && size <= MAX_CHUNK_SIZE)
}

/// 单次哈希计算的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestOutcome {
    /// 小写十六进制摘要
    pub hex: String,

    /// 送入累加器的总字节数
    pub bytes: u64,

    /// 读取调用次数（包括最后一次返回 0 的读取）
    pub reads: u64,
}

/// 以分块方式计算任意读取源的摘要
///
/// 每次读取恰好 `chunk_blocks * block_size` 字节（最后一块可能更短），
/// 每块都分配新的 `Vec<u8>`，直到读取返回 0 字节为止。
///
/// # 参数
/// * `reader` - 数据源
/// * `algorithm` - 哈希算法
/// * `chunk_blocks` - 每块包含的算法块数量，必须大于 0
///
/// # 返回
/// * `Ok(DigestOutcome)` - 摘要、字节数和读取次数
/// * `Err(io::Error)` - 读取失败（块大小不合法时返回 `InvalidInput`）
pub fn chunked_digest<R: Read>(
    reader: R,
    algorithm: HashAlgorithm,
    chunk_blocks: usize,
) -> io::Result<DigestOutcome> {
    // 校验并计算块大小
    let chunk_size = chunk_size(algorithm, chunk_blocks).ok_or_else(|| {
        io::Error::new(
            ErrorKind::InvalidInput,
            format!("chunk block count {} is out of range", chunk_blocks),
        )
    })?;

    // 带缓冲的读取器，块较小时合并系统调用
    let mut reader = BufReader::new(reader);
    let mut acc = algorithm.new_accumulator();
    let mut bytes = 0u64;
    let mut reads = 0u64;

    loop {
        // 每块独立分配，模拟“返回新字节序列”的读取方式
        let mut chunk = Vec::with_capacity(chunk_size.min(CHUNK_RESERVE_LIMIT));
        let n = reader.by_ref().take(chunk_size as u64).read_to_end(&mut chunk)?;
        reads += 1;
        if n == 0 {
            break; // 文件读取完毕
        }
        acc.update(&chunk);
        bytes += n as u64;
    }

    Ok(DigestOutcome {
        hex: acc.finalize_hex(),
        bytes,
        reads,
    })
}

/// 以复用缓冲区方式计算任意读取源的摘要
///
/// 缓冲区只分配一次。每次读取返回 `n` 后只哈希 `buffer[..n]`，
/// `n` 之后的区域是上一次填充留下的旧数据，绝不能送入累加器。
pub fn buffered_digest<R: Read>(
    mut reader: R,
    algorithm: HashAlgorithm,
    capacity: usize,
) -> io::Result<DigestOutcome> {
    // 缓冲区只分配一次
    let mut buffer = vec![0u8; capacity.max(1)];
    let mut acc = algorithm.new_accumulator();
    let mut bytes = 0u64;
    let mut reads = 0u64;

    loop {
        let n = match reader.read(&mut buffer) {
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        reads += 1;
        if n == 0 {
            break; // 文件读取完毕
        }
        // 只哈希本次读入的部分
        acc.update(&buffer[..n]);
        bytes += n as u64;
    }

    Ok(DigestOutcome {
        hex: acc.finalize_hex(),
        bytes,
        reads,
    })
}

/// 使用分块策略计算文件摘要
///
/// # 参数
/// * `path` - 要计算的文件路径
/// * `chunk_blocks` - 每块包含的算法块数量（默认 [`DEFAULT_CHUNK_BLOCKS`]）
/// * `algorithm` - 哈希算法
/// * `expected` - 可选的期望摘要
///
/// # 返回
/// * `Ok(String)` - 小写十六进制摘要
/// * `Err(HashError)` - 文件访问失败或摘要不匹配
pub fn hash_chunked(
    path: &Path,
    chunk_blocks: usize,
    algorithm: HashAlgorithm,
    expected: Option<&str>,
) -> Result<String, HashError> {
    hash_file(path, Strategy::Chunked, algorithm, chunk_blocks, expected).map(|o| o.hex)
}

/// 使用复用缓冲区策略计算文件摘要
///
/// 行为与 [`hash_chunked`] 相同，只是读取方式不同。
pub fn hash_buffered(
    path: &Path,
    algorithm: HashAlgorithm,
    expected: Option<&str>,
) -> Result<String, HashError> {
    hash_file(
        path,
        Strategy::Buffered,
        algorithm,
        DEFAULT_CHUNK_BLOCKS,
        expected,
    )
    .map(|o| o.hex)
}

/// 按指定策略计算文件摘要并校验
///
/// `chunk_blocks` 只对分块策略生效。文件句柄在所有退出路径上都会被释放。
pub fn hash_file(
    path: &Path,
    strategy: Strategy,
    algorithm: HashAlgorithm,
    chunk_blocks: usize,
    expected: Option<&str>,
) -> Result<DigestOutcome, HashError> {
    if strategy == Strategy::Chunked && chunk_size(algorithm, chunk_blocks).is_none() {
        return Err(HashError::InvalidChunkSize { chunk_blocks });
    }

    let access_error = |source: io::Error| HashError::FileAccess {
        path: path.to_path_buf(),
        source,
    };

    // 打开文件；File 本身不带用户态缓冲，复用缓冲区策略直接在它上面读取
    let file = File::open(path).map_err(access_error)?;

    debug!(
        "Hashing {:?} with {} ({} strategy)",
        path, algorithm, strategy
    );

    let outcome = match strategy {
        Strategy::Chunked => chunked_digest(file, algorithm, chunk_blocks),
        Strategy::Buffered => buffered_digest(file, algorithm, BUFFER_CAPACITY),
    }
    .map_err(access_error)?;

    debug!(
        "Hashed {} bytes of {:?} in {} reads: {}",
        outcome.bytes, path, outcome.reads, outcome.hex
    );

    // 校验期望摘要
    verify_checksum(path, &outcome.hex, expected)?;
    Ok(outcome)
}

/// 校验摘要
///
/// 始终执行的显式比较，期望值必须与计算结果完全相同。
pub fn verify_checksum(path: &Path, actual: &str, expected: Option<&str>) -> Result<(), HashError> {
    if let Some(expected) = expected {
        if actual != expected {
            return Err(HashError::ChecksumMismatch {
                path: path.to_path_buf(),
                expected: expected.to_string(),
                actual: actual.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    fn pattern(len: usize) -> Vec<u8> {
        // 非周期性内容，避免因数据重复而掩盖错位
        let mut state = 0x2545_f491_u32;
        (0..len)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                (state >> 24) as u8
            })
            .collect()
    }

    fn temp_file(data: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(data).unwrap();
        file.flush().unwrap();
        file
    }

    /// 先返回一次完整填充，之后每次只返回少量字节
    struct ShortReads {
        data: Vec<u8>,
        pos: usize,
        first: bool,
    }

    impl Read for ShortReads {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let limit = if self.first { buf.len() } else { 3 };
            self.first = false;
            let n = limit.min(buf.len()).min(self.data.len() - self.pos);
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    /// 首次读取返回 Interrupted
    struct InterruptOnce<R> {
        inner: R,
        interrupted: bool,
    }

    impl<R: Read> Read for InterruptOnce<R> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(io::Error::new(ErrorKind::Interrupted, "signal"));
            }
            self.inner.read(buf)
        }
    }

    #[test]
    fn empty_file_gives_empty_digest() {
        let file = temp_file(&[]);
        for algo in HashAlgorithm::ALL {
            let expected = algo.digest_bytes(b"");
            assert_eq!(
                hash_chunked(file.path(), DEFAULT_CHUNK_BLOCKS, algo, None).unwrap(),
                expected
            );
            assert_eq!(hash_buffered(file.path(), algo, None).unwrap(), expected);
        }
        assert_eq!(
            hash_buffered(file.path(), HashAlgorithm::Md5, None).unwrap(),
            "d41d8cd98f00b204e9800998ecf8427e"
        );
    }

    #[test]
    fn strategies_agree() {
        let data = pattern(BUFFER_CAPACITY * 2 + 12_345);
        let file = temp_file(&data);
        for algo in HashAlgorithm::ALL {
            let chunked = hash_chunked(file.path(), DEFAULT_CHUNK_BLOCKS, algo, None).unwrap();
            let buffered = hash_buffered(file.path(), algo, None).unwrap();
            assert_eq!(chunked, buffered);
            assert_eq!(chunked, algo.digest_bytes(&data));
        }
    }

    #[test]
    fn chunk_size_does_not_change_digest() {
        let data = pattern(300_001);
        let file = temp_file(&data);
        for algo in HashAlgorithm::ALL {
            let digests: Vec<String> = [1, 64, 128, 4096]
                .iter()
                .map(|&blocks| hash_chunked(file.path(), blocks, algo, None).unwrap())
                .collect();
            assert!(digests.iter().all(|d| d == &digests[0]));
        }
    }

    #[test]
    fn exact_multiple_reads_once_more_to_terminate() {
        let algo = HashAlgorithm::Md5;
        let chunk = 4 * algo.block_size();
        let data = pattern(chunk * 3);

        let outcome = chunked_digest(Cursor::new(&data), algo, 4).unwrap();
        assert_eq!(outcome.reads, 4);
        assert_eq!(outcome.bytes, data.len() as u64);
        assert_eq!(outcome.hex, algo.digest_bytes(&data));

        let outcome = buffered_digest(Cursor::new(&data), algo, chunk).unwrap();
        assert_eq!(outcome.reads, 4);
        assert_eq!(outcome.bytes, data.len() as u64);
        assert_eq!(outcome.hex, algo.digest_bytes(&data));
    }

    #[test]
    fn one_byte_short_of_boundary_hashes_only_remaining_bytes() {
        let data = pattern(BUFFER_CAPACITY * 2 - 1);
        let file = temp_file(&data);
        for algo in HashAlgorithm::ALL {
            let outcome = hash_file(
                file.path(),
                Strategy::Buffered,
                algo,
                DEFAULT_CHUNK_BLOCKS,
                None,
            )
            .unwrap();
            assert_eq!(outcome.bytes, data.len() as u64);
            assert_eq!(outcome.hex, algo.digest_bytes(&data));
        }
    }

    #[test]
    fn stale_buffer_tail_is_never_hashed() {
        let data = pattern(100);
        let reader = ShortReads {
            data: data.clone(),
            pos: 0,
            first: true,
        };
        // 第一次填满 64 字节，之后每次只填 3 字节，缓冲区尾部残留旧数据
        let outcome = buffered_digest(reader, HashAlgorithm::Blake2b, 64).unwrap();
        assert_eq!(outcome.bytes, 100);
        assert_eq!(outcome.hex, HashAlgorithm::Blake2b.digest_bytes(&data));
    }

    #[test]
    fn interrupted_reads_are_retried() {
        let data = pattern(1000);
        let reader = InterruptOnce {
            inner: Cursor::new(data.clone()),
            interrupted: false,
        };
        let outcome = buffered_digest(reader, HashAlgorithm::Sha256, 256).unwrap();
        assert_eq!(outcome.hex, HashAlgorithm::Sha256.digest_bytes(&data));
    }

    #[test]
    fn wrong_expected_checksum_is_rejected() {
        let file = temp_file(b"abc");
        let right = "900150983cd24fb0d6963f7d28e17f72";
        let wrong = "900150983cd24fb0d6963f7d28e17f73";

        assert_eq!(
            hash_chunked(file.path(), DEFAULT_CHUNK_BLOCKS, HashAlgorithm::Md5, Some(right))
                .unwrap(),
            right
        );
        assert!(matches!(
            hash_chunked(file.path(), DEFAULT_CHUNK_BLOCKS, HashAlgorithm::Md5, Some(wrong)),
            Err(HashError::ChecksumMismatch { ref actual, .. }) if actual == right
        ));
        assert!(matches!(
            hash_buffered(file.path(), HashAlgorithm::Md5, Some(wrong)),
            Err(HashError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn missing_file_is_access_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.bin");
        assert!(matches!(
            hash_buffered(&missing, HashAlgorithm::Md5, None),
            Err(HashError::FileAccess { .. })
        ));
        assert!(matches!(
            hash_chunked(&missing, DEFAULT_CHUNK_BLOCKS, HashAlgorithm::Md5, None),
            Err(HashError::FileAccess { .. })
        ));
    }

    #[test]
    fn zero_chunk_blocks_is_rejected() {
        let file = temp_file(b"abc");
        assert!(matches!(
            hash_chunked(file.path(), 0, HashAlgorithm::Md5, None),
            Err(HashError::InvalidChunkSize { chunk_blocks: 0 })
        ));
        assert!(chunked_digest(Cursor::new(b"abc"), HashAlgorithm::Md5, 0).is_err());
    }

    #[test]
    fn oversized_chunk_blocks_fail_cleanly() {
        let file = temp_file(b"abc");
        for blocks in [usize::MAX / 2, usize::MAX, 1 << 40] {
            assert!(matches!(
                hash_chunked(file.path(), blocks, HashAlgorithm::Md5, None),
                Err(HashError::InvalidChunkSize { chunk_blocks }) if chunk_blocks == blocks
            ));
        }
        let err = chunked_digest(Cursor::new(b"abc"), HashAlgorithm::Md5, usize::MAX / 2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        // 恰好 1 GiB 的块仍然合法，小文件只会读到实际内容
        let blocks = MAX_CHUNK_SIZE / HashAlgorithm::Md5.block_size();
        assert_eq!(
            hash_chunked(file.path(), blocks, HashAlgorithm::Md5, None).unwrap(),
            "900150983cd24fb0d6963f7d28e17f72"
        );
        assert!(chunk_size(HashAlgorithm::Md5, blocks + 1).is_none());
    }

    /// 第一次读取成功，之后每次读取都失败
    struct FailAfterFirst {
        served: bool,
    }

    impl Read for FailAfterFirst {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.served {
                return Err(io::Error::new(ErrorKind::Other, "device went away"));
            }
            self.served = true;
            let n = buf.len().min(10);
            buf[..n].fill(7);
            Ok(n)
        }
    }

    #[test]
    fn read_failure_after_open_is_access_error() {
        // 目录可以打开，但读取时返回 EISDIR
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            hash_chunked(dir.path(), DEFAULT_CHUNK_BLOCKS, HashAlgorithm::Md5, None),
            Err(HashError::FileAccess { .. })
        ));
        assert!(matches!(
            hash_buffered(dir.path(), HashAlgorithm::Md5, None),
            Err(HashError::FileAccess { .. })
        ));

        let err = chunked_digest(FailAfterFirst { served: false }, HashAlgorithm::Md5, 1)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Other);
        let err = buffered_digest(FailAfterFirst { served: false }, HashAlgorithm::Md5, 64)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Other);
    }

    #[test]
    fn repeated_hashing_is_deterministic() {
        let file = temp_file(&pattern(50_000));
        let first = hash_buffered(file.path(), HashAlgorithm::Blake2b, None).unwrap();
        let second = hash_buffered(file.path(), HashAlgorithm::Blake2b, None).unwrap();
        assert_eq!(first, second);
    }
}
