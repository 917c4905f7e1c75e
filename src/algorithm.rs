// Hashbench - 哈希算法描述模块
// 定义可选的摘要算法以及增量摘要累加器

use blake2::Blake2b512;
use clap::ValueEnum;
use digest::Digest;
use md5::Md5;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;
use std::str::FromStr;

/// 哈希算法描述
///
/// 不可变的算法选择值，每次调用时按值传递。
/// 每个算法都知道自己的内部块大小和十六进制摘要长度，
/// 并能为单次计算创建一个全新的累加器。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// MD5（128 位）
    #[default]
    Md5,

    /// BLAKE2b-512
    Blake2b,

    /// SHA-256
    Sha256,
}

impl HashAlgorithm {
    /// 所有支持的算法
    pub const ALL: [HashAlgorithm; 3] = [
        HashAlgorithm::Md5,
        HashAlgorithm::Blake2b,
        HashAlgorithm::Sha256,
    ];

    /// 算法名称（用于配置文件和报告输出）
    pub fn name(self) -> &'static str {
        match self {
            HashAlgorithm::Md5 => "md5",
            HashAlgorithm::Blake2b => "blake2b",
            HashAlgorithm::Sha256 => "sha256",
        }
    }

    /// 算法内部处理块的大小（字节）
    ///
    /// 分块读取策略用它乘以块数量得到每次读取的字节数。
    pub fn block_size(self) -> usize {
        match self {
            HashAlgorithm::Md5 => 64,
            HashAlgorithm::Blake2b => 128,
            HashAlgorithm::Sha256 => 64,
        }
    }

    /// 十六进制摘要的字符数
    pub fn digest_len(self) -> usize {
        match self {
            HashAlgorithm::Md5 => 32,
            HashAlgorithm::Blake2b => 128,
            HashAlgorithm::Sha256 => 64,
        }
    }

    /// 创建一个新的累加器
    pub fn new_accumulator(self) -> Accumulator {
        match self {
            HashAlgorithm::Md5 => Accumulator::Md5(Md5::new()),
            HashAlgorithm::Blake2b => Accumulator::Blake2b(Blake2b512::new()),
            HashAlgorithm::Sha256 => Accumulator::Sha256(Sha256::new()),
        }
    }

    /// 直接计算一段内存数据的摘要
    pub fn digest_bytes(self, data: &[u8]) -> String {
        let mut acc = self.new_accumulator();
        acc.update(data);
        acc.finalize_hex()
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        HashAlgorithm::ALL
            .into_iter()
            .find(|a| a.name() == wanted)
            .ok_or_else(|| anyhow::anyhow!("Unknown hash algorithm: '{}'", s))
    }
}

/// 增量摘要累加器
///
/// 由创建它的哈希调用独占，调用结束时销毁。
pub enum Accumulator {
    Md5(Md5),
    Blake2b(Blake2b512),
    Sha256(Sha256),
}

impl Accumulator {
    /// 追加任意长度的数据
    pub fn update(&mut self, data: &[u8]) {
        match self {
            Accumulator::Md5(h) => Digest::update(h, data),
            Accumulator::Blake2b(h) => Digest::update(h, data),
            Accumulator::Sha256(h) => Digest::update(h, data),
        }
    }

    /// 结束计算并返回小写十六进制摘要
    pub fn finalize_hex(self) -> String {
        match self {
            Accumulator::Md5(h) => hex::encode(h.finalize()),
            Accumulator::Blake2b(h) => hex::encode(h.finalize()),
            Accumulator::Sha256(h) => hex::encode(h.finalize()),
        }
    }
}
