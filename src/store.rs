// Hashbench - 测试套件存储模块
// 负责测试套件（Suite）的加载和保存

use crate::algorithm::HashAlgorithm;
use crate::hasher::{Strategy, DEFAULT_CHUNK_BLOCKS};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// 内置套件的名称
pub const BUILTIN_SUITE: &str = "default";

/// 套件中的单个用例描述
///
/// 一个描述会按 `strategies` 展开为多个基准测试用例。
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CaseSpec {
    /// 显示名称（可选）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// 文件路径（相对路径以套件文件所在目录为基准）
    pub path: PathBuf,

    /// 哈希算法
    #[serde(default)]
    pub algorithm: HashAlgorithm,

    /// 要比较的读取策略
    #[serde(default = "default_strategies")]
    pub strategies: Vec<Strategy>,

    /// 分块策略的块数量
    #[serde(default = "default_chunk_blocks")]
    pub chunk_blocks: usize,

    /// 期望摘要
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,

    /// 重复次数
    #[serde(default = "default_repetitions")]
    pub repetitions: u32,
}

fn default_strategies() -> Vec<Strategy> {
    Strategy::ALL.to_vec()
}

fn default_chunk_blocks() -> usize {
    DEFAULT_CHUNK_BLOCKS
}

fn default_repetitions() -> u32 {
    1
}

impl CaseSpec {
    /// 创建使用默认参数的用例描述
    pub fn new(path: PathBuf, algorithm: HashAlgorithm) -> Self {
        Self {
            name: None,
            path,
            algorithm,
            strategies: default_strategies(),
            chunk_blocks: DEFAULT_CHUNK_BLOCKS,
            expected: None,
            repetitions: default_repetitions(),
        }
    }
}

/// 测试套件
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct Suite {
    /// 用例列表
    #[serde(default)]
    pub cases: Vec<CaseSpec>,
}

impl Suite {
    /// 从独立的 TOML 文件加载套件
    ///
    /// 文件中的相对路径会转换为相对于该文件所在目录的路径。
    pub fn load_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read suite file {:?}", path))?;
        let mut suite: Suite = toml::from_str(&content)
            .with_context(|| format!("Failed to parse suite file {:?}", path))?;

        if let Some(base) = path.parent() {
            for case in &mut suite.cases {
                if case.path.is_relative() {
                    case.path = base.join(&case.path);
                }
            }
        }
        Ok(suite)
    }

    /// 内置套件
    ///
    /// 对 1 GiB 和 100 GiB 全零文件分别用 MD5 和 BLAKE2b 测试两种策略，
    /// 期望值是全零文件的已知摘要。夹具文件可通过
    /// `hashbench fixture 1Gtmp 1G` 和 `hashbench fixture 100Gtmp 100G` 创建。
    pub fn builtin() -> Self {
        let case = |path: &str, algorithm, expected: &str, repetitions| CaseSpec {
            name: None,
            path: PathBuf::from(path),
            algorithm,
            strategies: default_strategies(),
            chunk_blocks: DEFAULT_CHUNK_BLOCKS,
            expected: Some(expected.to_string()),
            repetitions,
        };

        Self {
            cases: vec![
                case("1Gtmp", HashAlgorithm::Md5, "cd573cfaace07e7949bc0c46028904ff", 10),
                case("100Gtmp", HashAlgorithm::Md5, "09cd755eb35bc534487a5796d781a856", 1),
                case(
                    "1Gtmp",
                    HashAlgorithm::Blake2b,
                    "9ba5dba8be8c8ab1474e7dbe5c7d2fb29c8d161beb5a5d4410b342445c60ab1d\
                     d895062c3561d3b128e96938a11a1c89a80169b3e3654dbf76b6eed50dc5e1c6",
                    10,
                ),
                case(
                    "100Gtmp",
                    HashAlgorithm::Blake2b,
                    "8d07b2a7497b4caa271185c9a3e2b4c47c058e5af35adf00e3925edde6a82b6b\
                     90af3fb93b876d550b2b0d553dac5789c89e146f9006de5110b48293ea782119",
                    1,
                ),
            ],
        }
    }
}

/// 应用程序全局配置
///
/// 包含所有用户保存的测试套件，存储在系统标准配置目录中。
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// 套件集合，键为套件名称
    #[serde(default)]
    pub suites: BTreeMap<String, Suite>,
}

impl AppConfig {
    /// 从配置文件加载应用配置
    ///
    /// # 返回
    /// * `Ok(AppConfig)` - 加载的配置，如果文件不存在则返回空配置
    /// * `Err(anyhow::Error)` - 如果配置文件存在但解析失败
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    /// 从指定路径加载
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).context("Failed to parse config file")
    }

    /// 保存配置到文件
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    /// 保存到指定路径，目录不存在时自动创建
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).context("Failed to write config file")
    }

    /// 按名称查找套件，找不到时回退到内置套件
    pub fn suite(&self, name: &str) -> Option<Suite> {
        match self.suites.get(name) {
            Some(suite) => Some(suite.clone()),
            None if name == BUILTIN_SUITE => Some(Suite::builtin()),
            None => None,
        }
    }

    /// 获取配置文件的路径
    ///
    /// 使用 `directories` crate 获取平台标准的配置目录：
    /// - Windows: `C:\Users\<用户>\AppData\Roaming\hashbench\config.toml`
    /// - macOS: `~/Library/Application Support/hashbench/config.toml`
    /// - Linux: `~/.config/hashbench/config.toml`
    pub fn get_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("", "", "hashbench")
            .context("Could not determine config directory")?;
        Ok(proj_dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_suite_with_defaults() {
        let suite: Suite = toml::from_str(
            r#"
            [[cases]]
            path = "big.bin"

            [[cases]]
            name = "blake"
            path = "/abs/big.bin"
            algorithm = "blake2b"
            strategies = ["buffered"]
            chunk_blocks = 64
            repetitions = 3
            expected = "abc"
            "#,
        )
        .unwrap();

        assert_eq!(suite.cases.len(), 2);
        assert_eq!(suite.cases[0], CaseSpec::new(PathBuf::from("big.bin"), HashAlgorithm::Md5));
        assert_eq!(suite.cases[1].algorithm, HashAlgorithm::Blake2b);
        assert_eq!(suite.cases[1].strategies, vec![Strategy::Buffered]);
        assert_eq!(suite.cases[1].chunk_blocks, 64);
        assert_eq!(suite.cases[1].repetitions, 3);
    }

    #[test]
    fn suite_file_paths_are_relative_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("suite.toml");
        fs::write(
            &file,
            "[[cases]]\npath = \"data.bin\"\n\n[[cases]]\npath = \"/abs.bin\"\n",
        )
        .unwrap();

        let suite = Suite::load_file(&file).unwrap();
        assert_eq!(suite.cases[0].path, dir.path().join("data.bin"));
        assert_eq!(suite.cases[1].path, PathBuf::from("/abs.bin"));
    }

    #[test]
    fn config_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = AppConfig::default();
        config.suites.insert("nightly".to_string(), Suite::builtin());
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.suites.get("nightly"), Some(&Suite::builtin()));
        assert!(AppConfig::load_from(&dir.path().join("missing.toml"))
            .unwrap()
            .suites
            .is_empty());
    }

    #[test]
    fn builtin_suite_is_a_fallback() {
        let config = AppConfig::default();
        assert_eq!(config.suite(BUILTIN_SUITE), Some(Suite::builtin()));
        assert!(config.suite("unknown").is_none());
        assert_eq!(Suite::builtin().cases.len(), 4);
    }
}
