// Hashbench - 大文件整文件哈希吞吐量基准测试工具
// 模块声明文件

/// 哈希算法描述和摘要累加器模块
pub mod algorithm;

/// 基准测试用例和结果模块
pub mod case;

/// 命令行交互界面模块
pub mod cli;

/// 运行配置管理模块
pub mod config;

/// 基准测试执行器模块
pub mod executor;

/// 测试夹具（全零大文件）模块
pub mod fixture;

/// 文件哈希计算模块
pub mod hasher;

/// 测试套件存储模块
pub mod store;

/// 工具函数模块
pub mod utils;
