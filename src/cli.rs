// Hashbench - 命令行交互界面模块
// 提供交互式命令行界面，用于选择、创建和删除测试套件

use anyhow::{Context, Result};
use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};
use std::path::PathBuf;

use crate::algorithm::HashAlgorithm;
use crate::config::BenchConfig;
use crate::hasher::{Strategy, DEFAULT_CHUNK_BLOCKS};
use crate::store::{AppConfig, CaseSpec, Suite, BUILTIN_SUITE};

/// 运行交互式模式
///
/// 此函数提供交互式命令行界面，允许用户：
/// - 选择已保存的测试套件（或内置套件）
/// - 创建新的测试套件
/// - 删除测试套件
/// - 退出程序
///
/// # 返回
/// * `Ok(Some((String, Suite)))` - 选中的套件名称和内容
/// * `Ok(None)` - 用户选择退出
/// * `Err(anyhow::Error)` - 操作失败
pub fn run_interactive_mode() -> Result<Option<(String, Suite)>> {
    let mut app_config = AppConfig::load()?;
    let theme = ColorfulTheme::default();

    println!(
        "{}",
        style(format!("Hashbench v{}", env!("CARGO_PKG_VERSION")))
            .cyan()
            .bold()
    );
    println!(
        "{}",
        style("----------------------------------------").dim()
    );

    loop {
        let mut names: Vec<String> = app_config.suites.keys().cloned().collect();
        if !names.iter().any(|n| n == BUILTIN_SUITE) {
            names.push(BUILTIN_SUITE.to_string());
        }

        // 菜单选项显示每个套件的用例数量
        let mut choices: Vec<String> = names
            .iter()
            .map(|name| match app_config.suite(name) {
                Some(suite) => format!("{} ({} case(s))", name, suite.cases.len()),
                None => name.clone(),
            })
            .collect();

        choices.push(">> Create New Suite".to_string());
        if !app_config.suites.is_empty() {
            choices.push(">> Delete Suite".to_string());
        }
        choices.push(">> Exit".to_string());

        let selection = Select::with_theme(&theme)
            .with_prompt("Select a benchmark suite")
            .default(0)
            .items(&choices)
            .interact()?;

        let choice = &choices[selection];

        if choice == ">> Exit" {
            return Ok(None);
        } else if choice == ">> Create New Suite" {
            create_new_suite(&mut app_config)?;
            continue;
        } else if choice == ">> Delete Suite" {
            delete_suite(&mut app_config)?;
            continue;
        } else {
            // selection 索引对应 names 数组
            let name = names[selection].clone();
            let suite = app_config
                .suite(&name)
                .with_context(|| format!("Suite '{}' disappeared", name))?;
            return Ok(Some((name, suite)));
        }
    }
}

/// 创建新的测试套件
///
/// 依次询问每个用例的文件、算法、策略、重复次数和期望摘要，
/// 完成后保存到配置文件中。
fn create_new_suite(config: &mut AppConfig) -> Result<()> {
    let theme = ColorfulTheme::default();

    let name: String = Input::with_theme(&theme)
        .with_prompt("Suite Name")
        .interact_text()?;

    let mut suite = Suite::default();
    loop {
        suite.cases.push(prompt_case(&theme)?);

        let more = Confirm::with_theme(&theme)
            .with_prompt("Add another case?")
            .default(false)
            .interact()?;
        if !more {
            break;
        }
    }

    // 保存前先校验，避免把无法运行的套件写入配置文件
    BenchConfig::from_suite(&suite, 1, true)
        .with_context(|| format!("Suite '{}' is not valid and was not saved", name))?;

    config.suites.insert(name, suite);
    config.save()?;
    println!("Suite saved successfully!");
    Ok(())
}

/// 询问单个用例
fn prompt_case(theme: &ColorfulTheme) -> Result<CaseSpec> {
    let path: String = Input::with_theme(theme)
        .with_prompt("File Path")
        .interact_text()?;

    let algorithm_names: Vec<&str> = HashAlgorithm::ALL.iter().map(|a| a.name()).collect();
    let algorithm = Select::with_theme(theme)
        .with_prompt("Hash Algorithm")
        .default(0)
        .items(&algorithm_names)
        .interact()?;

    let strategy_choices = ["both", "chunked", "buffered"];
    let strategy = Select::with_theme(theme)
        .with_prompt("Read Strategy")
        .default(0)
        .items(&strategy_choices)
        .interact()?;

    let repetitions: u32 = Input::with_theme(theme)
        .with_prompt("Repetitions")
        .default(1)
        .interact_text()?;

    let expected: String = Input::with_theme(theme)
        .with_prompt("Expected Checksum (empty to skip)")
        .allow_empty(true)
        .interact_text()?;

    let mut case = CaseSpec::new(PathBuf::from(path), HashAlgorithm::ALL[algorithm]);
    case.strategies = match strategy {
        1 => vec![Strategy::Chunked],
        2 => vec![Strategy::Buffered],
        _ => Strategy::ALL.to_vec(),
    };
    case.chunk_blocks = DEFAULT_CHUNK_BLOCKS;
    case.repetitions = repetitions;
    case.expected = Some(expected.trim().to_string()).filter(|e| !e.is_empty());
    Ok(case)
}

/// 删除测试套件
///
/// 内置套件不会出现在列表中。
fn delete_suite(config: &mut AppConfig) -> Result<()> {
    let names: Vec<String> = config.suites.keys().cloned().collect();
    if names.is_empty() {
        println!("{}", style("No suites available to delete.").yellow());
        return Ok(());
    }

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Select a suite to DELETE")
        .items(&names)
        .interact()?;

    let name = &names[selection];

    if Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(format!(
            "Are you sure you want to delete suite '{}'?",
            style(name).red().bold()
        ))
        .default(false)
        .interact()?
    {
        config.suites.remove(name);
        config.save()?;
        println!("{} '{}' has been deleted.", style("Success:").green(), name);
    } else {
        println!("Operation cancelled.");
    }

    Ok(())
}
