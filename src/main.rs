// ==========================================
// 合同事项台账 - 命令行入口
// ==========================================
// 子命令: import / list / dashboard / owners / batches / config
// 输出: 结果以 JSON 写入 stdout，日志写入 stderr
// ==========================================

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use matter_ledger::api::{ImportRequest, MatterQuery};
use matter_ledger::app::{get_default_data_dir, AppState};
use matter_ledger::logging::{self, LogFormat};
use matter_ledger::MergeMode;

#[derive(Parser)]
#[command(name = "matter-ledger")]
#[command(about = "Import spreadsheets into a canonical matter ledger")]
#[command(version)]
struct Cli {
    /// 数据目录（matters.json / owners.json / matter_ledger.db）
    #[arg(long, global = true, env = "MATTER_LEDGER_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// 消息语言（zh-CN / en）
    #[arg(long, global = true, default_value = "zh-CN")]
    locale: String,

    /// 以 JSON 行输出日志
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 导入一个或多个工作簿（.xlsx/.xlsm/.csv）
    Import {
        /// 工作簿路径
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// 目标工作表
        #[arg(long, short = 's')]
        sheet: Option<String>,

        /// 合并模式（append / replace），缺省取配置
        #[arg(long, short = 'm')]
        mode: Option<MergeMode>,
    },

    /// 列出事项
    List {
        /// 全文检索
        #[arg(long, short = 'q')]
        query: Option<String>,

        /// 字段筛选 field=value，可重复
        #[arg(long = "filter", value_name = "FIELD=VALUE")]
        filters: Vec<String>,
    },

    /// 驾驶舱汇总
    Dashboard,

    /// 负责人名册
    Owners {
        #[command(subcommand)]
        action: Option<OwnerAction>,
    },

    /// 最近的导入批次
    Batches {
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// 配置读写
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum OwnerAction {
    /// 列出负责人
    List,
    /// 新建负责人
    Add {
        name: String,
        #[arg(long, default_value = "")]
        job_title: String,
        #[arg(long, default_value = "")]
        function: String,
    },
    /// 修改负责人
    Rename {
        id: String,
        name: String,
        #[arg(long, default_value = "")]
        job_title: String,
        #[arg(long, default_value = "")]
        function: String,
    },
    /// 删除负责人
    Remove { id: String },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// 读取配置
    Get { key: String },
    /// 写入配置
    Set { key: String, value: String },
    /// 列出全部配置
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init_with_format(if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    });
    matter_ledger::i18n::set_locale(&cli.locale);

    let data_dir = cli.data_dir.unwrap_or_else(get_default_data_dir);
    tracing::debug!("{} v{}", matter_ledger::APP_NAME, matter_ledger::VERSION);
    let state = AppState::new(&data_dir).map_err(|e| anyhow!(e))?;

    match cli.command {
        Commands::Import { files, sheet, mode } => cmd_import(&state, files, sheet, mode).await,
        Commands::List { query, filters } => {
            let mut q = MatterQuery {
                q: query,
                ..Default::default()
            };
            for raw in filters {
                let (field, value) = raw
                    .split_once('=')
                    .with_context(|| format!("筛选条件格式应为 FIELD=VALUE: {}", raw))?;
                q.filters.insert(field.trim().to_string(), value.to_string());
            }
            print_json(&state.matter_api.list_matters(&q)?)
        }
        Commands::Dashboard => print_json(&state.dashboard_api.get_summary()?),
        Commands::Owners { action } => cmd_owners(&state, action.unwrap_or(OwnerAction::List)),
        Commands::Batches { limit } => print_json(&state.import_api.list_batches(limit).await?),
        Commands::Config { action } => cmd_config(&state, action),
    }
}

async fn cmd_import(
    state: &AppState,
    files: Vec<PathBuf>,
    sheet: Option<String>,
    mode: Option<MergeMode>,
) -> Result<()> {
    if let [file] = files.as_slice() {
        let response = state
            .import_api
            .import_file(file, sheet.as_deref(), mode)
            .await?;
        eprintln!("{}", response.message);
        return print_json(&response);
    }

    // 多个文件: 先读入全部字节，再并发导入
    let mut requests = Vec::with_capacity(files.len());
    for path in &files {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("读取文件失败: {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        requests.push(ImportRequest {
            file_name,
            bytes,
            sheet_hint: sheet.clone(),
            mode,
        });
    }

    let results = state.import_api.batch_import(requests).await;
    let mut failed = 0;
    for (path, result) in files.iter().zip(results) {
        match result {
            Ok(response) => {
                eprintln!("{}: {}", path.display(), response.message);
                print_json(&response)?;
            }
            Err(e) => {
                failed += 1;
                eprintln!("{}: {}", path.display(), e);
            }
        }
    }
    if failed > 0 {
        bail!("{} 个文件导入失败", failed);
    }
    Ok(())
}

fn cmd_owners(state: &AppState, action: OwnerAction) -> Result<()> {
    let api = &state.owner_api;
    match action {
        OwnerAction::List => print_json(&api.list_owners()?),
        OwnerAction::Add {
            name,
            job_title,
            function,
        } => print_json(&api.create_owner(&name, &job_title, &function)?),
        OwnerAction::Rename {
            id,
            name,
            job_title,
            function,
        } => print_json(&api.update_owner(&id, &name, &job_title, &function)?),
        OwnerAction::Remove { id } => print_json(&api.delete_owner(&id)?),
    }
}

fn cmd_config(state: &AppState, action: ConfigAction) -> Result<()> {
    let config = &state.config_manager;
    match action {
        ConfigAction::Get { key } => {
            // 未写入的已知键返回默认值
            let listed = config.list_global_config().map_err(|e| anyhow!(e.to_string()))?;
            match listed.get(&key) {
                Some(value) => println!("{}", value),
                None => bail!("未知配置键: {}", key),
            }
            Ok(())
        }
        ConfigAction::Set { key, value } => {
            config
                .set_global_config_value(&key, &value)
                .map_err(|e| anyhow!(e.to_string()))?;
            println!("{}={}", key, value);
            Ok(())
        }
        ConfigAction::List => {
            let listed = config.list_global_config().map_err(|e| anyhow!(e.to_string()))?;
            print_json(&listed)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
