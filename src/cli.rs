//! 命令行入口。每个子命令对应一次界面操作：登录、拉取知识库、直接调用接口等。

use crate::auth;
use crate::config::{default_config_path, load_app_config, AppConfig};
use crate::context::AppContext;
use crate::dispatcher::Params;
use crate::error::AppError;
use crate::registry::{EndpointKey, ParamContext};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "kb-admin", version, about = "知识库管理客户端")]
pub struct Cli {
    /// 配置文件路径，默认位于系统配置目录
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// 覆盖配置中的后端地址
    #[arg(long, global = true)]
    pub api_url: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// 登录并保存会话
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// 退出登录
    Logout,
    /// 知识库相关操作
    #[command(subcommand)]
    Kb(KbCommand),
    /// 按接口名直接调用，参数格式 key=value（value 可为 JSON）
    Call {
        endpoint: String,
        #[arg(short, long = "param")]
        params: Vec<String>,
    },
    /// 列出所有已注册的接口
    Endpoints,
    /// 模拟一次页面跳转，输出守卫结果
    Navigate { path: String },
    /// 手机号相关
    #[command(subcommand)]
    Phone(PhoneCommand),
}

#[derive(Subcommand, Debug)]
pub enum KbCommand {
    /// 拉取知识库列表并输出当前状态
    List,
    /// 设置当前操作的知识库
    Use { kb_id: String },
}

#[derive(Subcommand, Debug)]
pub enum PhoneCommand {
    Set { number: String },
    Check,
}

/// 读取配置并应用命令行与环境变量覆盖
pub fn resolve_config(cli: &Cli) -> Result<AppConfig, AppError> {
    let path = match &cli.config {
        Some(path) => path.clone(),
        None => default_config_path()?,
    };
    let mut config = load_app_config(&path)?.apply_env_overrides();
    if let Some(url) = &cli.api_url {
        config.api_url = url.clone();
    }
    Ok(config)
}

pub async fn execute(ctx: &AppContext, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Login { username, password } => {
            let data = auth::login(
                &ctx.dispatcher,
                &ctx.user,
                ctx.cookies.as_ref(),
                &username,
                &password,
            )
            .await?;
            println!("登录成功: {} ({})", data.user_id, data.role);
            if !ctx.user.check_phone() {
                println!("请使用 `kb-admin phone set <号码>` 补充手机号");
            }
        }
        Command::Logout => {
            auth::logout(&ctx.user, ctx.cookies.as_ref());
            println!("已退出登录");
        }
        Command::Kb(KbCommand::List) => {
            ctx.knowledge_base.get_list().await;
            let state = ctx.knowledge_base.snapshot();
            println!("{}", serde_json::to_string_pretty(&state)?);
        }
        Command::Kb(KbCommand::Use { kb_id }) => {
            let name = ctx
                .knowledge_base
                .knowledge_base_list()
                .into_iter()
                .find(|item| item.kb_id == kb_id)
                .map(|item| item.kb_name)
                .unwrap_or_default();
            ctx.knowledge_base.set_current_id(kb_id);
            ctx.knowledge_base.set_current_kb_name(name);
        }
        Command::Call { endpoint, params } => {
            let params = parse_params(&params)?;
            let envelope = ctx
                .dispatcher
                .call_by_name(&endpoint, Some(params), None)
                .await?;
            println!("{}", serde_json::to_string_pretty(&envelope)?);
        }
        Command::Endpoints => {
            let ctx_params = ParamContext::default();
            for key in EndpointKey::ALL {
                let spec = key.spec(&ctx_params);
                println!("{:<20} {:<5} {}", key.as_str(), spec.method.as_str(), spec.path);
            }
        }
        Command::Navigate { path } => {
            let outcome = ctx.guard.navigate(&path);
            println!("{}", json!({ "outcome": format!("{:?}", outcome), "path": outcome.path() }));
        }
        Command::Phone(PhoneCommand::Set { number }) => {
            ctx.user.set_phone_number(number);
            ctx.user.set_user_phone_dialog_open(false);
        }
        Command::Phone(PhoneCommand::Check) => {
            println!("{}", ctx.user.check_phone());
        }
    }
    Ok(())
}

/// 解析 `key=value` 形式的参数，value 能按 JSON 解析时保留其类型
pub fn parse_params(raw: &[String]) -> Result<Params, AppError> {
    let mut params = Params::new();
    for item in raw {
        let (key, value) = item
            .split_once('=')
            .ok_or_else(|| AppError::InvalidParams(format!("缺少 '=': {}", item)))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(AppError::InvalidParams(format!("参数名为空: {}", item)));
        }
        let value = serde_json::from_str::<Value>(value)
            .unwrap_or_else(|_| Value::String(value.to_string()));
        params.insert(key.to_string(), value);
    }
    Ok(params)
}
