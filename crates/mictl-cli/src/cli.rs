//! Argument parsing and command dispatch.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use reqwest::Url;
use uuid::Uuid;

use crate::client::{CliDependencies, CliResult, ClientOptions, parse_url};
use crate::commands::artifacts::{
    APIS, COMPOSITE_APPS, DATA_SERVICES, ENDPOINTS, INBOUND_ENDPOINTS, LOCAL_ENTRIES,
    MESSAGE_PROCESSORS, MESSAGE_STORES, PROXY_SERVICES, SEQUENCES, TASKS, handle_get_artifact,
};
use crate::commands::auth::{handle_login, handle_logout};
use crate::commands::env::{handle_add_env, handle_get_envs, handle_remove_env};
use crate::commands::loggers::{handle_add_logger, handle_get_log_level, handle_update_log_level};
use crate::commands::logs::handle_get_logs;
use crate::commands::roles::{handle_add_role, handle_delete_role, handle_get_roles};
use crate::commands::state::handle_state_change;
use crate::commands::templates::handle_get_templates;
use crate::commands::transactions::handle_get_transaction_counts;
use crate::commands::users::{
    handle_add_user, handle_delete_user, handle_get_users, handle_update_user,
};
use crate::models::{
    ApiDetail, ApiSummary, CompositeAppDetail, CompositeAppSummary, DataServiceDetail,
    DataServiceSummary, EndpointDetail, EndpointSummary, InboundDetail, InboundSummary,
    LocalEntryDetail, LocalEntrySummary, MessageProcessorDetail, MessageProcessorSummary,
    MessageStoreDetail, MessageStoreSummary, ProxyDetail, ProxySummary, SequenceDetail,
    SequenceSummary, TaskDetail, TaskSummary,
};
use crate::telemetry::{LoggingConfig, init_logging};

/// Parses CLI arguments, executes the requested command, and reports
/// failures. Returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    if let Err(err) = init_logging(&LoggingConfig::from_flags(cli.verbose)) {
        eprintln!("warning: logging unavailable: {err:#}");
    }

    let trace_id = Uuid::new_v4().to_string();
    let options = ClientOptions {
        config_dir: cli.config_dir,
        timeout_ms: cli.timeout,
        insecure: cli.insecure,
    };
    let deps = match CliDependencies::from_options(&options, &trace_id) {
        Ok(deps) => deps,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            return err.exit_code();
        }
    };

    let mut stdout = io::stdout();
    match dispatch(cli.command, &deps, &mut stdout).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

pub(crate) async fn dispatch(
    command: Command,
    deps: &CliDependencies,
    out: &mut dyn Write,
) -> CliResult<()> {
    match command {
        Command::Login(args) => {
            let ctx = deps.context(&args.environment)?;
            handle_login(&ctx, args, out).await
        }
        Command::Logout(args) => {
            let ctx = deps.context(&args.environment)?;
            handle_logout(&ctx, out).await
        }
        Command::Get(get) => dispatch_get(get, deps, out).await,
        Command::Add(add) => match add {
            AddCommand::Env(args) => handle_add_env(&deps.paths, &deps.config, &args, out),
            AddCommand::User(args) => {
                let ctx = deps.context(&args.environment)?;
                handle_add_user(&ctx, args, out).await
            }
            AddCommand::Role(args) => {
                let ctx = deps.context(&args.environment)?;
                handle_add_role(&ctx, args, out).await
            }
            AddCommand::LogLevel(args) => {
                let ctx = deps.context(&args.environment)?;
                handle_add_logger(&ctx, args, out).await
            }
        },
        Command::Update(update) => match update {
            UpdateCommand::User(args) => {
                let ctx = deps.context(&args.environment)?;
                handle_update_user(&ctx, args, out).await
            }
            UpdateCommand::LogLevel(args) => {
                let ctx = deps.context(&args.environment)?;
                handle_update_log_level(&ctx, args, out).await
            }
        },
        Command::Delete(delete) => match delete {
            DeleteCommand::User(args) => {
                let ctx = deps.context(&args.environment)?;
                handle_delete_user(&ctx, args, out).await
            }
            DeleteCommand::Role(args) => {
                let ctx = deps.context(&args.environment)?;
                handle_delete_role(&ctx, args, out).await
            }
        },
        Command::Remove(RemoveCommand::Env(args)) => {
            handle_remove_env(&deps.paths, &deps.config, deps.credentials.as_ref(), &args, out)
        }
        Command::Activate(target) => dispatch_state(target, true, deps, out).await,
        Command::Deactivate(target) => dispatch_state(target, false, deps, out).await,
    }
}

async fn dispatch_state(
    command: StateCommand,
    activate: bool,
    deps: &CliDependencies,
    out: &mut dyn Write,
) -> CliResult<()> {
    let (target, args) = command.split();
    let ctx = deps.context(&args.environment)?;
    handle_state_change(&ctx, target, &args.name, activate, out).await
}

async fn dispatch_get(
    command: GetCommand,
    deps: &CliDependencies,
    out: &mut dyn Write,
) -> CliResult<()> {
    match command {
        GetCommand::Envs(args) => handle_get_envs(&deps.config, &args, out),
        GetCommand::Apis(args) => {
            let ctx = deps.context(&args.target.environment)?;
            handle_get_artifact::<ApiSummary, ApiDetail>(&ctx, &APIS, args, out).await
        }
        GetCommand::ProxyServices(args) => {
            let ctx = deps.context(&args.target.environment)?;
            handle_get_artifact::<ProxySummary, ProxyDetail>(&ctx, &PROXY_SERVICES, args, out)
                .await
        }
        GetCommand::Endpoints(args) => {
            let ctx = deps.context(&args.target.environment)?;
            handle_get_artifact::<EndpointSummary, EndpointDetail>(&ctx, &ENDPOINTS, args, out)
                .await
        }
        GetCommand::Sequences(args) => {
            let ctx = deps.context(&args.target.environment)?;
            handle_get_artifact::<SequenceSummary, SequenceDetail>(&ctx, &SEQUENCES, args, out)
                .await
        }
        GetCommand::InboundEndpoints(args) => {
            let ctx = deps.context(&args.target.environment)?;
            handle_get_artifact::<InboundSummary, InboundDetail>(
                &ctx,
                &INBOUND_ENDPOINTS,
                args,
                out,
            )
            .await
        }
        GetCommand::MessageStores(args) => {
            let ctx = deps.context(&args.target.environment)?;
            handle_get_artifact::<MessageStoreSummary, MessageStoreDetail>(
                &ctx,
                &MESSAGE_STORES,
                args,
                out,
            )
            .await
        }
        GetCommand::MessageProcessors(args) => {
            let ctx = deps.context(&args.target.environment)?;
            handle_get_artifact::<MessageProcessorSummary, MessageProcessorDetail>(
                &ctx,
                &MESSAGE_PROCESSORS,
                args,
                out,
            )
            .await
        }
        GetCommand::Tasks(args) => {
            let ctx = deps.context(&args.target.environment)?;
            handle_get_artifact::<TaskSummary, TaskDetail>(&ctx, &TASKS, args, out).await
        }
        GetCommand::LocalEntries(args) => {
            let ctx = deps.context(&args.target.environment)?;
            handle_get_artifact::<LocalEntrySummary, LocalEntryDetail>(
                &ctx,
                &LOCAL_ENTRIES,
                args,
                out,
            )
            .await
        }
        GetCommand::DataServices(args) => {
            let ctx = deps.context(&args.target.environment)?;
            handle_get_artifact::<DataServiceSummary, DataServiceDetail>(
                &ctx,
                &DATA_SERVICES,
                args,
                out,
            )
            .await
        }
        GetCommand::CompositeApps(args) => {
            let ctx = deps.context(&args.target.environment)?;
            handle_get_artifact::<CompositeAppSummary, CompositeAppDetail>(
                &ctx,
                &COMPOSITE_APPS,
                args,
                out,
            )
            .await
        }
        GetCommand::Templates(args) => {
            let ctx = deps.context(&args.target.environment)?;
            handle_get_templates(&ctx, args, out).await
        }
        GetCommand::Users(args) => {
            let ctx = deps.context(&args.target.environment)?;
            handle_get_users(&ctx, args, out).await
        }
        GetCommand::Roles(args) => {
            let ctx = deps.context(&args.target.environment)?;
            handle_get_roles(&ctx, args, out).await
        }
        GetCommand::Logs(args) => {
            let ctx = deps.context(&args.target.environment)?;
            handle_get_logs(&ctx, args, out).await
        }
        GetCommand::LogLevels(args) => {
            let ctx = deps.context(&args.target.environment)?;
            handle_get_log_level(&ctx, args, out).await
        }
        GetCommand::TransactionCounts(args) => {
            let ctx = deps.context(&args.target.environment)?;
            handle_get_transaction_counts(&ctx, args, out).await
        }
    }
}

#[derive(Parser)]
#[command(
    name = "mictl",
    about = "Command-line client for the Micro Integrator management API"
)]
pub(crate) struct Cli {
    #[arg(
        long,
        global = true,
        env = "MICTL_CONFIG_DIR",
        help = "Directory holding main_config.yaml and stored credentials"
    )]
    config_dir: Option<PathBuf>,
    #[arg(
        short = 'k',
        long,
        global = true,
        help = "Skip TLS certificate verification"
    )]
    insecure: bool,
    #[arg(
        long,
        global = true,
        env = "MICTL_HTTP_TIMEOUT_MS",
        help = "HTTP request timeout in milliseconds"
    )]
    timeout: Option<u64>,
    #[arg(long, global = true, help = "Print request diagnostics to stderr")]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Log in to the Micro Integrator of an environment.
    Login(LoginArgs),
    /// Log out and forget the stored credentials of an environment.
    Logout(LogoutArgs),
    #[command(subcommand)]
    Get(GetCommand),
    #[command(subcommand)]
    Add(AddCommand),
    #[command(subcommand)]
    Update(UpdateCommand),
    #[command(subcommand)]
    Delete(DeleteCommand),
    #[command(subcommand)]
    Remove(RemoveCommand),
    #[command(subcommand)]
    Activate(StateCommand),
    #[command(subcommand)]
    Deactivate(StateCommand),
}

/// Environment and output format shared by every `get` command.
#[derive(Args, Debug, Clone)]
pub(crate) struct TargetArgs {
    #[arg(short = 'e', long = "environment", help = "Environment to query")]
    pub(crate) environment: String,
    #[arg(
        long,
        help = "Output format: `table <template>`, `detail <template>`, or a custom template"
    )]
    pub(crate) format: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct ArtifactArgs {
    #[arg(help = "Show the details of this artifact instead of the list")]
    pub(crate) name: Option<String>,
    #[command(flatten)]
    pub(crate) target: TargetArgs,
}

#[derive(Subcommand)]
pub(crate) enum GetCommand {
    #[command(alias = "api")]
    Apis(ArtifactArgs),
    #[command(alias = "proxy-service")]
    ProxyServices(ArtifactArgs),
    #[command(alias = "endpoint")]
    Endpoints(ArtifactArgs),
    #[command(alias = "sequence")]
    Sequences(ArtifactArgs),
    #[command(alias = "inbound-endpoint")]
    InboundEndpoints(ArtifactArgs),
    #[command(alias = "message-store")]
    MessageStores(ArtifactArgs),
    #[command(alias = "message-processor")]
    MessageProcessors(ArtifactArgs),
    #[command(alias = "task")]
    Tasks(ArtifactArgs),
    #[command(alias = "local-entry")]
    LocalEntries(ArtifactArgs),
    #[command(alias = "data-service")]
    DataServices(ArtifactArgs),
    #[command(alias = "composite-app")]
    CompositeApps(ArtifactArgs),
    #[command(alias = "template")]
    Templates(TemplateArgs),
    #[command(alias = "user")]
    Users(GetUsersArgs),
    #[command(alias = "role")]
    Roles(GetRolesArgs),
    #[command(alias = "log")]
    Logs(GetLogsArgs),
    #[command(alias = "log-level")]
    LogLevels(GetLogLevelArgs),
    #[command(alias = "transaction-count")]
    TransactionCounts(TransactionCountArgs),
    #[command(alias = "env")]
    Envs(FormatArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub(crate) struct FormatArgs {
    #[arg(long, help = "Output format template")]
    pub(crate) format: Option<String>,
}

/// Template kinds accepted on the command line.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum TemplateTypeArg {
    Sequence,
    Endpoint,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct TemplateArgs {
    #[arg(value_enum, help = "List only templates of this type")]
    pub(crate) kind: Option<TemplateTypeArg>,
    #[arg(requires = "kind", help = "Show the details of this template")]
    pub(crate) name: Option<String>,
    #[command(flatten)]
    pub(crate) target: TargetArgs,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct GetUsersArgs {
    #[arg(help = "Show the details of this user")]
    pub(crate) user_id: Option<String>,
    #[arg(short = 'r', long, help = "List users with this role")]
    pub(crate) role: Option<String>,
    #[arg(short = 'p', long, help = "List users whose id matches this pattern")]
    pub(crate) pattern: Option<String>,
    #[arg(short = 'd', long, help = "User store domain")]
    pub(crate) domain: Option<String>,
    #[command(flatten)]
    pub(crate) target: TargetArgs,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct GetRolesArgs {
    #[arg(help = "Show the details of this role")]
    pub(crate) role: Option<String>,
    #[arg(short = 'd', long, help = "User store domain")]
    pub(crate) domain: Option<String>,
    #[command(flatten)]
    pub(crate) target: TargetArgs,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct GetLogsArgs {
    #[arg(help = "Download this log file instead of listing")]
    pub(crate) file: Option<String>,
    #[arg(
        short = 'p',
        long,
        default_value = ".",
        help = "Directory to download the log file into"
    )]
    pub(crate) path: PathBuf,
    #[command(flatten)]
    pub(crate) target: TargetArgs,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct GetLogLevelArgs {
    #[arg(help = "Logger name")]
    pub(crate) logger: String,
    #[command(flatten)]
    pub(crate) target: TargetArgs,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct TransactionCountArgs {
    #[arg(help = "Year to report (requires month)", requires = "month")]
    pub(crate) year: Option<u16>,
    #[arg(help = "Month to report, 1-12")]
    pub(crate) month: Option<u8>,
    #[command(flatten)]
    pub(crate) target: TargetArgs,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct LoginArgs {
    #[arg(help = "Environment to log in to")]
    pub(crate) environment: String,
    #[arg(short = 'u', long)]
    pub(crate) username: Option<String>,
    #[arg(short = 'p', long)]
    pub(crate) password: Option<String>,
    #[arg(long, conflicts_with = "password", help = "Read the password from stdin")]
    pub(crate) password_stdin: bool,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct LogoutArgs {
    #[arg(help = "Environment to log out from")]
    pub(crate) environment: String,
}

#[derive(Subcommand)]
pub(crate) enum AddCommand {
    /// Register an environment.
    Env(AddEnvArgs),
    /// Add a user to the Micro Integrator user store.
    User(AddUserArgs),
    /// Add a role to the Micro Integrator user store.
    Role(RoleArgs),
    /// Add a logger with a level.
    LogLevel(AddLoggerArgs),
}

#[derive(Args, Debug, Clone)]
pub(crate) struct AddEnvArgs {
    #[arg(help = "Environment name")]
    pub(crate) name: String,
    #[arg(long = "mi", value_parser = parse_url, help = "Management endpoint of the Micro Integrator")]
    pub(crate) mi: Url,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct AddUserArgs {
    #[arg(help = "User id")]
    pub(crate) user_id: String,
    #[arg(long, help = "Grant admin privileges")]
    pub(crate) admin: bool,
    #[arg(long, help = "Password of the new user (prompted when omitted)")]
    pub(crate) password: Option<String>,
    #[arg(short = 'd', long, help = "User store domain")]
    pub(crate) domain: Option<String>,
    #[arg(short = 'e', long = "environment")]
    pub(crate) environment: String,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct RoleArgs {
    #[arg(help = "Role name")]
    pub(crate) role: String,
    #[arg(short = 'd', long, help = "User store domain")]
    pub(crate) domain: Option<String>,
    #[arg(short = 'e', long = "environment")]
    pub(crate) environment: String,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct UserIdArgs {
    #[arg(help = "User id")]
    pub(crate) user_id: String,
    #[arg(short = 'd', long, help = "User store domain")]
    pub(crate) domain: Option<String>,
    #[arg(short = 'e', long = "environment")]
    pub(crate) environment: String,
}

#[derive(Subcommand)]
pub(crate) enum UpdateCommand {
    /// Add or remove roles of a user.
    User(UpdateUserArgs),
    /// Change the level of an existing logger.
    LogLevel(UpdateLogLevelArgs),
}

#[derive(Args, Debug, Clone)]
pub(crate) struct UpdateUserArgs {
    #[arg(help = "User id")]
    pub(crate) user_id: String,
    #[arg(long = "add-role", value_delimiter = ',', help = "Roles to assign")]
    pub(crate) added_roles: Vec<String>,
    #[arg(long = "remove-role", value_delimiter = ',', help = "Roles to revoke")]
    pub(crate) removed_roles: Vec<String>,
    #[arg(short = 'd', long, help = "User store domain")]
    pub(crate) domain: Option<String>,
    #[arg(short = 'e', long = "environment")]
    pub(crate) environment: String,
}

/// Logger levels understood by the server.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "UPPER")]
pub(crate) enum LogLevel {
    Off,
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl LogLevel {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Fatal => "FATAL",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub(crate) struct UpdateLogLevelArgs {
    #[arg(help = "Logger name")]
    pub(crate) logger: String,
    #[arg(value_enum, ignore_case = true, help = "New level")]
    pub(crate) level: LogLevel,
    #[arg(short = 'e', long = "environment")]
    pub(crate) environment: String,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct AddLoggerArgs {
    #[arg(help = "Logger name")]
    pub(crate) logger: String,
    #[arg(help = "Fully qualified class or package the logger applies to")]
    pub(crate) class: String,
    #[arg(value_enum, ignore_case = true, help = "Initial level")]
    pub(crate) level: LogLevel,
    #[arg(short = 'e', long = "environment")]
    pub(crate) environment: String,
}

#[derive(Subcommand)]
pub(crate) enum DeleteCommand {
    /// Delete a user.
    User(UserIdArgs),
    /// Delete a role.
    Role(RoleArgs),
}

#[derive(Subcommand)]
pub(crate) enum RemoveCommand {
    /// Forget a registered environment.
    Env(RemoveEnvArgs),
}

#[derive(Args, Debug, Clone)]
pub(crate) struct RemoveEnvArgs {
    #[arg(help = "Environment name")]
    pub(crate) name: String,
}

/// Artifacts whose state can be toggled.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum StateTarget {
    Endpoint,
    ProxyService,
    MessageProcessor,
}

#[derive(Subcommand)]
pub(crate) enum StateCommand {
    Endpoint(StateArgs),
    ProxyService(StateArgs),
    MessageProcessor(StateArgs),
}

impl StateCommand {
    fn split(self) -> (StateTarget, StateArgs) {
        match self {
            Self::Endpoint(args) => (StateTarget::Endpoint, args),
            Self::ProxyService(args) => (StateTarget::ProxyService, args),
            Self::MessageProcessor(args) => (StateTarget::MessageProcessor, args),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub(crate) struct StateArgs {
    #[arg(help = "Artifact name")]
    pub(crate) name: String,
    #[arg(short = 'e', long = "environment")]
    pub(crate) environment: String,
}
