/*!
 * s3bridge CLI - Command Line Interface
 */

use clap::{Args, Parser, Subcommand, ValueEnum};
use s3bridge::{
    cli_style::{self, print_error, print_info, print_success},
    config::{parse_metadata, AppConfig, LogLevel},
    context::AppContext,
    core::{connect, normalize_prefix, receive_files, send_files, template::TOKEN_HELP, TransferOptions},
    error::{BridgeError, ErrorCategory, Result, EXIT_SUCCESS},
    logging::{self, LogOptions},
    stats::{BatchReport, TransferDirection},
    vault,
};
use secrecy::SecretString;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "s3bridge")]
#[command(version, about = "Move files between a local folder and S3, with Vault-brokered credentials", long_about = None)]
struct Cli {
    /// Configuration file (default: s3bridge.json in $S3BRIDGE_CONFIG or the home directory)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, value_enum, default_value = "info", global = true)]
    log_level: LogLevelArg,

    /// Write JSON logs to this file instead of stderr
    #[arg(long, value_name = "FILE", global = true)]
    log: Option<PathBuf>,

    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Download objects from the bucket into the local folder
    Get(TransferArgs),

    /// Upload files from the local folder into the bucket
    Put(PutArgs),

    /// Update the saved configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Vault utilities
    #[command(subcommand)]
    Vault(VaultCommands),
}

/// Flags shared by `get` and `put`; they override the saved configuration for this run only
#[derive(Args, Debug, Clone, Default)]
struct TransferArgs {
    /// File name filter; `*` matches any run of characters
    #[arg(short = 'f', long)]
    filter: String,

    /// Bucket name
    #[arg(short = 'b', long)]
    bucket: Option<String>,

    /// Bucket region
    #[arg(long)]
    region: Option<String>,

    /// Multipart part size in bytes (below 5 MiB picks one by file size)
    #[arg(long, value_name = "BYTES")]
    part_size: Option<u64>,

    /// Custom endpoint URL for S3-compatible storage
    #[arg(long, value_name = "URL")]
    endpoint: Option<String>,

    /// Local folder for files
    #[arg(short = 'd', long, value_name = "DIR")]
    folder: Option<PathBuf>,

    /// Rename mask for the target file
    #[arg(short = 'c', long = "rename", value_name = "MASK", long_help = TOKEN_HELP)]
    rename: Option<String>,

    /// Remove the source after a successful transfer
    #[arg(long)]
    remove: bool,

    /// Exit with an error when no files match the filter
    #[arg(long = "error-no-files")]
    error_no_files: bool,

    /// Vault role used to request bucket credentials
    #[arg(short = 'r', long, default_value = "")]
    role: String,

    /// Key prefix (sub folder) inside the bucket
    #[arg(short = 'p', long, default_value = "")]
    prefix: String,
}

#[derive(Args, Debug, Clone)]
struct PutArgs {
    #[command(flatten)]
    transfer: TransferArgs,

    /// Metadata stored with every uploaded object (key1=value1;key2=value2)
    #[arg(short = 'm', long)]
    metadata: Option<String>,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Bucket settings and static credentials
    S3 {
        #[arg(long)]
        bucket: Option<String>,

        #[arg(long)]
        region: Option<String>,

        /// Multipart part size in bytes (below 5 MiB means automatic)
        #[arg(long, value_name = "BYTES")]
        part_size: Option<u64>,

        /// Default upload metadata (key1=value1;key2=value2)
        #[arg(long)]
        metadata: Option<String>,

        #[arg(long, value_name = "URL")]
        endpoint: Option<String>,

        /// Static access key (credentials are requested from vault when absent)
        #[arg(long)]
        access_key: Option<String>,

        #[arg(long)]
        secret_key: Option<String>,

        #[arg(long)]
        session_token: Option<String>,
    },

    /// Vault connection and authentication
    Vault {
        /// Vault API address (https://vault.example.com:8200)
        #[arg(long, value_name = "URL")]
        address: Option<String>,

        /// Authentication method: token, approle or cert
        #[arg(long)]
        auth: Option<String>,

        #[arg(long)]
        token: Option<String>,

        /// Mount of the AWS secrets engine
        #[arg(long)]
        engine_path: Option<String>,

        /// Secrets engine version: 1, 2 or auto
        #[arg(long)]
        engine_version: Option<String>,

        #[arg(long)]
        namespace: Option<String>,

        /// Accept invalid vault TLS certificates
        #[arg(long, value_name = "BOOL")]
        tls_skip_verify: Option<bool>,

        #[arg(long)]
        role_id: Option<String>,

        #[arg(long)]
        secret_id: Option<String>,

        #[arg(long, value_name = "PATH")]
        approle_path: Option<String>,

        /// Client certificate (PEM)
        #[arg(long, value_name = "FILE")]
        cert: Option<String>,

        /// Client certificate key (PEM)
        #[arg(long, value_name = "FILE")]
        cert_key: Option<String>,

        /// CA bundle (PEM)
        #[arg(long, value_name = "FILE")]
        cert_ca: Option<String>,

        #[arg(long)]
        cert_role: Option<String>,

        #[arg(long, value_name = "PATH")]
        cert_path: Option<String>,
    },

    /// Default local folder
    Local {
        #[arg(long, value_name = "DIR")]
        folder: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum VaultCommands {
    /// Print the JSON returned by an authenticated GET of PATH
    Read {
        /// API path below /v1/, e.g. sys/mounts/aws/tune
        path: String,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevelArg> for LogLevel {
    fn from(arg: LogLevelArg) -> Self {
        match arg {
            LogLevelArg::Error => LogLevel::Error,
            LogLevelArg::Warn => LogLevel::Warn,
            LogLevelArg::Info => LogLevel::Info,
            LogLevelArg::Debug => LogLevel::Debug,
            LogLevelArg::Trace => LogLevel::Trace,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let code = match run(cli) {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            print_error(&e.to_string(), suggestion(&e));
            e.exit_code()
        }
    };
    std::process::exit(code);
}

fn suggestion(error: &BridgeError) -> Option<&'static str> {
    match error.category() {
        ErrorCategory::Configuration => Some("check s3bridge.json (see `s3bridge config --help`) or the command-line flags"),
        ErrorCategory::Authentication => Some("check the vault login settings and the requested role"),
        _ => None,
    }
}

fn run(cli: Cli) -> Result<()> {
    let log_options = LogOptions {
        level: cli.log_level.into(),
        file: cli.log.clone(),
        verbose: cli.verbose,
    };
    if let Err(e) = logging::init_logging(&log_options) {
        cli_style::print_warning(&format!("Failed to initialize logging: {}", e));
    }

    let mut ctx = AppContext::load(cli.config);

    match cli.command {
        Commands::Get(args) => {
            let report = transfer(&ctx, TransferDirection::Download, args, None)?;
            cli_style::print_batch_summary(&report);
            Ok(())
        }
        Commands::Put(args) => {
            let report = transfer(&ctx, TransferDirection::Upload, args.transfer, args.metadata)?;
            cli_style::print_batch_summary(&report);
            Ok(())
        }
        Commands::Config(command) => {
            ctx.update(|config| apply_config_command(config, command))?;
            print_success(&format!(
                "configuration saved to {}",
                ctx.config_path().display()
            ));
            Ok(())
        }
        Commands::Vault(VaultCommands::Read { path }) => {
            let settings = ctx.config().vault_settings();
            let value = runtime()?.block_on(vault::read_path(&settings, &path))?;
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
    }
}

/// Single-threaded runtime; every network call completes before the next starts
fn runtime() -> Result<tokio::runtime::Runtime> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    Ok(runtime)
}

/// Apply per-run flags to a copy of the saved configuration
fn run_config(
    ctx: &AppContext,
    args: &TransferArgs,
    metadata: Option<&str>,
) -> Result<AppConfig> {
    let mut config = ctx.run_config();
    if let Some(bucket) = args.bucket.as_deref().filter(|v| !v.is_empty()) {
        config.bucket = bucket.to_string();
    }
    if let Some(region) = args.region.as_deref().filter(|v| !v.is_empty()) {
        config.region = region.to_string();
    }
    if let Some(endpoint) = args.endpoint.as_deref().filter(|v| !v.is_empty()) {
        config.endpoint = endpoint.to_string();
    }
    if let Some(folder) = &args.folder {
        config.local_folder = folder.display().to_string();
    }
    if let Some(size) = args.part_size {
        config.set_part_size(size);
    }
    if let Some(metadata) = metadata.filter(|m| !m.is_empty()) {
        config.metadata = parse_metadata(metadata)?;
    }
    Ok(config)
}

fn transfer_options(config: &AppConfig, args: TransferArgs) -> TransferOptions {
    TransferOptions {
        filter: args.filter,
        prefix: normalize_prefix(&args.prefix),
        folder: PathBuf::from(&config.local_folder),
        mask: args.rename.unwrap_or_default(),
        remove: args.remove,
        error_on_no_files: args.error_no_files,
        part_size: config.part_size,
        metadata: config
            .metadata
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    }
}

fn transfer(
    ctx: &AppContext,
    direction: TransferDirection,
    args: TransferArgs,
    metadata: Option<String>,
) -> Result<BatchReport> {
    let config = run_config(ctx, &args, metadata.as_deref())?;
    let role = args.role.clone();
    let options = transfer_options(&config, args);
    options.validate()?;

    runtime()?.block_on(async {
        let client = connect(&config, &role).await?;
        match direction {
            TransferDirection::Download => receive_files(&client, &options).await,
            TransferDirection::Upload => send_files(&client, &options).await,
        }
    })
}

fn set_if(target: &mut String, value: Option<String>) -> bool {
    match value {
        Some(v) => {
            *target = v;
            true
        }
        None => false,
    }
}

fn set_secret_if(target: &mut SecretString, value: Option<String>) -> bool {
    match value {
        Some(v) => {
            *target = SecretString::from(v);
            true
        }
        None => false,
    }
}

fn apply_config_command(config: &mut AppConfig, command: ConfigCommands) -> Result<()> {
    let changed = match command {
        ConfigCommands::S3 {
            bucket,
            region,
            part_size,
            metadata,
            endpoint,
            access_key,
            secret_key,
            session_token,
        } => {
            let mut changed = false;
            if let Some(metadata) = metadata {
                config.metadata = parse_metadata(&metadata)?;
                changed = true;
            }
            if let Some(size) = part_size {
                config.set_part_size(size);
                changed = true;
            }
            changed |= set_if(&mut config.bucket, bucket);
            changed |= set_if(&mut config.region, region);
            changed |= set_if(&mut config.endpoint, endpoint);
            changed |= set_if(&mut config.access_key, access_key);
            changed |= set_secret_if(&mut config.secret_key, secret_key);
            changed |= set_secret_if(&mut config.session_token, session_token);
            changed
        }
        ConfigCommands::Vault {
            address,
            auth,
            token,
            engine_path,
            engine_version,
            namespace,
            tls_skip_verify,
            role_id,
            secret_id,
            approle_path,
            cert,
            cert_key,
            cert_ca,
            cert_role,
            cert_path,
        } => {
            let mut changed = false;
            if let Some(method) = &auth {
                method.parse::<vault::VaultAuthMethod>()?;
            }
            if let Some(version) = &engine_version {
                version.parse::<vault::EngineVersion>()?;
            }
            if let Some(skip) = tls_skip_verify {
                config.vault_tls_skip_verify = skip;
                changed = true;
            }
            changed |= set_if(&mut config.vault_address, address);
            changed |= set_if(&mut config.vault_auth_method, auth);
            changed |= set_secret_if(&mut config.vault_auth_token, token);
            changed |= set_if(&mut config.vault_engine_path, engine_path);
            changed |= set_if(&mut config.vault_engine_version, engine_version);
            changed |= set_if(&mut config.vault_namespace, namespace);
            changed |= set_if(&mut config.vault_auth_role_id, role_id);
            changed |= set_secret_if(&mut config.vault_auth_secret_id, secret_id);
            changed |= set_if(&mut config.vault_auth_approle_path, approle_path);
            changed |= set_if(&mut config.vault_auth_certificate, cert);
            changed |= set_if(&mut config.vault_auth_certificate_key, cert_key);
            changed |= set_if(&mut config.vault_auth_certificate_ca, cert_ca);
            changed |= set_if(&mut config.vault_auth_certificate_role, cert_role);
            changed |= set_if(&mut config.vault_auth_certificate_path, cert_path);
            changed
        }
        ConfigCommands::Local { folder } => set_if(&mut config.local_folder, folder),
    };

    if !changed {
        return Err(BridgeError::Config(
            "no settings given; see --help for the available options".to_string(),
        ));
    }
    print_info("updating configuration");
    Ok(())
}
