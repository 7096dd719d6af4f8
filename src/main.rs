//! Nexus 3 CLI
//!
//! Entry point for the `nexus3` command-line tool.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use nexus3_client::nexus3_wire::{CreateBlobStoreInput, DeleteBlobStoreInput, S3BlobStoreConfig};
use nexus3_client::{
    ConfigFile, ConfigOverrides, EffectiveConfig, NexusClient, NexusError, UploadAsset,
    UploadComponentInput,
};

#[derive(Parser)]
#[command(name = "nexus3")]
#[command(about = "A command-line interface for Sonatype Nexus 3", version)]
struct Cli {
    /// URL of the Nexus host
    #[arg(long, short = 'H', global = true)]
    host: Option<String>,

    /// Username to authenticate to Nexus
    #[arg(long, short = 'u', global = true)]
    username: Option<String>,

    /// Password to authenticate to Nexus
    #[arg(long, short = 'p', global = true)]
    password: Option<String>,

    /// Path to config file (default: ~/.config/nexus3/config.toml)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Log requests and script reconciliation to stderr
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a groovy script on the Nexus host
    GroovyExec {
        /// A script file to execute
        #[arg(long, short = 's')]
        script: Option<PathBuf>,

        /// Groovy commands to execute
        commands: Vec<String>,
    },

    /// List the scripts stored in Nexus
    ListScripts,

    /// List the repositories in Nexus
    ListRepositories,

    /// List the blob stores in Nexus
    ListBlobStores,

    /// List the available component formats
    ListFormats,

    /// List the assets for a given repository
    ListAssets {
        /// The repository to list assets for
        repository: String,
    },

    /// List the components for a given repository
    ListComponents {
        /// The repository to list components for
        repository: String,
    },

    /// Upload a component to a given repository
    UploadComponent {
        /// The repository to upload the component to
        #[arg(long, short = 'r')]
        repository: String,

        /// The type of the component
        #[arg(long = "type", short = 't')]
        component_type: String,

        /// The file to upload
        #[arg(long, short = 'f')]
        file: PathBuf,

        /// Component field, e.g. directory=/docs
        #[arg(long = "field", value_name = "KEY=VALUE")]
        fields: Vec<String>,

        /// Asset field, e.g. filename=readme.txt
        #[arg(long = "asset-field", value_name = "KEY=VALUE")]
        asset_fields: Vec<String>,
    },

    /// Create a new blob store
    CreateBlobstore {
        /// The name of the blobstore
        #[arg(long, short = 'n')]
        name: String,

        /// The type of the blob store
        #[arg(long = "type", short = 't', value_enum, default_value_t = StoreKind::File)]
        store_type: StoreKind,

        /// The path to the blob store when type is file
        #[arg(long)]
        path: Option<String>,

        /// The s3 bucket when creating an s3 blob store
        #[arg(long)]
        bucket: Option<String>,

        /// The s3 bucket prefix for the blob store
        #[arg(long)]
        prefix: Option<String>,

        /// The AWS IAM AccessKeyID
        #[arg(long)]
        access_key_id: Option<String>,

        /// The AWS IAM SecretAccessKey
        #[arg(long)]
        secret_access_key: Option<String>,

        /// The AWS IAM Role to assume
        #[arg(long)]
        assume_role: Option<String>,

        /// The AWS region to use
        #[arg(long)]
        region: Option<String>,

        /// The number of days to wait to expire deleted blobs
        #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
        expiry_days: i32,
    },

    /// Delete a blobstore by the given name
    DeleteBlobstore {
        /// The name of the blob store to delete
        name: String,

        /// Force deletion of an in-use blobstore
        #[arg(long)]
        force: bool,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration and where each value came from
    Show,
}

#[derive(Clone, Copy, ValueEnum)]
enum StoreKind {
    File,
    S3,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let overrides = ConfigOverrides {
        host: cli.host.clone(),
        username: cli.username.clone(),
        password: cli.password.clone(),
        timeout_seconds: None,
    };
    let effective = match EffectiveConfig::load(ConfigFile::resolve(cli.config.clone()), &overrides) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    if let Commands::Config { action: ConfigCommands::Show } = cli.command {
        run_config_show(&effective);
        return;
    }

    let client = match NexusClient::connect(&effective.config) {
        Ok(c) => c,
        Err(e) => fail(e),
    };

    let outcome = match cli.command {
        Commands::GroovyExec { script, commands } => run_groovy_exec(&client, script, commands),
        Commands::ListScripts => client.list_scripts().and_then(|v| print_json(&v)),
        Commands::ListRepositories => client.list_repositories().and_then(|v| print_json(&v)),
        Commands::ListBlobStores => client.list_blob_stores().and_then(|v| print_json(&v)),
        Commands::ListFormats => client.list_formats().and_then(|v| print_json(&v)),
        Commands::ListAssets { repository } => {
            client.list_all_assets(&repository).and_then(|v| print_json(&v))
        }
        Commands::ListComponents { repository } => {
            client.list_all_components(&repository).and_then(|v| print_json(&v))
        }
        Commands::UploadComponent {
            repository,
            component_type,
            file,
            fields,
            asset_fields,
        } => run_upload_component(&client, repository, component_type, file, fields, asset_fields),
        Commands::CreateBlobstore {
            name,
            store_type,
            path,
            bucket,
            prefix,
            access_key_id,
            secret_access_key,
            assume_role,
            region,
            expiry_days,
        } => {
            let input = match store_type {
                StoreKind::File => CreateBlobStoreInput::file(name, path.unwrap_or_default()),
                StoreKind::S3 => {
                    let mut config = S3BlobStoreConfig::new(bucket.unwrap_or_default());
                    config.prefix = prefix;
                    config.access_key_id = access_key_id;
                    config.secret_access_key = secret_access_key;
                    config.assume_role = assume_role;
                    config.region = region;
                    config.expiration = expiry_days;
                    CreateBlobStoreInput::s3(name, config)
                }
            };
            client.create_blob_store(&input).and_then(|v| print_json(&v))
        }
        Commands::DeleteBlobstore { name, force } => client
            .delete_blob_store(&DeleteBlobStoreInput { name: name.clone(), force })
            .map(|()| println!("Blob store {} deleted", name)),
        Commands::Config { .. } => Ok(()),
    };

    if let Err(e) = outcome {
        fail(e);
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "nexus3_client=debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn fail(error: NexusError) -> ! {
    eprintln!("Error: {}", error);
    process::exit(error.exit_code());
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), NexusError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_config_show(effective: &EffectiveConfig) {
    match effective.to_json() {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            process::exit(1);
        }
    }
}

fn run_groovy_exec(
    client: &NexusClient,
    script: Option<PathBuf>,
    commands: Vec<String>,
) -> Result<(), NexusError> {
    let content = match script {
        Some(path) => std::fs::read_to_string(&path).map_err(|e| {
            NexusError::InvalidArgument(format!("Cannot read {}: {}", path.display(), e))
        })?,
        None if !commands.is_empty() => commands.join(" "),
        None => {
            return Err(NexusError::InvalidArgument(
                "You must provide either a script file or a command to execute".to_string(),
            ))
        }
    };

    let result = client.execute_ephemeral(&content, None)?;
    println!("{}", result.result);
    Ok(())
}

fn run_upload_component(
    client: &NexusClient,
    repository: String,
    component_type: String,
    file: PathBuf,
    fields: Vec<String>,
    asset_fields: Vec<String>,
) -> Result<(), NexusError> {
    let mut asset = UploadAsset::from_path(&file).map_err(|e| {
        NexusError::InvalidArgument(format!("Cannot read {}: {}", file.display(), e))
    })?;
    for field in &asset_fields {
        let (key, value) = parse_field(field)?;
        asset = asset.with_field(key, value);
    }

    let mut input = UploadComponentInput::new(repository, component_type);
    for field in &fields {
        let (key, value) = parse_field(field)?;
        input = input.with_field(key, value);
    }

    client.upload_component(&input.with_asset(asset))?;
    println!("Component uploaded successfully");
    Ok(())
}

fn parse_field(field: &str) -> Result<(&str, &str), NexusError> {
    field
        .split_once('=')
        .filter(|(key, _)| !key.is_empty())
        .ok_or_else(|| NexusError::InvalidArgument(format!("Expected KEY=VALUE, got {}", field)))
}
