//! CLI commands and argument parsing
//!
//! This module defines the command-line interface structure using clap,
//! including all commands, subcommands, and their arguments.

use crate::account::{
    AccessTier, AccountDefinition, CreateStage, DefaultAction, Kind, RoutingChoice,
    StorageAccount, StorageAccountDefinition, StorageAccountSkuType, DEFAULT_KIND, DEFAULT_SKU,
};
use crate::config::{self, Config};
use crate::error::{Result, XstoreError};
use crate::utils::format::{format_table, DisplayUtils, OutputFormat, TableFormatter};
use crate::utils::sanitizer::{suggest_storage_account_name, validate_storage_account_name};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{debug, info};

/// Get the full version string with build information
fn get_version() -> &'static str {
    env!("VERSION_WITH_GIT")
}

/// Get build information for display
pub fn get_build_info() -> BuildInfo {
    BuildInfo {
        version: env!("CARGO_PKG_VERSION"),
        git_hash: env!("GIT_HASH"),
        git_branch: env!("GIT_BRANCH"),
        build_time: env!("BUILD_TIME"),
    }
}

#[derive(Debug)]
pub struct BuildInfo {
    pub version: &'static str,
    pub git_hash: &'static str,
    pub git_branch: &'static str,
    pub build_time: &'static str,
}

#[derive(Parser)]
#[command(name = "xs")]
#[command(about = "Plan Azure Storage account definitions")]
#[command(version = get_version(), author)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Output format (defaults to json when output_json is configured, table otherwise)
    #[arg(long, global = true, value_enum)]
    pub format: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a storage account definition and print its create parameters
    Plan(PlanArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Show version and build information
    Version,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value (use default_tags.<name> for tags)
    Set {
        /// Setting name
        key: String,
        /// Setting value
        value: String,
    },
    /// Show configuration file path
    Path,
    /// Write a default configuration file if none exists
    Init,
}

/// Directory service selection on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DirectoryServiceArg {
    None,
    Aadds,
    ActiveDirectory,
}

#[derive(Args, Debug, Clone, Default)]
pub struct PlanArgs {
    /// Storage account name (3-24 lowercase letters and digits)
    pub name: String,

    /// Azure region (defaults to default_location)
    #[arg(short, long)]
    pub region: Option<String>,

    /// Resource group (defaults to default_resource_group)
    #[arg(short = 'g', long)]
    pub resource_group: Option<String>,

    /// Create the resource group along with the account
    #[arg(long)]
    pub new_resource_group: bool,

    /// SKU (defaults to default_sku, then the service default)
    #[arg(long, value_enum)]
    pub sku: Option<StorageAccountSkuType>,

    /// Account kind
    #[arg(long, value_enum)]
    pub kind: Option<Kind>,

    /// Access tier, only with --kind blob-storage
    #[arg(long, value_enum)]
    pub access_tier: Option<AccessTier>,

    /// Only accept HTTPS traffic (defaults to https_only)
    #[arg(long)]
    pub https_only: Option<bool>,

    /// Blob service encryption
    #[arg(long)]
    pub blob_encryption: Option<bool>,

    /// File service encryption
    #[arg(long)]
    pub file_encryption: Option<bool>,

    /// Key Vault URI of a customer-managed key
    #[arg(long)]
    pub key_vault_uri: Option<String>,

    /// Customer-managed key name
    #[arg(long)]
    pub key_name: Option<String>,

    /// Customer-managed key version
    #[arg(long)]
    pub key_version: Option<String>,

    /// Custom domain for the blob endpoint
    #[arg(long)]
    pub custom_domain: Option<String>,

    /// Validate the custom domain through the asverify subdomain
    #[arg(long)]
    pub use_sub_domain: bool,

    /// Default network action
    #[arg(long, value_enum)]
    pub default_action: Option<DefaultAction>,

    /// Allowed subnet resource ID (repeatable)
    #[arg(long)]
    pub subnet: Vec<String>,

    /// Allowed IP address (repeatable)
    #[arg(long)]
    pub ip: Vec<String>,

    /// Allowed IP range in CIDR notation (repeatable)
    #[arg(long)]
    pub ip_range: Vec<String>,

    /// Let trusted Azure services through the network rules
    #[arg(long)]
    pub bypass_azure_services: bool,

    /// Allow reading logs from any network
    #[arg(long)]
    pub bypass_logging: bool,

    /// Allow reading metrics from any network
    #[arg(long)]
    pub bypass_metrics: bool,

    /// Attach a system-assigned managed identity
    #[arg(long)]
    pub managed_identity: bool,

    /// Hierarchical namespace (preview)
    #[arg(long)]
    pub hns: Option<bool>,

    /// Azure Files AAD integration (preview)
    #[arg(long)]
    pub aad_integration: Option<bool>,

    /// Large file shares (preview)
    #[arg(long)]
    pub large_file_shares: Option<bool>,

    /// Routing preference (preview)
    #[arg(long, value_enum)]
    pub routing: Option<RoutingChoice>,

    /// Directory service for Azure Files (preview)
    #[arg(long, value_enum)]
    pub directory_service: Option<DirectoryServiceArg>,

    /// Active Directory domain name
    #[arg(long)]
    pub ad_domain_name: Option<String>,

    /// Active Directory NetBIOS domain name
    #[arg(long)]
    pub ad_net_bios_domain_name: Option<String>,

    /// Active Directory forest name
    #[arg(long)]
    pub ad_forest_name: Option<String>,

    /// Active Directory domain GUID
    #[arg(long)]
    pub ad_domain_guid: Option<String>,

    /// Active Directory domain SID
    #[arg(long)]
    pub ad_domain_sid: Option<String>,

    /// Active Directory SID of the storage account
    #[arg(long)]
    pub ad_azure_storage_sid: Option<String>,

    /// Tags in key=value format (repeatable)
    #[arg(short, long, value_parser = parse_key_val::<String, String>)]
    pub tag: Vec<(String, String)>,
}

impl PlanArgs {
    fn has_active_directory_properties(&self) -> bool {
        [
            &self.ad_domain_name,
            &self.ad_net_bios_domain_name,
            &self.ad_forest_name,
            &self.ad_domain_guid,
            &self.ad_domain_sid,
            &self.ad_azure_storage_sid,
        ]
        .iter()
        .any(|value| value.is_some())
    }

    /// Flag combinations the staged builder cannot express
    fn check_combinations(&self) -> Result<()> {
        if self.access_tier.is_some() && self.kind != Some(Kind::BlobStorage) {
            return Err(XstoreError::invalid_argument(
                "--access-tier requires --kind blob-storage",
            ));
        }

        if self.has_active_directory_properties()
            && self.directory_service != Some(DirectoryServiceArg::ActiveDirectory)
        {
            return Err(XstoreError::invalid_argument(
                "--ad-* options require --directory-service active-directory",
            ));
        }

        if self.use_sub_domain && self.custom_domain.is_none() {
            return Err(XstoreError::invalid_argument(
                "--use-sub-domain requires --custom-domain",
            ));
        }

        let key_parts = [&self.key_vault_uri, &self.key_name, &self.key_version];
        let given = key_parts.iter().filter(|part| part.is_some()).count();
        if given != 0 && given != key_parts.len() {
            return Err(XstoreError::invalid_argument(
                "--key-vault-uri, --key-name and --key-version must be given together",
            ));
        }

        Ok(())
    }
}

impl Cli {
    pub async fn execute(self, mut config: Config) -> Result<()> {
        if self.no_color {
            config.no_color = true;
        }
        let format = self.format.unwrap_or(if config.output_json {
            OutputFormat::Json
        } else {
            OutputFormat::Table
        });

        match self.command {
            Commands::Plan(args) => execute_plan(&args, format, &config),
            Commands::Config { command } => execute_config_command(command, format, config).await,
            Commands::Version => {
                execute_version_command(config.no_color);
                Ok(())
            }
        }
    }
}

/// Build a definition from command-line arguments and configured defaults.
///
/// Configured default tags are merged first so that `--tag` wins.
pub fn build_definition(args: &PlanArgs, config: &Config) -> Result<AccountDefinition> {
    if let Err(e) = validate_storage_account_name(&args.name) {
        debug!(
            "Suggested account name: {}",
            suggest_storage_account_name(&args.name)
        );
        return Err(e);
    }
    args.check_combinations()?;

    let region = config.resolve_location(args.region.clone())?;
    let resource_group = config.resolve_resource_group(args.resource_group.clone())?;

    let definition = StorageAccountDefinition::define(&args.name).with_region(region);
    let definition = if args.new_resource_group {
        definition.with_new_resource_group(resource_group)
    } else {
        definition.with_existing_resource_group(resource_group)
    };
    let definition = apply_common_settings(definition, args, config);

    match args.kind {
        None => Ok(apply_directory_service(definition, args)),
        Some(Kind::Storage) => Ok(apply_directory_service(
            definition.with_general_purpose_account_kind(),
            args,
        )),
        Some(Kind::StorageV2) => Ok(apply_directory_service(
            definition.with_general_purpose_account_kind_v2(),
            args,
        )),
        Some(Kind::BlobStorage) => {
            let definition = definition.with_blob_storage_account_kind();
            let definition = match args.access_tier {
                Some(tier) => definition.with_access_tier(tier),
                None => definition,
            };
            Ok(apply_directory_service(definition, args))
        }
        Some(Kind::BlockBlobStorage) => Ok(apply_directory_service(
            definition.with_block_blob_storage_account_kind(),
            args,
        )),
        Some(Kind::FileStorage) => Ok(apply_directory_service(
            definition.with_file_storage_account_kind(),
            args,
        )),
    }
}

fn apply_common_settings<S: CreateStage>(
    definition: StorageAccountDefinition<S>,
    args: &PlanArgs,
    config: &Config,
) -> StorageAccountDefinition<S> {
    let mut definition = definition;

    if let Some(sku) = args.sku.or(config.default_sku) {
        definition = definition.with_sku(sku);
    }
    definition = definition.with_https_only(args.https_only.unwrap_or(config.https_only));

    definition = match args.blob_encryption {
        Some(true) => definition.with_blob_encryption(),
        Some(false) => definition.without_blob_encryption(),
        None => definition,
    };
    definition = match args.file_encryption {
        Some(true) => definition.with_file_encryption(),
        Some(false) => definition.without_file_encryption(),
        None => definition,
    };
    if let (Some(uri), Some(name), Some(version)) =
        (&args.key_vault_uri, &args.key_name, &args.key_version)
    {
        definition = definition.with_encryption_key_from_key_vault(uri, name, version);
    }

    if let Some(domain) = &args.custom_domain {
        definition = definition.with_custom_domain_and_subdomain(domain, args.use_sub_domain);
    }

    definition = match args.default_action {
        Some(DefaultAction::Allow) => definition.with_access_from_all_networks(),
        Some(DefaultAction::Deny) => definition.with_access_from_selected_networks(),
        None => definition,
    };
    for subnet in &args.subnet {
        definition = definition.with_access_from_network_subnet(subnet);
    }
    for ip in &args.ip {
        definition = definition.with_access_from_ip_address(ip);
    }
    for range in &args.ip_range {
        definition = definition.with_access_from_ip_address_range(range);
    }
    if args.bypass_azure_services {
        definition = definition.with_access_from_azure_services();
    }
    if args.bypass_logging {
        definition = definition.with_read_access_to_log_entries_from_any_network();
    }
    if args.bypass_metrics {
        definition = definition.with_read_access_to_metrics_from_any_network();
    }

    if args.managed_identity {
        definition = definition.with_system_assigned_managed_service_identity();
    }
    if let Some(enabled) = args.hns {
        definition = definition.with_hns_enabled(enabled);
    }
    if let Some(enabled) = args.aad_integration {
        definition = definition.with_azure_files_aad_integration_enabled(enabled);
    }
    if let Some(enabled) = args.large_file_shares {
        definition = definition.with_large_file_shares(enabled);
    }
    definition = match args.routing {
        Some(RoutingChoice::MicrosoftRouting) => definition.with_microsoft_routing(),
        Some(RoutingChoice::InternetRouting) => definition.with_internet_routing(),
        None => definition,
    };

    definition = definition.with_tags(config.default_tags.clone());
    for (key, value) in &args.tag {
        definition = definition.with_tag(key, value);
    }

    definition
}

fn apply_directory_service<S: CreateStage>(
    definition: StorageAccountDefinition<S>,
    args: &PlanArgs,
) -> AccountDefinition {
    match args.directory_service {
        None => definition.into_definition(),
        Some(DirectoryServiceArg::None) => definition.with_none_directory_service().into_definition(),
        Some(DirectoryServiceArg::Aadds) => definition
            .with_azure_active_directory_domain_services()
            .into_definition(),
        Some(DirectoryServiceArg::ActiveDirectory) => {
            let mut ad = definition.with_active_directory();
            if let Some(value) = &args.ad_domain_name {
                ad = ad.with_domain_name(value);
            }
            if let Some(value) = &args.ad_net_bios_domain_name {
                ad = ad.with_net_bios_domain_name(value);
            }
            if let Some(value) = &args.ad_forest_name {
                ad = ad.with_forest_name(value);
            }
            if let Some(value) = &args.ad_domain_guid {
                ad = ad.with_domain_guid(value);
            }
            if let Some(value) = &args.ad_domain_sid {
                ad = ad.with_domain_sid(value);
            }
            if let Some(value) = &args.ad_azure_storage_sid {
                ad = ad.with_azure_storage_sid(value);
            }
            ad.into_definition()
        }
    }
}

fn execute_plan(args: &PlanArgs, format: OutputFormat, config: &Config) -> Result<()> {
    config.validate()?;

    let definition = build_definition(args, config)?;
    let parameters = definition.to_create_parameters();
    info!(account = %definition.name, "Planned storage account definition");

    let formatter = TableFormatter::new(format, config.no_color);
    let output = formatter.format_document(&parameters, &definition.summary_rows())?;

    if format != OutputFormat::Table {
        println!("{output}");
        return Ok(());
    }

    let display = DisplayUtils::new(config.no_color);
    display.print_header(&format!("Storage account '{}'", definition.name));
    println!("{output}");

    if definition.sku.is_none() {
        display.print_info(&format!("SKU not set; the service default {DEFAULT_SKU} applies"));
    }
    if definition.kind.is_none() {
        display.print_info(&format!("Kind not set; the service default {DEFAULT_KIND} applies"));
    }
    if definition.access_tier.is_some() {
        display.print_warning("The access tier can be changed at most once every 7 days");
    }
    if !config.subscription_id.is_empty() {
        if let Some(rg) = &definition.resource_group {
            display.print_info(&format!(
                "Resource ID: {}",
                StorageAccount::resource_id(&config.subscription_id, &rg.name, &definition.name)
            ));
        }
    }

    Ok(())
}

async fn execute_config_command(
    command: ConfigCommands,
    format: OutputFormat,
    config: Config,
) -> Result<()> {
    match command {
        ConfigCommands::Show => execute_config_show(&config, format),
        ConfigCommands::Set { key, value } => {
            execute_config_set(&key, &value, config.no_color).await
        }
        ConfigCommands::Path => {
            println!("{}", Config::get_config_path()?.display());
            Ok(())
        }
        ConfigCommands::Init => {
            let display = DisplayUtils::new(config.no_color);
            let path = Config::get_config_path()?;
            if config::init_default_config().await? {
                display.print_success(&format!("Wrote default configuration to {}", path.display()));
            } else {
                display.print_info(&format!("Configuration already exists at {}", path.display()));
            }
            Ok(())
        }
    }
}

fn execute_config_show(config: &Config, format: OutputFormat) -> Result<()> {
    use tabled::{Table, Tabled};

    if format != OutputFormat::Table {
        let output = match format {
            OutputFormat::Yaml => serde_yaml::to_string(config)?,
            _ => serde_json::to_string_pretty(config)?,
        };
        println!("{output}");
        return Ok(());
    }

    #[derive(Tabled)]
    struct ConfigItem {
        #[tabled(rename = "Setting")]
        key: String,
        #[tabled(rename = "Value")]
        value: String,
    }

    let not_set = |value: &str| {
        if value.is_empty() {
            "<not set>".to_string()
        } else {
            value.to_string()
        }
    };

    let mut items = vec![
        ConfigItem {
            key: "debug".to_string(),
            value: config.debug.to_string(),
        },
        ConfigItem {
            key: "subscription_id".to_string(),
            value: not_set(&config.subscription_id),
        },
        ConfigItem {
            key: "default_resource_group".to_string(),
            value: not_set(&config.default_resource_group),
        },
        ConfigItem {
            key: "default_location".to_string(),
            value: not_set(&config.default_location),
        },
        ConfigItem {
            key: "default_sku".to_string(),
            value: config
                .default_sku
                .map(|sku| sku.to_string())
                .unwrap_or_else(|| "<not set>".to_string()),
        },
        ConfigItem {
            key: "https_only".to_string(),
            value: config.https_only.to_string(),
        },
        ConfigItem {
            key: "output_json".to_string(),
            value: config.output_json.to_string(),
        },
        ConfigItem {
            key: "no_color".to_string(),
            value: config.no_color.to_string(),
        },
    ];

    let mut tags: Vec<_> = config.default_tags.iter().collect();
    tags.sort();
    for (key, value) in tags {
        items.push(ConfigItem {
            key: format!("default_tags.{key}"),
            value: value.clone(),
        });
    }

    println!("{}", format_table(Table::new(&items), config.no_color));
    Ok(())
}

async fn execute_config_set(key: &str, value: &str, no_color: bool) -> Result<()> {
    config::set_config_value(key, value).await?;

    DisplayUtils::new(no_color).print_success(&format!("Set {key} = {value}"));
    Ok(())
}

fn execute_version_command(no_color: bool) {
    let build_info = get_build_info();
    let display = DisplayUtils::new(no_color);

    display.print_header("xs storage account planner");
    println!(
        "{}",
        display.format_key_value_pairs(&[
            ("Version", build_info.version),
            ("Git Hash", build_info.git_hash),
            ("Git Branch", build_info.git_branch),
            ("Built", build_info.build_time),
        ])
    );
}

/// Parse a single key-value pair
fn parse_key_val<T, U>(
    s: &str,
) -> std::result::Result<(T, U), Box<dyn std::error::Error + Send + Sync + 'static>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    U: std::str::FromStr,
    U::Err: std::error::Error + Send + Sync + 'static,
{
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid KEY=value: no `=` found in `{s}`"))?;
    Ok((s[..pos].parse()?, s[pos + 1..].parse()?))
}
