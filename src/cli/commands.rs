//! CLI command implementations

use std::path::Path;

use tracing::{info, warn};

use crate::broker::{
    mariadb_catalog, AdminBackend, BrokerConfig, BrokerError, BrokerResult, DerivedIdentity,
    MemoryBackend, MySqlAdmin, ProvisioningController,
};
use crate::http_server::BrokerServer;
use crate::observability::{init_logging, LogFormat};

use super::args::{BackendKind, Cli, Command};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
pub fn run() -> BrokerResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> BrokerResult<()> {
    match cmd {
        Command::Serve {
            config,
            port,
            backend,
            log_format,
        } => serve(config.as_deref(), port, backend, log_format),
        Command::Catalog => {
            println!("{}", catalog_json()?);
            Ok(())
        }
        Command::Derive {
            instance_id,
            show_password,
        } => {
            println!("{}", describe_identity(&instance_id, show_password));
            Ok(())
        }
    }
}

/// Catalog as pretty-printed JSON
pub fn catalog_json() -> BrokerResult<String> {
    serde_json::to_string_pretty(mariadb_catalog()).map_err(|e| BrokerError::Internal {
        message: format!("Failed to serialize catalog: {}", e),
    })
}

/// Derived names of an instance, one per line
pub fn describe_identity(instance_id: &str, show_password: bool) -> String {
    let identity = DerivedIdentity::for_instance(instance_id);
    let mut out = format!(
        "instance: {}\ndatabase: {}\nusername: {}",
        instance_id, identity.database, identity.username
    );
    if show_password {
        out.push_str(&format!("\npassword: {}", identity.password));
    }
    out
}

/// Layer command line overrides on the loaded configuration, then validate
pub fn resolve_config(
    config_path: Option<&Path>,
    port: Option<u16>,
    log_format: Option<LogFormat>,
) -> BrokerResult<BrokerConfig> {
    let mut config = BrokerConfig::load(config_path)?;
    if let Some(port) = port {
        config.listen_port = port;
    }
    if let Some(log_format) = log_format {
        config.log_format = log_format;
    }
    config.validate()?;
    Ok(config)
}

/// Serve the broker API until interrupted or halted
pub fn serve(
    config_path: Option<&Path>,
    port: Option<u16>,
    backend: BackendKind,
    log_format: Option<LogFormat>,
) -> BrokerResult<()> {
    let config = resolve_config(config_path, port, log_format)?;

    init_logging(config.log_format);
    info!(admin = ?config.admin, ?backend, "Loaded configuration");

    let rt = tokio::runtime::Runtime::new().map_err(|e| BrokerError::Internal {
        message: format!("Failed to create tokio runtime: {}", e),
    })?;

    rt.block_on(async {
        match backend {
            BackendKind::Mysql => run_server(MySqlAdmin::new(&config.admin), &config).await,
            BackendKind::Memory => {
                warn!("Using in-memory backing server; instances are lost on exit");
                run_server(MemoryBackend::new(), &config).await
            }
        }
    })
}

async fn run_server<B: AdminBackend + 'static>(backend: B, config: &BrokerConfig) -> BrokerResult<()> {
    let controller = ProvisioningController::new(backend, config.admin.clone());
    BrokerServer::new(controller, config).serve().await
}
