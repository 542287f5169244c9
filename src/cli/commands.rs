//! CLI command implementations

use std::path::Path;

use crate::config::{Backend, Config};
use crate::observability::{log_event_with_fields, Event, Logger};
use crate::server::Server;

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::write_stdout_response;

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    run_command(Cli::parse_args().command)
}

/// Run one command
pub fn run_command(command: Command) -> CliResult<()> {
    match command {
        Command::Serve {
            config,
            port,
            backend,
        } => serve(config.as_deref(), port, backend),
        Command::Config { config } => show_config(config.as_deref()),
    }
}

/// Resolve the effective configuration from file and flag overrides
pub fn effective_config(
    path: Option<&Path>,
    port: Option<u16>,
    backend: Option<Backend>,
) -> CliResult<Config> {
    let mut config = Config::load_or_default(path)?;

    if let Some(port) = port {
        config.port = port;
    }
    if let Some(backend) = backend {
        config.backend = backend;
    }

    config.validate()?;
    Ok(config)
}

/// Run the ingestion server until a shutdown signal
pub fn serve(path: Option<&Path>, port: Option<u16>, backend: Option<Backend>) -> CliResult<()> {
    let config = effective_config(path, port, backend)?;
    Logger::set_min_severity(config.severity()?);

    let capacity = config.capacity.to_string();
    let addr = config.socket_addr();
    log_event_with_fields(
        Event::ConfigLoaded,
        &[("addr", addr.as_str()), ("capacity", capacity.as_str())],
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::serve_failed(format!("failed to start runtime: {}", e)))?;

    runtime.block_on(async {
        let server = Server::bind(config).await?;
        server.run().await
    })?;

    Ok(())
}

/// Print the effective configuration
pub fn show_config(path: Option<&Path>) -> CliResult<()> {
    let config = effective_config(path, None, None)?;
    write_stdout_response(serde_json::to_value(&config)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_effective_config_defaults() {
        let config = effective_config(None, None, None).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_flags_override_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"port": 9100, "capacity": 3}}"#).unwrap();

        let config = effective_config(Some(file.path()), Some(9200), Some(Backend::File)).unwrap();
        assert_eq!(config.port, 9200);
        assert_eq!(config.capacity, 3);
        assert_eq!(config.backend, Backend::File);
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = effective_config(Some(file.path()), None, None).unwrap_err();
        assert_eq!(err.code().code(), "RINGLOG_CLI_CONFIG_ERROR");
    }
}
