use clap::Parser;
use color_eyre::Result;
use gamepad_key_mapper::config::{self, MappingFile};
use gamepad_key_mapper::controller::{DeviceError, EventCollector, InputSource};
use gamepad_key_mapper::emitter::{self, DryRunEmitter, KeyEmitter};
use gamepad_key_mapper::mapping::{EngineSettings, MappingEngine, MappingError, MappingTable};
use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{debug, error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Gamepad Key Mapper - Map gamepad inputs to keyboard events
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "button_mappings.json")]
    config: PathBuf,

    /// Profile name to use from the configuration
    #[arg(short, long, default_value = "default")]
    profile: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// List available profiles and exit
    #[arg(short, long)]
    list: bool,

    /// Log key events instead of injecting them
    #[arg(long)]
    dry_run: bool,

    /// Delay between two polls of the gamepad
    #[arg(long, default_value_t = 10, value_name = "MS")]
    interval_ms: u64,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    setup(cli.verbose)?;
    debug!("Parsed arguments: {:?}", cli);

    let acquire = || EventCollector::acquire().map(|pad| Box::new(pad) as Box<dyn InputSource>);
    match run(cli, acquire, shutdown_signal()).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            eprintln!("Error: {}", e);
            Ok(ExitCode::from(e.exit_code()))
        }
    }
}

fn setup(verbose: bool) -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    setup_logging_env(if verbose { Level::DEBUG } else { Level::INFO });
    Ok(())
}

fn setup_logging_env(level: Level) {
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Loads the profile, then acquires the device and runs the poll loop until
/// `shutdown` resolves. `--list` and profile errors return before `acquire` runs.
async fn run<A, F>(cli: Cli, acquire: A, shutdown: F) -> Result<(), MappingError>
where
    A: FnOnce() -> Result<Box<dyn InputSource>, DeviceError>,
    F: Future,
{
    let mapping_file = MappingFile::load(&cli.config)?;

    if cli.list {
        mapping_file.write_profile_list(&mut io::stdout().lock())?;
        return Ok(());
    }

    let profile = mapping_file.profile(&cli.profile)?;
    config::write_profile_summary(&cli.profile, profile, &mut io::stdout().lock())?;

    let table = MappingTable::build(&cli.profile, profile)?;

    if cli.verbose {
        info!("Verbose mode enabled. Reporting all commands and keystrokes.");
    }

    let source = acquire()?;
    let key_emitter: Box<dyn KeyEmitter> = if cli.dry_run {
        info!("Dry run: key events are logged, not injected");
        Box::new(DryRunEmitter)
    } else {
        emitter::system_emitter()?
    };

    let settings = EngineSettings {
        tick_interval: Duration::from_millis(cli.interval_ms),
        axis_scaling: mapping_file.axis_scaling(),
        verbose: cli.verbose,
    };
    let engine = MappingEngine::create(source, key_emitter, table, settings).initialize();

    println!("Gamepad connected. Press Ctrl+C to exit.");
    let stopped = engine.run_until_shutdown(shutdown).await?;

    info!("Processed {} polls", stopped.finish());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gamepad_key_mapper::controller::{Capabilities, DeviceState};
    use gamepad_key_mapper::mapping::error::exit_code;
    use std::io::Write;

    const CONFIG: &str = r#"{
        "Profiles": {
            "default": {
                "ButtonMappings": [ { "GamepadButton": 0, "KeyboardKeys": [65] } ]
            }
        }
    }"#;

    // Pad that is gone by the first poll
    struct UnpluggedPad;

    impl InputSource for UnpluggedPad {
        fn poll(&mut self) -> Result<DeviceState, DeviceError> {
            Err(DeviceError::Disconnected {
                name: "Unplugged Pad".to_string(),
            })
        }

        fn capabilities(&self) -> Capabilities {
            Capabilities::default()
        }
    }

    fn write_config() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        file.write_all(CONFIG.as_bytes()).expect("write config");
        file
    }

    fn cli(config: &tempfile::NamedTempFile, args: &[&str]) -> Cli {
        let path = config.path().to_str().expect("utf-8 temp path");
        let mut argv = vec!["gamepad-key-mapper", "-c", path, "--dry-run"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).expect("valid arguments")
    }

    #[tokio::test]
    async fn list_never_touches_the_device() {
        let config = write_config();
        let mut acquired = false;

        let result = run(
            cli(&config, &["-l"]),
            || {
                acquired = true;
                Err(DeviceError::NotFound)
            },
            std::future::pending::<()>(),
        )
        .await;

        assert!(result.is_ok());
        assert!(!acquired);
    }

    #[tokio::test]
    async fn unknown_profile_exits_before_the_device_is_acquired() {
        let config = write_config();
        let mut acquired = false;

        let err = run(
            cli(&config, &["-p", "racing"]),
            || {
                acquired = true;
                Err(DeviceError::NotFound)
            },
            std::future::pending::<()>(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.exit_code(), exit_code::PROFILE_NOT_FOUND);
        assert!(!acquired);
    }

    #[tokio::test]
    async fn missing_device_is_reported_after_profile_checks() {
        let config = write_config();
        let mut acquired = false;

        let err = run(
            cli(&config, &[]),
            || {
                acquired = true;
                Err(DeviceError::NotFound)
            },
            std::future::pending::<()>(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.exit_code(), exit_code::DEVICE_NOT_FOUND);
        assert!(acquired);
    }

    #[tokio::test]
    async fn disconnect_during_the_loop_is_a_runtime_failure() {
        let config = write_config();

        let err = run(
            cli(&config, &[]),
            || Ok(Box::new(UnpluggedPad) as Box<dyn InputSource>),
            std::future::pending::<()>(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.exit_code(), exit_code::RUNTIME_FAILURE);
    }
}
