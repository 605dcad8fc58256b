//! servicectl - reconcile services to a desired state.

use std::env;
use std::io::Read;
use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use servicectl::backends::BackendRegistry;
use servicectl::batch::reconcile_all;
use servicectl::config::{Settings, DEFAULT_CONFIG_PATH};
use servicectl::error::ServiceError;
use servicectl::executor::SystemRunner;
use servicectl::facts::{FactProvider, HostFacts, StaticFacts};
use servicectl::reconcile::{Reconciler, ServiceSpec};
use servicectl::report::{exit_code, AuditLogger, JsonReporter, Reporter};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const NAME: &str = env!("CARGO_PKG_NAME");

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return ExitCode::SUCCESS;
    }

    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("{} {}", NAME, VERSION);
        return ExitCode::SUCCESS;
    }

    let check_mode = args.iter().any(|a| a == "--check");

    // An explicit path must exist; the default one may be absent.
    let settings = match get_config_path(&args) {
        Some(path) => Settings::load(&path),
        None => Settings::load_or_default(DEFAULT_CONFIG_PATH),
    };
    let settings = match settings {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&settings) {
        eprintln!("Error initializing logging: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Starting {} v{}", NAME, VERSION);

    let specs = match read_specs(std::io::stdin(), check_mode) {
        Ok(specs) => specs,
        Err(e) => {
            error!(error = %e, "Failed to read service specs");
            eprintln!("Error reading service specs: {}", e);
            return ExitCode::from(2);
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error creating runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(settings, specs)) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!(error = %e, "servicectl failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(settings: Settings, specs: Vec<ServiceSpec>) -> Result<u8, ServiceError> {
    let facts: Arc<dyn FactProvider> = match &settings.detection.service_mgr {
        Some(mgr) => Arc::new(StaticFacts::new(Some(mgr.as_str()))),
        None => Arc::new(HostFacts::new(settings.detection.root.clone())),
    };
    let registry = Arc::new(BackendRegistry::builtin(settings.detection.root.clone()));
    let runner = Arc::new(SystemRunner::new(settings.executor.timeout()));
    let reconciler = Reconciler::new(registry, facts, runner)
        .with_scanner(settings.executor.scanner());

    let audit = if settings.audit.enabled {
        Some(AuditLogger::new(&settings.audit.path)?)
    } else {
        None
    };
    let reporter = JsonReporter::new(std::io::stdout());

    let outcomes = reconcile_all(Arc::new(reconciler), specs).await;

    for outcome in &outcomes {
        reporter.report(outcome)?;
        if let Some(audit) = &audit {
            if let Err(e) = audit.report(outcome) {
                error!(error = %e, request_id = %outcome.request_id, "Failed to write audit entry");
            }
        }
    }

    Ok(exit_code(&outcomes))
}

/// Parse one spec object or an array of them.
fn read_specs<R: Read>(mut input: R, check_mode: bool) -> Result<Vec<ServiceSpec>, ServiceError> {
    let mut content = String::new();
    input.read_to_string(&mut content)?;

    let value: serde_json::Value = serde_json::from_str(&content)?;
    let mut specs: Vec<ServiceSpec> = if value.is_array() {
        serde_json::from_value(value)?
    } else {
        vec![serde_json::from_value(value)?]
    };

    if check_mode {
        for spec in &mut specs {
            spec.check_mode = true;
        }
    }

    Ok(specs)
}

/// Print help message.
fn print_help() {
    println!(
        r#"{} {}
Reconcile services to a desired state across init systems.

Reads a JSON service spec, or an array of specs, from standard input and
prints one JSON outcome per spec.

USAGE:
    {} [OPTIONS] < spec.json

OPTIONS:
    -c, --config <PATH>    Path to configuration file
                           [default: {}]
        --check            Report what would change without acting
    -h, --help             Print help information
    -V, --version          Print version information
"#,
        NAME, VERSION, NAME, DEFAULT_CONFIG_PATH
    );
}

/// Get an explicit configuration file path from command line arguments.
fn get_config_path(args: &[String]) -> Option<String> {
    for (i, arg) in args.iter().enumerate() {
        if (arg == "--config" || arg == "-c") && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
        if let Some(path) = arg.strip_prefix("--config=") {
            return Some(path.to_string());
        }
    }
    None
}

/// Initialize logging based on settings.
///
/// Logs go to stderr; stdout carries the outcomes.
fn init_logging(settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));

    match settings.logging.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_single_spec() {
        let specs = read_specs(r#"{"name": "httpd", "state": "started"}"#.as_bytes(), false).unwrap();
        assert_eq!(specs.len(), 1);
        assert!(!specs[0].check_mode);
    }

    #[test]
    fn test_read_spec_array_with_check() {
        let input = r#"[{"name": "httpd", "state": "started"}, {"name": "sshd", "enabled": true}]"#;
        let specs = read_specs(input.as_bytes(), true).unwrap();
        assert_eq!(specs.len(), 2);
        assert!(specs.iter().all(|s| s.check_mode));
    }

    #[test]
    fn test_read_rejects_unknown_field() {
        assert!(read_specs(r#"{"name": "httpd", "bogus": 1}"#.as_bytes(), false).is_err());
    }

    #[test]
    fn test_config_path() {
        let args = vec!["servicectl".to_string(), "--config=/tmp/x.toml".to_string()];
        assert_eq!(get_config_path(&args).as_deref(), Some("/tmp/x.toml"));
        assert_eq!(get_config_path(&["servicectl".to_string()]), None);
    }
}
