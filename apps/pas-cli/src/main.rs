use anyhow::{anyhow, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::fmt::Write as _;
use tracing::info;

use device_catalog::{self as cat, AccessLevel, DeviceMetadata, DeviceTypeId, Identity};
use device_dispatch::{
    DispatchError, DispatchMetrics, Dispatcher, LoggingInterface, PendingCall, Value,
};

#[derive(Parser, Debug)]
#[command(
    name = "pas",
    version,
    about = "PAS device command surface tool",
    disable_help_subcommand = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Format {
    Text,
    Json,
    Yaml,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print variables, errors and methods per device type
    Catalog {
        /// Restrict to one device type (name or numeric id)
        #[arg(long)]
        device_type: Option<DeviceTypeId>,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Validate one method call and run it against the logging interface
    Call {
        #[arg(long)]
        device_type: DeviceTypeId,
        /// Method name or numeric field id
        #[arg(long)]
        method: String,
        /// Serial number of the addressed unit
        #[arg(long, default_value_t = 0)]
        serial: i32,
        /// Positional argument as TYPE:VALUE, e.g. int32:-1 or double:0.25
        #[arg(long = "arg", value_name = "TYPE:VALUE")]
        args: Vec<Value>,
        /// Print dispatch metrics afterwards
        #[arg(long, action = ArgAction::SetTrue)]
        metrics: bool,
    },
}

fn setup_tracing() {
    // Best-effort; avoid panics if already set
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn main() -> Result<()> {
    setup_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Catalog {
            device_type,
            format,
        } => {
            print!("{}", render_catalog(device_type, format)?);
            Ok(())
        }
        Commands::Call {
            device_type,
            method,
            serial,
            args,
            metrics,
        } => {
            print!("{}", run_call(device_type, &method, serial, args, metrics)?);
            Ok(())
        }
    }
}

fn render_catalog(device_type: Option<DeviceTypeId>, format: Format) -> Result<String> {
    let catalog = cat::catalog();
    let devices: Vec<&DeviceMetadata> = match device_type {
        Some(t) => vec![catalog.device(t)],
        None => catalog.iter().collect(),
    };
    let out = match format {
        Format::Json => {
            let mut s = cat::to_json(devices)?;
            s.push('\n');
            s
        }
        Format::Yaml => cat::to_yaml(devices)?,
        Format::Text => render_text(&devices),
    };
    Ok(out)
}

fn render_text(devices: &[&DeviceMetadata]) -> String {
    let mut out = String::new();
    for d in devices {
        let _ = writeln!(out, "{} ({})", d.device_type, d.type_id);
        if !d.variables.is_empty() {
            let _ = writeln!(out, "  variables:");
            for v in d.variables.values() {
                let access = match v.access {
                    AccessLevel::Read => "r",
                    AccessLevel::ReadWrite => "rw",
                };
                let state = if v.is_state { " state" } else { "" };
                let _ = writeln!(
                    out,
                    "    {} {} = {} [{access}{state}]",
                    v.field_id, v.name, v.default_value
                );
            }
        }
        if !d.errors.is_empty() {
            let _ = writeln!(out, "  errors:");
            for e in d.errors.values() {
                let _ = writeln!(out, "    {} {}: {}", e.field_id, e.name, e.description);
            }
        }
        if !d.methods.is_empty() {
            let _ = writeln!(out, "  methods:");
            for m in d.methods.values() {
                let _ = writeln!(out, "    {} {}", m.field_id, m.signature());
            }
        }
    }
    out
}

/// Resolve a method given by name or numeric id. Unknown numeric ids are
/// passed through so the dispatcher reports them.
fn resolve_method(device_type: DeviceTypeId, method: &str) -> Result<u32> {
    if let Ok(id) = method.parse::<u32>() {
        return Ok(id);
    }
    let m = cat::catalog().lookup_method_by_name(device_type, method)?;
    Ok(m.field_id)
}

fn run_call(
    device_type: DeviceTypeId,
    method: &str,
    serial: i32,
    args: Vec<Value>,
    with_metrics: bool,
) -> Result<String> {
    let method_id = resolve_method(device_type, method)?;
    let metrics = DispatchMetrics::new().map_err(|e| anyhow!(e))?;
    let dispatcher = Dispatcher::new(LoggingInterface).with_metrics(metrics);
    let call = PendingCall::new(device_type, Identity::with_serial(serial), method_id, args);
    info!(%device_type, method_id, "dispatching");

    let mut out = String::new();
    match dispatcher.dispatch(&call) {
        Ok(outcome) => {
            let _ = writeln!(out, "{}: {}", outcome.method.signature(), outcome.status);
        }
        Err(e) => {
            let _ = writeln!(out, "rejected: {e}");
            if let DispatchError::TypeMismatch { results, .. } = &e {
                for (i, (status, value)) in results.iter().zip(&call.arguments).enumerate() {
                    let _ = writeln!(out, "  [{i}] {value} ({}): {status}", value.data_type());
                }
            }
            let _ = writeln!(out, "status: {} (0x{:08X})", e.status(), e.status().code());
        }
    }
    if with_metrics {
        if let Some(m) = dispatcher.metrics() {
            out.push_str(&m.encode_text());
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_call_arguments() {
        let cli = Cli::try_parse_from([
            "pas",
            "call",
            "--device-type",
            "edge",
            "--method",
            "Align",
            "--arg",
            "uint32:1",
            "--arg",
            "uint32:2",
            "--arg",
            "double:0.25",
            "--arg",
            "bool:true",
        ])
        .unwrap();
        match cli.command {
            Commands::Call {
                device_type, args, ..
            } => {
                assert_eq!(device_type, DeviceTypeId::Edge);
                assert_eq!(args.len(), 4);
                assert_eq!(args[2], Value::Double(0.25));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(Cli::try_parse_from(["pas", "call", "--device-type", "toaster", "--method", "x"]).is_err());
    }

    #[test]
    fn text_catalog_lists_panel_methods() {
        let text = render_catalog(Some(DeviceTypeId::Panel), Format::Text).unwrap();
        assert!(text.starts_with("Panel (2000)"));
        assert!(text.contains("2015 FindHome(direction: Int32)"));
        assert!(text.contains("SafetyRadius = 60"));
    }

    #[test]
    fn json_catalog_covers_all_types() {
        let json = render_catalog(None, Format::Json).unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v.as_array().map(Vec::len), Some(DeviceTypeId::ALL.len()));
    }

    #[test]
    fn good_call_reports_status() {
        let out = run_call(
            DeviceTypeId::Panel,
            "FindHome",
            7,
            vec![Value::Int32(1)],
            true,
        )
        .unwrap();
        assert!(out.starts_with("FindHome(direction: Int32): Good"));
        assert!(out.contains("pas_dispatch_calls_total{device_type=\"Panel\"} 1"));
    }

    #[test]
    fn clear_error_without_argument_is_rejected() {
        let out = run_call(DeviceTypeId::Panel, "ClearError", 7, vec![], false).unwrap();
        assert!(out.starts_with("rejected: ClearError expects 1 argument(s), got 0"));
        assert!(out.contains("BadInvalidArgument"));
    }

    #[test]
    fn type_mismatch_lists_each_argument() {
        let out = run_call(
            DeviceTypeId::Edge,
            "align",
            1,
            vec![
                Value::Int32(1),
                Value::UInt32(2),
                Value::Float(0.25),
                Value::Boolean(false),
            ],
            false,
        )
        .unwrap();
        assert!(out.contains("[0] "));
        assert!(out.contains("BadTypeMismatch"));
        assert!(out.contains("[1] 2 (UInt32): Good"));
    }

    #[test]
    fn unknown_numeric_method_reaches_dispatcher() {
        let out = run_call(DeviceTypeId::Ccd, "9999", 1, vec![], false).unwrap();
        assert!(out.starts_with("rejected: CCD has no method with id 9999"));
        assert!(run_call(DeviceTypeId::Ccd, "Explode", 1, vec![], false).is_err());
    }
}
