mod cli;
mod error_fmt;
mod logging;
mod output;
mod replay;
mod simulate;

use clap::Parser;
use cli::{Cli, Commands, JSON_MODE};
use error_fmt::{CliError, exit_code_for_error, format_error_json, humanize};
use eyre::WrapErr;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thermo_config::Config;
use thermo_core::{Params, PersistedState, ZoneController};

fn main() {
    let _ = color_eyre::install();
    // clap exits with 2 on usage errors
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(e) = run(cli) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&e));
        } else {
            eprintln!("{}", humanize(&e));
        }
        std::process::exit(exit_code_for_error(&e));
    }
}

fn run(cli: Cli) -> eyre::Result<()> {
    let cfg = load_config(cli.config.as_deref())?;
    logging::init_tracing(cli.json, &cli.log_level, &cfg.logging)?;
    let params = Params::from(&cfg);
    params.validate().map_err(eyre::Report::new)?;

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let flag = Arc::clone(&shutdown);
        ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
            .wrap_err("install Ctrl-C handler")?;
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.cmd {
        Commands::CheckConfig => print_params(&params, cli.json, &mut out),
        Commands::Replay { trace, state } => {
            let state_path = state.or_else(|| configured_state_path(&cfg));
            let rows = thermo_config::load_trace_csv(&trace)
                .map_err(|e| eyre::Report::new(CliError::Trace(format!("{e:#}"))))?;
            tracing::info!(rows = rows.len(), trace = %trace.display(), "replay start");
            let mut ctl = build_controller(params, state_path.as_deref())?;
            let summary = replay::run(&mut ctl, &rows, cli.json, &shutdown, &mut out)?;
            summary.write(cli.json, &mut out)?;
            save_state(state_path.as_deref(), &ctl.snapshot())
        }
        Commands::Simulate {
            hours,
            setpoint,
            windows,
            seed,
            tick_s,
        } => {
            let state_path = configured_state_path(&cfg);
            let ctl = build_controller(params, state_path.as_deref())?;
            let opts = simulate::SimOptions {
                hours,
                setpoint_c: setpoint,
                windows,
                seed,
                tick_s,
            };
            let summary = simulate::run(ctl, &opts, cli.json, &shutdown, &mut out)?;
            summary.write(cli.json, &mut out)?;
            save_state(state_path.as_deref(), &summary.snapshot)
        }
    }
}

/// Missing `--config` means built-in defaults.
fn load_config(path: Option<&Path>) -> eyre::Result<Config> {
    let cfg = match path {
        None => Config::default(),
        Some(p) => {
            let text = std::fs::read_to_string(p).map_err(|e| {
                eyre::Report::new(CliError::Config(format!("read {}: {e}", p.display())))
            })?;
            thermo_config::load_toml(&text)
                .map_err(|e| eyre::Report::new(CliError::Config(e.to_string())))?
        }
    };
    cfg.validate()
        .map_err(|e| eyre::Report::new(CliError::Config(format!("{e:#}"))))?;
    Ok(cfg)
}

fn configured_state_path(cfg: &Config) -> Option<PathBuf> {
    cfg.persistence.state_file.as_deref().map(PathBuf::from)
}

fn build_controller(params: Params, state_path: Option<&Path>) -> eyre::Result<ZoneController> {
    let mut builder = ZoneController::builder().params(params);
    if let Some(path) = state_path
        && let Some(saved) = PersistedState::load(path)?
    {
        tracing::info!(
            bias_c = saved.bias_c,
            last_sent_c = ?saved.last_sent_c,
            path = %path.display(),
            "restored controller state"
        );
        builder = builder.restore(saved);
    }
    builder.try_build()
}

fn save_state(path: Option<&Path>, state: &PersistedState) -> eyre::Result<()> {
    if let Some(path) = path {
        state.save(path)?;
        tracing::info!(bias_c = state.bias_c, path = %path.display(), "saved controller state");
    }
    Ok(())
}

fn print_params(p: &Params, json: bool, out: &mut impl Write) -> eyre::Result<()> {
    if json {
        let v = serde_json::json!({
            "type": "config",
            "valid": true,
            "actuator": {
                "min_c": p.actuator.min_c,
                "max_c": p.actuator.max_c,
                "max_offset_c": p.actuator.max_offset_c,
                "resolution_c": p.actuator.resolution_c,
            },
            "modes": {
                "boost_error_on_c": p.modes.boost_error_on_c,
                "boost_error_off_c": p.modes.boost_error_off_c,
                "boost_target_c": p.modes.boost_target_c,
                "boost_max_ms": p.modes.boost_max_ms,
                "coast_error_on_c": p.modes.coast_error_on_c,
                "coast_error_off_c": p.modes.coast_error_off_c,
            },
            "command": {
                "min_send_delta_c": p.command.min_send_delta_c,
                "min_interval_ms": p.command.min_interval_ms,
                "max_step_up_c": p.command.max_step_up_c,
            },
            "window": {
                "enabled": p.window.enabled,
                "open_delay_ms": p.window.open_delay_ms,
                "close_delay_ms": p.window.close_delay_ms,
                "frost_protection_c": p.window.frost_protection_c,
            },
        });
        writeln!(out, "{v}")?;
    } else {
        writeln!(out, "configuration OK")?;
        writeln!(out, "{p:#?}")?;
    }
    Ok(())
}
