use std::process::ExitCode;

use rulegen::cli::{self, CliArgs, ConfigFile, Mode};
use rulegen::config::Config;
use rulegen::template::Expander;
use tracing::Level;

const USAGE: &[&str] = &[
    "Usage: rulegen [-f[<file>]] [-s] [-v|-d] -r <text>",
    "       rulegen [-f[<file>]] [-s] [-v|-d] -c <call>",
    "       rulegen [-f[<file>]] [-s] [-v|-d] -i <condition> [-a <action>]...",
];

fn main() -> ExitCode {
    let args = match cli::parse_args() {
        Ok(a) if a.mode != Mode::None => a,
        Ok(_) => return usage("nothing to expand"),
        Err(e) => return usage(&e),
    };

    // ── Config (loaded before logging so it can set the level) ──────────────
    let mut warnings = Vec::new();
    let config = match load_config(&args.config, &mut warnings) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("rulegen: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_logging(&args, &config);
    for w in warnings {
        tracing::warn!("{w}");
    }

    let expander = Expander::from_config(&config).strict(config.strict || args.strict);
    tracing::debug!(
        functions = expander.known_functions().count(),
        strict = expander.is_strict(),
        "expander ready"
    );

    // ── Expand ────────────────────────────────────────────────────────────────
    let result = match &args.mode {
        Mode::References(text) => expander.expand_references(text).map(|s| vec![s]),
        Mode::Call(text) => expander.expand_call(text).map(|s| vec![s]),
        Mode::Conditional { condition, actions } => {
            expander.expand_conditional(condition, actions.as_slice())
        }
        Mode::None => unreachable!("checked above"),
    };

    match result {
        Ok(lines) => {
            for line in lines {
                println!("{line}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("rulegen: {e}");
            ExitCode::FAILURE
        }
    }
}

fn usage(msg: &str) -> ExitCode {
    eprintln!("rulegen: {msg}");
    for line in USAGE {
        eprintln!("{line}");
    }
    ExitCode::from(2)
}

/// Load the config selected on the command line.  Problems on individual
/// lines are collected into `warnings`; an unreadable explicit file is fatal.
fn load_config(which: &ConfigFile, warnings: &mut Vec<String>) -> Result<Config, String> {
    let path = match which {
        ConfigFile::Skip => return Ok(Config::new()),
        ConfigFile::Explicit(path) => path.clone(),
        ConfigFile::Search => match cli::find_user_config() {
            Some(path) => path,
            None => return Ok(Config::new()),
        },
    };

    let (config, errors) =
        Config::load_file(&path).map_err(|e| format!("{}: {e}", path.display()))?;
    warnings.extend(errors.iter().map(|e| format!("{}: {e}", path.display())));
    Ok(config)
}

fn init_logging(args: &CliArgs, config: &Config) {
    let level = if args.trace {
        Level::TRACE
    } else if args.verbose {
        Level::DEBUG
    } else {
        config
            .log_level
            .as_deref()
            .and_then(|l| l.parse().ok())
            .unwrap_or(Level::WARN)
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
