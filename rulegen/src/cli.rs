//! Command-line argument parsing.
//!
//! Usage:
//!   rulegen [-f[<file>]] [-s] [-v|-d] -r <text>
//!   rulegen [-f[<file>]] [-s] [-v|-d] -c <call>
//!   rulegen [-f[<file>]] [-s] [-v|-d] -i <condition> [-a <action>]...

use std::path::PathBuf;

// ── Public types ──────────────────────────────────────────────────────────────

/// Parsed command-line arguments.
#[derive(Debug, Default)]
pub struct CliArgs {
    /// Config-file specification.
    pub config: ConfigFile,
    /// Reject calls to unknown functions (`-s`).
    pub strict: bool,
    /// Debug logging (`-v`).
    pub verbose: bool,
    /// Trace logging (`-d`).
    pub trace: bool,
    /// What to expand.
    pub mode: Mode,
}

/// How to choose the config file.
#[derive(Debug, Default)]
pub enum ConfigFile {
    /// Search the standard locations (default).
    #[default]
    Search,
    /// `-f` with no file argument: skip config.
    Skip,
    /// `-f<file>`: load this specific file.
    Explicit(PathBuf),
}

/// Which expansion to run.
#[derive(Debug, Default, PartialEq, Eq)]
pub enum Mode {
    /// Nothing requested.
    #[default]
    None,
    /// `-r <text>`: expand references in one token.
    References(String),
    /// `-c <call>`: expand a call line.
    Call(String),
    /// `-i <condition>` with any number of `-a <action>`.
    Conditional { condition: String, actions: Vec<String> },
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse `std::env::args()` and return [`CliArgs`] or an error message.
pub fn parse_args() -> Result<CliArgs, String> {
    let raw: Vec<String> = std::env::args().collect();
    parse_argv(raw.get(1..).unwrap_or_default())
}

/// Parse a slice of argument strings (exposed for testing).
pub fn parse_argv(argv: &[String]) -> Result<CliArgs, String> {
    let mut args = CliArgs::default();
    let mut condition: Option<String> = None;
    let mut actions: Vec<String> = Vec::new();
    let mut modes = 0usize;
    let mut i = 0;

    while i < argv.len() {
        let arg = argv[i].as_str();

        if !arg.starts_with('-') || arg == "-" {
            return Err(format!("unexpected argument: {arg}"));
        }

        let chars: Vec<char> = arg[1..].chars().collect();
        let mut j = 0;
        while j < chars.len() {
            match chars[j] {
                's' => args.strict = true,
                'v' => args.verbose = true,
                'd' => args.trace = true,

                // -f[<file>]
                'f' => {
                    if j + 1 < chars.len() {
                        let file: String = chars[j + 1..].iter().collect();
                        args.config = ConfigFile::Explicit(PathBuf::from(file));
                        j = chars.len();
                    } else if i + 1 < argv.len() && !argv[i + 1].starts_with('-') {
                        i += 1;
                        args.config = ConfigFile::Explicit(PathBuf::from(&argv[i]));
                    } else {
                        args.config = ConfigFile::Skip;
                    }
                }

                // Value flags: -r<text>, -c<call>, -i<cond>, -a<action>
                flag @ ('r' | 'c' | 'i' | 'a') => {
                    let value = if j + 1 < chars.len() {
                        let s: String = chars[j + 1..].iter().collect();
                        j = chars.len();
                        s
                    } else if i + 1 < argv.len() {
                        i += 1;
                        argv[i].clone()
                    } else {
                        return Err(format!("-{flag} requires an argument"));
                    };
                    match flag {
                        'r' => {
                            modes += 1;
                            args.mode = Mode::References(value);
                        }
                        'c' => {
                            modes += 1;
                            args.mode = Mode::Call(value);
                        }
                        'i' => {
                            modes += 1;
                            condition = Some(value);
                        }
                        _ => actions.push(value),
                    }
                }

                c => return Err(format!("unknown option: -{c}")),
            }
            j += 1;
        }
        i += 1;
    }

    if modes > 1 {
        return Err("only one of -r, -c, -i may be given".to_owned());
    }
    match condition {
        Some(condition) => args.mode = Mode::Conditional { condition, actions },
        None if !actions.is_empty() => return Err("-a requires -i".to_owned()),
        None => {}
    }

    Ok(args)
}

// ── Path helpers ──────────────────────────────────────────────────────────────

/// Search for the user config file in the standard locations.
///
/// Order: `RULEGEN_CONFIG` env var → `<platform config dir>/rulegen.conf` →
/// `./.rulegen` → `./rulegen.conf`.  Returns the first path that exists.
pub fn find_user_config() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("RULEGEN_CONFIG") {
        let p = PathBuf::from(p);
        return p.exists().then_some(p);
    }
    let platform = directories::ProjectDirs::from("", "", "rulegen")
        .map(|dirs| dirs.config_dir().join("rulegen.conf"));
    platform
        .into_iter()
        .chain([PathBuf::from("./.rulegen"), PathBuf::from("./rulegen.conf")])
        .find(|p| p.exists())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|&s| s.to_owned()).collect()
    }

    #[test]
    fn empty_args() {
        let a = parse_argv(&argv(&[])).unwrap();
        assert_eq!(a.mode, Mode::None);
        assert!(matches!(a.config, ConfigFile::Search));
    }

    #[test]
    fn references_separate() {
        let a = parse_argv(&argv(&["-r", "'$value'"])).unwrap();
        assert_eq!(a.mode, Mode::References("'$value'".into()));
    }

    #[test]
    fn call_embedded() {
        let a = parse_argv(&argv(&["-ctest.echo hi"])).unwrap();
        assert_eq!(a.mode, Mode::Call("test.echo hi".into()));
    }

    #[test]
    fn conditional_with_actions() {
        let a = parse_argv(&argv(&["-i", "$x > 1", "-a", "a.one", "-a", "b.two $x"])).unwrap();
        assert_eq!(
            a.mode,
            Mode::Conditional {
                condition: "$x > 1".into(),
                actions: vec!["a.one".into(), "b.two $x".into()],
            }
        );
    }

    #[test]
    fn action_without_condition() {
        assert!(parse_argv(&argv(&["-a", "a.one"])).is_err());
    }

    #[test]
    fn two_modes_rejected() {
        assert!(parse_argv(&argv(&["-r", "x", "-c", "y"])).is_err());
    }

    #[test]
    fn bool_flags_combined() {
        let a = parse_argv(&argv(&["-svd", "-r", "x"])).unwrap();
        assert!(a.strict && a.verbose && a.trace);
    }

    #[test]
    fn config_skip() {
        let a = parse_argv(&argv(&["-f", "-r", "x"])).unwrap();
        assert!(matches!(a.config, ConfigFile::Skip));
    }

    #[test]
    fn config_explicit() {
        let a = parse_argv(&argv(&["-frules.conf"])).unwrap();
        assert!(matches!(&a.config, ConfigFile::Explicit(p) if p == &PathBuf::from("rules.conf")));
        let a = parse_argv(&argv(&["-f", "rules.conf"])).unwrap();
        assert!(matches!(&a.config, ConfigFile::Explicit(p) if p == &PathBuf::from("rules.conf")));
    }

    #[test]
    fn missing_value() {
        assert!(parse_argv(&argv(&["-r"])).is_err());
    }

    #[test]
    fn unknown_flag_and_positional() {
        assert!(parse_argv(&argv(&["-z"])).is_err());
        assert!(parse_argv(&argv(&["stray"])).is_err());
    }
}
