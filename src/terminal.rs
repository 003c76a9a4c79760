//! Terminal capabilities, log setup, and the progress spinner.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::app_config::VerbositySetting;
use crate::cli::GlobalArgs;

pub(crate) fn no_color_env_requested() -> bool {
    std::env::var_os("NO_COLOR").is_some_and(|value| !value.is_empty())
}

pub(crate) fn is_dumb_terminal() -> bool {
    std::env::var("TERM")
        .map(|value| value.eq_ignore_ascii_case("dumb"))
        .unwrap_or(false)
}

pub(crate) fn should_disable_color(no_color_env: bool, dumb_terminal: bool) -> bool {
    no_color_env || dumb_terminal
}

pub(crate) fn is_no_color_requested() -> bool {
    should_disable_color(no_color_env_requested(), is_dumb_terminal())
}

pub(crate) fn should_use_spinner(
    stderr_is_terminal: bool,
    quiet: bool,
    dumb_terminal: bool,
) -> bool {
    stderr_is_terminal && !quiet && !dumb_terminal
}

/// Log level when `RUST_LOG` is unset.
///
/// Priority: quiet flag > verbose flag > settings file verbosity > info.
pub(crate) fn resolve_default_log_level(
    global: &GlobalArgs,
    file_verbosity: Option<VerbositySetting>,
) -> &'static str {
    if global.quiet {
        return "error";
    }
    match global.verbose {
        0 => {}
        1 => return "debug",
        _ => return "trace",
    }
    match file_verbosity {
        Some(VerbositySetting::Quiet) => "error",
        Some(VerbositySetting::Verbose | VerbositySetting::Debug) => "debug",
        Some(VerbositySetting::Default) | None => "info",
    }
}

/// Explicit verbosity flags win over `RUST_LOG`.
pub(crate) fn should_force_cli_log_level(global: &GlobalArgs) -> bool {
    global.quiet || global.verbose > 0
}

pub(crate) fn init_tracing(default_level: &str, force_cli_level: bool, no_color: bool) {
    let filter = if force_cli_level {
        tracing_subscriber::EnvFilter::new(default_level)
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level))
    };
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(!no_color)
        .with_env_filter(filter)
        .try_init();
}

/// Spinner shown on stderr while a network action is in flight.
pub(crate) struct Activity {
    spinner: Option<ProgressBar>,
}

impl Activity {
    pub(crate) fn start(enabled: bool, message: impl Into<String>) -> Self {
        if !enabled {
            return Self { spinner: None };
        }
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(message.into());
        spinner.enable_steady_tick(Duration::from_millis(100));
        Self {
            spinner: Some(spinner),
        }
    }

    pub(crate) fn set_message(&self, message: impl Into<String>) {
        if let Some(spinner) = &self.spinner {
            spinner.set_message(message.into());
        }
    }

    pub(crate) fn finish(self) {
        if let Some(spinner) = self.spinner {
            spinner.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    use crate::cli::Cli;

    fn global(args: &[&str]) -> GlobalArgs {
        let mut argv = vec!["shelf-archiver"];
        argv.extend_from_slice(args);
        argv.extend_from_slice(&["config", "show"]);
        Cli::try_parse_from(argv).unwrap().global
    }

    #[test]
    fn test_should_disable_color_any_source() {
        assert!(!should_disable_color(false, false));
        assert!(should_disable_color(true, false));
        assert!(should_disable_color(false, true));
    }

    #[test]
    fn test_should_use_spinner_requires_interactive_stderr() {
        assert!(should_use_spinner(true, false, false));
        assert!(!should_use_spinner(false, false, false));
        assert!(!should_use_spinner(true, true, false));
        assert!(!should_use_spinner(true, false, true));
    }

    #[test]
    fn test_default_log_level_flag_priority() {
        assert_eq!(resolve_default_log_level(&global(&[]), None), "info");
        assert_eq!(resolve_default_log_level(&global(&["-v"]), None), "debug");
        assert_eq!(resolve_default_log_level(&global(&["-vv"]), None), "trace");
        assert_eq!(
            resolve_default_log_level(&global(&["-q", "-v"]), None),
            "error"
        );
    }

    #[test]
    fn test_default_log_level_falls_back_to_settings() {
        assert_eq!(
            resolve_default_log_level(&global(&[]), Some(VerbositySetting::Quiet)),
            "error"
        );
        assert_eq!(
            resolve_default_log_level(&global(&[]), Some(VerbositySetting::Debug)),
            "debug"
        );
        assert_eq!(
            resolve_default_log_level(&global(&["-vv"]), Some(VerbositySetting::Quiet)),
            "trace"
        );
    }

    #[test]
    fn test_force_cli_log_level_only_with_flags() {
        assert!(!should_force_cli_log_level(&global(&[])));
        assert!(should_force_cli_log_level(&global(&["-q"])));
        assert!(should_force_cli_log_level(&global(&["-v"])));
    }

    #[test]
    fn test_disabled_activity_is_inert() {
        let activity = Activity::start(false, "Searching");
        activity.set_message("still searching");
        activity.finish();
    }
}
