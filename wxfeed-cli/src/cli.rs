use std::{
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{Select, Text};
use tracing::{info, warn};
use wxfeed_core::{
    Config, DateFormatSpec, FeedClient, FormatSpec, Overrides, RunConfig, RunSummary, Units, run,
};

/// Exit status when Ctrl-C abandons the remaining locations.
pub const EXIT_INTERRUPTED: u8 = 130;
const EXIT_PARTIAL: u8 = 1;
const EXIT_CONFIG: u8 = 2;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "wxfeed",
    version,
    about = "Fetch and print current weather in a specified format"
)]
pub struct Cli {
    /// Log debug details to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactively store default settings.
    Configure,

    /// Print the location of the config file.
    ConfigPath,

    /// Show current weather for one or more locations.
    Show {
        /// WOEID location identifiers.
        #[arg(value_name = "WOEID", required = true)]
        locations: Vec<u64>,

        /// Append results to a file instead of stdout.
        #[arg(short = 'f', long)]
        file: Option<PathBuf>,

        /// Output format, e.g. "%c (%C),%d,%e,%T,%W".
        #[arg(short = 'F', long)]
        format: Option<String>,

        /// strftime-style format used for %d, e.g. "%Y-%m-%d %H:%M".
        #[arg(short = 'D', long)]
        date_format: Option<String>,

        /// Get weather in imperial units.
        #[arg(long)]
        imperial: bool,

        /// Use the current time instead of the feed's publication time.
        #[arg(long)]
        now: bool,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<ExitCode> {
        match self.command {
            Command::Configure => {
                configure()?;
                Ok(ExitCode::SUCCESS)
            }
            Command::ConfigPath => {
                println!("{}", Config::config_file_path()?.display());
                Ok(ExitCode::SUCCESS)
            }
            Command::Show {
                locations,
                file,
                format,
                date_format,
                imperial,
                now,
            } => {
                let overrides = Overrides {
                    format,
                    date_format,
                    output: file,
                    imperial,
                    use_current_time: now,
                };
                show(&locations, &overrides).await
            }
        }
    }
}

/// Validated settings for one `show` invocation.
#[derive(Debug)]
struct Prepared {
    config: Config,
    run_config: RunConfig,
    client: FeedClient,
}

async fn show(locations: &[u64], overrides: &Overrides) -> anyhow::Result<ExitCode> {
    let path = Config::config_file_path()?;

    // Everything is validated before the first request goes out.
    let prepared = match prepare(&path, overrides) {
        Ok(prepared) => prepared,
        Err(status) => return Ok(ExitCode::from(status)),
    };
    let mut sink = prepared.config.output(overrides);

    let summary = run(&prepared.client, &prepared.run_config, locations, &mut sink).await?;
    info!(?summary, "run finished");

    Ok(ExitCode::from(summary_status(&summary)))
}

/// Load and validate configuration, or report it and return the exit status.
fn prepare(path: &Path, overrides: &Overrides) -> Result<Prepared, u8> {
    let prepared = Config::load_from(path).and_then(|config| {
        let run_config = config.resolve(overrides)?;
        let client = config.client()?;
        Ok(Prepared {
            config,
            run_config,
            client,
        })
    });

    prepared.map_err(|e| {
        eprintln!("wxfeed: {e:#}");
        EXIT_CONFIG
    })
}

fn summary_status(summary: &RunSummary) -> u8 {
    if summary.is_complete() {
        return 0;
    }

    warn!(
        failed = summary.fetch_failed + summary.parse_failed,
        total = summary.rendered + summary.fetch_failed + summary.parse_failed,
        "some locations produced no output"
    );
    EXIT_PARTIAL
}

fn configure() -> anyhow::Result<()> {
    let mut cfg = Config::load()?;

    let endpoint = Text::new("Feed endpoint:")
        .with_default(cfg.endpoint())
        .prompt()
        .context("Failed to read endpoint")?;

    let format = Text::new("Output format:")
        .with_default(cfg.format())
        .with_help_message(
            "%c city, %C country, %d date, %t/%T temperature, %w/%W wind, %e description",
        )
        .with_validator(|input: &str| {
            Ok(match FormatSpec::compile(input) {
                Ok(_) => inquire::validator::Validation::Valid,
                Err(e) => inquire::validator::Validation::Invalid(e.to_string().into()),
            })
        })
        .prompt()
        .context("Failed to read output format")?;

    let date_format = Text::new("Date format:")
        .with_default(cfg.date_format())
        .with_validator(|input: &str| {
            Ok(match DateFormatSpec::new(input) {
                Ok(_) => inquire::validator::Validation::Valid,
                Err(e) => inquire::validator::Validation::Invalid(e.to_string().into()),
            })
        })
        .prompt()
        .context("Failed to read date format")?;

    let current = cfg.units.unwrap_or_default();
    let starting = Units::all().iter().position(|u| *u == current).unwrap_or(0);
    let units = Select::new("Units:", Units::all().to_vec())
        .with_starting_cursor(starting)
        .prompt()
        .context("Failed to read units")?;

    cfg.endpoint = Some(endpoint);
    cfg.format = Some(format);
    cfg.date_format = Some(date_format);
    cfg.units = Some(units);

    cfg.client()?;
    cfg.save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_parses_flags() {
        let cli = Cli::try_parse_from([
            "wxfeed",
            "show",
            "523920",
            "2459115",
            "-f",
            "out.txt",
            "-F",
            "%c %T",
            "--imperial",
            "--now",
        ])
        .unwrap();

        match cli.command {
            Command::Show {
                locations,
                file,
                format,
                date_format,
                imperial,
                now,
            } => {
                assert_eq!(locations, vec![523920, 2459115]);
                assert_eq!(file, Some(PathBuf::from("out.txt")));
                assert_eq!(format.as_deref(), Some("%c %T"));
                assert_eq!(date_format, None);
                assert!(imperial);
                assert!(now);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn show_requires_a_location() {
        assert!(Cli::try_parse_from(["wxfeed", "show"]).is_err());
    }

    #[test]
    fn show_rejects_non_numeric_location() {
        assert!(Cli::try_parse_from(["wxfeed", "show", "warsaw"]).is_err());
    }

    fn temp_config(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("wxfeed-{name}-{}.toml", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn complete_run_exits_zero() {
        let summary = RunSummary {
            rendered: 2,
            ..RunSummary::default()
        };
        assert_eq!(summary_status(&summary), 0);
    }

    #[test]
    fn partial_failure_exits_one() {
        let summary = RunSummary {
            rendered: 1,
            fetch_failed: 1,
            parse_failed: 0,
        };
        assert_eq!(summary_status(&summary), 1);

        let summary = RunSummary {
            rendered: 0,
            fetch_failed: 0,
            parse_failed: 1,
        };
        assert_eq!(summary_status(&summary), 1);
    }

    #[test]
    fn unknown_directive_exits_two() {
        let overrides = Overrides {
            format: Some("%c %z".into()),
            ..Overrides::default()
        };
        let path = std::env::temp_dir().join("wxfeed-no-config-here.toml");

        assert_eq!(prepare(&path, &overrides).unwrap_err(), 2);
    }

    #[test]
    fn malformed_config_file_exits_two() {
        let path = temp_config("malformed", "units = [not toml");
        let status = prepare(&path, &Overrides::default()).unwrap_err();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(status, 2);
    }

    #[test]
    fn invalid_endpoint_in_config_exits_two() {
        let path = temp_config("endpoint", "endpoint = \"::nope::\"\n");
        let status = prepare(&path, &Overrides::default()).unwrap_err();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(status, 2);
    }

    #[test]
    fn valid_config_file_is_prepared() {
        let path = temp_config("valid", "units = \"imperial\"\nformat = \"%c\"\n");
        let prepared = prepare(&path, &Overrides::default()).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(prepared.run_config.units, Units::Imperial);
        assert_eq!(prepared.run_config.format, FormatSpec::compile("%c").unwrap());
    }

    #[test]
    fn verbose_is_global() {
        let cli = Cli::try_parse_from(["wxfeed", "show", "1", "-v"]).unwrap();
        assert!(cli.verbose);
    }
}
