//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and connection-setting resolution.

use crate::config::ConnectionConfig;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CaseTrend - test-case automation status reporting for Azure DevOps
///
/// Query a project's Test Case work items, classify them by automation
/// status, aggregate per-area-path counts to CSV, and plot the result
/// as a stacked bar chart.
///
/// Examples:
///   casetrend get-test-cases -o contoso -p widgets
///   casetrend aggregate-cases -o contoso -p widgets --output test_cases.csv
///   casetrend plot-trend --input test_cases.csv --output trend.png
///   casetrend init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file
    ///
    /// If not specified, looks for .casetrend.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Pipeline stage to run.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Fetch test cases and print the classified report as JSON
    GetTestCases {
        #[command(flatten)]
        connection: ConnectionArgs,

        /// WIQL query to filter test cases
        ///
        /// Defaults to all Test Case work items, ordered by id.
        #[arg(long, value_name = "WIQL")]
        query: Option<String>,
    },

    /// Aggregate test cases by area path and save the counts to CSV
    AggregateCases {
        #[command(flatten)]
        connection: ConnectionArgs,

        /// Output CSV file path
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Plot a stacked bar chart from an aggregate CSV
    PlotTrend {
        /// Input CSV file with per-area-path counts
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Output chart PNG path
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Generate a default .casetrend.toml configuration file
    InitConfig,
}

/// Connection options shared by the commands that talk to the tracking
/// service. Values omitted on the command line fall back to the config
/// file.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// Azure DevOps organization name
    #[arg(short, long, value_name = "NAME")]
    pub organization: Option<String>,

    /// Azure DevOps project name
    #[arg(short, long, value_name = "NAME")]
    pub project: Option<String>,

    /// Personal Access Token for the tracking service
    #[arg(long, env = "AZURE_DEVOPS_PAT", hide_env_values = true)]
    pub pat: Option<String>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

/// Fully resolved connection settings, after merging CLI arguments with
/// the config file. CLI arguments take precedence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConnection {
    pub organization: String,
    pub project: String,
    pub pat: String,
    pub timeout_seconds: u64,
}

impl ConnectionArgs {
    /// Merge with the config file and require the three mandatory
    /// settings.
    pub fn resolve(&self, config: &ConnectionConfig) -> Result<ResolvedConnection, String> {
        let organization = self
            .organization
            .clone()
            .or_else(|| config.organization.clone())
            .ok_or("Organization is required (--organization or [connection] in config)")?;

        let project = self
            .project
            .clone()
            .or_else(|| config.project.clone())
            .ok_or("Project is required (--project or [connection] in config)")?;

        let pat = self
            .pat
            .clone()
            .or_else(|| config.pat.clone())
            .ok_or("A Personal Access Token is required (--pat or AZURE_DEVOPS_PAT)")?;

        Ok(ResolvedConnection {
            organization,
            project,
            pat,
            timeout_seconds: self.timeout.unwrap_or(config.timeout_seconds),
        })
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        let connection = match &self.command {
            Command::GetTestCases { connection, .. } => Some(connection),
            Command::AggregateCases { connection, .. } => Some(connection),
            _ => None,
        };

        if let Some(connection) = connection {
            if let Some(timeout) = connection.timeout {
                if timeout == 0 {
                    return Err("Timeout must be at least 1 second".to_string());
                }
            }
        }

        if let Command::PlotTrend { input, .. } = &self.command {
            if !input.exists() {
                return Err(format!("Input file does not exist: {}", input.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args(command: Command) -> Args {
        Args {
            command,
            config: None,
            verbose: false,
            quiet: false,
        }
    }

    fn connection_args() -> ConnectionArgs {
        ConnectionArgs {
            organization: Some("contoso".to_string()),
            project: Some("widgets".to_string()),
            pat: Some("secret".to_string()),
            timeout: None,
        }
    }

    #[test]
    fn test_resolve_cli_takes_precedence() {
        let config = ConnectionConfig {
            organization: Some("from-config".to_string()),
            project: Some("from-config".to_string()),
            pat: Some("from-config".to_string()),
            timeout_seconds: 30,
        };

        let resolved = connection_args().resolve(&config).unwrap();
        assert_eq!(resolved.organization, "contoso");
        assert_eq!(resolved.project, "widgets");
        assert_eq!(resolved.pat, "secret");
        assert_eq!(resolved.timeout_seconds, 30);
    }

    #[test]
    fn test_resolve_falls_back_to_config() {
        let config = ConnectionConfig {
            organization: Some("contoso".to_string()),
            project: Some("widgets".to_string()),
            pat: Some("secret".to_string()),
            timeout_seconds: 60,
        };

        let resolved = ConnectionArgs::default().resolve(&config).unwrap();
        assert_eq!(resolved.organization, "contoso");
        assert_eq!(resolved.timeout_seconds, 60);
    }

    #[test]
    fn test_resolve_missing_pat_is_an_error() {
        let config = ConnectionConfig {
            organization: Some("contoso".to_string()),
            project: Some("widgets".to_string()),
            pat: None,
            timeout_seconds: 30,
        };
        let mut args = connection_args();
        args.pat = None;

        let err = args.resolve(&config).unwrap_err();
        assert!(err.contains("Personal Access Token"));
    }

    #[test]
    fn test_validation_conflicting_verbosity() {
        let mut args = make_args(Command::InitConfig);
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_zero_timeout() {
        let mut connection = connection_args();
        connection.timeout = Some(0);
        let args = make_args(Command::GetTestCases {
            connection,
            query: None,
        });
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args(Command::InitConfig);
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_parse_subcommands() {
        let args = Args::try_parse_from([
            "casetrend",
            "get-test-cases",
            "-o",
            "contoso",
            "-p",
            "widgets",
            "--pat",
            "secret",
        ])
        .unwrap();

        match args.command {
            Command::GetTestCases { connection, query } => {
                assert_eq!(connection.organization.as_deref(), Some("contoso"));
                assert_eq!(connection.project.as_deref(), Some("widgets"));
                assert!(query.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
