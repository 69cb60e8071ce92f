use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "marg",
    about = "Marginalia: a versioned annotation store",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Initialize a new annotation repository in DIRECTORY
    Setup(SetupArgs),
    /// Serve the REST API for the repository in DIRECTORY
    Run(RunArgs),
    /// Show commit history, newest first
    Log(LogArgs),
}

#[derive(Args)]
pub struct SetupArgs {
    pub directory: PathBuf,
    /// Repository name; defaults to the directory name
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Args)]
pub struct RunArgs {
    pub directory: PathBuf,
    pub port: u16,
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,
    /// TOML file with branch and committer settings
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct LogArgs {
    pub directory: PathBuf,
    #[arg(short = 'n', long, default_value = "20")]
    pub limit: usize,
    /// Branch to walk; defaults to the repository's default branch
    #[arg(short, long)]
    pub branch: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_setup() {
        let cli = Cli::try_parse_from(["marg", "setup", "/tmp/notes"]).unwrap();
        if let Command::Setup(args) = cli.command {
            assert_eq!(args.directory, PathBuf::from("/tmp/notes"));
            assert!(args.name.is_none());
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_setup_with_name() {
        let cli = Cli::try_parse_from(["marg", "setup", "d", "--name", "Reading group"]).unwrap();
        if let Command::Setup(args) = cli.command {
            assert_eq!(args.name.as_deref(), Some("Reading group"));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_run() {
        let cli = Cli::try_parse_from(["marg", "run", "d", "5000"]).unwrap();
        if let Command::Run(args) = cli.command {
            assert_eq!(args.port, 5000);
            assert_eq!(args.host, "127.0.0.1");
            assert!(args.config.is_none());
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_run_with_options() {
        let cli = Cli::try_parse_from([
            "marg", "run", "d", "80", "--host", "0.0.0.0", "--config", "s.toml",
        ])
        .unwrap();
        if let Command::Run(args) = cli.command {
            assert_eq!(args.host, "0.0.0.0");
            assert_eq!(args.config, Some(PathBuf::from("s.toml")));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn run_requires_numeric_port() {
        assert!(Cli::try_parse_from(["marg", "run", "d", "http"]).is_err());
        assert!(Cli::try_parse_from(["marg", "run", "d"]).is_err());
    }

    #[test]
    fn parse_log() {
        let cli = Cli::try_parse_from(["marg", "log", "d", "-n", "5", "--format", "json"]).unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        if let Command::Log(args) = cli.command {
            assert_eq!(args.limit, 5);
            assert!(args.branch.is_none());
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn verbose_flag() {
        let cli = Cli::try_parse_from(["marg", "--verbose", "log", "d"]).unwrap();
        assert!(cli.verbose);
        let cli = Cli::try_parse_from(["marg", "log", "d", "-v"]).unwrap();
        assert!(cli.verbose);
    }

    #[test]
    fn unknown_command_fails() {
        assert!(Cli::try_parse_from(["marg", "serve"]).is_err());
    }
}
