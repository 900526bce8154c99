//! CLI argument parsing.

use clap::{Parser, Subcommand};

/// Observer for an Airflow-compatible orchestrator.
///
/// Polls for failing workflows, exposes Prometheus metrics, and posts a
/// daily digest of the worst offenders.
#[derive(Parser, Debug)]
#[command(name = "atlas", about = "Workflow failure observer and daily digest")]
pub struct CliArgs {
    /// Bind address (overrides ATLAS_HOST)
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Bind port (overrides ATLAS_PORT)
    #[arg(long, global = true)]
    pub port: Option<u16>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the HTTP surface with the poll loop and digest scheduler (default)
    Serve,
    /// Build one digest now and print it as JSON
    Digest {
        /// Also deliver it to the configured digest channel
        #[arg(long)]
        post: bool,
    },
}

impl CliArgs {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve)
    }

    /// Apply host/port overrides to the loaded config.
    pub fn apply(&self, config: &mut atlas_core::Config) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(std::iter::once("atlas").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn serve_is_default() {
        assert_eq!(parse(&[]).command(), Command::Serve);
        assert_eq!(parse(&["serve"]).command(), Command::Serve);
    }

    #[test]
    fn digest_post_flag() {
        assert_eq!(parse(&["digest"]).command(), Command::Digest { post: false });
        assert_eq!(parse(&["digest", "--post"]).command(), Command::Digest { post: true });
    }

    #[test]
    fn overrides_apply_to_config() {
        let mut config = atlas_core::Config::from_lookup(|_| None);
        parse(&["serve", "--host", "127.0.0.1", "--port", "9100"]).apply(&mut config);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9100);
    }

    #[test]
    fn no_overrides_keep_config() {
        let mut config = atlas_core::Config::from_lookup(|_| None);
        parse(&[]).apply(&mut config);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8000);
    }
}
