use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "maker-api")]
#[command(about = "Level maker backend - accounts, levels, drafts, collections and telemetry")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve {
        #[arg(long, help = "Override the listen port from PORT")]
        port: Option<u16>,
    },

    #[command(about = "Apply the bundled schema to DATABASE_URL and exit")]
    InitDb,
}

impl Cli {
    /// No subcommand means `serve` with the configured port.
    pub fn command(&self) -> Commands {
        match &self.command {
            Some(Commands::Serve { port }) => Commands::Serve { port: *port },
            Some(Commands::InitDb) => Commands::InitDb,
            None => Commands::Serve { port: None },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_serve() {
        let cli = Cli::parse_from(["maker-api"]);
        assert_eq!(cli.command(), Commands::Serve { port: None });
    }

    #[test]
    fn parses_port_override() {
        let cli = Cli::parse_from(["maker-api", "serve", "--port", "9000"]);
        assert_eq!(cli.command(), Commands::Serve { port: Some(9000) });
    }

    #[test]
    fn parses_init_db() {
        let cli = Cli::parse_from(["maker-api", "init-db"]);
        assert_eq!(cli.command(), Commands::InitDb);
    }
}
