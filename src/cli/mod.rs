use clap::Parser;

/// Command-line overrides applied on top of the environment configuration.
#[derive(Debug, Parser)]
#[command(name = "learnonline-api")]
#[command(about = "LearnOnline API - quests, polls, faculty dashboards, research feed and AI tutor")]
#[command(version)]
pub struct Cli {
    #[arg(long, help = "Port to listen on (overrides PORT)")]
    pub port: Option<u16>,

    #[arg(long, help = "Skip seeding the demo data set")]
    pub no_seed: bool,

    #[arg(long, help = "Use the in-process store instead of MongoDB")]
    pub memory: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_parse() {
        let cli = Cli::parse_from(["learnonline-api", "--port", "9000", "--memory", "--no-seed"]);
        assert_eq!(cli.port, Some(9000));
        assert!(cli.memory);
        assert!(cli.no_seed);

        let cli = Cli::parse_from(["learnonline-api"]);
        assert_eq!(cli.port, None);
        assert!(!cli.memory);
    }
}
