use clap::Parser;
use ace_recorder::cli::commands::{cmd_compact, cmd_ingest, cmd_show};
use ace_recorder::cli::config::{init_logging, load_config, Cli, Commands};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let mut config = load_config(cli.config.as_deref());

    // Resolve producer version: CLI > config > default
    if let Some(tag) = cli.build_tag {
        config.version = tag;
    }

    match cli.command {
        Commands::Ingest { input, title, out } => {
            cmd_ingest(&config, &input, &title, out.as_deref(), cli.verbose)?;
        }
        Commands::Show { file } => {
            cmd_show(&config, &file)?;
        }
        Commands::Compact { file } => {
            cmd_compact(&config, &file)?;
        }
    }

    Ok(())
}
