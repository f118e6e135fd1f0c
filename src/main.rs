use clap::Parser;
use tracing_subscriber::EnvFilter;

use longread_qc::cli;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity flag
    let filter = if cli.verbose {
        EnvFilter::new("longread_qc=debug,info")
    } else {
        EnvFilter::new("longread_qc=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        cli::Commands::BuildIndex(args) => {
            cli::actions::run(args.to_call(), cli.format, cli.verbose)?;
        }
        cli::Commands::Search(args) => {
            cli::actions::run(args.to_call(), cli.format, cli.verbose)?;
        }
        cli::Commands::FilterReads(args) => {
            cli::actions::run(args.to_call(), cli.format, cli.verbose)?;
        }
        cli::Commands::ExtractReads(args) => {
            cli::actions::run(args.to_call(), cli.format, cli.verbose)?;
        }
        cli::Commands::ClassifyConsensus(args) => {
            cli::actions::run(args.to_call(), cli.format, cli.verbose)?;
        }
        cli::Commands::FindConsensusAnnotation(args) => {
            cli::actions::run(args.to_call(), cli.format, cli.verbose)?;
        }
        cli::Commands::Trim(args) => {
            cli::actions::run(args.to_call(), cli.format, cli.verbose)?;
        }
        cli::Commands::Stats(args) => {
            cli::actions::run(args.to_call(), cli.format, cli.verbose)?;
        }
        cli::Commands::Import(args) => {
            cli::artifacts::run_import(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Export(args) => {
            cli::artifacts::run_export(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Peek(args) => {
            cli::artifacts::run_peek(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Actions(args) => {
            cli::describe::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Tools(args) => {
            cli::tools::run(args, cli.format, cli.verbose)?;
        }
    }

    Ok(())
}
