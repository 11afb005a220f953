mod cli;

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use depot::{PoolRegistry, RunSummary, command, logging};

use crate::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_level.as_deref());

    let mut registry = PoolRegistry::with_config(&cli.registry_config());

    let input = File::open(&cli.input)
        .with_context(|| format!("failed to open command file {}", cli.input.display()))?;
    let input = BufReader::new(input);

    let summary = match &cli.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create output file {}", path.display()))?;
            execute(&mut registry, input, BufWriter::new(file))?
        }
        None => execute(&mut registry, input, BufWriter::new(io::stdout().lock()))?,
    };

    tracing::info!(
        lines = summary.lines,
        executed = summary.executed,
        skipped = summary.skipped,
        pools = registry.pool_count(),
        units = registry.unit_count(),
        "finished {}",
        cli.input.display()
    );
    Ok(())
}

fn execute<W: Write>(
    registry: &mut PoolRegistry,
    input: BufReader<File>,
    mut output: W,
) -> Result<RunSummary> {
    let summary = command::run(registry, input, &mut output).context("failed to run commands")?;
    output.flush().context("failed to flush output")?;
    Ok(summary)
}
