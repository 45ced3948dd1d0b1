use anyhow::Context as _;
use clap::{Parser, ValueEnum};
use lr1gen::{automaton::Config, dot, grammar::Grammar, parse_table::ParseTable};
use std::{
    fs,
    io::{self, Write as _},
    path::PathBuf,
    time::Instant,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// What to emit.
    #[arg(long, value_enum, default_value_t = Emit::Table)]
    emit: Emit,

    /// Output format of the grammar and the parse table.
    #[arg(long, value_enum, default_value_t = Format::Json)]
    format: Format,

    /// Keep the automaton as discovered, without merging states.
    #[arg(long)]
    no_merge: bool,

    /// Specify the path of the output file. Defaults to stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// The path of grammar definition file.
    input: PathBuf,
}

#[derive(Debug, Copy, Clone, PartialEq, ValueEnum)]
enum Emit {
    Grammar,
    Automaton,
    Dot,
    Table,
}

#[derive(Debug, Copy, Clone, PartialEq, ValueEnum)]
enum Format {
    Json,
    Text,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    tracing::debug!("parsed CLI args = {:?}", args);

    process_file(&args)
        .with_context(|| anyhow::anyhow!("errored during processing {}", args.input.display()))?;

    Ok(())
}

fn process_file(args: &Args) -> anyhow::Result<()> {
    let s = Instant::now();
    let grammar = Grammar::from_file(&args.input)?;
    tracing::info!("parse_file: {:?} elapsed", s.elapsed());

    if args.format == Format::Json && matches!(args.emit, Emit::Automaton | Emit::Dot) {
        tracing::warn!("--format is ignored for --emit {:?}", args.emit);
    }

    let output = match args.emit {
        Emit::Grammar => match args.format {
            Format::Json => serde_json::to_string_pretty(&grammar)?,
            Format::Text => grammar.to_string(),
        },
        Emit::Automaton | Emit::Dot | Emit::Table => {
            let mut config = Config::new();
            if args.no_merge {
                config.skip_merge();
            }

            let s = Instant::now();
            let automaton = config.generate(&grammar);
            tracing::info!(
                "generate_automaton: {:?} elapsed, {} states",
                s.elapsed(),
                automaton.len()
            );

            match args.emit {
                Emit::Automaton => automaton.to_string(),
                Emit::Dot => dot::render(&automaton).to_string(),
                _ => {
                    let s = Instant::now();
                    let table = ParseTable::generate(&automaton);
                    tracing::info!("generate_table: {:?} elapsed", s.elapsed());
                    match args.format {
                        Format::Json => serde_json::to_string_pretty(&table)?,
                        Format::Text => table.to_string(),
                    }
                }
            }
        }
    };

    // dump results.
    match &args.output {
        Some(out_file) => fs::write(out_file, &output).with_context(|| {
            anyhow::anyhow!("failed to write the output to {}", out_file.display())
        })?,
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{}", output.trim_end()).context("failed to write to stdout")?;
        }
    }

    Ok(())
}
