//! Command-line front end: build a network from a JSON architecture, inspect a
//! saved model, or run a single query against it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nnet::{Layer, NetworkSpec, NeuralNet};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "nnet")]
#[command(about = "Build, inspect and query plain-text neural network models", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a freshly initialised network from a JSON architecture
    Init {
        /// Architecture description (JSON)
        #[arg(short, long)]
        spec: PathBuf,

        /// Model file to write; defaults to `<name>.nn`
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Print the layer stack of a saved model
    Inspect {
        model: PathBuf,
    },

    /// Run one forward pass and print the output vector
    Query {
        model: PathBuf,

        /// Comma-separated input values
        #[arg(short, long, value_delimiter = ',', allow_negative_numbers = true)]
        input: Vec<f64>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("nnet=info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { spec, out } => init(&spec, out),
        Commands::Inspect { model } => inspect(&model),
        Commands::Query { model, input } => query(&model, &input),
    }
}

fn init(spec_path: &Path, out: Option<PathBuf>) -> Result<()> {
    let spec = NetworkSpec::load_json(spec_path)
        .with_context(|| format!("reading architecture {}", spec_path.display()))?;
    let net = spec.build().with_context(|| format!("building network {:?}", spec.name))?;

    let out = out.unwrap_or_else(|| PathBuf::from(format!("{}.nn", spec.name)));
    net.save_file(&out).with_context(|| format!("writing {}", out.display()))?;
    info!(name = %spec.name, inputs = net.input_size(), outputs = net.output_size(), "network initialised");
    println!("{}", out.display());
    Ok(())
}

fn inspect(model: &Path) -> Result<()> {
    let net = NeuralNet::from_file(model).with_context(|| format!("loading {}", model.display()))?;

    println!("inputs:  {}", net.input_size());
    println!("outputs: {}", net.output_size());
    println!("loss:    {:?} (gradient {:?})", net.loss(), net.loss_derivative());
    for (i, layer) in net.layers().iter().enumerate() {
        println!(
            "{:>3}  {:<5} {:>6} -> {:<6} lr {}",
            i,
            layer.kind(),
            layer.in_size(),
            layer.out_size(),
            layer.learning_rate()
        );
    }
    Ok(())
}

fn query(model: &Path, input: &[f64]) -> Result<()> {
    let mut net = NeuralNet::from_file(model).with_context(|| format!("loading {}", model.display()))?;
    let output = net.query(input)?;
    let line: Vec<String> = output.iter().map(|x| x.to_string()).collect();
    println!("{}", line.join(","));
    Ok(())
}
