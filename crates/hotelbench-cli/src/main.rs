//! Hotelbench Command-Line Runner
//!
//! Runs the fixed hotel-management query catalog against one or more stores
//! and prints per-(backend, query) timings.

mod output;

use clap::{Parser, Subcommand};
use hotelbench_backends::{connect, BackendKind, Settings, ALL_BACKENDS};
use hotelbench_core::{Runner, Translator};
use output::OutputFormat;

/// Hotelbench Command-Line Runner
#[derive(Parser, Debug)]
#[command(name = "hotelbench")]
#[command(version, about = "Multi-store query benchmark for the hotel-management dataset")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the benchmark
    Run {
        /// Backends to benchmark (default: all)
        #[arg(short, long, value_delimiter = ',')]
        backends: Vec<BackendKind>,

        /// Queries to run, by catalog name (default: the full catalog)
        #[arg(short, long, value_delimiter = ',')]
        queries: Vec<String>,

        /// Output format
        #[arg(long, default_value = "table", value_enum)]
        format: OutputFormat,

        /// Print up to five sample rows per successful cell
        #[arg(long)]
        samples: bool,
    },
    /// List the query catalog
    ListQueries,
    /// List the supported backends
    ListBackends,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("hotelbench=info".parse().expect("static directive")),
        )
        .init();

    let args = Args::parse();

    if let Err(e) = run(args).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    match args.command {
        Command::Run {
            backends,
            queries,
            format,
            samples,
        } => run_benchmark(backends, queries, format, samples).await,
        Command::ListQueries => {
            for query in hotelbench_core::catalog::ALL_QUERIES {
                let spec = query.spec();
                println!("{:<28} {} ({})", query.as_str(), spec.summary, spec.entity);
            }
            Ok(())
        }
        Command::ListBackends => {
            for backend in ALL_BACKENDS {
                println!("{}", backend);
            }
            Ok(())
        }
    }
}

async fn run_benchmark(
    backends: Vec<BackendKind>,
    queries: Vec<String>,
    format: OutputFormat,
    samples: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let backends = if backends.is_empty() {
        ALL_BACKENDS.to_vec()
    } else {
        backends
    };
    let queries = if queries.is_empty() {
        hotelbench_core::catalog::ALL_QUERIES
            .iter()
            .map(|q| q.as_str().to_string())
            .collect()
    } else {
        queries
    };

    let settings = Settings::from_env();
    let mut translators: Vec<Box<dyn Translator>> = Vec::with_capacity(backends.len());
    for kind in backends {
        translators.push(connect(kind, &settings).await?);
    }
    let runner = Runner::new(translators);

    let reports = runner.run(&queries).await;
    print!("{}", output::render(&reports, format, samples));
    Ok(())
}
