//! Command-line shell over a persistent `hoddb::Engine`: `load`, `query`,
//! `update-links`, and an interactive `repl`, all operating on one RocksDB
//! directory named by `--db-path` (or a config file's `db_path`).

use clap::{Parser, Subcommand, ValueEnum};
use hoddb::{Config, Dataset, Engine, LinkUpdate, QueryResult};
use rdf_model::{Triple, Uri};
use serde::Deserialize;
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use storage::RocksDbBackend;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hoddb", version, about = "Embedded RDF/SPARQL-subset query engine for Brick graphs")]
struct Cli {
    /// Path to a JSON configuration file (see the engine's `Config` for the knobs).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database directory, overriding the loaded configuration's `db_path`.
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load a dataset (JSON `{"namespaces": {...}, "triples": [{"s","p","o"}, ...]}`).
    Load {
        /// Path to the dataset JSON file.
        path: PathBuf,
    },
    /// Run a single query and print its result.
    Query {
        /// Query text, e.g. `SELECT ?x WHERE { bldg:ahu_1 bf:feeds ?x . }`.
        text: String,
        /// Output format.
        #[arg(long, value_enum, default_value = "csv")]
        format: OutputFormat,
    },
    /// Apply a links-update batch (JSON `{"adding": [...], "removing": [...]}`).
    UpdateLinks {
        /// Path to the links-update JSON file.
        path: PathBuf,
    },
    /// Interactive read-eval-print loop: enter query text, `:explain <query>`
    /// to print its plan without running it, or `:quit` to exit.
    Repl,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

#[derive(Deserialize)]
struct WireTriple {
    s: String,
    p: String,
    o: String,
}

#[derive(Deserialize)]
struct WireDataset {
    #[serde(default)]
    namespaces: HashMap<String, String>,
    triples: Vec<WireTriple>,
}

#[derive(Deserialize)]
struct WireLinkUpdate {
    #[serde(default)]
    adding: Vec<WireTriple>,
    #[serde(default)]
    removing: Vec<WireTriple>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    match &cli.command {
        Command::Load { path } => {
            let engine = open_engine(cli)?;
            let dataset = read_dataset(path)?;
            let count = dataset.triples.len();
            engine.load(&dataset)?;
            println!("loaded {count} triple(s)");
        }
        Command::Query { text, format } => {
            let engine = open_engine(cli)?;
            let result = engine.run_query(text)?;
            print_result(&result, *format);
        }
        Command::UpdateLinks { path } => {
            let engine = open_engine(cli)?;
            let update = read_link_update(path)?;
            let (adding, removing) = (update.adding.len(), update.removing.len());
            engine.update_links(&update)?;
            println!("applied {adding} addition(s), {removing} removal(s)");
        }
        Command::Repl => {
            let engine = open_engine(cli)?;
            run_repl(&engine)?;
        }
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(db_path) = &cli.db_path {
        config.db_path = db_path.clone();
    }
    Ok(config)
}

fn open_engine(cli: &Cli) -> Result<Engine<RocksDbBackend>, Box<dyn std::error::Error>> {
    let config = load_config(cli)?;
    Ok(Engine::open(config)?)
}

fn read_dataset(path: &PathBuf) -> Result<Dataset, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)?;
    let wire: WireDataset = serde_json::from_str(&text)?;
    let mut dataset = Dataset::from_full_iri_triples(wire.triples.into_iter().map(|t| (t.s, t.p, t.o)));
    for (prefix, iri) in wire.namespaces {
        dataset = dataset.with_namespace(prefix, iri);
    }
    Ok(dataset)
}

fn read_link_update(path: &PathBuf) -> Result<LinkUpdate, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)?;
    let wire: WireLinkUpdate = serde_json::from_str(&text)?;
    Ok(LinkUpdate {
        adding: wire.adding.into_iter().map(wire_triple_to_model).collect(),
        removing: wire.removing.into_iter().map(wire_triple_to_model).collect(),
    })
}

fn wire_triple_to_model(t: WireTriple) -> Triple {
    Triple::new(Uri::from_full_iri(&t.s), Uri::from_full_iri(&t.p), Uri::from_full_iri(&t.o))
}

fn print_result(result: &QueryResult, format: OutputFormat) {
    match format {
        OutputFormat::Csv => print!("{}", result.to_csv()),
        OutputFormat::Json => println!("{}", result.to_json()),
    }
    if let Some(plan) = &result.plan {
        eprintln!("-- query plan --");
        for step in plan {
            eprintln!("{step}");
        }
    }
}

fn run_repl(engine: &Engine<RocksDbBackend>) -> Result<(), Box<dyn std::error::Error>> {
    println!("hoddb repl - enter a query, :explain <query> to print its plan, :quit to exit");
    let stdin = io::stdin();
    loop {
        print!("hoddb> ");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == ":quit" || line == ":q" {
            break;
        }
        if let Some(query_text) = line.strip_prefix(":explain ") {
            match run_explain(engine, query_text) {
                Ok(plan) => plan.iter().for_each(|step| println!("{step}")),
                Err(err) => eprintln!("error: {err}"),
            }
            continue;
        }
        match engine.run_query(line) {
            Ok(result) => print_result(&result, OutputFormat::Csv),
            Err(err) => eprintln!("error: {err}"),
        }
    }
    Ok(())
}

fn run_explain(engine: &Engine<RocksDbBackend>, query_text: &str) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let query = sparql::parse(query_text)?;
    let namespaces: HashMap<String, String> = engine.namespaces().into_iter().collect();
    Ok(engine.explain(&query, &namespaces)?)
}
