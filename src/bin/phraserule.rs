//! phraserule: build rule indexes and rewrite text from the command line.

use clap::{Args, Parser, Subcommand};
use phraserule::{cache, rebuild, Engine, EngineConfig};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "phraserule")]
#[command(author = "Kaitu.io")]
#[command(version = "0.1.0")]
#[command(about = "Rewrite text with an indexed list of regex rules", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Source {
    /// Rule file (PATTERN => REPLACEMENT per line)
    #[arg(short, long, required_unless_present = "config")]
    rules: Option<PathBuf>,

    /// Index cache file (default: <rules>.idx)
    #[arg(short, long)]
    cache: Option<PathBuf>,

    /// JSON engine configuration, instead of --rules/--cache
    #[arg(long, conflicts_with_all = ["rules", "cache"])]
    config: Option<PathBuf>,
}

impl Source {
    fn engine_config(&self) -> Result<EngineConfig, Box<dyn std::error::Error>> {
        if let Some(ref path) = self.config {
            return Ok(EngineConfig::from_json_file(path)?);
        }

        let rules = self.rules.clone().ok_or("--rules is required")?;
        let mut config = EngineConfig::for_rules(rules);
        if let Some(ref cache) = self.cache {
            config.cache_path = cache.clone();
        }
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the index from the rule file and save the cache
    Build {
        #[command(flatten)]
        source: Source,

        /// LZ4-compress the cache payload
        #[arg(long)]
        compress: bool,
    },

    /// Rewrite TEXT, or each line of stdin when no TEXT is given
    Apply {
        #[command(flatten)]
        source: Source,

        /// Text to rewrite
        text: Vec<String>,
    },

    /// Print index statistics as JSON
    Stats {
        #[command(flatten)]
        source: Source,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Build { source, compress } => build(&source, compress),
        Commands::Apply { source, text } => apply(&source, &text),
        Commands::Stats { source } => stats(&source),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn build(source: &Source, compress: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = source.engine_config()?;
    let indexed = rebuild(&config.rule_path)?;
    cache::save(&config.cache_path, &indexed, compress || config.compress_cache)?;

    println!(
        "Indexed {} rules, {} keywords -> {:?}",
        indexed.rules.len(),
        indexed.index.len(),
        config.cache_path
    );
    Ok(())
}

fn apply(source: &Source, text: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let engine = Engine::with_config(source.engine_config()?)?;

    if !text.is_empty() {
        println!("{}", engine.transform(&text.join(" ")));
        return Ok(());
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    for line in stdin.lock().lines() {
        writeln!(stdout, "{}", engine.transform(&line?))?;
    }
    Ok(())
}

fn stats(source: &Source) -> Result<(), Box<dyn std::error::Error>> {
    let engine = Engine::with_config(source.engine_config()?)?;
    println!("{}", engine.stats().to_json()?);
    Ok(())
}
