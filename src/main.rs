use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use linedex::index::stats::show_stats;
use linedex::index::{Corpus, Engine, load_engine};
use linedex::output::{OutputOptions, print_count, print_matches};
use linedex::query::run_perf;
use linedex::server::{ClientError, IndexClient, IndexServer, ServerConfig};
use linedex::utils::{AppConfig, get_config_path};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "linedex")]
#[command(about = "In-memory phrase search over the lines of a text")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log debug events
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of the one in the app data directory
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Index a corpus and print the lines containing a phrase
    Search {
        phrase: String,

        /// Corpus file (defaults to the configured one)
        #[arg(short = 'f', long)]
        corpus: Option<PathBuf>,

        /// Maximum phrase length to index
        #[arg(short, long)]
        limit: Option<NonZeroUsize>,

        /// Only print the number of matching lines
        #[arg(short = 'c', long)]
        count: bool,

        /// Prefix lines with their 0-based line number
        #[arg(short = 'n', long)]
        line_number: bool,

        #[arg(long, value_enum, default_value_t = ColorMode::Auto)]
        color: ColorMode,
    },
    /// Print one line of a corpus (0-based)
    Get {
        line: u32,

        #[arg(short = 'f', long)]
        corpus: Option<PathBuf>,
    },
    /// Show index statistics
    Stats {
        #[arg(short = 'f', long)]
        corpus: Option<PathBuf>,

        #[arg(short, long)]
        limit: Option<NonZeroUsize>,
    },
    /// Run the index server in the foreground
    Serve {
        #[arg(short = 'f', long)]
        corpus: Option<PathBuf>,

        /// Address to listen on
        #[arg(short, long)]
        bind: Option<String>,

        #[arg(short, long)]
        limit: Option<NonZeroUsize>,
    },
    /// Search through a running server
    Query {
        phrase: String,

        #[arg(short, long)]
        bind: Option<String>,

        #[arg(short = 'c', long)]
        count: bool,

        #[arg(long, value_enum, default_value_t = ColorMode::Auto)]
        color: ColorMode,
    },
    /// Fetch one line through a running server
    Line {
        line: u32,

        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Show server status
    Status {
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Rebuild the server's index, optionally from another corpus
    Reload {
        path: Option<PathBuf>,

        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Stop a running server
    Stop {
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Hammer the search with concurrent queries and report throughput
    Perf {
        /// Phrase to search (defaults to the configured one)
        #[arg(short, long)]
        phrase: Option<String>,

        #[arg(short, long)]
        threads: Option<usize>,

        /// Searches per thread
        #[arg(short, long)]
        searches: Option<usize>,

        #[arg(short = 'f', long)]
        corpus: Option<PathBuf>,

        #[arg(short, long)]
        limit: Option<NonZeroUsize>,

        /// Run inside the server at this address instead of locally
        #[arg(long)]
        remote: Option<String>,
    },
    /// Print the effective configuration
    Config {
        /// Write the effective configuration to the app data directory
        #[arg(long)]
        save: bool,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ColorMode {
    Auto,
    Never,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };

    match run(cli.command, config) {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => match e.downcast_ref::<linedex::SearchError>() {
            Some(not_found) => {
                eprintln!("{}", not_found);
                Ok(ExitCode::FAILURE)
            }
            None => match e.downcast_ref::<ClientError>() {
                Some(ClientError::NotFound(message)) => {
                    eprintln!("{}", message);
                    Ok(ExitCode::FAILURE)
                }
                _ => Err(e),
            },
        },
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "linedex=debug" } else { "linedex=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Commands, mut config: AppConfig) -> Result<()> {
    match command {
        Commands::Search {
            phrase,
            corpus,
            limit,
            count,
            line_number,
            color,
        } => {
            apply_overrides(&mut config, corpus, limit);
            let engine = open_engine(&config)?;
            let matches = engine.search(&phrase)?;
            let color = color != ColorMode::Never;

            if count {
                print_count(matches.count(), color)?;
            } else {
                let options = OutputOptions {
                    color,
                    line_numbers: line_number,
                };
                print_matches(matches.entries(), &phrase, options)?;
            }
        }

        Commands::Get { line, corpus } => {
            apply_overrides(&mut config, corpus, None);
            let corpus = Corpus::load(&config.corpus_path)?;
            match corpus.get(line) {
                Some(text) => println!("{}", text),
                None => bail!("Can't find line {}. Read only {} lines.", line, corpus.len()),
            }
        }

        Commands::Stats { corpus, limit } => {
            apply_overrides(&mut config, corpus, limit);
            let engine = open_engine(&config)?;
            show_stats(&engine, &config.corpus_path);
        }

        Commands::Serve {
            corpus,
            bind,
            limit,
        } => {
            apply_overrides(&mut config, corpus, limit);
            let bind = bind.unwrap_or_else(|| config.bind_addr.clone());
            let engine = open_engine(&config)?;

            let server_config = ServerConfig {
                index: config.index_config(),
                cache_size: config.cache_size,
                progress_every: config.progress_every,
                ..ServerConfig::default()
            };
            let server = IndexServer::new(engine, Some(config.corpus_path.clone()), server_config);
            server.run(bind.as_str())?;
        }

        Commands::Query {
            phrase,
            bind,
            count,
            color,
        } => {
            let mut client = connect(&config, bind)?;
            let response = client.search(&phrase)?;
            let color = color != ColorMode::Never;

            if count {
                print_count(response.count, color)?;
            } else {
                let options = OutputOptions {
                    color,
                    line_numbers: false,
                };
                let entries = response.lines.iter().map(|line| (0, line.as_str()));
                print_matches(entries, &phrase, options)?;
            }
        }

        Commands::Line { line, bind } => {
            let mut client = connect(&config, bind)?;
            println!("{}", client.get_line(line)?);
        }

        Commands::Status { bind } => {
            let mut client = connect(&config, bind)?;
            let status = client.status()?;
            println!("linedex server status:");
            println!("  Uptime: {}s", status.uptime_secs);
            if let Some(source) = &status.source {
                println!("  Corpus: {}", source.display());
            }
            println!("  Lines: {}", status.lines);
            println!("  Trie nodes: {}", status.trie_nodes);
            match status.max_phrase_len {
                Some(limit) => println!("  Phrase limit: {}", limit),
                None => println!("  Phrase limit: none"),
            }
            println!("  Queries served: {}", status.queries_served);
            println!("  Cache hit rate: {:.1}%", status.cache_hit_rate * 100.0);
            println!("  Reloads: {}", status.reloads);
        }

        Commands::Reload { path, bind } => {
            let mut client = connect(&config, bind)?;
            let (success, message) = client.reload(path.as_deref())?;
            if success {
                println!("Reloaded: {}", message);
            } else {
                bail!("Reload failed: {}", message);
            }
        }

        Commands::Stop { bind } => {
            let mut client = connect(&config, bind)?;
            client.shutdown()?;
            println!("Server stopped");
        }

        Commands::Perf {
            phrase,
            threads,
            searches,
            corpus,
            limit,
            remote,
        } => {
            apply_overrides(&mut config, corpus, limit);
            let phrase = phrase.unwrap_or_else(|| config.bench_phrase.clone());
            let threads = threads.unwrap_or(config.bench_threads);
            let searches = searches.unwrap_or(config.bench_searches);

            let report = match remote {
                Some(addr) => connect(&config, Some(addr))?.perf(&phrase, threads, searches)?,
                None => {
                    let engine = open_engine(&config)?;
                    info!(
                        "Starting {} threads x {} searches of '{}'",
                        threads, searches, phrase
                    );
                    run_perf(&engine, &phrase, threads, searches)?
                }
            };
            println!("{}", report);
        }

        Commands::Config { save } => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            if save {
                let path = config.save()?;
                println!("Saved to {}", path.display());
            } else {
                println!("Config file: {}", get_config_path()?.display());
            }
        }
    }

    Ok(())
}

fn apply_overrides(config: &mut AppConfig, corpus: Option<PathBuf>, limit: Option<NonZeroUsize>) {
    if let Some(corpus) = corpus {
        config.corpus_path = corpus;
    }
    if limit.is_some() {
        config.max_phrase_len = limit;
    }
}

fn open_engine(config: &AppConfig) -> Result<Engine> {
    load_engine(
        &config.corpus_path,
        config.index_config(),
        config.progress_every,
        false,
    )
}

fn connect(config: &AppConfig, bind: Option<String>) -> Result<IndexClient> {
    let addr = bind.unwrap_or_else(|| config.bind_addr.clone());
    IndexClient::connect(addr.as_str())
        .with_context(|| format!("Failed to connect to server at {}", addr))
}
