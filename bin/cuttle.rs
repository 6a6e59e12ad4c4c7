use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use cuttle::{
    AppState, Bm25Params, CollectionIndexer, CollectionPaths, IndexMerger, IndexPaths,
    IndexerConfig, QueryMode, SearchEngine, DEFAULT_TOP_K,
};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "cuttle")]
#[command(about = "BM25 passage search engine", long_about = None)]
#[command(version = cuttle::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Phase 1: tokenize a collection and emit flat postings partitions
    Index {
        /// Collection TSV: originalDocID <TAB> passage
        input: PathBuf,

        /// Output directory for postings parts and document files
        #[arg(long, env = "CUTTLE_DOCS_DIR", default_value = "./docs")]
        out: PathBuf,

        /// Rotate postings partitions past this many bytes
        #[arg(long, default_value_t = 2 * 1024 * 1024 * 1024)]
        part_size_limit: u64,
    },

    /// Phase 2: merge globally-sorted postings into the compressed index
    ///
    /// Sort the partitions first with the system sort utility:
    ///   LC_ALL=C sort -t $'\t' -k1,1 -k2,2n postings_part_*.tsv > sorted.tsv
    Merge {
        /// Sorted postings TSV (term, docID ascending)
        input: PathBuf,

        /// Output directory for the index files
        #[arg(long, env = "CUTTLE_INDEX_DIR", default_value = "./index")]
        out: PathBuf,
    },

    /// Phase 3: interactive query REPL
    Query {
        #[command(flatten)]
        index: IndexArgs,

        /// Default query mode: and | or
        #[arg(long, default_value = "or")]
        mode: String,

        /// Number of results per query
        #[arg(long, default_value_t = DEFAULT_TOP_K)]
        k: usize,

        /// BM25 k1 parameter (recommended range 0.8..1.2)
        #[arg(long, default_value_t = 0.9)]
        k1: f64,

        /// BM25 b parameter (recommended range 0.3..0.7)
        #[arg(long, default_value_t = 0.4)]
        b: f64,
    },

    /// Serve queries over HTTP; mode, k, k1, b come per request
    Serve {
        #[command(flatten)]
        index: IndexArgs,

        /// Listen address
        #[arg(long, env = "CUTTLE_BIND_ADDR", default_value = "127.0.0.1:8080")]
        bind: String,
    },
}

#[derive(Args)]
struct IndexArgs {
    /// Index directory (output of `cuttle merge`)
    #[arg(long, env = "CUTTLE_INDEX_DIR", default_value = "./index")]
    index: PathBuf,

    /// Phase-1 output directory with doc_table.txt and content files;
    /// omit to run without original ids and snippets
    #[arg(long, env = "CUTTLE_DOCS_DIR")]
    docs: Option<PathBuf>,
}

impl IndexArgs {
    fn open_engine(&self) -> Result<SearchEngine> {
        Ok(SearchEngine::open(&self.index, self.docs.as_deref())?)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Index {
            input,
            out,
            part_size_limit,
        } => {
            let config = IndexerConfig::default().with_part_size_limit(part_size_limit);
            let indexer = CollectionIndexer::new(CollectionPaths::new(&out), config);
            let summary = indexer.index(&input)?;
            info!(
                "indexed {} documents into {} postings across {} parts",
                summary.doc_count, summary.posting_count, summary.part_count
            );
            println!(
                "Now sort the partitions and merge:\n  LC_ALL=C sort -t $'\\t' -k1,1 -k2,2n {}/postings_part_*.tsv > sorted.tsv\n  cuttle merge sorted.tsv --out ./index",
                out.display()
            );
        }

        Command::Merge { input, out } => {
            let merger = IndexMerger::new(IndexPaths::new(&out));
            let stats = merger.merge(&input)?;
            info!(
                "merged {} terms, {} postings, {} documents (avgdl {:.2})",
                stats.total_terms, stats.total_postings, stats.doc_count, stats.avgdl
            );
        }

        Command::Query {
            index,
            mode,
            k,
            k1,
            b,
        } => {
            let default_mode: QueryMode = mode
                .parse()
                .map_err(|e: cuttle::CuttleError| anyhow::anyhow!(e.to_string()))?;
            anyhow::ensure!(k > 0, "k must be positive");
            anyhow::ensure!(k1.is_finite() && k1 >= 0.0, "k1 must be non-negative");
            anyhow::ensure!(
                b.is_finite() && (0.0..=1.0).contains(&b),
                "b must be in [0, 1]"
            );

            let engine = index.open_engine()?;
            run_repl(&engine, default_mode, k, &Bm25Params::new(k1, b))?;
        }

        Command::Serve { index, bind } => {
            let engine = Arc::new(index.open_engine()?);
            let app = cuttle::create_router(AppState { engine });

            let listener = tokio::net::TcpListener::bind(&bind).await?;
            info!("cuttle v{} listening on {}", cuttle::VERSION, bind);
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}

/// Interactive query loop. `/and <query>` and `/or <query>` override the
/// mode for a single query; `/quit` exits.
fn run_repl(
    engine: &SearchEngine,
    default_mode: QueryMode,
    k: usize,
    params: &Bm25Params,
) -> Result<()> {
    println!(
        "cuttle v{} ({} terms loaded)",
        cuttle::VERSION,
        engine.term_count()
    );
    println!("Enter queries, one per line. /and or /or override the mode; /quit exits.\n");

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();

    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "/quit" || line == "/exit" {
            break;
        }

        let (mode, query) = if let Some(rest) = line.strip_prefix("/and ") {
            (QueryMode::And, rest)
        } else if let Some(rest) = line.strip_prefix("/or ") {
            (QueryMode::Or, rest)
        } else {
            (default_mode, line)
        };
        if query.is_empty() {
            continue;
        }

        let response = engine.search(query, mode, k, params)?;
        println!(
            "Top {} results ({} mode, {} ms):",
            response.num_results, response.mode, response.query_time_ms
        );
        println!("{:-<80}", "");

        for result in &response.results {
            print!(
                "{:>4}  {:>10}  {:>10.4}  {}",
                result.rank, result.doc_id, result.score, result.original_id
            );
            if let Some(snippet) = &result.snippet {
                let highlighted =
                    cuttle::search::snippet::highlight(snippet, &response.query_terms);
                print!("\n      {}", highlighted);
            }
            println!();
        }
        if response.results.is_empty() {
            println!("(no results)");
        }
        println!();
    }

    println!("Goodbye!");
    Ok(())
}
