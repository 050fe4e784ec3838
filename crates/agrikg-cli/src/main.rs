//! agrikg CLI - Command-line interface
//!
//! Usage:
//!   agrikg extract text <file> [--out <json>]
//!   agrikg extract records <file> [--out <json>]
//!   agrikg ask [<question>] [--questions-file <file>] [--text <file>] [--records <file>] [--processed <json>]
//!   agrikg search <query> [--limit <n>]
//!   agrikg neighbors <name>
//!   agrikg stats
//!   agrikg demo

mod demo;
mod records;

use std::path::{Path, PathBuf};

use agrikg_core::{AppConfig, LoggingConfig};
use agrikg_extractor::ExtractionEngine;
use agrikg_graph::KnowledgeGraph;
use agrikg_qa::AssistedAnswerer;
use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "agrikg")]
#[command(about = "Agricultural knowledge graph extraction and question answering")]
#[command(version)]
struct Cli {
    /// Configuration file (TOML); environment variables override it
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract entities and relations and print them as JSON
    Extract {
        #[command(subcommand)]
        source: ExtractSource,
    },
    /// Answer a question against the knowledge graph
    Ask {
        /// Question to ask
        #[arg(required_unless_present = "questions_files")]
        question: Option<String>,
        /// File with one question per line (repeatable); blank lines are skipped
        #[arg(long = "questions-file", value_name = "FILE")]
        questions_files: Vec<PathBuf>,
        #[command(flatten)]
        graph: GraphArgs,
        /// Print the full answer with intent and related entities as JSON
        #[arg(long)]
        json: bool,
    },
    /// Search entities by substring
    Search {
        query: String,
        /// Maximum number of hits
        #[arg(long)]
        limit: Option<usize>,
        #[command(flatten)]
        graph: GraphArgs,
    },
    /// List the relations touching an entity
    Neighbors {
        /// Entity name (exact)
        name: String,
        #[command(flatten)]
        graph: GraphArgs,
    },
    /// Print graph statistics
    Stats {
        #[command(flatten)]
        graph: GraphArgs,
    },
    /// Run the built-in sample through extraction, graph building and QA
    Demo,
}

#[derive(Subcommand)]
enum ExtractSource {
    /// Rule-based extraction from a plain-text file
    Text {
        file: PathBuf,
        /// Write JSON here instead of stdout
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Field mapping over a JSON, CSV or spreadsheet records file
    Records {
        file: PathBuf,
        /// Write JSON here instead of stdout
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
}

/// Sources merged into one graph. With none given, the built-in sample is used.
#[derive(Args)]
struct GraphArgs {
    /// Plain-text file (repeatable)
    #[arg(long = "text", value_name = "FILE")]
    texts: Vec<PathBuf>,

    /// JSON, CSV or spreadsheet records file (repeatable)
    #[arg(long = "records", value_name = "FILE")]
    records: Vec<PathBuf>,

    /// Saved extraction result from `agrikg extract` (repeatable)
    #[arg(long = "processed", value_name = "JSON")]
    processed: Vec<PathBuf>,
}

impl GraphArgs {
    fn is_empty(&self) -> bool {
        self.texts.is_empty() && self.records.is_empty() && self.processed.is_empty()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    init_tracing(&config.logging);

    let engine = ExtractionEngine::from_config(&config.extraction)
        .context("failed to build extraction engine")?;

    match cli.command {
        Commands::Extract { source } => match source {
            ExtractSource::Text { file, out } => {
                let text = std::fs::read_to_string(&file)
                    .with_context(|| format!("failed to read {}", file.display()))?;
                let result = engine.extract_from_text(&text);
                tracing::info!(
                    entities = result.entities.len(),
                    relations = result.relations.len(),
                    "text extraction finished"
                );
                write_json(&result, out.as_deref())?;
            }
            ExtractSource::Records { file, out } => {
                let records = records::load_records(&file)?;
                let result = engine.extract_from_structured(&records);
                tracing::info!(
                    records = records.len(),
                    entities = result.entities.len(),
                    relations = result.relations.len(),
                    "structured extraction finished"
                );
                write_json(&result, out.as_deref())?;
            }
        },
        Commands::Ask {
            question,
            questions_files,
            graph,
            json,
        } => {
            let mut questions: Vec<String> = question.into_iter().collect();
            for path in &questions_files {
                questions.extend(load_questions(path)?);
            }
            if questions.is_empty() {
                bail!("no questions to answer");
            }

            let graph = build_graph(&engine, &graph)?;
            let answerer = AssistedAnswerer::from_config(&config.qa);
            let single = questions.len() == 1;
            let mut results = Vec::with_capacity(questions.len());
            for question in &questions {
                results.push(answerer.answer(question, &graph).await);
            }

            if json {
                if single {
                    write_json(&results[0], None)?;
                } else {
                    write_json(&results, None)?;
                }
            } else {
                for (question, result) in questions.iter().zip(&results) {
                    if !single {
                        println!("问: {question}");
                        print!("答: ");
                    }
                    println!("{}", result.answer);
                    if !result.related.is_empty() {
                        let names: Vec<&str> =
                            result.related.iter().map(|r| r.name.as_str()).collect();
                        println!("相关实体: {}", names.join("、"));
                    }
                }
            }
        }
        Commands::Search {
            query,
            limit,
            graph,
        } => {
            let graph = build_graph(&engine, &graph)?;
            let limit = limit.unwrap_or(config.search.default_limit);
            let hits = graph.search_entities(&query, limit);

            if hits.is_empty() {
                println!("No matching entities for {query:?}");
            }
            for hit in hits {
                println!(
                    "{:>3}  {}  {}",
                    hit.score, hit.entity.id, hit.entity.description
                );
            }
        }
        Commands::Neighbors { name, graph } => {
            let graph = build_graph(&engine, &graph)?;
            let neighbors = graph.get_neighbors(&name);

            if neighbors.is_empty() {
                println!("No relations for {name:?}");
            }
            for neighbor in neighbors {
                println!(
                    "{} {}({}) {}",
                    neighbor.direction.arrow(),
                    neighbor.relation,
                    engine.ontology().relation_label(neighbor.relation),
                    neighbor.entity
                );
            }
        }
        Commands::Stats { graph } => {
            let graph = build_graph(&engine, &graph)?;
            write_json(&graph.get_stats(), None)?;
        }
        Commands::Demo => run_demo(&engine, &config).await?,
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::from_file(path)?.with_env_override()?,
        None => AppConfig::from_env()?,
    };
    Ok(config)
}

/// Logs go to stderr so JSON on stdout stays clean
fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("agrikg={}", logging.level).into());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Non-blank lines of a questions file, trimmed
fn load_questions(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

fn build_graph(engine: &ExtractionEngine, args: &GraphArgs) -> Result<KnowledgeGraph> {
    if args.is_empty() {
        tracing::info!("no graph inputs given, using built-in sample data");
        return Ok(sample_graph(engine));
    }

    let mut graph = KnowledgeGraph::new();
    for path in &args.texts {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        graph.build_from_data(&engine.extract_from_text(&text));
    }
    for path in &args.records {
        let records = records::load_records(path)?;
        graph.build_from_data(&engine.extract_from_structured(&records));
    }
    for path in &args.processed {
        graph.build_from_data(&records::load_processed(path)?);
    }

    let stats = graph.get_stats();
    tracing::info!(
        entities = stats.total_entities,
        relations = stats.total_relations,
        "knowledge graph built"
    );
    Ok(graph)
}

fn sample_graph(engine: &ExtractionEngine) -> KnowledgeGraph {
    let mut graph = KnowledgeGraph::new();
    graph.build_from_data(&engine.extract_from_text(demo::SAMPLE_TEXT));
    graph.build_from_data(&engine.extract_from_structured(&demo::sample_records()));
    graph
}

fn write_json<T: Serialize>(value: &T, out: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match out {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), "output written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

async fn run_demo(engine: &ExtractionEngine, config: &AppConfig) -> Result<()> {
    println!("== 文本抽取 ==");
    let text_result = engine.extract_from_text(demo::SAMPLE_TEXT);
    println!(
        "{} 个实体, {} 个关系",
        text_result.entities.len(),
        text_result.relations.len()
    );
    for entity in &text_result.entities {
        println!("  {}  {}", entity.id, entity.description);
    }
    for relation in &text_result.relations {
        println!("  {relation}");
    }

    println!();
    println!("== 结构化数据映射 ==");
    let records = demo::sample_records();
    let structured_result = engine.extract_from_structured(&records);
    println!(
        "{} 条记录, {} 个实体, {} 个关系",
        records.len(),
        structured_result.entities.len(),
        structured_result.relations.len()
    );

    let mut graph = KnowledgeGraph::new();
    graph.build_from_data(&text_result);
    graph.build_from_data(&structured_result);

    println!();
    println!("== 知识图谱 ==");
    let stats = graph.get_stats();
    println!(
        "{} 个实体, {} 个关系",
        stats.total_entities, stats.total_relations
    );
    for (entity_type, count) in &stats.entity_types {
        println!(
            "  {}: {}",
            engine.ontology().entity_label(*entity_type),
            count
        );
    }

    println!();
    println!("== 实体搜索: 肥料 ==");
    for hit in graph.search_entities("肥料", config.search.default_limit) {
        println!("  {:>3}  {}", hit.score, hit.entity.description);
    }

    println!();
    println!("== 智能问答 ==");
    let answerer = AssistedAnswerer::from_config(&config.qa);
    for question in demo::SAMPLE_QUESTIONS {
        let result = answerer.answer(question, &graph).await;
        println!("问: {question}");
        println!("答: {} [{}]", result.answer, result.intent);
    }

    Ok(())
}
