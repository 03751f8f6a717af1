//! CLI: question answering plus corpus and cache maintenance commands

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde_json::json;

use crate::domain::document::DocumentMetadata;
use crate::{create_pipeline, AppConfig, Pipeline};

/// finsearch - financial research over SEC filings with semantic caching
#[derive(Parser)]
#[command(name = "finsearch")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Answer a question from the indexed corpus
    Query(QueryArgs),

    /// Add a document to the corpus
    AddDoc(AddDocArgs),

    /// List indexed documents
    ListDocs(ListDocsArgs),

    /// Seed the bundled sample 10-K corpus
    Seed,

    /// Show semantic cache statistics
    CacheStats,

    /// Clear the semantic cache
    CacheClear,
}

#[derive(Args)]
pub struct QueryArgs {
    /// The question to answer
    pub question: String,

    /// Allow live web search for recency-sensitive questions
    #[arg(long)]
    pub web: bool,
}

#[derive(Args)]
pub struct AddDocArgs {
    /// Read document content from a file
    #[arg(long, conflicts_with = "text")]
    pub file: Option<PathBuf>,

    /// Document content given inline
    #[arg(long)]
    pub text: Option<String>,

    /// Company name stored in metadata
    #[arg(long)]
    pub company: Option<String>,

    /// Title stored in metadata
    #[arg(long)]
    pub title: Option<String>,
}

#[derive(Args)]
pub struct ListDocsArgs {
    /// Maximum number of documents to list
    #[arg(long, default_value_t = 20)]
    pub limit: usize,
}

/// Load configuration, build the pipeline and dispatch the command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    crate::infrastructure::logging::init_logging(&config.logging);

    let pipeline = create_pipeline(&config).await?;

    match cli.command {
        Command::Query(args) => query(&pipeline, args).await,
        Command::AddDoc(args) => add_doc(&pipeline, args).await,
        Command::ListDocs(args) => list_docs(&pipeline, args).await,
        Command::Seed => seed(&pipeline).await,
        Command::CacheStats => cache_stats(&pipeline).await,
        Command::CacheClear => cache_clear(&pipeline).await,
    }
}

async fn query(pipeline: &Pipeline, args: QueryArgs) -> anyhow::Result<()> {
    let outcome = pipeline.search.query(&args.question, args.web).await?;

    println!("{}", outcome.answer);
    println!();

    if !outcome.sources.is_empty() {
        println!("Sources:");
        for source in &outcome.sources {
            println!("  - {} (score {:.3})", source.title, source.score);
        }
    }

    let mut notes = vec![format!("{:.2}s", outcome.response_time_seconds)];
    if outcome.cache_hit {
        notes.push("cache hit".to_string());
    }
    if let Some(decision) = outcome.routing_decision {
        notes.push(format!("routed: {}", decision.as_str()));
    }
    if outcome.web_search_used {
        notes.push("web search used".to_string());
    }
    println!("[{}]", notes.join(", "));

    Ok(())
}

async fn add_doc(pipeline: &Pipeline, args: AddDocArgs) -> anyhow::Result<()> {
    let content = match (&args.file, args.text) {
        (Some(path), _) => std::fs::read_to_string(path)?,
        (None, Some(text)) => text,
        (None, None) => anyhow::bail!("either --file or --text is required"),
    };

    let mut metadata = DocumentMetadata::new();
    if let Some(company) = args.company {
        metadata.insert("company".to_string(), json!(company));
    }
    if let Some(title) = args.title {
        metadata.insert("title".to_string(), json!(title));
    }

    let id = pipeline.retriever.upload_text(content, metadata).await?;

    println!("Added document {}", id);

    Ok(())
}

async fn list_docs(pipeline: &Pipeline, args: ListDocsArgs) -> anyhow::Result<()> {
    let documents = pipeline.retriever.list(args.limit).await?;

    if documents.is_empty() {
        println!("No documents indexed.");
        return Ok(());
    }

    for document in &documents {
        println!(
            "{}  {}  {}",
            document.id(),
            document.display_title(),
            document.content_preview(80)
        );
    }
    println!("{} document(s)", documents.len());

    Ok(())
}

async fn seed(pipeline: &Pipeline) -> anyhow::Result<()> {
    let added = pipeline.retriever.seed_sample_data().await?;

    if added == 0 {
        println!("Document store already populated; nothing to seed.");
    } else {
        println!("Seeded {} sample documents.", added);
    }

    Ok(())
}

async fn cache_stats(pipeline: &Pipeline) -> anyhow::Result<()> {
    let stats = pipeline.cache.stats().await?;

    println!("Entries:  {}", stats.total_entries);
    println!("Hits:     {}", stats.total_hits);
    println!("Hit rate: {:.1}%", stats.hit_rate * 100.0);

    Ok(())
}

async fn cache_clear(pipeline: &Pipeline) -> anyhow::Result<()> {
    if pipeline.cache.clear().await? {
        println!("Cache cleared.");
    } else {
        println!("Cache partially cleared; some entries could not be removed.");
    }

    Ok(())
}
