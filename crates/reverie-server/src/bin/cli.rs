//! Reverie CLI
//!
//! Command-line interface for populating a journal database and exploring
//! the relationships between its memories.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use colored::Colorize;
use reverie_core::{
    GraphQuery, ManualRelationInput, Memory, MemoryStore, Mood, NewMemory, RelationshipGraph,
    TimeRange,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use reverie_server::engine::{self, EmbedderKind, Engine};

/// Reverie - Memory Relationship Engine CLI
#[derive(Parser)]
#[command(name = "reverie")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "CLI for the Reverie memory relationship engine")]
#[command(long_about = "Reverie connects journal entries by meaning, time, people and mood.\n\nIt builds a weighted relationship graph and groups related memories into themed clusters.")]
struct Cli {
    /// Custom data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Embedding model: hashing or local
    #[arg(long, global = true, default_value = "hashing")]
    embedder: EmbedderKind,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a user
    User {
        /// User id
        id: String,
        /// Display name
        #[arg(long)]
        name: Option<String>,
    },

    /// Write a memory
    Add {
        /// Owning user
        user: String,
        /// Memory text
        text: String,
        /// Mood (happy, sad, angry, calm, neutral)
        #[arg(long)]
        mood: Option<Mood>,
        /// Tags (comma-separated)
        #[arg(long)]
        tags: Option<String>,
        /// Creation time (RFC 3339), defaults to now
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },

    /// Import memories from a JSON array file
    Import {
        /// Owning user
        user: String,
        /// Path to the JSON file
        file: PathBuf,
    },

    /// Show the relationship graph
    Graph {
        user: String,
        /// Time range: week, month, year or all
        #[arg(long, default_value = "all")]
        range: TimeRange,
        /// Minimum relationship strength
        #[arg(long)]
        min_strength: Option<f64>,
        /// Print the graph as JSON
        #[arg(long)]
        json: bool,
    },

    /// Detect (or list stored) memory clusters
    Clusters {
        user: String,
        /// Show the last detected clusters without recomputing
        #[arg(long)]
        stored: bool,
        /// Time range: week, month, year or all
        #[arg(long, default_value = "all")]
        range: TimeRange,
        /// Minimum relationship strength
        #[arg(long)]
        min_strength: Option<f64>,
    },

    /// Manually relate two memories
    Relate {
        user: String,
        source: String,
        target: String,
        /// Relationship strength (0-1)
        #[arg(long, default_value = "0.8")]
        strength: f64,
    },

    /// Find the closest chain of memories between two memories
    Path {
        user: String,
        source: String,
        target: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let engine = engine::open(cli.data_dir, cli.embedder).await?;

    match cli.command {
        Commands::User { id, name } => run_user(&engine, id, name),
        Commands::Add {
            user,
            text,
            mood,
            tags,
            at,
        } => run_add(&engine, user, text, mood, tags, at),
        Commands::Import { user, file } => run_import(&engine, user, file),
        Commands::Graph {
            user,
            range,
            min_strength,
            json,
        } => run_graph(&engine, user, range, min_strength, json).await,
        Commands::Clusters {
            user,
            stored,
            range,
            min_strength,
        } => run_clusters(&engine, user, stored, range, min_strength).await,
        Commands::Relate {
            user,
            source,
            target,
            strength,
        } => run_relate(&engine, user, source, target, strength),
        Commands::Path {
            user,
            source,
            target,
        } => run_path(&engine, user, source, target).await,
    }
}

/// Cancel on Ctrl-C
fn interrupt_token() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            child.cancel();
        }
    });
    token
}

fn run_user(engine: &Engine, id: String, name: Option<String>) -> anyhow::Result<()> {
    let user = engine.store.create_user(&id, name.as_deref())?;

    println!("{}", "=== Reverie User ===".cyan().bold());
    println!();
    println!("{}: {}", "User ID".white().bold(), user.id);
    if let Some(name) = &user.display_name {
        println!("{}: {}", "Name".white().bold(), name);
    }
    println!(
        "{}: {}",
        "Registered".white().bold(),
        user.created_at.format("%Y-%m-%d %H:%M:%S")
    );
    Ok(())
}

fn run_add(
    engine: &Engine,
    user: String,
    text: String,
    mood: Option<Mood>,
    tags: Option<String>,
    at: Option<DateTime<Utc>>,
) -> anyhow::Result<()> {
    if text.trim().is_empty() {
        anyhow::bail!("Memory text cannot be empty");
    }
    if !engine.store.user_exists(&user)? {
        anyhow::bail!("Unknown user '{}'. Register it with: reverie user {}", user, user);
    }

    let tag_list: Vec<String> = tags
        .as_deref()
        .map(|t| {
            t.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let mut input = NewMemory::new(&user, text).with_tags(tag_list);
    if let Some(mood) = mood {
        input = input.with_mood(mood);
    }
    if let Some(at) = at {
        input = input.at(at);
    }

    let memory = engine.store.insert_memory(input)?;
    println!("{}", "=== Reverie Add ===".cyan().bold());
    println!();
    println!("{}: {}", "Memory ID".white().bold(), memory.id);
    println!(
        "{}",
        format!("Memory saved ({})", memory.preview(60)).green().bold()
    );
    Ok(())
}

fn run_import(engine: &Engine, user: String, file: PathBuf) -> anyhow::Result<()> {
    if !engine.store.user_exists(&user)? {
        anyhow::bail!("Unknown user '{}'. Register it with: reverie user {}", user, user);
    }

    let raw = std::fs::read_to_string(&file)?;
    let entries: Vec<NewMemory> = serde_json::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("{} is not a JSON array of memories: {}", file.display(), e))?;

    println!("{}", "=== Reverie Import ===".cyan().bold());
    println!();
    println!("{}: {}", "File".white().bold(), file.display());
    println!("{}: {}", "Entries".white().bold(), entries.len());

    let mut imported = 0usize;
    let mut skipped = 0usize;
    for mut entry in entries {
        entry.user_id = user.clone();
        if entry.text.trim().is_empty() {
            skipped += 1;
            continue;
        }
        engine.store.insert_memory(entry)?;
        imported += 1;
    }

    println!();
    println!("{}: {}", "Imported".green().bold(), imported);
    if skipped > 0 {
        println!("{}: {} (empty text)", "Skipped".yellow().bold(), skipped);
    }
    Ok(())
}

async fn run_graph(
    engine: &Engine,
    user: String,
    range: TimeRange,
    min_strength: Option<f64>,
    json: bool,
) -> anyhow::Result<()> {
    let mut query = GraphQuery::new(range);
    query.min_strength = min_strength;

    let view = engine
        .service
        .graph(&user, &query, &interrupt_token())
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    let graph = &view.graph;
    println!("{}", "=== Reverie Relationship Graph ===".cyan().bold());
    println!();
    println!("{}: {}", "Time Range".white().bold(), range.as_str());
    println!("{}: {}", "Memories".white().bold(), graph.stats.total_memories);
    println!("{}: {}", "Connections".white().bold(), graph.stats.total_connections);
    println!(
        "{}: {:.2}",
        "Average Strength".white().bold(),
        graph.stats.avg_connection_strength
    );

    if graph.edges.is_empty() {
        println!();
        println!("{}", "No relationships above the threshold.".dimmed());
        return Ok(());
    }

    println!();
    let mut edges: Vec<_> = graph.edges.iter().collect();
    edges.sort_by(|a, b| b.strength.total_cmp(&a.strength));
    for edge in edges {
        let reasons: Vec<&str> = edge.reasons.iter().map(|r| r.as_str()).collect();
        println!(
            "  {:.2} {:<12} {} <-> {} {}",
            edge.strength,
            edge.kind.as_str().yellow(),
            preview(graph, &edge.source_id),
            preview(graph, &edge.target_id),
            format!("[{}]", reasons.join(", ")).dimmed()
        );
    }
    Ok(())
}

async fn run_clusters(
    engine: &Engine,
    user: String,
    stored: bool,
    range: TimeRange,
    min_strength: Option<f64>,
) -> anyhow::Result<()> {
    let clusters = if stored {
        engine.service.stored_clusters(&user)?
    } else {
        engine
            .service
            .detect_clusters(&user, range, min_strength, &interrupt_token())
            .await?
    };

    println!("{}", "=== Reverie Clusters ===".cyan().bold());
    println!();
    if clusters.is_empty() {
        println!("{}", "No clusters found.".dimmed());
        return Ok(());
    }

    let memories = engine.store.memories_for_user(&user, None)?;
    for cluster in &clusters {
        println!(
            "{} ({} memories)",
            cluster.name.white().bold(),
            cluster.len()
        );
        println!("  {}: {}", "Theme".cyan(), cluster.theme);
        if let Some(mood) = cluster.dominant_mood {
            println!("  {}: {}", "Mood".cyan(), mood.as_str());
        }
        println!("  {}", cluster.summary.dimmed());
        for id in &cluster.member_ids {
            let text = find(&memories, id)
                .map(|m| m.preview(60))
                .unwrap_or_else(|| id.clone());
            println!("    - {}", text);
        }
        println!();
    }
    Ok(())
}

fn run_relate(
    engine: &Engine,
    user: String,
    source: String,
    target: String,
    strength: f64,
) -> anyhow::Result<()> {
    let relationship = engine.service.relate(
        &user,
        ManualRelationInput {
            source_id: source,
            target_id: target,
            strength,
        },
    )?;

    println!("{}", "=== Reverie Relate ===".cyan().bold());
    println!();
    println!("{}: {}", "Source".white().bold(), relationship.source_id);
    println!("{}: {}", "Target".white().bold(), relationship.target_id);
    println!("{}: {:.2}", "Strength".white().bold(), relationship.strength);
    println!("{}", "Relationship saved".green().bold());
    Ok(())
}

async fn run_path(
    engine: &Engine,
    user: String,
    source: String,
    target: String,
) -> anyhow::Result<()> {
    let path = engine
        .service
        .path(&user, &source, &target, &interrupt_token())
        .await?;

    println!("{}", "=== Reverie Path ===".cyan().bold());
    println!();
    let Some(path) = path else {
        println!("{}", "No path found between these memories.".yellow());
        return Ok(());
    };

    let memories = engine.store.memories_for_user(&user, None)?;
    println!(
        "{}: {} hop(s), cost {:.2}",
        "Path".white().bold(),
        path.hops,
        path.total_cost
    );
    for (i, id) in path.memory_ids.iter().enumerate() {
        let text = find(&memories, id)
            .map(|m| m.preview(60))
            .unwrap_or_else(|| id.clone());
        println!("  {}. {}", i + 1, text);
    }
    Ok(())
}

fn find<'a>(memories: &'a [Memory], id: &str) -> Option<&'a Memory> {
    memories.iter().find(|m| m.id == id)
}

fn preview(graph: &RelationshipGraph, id: &str) -> String {
    find(&graph.nodes, id)
        .map(|m| format!("\"{}\"", m.preview(30)))
        .unwrap_or_else(|| id.to_string())
}
