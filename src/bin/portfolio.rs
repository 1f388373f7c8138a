//! Portfolio CLI: drain CMS collections and inspect access data.
//!
//! Usage:
//!   portfolio fetch <collection> [--role R] [--user U] [--department D]
//!   portfolio members [file]
//!   portfolio normalize-id <json>

use clap::{Parser, Subcommand};
use portfolio::{
    extract_internal_member_ids, filter_visible, normalize_id, Aggregator, Collection,
    EnvCredential, GraphqlClient, PortfolioConfig, QueryVariables, RelationFilter, Role, Viewer,
};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "portfolio",
    version,
    about = "Research-portfolio CMS client"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every record of a collection and print those the viewer may see
    Fetch {
        /// projects, funds, conferences, publications or books
        collection: Collection,
        /// Viewer role (faculty, admin, super_admin)
        #[arg(long, default_value = "super_admin")]
        role: Role,
        /// Viewer user id
        #[arg(long)]
        user: Option<String>,
        /// Viewer department id
        #[arg(long)]
        department: Option<String>,
        /// Sort expression, repeatable (e.g. title:asc)
        #[arg(long)]
        sort: Vec<String>,
        /// Filters as a JSON object
        #[arg(long)]
        filters: Option<String>,
        /// Records per page
        #[arg(long)]
        page_size: Option<usize>,
        /// GraphQL endpoint
        #[arg(long)]
        endpoint: Option<String>,
        /// Path to the YAML configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print internal member ids from a partners payload
    Members {
        /// File holding the payload; stdin when omitted
        file: Option<PathBuf>,
    },
    /// Print the canonical form of an identifier given as JSON
    NormalizeId {
        /// e.g. 42, "abc" or {"documentId":"abc"}
        value: String,
    },
}

struct FetchArgs {
    collection: Collection,
    viewer: Viewer,
    sort: Vec<String>,
    filters: Option<String>,
    page_size: Option<usize>,
    endpoint: Option<String>,
    config: Option<PathBuf>,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_fetch(args: FetchArgs) -> i32 {
    let mut config = match PortfolioConfig::load(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    if let Some(endpoint) = args.endpoint {
        config.endpoint = endpoint;
    }
    if let Some(page_size) = args.page_size {
        config.page_size = page_size;
    }
    let config = match config.validate() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let mut variables = QueryVariables::new().with_sort(args.sort);
    if let Some(raw) = args.filters {
        match serde_json::from_str(&raw) {
            Ok(filters) => variables = variables.with_filters(filters),
            Err(e) => {
                eprintln!("Error: --filters is not valid JSON: {}", e);
                return 1;
            }
        }
    }

    let client = match GraphqlClient::new(
        config.endpoint.clone(),
        config.timeout(),
        Arc::new(EnvCredential::new(config.token_env.clone())),
    ) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to create tokio runtime: {}", e);
            return 1;
        }
    };

    let aggregator = Aggregator::new(
        Arc::new(client),
        args.collection.query(),
        variables,
        config.page_size,
    );
    let snapshot = match rt.block_on(aggregator.run()) {
        Ok(s) => s,
        Err(e) => {
            let partial = aggregator.handle().snapshot();
            eprintln!(
                "Error: failed to load {} after {} page(s): {}",
                args.collection, partial.pages_fetched, e
            );
            return 1;
        }
    };

    let filter = RelationFilter::with_relations(config.relations.iter().cloned());
    let visible = filter_visible(snapshot.records(args.collection.root_field()), &args.viewer, &filter);
    match serde_json::to_string_pretty(&visible) {
        Ok(json) => {
            println!("{}", json);
            eprintln!(
                "{} of {} {} visible to {}",
                visible.len(),
                snapshot.records(args.collection.root_field()).len(),
                args.collection,
                args.viewer.role
            );
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_members(file: Option<PathBuf>) -> i32 {
    let text = match file {
        Some(path) => match std::fs::read_to_string(&path) {
            Ok(t) => t,
            Err(e) => {
                eprintln!("Error: cannot read '{}': {}", path.display(), e);
                return 1;
            }
        },
        None => {
            let mut buf = String::new();
            if let Err(e) = std::io::stdin().read_to_string(&mut buf) {
                eprintln!("Error: cannot read stdin: {}", e);
                return 1;
            }
            buf
        }
    };
    // Either a JSON array/string, or the bare text of a stringified list
    let payload = serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text));
    for id in extract_internal_member_ids(&payload) {
        println!("{}", id);
    }
    0
}

fn cmd_normalize_id(value: &str) -> i32 {
    let parsed = serde_json::from_str(value).unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    match normalize_id(&parsed) {
        Some(id) => {
            println!("{}", id);
            0
        }
        None => {
            eprintln!("Error: no identifier in {}", value);
            1
        }
    }
}

fn main() {
    init_logging();
    let cli = Cli::parse();
    let code = match cli.command {
        Commands::Fetch {
            collection,
            role,
            user,
            department,
            sort,
            filters,
            page_size,
            endpoint,
            config,
        } => cmd_fetch(FetchArgs {
            collection,
            viewer: Viewer {
                role,
                user_id: user,
                department_id: department,
            },
            sort,
            filters,
            page_size,
            endpoint,
            config,
        }),
        Commands::Members { file } => cmd_members(file),
        Commands::NormalizeId { value } => cmd_normalize_id(&value),
    };
    std::process::exit(code);
}
