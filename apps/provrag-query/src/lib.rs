use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use provrag_service::{HybridSearchRequest, RetrievalService};

#[derive(Debug, Parser)]
#[command(
	version = provrag_cli::VERSION,
	rename_all = "kebab",
	styles = provrag_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
#[command(rename_all = "kebab")]
pub enum Command {
	/// Blend semantic and graph candidates into one ranked list.
	Hybrid {
		query: String,
		#[arg(long, short = 'e')]
		entity: Option<String>,
		#[arg(long, short = 'l', allow_negative_numbers = true)]
		limit: Option<i64>,
		#[arg(long, allow_negative_numbers = true)]
		max_depth: Option<i64>,
		/// Skip the provenance trail even when an entity is given.
		#[arg(long)]
		no_provenance: bool,
	},
	Semantic {
		query: String,
		#[arg(long, short = 'l', default_value_t = 10, allow_negative_numbers = true)]
		limit: i64,
	},
	Graph {
		query: String,
		#[arg(long, short = 'e')]
		entity: Option<String>,
		#[arg(long, default_value_t = 3, allow_negative_numbers = true)]
		max_depth: i64,
	},
	Provenance {
		entity: String,
	},
	/// Show configured collaborators and scoring weights.
	Status,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = provrag_config::load(&args.config)?;

	init_tracing(&config)?;

	let service = RetrievalService::from_config(config);
	let output = execute(&service, args.command).await?;

	println!("{}", serde_json::to_string_pretty(&output)?);

	Ok(())
}

pub async fn execute(service: &RetrievalService, command: Command) -> color_eyre::Result<Value> {
	let output = match command {
		Command::Hybrid { query, entity, limit, max_depth, no_provenance } => {
			let req = HybridSearchRequest {
				query,
				entity,
				limit,
				include_provenance: !no_provenance,
				max_graph_depth: max_depth,
			};

			serde_json::to_value(service.hybrid_search(req).await?)?
		},
		Command::Semantic { query, limit } =>
			serde_json::to_value(service.semantic_search(&query, limit).await?)?,
		Command::Graph { query, entity, max_depth } => {
			let records = service.graph_search(&query, entity.as_deref(), max_depth).await?;

			serde_json::to_value(records)?
		},
		Command::Provenance { entity } =>
			serde_json::to_value(service.resolve_provenance(&entity).await)?,
		Command::Status => serde_json::to_value(service.status())?,
	};

	Ok(output)
}

fn init_tracing(config: &provrag_config::Config) -> color_eyre::Result<()> {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
	tracing::debug!(log_level = %config.service.log_level, "Tracing initialized.");

	Ok(())
}
