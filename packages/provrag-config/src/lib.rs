mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, Graph, GraphBackendKind, Neo4j, Providers, Retrieval, RetrievalWeights,
	SemanticProviderConfig, SemanticProviderKind, Service,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
		});
	}

	for (label, provider) in [
		("providers.semantic_primary", cfg.providers.semantic_primary.as_ref()),
		("providers.semantic_secondary", cfg.providers.semantic_secondary.as_ref()),
	] {
		let Some(provider) = provider else { continue };

		validate_semantic_provider(label, provider)?;
	}

	if cfg.providers.semantic_primary.is_none() && cfg.providers.semantic_secondary.is_some() {
		return Err(Error::Validation {
			message: "providers.semantic_secondary requires providers.semantic_primary.".to_string(),
		});
	}

	match (cfg.graph.backend, cfg.graph.neo4j.as_ref()) {
		(GraphBackendKind::Neo4j, None) => {
			return Err(Error::Validation {
				message: "graph.neo4j must be set when graph.backend is neo4j.".to_string(),
			});
		},
		(GraphBackendKind::Neo4j, Some(neo4j)) => {
			for (label, value) in [
				("graph.neo4j.url", &neo4j.url),
				("graph.neo4j.database", &neo4j.database),
				("graph.neo4j.user", &neo4j.user),
			] {
				if value.trim().is_empty() {
					return Err(Error::Validation {
						message: format!("{label} must be non-empty."),
					});
				}
			}
			if neo4j.timeout_ms == 0 {
				return Err(Error::Validation {
					message: "graph.neo4j.timeout_ms must be greater than zero.".to_string(),
				});
			}
		},
		_ => {},
	}

	let retrieval = &cfg.retrieval;

	for (label, value) in [
		("retrieval.default_limit", retrieval.default_limit),
		("retrieval.default_max_graph_depth", retrieval.default_max_graph_depth),
		("retrieval.max_graph_depth_cap", retrieval.max_graph_depth_cap),
		("retrieval.semantic_headroom", retrieval.semantic_headroom),
		("retrieval.graph_candidate_limit", retrieval.graph_candidate_limit),
		("retrieval.global_scan_depth", retrieval.global_scan_depth),
		("retrieval.provenance_max_hops", retrieval.provenance_max_hops),
		("retrieval.provenance_max_edges", retrieval.provenance_max_edges),
	] {
		if value == 0 {
			return Err(Error::Validation {
				message: format!("{label} must be greater than zero."),
			});
		}
	}

	if retrieval.default_max_graph_depth > retrieval.max_graph_depth_cap {
		return Err(Error::Validation {
			message: "retrieval.default_max_graph_depth must not exceed retrieval.max_graph_depth_cap."
				.to_string(),
		});
	}
	if retrieval.backend_timeout_ms == 0 {
		return Err(Error::Validation {
			message: "retrieval.backend_timeout_ms must be greater than zero.".to_string(),
		});
	}

	let weights = &retrieval.weights;

	for (label, value) in [
		("retrieval.weights.semantic", weights.semantic),
		("retrieval.weights.graph", weights.graph),
		("retrieval.weights.graph_only_bonus", weights.graph_only_bonus),
		("retrieval.weights.custody_bonus", weights.custody_bonus),
		("retrieval.weights.rank_decay", weights.rank_decay),
	] {
		if !value.is_finite() {
			return Err(Error::Validation { message: format!("{label} must be a finite number.") });
		}
		if value < 0.0 {
			return Err(Error::Validation { message: format!("{label} must be zero or greater.") });
		}
	}

	Ok(())
}

fn validate_semantic_provider(label: &str, provider: &SemanticProviderConfig) -> Result<()> {
	for (field, value) in [("api_base", &provider.api_base), ("api_key", &provider.api_key)] {
		if value.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("{label}.{field} must be non-empty."),
			});
		}
	}

	if provider.timeout_ms == 0 {
		return Err(Error::Validation {
			message: format!("{label}.timeout_ms must be greater than zero."),
		});
	}
	if provider.default_headers.values().any(|value| !value.is_string()) {
		return Err(Error::Validation {
			message: format!("{label}.default_headers values must be strings."),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	for provider in
		[cfg.providers.semantic_primary.as_mut(), cfg.providers.semantic_secondary.as_mut()]
			.into_iter()
			.flatten()
	{
		provider.api_base = provider.api_base.trim_end_matches('/').to_string();

		if provider.user_id.as_deref().map(|id| id.trim().is_empty()).unwrap_or(false) {
			provider.user_id = None;
		}
	}

	if let Some(neo4j) = cfg.graph.neo4j.as_mut() {
		neo4j.url = neo4j.url.trim_end_matches('/').to_string();
	}
}
