use crate::session::CommitFailurePolicy;
use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::net::SocketAddr;
use std::path::Path;
use url::Url;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:9092";
pub const API_URL_ENV: &str = "PUPPYSHARE_API_URL";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
	/// Base URL of the node's JSON API.
	pub api_url: Url,
	pub commit_policy: CommitFailurePolicy,
	/// Where to serve the local HTTP API, if at all.
	pub http: Option<SocketAddr>,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			api_url: Url::parse(DEFAULT_API_URL).expect("default api url is valid"),
			commit_policy: CommitFailurePolicy::default(),
			http: None,
		}
	}
}

impl Config {
	/// Reads `path` if given, then applies `PUPPYSHARE_API_URL`.
	pub fn load(path: Option<&Path>) -> Result<Self> {
		let mut config = match path {
			Some(path) => Self::from_file(path)?,
			None => Self::default(),
		};
		if let Ok(value) = env::var(API_URL_ENV) {
			let trimmed = value.trim();
			if !trimmed.is_empty() {
				config.api_url = Url::parse(trimmed)
					.with_context(|| format!("invalid {API_URL_ENV} value {trimmed:?}"))?;
			}
		}
		Ok(config)
	}

	pub fn from_file(path: &Path) -> Result<Self> {
		let data = std::fs::read_to_string(path)
			.with_context(|| format!("failed to read config {}", path.display()))?;
		Self::from_json(&data).with_context(|| format!("invalid config {}", path.display()))
	}

	pub fn from_json(data: &str) -> Result<Self> {
		let config: Config = serde_json::from_str(data)?;
		match config.api_url.scheme() {
			"http" | "https" => Ok(config),
			other => Err(anyhow!("unsupported api_url scheme {other:?}")),
		}
	}
}
