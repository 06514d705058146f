use clap::Parser;
use puppyshare_core::CommitFailurePolicy;
use std::net::SocketAddr;
use std::path::PathBuf;
use url::Url;

#[derive(Debug, Parser)]
#[clap(name = "puppyshare")]
pub struct Args {
	/// JSON config file
	#[clap(long, value_name = "PATH")]
	pub config: Option<PathBuf>,
	/// Base URL of the node's JSON API
	#[clap(long, value_name = "URL")]
	pub api: Option<Url>,
	/// diverge, stay-editing, refetch or retry:N
	#[clap(long, value_name = "POLICY")]
	pub commit_policy: Option<CommitFailurePolicy>,
	#[clap(long, default_value = "info")]
	pub log_level: log::Level,
	/// Keep shared directories in this process instead of a node
	#[clap(long)]
	pub memory: bool,
	#[clap(subcommand)]
	pub command: Command,
}

#[derive(Debug, Parser)]
pub enum Command {
	List,
	Groups,
	Add {
		path: String,
	},
	Set {
		index: usize,
		#[clap(long)]
		path: Option<String>,
		#[clap(long)]
		name: Option<String>,
		#[clap(long, conflicts_with_all = ["search", "download", "browse"])]
		mask: Option<u32>,
		#[clap(long)]
		search: Option<bool>,
		#[clap(long)]
		download: Option<bool>,
		#[clap(long)]
		browse: Option<bool>,
		#[clap(long = "group", value_name = "ID")]
		groups: Vec<String>,
		#[clap(long, conflicts_with = "groups")]
		all_groups: bool,
	},
	Serve {
		#[clap(long, value_name = "ADDR")]
		http: Option<SocketAddr>,
	},
}
