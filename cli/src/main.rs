use anyhow::{Result, bail};
use args::Command;
use clap::Parser;
use puppyshare_core::view::{render_text, share_table};
use puppyshare_core::{
	Config, DirectoryEdit, EditSession, GroupId, MemoryGateway, PuppyShare, ShareFlag,
	Visibility, http_api,
};
use std::sync::Arc;

mod args;

#[tokio::main]
async fn main() {
	let args = args::Args::parse();
	if let Err(err) = simple_logger::init_with_level(args.log_level) {
		eprintln!("failed to init logger: {err}");
	}

	let mut config = match Config::load(args.config.as_deref()) {
		Ok(config) => config,
		Err(err) => {
			log::error!("failed to load config: {err:?}");
			std::process::exit(1);
		}
	};
	if let Some(api) = &args.api {
		config.api_url = api.clone();
	}
	if let Some(policy) = args.commit_policy {
		config.commit_policy = policy;
	}

	let share = if args.memory {
		log::info!("keeping shared directories in memory");
		let session = EditSession::new(Arc::new(MemoryGateway::new()))
			.with_policy(config.commit_policy);
		PuppyShare::start(session)
	} else {
		PuppyShare::connect(&config)
	};
	let share = Arc::new(share);

	if let Err(err) = share.initialize().await {
		match &args.command {
			Command::Serve { .. } => log::warn!("starting with an empty list: {err}"),
			_ => {
				log::error!("failed to load shared directories: {err}");
				std::process::exit(1);
			}
		}
	}

	if let Err(err) = run(&args.command, &share, &config).await {
		log::error!("{err:?}");
		std::process::exit(1);
	}

	if let Ok(share) = Arc::try_unwrap(share) {
		share.shutdown().await;
	}
}

async fn run(command: &Command, share: &Arc<PuppyShare>, config: &Config) -> Result<()> {
	match command {
		Command::List => print_table(share).await,
		Command::Groups => {
			let snapshot = share.snapshot().await?;
			for entry in snapshot.catalog.entries() {
				println!("{}  {}", entry.id, entry.label);
			}
			Ok(())
		}
		Command::Add { path } => {
			share.add_path(path.trim()).await?;
			log::info!("Successfully Added Directory to Shared List");
			print_table(share).await
		}
		Command::Set {
			index,
			path,
			name,
			mask,
			search,
			download,
			browse,
			groups,
			all_groups,
		} => {
			let mut edits = Vec::new();
			if let Some(path) = path {
				edits.push(DirectoryEdit::Path(path.clone()));
			}
			if let Some(name) = name {
				edits.push(DirectoryEdit::DisplayName(name.clone()));
			}
			if let Some(mask) = mask {
				edits.push(DirectoryEdit::PermissionMask(*mask));
			}
			for (flag, value) in [
				(ShareFlag::AnonymousSearch, search),
				(ShareFlag::AnonymousDownload, download),
				(ShareFlag::AnonymousBrowse, browse),
			] {
				if let Some(enabled) = value {
					edits.push(DirectoryEdit::Flag {
						flag,
						enabled: *enabled,
					});
				}
			}
			if *all_groups {
				edits.push(DirectoryEdit::Visibility(Visibility::All));
			} else if !groups.is_empty() {
				let ids = groups.iter().map(|g| GroupId::new(g.trim()));
				edits.push(DirectoryEdit::Visibility(Visibility::restricted(ids)));
			}
			if edits.is_empty() {
				bail!("nothing to change for directory {index}");
			}

			share.begin_edit().await?;
			for edit in edits {
				share.update_field(*index, edit).await?;
			}
			share.commit().await?;
			print_table(share).await
		}
		Command::Serve { http } => {
			let Some(addr) = http.or(config.http) else {
				bail!("no HTTP address; pass --http or set \"http\" in the config");
			};
			http_api::serve(Arc::clone(share), addr).await
		}
	}
}

async fn print_table(share: &PuppyShare) -> Result<()> {
	let snapshot = share.snapshot().await?;
	print!(
		"{}",
		render_text(&share_table(snapshot.mode, &snapshot.dirs, &snapshot.catalog))
	);
	Ok(())
}
