use crate::app::{App, Command, SessionSnapshot};
use crate::config::Config;
use crate::directory::SharedDirectory;
use crate::error::{Result, ShareError};
use crate::groups::GroupId;
use crate::remote::JsonApiGateway;
use crate::session::{EditMode, EditSession};
use crate::store::DirectoryEdit;
use std::sync::Arc;
use tokio::sync::{mpsc::UnboundedSender, oneshot};
use tokio::task::JoinHandle;

/// Handle to a running share manager. Cloning the command queue is cheap;
/// share the handle itself behind an `Arc`.
pub struct PuppyShare {
	shutdown_tx: Option<oneshot::Sender<()>>,
	handle: JoinHandle<()>,
	cmd_tx: UnboundedSender<Command>,
}

impl PuppyShare {
	/// Spawns the session task. Must be called from within a tokio runtime.
	pub fn start(session: EditSession) -> Self {
		let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
		let (mut app, cmd_tx) = App::new(session);
		let handle = tokio::spawn(async move {
			loop {
				tokio::select! {
					_ = &mut shutdown_rx => {
						log::info!("share manager shutting down");
						break;
					}
					running = app.run() => {
						if !running {
							break;
						}
					}
				}
			}
		});
		PuppyShare {
			shutdown_tx: Some(shutdown_tx),
			handle,
			cmd_tx,
		}
	}

	/// Starts a session against the node's JSON API described by `config`.
	pub fn connect(config: &Config) -> Self {
		let gateway = Arc::new(JsonApiGateway::new(config.api_url.clone()));
		log::info!("using node API at {}", config.api_url);
		Self::start(EditSession::new(gateway).with_policy(config.commit_policy))
	}

	async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
		let (tx, rx) = oneshot::channel();
		self.cmd_tx
			.send(make(tx))
			.map_err(|_| ShareError::SessionClosed)?;
		rx.await.map_err(|_| ShareError::SessionClosed)
	}

	pub async fn snapshot(&self) -> Result<SessionSnapshot> {
		self.request(|tx| Command::Snapshot { tx }).await
	}

	pub async fn initialize(&self) -> Result<usize> {
		self.request(|tx| Command::Initialize { tx }).await?
	}

	pub async fn refresh(&self) -> Result<usize> {
		self.request(|tx| Command::Refresh { tx }).await?
	}

	pub async fn begin_edit(&self) -> Result<bool> {
		self.request(|tx| Command::BeginEdit { tx }).await
	}

	pub async fn commit(&self) -> Result<()> {
		self.request(|tx| Command::Commit { tx }).await?
	}

	pub async fn toggle_edit(&self) -> Result<EditMode> {
		self.request(|tx| Command::ToggleEdit { tx }).await?
	}

	pub async fn update_field(&self, index: usize, edit: DirectoryEdit) -> Result<()> {
		self.request(|tx| Command::UpdateField { index, edit, tx })
			.await?
	}

	pub async fn toggle_group(&self, index: usize, group: GroupId) -> Result<()> {
		self.update_field(index, DirectoryEdit::ToggleGroup(group))
			.await
	}

	pub async fn add(&self, entry: SharedDirectory) -> Result<()> {
		self.request(|tx| Command::Add { entry, tx }).await?
	}

	pub async fn add_path(&self, path: impl Into<String>) -> Result<()> {
		self.add(SharedDirectory::new(path)).await
	}

	/// Stops the session task. Edits not yet committed are dropped.
	pub async fn shutdown(mut self) {
		if let Some(tx) = self.shutdown_tx.take() {
			let _ = tx.send(());
		}
		if let Err(e) = self.handle.await {
			log::error!("task join error: {e}");
		}
	}
}
