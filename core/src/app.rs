use crate::directory::SharedDirectory;
use crate::error::Result;
use crate::groups::GroupCatalog;
use crate::session::{EditMode, EditSession};
use crate::store::DirectoryEdit;
use serde::Serialize;
use tokio::sync::{
	mpsc::{UnboundedReceiver, UnboundedSender},
	oneshot,
};

#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
	pub mode: EditMode,
	pub dirs: Vec<SharedDirectory>,
	pub catalog: GroupCatalog,
}

pub enum Command {
	Snapshot {
		tx: oneshot::Sender<SessionSnapshot>,
	},
	Initialize {
		tx: oneshot::Sender<Result<usize>>,
	},
	Refresh {
		tx: oneshot::Sender<Result<usize>>,
	},
	BeginEdit {
		tx: oneshot::Sender<bool>,
	},
	Commit {
		tx: oneshot::Sender<Result<()>>,
	},
	ToggleEdit {
		tx: oneshot::Sender<Result<EditMode>>,
	},
	UpdateField {
		index: usize,
		edit: DirectoryEdit,
		tx: oneshot::Sender<Result<()>>,
	},
	Add {
		entry: SharedDirectory,
		tx: oneshot::Sender<Result<()>>,
	},
}

/// Owns one `EditSession` and applies commands to it one at a time, so
/// adds and commits from several callers never interleave.
pub struct App {
	session: EditSession,
	rx: UnboundedReceiver<Command>,
}

impl App {
	pub fn new(session: EditSession) -> (Self, UnboundedSender<Command>) {
		let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
		(Self { session, rx }, tx)
	}

	/// Handles the next command. Returns false once every sender is gone.
	pub async fn run(&mut self) -> bool {
		match self.rx.recv().await {
			Some(cmd) => {
				self.handle_cmd(cmd).await;
				true
			}
			None => false,
		}
	}

	fn snapshot(&self) -> SessionSnapshot {
		SessionSnapshot {
			mode: self.session.mode(),
			dirs: self.session.list().to_vec(),
			catalog: self.session.catalog().clone(),
		}
	}

	async fn handle_cmd(&mut self, cmd: Command) {
		match cmd {
			Command::Snapshot { tx } => {
				let _ = tx.send(self.snapshot());
			}
			Command::Initialize { tx } => {
				let _ = tx.send(self.session.initialize().await);
			}
			Command::Refresh { tx } => {
				let _ = tx.send(self.session.refresh().await);
			}
			Command::BeginEdit { tx } => {
				let _ = tx.send(self.session.begin_edit());
			}
			Command::Commit { tx } => {
				let _ = tx.send(self.session.commit().await);
			}
			Command::ToggleEdit { tx } => {
				let _ = tx.send(self.session.toggle_edit().await);
			}
			Command::UpdateField { index, edit, tx } => {
				let _ = tx.send(self.session.update_field(index, edit));
			}
			Command::Add { entry, tx } => {
				let _ = tx.send(self.session.add(entry).await);
			}
		}
	}
}
