use crate::directory::SharedDirectory;
use crate::error::{Result, ShareError};
use crate::gateway::SyncGateway;
use crate::groups::{GroupCatalog, GroupId};
use crate::store::{DirectoryEdit, SharedDirectoryStore};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditMode {
	#[default]
	ReadOnly,
	Editing,
}

/// What a commit does when the authority rejects the new list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitFailurePolicy {
	/// Leave editing anyway; local and remote lists may differ.
	#[default]
	Diverge,
	/// Stay in editing mode with the working list untouched.
	StayEditing,
	/// Leave editing and reload the list from the authority.
	Refetch,
	/// Send the list up to this many more times, then diverge.
	Retry(u32),
}

impl fmt::Display for CommitFailurePolicy {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			CommitFailurePolicy::Diverge => f.write_str("diverge"),
			CommitFailurePolicy::StayEditing => f.write_str("stay-editing"),
			CommitFailurePolicy::Refetch => f.write_str("refetch"),
			CommitFailurePolicy::Retry(n) => write!(f, "retry:{n}"),
		}
	}
}

impl FromStr for CommitFailurePolicy {
	type Err = String;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		match s.trim() {
			"diverge" => Ok(CommitFailurePolicy::Diverge),
			"stay-editing" | "stay_editing" => Ok(CommitFailurePolicy::StayEditing),
			"refetch" => Ok(CommitFailurePolicy::Refetch),
			other => {
				let Some(count) = other.strip_prefix("retry:") else {
					return Err(format!("unknown commit policy {other:?}"));
				};
				count
					.parse::<u32>()
					.map(CommitFailurePolicy::Retry)
					.map_err(|e| format!("invalid retry count {count:?}: {e}"))
			}
		}
	}
}

/// Owns the working list and the read-only/editing switch in front of it.
pub struct EditSession {
	mode: EditMode,
	store: SharedDirectoryStore,
	gateway: Arc<dyn SyncGateway>,
	catalog: GroupCatalog,
	policy: CommitFailurePolicy,
}

impl EditSession {
	pub fn new(gateway: Arc<dyn SyncGateway>) -> Self {
		Self {
			mode: EditMode::ReadOnly,
			store: SharedDirectoryStore::new(),
			gateway,
			catalog: GroupCatalog::default(),
			policy: CommitFailurePolicy::default(),
		}
	}

	pub fn with_policy(mut self, policy: CommitFailurePolicy) -> Self {
		self.policy = policy;
		self
	}

	pub fn mode(&self) -> EditMode {
		self.mode
	}

	pub fn is_editing(&self) -> bool {
		self.mode == EditMode::Editing
	}

	pub fn list(&self) -> &[SharedDirectory] {
		self.store.list()
	}

	pub fn catalog(&self) -> &GroupCatalog {
		&self.catalog
	}

	/// Loads the working list from the authority. On failure the list is
	/// left as it was and the error is returned.
	pub async fn initialize(&mut self) -> Result<usize> {
		match self.gateway.fetch_all().await {
			Ok(dirs) => {
				log::info!("loaded {} shared directories", dirs.len());
				let count = dirs.len();
				self.store.replace_all(dirs);
				Ok(count)
			}
			Err(err) => {
				log::warn!("failed to load shared directories: {err}");
				Err(err)
			}
		}
	}

	/// Reloads the list. Refused while editing so unsent edits are not lost.
	pub async fn refresh(&mut self) -> Result<usize> {
		if self.is_editing() {
			return Err(ShareError::EditInProgress);
		}
		self.initialize().await
	}

	/// Returns false if the session was already editing.
	pub fn begin_edit(&mut self) -> bool {
		if self.is_editing() {
			return false;
		}
		log::debug!("share manager entering edit mode");
		self.mode = EditMode::Editing;
		true
	}

	/// Sends the whole working list to the authority and leaves editing.
	/// On failure the commit policy decides the resulting mode; the error
	/// is returned either way.
	pub async fn commit(&mut self) -> Result<()> {
		if !self.is_editing() {
			return Err(ShareError::ReadOnly);
		}
		let mut result = self.gateway.replace_all(self.store.list()).await;
		if let (Err(_), CommitFailurePolicy::Retry(attempts)) = (&result, self.policy) {
			for attempt in 1..=attempts {
				log::info!("retrying setSharedDirectories ({attempt}/{attempts})");
				result = self.gateway.replace_all(self.store.list()).await;
				if result.is_ok() {
					break;
				}
			}
		}
		let err = match result {
			Ok(()) => {
				log::info!("committed {} shared directories", self.store.len());
				self.mode = EditMode::ReadOnly;
				return Ok(());
			}
			Err(err) => err,
		};
		log::warn!("failed to commit shared directories: {err}");
		match self.policy {
			CommitFailurePolicy::StayEditing => {}
			CommitFailurePolicy::Diverge | CommitFailurePolicy::Retry(_) => {
				self.mode = EditMode::ReadOnly;
			}
			CommitFailurePolicy::Refetch => {
				self.mode = EditMode::ReadOnly;
				if let Err(fetch_err) = self.initialize().await {
					log::warn!("reload after failed commit also failed: {fetch_err}");
				}
			}
		}
		Err(err)
	}

	/// The header button: "Edit" while read-only, "Apply and Close" while
	/// editing. Returns the mode after the action.
	pub async fn toggle_edit(&mut self) -> Result<EditMode> {
		match self.mode {
			EditMode::ReadOnly => {
				self.begin_edit();
				Ok(self.mode)
			}
			EditMode::Editing => self.commit().await.map(|_| self.mode),
		}
	}

	pub fn update_field(&mut self, index: usize, edit: DirectoryEdit) -> Result<()> {
		if !self.is_editing() {
			log::debug!("ignoring edit of row {index}: read-only");
			return Err(ShareError::ReadOnly);
		}
		match &edit {
			DirectoryEdit::ToggleGroup(group) => self.check_group(group)?,
			DirectoryEdit::Visibility(visibility) => {
				for group in visibility.groups() {
					self.check_group(group)?;
				}
			}
			_ => {}
		}
		self.store.update_field(index, edit)
	}

	pub fn toggle_group(&mut self, index: usize, group: GroupId) -> Result<()> {
		self.update_field(index, DirectoryEdit::ToggleGroup(group))
	}

	/// Shares `path` with the defaults of the add form.
	pub async fn add_path(&mut self, path: impl Into<String>) -> Result<()> {
		self.add(SharedDirectory::new(path)).await
	}

	/// Adding goes straight to the authority and works in either mode.
	pub async fn add(&mut self, entry: SharedDirectory) -> Result<()> {
		for group in entry.visibility.groups() {
			self.check_group(group)?;
		}
		let gateway = Arc::clone(&self.gateway);
		self.store.add(entry, gateway.as_ref()).await
	}

	fn check_group(&self, group: &GroupId) -> Result<()> {
		if self.catalog.contains(group) {
			Ok(())
		} else {
			Err(ShareError::UnknownGroup(group.to_string()))
		}
	}
}
