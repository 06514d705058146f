use crate::directory::SharedDirectory;
use crate::error::{Result, ShareError};
use crate::flags::{ShareFlag, ShareFlags};
use crate::gateway::SyncGateway;
use crate::groups::{GroupId, Visibility};
use serde::{Deserialize, Serialize};

/// In-place change to one row of the working list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum DirectoryEdit {
	Path(String),
	DisplayName(String),
	PermissionMask(u32),
	Flag { flag: ShareFlag, enabled: bool },
	Visibility(Visibility),
	ToggleGroup(GroupId),
}

/// Working list of shared directories for one editing session.
#[derive(Debug, Clone, Default)]
pub struct SharedDirectoryStore {
	dirs: Vec<SharedDirectory>,
}

impl SharedDirectoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn list(&self) -> &[SharedDirectory] {
		&self.dirs
	}

	pub fn len(&self) -> usize {
		self.dirs.len()
	}

	pub fn is_empty(&self) -> bool {
		self.dirs.is_empty()
	}

	pub fn contains_path(&self, path: &str) -> bool {
		self.dirs.iter().any(|d| d.path == path)
	}

	pub fn replace_all(&mut self, dirs: Vec<SharedDirectory>) {
		self.dirs = dirs;
	}

	pub fn update_field(&mut self, index: usize, edit: DirectoryEdit) -> Result<()> {
		let len = self.dirs.len();
		if index >= len {
			return Err(ShareError::IndexOutOfRange { index, len });
		}
		if let DirectoryEdit::Path(path) = &edit {
			if path.trim().is_empty() {
				return Err(ShareError::InvalidPath(path.clone()));
			}
			let taken = self
				.dirs
				.iter()
				.enumerate()
				.any(|(i, d)| i != index && d.path == *path);
			if taken {
				return Err(ShareError::DuplicateEntry { path: path.clone() });
			}
		}
		let dir = &mut self.dirs[index];
		match edit {
			DirectoryEdit::Path(path) => dir.path = path,
			DirectoryEdit::DisplayName(name) => dir.display_name = name,
			DirectoryEdit::PermissionMask(mask) => dir.flags = ShareFlags::decode(mask),
			DirectoryEdit::Flag { flag, enabled } => dir.flags.set(flag, enabled),
			DirectoryEdit::Visibility(visibility) => dir.visibility = visibility,
			DirectoryEdit::ToggleGroup(group) => dir.visibility.toggle(group),
		}
		Ok(())
	}

	/// Shares a new directory. The path must not already be in the working
	/// list; the entry is appended only after the authority accepted it.
	pub async fn add(&mut self, entry: SharedDirectory, gateway: &dyn SyncGateway) -> Result<()> {
		if entry.path.trim().is_empty() {
			return Err(ShareError::InvalidPath(entry.path));
		}
		if self.contains_path(&entry.path) {
			return Err(ShareError::DuplicateEntry { path: entry.path });
		}
		gateway.add_one(&entry).await?;
		log::info!("shared directory {} added", entry.path);
		self.dirs.push(entry);
		Ok(())
	}
}
