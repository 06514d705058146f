use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a peer group as the node reports it (32 hex digits).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(String);

impl GroupId {
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for GroupId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for GroupId {
	fn from(value: &str) -> Self {
		Self(value.to_string())
	}
}

const BUILTIN_GROUPS: [(&str, &str); 5] = [
	("00000000000000000000000000000001", "Friends"),
	("00000000000000000000000000000002", "Family"),
	("00000000000000000000000000000003", "Co-Workers"),
	("00000000000000000000000000000004", "Other Contacts"),
	("00000000000000000000000000000005", "Favorites"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupEntry {
	pub id: GroupId,
	pub label: String,
}

/// Ordered catalog of the peer groups a directory may be restricted to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupCatalog {
	groups: Vec<GroupEntry>,
}

impl Default for GroupCatalog {
	fn default() -> Self {
		Self::new(
			BUILTIN_GROUPS
				.iter()
				.map(|(id, label)| (GroupId::from(*id), label.to_string())),
		)
	}
}

impl GroupCatalog {
	/// Later duplicates of an id are dropped.
	pub fn new(groups: impl IntoIterator<Item = (GroupId, String)>) -> Self {
		let mut entries: Vec<GroupEntry> = Vec::new();
		for (id, label) in groups {
			if entries.iter().any(|e| e.id == id) {
				continue;
			}
			entries.push(GroupEntry { id, label });
		}
		Self { groups: entries }
	}

	pub fn entries(&self) -> &[GroupEntry] {
		&self.groups
	}

	pub fn contains(&self, id: &GroupId) -> bool {
		self.groups.iter().any(|e| &e.id == id)
	}

	pub fn label(&self, id: &GroupId) -> Option<&str> {
		self.groups
			.iter()
			.find(|e| &e.id == id)
			.map(|e| e.label.as_str())
	}

	/// Labels of the groups a directory is restricted to. Ids missing from
	/// the catalog are skipped.
	pub fn labels_for(&self, visibility: &Visibility) -> Vec<&str> {
		match visibility {
			Visibility::All => Vec::new(),
			Visibility::RestrictedTo(set) => set.iter().filter_map(|id| self.label(id)).collect(),
		}
	}
}

/// Non-empty, duplicate-free list of groups a directory is restricted to.
///
/// Only built through [`Visibility::restricted`] and [`Visibility::toggle`],
/// which yield `Visibility::All` instead of an empty set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSet(Vec<GroupId>);

impl GroupSet {
	pub fn as_slice(&self) -> &[GroupId] {
		&self.0
	}

	pub fn contains(&self, group: &GroupId) -> bool {
		self.0.contains(group)
	}

	pub fn iter(&self) -> std::slice::Iter<'_, GroupId> {
		self.0.iter()
	}
}

/// Which peer groups can see a shared directory.
///
/// On the wire an empty `parent_groups` list means every group; here that
/// case has its own variant and `RestrictedTo` cannot hold an empty list.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<GroupId>", into = "Vec<GroupId>")]
pub enum Visibility {
	#[default]
	All,
	RestrictedTo(GroupSet),
}

impl Visibility {
	pub fn restricted(ids: impl IntoIterator<Item = GroupId>) -> Self {
		let mut list: Vec<GroupId> = Vec::new();
		for id in ids {
			if !list.contains(&id) {
				list.push(id);
			}
		}
		if list.is_empty() {
			Visibility::All
		} else {
			Visibility::RestrictedTo(GroupSet(list))
		}
	}

	pub fn is_all(&self) -> bool {
		matches!(self, Visibility::All)
	}

	pub fn is_visible_to(&self, group: &GroupId) -> bool {
		match self {
			Visibility::All => true,
			Visibility::RestrictedTo(set) => set.contains(group),
		}
	}

	/// Whether `group` is explicitly listed. `All` lists nothing.
	pub fn lists(&self, group: &GroupId) -> bool {
		match self {
			Visibility::All => false,
			Visibility::RestrictedTo(set) => set.contains(group),
		}
	}

	/// Removes `group` if listed, otherwise appends it. Removing the last
	/// listed group makes the directory visible to all groups again.
	pub fn toggle(&mut self, group: GroupId) {
		let next = match std::mem::take(self) {
			Visibility::All => Visibility::RestrictedTo(GroupSet(vec![group])),
			Visibility::RestrictedTo(GroupSet(mut ids)) => {
				if let Some(pos) = ids.iter().position(|id| *id == group) {
					ids.remove(pos);
				} else {
					ids.push(group);
				}
				if ids.is_empty() {
					log::debug!("last visibility group removed; directory visible to all groups");
					Visibility::All
				} else {
					Visibility::RestrictedTo(GroupSet(ids))
				}
			}
		};
		*self = next;
	}

	pub fn groups(&self) -> &[GroupId] {
		match self {
			Visibility::All => &[],
			Visibility::RestrictedTo(set) => set.as_slice(),
		}
	}
}

impl From<Vec<GroupId>> for Visibility {
	fn from(ids: Vec<GroupId>) -> Self {
		Visibility::restricted(ids)
	}
}

impl From<Visibility> for Vec<GroupId> {
	fn from(visibility: Visibility) -> Self {
		match visibility {
			Visibility::All => Vec::new(),
			Visibility::RestrictedTo(GroupSet(ids)) => ids,
		}
	}
}
