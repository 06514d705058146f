use crate::flags::ShareFlags;
use crate::groups::{GroupId, Visibility};
use serde::{Deserialize, Serialize};

/// One shared folder entry, serialized in the node's JSON API shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedDirectory {
	#[serde(rename = "filename")]
	pub path: String,
	#[serde(rename = "virtualname", default)]
	pub display_name: String,
	#[serde(rename = "shareflags", with = "share_mask")]
	pub flags: ShareFlags,
	#[serde(rename = "parent_groups", default)]
	pub visibility: Visibility,
}

impl SharedDirectory {
	/// A directory as the "Add Directory" form creates it: no alias,
	/// searchable and downloadable, visible to every group.
	pub fn new(path: impl Into<String>) -> Self {
		Self {
			path: path.into(),
			display_name: String::new(),
			flags: ShareFlags::default_for_new_dir(),
			visibility: Visibility::All,
		}
	}

	pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
		self.display_name = name.into();
		self
	}

	pub fn with_flags(mut self, flags: ShareFlags) -> Self {
		self.flags = flags;
		self
	}

	pub fn with_visibility(mut self, visibility: Visibility) -> Self {
		self.visibility = visibility;
		self
	}

	pub fn permission_mask(&self) -> u32 {
		self.flags.encode()
	}

	pub fn is_visible_to(&self, group: &GroupId) -> bool {
		self.visibility.is_visible_to(group)
	}
}

mod share_mask {
	use crate::flags::ShareFlags;
	use serde::{Deserialize, Deserializer, Serializer};

	pub fn serialize<S: Serializer>(flags: &ShareFlags, s: S) -> Result<S::Ok, S::Error> {
		s.serialize_u32(flags.encode())
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<ShareFlags, D::Error> {
		u32::deserialize(d).map(ShareFlags::decode)
	}
}
