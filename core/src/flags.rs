use serde::{Deserialize, Serialize};

// Bit positions assumed for the node's share mask: search 0x1, download
// 0x2, browse 0x4, so that a mask of 3 reads as search + download. A node
// that uses other positions decodes these three as unset and its own bits
// pass through `other` untouched.
pub const DIR_FLAGS_ANONYMOUS_SEARCH: u32 = 0x1;
pub const DIR_FLAGS_ANONYMOUS_DOWNLOAD: u32 = 0x2;
pub const DIR_FLAGS_BROWSABLE: u32 = 0x4;

const KNOWN_BITS: u32 =
	DIR_FLAGS_ANONYMOUS_SEARCH | DIR_FLAGS_ANONYMOUS_DOWNLOAD | DIR_FLAGS_BROWSABLE;

/// A single recognized share permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareFlag {
	AnonymousSearch,
	AnonymousDownload,
	AnonymousBrowse,
}

impl ShareFlag {
	pub const ALL: [ShareFlag; 3] = [
		ShareFlag::AnonymousSearch,
		ShareFlag::AnonymousDownload,
		ShareFlag::AnonymousBrowse,
	];

	pub fn bit(self) -> u32 {
		match self {
			ShareFlag::AnonymousSearch => DIR_FLAGS_ANONYMOUS_SEARCH,
			ShareFlag::AnonymousDownload => DIR_FLAGS_ANONYMOUS_DOWNLOAD,
			ShareFlag::AnonymousBrowse => DIR_FLAGS_BROWSABLE,
		}
	}

	pub fn label(self) -> &'static str {
		match self {
			ShareFlag::AnonymousSearch => "anonymous search",
			ShareFlag::AnonymousDownload => "anonymous download",
			ShareFlag::AnonymousBrowse => "anonymous browse",
		}
	}
}

/// Decoded form of a directory's share mask.
///
/// Bits the node does not know about are kept in `other` so that
/// `ShareFlags::decode(mask).encode() == mask` for every mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShareFlags {
	pub anonymous_search: bool,
	pub anonymous_download: bool,
	pub anonymous_browse: bool,
	#[serde(default, skip_serializing_if = "is_zero")]
	other: u32,
}

fn is_zero(v: &u32) -> bool {
	*v == 0
}

impl ShareFlags {
	pub fn new(anonymous_search: bool, anonymous_download: bool, anonymous_browse: bool) -> Self {
		Self {
			anonymous_search,
			anonymous_download,
			anonymous_browse,
			other: 0,
		}
	}

	/// Flags given to a directory added by path: searchable and downloadable.
	pub fn default_for_new_dir() -> Self {
		Self::decode(DIR_FLAGS_ANONYMOUS_SEARCH | DIR_FLAGS_ANONYMOUS_DOWNLOAD)
	}

	pub fn decode(mask: u32) -> Self {
		Self {
			anonymous_search: mask & DIR_FLAGS_ANONYMOUS_SEARCH != 0,
			anonymous_download: mask & DIR_FLAGS_ANONYMOUS_DOWNLOAD != 0,
			anonymous_browse: mask & DIR_FLAGS_BROWSABLE != 0,
			other: mask & !KNOWN_BITS,
		}
	}

	pub fn encode(&self) -> u32 {
		let mut mask = self.other;
		for flag in ShareFlag::ALL {
			if self.get(flag) {
				mask |= flag.bit();
			}
		}
		mask
	}

	pub fn get(&self, flag: ShareFlag) -> bool {
		match flag {
			ShareFlag::AnonymousSearch => self.anonymous_search,
			ShareFlag::AnonymousDownload => self.anonymous_download,
			ShareFlag::AnonymousBrowse => self.anonymous_browse,
		}
	}

	pub fn set(&mut self, flag: ShareFlag, enabled: bool) {
		match flag {
			ShareFlag::AnonymousSearch => self.anonymous_search = enabled,
			ShareFlag::AnonymousDownload => self.anonymous_download = enabled,
			ShareFlag::AnonymousBrowse => self.anonymous_browse = enabled,
		}
	}

	/// Bits outside the recognized set, carried through untouched.
	pub fn unrecognized_bits(&self) -> u32 {
		self.other
	}
}
