use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// The three calls made against the node that owns the shared directories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteOp {
	FetchAll,
	AddOne,
	ReplaceAll,
}

impl fmt::Display for RemoteOp {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			RemoteOp::FetchAll => "getSharedDirectories",
			RemoteOp::AddOne => "addSharedDirectory",
			RemoteOp::ReplaceAll => "setSharedDirectories",
		};
		f.write_str(name)
	}
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ShareError {
	#[error("directory {path} is already shared")]
	DuplicateEntry { path: String },
	#[error("{op} failed: {reason}")]
	RemoteCallFailure { op: RemoteOp, reason: String },
	#[error("shared directories are read-only; start editing first")]
	ReadOnly,
	#[error("an edit is in progress; apply it first")]
	EditInProgress,
	#[error("no shared directory at index {index} (have {len})")]
	IndexOutOfRange { index: usize, len: usize },
	#[error("unknown peer group {0}")]
	UnknownGroup(String),
	#[error("invalid directory path: {0:?}")]
	InvalidPath(String),
	#[error("share session is no longer running")]
	SessionClosed,
}

impl ShareError {
	pub fn remote(op: RemoteOp, reason: impl Into<String>) -> Self {
		ShareError::RemoteCallFailure {
			op,
			reason: reason.into(),
		}
	}

	pub fn is_remote(&self) -> bool {
		matches!(self, ShareError::RemoteCallFailure { .. })
	}
}

pub type Result<T, E = ShareError> = std::result::Result<T, E>;
