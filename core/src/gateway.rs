use crate::directory::SharedDirectory;
use crate::error::{RemoteOp, Result, ShareError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Calls against the node that owns the persisted list of shared
/// directories. Each call is one request/response exchange that either
/// fully succeeds or fails with `ShareError::RemoteCallFailure`.
#[async_trait]
pub trait SyncGateway: Send + Sync {
	async fn fetch_all(&self) -> Result<Vec<SharedDirectory>>;
	async fn add_one(&self, dir: &SharedDirectory) -> Result<()>;
	async fn replace_all(&self, dirs: &[SharedDirectory]) -> Result<()>;
}

/// Number of `replace_all` payloads `MemoryGateway` remembers.
pub const REPLACE_HISTORY: usize = 16;

/// In-process authority. Keeps the persisted list in memory, counts calls
/// and can be told to fail any of them.
#[derive(Default)]
pub struct MemoryGateway {
	dirs: Mutex<Vec<SharedDirectory>>,
	replaced: Mutex<VecDeque<Vec<SharedDirectory>>>,
	fetch_calls: AtomicUsize,
	add_calls: AtomicUsize,
	replace_calls: AtomicUsize,
	fail_fetch: AtomicBool,
	fail_add: AtomicBool,
	fail_replace: AtomicBool,
}

impl MemoryGateway {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_dirs(dirs: Vec<SharedDirectory>) -> Self {
		let gateway = Self::default();
		*gateway.dirs.lock().unwrap() = dirs;
		gateway
	}

	/// Persisted list as the authority currently holds it.
	pub fn persisted(&self) -> Vec<SharedDirectory> {
		self.dirs.lock().unwrap().clone()
	}

	/// The last `REPLACE_HISTORY` lists received by `replace_all`, oldest
	/// first, including calls that were failed on purpose.
	pub fn replace_payloads(&self) -> Vec<Vec<SharedDirectory>> {
		self.replaced.lock().unwrap().iter().cloned().collect()
	}

	pub fn fetch_calls(&self) -> usize {
		self.fetch_calls.load(Ordering::SeqCst)
	}

	pub fn add_calls(&self) -> usize {
		self.add_calls.load(Ordering::SeqCst)
	}

	pub fn replace_calls(&self) -> usize {
		self.replace_calls.load(Ordering::SeqCst)
	}

	pub fn fail_fetch(&self, fail: bool) {
		self.fail_fetch.store(fail, Ordering::SeqCst);
	}

	pub fn fail_add(&self, fail: bool) {
		self.fail_add.store(fail, Ordering::SeqCst);
	}

	pub fn fail_replace(&self, fail: bool) {
		self.fail_replace.store(fail, Ordering::SeqCst);
	}
}

#[async_trait]
impl SyncGateway for MemoryGateway {
	async fn fetch_all(&self) -> Result<Vec<SharedDirectory>> {
		self.fetch_calls.fetch_add(1, Ordering::SeqCst);
		if self.fail_fetch.load(Ordering::SeqCst) {
			return Err(ShareError::remote(RemoteOp::FetchAll, "retval false"));
		}
		Ok(self.persisted())
	}

	async fn add_one(&self, dir: &SharedDirectory) -> Result<()> {
		self.add_calls.fetch_add(1, Ordering::SeqCst);
		if self.fail_add.load(Ordering::SeqCst) {
			return Err(ShareError::remote(RemoteOp::AddOne, "retval false"));
		}
		self.dirs.lock().unwrap().push(dir.clone());
		Ok(())
	}

	async fn replace_all(&self, dirs: &[SharedDirectory]) -> Result<()> {
		self.replace_calls.fetch_add(1, Ordering::SeqCst);
		{
			let mut replaced = self.replaced.lock().unwrap();
			if replaced.len() == REPLACE_HISTORY {
				replaced.pop_front();
			}
			replaced.push_back(dirs.to_vec());
		}
		if self.fail_replace.load(Ordering::SeqCst) {
			return Err(ShareError::remote(RemoteOp::ReplaceAll, "retval false"));
		}
		*self.dirs.lock().unwrap() = dirs.to_vec();
		Ok(())
	}
}
