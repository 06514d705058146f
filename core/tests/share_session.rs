use puppyshare_core::{
	DirectoryEdit, EditMode, EditSession, GroupId, MemoryGateway, PuppyShare, ShareError,
	ShareFlag, SharedDirectory,
};
use std::sync::Arc;

const FAMILY: &str = "00000000000000000000000000000002";

async fn start(gateway: &Arc<MemoryGateway>) -> Arc<PuppyShare> {
	let share = PuppyShare::start(EditSession::new(gateway.clone()));
	share.initialize().await.expect("initial fetch");
	Arc::new(share)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_adds_of_one_path_add_it_once() {
	let gateway = Arc::new(MemoryGateway::new());
	let share = start(&gateway).await;

	let mut tasks = Vec::new();
	for _ in 0..8 {
		let share = Arc::clone(&share);
		tasks.push(tokio::spawn(async move { share.add_path("/srv/shared").await }));
	}
	let mut added = 0;
	let mut duplicates = 0;
	for task in tasks {
		match task.await.unwrap() {
			Ok(()) => added += 1,
			Err(ShareError::DuplicateEntry { .. }) => duplicates += 1,
			Err(other) => panic!("unexpected error {other}"),
		}
	}
	assert_eq!(added, 1);
	assert_eq!(duplicates, 7);
	assert_eq!(gateway.add_calls(), 1);
	assert_eq!(share.snapshot().await.unwrap().dirs.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_commits_send_one_list() {
	let gateway = Arc::new(MemoryGateway::with_dirs(vec![SharedDirectory::new("/a")]));
	let share = start(&gateway).await;
	share.begin_edit().await.unwrap();

	let first = {
		let share = Arc::clone(&share);
		tokio::spawn(async move { share.commit().await })
	};
	let second = {
		let share = Arc::clone(&share);
		tokio::spawn(async move { share.commit().await })
	};
	let results = [first.await.unwrap(), second.await.unwrap()];
	assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
	assert!(results.contains(&Err(ShareError::ReadOnly)));
	assert_eq!(gateway.replace_calls(), 1);
}

#[tokio::test]
async fn full_session_round_trip() {
	let gateway = Arc::new(MemoryGateway::with_dirs(vec![SharedDirectory::new("/a")]));
	let share = start(&gateway).await;

	share.add_path("/b").await.unwrap();
	assert_eq!(gateway.persisted().len(), 2);

	assert_eq!(share.toggle_edit().await.unwrap(), EditMode::Editing);
	share
		.update_field(0, DirectoryEdit::Flag {
			flag: ShareFlag::AnonymousBrowse,
			enabled: true,
		})
		.await
		.unwrap();
	share.toggle_group(1, GroupId::from(FAMILY)).await.unwrap();
	share.toggle_group(1, GroupId::from(FAMILY)).await.unwrap();
	assert_eq!(share.toggle_edit().await.unwrap(), EditMode::ReadOnly);

	let persisted = gateway.persisted();
	assert_eq!(persisted[0].permission_mask(), 7);
	assert!(persisted[1].visibility.is_all());
	assert!(persisted[1].is_visible_to(&GroupId::from(FAMILY)));
	assert_eq!(gateway.replace_payloads().len(), 1);
}

#[tokio::test]
async fn failed_initial_fetch_keeps_empty_list() {
	let gateway = Arc::new(MemoryGateway::with_dirs(vec![SharedDirectory::new("/a")]));
	gateway.fail_fetch(true);
	let share = PuppyShare::start(EditSession::new(gateway.clone()));
	assert!(share.initialize().await.unwrap_err().is_remote());
	assert!(share.snapshot().await.unwrap().dirs.is_empty());

	gateway.fail_fetch(false);
	assert_eq!(share.refresh().await.unwrap(), 1);
	share.shutdown().await;
}
