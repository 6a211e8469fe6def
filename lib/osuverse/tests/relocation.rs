use std::{fs, path::Path};

use osuverse::{relocate, MoveContext, MovePolicy, RelocationError, ScanContext, Scanner};
use tokio_util::sync::CancellationToken;

fn make_set(root: &Path, relative: &str) -> String {
    let dir = root.join(relative);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("map.osu"), "[Metadata]\nArtist:A\nTitle:B\n").unwrap();
    fs::write(dir.join("audio.mp3"), b"audio").unwrap();
    dir.to_string_lossy().into_owned()
}

#[tokio::test]
async fn moves_whole_folders_and_keeps_root() {
    let songs = tempfile::tempdir().unwrap();
    let archive = tempfile::tempdir().unwrap();
    let root = songs.path();
    let a = make_set(root, "1 A - B");
    let b = make_set(root, "2 C - D");

    let ctx = MoveContext::new(archive.path().join("nested/dest")).scan_root(root);
    let outcome = relocate(&[a.clone(), b.clone()], &ctx).await.unwrap();

    assert_eq!(outcome.moved, vec![a.clone(), b.clone()]);
    assert!(outcome.failed.is_empty());
    for (id, name) in [(&a, "1 A - B"), (&b, "2 C - D")] {
        assert!(!Path::new(id).exists());
        let moved = archive.path().join("nested/dest").join(name);
        assert!(moved.join("map.osu").is_file());
        assert!(moved.join("audio.mp3").is_file());
    }
    // Emptied, but it is the scan root.
    assert!(root.exists());
    assert_eq!(fs::read_dir(root).unwrap().count(), 0);
}

#[tokio::test]
async fn emptied_parent_inside_root_is_removed() {
    let songs = tempfile::tempdir().unwrap();
    let archive = tempfile::tempdir().unwrap();
    let root = songs.path();
    let lone = make_set(root, "pack/only");
    let shared_a = make_set(root, "shared/one");
    make_set(root, "shared/two");

    let ctx = MoveContext::new(archive.path()).scan_root(root);
    relocate(&[lone, shared_a], &ctx).await.unwrap();

    assert!(!root.join("pack").exists());
    assert!(root.join("shared").exists());
    assert!(root.join("shared/two/map.osu").exists());
    assert!(root.exists());
}

#[tokio::test]
async fn moved_folders_match_a_previous_scan() {
    let songs = tempfile::tempdir().unwrap();
    let archive = tempfile::tempdir().unwrap();
    make_set(songs.path(), "group/1 A - B");
    make_set(songs.path(), "group/2 A - B");

    let report = Scanner::default()
        .scan(&ScanContext::new(songs.path()))
        .await
        .unwrap();
    let ids: Vec<String> = report.beatmaps.iter().map(|b| b.id.clone()).collect();
    assert_eq!(ids.len(), 2);

    let ctx = MoveContext::new(archive.path()).scan_root(songs.path());
    let outcome = relocate(&ids, &ctx).await.unwrap();

    assert_eq!(outcome.moved, ids);
    assert!(archive.path().join("1 A - B/map.osu").exists());
    assert!(archive.path().join("2 A - B/map.osu").exists());
    assert!(!songs.path().join("group").exists());
    assert!(songs.path().exists());
}

#[tokio::test]
async fn stop_policy_aborts_on_vanished_source() {
    let songs = tempfile::tempdir().unwrap();
    let archive = tempfile::tempdir().unwrap();
    let root = songs.path();
    let a = make_set(root, "a");
    let b = make_set(root, "b");
    let c = make_set(root, "c");
    fs::remove_dir_all(&b).unwrap();

    let ctx = MoveContext::new(archive.path()).scan_root(root);
    let err = relocate(&[a.clone(), b.clone(), c.clone()], &ctx)
        .await
        .unwrap_err();

    match &err {
        RelocationError::Aborted { id, moved, source } => {
            assert_eq!(id, &b);
            assert_eq!(moved, &vec![a.clone()]);
            assert!(matches!(**source, RelocationError::SourceMissing(_)));
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(archive.path().join("a").exists());
    assert!(Path::new(&c).exists());
}

#[tokio::test]
async fn continue_policy_moves_the_rest() {
    let songs = tempfile::tempdir().unwrap();
    let archive = tempfile::tempdir().unwrap();
    let root = songs.path();
    let a = make_set(root, "a");
    let b = make_set(root, "b");
    let c = make_set(root, "c");
    fs::remove_dir_all(&b).unwrap();

    let ctx = MoveContext::new(archive.path())
        .scan_root(root)
        .policy(MovePolicy::ContinueOnError);
    let outcome = relocate(&[a.clone(), b.clone(), c.clone()], &ctx)
        .await
        .unwrap();

    assert_eq!(outcome.moved, vec![a, c]);
    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.failed[0].id, b);
    assert!(outcome.failed[0].error.contains("does not exist"));
}

#[tokio::test]
async fn refuses_to_overwrite_existing_destination() {
    let songs = tempfile::tempdir().unwrap();
    let archive = tempfile::tempdir().unwrap();
    let a = make_set(songs.path(), "a");
    fs::create_dir_all(archive.path().join("a")).unwrap();

    let ctx = MoveContext::new(archive.path()).scan_root(songs.path());
    let err = relocate(&[a.clone()], &ctx).await.unwrap_err();

    assert!(err.moved().is_empty());
    assert!(err.to_string().contains("Destination already exists"));
    assert!(Path::new(&a).join("map.osu").exists());
}

#[tokio::test]
async fn empty_request_is_rejected() {
    let archive = tempfile::tempdir().unwrap();
    let err = relocate(&[], &MoveContext::new(archive.path()))
        .await
        .unwrap_err();
    assert!(matches!(err, RelocationError::NothingToMove));
}

#[tokio::test]
async fn cancellation_stops_before_next_folder() {
    let songs = tempfile::tempdir().unwrap();
    let archive = tempfile::tempdir().unwrap();
    let a = make_set(songs.path(), "a");

    let cancel = CancellationToken::new();
    cancel.cancel();
    let ctx = MoveContext::new(archive.path()).cancellation(cancel);
    let err = relocate(&[a.clone()], &ctx).await.unwrap_err();

    assert!(matches!(err, RelocationError::Cancelled { ref moved } if moved.is_empty()));
    assert!(Path::new(&a).exists());
}

#[tokio::test]
async fn without_scan_root_nothing_is_pruned() {
    let songs = tempfile::tempdir().unwrap();
    let archive = tempfile::tempdir().unwrap();
    let a = make_set(songs.path(), "pack/a");

    relocate(&[a], &MoveContext::new(archive.path())).await.unwrap();

    assert!(songs.path().join("pack").exists());
    assert!(archive.path().join("a/map.osu").exists());
}

#[tokio::test]
async fn scan_root_holding_a_descriptor_is_never_moved() {
    let temp = tempfile::tempdir().unwrap();
    let archive = tempfile::tempdir().unwrap();
    let root = temp.path().join("Songs");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("map.osu"), "[Metadata]\nArtist:A\nTitle:B\n").unwrap();
    let nested = make_set(&root, "1 C - D");

    let report = Scanner::default().scan(&ScanContext::new(&root)).await.unwrap();
    let mut ids: Vec<String> = report.beatmaps.iter().map(|b| b.id.clone()).collect();
    ids.sort();
    assert_eq!(ids, vec![root.to_string_lossy().into_owned(), nested.clone()]);

    let ctx = MoveContext::new(archive.path()).scan_root(&root);
    let err = relocate(&ids, &ctx).await.unwrap_err();
    match err {
        RelocationError::Aborted { source, moved, .. } => {
            assert!(matches!(*source, RelocationError::SourceIsScanRoot(_)));
            assert!(moved.is_empty());
        }
        other => panic!("expected abort, got {other:?}"),
    }
    assert!(root.join("map.osu").is_file());

    let ctx = ctx.policy(MovePolicy::ContinueOnError);
    let outcome = relocate(&ids, &ctx).await.unwrap();
    assert_eq!(outcome.moved, vec![nested]);
    assert_eq!(outcome.failed.len(), 1);
    assert!(outcome.failed[0].error.starts_with("Cannot move the scanned folder"));
    assert!(root.is_dir());
}

#[tokio::test]
async fn folder_containing_the_scan_root_is_refused() {
    let temp = tempfile::tempdir().unwrap();
    let archive = tempfile::tempdir().unwrap();
    let root = temp.path().join("osu/Songs");
    fs::create_dir_all(&root).unwrap();
    let parent = temp.path().join("osu").to_string_lossy().into_owned();

    let ctx = MoveContext::new(archive.path()).scan_root(&root);
    let err = relocate(&[parent], &ctx).await.unwrap_err();

    assert!(matches!(
        err,
        RelocationError::Aborted { ref source, .. }
            if matches!(**source, RelocationError::SourceIsScanRoot(_))
    ));
    assert!(root.is_dir());
}

#[tokio::test]
async fn pruning_climbs_through_every_emptied_ancestor() {
    let songs = tempfile::tempdir().unwrap();
    let archive = tempfile::tempdir().unwrap();
    let root = songs.path();
    let deep = make_set(root, "keep/pack/deeper/only");
    make_set(root, "keep/other");

    let ctx = MoveContext::new(archive.path()).scan_root(root);
    relocate(&[deep], &ctx).await.unwrap();

    assert!(!root.join("keep/pack").exists());
    assert!(root.join("keep/other/map.osu").is_file());
    assert!(root.exists());
}
