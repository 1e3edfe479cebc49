mod common;

use batchren_core::{BatchRenamer, UndoStack};
use common::{listing, populate, read, request, CountingFs};
use std::fs;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

fn renamer(fs: &Arc<CountingFs>, stack: &Arc<Mutex<UndoStack>>) -> BatchRenamer {
    BatchRenamer::new(fs.clone()).with_undo_sink(stack.clone())
}

fn file_names(range: std::ops::RangeInclusive<usize>) -> Vec<String> {
    range.map(|i| format!("file_{i}")).collect()
}

#[test]
fn test_swap_uses_one_detour() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    populate(dir, &["file_1", "file_2"]);

    let fs = Arc::new(CountingFs::new());
    let stack = Arc::new(Mutex::new(UndoStack::new(10)));
    let report = renamer(&fs, &stack).run(&[
        request(dir, "file_1", "file_2"),
        request(dir, "file_2", "file_1"),
    ]);

    assert!(report.all_succeeded());
    assert_eq!(fs.call_count(), 3);
    assert_eq!(read(dir, "file_1"), "file_2");
    assert_eq!(read(dir, "file_2"), "file_1");
    assert_eq!(listing(&temp_dir), vec!["file_1", "file_2"]);

    fs.reset();
    stack.lock().unwrap().undo(fs.as_ref(), &mut Default::default()).unwrap();
    assert_eq!(fs.call_count(), 3);
    assert_eq!(read(dir, "file_1"), "file_1");
    assert_eq!(read(dir, "file_2"), "file_2");
}

#[test]
fn test_nine_file_rotation() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    let names = file_names(1..=9);
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    populate(dir, &refs);

    // file_i -> file_{i+1}, file_9 -> file_1
    let requests: Vec<_> = (0..9)
        .map(|i| request(dir, &names[i], &names[(i + 1) % 9]))
        .collect();

    let fs = Arc::new(CountingFs::new());
    let stack = Arc::new(Mutex::new(UndoStack::new(10)));
    let report = renamer(&fs, &stack).run(&requests);

    assert!(report.all_succeeded());
    assert_eq!(report.plan.cycle_count(), 1);
    assert_eq!(fs.call_count(), 10);
    for i in 0..9 {
        assert_eq!(read(dir, &names[(i + 1) % 9]), names[i]);
    }
    assert_eq!(listing(&temp_dir).len(), 9);
}

#[test]
fn test_chain_runs_tail_to_head() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    let names = file_names(1..=10);
    let refs: Vec<&str> = names[..9].iter().map(String::as_str).collect();
    populate(dir, &refs);

    let requests: Vec<_> = (0..9)
        .map(|i| request(dir, &names[i], &names[i + 1]))
        .collect();

    let fs = Arc::new(CountingFs::new());
    let stack = Arc::new(Mutex::new(UndoStack::new(10)));
    let report = renamer(&fs, &stack).run(&requests);

    assert!(report.all_succeeded());
    assert_eq!(report.plan.cycle_count(), 0);

    let calls = fs.calls();
    assert_eq!(calls.len(), 9);
    for (call, i) in calls.iter().zip((0..9).rev()) {
        assert_eq!(call.0, dir.join(&names[i]));
        assert_eq!(call.1, dir.join(&names[i + 1]));
    }
    assert!(!dir.join("file_1").exists());
    assert_eq!(read(dir, "file_10"), "file_9");
}

#[test]
fn test_extension_replace_in_mixed_batch() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    let names: Vec<String> = (1..=9)
        .map(|i| {
            if i == 2 || i == 8 {
                format!("file_{i}.jpeg")
            } else {
                format!("file_{i}.jpg")
            }
        })
        .collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    populate(dir, &refs);

    let requests: Vec<_> = names
        .iter()
        .map(|name| request(dir, name, &name.replace(".jpeg", ".jpg")))
        .collect();

    let fs = Arc::new(CountingFs::new());
    let stack = Arc::new(Mutex::new(UndoStack::new(10)));
    let report = renamer(&fs, &stack).run(&requests);

    assert!(report.all_succeeded());
    assert_eq!(fs.call_count(), 2);
    assert_eq!(report.plan.noops.len(), 7);
    assert_eq!(read(dir, "file_2.jpg"), "file_2.jpeg");
    assert_eq!(read(dir, "file_8.jpg"), "file_8.jpeg");
}

#[test]
fn test_same_leaf_in_two_directories() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    fs::create_dir(dir.join("folder1")).unwrap();
    fs::create_dir(dir.join("folder2")).unwrap();
    fs::write(dir.join("folder1/file_1"), "one").unwrap();
    fs::write(dir.join("folder2/file_1"), "two").unwrap();

    let fs = Arc::new(CountingFs::new());
    let stack = Arc::new(Mutex::new(UndoStack::new(10)));
    let report = renamer(&fs, &stack).run(&[
        request(&dir.join("folder1"), "file_1", "file_2"),
        request(&dir.join("folder2"), "file_1", "file_2"),
    ]);

    assert!(report.all_succeeded());
    assert_eq!(report.plan.components.len(), 2);
    assert_eq!(fs.call_count(), 2);
    assert_eq!(read(&dir.join("folder1"), "file_2"), "one");
    assert_eq!(read(&dir.join("folder2"), "file_2"), "two");
}

#[test]
fn test_noop_never_touches_filesystem() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    populate(dir, &["keep"]);

    let fs = Arc::new(CountingFs::new());
    let stack = Arc::new(Mutex::new(UndoStack::new(10)));
    let report = renamer(&fs, &stack).run(&[request(dir, "keep", "keep")]);

    assert!(report.all_succeeded());
    assert_eq!(fs.call_count(), 0);
    assert!(stack.lock().unwrap().is_empty());
}

#[test]
fn test_undo_then_redo_restores_post_batch_state() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    populate(dir, &["a", "b", "c", "d"]);

    // a <-> b swap plus chain c -> d -> e
    let fs = Arc::new(CountingFs::new());
    let stack = Arc::new(Mutex::new(UndoStack::new(10)));
    let report = renamer(&fs, &stack).run(&[
        request(dir, "a", "b"),
        request(dir, "b", "a"),
        request(dir, "c", "d"),
        request(dir, "d", "e"),
    ]);
    assert!(report.all_succeeded());
    let after = listing(&temp_dir);
    let contents: Vec<String> = after.iter().map(|n| read(dir, n)).collect();

    let mut log = Default::default();
    let mut stack = stack.lock().unwrap();
    stack.undo(fs.as_ref(), &mut log).unwrap();
    assert_eq!(listing(&temp_dir), vec!["a", "b", "c", "d"]);
    for name in ["a", "b", "c", "d"] {
        assert_eq!(read(dir, name), name);
    }

    stack.redo(fs.as_ref(), &mut log).unwrap();
    assert_eq!(listing(&temp_dir), after);
    let redone: Vec<String> = after.iter().map(|n| read(dir, n)).collect();
    assert_eq!(redone, contents);
}

#[test]
fn test_unrelated_file_in_target_fails_only_that_request() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    populate(dir, &["a", "b", "occupied"]);

    let fs = Arc::new(CountingFs::new());
    let stack = Arc::new(Mutex::new(UndoStack::new(10)));
    let report = renamer(&fs, &stack).run(&[
        request(dir, "a", "occupied"),
        request(dir, "b", "c"),
    ]);

    assert!(!report.results[0].success);
    assert_eq!(
        report.results[0].error,
        Some(batchren_core::ErrorKind::NameCollisionOnDisk)
    );
    assert!(report.results[1].success);
    assert_eq!(read(dir, "occupied"), "occupied");
    assert_eq!(read(dir, "c"), "b");
}
