use anyhow::Result;
use std::fs;
use std::io;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tempfile::{tempdir, TempDir};
use treescout::{search, CollectingSink, ErrorKind, MatchSink, SearchConfig};

// Helper function to create test files
fn create_test_files(dir: &TempDir, files: &[(&str, &str)]) -> Result<()> {
    for (name, content) in files {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
    }
    Ok(())
}

fn run(config: &SearchConfig) -> Result<Vec<PathBuf>> {
    let sink = Arc::new(CollectingSink::new());
    search(config, sink.clone())?;
    Ok(sink.paths())
}

#[test]
fn test_example_tree() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(
        &dir,
        &[
            ("a.txt", "hello world"),
            ("sub/b.txt", "no match here"),
            ("sub/c.txt", "say hello"),
        ],
    )?;

    let found = run(&SearchConfig::new(dir.path(), "hello"))?;
    assert_eq!(
        found,
        vec![dir.path().join("a.txt"), dir.path().join("sub").join("c.txt")]
    );
    Ok(())
}

#[test]
fn test_every_matching_file_reported_once() -> Result<()> {
    let dir = tempdir()?;
    let mut expected = Vec::new();
    for d in 0..5 {
        for f in 0..7 {
            let name = format!("d{}/nested/f{}.txt", d, f);
            let content = if (d + f) % 3 == 0 {
                expected.push(dir.path().join(&name));
                format!("line one\nthe needle is here {}\nline three\n", f)
            } else {
                "line one\nnothing to see\n".to_string()
            };
            create_test_files(&dir, &[(name.as_str(), content.as_str())])?;
        }
    }
    expected.sort();

    let config =
        SearchConfig::new(dir.path(), "needle").with_max_tasks(NonZeroUsize::new(3).unwrap());
    assert_eq!(run(&config)?, expected);
    Ok(())
}

#[test]
fn test_keyword_split_across_lines_is_not_reported() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(&dir, &[("split.txt", "some hel\nlo there\n"), ("whole.txt", "hello")])?;

    let found = run(&SearchConfig::new(dir.path(), "hello"))?;
    assert_eq!(found, vec![dir.path().join("whole.txt")]);
    Ok(())
}

#[test]
fn test_empty_directory() -> Result<()> {
    let dir = tempdir()?;
    let sink = Arc::new(CollectingSink::new());

    let stats = search(&SearchConfig::new(dir.path(), "hello"), sink.clone())?;
    assert!(sink.paths().is_empty());
    assert_eq!(stats.files_dispatched, 0);
    assert_eq!(stats.directories_visited, 1);
    assert_eq!(stats.total_errors(), 0);
    Ok(())
}

/// Sink that holds each report open for a moment so tasks overlap.
#[derive(Default)]
struct SlowSink {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl MatchSink for SlowSink {
    fn report(&self, _path: &Path) -> io::Result<()> {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(2));
        self.current.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn test_in_flight_tasks_never_exceed_cap() -> Result<()> {
    let dir = tempdir()?;
    for i in 0..40 {
        create_test_files(&dir, &[(format!("top_{}.txt", i).as_str(), "needle")])?;
    }
    for i in 0..10 {
        create_test_files(&dir, &[(format!("sub/deeper/f_{}.txt", i).as_str(), "needle")])?;
    }

    for cap in [1, 4, 8] {
        let sink = Arc::new(SlowSink::default());
        let config =
            SearchConfig::new(dir.path(), "needle").with_max_tasks(NonZeroUsize::new(cap).unwrap());
        let stats = search(&config, sink.clone())?;

        assert_eq!(stats.files_matched, 50);
        assert_eq!(stats.tasks_completed, 50);
        assert_eq!(stats.tasks_in_flight, 0);
        assert!(stats.peak_in_flight >= 1);
        assert!(
            stats.peak_in_flight <= cap as u64,
            "peak {} exceeded cap {}",
            stats.peak_in_flight,
            cap
        );
        assert!(sink.peak.load(Ordering::SeqCst) <= cap);
    }
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_unopenable_entry_does_not_stop_siblings() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(
        &dir,
        &[
            ("one.txt", "hello"),
            ("two.txt", "hello again"),
            ("three.txt", "goodbye"),
        ],
    )?;
    // A dangling link cannot be stat'ed through
    std::os::unix::fs::symlink(dir.path().join("missing"), dir.path().join("broken"))?;

    let sink = Arc::new(CollectingSink::new());
    let stats = search(&SearchConfig::new(dir.path(), "hello"), sink.clone())?;

    assert_eq!(
        sink.paths(),
        vec![dir.path().join("one.txt"), dir.path().join("two.txt")]
    );
    assert_eq!(stats.errors_of(ErrorKind::EntryStatus), 1);
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_unreadable_subdirectory_is_skipped() -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir()?;
    create_test_files(&dir, &[("locked/secret.txt", "hello"), ("open.txt", "hello")])?;
    let locked = dir.path().join("locked");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000))?;

    // Privileged users can read it anyway
    let readable = fs::read_dir(&locked).is_ok();

    let sink = Arc::new(CollectingSink::new());
    let stats = search(&SearchConfig::new(dir.path(), "hello"), sink.clone())?;
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755))?;

    assert!(sink.paths().contains(&dir.path().join("open.txt")));
    if !readable {
        assert_eq!(sink.paths(), vec![dir.path().join("open.txt")]);
        assert_eq!(stats.errors_of(ErrorKind::DirectoryOpen), 1);
    }
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_among_readable_ones() -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir()?;
    create_test_files(
        &dir,
        &[
            ("a.txt", "hello"),
            ("locked.txt", "hello"),
            ("sub/b.txt", "say hello"),
            ("sub/c.txt", "nothing"),
        ],
    )?;
    let locked = dir.path().join("locked.txt");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000))?;

    // Privileged users can open it anyway
    let readable = fs::File::open(&locked).is_ok();

    let sink = Arc::new(CollectingSink::new());
    let stats = search(&SearchConfig::new(dir.path(), "hello"), sink.clone())?;
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644))?;

    let expected = vec![dir.path().join("a.txt"), dir.path().join("sub").join("b.txt")];
    let paths = sink.paths();
    for path in &expected {
        assert!(paths.contains(path), "missing {}", path.display());
    }
    assert_eq!(stats.files_dispatched, 4);
    if !readable {
        assert_eq!(paths, expected);
        assert_eq!(stats.errors_of(ErrorKind::FileOpen), 1);
        assert_eq!(stats.total_errors(), 1);
    }
    Ok(())
}

#[test]
fn test_repeated_runs_report_same_paths() -> Result<()> {
    let dir = tempdir()?;
    for i in 0..25 {
        let content = if i % 2 == 0 { "TODO: fix" } else { "done" };
        create_test_files(&dir, &[(format!("m{}/f{}.rs", i % 4, i).as_str(), content)])?;
    }

    let config = SearchConfig::new(dir.path(), "TODO").with_max_tasks(NonZeroUsize::new(5).unwrap());
    let first = run(&config)?;
    let second = run(&config)?;
    assert_eq!(first.len(), 13);
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn test_binary_and_large_files() -> Result<()> {
    let dir = tempdir()?;
    let mut big = "filler line without the word\n".repeat(20_000);
    big.push_str("finally the needle\n");
    fs::write(dir.path().join("big.log"), big)?;
    fs::write(dir.path().join("blob.bin"), b"\x00\xff\xfeneedle\x00")?;
    fs::write(dir.path().join("empty.txt"), "")?;

    let found = run(&SearchConfig::new(dir.path(), "needle"))?;
    assert_eq!(
        found,
        vec![dir.path().join("big.log"), dir.path().join("blob.bin")]
    );
    Ok(())
}
