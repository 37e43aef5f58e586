//! Cross-process scenarios in shared mode
//!
//! Worker processes are this same test executable, re-launched with a filter
//! that selects only `process_worker` and with its role passed through the
//! environment. Run normally (no role set) `process_worker` does nothing.
//!
//! ```bash
//! cargo test --test process_scenarios
//! ```

mod common;

use std::collections::HashMap;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use gatekv::{GateMode, Value};
use tempfile::TempDir;

use common::open_store;

const ROLE_ENV: &str = "GATEKV_TEST_ROLE";
const ID_ENV: &str = "GATEKV_TEST_ID";
const DIR_ENV: &str = "GATEKV_TEST_DIR";

const STORE_FILE: &str = "shared.snap";
const HELD_MARKER: &str = "slot-held";

// ============================================================================
// Worker entry point
// ============================================================================

#[test]
fn process_worker() {
    let Ok(role) = std::env::var(ROLE_ENV) else {
        return;
    };
    let id = std::env::var(ID_ENV).unwrap();
    let dir = std::path::PathBuf::from(std::env::var(DIR_ENV).unwrap());
    let store = open_store(&dir, STORE_FILE, GateMode::Shared);

    match role.as_str() {
        "writer" => {
            for k in 0..10 {
                let inserted = store.set(k, Value::from(id.as_str())).unwrap();
                println!("SET {} {}", k, inserted);
                thread::sleep(Duration::from_millis(2));
            }
        }
        "reader" => {
            for k in 0..5 {
                match store.get(&k).unwrap() {
                    Some(v) => println!("GOT {} {}", k, v.as_str().unwrap()),
                    None => println!("GOT {} -", k),
                }
                thread::sleep(Duration::from_millis(2));
            }
        }
        "holder" => {
            let _slot = store.gate().acquire_read_slot().unwrap();
            std::fs::write(dir.join(HELD_MARKER), b"held").unwrap();
            thread::sleep(Duration::from_millis(400));
        }
        other => panic!("unknown worker role {}", other),
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn spawn_worker(role: &str, id: &str, dir: &Path) -> Child {
    Command::new(std::env::current_exe().unwrap())
        .args(["process_worker", "--exact", "--nocapture", "--test-threads=1"])
        .env(ROLE_ENV, role)
        .env(ID_ENV, id)
        .env(DIR_ENV, dir)
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .unwrap()
}

/// Wait for a worker and return its tagged output lines split into fields.
fn collect(child: Child, tag: &str) -> Vec<Vec<String>> {
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success(), "worker exited with {}", output.status);
    tagged_lines(&String::from_utf8(output.stdout).unwrap(), tag)
}

/// The harness prints `test process_worker ... ` without a newline, so the
/// first worker line shares a line with it. Match the tag anywhere.
fn tagged_lines(stdout: &str, tag: &str) -> Vec<Vec<String>> {
    stdout
        .lines()
        .filter_map(|line| line.find(tag).map(|i| &line[i..]))
        .map(|line| line.split_whitespace().skip(1).map(str::to_string).collect())
        .collect()
}

#[test]
fn test_tagged_lines_after_harness_prefix() {
    let stdout = "\nrunning 1 test\ntest process_worker ... SET 0 true\nSET 1 false\nok\n";
    let lines = tagged_lines(stdout, "SET");
    assert_eq!(
        lines,
        vec![
            vec!["0".to_string(), "true".to_string()],
            vec!["1".to_string(), "false".to_string()],
        ]
    );
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_writer_and_reader_processes() {
    let dir = TempDir::new().unwrap();

    let writers: Vec<(&str, Child)> = ["A", "B"]
        .into_iter()
        .map(|id| (id, spawn_worker("writer", id, dir.path())))
        .collect();
    let readers: Vec<Child> = (0..10)
        .map(|i| spawn_worker("reader", &i.to_string(), dir.path()))
        .collect();

    let mut winners: HashMap<i64, Vec<String>> = HashMap::new();
    for (id, child) in writers {
        let lines = collect(child, "SET");
        assert_eq!(lines.len(), 10, "writer {} reported {} sets", id, lines.len());
        for fields in lines {
            let key: i64 = fields[0].parse().unwrap();
            if fields[1] == "true" {
                winners.entry(key).or_default().push(id.to_string());
            }
        }
    }
    let observed: Vec<Vec<String>> = readers
        .into_iter()
        .flat_map(|child| collect(child, "GOT"))
        .collect();

    let store = open_store(dir.path(), STORE_FILE, GateMode::Shared);
    let final_state = store.entries().unwrap();
    assert_eq!(final_state.len(), 10);

    for k in 0..10i64 {
        let ids = winners.get(&k).cloned().unwrap_or_default();
        assert_eq!(ids.len(), 1, "key {} won by {:?}", k, ids);
        assert_eq!(final_state.get(&k), Some(&Value::from(ids[0].as_str())));
    }

    assert_eq!(observed.len(), 50);
    for fields in observed {
        let key: i64 = fields[0].parse().unwrap();
        if fields[1] != "-" {
            assert_eq!(final_state.get(&key), Some(&Value::from(fields[1].as_str())));
        }
    }
}

#[test]
fn test_writer_waits_for_reader_in_other_process() {
    let dir = TempDir::new().unwrap();
    // Create the gate (and its recorded capacity) before the worker starts.
    let store = open_store(dir.path(), STORE_FILE, GateMode::Shared);

    let holder = spawn_worker("holder", "h", dir.path());
    let marker = dir.path().join(HELD_MARKER);
    let deadline = Instant::now() + Duration::from_secs(30);
    while !marker.exists() {
        assert!(Instant::now() < deadline, "holder never took its slot");
        thread::sleep(Duration::from_millis(5));
    }

    let started = Instant::now();
    assert!(store.set(1, Value::from("after")).unwrap());
    let waited = started.elapsed();

    collect(holder, "");
    assert!(
        waited >= Duration::from_millis(150),
        "writer finished after {:?} while another process held a read slot",
        waited
    );
    assert_eq!(store.get(&1).unwrap(), Some(Value::from("after")));
}
