#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::{TempDir, tempdir};

pub const REGION_SALES: &str = "region,sales\nEast,10\nWest,5\nEast,20\n";

pub const ORDERS: &str = "\
ordered_at,region,status,price,quantity,rating
2024-01-01,north,shipped,12.50,3,4
2024-01-02,south,pending,8.00,1,5
2024-01-03,north,shipped,15.25,2,3
2024-01-04,east,processing,22.00,5,4
2024-01-05,south,shipped,9.75,4,2
2024-01-06,east,pending,11.00,2,5
2024-01-07,north,processing,18.40,6,4
2024-01-08,south,shipped,7.10,1,3
";

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }
}

pub fn binary() -> Command {
    Command::cargo_bin("csv-insights").expect("binary exists")
}
