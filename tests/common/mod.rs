//! Shared test helpers for integration tests
//!
//! Builds a small but complete data set: eight specimens over two builds,
//! measured twice each on one cylinder diameter and all twelve hexagon
//! flatness planes, plus one specimen that is missing from the layout.

#![allow(dead_code)]

use assert_cmd::cargo;
use assert_cmd::Command;
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub const DIAMETER: &str = "Diameter_Cyl_8mm_Pos";

/// Specimens present in the layout
pub const SPECIMENS: usize = 8;

/// Helper to get a bmt command
pub fn bmt() -> Command {
    Command::new(cargo::cargo_bin!("bmt"))
}

/// A measurement log and layout written into a temp directory
pub struct Dataset {
    pub dir: TempDir,
    pub results: PathBuf,
    pub layout: PathBuf,
}

impl Dataset {
    /// A `bmt` command pointed at this data set, isolated from the environment
    pub fn cmd(&self) -> Command {
        let mut cmd = bmt();
        cmd.current_dir(self.dir.path())
            .env_remove("BMT_RESULTS")
            .env_remove("BMT_LAYOUT")
            .env_remove("BMT_STRATIFY")
            .arg("--results")
            .arg(&self.results)
            .arg("--layout")
            .arg(&self.layout)
            .arg("--quiet");
        cmd
    }
}

pub fn plane_names() -> Vec<String> {
    ["HX1", "HX2"]
        .iter()
        .flat_map(|fx| (1..=6).map(move |p| format!("Flatness_{}_Plane{}", fx, p)))
        .collect()
}

fn build_of(i: usize) -> usize {
    if i < SPECIMENS / 2 {
        1
    } else {
        2
    }
}

/// Layout CSV (`;`-delimited) for specimens P01..P08
pub fn layout_csv() -> String {
    let mut out = String::from("part_name;build;x_pos;y_pos;z_pos;angle\n");
    for i in 0..SPECIMENS {
        let angle = [0, 45, 90, 135][i % 4];
        writeln!(
            out,
            "P{:02};{};{};{};{};{}",
            i + 1,
            build_of(i),
            i % 4 + 1,
            i / 4 + 1,
            i % 2 + 1,
            angle
        )
        .unwrap();
    }
    out
}

/// Measurement CSV (`,`-delimited, canonical headers)
///
/// Build 2 reads about 10 µm larger than build 1 on the diameter. With
/// `orphan` a ninth specimen without layout entry is measured too.
pub fn results_csv(orphan: bool) -> String {
    let mut out =
        String::from("uuid,part_name,rep,char_name,actual,nominal,time,char_number\n");
    let mut uuid = 0;
    let specimens = if orphan { SPECIMENS + 1 } else { SPECIMENS };
    for i in 0..specimens {
        let part = format!("P{:02}", i + 1);
        for rep in 1..=2 {
            let build = build_of(i.min(SPECIMENS - 1)) as f64;
            let actual = 8.0 + 0.01 * build + 0.002 * (i % 4) as f64 + 0.0003 * (i + 1) as f64 * rep as f64;
            uuid += 1;
            writeln!(
                out,
                "u{},{},{},{},{:.4},8.0,2024-03-01 10:00:00,1",
                uuid, part, rep, DIAMETER, actual
            )
            .unwrap();

            for (k, plane) in plane_names().iter().enumerate() {
                let actual = 0.02 + 0.001 * (i % 3) as f64 + 0.0002 * (k + 1) as f64 * rep as f64;
                uuid += 1;
                writeln!(
                    out,
                    "u{},{},{},{},{:.4},0.0,2024-03-01 10:05:00,{}",
                    uuid,
                    part,
                    rep,
                    plane,
                    actual,
                    k + 2
                )
                .unwrap();
            }
        }
    }
    out
}

/// Write the standard data set into a fresh temp directory
pub fn setup_dataset() -> Dataset {
    setup_dataset_with(true)
}

/// Write the data set, with or without the specimen missing from the layout
pub fn setup_dataset_with(orphan: bool) -> Dataset {
    let dir = TempDir::new().unwrap();
    let results = dir.path().join("results.csv");
    let layout = dir.path().join("layout.csv");
    fs::write(&results, results_csv(orphan)).unwrap();
    fs::write(&layout, layout_csv()).unwrap();
    Dataset {
        dir,
        results,
        layout,
    }
}

/// Parse stdout of a successful command as JSON
pub fn json_stdout(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.output().unwrap();
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}
