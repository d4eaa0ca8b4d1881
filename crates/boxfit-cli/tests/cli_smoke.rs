//! CLI smoke tests
//!
//! `inspect` needs no fonts and always runs; `render` and `batch` are
//! skipped when the machine has none of the well-known system faces.

#![allow(clippy::expect_used, clippy::panic, clippy::unwrap_used)]

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use boxfit::fontdb::source::system_text_paths;

fn boxfit_binary() -> Command {
    Command::new(env!("CARGO_BIN_EXE_boxfit"))
}

fn system_font() -> Option<PathBuf> {
    system_text_paths().into_iter().find(|p| p.is_file())
}

fn temp_output(ext: &str) -> PathBuf {
    let id = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("boxfit_test_{}_{}.{}", std::process::id(), id, ext))
}

#[test]
fn help_lists_the_commands() {
    let output = boxfit_binary().arg("--help").output().expect("run boxfit --help");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["render", "inspect", "batch"] {
        assert!(stdout.contains(command), "missing {} in help:\n{}", command, stdout);
    }
}

#[test]
fn inspect_reports_tokens_without_fonts() {
    let output = boxfit_binary()
        .args(["inspect", "--no-system-fonts", "-t", "Hello **#world** 🎉"])
        .output()
        .expect("run boxfit inspect");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Hashtags: #world"), "{}", stdout);
    assert!(stdout.contains("Emoji: 🎉"), "{}", stdout);
    assert!(stdout.contains("bold, hashtag"), "{}", stdout);
}

#[test]
fn inspect_json_reads_stdin() {
    let mut child = boxfit_binary()
        .args(["inspect", "--json", "-m", "rich"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("spawn boxfit inspect");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"<b>bold</b> plain\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["markup"], "rich");
    assert_eq!(json["runs"][0]["text"], "bold");
    assert_eq!(json["runs"][0]["style"][0], "bold");
    assert!(json.get("fit").is_none());
}

#[test]
fn bad_arguments_fail() {
    let output = boxfit_binary()
        .args(["inspect", "-t", "x", "--markup", "latex"])
        .output()
        .unwrap();
    assert!(!output.status.success());

    let output = boxfit_binary()
        .args(["render", "-o", "out.png", "-t", "x", "--color", "nothex"])
        .output()
        .unwrap();
    assert!(!output.status.success());
}

#[test]
fn missing_font_fails_render() {
    let out = temp_output("png");
    let output = boxfit_binary()
        .args(["render", "--no-system-fonts", "-f", "/nonexistent/font.ttf", "-t", "hi", "-o"])
        .arg(&out)
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(!out.exists());
}

#[test]
fn render_writes_an_image_and_report() {
    let Some(font) = system_font() else {
        eprintln!("skipping: no system font");
        return;
    };
    let out = temp_output("png");
    let output = boxfit_binary()
        .args(["render", "--canvas", "300x200", "-x", "20", "-y", "20", "-W", "260", "-H", "160"])
        .args(["--json", "-t", "Hello #world"])
        .arg("-f")
        .arg(&font)
        .arg("-o")
        .arg(&out)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let image = image::open(&out).unwrap();
    assert_eq!((image.width(), image.height()), (300, 200));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["detected_hashtags"][0], "#world");
    assert_eq!(json["outcome"], "fits");
    fs::remove_file(&out).ok();
}

#[test]
fn batch_runs_every_job() {
    let Some(font) = system_font() else {
        eprintln!("skipping: no system font");
        return;
    };
    let a = temp_output("png");
    let b = temp_output("png");
    let jobs = temp_output("jsonl");
    fs::write(
        &jobs,
        format!(
            "{{\"text\":\"first\",\"output\":{:?}}}\n\n{{\"text\":\"second\",\"output\":{:?},\"canvas\":\"64x32\",\"width\":64,\"height\":32}}\n",
            a, b
        ),
    )
    .unwrap();

    let output = boxfit_binary()
        .args(["batch", "-q", "-i"])
        .arg(&jobs)
        .arg("-f")
        .arg(&font)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let results: Vec<serde_json::Value> = stdout
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["line"], 1);
    assert_eq!(results[1]["line"], 3);
    assert!(results.iter().all(|r| r["status"] == "ok"));
    assert_eq!(image::open(&b).unwrap().width(), 64);

    for path in [a, b, jobs] {
        fs::remove_file(path).ok();
    }
}

#[test]
fn batch_reports_bad_lines() {
    let jobs = temp_output("jsonl");
    fs::write(&jobs, "{\"text\": 5}\n").unwrap();
    let output = boxfit_binary()
        .args(["batch", "-q", "--no-system-fonts", "-i"])
        .arg(&jobs)
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"status\":\"error\""), "{}", stdout);
    fs::remove_file(jobs).ok();
}
