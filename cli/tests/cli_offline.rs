use std::process::Command;

fn run_fractal(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_fractal"))
        .args(args)
        .env("RUST_LOG", "off")
        .env_remove("FRACTAL_STEPS")
        .env_remove("FRACTAL_MAX_DEPTH")
        .env_remove("FRACTAL_BRANCH_FACTOR")
        .output()
        .expect("failed to run fractal binary")
}

#[test]
fn help_succeeds() {
    let out = run_fractal(&["--help"]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("tree-of-thought"));
    assert!(stdout.contains("--steps"));
}

#[test]
fn missing_query_fails() {
    let out = run_fractal(&["--offline"]);
    assert_eq!(out.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("provide a query"));
}

#[test]
fn offline_prints_best_path() {
    let out = run_fractal(&["--offline", "--steps", "2", "plan", "irrigation"]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "[0] plan irrigation");
    assert!(lines[1].starts_with("[1] ("));
    assert!(lines[2].ends_with("plan irrigation / option 1 / option 1"));
}

#[test]
fn offline_json_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.json");
    let out = run_fractal(&[
        "--offline",
        "--json",
        "--steps",
        "1",
        "--branch-factor",
        "2",
        "--file",
        path.to_str().unwrap(),
        "-m",
        "dry spell",
    ]);
    assert!(out.status.success());
    let text = std::fs::read_to_string(&path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["tree"]["content"], "dry spell");
    assert_eq!(value["tree"]["children"].as_array().unwrap().len(), 2);
    assert_eq!(value["nodes"], 3);
    assert_eq!(value["expansions"], 1);
    assert_eq!(value["best_path"].as_array().unwrap().len(), 2);
    assert_eq!(value["cancelled"], false);
}

#[test]
fn zero_steps_is_an_error() {
    let out = run_fractal(&["--offline", "--steps", "0", "q"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("--steps must be at least 1"));
}

#[test]
fn offline_tree_view() {
    let out = run_fractal(&["--offline", "--tree", "--steps", "1", "--branch-factor", "2", "q"]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.starts_with("q\n"));
    assert!(stdout.contains("├── "));
    assert!(stdout.contains("└── "));
}
