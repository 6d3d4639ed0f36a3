//! Text and JSON output for search results.

use std::fmt::Write as _;
use std::path::Path;

use fractal::{EngineEvent, ThoughtNode, TreeSnapshot};

/// Shortens `s` to at most `max` chars, marking the cut with `...`.
pub fn truncate(s: &str, max: usize) -> String {
    if max == 0 || s.chars().count() <= max {
        return s.to_string();
    }
    let keep = max.saturating_sub(3);
    let mut out: String = s.chars().take(keep).collect();
    out.push_str("...");
    out
}

fn one_line(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Numbered best path, one thought per line; the root line has no score.
pub fn render_path(path: &[ThoughtNode], max_len: usize) -> String {
    let mut out = String::new();
    for node in path {
        let text = truncate(&one_line(&node.content), max_len);
        if node.is_root() {
            let _ = writeln!(out, "[{}] {}", node.depth, text);
        } else {
            let _ = writeln!(out, "[{}] ({:.2}) {}", node.depth, node.score, text);
        }
    }
    out
}

/// Box-drawing view of the whole tree.
pub fn render_tree(tree: &TreeSnapshot, max_len: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", truncate(&one_line(&tree.content), max_len));
    // (node, prefix for its own children, is last sibling)
    let mut stack: Vec<(&TreeSnapshot, String, bool)> = Vec::new();
    for (i, child) in tree.children.iter().enumerate().rev() {
        stack.push((child, String::new(), i + 1 == tree.children.len()));
    }
    while let Some((node, prefix, last)) = stack.pop() {
        let branch = if last { "└── " } else { "├── " };
        let _ = writeln!(
            out,
            "{}{}({:.2}, {}) {}",
            prefix,
            branch,
            node.score,
            node.status,
            truncate(&one_line(&node.content), max_len)
        );
        let child_prefix = format!("{}{}", prefix, if last { "    " } else { "│   " });
        for (i, child) in node.children.iter().enumerate().rev() {
            stack.push((child, child_prefix.clone(), i + 1 == node.children.len()));
        }
    }
    out
}

/// Single-line description of a live engine event for `--verbose`.
pub fn describe_event(event: &EngineEvent) -> String {
    match event {
        EngineEvent::RootCreated { id } => format!("root {}", id),
        EngineEvent::Expanded { parent, children } => {
            format!("expanded {} into {} children", parent, children.len())
        }
        EngineEvent::ExpansionFailed { id, reason } => {
            format!("expansion of {} failed: {}", id, reason)
        }
        EngineEvent::Evaluated {
            id,
            score,
            fallback,
        } => {
            if *fallback {
                format!("scored {} {:.2} (neutral fallback)", id, score)
            } else {
                format!("scored {} {:.2}", id, score)
            }
        }
        EngineEvent::Pruned { id } => format!("pruned {}", id),
    }
}

/// Writes JSON to `file`, or stdout when `None`. Compact unless `pretty`.
pub fn write_json(
    value: &serde_json::Value,
    file: Option<&Path>,
    pretty: bool,
) -> Result<(), crate::CliError> {
    let s = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    match file {
        Some(path) => std::fs::write(path, format!("{}\n", s))?,
        None => {
            println!("{}", s);
            std::io::Write::flush(&mut std::io::stdout())?;
        }
    }
    Ok(())
}
