//! Terminal output for CLI commands.

use colored::Colorize;
use serde_json::Value;

/// Indentation per nesting level, matching `serde_json::to_string_pretty`.
const INDENT: &str = "  ";

/// Prints JSON with syntax highlighting.
///
/// Keys are cyan, strings green, numbers yellow, booleans and null magenta.
pub fn print_highlighted_json(value: &Value) { println!("{}", highlight(value, 0)); }

/// Renders `value` in pretty JSON layout with colors.
fn highlight(value: &Value, depth: usize) -> String {
    let inner = INDENT.repeat(depth + 1);
    let outer = INDENT.repeat(depth);
    let separator = format!("{}\n", ",".white());

    match value {
        Value::Null => "null".magenta().to_string(),
        Value::Bool(flag) => flag.to_string().magenta().to_string(),
        Value::Number(number) => number.to_string().yellow().to_string(),
        Value::String(text) => quoted(text).green().to_string(),
        Value::Array(items) if items.is_empty() => "[]".white().bold().to_string(),
        Value::Object(map) if map.is_empty() => "{}".white().bold().to_string(),
        Value::Array(items) => {
            let body: Vec<String> =
                items.iter().map(|item| format!("{inner}{}", highlight(item, depth + 1))).collect();
            format!("{}\n{}\n{outer}{}", "[".white().bold(), body.join(&separator), "]".white().bold())
        }
        Value::Object(map) => {
            let body: Vec<String> = map
                .iter()
                .map(|(key, item)| {
                    format!("{inner}{}{} {}", quoted(key).cyan(), ":".white(), highlight(item, depth + 1))
                })
                .collect();
            format!("{}\n{}\n{outer}{}", "{".white().bold(), body.join(&separator), "}".white().bold())
        }
    }
}

fn quoted(text: &str) -> String { serde_json::to_string(text).unwrap_or_else(|_| format!("\"{text}\"")) }

/// Prints a daemon status snapshot as aligned `label: value` lines.
pub fn print_status(status: &Value) {
    for (label, value) in status_lines(status) {
        println!("{:<9} {value}", format!("{label}:").bold());
    }
}

fn status_lines(status: &Value) -> Vec<(&'static str, String)> {
    let text = |key: &str| status[key].as_str().unwrap_or("-").to_string();

    let state = match status["state"].as_str() {
        Some(state @ ("waiting" | "picking")) => state.green().to_string(),
        Some(state @ "paused") => state.yellow().to_string(),
        Some(state) => state.red().to_string(),
        None => "-".to_string(),
    };

    vec![
        ("State", state),
        ("Folder", text("folder")),
        ("Timing", describe_policy(&status["policy"])),
        ("Images", status["poolSize"].as_u64().unwrap_or(0).to_string()),
        ("Current", text("current")),
    ]
}

/// Describes a serialized timing policy, e.g. `every 300s`.
#[must_use]
pub fn describe_policy(policy: &Value) -> String {
    let seconds = |key: &str| policy[key].as_u64().unwrap_or(0);

    match policy["mode"].as_str() {
        Some("randomized") => {
            format!("random {}s to {}s", seconds("minSeconds"), seconds("maxSeconds"))
        }
        Some(_) => format!("every {}s", seconds("fixedSeconds")),
        None => "-".to_string(),
    }
}

/// Formats a boolean as a colored string.
#[must_use]
pub fn format_bool(value: bool) -> String {
    if value {
        "✓".green().to_string()
    } else {
        "✗".red().to_string()
    }
}
