//! Human-readable output sink
//!
//! Progress messages go to stdout with a blue or green `>` prefix; warnings
//! and errors go to stderr with a yellow or red `!`. JSON results are
//! pretty-printed and, when stdout is a terminal, colored by token type.

use std::io::IsTerminal;

use colored::Colorize;
use serde_json::Value;

/// Print an informational message to stdout
pub fn info(msg: &str) {
    println!("{} {}", ">".blue(), msg);
}

/// Print a success message to stdout
pub fn success(msg: &str) {
    println!("{} {}", ">".green(), msg);
}

/// Print a warning to stderr
pub fn warn(msg: &str) {
    eprintln!("{} {}", "!".yellow(), msg);
}

/// Print an error to stderr
pub fn error(msg: &str) {
    eprintln!("{} {}", "!".red(), msg);
}

/// Bold text
pub fn bold(s: &str) -> String {
    s.bold().to_string()
}

/// Dimmed text
pub fn dim(s: &str) -> String {
    s.dimmed().to_string()
}

/// Pretty-print a JSON value to stdout
///
/// Colors are applied only when stdout is a terminal, so piping the
/// output into `jq` or a file yields plain JSON.
pub fn print_json(value: &Value) {
    if std::io::stdout().is_terminal() {
        println!("{}", render_json(value, 0));
    } else {
        match serde_json::to_string_pretty(value) {
            Ok(text) => println!("{text}"),
            Err(_) => println!("{value}"),
        }
    }
}

/// Render a JSON value with two-space indentation and ANSI colors.
///
/// Keys are cyan, strings green, numbers magenta, booleans yellow and
/// `null` dimmed.
pub fn render_json(value: &Value, depth: usize) -> String {
    let pad = "  ".repeat(depth + 1);
    let close_pad = "  ".repeat(depth);

    match value {
        Value::Null => "null".dimmed().to_string(),
        Value::Bool(b) => b.to_string().yellow().to_string(),
        Value::Number(n) => n.to_string().magenta().to_string(),
        Value::String(_) => value.to_string().green().to_string(),
        Value::Array(items) if items.is_empty() => "[]".to_string(),
        Value::Object(map) if map.is_empty() => "{}".to_string(),
        Value::Array(items) => {
            let body: Vec<String> = items
                .iter()
                .map(|item| format!("{pad}{}", render_json(item, depth + 1)))
                .collect();
            format!("[\n{}\n{close_pad}]", body.join(",\n"))
        }
        Value::Object(map) => {
            let body: Vec<String> = map
                .iter()
                .map(|(key, item)| {
                    let key = Value::String(key.clone()).to_string();
                    format!("{pad}{}: {}", key.cyan(), render_json(item, depth + 1))
                })
                .collect();
            format!("{{\n{}\n{close_pad}}}", body.join(",\n"))
        }
    }
}
