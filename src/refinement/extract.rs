use log::debug;
use regex::Regex;

use crate::models::contract::FunctionEntry;

/// Extract the first fenced Solidity code block from a generator response.
/// Falls back to a plain fenced block, then to `None`.
pub fn extract_solidity_code(response: &str) -> Option<String> {
    let fenced = Regex::new(r"(?s)```solidity\n(.*?)```").ok()?;
    if let Some(captures) = fenced.captures(response) {
        return Some(captures[1].trim().to_string());
    }
    let plain = Regex::new(r"(?s)```\n(.*?)```").ok()?;
    plain
        .captures(response)
        .map(|captures| captures[1].trim().to_string())
}

/// Extract the annotation block proposed for one function from a generator
/// response.
///
/// The preferred shape is a fenced code block where `/// @notice ...` lines
/// sit directly above the function declaration; when the declaration cannot
/// be located, every annotation line in the response is taken instead. A
/// `None` return means the response carried no usable candidate and the
/// caller should ask for clarification rather than invoke the verifier.
pub fn extract_function_annotations(response: &str, entry: &FunctionEntry) -> Option<String> {
    let body = extract_solidity_code(response).unwrap_or_else(|| response.to_string());

    if let Some(block) = annotations_above_declaration(&body, &entry.name) {
        return Some(block);
    }

    // No declaration found; salvage whatever annotation lines are present.
    let lines: Vec<String> = body
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("///"))
        .map(strip_trailing_semicolon)
        .collect();

    if lines.is_empty() {
        debug!("No annotation lines found in response for {}", entry.name);
        None
    } else {
        Some(lines.join("\n"))
    }
}

/// Collect the contiguous `///` lines directly above `function <name>(`.
fn annotations_above_declaration(body: &str, name: &str) -> Option<String> {
    let declaration = Regex::new(&format!(r"function\s+{}\s*\(", regex::escape(name))).ok()?;
    let declaration_start = declaration.find(body)?.start();

    let mut block: Vec<String> = Vec::new();
    for line in body[..declaration_start].lines().rev() {
        let trimmed = line.trim();
        if trimmed.starts_with("///") {
            block.push(strip_trailing_semicolon(trimmed));
        } else if trimmed.is_empty() && block.is_empty() {
            // Whitespace between the declaration and its block.
            continue;
        } else {
            break;
        }
    }

    if block.is_empty() {
        None
    } else {
        block.reverse();
        Some(block.join("\n"))
    }
}

/// Generators occasionally terminate annotation lines like statements.
fn strip_trailing_semicolon(line: &str) -> String {
    line.trim_end_matches(';').trim_end().to_string()
}
