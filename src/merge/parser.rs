use log::{debug, warn};
use regex::Regex;

use crate::errors::{SpecForgeError, SpecForgeResult};
use crate::models::contract::{FunctionEntry, StructuralModel};

/// Best-effort textual extraction of the structural model from Solidity-style
/// interface text. This is pattern matching, not a grammar: declarations the
/// patterns cannot match are skipped with a warning.
pub struct StructuralParser {
    state_var: Regex,
    event: Regex,
    function: Regex,
}

impl Default for StructuralParser {
    fn default() -> Self {
        Self::new()
    }
}

impl StructuralParser {
    pub fn new() -> Self {
        // Typed declaration with optional visibility qualifier, e.g.
        // `mapping (address => uint) _balances;` or `uint public _totalSupply;`.
        let state_var = Regex::new(
            r"(?m)^[ \t]*(?P<ty>mapping\s*\(.+\)|bytes32|uint\d*|int\d*|string|address|bool|bytes)\s+(?:(?P<vis>public|private|internal|constant)\s+)?(?P<name>\w+)\s*(?:=[^;]*)?;",
        )
        .expect("state variable pattern");

        let event = Regex::new(r"(?m)^[ \t]*event\s+\w+\s*\([^)]*\)\s*;").expect("event pattern");

        let function = Regex::new(
            r"(?m)^[ \t]*function\s+(?P<name>\w+)\s*\((?P<params>[^)]*)\)\s*(?P<modifiers>[^;()]*?)\s*(?:returns\s*\((?P<returns>[^)]*)\))?\s*;",
        )
        .expect("function pattern");

        Self {
            state_var,
            event,
            function,
        }
    }

    /// Extract state variables, events and functions from `source`.
    pub fn parse(&self, source: &str) -> StructuralModel {
        let mut model = StructuralModel::default();

        for caps in self.state_var.captures_iter(source) {
            let declaration = normalize_ws(caps.get(0).map(|m| m.as_str()).unwrap_or_default());
            model.state_vars.push(declaration);
            model.state_var_names.push(caps["name"].to_string());
        }

        for m in self.event.find_iter(source) {
            model.events.push(normalize_ws(m.as_str()));
        }

        for caps in self.function.captures_iter(source) {
            let full = caps.get(0).expect("match");
            let name = caps["name"].to_string();
            let signature = build_signature(
                &name,
                &caps["params"],
                &caps["modifiers"],
                caps.name("returns").map(|m| m.as_str()),
            );
            let documentation = preceding_doc_block(source, full.start());
            model.functions.push(FunctionEntry {
                name,
                signature,
                documentation,
            });
        }

        debug!(
            "Parsed {} state vars, {} events, {} functions",
            model.state_vars.len(),
            model.events.len(),
            model.functions.len()
        );
        model
    }

    /// Parse and fail if no functions were found, since no work is possible
    /// without at least one function to annotate.
    pub fn parse_checked(&self, source: &str) -> SpecForgeResult<StructuralModel> {
        let model = self.parse(source);
        if model.functions.is_empty() {
            warn!("No function declarations matched in source text");
            return Err(SpecForgeError::ParseError(
                "no function declarations found in source".to_string(),
            ));
        }
        Ok(model)
    }
}

/// Collapse whitespace runs into single spaces.
fn normalize_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Rebuild a normalized, semicolon-terminated signature from the captured
/// pieces.
fn build_signature(name: &str, params: &str, modifiers: &str, returns: Option<&str>) -> String {
    let mut signature = format!("function {}({})", name, normalize_ws(params));
    let modifiers = normalize_ws(modifiers);
    if !modifiers.is_empty() {
        signature.push(' ');
        signature.push_str(&modifiers);
    }
    if let Some(returns) = returns {
        signature.push_str(&format!(" returns ({})", normalize_ws(returns)));
    }
    signature.push(';');
    signature
}

/// Capture the documentation block immediately above the declaration starting
/// at byte offset `start`: either a run of `///` lines or a `/** ... */`
/// block. Returns the block with comment markers intact, one line per entry.
fn preceding_doc_block(source: &str, start: usize) -> Option<String> {
    let prefix = &source[..start];
    let mut lines: Vec<&str> = prefix.lines().collect();
    // `start` sits at the beginning of the function's own line, so the last
    // element of `lines` is everything before it on that line (usually
    // indentation) and must be discarded.
    if !prefix.ends_with('\n') {
        lines.pop();
    }

    let mut collected: Vec<String> = Vec::new();
    let mut idx = lines.len();

    while idx > 0 {
        let line = lines[idx - 1].trim();
        if collected.is_empty() && line.is_empty() {
            // Doc blocks must sit directly above the declaration.
            return None;
        }
        if line.starts_with("///") {
            collected.push(line.to_string());
            idx -= 1;
            continue;
        }
        if collected.is_empty() && line.ends_with("*/") {
            // Walk up through a block comment.
            loop {
                let line = lines[idx - 1].trim();
                collected.push(line.to_string());
                idx -= 1;
                if line.starts_with("/*") || idx == 0 {
                    break;
                }
            }
        }
        break;
    }

    if collected.is_empty() {
        None
    } else {
        collected.reverse();
        Some(collected.join("\n"))
    }
}
