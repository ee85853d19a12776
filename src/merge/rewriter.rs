use regex::Regex;

/// Rewrites identifier references inside one function's annotation block so
/// the block is valid in the merge artifact's namespace.
///
/// Three rules, applied in order:
/// 1. every bare occurrence of a declared state-variable name becomes
///    `prefix.name`;
/// 2. `__verifier_old_uint`/`__verifier_old_bool` wrappers around a prefixed
///    expression are re-qualified with `prefix_old`, because the verifier's
///    before and after views of state are distinct namespaces;
/// 3. every resulting line is re-emitted behind a `///` doc marker.
///
/// Purely textual: a local that shadows a state-variable name is rewritten
/// too. Word-boundary matching is the only guard.
pub struct ReferenceRewriter {
    prefix: Option<String>,
}

impl ReferenceRewriter {
    pub fn new(prefix: Option<String>) -> Self {
        Self { prefix }
    }

    pub fn unprefixed() -> Self {
        Self { prefix: None }
    }

    /// Rewrite a raw documentation block for the given state variables.
    pub fn rewrite_block(&self, documentation: &str, state_var_names: &[String]) -> String {
        let mut lines: Vec<String> = documentation
            .lines()
            .filter_map(strip_comment_markers)
            .collect();

        if let Some(prefix) = &self.prefix {
            lines = lines
                .into_iter()
                .map(|line| {
                    let prefixed = add_prefix(&line, state_var_names, prefix);
                    rewrite_old_references(&prefixed, prefix)
                })
                .collect();
        }

        lines
            .iter()
            .map(|line| {
                if line.is_empty() || line.starts_with(' ') {
                    format!("///{}", line)
                } else {
                    format!("/// {}", line)
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Drop comment syntax, keeping the annotation text itself. Pure delimiter
/// lines (`/**`, `*/`) vanish.
fn strip_comment_markers(line: &str) -> Option<String> {
    let trimmed = line.trim_start();
    if let Some(rest) = trimmed.strip_prefix("///") {
        return Some(rest.to_string());
    }
    if trimmed == "/**" || trimmed == "/*" || trimmed == "*/" {
        return None;
    }
    if let Some(rest) = trimmed.strip_prefix("/**") {
        let rest = rest.trim_end().trim_end_matches("*/").trim_end();
        return Some(rest.to_string());
    }
    if let Some(rest) = trimmed.strip_prefix('*') {
        let rest = rest.trim_end().trim_end_matches("*/").trim_end();
        return Some(rest.to_string());
    }
    Some(trimmed.to_string())
}

/// Qualify every bare occurrence of a state-variable name with `prefix.`.
/// Occurrences already behind a `.` are left alone.
fn add_prefix(annotation: &str, state_var_names: &[String], prefix: &str) -> String {
    let mut result = annotation.to_string();
    for name in state_var_names {
        let pattern = Regex::new(&format!(r"(?P<lead>^|[^\w.])(?P<var>{})\b", regex::escape(name)))
            .expect("state variable pattern");
        result = pattern
            .replace_all(&result, |caps: &regex::Captures| {
                format!("{}{}.{}", &caps["lead"], prefix, &caps["var"])
            })
            .into_owned();
    }
    result
}

/// Re-qualify old-value wrappers: inside `__verifier_old_*( ... )` the
/// `prefix.` namespace becomes `prefix_old.`.
fn rewrite_old_references(annotation: &str, prefix: &str) -> String {
    let pattern = Regex::new(&format!(
        r"(?P<kind>__verifier_old_(?:uint|bool))\s*\(\s*(?P<expr>{}\..*?)\s*\)",
        regex::escape(prefix)
    ))
    .expect("old reference pattern");

    pattern
        .replace_all(annotation, |caps: &regex::Captures| {
            let expr = caps["expr"].replace(
                &format!("{}.", prefix),
                &format!("{}_old.", prefix),
            );
            format!("{}({})", &caps["kind"], expr)
        })
        .into_owned()
}
