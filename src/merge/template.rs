use std::collections::HashMap;
use std::fs;
use std::path::Path;

use regex::{Captures, Regex};

use crate::errors::{SpecForgeError, SpecForgeResult};

/// A fixed contract template with one named substitution placeholder per
/// function (`$name` or `${name}`; `$$` escapes a literal dollar sign).
///
/// Substitution is a direct placeholder-to-text mechanism, not a templating
/// language.
pub struct ContractTemplate {
    text: String,
    placeholder: Regex,
}

impl ContractTemplate {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            placeholder: Regex::new(r"\$(?:(?P<escaped>\$)|\{(?P<braced>\w+)\}|(?P<named>\w+))")
                .expect("placeholder pattern"),
        }
    }

    pub fn from_file(path: &Path) -> SpecForgeResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            SpecForgeError::SystemError(format!(
                "Failed to read template {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(Self::new(text))
    }

    /// Names of all placeholders, in order of appearance.
    pub fn placeholder_names(&self) -> Vec<String> {
        self.placeholder
            .captures_iter(&self.text)
            .filter_map(|caps| {
                caps.name("braced")
                    .or_else(|| caps.name("named"))
                    .map(|m| m.as_str().to_string())
            })
            .collect()
    }

    /// Substitute every placeholder from `values`. A placeholder without a
    /// corresponding key is a naming error; keys without placeholders are
    /// ignored.
    pub fn substitute(&self, values: &HashMap<String, String>) -> SpecForgeResult<String> {
        let mut missing: Option<String> = None;
        let result = self
            .placeholder
            .replace_all(&self.text, |caps: &Captures| {
                if caps.name("escaped").is_some() {
                    return "$".to_string();
                }
                let name = caps
                    .name("braced")
                    .or_else(|| caps.name("named"))
                    .map(|m| m.as_str())
                    .unwrap_or_default();
                match values.get(name) {
                    Some(value) => value.clone(),
                    None => {
                        if missing.is_none() {
                            missing = Some(name.to_string());
                        }
                        String::new()
                    }
                }
            })
            .into_owned();

        if let Some(name) = missing {
            return Err(SpecForgeError::UnboundPlaceholder(name));
        }
        Ok(result)
    }

    /// Substitute and write the artifact, since the external verifier only
    /// operates on file paths.
    pub fn substitute_to_file(
        &self,
        values: &HashMap<String, String>,
        out_path: &Path,
    ) -> SpecForgeResult<String> {
        let artifact = self.substitute(values)?;
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(out_path, &artifact)?;
        Ok(artifact)
    }
}
