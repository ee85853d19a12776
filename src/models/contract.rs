use std::collections::BTreeMap;

/// One function signature extracted from an interface, together with the
/// documentation block that immediately precedes it (if any).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionEntry {
    pub name: String,
    /// Normalized, semicolon-terminated signature.
    pub signature: String,
    /// Raw doc/annotation block as found in the source.
    pub documentation: Option<String>,
}

/// Structural model of an annotated interface: state variables, events and
/// function signatures in declaration order. Built once per source text and
/// immutable after parsing.
#[derive(Debug, Clone, Default)]
pub struct StructuralModel {
    /// Full state-variable declaration lines, in source order.
    pub state_vars: Vec<String>,
    /// Bare identifiers of the state variables, in source order.
    pub state_var_names: Vec<String>,
    /// Full event declarations, in source order.
    pub events: Vec<String>,
    pub functions: Vec<FunctionEntry>,
}

impl StructuralModel {
    pub fn function_names(&self) -> Vec<&str> {
        self.functions.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn find_function(&self, name: &str) -> Option<&FunctionEntry> {
        self.functions.iter().find(|f| f.name == name)
    }
}

/// Mapping from function signature to confirmed annotation text.
///
/// Grows as functions are verified during a run and never shrinks; every key
/// must correspond to a function present in the run's `StructuralModel`.
#[derive(Debug, Clone, Default)]
pub struct AnnotationMap {
    entries: BTreeMap<String, String>,
}

impl AnnotationMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, signature: impl Into<String>, annotation: impl Into<String>) {
        self.entries.insert(signature.into(), annotation.into());
    }

    pub fn get(&self, signature: &str) -> Option<&str> {
        self.entries.get(signature).map(|s| s.as_str())
    }

    pub fn contains(&self, signature: &str) -> bool {
        self.entries.contains_key(signature)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
