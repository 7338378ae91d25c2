//! Diagnostic extraction from Rolldown errors.
//!
//! Rolldown reports failures as batched diagnostics whose structure changes
//! between releases, so we only rely on their formatted text and pull out
//! the pieces worth showing: what went wrong, where, and any help line.

use serde::{Deserialize, Serialize};

/// One diagnostic extracted from a failed bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleDiagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub file: Option<String>,
    pub help: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    ParseError,
    UnresolvedEntry,
    UnresolvedImport,
    Plugin,
    Transform,
    Other,
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiagnosticKind::ParseError => write!(f, "ParseError"),
            DiagnosticKind::UnresolvedEntry => write!(f, "UnresolvedEntry"),
            DiagnosticKind::UnresolvedImport => write!(f, "UnresolvedImport"),
            DiagnosticKind::Plugin => write!(f, "Plugin"),
            DiagnosticKind::Transform => write!(f, "Transform"),
            DiagnosticKind::Other => write!(f, "Other"),
        }
    }
}

/// Extract diagnostics from any Rolldown error value.
pub fn extract_from_rolldown_error(error: &dyn std::fmt::Debug) -> Vec<BundleDiagnostic> {
    let error_str = format!("{error:?}");

    let parts: Vec<&str> = error_str
        .split("BatchedBuildDiagnostic")
        .filter(|s| s.chars().any(char::is_alphanumeric))
        .collect();

    if parts.len() > 1 {
        parts.iter().map(|part| extract_single(part)).collect()
    } else {
        vec![extract_single(&error_str)]
    }
}

fn extract_single(error_str: &str) -> BundleDiagnostic {
    let kind = if error_str.contains("UnresolvedEntry") {
        DiagnosticKind::UnresolvedEntry
    } else if error_str.contains("UnresolvedImport") || error_str.contains("Could not resolve") {
        DiagnosticKind::UnresolvedImport
    } else if error_str.contains("Parse error")
        || error_str.contains("Syntax")
        || error_str.contains("Expected")
    {
        DiagnosticKind::ParseError
    } else if error_str.contains("Plugin") {
        DiagnosticKind::Plugin
    } else if error_str.contains("Transform") || error_str.contains("transform") {
        DiagnosticKind::Transform
    } else {
        DiagnosticKind::Other
    };

    BundleDiagnostic {
        kind,
        message: error_str.trim().to_string(),
        file: extract_file_path(error_str),
        help: extract_help_text(error_str),
    }
}

/// Extract the first script path mentioned in a message.
fn extract_file_path(text: &str) -> Option<String> {
    for ext in &[".js", ".ts", ".jsx", ".tsx", ".mjs", ".cjs", ".json"] {
        if let Some(pos) = text.find(ext) {
            let before = &text[..pos + ext.len()];
            for indicator in &["\"", "'", "in ", "at ", "file: ", "path: "] {
                if let Some(start) = before.rfind(indicator) {
                    let path_str = before[start + indicator.len()..].trim();
                    if !path_str.is_empty() && !path_str.contains(char::is_whitespace) {
                        return Some(path_str.to_string());
                    }
                }
            }
        }
    }
    None
}

fn extract_help_text(text: &str) -> Option<String> {
    for indicator in &["help: ", "Help: ", "hint: ", "Hint: "] {
        if let Some(pos) = text.find(indicator) {
            let after = &text[pos + indicator.len()..];
            let help_str = after.lines().next().unwrap_or("").trim();
            if !help_str.is_empty() {
                return Some(help_str.to_string());
            }
        }
    }
    None
}
