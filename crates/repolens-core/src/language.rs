//! Language Detection
//!
//! Maps file paths to language identifiers via an extension table.
//! Languages fall into three tiers:
//!
//! - Grammar languages (Python, JavaScript, TypeScript, TSX) get a
//!   tree-sitter adapter.
//! - Other code languages are handled by the heuristic fallback extractor.
//! - Text files (markdown, config, docs) are split into sections.

use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// Languages recognized by the structural model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    Tsx,
    Java,
    Go,
    Rust,
    C,
    Cpp,
    Ruby,
    Php,
    /// Markdown, config files, and other non-code text.
    Text,
}

impl Language {
    /// Get the language name as used in node metadata and JSON output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Tsx => "typescript", // TSX shares TypeScript semantics
            Language::Java => "java",
            Language::Go => "go",
            Language::Rust => "rust",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::Ruby => "ruby",
            Language::Php => "php",
            Language::Text => "text",
        }
    }

    /// Detect language from file extension (without the dot).
    ///
    /// Returns `None` if the extension is not recognized.
    pub fn from_extension(ext: &str) -> Option<Self> {
        get_extension_map().get(ext.to_lowercase().as_str()).copied()
    }

    /// Detect language from file path.
    ///
    /// Falls back to `Text` for known text extensions and well-known
    /// extensionless files (Dockerfile, Makefile, ...).
    pub fn from_path(path: &Path) -> Option<Self> {
        if let Some(lang) = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
        {
            return Some(lang);
        }

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());
        if let Some(ext) = &ext {
            if TEXT_EXTENSIONS.contains(&ext.as_str()) {
                return Some(Language::Text);
            }
        }

        // Extensionless files that are conventionally text
        let basename = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.to_lowercase())
            .unwrap_or_default();
        if ext.is_none()
            && matches!(
                basename.as_str(),
                "dockerfile" | "makefile" | "gemfile" | "rakefile" | "procfile"
            )
        {
            return Some(Language::Text);
        }

        None
    }

    /// Whether a tree-sitter grammar adapter exists for this language.
    pub fn has_grammar(&self) -> bool {
        matches!(
            self,
            Language::Python | Language::JavaScript | Language::TypeScript | Language::Tsx
        )
    }

    /// Whether this language is plain text rather than code.
    pub fn is_text(&self) -> bool {
        matches!(self, Language::Text)
    }

    /// Whether the dependency graph tracks imports for this language.
    ///
    /// Import extraction and resolution rules exist for Python and the
    /// JS/TS family; other languages are excluded from the graph.
    pub fn tracks_imports(&self) -> bool {
        matches!(
            self,
            Language::Python | Language::JavaScript | Language::TypeScript | Language::Tsx
        )
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Text/doc file extensions that are walked but never parsed as code.
const TEXT_EXTENSIONS: &[&str] = &[
    "md", "txt", "rst", "json", "yaml", "yml", "toml", "cfg", "ini", "csv", "xml", "html", "css",
    "scss", "sql", "sh", "bash", "zsh", "env", "gitignore", "editorconfig",
];

/// Static extension to language mapping.
static EXTENSION_MAP: OnceLock<HashMap<&'static str, Language>> = OnceLock::new();

fn get_extension_map() -> &'static HashMap<&'static str, Language> {
    EXTENSION_MAP.get_or_init(|| {
        let mut map = HashMap::new();
        // Python
        map.insert("py", Language::Python);
        // JavaScript
        map.insert("js", Language::JavaScript);
        map.insert("jsx", Language::JavaScript);
        map.insert("mjs", Language::JavaScript);
        map.insert("cjs", Language::JavaScript);
        // TypeScript
        map.insert("ts", Language::TypeScript);
        map.insert("tsx", Language::Tsx);
        // Java
        map.insert("java", Language::Java);
        // Go
        map.insert("go", Language::Go);
        // Rust
        map.insert("rs", Language::Rust);
        // C
        map.insert("c", Language::C);
        map.insert("h", Language::C);
        // C++
        map.insert("cpp", Language::Cpp);
        map.insert("hpp", Language::Cpp);
        map.insert("cc", Language::Cpp);
        map.insert("cxx", Language::Cpp);
        // Ruby
        map.insert("rb", Language::Ruby);
        // PHP
        map.insert("php", Language::Php);
        map
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_extension() {
        assert_eq!(Language::from_extension("py"), Some(Language::Python));
        assert_eq!(Language::from_extension("PY"), Some(Language::Python));
        assert_eq!(Language::from_extension("jsx"), Some(Language::JavaScript));
        assert_eq!(Language::from_extension("tsx"), Some(Language::Tsx));
        assert_eq!(Language::from_extension("exe"), None);
    }

    #[test]
    fn test_from_path() {
        assert_eq!(
            Language::from_path(Path::new("src/app/main.py")),
            Some(Language::Python)
        );
        assert_eq!(
            Language::from_path(Path::new("README.md")),
            Some(Language::Text)
        );
        assert_eq!(
            Language::from_path(Path::new("Dockerfile")),
            Some(Language::Text)
        );
        assert_eq!(Language::from_path(Path::new("image.png")), None);
    }

    #[test]
    fn test_grammar_and_import_tiers() {
        assert!(Language::Python.has_grammar());
        assert!(Language::Tsx.has_grammar());
        assert!(!Language::Java.has_grammar());
        assert!(!Language::Text.has_grammar());

        assert!(Language::Python.tracks_imports());
        assert!(!Language::Rust.tracks_imports());
        assert!(!Language::Text.tracks_imports());
    }

    #[test]
    fn test_display_matches_as_str() {
        assert_eq!(Language::Cpp.to_string(), "cpp");
        assert_eq!(Language::Tsx.to_string(), "typescript");
    }
}
