//! Import Extraction & Resolution
//!
//! Pulls raw import specifiers out of source text per language, then
//! maps each specifier to an intra-repository file path where possible.
//! Resolution is purely lexical: candidate suffixes are probed against
//! the set of known repository files. A specifier with no candidate in
//! the repository is an external dependency.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::language::Language;

fn python_import_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^import\s+([\w.]+)").expect("valid regex"))
}

fn python_from_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^from\s+([\w.]+)\s+import").expect("valid regex"))
}

fn js_es_import_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"import\s+.*?\s+from\s+['"]([^'"]+)['"]"#).expect("valid regex"))
}

fn js_require_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"require\s*\(\s*['"]([^'"]+)['"]\s*\)"#).expect("valid regex"))
}

/// Candidate suffixes probed for JS/TS relative imports.
const JS_RESOLUTION_SUFFIXES: &[&str] = &["", ".js", ".jsx", ".ts", ".tsx", "/index.js", "/index.ts"];

/// Extract raw import specifiers from source text, in document order.
///
/// Languages without patterns yield an empty list.
pub fn extract_imports(content: &str, language: Language) -> Vec<String> {
    let mut imports = Vec::new();

    match language {
        Language::Python => {
            for line in content.split('\n') {
                let line = line.trim();
                if let Some(caps) = python_import_re().captures(line) {
                    imports.push(caps[1].to_string());
                    continue;
                }
                if let Some(caps) = python_from_re().captures(line) {
                    imports.push(caps[1].to_string());
                }
            }
        }
        Language::JavaScript | Language::TypeScript | Language::Tsx => {
            for caps in js_es_import_re().captures_iter(content) {
                imports.push(caps[1].to_string());
            }
            for caps in js_require_re().captures_iter(content) {
                imports.push(caps[1].to_string());
            }
        }
        _ => {}
    }

    imports
}

/// Resolve a specifier to a repository-relative file path.
///
/// Returns `None` when no candidate exists in `known_files`; the caller
/// records such edges as external. Resolution never crosses languages.
pub fn resolve(
    specifier: &str,
    source_file: &str,
    known_files: &HashSet<String>,
    language: Language,
) -> Option<String> {
    match language {
        Language::Python => resolve_python(specifier, source_file, known_files),
        Language::JavaScript | Language::TypeScript | Language::Tsx => {
            resolve_js(specifier, source_file, known_files)
        }
        _ => None,
    }
}

/// Dotted module specifiers: `app.services.parser` -> `app/services/parser.py`
/// (or the package index `.../__init__.py`), probed absolute first and
/// then relative to the importing file's directory.
fn resolve_python(
    specifier: &str,
    source_file: &str,
    known_files: &HashSet<String>,
) -> Option<String> {
    let module_path = specifier.replace('.', "/");

    for candidate in [
        format!("{}.py", module_path),
        format!("{}/__init__.py", module_path),
    ] {
        if known_files.contains(&candidate) {
            return Some(candidate);
        }
    }

    let source_dir = parent_dir(source_file);
    let relative = join_normalized(source_dir, &module_path);
    for candidate in [
        format!("{}.py", relative),
        format!("{}/__init__.py", relative),
    ] {
        if known_files.contains(&candidate) {
            return Some(candidate);
        }
    }

    None
}

/// Relative JS/TS specifiers resolved against the importing file's
/// directory, probing extension and directory-index forms.
fn resolve_js(
    specifier: &str,
    source_file: &str,
    known_files: &HashSet<String>,
) -> Option<String> {
    if !specifier.starts_with('.') {
        return None;
    }

    let source_dir = parent_dir(source_file);
    let resolved = join_normalized(source_dir, specifier);

    for suffix in JS_RESOLUTION_SUFFIXES {
        let candidate = format!("{}{}", resolved, suffix);
        if known_files.contains(&candidate) {
            return Some(candidate);
        }
    }

    None
}

/// Directory part of a forward-slash path ("" for root-level files).
fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// Join and normalize a relative path, collapsing `.` and `..`
/// components. Always forward-slash separated.
fn join_normalized(base: &str, relative: &str) -> String {
    let mut components: Vec<&str> = Vec::new();
    for part in base.split('/').chain(relative.split('/')) {
        match part {
            "" | "." => {}
            ".." => {
                components.pop();
            }
            other => components.push(other),
        }
    }
    components.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn files(paths: &[&str]) -> HashSet<String> {
        paths.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn test_extract_python_imports() {
        let source = "\
import os
import app.services.parser
from app.models import schemas
from . import util
x = 1
";
        let imports = extract_imports(source, Language::Python);
        assert_eq!(
            imports,
            vec!["os", "app.services.parser", "app.models", "."]
        );
    }

    #[test]
    fn test_extract_js_imports() {
        let source = "\
import { parse } from './parser';
import React from 'react';
const util = require('./util');
";
        let imports = extract_imports(source, Language::JavaScript);
        assert_eq!(imports, vec!["./parser", "react", "./util"]);
    }

    #[test]
    fn test_extract_unknown_language_is_empty() {
        assert!(extract_imports("use std::fs;", Language::Rust).is_empty());
    }

    #[test]
    fn test_resolve_python_dotted_module() {
        let known = files(&["app/services/parser.py", "app/models/__init__.py"]);
        assert_eq!(
            resolve("app.services.parser", "app/main.py", &known, Language::Python),
            Some("app/services/parser.py".to_string())
        );
        assert_eq!(
            resolve("app.models", "app/main.py", &known, Language::Python),
            Some("app/models/__init__.py".to_string())
        );
    }

    #[test]
    fn test_resolve_python_relative_to_source() {
        let known = files(&["app/util.py"]);
        assert_eq!(
            resolve("util", "app/main.py", &known, Language::Python),
            Some("app/util.py".to_string())
        );
    }

    #[test]
    fn test_resolve_python_external() {
        let known = files(&["app/main.py"]);
        assert_eq!(resolve("requests", "app/main.py", &known, Language::Python), None);
    }

    #[test]
    fn test_resolve_js_relative() {
        let known = files(&["src/parser.ts", "src/lib/index.ts"]);
        assert_eq!(
            resolve("./parser", "src/main.ts", &known, Language::TypeScript),
            Some("src/parser.ts".to_string())
        );
        assert_eq!(
            resolve("./lib", "src/main.ts", &known, Language::TypeScript),
            Some("src/lib/index.ts".to_string())
        );
    }

    #[test]
    fn test_resolve_js_parent_traversal() {
        let known = files(&["src/util.js"]);
        assert_eq!(
            resolve("../util", "src/components/app.js", &known, Language::JavaScript),
            Some("src/util.js".to_string())
        );
    }

    #[test]
    fn test_resolve_js_bare_specifier_is_external() {
        let known = files(&["src/react.js"]);
        assert_eq!(resolve("react", "src/main.js", &known, Language::JavaScript), None);
    }

    #[test]
    fn test_join_normalized() {
        assert_eq!(join_normalized("src/components", "../util"), "src/util");
        assert_eq!(join_normalized("", "util"), "util");
        assert_eq!(join_normalized("src", "./a/./b"), "src/a/b");
    }
}
