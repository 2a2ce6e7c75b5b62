//! Heuristic Fallback Extractor
//!
//! Line-oriented regex extraction used when no grammar adapter exists
//! for a language or the grammar parse failed. For indentation-significant
//! languages the block extent is estimated by scanning forward to the
//! first line at or below the declaration's indentation; brace-delimited
//! languages get single-line declarations only. Reduced fidelity is the
//! accepted trade-off.
//!
//! Text files are handled here too: markdown splits on headings, other
//! text is chunked into fixed-size sections.

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::language::Language;
use crate::parser::{NodeOrigin, SyntaxKind, SyntaxNode};

/// Non-markdown text files are chunked into sections of this many lines.
const TEXT_CHUNK_LINES: usize = 30;

/// Maximum length of a section name taken from content.
const SECTION_NAME_LIMIT: usize = 60;

fn python_func_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\s*)def\s+(\w+)\s*\((.*?)\).*?:").expect("valid regex"))
}

fn python_class_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\s*)class\s+(\w+).*?:").expect("valid regex"))
}

fn python_import_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:from\s+\S+\s+)?import\s+.+").expect("valid regex"))
}

fn js_func_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?:async\s+)?(?:function\s+(\w+)|(?:const|let|var)\s+(\w+)\s*=\s*(?:async\s+)?(?:\([^)]*\)|\w+)\s*=>)",
        )
        .expect("valid regex")
    })
}

fn js_class_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"class\s+(\w+)").expect("valid regex"))
}

fn js_import_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^import\s+.+").expect("valid regex"))
}

fn heading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^#{1,6}\s+").expect("valid regex"))
}

/// Extract top-level declarations by pattern matching.
///
/// Languages without patterns yield an empty list, never an error.
pub fn extract(content: &str, language: Language, file_path: &str) -> Vec<SyntaxNode> {
    let nodes = match language {
        Language::Python => extract_python(content, file_path),
        Language::JavaScript | Language::TypeScript | Language::Tsx => {
            extract_js_like(content, language, file_path)
        }
        _ => Vec::new(),
    };
    debug!(
        "Fallback extracted {} node(s) from {} ({})",
        nodes.len(),
        file_path,
        language
    );
    nodes
}

/// Indentation-based extraction for Python.
fn extract_python(content: &str, file_path: &str) -> Vec<SyntaxNode> {
    let lines: Vec<&str> = content.split('\n').collect();
    let mut nodes = Vec::new();
    let mut seq = 0usize;
    let origin = || NodeOrigin::heuristic(Language::Python);

    for (i, line) in lines.iter().enumerate() {
        if let Some(caps) = python_func_re().captures(line) {
            let indent = caps.get(1).map_or(0, |m| m.as_str().len());
            let name = caps.get(2).map_or("", |m| m.as_str()).to_string();
            let params: Vec<String> = caps
                .get(3)
                .map_or("", |m| m.as_str())
                .split(',')
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect();
            seq += 1;
            let mut node = SyntaxNode::new(
                format!("{}:{}:{}", file_path, i + 1, seq),
                SyntaxKind::Function,
                name,
                i + 1,
                find_block_end(&lines, i, indent),
                indent,
                line.len(),
                origin(),
            );
            if !params.is_empty() {
                node.parameters = Some(params);
            }
            nodes.push(node);
            continue;
        }

        if let Some(caps) = python_class_re().captures(line) {
            let indent = caps.get(1).map_or(0, |m| m.as_str().len());
            let name = caps.get(2).map_or("", |m| m.as_str()).to_string();
            seq += 1;
            nodes.push(SyntaxNode::new(
                format!("{}:{}:{}", file_path, i + 1, seq),
                SyntaxKind::Class,
                name,
                i + 1,
                find_block_end(&lines, i, indent),
                indent,
                line.len(),
                origin(),
            ));
            continue;
        }

        if python_import_re().is_match(line.trim()) {
            seq += 1;
            nodes.push(SyntaxNode::new(
                format!("{}:{}:{}", file_path, i + 1, seq),
                SyntaxKind::Import,
                line.trim().to_string(),
                i + 1,
                i + 1,
                0,
                line.len(),
                origin(),
            ));
        }
    }

    nodes
}

/// Single-line extraction for brace-delimited JS/TS.
fn extract_js_like(content: &str, language: Language, file_path: &str) -> Vec<SyntaxNode> {
    let mut nodes = Vec::new();
    let mut seq = 0usize;

    for (i, line) in content.split('\n').enumerate() {
        if let Some(caps) = js_func_re().captures(line) {
            if let Some(name) = caps.get(1).or_else(|| caps.get(2)) {
                seq += 1;
                nodes.push(SyntaxNode::new(
                    format!("{}:{}:{}", file_path, i + 1, seq),
                    SyntaxKind::Function,
                    name.as_str().to_string(),
                    i + 1,
                    i + 1,
                    0,
                    line.len(),
                    NodeOrigin::heuristic(language),
                ));
            }
        }

        if let Some(caps) = js_class_re().captures(line) {
            if let Some(name) = caps.get(1) {
                seq += 1;
                nodes.push(SyntaxNode::new(
                    format!("{}:{}:{}", file_path, i + 1, seq),
                    SyntaxKind::Class,
                    name.as_str().to_string(),
                    i + 1,
                    i + 1,
                    0,
                    line.len(),
                    NodeOrigin::heuristic(language),
                ));
            }
        }

        if js_import_re().is_match(line.trim()) {
            seq += 1;
            nodes.push(SyntaxNode::new(
                format!("{}:{}:{}", file_path, i + 1, seq),
                SyntaxKind::Import,
                line.trim().to_string(),
                i + 1,
                i + 1,
                0,
                line.len(),
                NodeOrigin::heuristic(language),
            ));
        }
    }

    nodes
}

/// Estimate where an indented block ends: the line before the first
/// non-blank line whose indentation is at or below the declaration's.
/// Returns a 1-indexed inclusive end line.
fn find_block_end(lines: &[&str], start: usize, base_indent: usize) -> usize {
    for (i, line) in lines.iter().enumerate().skip(start + 1) {
        if line.trim().is_empty() {
            continue;
        }
        let indent = line.len() - line.trim_start().len();
        if indent <= base_indent {
            return i;
        }
    }
    lines.len()
}

/// Split a text file into `Section` nodes.
///
/// Markdown splits on headings; anything else is chunked into
/// fixed-size sections named by their first non-empty line.
pub fn extract_sections(content: &str, file_path: &str) -> Vec<SyntaxNode> {
    let lines: Vec<&str> = content.split('\n').collect();
    let is_markdown = file_path.ends_with(".md") || file_path.ends_with(".rst");
    let origin = NodeOrigin {
        grammar_kind: None,
        language: Language::Text.as_str().to_string(),
    };

    if is_markdown {
        let heading_lines: Vec<usize> = lines
            .iter()
            .enumerate()
            .filter(|(_, l)| heading_re().is_match(l))
            .map(|(i, _)| i)
            .collect();

        if heading_lines.is_empty() {
            // No headings: the whole file is one section
            let name = std::path::Path::new(file_path)
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or(file_path)
                .to_string();
            return vec![SyntaxNode::new(
                format!("{}:1:1", file_path),
                SyntaxKind::Section,
                name,
                1,
                lines.len(),
                0,
                0,
                origin,
            )];
        }

        return heading_lines
            .iter()
            .enumerate()
            .map(|(idx, &start)| {
                let end = heading_lines.get(idx + 1).copied().unwrap_or(lines.len());
                let heading = lines[start].trim_start_matches('#').trim();
                let name = if heading.is_empty() {
                    format!("Section {}", idx + 1)
                } else {
                    heading.to_string()
                };
                SyntaxNode::new(
                    format!("{}:{}:{}", file_path, start + 1, idx + 1),
                    SyntaxKind::Section,
                    name,
                    start + 1,
                    end,
                    0,
                    0,
                    origin.clone(),
                )
            })
            .collect();
    }

    // Other text files: fixed-size chunks
    let mut nodes = Vec::new();
    let mut start = 0usize;
    let mut seq = 0usize;
    while start < lines.len() {
        let end = (start + TEXT_CHUNK_LINES).min(lines.len());
        let name = lines[start..end]
            .iter()
            .map(|l| l.trim())
            .find(|l| !l.is_empty())
            .map(|l| l.chars().take(SECTION_NAME_LIMIT).collect::<String>())
            .unwrap_or_else(|| format!("Lines {}-{}", start + 1, end));
        seq += 1;
        nodes.push(SyntaxNode::new(
            format!("{}:{}:{}", file_path, start + 1, seq),
            SyntaxKind::Section,
            name,
            start + 1,
            end,
            0,
            0,
            origin.clone(),
        ));
        start = end;
    }
    nodes
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_python_declarations() {
        let source = "\
import os

def top(a, b):
    x = 1
    return x

class Widget:
    def render(self):
        pass

def after():
    pass
";
        let nodes = extract(source, Language::Python, "widget.py");

        let funcs: Vec<_> = nodes
            .iter()
            .filter(|n| n.kind == SyntaxKind::Function)
            .collect();
        let classes: Vec<_> = nodes
            .iter()
            .filter(|n| n.kind == SyntaxKind::Class)
            .collect();
        let imports: Vec<_> = nodes
            .iter()
            .filter(|n| n.kind == SyntaxKind::Import)
            .collect();

        assert_eq!(classes.len(), 1);
        assert_eq!(classes[0].name, "Widget");
        assert_eq!(imports.len(), 1);

        // top, render (flat, reduced fidelity), after
        let func_names: Vec<_> = funcs.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(func_names, vec!["top", "render", "after"]);

        let top = funcs[0];
        assert_eq!(top.start_line, 3);
        assert_eq!(top.parameters, Some(vec!["a".to_string(), "b".to_string()]));
        // Block ends before the blank-separated class declaration
        assert!(top.end_line >= 5 && top.end_line < 7);
    }

    #[test]
    fn test_python_block_extent_skips_blanks() {
        let lines: Vec<&str> = vec!["def f():", "    a = 1", "", "    b = 2", "c = 3"];
        assert_eq!(find_block_end(&lines, 0, 0), 4);
    }

    #[test]
    fn test_js_single_line_declarations() {
        let source = "\
import { x } from './x';
function named(a) { return a; }
const arrow = (a, b) => a + b;
class Thing {}
";
        let nodes = extract(source, Language::JavaScript, "thing.js");

        let names: Vec<_> = nodes
            .iter()
            .map(|n| (n.kind, n.name.as_str()))
            .collect();
        assert!(names.contains(&(SyntaxKind::Function, "named")));
        assert!(names.contains(&(SyntaxKind::Function, "arrow")));
        assert!(names.contains(&(SyntaxKind::Class, "Thing")));
        assert!(names
            .iter()
            .any(|(k, n)| *k == SyntaxKind::Import && n.starts_with("import")));

        // Brace-delimited fallback produces no nesting
        assert!(nodes.iter().all(|n| n.children.is_empty()));
    }

    #[test]
    fn test_unknown_language_is_empty() {
        assert!(extract("fn main() {}", Language::Rust, "main.rs").is_empty());
        assert!(extract("puts 'hi'", Language::Ruby, "hi.rb").is_empty());
    }

    #[test]
    fn test_markdown_sections() {
        let source = "# Title\nintro\n\n## Usage\nrun it\n\n## License\nMIT\n";
        let nodes = extract_sections(source, "README.md");

        assert_eq!(nodes.len(), 3);
        assert!(nodes.iter().all(|n| n.kind == SyntaxKind::Section));
        let names: Vec<_> = nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["Title", "Usage", "License"]);
        assert_eq!(nodes[0].start_line, 1);
        assert_eq!(nodes[1].start_line, 4);
    }

    #[test]
    fn test_markdown_without_headings_is_one_section() {
        let nodes = extract_sections("just prose\nmore prose\n", "notes.md");
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].name, "notes.md");
    }

    #[test]
    fn test_plain_text_chunks() {
        let source = (1..=70).map(|i| format!("line {}", i)).collect::<Vec<_>>().join("\n");
        let nodes = extract_sections(&source, "data.txt");

        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0].start_line, 1);
        assert_eq!(nodes[0].end_line, 30);
        assert_eq!(nodes[1].start_line, 31);
        assert_eq!(nodes[0].name, "line 1");
    }
}
