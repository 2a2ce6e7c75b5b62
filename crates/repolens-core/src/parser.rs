//! Grammar Parser Adapter & AST Normalizer
//!
//! This module turns raw source text into a canonical syntax forest:
//! an ordered list of top-level [`SyntaxNode`]s whose children are
//! exclusively owned by their parent.
//!
//! Parsing is grammar-based (tree-sitter) for the languages with an
//! adapter and degrades to the heuristic fallback extractor for
//! everything else. `parse_source` never returns an error: a failed
//! grammar parse is recovered locally via the fallback path.
//!
//! ## Supported Grammar Languages
//!
//! - Python (.py)
//! - JavaScript (.js, .jsx, .mjs, .cjs)
//! - TypeScript (.ts, .tsx)

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use tree_sitter::{Node, Parser, Tree};

use crate::fallback;
use crate::language::Language;

// ============================================================================
// Canonical Node Model
// ============================================================================

/// Canonical classification of a syntax element, independent of the
/// originating grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyntaxKind {
    Module,
    Class,
    Function,
    Method,
    Variable,
    Import,
    /// Heading-delimited or chunked region of a text file.
    Section,
}

impl SyntaxKind {
    /// Get the string representation used in JSON output.
    pub fn as_str(&self) -> &'static str {
        match self {
            SyntaxKind::Module => "module",
            SyntaxKind::Class => "class",
            SyntaxKind::Function => "function",
            SyntaxKind::Method => "method",
            SyntaxKind::Variable => "variable",
            SyntaxKind::Import => "import",
            SyntaxKind::Section => "section",
        }
    }
}

impl std::fmt::Display for SyntaxKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Provenance metadata attached to every canonical node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeOrigin {
    /// Raw grammar tag this node was mapped from (absent for heuristic
    /// and section nodes).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grammar_kind: Option<String>,
    /// Language identifier of the source file.
    pub language: String,
}

impl NodeOrigin {
    /// Origin for a grammar-mapped node.
    pub fn grammar(raw_kind: &str, language: Language) -> Self {
        Self {
            grammar_kind: Some(raw_kind.to_string()),
            language: language.as_str().to_string(),
        }
    }

    /// Origin for a heuristically extracted node.
    pub fn heuristic(language: Language) -> Self {
        Self {
            grammar_kind: None,
            language: language.as_str().to_string(),
        }
    }
}

/// A node in the canonical syntax forest.
///
/// The parent exclusively owns its children; the per-file result of
/// parsing contains only ownerless roots, so the forest is acyclic by
/// construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntaxNode {
    /// Unique id within the file: `path:start_line:seq`.
    pub id: String,
    pub kind: SyntaxKind,
    pub name: String,
    /// 1-indexed start line.
    pub start_line: usize,
    /// 1-indexed end line (inclusive).
    pub end_line: usize,
    /// 0-indexed start column.
    pub start_col: usize,
    /// 0-indexed end column.
    pub end_col: usize,
    /// Documentation-comment text, when a leading doc shape was found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    /// Parameter names for callables.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<String>>,
    /// Raw return-type annotation text (no type system behind it).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
    #[serde(default)]
    pub children: Vec<SyntaxNode>,
    pub origin: NodeOrigin,
}

impl SyntaxNode {
    /// Create a childless node with no doc/parameter/type metadata.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: String,
        kind: SyntaxKind,
        name: String,
        start_line: usize,
        end_line: usize,
        start_col: usize,
        end_col: usize,
        origin: NodeOrigin,
    ) -> Self {
        Self {
            id,
            kind,
            name,
            start_line,
            end_line,
            start_col,
            end_col,
            doc: None,
            parameters: None,
            return_type: None,
            children: Vec::new(),
            origin,
        }
    }
}

// ============================================================================
// Parser Errors
// ============================================================================

/// Errors that can occur while constructing a grammar adapter.
///
/// These never escape `parse_source`; a language whose adapter fails to
/// build is routed to the fallback extractor for the life of the process.
#[derive(Debug, Error)]
pub enum ParserError {
    /// Failed to load the grammar into a parser
    #[error("Failed to set language: {0}")]
    LanguageSet(String),

    /// No grammar exists for the language
    #[error("No grammar available for language: {0}")]
    NoGrammar(String),

    /// tree-sitter returned no tree
    #[error("Failed to parse source code")]
    ParseFailed,
}

// ============================================================================
// Grammar Adapter Registry
// ============================================================================

/// A validated tree-sitter grammar for one language.
struct GrammarAdapter {
    ts_language: tree_sitter::Language,
}

impl GrammarAdapter {
    /// Build and validate an adapter for the given language.
    fn try_new(language: Language) -> Result<Self, ParserError> {
        let ts_language = grammar_for(language)
            .ok_or_else(|| ParserError::NoGrammar(language.as_str().to_string()))?;

        // Validate once that a parser accepts this grammar; failures here
        // permanently route the language to the fallback extractor.
        let mut parser = Parser::new();
        parser
            .set_language(&ts_language)
            .map_err(|e| ParserError::LanguageSet(e.to_string()))?;

        Ok(Self { ts_language })
    }

    /// Parse source text into a raw concrete syntax tree.
    fn parse(&self, source: &str) -> Result<Tree, ParserError> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.ts_language)
            .map_err(|e| ParserError::LanguageSet(e.to_string()))?;
        parser.parse(source, None).ok_or(ParserError::ParseFailed)
    }
}

/// Get the tree-sitter grammar for a language, if one is compiled in.
fn grammar_for(language: Language) -> Option<tree_sitter::Language> {
    match language {
        Language::Python => Some(tree_sitter_python::LANGUAGE.into()),
        Language::JavaScript => Some(tree_sitter_javascript::LANGUAGE.into()),
        Language::TypeScript => Some(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
        Language::Tsx => Some(tree_sitter_typescript::LANGUAGE_TSX.into()),
        _ => None,
    }
}

/// Registry of grammar adapters, one per language.
struct AdapterRegistry {
    adapters: HashMap<Language, GrammarAdapter>,
}

/// Process-wide registry: built once, read-only afterwards. `OnceLock`
/// guarantees the initialization runs exactly once even under
/// concurrent first use.
static REGISTRY: OnceLock<AdapterRegistry> = OnceLock::new();

fn registry() -> &'static AdapterRegistry {
    REGISTRY.get_or_init(|| {
        let mut adapters = HashMap::new();
        for language in [
            Language::Python,
            Language::JavaScript,
            Language::TypeScript,
            Language::Tsx,
        ] {
            match GrammarAdapter::try_new(language) {
                Ok(adapter) => {
                    adapters.insert(language, adapter);
                }
                Err(e) => {
                    warn!("Grammar adapter unavailable for {}: {}", language, e);
                }
            }
        }
        AdapterRegistry { adapters }
    })
}

// ============================================================================
// Kind Mapping Table
// ============================================================================

/// Fixed raw-tag to canonical-kind table. Tags absent from the table
/// are dissolved: their children are still visited and any canonical
/// descendants bubble up to the nearest mapped ancestor.
static KIND_MAP: OnceLock<HashMap<&'static str, SyntaxKind>> = OnceLock::new();

fn kind_map() -> &'static HashMap<&'static str, SyntaxKind> {
    KIND_MAP.get_or_init(|| {
        let mut map = HashMap::new();
        // Python
        map.insert("function_definition", SyntaxKind::Function);
        map.insert("class_definition", SyntaxKind::Class);
        map.insert("import_statement", SyntaxKind::Import);
        map.insert("import_from_statement", SyntaxKind::Import);
        // JavaScript / TypeScript
        map.insert("function_declaration", SyntaxKind::Function);
        map.insert("arrow_function", SyntaxKind::Function);
        map.insert("method_definition", SyntaxKind::Method);
        map.insert("class_declaration", SyntaxKind::Class);
        // Common
        map.insert("variable_declaration", SyntaxKind::Variable);
        map.insert("lexical_declaration", SyntaxKind::Variable);
        map
    })
}

// ============================================================================
// Public API
// ============================================================================

/// Parse file content into an ordered list of top-level canonical nodes.
///
/// Strategy is selected per language: grammar adapter when one exists,
/// heuristic fallback otherwise, section extraction for text files.
/// Failures always degrade locally; this function never errors.
pub fn parse_source(content: &str, language: Language, file_path: &str) -> Vec<SyntaxNode> {
    if language.is_text() {
        return fallback::extract_sections(content, file_path);
    }

    let reg = registry();
    let adapter = match reg.adapters.get(&language) {
        Some(adapter) => adapter,
        None => return fallback::extract(content, language, file_path),
    };

    match adapter.parse(content) {
        Ok(tree) => {
            let mut forest = normalize_tree(&tree, content, language, file_path);
            rewrite_class_functions(&mut forest);
            forest
        }
        Err(e) => {
            warn!("Grammar parse failed for {}: {}; using fallback", file_path, e);
            fallback::extract(content, language, file_path)
        }
    }
}

/// Extract a line range from file content (1-indexed, inclusive).
pub fn code_chunk(content: &str, start_line: usize, end_line: usize) -> String {
    content
        .lines()
        .skip(start_line.saturating_sub(1))
        .take(end_line.saturating_sub(start_line) + 1)
        .collect::<Vec<_>>()
        .join("\n")
}

// ============================================================================
// Normalizer
// ============================================================================

/// Walk the raw tree and build the canonical forest.
fn normalize_tree(
    tree: &Tree,
    content: &str,
    language: Language,
    file_path: &str,
) -> Vec<SyntaxNode> {
    let source = content.as_bytes();
    let mut seq = 0usize;
    let forest = collect_nodes(tree.root_node(), source, language, file_path, &mut seq);
    debug!(
        "Normalized {} top-level node(s) from {}",
        forest.len(),
        file_path
    );
    forest
}

/// Recursively classify a raw node.
///
/// A mapped node becomes a canonical node owning every canonical
/// descendant found below it; an unmapped node dissolves, returning its
/// descendants for the nearest mapped ancestor to claim. The top-level
/// call therefore returns exactly the ownerless roots.
fn collect_nodes(
    node: Node,
    source: &[u8],
    language: Language,
    file_path: &str,
    seq: &mut usize,
) -> Vec<SyntaxNode> {
    let raw_kind = node.kind();

    if let Some(&kind) = kind_map().get(raw_kind) {
        let start = node.start_position();
        let end = node.end_position();
        *seq += 1;

        let name = match kind {
            // Imports keep the raw statement text as their name; the
            // specifier itself is the import extractor's concern.
            SyntaxKind::Import => node_text(node, source)
                .lines()
                .next()
                .unwrap_or_default()
                .trim()
                .to_string(),
            _ => extract_name(node, source)
                .unwrap_or_else(|| format!("anonymous_{}", raw_kind)),
        };

        let mut canonical = SyntaxNode::new(
            format!("{}:{}:{}", file_path, start.row + 1, seq),
            kind,
            name,
            start.row + 1,
            end.row + 1,
            start.column,
            end.column,
            NodeOrigin::grammar(raw_kind, language),
        );
        canonical.doc = extract_doc(node, source);
        canonical.parameters = extract_parameters(node, source);
        canonical.return_type = extract_return_type(node, source);

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            canonical
                .children
                .extend(collect_nodes(child, source, language, file_path, seq));
        }

        return vec![canonical];
    }

    // Dissolve: not a tracked tag, but canonical descendants bubble up.
    let mut bubbled = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        bubbled.extend(collect_nodes(child, source, language, file_path, seq));
    }
    bubbled
}

/// Post-pass: a Function directly owned by a Class is a Method.
fn rewrite_class_functions(nodes: &mut [SyntaxNode]) {
    for node in nodes.iter_mut() {
        if node.kind == SyntaxKind::Class {
            for child in node.children.iter_mut() {
                if child.kind == SyntaxKind::Function {
                    child.kind = SyntaxKind::Method;
                }
            }
        }
        rewrite_class_functions(&mut node.children);
    }
}

fn node_text(node: Node, source: &[u8]) -> String {
    node.utf8_text(source).unwrap_or_default().to_string()
}

/// Extract a name from the first identifier-shaped child.
///
/// Variable declarations are searched through their declarator; an
/// anonymous function bound to a named variable takes the name of the
/// enclosing binding.
fn extract_name(node: Node, source: &[u8]) -> Option<String> {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "identifier" | "type_identifier" | "property_identifier" | "name" => {
                return Some(node_text(child, source));
            }
            "variable_declarator" => {
                if let Some(name) = child.child_by_field_name("name") {
                    return Some(node_text(name, source));
                }
            }
            _ => {}
        }
    }

    // Anonymous function assigned to a named binding
    if node.kind() == "arrow_function" || node.kind() == "function_expression" {
        if let Some(parent) = node.parent() {
            if parent.kind() == "variable_declarator" {
                if let Some(name) = parent.child_by_field_name("name") {
                    return Some(node_text(name, source));
                }
            }
        }
    }

    None
}

/// Heuristically match a leading string/comment child against
/// documentation-comment shapes.
fn extract_doc(node: Node, source: &[u8]) -> Option<String> {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "string" | "expression_statement" | "comment" => {
                if let Some(doc) = doc_comment_shape(&node_text(child, source)) {
                    return Some(doc);
                }
            }
            // Python docstrings sit in the leading statement of the body
            "block" | "statement_block" => {
                if let Some(first) = child.named_child(0) {
                    if matches!(first.kind(), "expression_statement" | "string") {
                        if let Some(doc) = doc_comment_shape(&node_text(first, source)) {
                            return Some(doc);
                        }
                    }
                }
            }
            _ => {}
        }
    }
    None
}

/// Check whether text looks like a documentation comment and strip its
/// markers if so.
fn doc_comment_shape(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.starts_with("\"\"\"") || trimmed.starts_with("'''") {
        let stripped: &str = trimmed.trim_matches(|c| c == '"' || c == '\'');
        return Some(stripped.trim().to_string());
    }
    if trimmed.starts_with("/*") || trimmed.starts_with("//") {
        let stripped: &str = trimmed.trim_matches(|c| c == '/' || c == '*' || c == ' ' || c == '\n');
        return Some(stripped.trim().to_string());
    }
    None
}

/// Enumerate parameter names from a parameters container child.
fn extract_parameters(node: Node, source: &[u8]) -> Option<Vec<String>> {
    let mut params = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if matches!(child.kind(), "parameters" | "formal_parameters") {
            let mut param_cursor = child.walk();
            for param in child.named_children(&mut param_cursor) {
                match param.kind() {
                    "identifier" => params.push(node_text(param, source)),
                    "typed_parameter"
                    | "typed_default_parameter"
                    | "default_parameter"
                    | "required_parameter"
                    | "optional_parameter" => {
                        let name = extract_name(param, source)
                            .unwrap_or_else(|| node_text(param, source));
                        params.push(name);
                    }
                    _ => {}
                }
            }
        }
    }
    if params.is_empty() {
        None
    } else {
        Some(params)
    }
}

/// Extract a return-type annotation as raw text.
fn extract_return_type(node: Node, source: &[u8]) -> Option<String> {
    if let Some(ret) = node.child_by_field_name("return_type") {
        return Some(node_text(ret, source));
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if matches!(child.kind(), "type_annotation" | "return_type") {
            return Some(node_text(child, source));
        }
    }
    None
}
