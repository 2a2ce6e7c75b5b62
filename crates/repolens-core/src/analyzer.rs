//! Repository Analyzer
//!
//! Walks a repository tree once, pruning ignored directories, and
//! assembles the file-level [`DependencyGraph`] from resolved imports.
//! The operation is a pure function of current filesystem state: every
//! invocation builds a fresh graph, and a failure scoped to one file
//! never aborts the whole scan. Only a missing repository root is an
//! error.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::graph::{DependencyGraph, ImportEdge};
use crate::imports;
use crate::language::Language;

/// Errors during repository analysis.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("Repository root does not exist: {0}")]
    RootNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AnalyzeError>;

/// A source file discovered during the repository walk.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SourceFile {
    /// Repository-relative path, forward-slash normalized.
    pub path: String,
    pub language: Language,
    /// Size in bytes.
    pub size: u64,
}

/// Configuration for the repository walk.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Directory names pruned during the walk: VCS metadata, build
    /// output, dependency caches, virtual environments, editor dirs.
    pub ignore_dirs: HashSet<String>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        let ignore_dirs: HashSet<String> = [
            ".git",
            ".hg",
            ".svn",
            "node_modules",
            "target",
            "build",
            "dist",
            "__pycache__",
            ".venv",
            "venv",
            "env",
            ".idea",
            ".vscode",
            "vendor",
            ".tox",
            ".mypy_cache",
            ".pytest_cache",
            ".next",
            ".nuxt",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        Self { ignore_dirs }
    }
}

/// Builds dependency graphs from repository trees.
///
/// Stateless between calls; safe to reuse across repositories or run
/// concurrently from multiple threads.
#[derive(Debug, Default)]
pub struct RepoAnalyzer {
    config: AnalyzerConfig,
}

impl RepoAnalyzer {
    /// Create an analyzer with custom configuration.
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    /// Create an analyzer with the default exclusion list.
    pub fn with_defaults() -> Self {
        Self::new(AnalyzerConfig::default())
    }

    /// Discover every import-tracked source file under the root.
    ///
    /// Unreadable or non-UTF-8 files are logged and skipped; they do
    /// not appear in the result at all.
    pub fn discover_files(&self, repo_root: &Path) -> Result<Vec<(SourceFile, String)>> {
        if !repo_root.exists() {
            return Err(AnalyzeError::RootNotFound(repo_root.to_path_buf()));
        }

        let mut files = Vec::new();

        for entry in WalkDir::new(repo_root)
            .into_iter()
            .filter_entry(|e| {
                if !e.file_type().is_dir() || e.depth() == 0 {
                    return true;
                }
                let name = e.file_name().to_string_lossy();
                !self.config.ignore_dirs.contains(name.as_ref())
            })
        {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("Error walking repository: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let Some(language) = Language::from_path(path) else {
                continue;
            };
            if !language.tracks_imports() {
                continue;
            }

            let relative = match path.strip_prefix(repo_root) {
                Ok(rel) => rel.to_string_lossy().replace('\\', "/"),
                Err(_) => continue,
            };

            // Unreadable/binary files are excluded from the graph entirely
            let content = match std::fs::read_to_string(path) {
                Ok(content) => content,
                Err(e) => {
                    warn!("Skipping unreadable file {}: {}", relative, e);
                    continue;
                }
            };

            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            files.push((
                SourceFile {
                    path: relative,
                    language,
                    size,
                },
                content,
            ));
        }

        // Deterministic node order regardless of filesystem iteration
        files.sort_by(|a, b| a.0.path.cmp(&b.0.path));
        Ok(files)
    }

    /// Walk the repository and build its dependency graph.
    pub fn analyze(&self, repo_root: &Path) -> Result<DependencyGraph> {
        let files = self.discover_files(repo_root)?;
        info!(
            "Analyzing {} source file(s) under {}",
            files.len(),
            repo_root.display()
        );

        let known_files: HashSet<String> =
            files.iter().map(|(f, _)| f.path.clone()).collect();

        let mut graph = DependencyGraph::new();
        for (file, _) in &files {
            graph.add_file(&file.path);
        }

        for (file, content) in &files {
            let specifiers = imports::extract_imports(content, file.language);
            debug!("{}: {} import(s)", file.path, specifiers.len());

            for specifier in specifiers {
                match imports::resolve(&specifier, &file.path, &known_files, file.language) {
                    Some(target) => {
                        graph.add_import(ImportEdge::resolved(
                            file.path.clone(),
                            target,
                            specifier,
                        ));
                    }
                    None => {
                        graph.add_import(ImportEdge::external(file.path.clone(), specifier));
                    }
                }
            }
        }

        info!(
            "Dependency graph built: {} node(s), {} resolved edge(s)",
            graph.node_count(),
            graph.resolved_edge_count()
        );
        Ok(graph)
    }
}
