//! RepoLens Core - structural code modeling
//!
//! This crate builds the structural model downstream features consume:
//! - Per-file canonical syntax forests (grammar-based parsing with a
//!   degrading heuristic fallback)
//! - A repository-wide import dependency graph
//! - Graph analytics: cycles, dependency chains, transitive impact
//! - A heuristic risk score for prospective changes

pub mod analyzer;
pub mod fallback;
pub mod graph;
pub mod imports;
pub mod language;
pub mod parser;
pub mod risk;

// Re-exports for convenience
pub use analyzer::{AnalyzeError, AnalyzerConfig, RepoAnalyzer, SourceFile};
pub use graph::{
    DependencyGraph, GraphExport, GraphStats, ImpactReport, ImportEdge, CYCLE_LIMIT,
    IMPACT_PREVIEW_LIMIT,
};
pub use imports::{extract_imports, resolve};
pub use language::Language;
pub use parser::{code_chunk, parse_source, NodeOrigin, ParserError, SyntaxKind, SyntaxNode};
pub use risk::{risk_score, RiskAssessment, RiskLevel};
