//! Conversions between LSP types and the core engine.

use serde_json::json;
use tower_lsp::lsp_types::*;

use crate::core::diagnostics::Finding;
use crate::core::patch::{Edit, TextPosition, TextRange};

/// Name used as diagnostic source and provider identifier.
pub const SOURCE: &str = "flog";

pub const SERVER_NAME: &str = "Flog LSP";

/// Capability advertisement returned from `initialize`.
pub fn capabilities() -> InitializeResult {
    InitializeResult {
        capabilities: ServerCapabilities {
            text_document_sync: Some(TextDocumentSyncCapability::Options(
                TextDocumentSyncOptions {
                    open_close: Some(true),
                    change: Some(TextDocumentSyncKind::INCREMENTAL),
                    ..Default::default()
                },
            )),
            diagnostic_provider: Some(DiagnosticServerCapabilities::Options(DiagnosticOptions {
                identifier: Some(SOURCE.to_string()),
                inter_file_dependencies: false,
                workspace_diagnostics: false,
                work_done_progress_options: Default::default(),
            })),
            ..Default::default()
        },
        server_info: Some(ServerInfo {
            name: SERVER_NAME.to_string(),
            version: Some(env!("CARGO_PKG_VERSION").to_string()),
        }),
    }
}

pub fn to_position(position: Position) -> TextPosition {
    TextPosition::new(position.line, position.character)
}

pub fn to_range(range: Range) -> TextRange {
    TextRange::new(to_position(range.start), to_position(range.end))
}

/// Content change events without a range replace the whole document.
pub fn to_edit(change: TextDocumentContentChangeEvent) -> Edit {
    match change.range {
        Some(range) => Edit::Range {
            range: to_range(range),
            text: change.text,
        },
        None => Edit::Full { text: change.text },
    }
}

pub fn create_lsp_diagnostic(finding: &Finding) -> Diagnostic {
    let line = finding.line.saturating_sub(1);
    let anchor = Position::new(line, 0);

    Diagnostic {
        range: Range::new(anchor, anchor),
        severity: Some(DiagnosticSeverity::WARNING),
        source: Some(SOURCE.to_string()),
        message: finding.message(),
        data: Some(json!({ "correctable": false })),
        ..Default::default()
    }
}

/// Wrap findings into a full document diagnostic report.
pub fn full_report(findings: &[Finding]) -> DocumentDiagnosticReportResult {
    DocumentDiagnosticReportResult::Report(DocumentDiagnosticReport::Full(
        RelatedFullDocumentDiagnosticReport {
            related_documents: None,
            full_document_diagnostic_report: FullDocumentDiagnosticReport {
                result_id: None,
                items: findings.iter().map(create_lsp_diagnostic).collect(),
            },
        },
    ))
}
