//! Session state and message dispatch.
//!
//! A [`Session`] owns every piece of mutable server state: the document
//! cache, the scorer and the configuration captured at `initialize`. Messages
//! are handled one at a time, to completion.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_lsp::jsonrpc::ErrorCode;
use tower_lsp::lsp_types::notification::{
    DidChangeTextDocument, DidCloseTextDocument, DidOpenTextDocument, Exit, Initialized,
    Notification,
};
use tower_lsp::lsp_types::request::{
    DocumentDiagnosticRequest, Initialize, Request, Shutdown,
};
use tower_lsp::lsp_types::{
    DidChangeTextDocumentParams, DidCloseTextDocumentParams, DidOpenTextDocumentParams,
    DocumentDiagnosticParams, DocumentDiagnosticReportResult, InitializeParams,
    InitializeResult,
};

use crate::config::ServerConfig;
use crate::core::diagnostics::diagnose;
use crate::core::document::{DocumentManager, DocumentSource, FileSystem};
use crate::error::{Error, Result};
use crate::lsp::handlers::{capabilities, full_report, to_edit};
use crate::scoring::{FlogCommand, Scorer};

/// Lifecycle of a server session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Initialized,
    ShuttingDown,
    Terminated,
}

/// Every inbound message the server understands.
#[derive(Debug)]
pub enum Message {
    Initialize(Box<InitializeParams>),
    Initialized,
    DidOpen(DidOpenTextDocumentParams),
    DidChange(DidChangeTextDocumentParams),
    DidClose(DidCloseTextDocumentParams),
    Diagnostic(DocumentDiagnosticParams),
    Shutdown,
    Exit,
    Unknown(String),
}

impl Message {
    /// Decode a message from its method name and raw params.
    pub fn from_parts(method: &str, params: Value) -> Result<Self> {
        let message = match method {
            Initialize::METHOD => Message::Initialize(Box::new(serde_json::from_value(params)?)),
            Initialized::METHOD => Message::Initialized,
            DidOpenTextDocument::METHOD => Message::DidOpen(serde_json::from_value(params)?),
            DidChangeTextDocument::METHOD => Message::DidChange(serde_json::from_value(params)?),
            DidCloseTextDocument::METHOD => Message::DidClose(serde_json::from_value(params)?),
            DocumentDiagnosticRequest::METHOD => {
                Message::Diagnostic(serde_json::from_value(params)?)
            }
            Shutdown::METHOD => Message::Shutdown,
            Exit::METHOD => Message::Exit,
            other => Message::Unknown(other.to_string()),
        };
        Ok(message)
    }

    pub fn method(&self) -> &str {
        match self {
            Message::Initialize(_) => Initialize::METHOD,
            Message::Initialized => Initialized::METHOD,
            Message::DidOpen(_) => DidOpenTextDocument::METHOD,
            Message::DidChange(_) => DidChangeTextDocument::METHOD,
            Message::DidClose(_) => DidCloseTextDocument::METHOD,
            Message::Diagnostic(_) => DocumentDiagnosticRequest::METHOD,
            Message::Shutdown => Shutdown::METHOD,
            Message::Exit => Exit::METHOD,
            Message::Unknown(method) => method,
        }
    }
}

/// Payloads produced by request handlers.
#[derive(Debug)]
pub enum Response {
    Initialize(Box<InitializeResult>),
    Diagnostic(DocumentDiagnosticReportResult),
}

impl Response {
    pub fn to_value(&self) -> Result<Value> {
        let value = match self {
            Response::Initialize(result) => serde_json::to_value(result)?,
            Response::Diagnostic(report) => serde_json::to_value(report)?,
        };
        Ok(value)
    }
}

/// A decoded message as read from the transport.
#[derive(Debug, Clone, Deserialize)]
pub struct Incoming {
    pub method: String,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub params: Value,
}

/// A reply to a request that carried an `id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outgoing {
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ReplyError>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplyError {
    pub code: i64,
    pub message: String,
}

pub struct Session {
    state: SessionState,
    config: ServerConfig,
    documents: DocumentManager,
    scorer: Box<dyn Scorer>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("config", &self.config)
            .field("documents", &self.documents)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(source: impl DocumentSource + 'static, scorer: impl Scorer + 'static) -> Self {
        Self {
            state: SessionState::Uninitialized,
            config: ServerConfig::default(),
            documents: DocumentManager::new(source),
            scorer: Box::new(scorer),
        }
    }

    /// Session reading documents from disk and scoring them with `flog`.
    pub fn with_flog(scorer: FlogCommand) -> Self {
        Self::new(FileSystem, scorer)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn documents(&self) -> &DocumentManager {
        &self.documents
    }

    pub fn is_terminated(&self) -> bool {
        self.state == SessionState::Terminated
    }

    /// Handle one message to completion.
    ///
    /// Notifications and payload-free requests yield `Ok(None)`.
    pub fn dispatch(&mut self, message: Message) -> Result<Option<Response>> {
        log::debug!("Received request: {}", message.method());

        if self.is_terminated() {
            log::warn!("Ignoring {} after exit", message.method());
            return Ok(None);
        }

        match message {
            Message::Initialize(params) => Ok(Some(self.initialize(*params))),
            Message::Initialized => Ok(None),
            Message::DidOpen(params) => {
                self.documents.open(&params.text_document.uri);
                Ok(None)
            }
            Message::DidChange(params) => {
                let edits: Vec<_> = params.content_changes.into_iter().map(to_edit).collect();
                self.documents
                    .apply_changes(&params.text_document.uri, &edits)?;
                Ok(None)
            }
            Message::DidClose(params) => {
                self.documents.close(&params.text_document.uri);
                Ok(None)
            }
            Message::Diagnostic(params) => {
                let threshold = self.config.score_threshold;
                // An unloadable document is an error reply, not an empty report
                let content = self.documents.get(&params.text_document.uri)?;
                let findings = diagnose(self.scorer.as_ref(), content, threshold);
                Ok(Some(Response::Diagnostic(full_report(&findings))))
            }
            Message::Shutdown => {
                self.state = SessionState::ShuttingDown;
                Ok(None)
            }
            Message::Exit => {
                if self.state != SessionState::ShuttingDown {
                    log::warn!("exit received before shutdown");
                }
                self.state = SessionState::Terminated;
                Ok(None)
            }
            Message::Unknown(method) => {
                log::warn!("Unknown request: {}", method);
                Ok(None)
            }
        }
    }

    /// Handle a raw transport message, producing the reply to send, if any.
    pub fn handle_message(&mut self, incoming: Incoming) -> Option<Outgoing> {
        let Incoming { method, id, params } = incoming;

        let outcome = Message::from_parts(&method, params).and_then(|message| {
            let response = self.dispatch(message)?;
            response.map(|r| r.to_value()).transpose()
        });

        match (id, outcome) {
            (Some(id), Ok(Some(result))) => Some(Outgoing {
                id,
                result: Some(result),
                error: None,
            }),
            (Some(id), Err(e)) => {
                log::error!("{} failed: {}", method, e);
                Some(Outgoing {
                    id,
                    result: None,
                    error: Some(reply_error(&e)),
                })
            }
            (None, Err(e)) => {
                log::error!("{} failed: {}", method, e);
                None
            }
            (_, Ok(None)) | (None, Ok(Some(_))) => None,
        }
    }

    fn initialize(&mut self, params: InitializeParams) -> Response {
        self.config = ServerConfig::from_initialization_options(params.initialization_options);
        self.state = SessionState::Initialized;
        log::debug!("Initialized with {:?}", self.config);
        Response::Initialize(Box::new(capabilities()))
    }
}

/// JSON-RPC error for a failed handler.
pub fn reply_error(error: &Error) -> ReplyError {
    let code = match error {
        Error::InvalidParams(_) | Error::InvalidUri(_) | Error::InvalidRange { .. } => {
            ErrorCode::InvalidParams
        }
        Error::NotFound { .. } | Error::Scoring(_) => ErrorCode::InternalError,
    };
    ReplyError {
        code: code.code(),
        message: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{ScoredUnit, ScoringError};
    use serde_json::json;
    use std::io;
    use std::path::Path;

    struct NoStorage;

    impl DocumentSource for NoStorage {
        fn read(&self, _: &Path) -> io::Result<String> {
            Err(io::Error::new(io::ErrorKind::NotFound, "no storage"))
        }
    }

    fn session() -> Session {
        Session::new(
            NoStorage,
            |_: &str| -> std::result::Result<Vec<ScoredUnit>, ScoringError> { Ok(Vec::new()) },
        )
    }

    fn initialize_params(options: Value) -> Message {
        Message::from_parts(
            "initialize",
            json!({ "capabilities": {}, "initializationOptions": options }),
        )
        .unwrap()
    }

    #[test]
    fn test_lifecycle_transitions() {
        let mut session = session();
        assert_eq!(session.state(), SessionState::Uninitialized);

        let response = session.dispatch(initialize_params(Value::Null)).unwrap();
        assert!(matches!(response, Some(Response::Initialize(_))));
        assert_eq!(session.state(), SessionState::Initialized);

        assert!(session.dispatch(Message::Initialized).unwrap().is_none());
        assert!(session.dispatch(Message::Shutdown).unwrap().is_none());
        assert_eq!(session.state(), SessionState::ShuttingDown);

        assert!(session.dispatch(Message::Exit).unwrap().is_none());
        assert!(session.is_terminated());
    }

    #[test]
    fn test_exit_without_shutdown_is_accepted() {
        let mut session = session();
        session.dispatch(initialize_params(Value::Null)).unwrap();
        session.dispatch(Message::Exit).unwrap();
        assert!(session.is_terminated());
    }

    #[test]
    fn test_messages_after_exit_are_ignored() {
        let mut session = session();
        session.dispatch(Message::Exit).unwrap();
        assert!(session
            .dispatch(initialize_params(Value::Null))
            .unwrap()
            .is_none());
        assert_eq!(session.state(), SessionState::Terminated);
    }

    #[test]
    fn test_initialize_captures_threshold() {
        let mut session = session();
        session
            .dispatch(initialize_params(json!({ "scoreThreshold": 3 })))
            .unwrap();
        assert_eq!(session.config().score_threshold, 3.0);
    }

    #[test]
    fn test_unknown_method() {
        let message = Message::from_parts("textDocument/hover", json!({})).unwrap();
        assert!(matches!(message, Message::Unknown(ref m) if m == "textDocument/hover"));

        let mut session = session();
        assert!(session.dispatch(message).unwrap().is_none());
    }

    #[test]
    fn test_method_names_round_trip() {
        for method in ["initialized", "shutdown", "exit"] {
            let message = Message::from_parts(method, Value::Null).unwrap();
            assert_eq!(message.method(), method);
        }
    }

    #[test]
    fn test_bad_params_are_rejected() {
        let err = Message::from_parts("textDocument/didClose", json!({ "uri": 3 })).unwrap_err();
        assert!(matches!(err, Error::InvalidParams(_)));
        assert_eq!(reply_error(&err).code, -32602);
    }

    #[test]
    fn test_diagnostic_for_unloadable_document_fails() {
        let mut session = session();
        let reply = session
            .handle_message(Incoming {
                method: "textDocument/diagnostic".to_string(),
                id: Some(json!(7)),
                params: json!({ "textDocument": { "uri": "file:///gone.rb" } }),
            })
            .unwrap();

        assert_eq!(reply.id, json!(7));
        assert!(reply.result.is_none());
        let error = reply.error.unwrap();
        assert_eq!(error.code, -32603);
        assert!(error.message.contains("gone.rb"));
    }

    #[test]
    fn test_notifications_produce_no_reply() {
        let mut session = session();
        let reply = session.handle_message(Incoming {
            method: "textDocument/didOpen".to_string(),
            id: None,
            params: json!({
                "textDocument": {
                    "uri": "file:///gone.rb",
                    "languageId": "ruby",
                    "version": 1,
                    "text": ""
                }
            }),
        });
        assert!(reply.is_none());
    }
}
