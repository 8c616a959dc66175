use std::sync::Arc;

use tokio::sync::Mutex;
use tower_lsp::jsonrpc::{Error as RpcError, ErrorCode, Result as LspResult};
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};

use crate::lsp::session::{reply_error, Message, Response, Session};

/// The LSP backend: forwards every protocol call into the shared [`Session`]
pub struct Backend {
    pub client: Client,
    pub session: Arc<Mutex<Session>>,
}

impl Backend {
    pub fn new(client: Client, session: Session) -> Self {
        Self {
            client,
            session: Arc::new(Mutex::new(session)),
        }
    }

    /// Run a message through the session while holding its lock.
    ///
    /// Scoring blocks on a child process, so the worker thread is handed over
    /// to the runtime for the duration of the call.
    async fn dispatch(&self, message: Message) -> Result<Option<Response>, RpcError> {
        let method = message.method().to_string();
        let mut session = self.session.lock().await;

        tokio::task::block_in_place(|| session.dispatch(message)).map_err(|e| {
            log::error!("{} failed: {}", method, e);
            let reply = reply_error(&e);
            RpcError {
                code: ErrorCode::from(reply.code),
                message: reply.message.into(),
                data: None,
            }
        })
    }

    /// Notifications cannot fail back to the client; tell the user instead.
    async fn notify(&self, message: Message) {
        if let Err(e) = self.dispatch(message).await {
            self.client
                .log_message(MessageType::ERROR, e.message.to_string())
                .await;
        }
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> LspResult<InitializeResult> {
        match self.dispatch(Message::Initialize(Box::new(params))).await? {
            Some(Response::Initialize(result)) => Ok(*result),
            _ => Err(RpcError::internal_error()),
        }
    }

    async fn initialized(&self, _: InitializedParams) {
        self.notify(Message::Initialized).await;
        self.client
            .log_message(MessageType::INFO, "flog-lsp initialized")
            .await;
    }

    async fn shutdown(&self) -> LspResult<()> {
        self.dispatch(Message::Shutdown).await?;
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        self.notify(Message::DidOpen(params)).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        self.notify(Message::DidChange(params)).await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        self.notify(Message::DidClose(params)).await;
    }

    async fn diagnostic(
        &self,
        params: DocumentDiagnosticParams,
    ) -> LspResult<DocumentDiagnosticReportResult> {
        match self.dispatch(Message::Diagnostic(params)).await? {
            Some(Response::Diagnostic(report)) => Ok(report),
            _ => Err(RpcError::internal_error()),
        }
    }
}
