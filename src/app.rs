use tokio::task::JoinHandle;
use crate::backend::{BackendClient, BackendError};
use crate::config::Config;

/// Shown in place of a chat reply when the backend call fails.
pub const FALLBACK_CHAT: &str = "Maaf, terjadi kesalahan.";
/// Shown in place of an analysis reply when the backend call fails.
pub const FALLBACK_ANALYZE: &str = "Maaf, terjadi kesalahan saat menganalisis repositori GitHub.";
/// Validation notice for the repository dialog.
pub const ALERT_EMPTY_FIELDS: &str = "URL Repositori dan Pertanyaan tidak boleh kosong!";

/// A chat message in the conversation log. Append-only: once pushed, a
/// message is never mutated or removed.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: String) -> Self {
        Self { sender: Sender::User, text }
    }

    pub fn ai(text: String) -> Self {
        Self { sender: Sender::Ai, text }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Ai,
}

/// Which backend operation a pending request belongs to. Selects the
/// fallback string shown when that request fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Chat,
    RepoAnalysis,
}

impl RequestKind {
    pub fn fallback(&self) -> &'static str {
        match self {
            RequestKind::Chat => FALLBACK_CHAT,
            RequestKind::RepoAnalysis => FALLBACK_ANALYZE,
        }
    }
}

/// The single in-flight request. The `Option<PendingRequest>` slot in
/// `App` is the busy flag: `Some` gates all further submissions, and the
/// slot is taken on every settle path.
pub struct PendingRequest {
    pub kind: RequestKind,
    pub task: JoinHandle<Result<String, BackendError>>,
}

/// Field focus inside the repository dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogField {
    RepoUrl,
    Question,
}

pub struct App {
    pub should_quit: bool,

    // Conversation state
    pub messages: Vec<ChatMessage>,
    pub input: String,
    pub input_cursor: usize,

    // Repository dialog state
    pub show_repo_dialog: bool,
    pub dialog_field: DialogField,
    pub repo_url_input: String,
    pub repo_url_cursor: usize,
    pub question_input: String,
    pub question_cursor: usize,

    // Validation notice popup; any key dismisses it
    pub alert: Option<String>,

    // In-flight request, if any
    pub pending: Option<PendingRequest>,

    // Chat viewport bookkeeping (updated during render)
    pub chat_scroll: u16,
    pub chat_height: u16,
    pub chat_width: u16,

    // Ellipsis animation for the busy indicator, 0-2
    pub animation_frame: u8,

    pub backend: BackendClient,
}

impl App {
    pub fn new(config: &Config) -> Self {
        Self {
            should_quit: false,

            messages: Vec::new(),
            input: String::new(),
            input_cursor: 0,

            show_repo_dialog: false,
            dialog_field: DialogField::RepoUrl,
            repo_url_input: String::new(),
            repo_url_cursor: 0,
            question_input: String::new(),
            question_cursor: 0,

            alert: None,

            pending: None,

            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,

            animation_frame: 0,

            backend: BackendClient::new(&config.backend_url()),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Send the current input as a chat message. No-op when the trimmed
    /// input is empty or a request is already in flight.
    pub fn submit_chat_message(&mut self) {
        if self.input.trim().is_empty() || self.pending.is_some() {
            return;
        }

        // The message is sent as typed; only the emptiness check trims
        let text = std::mem::take(&mut self.input);
        self.input_cursor = 0;
        self.messages.push(ChatMessage::user(text.clone()));

        let backend = self.backend.clone();
        let task = tokio::spawn(async move { backend.send_chat(&text).await });
        self.pending = Some(PendingRequest { kind: RequestKind::Chat, task });

        self.scroll_to_bottom();
    }

    /// Submit the repository dialog. Empty fields raise the validation
    /// alert without issuing a request; a pending request makes this a
    /// no-op like any other submission.
    pub fn submit_repo_analysis(&mut self) {
        if self.pending.is_some() {
            return;
        }
        if self.repo_url_input.trim().is_empty() || self.question_input.trim().is_empty() {
            self.alert = Some(ALERT_EMPTY_FIELDS.to_string());
            return;
        }

        let repo_url = std::mem::take(&mut self.repo_url_input);
        let question = std::mem::take(&mut self.question_input);
        self.repo_url_cursor = 0;
        self.question_cursor = 0;
        self.show_repo_dialog = false;
        self.dialog_field = DialogField::RepoUrl;

        self.messages.push(ChatMessage::user(format!(
            "Menganalisis GitHub Repo: {} dengan pertanyaan: \"{}\"",
            repo_url, question
        )));

        let backend = self.backend.clone();
        let task =
            tokio::spawn(async move { backend.send_analysis(&repo_url, &question).await });
        self.pending = Some(PendingRequest { kind: RequestKind::RepoAnalysis, task });

        self.scroll_to_bottom();
    }

    /// True once the in-flight request has run to completion and its
    /// result can be applied without blocking.
    pub fn has_settled_request(&self) -> bool {
        self.pending.as_ref().is_some_and(|p| p.task.is_finished())
    }

    /// Take the pending request and append its outcome to the log: the
    /// backend's reply on success, the fixed fallback on any failure
    /// (transport, HTTP error, or a dead task). Exactly one AI message is
    /// appended per settled request.
    pub async fn settle_pending(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };

        let text = match pending.task.await {
            Ok(Ok(reply)) => reply,
            Ok(Err(err)) => {
                tracing::warn!(error = %err, kind = ?pending.kind, "backend request failed");
                pending.kind.fallback().to_string()
            }
            Err(err) => {
                tracing::warn!(error = %err, kind = ?pending.kind, "request task died");
                pending.kind.fallback().to_string()
            }
        };

        self.messages.push(ChatMessage::ai(text));
        self.scroll_to_bottom();
    }

    /// Open the repository dialog. Ignored while a request is in flight.
    pub fn open_repo_dialog(&mut self) {
        if self.pending.is_some() {
            return;
        }
        self.show_repo_dialog = true;
        self.dialog_field = DialogField::RepoUrl;
    }

    /// Close the dialog, discarding both fields.
    pub fn close_repo_dialog(&mut self) {
        self.show_repo_dialog = false;
        self.dialog_field = DialogField::RepoUrl;
        self.repo_url_input.clear();
        self.repo_url_cursor = 0;
        self.question_input.clear();
        self.question_cursor = 0;
    }

    pub fn toggle_dialog_field(&mut self) {
        self.dialog_field = match self.dialog_field {
            DialogField::RepoUrl => DialogField::Question,
            DialogField::Question => DialogField::RepoUrl,
        };
    }

    /// Tick animation frame (driven by the Tick event)
    pub fn tick_animation(&mut self) {
        if self.pending.is_some() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    // Chat viewport scrolling

    pub fn scroll_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        let max_scroll = self.total_chat_lines().saturating_sub(self.visible_height());
        if self.chat_scroll < max_scroll {
            self.chat_scroll += 1;
        }
    }

    pub fn scroll_half_page_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(self.visible_height() / 2);
    }

    pub fn scroll_half_page_down(&mut self) {
        let max_scroll = self.total_chat_lines().saturating_sub(self.visible_height());
        self.chat_scroll = (self.chat_scroll + self.visible_height() / 2).min(max_scroll);
    }

    /// Pin the viewport to the newest message (and the busy indicator,
    /// when one is showing).
    pub fn scroll_to_bottom(&mut self) {
        let total = self.total_chat_lines();
        let visible = self.visible_height();
        self.chat_scroll = total.saturating_sub(visible);
    }

    fn visible_height(&self) -> u16 {
        if self.chat_height > 0 { self.chat_height } else { 20 }
    }

    /// Estimate the rendered line count of the log: a label line, the
    /// wrapped text lines, and a trailing blank per message, plus the busy
    /// indicator while a request is in flight. Mirrors the wrapping the
    /// chat Paragraph applies.
    fn total_chat_lines(&self) -> u16 {
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total: u16 = 0;
        for msg in &self.messages {
            total += 1; // label line
            for line in msg.text.lines() {
                // Character count, not byte length, for UTF-8 content
                let chars = line.chars().count();
                if chars == 0 {
                    total += 1;
                } else {
                    total += ((chars / wrap_width) + 1) as u16;
                }
            }
            total += 1; // blank line after message
        }

        if self.pending.is_some() {
            total += 2; // label + animated ellipsis
        }

        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// One-shot stub backend answering every connection with the given
    /// status line and JSON body.
    async fn spawn_stub(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        tokio::spawn(async move {
            loop {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut raw = Vec::new();
                let mut buf = [0u8; 4096];

                // Read the whole request before answering
                loop {
                    let n = socket.read(&mut buf).await.unwrap();
                    raw.extend_from_slice(&buf[..n]);
                    let text = String::from_utf8_lossy(&raw);
                    if let Some(header_end) = text.find("\r\n\r\n") {
                        let content_length = text
                            .lines()
                            .find_map(|line| {
                                let (name, value) = line.split_once(':')?;
                                if name.eq_ignore_ascii_case("content-length") {
                                    value.trim().parse::<usize>().ok()
                                } else {
                                    None
                                }
                            })
                            .unwrap_or(0);
                        if raw.len() >= header_end + 4 + content_length {
                            break;
                        }
                    }
                    if n == 0 {
                        break;
                    }
                }
                let reply = format!(
                    "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    status_line,
                    body.len(),
                    body
                );
                socket.write_all(reply.as_bytes()).await.unwrap();
                socket.shutdown().await.ok();
            }
        });

        base_url
    }

    fn app_with_backend(base_url: &str) -> App {
        let mut app = App::new(&Config::new());
        app.backend = BackendClient::new(base_url);
        app
    }

    /// Backend URL pointing at a port that refuses connections.
    async fn refused_backend_url() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);
        base_url
    }

    #[tokio::test]
    async fn empty_and_whitespace_submits_are_noops() {
        let mut app = App::new(&Config::new());

        app.submit_chat_message();
        app.input = "   ".to_string();
        app.submit_chat_message();

        assert!(app.messages.is_empty());
        assert!(!app.is_pending());
        assert_eq!(app.input, "   ");
    }

    #[tokio::test]
    async fn chat_round_trip_appends_user_then_ai() {
        let base_url = spawn_stub("200 OK", "{\"response\": \"Hello back\"}").await;
        let mut app = app_with_backend(&base_url);

        app.input = "Hi".to_string();
        app.submit_chat_message();

        assert_eq!(app.messages.len(), 1);
        assert_eq!(app.messages[0].sender, Sender::User);
        assert_eq!(app.messages[0].text, "Hi");
        assert!(app.input.is_empty());
        assert!(app.is_pending());

        app.settle_pending().await;

        assert_eq!(app.messages.len(), 2);
        assert_eq!(app.messages[1].sender, Sender::Ai);
        assert_eq!(app.messages[1].text, "Hello back");
        assert!(!app.is_pending());
    }

    #[tokio::test]
    async fn second_submission_while_pending_is_a_noop() {
        let base_url = spawn_stub("200 OK", "{\"response\": \"ok\"}").await;
        let mut app = app_with_backend(&base_url);

        app.input = "first".to_string();
        app.submit_chat_message();
        assert_eq!(app.messages.len(), 1);

        app.input = "second".to_string();
        app.submit_chat_message();
        assert_eq!(app.messages.len(), 1);
        assert_eq!(app.input, "second");

        app.repo_url_input = "https://github.com/o/r".to_string();
        app.question_input = "What is this?".to_string();
        app.submit_repo_analysis();
        assert_eq!(app.messages.len(), 1);
        assert!(app.alert.is_none());

        app.settle_pending().await;
        assert_eq!(app.messages.len(), 2);
    }

    #[tokio::test]
    async fn transport_failure_appends_chat_fallback() {
        let base_url = refused_backend_url().await;
        let mut app = app_with_backend(&base_url);

        app.input = "Hi".to_string();
        app.submit_chat_message();
        app.settle_pending().await;

        assert_eq!(app.messages.len(), 2);
        assert_eq!(app.messages[1].sender, Sender::Ai);
        assert_eq!(app.messages[1].text, FALLBACK_CHAT);
        assert!(!app.is_pending());
    }

    #[tokio::test]
    async fn http_error_appends_chat_fallback() {
        let base_url = spawn_stub("500 Internal Server Error", "{\"error\": \"boom\"}").await;
        let mut app = app_with_backend(&base_url);

        app.input = "Hi".to_string();
        app.submit_chat_message();
        app.settle_pending().await;

        assert_eq!(app.messages[1].text, FALLBACK_CHAT);
        assert!(!app.is_pending());
    }

    #[tokio::test]
    async fn analysis_with_empty_field_raises_alert_and_sends_nothing() {
        let mut app = App::new(&Config::new());
        app.show_repo_dialog = true;
        app.repo_url_input = "https://github.com/o/r".to_string();
        app.question_input = "  ".to_string();

        app.submit_repo_analysis();

        assert_eq!(app.alert.as_deref(), Some(ALERT_EMPTY_FIELDS));
        assert!(app.messages.is_empty());
        assert!(!app.is_pending());
        assert!(app.show_repo_dialog);
    }

    #[tokio::test]
    async fn analysis_round_trip_closes_dialog_and_clears_fields() {
        let base_url = spawn_stub("200 OK", "{\"response\": \"A Rust crate.\"}").await;
        let mut app = app_with_backend(&base_url);

        app.open_repo_dialog();
        app.repo_url_input = "https://github.com/o/r".to_string();
        app.question_input = "What is this?".to_string();
        app.submit_repo_analysis();

        assert!(!app.show_repo_dialog);
        assert!(app.repo_url_input.is_empty());
        assert!(app.question_input.is_empty());
        assert_eq!(app.messages.len(), 1);
        assert_eq!(app.messages[0].sender, Sender::User);
        assert!(app.messages[0].text.contains("https://github.com/o/r"));
        assert!(app.messages[0].text.contains("What is this?"));

        app.settle_pending().await;

        assert_eq!(app.messages.len(), 2);
        assert_eq!(app.messages[1].text, "A Rust crate.");
    }

    #[tokio::test]
    async fn analysis_transport_failure_uses_analysis_fallback() {
        let base_url = refused_backend_url().await;
        let mut app = app_with_backend(&base_url);

        app.repo_url_input = "https://github.com/o/r".to_string();
        app.question_input = "What is this?".to_string();
        app.submit_repo_analysis();
        app.settle_pending().await;

        assert_eq!(app.messages[1].text, FALLBACK_ANALYZE);
        assert!(!app.is_pending());
    }

    #[tokio::test]
    async fn dialog_cannot_open_while_pending() {
        let base_url = spawn_stub("200 OK", "{\"response\": \"ok\"}").await;
        let mut app = app_with_backend(&base_url);

        app.input = "Hi".to_string();
        app.submit_chat_message();
        app.open_repo_dialog();
        assert!(!app.show_repo_dialog);

        app.settle_pending().await;
        app.open_repo_dialog();
        assert!(app.show_repo_dialog);
    }

    #[tokio::test]
    async fn cancelling_dialog_discards_fields() {
        let mut app = App::new(&Config::new());
        app.open_repo_dialog();
        app.repo_url_input = "https://github.com/o/r".to_string();
        app.question_input = "Why?".to_string();

        app.close_repo_dialog();

        assert!(!app.show_repo_dialog);
        assert!(app.repo_url_input.is_empty());
        assert!(app.question_input.is_empty());
    }
}
