use ratatui::layout::Rect;
use std::sync::Arc;

use crate::config::Config;
use crate::conversation::{Conversation, Turn};
use crate::error::ModelCallFailure;
use crate::ollama::ChatModel;
use crate::thinking::{ThinkingIndicator, ThinkingTimer};
use crate::tui::EventSender;
use crate::worker::ChatWorker;

/// Result of pressing Enter or the send control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submit {
    Sent,
    /// Input was empty or whitespace
    Empty,
    /// A request is already outstanding
    Busy,
}

/// Application state for one window. Created when the window opens and
/// dropped when it closes; only the UI task mutates it.
pub struct App {
    pub should_quit: bool,
    pub config: Config,

    // Conversation
    pub conversation: Conversation,
    client: Arc<dyn ChatModel>,
    events: EventSender,
    worker: Option<ChatWorker>,

    // Thinking animation
    indicator: ThinkingIndicator,
    timer: ThinkingTimer,

    // Input line
    pub input: String,
    pub cursor: usize, // cursor position in chars

    // Chat viewport
    pub chat_scroll: u16,
    pub follow_bottom: bool,
    pub chat_height: u16,      // inner height of chat area, updated on draw
    pub chat_total_lines: u16, // rendered line count, updated on draw

    // Areas for mouse hit-testing
    pub chat_area: Option<Rect>,
    pub send_area: Option<Rect>,
}

impl App {
    pub fn new(config: Config, client: Arc<dyn ChatModel>, events: EventSender) -> Self {
        let indicator = ThinkingIndicator::new(&config.assistant_name);
        Self {
            should_quit: false,
            config,

            conversation: Conversation::new(),
            client,
            events,
            worker: None,

            indicator,
            timer: ThinkingTimer::default(),

            input: String::new(),
            cursor: 0,

            chat_scroll: 0,
            follow_bottom: true,
            chat_height: 0,
            chat_total_lines: 0,

            chat_area: None,
            send_area: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.worker.is_some()
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }

    /// Send the current input as a user turn.
    ///
    /// The input is cleared immediately; the reply arrives later as an
    /// `AppEvent::Reply` handled by [`App::finish_request`].
    pub fn submit(&mut self) -> Submit {
        let text = self.input.trim();
        if text.is_empty() {
            return Submit::Empty;
        }
        if self.is_pending() {
            tracing::debug!("submission rejected, request already outstanding");
            return Submit::Busy;
        }

        let text = text.to_string();
        self.input.clear();
        self.cursor = 0;

        self.conversation.append(Turn::user(text));
        let history = self.conversation.history();

        self.indicator.reset();
        self.conversation.begin_thinking(self.indicator.label());
        self.timer.start(self.events.clone(), self.config.thinking_interval());
        self.worker = Some(ChatWorker::start(self.client.clone(), history, self.events.clone()));

        self.scroll_to_bottom();
        Submit::Sent
    }

    /// Advance the placeholder animation. Stale ticks after completion are ignored.
    pub fn tick_animation(&mut self) {
        if let Some(turn) = self.conversation.thinking_mut() {
            turn.content = self.indicator.tick();
            self.scroll_to_bottom();
        }
    }

    /// Completion of the outstanding request, success or failure
    pub fn finish_request(&mut self, result: Result<String, ModelCallFailure>) {
        self.timer.stop();
        self.conversation.clear_thinking();
        if let Some(worker) = self.worker.take() {
            tracing::trace!(task_done = worker.is_finished(), "request slot released");
        }

        match result {
            Ok(reply) => self.conversation.append(Turn::assistant(reply)),
            Err(failure) => self
                .conversation
                .append(Turn::system(format!("Error: {}", failure))),
        }

        self.scroll_to_bottom();
    }

    pub fn scroll_to_bottom(&mut self) {
        self.follow_bottom = true;
        self.chat_scroll = self.max_scroll();
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.follow_bottom = false;
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        let max = self.max_scroll();
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(max);
        if self.chat_scroll >= max {
            self.follow_bottom = true;
        }
    }

    pub fn scroll_half_page_up(&mut self) {
        self.scroll_up((self.chat_height / 2).max(1));
    }

    pub fn scroll_half_page_down(&mut self) {
        self.scroll_down((self.chat_height / 2).max(1));
    }

    pub fn max_scroll(&self) -> u16 {
        self.chat_total_lines.saturating_sub(self.chat_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Role;
    use crate::tui::AppEvent;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::sync::mpsc;

    /// Replays canned results and records every history it was sent
    struct Scripted {
        replies: Mutex<VecDeque<Result<String, ModelCallFailure>>>,
        seen: Arc<Mutex<Vec<Vec<Turn>>>>,
    }

    #[async_trait]
    impl ChatModel for Scripted {
        async fn complete(&self, history: &[Turn]) -> Result<String, ModelCallFailure> {
            self.seen.lock().unwrap().push(history.to_vec());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ModelCallFailure::new("no scripted reply")))
        }

        fn model(&self) -> &str {
            "scripted"
        }
    }

    type Seen = Arc<Mutex<Vec<Vec<Turn>>>>;

    fn scripted_app(
        replies: Vec<Result<String, ModelCallFailure>>,
    ) -> (App, mpsc::UnboundedReceiver<AppEvent>, Seen) {
        let (tx, rx) = mpsc::unbounded_channel();
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        let client = Scripted {
            replies: Mutex::new(replies.into()),
            seen: seen.clone(),
        };
        (App::new(Config::default(), Arc::new(client), tx), rx, seen)
    }

    /// Pump events like the main loop does until the reply has been applied
    async fn drive_until_reply(app: &mut App, rx: &mut mpsc::UnboundedReceiver<AppEvent>) {
        while let Some(event) = rx.recv().await {
            match event {
                AppEvent::Tick => app.tick_animation(),
                AppEvent::Reply(result) => {
                    app.finish_request(result);
                    return;
                }
                _ => {}
            }
        }
        panic!("event channel closed before reply");
    }

    fn count_role(app: &App, role: Role) -> usize {
        app.conversation.turns().iter().filter(|t| t.role == role).count()
    }

    #[tokio::test]
    async fn test_hello_round_trip() {
        let (mut app, mut rx, _) = scripted_app(vec![Ok("hi there".to_string())]);
        app.input = "hello".to_string();
        app.cursor = 5;

        assert_eq!(app.submit(), Submit::Sent);
        assert!(app.input.is_empty());
        assert_eq!(app.cursor, 0);
        assert_eq!(
            app.conversation.turns(),
            &[Turn::user("hello"), Turn::thinking("💭 DeskChat is thinking")]
        );
        assert!(app.is_pending());
        assert!(app.timer.is_running());

        drive_until_reply(&mut app, &mut rx).await;

        assert_eq!(
            app.conversation.turns(),
            &[Turn::user("hello"), Turn::assistant("hi there")]
        );
        assert!(!app.is_pending());
        assert!(!app.timer.is_running());
    }

    #[tokio::test]
    async fn test_failure_becomes_system_turn() {
        let (mut app, mut rx, _) =
            scripted_app(vec![Err(ModelCallFailure::new("connection refused"))]);
        app.input = "hello".to_string();
        app.submit();

        drive_until_reply(&mut app, &mut rx).await;

        assert_eq!(
            app.conversation.turns(),
            &[Turn::user("hello"), Turn::system("Error: connection refused")]
        );
        assert!(!app.timer.is_running());
        assert_eq!(count_role(&app, Role::Thinking), 0);
    }

    #[tokio::test]
    async fn test_whitespace_input_is_a_no_op() {
        let (mut app, _rx, seen) = scripted_app(vec![]);
        for text in ["", "   ", "\t \t"] {
            app.input = text.to_string();
            assert_eq!(app.submit(), Submit::Empty);
        }
        assert!(app.conversation.is_empty());
        assert!(!app.is_pending());
        tokio::task::yield_now().await;
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_input_is_trimmed() {
        let (mut app, mut rx, _) = scripted_app(vec![Ok("ok".to_string())]);
        app.input = "  hello  ".to_string();
        app.submit();
        assert_eq!(app.conversation.turns()[0], Turn::user("hello"));
        drive_until_reply(&mut app, &mut rx).await;
    }

    #[tokio::test]
    async fn test_second_submission_rejected_while_pending() {
        let (mut app, mut rx, seen) = scripted_app(vec![Ok("one".to_string()), Ok("two".to_string())]);
        app.input = "first".to_string();
        assert_eq!(app.submit(), Submit::Sent);

        app.input = "second".to_string();
        assert_eq!(app.submit(), Submit::Busy);
        assert_eq!(app.input, "second");
        assert_eq!(count_role(&app, Role::User), 1);
        assert_eq!(count_role(&app, Role::Thinking), 1);

        drive_until_reply(&mut app, &mut rx).await;
        assert_eq!(seen.lock().unwrap().len(), 1);

        assert_eq!(app.submit(), Submit::Sent);
        drive_until_reply(&mut app, &mut rx).await;
        assert_eq!(count_role(&app, Role::User), 2);
        assert_eq!(count_role(&app, Role::Assistant), 2);
    }

    #[tokio::test]
    async fn test_history_sent_matches_log_before_request() {
        let (mut app, mut rx, seen) = scripted_app(vec![
            Ok("hi there".to_string()),
            Err(ModelCallFailure::new("model not found")),
            Ok("third".to_string()),
        ]);

        for text in ["hello", "again", "once more"] {
            let mut expected = app.conversation.history();
            expected.push(Turn::user(text));

            app.input = text.to_string();
            app.submit();
            drive_until_reply(&mut app, &mut rx).await;

            assert_eq!(seen.lock().unwrap().last().unwrap(), &expected);
        }

        assert_eq!(app.conversation.len(), 6);
        assert_eq!(app.conversation.turns()[3], Turn::system("Error: model not found"));
    }

    #[tokio::test]
    async fn test_three_ticks_wrap_label() {
        let (mut app, _rx, _) = scripted_app(vec![]);
        app.config.thinking_interval_ms = 60_000;
        app.input = "hello".to_string();
        app.submit();

        let label = |app: &App| app.conversation.turns()[1].content.clone();
        app.tick_animation();
        assert_eq!(label(&app), "💭 DeskChat is thinking.");
        app.tick_animation();
        assert_eq!(label(&app), "💭 DeskChat is thinking..");
        app.tick_animation();
        assert_eq!(label(&app), "💭 DeskChat is thinking...");
        app.tick_animation();
        assert_eq!(label(&app), "💭 DeskChat is thinking.");
        assert_eq!(count_role(&app, Role::Thinking), 1);
    }

    #[tokio::test]
    async fn test_stale_tick_after_completion_is_ignored() {
        let (mut app, _rx, _) = scripted_app(vec![]);
        app.input = "hello".to_string();
        app.submit();
        app.finish_request(Ok("done".to_string()));

        app.tick_animation();
        assert_eq!(
            app.conversation.turns(),
            &[Turn::user("hello"), Turn::assistant("done")]
        );
    }

    #[tokio::test]
    async fn test_scrolling_unpins_and_repins_bottom() {
        let (mut app, _rx, _) = scripted_app(vec![]);
        app.chat_height = 10;
        app.chat_total_lines = 30;
        app.scroll_to_bottom();
        assert_eq!(app.chat_scroll, 20);

        app.scroll_up(5);
        assert!(!app.follow_bottom);
        assert_eq!(app.chat_scroll, 15);

        app.scroll_down(100);
        assert!(app.follow_bottom);
        assert_eq!(app.chat_scroll, 20);
    }
}
