//! In-memory conversation log.
//!
//! Insertion order is display order and the order turns are sent to the
//! model. The log lives for the lifetime of the window and is never persisted.

/// Who a turn belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
    System,
    /// Transient placeholder shown while a request is outstanding
    Thinking,
}

impl Role {
    /// Role name understood by the chat endpoint. `Thinking` is never sent.
    pub fn api_name(&self) -> Option<&'static str> {
        match self {
            Role::User => Some("user"),
            Role::Assistant => Some("assistant"),
            Role::System => Some("system"),
            Role::Thinking => None,
        }
    }
}

/// One message in the conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn thinking(content: impl Into<String>) -> Self {
        Self::new(Role::Thinking, content)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn. A thinking turn replaces any existing one so the log
    /// never holds more than one placeholder.
    pub fn append(&mut self, turn: Turn) {
        if turn.role == Role::Thinking {
            self.clear_thinking();
        }
        self.turns.push(turn);
    }

    /// Remove every turn matching `pred`, returning how many were removed
    pub fn remove_where<F>(&mut self, mut pred: F) -> usize
    where
        F: FnMut(&Turn) -> bool,
    {
        let before = self.turns.len();
        self.turns.retain(|turn| !pred(turn));
        before - self.turns.len()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// The turns sent to the model: everything except the placeholder
    pub fn history(&self) -> Vec<Turn> {
        self.turns
            .iter()
            .filter(|turn| turn.role != Role::Thinking)
            .cloned()
            .collect()
    }

    pub fn begin_thinking(&mut self, label: impl Into<String>) {
        self.append(Turn::thinking(label));
    }

    pub fn thinking_mut(&mut self) -> Option<&mut Turn> {
        self.turns.iter_mut().find(|turn| turn.role == Role::Thinking)
    }

    pub fn clear_thinking(&mut self) -> usize {
        self.remove_where(|turn| turn.role == Role::Thinking)
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thinking_count(conversation: &Conversation) -> usize {
        conversation
            .turns()
            .iter()
            .filter(|t| t.role == Role::Thinking)
            .count()
    }

    #[test]
    fn test_append_preserves_order() {
        let mut conversation = Conversation::new();
        conversation.append(Turn::user("hello"));
        conversation.append(Turn::assistant("hi there"));
        conversation.append(Turn::user("how are you"));

        let contents: Vec<&str> = conversation.turns().iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["hello", "hi there", "how are you"]);
    }

    #[test]
    fn test_at_most_one_thinking_turn() {
        let mut conversation = Conversation::new();
        conversation.append(Turn::user("hello"));
        conversation.begin_thinking("first");
        conversation.begin_thinking("second");
        conversation.append(Turn::thinking("third"));

        assert_eq!(thinking_count(&conversation), 1);
        assert_eq!(conversation.turns().last().unwrap().content, "third");
    }

    #[test]
    fn test_history_excludes_thinking() {
        let mut conversation = Conversation::new();
        conversation.append(Turn::user("hello"));
        conversation.append(Turn::system("Error: boom"));
        conversation.begin_thinking("💭 DeskChat is thinking");

        assert_eq!(
            conversation.history(),
            vec![Turn::user("hello"), Turn::system("Error: boom")]
        );
    }

    #[test]
    fn test_remove_where_counts_removed() {
        let mut conversation = Conversation::new();
        conversation.append(Turn::user("a"));
        conversation.append(Turn::user("b"));
        conversation.append(Turn::assistant("c"));

        let removed = conversation.remove_where(|t| t.role == Role::User);
        assert_eq!(removed, 2);
        assert_eq!(conversation.turns(), &[Turn::assistant("c")]);
    }

    #[test]
    fn test_thinking_mut_and_clear() {
        let mut conversation = Conversation::new();
        assert!(conversation.thinking_mut().is_none());
        assert_eq!(conversation.clear_thinking(), 0);

        conversation.begin_thinking("label");
        if let Some(turn) = conversation.thinking_mut() {
            turn.content.push('.');
        }
        assert_eq!(conversation.turns()[0].content, "label.");
        assert_eq!(conversation.clear_thinking(), 1);
        assert!(conversation.is_empty());
    }

    #[test]
    fn test_api_names() {
        assert_eq!(Role::User.api_name(), Some("user"));
        assert_eq!(Role::Assistant.api_name(), Some("assistant"));
        assert_eq!(Role::System.api_name(), Some("system"));
        assert_eq!(Role::Thinking.api_name(), None);
    }
}
