use based_llm::{Message, ToolCall};

/// Mutable state threaded through the nodes of one exchange
#[derive(Debug, Clone)]
pub struct ExchangeState {
    pub conversation_id: i64,
    pub run_id: String,
    pub messages: Vec<Message>,
    /// Model calls made so far
    pub round: usize,
    pub tool_calls_executed: usize,
    pub pending_tool_calls: Vec<ToolCall>,
    pub final_text: Option<String>,
}

impl ExchangeState {
    pub fn new(conversation_id: i64) -> Self {
        Self {
            conversation_id,
            run_id: uuid::Uuid::new_v4().to_string(),
            messages: Vec::new(),
            round: 0,
            tool_calls_executed: 0,
            pending_tool_calls: Vec::new(),
            final_text: None,
        }
    }

    pub fn add_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn has_pending_tool_calls(&self) -> bool {
        !self.pending_tool_calls.is_empty()
    }

    /// Record the assistant turn carrying the calls and queue them
    pub fn request_tools(&mut self, content: Option<String>, calls: Vec<ToolCall>) {
        self.messages
            .push(Message::assistant_with_tools(content, calls.clone()));
        self.pending_tool_calls = calls;
    }

    pub fn take_pending_tool_calls(&mut self) -> Vec<ToolCall> {
        std::mem::take(&mut self.pending_tool_calls)
    }

    pub fn add_tool_result(&mut self, tool_call_id: impl Into<String>, content: impl Into<String>) {
        self.tool_calls_executed += 1;
        self.messages.push(Message::tool_result(tool_call_id, content));
    }

    pub fn finish(&mut self, text: Option<String>) {
        self.pending_tool_calls.clear();
        self.final_text = text;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_round_trip_in_state() {
        let mut state = ExchangeState::new(1);
        state.request_tools(None, vec![ToolCall::new("call_1", "a_lookup", "{}")]);
        assert!(state.has_pending_tool_calls());

        let calls = state.take_pending_tool_calls();
        assert_eq!(calls.len(), 1);
        assert!(!state.has_pending_tool_calls());

        state.add_tool_result("call_1", "Tool: a_lookup Result: 1");
        assert_eq!(state.tool_calls_executed, 1);
        assert_eq!(state.messages.len(), 2);
        assert_eq!(state.messages[1].role(), "tool");
    }
}
