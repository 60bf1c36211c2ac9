//! Client-side chat state: transcript, draft input and the in-flight guard
//!
//! Frontends own one `ChatSession` and feed it `ReplyEvent`s in arrival
//! order. Every change to the transcript goes through this type, so the
//! placeholder invariant holds no matter how the UI schedules its work.

use crate::prompt::{FALLBACK_REPLY, GREETING};
use crate::state::{ChatMessage, ChatRole};

/// Progress of one streamed reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyEvent {
    Chunk(String),
    Finished,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct ChatSession {
    transcript: Vec<ChatMessage>,
    draft: String,
    awaiting: bool,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            transcript: vec![ChatMessage::assistant(GREETING)],
            draft: String::new(),
            awaiting: false,
        }
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Replace the draft; ignored while a reply is in flight
    pub fn set_draft(&mut self, draft: impl Into<String>) {
        if !self.awaiting {
            self.draft = draft.into();
        }
    }

    pub fn is_awaiting(&self) -> bool {
        self.awaiting
    }

    /// Start a send if the draft has text and nothing is in flight.
    ///
    /// Returns the history to POST: the transcript as it was plus the new
    /// user turn, without the empty placeholder that now ends the transcript.
    pub fn begin_send(&mut self) -> Option<Vec<ChatMessage>> {
        if self.awaiting || self.draft.trim().is_empty() {
            return None;
        }

        self.awaiting = true;
        let content = std::mem::take(&mut self.draft);

        let mut history = self.transcript.clone();
        history.push(ChatMessage::user(content));

        let mut transcript = history.clone();
        transcript.push(ChatMessage::assistant(""));
        self.transcript = transcript;

        Some(history)
    }

    pub fn apply(&mut self, event: ReplyEvent) {
        match event {
            ReplyEvent::Chunk(text) => self.apply_chunk(&text),
            ReplyEvent::Finished => self.finish(),
            ReplyEvent::Failed(_) => self.fail(),
        }
    }

    /// Grow the trailing placeholder by one decoded fragment
    pub fn apply_chunk(&mut self, text: &str) {
        if !self.awaiting || text.is_empty() {
            return;
        }
        if let Some(last) = self.transcript.last_mut() {
            last.content.push_str(text);
        }
    }

    pub fn finish(&mut self) {
        self.awaiting = false;
    }

    /// End the in-flight send with the canned apology.
    ///
    /// An untouched placeholder is dropped first; a partially streamed reply
    /// stays and the apology follows it.
    pub fn fail(&mut self) {
        if !self.awaiting {
            return;
        }
        if self
            .transcript
            .last()
            .is_some_and(|m| m.role == ChatRole::Assistant && m.content.is_empty())
        {
            self.transcript.pop();
        }
        self.transcript.push(ChatMessage::assistant(FALLBACK_REPLY));
        self.awaiting = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_with_draft(draft: &str) -> ChatSession {
        let mut session = ChatSession::new();
        session.set_draft(draft);
        session
    }

    #[test]
    fn test_new_session_is_seeded_with_greeting() {
        let session = ChatSession::new();
        assert_eq!(session.transcript(), &[ChatMessage::assistant(GREETING)]);
        assert!(!session.is_awaiting());
        assert_eq!(session.draft(), "");
    }

    #[test]
    fn test_begin_send_builds_request_and_placeholder() {
        let mut session = session_with_draft("What topics do you cover?");
        let history = session.begin_send().unwrap();

        assert_eq!(
            history,
            vec![ChatMessage::assistant(GREETING), ChatMessage::user("What topics do you cover?")]
        );
        assert_eq!(session.transcript().len(), 3);
        assert_eq!(session.transcript()[2], ChatMessage::assistant(""));
        assert_eq!(session.draft(), "");
        assert!(session.is_awaiting());
    }

    #[test]
    fn test_user_content_is_sent_as_typed() {
        let mut session = session_with_draft("  spaced out  ");
        let history = session.begin_send().unwrap();
        assert_eq!(history[1].content, "  spaced out  ");
    }

    #[test]
    fn test_whitespace_draft_is_a_no_op() {
        let mut session = session_with_draft(" \n\t ");
        assert!(session.begin_send().is_none());
        assert_eq!(session.transcript().len(), 1);
        assert_eq!(session.draft(), " \n\t ");
        assert!(!session.is_awaiting());
    }

    #[test]
    fn test_send_while_awaiting_is_a_no_op() {
        let mut session = session_with_draft("first");
        session.begin_send().unwrap();
        session.apply_chunk("partial");

        // The draft cannot change mid-flight, so force one in directly
        session.draft = "second".to_string();
        let before = session.transcript().to_vec();

        assert!(session.begin_send().is_none());
        assert_eq!(session.transcript(), before.as_slice());
        assert_eq!(session.draft(), "second");
    }

    #[test]
    fn test_set_draft_ignored_while_awaiting() {
        let mut session = session_with_draft("first");
        session.begin_send().unwrap();
        session.set_draft("typed during reply");
        assert_eq!(session.draft(), "");
    }

    #[test]
    fn test_chunks_concatenate_into_placeholder() {
        let mut session = session_with_draft("What topics do you cover?");
        session.begin_send().unwrap();
        let before: Vec<ChatMessage> = session.transcript()[..2].to_vec();

        let fragments = ["Algorithms", ", data structures", ", and system design."];
        let mut previous_len = 0;
        for fragment in fragments {
            session.apply(ReplyEvent::Chunk(fragment.to_string()));
            let len = session.transcript().last().unwrap().content.len();
            assert!(len > previous_len);
            previous_len = len;
        }
        session.apply(ReplyEvent::Finished);

        assert_eq!(&session.transcript()[..2], before.as_slice());
        assert_eq!(
            session.transcript().last().unwrap(),
            &ChatMessage::assistant("Algorithms, data structures, and system design.")
        );
        assert!(!session.is_awaiting());
    }

    #[test]
    fn test_successful_send_grows_transcript_by_two() {
        for draft in ["a", "hello there", "multi\nline"] {
            let mut session = session_with_draft(draft);
            let before = session.transcript().len();
            session.begin_send().unwrap();
            session.apply(ReplyEvent::Chunk("reply".to_string()));
            session.apply(ReplyEvent::Finished);
            assert_eq!(session.transcript().len(), before + 2);
        }
    }

    #[test]
    fn test_failure_replaces_empty_placeholder_with_apology() {
        let mut session = session_with_draft("hi");
        session.begin_send().unwrap();
        session.apply(ReplyEvent::Failed("relay responded with status 500".to_string()));

        let transcript = session.transcript();
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript[1], ChatMessage::user("hi"));
        assert_eq!(transcript[2], ChatMessage::assistant(FALLBACK_REPLY));
        assert!(!session.is_awaiting());
    }

    #[test]
    fn test_failure_after_partial_reply_keeps_partial_text() {
        let mut session = session_with_draft("hi");
        session.begin_send().unwrap();
        session.apply(ReplyEvent::Chunk("Half an ans".to_string()));
        session.apply(ReplyEvent::Failed("connection reset".to_string()));

        let transcript = session.transcript();
        assert_eq!(transcript.len(), 4);
        assert_eq!(transcript[2], ChatMessage::assistant("Half an ans"));
        assert_eq!(transcript[3], ChatMessage::assistant(FALLBACK_REPLY));
    }

    #[test]
    fn test_events_after_completion_are_ignored() {
        let mut session = session_with_draft("hi");
        session.begin_send().unwrap();
        session.apply(ReplyEvent::Finished);
        let settled = session.transcript().to_vec();

        session.apply(ReplyEvent::Chunk("late".to_string()));
        session.apply(ReplyEvent::Failed("late".to_string()));
        assert_eq!(session.transcript(), settled.as_slice());
    }
}
