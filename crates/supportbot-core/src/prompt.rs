//! Fixed conversation text: the assistant persona and the canned client messages

use crate::state::ChatMessage;

/// Sent upstream verbatim, typos included, so replies match the deployed bot
pub const SYSTEM_PROMPT: &str = "
You are the customer support bot for Headstarter AI, a platform specializing in AI-powered interviews for software engineering positions. Your primary role is to assist users with their inquiries and provide support related to our platform's features, functionality, and general usage.

1. HeadStarterAi offers Ai-powered interviews for software engineering positions
2. Our platform helps candidates practice and prepare for real job interviews.
3. We cover a wide range of topics including algorithms, data structures, system design, and behavioral questions.
4. Users can access our services through our website or mobile app.
5. If asked about technical issues, guide users to our troubleshotting page or suggest contacting our technical support team.
6. Always maintain user privacy and do not share personal information.
7. If you're unsure about any information, it's okay to say you don't know and offer to connect the user with a human representative.

Your goal is to provide accurate information, assist with common inquiries, and ensure a positive experience for all HeadStarterAI users.";

/// First message of every new transcript
pub const GREETING: &str = "Hi! I'm the Headstarter Support Agent, how can I assist you today?";

/// Shown in place of a reply when the relay request fails
pub const FALLBACK_REPLY: &str = "I'm sorry, but I encountered an error. Please try again later.";

/// Prepend the system instruction to a caller-supplied history.
///
/// The history is forwarded unmodified and in order.
pub fn build_messages(history: Vec<ChatMessage>) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 1);
    messages.push(ChatMessage::system(SYSTEM_PROMPT));
    messages.extend(history);
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ChatRole;

    #[test]
    fn test_build_messages_prepends_system_prompt() {
        let history = vec![ChatMessage::assistant(GREETING), ChatMessage::user("What topics do you cover?")];
        let messages = build_messages(history.clone());

        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, ChatRole::System);
        assert_eq!(messages[0].content, SYSTEM_PROMPT);
        assert_eq!(&messages[1..], history.as_slice());
    }

    #[test]
    fn test_system_prompt_wording_is_unchanged() {
        assert!(SYSTEM_PROMPT.starts_with("\nYou are the customer support bot for Headstarter AI,"));
        assert!(SYSTEM_PROMPT.contains("\n1. HeadStarterAi offers Ai-powered interviews for software engineering positions\n2."));
        assert!(SYSTEM_PROMPT.contains("guide users to our troubleshotting page"));
        assert!(SYSTEM_PROMPT.ends_with("a positive experience for all HeadStarterAI users."));
    }

    #[test]
    fn test_build_messages_keeps_caller_system_messages() {
        let history = vec![ChatMessage::system("be brief"), ChatMessage::user("hi")];
        let messages = build_messages(history);

        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1], ChatMessage::system("be brief"));
    }
}
