//! Message formatting utilities for terminal display.

use tabiji_chat::{
    connection::{ConnectionState, DisconnectReason},
    controller::MessageSide,
    domain::{ConversationSummary, DeliveryStatus, Message, Presence, PresenceTracker, Timestamp},
};
use tabiji_shared::time::timestamp_to_rfc3339;

const RULE: &str = "============================================================";

fn format_time(timestamp: Timestamp) -> String {
    timestamp_to_rfc3339(timestamp.value()).unwrap_or_else(|| timestamp.value().to_string())
}

fn format_presence(presence: Option<&Presence>) -> String {
    match presence {
        Some(Presence {
            is_online: true, ..
        }) => "online".to_string(),
        Some(Presence {
            last_seen: Some(last_seen),
            ..
        }) => format!("offline, last seen {}", format_time(*last_seen)),
        _ => "offline".to_string(),
    }
}

/// Message formatter for terminal display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format the conversation list, in the order given
    ///
    /// # Arguments
    ///
    /// * `conversations` - Conversations to show (already sorted / filtered)
    /// * `presence` - Presence of the counterparts
    pub fn format_conversation_list(
        conversations: &[&ConversationSummary],
        presence: &PresenceTracker,
    ) -> String {
        let mut output = String::new();
        output.push_str(&format!("\n{}\nConversations:\n", RULE));

        if conversations.is_empty() {
            output.push_str("(No conversations)\n");
        } else {
            for conversation in conversations {
                let marker = if presence.is_online(&conversation.counterpart_id) {
                    "*"
                } else {
                    " "
                };
                let unread = match conversation.unread_count {
                    0 => String::new(),
                    n => format!(" [{} unread]", n),
                };
                output.push_str(&format!(
                    "{} {} ({}){}\n",
                    marker,
                    conversation.title(),
                    conversation.counterpart_id,
                    unread
                ));
                if let Some(last) = &conversation.last_message {
                    let from = if last.from_me { "you: " } else { "" };
                    output.push_str(&format!("    {}{}\n", from, last.content));
                }
            }
        }

        output.push_str(RULE);
        output.push('\n');
        output
    }

    /// Format the header printed when a thread is opened
    pub fn format_thread_header(title: &str, presence: Option<&Presence>) -> String {
        format!(
            "\n{}\n{} ({})\n{}\n",
            RULE,
            title,
            format_presence(presence),
            RULE
        )
    }

    /// Format one message of the open thread
    ///
    /// # Arguments
    ///
    /// * `from` - Name shown for the sender
    /// * `message` - The message
    /// * `side` - Which side of the thread the message belongs to
    /// * `status` - Delivery status; on the incoming side only a pending send is marked
    pub fn format_message(
        from: &str,
        message: &Message,
        side: MessageSide,
        status: DeliveryStatus,
    ) -> String {
        let time = format_time(message.created_at);
        match side {
            MessageSide::Incoming => match status {
                // own notes in a self-conversation
                DeliveryStatus::Pending => {
                    format!("@{}: {}\n  {} (sending)\n", from, message.content, time)
                }
                _ => format!("@{}: {}\n  {}\n", from, message.content, time),
            },
            MessageSide::Outgoing => {
                let status = match status {
                    DeliveryStatus::Pending => "sending",
                    DeliveryStatus::Sent => "sent",
                    DeliveryStatus::Read => "read",
                };
                format!("  > {}\n  {} ({})\n", message.content, time, status)
            }
        }
    }

    /// Format the line separating messages of different days
    pub fn format_day_separator(day: &impl std::fmt::Display) -> String {
        format!("-------------------- {} --------------------\n", day)
    }

    /// Format a notification for a message outside the open thread
    pub fn format_message_elsewhere(from: &str, content: &str) -> String {
        format!("\n[new] @{}: {}\n", from, content)
    }

    pub fn format_typing(name: &str) -> String {
        format!("\n{} is typing...\n", name)
    }

    /// Format a presence change of a single user
    pub fn format_presence_change(name: &str, presence: &Presence) -> String {
        let sign = if presence.is_online { '+' } else { '-' };
        format!("\n{} {} is {}\n", sign, name, format_presence(Some(presence)))
    }

    /// Format a connection state change
    pub fn format_connection_state(state: ConnectionState) -> String {
        let text = match state {
            ConnectionState::Idle => return String::new(),
            ConnectionState::Connecting => "connecting...".to_string(),
            ConnectionState::Connected => "connected".to_string(),
            ConnectionState::Reconnecting { attempt } => {
                format!("connection lost, reconnecting (attempt {})...", attempt)
            }
            ConnectionState::Disconnected(DisconnectReason::Manual) => "disconnected".to_string(),
            ConnectionState::Disconnected(DisconnectReason::RetriesExhausted) => {
                "could not reconnect. Type /retry to try again".to_string()
            }
            ConnectionState::Disconnected(DisconnectReason::Unauthenticated) => {
                "signed out. Sign in again, then type /retry".to_string()
            }
        };
        format!("\n[connection] {}\n", text)
    }

    pub fn format_notice(text: &str) -> String {
        format!("\n! {}\n", text)
    }

    pub fn format_help() -> String {
        "\nCommands:\n  \
         /list            show conversations (online first)\n  \
         /search <text>   filter conversations by name\n  \
         /open <user>     open the thread with <user>\n  \
         /retry           reconnect after the connection gave up\n  \
         /quit            exit\n\
         Any other line is sent to the open thread.\n"
            .to_string()
    }
}
