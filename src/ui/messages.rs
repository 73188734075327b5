//! Message log fragments.

use crate::session::{Message, Sender};

/// Render one message bubble.
pub fn render_message(message: &Message) -> String {
    let class = match message.sender {
        Sender::User => "message user",
        Sender::Bot => "message bot",
    };
    format!(
        r#"<div class="{class}" data-sent-at="{sent_at}"><div><strong>{name}:</strong> <span>{body}</span></div></div>"#,
        sent_at = message.sent_at.to_rfc3339(),
        name = message.sender.display_name(),
        body = message.body.to_html(),
    )
}

/// Render the whole log in display order.
pub fn render_log(messages: &[Message]) -> String {
    messages.iter().map(render_message).collect()
}

/// The transient "typing" placeholder shown while a question is outstanding.
///
/// Never part of the log itself.
pub fn typing_indicator(pending: bool) -> String {
    let hidden = if pending { "" } else { " hidden" };
    format!(
        r#"<div id="typing" class="message bot"{hidden}><strong>{name}:</strong> Typing...</div>"#,
        name = Sender::Bot.display_name(),
    )
}
