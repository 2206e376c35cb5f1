use chrono::{DateTime, Utc};

use super::{avatar_url, empty_state, escape_html, format_date_time, time_ago};
use crate::models::{Conversation, Message, UserSession};

const PREVIEW_CHARS: usize = 40;

fn preview(text: &str) -> String {
    if text.chars().count() > PREVIEW_CHARS {
        let cut: String = text.chars().take(PREVIEW_CHARS).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}

pub fn conversation_list(
    conversations: &[Conversation],
    active_partner: Option<i64>,
    now: DateTime<Utc>,
) -> String {
    if conversations.is_empty() {
        return empty_state("No conversations yet.");
    }
    conversations
        .iter()
        .map(|conv| {
            let partner = &conv.partner;
            let partner_id = partner.id.unwrap_or_default();
            let name = partner.display_name();
            let active = if partner.id.is_some() && partner.id == active_partner { " active" } else { "" };
            let unread = if conv.unread > 0 {
                format!(r#"<span class="unread-count">{}</span>"#, conv.unread)
            } else {
                String::new()
            };
            format!(
                concat!(
                    r#"<div class="conversation-item{active}" data-partner-id="{id}">"#,
                    r#"<img src="{avatar}" alt="{name}">"#,
                    r#"<div class="conversation-info"><h4>{name}</h4><p>{preview}</p></div>"#,
                    r#"<div class="conversation-meta"><span class="time">{when}</span>{unread}</div>"#,
                    "</div>"
                ),
                active = active,
                id = partner_id,
                avatar = escape_html(&avatar_url(&name)),
                name = escape_html(&name),
                preview = escape_html(&preview(&conv.last_message)),
                when = time_ago(conv.last_at.as_deref(), now),
                unread = unread,
            )
        })
        .collect()
}

/// Chat thread. Direction is decided by comparing the sender with the signed-in user.
pub fn chat_messages(messages: &[Message], me: Option<&UserSession>) -> String {
    if messages.is_empty() {
        return empty_state("No messages yet. Start a conversation!");
    }
    let my_id = me.and_then(|user| user.id);
    messages
        .iter()
        .map(|msg| {
            let mine = my_id.is_some() && msg.sender.id == my_id;
            let (direction, sender) = if mine {
                ("sent", "You".to_string())
            } else {
                ("received", msg.sender.display_name())
            };
            format!(
                concat!(
                    r#"<div class="message {direction}" data-message-id="{id}">"#,
                    r#"<div class="message-sender">{sender}</div>"#,
                    r#"<div class="message-content">{text}</div>"#,
                    r#"<div class="message-time">{when}</div>"#,
                    "</div>"
                ),
                direction = direction,
                id = msg.id,
                sender = escape_html(&sender),
                text = escape_html(&msg.text),
                when = format_date_time(msg.created_at.as_deref()),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Profile;
    use chrono::TimeZone;

    fn person(id: i64, name: &str) -> Profile {
        Profile {
            id: Some(id),
            username: name.into(),
            ..Default::default()
        }
    }

    fn message(id: i64, sender: Profile, text: &str) -> Message {
        Message {
            id,
            sender,
            text: text.into(),
            created_at: Some("2025-03-20T10:15:00Z".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_chat_direction_follows_session_user() {
        let me = person(1, "asha");
        let msgs = vec![
            message(10, person(1, "asha"), "Hi, is the gig still open?"),
            message(11, person(2, "vikram"), "Yes <b>it is</b>"),
        ];
        let html = chat_messages(&msgs, Some(&me));
        assert!(html.contains(r#"<div class="message sent" data-message-id="10"><div class="message-sender">You</div>"#));
        assert!(html.contains(r#"<div class="message received" data-message-id="11"><div class="message-sender">vikram</div>"#));
        assert!(html.contains("Yes &lt;b&gt;it is&lt;/b&gt;"));
        assert!(html.contains("20 Mar 2025, 10:15"));
    }

    #[test]
    fn test_chat_without_session_is_all_received() {
        let msgs = vec![message(1, person(1, "asha"), "hello")];
        let html = chat_messages(&msgs, None);
        assert!(html.contains("message received"));
        assert!(!html.contains("message sent"));
    }

    #[test]
    fn test_empty_states() {
        let now = Utc.with_ymd_and_hms(2025, 3, 20, 12, 0, 0).unwrap();
        assert!(chat_messages(&[], None).contains("No messages yet. Start a conversation!"));
        assert!(conversation_list(&[], None, now).contains("empty-state"));
    }

    #[test]
    fn test_conversation_list_marks_active_and_unread() {
        let now = Utc.with_ymd_and_hms(2025, 3, 20, 12, 0, 0).unwrap();
        let convs = vec![
            Conversation {
                partner: person(2, "vikram"),
                last_message: "x".repeat(50),
                last_at: Some("2025-03-20T11:00:00Z".into()),
                unread: 3,
            },
            Conversation {
                partner: person(3, "neha"),
                ..Default::default()
            },
        ];
        let html = conversation_list(&convs, Some(2), now);
        assert!(html.contains(r#"<div class="conversation-item active" data-partner-id="2">"#));
        assert!(html.contains(r#"<div class="conversation-item" data-partner-id="3">"#));
        assert!(html.contains(r#"<span class="unread-count">3</span>"#));
        assert!(html.contains(&format!("{}...", "x".repeat(40))));
        assert!(html.contains("1 hour ago"));
        assert_eq!(html, conversation_list(&convs, Some(2), now));
    }
}
