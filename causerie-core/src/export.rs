//! Plain-text transcript export
//!
//! Renders a transcript as a flat `role: content` dump for download. No
//! aggregation happens here; the caller re-reads the transcript and hands it
//! over.

use crate::types::{Message, Role};
use chrono::NaiveDateTime;

/// Render a transcript for download.
///
/// Layout matches the historical export: an id header, the export date
/// (`DD/MM/YYYY HH:MM:SS`), then one `[Utilisateur]`/`[Assistant]` block per
/// message.
pub fn render_transcript(
    conversation_id: &str,
    messages: &[Message],
    exported_at: NaiveDateTime,
) -> String {
    let mut out = String::new();
    out.push_str(&format!("Conversation ID: {}\n", conversation_id));
    out.push_str(&format!(
        "Date d'export: {}\n\n",
        exported_at.format("%d/%m/%Y %H:%M:%S")
    ));

    for message in messages {
        let label = match message.role {
            Role::User => "Utilisateur",
            _ => "Assistant",
        };
        out.push_str(&format!("[{}]\n{}\n\n", label, message.content));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn renders_header_and_role_blocks() {
        let exported_at = NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap();
        let messages = vec![Message::user("hi"), Message::assistant("hello")];

        let text = render_transcript("conv_abc", &messages, exported_at);
        assert_eq!(
            text,
            "Conversation ID: conv_abc\n\
             Date d'export: 15/03/2024 14:30:00\n\n\
             [Utilisateur]\nhi\n\n\
             [Assistant]\nhello\n\n"
        );
    }

    #[test]
    fn empty_transcript_renders_header_only() {
        let exported_at = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let text = render_transcript("conv_empty", &[], exported_at);
        assert!(text.starts_with("Conversation ID: conv_empty\n"));
        assert!(text.ends_with("\n\n"));
    }
}
