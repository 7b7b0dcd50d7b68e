//! Terminal rendering of controller events

use mail::{MessageBody, MessageSummary, SessionEvent, SharedSnapshot, Snapshot};

/// Print an event; returns `false` when it reports a failure
pub fn event(event: &SessionEvent, snapshot: &SharedSnapshot) -> bool {
    match event {
        SessionEvent::SnapshotReplaced { .. } => {
            print!("{}", inbox(&snapshot.read()));
        }
        SessionEvent::MessageOpened { summary, body } => {
            println!("{}", message(summary, body));
        }
        other => {
            if let Some(message) = other.user_message() {
                if is_failure(other) {
                    eprintln!("{message}");
                } else {
                    println!("{message}");
                }
            }
        }
    }
    !is_failure(event)
}

fn is_failure(event: &SessionEvent) -> bool {
    matches!(
        event,
        SessionEvent::Fatal { .. }
            | SessionEvent::AuthFailed { .. }
            | SessionEvent::OperationFailed { .. }
            | SessionEvent::SendRejected { .. }
            | SessionEvent::ComposeFailed { .. }
            | SessionEvent::Disabled { .. }
    )
}

/// One line per message: date, sender, subject, id
fn inbox(snapshot: &Snapshot) -> String {
    let width = snapshot
        .summaries
        .iter()
        .map(|s| s.sender.chars().count())
        .max()
        .unwrap_or(0)
        .min(40);

    snapshot
        .summaries
        .iter()
        .map(|s| {
            let sender: String = s.sender.chars().take(width).collect();
            format!("{:<16}  {:<width$}  {}  [{}]\n", s.date, sender, s.subject, s.id)
        })
        .collect()
}

fn message(summary: &MessageSummary, body: &MessageBody) -> String {
    format!(
        "From:    {}\nSubject: {}\nDate:    {}\n\n{}",
        summary.sender,
        summary.subject,
        summary.date,
        body.as_display()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use mail::{MessageId, MessageSummary};

    #[test]
    fn test_inbox_rows() {
        let snapshot = Snapshot {
            summaries: vec![
                MessageSummary {
                    id: MessageId::new("m1"),
                    sender: "alice@example.com".into(),
                    subject: "Hello".into(),
                    date: "2024-10-15 14:05".into(),
                },
                MessageSummary {
                    id: MessageId::new("m2"),
                    sender: "No Sender".into(),
                    subject: "No Subject".into(),
                    date: "Invalid Date".into(),
                },
            ],
            synced_at: None,
        };
        let rows = inbox(&snapshot);
        let lines: Vec<&str> = rows.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("2024-10-15 14:05  alice@example.com"));
        assert!(lines[0].ends_with("Hello  [m1]"));
        assert!(lines[1].starts_with("Invalid Date    "));
    }

    #[test]
    fn test_message_has_header_block() {
        let summary = MessageSummary {
            id: MessageId::new("m1"),
            sender: "Alice <alice@example.com>".into(),
            subject: "Hello".into(),
            date: "2024-10-15 14:05".into(),
        };
        let text = message(&summary, &MessageBody::Text("Hi Bob".into()));
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines,
            [
                "From:    Alice <alice@example.com>",
                "Subject: Hello",
                "Date:    2024-10-15 14:05",
                "",
                "Hi Bob",
            ]
        );
    }

    #[test]
    fn test_failures_detected() {
        assert!(is_failure(&SessionEvent::ComposeFailed { reason: "x".into() }));
        assert!(!is_failure(&SessionEvent::NoMessages));
    }
}
