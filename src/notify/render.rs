use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use super::types::{Notification, Severity};

/// Format one notification as a console line.
pub fn format_line(notification: &Notification) -> String {
    let tag = match notification.severity {
        Severity::Info => "INFO",
        Severity::Success => " OK ",
        Severity::Error => "FAIL",
    };
    format!(
        "[{tag}] {} ({:.1}s)\n",
        notification.message,
        notification.duration.as_secs_f32()
    )
}

/// Render notifications to `out` until every dispatcher is dropped.
///
/// Each notification is written as soon as it arrives; several may be on
/// screen at once.
pub async fn render_notifications<W>(
    mut rx: mpsc::UnboundedReceiver<Notification>,
    mut out: W,
) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(notification) = rx.recv().await {
        out.write_all(format_line(&notification).as_bytes()).await?;
        out.flush().await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::dispatcher::{ChannelDispatcher, NotificationDispatcher};
    use std::time::Duration;

    #[test]
    fn format_line_tags_severity() {
        let line = format_line(&Notification::processing_failed());
        assert_eq!(line, "[FAIL] Error processing image (5.0s)\n");

        let line = format_line(&Notification::new(
            Severity::Success,
            "Alert (Confidence: 95.0%)",
            Duration::from_millis(3000),
        ));
        assert_eq!(line, "[ OK ] Alert (Confidence: 95.0%) (3.0s)\n");
    }

    #[tokio::test]
    async fn render_writes_every_notification() {
        let (dispatcher, rx) = ChannelDispatcher::new();
        dispatcher.notify(Notification::new(Severity::Info, "one", Duration::ZERO));
        dispatcher.notify(Notification::new(Severity::Info, "two", Duration::ZERO));
        drop(dispatcher);

        let mut out = Vec::new();
        render_notifications(rx, &mut out).await.unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("one"));
        assert!(text.contains("two"));
    }
}
