//! Email alert formatting and SMTP delivery.

use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use log::info;

use crate::config::MailSettings;
use crate::error_handling::NotifyError;
use crate::models::AlertKind;

/// Subject line for an alert notification.
pub fn subject_for(kind: &AlertKind) -> String {
    match kind {
        AlertKind::ApiDown { url, .. } => format!("[uptime_sentinel] DOWN: {url}"),
        AlertKind::CertificateExpiring { url, state, .. } => {
            if matches!(state, crate::models::CertificateState::Expired) {
                format!("[uptime_sentinel] CERTIFICATE EXPIRED: {url}")
            } else {
                format!("[uptime_sentinel] Certificate expiring soon: {url}")
            }
        }
    }
}

/// Plain-text body for an alert notification.
pub fn text_body(kind: &AlertKind) -> String {
    format!(
        "{}\n\nThis notification was generated automatically by uptime_sentinel.\n",
        kind.describe()
    )
}

/// HTML body for an alert notification.
pub fn html_body(kind: &AlertKind) -> String {
    format!(
        "<html><body><p><strong>{}</strong></p>\
         <p style=\"color:#888\">This notification was generated automatically \
         by uptime_sentinel.</p></body></html>",
        kind.describe()
    )
}

/// Builds the multipart (plain + HTML) alert message.
pub fn build_message(
    from: &str,
    recipient: &str,
    kind: &AlertKind,
) -> Result<Message, NotifyError> {
    let from: Mailbox = from.parse()?;
    let to: Mailbox = recipient.parse()?;
    let message = Message::builder()
        .from(from)
        .to(to)
        .subject(subject_for(kind))
        .multipart(MultiPart::alternative_plain_html(
            text_body(kind),
            html_body(kind),
        ))?;
    Ok(message)
}

/// Sends one alert email through the configured SMTP transport.
///
/// An unconfigured transport (no `SMTP_HOST`/`SMTP_FROM`) is a warning and
/// a no-op, not an error: alerting is optional per deployment.
pub async fn send_email(
    settings: &MailSettings,
    recipient: &str,
    kind: &AlertKind,
) -> Result<(), NotifyError> {
    let (Some(host), Some(from)) = (settings.host.as_deref(), settings.from.as_deref()) else {
        log::warn!(
            "SMTP transport not configured (SMTP_HOST/SMTP_FROM); skipping email alert to {recipient}"
        );
        return Ok(());
    };

    let message = build_message(from, recipient, kind)?;

    let mut builder =
        AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?.port(settings.port);
    if let (Some(username), Some(password)) = (&settings.username, &settings.password) {
        builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
    }
    let mailer = builder.build();

    mailer.send(message).await?;
    info!("Alert email sent to {recipient}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CertificateState;

    fn down_kind() -> AlertKind {
        AlertKind::ApiDown {
            url: "https://service.example/health".to_string(),
            error: "connection failed".to_string(),
        }
    }

    #[test]
    fn test_subject_mentions_url_and_severity() {
        let subject = subject_for(&down_kind());
        assert!(subject.contains("DOWN"));
        assert!(subject.contains("https://service.example/health"));

        let expired = AlertKind::CertificateExpiring {
            url: "https://example.com".to_string(),
            state: CertificateState::Expired,
            not_after_ms: None,
            days_remaining: Some(-1),
        };
        assert!(subject_for(&expired).contains("EXPIRED"));
    }

    #[test]
    fn test_bodies_carry_description() {
        let kind = down_kind();
        assert!(text_body(&kind).contains("connection failed"));
        assert!(html_body(&kind).contains("connection failed"));
        assert!(html_body(&kind).starts_with("<html>"));
    }

    #[test]
    fn test_build_message_with_valid_addresses() {
        let message = build_message("sentinel@example.com", "ops@example.com", &down_kind());
        assert!(message.is_ok());
    }

    #[tokio::test]
    async fn test_send_email_without_transport_is_noop() {
        let settings = MailSettings::default();
        let result = send_email(&settings, "ops@example.com", &down_kind()).await;
        assert!(result.is_ok());
    }

    #[test]
    fn test_build_message_rejects_bad_recipient() {
        let result = build_message("sentinel@example.com", "not-an-address", &down_kind());
        assert!(matches!(result, Err(NotifyError::AddressError(_))));
    }
}
