use crate::error::ReportError;
use crate::report::settings::{MailServerSettings, MailSettings};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{Message, SmtpTransport, Transport};

/// Envelope and body for one report email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub from: String,
    pub to: Vec<String>,
    pub bcc: String,
    pub subject: String,
    pub text: String,
}

impl OutgoingMail {
    pub fn to_header(&self) -> String {
        self.to.join(", ")
    }
}

pub trait MailTransport {
    fn deliver(&self, mail: &OutgoingMail) -> Result<()>;
}

pub fn default_recipients(mail: &MailSettings) -> Vec<String> {
    mail.default_recipients
        .all()
        .into_iter()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

pub fn subject_line(subject_name: &str, today: NaiveDate) -> String {
    format!("{subject_name}: {}: Daily report", today.format("%d.%m.%Y"))
}

pub fn compose(mail: &MailSettings, today: NaiveDate, body: &str) -> OutgoingMail {
    let username = mail.mail_server.username.clone();
    OutgoingMail {
        from: username.clone(),
        to: default_recipients(mail),
        bcc: username,
        subject: subject_line(&mail.subject_name, today),
        text: body.to_string(),
    }
}

fn mailbox(field: &str, address: &str) -> Result<Mailbox> {
    address
        .parse::<Mailbox>()
        .with_context(|| format!("invalid {field} address `{address}`"))
}

fn build_message(mail: &OutgoingMail) -> Result<Message> {
    if mail.to.is_empty() {
        return Err(ReportError::NoRecipients.into());
    }

    let mut builder = Message::builder()
        .from(mailbox("from", &mail.from)?)
        .bcc(mailbox("bcc", &mail.bcc)?)
        .subject(mail.subject.clone())
        .header(ContentType::TEXT_PLAIN);
    for recipient in &mail.to {
        builder = builder.to(mailbox("to", recipient)?);
    }
    builder
        .body(mail.text.clone())
        .context("failed to build report email")
}

/// STARTTLS is always required and implicit TLS is never used, whatever
/// `unsafe.secure` / `unsafe.requireTLS` say; only `rejectUnauthorized` is
/// honoured.
fn tls_mode(server: &MailServerSettings) -> Result<Tls> {
    let params = TlsParameters::builder(server.unsafe_.host.clone())
        .dangerous_accept_invalid_certs(!server.unsafe_.reject_unauthorized)
        .build()
        .context("failed to configure TLS")?;
    Ok(Tls::Required(params))
}

pub struct SmtpMailer {
    transport: SmtpTransport,
}

impl SmtpMailer {
    pub fn from_settings(server: &MailServerSettings) -> Result<Self> {
        let host = server.unsafe_.host.trim();
        if host.is_empty() {
            anyhow::bail!("SMTP host is not set (Mail.mailServer.unsafe.host)");
        }
        let transport = SmtpTransport::builder_dangerous(host)
            .port(server.unsafe_.port)
            .tls(tls_mode(server)?)
            .credentials(Credentials::new(
                server.username.clone(),
                server.password.clone(),
            ))
            .build();
        Ok(Self { transport })
    }
}

impl MailTransport for SmtpMailer {
    fn deliver(&self, mail: &OutgoingMail) -> Result<()> {
        let message = build_message(mail)?;
        self.transport
            .send(&message)
            .with_context(|| format!("SMTP delivery to {} failed", mail.to_header()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::settings::Settings;

    fn mail_settings() -> MailSettings {
        let mut settings = Settings::default();
        settings.mail.subject_name = "Alice".to_string();
        settings.mail.mail_server.username = "alice@example.com".to_string();
        settings.mail.mail_server.unsafe_.host = "smtp.example.com".to_string();
        settings.mail
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 4).expect("date")
    }

    #[test]
    fn subject_uses_day_month_year() {
        assert_eq!(subject_line("Alice", day()), "Alice: 04.03.2026: Daily report");
    }

    #[test]
    fn blank_recipient_groups_are_dropped() {
        let mut mail = mail_settings();
        mail.default_recipients.manager = "boss@example.com".to_string();
        mail.default_recipients.team = "   ".to_string();

        let out = compose(&mail, day(), "body");
        assert_eq!(out.to, vec!["boss@example.com".to_string()]);
        assert_eq!(out.to_header(), "boss@example.com");
    }

    #[test]
    fn recipients_keep_group_order() {
        let mut mail = mail_settings();
        mail.default_recipients.teamleaders = "lead@example.com".to_string();
        mail.default_recipients.tracker = "track@example.com".to_string();
        mail.default_recipients.team = "team@example.com".to_string();

        assert_eq!(
            compose(&mail, day(), "").to_header(),
            "lead@example.com, track@example.com, team@example.com"
        );
    }

    #[test]
    fn compose_fills_envelope_from_username() {
        let mail = mail_settings();
        let body = "---\nsent: false\n---\n# Done\n\n* thing\n";
        let out = compose(&mail, day(), body);

        assert_eq!(out.from, "alice@example.com");
        assert_eq!(out.bcc, "alice@example.com");
        assert_eq!(out.subject, "Alice: 04.03.2026: Daily report");
        assert_eq!(out.text, body);
    }

    #[test]
    fn message_requires_a_recipient() {
        let out = compose(&mail_settings(), day(), "body");
        let err = build_message(&out).expect_err("no recipients");
        assert!(matches!(
            err.downcast_ref::<ReportError>(),
            Some(ReportError::NoRecipients)
        ));
    }

    #[test]
    fn message_carries_all_envelope_fields() {
        let mut mail = mail_settings();
        mail.default_recipients.manager = "boss@example.com".to_string();
        let out = compose(&mail, day(), "hello");

        let message = build_message(&out).expect("message");
        let envelope = message.envelope();
        let targets = envelope
            .to()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>();
        assert!(targets.contains(&"boss@example.com".to_string()));
        assert!(targets.contains(&"alice@example.com".to_string()));
        let raw = String::from_utf8(message.formatted()).expect("utf8");
        assert!(raw.contains("Subject: Alice: 04.03.2026: Daily report"));
        assert!(raw.contains("hello"));
    }

    #[test]
    fn invalid_address_is_reported() {
        let mut mail = mail_settings();
        mail.default_recipients.manager = "not an address".to_string();
        let out = compose(&mail, day(), "hello");
        let err = build_message(&out).expect_err("bad address");
        assert!(format!("{err:#}").contains("invalid to address"));
    }

    #[test]
    fn missing_host_is_a_configuration_error() {
        let mut mail = mail_settings();
        mail.mail_server.unsafe_.host = String::new();
        assert!(SmtpMailer::from_settings(&mail.mail_server).is_err());
    }
}
