/// One composed notification ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("mail delivery failed: {0}")]
    Delivery(String),
}

/// Delivery seam for the workflow's notifications. The engine only cares
/// about success or failure; transport detail stays behind this trait.
pub trait Notifier: Send + Sync {
    fn send(&self, mail: &OutboundEmail) -> Result<(), NotifyError>;
}

/// Default transport: the Postmark sender in `send_emails_module`.
#[derive(Debug, Default, Clone)]
pub struct PostmarkNotifier;

impl Notifier for PostmarkNotifier {
    fn send(&self, mail: &OutboundEmail) -> Result<(), NotifyError> {
        let params = send_emails_module::SendMailParams {
            from: None,
            to: vec![mail.to.clone()],
            subject: mail.subject.clone(),
            text_body: Some(mail.text.clone()),
            html_body: Some(mail.html.clone()),
            tag: Some("maintenance".to_string()),
            message_stream: None,
        };
        send_emails_module::send_mail(&params)
            .map_err(|err| NotifyError::Delivery(err.to_string()))
    }
}
