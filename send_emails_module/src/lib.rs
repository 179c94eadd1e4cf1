use serde::Serialize;

const DEFAULT_API_BASE: &str = "https://api.postmarkapp.com";
const DEFAULT_MESSAGE_STREAM: &str = "outbound";

/// Parameters for one outbound message.
///
/// `from` falls back to the `MAIL_FROM` environment variable when unset.
#[derive(Debug, Clone, Default)]
pub struct SendMailParams {
    pub from: Option<String>,
    pub to: Vec<String>,
    pub subject: String,
    pub text_body: Option<String>,
    pub html_body: Option<String>,
    pub tag: Option<String>,
    pub message_stream: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum SendMailError {
    #[error("missing POSTMARK_TOKEN")]
    MissingToken,
    #[error("missing MAIL_FROM and no from address given")]
    MissingFrom,
    #[error("no recipients")]
    MissingRecipients,
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("postmark rejected message ({status}): {body}")]
    Rejected { status: u16, body: String },
}

#[derive(Serialize)]
struct PostmarkMessage<'a> {
    #[serde(rename = "From")]
    from: &'a str,
    #[serde(rename = "To")]
    to: String,
    #[serde(rename = "Subject")]
    subject: &'a str,
    #[serde(rename = "TextBody", skip_serializing_if = "Option::is_none")]
    text_body: Option<&'a str>,
    #[serde(rename = "HtmlBody", skip_serializing_if = "Option::is_none")]
    html_body: Option<&'a str>,
    #[serde(rename = "MessageStream")]
    message_stream: &'a str,
    #[serde(rename = "Tag", skip_serializing_if = "Option::is_none")]
    tag: Option<&'a str>,
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Send one message through the Postmark HTTP API.
///
/// Blocking; callers on an async runtime should wrap this in
/// `spawn_blocking`. `POSTMARK_API_BASE` overrides the endpoint so tests
/// can point at a local mock server.
pub fn send_mail(params: &SendMailParams) -> Result<(), SendMailError> {
    dotenvy::dotenv().ok();

    let token = env_value("POSTMARK_TOKEN").ok_or(SendMailError::MissingToken)?;
    let from = params
        .from
        .clone()
        .or_else(|| env_value("MAIL_FROM"))
        .ok_or(SendMailError::MissingFrom)?;
    if params.to.is_empty() {
        return Err(SendMailError::MissingRecipients);
    }

    let api_base = env_value("POSTMARK_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string());
    let message_stream = params
        .message_stream
        .clone()
        .or_else(|| env_value("POSTMARK_MESSAGE_STREAM"))
        .unwrap_or_else(|| DEFAULT_MESSAGE_STREAM.to_string());
    let message = PostmarkMessage {
        from: &from,
        to: params.to.join(","),
        subject: &params.subject,
        text_body: params.text_body.as_deref(),
        html_body: params.html_body.as_deref(),
        message_stream: &message_stream,
        tag: params.tag.as_deref(),
    };

    let client = reqwest::blocking::Client::new();
    let response = client
        .post(format!("{}/email", api_base))
        .header("X-Postmark-Server-Token", token)
        .header("Accept", "application/json")
        .json(&message)
        .send()?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(SendMailError::Rejected {
            status: status.as_u16(),
            body,
        });
    }
    Ok(())
}
