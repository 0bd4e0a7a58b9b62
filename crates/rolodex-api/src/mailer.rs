//! Outbound mail: the fire-and-forget dispatcher and a logging [`Mailer`].

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use rolodex_core::outbound::{MailMessage, Mailer, OutboundError};
use tokio::task::JoinHandle;

/// Send `message` on a background task. A failure is logged and dropped;
/// it never reaches the request that triggered it.
pub fn dispatch(mailer: Arc<dyn Mailer>, message: MailMessage) -> JoinHandle<()> {
  tokio::spawn(async move {
    let template  = message.template.name();
    let recipient = message.recipient.clone();
    match mailer.send(message).await {
      Ok(()) => tracing::debug!(template, %recipient, "mail sent"),
      Err(e) => tracing::warn!(template, %recipient, error = %e, "mail delivery failed"),
    }
  })
}

/// A [`Mailer`] that writes messages to the log instead of delivering them.
///
/// Action tokens are redacted at INFO; the full variables, link included, are
/// only logged at DEBUG.
pub struct LogMailer;

/// `variables` with any `token` value masked.
fn redacted(variables: &BTreeMap<String, String>) -> BTreeMap<&str, &str> {
  variables
    .iter()
    .map(|(k, v)| match k.as_str() {
      "token" => (k.as_str(), "[redacted]"),
      _ => (k.as_str(), v.as_str()),
    })
    .collect()
}

#[async_trait]
impl Mailer for LogMailer {
  async fn send(&self, message: MailMessage) -> Result<(), OutboundError> {
    tracing::info!(
      subject   = message.template.subject(),
      recipient = %message.recipient,
      template  = message.template.name(),
      variables = ?redacted(&message.variables),
      "outbound mail",
    );
    tracing::debug!(variables = ?message.variables, "outbound mail variables");
    Ok(())
  }
}
