//! Client receipt mail: composition and SMTP delivery.

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::{BusinessProfile, SmtpConfig};
use crate::data_url;
use crate::errors::AppError;
use crate::models::IntakePayload;

/// A receipt ready to be sent to a client.
#[derive(Debug, Clone)]
pub struct ReceiptMail {
    pub to: String,
    pub cc: Option<String>,
    pub subject: String,
    pub text: String,
    /// `(file name, PDF bytes)`
    pub attachment: Option<(String, Vec<u8>)>,
}

impl ReceiptMail {
    /// Build the receipt for an accepted order.
    ///
    /// The document is attached only when both the data URI and the file name
    /// are present and the data URI decodes.
    pub fn for_order(
        payload: &IntakePayload,
        business: &BusinessProfile,
        copy_to: Option<&str>,
    ) -> Self {
        let attachment = match (&payload.pdf_data_url, &payload.file_name) {
            (Some(url), Some(name)) if !name.trim().is_empty() => match data_url::decode(url) {
                Ok((_, bytes)) => Some((name.clone(), bytes)),
                Err(e) => {
                    tracing::warn!(
                        "Mailing {} without attachment: {}",
                        payload.order_number,
                        e
                    );
                    None
                }
            },
            _ => None,
        };

        Self {
            to: payload.client.email.trim().to_string(),
            cc: copy_to.map(str::to_string),
            subject: format!("Orden de Trabajo – {}", payload.order_number),
            text: receipt_text(&payload.client.name, business),
            attachment,
        }
    }

    /// Turn the receipt into a MIME message sent from `from`.
    pub fn compose(&self, from: &Mailbox) -> Result<Message, AppError> {
        let mut builder = Message::builder()
            .from(from.clone())
            .to(self.to.parse::<Mailbox>()?)
            .subject(self.subject.clone());
        if let Some(cc) = &self.cc {
            builder = builder.cc(cc.parse::<Mailbox>()?);
        }

        let body = SinglePart::plain(self.text.clone());
        let message = match &self.attachment {
            Some((file_name, bytes)) => {
                let content_type = ContentType::parse(data_url::PDF_MIME)
                    .map_err(|e| AppError::Mail(format!("Invalid attachment type: {}", e)))?;
                builder.multipart(
                    MultiPart::mixed()
                        .singlepart(body)
                        .singlepart(Attachment::new(file_name.clone()).body(bytes.clone(), content_type)),
                )?
            }
            None => builder.singlepart(body)?,
        };
        Ok(message)
    }
}

fn receipt_text(client_name: &str, business: &BusinessProfile) -> String {
    format!(
        "Hola {},\n\n\
         Adjuntamos la Orden de Trabajo correspondiente a tu equipo como comprobante de ingreso.\n\n\
         Nos comunicaremos cuando hayan novedades.\n\n\
         Saludos,\n\
         {}\n\
         {}\n\
         Tel: {} (WhatsApp)\n\
         {}\n\
         {}",
        client_name.trim(),
        business.signature,
        business.name,
        business.phone,
        business.website,
        business.email,
    )
}

/// Delivers receipts to clients.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: &ReceiptMail) -> Result<(), AppError>;
}

/// Authenticated SMTP delivery. Port 465 uses implicit TLS, anything else STARTTLS.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, AppError> {
        let builder = if config.port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
        };

        let transport = builder
            .port(config.port)
            .credentials(Credentials::new(
                config.user.clone(),
                config.password.clone(),
            ))
            .timeout(Some(Duration::from_secs(30)))
            .build();

        Ok(Self {
            transport,
            from: config.from.parse()?,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: &ReceiptMail) -> Result<(), AppError> {
        let message = mail.compose(&self.from)?;
        self.transport.send(message).await?;
        tracing::info!("Receipt mailed to {}", mail.to);
        Ok(())
    }
}
