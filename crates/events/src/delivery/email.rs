//! Breach notification email rendering and SMTP delivery.
//!
//! [`EmailDelivery`] wraps the `lettre` async SMTP transport. The message
//! content is built from a [`BreachEmail`], which carries the station, node,
//! breach level and reading so recipients can act without opening the
//! dashboard. Configuration is loaded from environment variables; if
//! `SMTP_HOST` is not set, [`EmailConfig::from_env`] returns `None` and no
//! mailer should be constructed.

use chrono::{DateTime, Utc};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for email delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),
}

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default sender address when `SMTP_FROM` is not set.
const DEFAULT_FROM_ADDRESS: &str = "noreply@broms.local";

/// Configuration for the SMTP email delivery service.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// SMTP server hostname.
    pub smtp_host: String,
    /// SMTP server port (defaults to 587).
    pub smtp_port: u16,
    /// RFC 5322 "From" address.
    pub from_address: String,
    /// Optional SMTP username.
    pub smtp_user: Option<String>,
    /// Optional SMTP password.
    pub smtp_password: Option<String>,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `SMTP_HOST` is not set, signalling that email
    /// delivery is not configured and should be skipped.
    ///
    /// | Variable        | Required | Default               |
    /// |-----------------|----------|-----------------------|
    /// | `SMTP_HOST`     | yes      | —                     |
    /// | `SMTP_PORT`     | no       | `587`                 |
    /// | `SMTP_FROM`     | no       | `noreply@broms.local` |
    /// | `SMTP_USER`     | no       | —                     |
    /// | `SMTP_PASSWORD` | no       | —                     |
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok()?;
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
        })
    }
}

// ---------------------------------------------------------------------------
// BreachEmail
// ---------------------------------------------------------------------------

/// Content of a threshold breach notification.
#[derive(Debug)]
pub struct BreachEmail<'a> {
    /// Station display name.
    pub station: &'a str,
    /// Node display name.
    pub node: &'a str,
    /// Breach level (`Warning` or `Critical`).
    pub level: &'a str,
    /// The reading that tripped the threshold.
    pub value: &'a str,
    /// The threshold that was crossed, when known.
    pub threshold: Option<f64>,
    /// When the reading was taken (UTC).
    pub observed_at: DateTime<Utc>,
}

impl BreachEmail<'_> {
    fn subject(&self) -> String {
        format!(
            "[BROMS] {} breach: {} at {}",
            self.level, self.node, self.station
        )
    }

    fn body(&self) -> String {
        let threshold = match self.threshold {
            Some(t) => t.to_string(),
            None => "n/a".to_string(),
        };
        format!(
            "A {} threshold breach was detected.\n\
             \n\
             Station:   {}\n\
             Node:      {}\n\
             Reading:   {}\n\
             Threshold: {}\n\
             Observed:  {}\n\
             \n\
             Acknowledge the breach in the BROMS dashboard once handled.",
            self.level,
            self.station,
            self.node,
            self.value,
            threshold,
            self.observed_at.format("%Y-%m-%d %H:%M:%S UTC"),
        )
    }
}

// ---------------------------------------------------------------------------
// EmailDelivery
// ---------------------------------------------------------------------------

/// Sends breach notification emails via SMTP.
pub struct EmailDelivery {
    config: EmailConfig,
}

impl EmailDelivery {
    /// Create a new email delivery service with the given configuration.
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Send a breach notification to the specified address.
    pub async fn deliver_breach(
        &self,
        to_email: &str,
        breach: &BreachEmail<'_>,
    ) -> Result<(), EmailError> {
        use lettre::{
            message::header::ContentType, transport::smtp::authentication::Credentials,
            AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
        };

        let email = Message::builder()
            .from(self.config.from_address.parse()?)
            .to(to_email.parse()?)
            .subject(breach.subject())
            .header(ContentType::TEXT_PLAIN)
            .body(breach.body())
            .map_err(|e| EmailError::Build(e.to_string()))?;

        let mut transport_builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)?
                .port(self.config.smtp_port);

        if let (Some(user), Some(pass)) = (&self.config.smtp_user, &self.config.smtp_password) {
            transport_builder =
                transport_builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        let mailer = transport_builder.build();
        mailer.send(email).await?;

        tracing::info!(
            to = to_email,
            station = breach.station,
            node = breach.node,
            level = breach.level,
            "Breach notification email sent"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_breach() -> BreachEmail<'static> {
        BreachEmail {
            station: "Borehole 7",
            node: "Water level",
            level: "Critical",
            value: "98.4",
            threshold: Some(95.0),
            observed_at: Utc.with_ymd_and_hms(2026, 8, 23, 14, 30, 0).unwrap(),
        }
    }

    #[test]
    fn subject_names_level_node_and_station() {
        let breach = sample_breach();
        assert_eq!(
            breach.subject(),
            "[BROMS] Critical breach: Water level at Borehole 7"
        );
    }

    #[test]
    fn body_carries_reading_threshold_and_time() {
        let body = sample_breach().body();
        assert!(body.contains("Station:   Borehole 7"));
        assert!(body.contains("Reading:   98.4"));
        assert!(body.contains("Threshold: 95"));
        assert!(body.contains("2026-08-23 14:30:00 UTC"));
    }

    #[test]
    fn body_handles_missing_threshold() {
        let breach = BreachEmail {
            threshold: None,
            ..sample_breach()
        };
        assert!(breach.body().contains("Threshold: n/a"));
    }

    #[test]
    fn from_env_returns_none_without_smtp_host() {
        // Ensure SMTP_HOST is not set in the test environment.
        std::env::remove_var("SMTP_HOST");
        assert!(EmailConfig::from_env().is_none());
    }

    #[test]
    fn email_error_display_build() {
        let err = EmailError::Build("missing body".to_string());
        assert_eq!(err.to_string(), "Email build error: missing body");
    }
}
