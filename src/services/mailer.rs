use reqwest::Client;
use serde_json::{json, Value};

use crate::domain::DomainError;
use crate::repository::bookings::BookingRow;

/// Outbound email via the Resend HTTP API. The client carries a
/// bounded timeout, so a slow provider can never stall a caller
/// indefinitely. Every failure maps to `DomainError::Dispatch`, which
/// callers treat as non-fatal.
#[derive(Clone)]
pub struct Mailer {
    client: Client,
    api_key: Option<String>,
    from_address: String,
}

impl Mailer {
    pub fn new(client: Client, api_key: Option<String>, from_address: String) -> Self {
        Self {
            client,
            api_key,
            from_address,
        }
    }

    pub async fn send(&self, to: &str, subject: &str, body_html: &str) -> Result<(), DomainError> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| DomainError::Dispatch("RESEND_API_KEY not configured".to_string()))?;

        let payload = json!({
            "from": self.from_address,
            "to": [to],
            "subject": subject,
            "html": format!(
                "<div style=\"font-family: sans-serif; max-width: 600px; margin: 0 auto;\">{body_html}</div>"
            ),
        });

        let response = self
            .client
            .post("https://api.resend.com/emails")
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                tracing::error!(error = %error, "Resend API request failed");
                DomainError::Dispatch("Resend API request failed.".to_string())
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let resp_body: Value = response
            .json()
            .await
            .unwrap_or(json!({"error": "failed to parse response"}));
        let error_msg = resp_body
            .as_object()
            .and_then(|obj| obj.get("message"))
            .and_then(Value::as_str)
            .unwrap_or("Unknown Resend API error");
        Err(DomainError::Dispatch(format!(
            "Resend API error ({status}): {error_msg}"
        )))
    }
}

pub fn confirmation_email(booking: &BookingRow) -> (String, String) {
    let subject = format!("Booking {} confirmed", booking.reference);
    let body = format!(
        "<p>Hola {},</p>\
         <p>Your stay is confirmed.</p>\
         <p><strong>Reference:</strong> {}<br>\
         <strong>Check-in:</strong> {}<br>\
         <strong>Check-out:</strong> {}<br>\
         <strong>Guests:</strong> {}<br>\
         <strong>Total:</strong> {}</p>\
         <p>We look forward to hosting you.</p>",
        booking.guest_name,
        booking.reference,
        booking.check_in,
        booking.check_out,
        booking.num_guests,
        format_cents(booking.total_cents),
    );
    (subject, body)
}

pub fn reminder_email(booking: &BookingRow, days_until: i64) -> (String, String) {
    let when = match days_until {
        0 => "today".to_string(),
        1 => "tomorrow".to_string(),
        other => format!("in {other} days"),
    };
    let subject = format!("Your stay {} begins {when}", booking.reference);
    let body = format!(
        "<p>Hola {},</p>\
         <p>A reminder that your stay begins {when}.</p>\
         <p><strong>Reference:</strong> {}<br>\
         <strong>Check-in:</strong> {}<br>\
         <strong>Check-out:</strong> {}</p>\
         <p>Safe travels!</p>",
        booking.guest_name, booking.reference, booking.check_in, booking.check_out,
    );
    (subject, body)
}

fn format_cents(cents: i64) -> String {
    format!("€{}.{:02}", cents / 100, (cents % 100).abs())
}

#[cfg(test)]
mod tests {
    use super::format_cents;

    #[test]
    fn formats_minor_units() {
        assert_eq!(format_cents(121_200), "€1212.00");
        assert_eq!(format_cents(805), "€8.05");
        assert_eq!(format_cents(0), "€0.00");
    }
}
