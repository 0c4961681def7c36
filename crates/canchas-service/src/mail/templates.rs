//! Booking notification templates.

use super::Email;

/// What a booking notification talks about.
#[derive(Debug, Clone)]
pub struct BookingDetails<'a> {
    /// Field display name.
    pub field_name: &'a str,
    /// Booked date as shown to people (`YYYY-MM-DD`).
    pub date: &'a str,
    /// Booked hour as shown to people (`HH:00`).
    pub hour: &'a str,
    /// Customer address.
    pub customer_email: &'a str,
}

/// Confirmation sent to the customer.
#[must_use]
pub fn customer_confirmation(details: &BookingDetails<'_>) -> Email {
    Email {
        to: details.customer_email.to_string(),
        subject: format!("Reserva confirmada - {}", details.field_name),
        html: format!(
            "<h2>¡Tu reserva está confirmada!</h2>\
             <p><strong>Cancha:</strong> {}</p>\
             <p><strong>Fecha:</strong> {}</p>\
             <p><strong>Hora:</strong> {}</p>\
             <p>Te esperamos.</p>",
            escape_html(details.field_name),
            escape_html(details.date),
            escape_html(details.hour),
        ),
    }
}

/// Notice sent to the platform administrator.
#[must_use]
pub fn admin_notice(admin_email: &str, details: &BookingDetails<'_>) -> Email {
    Email {
        to: admin_email.to_string(),
        subject: format!("Nueva reserva - {}", details.field_name),
        html: notice_body(details),
    }
}

/// Notice sent to the field owner.
#[must_use]
pub fn owner_notice(owner_email: &str, details: &BookingDetails<'_>) -> Email {
    Email {
        to: owner_email.to_string(),
        subject: format!("Tu cancha {} fue reservada", details.field_name),
        html: notice_body(details),
    }
}

fn notice_body(details: &BookingDetails<'_>) -> String {
    format!(
        "<h2>Nueva reserva</h2>\
         <p><strong>Cancha:</strong> {}</p>\
         <p><strong>Fecha:</strong> {}</p>\
         <p><strong>Hora:</strong> {}</p>\
         <p><strong>Cliente:</strong> {}</p>",
        escape_html(details.field_name),
        escape_html(details.date),
        escape_html(details.hour),
        escape_html(details.customer_email),
    )
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details() -> BookingDetails<'static> {
        BookingDetails {
            field_name: "Cancha <Norte>",
            date: "2026-10-20",
            hour: "19:00",
            customer_email: "ana@example.com",
        }
    }

    #[test]
    fn customer_confirmation_goes_to_customer() {
        let email = customer_confirmation(&details());
        assert_eq!(email.to, "ana@example.com");
        assert!(email.subject.contains("Cancha <Norte>"));
        assert!(email.html.contains("Cancha &lt;Norte&gt;"));
        assert!(email.html.contains("19:00"));
    }

    #[test]
    fn notices_include_customer() {
        let admin = admin_notice("admin@canchas.app", &details());
        let owner = owner_notice("duenio@example.com", &details());
        assert_eq!(admin.to, "admin@canchas.app");
        assert_eq!(owner.to, "duenio@example.com");
        assert!(admin.html.contains("ana@example.com"));
        assert!(owner.html.contains("ana@example.com"));
    }
}
