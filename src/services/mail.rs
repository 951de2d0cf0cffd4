use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::MailConfig;
use crate::errors::{AppError, Result};
use crate::models::flagship::Flagship;
use crate::models::registration::Registration;
use crate::models::user::Traveler;

/// Denormalized copy of a fresh registration for the admin notification
/// mail. Built from the persisted record with its references expanded, so
/// the mail reflects what was actually stored.
#[derive(Debug)]
pub struct RegistrationSnapshot {
    pub registration_id: String,
    pub trip_name: String,
    pub traveler_name: String,
    pub traveler_email: String,
    pub traveler_phone: String,
    pub traveler_city: String,
    pub joining_from_city: Option<String>,
    pub tier: Option<String>,
    pub bed_preference: Option<String>,
    pub room_sharing: Option<String>,
    pub group_members: Option<Vec<String>>,
    pub expectations: Option<String>,
    pub trip_type: Option<String>,
    pub price: f64,
}

impl RegistrationSnapshot {
    pub fn new(registration: &Registration, flagship: &Flagship, traveler: &Traveler) -> Self {
        let unknown = || "unknown".to_string();

        RegistrationSnapshot {
            registration_id: registration.id.map(|id| id.to_hex()).unwrap_or_default(),
            trip_name: flagship.trip_name.clone(),
            traveler_name: traveler.full_name.clone().unwrap_or_else(unknown),
            traveler_email: traveler.email.clone().unwrap_or_else(unknown),
            traveler_phone: traveler.phone.clone().unwrap_or_else(unknown),
            traveler_city: traveler.city.clone().unwrap_or_else(unknown),
            joining_from_city: registration.joining_from_city.clone(),
            tier: registration.tier.clone(),
            bed_preference: registration.bed_preference.clone(),
            room_sharing: registration.room_sharing.clone(),
            group_members: registration.group_members.clone(),
            expectations: registration.expectations.clone(),
            trip_type: registration.trip_type.clone(),
            price: registration.price,
        }
    }

    pub fn subject(&self) -> String {
        format!("New registration: {}", self.trip_name)
    }

    /// Plain-text body for the admin inbox.
    pub fn render(&self) -> String {
        let mut lines = vec![
            format!("Registration {}", self.registration_id),
            format!("Trip: {}", self.trip_name),
            format!("Price: {}", self.price),
            String::new(),
            format!("Traveler: {}", self.traveler_name),
            format!("Email: {}", self.traveler_email),
            format!("Phone: {}", self.traveler_phone),
            format!("City: {}", self.traveler_city),
        ];

        let mut preference = |label: &str, value: &Option<String>| {
            if let Some(value) = value {
                lines.push(format!("{}: {}", label, value));
            }
        };

        preference("Joining from", &self.joining_from_city);
        preference("Tier", &self.tier);
        preference("Bed preference", &self.bed_preference);
        preference("Room sharing", &self.room_sharing);
        preference("Trip type", &self.trip_type);
        preference("Expectations", &self.expectations);

        if let Some(members) = &self.group_members {
            if !members.is_empty() {
                lines.push(format!("Group: {}", members.join(", ")));
            }
        }

        lines.join("\n")
    }
}

/// SMTP notifier for administrative mails. Callers treat every send as
/// best-effort: failures are logged at the call site and never fail the
/// request that triggered them.
#[derive(Clone)]
pub struct MailService {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    admin: Mailbox,
}

impl MailService {
    pub fn new(config: MailConfig) -> Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| AppError::mail(format!("SMTP relay setup failed: {}", e)))?
            .port(config.smtp_port)
            .credentials(Credentials::new(config.smtp_username, config.smtp_password))
            .build();

        let from = config
            .from_address
            .parse()
            .map_err(|e| AppError::mail(format!("Invalid MAIL_FROM: {}", e)))?;
        let admin = config
            .admin_address
            .parse()
            .map_err(|e| AppError::mail(format!("Invalid ADMIN_EMAIL: {}", e)))?;

        Ok(Self { transport, from, admin })
    }

    /// Notifies the admin address that a registration was created.
    pub async fn registration_created(&self, snapshot: &RegistrationSnapshot) -> Result<()> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(self.admin.clone())
            .subject(snapshot.subject())
            .header(ContentType::TEXT_PLAIN)
            .body(snapshot.render())
            .map_err(|e| AppError::mail(format!("Failed to build mail: {}", e)))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| AppError::mail(format!("SMTP send failed: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mongodb::bson::oid::ObjectId;
    use crate::models::registration::RegistrationStatus;

    fn snapshot() -> RegistrationSnapshot {
        let registration = Registration {
            id: Some(ObjectId::new()),
            flagship_id: ObjectId::new(),
            user_id: ObjectId::new(),
            payment_id: None,
            is_paid: false,
            joining_from_city: Some("Karachi".to_string()),
            tier: Some("premium".to_string()),
            bed_preference: None,
            room_sharing: None,
            group_members: Some(vec!["Hira".to_string(), "Bilal".to_string()]),
            expectations: None,
            trip_type: None,
            price: 45000.0,
            amount_due: 45000.0,
            status: RegistrationStatus::Pending,
            comment: None,
            rating_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let flagship = Flagship {
            id: Some(ObjectId::new()),
            trip_name: "Hunza Flagship".to_string(),
            destination: Some("Hunza".to_string()),
            category: None,
            start_date: None,
            end_date: None,
            days: None,
            base_price: None,
            total_seats: None,
            images: vec![],
            detailed_plan: None,
            status: None,
            publish: None,
            created_at: None,
            updated_at: None,
        };
        let traveler = Traveler {
            id: Some(ObjectId::new()),
            full_name: Some("Amina Khan".to_string()),
            email: Some("amina@example.com".to_string()),
            phone: None,
            city: Some("Karachi".to_string()),
        };

        RegistrationSnapshot::new(&registration, &flagship, &traveler)
    }

    #[test]
    fn render_includes_trip_traveler_and_preferences() {
        let body = snapshot().render();

        assert!(body.contains("Trip: Hunza Flagship"));
        assert!(body.contains("Traveler: Amina Khan"));
        assert!(body.contains("Joining from: Karachi"));
        assert!(body.contains("Tier: premium"));
        assert!(body.contains("Group: Hira, Bilal"));
        // Unset preferences stay out of the mail.
        assert!(!body.contains("Bed preference"));
    }

    #[test]
    fn missing_contact_fields_fall_back_to_unknown() {
        let body = snapshot().render();
        assert!(body.contains("Phone: unknown"));
    }

    #[test]
    fn subject_names_the_trip() {
        assert_eq!(snapshot().subject(), "New registration: Hunza Flagship");
    }
}
