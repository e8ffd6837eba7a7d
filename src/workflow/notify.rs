//! Drop-off confirmation emails.
//!
//! Each claimed meal in the current month's drop-off window produces one
//! message to its teacher, copied to the volunteer. Messages go out one after
//! another; a failed send is recorded in the [`DispatchReport`] and the rest
//! of the batch still runs. Nothing guards against sending the batch twice.

use async_session::async_trait;
use chrono::NaiveDate;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
};
use minijinja::{Environment, context};
use sea_orm::ConnectionTrait;
use serde::Serialize;
use tracing::{info, warn};

use crate::entities::teacher;
use crate::error::AppError;
use crate::workflow::deadlines::{self, month_label};
use crate::workflow::ledger::{self, Booking};

pub const PROGRAM_NAME: &str = "Meals of Gratitude";

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Invalid email address: {0}")]
    Address(String),

    #[error(transparent)]
    Message(#[from] lettre::error::Error),

    #[error(transparent)]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// A fully composed message, independent of how it is delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub subject: String,
    pub from: String,
    pub to: String,
    pub cc: String,
    pub text: String,
    pub html: String,
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError>;
}

/// Delivers over an implicit-TLS connection to a single authenticated relay.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(host: &str, username: &str, password: &str) -> Result<Self, MailError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(host)?
            .credentials(Credentials::new(username.to_string(), password.to_string()))
            .build();
        Ok(Self { transport })
    }
}

fn mailbox(address: &str) -> Result<Mailbox, MailError> {
    address
        .parse()
        .map_err(|_| MailError::Address(address.to_string()))
}

impl TryFrom<&OutgoingEmail> for Message {
    type Error = MailError;

    fn try_from(email: &OutgoingEmail) -> Result<Self, Self::Error> {
        let message = Message::builder()
            .from(mailbox(&email.from)?)
            .to(mailbox(&email.to)?)
            .cc(mailbox(&email.cc)?)
            .subject(email.subject.clone())
            .multipart(MultiPart::alternative_plain_html(
                email.text.clone(),
                email.html.clone(),
            ))?;
        Ok(message)
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        let message = Message::try_from(email)?;
        self.transport.send(message).await?;
        Ok(())
    }
}

/// Sender identity and the message bodies.
pub struct Letterhead {
    sender: String,
    coordinator: String,
    templates: Environment<'static>,
}

impl Letterhead {
    pub fn new(sender: String, coordinator: String) -> Result<Self, minijinja::Error> {
        let mut templates = Environment::new();
        templates.add_template("dropoff.txt", include_str!("../../templates/emails/dropoff.txt"))?;
        templates.add_template(
            "dropoff.html",
            include_str!("../../templates/emails/dropoff.html"),
        )?;
        Ok(Self {
            sender,
            coordinator,
            templates,
        })
    }

    /// `Thursday, April 10`
    pub fn format_dropoff(date: NaiveDate) -> String {
        date.format("%A, %B %-d").to_string()
    }

    pub fn compose(
        &self,
        meal: &Booking,
        teacher: &teacher::Model,
        today: NaiveDate,
    ) -> Result<OutgoingEmail, minijinja::Error> {
        let ctx = context! {
            teacher_name => teacher.name,
            meal_name => meal.label,
            volunteer_name => meal.volunteer.name,
            dropoff_date => Self::format_dropoff(meal.date),
            coordinator => self.coordinator,
        };

        Ok(OutgoingEmail {
            subject: format!("{PROGRAM_NAME} {}", month_label(today)),
            from: self.sender.clone(),
            to: teacher.email.clone(),
            cc: meal.volunteer.email.clone(),
            text: self.templates.get_template("dropoff.txt")?.render(&ctx)?,
            html: self.templates.get_template("dropoff.html")?.render(&ctx)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Delivery {
    pub booking_id: i32,
    pub date: NaiveDate,
    pub teacher_email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedDelivery {
    pub booking_id: i32,
    pub teacher_email: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub month_year: String,
    pub sent: Vec<Delivery>,
    pub failed: Vec<FailedDelivery>,
}

/// Sends one confirmation per claimed meal in this month's drop-off window.
pub async fn send_dropoff_notifications<C: ConnectionTrait>(
    db: &C,
    mailer: &dyn MailTransport,
    letterhead: &Letterhead,
    today: NaiveDate,
) -> Result<DispatchReport, AppError> {
    let month_year = month_label(today);
    let window = deadlines::window_for(db, &month_year)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Deadline window for {month_year}")))?;
    let meals = ledger::claimed_meals(db, window.dropoff_start, window.dropoff_end).await?;

    let mut report = DispatchReport {
        month_year,
        ..Default::default()
    };
    for meal in &meals {
        let Some(teacher) = &meal.teacher else {
            continue;
        };
        let email = letterhead.compose(meal, teacher, today)?;
        match mailer.send(&email).await {
            Ok(()) => report.sent.push(Delivery {
                booking_id: meal.id,
                date: meal.date,
                teacher_email: teacher.email.clone(),
            }),
            Err(e) => {
                warn!(booking = meal.id, to = %teacher.email, "Failed to send drop-off email: {e}");
                report.failed.push(FailedDelivery {
                    booking_id: meal.id,
                    teacher_email: teacher.email.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    info!(
        month = %report.month_year,
        sent = report.sent.len(),
        failed = report.failed.len(),
        "Dispatched drop-off notifications"
    );
    Ok(report)
}
