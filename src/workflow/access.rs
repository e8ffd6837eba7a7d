//! Rotating shared secrets for the volunteer and teacher areas.
//!
//! Each audience has its own append-only series of codes. The live code is the
//! row with the greatest sequence number, and that number is the code version
//! a session records on admission. Issuing a new code bumps the version, which
//! revokes every earlier admission for that audience without touching sessions.

use sea_orm::{ActiveModelTrait, ConnectionTrait, DbErr, EntityTrait, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::entities::{prelude::*, teacher_code, volunteer_code};
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Audience {
    Volunteer,
    Teacher,
}

impl Audience {
    pub fn label(self) -> &'static str {
        match self {
            Audience::Volunteer => "volunteer",
            Audience::Teacher => "teacher",
        }
    }

    pub fn home_path(self) -> &'static str {
        match self {
            Audience::Volunteer => "/volunteers",
            Audience::Teacher => "/teachers",
        }
    }

    pub fn entry_path(self) -> &'static str {
        match self {
            Audience::Volunteer => "/volunteers/enter-code",
            Audience::Teacher => "/teachers/enter-code",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessCode {
    pub version: i32,
    pub code: String,
}

/// The latest issued code for `audience`, if any code was ever issued.
pub async fn current<C: ConnectionTrait>(
    db: &C,
    audience: Audience,
) -> Result<Option<AccessCode>, DbErr> {
    let code = match audience {
        Audience::Volunteer => VolunteerCode::find()
            .order_by_desc(volunteer_code::Column::Id)
            .one(db)
            .await?
            .map(|row| AccessCode {
                version: row.id,
                code: row.code,
            }),
        Audience::Teacher => TeacherCode::find()
            .order_by_desc(teacher_code::Column::Id)
            .one(db)
            .await?
            .map(|row| AccessCode {
                version: row.id,
                code: row.code,
            }),
    };
    Ok(code)
}

pub async fn current_version<C: ConnectionTrait>(
    db: &C,
    audience: Audience,
) -> Result<Option<i32>, DbErr> {
    Ok(current(db, audience).await?.map(|code| code.version))
}

/// Appends a new code, making it the only one `verify` accepts.
pub async fn issue<C: ConnectionTrait>(
    db: &C,
    audience: Audience,
    code: &str,
) -> Result<AccessCode, AppError> {
    let code = code.trim();
    if code.is_empty() {
        return Err(AppError::Validation("Access code cannot be empty".into()));
    }

    let version = match audience {
        Audience::Volunteer => {
            volunteer_code::ActiveModel {
                code: Set(code.to_string()),
                ..Default::default()
            }
            .insert(db)
            .await?
            .id
        }
        Audience::Teacher => {
            teacher_code::ActiveModel {
                code: Set(code.to_string()),
                ..Default::default()
            }
            .insert(db)
            .await?
            .id
        }
    };

    info!(audience = audience.label(), version, "Issued new access code");
    Ok(AccessCode {
        version,
        code: code.to_string(),
    })
}

/// Checks `submitted` against the live code and returns its version.
/// Surrounding whitespace is ignored, as it is when a code is issued.
pub async fn verify<C: ConnectionTrait>(
    db: &C,
    audience: Audience,
    submitted: &str,
) -> Result<i32, AppError> {
    let submitted = submitted.trim();
    match current(db, audience).await? {
        Some(live) if live.code == submitted => Ok(live.version),
        Some(_) => {
            warn!(audience = audience.label(), "Rejected access code");
            Err(AppError::InvalidCode)
        }
        None => {
            warn!(audience = audience.label(), "No access code has been issued");
            Err(AppError::InvalidCode)
        }
    }
}

/// Which audience areas a session has been admitted to, and at which code
/// version. Lives in the session and is handed to the gate on every request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessContext {
    volunteer_code_version: Option<i32>,
    teacher_code_version: Option<i32>,
}

impl AccessContext {
    pub fn admit(&mut self, audience: Audience, version: i32) {
        match audience {
            Audience::Volunteer => self.volunteer_code_version = Some(version),
            Audience::Teacher => self.teacher_code_version = Some(version),
        }
    }

    pub fn admitted_version(&self, audience: Audience) -> Option<i32> {
        match audience {
            Audience::Volunteer => self.volunteer_code_version,
            Audience::Teacher => self.teacher_code_version,
        }
    }

    /// Admission only holds while the recorded version is still the live one.
    pub fn is_admitted(&self, audience: Audience, current_version: Option<i32>) -> bool {
        match (self.admitted_version(audience), current_version) {
            (Some(admitted), Some(current)) => admitted == current,
            _ => false,
        }
    }
}
