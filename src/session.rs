use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::AdminCredentials;
use crate::error::AuthError;
use crate::roster::Roster;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Student,
}

/// Identity of whoever is using the portal. Created at login, consumed at logout.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub id: Uuid,
    pub role: Role,
    pub display_name: String,
    pub email: String,
    pub student_id: Option<String>,
    pub logged_in_at: DateTime<Utc>,
}

impl Session {
    pub fn login_admin(
        credentials: Option<&AdminCredentials>,
        username: &str,
        password: &str,
    ) -> Result<Self, AuthError> {
        let Some(expected) = credentials else {
            warn!("admin login attempted but no admin credentials are configured");
            return Err(AuthError::InvalidCredentials);
        };
        if expected.username != username || expected.password != password {
            warn!(username, "rejected admin login");
            return Err(AuthError::InvalidCredentials);
        }

        let session = Session {
            id: Uuid::new_v4(),
            role: Role::Admin,
            display_name: expected.username.clone(),
            email: String::new(),
            student_id: None,
            logged_in_at: Utc::now(),
        };
        info!(session = %session.id, "admin logged in");
        Ok(session)
    }

    /// Display name falls back to the roster, then to the email's local part.
    pub fn login_student(
        roster: &Roster,
        email: &str,
        name: Option<&str>,
    ) -> Result<Self, AuthError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(AuthError::MissingEmail);
        }

        let known = roster.find_by_email(email);
        let display_name = name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .or_else(|| known.map(|student| student.name.clone()))
            .unwrap_or_else(|| email.split('@').next().unwrap_or(email).to_string());

        let session = Session {
            id: Uuid::new_v4(),
            role: Role::Student,
            display_name,
            email: email.to_string(),
            student_id: known.map(|student| student.id.clone()),
            logged_in_at: Utc::now(),
        };
        info!(session = %session.id, student = ?session.student_id, "student logged in");
        Ok(session)
    }

    pub fn can_edit(&self) -> bool {
        self.role == Role::Admin
    }

    /// Admins see everyone; students only their own sheet.
    pub fn can_view(&self, student_id: &str) -> bool {
        match self.role {
            Role::Admin => true,
            Role::Student => self.student_id.as_deref() == Some(student_id),
        }
    }

    pub fn logout(self) {
        let minutes = (Utc::now() - self.logged_in_at).num_minutes();
        info!(session = %self.id, minutes, "logged out");
    }
}
