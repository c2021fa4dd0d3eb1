use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Customer,
    Transporter,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Customer, Role::Transporter, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Transporter => "transporter",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "customer" => Ok(Role::Customer),
            "transporter" => Ok(Role::Transporter),
            "admin" => Ok(Role::Admin),
            other => Err(format!("Invalid role: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: String, email: &str, password_hash: String, role: Role) -> Self {
        Self {
            id: super::new_record_id(),
            name: name.trim().to_string(),
            email: Self::normalize_email(email),
            password_hash,
            role,
            created_at: Utc::now(),
        }
    }

    /// Emails are unique case-insensitively; they are stored trimmed and lower-cased.
    pub fn normalize_email(email: &str) -> String {
        email.trim().to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_normalized_on_creation() {
        let user = User::new(
            " Nimal ".to_string(),
            "  Nimal@Example.COM ",
            "hash".to_string(),
            Role::Customer,
        );
        assert_eq!(user.email, "nimal@example.com");
        assert_eq!(user.name, "Nimal");
        assert_eq!(user.id.len(), 24);
    }

    #[test]
    fn role_parses_known_values_only() {
        assert_eq!("Admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!("transporter".parse::<Role>(), Ok(Role::Transporter));
        assert!("farmer".parse::<Role>().is_err());
        assert_eq!(Role::default(), Role::Customer);
    }
}
