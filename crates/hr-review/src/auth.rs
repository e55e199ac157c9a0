use crate::config::AuthConfig;
use std::collections::HashSet;

/// Gate in front of every review endpoint.
#[derive(Clone)]
pub enum AccessPolicy {
    /// One shared secret for the whole team.
    Password(String),
    /// Lower-cased emails allowed in. The address is trusted as given; the
    /// fronting proxy is responsible for proving it.
    AllowList(HashSet<String>),
    /// Nothing configured, so nobody gets in.
    Unconfigured,
}

impl AccessPolicy {
    pub fn from_config(config: &AuthConfig) -> Self {
        if let Some(password) = config.password.as_deref().filter(|value| !value.is_empty()) {
            return Self::Password(password.to_string());
        }

        let emails: HashSet<String> = config
            .allowed_emails
            .iter()
            .map(|email| email.trim().to_ascii_lowercase())
            .filter(|email| !email.is_empty())
            .collect();
        if emails.is_empty() {
            Self::Unconfigured
        } else {
            Self::AllowList(emails)
        }
    }

    pub fn mode(&self) -> &'static str {
        match self {
            Self::Password(_) => "password",
            Self::AllowList(_) => "allow_list",
            Self::Unconfigured => "unconfigured",
        }
    }

    pub fn authorize(&self, credentials: &Credentials) -> Result<(), AccessDenied> {
        match self {
            Self::Unconfigured => Err(AccessDenied::NotConfigured),
            Self::Password(expected) => match credentials.password.as_deref() {
                None => Err(AccessDenied::MissingCredentials),
                Some(given) if constant_time_eq(given.as_bytes(), expected.as_bytes()) => Ok(()),
                Some(_) => Err(AccessDenied::WrongPassword),
            },
            Self::AllowList(emails) => {
                let Some(email) = credentials
                    .email
                    .as_deref()
                    .map(|email| email.trim().to_ascii_lowercase())
                    .filter(|email| !email.is_empty())
                else {
                    return Err(AccessDenied::MissingCredentials);
                };
                if emails.contains(&email) {
                    Ok(())
                } else {
                    Err(AccessDenied::NotAllowed(email))
                }
            }
        }
    }
}

impl std::fmt::Debug for AccessPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Password(_) => f.write_str("Password(<redacted>)"),
            Self::AllowList(emails) => f.debug_tuple("AllowList").field(&emails.len()).finish(),
            Self::Unconfigured => f.write_str("Unconfigured"),
        }
    }
}

fn constant_time_eq(left: &[u8], right: &[u8]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    left.iter()
        .zip(right)
        .fold(0u8, |diff, (a, b)| diff | (a ^ b))
        == 0
}

/// What a caller presented.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub password: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessDenied {
    #[error("access is not configured; set APP_PASSWORD or APP_ALLOWED_EMAILS")]
    NotConfigured,
    #[error("credentials required")]
    MissingCredentials,
    #[error("incorrect password")]
    WrongPassword,
    #[error("{0} is not on the access list")]
    NotAllowed(String),
}
