//! Known users, login and registration.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::info;

use crate::models::User;

/// Domain required when no other is configured.
pub const DEFAULT_EMAIL_DOMAIN: &str = "gmail.com";

static LOCAL_PART_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+$").expect("invalid email local-part regex"));

/// Reasons a login or registration is refused.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoginError {
    /// The address does not satisfy the domain policy.
    #[error("email must look like name@{domain}")]
    InvalidEmail {
        /// Domain the address must end with.
        domain: String,
    },

    /// Registration without a display name.
    #[error("name must not be empty")]
    EmptyName,

    /// Registration for an address that already has an account.
    #[error("{0} is already registered")]
    AlreadyRegistered(String),
}

/// Outcome of a login attempt with a well-formed address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Index of the existing account.
    Existing(usize),
    /// Address is unknown; carries the normalised email for registration.
    NewUser(String),
}

/// Trim, lower-case and check `raw` against the `@domain` suffix policy.
pub fn validate_email(raw: &str, domain: &str) -> Result<String, LoginError> {
    let email = raw.trim().to_lowercase();
    let domain = domain.trim().trim_start_matches('@').to_lowercase();
    let invalid = || LoginError::InvalidEmail {
        domain: domain.clone(),
    };
    let local = email
        .strip_suffix(domain.as_str())
        .and_then(|rest| rest.strip_suffix('@'))
        .ok_or_else(invalid)?;
    if !LOCAL_PART_RE.is_match(local) {
        return Err(invalid());
    }
    Ok(email)
}

/// Ordered collection of users keyed by case-insensitive email.
#[derive(Debug, Clone)]
pub struct UserDirectory {
    users: Vec<User>,
    email_domain: String,
}

impl UserDirectory {
    /// Wrap loaded users with the login domain policy.
    pub fn new(users: Vec<User>, email_domain: impl Into<String>) -> Self {
        Self {
            users,
            email_domain: email_domain.into(),
        }
    }

    /// Domain logins must belong to.
    pub fn email_domain(&self) -> &str {
        &self.email_domain
    }

    /// All users in registration order.
    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// Mutable access to every user, e.g. for default booking assignment.
    pub fn users_mut(&mut self) -> &mut [User] {
        &mut self.users
    }

    /// User at `index`.
    pub fn user(&self, index: usize) -> Option<&User> {
        self.users.get(index)
    }

    /// Mutable user at `index`.
    pub fn user_mut(&mut self, index: usize) -> Option<&mut User> {
        self.users.get_mut(index)
    }

    /// Index of the user owning `email`, ignoring case.
    pub fn find_by_email(&self, email: &str) -> Option<usize> {
        let email = email.trim();
        self.users
            .iter()
            .position(|user| user.email.eq_ignore_ascii_case(email))
    }

    /// Resolve a login address to an existing account or a pending registration.
    pub fn login(&self, email: &str) -> Result<LoginOutcome, LoginError> {
        let email = validate_email(email, &self.email_domain)?;
        Ok(match self.find_by_email(&email) {
            Some(index) => LoginOutcome::Existing(index),
            None => LoginOutcome::NewUser(email),
        })
    }

    /// Create an account and return its index.
    pub fn register(&mut self, name: &str, email: &str) -> Result<usize, LoginError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LoginError::EmptyName);
        }
        let email = validate_email(email, &self.email_domain)?;
        if self.find_by_email(&email).is_some() {
            return Err(LoginError::AlreadyRegistered(email));
        }
        info!(%email, "Registered user");
        self.users.push(User::new(name, email));
        Ok(self.users.len() - 1)
    }

    /// Consume the directory, returning the users for persistence.
    pub fn into_users(self) -> Vec<User> {
        self.users
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_policy_requires_domain_suffix() {
        assert_eq!(
            validate_email("  Pavi@Gmail.com ", "gmail.com").as_deref(),
            Ok("pavi@gmail.com")
        );
        assert_eq!(
            validate_email("pavi@example.com", "@gmail.com"),
            Err(LoginError::InvalidEmail {
                domain: "gmail.com".to_string()
            })
        );
        assert!(validate_email("@gmail.com", "gmail.com").is_err());
        assert!(validate_email("pa vi@gmail.com", "gmail.com").is_err());
        assert!(validate_email("pavigmail.com", "gmail.com").is_err());
        assert!(validate_email("a@b@gmail.com", "gmail.com").is_err());
    }

    #[test]
    fn login_finds_existing_users_case_insensitively() {
        let directory = UserDirectory::new(
            vec![User::new("Dharani", "dharani@gmail.com")],
            DEFAULT_EMAIL_DOMAIN,
        );
        assert_eq!(
            directory.login("DHARANI@gmail.com"),
            Ok(LoginOutcome::Existing(0))
        );
        assert_eq!(
            directory.login("new@gmail.com"),
            Ok(LoginOutcome::NewUser("new@gmail.com".to_string()))
        );
        assert!(directory.login("new@yahoo.com").is_err());
    }

    #[test]
    fn register_appends_unique_users() {
        let mut directory = UserDirectory::new(Vec::new(), DEFAULT_EMAIL_DOMAIN);
        assert_eq!(directory.register("  Pavi ", "Pavi@gmail.com"), Ok(0));
        let user = directory.user(0).expect("registered");
        assert_eq!(user.name, "Pavi");
        assert_eq!(user.email, "pavi@gmail.com");

        assert_eq!(
            directory.register("Other", "pavi@gmail.com"),
            Err(LoginError::AlreadyRegistered("pavi@gmail.com".to_string()))
        );
        assert_eq!(
            directory.register("   ", "x@gmail.com"),
            Err(LoginError::EmptyName)
        );
        assert_eq!(directory.users().len(), 1);
    }
}
