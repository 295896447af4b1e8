//! Local guest accounts stored in guest_users.json
//!
//! Passwords are stored as entered. Guest sessions never sync to Google
//! Drive.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::NoteflowError;

const MIN_PASSWORD_LEN: usize = 6;

fn re_email() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-zA-Z0-9_.+-]+@[a-zA-Z0-9-]+\.[a-zA-Z0-9\-.]+$").unwrap())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct GuestAccount {
    name: String,
    email: String,
    password: String,
}

/// Who is signed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserInfo {
    pub name: String,
    pub email: String,
}

pub struct GuestDirectory {
    path: PathBuf,
}

impl GuestDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Vec<GuestAccount>, NoteflowError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = std::fs::read_to_string(&self.path)
            .map_err(|e| NoteflowError::Io(format!("Error accessing user data: {}", e)))?;
        serde_json::from_str(&raw)
            .map_err(|e| NoteflowError::Io(format!("Error accessing user data: {}", e)))
    }

    fn save(&self, accounts: &[GuestAccount]) -> Result<(), NoteflowError> {
        let write_failed = |message: String| NoteflowError::WriteFailed {
            path: self.path.clone(),
            message,
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| write_failed(e.to_string()))?;
        }
        let json = serde_json::to_string_pretty(accounts).map_err(|e| write_failed(e.to_string()))?;
        std::fs::write(&self.path, json).map_err(|e| write_failed(e.to_string()))
    }

    /// Create an account. Checks run in a fixed order and the first failure
    /// is reported.
    pub fn sign_up(
        &self,
        name: &str,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<UserInfo, NoteflowError> {
        let name = name.trim();
        let email = email.trim();

        if name.is_empty() || email.is_empty() || password.is_empty() || confirm_password.is_empty()
        {
            return Err(invalid("All fields are required."));
        }
        if !re_email().is_match(email) {
            return Err(invalid("Invalid email format."));
        }
        if password != confirm_password {
            return Err(invalid("Passwords do not match."));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(invalid("Password must be at least 6 characters long."));
        }

        let mut accounts = self.load()?;
        if accounts.iter().any(|a| a.email == email) {
            return Err(invalid("Email already exists. Try logging in."));
        }
        accounts.push(GuestAccount {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        });
        self.save(&accounts)?;

        log::info!("New guest user created: {} ({})", name, email);
        Ok(UserInfo {
            name: name.to_string(),
            email: email.to_string(),
        })
    }

    pub fn log_in(&self, email: &str, password: &str) -> Result<UserInfo, NoteflowError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(invalid("Email and password are required."));
        }
        let accounts = self.load()?;
        let account = accounts
            .into_iter()
            .find(|a| a.email == email && a.password == password)
            .ok_or_else(|| invalid("Invalid email or password."))?;

        log::info!("Guest user logged in: {}", email);
        Ok(UserInfo {
            name: account.name,
            email: account.email,
        })
    }
}

fn invalid(message: &str) -> NoteflowError {
    NoteflowError::Validation(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> (tempfile::TempDir, GuestDirectory) {
        let dir = tempfile::tempdir().expect("tempdir");
        let guests = GuestDirectory::new(dir.path().join("guest_users.json"));
        (dir, guests)
    }

    fn message(err: NoteflowError) -> String {
        err.to_string()
    }

    #[test]
    fn sign_up_then_log_in() {
        let (_dir, guests) = directory();
        let user = guests
            .sign_up(" Ada ", "ada@example.com", "secret1", "secret1")
            .unwrap();
        assert_eq!(user.name, "Ada");

        let logged_in = guests.log_in("ada@example.com", "secret1").unwrap();
        assert_eq!(logged_in, user);

        let raw = std::fs::read_to_string(guests.path()).unwrap();
        assert!(raw.contains("\"password\": \"secret1\""));
    }

    #[test]
    fn validation_order() {
        let (_dir, guests) = directory();
        assert_eq!(
            message(guests.sign_up("", "bad", "x", "y").unwrap_err()),
            "All fields are required."
        );
        assert_eq!(
            message(guests.sign_up("A", "not-an-email", "x", "y").unwrap_err()),
            "Invalid email format."
        );
        assert_eq!(
            message(guests.sign_up("A", "a@b.co", "abc", "abd").unwrap_err()),
            "Passwords do not match."
        );
        assert_eq!(
            message(guests.sign_up("A", "a@b.co", "abc", "abc").unwrap_err()),
            "Password must be at least 6 characters long."
        );
        assert!(!guests.path().exists());
    }

    #[test]
    fn duplicate_email_rejected() {
        let (_dir, guests) = directory();
        guests.sign_up("A", "a@b.co", "123456", "123456").unwrap();
        assert_eq!(
            message(guests.sign_up("B", "a@b.co", "654321", "654321").unwrap_err()),
            "Email already exists. Try logging in."
        );
    }

    #[test]
    fn log_in_failures() {
        let (_dir, guests) = directory();
        assert_eq!(
            message(guests.log_in("", "pw").unwrap_err()),
            "Email and password are required."
        );
        guests.sign_up("A", "a@b.co", "123456", "123456").unwrap();
        assert_eq!(
            message(guests.log_in("a@b.co", "wrong1").unwrap_err()),
            "Invalid email or password."
        );
    }
}
