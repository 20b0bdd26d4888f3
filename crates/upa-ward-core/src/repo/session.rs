//! Current-user pointer for this terminal.
//!
//! No credentials and no expiry: the session is whichever digitizer last signed in.

use super::{DigitizerRepository, RepoError, RepoResult};
use crate::db::Database;
use crate::models::Digitizer;
use crate::store::{Collection, StoreError};

/// Session state kept in local storage only.
pub struct SessionState<'a> {
    db: &'a Database,
}

impl<'a> SessionState<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// The signed-in digitizer, if any.
    pub fn current_user(&self) -> RepoResult<Option<Digitizer>> {
        let key = Collection::Session.local_key();
        match self.db.get_entry(key).map_err(StoreError::from)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Set or clear (`None`) the signed-in digitizer.
    pub fn set_current_user(&self, user: Option<&Digitizer>) -> RepoResult<()> {
        let key = Collection::Session.local_key();
        match user {
            Some(user) => self
                .db
                .set_entry(key, &serde_json::to_string(user)?)
                .map_err(StoreError::from)?,
            None => {
                self.db.remove_entry(key).map_err(StoreError::from)?;
            }
        }
        Ok(())
    }

    /// Sign in by email. Unknown emails are rejected.
    pub fn sign_in(&self, digitizers: &DigitizerRepository<'_>, email: &str) -> RepoResult<Digitizer> {
        let user = digitizers
            .find_by_email(email)?
            .ok_or_else(|| RepoError::NotFound(format!("no digitizer with email {}", email)))?;
        self.set_current_user(Some(&user))?;
        Ok(user)
    }

    pub fn sign_out(&self) -> RepoResult<()> {
        self.set_current_user(None)
    }
}
