//! Optimistic cross-session write lock arbitration (spec §4.8).
//!
//! Pure state machine, no I/O: the registry wraps this per session and is
//! responsible for mutex discipline and signal emission around it.

use jido_core::{JidoError, LockToken};
use serde::Serialize;
use serde_json::json;

/// The outcome of a successful `acquire_lock`/`force_takeover` call.
#[derive(Debug, Clone, Serialize)]
pub struct LockGrant {
    pub token: LockToken,
    pub owner: String,
    pub lock_revision: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_owner: Option<String>,
}

/// Per-session lock state: current holder, current token, and a
/// monotonic revision bumped on every grant or release.
#[derive(Debug, Clone, Default)]
pub struct LockState {
    token: Option<LockToken>,
    owner: Option<String>,
    lock_revision: u64,
}

impl LockState {
    /// `acquire_lock(owner, {expected_token?, rotate_token?})` (spec §4.8).
    pub fn acquire(
        &mut self,
        owner: &str,
        expected_token: Option<&LockToken>,
        rotate_token: bool,
        mint: impl FnOnce() -> LockToken,
    ) -> Result<LockGrant, JidoError> {
        if let Some(expected) = expected_token {
            if self.token.as_ref() != Some(expected) {
                return Err(JidoError::conflict("stale lock token")
                    .with_details(json!({ "reason": "stale_token" })));
            }
        }

        match self.owner.clone() {
            None => Ok(self.grant(owner, None, mint)),
            Some(current_owner) if current_owner == owner => {
                if rotate_token {
                    Ok(self.grant(owner, Some(current_owner), mint))
                } else {
                    let Some(token) = self.token.clone() else {
                        return Ok(self.grant(owner, Some(current_owner), mint));
                    };
                    Ok(LockGrant {
                        token,
                        owner: current_owner,
                        lock_revision: self.lock_revision,
                        previous_owner: None,
                    })
                }
            }
            Some(current_owner) => Err(JidoError::conflict("lock held by another owner")
                .with_details(json!({ "owner": current_owner }))),
        }
    }

    /// `validate_lock(token)` (spec §4.8).
    pub fn validate(&self, token: &LockToken) -> Result<(), JidoError> {
        if self.token.as_ref() == Some(token) {
            Ok(())
        } else {
            Err(JidoError::conflict("invalid or no lock held"))
        }
    }

    /// `release_lock(token)` (spec §4.8).
    pub fn release(&mut self, token: &LockToken) -> Result<(), JidoError> {
        self.validate(token)?;
        self.owner = None;
        self.token = None;
        self.lock_revision += 1;
        Ok(())
    }

    /// `force_takeover(new_owner, reason?)` (spec §4.8). Unconditional.
    pub fn force_takeover(&mut self, new_owner: &str, mint: impl FnOnce() -> LockToken) -> LockGrant {
        let previous_owner = self.owner.clone();
        self.grant(new_owner, previous_owner, mint)
    }

    pub fn lock_revision(&self) -> u64 {
        self.lock_revision
    }

    fn grant(&mut self, owner: &str, previous_owner: Option<String>, mint: impl FnOnce() -> LockToken) -> LockGrant {
        let token = mint();
        self.token = Some(token.clone());
        self.owner = Some(owner.to_string());
        self.lock_revision += 1;
        LockGrant {
            token,
            owner: owner.to_string(),
            lock_revision: self.lock_revision,
            previous_owner,
        }
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
