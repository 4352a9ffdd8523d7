//! Ownership and visibility checks. Each is a pure predicate over the caller
//! and the already-loaded resource; none touch storage.

use crate::{AppError, AppResult, db::Meetup, session::Caller};

/// Only the sponsor may edit or cancel a meetup.
pub fn ensure_sponsor(caller: &Caller, meetup: &Meetup) -> AppResult<()> {
    ensure_self(caller, &meetup.sponsor)
}

/// A new meetup must name the caller as its sponsor.
pub fn ensure_declared_sponsor(caller: &Caller, declared: Option<&str>) -> AppResult<()> {
    match declared {
        Some(sponsor) => ensure_self(caller, sponsor),
        None => Err(AppError::Forbidden),
    }
}

/// Private profile data is visible and writable only by its owner.
pub fn ensure_self(caller: &Caller, user_id: &str) -> AppResult<()> {
    if caller.is(user_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}
