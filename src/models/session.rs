// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Signed-in user context passed to every per-user operation.

/// Identity of the user a request acts for.
///
/// Created by the auth middleware from a valid session token and dropped at
/// the end of the request; signing out invalidates the token, not this value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSession {
    /// Verified email address (key of every per-user document)
    pub email: String,
}

impl UserSession {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
        }
    }
}
