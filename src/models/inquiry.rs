// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Support inquiry model.

use serde::{Deserialize, Serialize};

/// Status given to every newly filed inquiry.
pub const STATUS_RECEIVED: &str = "received";

/// Inquiry filed by a signed-in user.
///
/// Stored at: `inquiries/{id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inquiry {
    pub email: String,
    pub subject: String,
    pub message: String,
    /// When the inquiry was filed (RFC 3339)
    pub timestamp: String,
    pub status: String,
}
