// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token claims and authenticated researcher representation.

use serde::{Deserialize, Serialize};

use crate::storage::ResearcherId;

/// Claims carried by an ExoQuest session token.
///
/// Serialized field names match what the portal frontend decodes
/// (`researcherId`, `username`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Researcher identifier assigned by the store
    #[serde(rename = "researcherId")]
    pub researcher_id: ResearcherId,

    /// Username at the time of issuance
    pub username: String,

    /// Issued at (Unix timestamp, seconds)
    pub iat: i64,

    /// Expiration (Unix timestamp, seconds)
    pub exp: i64,
}

/// Researcher identity injected into requests by the authorization gate.
///
/// Handlers trust these fields without going back to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedResearcher {
    pub researcher_id: ResearcherId,
    pub username: String,

    /// Token issuance (Unix timestamp, not serialized)
    #[serde(skip)]
    pub issued_at: i64,

    /// Token expiration (Unix timestamp, not serialized)
    #[serde(skip)]
    pub expires_at: i64,
}

impl AuthenticatedResearcher {
    pub fn from_claims(claims: TokenClaims) -> Self {
        Self {
            researcher_id: claims.researcher_id,
            username: claims.username,
            issued_at: claims.iat,
            expires_at: claims.exp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_claims() -> TokenClaims {
        TokenClaims {
            researcher_id: ResearcherId(17),
            username: "researcher_01".to_string(),
            iat: 1_700_000_000,
            exp: 1_700_086_400,
        }
    }

    #[test]
    fn claims_use_frontend_field_names() {
        let json = serde_json::to_value(sample_claims()).unwrap();
        assert_eq!(json["researcherId"], 17);
        assert_eq!(json["username"], "researcher_01");
        assert_eq!(json["exp"], 1_700_086_400);
    }

    #[test]
    fn from_claims_copies_identity() {
        let researcher = AuthenticatedResearcher::from_claims(sample_claims());
        assert_eq!(researcher.researcher_id, ResearcherId(17));
        assert_eq!(researcher.username, "researcher_01");
        assert_eq!(researcher.issued_at, 1_700_000_000);
        assert_eq!(researcher.expires_at, 1_700_086_400);
    }
}
