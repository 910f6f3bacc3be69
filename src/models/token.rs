use serde::Serialize;

use crate::domain::TokenKind;

/// Persisted refresh token of a privileged user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRecord {
    pub id: String,
    pub user_id: String,
    pub token: String,
    #[serde(rename = "type")]
    pub kind: TokenKind,
    pub created_at: String,
}
