//! RPC surface: payload parsing, response shapes and error codes.
//!
//! Payloads and responses are JSON. The router turns each call into one
//! [`GameService`] operation and maps [`CombatError`] onto numeric status
//! codes the transport can hand back to clients.

use crate::catalog::AttackKind;
use crate::combatant::{EnemyId, EnemyInstance, Player, PlayerId};
use crate::effects::StatusEffectInstance;
use crate::error::{CombatError, Result};
use crate::service::{AttackReport, GameService};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

pub const RPC_ATTACK: &str = "attack";
pub const RPC_LOAD_GAME: &str = "load_game";
pub const RPC_PLAYER_INFO: &str = "player_info";
pub const RPC_RELOAD_CATALOGS: &str = "reload_catalogs";

/// Status codes carried by [`RpcError`].
pub mod codes {
    pub const INVALID_ARGUMENT: i32 = 3;
    pub const NOT_FOUND: i32 = 5;
    pub const FAILED_PRECONDITION: i32 = 9;
    pub const INTERNAL: i32 = 13;
}

/// An error as returned to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("rpc error {code}: {message}")]
pub struct RpcError {
    pub code: i32,
    pub message: String,
}

impl RpcError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<CombatError> for RpcError {
    fn from(err: CombatError) -> Self {
        let code = match &err {
            CombatError::NotFound { .. } => codes::NOT_FOUND,
            CombatError::InvalidState(_) => codes::FAILED_PRECONDITION,
            CombatError::Validation(_) => codes::INVALID_ARGUMENT,
            CombatError::Persistence(_) => codes::INTERNAL,
        };
        Self::new(code, err.to_string())
    }
}

// ============================================================================
// Requests
// ============================================================================

#[derive(Deserialize)]
struct AttackPayload {
    target_id: String,
    attack: String,
}

/// A parsed `attack` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackRequest {
    pub target_id: EnemyId,
    pub attack: AttackKind,
}

impl AttackRequest {
    /// Parse `{"target_id": .., "attack": ..}`.
    ///
    /// Malformed JSON and missing fields are validation errors. A target id
    /// that is not a UUID cannot name any enemy, and an unknown attack name
    /// names no catalog entry; both are reported as not found.
    pub fn parse(payload: &str) -> Result<Self> {
        let raw: AttackPayload = serde_json::from_str(payload)
            .map_err(|e| CombatError::validation(format!("malformed attack payload: {e}")))?;
        let target_id = raw
            .target_id
            .parse()
            .map_err(|_| CombatError::not_found("target", &raw.target_id))?;
        let attack = raw.attack.parse()?;
        Ok(Self { target_id, attack })
    }
}

// ============================================================================
// Responses
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct AttackResponse {
    pub player_data: Player,
    pub hit: bool,
    pub damage: i64,
    pub target: EnemyInstance,
    pub applied_effects: Vec<StatusEffectInstance>,
    pub attacker_died: bool,
    pub target_died: bool,
}

impl From<AttackReport> for AttackResponse {
    fn from(report: AttackReport) -> Self {
        let AttackReport { player, outcome } = report;
        Self {
            player_data: player,
            hit: outcome.hit,
            damage: outcome.damage,
            target: outcome.target,
            applied_effects: outcome.applied_effects,
            attacker_died: outcome.attacker_died,
            target_died: outcome.target_died,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadGameResponse {
    pub player_data: Player,
}

// ============================================================================
// Router
// ============================================================================

/// Dispatches named RPCs to the game service.
#[derive(Clone)]
pub struct RpcRouter {
    service: Arc<GameService>,
}

impl RpcRouter {
    pub fn new(service: Arc<GameService>) -> Self {
        Self { service }
    }

    /// Run `rpc` for the caller `user_id` and return the JSON response.
    pub async fn handle(
        &self,
        rpc: &str,
        user_id: &str,
        payload: &str,
    ) -> std::result::Result<serde_json::Value, RpcError> {
        let result = self.dispatch(rpc, user_id, payload).await;
        match &result {
            Ok(_) => tracing::debug!(rpc, user_id, "rpc handled"),
            Err(e) => tracing::warn!(rpc, user_id, code = e.code, error = %e.message, "rpc failed"),
        }
        result
    }

    async fn dispatch(
        &self,
        rpc: &str,
        user_id: &str,
        payload: &str,
    ) -> std::result::Result<serde_json::Value, RpcError> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(CombatError::validation("missing user id").into());
        }
        let player_id = PlayerId::new(user_id);

        match rpc {
            RPC_ATTACK => {
                let request = AttackRequest::parse(payload)?;
                let report = self
                    .service
                    .attack_action(&player_id, &request.target_id, request.attack)
                    .await?;
                to_value(&AttackResponse::from(report))
            }
            RPC_LOAD_GAME => {
                let player = self.service.load_or_create_encounter(&player_id).await?;
                to_value(&LoadGameResponse {
                    player_data: player,
                })
            }
            RPC_PLAYER_INFO => {
                let info = self.service.player_info(&player_id).await?;
                to_value(&info)
            }
            RPC_RELOAD_CATALOGS => {
                self.service.reload_catalogs().await?;
                Ok(serde_json::json!({ "reloaded": true }))
            }
            other => Err(CombatError::validation(format!("unknown rpc: {other}")).into()),
        }
    }
}

fn to_value<T: Serialize>(response: &T) -> std::result::Result<serde_json::Value, RpcError> {
    serde_json::to_value(response)
        .map_err(|e| RpcError::new(codes::INTERNAL, format!("unable to marshal response: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::PersistError;

    #[test]
    fn test_parse_attack_request() {
        let id = EnemyId::new();
        let payload = format!(r#"{{"target_id": "{id}", "attack": "kick"}}"#);

        let request = AttackRequest::parse(&payload).unwrap();

        assert_eq!(request.target_id, id);
        assert_eq!(request.attack, AttackKind::Kick);
    }

    #[test]
    fn test_parse_rejects_malformed_payloads() {
        for payload in ["", "not json", r#"{"attack": "jab"}"#, r#"{"target_id": 7, "attack": "jab"}"#] {
            let err = AttackRequest::parse(payload).unwrap_err();
            assert!(matches!(err, CombatError::Validation(_)), "{payload}");
        }
    }

    #[test]
    fn test_parse_unknown_names() {
        let err = AttackRequest::parse(r#"{"target_id": "zombie-1", "attack": "jab"}"#).unwrap_err();
        assert!(matches!(err, CombatError::NotFound { what: "target", .. }));

        let payload = format!(r#"{{"target_id": "{}", "attack": "suplex"}}"#, EnemyId::new());
        let err = AttackRequest::parse(&payload).unwrap_err();
        assert!(matches!(err, CombatError::NotFound { what: "attack", .. }));
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(RpcError::from(CombatError::not_found("attack", "x")).code, codes::NOT_FOUND);
        assert_eq!(RpcError::from(CombatError::invalid_state("dead")).code, codes::FAILED_PRECONDITION);
        assert_eq!(RpcError::from(CombatError::validation("bad")).code, codes::INVALID_ARGUMENT);
        let persist = CombatError::from(PersistError::Backend("down".to_string()));
        assert_eq!(RpcError::from(persist).code, codes::INTERNAL);
    }
}
