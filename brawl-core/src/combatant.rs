//! Combatants and the state they carry between requests.
//!
//! A [`Player`] is persistent and owns its battle session; an
//! [`EnemyInstance`] lives only inside that session until it dies.

use crate::catalog::{EnemyDefinition, EnemyKind};
use crate::effects::StatusEffectInstance;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// ID Types
// ============================================================================

/// Identity of a player, as resolved by the transport layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an enemy instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(pub Uuid);

impl EnemyId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EnemyId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EnemyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EnemyId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(EnemyId)
    }
}

// ============================================================================
// Combatant capability
// ============================================================================

/// Anything with health and a status-effect list.
pub trait Combatant {
    fn health(&self) -> i64;

    fn set_health(&mut self, health: i64);

    fn status_effects(&self) -> &[StatusEffectInstance];

    fn status_effects_mut(&mut self) -> &mut Vec<StatusEffectInstance>;

    /// Add `delta` to health without clamping; returns the new value.
    fn adjust_health(&mut self, delta: i64) -> i64 {
        let health = self.health().saturating_add(delta);
        self.set_health(health);
        health
    }

    /// Dead means health at or below zero; health itself is never clamped.
    fn is_dead(&self) -> bool {
        self.health() <= 0
    }
}

// ============================================================================
// Rewards and currencies
// ============================================================================

/// Kinds of grant a defeated enemy yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewardKind {
    Experience,
    Gold,
    Gems,
}

/// One entry of a reward bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardInfo {
    #[serde(rename = "type")]
    pub kind: RewardKind,
    pub amount: i64,
}

impl RewardInfo {
    pub fn new(kind: RewardKind, amount: i64) -> Self {
        Self { kind, amount }
    }
}

/// Spendable currencies held by a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurrencyKind {
    Gold,
    Gems,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    #[serde(rename = "type")]
    pub kind: CurrencyKind,
    pub amount: i64,
}

// ============================================================================
// Enemies
// ============================================================================

/// An enemy stamped from a catalog template for one encounter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyInstance {
    pub id: EnemyId,
    #[serde(rename = "type")]
    pub kind: EnemyKind,
    pub health: i64,
    pub attack_modifier: f64,
    #[serde(default)]
    pub status_effects: Vec<StatusEffectInstance>,
    /// Rolled once when the encounter is created.
    #[serde(default)]
    pub rewards: Vec<RewardInfo>,
}

impl EnemyInstance {
    pub fn from_definition(definition: &EnemyDefinition, rewards: Vec<RewardInfo>) -> Self {
        Self {
            id: EnemyId::new(),
            kind: definition.kind,
            health: definition.base_health,
            attack_modifier: definition.attack_modifier,
            status_effects: Vec::new(),
            rewards,
        }
    }
}

impl Combatant for EnemyInstance {
    fn health(&self) -> i64 {
        self.health
    }

    fn set_health(&mut self, health: i64) {
        self.health = health;
    }

    fn status_effects(&self) -> &[StatusEffectInstance] {
        &self.status_effects
    }

    fn status_effects_mut(&mut self) -> &mut Vec<StatusEffectInstance> {
        &mut self.status_effects
    }
}

/// The enemies currently engaged with a player.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BattleSession {
    #[serde(default)]
    pub enemies: HashMap<EnemyId, EnemyInstance>,
}

impl BattleSession {
    pub fn is_empty(&self) -> bool {
        self.enemies.is_empty()
    }

    pub fn len(&self) -> usize {
        self.enemies.len()
    }

    pub fn get(&self, id: &EnemyId) -> Option<&EnemyInstance> {
        self.enemies.get(id)
    }

    pub fn get_mut(&mut self, id: &EnemyId) -> Option<&mut EnemyInstance> {
        self.enemies.get_mut(id)
    }

    pub fn insert(&mut self, enemy: EnemyInstance) -> EnemyId {
        let id = enemy.id;
        self.enemies.insert(id, enemy);
        id
    }

    pub fn remove(&mut self, id: &EnemyId) -> Option<EnemyInstance> {
        self.enemies.remove(id)
    }
}

// ============================================================================
// Players
// ============================================================================

/// Persistent player state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub display_name: String,
    pub level: u32,
    pub experience: i64,
    pub health: i64,
    #[serde(rename = "currency", default)]
    pub currencies: Vec<Currency>,
    #[serde(default)]
    pub status_effects: Vec<StatusEffectInstance>,
    #[serde(rename = "battle_state", default)]
    pub battle: BattleSession,
    /// Enemies defeated, per enemy type.
    #[serde(default)]
    pub battle_stats: HashMap<EnemyKind, u32>,
    /// Free-form extra data.
    #[serde(default)]
    pub attributes: HashMap<String, serde_json::Value>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Player {
    /// A fresh level-1 player with empty wallets and no encounter.
    pub fn new(id: PlayerId, display_name: impl Into<String>, health: i64, now: i64) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            level: 1,
            experience: 0,
            health,
            currencies: vec![
                Currency {
                    kind: CurrencyKind::Gold,
                    amount: 0,
                },
                Currency {
                    kind: CurrencyKind::Gems,
                    amount: 0,
                },
            ],
            status_effects: Vec::new(),
            battle: BattleSession::default(),
            battle_stats: HashMap::new(),
            attributes: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn kills(&self, kind: EnemyKind) -> u32 {
        self.battle_stats.get(&kind).copied().unwrap_or(0)
    }

    pub fn record_kill(&mut self, kind: EnemyKind) {
        *self.battle_stats.entry(kind).or_insert(0) += 1;
    }
}

impl Combatant for Player {
    fn health(&self) -> i64 {
        self.health
    }

    fn set_health(&mut self, health: i64) {
        self.health = health;
    }

    fn status_effects(&self) -> &[StatusEffectInstance] {
        &self.status_effects
    }

    fn status_effects_mut(&mut self) -> &mut Vec<StatusEffectInstance> {
        &mut self.status_effects
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_player_defaults() {
        let player = Player::new(PlayerId::new("u-1"), "Rook", 100, 1_000);

        assert_eq!(player.level, 1);
        assert_eq!(player.health, 100);
        assert_eq!(player.currencies.len(), 2);
        assert!(player.currencies.iter().all(|c| c.amount == 0));
        assert!(player.battle.is_empty());
        assert_eq!(player.created_at, 1_000);
    }

    #[test]
    fn test_health_goes_negative() {
        let mut player = Player::new(PlayerId::new("u-1"), "Rook", 3, 0);

        assert_eq!(player.adjust_health(-10), -7);
        assert!(player.is_dead());
        assert_eq!(player.health, -7);
    }

    #[test]
    fn test_zero_health_is_dead() {
        let definition = EnemyDefinition::new(EnemyKind::Beast, 0, 2.0);
        let enemy = EnemyInstance::from_definition(&definition, Vec::new());
        assert!(enemy.is_dead());
    }

    #[test]
    fn test_record_kill() {
        let mut player = Player::new(PlayerId::new("u-1"), "Rook", 100, 0);
        player.record_kill(EnemyKind::Zombie);
        player.record_kill(EnemyKind::Zombie);

        assert_eq!(player.kills(EnemyKind::Zombie), 2);
        assert_eq!(player.kills(EnemyKind::Beast), 0);
    }

    #[test]
    fn test_player_json_shape() {
        let mut player = Player::new(PlayerId::new("u-1"), "Rook", 100, 0);
        let enemy = EnemyInstance::from_definition(
            &EnemyDefinition::new(EnemyKind::Mutant, 75, 1.1),
            vec![RewardInfo::new(RewardKind::Gold, 12)],
        );
        let enemy_id = player.battle.insert(enemy);
        player.record_kill(EnemyKind::Beast);

        let json = serde_json::to_value(&player).unwrap();
        assert_eq!(json["id"], "u-1");
        assert_eq!(json["currency"][0]["type"], "gold");
        assert_eq!(json["battle_stats"]["beast"], 1);
        let stored = &json["battle_state"]["enemies"][enemy_id.to_string()];
        assert_eq!(stored["type"], "mutant");
        assert_eq!(stored["rewards"][0]["amount"], 12);

        let back: Player = serde_json::from_value(json).unwrap();
        assert_eq!(back, player);
    }

    #[test]
    fn test_enemy_id_parse() {
        let id = EnemyId::new();
        assert_eq!(id.to_string().parse::<EnemyId>().unwrap(), id);
        assert!("not-a-uuid".parse::<EnemyId>().is_err());
    }
}
