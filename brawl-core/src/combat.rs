//! Combat resolver.
//!
//! This module implements the attack pipeline:
//! 1. Lookups: target in the session, attack and on-hit effect definitions
//! 2. Preconditions: both sides alive
//! 3. Hit roll against the attacker's effective hit chance
//! 4. Damage and independent on-hit effect rolls
//! 5. Effect ticks for target then attacker, hit or miss
//! 6. Death cleanup for a defeated target
//!
//! Every check that can fail runs before the first mutation, so an error
//! leaves the player exactly as it was.

use crate::battle::BattleManager;
use crate::catalog::{AttackDefinition, AttackKind, Catalogs, StatusEffectDefinition};
use crate::combatant::{Combatant, EnemyId, EnemyInstance, Player};
use crate::dice::DiceRoller;
use crate::effects::{EffectProcessor, StatusEffectInstance};
use crate::error::{CombatError, Result};
use serde::Serialize;
use std::sync::Arc;

/// Everything an attack changed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttackOutcome {
    pub attack: AttackKind,
    pub target_id: EnemyId,
    pub hit: bool,
    /// Effective hit chance the roll was made against.
    pub hit_chance: f64,
    /// Damage dealt by the blow itself; 0 on a miss.
    pub damage: i64,
    /// Effects newly applied to the target by this attack.
    pub applied_effects: Vec<StatusEffectInstance>,
    /// Net health change from ticking the target's effects.
    pub target_tick_delta: i64,
    /// Net health change from ticking the attacker's effects.
    pub attacker_tick_delta: i64,
    pub attacker_health: i64,
    pub target_health: i64,
    /// The target after resolution. Still carries its rewards when it died.
    pub target: EnemyInstance,
    pub attacker_died: bool,
    pub target_died: bool,
}

/// Runs after resolution and before the player is saved.
///
/// Counter-attacks and game-over handling plug in here.
pub trait ResolutionHook: Send + Sync {
    fn after_attack(&self, player: &mut Player, outcome: &AttackOutcome, now: i64);
}

/// Resolves attack intents against a player's battle session.
#[derive(Clone)]
pub struct CombatResolver {
    catalogs: Arc<Catalogs>,
    dice: Arc<dyn DiceRoller>,
    effects: EffectProcessor,
    battles: BattleManager,
}

impl CombatResolver {
    pub fn new(catalogs: Arc<Catalogs>, dice: Arc<dyn DiceRoller>, effects: EffectProcessor) -> Self {
        let battles = BattleManager::new(catalogs.clone(), dice.clone());
        Self {
            catalogs,
            dice,
            effects,
            battles,
        }
    }

    pub fn battles(&self) -> &BattleManager {
        &self.battles
    }

    /// Resolve one attack by `player` on the enemy `target_id`.
    pub fn attack_action(
        &self,
        player: &mut Player,
        target_id: &EnemyId,
        attack: AttackKind,
        now: i64,
    ) -> Result<AttackOutcome> {
        let target = player
            .battle
            .get(target_id)
            .ok_or_else(|| CombatError::not_found("target", target_id))?;
        let definition = self.catalogs.attacks.get(attack)?;
        let on_hit = self.on_hit_definitions(&definition)?;

        if player.is_dead() {
            return Err(CombatError::invalid_state(format!(
                "attacker {} is dead (health {})",
                player.id, player.health
            )));
        }
        if target.is_dead() {
            return Err(CombatError::invalid_state(format!(
                "target {} is dead (health {})",
                target_id, target.health
            )));
        }

        let hit_chance = effective_hit_chance(&definition, &player.status_effects, now);
        let hit = self.dice.action_succeeds(hit_chance);
        tracing::debug!(
            player = %player.id,
            attack = %attack,
            hit_chance,
            hit,
            "attack rolled"
        );

        let Some(target) = player.battle.get_mut(target_id) else {
            return Err(CombatError::not_found("target", target_id));
        };

        let mut damage = 0;
        let mut applied_effects = Vec::new();
        if hit {
            target.adjust_health(-definition.damage);
            damage = definition.damage;
            for (effect, effect_definition) in definition.on_hit_effects.iter().zip(&on_hit) {
                if self.dice.action_succeeds(effect.chance) {
                    applied_effects.push(self.effects.apply_definition(target, effect_definition, now));
                }
            }
        }

        let target_tick_delta = self.effects.tick(target, now);
        let target_snapshot = target.clone();
        let attacker_tick_delta = self.effects.tick(player, now);

        let target_died = target_snapshot.is_dead();
        if target_died {
            self.battles.resolve(player, target_id);
        }
        let attacker_died = player.is_dead();
        if attacker_died {
            tracing::info!(player = %player.id, health = player.health, "attacker died");
        }

        Ok(AttackOutcome {
            attack,
            target_id: *target_id,
            hit,
            hit_chance,
            damage,
            applied_effects,
            target_tick_delta,
            attacker_tick_delta,
            attacker_health: player.health,
            target_health: target_snapshot.health,
            target: target_snapshot,
            attacker_died,
            target_died,
        })
    }

    /// Definitions for every on-hit effect of an attack, in order.
    fn on_hit_definitions(&self, definition: &AttackDefinition) -> Result<Vec<StatusEffectDefinition>> {
        definition
            .on_hit_effects
            .iter()
            .map(|effect| self.catalogs.status_effects.get(effect.kind))
            .collect()
    }
}

/// Base hit chance minus the modifier of every active hit-chance effect on
/// the attacker. Not clamped: below zero is a certain miss, at or above one a
/// certain hit.
pub fn effective_hit_chance(
    definition: &AttackDefinition,
    attacker_effects: &[StatusEffectInstance],
    now: i64,
) -> f64 {
    attacker_effects
        .iter()
        .filter(|effect| effect.kind.affects_hit_chance() && effect.is_active_at(now))
        .fold(definition.base_hit_chance, |chance, effect| {
            chance - effect.modifier
        })
}
