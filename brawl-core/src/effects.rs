//! Status effect processor.
//!
//! Applies effect instances to combatants and advances them once per turn:
//! periodic effects deal their accrued damage, and instances whose time has
//! run out are dropped.

use crate::catalog::{Catalogs, StatusEffectDefinition, StatusEffectKind};
use crate::combatant::Combatant;
use crate::dice::DiceRoller;
use crate::error::{CombatError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// A status effect attached to one combatant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEffectInstance {
    #[serde(rename = "type")]
    pub kind: StatusEffectKind,
    pub modifier: f64,
    /// Seconds left as of `updated_at`.
    #[serde(rename = "duration")]
    pub remaining_duration: i64,
    pub interval: i64,
    #[serde(default)]
    pub stack_count: u32,
    /// Unix seconds at which the effect falls off.
    pub expires_at: i64,
    /// Unix seconds of the last tick.
    pub updated_at: i64,
}

impl StatusEffectInstance {
    pub fn from_definition(definition: &StatusEffectDefinition, now: i64) -> Self {
        Self {
            kind: definition.kind,
            modifier: definition.modifier,
            remaining_duration: definition.duration,
            interval: definition.interval,
            stack_count: definition.stack_policy.max_stacks.min(1),
            expires_at: now + definition.duration,
            updated_at: now,
        }
    }

    /// Whether this instance deals damage on ticks.
    pub fn is_periodic(&self) -> bool {
        self.kind.is_damage_over_time() && self.interval > 0
    }

    pub fn is_active_at(&self, now: i64) -> bool {
        self.expires_at > now
    }

    /// Health change owed since the last tick, capped at what the rest of the
    /// effect's lifetime could deal.
    fn accrued_delta(&self, now: i64) -> i64 {
        let elapsed = now - self.updated_at;
        if elapsed < 0 || self.interval <= 0 {
            return 0;
        }
        let per_interval =
            (self.modifier.trunc() as i64).saturating_mul(i64::from(self.stack_count.max(1)));
        let raw = (elapsed / self.interval).saturating_mul(per_interval);
        let cap = (self.remaining_duration / self.interval).saturating_mul(per_interval);
        if raw.unsigned_abs() > cap.unsigned_abs() {
            cap
        } else {
            raw
        }
    }

    fn refresh(&mut self, definition: &StatusEffectDefinition, now: i64) {
        self.modifier = definition.modifier;
        self.remaining_duration = definition.duration;
        self.expires_at = now + definition.duration;
        self.updated_at = now;
    }
}

/// What to do when an effect lands on a combatant already carrying one of
/// the same kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplyPolicy {
    /// Every application adds its own instance.
    #[default]
    Independent,
    /// Reset the existing instance's expiry instead of adding another.
    Refresh,
    /// Roll the definition's stack chance to add a stack (up to its maximum)
    /// and reset the expiry.
    Stack,
}

impl ApplyPolicy {
    pub fn name(&self) -> &'static str {
        match self {
            ApplyPolicy::Independent => "independent",
            ApplyPolicy::Refresh => "refresh",
            ApplyPolicy::Stack => "stack",
        }
    }
}

impl fmt::Display for ApplyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ApplyPolicy {
    type Err = CombatError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "independent" => Ok(ApplyPolicy::Independent),
            "refresh" => Ok(ApplyPolicy::Refresh),
            "stack" => Ok(ApplyPolicy::Stack),
            other => Err(CombatError::validation(format!("unknown apply policy: {other}"))),
        }
    }
}

/// Applies and ticks status effects.
#[derive(Clone)]
pub struct EffectProcessor {
    catalogs: Arc<Catalogs>,
    dice: Arc<dyn DiceRoller>,
    policy: ApplyPolicy,
}

impl EffectProcessor {
    pub fn new(catalogs: Arc<Catalogs>, dice: Arc<dyn DiceRoller>) -> Self {
        Self {
            catalogs,
            dice,
            policy: ApplyPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ApplyPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> ApplyPolicy {
        self.policy
    }

    /// Look up `kind` and attach it to `combatant`.
    pub fn apply<C: Combatant + ?Sized>(
        &self,
        combatant: &mut C,
        kind: StatusEffectKind,
        now: i64,
    ) -> Result<StatusEffectInstance> {
        let definition = self.catalogs.status_effects.get(kind)?;
        Ok(self.apply_definition(combatant, &definition, now))
    }

    /// Attach an already resolved definition to `combatant`.
    pub fn apply_definition<C: Combatant + ?Sized>(
        &self,
        combatant: &mut C,
        definition: &StatusEffectDefinition,
        now: i64,
    ) -> StatusEffectInstance {
        if self.policy != ApplyPolicy::Independent {
            let mut settled = 0i64;
            let refreshed = combatant
                .status_effects_mut()
                .iter_mut()
                .find(|effect| effect.kind == definition.kind)
                .map(|existing| {
                    // Charge elapsed time at the old stack count before the
                    // clock restarts.
                    if existing.is_periodic() {
                        settled = existing.accrued_delta(now);
                    }
                    if self.policy == ApplyPolicy::Stack
                        && existing.stack_count < definition.stack_policy.max_stacks
                        && self.dice.action_succeeds(definition.stack_policy.chance)
                    {
                        existing.stack_count += 1;
                    }
                    existing.refresh(definition, now);
                    existing.clone()
                });

            if let Some(existing) = refreshed {
                if settled != 0 {
                    combatant.adjust_health(settled);
                }
                tracing::debug!(
                    effect = %definition.kind,
                    stacks = existing.stack_count,
                    settled,
                    expires_at = existing.expires_at,
                    "refreshed status effect"
                );
                return existing;
            }
        }

        let instance = StatusEffectInstance::from_definition(definition, now);
        tracing::debug!(effect = %instance.kind, expires_at = instance.expires_at, "applied status effect");
        combatant.status_effects_mut().push(instance.clone());
        instance
    }

    /// Advance every effect on `combatant` to `now`.
    ///
    /// Must run once per logical turn per combatant, and never twice with the
    /// same `now`. Returns the net health change dealt by periodic effects.
    pub fn tick<C: Combatant + ?Sized>(&self, combatant: &mut C, now: i64) -> i64 {
        let effects = std::mem::take(combatant.status_effects_mut());
        let mut retained = Vec::with_capacity(effects.len());
        let mut health_delta = 0i64;

        for mut effect in effects {
            if effect.is_periodic() {
                let delta = effect.accrued_delta(now);
                if delta != 0 {
                    tracing::debug!(effect = %effect.kind, delta, "periodic damage");
                }
                health_delta = health_delta.saturating_add(delta);
            } else if effect.kind.is_damage_over_time() {
                tracing::warn!(effect = %effect.kind, "periodic effect has no interval, skipping damage");
            }

            let remaining = effect.expires_at - now;
            if remaining > 0 {
                effect.remaining_duration = remaining;
                effect.updated_at = now;
                retained.push(effect);
            } else {
                tracing::debug!(effect = %effect.kind, "status effect expired");
            }
        }

        *combatant.status_effects_mut() = retained;
        if health_delta != 0 {
            combatant.adjust_health(health_delta);
        }
        health_delta
    }
}
