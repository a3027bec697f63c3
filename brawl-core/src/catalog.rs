//! Static definition catalogs: attacks, status effects and enemies.
//!
//! Catalogs are read by every request and written only at startup or on an
//! explicit live-ops reload. Each one keeps an immutable snapshot behind a
//! reader-writer lock; readers clone the `Arc` and release the lock at once,
//! and a reload validates the whole new table before swapping it in.

use crate::error::{CombatError, Result};
use crate::persist::{PersistError, Persistence};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock};

// ============================================================================
// Kinds
// ============================================================================

/// Attack moves a combatant can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttackKind {
    Jab,
    Punch,
    Kick,
    Uppercut,
    Headbutt,
    Bite,
    Scratch,
}

impl AttackKind {
    pub fn name(&self) -> &'static str {
        match self {
            AttackKind::Jab => "jab",
            AttackKind::Punch => "punch",
            AttackKind::Kick => "kick",
            AttackKind::Uppercut => "uppercut",
            AttackKind::Headbutt => "headbutt",
            AttackKind::Bite => "bite",
            AttackKind::Scratch => "scratch",
        }
    }

    pub fn all() -> [AttackKind; 7] {
        [
            AttackKind::Jab,
            AttackKind::Punch,
            AttackKind::Kick,
            AttackKind::Uppercut,
            AttackKind::Headbutt,
            AttackKind::Bite,
            AttackKind::Scratch,
        ]
    }
}

impl fmt::Display for AttackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for AttackKind {
    type Err = CombatError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        AttackKind::all()
            .into_iter()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| CombatError::not_found("attack", s))
    }
}

/// How a status effect acts on its bearer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectCategory {
    /// Shifts the bearer's hit chance while active.
    HitChance,
    /// Periodically changes the bearer's health.
    DamageOverTime,
}

/// Status effects that attacks can inflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusEffectKind {
    Dazed,
    Blind,
    Poison,
    Bleed,
}

impl StatusEffectKind {
    pub fn name(&self) -> &'static str {
        match self {
            StatusEffectKind::Dazed => "dazed",
            StatusEffectKind::Blind => "blind",
            StatusEffectKind::Poison => "poison",
            StatusEffectKind::Bleed => "bleed",
        }
    }

    pub fn category(&self) -> EffectCategory {
        match self {
            StatusEffectKind::Dazed | StatusEffectKind::Blind => EffectCategory::HitChance,
            StatusEffectKind::Poison | StatusEffectKind::Bleed => EffectCategory::DamageOverTime,
        }
    }

    pub fn affects_hit_chance(&self) -> bool {
        self.category() == EffectCategory::HitChance
    }

    pub fn is_damage_over_time(&self) -> bool {
        self.category() == EffectCategory::DamageOverTime
    }
}

impl fmt::Display for StatusEffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Enemy archetypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnemyKind {
    Zombie,
    Mutant,
    Beast,
}

impl EnemyKind {
    pub fn name(&self) -> &'static str {
        match self {
            EnemyKind::Zombie => "zombie",
            EnemyKind::Mutant => "mutant",
            EnemyKind::Beast => "beast",
        }
    }
}

impl fmt::Display for EnemyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ============================================================================
// Definitions
// ============================================================================

/// An effect an attack may inflict when it lands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnHitEffect {
    #[serde(rename = "type")]
    pub kind: StatusEffectKind,
    /// Probability of inflicting, rolled independently of the hit roll.
    pub chance: f64,
}

/// Static definition of an attack move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackDefinition {
    #[serde(rename = "type")]
    pub kind: AttackKind,
    /// Damage dealt on a hit.
    pub damage: i64,
    pub base_hit_chance: f64,
    #[serde(rename = "applicable_status_effects", default)]
    pub on_hit_effects: Vec<OnHitEffect>,
}

impl AttackDefinition {
    pub fn new(kind: AttackKind, damage: i64, base_hit_chance: f64) -> Self {
        Self {
            kind,
            damage,
            base_hit_chance,
            on_hit_effects: Vec::new(),
        }
    }

    pub fn with_effect(mut self, kind: StatusEffectKind, chance: f64) -> Self {
        self.on_hit_effects.push(OnHitEffect { kind, chance });
        self
    }
}

/// Stacking limits for a status effect.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StackPolicy {
    #[serde(rename = "max")]
    pub max_stacks: u32,
    pub chance: f64,
}

/// Static definition of a status effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEffectDefinition {
    #[serde(rename = "type")]
    pub kind: StatusEffectKind,
    /// Signed magnitude; negative is harmful.
    pub modifier: f64,
    /// Lifetime in seconds.
    pub duration: i64,
    /// Seconds between periodic applications; 0 for non-periodic effects.
    pub interval: i64,
    #[serde(rename = "stack", default)]
    pub stack_policy: StackPolicy,
}

impl StatusEffectDefinition {
    pub fn new(kind: StatusEffectKind, modifier: f64, duration: i64, interval: i64) -> Self {
        Self {
            kind,
            modifier,
            duration,
            interval,
            stack_policy: StackPolicy::default(),
        }
    }

    pub fn with_stacking(mut self, max_stacks: u32, chance: f64) -> Self {
        self.stack_policy = StackPolicy { max_stacks, chance };
        self
    }
}

/// Template an enemy instance is stamped from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyDefinition {
    #[serde(rename = "type")]
    pub kind: EnemyKind,
    #[serde(rename = "health")]
    pub base_health: i64,
    pub attack_modifier: f64,
}

impl EnemyDefinition {
    pub fn new(kind: EnemyKind, base_health: i64, attack_modifier: f64) -> Self {
        Self {
            kind,
            base_health,
            attack_modifier,
        }
    }
}

// ============================================================================
// Default tables
// ============================================================================

lazy_static::lazy_static! {
    /// Attack moves shipped with the engine.
    pub static ref DEFAULT_ATTACKS: Vec<AttackDefinition> = vec![
        AttackDefinition::new(AttackKind::Jab, 2, 0.95)
            .with_effect(StatusEffectKind::Dazed, 0.1),
        AttackDefinition::new(AttackKind::Punch, 4, 0.9)
            .with_effect(StatusEffectKind::Dazed, 0.2)
            .with_effect(StatusEffectKind::Bleed, 0.1),
        AttackDefinition::new(AttackKind::Kick, 7, 0.75)
            .with_effect(StatusEffectKind::Poison, 0.4),
        AttackDefinition::new(AttackKind::Uppercut, 10, 0.5),
        AttackDefinition::new(AttackKind::Headbutt, 12, 0.35)
            .with_effect(StatusEffectKind::Dazed, 0.9)
            .with_effect(StatusEffectKind::Bleed, 0.7),
        AttackDefinition::new(AttackKind::Bite, 5, 0.9)
            .with_effect(StatusEffectKind::Bleed, 0.8),
        AttackDefinition::new(AttackKind::Scratch, 4, 0.95)
            .with_effect(StatusEffectKind::Poison, 0.3),
    ];

    /// Status effects shipped with the engine.
    pub static ref DEFAULT_STATUS_EFFECTS: Vec<StatusEffectDefinition> = vec![
        StatusEffectDefinition::new(StatusEffectKind::Dazed, -0.5, 30, 0),
        StatusEffectDefinition::new(StatusEffectKind::Blind, -0.95, 10, 0),
        StatusEffectDefinition::new(StatusEffectKind::Poison, -5.0, 30, 3),
        StatusEffectDefinition::new(StatusEffectKind::Bleed, -2.0, 60, 5).with_stacking(3, 0.6),
    ];

    /// Enemy templates shipped with the engine.
    pub static ref DEFAULT_ENEMIES: Vec<EnemyDefinition> = vec![
        EnemyDefinition::new(EnemyKind::Zombie, 50, 1.5),
        EnemyDefinition::new(EnemyKind::Mutant, 75, 1.1),
        EnemyDefinition::new(EnemyKind::Beast, 25, 2.0),
    ];
}

// ============================================================================
// Catalog
// ============================================================================

/// A definition that can live in a [`Catalog`].
pub trait CatalogEntry: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    type Key: Copy + Ord + fmt::Display + Serialize + DeserializeOwned + Send + Sync + 'static;

    /// Storage key the table is persisted under.
    const STORAGE_NAME: &'static str;

    /// Noun used in lookup errors.
    const LABEL: &'static str;

    fn key(&self) -> Self::Key;

    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

impl CatalogEntry for AttackDefinition {
    type Key = AttackKind;
    const STORAGE_NAME: &'static str = "attacks";
    const LABEL: &'static str = "attack";

    fn key(&self) -> AttackKind {
        self.kind
    }
}

impl CatalogEntry for StatusEffectDefinition {
    type Key = StatusEffectKind;
    const STORAGE_NAME: &'static str = "status_effects";
    const LABEL: &'static str = "status effect";

    fn key(&self) -> StatusEffectKind {
        self.kind
    }

    fn validate(&self) -> Result<()> {
        if self.kind.is_damage_over_time() && self.interval <= 0 {
            return Err(CombatError::invalid_state(format!(
                "periodic effect {} must have a positive interval, got {}",
                self.kind, self.interval
            )));
        }
        if self.duration < 0 {
            return Err(CombatError::invalid_state(format!(
                "effect {} has negative duration {}",
                self.kind, self.duration
            )));
        }
        Ok(())
    }
}

impl CatalogEntry for EnemyDefinition {
    type Key = EnemyKind;
    const STORAGE_NAME: &'static str = "enemies";
    const LABEL: &'static str = "enemy type";

    fn key(&self) -> EnemyKind {
        self.kind
    }
}

type Table<D> = BTreeMap<<D as CatalogEntry>::Key, D>;

/// Read-mostly registry of definitions keyed by kind.
pub struct Catalog<D: CatalogEntry> {
    table: RwLock<Arc<Table<D>>>,
}

impl<D: CatalogEntry> Catalog<D> {
    pub fn new() -> Self {
        Self {
            table: RwLock::new(Arc::new(BTreeMap::new())),
        }
    }

    /// Build a catalog from definitions, validating each one.
    pub fn from_definitions(definitions: impl IntoIterator<Item = D>) -> Result<Self> {
        let catalog = Self::new();
        catalog.replace_all(definitions)?;
        Ok(catalog)
    }

    /// Look up a definition by kind.
    pub fn get(&self, key: D::Key) -> Result<D> {
        self.snapshot()
            .get(&key)
            .cloned()
            .ok_or_else(|| CombatError::not_found(D::LABEL, key))
    }

    /// The current table. Later reloads do not affect a taken snapshot.
    pub fn snapshot(&self) -> Arc<Table<D>> {
        // Writers only ever swap a finished table in, so a poisoned lock
        // still guards a consistent value.
        let guard = self.table.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    pub fn keys(&self) -> Vec<D::Key> {
        self.snapshot().keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Replace the whole table atomically.
    ///
    /// Every definition is validated first; on error the current table is
    /// left untouched. Later duplicates of a key win.
    pub fn replace_all(&self, definitions: impl IntoIterator<Item = D>) -> Result<()> {
        let table = Self::build_table(definitions)?;
        self.swap(table);
        Ok(())
    }

    fn build_table(definitions: impl IntoIterator<Item = D>) -> Result<Table<D>> {
        let mut table = BTreeMap::new();
        for definition in definitions {
            definition.validate()?;
            table.insert(definition.key(), definition);
        }
        Ok(table)
    }

    fn swap(&self, table: Table<D>) {
        let mut guard = self.table.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(table);
    }

    /// Serialize the table as a JSON object keyed by kind.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        let bytes = serde_json::to_vec_pretty(self.snapshot().as_ref()).map_err(PersistError::from)?;
        Ok(bytes)
    }

    /// Decode and validate a stored table without installing it.
    fn decode(bytes: &[u8]) -> Result<Table<D>> {
        let stored: BTreeMap<D::Key, D> =
            serde_json::from_slice(bytes).map_err(PersistError::from)?;
        for (key, definition) in &stored {
            if *key != definition.key() {
                return Err(CombatError::validation(format!(
                    "{} catalog entry stored under {key} describes {}",
                    D::STORAGE_NAME,
                    definition.key()
                )));
            }
        }
        Self::build_table(stored.into_values())
    }
}

impl<D: CatalogEntry> Default for Catalog<D> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Catalog set
// ============================================================================

/// The three catalogs the combat core reads from.
#[derive(Default)]
pub struct Catalogs {
    pub attacks: Catalog<AttackDefinition>,
    pub status_effects: Catalog<StatusEffectDefinition>,
    pub enemies: Catalog<EnemyDefinition>,
}

impl Catalogs {
    /// Catalogs with no entries.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Catalogs seeded with the built-in tables.
    pub fn with_defaults() -> Self {
        let catalogs = Self::empty();
        catalogs.attacks.swap(table_of(DEFAULT_ATTACKS.iter().cloned()));
        catalogs
            .status_effects
            .swap(table_of(DEFAULT_STATUS_EFFECTS.iter().cloned()));
        catalogs.enemies.swap(table_of(DEFAULT_ENEMIES.iter().cloned()));
        catalogs
    }

    /// Load every catalog from storage, seeding and saving the built-in
    /// table for any catalog that has never been stored.
    pub async fn bootstrap(store: &dyn Persistence) -> Result<Self> {
        let catalogs = Self::with_defaults();
        load_or_seed(&catalogs.attacks, store).await?;
        load_or_seed(&catalogs.status_effects, store).await?;
        load_or_seed(&catalogs.enemies, store).await?;
        Ok(catalogs)
    }

    /// Re-read all stored catalogs and swap them in.
    ///
    /// All three tables are decoded and validated before any is installed,
    /// so a bad table leaves every catalog as it was. Catalogs missing from
    /// storage keep their current contents.
    pub async fn reload(&self, store: &dyn Persistence) -> Result<()> {
        let attacks = fetch::<AttackDefinition>(store).await?;
        let status_effects = fetch::<StatusEffectDefinition>(store).await?;
        let enemies = fetch::<EnemyDefinition>(store).await?;

        if let Some(table) = attacks {
            self.attacks.swap(table);
        }
        if let Some(table) = status_effects {
            self.status_effects.swap(table);
        }
        if let Some(table) = enemies {
            self.enemies.swap(table);
        }
        tracing::info!(
            attacks = self.attacks.len(),
            status_effects = self.status_effects.len(),
            enemies = self.enemies.len(),
            "catalogs reloaded"
        );
        Ok(())
    }

    /// Write every catalog to storage.
    pub async fn save(&self, store: &dyn Persistence) -> Result<()> {
        store
            .save_catalog(AttackDefinition::STORAGE_NAME, &self.attacks.to_json()?)
            .await?;
        store
            .save_catalog(
                StatusEffectDefinition::STORAGE_NAME,
                &self.status_effects.to_json()?,
            )
            .await?;
        store
            .save_catalog(EnemyDefinition::STORAGE_NAME, &self.enemies.to_json()?)
            .await?;
        Ok(())
    }
}

fn table_of<D: CatalogEntry>(definitions: impl IntoIterator<Item = D>) -> Table<D> {
    definitions.into_iter().map(|d| (d.key(), d)).collect()
}

async fn fetch<D: CatalogEntry>(store: &dyn Persistence) -> Result<Option<Table<D>>> {
    match store.load_catalog(D::STORAGE_NAME).await? {
        Some(bytes) => Catalog::<D>::decode(&bytes).map(Some),
        None => Ok(None),
    }
}

async fn load_or_seed<D: CatalogEntry>(catalog: &Catalog<D>, store: &dyn Persistence) -> Result<()> {
    match fetch::<D>(store).await? {
        Some(table) => {
            tracing::debug!(catalog = D::STORAGE_NAME, entries = table.len(), "loaded catalog");
            catalog.swap(table);
        }
        None => {
            tracing::info!(catalog = D::STORAGE_NAME, "no stored catalog, saving defaults");
            store
                .save_catalog(D::STORAGE_NAME, &catalog.to_json()?)
                .await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::MemoryStore;

    #[test]
    fn test_default_tables_validate() {
        assert!(Catalog::from_definitions(DEFAULT_ATTACKS.iter().cloned()).is_ok());
        assert!(Catalog::from_definitions(DEFAULT_STATUS_EFFECTS.iter().cloned()).is_ok());
        assert!(Catalog::from_definitions(DEFAULT_ENEMIES.iter().cloned()).is_ok());
    }

    #[test]
    fn test_defaults_cover_every_attack() {
        let catalogs = Catalogs::with_defaults();
        for kind in AttackKind::all() {
            assert_eq!(catalogs.attacks.get(kind).unwrap().kind, kind);
        }
        let jab = catalogs.attacks.get(AttackKind::Jab).unwrap();
        assert_eq!(jab.damage, 2);
        assert_eq!(jab.base_hit_chance, 0.95);
        assert_eq!(jab.on_hit_effects[0].kind, StatusEffectKind::Dazed);
    }

    #[test]
    fn test_get_missing_entry() {
        let catalogs = Catalogs::empty();
        let err = catalogs.attacks.get(AttackKind::Kick).unwrap_err();
        assert!(matches!(err, CombatError::NotFound { what: "attack", .. }));
    }

    #[test]
    fn test_zero_interval_dot_rejected() {
        let catalogs = Catalogs::with_defaults();
        let bad = vec![StatusEffectDefinition::new(StatusEffectKind::Poison, -5.0, 30, 0)];

        let err = catalogs.status_effects.replace_all(bad).unwrap_err();
        assert!(matches!(err, CombatError::InvalidState(_)));
        // Previous table survives the failed swap.
        assert_eq!(catalogs.status_effects.len(), 4);
        assert_eq!(
            catalogs.status_effects.get(StatusEffectKind::Poison).unwrap().interval,
            3
        );
    }

    #[test]
    fn test_non_periodic_effect_may_have_zero_interval() {
        let catalog = Catalog::from_definitions(vec![StatusEffectDefinition::new(
            StatusEffectKind::Blind,
            -0.95,
            10,
            0,
        )]);
        assert!(catalog.is_ok());
    }

    #[test]
    fn test_replace_all_swaps_whole_table() {
        let catalogs = Catalogs::with_defaults();
        let old = catalogs.enemies.snapshot();

        catalogs
            .enemies
            .replace_all(vec![EnemyDefinition::new(EnemyKind::Beast, 40, 3.0)])
            .unwrap();

        assert_eq!(catalogs.enemies.keys(), vec![EnemyKind::Beast]);
        assert_eq!(catalogs.enemies.get(EnemyKind::Beast).unwrap().base_health, 40);
        // Snapshots taken before the swap are unaffected.
        assert_eq!(old.len(), 3);
    }

    #[test]
    fn test_attack_kind_from_str() {
        assert_eq!("Jab".parse::<AttackKind>().unwrap(), AttackKind::Jab);
        assert_eq!(" headbutt ".parse::<AttackKind>().unwrap(), AttackKind::Headbutt);
        assert!(matches!(
            "roundhouse".parse::<AttackKind>(),
            Err(CombatError::NotFound { what: "attack", .. })
        ));
    }

    #[test]
    fn test_effect_categories() {
        assert!(StatusEffectKind::Dazed.affects_hit_chance());
        assert!(StatusEffectKind::Blind.affects_hit_chance());
        assert!(StatusEffectKind::Poison.is_damage_over_time());
        assert!(StatusEffectKind::Bleed.is_damage_over_time());
    }

    #[test]
    fn test_json_uses_wire_names() {
        let catalogs = Catalogs::with_defaults();
        let json: serde_json::Value =
            serde_json::from_slice(&catalogs.status_effects.to_json().unwrap()).unwrap();
        assert_eq!(json["bleed"]["type"], "bleed");
        assert_eq!(json["bleed"]["stack"]["max"], 3);
        assert_eq!(json["poison"]["interval"], 3);
    }

    #[tokio::test]
    async fn test_bootstrap_seeds_empty_store() {
        let store = MemoryStore::new();
        let catalogs = Catalogs::bootstrap(&store).await.unwrap();

        assert_eq!(catalogs.enemies.len(), 3);
        for name in ["attacks", "status_effects", "enemies"] {
            assert!(store.load_catalog(name).await.unwrap().is_some(), "{name} not saved");
        }
    }

    #[tokio::test]
    async fn test_bootstrap_prefers_stored_tables() {
        let store = MemoryStore::new();
        let stored = Catalog::from_definitions(vec![EnemyDefinition::new(EnemyKind::Mutant, 90, 1.0)])
            .unwrap();
        store
            .save_catalog("enemies", &stored.to_json().unwrap())
            .await
            .unwrap();

        let catalogs = Catalogs::bootstrap(&store).await.unwrap();
        assert_eq!(catalogs.enemies.keys(), vec![EnemyKind::Mutant]);
        assert_eq!(catalogs.enemies.get(EnemyKind::Mutant).unwrap().base_health, 90);
        assert_eq!(catalogs.attacks.len(), 7);
    }

    #[tokio::test]
    async fn test_reload_is_all_or_nothing() {
        let store = MemoryStore::new();
        let catalogs = Catalogs::bootstrap(&store).await.unwrap();

        let enemies = Catalog::from_definitions(vec![EnemyDefinition::new(EnemyKind::Zombie, 10, 1.0)])
            .unwrap();
        store
            .save_catalog("enemies", &enemies.to_json().unwrap())
            .await
            .unwrap();
        store
            .save_catalog(
                "status_effects",
                br#"{"poison": {"type": "poison", "modifier": -5, "duration": 30, "interval": 0}}"#,
            )
            .await
            .unwrap();

        let err = catalogs.reload(&store).await.unwrap_err();
        assert!(matches!(err, CombatError::InvalidState(_)));
        assert_eq!(catalogs.enemies.len(), 3);
        assert_eq!(catalogs.status_effects.len(), 4);
    }

    #[tokio::test]
    async fn test_reload_rejects_mismatched_key() {
        let store = MemoryStore::new();
        let catalogs = Catalogs::bootstrap(&store).await.unwrap();
        store
            .save_catalog(
                "enemies",
                br#"{"zombie": {"type": "beast", "health": 25, "attack_modifier": 2.0}}"#,
            )
            .await
            .unwrap();

        let err = catalogs.reload(&store).await.unwrap_err();
        assert!(matches!(err, CombatError::Validation(_)));
    }

    #[tokio::test]
    async fn test_reload_rejects_unknown_kind() {
        let store = MemoryStore::new();
        let catalogs = Catalogs::bootstrap(&store).await.unwrap();
        store
            .save_catalog(
                "enemies",
                br#"{"": {"type": "", "health": 25, "attack_modifier": 2.0}}"#,
            )
            .await
            .unwrap();

        let err = catalogs.reload(&store).await.unwrap_err();
        assert!(matches!(err, CombatError::Persistence(_)));
        assert_eq!(catalogs.enemies.len(), 3);
    }
}
