//! PlayerKill - Kill Event Record
//!
//! TigerStyle: Immutable identity, additive enrichment, explicit absence.
//!
//! A kill is identified by (victim, weapon, date). Display names are
//! enrichment attached at capture time and never take part in equality.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::Serialize;
use uuid::Uuid;

use super::error::{StorageError, StorageResult};
use crate::constants::{PLAYER_NAME_BYTES_MAX, WEAPON_BYTES_MAX};

// =============================================================================
// DateHolder
// =============================================================================

/// Anything stamped with an epoch-millisecond date.
pub trait DateHolder {
    /// Epoch millisecond of the event.
    fn date(&self) -> i64;
}

// =============================================================================
// PlayerKill
// =============================================================================

/// A single player kill, as seen from the killer's side.
///
/// The killer's id is not part of the record; it is the owner the record is
/// stored under (see [`KillStore::store_kill`](super::KillStore::store_kill)).
#[derive(Clone, Serialize)]
pub struct PlayerKill {
    victim: Uuid,
    weapon: String,
    date: i64,
    victim_name: Option<String>,
    killer_name: Option<String>,
}

impl PlayerKill {
    /// Create a kill with only the identifying fields.
    ///
    /// # Panics
    /// Panics if `weapon` is empty or exceeds `WEAPON_BYTES_MAX`.
    #[must_use]
    pub fn new(victim: Uuid, weapon: impl Into<String>, date: i64) -> Self {
        let weapon = weapon.into();

        // Preconditions
        assert!(!weapon.is_empty(), "weapon cannot be empty");
        assert!(
            weapon.len() <= WEAPON_BYTES_MAX,
            "weapon {} bytes exceeds max {}",
            weapon.len(),
            WEAPON_BYTES_MAX
        );

        Self {
            victim,
            weapon,
            date,
            victim_name: None,
            killer_name: None,
        }
    }

    /// Create a kill enriched with the victim's display name.
    ///
    /// # Panics
    /// Panics on the same conditions as [`PlayerKill::new`], or if the name
    /// exceeds `PLAYER_NAME_BYTES_MAX`.
    #[must_use]
    pub fn with_victim_name(
        victim: Uuid,
        weapon: impl Into<String>,
        date: i64,
        victim_name: impl Into<String>,
    ) -> Self {
        let victim_name = victim_name.into();
        assert_name_len("victim", &victim_name);

        let mut kill = Self::new(victim, weapon, date);
        kill.victim_name = Some(victim_name);
        kill
    }

    /// Create a kill enriched with both display names.
    ///
    /// # Panics
    /// Panics on the same conditions as [`PlayerKill::with_victim_name`], or
    /// if the killer name exceeds `PLAYER_NAME_BYTES_MAX`.
    #[must_use]
    pub fn with_names(
        victim: Uuid,
        weapon: impl Into<String>,
        date: i64,
        victim_name: impl Into<String>,
        killer_name: impl Into<String>,
    ) -> Self {
        let killer_name = killer_name.into();
        assert_name_len("killer", &killer_name);

        let mut kill = Self::with_victim_name(victim, weapon, date, victim_name);
        kill.killer_name = Some(killer_name);

        // Postcondition
        debug_assert!(kill.victim_name.is_some(), "killer name set before victim name");
        kill
    }

    /// Rebuild a kill read back from storage.
    ///
    /// Stored rows may come from another writer or an older schema, so the
    /// constructor limits are checked here and reported instead of asserted.
    /// A killer name without a victim name cannot be produced by the
    /// constructors, so it is dropped here as well.
    ///
    /// # Errors
    /// Returns `StorageError::Internal` if the weapon is empty or a field
    /// exceeds its byte limit.
    pub fn from_stored(
        victim: Uuid,
        weapon: String,
        date: i64,
        victim_name: Option<String>,
        killer_name: Option<String>,
    ) -> StorageResult<Self> {
        if weapon.is_empty() || weapon.len() > WEAPON_BYTES_MAX {
            return Err(StorageError::internal(format!(
                "stored kill of {victim} at {date} has invalid weapon ({} bytes, max {WEAPON_BYTES_MAX})",
                weapon.len()
            )));
        }
        for (role, name) in [("victim", &victim_name), ("killer", &killer_name)] {
            if let Some(name) = name.as_deref().filter(|n| n.len() > PLAYER_NAME_BYTES_MAX) {
                return Err(StorageError::internal(format!(
                    "stored kill of {victim} at {date} has {role} name of {} bytes (max {PLAYER_NAME_BYTES_MAX})",
                    name.len()
                )));
            }
        }

        let kill = match (victim_name, killer_name) {
            (Some(victim_name), Some(killer_name)) => {
                Self::with_names(victim, weapon, date, victim_name, killer_name)
            }
            (Some(victim_name), None) => Self::with_victim_name(victim, weapon, date, victim_name),
            (None, killer_name) => {
                if killer_name.is_some() {
                    tracing::debug!(%victim, date, "dropping killer name stored without victim name");
                }
                Self::new(victim, weapon, date)
            }
        };
        Ok(kill)
    }

    /// Victim's UUID.
    #[must_use]
    pub fn victim(&self) -> Uuid {
        self.victim
    }

    /// Weapon used, for example `DIAMOND_SWORD`.
    #[must_use]
    pub fn weapon(&self) -> &str {
        &self.weapon
    }

    /// Victim's display name, if it was captured.
    #[must_use]
    pub fn victim_name(&self) -> Option<&str> {
        self.victim_name.as_deref()
    }

    /// Killer's display name, if it was captured.
    #[must_use]
    pub fn killer_name(&self) -> Option<&str> {
        self.killer_name.as_deref()
    }

    /// True only when both names are known and equal.
    #[must_use]
    pub fn is_self_kill(&self) -> bool {
        match (self.victim_name(), self.killer_name()) {
            (Some(victim), Some(killer)) => victim == killer,
            _ => false,
        }
    }

    /// Negation of [`PlayerKill::is_self_kill`].
    #[must_use]
    pub fn is_not_self_kill(&self) -> bool {
        !self.is_self_kill()
    }
}

fn assert_name_len(role: &str, name: &str) {
    assert!(
        name.len() <= PLAYER_NAME_BYTES_MAX,
        "{} name {} bytes exceeds max {}",
        role,
        name.len(),
        PLAYER_NAME_BYTES_MAX
    );
}

impl DateHolder for PlayerKill {
    fn date(&self) -> i64 {
        self.date
    }
}

impl PartialEq for PlayerKill {
    fn eq(&self, other: &Self) -> bool {
        self.date == other.date && self.victim == other.victim && self.weapon == other.weapon
    }
}

impl Eq for PlayerKill {}

impl Hash for PlayerKill {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.victim.hash(state);
        self.date.hash(state);
        self.weapon.hash(state);
    }
}

impl fmt::Debug for PlayerKill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayerKill")
            .field("victim", &self.victim)
            .field("date", &self.date)
            .field("weapon", &self.weapon)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
