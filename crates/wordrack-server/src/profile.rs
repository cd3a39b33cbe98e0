//! User profile store collaborator.
//!
//! The coordination core never touches profiles; this seam exists for the
//! account endpoints that sit next to it. `ProfileStore` is the contract,
//! `MemoryProfileStore` the in-process reference implementation a
//! database-backed store would replace.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use thiserror::Error;

/// Allowed username length, inclusive.
pub const USERNAME_LEN: std::ops::RangeInclusive<usize> = 3..=20;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProfileError {
    #[error("User not found")]
    NotFound,

    #[error("Invalid username length")]
    InvalidUsername,
}

/// A stored user profile, keyed by the identity provider's external ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: u64,
    pub external_id: String,
    pub username: String,
    pub profile_pic: Option<String>,
    pub email: Option<String>,
    pub games_played: u32,
    pub games_won: u32,
    pub games_lost: u32,
}

/// Counters accumulated while playing as a guest.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestStats {
    pub username: Option<String>,
    pub games_played: u32,
    pub games_won: u32,
}

pub trait ProfileStore {
    /// Create-or-update a profile from its external identity.
    fn sync_profile(
        &self,
        external_id: &str,
        username: &str,
        profile_pic: Option<&str>,
        email: Option<&str>,
    ) -> Result<Profile, ProfileError>;

    fn find_by_external_id(&self, external_id: &str) -> Result<Profile, ProfileError>;

    /// Update a username by numeric record ID, falling back to external
    /// ID when `id` is not numeric or matches no record.
    fn update_username(&self, id: &str, username: &str) -> Result<Profile, ProfileError>;

    /// Fold a guest's counters into a permanent account.
    fn migrate_guest_stats(
        &self,
        external_id: &str,
        stats: GuestStats,
    ) -> Result<Profile, ProfileError>;
}

/// In-memory profile store.
pub struct MemoryProfileStore {
    profiles: Mutex<HashMap<String, Profile>>,
    next_id: AtomicU64,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self {
            profiles: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

impl Default for MemoryProfileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileStore for MemoryProfileStore {
    fn sync_profile(
        &self,
        external_id: &str,
        username: &str,
        profile_pic: Option<&str>,
        email: Option<&str>,
    ) -> Result<Profile, ProfileError> {
        let mut profiles = self.profiles.lock().unwrap();

        let profile = profiles
            .entry(external_id.to_string())
            .and_modify(|p| {
                p.username = username.to_string();
                p.profile_pic = profile_pic.map(String::from);
                p.email = email.map(String::from);
            })
            .or_insert_with(|| Profile {
                id: self.next_id.fetch_add(1, Ordering::Relaxed),
                external_id: external_id.to_string(),
                username: username.to_string(),
                profile_pic: profile_pic.map(String::from),
                email: email.map(String::from),
                games_played: 0,
                games_won: 0,
                games_lost: 0,
            });

        Ok(profile.clone())
    }

    fn find_by_external_id(&self, external_id: &str) -> Result<Profile, ProfileError> {
        self.profiles
            .lock()
            .unwrap()
            .get(external_id)
            .cloned()
            .ok_or(ProfileError::NotFound)
    }

    fn update_username(&self, id: &str, username: &str) -> Result<Profile, ProfileError> {
        if !USERNAME_LEN.contains(&username.chars().count()) {
            return Err(ProfileError::InvalidUsername);
        }

        let mut profiles = self.profiles.lock().unwrap();

        // Numeric record ID first, then external ID.
        let numeric_id = id.parse::<u64>().ok();
        let key = profiles
            .iter()
            .find(|(_, p)| Some(p.id) == numeric_id)
            .map(|(external_id, _)| external_id.clone())
            .or_else(|| profiles.contains_key(id).then(|| id.to_string()))
            .ok_or(ProfileError::NotFound)?;

        let profile = profiles.get_mut(&key).ok_or(ProfileError::NotFound)?;
        profile.username = username.to_string();
        Ok(profile.clone())
    }

    fn migrate_guest_stats(
        &self,
        external_id: &str,
        stats: GuestStats,
    ) -> Result<Profile, ProfileError> {
        let mut profiles = self.profiles.lock().unwrap();
        let profile = profiles.get_mut(external_id).ok_or(ProfileError::NotFound)?;

        if let Some(username) = stats.username {
            profile.username = username;
        }
        profile.games_played = stats.games_played;
        profile.games_won = stats.games_won;
        profile.games_lost = stats.games_played.saturating_sub(stats.games_won);

        Ok(profile.clone())
    }
}
