use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identity of a priced player: name plus team, compared case-insensitively
///
/// The display strings are kept as first seen so output reads naturally,
/// but equality and hashing only look at the normalized form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "KeyParts", into = "KeyParts")]
pub struct PlayerKey {
    identity: String,
    team: String,
    identity_norm: String,
    team_norm: String,
}

#[derive(Serialize, Deserialize)]
struct KeyParts {
    identity: String,
    team: String,
}

impl From<KeyParts> for PlayerKey {
    fn from(parts: KeyParts) -> Self {
        PlayerKey::new(parts.identity, parts.team)
    }
}

impl From<PlayerKey> for KeyParts {
    fn from(key: PlayerKey) -> Self {
        KeyParts { identity: key.identity, team: key.team }
    }
}

impl PlayerKey {
    pub fn new(identity: impl Into<String>, team: impl Into<String>) -> Self {
        let identity = identity.into().trim().to_string();
        let team = team.into().trim().to_string();
        let identity_norm = normalize(&identity);
        let team_norm = normalize(&team);
        Self { identity, team, identity_norm, team_norm }
    }

    /// Player name as supplied
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Team as supplied
    pub fn team(&self) -> &str {
        &self.team
    }

    /// Lowercased, trimmed player name
    pub fn identity_norm(&self) -> &str {
        &self.identity_norm
    }

    /// Lowercased, trimmed team
    pub fn team_norm(&self) -> &str {
        &self.team_norm
    }

    /// True when `team` names the same team as this key
    pub fn same_team(&self, team: &str) -> bool {
        normalize(team) == self.team_norm
    }
}

impl PartialEq for PlayerKey {
    fn eq(&self, other: &Self) -> bool {
        self.identity_norm == other.identity_norm && self.team_norm == other.team_norm
    }
}

impl Eq for PlayerKey {}

impl Hash for PlayerKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity_norm.hash(state);
        self.team_norm.hash(state);
    }
}

impl fmt::Display for PlayerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.identity, self.team)
    }
}

/// Normalize a name or team string for comparison
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// A player as recorded in the external player registry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisteredPlayer {
    /// Canonical player name (e.g., "Marcus Bontempelli")
    pub identity: String,

    /// Team name or abbreviation (e.g., "WB")
    pub team: String,

    /// Price before any performance in the timeline is applied
    pub base_price: i64,

    /// Other names the stat feed uses for this player
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl RegisteredPlayer {
    pub fn new(identity: impl Into<String>, team: impl Into<String>, base_price: i64) -> Self {
        Self { identity: identity.into(), team: team.into(), base_price, aliases: Vec::new() }
    }

    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    pub fn key(&self) -> PlayerKey {
        PlayerKey::new(self.identity.clone(), self.team.clone())
    }
}

/// On-disk registry layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryFile {
    pub players: Vec<RegisteredPlayer>,
}

/// Errors that can occur during player lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryLookupError {
    /// No registered player or alias matches the name/team pair
    PlayerNotFound { name: String, team: String },

    /// The alias is claimed by more than one player on the same team
    AmbiguousAlias { alias: String, team: String },
}

impl fmt::Display for RegistryLookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryLookupError::PlayerNotFound { name, team } => {
                write!(f, "Player '{name}' ({team}) not found in registry")
            }
            RegistryLookupError::AmbiguousAlias { alias, team } => {
                write!(f, "Alias '{alias}' ({team}) matches more than one player")
            }
        }
    }
}

impl std::error::Error for RegistryLookupError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_key_equality_ignores_case_and_whitespace() {
        let a = PlayerKey::new("Marcus Bontempelli", "WB");
        let b = PlayerKey::new("  marcus BONTEMPELLI ", "wb");
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn test_key_keeps_display_form() {
        let key = PlayerKey::new(" Marcus Bontempelli ", "WB");
        assert_eq!(key.identity(), "Marcus Bontempelli");
        assert_eq!(key.identity_norm(), "marcus bontempelli");
        assert_eq!(key.to_string(), "Marcus Bontempelli (WB)");
    }

    #[test]
    fn test_key_different_team_is_different_player() {
        let a = PlayerKey::new("Josh Kelly", "GWS");
        let b = PlayerKey::new("Josh Kelly", "NM");
        assert_ne!(a, b);
        assert!(a.same_team("gws"));
        assert!(!a.same_team("NM"));
    }

    #[test]
    fn test_key_serde_roundtrip_renormalizes() {
        let key: PlayerKey =
            serde_json::from_str(r#"{"identity":"Nick Daicos","team":"COLL"}"#).unwrap();
        assert_eq!(key.identity_norm(), "nick daicos");
        assert_eq!(key.team_norm(), "coll");
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, r#"{"identity":"Nick Daicos","team":"COLL"}"#);
    }

    #[test]
    fn test_registered_player_aliases_default_empty() {
        let player: RegisteredPlayer = serde_json::from_str(
            r#"{"identity":"Nick Daicos","team":"COLL","base_price":100000}"#,
        )
        .unwrap();
        assert!(player.aliases.is_empty());
        assert_eq!(player.base_price, 100_000);
    }

    #[test]
    fn test_lookup_error_display() {
        let err = RegistryLookupError::PlayerNotFound {
            name: "Nobody".to_string(),
            team: "XX".to_string(),
        };
        assert_eq!(err.to_string(), "Player 'Nobody' (XX) not found in registry");
    }
}
