use crate::types::{normalize, PlayerKey, RegisteredPlayer, RegistryFile, RegistryLookupError};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{info, warn};

/// Player Registry - maps stat-feed names to priced players
///
/// Holds each player's base price and the set of names the feed may use
/// for them. Lookups are case-insensitive on both name and team.
pub struct PlayerRegistry {
    /// Registered players by canonical key
    players: HashMap<PlayerKey, RegisteredPlayer>,

    /// (normalized name, normalized team) -> canonical key, covers identities and aliases
    names: HashMap<(String, String), PlayerKey>,

    /// Aliases claimed by more than one player on a team
    ambiguous: HashSet<(String, String)>,
}

impl PlayerRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self { players: HashMap::new(), names: HashMap::new(), ambiguous: HashSet::new() }
    }

    /// Build a registry from already-parsed player records
    pub fn from_players(players: Vec<RegisteredPlayer>) -> Self {
        let mut registry = Self::new();
        registry.register_all(players);
        registry
    }

    /// Load player records from a JSON file
    pub async fn load_from_file<P: AsRef<Path>>(&mut self, file_path: P) -> anyhow::Result<()> {
        info!("Loading player registry from: {:?}", file_path.as_ref());

        let json_content = tokio::fs::read_to_string(&file_path).await?;
        let file: RegistryFile = serde_json::from_str(&json_content)?;

        info!("Loaded {} players from file", file.players.len());
        self.register_all(file.players);
        info!("Registry holds {} players", self.players.len());
        Ok(())
    }

    /// Replace the registry contents with `players`
    fn register_all(&mut self, players: Vec<RegisteredPlayer>) {
        self.players.clear();
        self.names.clear();
        self.ambiguous.clear();

        for player in players {
            let key = player.key();
            if self.players.contains_key(&key) {
                warn!("Duplicate registration for {}, keeping the later record", key);
            }
            self.players.insert(key, player);
        }

        // Identities first so an alias can never shadow a real player name.
        for key in self.players.keys() {
            let slot = (key.identity_norm().to_string(), key.team_norm().to_string());
            self.names.insert(slot, key.clone());
        }

        let mut claims: HashMap<(String, String), Vec<PlayerKey>> = HashMap::new();
        for (key, player) in &self.players {
            for alias in &player.aliases {
                let slot = (normalize(alias), key.team_norm().to_string());
                if slot.0.is_empty() || self.names.contains_key(&slot) {
                    continue;
                }
                let owners = claims.entry(slot).or_default();
                if !owners.contains(key) {
                    owners.push(key.clone());
                }
            }
        }

        for (slot, owners) in claims {
            if owners.len() > 1 {
                warn!(
                    "Alias '{}' on team '{}' is claimed by {} players, ignoring it",
                    slot.0,
                    slot.1,
                    owners.len()
                );
                self.ambiguous.insert(slot);
            } else if let Some(owner) = owners.into_iter().next() {
                self.names.insert(slot, owner);
            }
        }
    }

    /// Get a registered player by key
    pub fn get(&self, key: &PlayerKey) -> Result<&RegisteredPlayer, RegistryLookupError> {
        self.players.get(key).ok_or_else(|| RegistryLookupError::PlayerNotFound {
            name: key.identity().to_string(),
            team: key.team().to_string(),
        })
    }

    /// Resolve a feed name (identity or alias) and team to the canonical key
    pub fn resolve(&self, name: &str, team: &str) -> Result<&PlayerKey, RegistryLookupError> {
        let slot = (normalize(name), normalize(team));
        if self.ambiguous.contains(&slot) {
            return Err(RegistryLookupError::AmbiguousAlias {
                alias: name.to_string(),
                team: team.to_string(),
            });
        }
        self.names.get(&slot).ok_or_else(|| RegistryLookupError::PlayerNotFound {
            name: name.to_string(),
            team: team.to_string(),
        })
    }

    /// Normalized names accepted for `key`: its identity plus every unambiguous alias
    pub fn aliases_for(&self, key: &PlayerKey) -> Vec<String> {
        let mut names = vec![key.identity_norm().to_string()];
        if let Some(player) = self.players.get(key) {
            for alias in &player.aliases {
                let slot = (normalize(alias), key.team_norm().to_string());
                if self.names.get(&slot) == Some(key) && !names.contains(&slot.0) {
                    names.push(slot.0);
                }
            }
        }
        names
    }

    /// Get all registered players
    pub fn players(&self) -> Vec<&RegisteredPlayer> {
        let mut players: Vec<&RegisteredPlayer> = self.players.values().collect();
        players.sort_by(|a, b| a.key().identity_norm().cmp(b.key().identity_norm()));
        players
    }

    /// Number of registered players
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

impl Default for PlayerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
