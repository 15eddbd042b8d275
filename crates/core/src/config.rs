//! On-disk configuration document.
//!
//! The document is written by the deployment tooling and is read-only at runtime:
//!
//! ```json
//! {
//!   "shell": "bash",
//!   "cloudNameTemplate": "gg-$GAME",
//!   "run": { "commands": ["wine \"$EXE\""] },
//!   "games": {
//!     "mc": {
//!       "run": { "commands": ["echo start"] },
//!       "backup": { "cloudCommitCommands": ["git add -A", "git commit -m save || true"] }
//!     }
//!   }
//! }
//! ```

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::collections::btree_map::{BTreeMap, Entry};
use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/goodgame/config.json";
pub const DEFAULT_CLOUD_NAME_TEMPLATE: &str = "gg-$GAME";

/// Placeholder replaced by the game name in `cloudNameTemplate`.
pub const GAME_PLACEHOLDER: &str = "$GAME";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConfigDocument {
    /// Process-wide default interpreter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shell: Option<String>,
    /// Template for the `$NAME` variable exported to every command.
    #[serde(default = "default_cloud_name_template")]
    pub cloud_name_template: String,
    /// Run commands for games that do not list their own.
    #[serde(default)]
    pub run: RunSection,
    #[serde(default, deserialize_with = "unique_games")]
    pub games: BTreeMap<String, GameEntry>,
}

impl Default for ConfigDocument {
    fn default() -> Self {
        Self {
            shell: None,
            cloud_name_template: default_cloud_name_template(),
            run: RunSection::default(),
            games: BTreeMap::new(),
        }
    }
}

impl ConfigDocument {
    pub fn cloud_name(&self, game: &str) -> String {
        self.cloud_name_template.replace(GAME_PLACEHOLDER, game)
    }
}

fn default_cloud_name_template() -> String {
    DEFAULT_CLOUD_NAME_TEMPLATE.to_string()
}

/// Deserializes the `games` map, rejecting a name that appears twice.
fn unique_games<'de, D>(deserializer: D) -> Result<BTreeMap<String, GameEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    struct UniqueGames;

    impl<'de> Visitor<'de> for UniqueGames {
        type Value = BTreeMap<String, GameEntry>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map from game names to game entries")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut games = BTreeMap::new();
            while let Some(name) = map.next_key::<String>()? {
                match games.entry(name) {
                    Entry::Occupied(entry) => {
                        return Err(de::Error::custom(format!(
                            "duplicate game {:?}",
                            entry.key()
                        )));
                    }
                    Entry::Vacant(entry) => {
                        entry.insert(map.next_value::<GameEntry>()?);
                    }
                }
            }
            Ok(games)
        }
    }

    deserializer.deserialize_map(UniqueGames)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GameEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shell: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub save_location: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executable: Option<PathBuf>,
    /// Overrides the document-wide run commands when present, even if empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run: Option<RunSection>,
    #[serde(default)]
    pub backup: BackupSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunSection {
    #[serde(default)]
    pub commands: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct BackupSection {
    pub cloud_init_commands: Vec<String>,
    pub cloud_commit_commands: Vec<String>,
    pub cloud_push_commands: Vec<String>,
}
