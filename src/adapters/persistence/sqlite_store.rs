//! SQLite-backed store via libsql. Implements UserStore and ProgressStore.
//!
//! One database file (tracker.db) in the given base directory. The
//! `users` table is shared with the account-linking layer, which writes
//! OAuth tokens; this core only reads it. `character_progress` holds the
//! current-week snapshot per character and is fully replaced on every
//! refresh (overwrite semantics, not an append log).

use crate::domain::{ActivityStatus, Character, CharacterProgress, DomainError, UserAccount};
use crate::ports::{ProgressStore, UserStore};
use chrono::{DateTime, Utc};
use libsql::{params, Database};
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

const USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    battle_tag TEXT NOT NULL DEFAULT '',
    access_token TEXT,
    updated_at INTEGER NOT NULL
)"#;

const PROGRESS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS character_progress (
    character_id INTEGER PRIMARY KEY,
    character_name TEXT NOT NULL,
    realm TEXT NOT NULL,
    race TEXT NOT NULL DEFAULT '',
    class_name TEXT NOT NULL DEFAULT '',
    level INTEGER NOT NULL DEFAULT 0,
    faction TEXT NOT NULL DEFAULT '',
    activities_json TEXT NOT NULL,
    last_updated INTEGER NOT NULL
)"#;

/// Stored OAuth token blob; only access_token is read here.
#[derive(Debug, Deserialize)]
struct StoredToken {
    #[serde(default)]
    access_token: Option<String>,
}

/// SQLite store. Safe to share via Arc; connections are per-call.
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    /// Connect to (or create) the database and ensure the schema exists.
    /// Sets WAL mode and synchronous=NORMAL for concurrent read/write.
    pub async fn connect(base_dir: impl AsRef<Path>) -> Result<Self, DomainError> {
        let base = base_dir.as_ref();
        std::fs::create_dir_all(base).map_err(|e| DomainError::Store(e.to_string()))?;
        let db_path = base.join("tracker.db");
        let path_str = db_path.to_string_lossy();
        let db = libsql::Builder::new_local(path_str.as_ref())
            .build()
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?;
        let conn = db.connect().map_err(|e| DomainError::Store(e.to_string()))?;

        // PRAGMA returns a row (the new value); consume it — execute
        // fails when rows come back.
        let mut wal_rows = conn
            .query("PRAGMA journal_mode=WAL", ())
            .await
            .map_err(|e| DomainError::Store(format!("WAL pragma failed: {}", e)))?;
        while wal_rows
            .next()
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?
            .is_some()
        {}
        let mut sync_rows = conn
            .query("PRAGMA synchronous=NORMAL", ())
            .await
            .map_err(|e| DomainError::Store(format!("synchronous pragma failed: {}", e)))?;
        while sync_rows
            .next()
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?
            .is_some()
        {}

        conn.execute(USERS_TABLE, ())
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?;
        conn.execute(PROGRESS_TABLE, ())
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?;

        info!(path = %db_path.display(), "SQLite store connected (WAL)");

        Ok(Self { db })
    }

    /// Register or update a user with a token blob (JSON with an
    /// `access_token` field). The auth layer normally owns this write.
    pub async fn upsert_user(
        &self,
        id: &str,
        battle_tag: &str,
        token_json: Option<&str>,
    ) -> Result<(), DomainError> {
        let conn = self
            .db
            .connect()
            .map_err(|e| DomainError::Store(e.to_string()))?;
        conn.execute(
            r#"
            INSERT INTO users (id, battle_tag, access_token, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (id) DO UPDATE SET
                battle_tag = excluded.battle_tag,
                access_token = excluded.access_token,
                updated_at = excluded.updated_at
            "#,
            params![id, battle_tag, token_json, Utc::now().timestamp()],
        )
        .await
        .map_err(|e| DomainError::Store(e.to_string()))?;
        Ok(())
    }

    /// The stored snapshot for one character, if any.
    pub async fn load_progress(
        &self,
        character_id: u64,
    ) -> Result<Option<CharacterProgress>, DomainError> {
        let conn = self
            .db
            .connect()
            .map_err(|e| DomainError::Store(e.to_string()))?;
        let mut rows = conn
            .query(
                r#"
                SELECT character_id, character_name, realm, race, class_name,
                       level, faction, activities_json, last_updated
                FROM character_progress
                WHERE character_id = ?1
                "#,
                params![character_id as i64],
            )
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?;
        let Some(row) = rows
            .next()
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?
        else {
            return Ok(None);
        };
        let character_id: i64 = row.get(0).map_err(|e| DomainError::Store(e.to_string()))?;
        let activities_json: String = row.get(7).map_err(|e| DomainError::Store(e.to_string()))?;
        let activities: Vec<ActivityStatus> = serde_json::from_str(&activities_json)
            .map_err(|e| DomainError::Store(format!("activities decode: {}", e)))?;
        let last_updated: i64 = row.get(8).map_err(|e| DomainError::Store(e.to_string()))?;
        Ok(Some(CharacterProgress {
            character_id: character_id as u64,
            character_name: row.get::<String>(1).unwrap_or_default(),
            realm: row.get::<String>(2).unwrap_or_default(),
            race: row.get::<String>(3).unwrap_or_default(),
            class_name: row.get::<String>(4).unwrap_or_default(),
            level: row.get::<i64>(5).unwrap_or_default() as u32,
            faction: row.get::<String>(6).unwrap_or_default(),
            activities,
            last_updated: DateTime::<Utc>::from_timestamp(last_updated, 0)
                .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
        }))
    }

    fn credential_from_token(token_json: Option<&str>) -> String {
        let Some(raw) = token_json else {
            return String::new();
        };
        match serde_json::from_str::<StoredToken>(raw) {
            Ok(token) => token.access_token.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "stored token is not valid JSON");
                String::new()
            }
        }
    }
}

#[async_trait::async_trait]
impl UserStore for SqliteStore {
    async fn fetch_users(&self) -> Result<Vec<UserAccount>, DomainError> {
        let conn = self
            .db
            .connect()
            .map_err(|e| DomainError::Store(e.to_string()))?;
        let mut rows = conn
            .query("SELECT id, battle_tag, access_token FROM users", ())
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?;
        let mut users = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?
        {
            let id: String = row.get(0).map_err(|e| DomainError::Store(e.to_string()))?;
            let battle_tag: String = row.get::<String>(1).unwrap_or_default();
            let token_json: Option<String> = row.get(2).ok();
            users.push(UserAccount {
                id,
                battle_tag,
                credential: Self::credential_from_token(token_json.as_deref()),
            });
        }
        Ok(users)
    }
}

#[async_trait::async_trait]
impl ProgressStore for SqliteStore {
    async fn persist_results(
        &self,
        character: &Character,
        results: &[ActivityStatus],
        updated_at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let activities_json =
            serde_json::to_string(results).map_err(|e| DomainError::Store(e.to_string()))?;
        let conn = self
            .db
            .connect()
            .map_err(|e| DomainError::Store(e.to_string()))?;
        conn.execute(
            r#"
            INSERT INTO character_progress
                (character_id, character_name, realm, race, class_name,
                 level, faction, activities_json, last_updated)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT (character_id) DO UPDATE SET
                character_name = excluded.character_name,
                realm = excluded.realm,
                race = excluded.race,
                class_name = excluded.class_name,
                level = excluded.level,
                faction = excluded.faction,
                activities_json = excluded.activities_json,
                last_updated = excluded.last_updated
            "#,
            params![
                character.id as i64,
                character.name.as_str(),
                character.realm_slug.as_str(),
                character.race.as_str(),
                character.class_name.as_str(),
                character.level as i64,
                character.faction.as_str(),
                activities_json,
                updated_at.timestamp()
            ],
        )
        .await
        .map_err(|e| DomainError::Store(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ActivityCategory;
    use std::path::PathBuf;

    fn temp_base(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("wow-sync-{}-{}", name, std::process::id()))
    }

    fn sample_status() -> ActivityStatus {
        ActivityStatus {
            id: "1_mythic_plus_weekly".to_string(),
            name: "Mythic+ Weekly".to_string(),
            category: ActivityCategory::MythicPlus,
            description: "Complete a Mythic+ dungeon".to_string(),
            completed: true,
            progress: 1,
            max_progress: 1,
            error: None,
            detail: None,
        }
    }

    #[tokio::test]
    async fn users_round_trip_with_token_extraction() {
        let base = temp_base("users");
        let store = SqliteStore::connect(&base).await.unwrap();

        store
            .upsert_user("u1", "Player#1", Some(r#"{"access_token": "abc123"}"#))
            .await
            .unwrap();
        store.upsert_user("u2", "Player#2", None).await.unwrap();
        store
            .upsert_user("u3", "Player#3", Some("not json"))
            .await
            .unwrap();

        let mut users = store.fetch_users().await.unwrap();
        users.sort_by(|a, b| a.id.cmp(&b.id));
        assert_eq!(users.len(), 3);
        assert_eq!(users[0].credential, "abc123");
        // Missing or unreadable tokens become empty credentials, which
        // the orchestrator skips.
        assert_eq!(users[1].credential, "");
        assert_eq!(users[2].credential, "");

        let _ = std::fs::remove_dir_all(&base);
    }

    #[tokio::test]
    async fn persist_replaces_the_previous_snapshot() {
        let base = temp_base("progress");
        let store = SqliteStore::connect(&base).await.unwrap();
        let character = Character {
            id: 7,
            name: "Thrall".to_string(),
            realm_slug: "stormrage".to_string(),
            race: "Orc".to_string(),
            class_name: "Shaman".to_string(),
            level: 80,
            faction: "HORDE".to_string(),
        };
        let now = Utc::now();

        store
            .persist_results(&character, &[sample_status()], now)
            .await
            .unwrap();
        let mut second = sample_status();
        second.completed = false;
        second.progress = 0;
        store
            .persist_results(&character, &[second.clone()], now)
            .await
            .unwrap();

        let progress = store.load_progress(7).await.unwrap().unwrap();
        assert_eq!(progress.character_name, "Thrall");
        assert_eq!(progress.activities, vec![second]);

        let _ = std::fs::remove_dir_all(&base);
    }
}
