//! Battle.net profile API adapter. Implements GameDataGateway via reqwest.
//!
//! Payloads are decoded into the typed domain shapes right here at the
//! boundary; malformed nested fields collapse into their defensive
//! `Option`/empty defaults rather than surfacing decode errors for
//! every unexpected field the API grows.

use crate::domain::payloads::{
    AchievementsSummary, KeystoneProfile, PvpSummary, QuestLog, RaidEncounters,
};
use crate::domain::{Character, DomainError};
use crate::ports::GameDataGateway;
use serde::Deserialize;
use tracing::debug;

const PROFILE_SUMMARY_PATH: &str = "/profile/user/wow";

/// Battle.net API gateway.
///
/// `base_url` is region-specific (e.g. https://us.api.blizzard.com) and
/// `namespace` is the matching profile namespace (e.g. profile-us).
pub struct BattlenetGateway {
    client: reqwest::Client,
    base_url: String,
    namespace: String,
}

impl BattlenetGateway {
    pub fn new(base_url: String, namespace: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            namespace,
        }
    }

    /// Character endpoint path; the API requires lowercase names.
    fn character_path(realm_slug: &str, character_name: &str, suffix: &str) -> String {
        format!(
            "/profile/wow/character/{}/{}{}",
            realm_slug,
            character_name.to_lowercase(),
            suffix
        )
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        credential: &str,
    ) -> Result<T, DomainError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "Battle.net request");
        let response = self
            .client
            .get(&url)
            .bearer_auth(credential)
            .header("Battlenet-Namespace", &self.namespace)
            .send()
            .await
            .map_err(|e| DomainError::Gateway(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "unknown".to_string());
            return Err(DomainError::Gateway(format!(
                "HTTP {}: {}",
                status,
                api_error_detail(&body)
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| DomainError::Decode(e.to_string()))
    }
}

/// Extract the `detail`/`type` field from a Blizzard error body, falling
/// back to the raw body when it is not the documented shape.
fn api_error_detail(body: &str) -> String {
    #[derive(Deserialize)]
    struct ApiError {
        detail: Option<String>,
        #[serde(rename = "type")]
        kind: Option<String>,
    }
    match serde_json::from_str::<ApiError>(body) {
        Ok(err) => err
            .detail
            .or(err.kind)
            .unwrap_or_else(|| body.to_string()),
        Err(_) => body.to_string(),
    }
}

// Account profile summary: characters are nested under wow_accounts.
#[derive(Debug, Default, Deserialize)]
struct ProfileSummary {
    #[serde(default)]
    wow_accounts: Vec<WowAccount>,
}

#[derive(Debug, Default, Deserialize)]
struct WowAccount {
    #[serde(default)]
    characters: Vec<ApiCharacter>,
}

#[derive(Debug, Deserialize)]
struct ApiCharacter {
    id: u64,
    name: String,
    realm: RealmRef,
    #[serde(default)]
    playable_race: Option<NamedRef>,
    #[serde(default)]
    playable_class: Option<NamedRef>,
    #[serde(default)]
    level: Option<u32>,
    #[serde(default)]
    faction: Option<FactionRef>,
}

#[derive(Debug, Deserialize)]
struct RealmRef {
    slug: String,
}

#[derive(Debug, Default, Deserialize)]
struct NamedRef {
    #[serde(default)]
    name: LocalizedField,
}

#[derive(Debug, Default, Deserialize)]
struct LocalizedField {
    #[serde(rename = "en_US", default)]
    en_us: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FactionRef {
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

impl From<ApiCharacter> for Character {
    fn from(api: ApiCharacter) -> Self {
        let unknown = || "Unknown".to_string();
        Character {
            id: api.id,
            name: api.name,
            realm_slug: api.realm.slug,
            race: api
                .playable_race
                .and_then(|r| r.name.en_us)
                .unwrap_or_else(unknown),
            class_name: api
                .playable_class
                .and_then(|c| c.name.en_us)
                .unwrap_or_else(unknown),
            level: api.level.unwrap_or(0),
            faction: api.faction.and_then(|f| f.kind).unwrap_or_else(unknown),
        }
    }
}

#[async_trait::async_trait]
impl GameDataGateway for BattlenetGateway {
    async fn fetch_characters(&self, credential: &str) -> Result<Vec<Character>, DomainError> {
        let summary: ProfileSummary = self.get_json(PROFILE_SUMMARY_PATH, credential).await?;
        // The profile summary nests characters per linked account; the
        // first account holds the region's roster.
        let characters: Vec<Character> = summary
            .wow_accounts
            .into_iter()
            .next()
            .map(|account| account.characters.into_iter().map(Character::from).collect())
            .unwrap_or_default();
        debug!(count = characters.len(), "characters fetched");
        Ok(characters)
    }

    async fn fetch_keystone_profile(
        &self,
        realm_slug: &str,
        character_name: &str,
        credential: &str,
    ) -> Result<KeystoneProfile, DomainError> {
        let path = Self::character_path(realm_slug, character_name, "/mythic-keystone-profile");
        self.get_json(&path, credential).await
    }

    async fn fetch_raid_encounters(
        &self,
        realm_slug: &str,
        character_name: &str,
        credential: &str,
    ) -> Result<RaidEncounters, DomainError> {
        let path = Self::character_path(realm_slug, character_name, "/encounters/raids");
        self.get_json(&path, credential).await
    }

    async fn fetch_quest_log(
        &self,
        realm_slug: &str,
        character_name: &str,
        credential: &str,
    ) -> Result<QuestLog, DomainError> {
        let path = Self::character_path(realm_slug, character_name, "/quests");
        self.get_json(&path, credential).await
    }

    async fn fetch_pvp_summary(
        &self,
        realm_slug: &str,
        character_name: &str,
        credential: &str,
    ) -> Result<PvpSummary, DomainError> {
        let path = Self::character_path(realm_slug, character_name, "/pvp-summary");
        self.get_json(&path, credential).await
    }

    async fn fetch_achievements(
        &self,
        realm_slug: &str,
        character_name: &str,
        credential: &str,
    ) -> Result<AchievementsSummary, DomainError> {
        let path = Self::character_path(realm_slug, character_name, "/achievements");
        self.get_json(&path, credential).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn character_paths_are_lowercased() {
        assert_eq!(
            BattlenetGateway::character_path("stormrage", "Thrall", "/quests"),
            "/profile/wow/character/stormrage/thrall/quests"
        );
    }

    #[test]
    fn api_error_detail_prefers_detail_field() {
        let body = r#"{"code": 404, "type": "BLZWEBAPI00000404", "detail": "Not Found"}"#;
        assert_eq!(api_error_detail(body), "Not Found");
        assert_eq!(api_error_detail("plain text"), "plain text");
    }

    #[test]
    fn profile_summary_maps_to_flat_characters() {
        let json = r#"{
            "wow_accounts": [{
                "characters": [{
                    "id": 123,
                    "name": "Thrall",
                    "realm": {"slug": "stormrage"},
                    "playable_race": {"name": {"en_US": "Orc"}},
                    "playable_class": {"name": {"en_US": "Shaman"}},
                    "level": 80,
                    "faction": {"type": "HORDE"}
                }]
            }]
        }"#;
        let summary: ProfileSummary = serde_json::from_str(json).unwrap();
        let account = summary.wow_accounts.into_iter().next().unwrap();
        let character: Character = account.characters.into_iter().next().unwrap().into();
        assert_eq!(character.name, "Thrall");
        assert_eq!(character.realm_slug, "stormrage");
        assert_eq!(character.race, "Orc");
        assert_eq!(character.faction, "HORDE");
    }

    #[test]
    fn missing_optional_character_fields_fall_back_to_unknown() {
        let json = r#"{"id": 5, "name": "Mystery", "realm": {"slug": "area-52"}}"#;
        let api: ApiCharacter = serde_json::from_str(json).unwrap();
        let character: Character = api.into();
        assert_eq!(character.race, "Unknown");
        assert_eq!(character.class_name, "Unknown");
        assert_eq!(character.faction, "Unknown");
        assert_eq!(character.level, 0);
    }
}
