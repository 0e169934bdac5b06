//! Typed accessors over the raw preference store. Everything the rest of the
//! app persists locally goes through these three keys; nothing else may touch
//! them directly.

use anyhow::Result;

use crate::models::{AppSettings, UserProfile};
use crate::storage::traits::PreferenceStore;

pub const KEY_FAVORITES: &str = "favorites";
pub const KEY_USER_PROFILE: &str = "userProfile";
pub const KEY_APP_SETTINGS: &str = "appSettings";

/// Favorite establishment ids; never persisted, reads as empty
pub async fn get_favorites(store: &dyn PreferenceStore) -> Result<Vec<String>> {
    match store.get(KEY_FAVORITES).await? {
        Some(value) => Ok(serde_json::from_value(value)?),
        None => Ok(Vec::new()),
    }
}

/// Add an id to the favorites set. Adding an id that is already present
/// leaves the stored list unchanged (uniqueness invariant).
pub async fn add_to_favorites(store: &dyn PreferenceStore, establishment_id: &str) -> Result<()> {
    let mut favorites = get_favorites(store).await?;
    if !favorites.iter().any(|id| id == establishment_id) {
        favorites.push(establishment_id.to_string());
        store
            .set(KEY_FAVORITES, serde_json::to_value(&favorites)?)
            .await?;
    }
    Ok(())
}

/// Remove an id from the favorites set; removing a non-member is a no-op
pub async fn remove_from_favorites(
    store: &dyn PreferenceStore,
    establishment_id: &str,
) -> Result<()> {
    let favorites = get_favorites(store).await?;
    let updated: Vec<String> = favorites
        .into_iter()
        .filter(|id| id != establishment_id)
        .collect();
    store
        .set(KEY_FAVORITES, serde_json::to_value(&updated)?)
        .await?;
    Ok(())
}

pub async fn get_user_profile(store: &dyn PreferenceStore) -> Result<Option<UserProfile>> {
    match store.get(KEY_USER_PROFILE).await? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

pub async fn save_user_profile(store: &dyn PreferenceStore, profile: &UserProfile) -> Result<()> {
    store
        .set(KEY_USER_PROFILE, serde_json::to_value(profile)?)
        .await
}

/// App settings; reads as the documented default when never persisted
pub async fn get_app_settings(store: &dyn PreferenceStore) -> Result<AppSettings> {
    match store.get(KEY_APP_SETTINGS).await? {
        Some(value) => Ok(serde_json::from_value(value)?),
        None => Ok(AppSettings::default()),
    }
}

pub async fn save_app_settings(store: &dyn PreferenceStore, settings: &AppSettings) -> Result<()> {
    store
        .set(KEY_APP_SETTINGS, serde_json::to_value(settings)?)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Language, DEFAULT_THEME_COLOR};
    use crate::storage::MemoryPreferenceStore;

    #[tokio::test]
    async fn favorites_round_trip_stays_unique() {
        let store = MemoryPreferenceStore::new();

        add_to_favorites(&store, "e1").await.unwrap();
        add_to_favorites(&store, "e1").await.unwrap();

        let favorites = get_favorites(&store).await.unwrap();
        assert_eq!(favorites, vec!["e1".to_string()]);
    }

    #[tokio::test]
    async fn removing_a_non_member_is_a_noop() {
        let store = MemoryPreferenceStore::new();
        add_to_favorites(&store, "e1").await.unwrap();

        remove_from_favorites(&store, "e2").await.unwrap();

        let favorites = get_favorites(&store).await.unwrap();
        assert_eq!(favorites, vec!["e1".to_string()]);
    }

    #[tokio::test]
    async fn settings_default_when_never_persisted() {
        let store = MemoryPreferenceStore::new();
        let settings = get_app_settings(&store).await.unwrap();
        assert_eq!(settings.language, Language::En);
        assert_eq!(settings.theme_color, DEFAULT_THEME_COLOR);
    }

    #[tokio::test]
    async fn profile_round_trip() {
        let store = MemoryPreferenceStore::new();
        assert!(get_user_profile(&store).await.unwrap().is_none());

        let profile = UserProfile {
            first_name: "Olena".to_string(),
            last_name: "Kovalenko".to_string(),
            age: Some(29),
            city: "Kyiv".to_string(),
            photo: None,
            phone: Some("+380501234567".to_string()),
            email: None,
        };
        save_user_profile(&store, &profile).await.unwrap();

        assert_eq!(get_user_profile(&store).await.unwrap(), Some(profile));
    }
}
