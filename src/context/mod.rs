use std::sync::Arc;

use anyhow::Result;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::models::{AppSettings, UserProfile};
use crate::storage::{prefs, PreferenceStore};

#[derive(Debug, Default)]
struct ContextState {
    user_profile: Option<UserProfile>,
    app_settings: AppSettings,
    favorites: Vec<String>,
}

/// Single authoritative holder of cross-screen state: user profile, app
/// settings and the favorites set. Constructed once at startup and handed
/// to every consumer as a cheap clone.
///
/// Every mutation persists through the preference store first and only then
/// updates the in-memory copy, so a failed write never leaves memory ahead
/// of disk.
#[derive(Clone)]
pub struct AppContext {
    store: Arc<dyn PreferenceStore>,
    state: Arc<RwLock<ContextState>>,
}

impl AppContext {
    /// Load all three pieces of state from the store. The reads run
    /// concurrently; a failed read logs a warning and falls back to the
    /// documented default rather than aborting startup.
    pub async fn load(store: Arc<dyn PreferenceStore>) -> Self {
        let (profile, settings, favorites) = tokio::join!(
            prefs::get_user_profile(store.as_ref()),
            prefs::get_app_settings(store.as_ref()),
            prefs::get_favorites(store.as_ref()),
        );

        let user_profile = profile.unwrap_or_else(|err| {
            warn!("Failed to load user profile: {err:#}");
            None
        });
        let app_settings = settings.unwrap_or_else(|err| {
            warn!("Failed to load app settings: {err:#}");
            AppSettings::default()
        });
        let favorites = favorites.unwrap_or_else(|err| {
            warn!("Failed to load favorites: {err:#}");
            Vec::new()
        });

        info!(
            favorites = favorites.len(),
            has_profile = user_profile.is_some(),
            "App context loaded"
        );

        Self {
            store,
            state: Arc::new(RwLock::new(ContextState {
                user_profile,
                app_settings,
                favorites,
            })),
        }
    }

    pub async fn user_profile(&self) -> Option<UserProfile> {
        self.state.read().await.user_profile.clone()
    }

    pub async fn app_settings(&self) -> AppSettings {
        self.state.read().await.app_settings.clone()
    }

    pub async fn favorites(&self) -> Vec<String> {
        self.state.read().await.favorites.clone()
    }

    pub async fn is_favorite(&self, establishment_id: &str) -> bool {
        self.state
            .read()
            .await
            .favorites
            .iter()
            .any(|id| id == establishment_id)
    }

    /// Persist the profile, then reflect it in memory
    pub async fn update_user_profile(&self, profile: UserProfile) -> Result<()> {
        prefs::save_user_profile(self.store.as_ref(), &profile).await?;
        self.state.write().await.user_profile = Some(profile);
        Ok(())
    }

    /// Persist the settings, then reflect them in memory
    pub async fn update_app_settings(&self, settings: AppSettings) -> Result<()> {
        prefs::save_app_settings(self.store.as_ref(), &settings).await?;
        self.state.write().await.app_settings = settings;
        Ok(())
    }

    /// Toggle an establishment in or out of the favorites set.
    ///
    /// The write goes to storage first; memory is then repopulated by
    /// re-reading the full set from storage (read-after-write). Card and
    /// detail views may toggle the same id concurrently; the store's
    /// serialization makes the last completed cycle win, and memory never
    /// diverges from what was persisted. Returns the new membership.
    pub async fn toggle_favorite(&self, establishment_id: &str) -> Result<bool> {
        let currently_favorite = self.is_favorite(establishment_id).await;

        if currently_favorite {
            prefs::remove_from_favorites(self.store.as_ref(), establishment_id).await?;
        } else {
            prefs::add_to_favorites(self.store.as_ref(), establishment_id).await?;
        }

        let favorites = prefs::get_favorites(self.store.as_ref()).await?;
        let now_favorite = favorites.iter().any(|id| id == establishment_id);
        self.state.write().await.favorites = favorites;

        Ok(now_favorite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Language, DEFAULT_THEME_COLOR};
    use crate::storage::MemoryPreferenceStore;

    fn profile(first_name: &str) -> UserProfile {
        UserProfile {
            first_name: first_name.to_string(),
            last_name: "Shevchenko".to_string(),
            age: None,
            city: "Lviv".to_string(),
            photo: None,
            phone: None,
            email: None,
        }
    }

    #[tokio::test]
    async fn load_defaults_on_an_empty_store() {
        let ctx = AppContext::load(Arc::new(MemoryPreferenceStore::new())).await;

        assert!(ctx.user_profile().await.is_none());
        assert!(ctx.favorites().await.is_empty());
        let settings = ctx.app_settings().await;
        assert_eq!(settings.language, Language::En);
        assert_eq!(settings.theme_color, DEFAULT_THEME_COLOR);
    }

    #[tokio::test]
    async fn load_picks_up_previously_persisted_state() {
        let store = Arc::new(MemoryPreferenceStore::new());
        prefs::save_user_profile(store.as_ref(), &profile("Iryna"))
            .await
            .unwrap();
        prefs::add_to_favorites(store.as_ref(), "e7").await.unwrap();

        let ctx = AppContext::load(store).await;
        assert_eq!(ctx.user_profile().await.unwrap().first_name, "Iryna");
        assert!(ctx.is_favorite("e7").await);
    }

    #[tokio::test]
    async fn toggle_adds_then_removes() {
        let ctx = AppContext::load(Arc::new(MemoryPreferenceStore::new())).await;

        assert!(ctx.toggle_favorite("e1").await.unwrap());
        assert_eq!(ctx.favorites().await, vec!["e1".to_string()]);

        assert!(!ctx.toggle_favorite("e1").await.unwrap());
        assert!(ctx.favorites().await.is_empty());
    }

    #[tokio::test]
    async fn toggles_from_two_handles_share_one_truth() {
        let ctx = AppContext::load(Arc::new(MemoryPreferenceStore::new())).await;
        let card_view = ctx.clone();
        let detail_view = ctx.clone();

        card_view.toggle_favorite("e1").await.unwrap();
        detail_view.toggle_favorite("e2").await.unwrap();
        detail_view.toggle_favorite("e1").await.unwrap();

        assert_eq!(ctx.favorites().await, vec!["e2".to_string()]);
    }

    #[tokio::test]
    async fn failed_profile_write_leaves_memory_unchanged() {
        let store = Arc::new(MemoryPreferenceStore::new());
        let ctx = AppContext::load(store.clone()).await;
        ctx.update_user_profile(profile("Olha")).await.unwrap();

        store.set_fail_writes(true);
        let result = ctx.update_user_profile(profile("Someone")).await;

        assert!(result.is_err());
        assert_eq!(ctx.user_profile().await.unwrap().first_name, "Olha");
    }

    #[tokio::test]
    async fn failed_settings_write_leaves_memory_unchanged() {
        let store = Arc::new(MemoryPreferenceStore::new());
        let ctx = AppContext::load(store.clone()).await;

        store.set_fail_writes(true);
        let result = ctx
            .update_app_settings(AppSettings {
                language: Language::Uk,
                theme_color: "#ff0000".to_string(),
            })
            .await;

        assert!(result.is_err());
        assert_eq!(ctx.app_settings().await.language, Language::En);
    }

    #[tokio::test]
    async fn failed_favorite_write_leaves_memory_unchanged() {
        let store = Arc::new(MemoryPreferenceStore::new());
        let ctx = AppContext::load(store.clone()).await;
        ctx.toggle_favorite("e1").await.unwrap();

        store.set_fail_writes(true);
        assert!(ctx.toggle_favorite("e2").await.is_err());
        assert!(ctx.toggle_favorite("e1").await.is_err());

        assert_eq!(ctx.favorites().await, vec!["e1".to_string()]);
    }
}
