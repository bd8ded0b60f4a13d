use database::SqliteStore;
use types::{Profile, Role};

use crate::config::ExplorerConfig;
use crate::error::ExplorerError;

/// Resolves the player named on the command line, registering a profile on
/// first use. Usernames listed under `admins` in the config are promoted.
pub async fn sign_in(
    store: &SqliteStore,
    username: Option<&str>,
    config: &ExplorerConfig,
) -> Result<Option<Profile>, ExplorerError> {
    let Some(username) = username.or(config.default_user.as_deref()) else {
        return Ok(None);
    };
    let role = if config.is_admin(username.trim()) {
        Role::Admin
    } else {
        Role::Player
    };

    let mut profile = match store.profile_by_username(username).await? {
        Some(profile) => profile,
        None => {
            log::info!("First sign-in for {username}, creating a profile");
            store.register_profile(username, role).await?
        }
    };
    if role == Role::Admin && !profile.is_admin() {
        store.set_role(profile.id, Role::Admin).await?;
        profile.role = Role::Admin;
    }
    Ok(Some(profile))
}
