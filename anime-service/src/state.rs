//! Application state management

use std::sync::Arc;

use crate::{
    config::Config,
    error::{Error, Result},
    middleware::AccessControl,
    repository::AnimeRepository,
    security::{AccessPolicy, Authenticator, InMemoryUserDirectory, PasswordEncoder, UserDirectory},
    service::AnimeService,
};

/// Application state shared across handlers
pub struct AppState<R> {
    config: Arc<Config>,
    animes: AnimeService<R>,
    access: AccessControl,
}

impl<R> Clone for AppState<R> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            animes: self.animes.clone(),
            access: self.access.clone(),
        }
    }
}

impl<R: AnimeRepository> AppState<R> {
    pub fn builder() -> AppStateBuilder<R> {
        AppStateBuilder::new()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn animes(&self) -> &AnimeService<R> {
        &self.animes
    }

    pub fn access(&self) -> &AccessControl {
        &self.access
    }
}

/// Builder for [`AppState`]
///
/// Only the repository is required. Users default to the configured
/// accounts; access is always governed by [`AccessPolicy::anime_defaults`].
///
/// ```rust,ignore
/// let state = AppState::builder()
///     .config(config)
///     .repository(InMemoryAnimeRepository::new())
///     .build()?;
/// ```
pub struct AppStateBuilder<R> {
    config: Option<Config>,
    repository: Option<Arc<R>>,
    users: Option<Arc<dyn UserDirectory>>,
}

impl<R: AnimeRepository> AppStateBuilder<R> {
    pub fn new() -> Self {
        Self {
            config: None,
            repository: None,
            users: None,
        }
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    pub fn repository(mut self, repository: R) -> Self {
        self.repository = Some(Arc::new(repository));
        self
    }

    /// Replace the user directory built from `security.users`
    pub fn users(mut self, users: Arc<dyn UserDirectory>) -> Self {
        self.users = Some(users);
        self
    }

    pub fn build(self) -> Result<AppState<R>> {
        let config = self.config.unwrap_or_default();
        let repository = self
            .repository
            .ok_or_else(|| Error::Internal("AppState requires a repository".to_string()))?;
        let users = match self.users {
            Some(users) => users,
            None => Arc::new(InMemoryUserDirectory::new(config.security.users.clone())),
        };
        let policy = AccessPolicy::anime_defaults()?;
        let encoder = PasswordEncoder::new(&config.security.password)?;
        let access = AccessControl::new(
            policy,
            Authenticator::new(users, encoder),
            config.security.realm.clone(),
        );

        Ok(AppState {
            config: Arc::new(config),
            animes: AnimeService::new(repository),
            access,
        })
    }
}

impl<R: AnimeRepository> Default for AppStateBuilder<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryAnimeRepository;

    #[test]
    fn test_build_requires_repository() {
        let result = AppState::<InMemoryAnimeRepository>::builder().build();
        assert!(matches!(result, Err(Error::Internal(_))));
    }

    #[test]
    fn test_build_with_defaults() {
        let state = AppState::builder()
            .repository(InMemoryAnimeRepository::new())
            .build()
            .unwrap();

        assert_eq!(state.config().service.name, "anime-service");
        assert_eq!(
            state.access().policy().rules().len(),
            AccessPolicy::anime_defaults().unwrap().rules().len()
        );
    }

    #[test]
    fn test_invalid_password_params_fail_build() {
        let mut config = Config::default();
        config.security.password.memory_cost_kib = 1;

        let result = AppState::builder()
            .config(config)
            .repository(InMemoryAnimeRepository::new())
            .build();
        assert!(result.is_err());
    }
}
