use std::path::Path;
use std::sync::Arc;

use lms_core::model::Catalog;
use storage::repository::Storage;

use crate::app_state::AppController;
use crate::auth_service::AuthService;
use crate::catalog::{bundled_catalog, load_catalog_file};
use crate::error::AppServicesError;
use crate::progress_service::ProgressService;
use crate::quiz_service::QuizService;
use crate::Clock;

/// Assembles app-facing services over one storage backend and one catalog.
#[derive(Clone)]
pub struct AppServices {
    catalog: Arc<Catalog>,
    auth: Arc<AuthService>,
    progress: Arc<ProgressService>,
    quizzes: Arc<QuizService>,
    controller: Arc<AppController>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// `catalog_path` selects a catalog file; `None` uses the bundled catalog.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or catalog loading fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        catalog_path: Option<&Path>,
    ) -> Result<Self, AppServicesError> {
        let catalog = match catalog_path {
            Some(path) => load_catalog_file(path)?,
            None => bundled_catalog()?,
        };
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::assemble(storage, clock, catalog))
    }

    /// Build services over process-local storage.
    #[must_use]
    pub fn in_memory(clock: Clock, catalog: Catalog) -> Self {
        Self::assemble(Storage::in_memory(), clock, catalog)
    }

    fn assemble(storage: Storage, clock: Clock, catalog: Catalog) -> Self {
        let catalog = Arc::new(catalog);
        let auth = Arc::new(AuthService::new(clock, storage.users.clone()));
        let progress = ProgressService::new(Arc::clone(&catalog), storage.progress.clone());
        let quizzes = QuizService::new(Arc::clone(&catalog), storage.progress);
        let controller = Arc::new(AppController::new(progress.clone(), quizzes.clone()));

        Self {
            catalog,
            auth,
            progress: Arc::new(progress),
            quizzes: Arc::new(quizzes),
            controller,
        }
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<Catalog> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn auth(&self) -> Arc<AuthService> {
        Arc::clone(&self.auth)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn quizzes(&self) -> Arc<QuizService> {
        Arc::clone(&self.quizzes)
    }

    #[must_use]
    pub fn controller(&self) -> Arc<AppController> {
        Arc::clone(&self.controller)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lms_core::time::fixed_now;

    #[tokio::test]
    async fn services_share_one_store() {
        let services = AppServices::in_memory(Clock::fixed(fixed_now()), bundled_catalog().unwrap());
        let user = services
            .auth()
            .register("Ada", "ada@example.com", "secret1")
            .await
            .unwrap();
        let course = "web-foundations".parse().unwrap();

        services.progress().skip_to_end(user.id(), &course).await.unwrap();
        assert!(services.quizzes().start(user.id(), &course, 2).await.is_ok());
    }

    #[tokio::test]
    async fn missing_catalog_file_fails_bootstrap() {
        let err = AppServices::new_sqlite(
            "sqlite::memory:",
            Clock::default(),
            Some(Path::new("/nonexistent/catalog.json")),
        )
        .await
        .err()
        .unwrap();
        assert!(matches!(err, AppServicesError::Catalog(_)));
    }
}
