use housing_lookup::catalog::{CatalogSeed, CatalogStore};
use housing_lookup::config::CatalogConfig;
use housing_lookup::error::AppError;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Seed data from `CATALOG_SEED_DIR` when configured, the built-in catalog otherwise.
pub(crate) fn load_catalog(config: &CatalogConfig) -> Result<CatalogStore, AppError> {
    let store = match &config.seed_dir {
        Some(dir) => {
            let store = CatalogSeed::from_dir(dir)?;
            info!(dir = %dir.display(), "catalog loaded from seed files");
            store
        }
        None => CatalogStore::builtin(),
    };

    info!(
        cities = store.city_count(),
        institutions = store.institution_count(),
        "catalog ready"
    );
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn config(seed_dir: Option<PathBuf>) -> CatalogConfig {
        CatalogConfig {
            api_url: "http://127.0.0.1:3000".to_string(),
            timeout_secs: 10,
            seed_dir,
        }
    }

    #[test]
    fn falls_back_to_builtin_catalog() {
        let store = load_catalog(&config(None)).expect("builtin catalog");
        assert_eq!(store.city_count(), CatalogStore::builtin().city_count());
    }

    #[test]
    fn loads_bundled_seed_directory() {
        let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../data/catalog");
        let store = load_catalog(&config(Some(dir))).expect("seed files parse");

        assert_eq!(store.city_count(), 5);
        let found = store
            .search_institutions("colombo", Some(66001), None)
            .expect("search runs");
        assert_eq!(found[0].city_name, "Pereira");
    }

    #[test]
    fn missing_seed_directory_is_a_catalog_error() {
        let err = load_catalog(&config(Some(PathBuf::from("/nonexistent/seed"))))
            .expect_err("directory is missing");
        assert!(matches!(err, AppError::Catalog(_)));
    }
}
