//! Retry-failed command implementation
//!
//! Puts failed geocoding results back in the pending pool so the next
//! geocoding pass tries them again. Subjects that already used up
//! `geocoding.max_attempts` stay failed.

use crate::adapters::store::SubjectStore;
use crate::config::load_config;
use clap::Args;

/// Arguments for the retry-failed command
#[derive(Args, Debug)]
pub struct RetryFailedArgs {
    /// Override geocoding.max_attempts for this reset
    #[arg(long)]
    pub max_attempts: Option<u32>,
}

impl RetryFailedArgs {
    /// Execute the retry-failed command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Failed to load configuration: {e}");
                return Ok(2);
            }
        };

        let max_attempts = self.max_attempts.unwrap_or(config.geocoding.max_attempts);
        let store = match SubjectStore::open(&config.store.path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Failed to open store: {e}");
                return Ok(5);
            }
        };

        let reset = store.reset_failed_geocodes(max_attempts)?;
        tracing::info!(reset, max_attempts, "Reset failed geocodes to pending");

        println!("🔁 {reset} failed subject(s) reset to pending (attempt cap {max_attempts})");
        println!("   Run 'prvotkar geocode' to process them.");
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EntityType, GeocodeStatus, GeocodeUpdate, RegistrationId, Subject};
    use chrono::Utc;
    use std::path::Path;

    fn id(raw: &str) -> RegistrationId {
        RegistrationId::new(raw).unwrap()
    }

    /// Store where subject 1 failed twice and subject 2 three times
    fn seed_failures(path: &Path) {
        let store = SubjectStore::open(path).unwrap();
        store
            .upsert_subjects(
                &[
                    Subject::new(id("1"), EntityType::Svj),
                    Subject::new(id("2"), EntityType::Bd),
                ],
                Utc::now(),
            )
            .unwrap();
        let both = [GeocodeUpdate::failed(id("1")), GeocodeUpdate::failed(id("2"))];

        store.apply_geocodes(&both, Utc::now()).unwrap();
        store.reset_failed_geocodes(10).unwrap();
        store
            .apply_geocodes(&[GeocodeUpdate::failed(id("2"))], Utc::now())
            .unwrap();
        store.reset_failed_geocodes(10).unwrap();
        store.apply_geocodes(&both, Utc::now()).unwrap();

        assert_eq!(store.get(&id("1")).unwrap().unwrap().geocode_attempts, 2);
        assert_eq!(store.get(&id("2")).unwrap().unwrap().geocode_attempts, 3);
    }

    #[tokio::test]
    async fn test_reset_honours_attempt_cap_from_config_and_flag() {
        let dir = tempfile::TempDir::new().unwrap();
        let db_path = dir.path().join("replica.db");
        let config_path = dir.path().join("prvotkar.toml");
        std::fs::write(
            &config_path,
            format!(
                "[store]\npath = \"{}\"\n\n[geocoding]\nmax_attempts = 4\n",
                db_path.display()
            ),
        )
        .unwrap();
        seed_failures(&db_path);
        let config_path = config_path.to_str().unwrap();

        let capped = RetryFailedArgs {
            max_attempts: Some(3),
        };
        assert_eq!(capped.execute(config_path).await.unwrap(), 0);
        {
            let store = SubjectStore::open(&db_path).unwrap();
            assert_eq!(
                store.get(&id("1")).unwrap().unwrap().geocode_status,
                GeocodeStatus::Pending
            );
            assert_eq!(
                store.get(&id("2")).unwrap().unwrap().geocode_status,
                GeocodeStatus::Failed
            );
        }

        let from_config = RetryFailedArgs { max_attempts: None };
        assert_eq!(from_config.execute(config_path).await.unwrap(), 0);

        let store = SubjectStore::open(&db_path).unwrap();
        let stats = store.stats().unwrap();
        assert_eq!(stats.geocode_pending, 2);
        assert_eq!(stats.geocode_failed, 0);
        let first = store.get(&id("1")).unwrap().unwrap();
        assert_eq!(first.geocode_status, GeocodeStatus::Pending);
        assert_eq!(first.coordinates, None);
    }

    #[tokio::test]
    async fn test_missing_config_is_config_error() {
        let args = RetryFailedArgs { max_attempts: None };
        assert_eq!(args.execute("/nonexistent/prvotkar.toml").await.unwrap(), 2);
    }
}
