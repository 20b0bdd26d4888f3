//! Digitizer repository.

use tracing::info;

use super::{load_records, save_records, Persisted, RepoError, RepoResult};
use crate::models::Digitizer;
use crate::store::{Collection, RecordStore, RemoteSync};
use crate::validation::validate_digitizer;

/// Operators allowed to use the system.
pub struct DigitizerRepository<'a> {
    store: &'a dyn RecordStore,
}

impl<'a> DigitizerRepository<'a> {
    pub fn new(store: &'a dyn RecordStore) -> Self {
        Self { store }
    }

    /// Every digitizer. An empty collection is seeded with the default administrator.
    pub fn find(&self) -> RepoResult<Vec<Digitizer>> {
        let digitizers: Vec<Digitizer> = load_records(self.store, Collection::Digitizers)?;
        if !digitizers.is_empty() {
            return Ok(digitizers);
        }

        let seed = vec![Digitizer::default_admin()];
        info!("seeding default administrator");
        save_records(self.store, Collection::Digitizers, &seed)?;
        Ok(seed)
    }

    /// Get a digitizer by id.
    pub fn get_by_id(&self, id: &str) -> RepoResult<Option<Digitizer>> {
        Ok(self.find()?.into_iter().find(|d| d.id == id))
    }

    /// Get a digitizer by login email (exact, case-sensitive).
    pub fn find_by_email(&self, email: &str) -> RepoResult<Option<Digitizer>> {
        Ok(self.find()?.into_iter().find(|d| d.email == email))
    }

    /// Insert or replace a digitizer by id.
    pub fn save(&self, digitizer: Digitizer) -> RepoResult<RemoteSync> {
        validate_digitizer(&digitizer)?;

        let mut all = self.find()?;
        match all.iter().position(|d| d.id == digitizer.id) {
            Some(index) => all[index] = digitizer,
            None => all.push(digitizer),
        }
        save_records(self.store, Collection::Digitizers, &all)
    }

    /// Create a new digitizer account. The email must not be registered yet.
    pub fn register(&self, name: String, email: String) -> RepoResult<Persisted<Digitizer>> {
        if self.find_by_email(&email)?.is_some() {
            return Err(RepoError::Conflict(format!(
                "email already registered: {}",
                email
            )));
        }

        let digitizer = Digitizer::new(name, email);
        let remote = self.save(digitizer.clone())?;
        Ok(Persisted {
            record: digitizer,
            remote,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::validation::ValidationError;

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn test_seed_once() {
        let db = setup_db();
        let repo = DigitizerRepository::new(&db);

        let first = repo.find().unwrap();
        let second = repo.find().unwrap();

        assert_eq!(first, vec![Digitizer::default_admin()]);
        assert_eq!(second, first);
    }

    #[test]
    fn test_save_upserts_by_id() {
        let db = setup_db();
        let repo = DigitizerRepository::new(&db);

        let mut joana = Digitizer::new("Joana".into(), "joana@upa.gov.br".into());
        repo.save(joana.clone()).unwrap();

        joana.name = "Joana Prado".into();
        repo.save(joana.clone()).unwrap();

        let all = repo.find().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(repo.get_by_id(&joana.id).unwrap(), Some(joana));
    }

    #[test]
    fn test_email_lookup_is_case_sensitive() {
        let db = setup_db();
        let repo = DigitizerRepository::new(&db);

        assert!(repo.find_by_email("admin@upa.gov.br").unwrap().is_some());
        assert!(repo.find_by_email("ADMIN@upa.gov.br").unwrap().is_none());
    }

    #[test]
    fn test_register_rejects_duplicate_email() {
        let db = setup_db();
        let repo = DigitizerRepository::new(&db);

        let created = repo
            .register("Carlos".into(), "carlos@upa.gov.br".into())
            .unwrap();
        assert_eq!(created.record.name, "Carlos");

        let result = repo.register("Outro".into(), "carlos@upa.gov.br".into());
        assert!(matches!(result, Err(RepoError::Conflict(_))));
    }

    #[test]
    fn test_save_rejects_blank_name() {
        let db = setup_db();
        let repo = DigitizerRepository::new(&db);

        let result = repo.save(Digitizer::new(" ".into(), "x@upa.gov.br".into()));
        assert!(matches!(
            result,
            Err(RepoError::Validation(ValidationError::BlankField("name")))
        ));
    }
}
