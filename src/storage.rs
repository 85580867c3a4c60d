//! Snapshot persistence.
//!
//! The ledger is saved as a whole after every mutation, never as a diff. A
//! store only has to hand back the last snapshot it saved, or an empty one if
//! nothing was ever saved.

use crate::customer::Customer;
use crate::error::{StorageError, StorageResult};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// The full persisted state of a ledger.
///
/// Customers, their debts and installments keep their insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub customers: Vec<Customer>,

    /// Next identifier to hand out. Ids are never reused.
    #[serde(default)]
    pub next_id: u64,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.customers.is_empty()
    }

    /// Checks the record invariants a decoded document can still break.
    ///
    /// Customer ids must be unique, as must debt ids within a customer.
    /// Names and descriptions must not be blank, principals and installment
    /// amounts must be positive. Cached paid amounts are not checked here;
    /// the ledger recomputes them on open.
    pub fn validate(&self) -> StorageResult<()> {
        let mut customer_ids = HashSet::new();
        for customer in &self.customers {
            let id = customer.id();
            if !customer_ids.insert(id) {
                return Err(invalid(format!("duplicate customer id {}", id)));
            }
            if customer.name().trim().is_empty() {
                return Err(invalid(format!("customer {} has a blank name", id)));
            }

            let mut debt_ids = HashSet::new();
            for debt in customer.debts() {
                if !debt_ids.insert(debt.id()) {
                    return Err(invalid(format!(
                        "duplicate debt id {} for customer {}",
                        debt.id(),
                        id
                    )));
                }
                if debt.description().trim().is_empty() {
                    return Err(invalid(format!(
                        "debt {} has a blank description",
                        debt.id()
                    )));
                }
                if !debt.principal().is_positive() {
                    return Err(invalid(format!(
                        "debt {} has non-positive principal {}",
                        debt.id(),
                        debt.principal()
                    )));
                }
                let bad_installment = debt
                    .installments()
                    .iter()
                    .find(|i| !i.amount.is_positive());
                if let Some(installment) = bad_installment {
                    return Err(invalid(format!(
                        "debt {} has non-positive installment {}",
                        debt.id(),
                        installment.amount
                    )));
                }
            }
        }
        Ok(())
    }
}

fn invalid(reason: String) -> StorageError {
    StorageError::Invalid(reason)
}

/// Durable storage for ledger snapshots.
pub trait SnapshotStore {
    /// Loads the last saved snapshot.
    ///
    /// Returns an empty snapshot if nothing has been saved yet. Absence is
    /// not an error.
    fn load(&self) -> StorageResult<Snapshot>;

    /// Replaces the stored snapshot.
    fn save(&mut self, snapshot: &Snapshot) -> StorageResult<()>;
}

/// Stores each snapshot as a JSON document named after a storage key,
/// `<dir>/<key>.json`.
///
/// Saves write a temporary file in the same directory and rename it over the
/// previous document, so a failed save leaves the old snapshot intact.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
    key: String,
}

impl JsonFileStore {
    /// Storage key used unless another one is given.
    pub const DEFAULT_KEY: &'static str = "customers";

    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_key(dir, Self::DEFAULT_KEY)
    }

    pub fn with_key(dir: impl Into<PathBuf>, key: impl Into<String>) -> Self {
        JsonFileStore {
            dir: dir.into(),
            key: key.into(),
        }
    }

    /// Path of the JSON document backing this store.
    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", self.key))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl SnapshotStore for JsonFileStore {
    fn load(&self) -> StorageResult<Snapshot> {
        let path = self.path();
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No snapshot at {}, starting empty", path.display());
                return Ok(Snapshot::default());
            }
            Err(e) => return Err(e.into()),
        };

        let snapshot: Snapshot = serde_json::from_reader(BufReader::new(file))?;
        info!(
            "Loaded {} customers from {}",
            snapshot.customers.len(),
            path.display()
        );
        Ok(snapshot)
    }

    fn save(&mut self, snapshot: &Snapshot) -> StorageResult<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path();

        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        serde_json::to_writer_pretty(&mut tmp, snapshot)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| e.error)?;

        debug!(
            "Saved {} customers to {}",
            snapshot.customers.len(),
            path.display()
        );
        Ok(())
    }
}

/// Keeps the snapshot in memory. Used for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshot: Option<Snapshot>,
    save_count: usize,
    reject_saves: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds a snapshot.
    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        MemoryStore {
            snapshot: Some(snapshot),
            ..Self::default()
        }
    }

    /// Makes every following save fail with [`StorageError::Rejected`].
    pub fn reject_saves(&mut self, reject: bool) {
        self.reject_saves = reject;
    }

    /// The last successfully saved snapshot.
    pub fn saved(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.save_count
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> StorageResult<Snapshot> {
        Ok(self.snapshot.clone().unwrap_or_default())
    }

    fn save(&mut self, snapshot: &Snapshot) -> StorageResult<()> {
        if self.reject_saves {
            return Err(StorageError::Rejected(
                "memory store is rejecting writes".to_string(),
            ));
        }

        self.snapshot = Some(snapshot.clone());
        self.save_count += 1;
        Ok(())
    }
}
