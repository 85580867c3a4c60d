//! The ledger: customers, their debts and installment payments.
//!
//! Every mutation validates its input first, then applies the change in
//! memory, then saves the whole snapshot through the configured store.

use crate::customer::{Customer, CustomerId, CustomerMetadata, CustomerPatch};
use crate::debt::{Debt, DebtId, Installment, NewDebt};
use crate::error::{LedgerError, Result, StorageError, StorageResult};
use crate::money::Money;
use crate::storage::{MemoryStore, Snapshot, SnapshotStore};
use chrono::Utc;
use log::{debug, info, warn};

/// What happens to an in-memory change when saving it fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Durability {
    /// Keep the change in memory and report the storage error.
    #[default]
    BestEffort,

    /// Roll the change back and report the storage error.
    Strict,
}

/// Aggregate figures over the whole ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Totals {
    pub customer_count: usize,
    pub debt_count: usize,
    pub unpaid_debt_count: usize,
    pub total_principal: Money,
    pub total_paid: Money,

    /// Sum of balances of unpaid debts only. Overpaid debts never reduce it.
    pub total_outstanding: Money,
}

/// State captured before a mutation under [`Durability::Strict`].
struct Checkpoint {
    customers: Vec<Customer>,
    next_id: u64,
}

/// The in-memory authority over customers, debts and installments.
///
/// The ledger is the only mutator of its records: accessors hand out shared
/// references, and every change goes through one of the operations below.
///
/// # Identifiers
///
/// Customer and debt ids come from a single counter that is persisted with
/// the snapshot, so an id is never handed out twice.
pub struct Ledger<S: SnapshotStore = MemoryStore> {
    customers: Vec<Customer>,
    next_id: u64,
    store: S,
    durability: Durability,
}

impl Ledger<MemoryStore> {
    /// Creates an empty ledger backed by a [`MemoryStore`].
    pub fn new() -> Self {
        Ledger {
            customers: Vec::new(),
            next_id: 1,
            store: MemoryStore::new(),
            durability: Durability::default(),
        }
    }
}

impl Default for Ledger<MemoryStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: SnapshotStore> Ledger<S> {
    /// Opens a ledger from the store's last snapshot.
    ///
    /// Fails with [`StorageError::Invalid`] if the snapshot breaks a record
    /// invariant, and with [`StorageError::IdsExhausted`] if it leaves no
    /// identifier to allocate.
    pub fn open(store: S) -> Result<Self> {
        let snapshot = store.load()?;
        let ledger = Self::from_snapshot(snapshot, store)?;
        info!("Opened ledger with {} customers", ledger.customers.len());
        Ok(ledger)
    }

    /// Builds a ledger from a snapshot, recomputing every derived field.
    fn from_snapshot(snapshot: Snapshot, store: S) -> StorageResult<Self> {
        snapshot.validate()?;

        let mut customers = snapshot.customers;
        let mut max_id = 0;

        for customer in &mut customers {
            max_id = max_id.max(customer.id().0);
            let customer_id = customer.id();
            for debt in customer.debts_mut() {
                max_id = max_id.max(debt.id().0);
                let stale = debt.recompute().ok_or_else(|| {
                    StorageError::Invalid(format!(
                        "installments of debt {} for customer {} overflow the paid amount",
                        debt.id(),
                        customer_id
                    ))
                })?;
                if stale {
                    warn!(
                        "Snapshot had stale totals for debt {} of customer {}, recomputed",
                        debt.id(),
                        customer_id
                    );
                }
            }
        }

        let first_free = max_id.checked_add(1).ok_or(StorageError::IdsExhausted)?;
        Ok(Ledger {
            customers,
            next_id: snapshot.next_id.max(first_free),
            store,
            durability: Durability::default(),
        })
    }

    /// Sets the durability policy for subsequent mutations.
    pub fn with_durability(mut self, durability: Durability) -> Self {
        self.durability = durability;
        self
    }

    pub fn durability(&self) -> Durability {
        self.durability
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// All customers in insertion order.
    pub fn customers(&self) -> &[Customer] {
        &self.customers
    }

    pub fn customer(&self, id: CustomerId) -> Option<&Customer> {
        self.customers.iter().find(|c| c.id() == id)
    }

    pub fn debt(&self, customer_id: CustomerId, debt_id: DebtId) -> Option<&Debt> {
        self.customer(customer_id)?.debt(debt_id)
    }

    /// Customers whose name, shop name or mobile number contains `query`.
    pub fn find_customers(&self, query: &str) -> Vec<&Customer> {
        self.customers.iter().filter(|c| c.matches(query)).collect()
    }

    /// A copy of the full state, as it would be saved.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            customers: self.customers.clone(),
            next_id: self.next_id,
        }
    }

    pub fn totals(&self) -> Totals {
        let debts = || self.customers.iter().flat_map(|c| c.debts());

        Totals {
            customer_count: self.customers.len(),
            debt_count: debts().count(),
            unpaid_debt_count: debts().filter(|d| !d.is_paid()).count(),
            total_principal: self.customers.iter().map(|c| c.total_principal()).sum(),
            total_paid: self.customers.iter().map(|c| c.total_paid()).sum(),
            total_outstanding: self.customers.iter().map(|c| c.outstanding()).sum(),
        }
    }

    /// Adds a customer with no debts.
    ///
    /// Fails with [`LedgerError::Validation`] if `name` is blank.
    pub fn add_customer(&mut self, name: &str, metadata: CustomerMetadata) -> Result<Customer> {
        let name = required("customer name", name)?;

        let checkpoint = self.checkpoint();
        let id = CustomerId(self.allocate_id()?);
        let customer = Customer::new(id, name, metadata);
        self.customers.push(customer.clone());
        debug!("Added customer {} ({})", id, customer.name());

        self.persist(checkpoint)?;
        Ok(customer)
    }

    /// Overwrites a customer's fields. The id and debts are untouched.
    pub fn update_customer(&mut self, id: CustomerId, patch: CustomerPatch) -> Result<Customer> {
        if let Some(name) = &patch.name {
            required("customer name", name)?;
        }
        let index = self.customer_index(id)?;

        let checkpoint = self.checkpoint();
        let customer = &mut self.customers[index];
        customer.apply(patch);
        let updated = customer.clone();
        debug!("Updated customer {}", id);

        self.persist(checkpoint)?;
        Ok(updated)
    }

    /// Removes a customer together with all their debts and installments.
    ///
    /// Deletion is unconditional; confirming it is the caller's job.
    pub fn delete_customer(&mut self, id: CustomerId) -> Result<()> {
        let index = self.customer_index(id)?;

        let checkpoint = self.checkpoint();
        let removed = self.customers.remove(index);
        debug!(
            "Deleted customer {} with {} debts",
            id,
            removed.debts().len()
        );

        self.persist(checkpoint)
    }

    /// Opens an unpaid debt for a customer, issued today.
    pub fn add_debt(
        &mut self,
        customer_id: CustomerId,
        description: &str,
        principal: Money,
    ) -> Result<Debt> {
        self.add_debt_with(customer_id, NewDebt::new(description, principal))
    }

    /// Opens a debt with an explicit issue date and optional up-front
    /// payment, which becomes the first installment.
    pub fn add_debt_with(&mut self, customer_id: CustomerId, new_debt: NewDebt) -> Result<Debt> {
        let description = required("debt description", &new_debt.description)?;
        positive("principal", new_debt.principal)?;
        let upfront = match new_debt.upfront {
            Some(amount) if amount.is_zero() => None,
            Some(amount) => Some(positive("up-front payment", amount)?),
            None => None,
        };
        let index = self.customer_index(customer_id)?;

        let checkpoint = self.checkpoint();
        let id = DebtId(self.allocate_id()?);
        let date = new_debt.date.unwrap_or_else(|| Utc::now().date_naive());
        let mut debt = Debt::new(id, description, new_debt.principal, date);
        if let Some(amount) = upfront {
            debt.push_installment(Installment {
                amount,
                date: Utc::now(),
            })?;
        }
        self.customers[index].push_debt(debt.clone());
        debug!(
            "Added debt {} of {} for customer {}",
            id,
            debt.principal(),
            customer_id
        );

        self.persist(checkpoint)?;
        Ok(debt)
    }

    /// Records a payment against a debt and returns the updated debt.
    ///
    /// The paid amount and status are recomputed from the whole installment
    /// trail after the payment is appended. Paying more than the balance is
    /// accepted; the debt becomes `Paid` with a negative balance. A payment
    /// that would push the paid amount out of range is rejected with
    /// [`LedgerError::Validation`] and leaves the debt unchanged.
    pub fn record_installment(
        &mut self,
        customer_id: CustomerId,
        debt_id: DebtId,
        amount: Money,
    ) -> Result<Debt> {
        positive("installment amount", amount)?;
        let index = self.customer_index(customer_id)?;

        let checkpoint = self.checkpoint();
        let debt = self.customers[index]
            .debt_mut(debt_id)
            .ok_or(LedgerError::DebtNotFound {
                customer: customer_id,
                debt: debt_id,
            })?;
        let was_paid = debt.is_paid();
        debt.push_installment(Installment {
            amount,
            date: Utc::now(),
        })?;
        let updated = debt.clone();

        debug!(
            "Recorded installment of {} on debt {} for customer {}, balance {}",
            amount,
            debt_id,
            customer_id,
            updated.balance()
        );
        if !was_paid && updated.is_paid() {
            debug!("Debt {} for customer {} is now paid", debt_id, customer_id);
        }

        self.persist(checkpoint)?;
        Ok(updated)
    }

    /// Removes a debt together with its installments.
    pub fn delete_debt(&mut self, customer_id: CustomerId, debt_id: DebtId) -> Result<()> {
        let index = self.customer_index(customer_id)?;

        let checkpoint = self.checkpoint();
        let removed = self.customers[index]
            .remove_debt(debt_id)
            .ok_or(LedgerError::DebtNotFound {
                customer: customer_id,
                debt: debt_id,
            })?;
        debug!(
            "Deleted debt {} with {} installments for customer {}",
            debt_id,
            removed.installments().len(),
            customer_id
        );

        self.persist(checkpoint)
    }

    fn customer_index(&self, id: CustomerId) -> Result<usize> {
        self.customers
            .iter()
            .position(|c| c.id() == id)
            .ok_or(LedgerError::CustomerNotFound(id))
    }

    /// Hands out the next id. The last `u64` is never handed out, so the
    /// counter always names a free id.
    fn allocate_id(&mut self) -> Result<u64> {
        let id = self.next_id;
        self.next_id = id.checked_add(1).ok_or(StorageError::IdsExhausted)?;
        Ok(id)
    }

    fn checkpoint(&self) -> Option<Checkpoint> {
        match self.durability {
            Durability::Strict => Some(Checkpoint {
                customers: self.customers.clone(),
                next_id: self.next_id,
            }),
            Durability::BestEffort => None,
        }
    }

    /// Saves the current state. On failure, restores `checkpoint` if one
    /// was taken, and reports the storage error either way.
    fn persist(&mut self, checkpoint: Option<Checkpoint>) -> Result<()> {
        let snapshot = self.snapshot();
        let err = match self.store.save(&snapshot) {
            Ok(()) => return Ok(()),
            Err(err) => err,
        };

        match checkpoint {
            Some(checkpoint) => {
                warn!("Save failed, rolling back change: {}", err);
                self.customers = checkpoint.customers;
                self.next_id = checkpoint.next_id;
            }
            None => warn!("Save failed, change kept in memory only: {}", err),
        }
        Err(err.into())
    }
}

/// Trims `value` and rejects it if nothing is left.
fn required(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::Validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

fn positive(field: &str, amount: Money) -> Result<Money> {
    if !amount.is_positive() {
        return Err(LedgerError::Validation(format!(
            "{} must be greater than zero, got {}",
            field, amount
        )));
    }
    Ok(amount)
}
