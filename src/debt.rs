//! Debt and installment models.
//!
//! A debt's paid amount and status are caches over its installment trail and
//! are recomputed from the full trail whenever it changes.

use crate::error::{LedgerError, Result};
use crate::money::Money;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter;
use std::num::ParseIntError;
use std::str::FromStr;

/// Identifier of a debt. Allocated ledger-wide, so it is also unique within
/// the owning customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DebtId(pub u64);

impl fmt::Display for DebtId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for DebtId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.trim().parse().map(DebtId)
    }
}

/// Payment status of a debt.
///
/// The only transition is `Unpaid -> Paid`. Installments are append-only, so
/// nothing can move a debt back to `Unpaid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DebtStatus {
    Unpaid,
    Paid,
}

impl fmt::Display for DebtStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DebtStatus::Unpaid => f.write_str("Unpaid"),
            DebtStatus::Paid => f.write_str("Paid"),
        }
    }
}

/// One payment applied against a debt. Never modified once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Installment {
    /// Amount paid. Always strictly positive.
    pub amount: Money,

    /// When the payment was recorded.
    pub date: DateTime<Utc>,
}

/// A single obligation owed by a customer.
///
/// # Invariants
///
/// - `paid_amount` equals the sum of `installments`
/// - `status == Paid` iff `principal - paid_amount <= 0`
///
/// Overpayment is allowed: the balance goes negative and the debt is `Paid`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Debt {
    id: DebtId,
    description: String,
    principal: Money,
    date: NaiveDate,
    paid_amount: Money,
    status: DebtStatus,
    installments: Vec<Installment>,
}

impl Debt {
    /// Creates an unpaid debt with an empty installment trail.
    pub(crate) fn new(id: DebtId, description: String, principal: Money, date: NaiveDate) -> Self {
        Debt {
            id,
            description,
            principal,
            date,
            paid_amount: Money::ZERO,
            status: DebtStatus::Unpaid,
            installments: Vec::new(),
        }
    }

    pub fn id(&self) -> DebtId {
        self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn principal(&self) -> Money {
        self.principal
    }

    /// Issue date of the debt.
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Sum of all installments recorded so far.
    pub fn paid_amount(&self) -> Money {
        self.paid_amount
    }

    /// `principal - paid_amount`. Negative after an overpayment.
    pub fn balance(&self) -> Money {
        self.principal - self.paid_amount
    }

    pub fn status(&self) -> DebtStatus {
        self.status
    }

    pub fn is_paid(&self) -> bool {
        self.status == DebtStatus::Paid
    }

    /// Installments in the order they were recorded.
    pub fn installments(&self) -> &[Installment] {
        &self.installments
    }

    /// Appends an installment and recomputes the derived fields.
    ///
    /// Fails without touching the debt if the new paid amount is not
    /// representable.
    pub(crate) fn push_installment(&mut self, installment: Installment) -> Result<()> {
        let amounts = self.installments.iter().chain(iter::once(&installment));
        let paid_amount = checked_total(amounts).ok_or_else(|| {
            LedgerError::Validation(format!(
                "installment of {} would overflow the paid amount of debt {}",
                installment.amount, self.id
            ))
        })?;

        self.installments.push(installment);
        self.paid_amount = paid_amount;
        self.status = self.status_for(paid_amount);
        Ok(())
    }

    /// Recomputes `paid_amount` and `status` from the installment trail.
    ///
    /// Returns `Some(true)` if the cached values were out of date and `None`
    /// if the trail does not sum to a representable amount.
    pub(crate) fn recompute(&mut self) -> Option<bool> {
        let paid_amount = checked_total(&self.installments)?;
        let status = self.status_for(paid_amount);

        let stale = paid_amount != self.paid_amount || status != self.status;
        self.paid_amount = paid_amount;
        self.status = status;
        Some(stale)
    }

    /// Verifies the cached fields against the installment trail.
    pub fn check_invariant(&self) -> bool {
        match checked_total(&self.installments) {
            Some(sum) => sum == self.paid_amount && self.status_for(sum) == self.status,
            None => false,
        }
    }

    fn status_for(&self, paid_amount: Money) -> DebtStatus {
        if (self.principal - paid_amount).is_positive() {
            DebtStatus::Unpaid
        } else {
            DebtStatus::Paid
        }
    }
}

fn checked_total<'a>(installments: impl IntoIterator<Item = &'a Installment>) -> Option<Money> {
    installments
        .into_iter()
        .try_fold(Money::ZERO, |acc, i| acc.checked_add(i.amount))
}

/// Parameters for creating a debt.
///
/// `upfront` is a payment made when the debt is opened. It is recorded as the
/// debt's first installment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDebt {
    pub description: String,
    pub principal: Money,
    pub date: Option<NaiveDate>,
    pub upfront: Option<Money>,
}

impl NewDebt {
    pub fn new(description: impl Into<String>, principal: Money) -> Self {
        NewDebt {
            description: description.into(),
            principal,
            date: None,
            upfront: None,
        }
    }

    /// Sets the issue date. Defaults to today (UTC).
    pub fn dated(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Sets an amount already paid when the debt is opened.
    pub fn with_upfront(mut self, amount: Money) -> Self {
        self.upfront = Some(amount);
        self
    }
}
