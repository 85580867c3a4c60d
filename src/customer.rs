//! Customer model, free-text details and edit patches.

use crate::debt::{Debt, DebtId};
use crate::money::Money;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Identifier of a customer. Never reused while the record exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(pub u64);

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for CustomerId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.trim().parse().map(CustomerId)
    }
}

/// Optional free-text details kept alongside a customer.
///
/// Blank values are stored as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile_no: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_no: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shop_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sales_rep: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl CustomerMetadata {
    /// Trims every field and drops the blank ones.
    pub fn normalized(self) -> Self {
        CustomerMetadata {
            mobile_no: non_blank(self.mobile_no),
            invoice_no: non_blank(self.invoice_no),
            shop_name: non_blank(self.shop_name),
            sales_rep: non_blank(self.sales_rep),
            comment: non_blank(self.comment),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Field overwrites for an existing customer.
///
/// `None` leaves a field untouched. For the detail fields, `Some("")` clears
/// the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerPatch {
    pub name: Option<String>,
    pub mobile_no: Option<String>,
    pub invoice_no: Option<String>,
    pub shop_name: Option<String>,
    pub sales_rep: Option<String>,
    pub comment: Option<String>,
}

impl CustomerPatch {
    /// Returns `true` if the patch would not change anything.
    pub fn is_empty(&self) -> bool {
        *self == CustomerPatch::default()
    }
}

/// A customer and the debts they owe, in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    id: CustomerId,
    name: String,

    #[serde(flatten)]
    metadata: CustomerMetadata,

    #[serde(default)]
    debts: Vec<Debt>,
}

impl Customer {
    /// Creates a customer with no debts. `name` must already be validated.
    pub(crate) fn new(id: CustomerId, name: String, metadata: CustomerMetadata) -> Self {
        Customer {
            id,
            name,
            metadata: metadata.normalized(),
            debts: Vec::new(),
        }
    }

    pub fn id(&self) -> CustomerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metadata(&self) -> &CustomerMetadata {
        &self.metadata
    }

    pub fn debts(&self) -> &[Debt] {
        &self.debts
    }

    pub fn debt(&self, id: DebtId) -> Option<&Debt> {
        self.debts.iter().find(|d| d.id() == id)
    }

    pub(crate) fn debt_mut(&mut self, id: DebtId) -> Option<&mut Debt> {
        self.debts.iter_mut().find(|d| d.id() == id)
    }

    pub(crate) fn debts_mut(&mut self) -> &mut [Debt] {
        &mut self.debts
    }

    pub(crate) fn push_debt(&mut self, debt: Debt) {
        self.debts.push(debt);
    }

    /// Removes a debt together with its installments.
    pub(crate) fn remove_debt(&mut self, id: DebtId) -> Option<Debt> {
        let index = self.debts.iter().position(|d| d.id() == id)?;
        Some(self.debts.remove(index))
    }

    /// Overwrites fields from a patch. The name must already be validated.
    pub(crate) fn apply(&mut self, patch: CustomerPatch) {
        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }

        let metadata = &mut self.metadata;
        overwrite(&mut metadata.mobile_no, patch.mobile_no);
        overwrite(&mut metadata.invoice_no, patch.invoice_no);
        overwrite(&mut metadata.shop_name, patch.shop_name);
        overwrite(&mut metadata.sales_rep, patch.sales_rep);
        overwrite(&mut metadata.comment, patch.comment);
    }

    /// Sum of the principals of all debts.
    pub fn total_principal(&self) -> Money {
        self.debts.iter().map(|d| d.principal()).sum()
    }

    /// Sum of everything paid across all debts.
    pub fn total_paid(&self) -> Money {
        self.debts.iter().map(|d| d.paid_amount()).sum()
    }

    /// Sum of balances of the debts that are still unpaid.
    pub fn outstanding(&self) -> Money {
        self.debts
            .iter()
            .filter(|d| !d.is_paid())
            .map(|d| d.balance())
            .sum()
    }

    /// Returns `true` if `query` appears (case-insensitively) in the name,
    /// shop name or mobile number.
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }

        let haystacks = [
            Some(self.name.as_str()),
            self.metadata.shop_name.as_deref(),
            self.metadata.mobile_no.as_deref(),
        ];
        haystacks
            .into_iter()
            .flatten()
            .any(|h| h.to_lowercase().contains(&needle))
    }
}

fn overwrite(field: &mut Option<String>, value: Option<String>) {
    if let Some(value) = value {
        *field = non_blank(Some(value));
    }
}
