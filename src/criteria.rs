use serde::{Deserialize, Serialize};

use crate::models::EnrichedRecord;

pub const ADULT_AGE: i32 = 15;
pub const PAYMENT_ACCOUNT_CODE: &str = "421101";
pub const INDIVIDUAL_TYPE_CODE: &str = "100";
pub const EKYC_DETAIL_CODE: &str = "104";
pub const ACTIVE_STATUS: &str = "Normal";

/// Which family of metric definitions to apply.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    /// Every account row counts.
    #[default]
    Base,
    /// Only accounts whose status is `Normal` count.
    StatusAware,
}

impl Variant {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::StatusAware => "status-aware",
        }
    }
}

/// Anything that can accept or reject a record.
pub trait Predicate {
    fn evaluate(&self, record: &EnrichedRecord) -> bool;
}

impl<F> Predicate for F
where
    F: Fn(&EnrichedRecord) -> bool,
{
    fn evaluate(&self, record: &EnrichedRecord) -> bool {
        self(record)
    }
}

// ---------------------------------------------------------------------------
// Atomic criteria
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criterion {
    /// Age known and at least [`ADULT_AGE`].
    Adult,
    /// Account code is the payment-account (TKTT) ledger code.
    PaymentAccount,
    /// Customer type is the individual (KHCN) segment.
    IndividualCustomer,
    /// Detail type marks an e-KYC opened account.
    EkycDetail,
    /// Account status is `Normal`.
    Active,
}

impl Predicate for Criterion {
    fn evaluate(&self, r: &EnrichedRecord) -> bool {
        match self {
            Self::Adult => r.age.is_some_and(|age| age >= ADULT_AGE),
            Self::PaymentAccount => r.record.account_code == PAYMENT_ACCOUNT_CODE,
            Self::IndividualCustomer => r.record.customer_type_code == INDIVIDUAL_TYPE_CODE,
            Self::EkycDetail => r.record.detail_type_code == EKYC_DETAIL_CODE,
            Self::Active => r.is_active == Some(true),
        }
    }
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Is(Criterion),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
}

impl Expr {
    #[must_use]
    pub fn and(self, rhs: impl Into<Expr>) -> Self {
        Self::And(Box::new(self), Box::new(rhs.into()))
    }

    #[must_use]
    #[allow(dead_code)]
    pub fn or(self, rhs: impl Into<Expr>) -> Self {
        Self::Or(Box::new(self), Box::new(rhs.into()))
    }

    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }
}

impl From<Criterion> for Expr {
    fn from(c: Criterion) -> Self {
        Self::Is(c)
    }
}

impl Predicate for Expr {
    fn evaluate(&self, r: &EnrichedRecord) -> bool {
        match self {
            Self::Is(c) => c.evaluate(r),
            Self::And(lhs, rhs) => lhs.evaluate(r) && rhs.evaluate(r),
            Self::Or(lhs, rhs) => lhs.evaluate(r) || rhs.evaluate(r),
            Self::Not(inner) => !inner.evaluate(r),
        }
    }
}

// ---------------------------------------------------------------------------
// Named catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedPredicate {
    IsAdult,
    IsIndividualPaymentAccount,
    IsEkycPaymentAccount,
    IsIndividualCustomer,
    IsOrganizationCustomer,
    IsOrganizationPaymentAccount,
}

/// The fixed predicate catalog for one [`Variant`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CriteriaSet {
    variant: Variant,
}

impl CriteriaSet {
    pub fn new(variant: Variant) -> Self {
        Self { variant }
    }

    pub fn predicate(&self, name: NamedPredicate) -> Expr {
        use Criterion::*;
        match name {
            NamedPredicate::IsAdult => self.active(Adult.into()),
            NamedPredicate::IsIndividualPaymentAccount => {
                self.active(Expr::from(PaymentAccount).and(IndividualCustomer))
            }
            // activity comes through the payment-account predicate
            NamedPredicate::IsEkycPaymentAccount => self
                .predicate(NamedPredicate::IsIndividualPaymentAccount)
                .and(EkycDetail),
            NamedPredicate::IsIndividualCustomer => self.active(IndividualCustomer.into()),
            NamedPredicate::IsOrganizationCustomer => {
                self.active(Expr::from(IndividualCustomer).not())
            }
            NamedPredicate::IsOrganizationPaymentAccount => self.active(
                Expr::from(PaymentAccount).and(Expr::from(IndividualCustomer).not()),
            ),
        }
    }

    fn active(&self, expr: Expr) -> Expr {
        match self.variant {
            Variant::Base => expr,
            Variant::StatusAware => expr.and(Criterion::Active),
        }
    }
}
