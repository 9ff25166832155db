use chrono::NaiveDate;
use serde::Serialize;

use crate::aggregate::{customer_id, Aggregator};
use crate::age::enrich;
use crate::criteria::{CriteriaSet, NamedPredicate, Variant};
use crate::error::Result;
use crate::importer::{ColumnIndex, Table};
use crate::models::EnrichedRecord;
use crate::normalizer::RecordNormalizer;
use crate::settings::Settings;

// ---------------------------------------------------------------------------
// Metric catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricId {
    AdultCustomers,
    IndividualPaymentAccounts,
    EkycPaymentAccounts,
    IndividualCifs,
    OrganizationCifs,
    OrganizationPaymentAccounts,
}

/// Display order.
pub const ALL_METRICS: &[MetricId] = &[
    MetricId::AdultCustomers,
    MetricId::IndividualPaymentAccounts,
    MetricId::EkycPaymentAccounts,
    MetricId::IndividualCifs,
    MetricId::OrganizationCifs,
    MetricId::OrganizationPaymentAccounts,
];

enum Counting {
    Rows,
    DistinctCustomers,
}

impl MetricId {
    pub fn key(&self) -> &'static str {
        match self {
            Self::AdultCustomers => "adult_customers",
            Self::IndividualPaymentAccounts => "individual_payment_accounts",
            Self::EkycPaymentAccounts => "ekyc_payment_accounts",
            Self::IndividualCifs => "individual_cifs",
            Self::OrganizationCifs => "organization_cifs",
            Self::OrganizationPaymentAccounts => "organization_payment_accounts",
        }
    }

    pub fn label(&self, variant: Variant) -> &'static str {
        match (self, variant) {
            (Self::AdultCustomers, Variant::Base) => "1. Customers aged 15+ (records)",
            (Self::AdultCustomers, Variant::StatusAware) => "1. Customers aged 15+ (unique CIF)",
            (Self::IndividualPaymentAccounts, _) => "2. KHCN payment accounts (TKTT)",
            (Self::EkycPaymentAccounts, _) => "2.1. of which e-KYC",
            (Self::IndividualCifs, _) => "3. KHCN CIF profiles (unique)",
            (Self::OrganizationCifs, _) => "4. KHTC CIF profiles (unique)",
            (Self::OrganizationPaymentAccounts, _) => "5. KHTC payment accounts (TKTT)",
        }
    }

    fn predicate(&self) -> NamedPredicate {
        match self {
            Self::AdultCustomers => NamedPredicate::IsAdult,
            Self::IndividualPaymentAccounts => NamedPredicate::IsIndividualPaymentAccount,
            Self::EkycPaymentAccounts => NamedPredicate::IsEkycPaymentAccount,
            Self::IndividualCifs => NamedPredicate::IsIndividualCustomer,
            Self::OrganizationCifs => NamedPredicate::IsOrganizationCustomer,
            Self::OrganizationPaymentAccounts => NamedPredicate::IsOrganizationPaymentAccount,
        }
    }

    fn counting(&self, variant: Variant) -> Counting {
        match (self, variant) {
            (Self::AdultCustomers, Variant::StatusAware) => Counting::DistinctCustomers,
            (Self::IndividualCifs | Self::OrganizationCifs, _) => Counting::DistinctCustomers,
            _ => Counting::Rows,
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    pub id: MetricId,
    pub label: String,
    pub value: usize,
}

/// A headline figure shown together with a related one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pairing {
    pub label: String,
    pub value: usize,
    pub companion_label: String,
    pub companion_value: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsReport {
    pub reference_date: NaiveDate,
    pub variant: Variant,
    pub total_records: usize,
    pub metrics: Vec<Metric>,
}

impl MetricsReport {
    #[allow(dead_code)]
    pub fn value(&self, id: MetricId) -> Option<usize> {
        self.metrics.iter().find(|m| m.id == id).map(|m| m.value)
    }

    /// Payment accounts with their e-KYC share, and individual CIFs next to
    /// organization CIFs.
    pub fn pairings(&self) -> Vec<Pairing> {
        let pair = |head: MetricId, companion: MetricId| -> Option<Pairing> {
            let h = self.metrics.iter().find(|m| m.id == head)?;
            let c = self.metrics.iter().find(|m| m.id == companion)?;
            Some(Pairing {
                label: h.label.clone(),
                value: h.value,
                companion_label: c.label.clone(),
                companion_value: c.value,
            })
        };
        [
            pair(MetricId::IndividualPaymentAccounts, MetricId::EkycPaymentAccounts),
            pair(MetricId::IndividualCifs, MetricId::OrganizationCifs),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

/// Evaluate every metric over an already enriched dataset.
pub fn build_report(
    records: &[EnrichedRecord],
    variant: Variant,
    reference_date: NaiveDate,
) -> MetricsReport {
    let criteria = CriteriaSet::new(variant);
    let agg = Aggregator::new(records);
    let metrics = ALL_METRICS
        .iter()
        .map(|id| {
            let predicate = criteria.predicate(id.predicate());
            let value = match id.counting(variant) {
                Counting::Rows => agg.count_matching(&predicate),
                Counting::DistinctCustomers => agg.count_distinct_matching(&predicate, customer_id),
            };
            Metric {
                id: *id,
                label: id.label(variant).to_string(),
                value,
            }
        })
        .collect();

    MetricsReport {
        reference_date,
        variant,
        total_records: agg.len(),
        metrics,
    }
}

/// Validate, normalize, derive and aggregate. Nothing is returned unless every
/// step succeeds.
pub fn generate(
    table: &Table,
    settings: &Settings,
    variant: Variant,
    reference_date: NaiveDate,
) -> Result<MetricsReport> {
    let columns = ColumnIndex::resolve(table, &settings.columns, variant)?;
    let records = RecordNormalizer::new(&columns, &settings.date_formats).normalize_all(table)?;
    let enriched = enrich(records, reference_date);
    let report = build_report(&enriched, variant, reference_date);
    log::info!(
        "report for {} records as of {reference_date} ({})",
        report.total_records,
        variant.key()
    );
    Ok(report)
}
