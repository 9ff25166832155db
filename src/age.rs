use chrono::{Datelike, NaiveDate};

use crate::criteria::ACTIVE_STATUS;
use crate::models::{AccountRecord, EnrichedRecord};

/// Whole years between `birth_date` and `reference_date`. Not clamped: a
/// birth date after the reference date gives a negative age.
pub fn age(reference_date: NaiveDate, birth_date: Option<NaiveDate>) -> Option<i32> {
    let born = birth_date?;
    let before_birthday =
        (reference_date.month(), reference_date.day()) < (born.month(), born.day());
    Some(reference_date.year() - born.year() - i32::from(before_birthday))
}

/// Attach `age` and, when the status column was read, `is_active`.
pub fn enrich(records: Vec<AccountRecord>, reference_date: NaiveDate) -> Vec<EnrichedRecord> {
    let enriched: Vec<EnrichedRecord> = records
        .into_iter()
        .map(|record| EnrichedRecord {
            age: age(reference_date, record.birth_date),
            is_active: record.account_status.as_deref().map(|s| s == ACTIVE_STATUS),
            record,
        })
        .collect();

    let unknown = enriched.iter().filter(|r| r.age.is_none()).count();
    let negative = enriched.iter().filter(|r| r.age.is_some_and(|a| a < 0)).count();
    if unknown > 0 {
        log::debug!("{unknown} records have no usable birth date");
    }
    if negative > 0 {
        log::warn!("{negative} records have a birth date after {reference_date}");
    }
    enriched
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn record(birth: Option<NaiveDate>, status: Option<&str>) -> AccountRecord {
        AccountRecord {
            account_code: "421101".into(),
            customer_id: "C1".into(),
            customer_name: String::new(),
            customer_type_code: "100".into(),
            birth_date: birth,
            detail_type_code: "104".into(),
            account_status: status.map(String::from),
        }
    }

    #[test]
    fn test_age_on_birthday() {
        assert_eq!(age(d(2024, 6, 15), Some(d(2009, 6, 15))), Some(15));
    }

    #[test]
    fn test_age_day_before_birthday() {
        assert_eq!(age(d(2024, 6, 15), Some(d(2009, 6, 16))), Some(14));
        assert_eq!(age(d(2024, 1, 1), Some(d(2000, 12, 31))), Some(23));
    }

    #[test]
    fn test_age_absent_birth_date() {
        assert_eq!(age(d(2024, 6, 15), None), None);
    }

    #[test]
    fn test_age_leap_day_birth() {
        // Feb 29 birthday counts as reached on Mar 1 of a non-leap year
        assert_eq!(age(d(2023, 2, 28), Some(d(2004, 2, 29))), Some(18));
        assert_eq!(age(d(2023, 3, 1), Some(d(2004, 2, 29))), Some(19));
        assert_eq!(age(d(2024, 2, 29), Some(d(2004, 2, 29))), Some(20));
    }

    #[test]
    fn test_age_future_birth_is_negative() {
        assert_eq!(age(d(2024, 6, 15), Some(d(2026, 1, 1))), Some(-2));
    }

    #[test]
    fn test_enrich_derives_age_and_activity() {
        let records = vec![
            record(Some(d(2000, 1, 1)), Some("Normal")),
            record(None, Some("Closed")),
            record(Some(d(1990, 1, 1)), None),
        ];
        let out = enrich(records.clone(), d(2024, 6, 15));
        assert_eq!(out[0].age, Some(24));
        assert_eq!(out[0].is_active, Some(true));
        assert_eq!(out[1].age, None);
        assert_eq!(out[1].is_active, Some(false));
        assert_eq!(out[2].is_active, None);
        assert_eq!(out[2].record, records[2]);
    }
}
