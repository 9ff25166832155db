use std::collections::HashSet;

use crate::criteria::Predicate;
use crate::models::EnrichedRecord;

/// Customer id as a distinct-count key; empty ids are not a customer.
pub fn customer_id(record: &EnrichedRecord) -> Option<&str> {
    let id = record.record.customer_id.as_str();
    (!id.is_empty()).then_some(id)
}

/// Read-only counting over the enriched dataset.
#[derive(Debug, Clone, Copy)]
pub struct Aggregator<'a> {
    records: &'a [EnrichedRecord],
}

impl<'a> Aggregator<'a> {
    pub fn new(records: &'a [EnrichedRecord]) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn count_matching<P>(&self, predicate: &P) -> usize
    where
        P: Predicate + ?Sized,
    {
        self.records.iter().filter(|r| predicate.evaluate(r)).count()
    }

    /// Distinct keys among matching records. Records whose key is `None`
    /// are left out.
    pub fn count_distinct_matching<P, K>(&self, predicate: &P, key: K) -> usize
    where
        P: Predicate + ?Sized,
        K: for<'r> Fn(&'r EnrichedRecord) -> Option<&'r str>,
    {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut keyless = 0usize;
        for r in self.records.iter().filter(|r| predicate.evaluate(r)) {
            match key(r) {
                Some(k) => {
                    seen.insert(k);
                }
                None => keyless += 1,
            }
        }
        if keyless > 0 {
            log::debug!("{keyless} matching records without a key left out of distinct count");
        }
        seen.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::{CriteriaSet, Criterion, Expr, NamedPredicate, Variant};
    use crate::models::AccountRecord;

    fn rec(id: &str, acct: &str, cust_type: &str, age: Option<i32>) -> EnrichedRecord {
        EnrichedRecord {
            record: AccountRecord {
                account_code: acct.into(),
                customer_id: id.into(),
                customer_name: String::new(),
                customer_type_code: cust_type.into(),
                birth_date: None,
                detail_type_code: "104".into(),
                account_status: None,
            },
            age,
            is_active: None,
        }
    }

    fn dataset() -> Vec<EnrichedRecord> {
        vec![
            rec("C1", "421101", "100", Some(30)),
            rec("C1", "423101", "100", Some(30)),
            rec("C2", "421101", "200", None),
            rec("", "421101", "100", Some(10)),
            rec("C3", "421101", "100", Some(15)),
        ]
    }

    #[test]
    fn test_distinct_vs_total() {
        let data = vec![
            rec("C1", "421101", "100", None),
            rec("C1", "421101", "100", None),
            rec("C2", "421101", "200", None),
        ];
        let agg = Aggregator::new(&data);
        let ind = CriteriaSet::new(Variant::Base).predicate(NamedPredicate::IsIndividualCustomer);
        assert_eq!(agg.count_distinct_matching(&ind, customer_id), 1);
        assert_eq!(agg.count_matching(&ind), 2);
    }

    #[test]
    fn test_empty_customer_id_excluded() {
        let data = dataset();
        let agg = Aggregator::new(&data);
        let ind = Expr::from(Criterion::IndividualCustomer);
        assert_eq!(agg.count_matching(&ind), 4);
        assert_eq!(agg.count_distinct_matching(&ind, customer_id), 2);
    }

    #[test]
    fn test_conjunction_never_increases_count() {
        let data = dataset();
        let agg = Aggregator::new(&data);
        let atoms = [
            Criterion::Adult,
            Criterion::PaymentAccount,
            Criterion::IndividualCustomer,
            Criterion::EkycDetail,
        ];
        for a in atoms {
            for b in atoms {
                let both = Expr::from(a).and(b);
                assert!(agg.count_matching(&both) <= agg.count_matching(&a));
                assert!(
                    agg.count_distinct_matching(&both, customer_id) <= agg.count_matching(&both)
                );
            }
        }
    }

    #[test]
    fn test_closure_predicates() {
        let data = dataset();
        let agg = Aggregator::new(&data);
        let teen = |r: &EnrichedRecord| r.age.is_some_and(|a| a < 18);
        assert_eq!(agg.count_matching(&teen), 2);
        assert_eq!(agg.count_distinct_matching(&teen, customer_id), 1);
        assert_eq!(agg.len(), 5);
    }

    #[test]
    fn test_empty_dataset() {
        let agg = Aggregator::new(&[]);
        assert_eq!(agg.count_matching(&Criterion::Adult), 0);
        assert_eq!(agg.count_distinct_matching(&Criterion::Adult, customer_id), 0);
    }
}
