use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;

use super::roster::new_id;
use super::{EntityStore, Keyed};
use crate::models::{PaymentRecord, PaymentStatus};

pub const MONTHS: [&str; 12] = [
    "Januari",
    "Februari",
    "Maret",
    "April",
    "Mei",
    "Juni",
    "Juli",
    "Agustus",
    "September",
    "Oktober",
    "November",
    "Desember",
];

/// A billing month. `month` is zero-based and always in `0..12`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Period {
    month: u8,
    year: i32,
}

impl Period {
    pub fn new(month: u8, year: i32) -> Option<Self> {
        (month < 12).then_some(Self { month, year })
    }

    pub fn containing<T: Datelike>(date: &T) -> Self {
        Self {
            month: date.month0() as u8,
            year: date.year(),
        }
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month_name(&self) -> &'static str {
        MONTHS[self.month as usize]
    }
}

impl Keyed for PaymentRecord {
    type Key = (String, u8, i32);

    fn key(&self) -> Self::Key {
        (self.student_id.clone(), self.month, self.year)
    }
}

impl EntityStore {
    pub fn payment_for(&self, student_id: &str, period: Period) -> Option<&PaymentRecord> {
        self.payments
            .get(&(student_id.to_string(), period.month, period.year))
    }

    pub fn payments_for_student(&self, student_id: &str) -> Vec<&PaymentRecord> {
        self.payments
            .iter()
            .filter(|p| p.student_id == student_id)
            .collect()
    }

    pub fn toggle_payment(&mut self, student_id: &str, period: Period, amount: u64) -> &PaymentRecord {
        self.toggle_payment_at(student_id, period, amount, Utc::now())
    }

    /// Flips the period between paid and unpaid.
    ///
    /// Paying sets `paid_date` and overwrites the amount. Unpaying clears
    /// `paid_date` but leaves the stored amount as it was.
    pub fn toggle_payment_at(
        &mut self,
        student_id: &str,
        period: Period,
        amount: u64,
        now: DateTime<Utc>,
    ) -> &PaymentRecord {
        self.payments.upsert_with(
            (student_id.to_string(), period.month, period.year),
            || paid_record(student_id, period, amount, now),
            |existing| match existing.status {
                PaymentStatus::Paid => {
                    existing.status = PaymentStatus::Unpaid;
                    existing.paid_date = None;
                }
                PaymentStatus::Unpaid => {
                    existing.status = PaymentStatus::Paid;
                    existing.paid_date = Some(now);
                    existing.amount = amount;
                }
            },
        )
    }

    pub fn bulk_settle(&mut self, student_id: &str, periods: &[Period], monthly_amount: u64) -> usize {
        self.bulk_settle_at(student_id, periods, monthly_amount, Utc::now())
    }

    /// Marks every period paid at `monthly_amount`. Periods already paid are
    /// re-settled: their amount and date are overwritten. Never unpays.
    pub fn bulk_settle_at(
        &mut self,
        student_id: &str,
        periods: &[Period],
        monthly_amount: u64,
        now: DateTime<Utc>,
    ) -> usize {
        for &period in periods {
            self.payments.upsert_with(
                (student_id.to_string(), period.month, period.year),
                || paid_record(student_id, period, monthly_amount, now),
                |existing| {
                    existing.status = PaymentStatus::Paid;
                    existing.paid_date = Some(now);
                    existing.amount = monthly_amount;
                },
            );
        }
        periods.len()
    }
}

fn paid_record(student_id: &str, period: Period, amount: u64, now: DateTime<Utc>) -> PaymentRecord {
    PaymentRecord {
        id: new_id(),
        student_id: student_id.to_string(),
        month: period.month,
        year: period.year,
        amount,
        paid_date: Some(now),
        status: PaymentStatus::Paid,
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_period_rejects_month_out_of_range() {
        assert!(Period::new(11, 2025).is_some());
        assert!(Period::new(12, 2025).is_none());
        assert_eq!(Period::new(0, 2025).unwrap().month_name(), "Januari");
    }

    #[test]
    fn test_toggle_cycles_paid_unpaid_paid() {
        let mut store = EntityStore::default();
        let march = Period::new(2, 2025).unwrap();

        let first = store.toggle_payment_at("s1", march, 50000, at(8)).clone();
        assert_eq!(first.status, PaymentStatus::Paid);
        assert_eq!(first.amount, 50000);
        assert_eq!(first.paid_date, Some(at(8)));

        let second = store.toggle_payment_at("s1", march, 70000, at(9)).clone();
        assert_eq!(second.id, first.id);
        assert_eq!(second.status, PaymentStatus::Unpaid);
        assert_eq!(second.paid_date, None);
        assert_eq!(second.amount, 50000);

        let third = store.toggle_payment_at("s1", march, 60000, at(10)).clone();
        assert_eq!(third.id, first.id);
        assert_eq!(third.status, PaymentStatus::Paid);
        assert_eq!(third.amount, 60000);
        assert_eq!(third.paid_date, Some(at(10)));

        assert_eq!(store.payments().len(), 1);
    }

    #[test]
    fn test_bulk_settle_overwrites_paid_months_and_never_unpays() {
        let mut store = EntityStore::default();
        let jan = Period::new(0, 2025).unwrap();
        let feb = Period::new(1, 2025).unwrap();
        store.toggle_payment_at("s1", feb, 30000, at(8));

        let settled = store.bulk_settle_at("s1", &[jan, feb], 50000, at(12));
        assert_eq!(settled, 2);

        for period in [jan, feb] {
            let record = store.payment_for("s1", period).unwrap();
            assert_eq!(record.status, PaymentStatus::Paid);
            assert_eq!(record.amount, 50000);
            assert_eq!(record.paid_date, Some(at(12)));
        }
        assert_eq!(store.payments().len(), 2);
    }

    #[test]
    fn test_bulk_settle_pays_previously_unpaid_record() {
        let mut store = EntityStore::default();
        let apr = Period::new(3, 2025).unwrap();
        store.toggle_payment_at("s1", apr, 40000, at(8));
        store.toggle_payment_at("s1", apr, 40000, at(9));
        assert!(!store.payment_for("s1", apr).unwrap().is_paid());

        store.bulk_settle_at("s1", &[apr, apr], 45000, at(10));
        let record = store.payment_for("s1", apr).unwrap();
        assert!(record.is_paid());
        assert_eq!(record.amount, 45000);
        assert_eq!(store.payments().len(), 1);
    }

    #[test]
    fn test_same_month_different_year_is_a_different_period() {
        let mut store = EntityStore::default();
        store.toggle_payment_at("s1", Period::new(5, 2024).unwrap(), 50000, at(8));
        store.toggle_payment_at("s1", Period::new(5, 2025).unwrap(), 50000, at(8));

        assert_eq!(store.payments_for_student("s1").len(), 2);
    }
}
