//! Read-only aggregates over the entity store. Nothing here mutates state.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{AttendanceStatus, PaymentRecord, ProgressRecord, Student};
use crate::store::{EntityStore, Period};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodSummary {
    pub period: Period,
    pub collected_total: u64,
    pub paid_count: usize,
    pub student_count: usize,
    /// Paid records for the period over enrolled students. Records of
    /// students no longer on the roster still count, so this can exceed 1.0.
    pub collection_rate: f64,
}

fn paid_in(store: &EntityStore, period: Period) -> impl Iterator<Item = &PaymentRecord> {
    store
        .payments()
        .iter()
        .filter(move |p| p.is_paid() && p.month == period.month() && p.year == period.year())
}

pub fn collected_for_period(store: &EntityStore, period: Period) -> u64 {
    paid_in(store, period).map(|p| p.amount).sum()
}

pub fn collected_for_year(store: &EntityStore, year: i32) -> u64 {
    store
        .payments()
        .iter()
        .filter(|p| p.is_paid() && p.year == year)
        .map(|p| p.amount)
        .sum()
}

/// Paid records for the period over the number of enrolled students. Zero
/// when nobody is enrolled. Paid records left by students who are no longer
/// enrolled are counted too, so the rate is not capped at 1.0.
pub fn collection_rate(store: &EntityStore, period: Period) -> f64 {
    let students = store.students().len();
    if students == 0 {
        return 0.0;
    }
    paid_in(store, period).count() as f64 / students as f64
}

pub fn period_summary(store: &EntityStore, period: Period) -> PeriodSummary {
    PeriodSummary {
        period,
        collected_total: collected_for_period(store, period),
        paid_count: paid_in(store, period).count(),
        student_count: store.students().len(),
        collection_rate: collection_rate(store, period),
    }
}

/// Months of `year` up to and including `through_month` that the student has
/// not paid. This is the candidate list for a bulk settlement.
pub fn outstanding_periods(
    store: &EntityStore,
    student_id: &str,
    year: i32,
    through_month: u8,
) -> Vec<Period> {
    (0..=through_month.min(11))
        .filter_map(|m| Period::new(m, year))
        .filter(|&period| {
            !store
                .payment_for(student_id, period)
                .is_some_and(PaymentRecord::is_paid)
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_students: usize,
    pub total_asatidz: usize,
    pub paid_current_month: usize,
    /// Rounded `collection_rate` as a percentage.
    pub payment_percentage: u32,
    pub present_today: usize,
    pub asatidz_present_today: usize,
    /// Students per teacher; the student count itself when there is no staff.
    pub student_teacher_ratio: f64,
    pub attendance_distribution: BTreeMap<&'static str, usize>,
    pub class_distribution: BTreeMap<String, usize>,
}

pub fn dashboard(store: &EntityStore, today: NaiveDate) -> DashboardStats {
    let period = Period::containing(&today);
    let total_students = store.students().len();
    let total_asatidz = store.asatidz().len();

    let mut attendance_distribution = BTreeMap::new();
    for status in AttendanceStatus::ALL {
        let count = store
            .attendance()
            .iter()
            .filter(|a| a.status == status)
            .count();
        if count > 0 {
            attendance_distribution.insert(status.label(), count);
        }
    }

    let mut class_distribution = BTreeMap::new();
    for s in store.students() {
        *class_distribution
            .entry(s.profile.class_name.clone())
            .or_insert(0) += 1;
    }

    let ratio = if total_asatidz > 0 {
        let raw = total_students as f64 / total_asatidz as f64;
        (raw * 10.0).round() / 10.0
    } else {
        total_students as f64
    };

    DashboardStats {
        total_students,
        total_asatidz,
        paid_current_month: paid_in(store, period).count(),
        payment_percentage: (collection_rate(store, period) * 100.0).round() as u32,
        present_today: store
            .attendance_on(today)
            .iter()
            .filter(|a| a.status == AttendanceStatus::Present)
            .count(),
        asatidz_present_today: store
            .asatidz_attendance_on(today)
            .iter()
            .filter(|a| a.status == AttendanceStatus::Present)
            .count(),
        student_teacher_ratio: ratio,
        attendance_distribution,
        class_distribution,
    }
}

/// What a santri sees about themself in the portal.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentOverview {
    pub student: Student,
    pub present_count: usize,
    pub total_meetings: usize,
    /// Rounded percentage of meetings attended.
    pub attendance_rate: u32,
    pub paid_this_month: bool,
    pub payments: Vec<PaymentRecord>,
    pub progress: Vec<ProgressRecord>,
}

pub fn student_overview(
    store: &EntityStore,
    student_id: &str,
    today: NaiveDate,
) -> Option<StudentOverview> {
    let student = store.find_student(student_id)?.clone();
    let attendance = store.attendance_for_student(student_id);
    let present_count = attendance
        .iter()
        .filter(|a| a.status == AttendanceStatus::Present)
        .count();
    let total_meetings = attendance.len();
    let attendance_rate = if total_meetings > 0 {
        (present_count as f64 / total_meetings as f64 * 100.0).round() as u32
    } else {
        0
    };

    Some(StudentOverview {
        paid_this_month: store
            .payment_for(student_id, Period::containing(&today))
            .is_some_and(PaymentRecord::is_paid),
        payments: store
            .payments_for_student(student_id)
            .into_iter()
            .cloned()
            .collect(),
        progress: store
            .progress_for_student(student_id)
            .into_iter()
            .cloned()
            .collect(),
        student,
        present_count,
        total_meetings,
        attendance_rate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    #[test]
    fn test_collection_rate_counts_against_all_students() {
        let mut store = EntityStore::seeded();
        let june = Period::new(5, 2025).unwrap();
        store.toggle_payment("1", june, 50000);
        store.toggle_payment("2", june, 40000);
        store.toggle_payment("3", june, 50000);
        store.toggle_payment("3", june, 50000);

        let summary = period_summary(&store, june);
        assert_eq!(summary.collected_total, 90000);
        assert_eq!(summary.paid_count, 2);
        assert_eq!(summary.student_count, 5);
        assert!((summary.collection_rate - 0.4).abs() < f64::EPSILON);
    }

    #[test]
    fn test_collection_rate_is_zero_without_students() {
        let mut store = EntityStore::default();
        let june = Period::new(5, 2025).unwrap();
        store.toggle_payment("orphan", june, 50000);

        assert_eq!(collection_rate(&store, june), 0.0);
        assert_eq!(collected_for_period(&store, june), 50000);
    }

    #[test]
    fn test_collection_rate_counts_payments_of_unenrolled_students() {
        let mut store = EntityStore::seeded();
        let june = Period::new(5, 2025).unwrap();
        store.students.truncate(1);
        store.toggle_payment("1", june, 50000);
        store.toggle_payment("4", june, 50000);

        assert_eq!(collection_rate(&store, june), 2.0);
        assert_eq!(period_summary(&store, june).paid_count, 2);
    }

    #[test]
    fn test_annual_total_ignores_unpaid_and_other_years() {
        let mut store = EntityStore::seeded();
        store.bulk_settle(
            "1",
            &[Period::new(0, 2025).unwrap(), Period::new(1, 2025).unwrap()],
            50000,
        );
        store.toggle_payment("2", Period::new(0, 2024).unwrap(), 50000);
        store.toggle_payment("3", Period::new(0, 2025).unwrap(), 50000);
        store.toggle_payment("3", Period::new(0, 2025).unwrap(), 50000);

        assert_eq!(collected_for_year(&store, 2025), 100000);
        assert_eq!(collected_for_year(&store, 2024), 50000);
    }

    #[test]
    fn test_outstanding_periods_skip_paid_months() {
        let mut store = EntityStore::seeded();
        store.toggle_payment("1", Period::new(1, 2025).unwrap(), 50000);

        let months: Vec<u8> = outstanding_periods(&store, "1", 2025, 3)
            .iter()
            .map(Period::month)
            .collect();
        assert_eq!(months, vec![0, 2, 3]);
    }

    #[test]
    fn test_dashboard_counts_today() {
        let mut store = EntityStore::seeded();
        store.mark_attendance("1", day(2), AttendanceStatus::Present);
        store.mark_attendance("2", day(2), AttendanceStatus::Sick);
        store.mark_attendance("1", day(1), AttendanceStatus::Present);
        store.mark_asatidz_attendance("u1", day(2), AttendanceStatus::Present);
        store.toggle_payment("1", Period::new(5, 2025).unwrap(), 50000);

        let stats = dashboard(&store, day(2));
        assert_eq!(stats.total_students, 5);
        assert_eq!(stats.present_today, 1);
        assert_eq!(stats.asatidz_present_today, 1);
        assert_eq!(stats.paid_current_month, 1);
        assert_eq!(stats.payment_percentage, 20);
        assert_eq!(stats.student_teacher_ratio, 2.5);
        assert_eq!(stats.attendance_distribution.get("Hadir"), Some(&2));
        assert_eq!(stats.attendance_distribution.get("Alpa"), None);
        assert_eq!(stats.class_distribution.get("Iqra 1"), Some(&1));
    }

    #[test]
    fn test_student_overview_rates_attendance() {
        let mut store = EntityStore::seeded();
        store.mark_attendance("1", day(1), AttendanceStatus::Present);
        store.mark_attendance("1", day(2), AttendanceStatus::Present);
        store.mark_attendance("1", day(3), AttendanceStatus::Absent);

        let overview = student_overview(&store, "1", day(3)).unwrap();
        assert_eq!(overview.total_meetings, 3);
        assert_eq!(overview.attendance_rate, 67);
        assert!(!overview.paid_this_month);
        assert!(student_overview(&store, "missing", day(3)).is_none());
    }
}
