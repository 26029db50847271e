//! Narrative monthly report written by an external language model.
//!
//! The model sees the roster, this month's attendance and this month's
//! payments, and answers in Indonesian Markdown. Its text is passed through
//! verbatim.

pub mod gemini;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::error::AppError;
use crate::models::{AttendanceRecord, PaymentRecord, Student};
use crate::store::{EntityStore, Period};

pub use gemini::GeminiReportClient;

pub const FAILURE_MESSAGE: &str =
    "Gagal menghasilkan laporan. Pastikan koneksi internet tersedia.";

#[async_trait]
pub trait ReportGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, AppError>;
}

/// The slice of state the report is written from.
#[derive(Debug, Clone, Serialize)]
pub struct ReportInput {
    pub period: Period,
    pub students: Vec<Student>,
    pub attendance: Vec<AttendanceRecord>,
    pub payments: Vec<PaymentRecord>,
}

impl ReportInput {
    /// Photos and portal credentials are stripped before anything leaves
    /// the process.
    pub fn collect(store: &EntityStore, today: NaiveDate) -> Self {
        let period = Period::containing(&today);
        let students = store
            .students()
            .iter()
            .map(|s| {
                let mut s = s.without_photo();
                s.profile.username = None;
                s.profile.password = None;
                s
            })
            .collect();
        let attendance = store
            .attendance()
            .iter()
            .filter(|a| a.date.year() == today.year() && a.date.month() == today.month())
            .cloned()
            .collect();
        let payments = store
            .payments()
            .iter()
            .filter(|p| p.month == period.month() && p.year == period.year())
            .cloned()
            .collect();

        Self {
            period,
            students,
            attendance,
            payments,
        }
    }

    pub fn prompt(&self) -> Result<String, serde_json::Error> {
        let students = serde_json::to_string(&self.students)?;
        let attendance = serde_json::to_string(&self.attendance)?;
        let payments = serde_json::to_string(&self.payments)?;

        Ok(format!(
            r#"Analisis data TPQ (Taman Pendidikan Al-Quran) berikut untuk bulan {month} {year}:

Data Santri: {students}
Data Kehadiran: {attendance}
Data Pembayaran Syahriah: {payments}

Berikan laporan ringkas dalam Bahasa Indonesia yang mencakup:
1. Ringkasan performa kehadiran santri (siapa yang paling rajin, siapa yang butuh perhatian).
2. Status keuangan syahriah (persentase lunas vs belum).
3. 3 Saran konkret untuk meningkatkan kualitas pengajaran atau kedisiplinan santri.
4. Buatkan pesan motivasi islami pendek untuk para pengajar.

Format dalam Markdown yang rapi dengan emoji yang relevan."#,
            month = self.period.month_name(),
            year = self.period.year(),
        ))
    }
}

/// Asks `generator` for the report on `input`. Any failure comes back as `AppError::Report` carrying a message fit for the
/// user.
pub async fn generate_report(
    generator: &dyn ReportGenerator,
    input: &ReportInput,
) -> Result<String, AppError> {
    let prompt = input.prompt().map_err(|e| {
        tracing::error!("failed to build report prompt: {}", e);
        AppError::Report(FAILURE_MESSAGE.to_string())
    })?;

    match generator.generate(&prompt).await {
        Ok(text) if !text.trim().is_empty() => Ok(text),
        Ok(_) => Err(AppError::Report("Gagal membuat laporan.".to_string())),
        Err(e) => {
            tracing::warn!("report generation failed: {}", e);
            Err(AppError::Report(FAILURE_MESSAGE.to_string()))
        }
    }
}
