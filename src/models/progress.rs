use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReadingType {
    #[default]
    Iqra,
    #[serde(rename = "Al-Quran")]
    AlQuran,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FluencyLevel {
    #[serde(rename = "Lancar")]
    Fluent,
    #[serde(rename = "Cukup")]
    Adequate,
    #[serde(rename = "Kurang")]
    Weak,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MemorizationStatus {
    #[serde(rename = "Lancar")]
    Fluent,
    #[default]
    #[serde(rename = "Belum")]
    NotYet,
}

/// Where the student is in the reading curriculum, e.g. Iqra jilid 3 page 12.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReadingTrack {
    #[serde(rename = "readingType")]
    pub track: ReadingType,
    #[serde(rename = "readingLevel", default)]
    pub level: String,
    #[serde(rename = "readingPage", default)]
    pub page: String,
}

/// A named memorization target: a surah, a daily dua, a hadith, prayer practice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemorizationItem {
    pub label: String,
    pub value: String,
    #[serde(default)]
    pub status: MemorizationStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredProgress")]
pub struct ProgressRecord {
    pub id: String,
    pub student_id: String,
    pub date: NaiveDate,
    #[serde(flatten)]
    pub reading: ReadingTrack,
    pub fluency: FluencyLevel,
    #[serde(default)]
    pub memorization: Vec<MemorizationItem>,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProgressRequest {
    pub student_id: String,
    pub date: NaiveDate,
    #[serde(flatten)]
    pub reading: ReadingTrack,
    pub fluency: FluencyLevel,
    #[serde(default)]
    pub memorization: Vec<MemorizationItem>,
    #[serde(default)]
    pub notes: String,
}

/// Stored shape of a progress entry. Older data keeps the four fixed targets
/// (surah, dua, hadith, shalat) in flat field pairs and extra targets in
/// `customMemorization`; both are folded into `memorization`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredProgress {
    id: String,
    student_id: String,
    date: NaiveDate,
    #[serde(flatten)]
    reading: ReadingTrack,
    fluency: FluencyLevel,
    #[serde(default)]
    memorization: Vec<MemorizationItem>,
    #[serde(default)]
    memorization_surah: Option<String>,
    #[serde(default)]
    memorization_surah_status: Option<MemorizationStatus>,
    #[serde(default)]
    memorization_dua: Option<String>,
    #[serde(default)]
    memorization_dua_status: Option<MemorizationStatus>,
    #[serde(default)]
    memorization_hadith: Option<String>,
    #[serde(default)]
    memorization_hadith_status: Option<MemorizationStatus>,
    #[serde(default)]
    memorization_shalat: Option<String>,
    #[serde(default)]
    memorization_shalat_status: Option<MemorizationStatus>,
    #[serde(default)]
    custom_memorization: Vec<MemorizationItem>,
    #[serde(default)]
    notes: String,
}

impl From<StoredProgress> for ProgressRecord {
    fn from(stored: StoredProgress) -> Self {
        let fixed = [
            ("Surat", stored.memorization_surah, stored.memorization_surah_status),
            ("Doa", stored.memorization_dua, stored.memorization_dua_status),
            ("Hadits", stored.memorization_hadith, stored.memorization_hadith_status),
            ("Shalat", stored.memorization_shalat, stored.memorization_shalat_status),
        ];

        let mut memorization = stored.memorization;
        for (label, value, status) in fixed {
            let Some(value) = value.filter(|v| !v.trim().is_empty()) else {
                continue;
            };
            memorization.push(MemorizationItem {
                label: label.to_string(),
                value,
                status: status.unwrap_or_default(),
            });
        }
        memorization.extend(stored.custom_memorization);

        Self {
            id: stored.id,
            student_id: stored.student_id,
            date: stored.date,
            reading: stored.reading,
            fluency: stored.fluency,
            memorization,
            notes: stored.notes,
        }
    }
}
