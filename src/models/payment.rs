use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    #[serde(rename = "Lunas")]
    Paid,
    #[serde(rename = "Belum Lunas")]
    Unpaid,
}

impl PaymentStatus {
    pub fn label(&self) -> &'static str {
        match self {
            PaymentStatus::Paid => "Lunas",
            PaymentStatus::Unpaid => "Belum Lunas",
        }
    }
}

/// Monthly tuition (syahriah) for one student and one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub id: String,
    pub student_id: String,
    /// 0 = January ... 11 = December
    pub month: u8,
    pub year: i32,
    pub amount: u64,
    pub paid_date: Option<DateTime<Utc>>,
    pub status: PaymentStatus,
}

impl PaymentRecord {
    pub fn is_paid(&self) -> bool {
        self.status == PaymentStatus::Paid
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TogglePaymentRequest {
    pub student_id: String,
    pub month: u8,
    pub year: i32,
    pub amount: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkSettleRequest {
    pub student_id: String,
    pub months: Vec<u8>,
    pub year: i32,
    pub monthly_amount: Option<u64>,
}
