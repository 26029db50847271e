use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EmploymentStatus {
    #[default]
    #[serde(rename = "Aktif")]
    Active,
    #[serde(rename = "Cuti")]
    OnLeave,
    #[serde(rename = "Non-Aktif")]
    Inactive,
}

impl EmploymentStatus {
    pub fn label(&self) -> &'static str {
        match self {
            EmploymentStatus::Active => "Aktif",
            EmploymentStatus::OnLeave => "Cuti",
            EmploymentStatus::Inactive => "Non-Aktif",
        }
    }
}

/// Teaching staff profile (ustadz / ustadzah).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsatidzProfile {
    pub name: String,
    #[serde(default)]
    pub nik: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub specialization: String,
    #[serde(default)]
    pub assigned_classes: Vec<String>,
    pub join_date: String,
    #[serde(default)]
    pub status: EmploymentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asatidz {
    pub id: String,
    #[serde(flatten)]
    pub profile: AsatidzProfile,
}

impl Asatidz {
    pub fn without_photo(&self) -> Self {
        let mut reduced = self.clone();
        reduced.profile.photo = None;
        reduced
    }

    pub fn without_password(&self) -> Self {
        let mut public = self.clone();
        public.profile.password = None;
        public
    }
}
