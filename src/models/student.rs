use serde::{Deserialize, Serialize};

/// Everything about a santri except its identity. This is what the caller
/// supplies when enrolling a new student.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentProfile {
    pub name: String,
    #[serde(rename = "class")]
    pub class_name: String,
    #[serde(default)]
    pub birth_place: String,
    #[serde(default)]
    pub birth_date: String,
    #[serde(default)]
    pub father_name: String,
    #[serde(default)]
    pub mother_name: String,
    /// Guardian named on enrolment, when it is not split into father and
    /// mother.
    #[serde(default)]
    pub parent_name: String,
    #[serde(default)]
    pub address: String,
    pub join_date: String,
    /// Base64 data URL. Never leaves the device through cloud sync.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    // Portal credentials, stored in cleartext like the rest of the profile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    #[serde(flatten)]
    pub profile: StudentProfile,
}

impl Student {
    pub fn without_photo(&self) -> Self {
        let mut reduced = self.clone();
        reduced.profile.photo = None;
        reduced
    }

    /// The profile as shown to API readers: the stored password is dropped.
    pub fn without_password(&self) -> Self {
        let mut public = self.clone();
        public.profile.password = None;
        public
    }
}
