//! Login verification over the roster.
//!
//! Credentials live in cleartext inside the Student and Asatidz profiles; this
//! only compares them. The result is all-or-nothing: a `User` or `None`.

use crate::config::AdminAccount;
use crate::models::{Asatidz, LoginRequest, Student, User, UserRole};

fn matches(username: &Option<String>, password: &Option<String>, req: &LoginRequest) -> bool {
    username.as_deref() == Some(req.username.as_str())
        && password.as_deref() == Some(req.password.as_str())
}

pub fn verify_login(
    req: &LoginRequest,
    students: &[Student],
    asatidz: &[Asatidz],
    admin: &AdminAccount,
) -> Option<User> {
    if req.username.trim().is_empty() || req.password.is_empty() {
        return None;
    }

    match req.role {
        UserRole::Asatidz => {
            if req.username == admin.username && req.password == admin.password {
                return Some(User {
                    id: "admin".to_string(),
                    name: admin.display_name.clone(),
                    username: admin.username.clone(),
                    role: UserRole::Asatidz,
                    student_id: None,
                });
            }
            asatidz
                .iter()
                .find(|u| matches(&u.profile.username, &u.profile.password, req))
                .map(|u| User {
                    id: u.id.clone(),
                    name: u.profile.name.clone(),
                    username: req.username.clone(),
                    role: UserRole::Asatidz,
                    student_id: None,
                })
        }
        UserRole::Santri => students
            .iter()
            .find(|s| matches(&s.profile.username, &s.profile.password, req))
            .map(|s| User {
                id: s.id.clone(),
                name: s.profile.name.clone(),
                username: req.username.clone(),
                role: UserRole::Santri,
                student_id: Some(s.id.clone()),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::seed;

    fn login(username: &str, password: &str, role: UserRole) -> LoginRequest {
        LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
            role,
        }
    }

    #[test]
    fn test_admin_account_logs_in_as_asatidz() {
        let admin = AdminAccount::default();
        let user = verify_login(&login("admin", "admin123", UserRole::Asatidz), &[], &[], &admin)
            .unwrap();
        assert_eq!(user.role, UserRole::Asatidz);
        assert_eq!(user.name, "Ustadz Ahmad");

        assert!(verify_login(&login("admin", "admin123", UserRole::Santri), &[], &[], &admin).is_none());
    }

    #[test]
    fn test_santri_login_links_student_record() {
        let mut students = seed::students();
        students[2].profile.username = Some("yusuf".to_string());
        students[2].profile.password = Some("rahasia".to_string());

        let admin = AdminAccount::default();
        let user = verify_login(&login("yusuf", "rahasia", UserRole::Santri), &students, &[], &admin)
            .unwrap();
        assert_eq!(user.student_id.as_deref(), Some("3"));

        assert!(verify_login(&login("yusuf", "salah", UserRole::Santri), &students, &[], &admin).is_none());
    }

    #[test]
    fn test_profiles_without_credentials_never_match() {
        let students = seed::students();
        let asatidz = seed::asatidz();
        let admin = AdminAccount::default();

        assert!(verify_login(&login("", "", UserRole::Santri), &students, &asatidz, &admin).is_none());
        assert!(verify_login(&login("u1", "x", UserRole::Asatidz), &students, &asatidz, &admin).is_none());
    }
}
