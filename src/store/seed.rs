use crate::models::{Asatidz, AsatidzProfile, EmploymentStatus, Student, StudentProfile};

fn student(id: &str, name: &str, class_name: &str, parent: &str, join_date: &str) -> Student {
    Student {
        id: id.to_string(),
        profile: StudentProfile {
            name: name.to_string(),
            class_name: class_name.to_string(),
            parent_name: parent.to_string(),
            join_date: join_date.to_string(),
            ..StudentProfile::default()
        },
    }
}

pub fn students() -> Vec<Student> {
    vec![
        student("1", "Ahmad Fauzi", "Iqra 1", "Bapak Slamet", "2023-01-10"),
        student("2", "Siti Aminah", "Iqra 3", "Ibu Fatimah", "2023-02-15"),
        student("3", "Muhammad Yusuf", "Al-Quran", "Bapak Ali", "2023-01-20"),
        student("4", "Zahra Humaira", "Iqra 2", "Ibu Aisyah", "2023-03-05"),
        student("5", "Umar Khalid", "Iqra 5", "Bapak Usman", "2023-04-12"),
    ]
}

pub fn asatidz() -> Vec<Asatidz> {
    vec![
        Asatidz {
            id: "u1".to_string(),
            profile: AsatidzProfile {
                name: "Ustadz Ahmad".to_string(),
                specialization: "Tahsin".to_string(),
                assigned_classes: vec!["Iqra 1".to_string(), "Iqra 2".to_string()],
                join_date: "2022-07-01".to_string(),
                status: EmploymentStatus::Active,
                ..AsatidzProfile::default()
            },
        },
        Asatidz {
            id: "u2".to_string(),
            profile: AsatidzProfile {
                name: "Ustadzah Fatimah".to_string(),
                specialization: "Tajwid".to_string(),
                assigned_classes: vec!["Iqra 3".to_string(), "Al-Quran".to_string()],
                join_date: "2022-09-15".to_string(),
                status: EmploymentStatus::Active,
                ..AsatidzProfile::default()
            },
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_students_carry_their_guardian() {
        let guardians: Vec<String> = students()
            .into_iter()
            .map(|s| s.profile.parent_name)
            .collect();
        assert_eq!(
            guardians,
            vec!["Bapak Slamet", "Ibu Fatimah", "Bapak Ali", "Ibu Aisyah", "Bapak Usman"]
        );
    }
}
