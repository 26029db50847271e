use serde::Serialize;
use uuid::Uuid;

use super::EntityStore;
use crate::models::{Asatidz, AsatidzProfile, Student, StudentProfile};

/// What a student delete took with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StudentRemoval {
    pub attendance: usize,
    pub progress: usize,
    pub payments: usize,
}

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

impl EntityStore {
    pub fn add_student(&mut self, profile: StudentProfile) -> Student {
        let student = Student {
            id: new_id(),
            profile,
        };
        self.students.push(student.clone());
        student
    }

    /// Replaces the student with the same id in place. Returns `false` when
    /// no such student exists.
    pub fn update_student(&mut self, student: Student) -> bool {
        match self.students.iter_mut().find(|s| s.id == student.id) {
            Some(slot) => {
                *slot = student;
                true
            }
            None => false,
        }
    }

    /// Removes the student together with its attendance, progress and
    /// payment records.
    pub fn delete_student(&mut self, id: &str) -> Option<StudentRemoval> {
        let pos = self.students.iter().position(|s| s.id == id)?;
        self.students.remove(pos);

        let attendance = self.attendance.retain(|a| a.student_id != id);
        let before = self.progress.len();
        self.progress.retain(|p| p.student_id != id);
        let progress = before - self.progress.len();
        let payments = self.payments.retain(|p| p.student_id != id);

        Some(StudentRemoval {
            attendance,
            progress,
            payments,
        })
    }

    pub fn add_asatidz(&mut self, profile: AsatidzProfile) -> Asatidz {
        let ustadz = Asatidz {
            id: new_id(),
            profile,
        };
        self.asatidz.push(ustadz.clone());
        ustadz
    }

    pub fn update_asatidz(&mut self, ustadz: Asatidz) -> bool {
        match self.asatidz.iter_mut().find(|u| u.id == ustadz.id) {
            Some(slot) => {
                *slot = ustadz;
                true
            }
            None => false,
        }
    }

    /// Removes the staff member and its attendance records. Returns how many
    /// attendance records went with it.
    pub fn delete_asatidz(&mut self, id: &str) -> Option<usize> {
        let pos = self.asatidz.iter().position(|u| u.id == id)?;
        self.asatidz.remove(pos);
        Some(self.asatidz_attendance.retain(|a| a.asatidz_id != id))
    }
}
