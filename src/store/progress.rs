use super::EntityStore;
use super::roster::new_id;
use crate::models::{NewProgressRequest, ProgressRecord};

impl EntityStore {
    /// Adds a new entry at the head of the log. Entries are never merged, even
    /// for the same student and day.
    pub fn append_progress(&mut self, req: NewProgressRequest) -> &ProgressRecord {
        let record = ProgressRecord {
            id: new_id(),
            student_id: req.student_id,
            date: req.date,
            reading: req.reading,
            fluency: req.fluency,
            memorization: req.memorization,
            notes: req.notes,
        };
        self.progress.insert(0, record);
        &self.progress[0]
    }

    /// The student's timeline, newest session date first. Entries sharing a
    /// date keep the order they were logged in, most recent first.
    pub fn progress_for_student(&self, student_id: &str) -> Vec<&ProgressRecord> {
        let mut timeline: Vec<&ProgressRecord> = self
            .progress
            .iter()
            .filter(|p| p.student_id == student_id)
            .collect();
        timeline.sort_by(|a, b| b.date.cmp(&a.date));
        timeline
    }
}
