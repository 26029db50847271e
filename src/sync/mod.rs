//! How incoming state (a cloud pull or a backup import) is folded into the
//! local store.

use std::collections::HashMap;

use serde::Serialize;

use crate::store::{Collection, EntityStore, SnapshotPatch};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergeReport {
    pub replaced: Vec<Collection>,
    pub photos_preserved: usize,
}

pub trait SyncStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn merge(&self, local: &mut EntityStore, incoming: SnapshotPatch) -> MergeReport;
}

/// Whole-collection overwrite, except photo fields.
///
/// Every collection present in the payload replaces the local one. Student
/// and staff records keep a locally held photo when the incoming record has
/// none, since the remote copy never carries photos. There is no per-record
/// comparison: edits made locally since the last push are lost on pull.
#[derive(Debug, Clone, Copy, Default)]
pub struct LastWriterWins;

fn local_photos<'a, I>(records: I) -> HashMap<String, String>
where
    I: Iterator<Item = (&'a String, &'a Option<String>)>,
{
    records
        .filter_map(|(id, photo)| photo.as_ref().map(|p| (id.clone(), p.clone())))
        .collect()
}

impl SyncStrategy for LastWriterWins {
    fn name(&self) -> &'static str {
        "last-writer-wins"
    }

    fn merge(&self, local: &mut EntityStore, incoming: SnapshotPatch) -> MergeReport {
        let mut report = MergeReport::default();

        if let Some(mut students) = incoming.students {
            let photos = local_photos(local.students.iter().map(|s| (&s.id, &s.profile.photo)));
            for s in students.iter_mut().filter(|s| s.profile.photo.is_none()) {
                if let Some(photo) = photos.get(&s.id) {
                    s.profile.photo = Some(photo.clone());
                    report.photos_preserved += 1;
                }
            }
            local.students = students;
            report.replaced.push(Collection::Students);
        }

        if let Some(mut asatidz) = incoming.asatidz {
            let photos = local_photos(local.asatidz.iter().map(|u| (&u.id, &u.profile.photo)));
            for u in asatidz.iter_mut().filter(|u| u.profile.photo.is_none()) {
                if let Some(photo) = photos.get(&u.id) {
                    u.profile.photo = Some(photo.clone());
                    report.photos_preserved += 1;
                }
            }
            local.asatidz = asatidz;
            report.replaced.push(Collection::Asatidz);
        }

        if let Some(attendance) = incoming.attendance {
            local.attendance = attendance.into();
            report.replaced.push(Collection::Attendance);
        }
        if let Some(attendance) = incoming.asatidz_attendance {
            local.asatidz_attendance = attendance.into();
            report.replaced.push(Collection::AsatidzAttendance);
        }
        if let Some(progress) = incoming.progress {
            local.progress = progress;
            report.replaced.push(Collection::Progress);
        }
        if let Some(payments) = incoming.payments {
            local.payments = payments.into();
            report.replaced.push(Collection::Payments);
        }

        report
    }
}
