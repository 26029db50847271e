//! Spreadsheet-friendly CSV dumps of the store, one table per collection.

use csv::Writer;
use tracing::error;

use crate::error::AppError;
use crate::store::EntityStore;
use crate::store::payments::MONTHS;

fn finish(wtr: Writer<Vec<u8>>) -> Result<String, AppError> {
    let bytes = wtr.into_inner().map_err(|e| {
        error!("failed to flush csv: {}", e);
        AppError::InternalServerError
    })?;
    String::from_utf8(bytes).map_err(|e| {
        error!("csv output is not utf-8: {}", e);
        AppError::InternalServerError
    })
}

fn csv_err(e: csv::Error) -> AppError {
    error!("failed to write csv row: {}", e);
    AppError::InternalServerError
}

pub fn students_csv(store: &EntityStore) -> Result<String, AppError> {
    let mut wtr = Writer::from_writer(Vec::new());
    wtr.write_record([
        "id",
        "nama",
        "kelas",
        "tempat_lahir",
        "tanggal_lahir",
        "nama_ayah",
        "nama_ibu",
        "nama_wali",
        "alamat",
        "tanggal_masuk",
    ])
    .map_err(csv_err)?;

    for s in store.students() {
        let p = &s.profile;
        let row: [&str; 10] = [
            &s.id,
            &p.name,
            &p.class_name,
            &p.birth_place,
            &p.birth_date,
            &p.father_name,
            &p.mother_name,
            &p.parent_name,
            &p.address,
            &p.join_date,
        ];
        wtr.write_record(row).map_err(csv_err)?;
    }

    finish(wtr)
}

pub fn asatidz_csv(store: &EntityStore) -> Result<String, AppError> {
    let mut wtr = Writer::from_writer(Vec::new());
    wtr.write_record([
        "id",
        "nama",
        "nik",
        "telepon",
        "alamat",
        "spesialisasi",
        "kelas",
        "tanggal_masuk",
        "status",
    ])
    .map_err(csv_err)?;

    for u in store.asatidz() {
        let p = &u.profile;
        let classes = p.assigned_classes.join("; ");
        let row: [&str; 9] = [
            &u.id,
            &p.name,
            &p.nik,
            &p.phone,
            &p.address,
            &p.specialization,
            &classes,
            &p.join_date,
            p.status.label(),
        ];
        wtr.write_record(row).map_err(csv_err)?;
    }

    finish(wtr)
}

/// Student attendance, with the student's name resolved. Records whose
/// student no longer exists keep an empty name.
pub fn attendance_csv(store: &EntityStore) -> Result<String, AppError> {
    let mut wtr = Writer::from_writer(Vec::new());
    wtr.write_record(["tanggal", "id_santri", "nama", "status"])
        .map_err(csv_err)?;

    for a in store.attendance() {
        let name = store
            .find_student(&a.student_id)
            .map(|s| s.profile.name.as_str())
            .unwrap_or("");
        let date = a.date.format("%Y-%m-%d").to_string();
        let row: [&str; 4] = [&date, &a.student_id, name, a.status.label()];
        wtr.write_record(row).map_err(csv_err)?;
    }

    finish(wtr)
}

pub fn payments_csv(store: &EntityStore) -> Result<String, AppError> {
    let mut wtr = Writer::from_writer(Vec::new());
    wtr.write_record(["id_santri", "nama", "bulan", "tahun", "jumlah", "tanggal_bayar", "status"])
        .map_err(csv_err)?;

    for p in store.payments() {
        let name = store
            .find_student(&p.student_id)
            .map(|s| s.profile.name.as_str())
            .unwrap_or("");
        let month = MONTHS.get(p.month as usize).copied().unwrap_or("");
        let year = p.year.to_string();
        let amount = p.amount.to_string();
        let paid_date = p.paid_date.map(|d| d.to_rfc3339()).unwrap_or_default();
        let row: [&str; 7] = [
            &p.student_id,
            name,
            month,
            &year,
            &amount,
            &paid_date,
            p.status.label(),
        ];
        wtr.write_record(row).map_err(csv_err)?;
    }

    finish(wtr)
}
