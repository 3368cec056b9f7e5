use super::validate::{MarkRecord, NewStudent};
use crate::model::{next_id, normalize_key, Student, StudentKey};
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StudentMergeOutcome {
    pub added: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MarkMergeOutcome {
    pub updated: usize,
    pub added: usize,
    pub unmatched: usize,
}

impl MarkMergeOutcome {
    pub fn students_touched(&self) -> usize {
        self.updated + self.added
    }
}

/// Append every record whose (class, rollNo) is not already present.
///
/// New ids continue from the current maximum, so they never collide inside one batch.
pub fn merge_students(
    existing: &[Student],
    records: &[NewStudent],
) -> (Vec<Student>, StudentMergeOutcome) {
    let base_id = next_id(existing.iter().map(|s| s.id));
    let mut keys = existing.iter().map(Student::key).collect::<HashSet<_>>();
    let mut out = existing.to_vec();
    let mut outcome = StudentMergeOutcome::default();

    for r in records {
        let key = StudentKey::new(&r.class, &r.roll_no);
        if !keys.insert(key) {
            outcome.skipped += 1;
            continue;
        }
        out.push(Student {
            id: base_id + outcome.added as u64,
            name: r.name.clone(),
            class: r.class.clone(),
            roll_no: r.roll_no.clone(),
            parent_email: r.parent_email.clone(),
            parent_password: r.parent_password.clone(),
            fee_status: r.fee_status,
            attendance: Vec::new(),
            marks: Vec::new(),
        });
        outcome.added += 1;
    }

    (out, outcome)
}

/// Upsert `subject` scores for students of `class`, matched by rollNo.
///
/// The first record for a roll number wins. Students outside the class pass through untouched.
pub fn merge_marks(
    existing: &[Student],
    class: &str,
    subject: &str,
    records: &[MarkRecord],
    now: &str,
) -> (Vec<Student>, MarkMergeOutcome) {
    let mut matched_rolls = HashSet::new();
    let mut outcome = MarkMergeOutcome::default();

    let out = existing
        .iter()
        .map(|student| {
            if !student.in_class(class) {
                return student.clone();
            }
            let roll = normalize_key(&student.roll_no);
            let Some(record) = records.iter().find(|r| normalize_key(&r.roll_no) == roll) else {
                return student.clone();
            };
            matched_rolls.insert(roll);
            let mut next = student.clone();
            if next.record_mark(subject, record.score, now) {
                outcome.updated += 1;
            } else {
                outcome.added += 1;
            }
            next
        })
        .collect::<Vec<_>>();

    outcome.unmatched = records
        .iter()
        .map(|r| normalize_key(&r.roll_no))
        .collect::<HashSet<_>>()
        .difference(&matched_rolls)
        .count();

    (out, outcome)
}
