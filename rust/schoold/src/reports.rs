use crate::model::{AttendanceStatus, FeeStatus, SchoolData, Student};
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRow {
    pub name: String,
    pub class: String,
    pub roll_no: String,
    pub date: String,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AttendanceSummary {
    pub total: usize,
    pub present: usize,
    pub absent: usize,
    pub late: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBand {
    High,
    Medium,
    Low,
}

impl ScoreBand {
    pub fn of(score: f64) -> Self {
        if score >= 80.0 {
            Self::High
        } else if score >= 60.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkRow {
    pub name: String,
    pub class: String,
    pub roll_no: String,
    pub subject: String,
    pub score: f64,
    pub date: String,
    pub band: ScoreBand,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MarkSummary {
    pub total: usize,
    pub average: f64,
    pub highest: f64,
    pub lowest: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FeeCounts {
    pub paid: usize,
    pub pending: usize,
    pub partial: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardCounts {
    pub teachers: usize,
    pub students: usize,
    pub circulars: usize,
    pub logs: usize,
    pub fees: FeeCounts,
}

pub fn round_off_1_decimal(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

pub fn classes(students: &[Student]) -> Vec<String> {
    students
        .iter()
        .map(|s| s.class.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn in_class<'a>(students: &'a [Student], class: Option<&'a str>) -> impl Iterator<Item = &'a Student> {
    students
        .iter()
        .filter(move |s| class.map_or(true, |c| s.in_class(c)))
}

/// Newest date first.
pub fn attendance_rows(students: &[Student], class: Option<&str>) -> Vec<AttendanceRow> {
    let mut rows = in_class(students, class)
        .flat_map(|s| {
            s.attendance.iter().map(move |a| AttendanceRow {
                name: s.name.clone(),
                class: s.class.clone(),
                roll_no: s.roll_no.clone(),
                date: a.date.clone(),
                status: a.status,
            })
        })
        .collect::<Vec<_>>();
    rows.sort_by(|a, b| b.date.cmp(&a.date));
    rows
}

pub fn attendance_summary(rows: &[AttendanceRow]) -> AttendanceSummary {
    let count = |status| rows.iter().filter(|r| r.status == status).count();
    AttendanceSummary {
        total: rows.len(),
        present: count(AttendanceStatus::Present),
        absent: count(AttendanceStatus::Absent),
        late: count(AttendanceStatus::Late),
    }
}

pub fn mark_rows(students: &[Student], class: Option<&str>) -> Vec<MarkRow> {
    let mut rows = in_class(students, class)
        .flat_map(|s| {
            s.marks.iter().map(move |m| MarkRow {
                name: s.name.clone(),
                class: s.class.clone(),
                roll_no: s.roll_no.clone(),
                subject: m.subject.clone(),
                score: m.score,
                date: m.date.clone(),
                band: ScoreBand::of(m.score),
            })
        })
        .collect::<Vec<_>>();
    rows.sort_by(|a, b| b.date.cmp(&a.date));
    rows
}

pub fn mark_summary(rows: &[MarkRow]) -> MarkSummary {
    if rows.is_empty() {
        return MarkSummary::default();
    }
    let total = rows.len();
    let sum: f64 = rows.iter().map(|r| r.score).sum();
    MarkSummary {
        total,
        average: round_off_1_decimal(sum / total as f64),
        highest: rows.iter().map(|r| r.score).fold(f64::MIN, f64::max),
        lowest: rows.iter().map(|r| r.score).fold(f64::MAX, f64::min),
    }
}

pub fn dashboard(data: &SchoolData) -> DashboardCounts {
    let mut fees = FeeCounts::default();
    for s in &data.students {
        match s.fee_status {
            FeeStatus::Paid => fees.paid += 1,
            FeeStatus::Pending => fees.pending += 1,
            FeeStatus::Partial => fees.partial += 1,
        }
    }
    DashboardCounts {
        teachers: data.teachers.len(),
        students: data.students.len(),
        circulars: data.circulars.len(),
        logs: data.logs.len(),
        fees,
    }
}
