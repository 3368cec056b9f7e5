use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeeStatus {
    Paid,
    Pending,
    Partial,
}

impl FeeStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "paid" => Some(Self::Paid),
            "pending" => Some(Self::Pending),
            "partial" => Some(Self::Partial),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Paid => "Paid",
            Self::Pending => "Pending",
            Self::Partial => "Partial",
        }
    }
}

impl fmt::Display for FeeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    Excused,
}

impl AttendanceStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "present" => Some(Self::Present),
            "absent" => Some(Self::Absent),
            "late" => Some(Self::Late),
            "excused" => Some(Self::Excused),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceEntry {
    pub date: String,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkEntry {
    pub subject: String,
    pub score: f64,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: u64,
    pub name: String,
    pub class: String,
    pub roll_no: String,
    pub parent_email: String,
    pub parent_password: String,
    pub fee_status: FeeStatus,
    #[serde(default)]
    pub attendance: Vec<AttendanceEntry>,
    #[serde(default)]
    pub marks: Vec<MarkEntry>,
}

impl Student {
    pub fn key(&self) -> StudentKey {
        StudentKey::new(&self.class, &self.roll_no)
    }

    /// Class membership is an exact match. Only the natural key folds case.
    pub fn in_class(&self, class: &str) -> bool {
        self.class == class
    }

    /// Insert or replace the entry for `date`.
    pub fn record_attendance(&mut self, date: &str, status: AttendanceStatus) {
        match self.attendance.iter_mut().find(|a| a.date == date) {
            Some(existing) => existing.status = status,
            None => self.attendance.push(AttendanceEntry {
                date: date.to_string(),
                status,
            }),
        }
    }

    /// Insert or replace the entry for `subject`. Returns true when an entry was replaced.
    pub fn record_mark(&mut self, subject: &str, score: f64, date: &str) -> bool {
        match self.marks.iter_mut().find(|m| m.subject == subject) {
            Some(existing) => {
                existing.score = score;
                existing.date = date.to_string();
                true
            }
            None => {
                self.marks.push(MarkEntry {
                    subject: subject.to_string(),
                    score,
                    date: date.to_string(),
                });
                false
            }
        }
    }
}

/// Natural key of a student: (class, rollNo), trimmed and case-folded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StudentKey {
    class: String,
    roll_no: String,
}

impl StudentKey {
    pub fn new(class: &str, roll_no: &str) -> Self {
        Self {
            class: normalize_key(class),
            roll_no: normalize_key(roll_no),
        }
    }
}

pub fn normalize_key(s: &str) -> String {
    s.trim().to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub password: String,
    pub subject: String,
    #[serde(default)]
    pub assigned_class: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circular {
    pub id: u64,
    pub title: String,
    pub date: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Homework {
    pub id: u64,
    pub class: String,
    pub date: String,
    pub subject: String,
    pub notes: String,
    pub teacher_name: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdminAccount {
    pub email: String,
    pub password: String,
}

/// The whole record store document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchoolData {
    #[serde(default)]
    pub admin: AdminAccount,
    #[serde(default)]
    pub teachers: Vec<Teacher>,
    #[serde(default)]
    pub students: Vec<Student>,
    #[serde(default)]
    pub circulars: Vec<Circular>,
    #[serde(default)]
    pub logs: Vec<LogEntry>,
    #[serde(default)]
    pub homework: Vec<Homework>,
    /// Class → weekly schedule. Not edited here, but carried through every write.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timetable: Option<serde_json::Value>,
}

/// Partial update: each `Some` replaces the whole top-level collection.
#[derive(Debug, Clone, Default)]
pub struct SchoolPatch {
    pub admin: Option<AdminAccount>,
    pub teachers: Option<Vec<Teacher>>,
    pub students: Option<Vec<Student>>,
    pub circulars: Option<Vec<Circular>>,
    pub logs: Option<Vec<LogEntry>>,
    pub homework: Option<Vec<Homework>>,
}

impl SchoolData {
    pub fn apply(&mut self, patch: SchoolPatch) {
        if let Some(v) = patch.admin {
            self.admin = v;
        }
        if let Some(v) = patch.teachers {
            self.teachers = v;
        }
        if let Some(v) = patch.students {
            self.students = v;
        }
        if let Some(v) = patch.circulars {
            self.circulars = v;
        }
        if let Some(v) = patch.logs {
            self.logs = v;
        }
        if let Some(v) = patch.homework {
            self.homework = v;
        }
    }

    /// Document written into a workspace the first time it is opened.
    pub fn seed() -> Self {
        Self {
            admin: AdminAccount {
                email: "admin@pshss.edu".into(),
                password: "admin123".into(),
            },
            teachers: vec![
                Teacher {
                    id: 1,
                    name: "Teacher 1".into(),
                    email: "teacher1@pshss.edu".into(),
                    password: "teacher1".into(),
                    subject: "Mathematics".into(),
                    assigned_class: "12-A".into(),
                },
                Teacher {
                    id: 2,
                    name: "Teacher 2".into(),
                    email: "teacher2@pshss.edu".into(),
                    password: "teacher2".into(),
                    subject: "Science".into(),
                    assigned_class: "12-B".into(),
                },
            ],
            students: vec![
                Student {
                    id: 1,
                    name: "Student 1".into(),
                    class: "12-A".into(),
                    roll_no: "12A01".into(),
                    parent_email: "student1@pshss.edu".into(),
                    parent_password: "student1".into(),
                    fee_status: FeeStatus::Paid,
                    attendance: Vec::new(),
                    marks: Vec::new(),
                },
                Student {
                    id: 2,
                    name: "Student 2".into(),
                    class: "12-B".into(),
                    roll_no: "12B01".into(),
                    parent_email: "student2@pshss.edu".into(),
                    parent_password: "student2".into(),
                    fee_status: FeeStatus::Paid,
                    attendance: Vec::new(),
                    marks: Vec::new(),
                },
            ],
            circulars: vec![Circular {
                id: 1,
                title: "Holiday Announcement".into(),
                date: "2024-07-10".into(),
                text: "School will remain closed on 15th August for Independence Day.".into(),
            }],
            logs: Vec::new(),
            homework: Vec::new(),
            timetable: None,
        }
    }
}

pub fn next_id<I: IntoIterator<Item = u64>>(ids: I) -> u64 {
    ids.into_iter().max().unwrap_or(0) + 1
}
