use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{GradeError, Result};
use crate::grades;
use crate::models::{
    PeriodRecord, Quarter, Remarks, Student, StudentGradeSheet, Subject, SubjectScore,
    GRADE_LEVELS,
};

/// Where views get students and grade sheets from.
pub trait GradeSource {
    fn students(&self) -> &[Student];

    fn sheet(&self, student_id: &str) -> Result<&StudentGradeSheet>;

    fn student(&self, student_id: &str) -> Result<&Student> {
        self.students()
            .iter()
            .find(|student| student.id == student_id)
            .ok_or_else(|| GradeError::invalid(format!("no student with id {student_id}")))
    }
}

/// Student list filters; unset fields match everyone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StudentFilter {
    pub term: String,
    pub grade_level: Option<u8>,
    pub status: Option<String>,
    pub remarks: Option<Remarks>,
}

#[derive(Debug, Clone, Default)]
pub struct Roster {
    students: Vec<Student>,
    sheets: BTreeMap<String, StudentGradeSheet>,
}

impl GradeSource for Roster {
    fn students(&self) -> &[Student] {
        &self.students
    }

    fn sheet(&self, student_id: &str) -> Result<&StudentGradeSheet> {
        self.sheets
            .get(student_id)
            .ok_or_else(|| GradeError::invalid(format!("student {student_id} has no grade record")))
    }
}

impl Roster {
    pub fn new() -> Self {
        Roster::default()
    }

    /// Adds or replaces a student's profile.
    pub fn upsert_student(&mut self, student: Student) {
        match self.students.iter_mut().find(|s| s.id == student.id) {
            Some(existing) => *existing = student,
            None => self.students.push(student),
        }
    }

    pub fn find_by_email(&self, email: &str) -> Option<&Student> {
        self.students
            .iter()
            .find(|student| student.email.eq_ignore_ascii_case(email.trim()))
    }

    /// Case-insensitive match on name or email; an empty term matches everyone.
    pub fn search(&self, term: &str) -> Vec<&Student> {
        self.filter(&StudentFilter {
            term: term.to_string(),
            ..StudentFilter::default()
        })
    }

    pub fn by_grade_level(&self, level: u8) -> Vec<&Student> {
        self.filter(&StudentFilter {
            grade_level: Some(level),
            ..StudentFilter::default()
        })
    }

    pub fn by_status(&self, status: &str) -> Vec<&Student> {
        self.filter(&StudentFilter {
            status: Some(status.to_string()),
            ..StudentFilter::default()
        })
    }

    /// Year-end remarks; students without a sheet count as incomplete.
    pub fn remarks(&self, student_id: &str) -> Remarks {
        self.sheets
            .get(student_id)
            .map_or(Remarks::Incomplete, grades::remarks)
    }

    pub fn filter(&self, filter: &StudentFilter) -> Vec<&Student> {
        let needle = filter.term.trim().to_lowercase();
        self.students
            .iter()
            .filter(|student| {
                student.name.to_lowercase().contains(&needle)
                    || student.email.to_lowercase().contains(&needle)
            })
            .filter(|student| filter.grade_level.map_or(true, |level| student.grade_level == level))
            .filter(|student| {
                filter
                    .status
                    .as_deref()
                    .map_or(true, |status| student.status.eq_ignore_ascii_case(status.trim()))
            })
            .filter(|student| {
                filter
                    .remarks
                    .map_or(true, |remarks| self.remarks(&student.id) == remarks)
            })
            .collect()
    }

    pub fn sample() -> Result<Self> {
        let mut roster = Roster::new();

        let profiles = [
            ("1", "John Doe", "john.doe", 7, "Active"),
            ("2", "Jane Smith", "jane.smith", 7, "Active"),
            ("3", "Robert Johnson", "robert.johnson", 8, "Active"),
            ("4", "Emily Davis", "emily.davis", 9, "Inactive"),
            ("5", "Michael Wilson", "michael.wilson", 10, "Active"),
        ];
        for (id, name, handle, grade_level, status) in profiles {
            let family = handle.split('.').nth(1).unwrap_or(handle);
            roster.upsert_student(Student {
                id: id.to_string(),
                name: name.to_string(),
                email: format!("{handle}@example.com"),
                parent_email: format!("parent.{family}@example.com"),
                grade_level,
                status: status.to_string(),
            });
        }

        // Subject order: Math, English, Filipino, TLE, Science, MAPEH, ESP, AP.
        let quarters: [(&str, Quarter, [f64; 8]); 8] = [
            ("1", Quarter::Q1, [85.0, 90.0, 88.0, 92.0, 87.0, 94.0, 89.0, 91.0]),
            ("1", Quarter::Q2, [87.0, 92.0, 90.0, 94.0, 89.0, 95.0, 91.0, 93.0]),
            ("1", Quarter::Q3, [89.0, 91.0, 87.0, 93.0, 90.0, 92.0, 88.0, 94.0]),
            ("1", Quarter::Q4, [91.0, 93.0, 89.0, 95.0, 92.0, 94.0, 90.0, 96.0]),
            ("2", Quarter::Q1, [78.0, 82.0, 80.0, 85.0, 79.0, 88.0, 81.0, 83.0]),
            ("3", Quarter::Q1, [92.0, 88.0, 90.0, 94.0, 91.0, 89.0, 93.0, 87.0]),
            ("4", Quarter::Q1, [65.0, 70.0, 68.0, 72.0, 67.0, 74.0, 69.0, 71.0]),
            ("5", Quarter::Q1, [88.0, 92.0, 90.0, 94.0, 89.0, 91.0, 93.0, 87.0]),
        ];
        for (student_id, quarter, values) in quarters {
            let sheet = roster
                .sheets
                .entry(student_id.to_string())
                .or_insert_with(|| StudentGradeSheet::new(student_id));
            let scores = Subject::ALL.into_iter().zip(values);
            sheet.add_period(PeriodRecord::from_scores(quarter, scores)?)?;
        }

        Ok(roster)
    }

    /// Loads long-format rows: one score per line.
    pub fn load_csv(path: &Path) -> anyhow::Result<Self> {
        #[derive(Deserialize)]
        struct CsvRow {
            student_id: String,
            name: String,
            email: String,
            #[serde(default)]
            parent_email: String,
            grade_level: u8,
            #[serde(default = "default_status")]
            status: String,
            quarter: String,
            subject: String,
            score: f64,
        }

        fn default_status() -> String {
            "Active".to_string()
        }

        let mut reader = csv::Reader::from_path(path)
            .with_context(|| format!("failed to open roster {}", path.display()))?;
        let mut roster = Roster::new();
        let mut periods: BTreeMap<(String, Quarter), PeriodRecord> = BTreeMap::new();
        let mut rows = 0usize;

        for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
            let line = index + 2;
            let row = result.with_context(|| format!("malformed roster row on line {line}"))?;
            let quarter: Quarter = row
                .quarter
                .parse()
                .with_context(|| format!("line {line}"))?;
            let subject: Subject = row
                .subject
                .parse()
                .with_context(|| format!("line {line}"))?;
            let score = SubjectScore::new(row.score).with_context(|| format!("line {line}"))?;
            if !GRADE_LEVELS.contains(&row.grade_level) {
                anyhow::bail!(
                    "line {line}: grade level {} is outside {}-{}",
                    row.grade_level,
                    GRADE_LEVELS.start(),
                    GRADE_LEVELS.end()
                );
            }

            let record = periods
                .entry((row.student_id.clone(), quarter))
                .or_insert_with(|| PeriodRecord::new(quarter));
            if record.set(subject, score).is_some() {
                anyhow::bail!(
                    "line {line}: duplicate {subject} score for student {} in {quarter}",
                    row.student_id
                );
            }

            roster.upsert_student(Student {
                id: row.student_id,
                name: row.name,
                email: row.email,
                parent_email: row.parent_email,
                grade_level: row.grade_level,
                status: row.status,
            });
            rows += 1;
        }

        for ((student_id, _), record) in periods {
            let sheet = roster
                .sheets
                .entry(student_id.clone())
                .or_insert_with(|| StudentGradeSheet::new(student_id));
            sheet.add_period(record)?;
        }

        info!(
            path = %path.display(),
            rows,
            students = roster.students.len(),
            "loaded roster"
        );
        for sheet in roster.sheets.values() {
            let incomplete = sheet.periods().iter().filter(|p| !p.is_complete()).count();
            if incomplete > 0 {
                debug!(student = %sheet.student_id, incomplete, "roster has incomplete quarters");
            }
        }

        Ok(roster)
    }
}
