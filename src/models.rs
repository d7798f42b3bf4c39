use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{GradeError, Result};

/// The eight curriculum areas every quarter is graded on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Subject {
    Math,
    English,
    Filipino,
    #[serde(rename = "TLE")]
    Tle,
    Science,
    #[serde(rename = "MAPEH")]
    Mapeh,
    #[serde(rename = "ESP")]
    Esp,
    #[serde(rename = "AP")]
    Ap,
}

impl Subject {
    pub const ALL: [Subject; 8] = [
        Subject::Math,
        Subject::English,
        Subject::Filipino,
        Subject::Tle,
        Subject::Science,
        Subject::Mapeh,
        Subject::Esp,
        Subject::Ap,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Subject::Math => "Math",
            Subject::English => "English",
            Subject::Filipino => "Filipino",
            Subject::Tle => "TLE",
            Subject::Science => "Science",
            Subject::Mapeh => "MAPEH",
            Subject::Esp => "ESP",
            Subject::Ap => "AP",
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Subject {
    type Err = GradeError;

    fn from_str(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        Subject::ALL
            .into_iter()
            .find(|subject| subject.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| GradeError::invalid(format!("unknown subject '{trimmed}'")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Quarter {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quarter {
    pub const ALL: [Quarter; 4] = [Quarter::Q1, Quarter::Q2, Quarter::Q3, Quarter::Q4];

    pub fn number(self) -> u8 {
        match self {
            Quarter::Q1 => 1,
            Quarter::Q2 => 2,
            Quarter::Q3 => 3,
            Quarter::Q4 => 4,
        }
    }

    pub fn from_number(number: u8) -> Result<Self> {
        match number {
            1 => Ok(Quarter::Q1),
            2 => Ok(Quarter::Q2),
            3 => Ok(Quarter::Q3),
            4 => Ok(Quarter::Q4),
            other => Err(GradeError::invalid(format!(
                "quarter must be between 1 and 4, got {other}"
            ))),
        }
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q{}", self.number())
    }
}

impl FromStr for Quarter {
    type Err = GradeError;

    fn from_str(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        let digits = trimmed
            .strip_prefix('q')
            .or_else(|| trimmed.strip_prefix('Q'))
            .unwrap_or(trimmed);
        let number: u8 = digits
            .parse()
            .map_err(|_| GradeError::invalid(format!("unknown quarter '{trimmed}'")))?;
        Quarter::from_number(number)
    }
}

/// A score on the 0-100 scale. Construction rejects anything outside it.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct SubjectScore(f64);

impl SubjectScore {
    pub const MIN: f64 = 0.0;
    pub const MAX: f64 = 100.0;

    pub fn new(value: f64) -> Result<Self> {
        if !value.is_finite() || !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(GradeError::invalid(format!(
                "score {value} is outside {}-{}",
                Self::MIN,
                Self::MAX
            )));
        }
        Ok(SubjectScore(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for SubjectScore {
    type Error = GradeError;

    fn try_from(value: f64) -> Result<Self> {
        SubjectScore::new(value)
    }
}

/// Scores for one quarter, keyed by subject.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodRecord {
    pub quarter: Quarter,
    scores: BTreeMap<Subject, SubjectScore>,
}

impl PeriodRecord {
    pub fn new(quarter: Quarter) -> Self {
        PeriodRecord {
            quarter,
            scores: BTreeMap::new(),
        }
    }

    pub fn from_scores<I>(quarter: Quarter, scores: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Subject, f64)>,
    {
        let mut record = PeriodRecord::new(quarter);
        for (subject, value) in scores {
            record.set(subject, SubjectScore::new(value)?);
        }
        Ok(record)
    }

    /// Replaces any previous score for the subject.
    pub fn set(&mut self, subject: Subject, score: SubjectScore) -> Option<SubjectScore> {
        self.scores.insert(subject, score)
    }

    pub fn get(&self, subject: Subject) -> Option<SubjectScore> {
        self.scores.get(&subject).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Subject, SubjectScore)> + '_ {
        self.scores.iter().map(|(subject, score)| (*subject, *score))
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        Subject::ALL.iter().all(|subject| self.scores.contains_key(subject))
    }

    pub fn missing_subjects(&self) -> Vec<Subject> {
        Subject::ALL
            .into_iter()
            .filter(|subject| !self.scores.contains_key(subject))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentGradeSheet {
    pub student_id: String,
    periods: Vec<PeriodRecord>,
}

impl StudentGradeSheet {
    pub fn new(student_id: impl Into<String>) -> Self {
        StudentGradeSheet {
            student_id: student_id.into(),
            periods: Vec::new(),
        }
    }

    /// Inserts a quarter, keeping periods in quarter order.
    pub fn add_period(&mut self, record: PeriodRecord) -> Result<()> {
        match self
            .periods
            .binary_search_by_key(&record.quarter, |period| period.quarter)
        {
            Ok(_) => Err(GradeError::invalid(format!(
                "{} already recorded for student {}",
                record.quarter, self.student_id
            ))),
            Err(index) => {
                self.periods.insert(index, record);
                Ok(())
            }
        }
    }

    pub fn period(&self, quarter: Quarter) -> Option<&PeriodRecord> {
        self.periods.iter().find(|period| period.quarter == quarter)
    }

    pub fn periods(&self) -> &[PeriodRecord] {
        &self.periods
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PassFailStatus {
    Pass,
    Fail,
}

impl fmt::Display for PassFailStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PassFailStatus::Pass => f.write_str("PASS"),
            PassFailStatus::Fail => f.write_str("FAIL"),
        }
    }
}

/// Year-end standing used when filtering the student list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Remarks {
    Passed,
    Failed,
    Incomplete,
}

impl fmt::Display for Remarks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Remarks::Passed => f.write_str("passed"),
            Remarks::Failed => f.write_str("failed"),
            Remarks::Incomplete => f.write_str("incomplete"),
        }
    }
}

impl FromStr for Remarks {
    type Err = GradeError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "passed" => Ok(Remarks::Passed),
            "failed" => Ok(Remarks::Failed),
            "incomplete" => Ok(Remarks::Incomplete),
            other => Err(GradeError::invalid(format!("unknown remarks '{other}'"))),
        }
    }
}

/// Legend bands shown next to grades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GradeBand {
    Excellent,
    VeryGood,
    Satisfactory,
    Failed,
}

impl fmt::Display for GradeBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            GradeBand::Excellent => "Excellent",
            GradeBand::VeryGood => "Very Good",
            GradeBand::Satisfactory => "Satisfactory",
            GradeBand::Failed => "Failed",
        };
        f.write_str(label)
    }
}

/// Junior high school grade levels.
pub const GRADE_LEVELS: std::ops::RangeInclusive<u8> = 7..=10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    pub name: String,
    pub email: String,
    pub parent_email: String,
    pub grade_level: u8,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectAverage {
    pub subject: Subject,
    pub average: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Suggestions {
    pub failing: Vec<(Subject, f64)>,
    pub needs_improvement: Vec<(Subject, f64)>,
}

impl Suggestions {
    pub fn is_empty(&self) -> bool {
        self.failing.is_empty() && self.needs_improvement.is_empty()
    }
}
