//! Quarterly grade aggregation for an eight-subject, four-quarter school year.

pub mod config;
pub mod error;
pub mod grades;
pub mod models;
pub mod report;
pub mod roster;
pub mod session;

pub use error::{AuthError, GradeError};
pub use grades::{average_of, classify, final_mark, subject_trend, PASSING_GRADE};
pub use models::{PassFailStatus, PeriodRecord, Quarter, StudentGradeSheet, Subject, SubjectScore};
pub use roster::{GradeSource, Roster};
pub use session::{Role, Session};
