use tracing::debug;

use crate::error::{GradeError, Result};
use crate::models::{
    GradeBand, PassFailStatus, PeriodRecord, Quarter, Remarks, StudentGradeSheet, Subject,
    SubjectAverage, Suggestions,
};

pub const PASSING_GRADE: f64 = 75.0;
const IMPROVEMENT_CEILING: f64 = 80.0;

pub fn average_of(record: &PeriodRecord) -> Result<f64> {
    if record.is_empty() {
        return Err(GradeError::invalid(format!(
            "cannot average an empty {} record",
            record.quarter
        )));
    }

    let total: f64 = record.iter().map(|(_, score)| score.value()).sum();
    Ok(total / record.len() as f64)
}

pub fn classify(average: f64) -> PassFailStatus {
    if average >= PASSING_GRADE {
        PassFailStatus::Pass
    } else {
        PassFailStatus::Fail
    }
}

pub fn band(value: f64) -> GradeBand {
    if value >= 90.0 {
        GradeBand::Excellent
    } else if value >= 80.0 {
        GradeBand::VeryGood
    } else if value >= PASSING_GRADE {
        GradeBand::Satisfactory
    } else {
        GradeBand::Failed
    }
}

fn ensure_recorded(sheet: &StudentGradeSheet) -> Result<()> {
    if sheet.periods().is_empty() {
        return Err(GradeError::invalid(format!(
            "student {} has no grade record",
            sheet.student_id
        )));
    }
    Ok(())
}

/// Mean of the four quarter averages. Every quarter weighs the same no matter
/// how many scores it holds, so this is not the pooled mean of all scores.
pub fn final_mark(sheet: &StudentGradeSheet) -> Result<f64> {
    ensure_recorded(sheet)?;
    let periods = sheet.periods();
    if periods.len() != Quarter::ALL.len() {
        let missing: Vec<String> = Quarter::ALL
            .into_iter()
            .filter(|quarter| sheet.period(*quarter).is_none())
            .map(|quarter| quarter.to_string())
            .collect();
        return Err(GradeError::invalid(format!(
            "student {} has no grades for {}",
            sheet.student_id,
            missing.join(", ")
        )));
    }

    let mut total = 0.0;
    for period in periods {
        if !period.is_complete() {
            let missing: Vec<&str> = period
                .missing_subjects()
                .into_iter()
                .map(Subject::name)
                .collect();
            return Err(GradeError::invalid(format!(
                "{} for student {} is missing {}",
                period.quarter,
                sheet.student_id,
                missing.join(", ")
            )));
        }
        total += average_of(period)?;
    }

    let mark = total / periods.len() as f64;
    debug!(student = %sheet.student_id, quarters = periods.len(), mark, "computed final mark");
    Ok(mark)
}

/// An empty sheet is an error here too, never an empty trend.
pub fn subject_trend(sheet: &StudentGradeSheet, subject: Subject) -> Result<Vec<f64>> {
    ensure_recorded(sheet)?;
    sheet
        .periods()
        .iter()
        .map(|period| {
            period.get(subject).map(|score| score.value()).ok_or_else(|| {
                GradeError::invalid(format!(
                    "{} has no {} score for student {}",
                    period.quarter, subject, sheet.student_id
                ))
            })
        })
        .collect()
}

pub fn subject_average(sheet: &StudentGradeSheet, subject: Subject) -> Result<f64> {
    let trend = subject_trend(sheet, subject)?;
    Ok(trend.iter().sum::<f64>() / trend.len() as f64)
}

/// Subjects ordered by their cross-quarter average, highest first.
pub fn subject_ranking(sheet: &StudentGradeSheet) -> Result<Vec<SubjectAverage>> {
    let mut averages = Subject::ALL
        .into_iter()
        .map(|subject| {
            subject_average(sheet, subject).map(|average| SubjectAverage { subject, average })
        })
        .collect::<Result<Vec<_>>>()?;

    // sort_by is stable, so ties keep subject order.
    averages.sort_by(|a, b| {
        b.average
            .partial_cmp(&a.average)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    Ok(averages)
}

/// Full-year remark: incomplete until all four quarters are fully graded.
pub fn remarks(sheet: &StudentGradeSheet) -> Remarks {
    match final_mark(sheet).map(classify) {
        Ok(PassFailStatus::Pass) => Remarks::Passed,
        Ok(PassFailStatus::Fail) => Remarks::Failed,
        Err(_) => Remarks::Incomplete,
    }
}

pub fn suggest(record: &PeriodRecord) -> Suggestions {
    let mut suggestions = Suggestions::default();

    for (subject, score) in record.iter() {
        let value = score.value();
        if value < PASSING_GRADE {
            suggestions.failing.push((subject, value));
        } else if value < IMPROVEMENT_CEILING {
            suggestions.needs_improvement.push((subject, value));
        }
    }

    let by_score = |a: &(Subject, f64), b: &(Subject, f64)| {
        a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal)
    };
    suggestions.failing.sort_by(by_score);
    suggestions.needs_improvement.sort_by(by_score);
    suggestions
}
