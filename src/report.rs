use std::fmt::Write;
use std::io;

use serde::Serialize;

use crate::grades;
use crate::models::{PassFailStatus, Quarter, Remarks, Student, StudentGradeSheet, Subject};
use crate::roster::{GradeSource, Roster};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    pub student_id: String,
    pub name: String,
    pub email: String,
    pub parent_email: String,
    pub grade_level: u8,
    pub quarters: usize,
    pub final_mark: Option<f64>,
    pub status: Option<PassFailStatus>,
    pub remarks: Remarks,
}

pub fn build_report(student: &Student, sheet: &StudentGradeSheet) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Quarterly Grade Report");
    let _ = writeln!(
        output,
        "Generated for {} (grade {}, {})",
        student.name, student.grade_level, student.email
    );
    let _ = writeln!(output);

    let quarters: Vec<Quarter> = sheet.periods().iter().map(|p| p.quarter).collect();
    if quarters.is_empty() {
        let _ = writeln!(output, "No grades recorded for this student.");
        return output;
    }

    let _ = writeln!(output, "## Grades");
    let header: Vec<String> = quarters.iter().map(ToString::to_string).collect();
    let _ = writeln!(output, "| Subject | {} |", header.join(" | "));
    let _ = writeln!(output, "|---|{}", "---|".repeat(quarters.len()));
    for subject in Subject::ALL {
        let cells: Vec<String> = sheet
            .periods()
            .iter()
            .map(|period| match period.get(subject) {
                Some(score) => format!("{} {}", score.value(), grades::classify(score.value())),
                None => "-".to_string(),
            })
            .collect();
        let _ = writeln!(output, "| {} | {} |", subject, cells.join(" | "));
    }

    let averages: Vec<String> = sheet
        .periods()
        .iter()
        .map(|period| match grades::average_of(period) {
            Ok(average) => format!("{average:.1} {}", grades::classify(average)),
            Err(_) => "-".to_string(),
        })
        .collect();
    let _ = writeln!(output, "| **Average** | {} |", averages.join(" | "));

    let _ = writeln!(output);
    let _ = writeln!(output, "## Final Mark");
    match grades::final_mark(sheet) {
        Ok(mark) => {
            let _ = writeln!(
                output,
                "{mark:.1} ({}, {})",
                grades::classify(mark),
                grades::band(mark)
            );
        }
        Err(err) => {
            let _ = writeln!(output, "Not available: {err}");
        }
    }

    if let Some(latest) = sheet.periods().last() {
        let suggestions = grades::suggest(latest);
        let _ = writeln!(output);
        let _ = writeln!(output, "## Suggestions ({})", latest.quarter);
        if suggestions.is_empty() {
            let _ = writeln!(output, "All subjects are at 80 or above.");
        }
        for (subject, score) in &suggestions.failing {
            let _ = writeln!(output, "- {subject}: {score} is below passing, review needed");
        }
        for (subject, score) in &suggestions.needs_improvement {
            let _ = writeln!(output, "- {subject}: {score} passes but needs improvement");
        }
    }

    output
}

/// One row per student; anything short of a complete year exports with no mark.
pub fn export_rows(roster: &Roster) -> Vec<ExportRow> {
    roster
        .students()
        .iter()
        .map(|student| {
            let sheet = roster.sheet(&student.id).ok();
            let final_mark = sheet.and_then(|sheet| grades::final_mark(sheet).ok());
            ExportRow {
                student_id: student.id.clone(),
                name: student.name.clone(),
                email: student.email.clone(),
                parent_email: student.parent_email.clone(),
                grade_level: student.grade_level,
                quarters: sheet.map_or(0, |sheet| sheet.periods().len()),
                final_mark,
                status: final_mark.map(grades::classify),
                remarks: roster.remarks(&student.id),
            }
        })
        .collect()
}

pub fn export_csv<W: io::Write>(writer: W, roster: &Roster) -> anyhow::Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    let rows = export_rows(roster);
    for row in &rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(rows.len())
}

pub fn export_json(roster: &Roster) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(&export_rows(roster))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_includes_final_mark_and_table() {
        let roster = Roster::sample().unwrap();
        let student = roster.student("1").unwrap();
        let report = build_report(student, roster.sheet("1").unwrap());

        assert!(report.contains("Generated for John Doe"));
        assert!(report.contains("| Subject | Q1 | Q2 | Q3 | Q4 |"));
        assert!(report.contains("| Math | 85 PASS | 87 PASS | 89 PASS | 91 PASS |"));
        assert!(report.contains("91.0 (PASS, Excellent)"));
    }

    #[test]
    fn partial_year_report_lists_failing_subjects() {
        let roster = Roster::sample().unwrap();
        let student = roster.student("4").unwrap();
        let report = build_report(student, roster.sheet("4").unwrap());

        assert!(report.contains("| **Average** | 69.5 FAIL |"));
        assert!(report.contains("Not available: invalid input: student 4 has no grades for Q2, Q3, Q4"));
        assert!(report.contains("- Math: 65 is below passing"));
    }

    #[test]
    fn export_rows_only_mark_complete_years() {
        let rows = export_rows(&Roster::sample().unwrap());
        assert_eq!(rows.len(), 5);
        let john = rows.iter().find(|row| row.student_id == "1").unwrap();
        assert_eq!(john.final_mark, Some(90.96875));
        assert_eq!(john.status, Some(PassFailStatus::Pass));
        assert_eq!(john.remarks, Remarks::Passed);

        // Jane only has Q1 graded.
        let jane = rows.iter().find(|row| row.student_id == "2").unwrap();
        assert_eq!(jane.quarters, 1);
        assert_eq!(jane.final_mark, None);
        assert_eq!(jane.status, None);
        assert_eq!(jane.remarks, Remarks::Incomplete);
    }

    #[test]
    fn csv_export_writes_header_and_rows() {
        let mut buffer = Vec::new();
        let written = export_csv(&mut buffer, &Roster::sample().unwrap()).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        assert_eq!(written, 5);
        assert!(text.starts_with(
            "student_id,name,email,parent_email,grade_level,quarters,final_mark,status,remarks"
        ));
        assert!(text.contains("1,John Doe,john.doe@example.com,parent.doe@example.com,7,4,90.96875,PASS,passed"));
        assert!(text.contains("4,Emily Davis,emily.davis@example.com,parent.davis@example.com,9,1,,,incomplete"));
    }
}
