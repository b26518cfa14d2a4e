use crate::dates::parse_date;
use chrono::{DateTime, Utc};
use common::model::certificate::CertificateRecord;
use common::model::validation::ValidationReport;
use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"));

static SUSPICIOUS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<script|javascript:|vbscript:|onload=|onerror=")
        .expect("valid suspicious-content pattern")
});

/// Checks a record for completeness and basic safety.
///
/// Every problem is reported; nothing fails fast.
pub fn validate(record: &CertificateRecord) -> ValidationReport {
    validate_at(record, Utc::now())
}

/// Same as [`validate`] with an explicit "now" for the future-date check.
pub fn validate_at(record: &CertificateRecord, now: DateTime<Utc>) -> ValidationReport {
    let mut errors = Vec::new();

    require(&mut errors, &record.id, "Certificate ID is missing");
    require(&mut errors, &record.certificate_title, "Certificate title is missing");
    require(&mut errors, &record.student.name, "Student name is missing");
    require(&mut errors, &record.course.title, "Course title is missing");
    require(&mut errors, &record.credential_id, "Credential ID is missing");

    if !record
        .course
        .instructors
        .iter()
        .any(|i| !i.name.trim().is_empty())
    {
        errors.push("At least one instructor is required".to_string());
    }

    require(&mut errors, &record.institution.name, "Institution name is missing");
    require(&mut errors, &record.signature.name, "Signature name is missing");

    let email = record.student.email.trim();
    if !email.is_empty() && !EMAIL.is_match(email) {
        errors.push("Invalid email format".to_string());
    }

    if record.issue_date.trim().is_empty() {
        errors.push("Issue date is missing".to_string());
    } else {
        match parse_date(&record.issue_date) {
            None => errors.push("Invalid issue date".to_string()),
            Some(date) if date.is_after(now) => {
                errors.push("Issue date cannot be in the future".to_string())
            }
            Some(_) => {}
        }
    }

    if SUSPICIOUS.is_match(&scanned_text(record)) {
        errors.push("Potentially malicious content detected".to_string());
    }

    ValidationReport::from_errors(errors)
}

fn require(errors: &mut Vec<String>, value: &str, message: &str) {
    if value.trim().is_empty() {
        errors.push(message.to_string());
    }
}

fn scanned_text(record: &CertificateRecord) -> String {
    let mut parts = vec![
        record.certificate_title.as_str(),
        record.statement.as_str(),
        record.student.name.as_str(),
        record.student.email.as_str(),
        record.course.title.as_str(),
    ];
    parts.extend(record.course.instructors.iter().map(|i| i.name.as_str()));
    parts.push(record.institution.name.as_str());
    parts.push(record.signature.name.as_str());
    parts.push(record.signature.title.as_str());
    parts.join(" ")
}
