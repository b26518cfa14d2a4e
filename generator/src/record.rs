//! Record lifecycle helpers: fresh defaults, generated identifiers and
//! sanitized field-by-field mutation.

use crate::config::GeneratorConfig;
use crate::dates::today;
use crate::error::CertificateError;
use crate::security::sanitize;
use crate::security::verification::to_base36;
use chrono::Utc;
use common::model::certificate::{
    CertificateRecord, Course, CourseLevel, Credential, Institution, Instructor, Language,
    Signature, Student,
};
use common::model::course::CoursePreset;
use uuid::Uuid;

pub const DEFAULT_TITLE: &str = "Certificate of Completion";
pub const DEFAULT_STATEMENT: &str = "This is to certify that the above named individual has successfully completed all requirements and demonstrated proficiency in";

/// Timestamp and random part, both base-36, uppercased: `LZ3K1Q2A-4F9C0B1D2E3`.
pub fn generate_secure_id() -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u128;
    let random: String = Uuid::new_v4().simple().to_string().chars().take(11).collect();
    format!("{}-{}", to_base36(millis), random).to_uppercase()
}

pub fn verification_url(base: &str, id: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), id)
}

/// A blank record with generated identifiers and today's dates.
pub fn new_record(config: &GeneratorConfig) -> CertificateRecord {
    let id = generate_secure_id();
    let today = today();
    CertificateRecord {
        verification_url: verification_url(&config.verification_base_url, &id),
        id,
        credential_id: generate_secure_id(),
        certificate_title: DEFAULT_TITLE.to_string(),
        statement: DEFAULT_STATEMENT.to_string(),
        student: Student {
            enrollment_date: today.clone(),
            ..Student::default()
        },
        course: Course {
            instructors: vec![Instructor::default()],
            completion_date: today.clone(),
            ..Course::default()
        },
        institution: Institution::default(),
        credential: Credential::default(),
        signature: Signature::default(),
        issue_date: today,
        language: Some(Language::En),
    }
}

/// Overwrites the preset-owned course fields. Duration, completion date and
/// grade belong to the learner and are kept.
pub fn apply_course_preset(record: &mut CertificateRecord, preset: &CoursePreset) {
    let course = &mut record.course;
    course.title = preset.title.clone();
    course.instructors = preset.instructors.clone();
    course.category = preset.category.clone();
    course.level = preset.level;
    course.total_hours = Some(preset.total_hours);
    course.skills_learned = Some(preset.skills_learned.clone());
}

/// Fresh `id` and `credentialId`; the verification URL follows the new id.
pub fn regenerate_ids(record: &mut CertificateRecord, verify_base: &str) {
    record.id = generate_secure_id();
    record.credential_id = generate_secure_id();
    record.verification_url = verification_url(verify_base, &record.id);
}

fn optional(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

fn invalid(path: &str, value: &str) -> CertificateError {
    CertificateError::InvalidValue {
        field: path.to_string(),
        value: value.to_string(),
    }
}

/// Sets one field addressed by its dotted camelCase path, e.g. `student.name`
/// or `course.instructors.1.title`.
///
/// The value is sanitized first. Changing `id` also rewrites the verification
/// URL. Writing one past the last instructor appends a new one.
pub fn apply_field(
    record: &mut CertificateRecord,
    path: &str,
    value: &str,
    verify_base: &str,
) -> Result<(), CertificateError> {
    let clean = sanitize(value);
    let segments: Vec<&str> = path.split('.').collect();

    match segments.as_slice() {
        ["id"] => {
            record.verification_url = verification_url(verify_base, &clean);
            record.id = clean;
        }
        ["credentialId"] => record.credential_id = clean,
        ["certificateTitle"] => record.certificate_title = clean,
        ["statement"] => record.statement = clean,
        ["issueDate"] => record.issue_date = clean,
        ["verificationUrl"] => record.verification_url = clean,
        ["language"] => {
            record.language = if clean.trim().is_empty() {
                None
            } else {
                let quoted = format!("\"{}\"", clean.trim().to_ascii_lowercase());
                Some(serde_json::from_str(&quoted).map_err(|_| invalid(path, value))?)
            }
        }

        ["student", "name"] => record.student.name = clean,
        ["student", "email"] => record.student.email = clean,
        ["student", "enrollmentDate"] => record.student.enrollment_date = clean,

        ["course", "title"] => record.course.title = clean,
        ["course", "duration"] => record.course.duration = clean,
        ["course", "completionDate"] => record.course.completion_date = clean,
        ["course", "category"] => record.course.category = clean,
        ["course", "level"] => {
            record.course.level = CourseLevel::parse(&clean).ok_or_else(|| invalid(path, value))?
        }
        ["course", "totalHours"] => {
            record.course.total_hours = if clean.trim().is_empty() {
                None
            } else {
                Some(clean.trim().parse().map_err(|_| invalid(path, value))?)
            }
        }
        ["course", "grade"] => record.course.grade = optional(clean),
        ["course", "skillsLearned"] => {
            let skills: Vec<String> = clean
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            record.course.skills_learned = if skills.is_empty() { None } else { Some(skills) };
        }
        ["course", "instructors", index, field] => {
            if !matches!(*field, "name" | "title") {
                return Err(CertificateError::UnknownField(path.to_string()));
            }
            let index: usize = index.parse().map_err(|_| invalid(path, value))?;
            let instructors = &mut record.course.instructors;
            if index == instructors.len() {
                instructors.push(Instructor::default());
            }
            let instructor = instructors
                .get_mut(index)
                .ok_or_else(|| invalid(path, value))?;
            match *field {
                "name" => instructor.name = clean,
                "title" => instructor.title = optional(clean),
                _ => return Err(CertificateError::UnknownField(path.to_string())),
            }
        }

        ["institution", "name"] => record.institution.name = clean,
        ["institution", "logoUrl"] => record.institution.logo_url = optional(clean),
        ["institution", "website"] => record.institution.website = optional(clean),
        ["institution", "accreditation"] => record.institution.accreditation = optional(clean),

        ["credential", "badgeUrl"] => record.credential.badge_url = optional(clean),
        ["credential", "specialization"] => record.credential.specialization = optional(clean),
        ["credential", "track"] => record.credential.track = optional(clean),

        ["signature", "name"] => record.signature.name = clean,
        ["signature", "title"] => record.signature.title = clean,
        ["signature", "date"] => record.signature.date = optional(clean),

        _ => return Err(CertificateError::UnknownField(path.to_string())),
    }
    Ok(())
}

/// Removes the instructor at `index`; the list never drops below one entry.
pub fn remove_instructor(record: &mut CertificateRecord, index: usize) -> bool {
    let instructors = &mut record.course.instructors;
    if instructors.len() <= 1 || index >= instructors.len() {
        return false;
    }
    instructors.remove(index);
    true
}
