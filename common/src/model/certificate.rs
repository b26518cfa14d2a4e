use serde::{Deserialize, Serialize};

/// The full certificate data: recipient, course, institution, signature and the
/// identifiers printed in the security block.
///
/// The JSON shape (camelCase keys, optional fields omitted when absent) is the
/// format used for import/export and for the autosave slot, so any change here
/// is a change to persisted data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateRecord {
    /// Certificate identifier shown as "Certificate ID" and used in the verification URL.
    pub id: String,
    /// Credential identifier shown as "Credential ID".
    pub credential_id: String,
    pub certificate_title: String,
    pub statement: String,
    pub student: Student,
    pub course: Course,
    pub institution: Institution,
    #[serde(default)]
    pub credential: Credential,
    pub signature: Signature,
    /// Issue date, `YYYY-MM-DD` or RFC 3339.
    pub issue_date: String,
    pub verification_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub enrollment_date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instructor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub title: String,
    /// Ordered as they should appear in the "Instructed by" line.
    pub instructors: Vec<Instructor>,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub completion_date: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub level: CourseLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_hours: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills_learned: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CourseLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl CourseLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            CourseLevel::Beginner => "Beginner",
            CourseLevel::Intermediate => "Intermediate",
            CourseLevel::Advanced => "Advanced",
        }
    }

    /// Parses the display name, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "beginner" => Some(CourseLevel::Beginner),
            "intermediate" => Some(CourseLevel::Intermediate),
            "advanced" => Some(CourseLevel::Advanced),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Institution {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accreditation: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialization: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signature {
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// Language of the certificate; only affects how dates are displayed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Es,
    Fr,
    De,
    Pt,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_camel_case_with_missing_optionals() {
        let json = r#"{
            "id": "cert-1",
            "credentialId": "CRED-1",
            "certificateTitle": "Certificate of Completion",
            "statement": "",
            "student": { "name": "Ada Lovelace" },
            "course": { "title": "Analytical Engines", "instructors": [{ "name": "C. Babbage" }] },
            "institution": { "name": "Royal Society" },
            "signature": { "name": "Mary Somerville" },
            "issueDate": "2024-08-06",
            "verificationUrl": "https://platform.example.com/verify/cert-1"
        }"#;

        let record: CertificateRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.credential_id, "CRED-1");
        assert_eq!(record.course.level, CourseLevel::Beginner);
        assert_eq!(record.course.instructors[0].title, None);
        assert_eq!(record.credential, Credential::default());
        assert!(record.language.is_none());
    }

    #[test]
    fn skips_absent_optionals_when_serializing() {
        let instructor = Instructor {
            name: "Dr. Sarah Johnson".to_string(),
            title: None,
        };
        let json = serde_json::to_string(&instructor).unwrap();
        assert_eq!(json, r#"{"name":"Dr. Sarah Johnson"}"#);
    }

    #[test]
    fn level_parses_display_names() {
        assert_eq!(CourseLevel::parse("advanced"), Some(CourseLevel::Advanced));
        assert_eq!(CourseLevel::parse(" Intermediate "), Some(CourseLevel::Intermediate));
        assert_eq!(CourseLevel::parse("expert"), None);
        assert_eq!(CourseLevel::Advanced.as_str(), "Advanced");
    }
}
