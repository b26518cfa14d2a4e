use super::DocumentKind;
use crate::dates::file_date;
use common::model::certificate::CertificateRecord;

/// Collapses every run of non-alphanumeric characters to one `_` and trims
/// underscores from both ends.
fn clean_segment(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_matches('_').to_string()
}

/// `Certificate_<name>_<course>_<date>.<ext>`, with blank parts left out.
///
/// The date is the issue date as `YYYY_MM_DD` when it parses.
pub fn file_name(record: &CertificateRecord, kind: DocumentKind) -> String {
    let date = file_date(&record.issue_date).unwrap_or_else(|| record.issue_date.clone());
    let parts: Vec<String> = [
        "Certificate",
        record.student.name.as_str(),
        record.course.title.as_str(),
        date.as_str(),
    ]
        .into_iter()
        .map(clean_segment)
        .filter(|s| !s.is_empty())
        .collect();
    format!("{}.{}", parts.join("_"), kind.extension())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::tests::sample_record;
    use regex::Regex;

    #[test]
    fn builds_expected_name() {
        assert_eq!(
            file_name(&sample_record(), DocumentKind::Pdf),
            "Certificate_John_Doe_Smith_Advanced_React_Development_Course_2024_08_06.pdf"
        );
    }

    #[test]
    fn names_stay_clean_for_awkward_input() {
        let shape = Regex::new(r"^[A-Za-z0-9_]+\.(pdf|png)$").unwrap();
        let inputs = [
            ("  José   O'Neil!! ", "C++ / Rust: ¿Qué?", "2024-08-06"),
            ("", "", ""),
            ("___", "--", "not a date"),
            ("&lt;b&gt;Ann&lt;/b&gt;", "UI/UX Design Principles", "2024-08-06T10:00:00Z"),
        ];
        for (name, course, date) in inputs {
            let mut record = sample_record();
            record.student.name = name.into();
            record.course.title = course.into();
            record.issue_date = date.into();
            for kind in [DocumentKind::Pdf, DocumentKind::Png] {
                let out = file_name(&record, kind);
                assert!(shape.is_match(&out), "{out}");
                assert!(!out.contains("__"), "{out}");
                let stem = out.rsplit_once('.').unwrap().0;
                assert!(!stem.starts_with('_') && !stem.ends_with('_'), "{out}");
            }
        }
    }

    #[test]
    fn blank_segments_are_dropped() {
        let mut record = sample_record();
        record.student.name.clear();
        record.course.title = "!!!".into();
        assert_eq!(file_name(&record, DocumentKind::Png), "Certificate_2024_08_06.png");
    }
}
