#![allow(dead_code)]

use common::model::certificate::{
    CertificateRecord, Course, CourseLevel, Credential, Institution, Instructor, Language,
    Signature, Student,
};
use generator::GeneratorConfig;
use lopdf::content::Content;
use lopdf::Object;
use std::path::{Path, PathBuf};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn fonts_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fonts")
}

pub fn config() -> GeneratorConfig {
    GeneratorConfig {
        fonts_dir: fonts_dir(),
        ..GeneratorConfig::default()
    }
}

fn collect_strings(objects: &[Object], out: &mut Vec<u8>) {
    for object in objects {
        match object {
            Object::String(bytes, _) => out.extend_from_slice(bytes),
            Object::Array(items) => collect_strings(items, out),
            _ => {}
        }
    }
}

/// Whether every word of `text` is drawn in `pdf` with the given embedded font.
///
/// Embedded fonts are shown by glyph id, so each word is mapped through the
/// same TTF and searched for among the operands of `Tj`/`TJ`.
pub fn shows_text(pdf: &[u8], font_file: &str, text: &str) -> bool {
    let doc = lopdf::Document::load_mem(pdf).unwrap();
    let mut shown = Vec::new();
    for page in doc.get_pages().into_values() {
        let content = Content::decode(&doc.get_page_content(page).unwrap()).unwrap();
        for op in content.operations {
            if op.operator == "Tj" || op.operator == "TJ" {
                collect_strings(&op.operands, &mut shown);
            }
        }
    }

    let font =
        rusttype::Font::try_from_vec(std::fs::read(fonts_dir().join(font_file)).unwrap()).unwrap();
    text.split_whitespace().all(|word| {
        let needle: Vec<u8> = word
            .chars()
            .flat_map(|c| font.glyph(c).id().0.to_be_bytes())
            .collect();
        shown.windows(needle.len()).any(|w| w == needle.as_slice())
    })
}

pub fn info_entry(pdf: &[u8], key: &[u8]) -> String {
    let doc = lopdf::Document::load_mem(pdf).unwrap();
    let info = match doc.trailer.get(b"Info").unwrap() {
        Object::Reference(id) => doc.get_dictionary(*id).unwrap(),
        other => other.as_dict().unwrap(),
    };
    String::from_utf8_lossy(info.get(key).unwrap().as_str().unwrap()).into_owned()
}

pub fn record() -> CertificateRecord {
    CertificateRecord {
        id: "CERT-2024-0001".into(),
        credential_id: "ARD-2024-0001".into(),
        certificate_title: "Certificate of Completion".into(),
        statement: "This is to certify that the above named individual has successfully completed all requirements and demonstrated proficiency in".into(),
        student: Student {
            name: "John Doe Smith".into(),
            email: "john.smith@example.com".into(),
            enrollment_date: "2024-01-15".into(),
        },
        course: Course {
            title: "Advanced React Development Course".into(),
            instructors: vec![Instructor {
                name: "Dr. Sarah Johnson".into(),
                title: Some("Senior React Developer".into()),
            }],
            duration: "12 weeks".into(),
            completion_date: "2024-08-01".into(),
            category: "Web Development".into(),
            level: CourseLevel::Advanced,
            total_hours: Some(120),
            grade: Some("A+".into()),
            skills_learned: Some(vec!["React Hooks".into(), "Redux".into()]),
        },
        institution: Institution {
            name: "Tech Academy Online".into(),
            website: Some("https://techacademy.example.com".into()),
            ..Institution::default()
        },
        credential: Credential {
            specialization: Some("Frontend".into()),
            ..Credential::default()
        },
        signature: Signature {
            name: "Michael Davis".into(),
            title: "Director of Education".into(),
            date: Some("2024-08-06".into()),
        },
        issue_date: "2024-08-06".into(),
        verification_url: "https://platform.example.com/verify/CERT-2024-0001".into(),
        language: Some(Language::En),
    }
}
