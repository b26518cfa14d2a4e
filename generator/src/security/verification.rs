//! Short display code and QR payload derived from certificate fields.
//!
//! The code is a 32-bit polynomial checksum, good enough to catch typos when a
//! certificate is checked by hand. It is not a signature and must not be
//! treated as proof of authenticity.

use chrono::Utc;
use common::model::certificate::CertificateRecord;
use serde::Serialize;
use uuid::Uuid;

const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

pub(crate) fn to_base36(mut value: u128) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

fn checksum(input: &str) -> i32 {
    input
        .encode_utf16()
        .fold(0i32, |hash, unit| hash.wrapping_mul(31).wrapping_add(unit as i32))
}

/// Eight uppercase base-36 characters, zero padded.
pub fn verification_code(record: &CertificateRecord) -> String {
    let input = [
        record.id.as_str(),
        record.student.name.as_str(),
        record.student.email.as_str(),
        record.course.title.as_str(),
        record.credential_id.as_str(),
        record.issue_date.as_str(),
    ]
    .join("|");
    let magnitude = (checksum(&input) as i64).unsigned_abs();
    format!("{:0>8}", to_base36(magnitude as u128)).to_uppercase()
}

#[derive(Serialize)]
struct QrPayload<'a> {
    id: &'a str,
    name: &'a str,
    course: &'a str,
    issued: &'a str,
    verify: &'a str,
    hash: String,
}

/// JSON carried by the QR placeholder.
pub fn qr_payload(record: &CertificateRecord) -> String {
    let payload = QrPayload {
        id: &record.id,
        name: &record.student.name,
        course: &record.course.title,
        issued: &record.issue_date,
        verify: &record.verification_url,
        hash: verification_code(record),
    };
    // Serializing a struct of strings cannot fail.
    serde_json::to_string(&payload).unwrap_or_default()
}

/// `CERT-<8 random base-36 chars>-<YYYY-MM-DD>`.
pub fn generate_watermark() -> String {
    let random = to_base36(Uuid::new_v4().as_u128());
    let tail: String = random.chars().rev().take(8).collect();
    format!("CERT-{}-{}", tail, Utc::now().format("%Y-%m-%d"))
}
