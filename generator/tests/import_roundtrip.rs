mod support;

use generator::storage::{export_json, import_json};
use generator::ImportError;

#[test]
fn exported_json_imports_unchanged() {
    let record = support::record();
    let json = export_json(&record).unwrap();
    assert_eq!(import_json(&json).unwrap(), record);
}

#[test]
fn import_revalidates() {
    let mut record = support::record();
    record.signature.name.clear();
    record.student.email = "not-an-email".into();
    let err = import_json(&export_json(&record).unwrap()).unwrap_err();
    let ImportError::Invalid(errors) = err else {
        panic!("expected validation errors");
    };
    assert_eq!(errors.len(), 2);
}
