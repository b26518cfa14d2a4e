pub mod certificate;
pub mod course;
pub mod template;
pub mod validation;
