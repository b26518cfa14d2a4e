use crate::model::certificate::{CourseLevel, Instructor};
use serde::{Deserialize, Serialize};

/// A reusable course definition from the read-only preset catalog.
///
/// Selecting a preset overwrites the catalog-owned course fields of the
/// current certificate; see `generator::record::apply_course_preset`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoursePreset {
    pub id: String,
    pub title: String,
    pub instructors: Vec<Instructor>,
    pub category: String,
    pub level: CourseLevel,
    pub total_hours: u32,
    pub skills_learned: Vec<String>,
}

fn preset(
    id: &str,
    title: &str,
    instructor: (&str, &str),
    category: &str,
    level: CourseLevel,
    total_hours: u32,
    skills: [&str; 4],
) -> CoursePreset {
    CoursePreset {
        id: id.to_string(),
        title: title.to_string(),
        instructors: vec![Instructor {
            name: instructor.0.to_string(),
            title: Some(instructor.1.to_string()),
        }],
        category: category.to_string(),
        level,
        total_hours,
        skills_learned: skills.iter().map(|s| s.to_string()).collect(),
    }
}

pub fn catalog() -> Vec<CoursePreset> {
    vec![
        preset(
            "react-advanced",
            "Advanced React Development",
            ("Dr. Sarah Johnson", "Senior React Developer"),
            "Web Development",
            CourseLevel::Advanced,
            120,
            ["React Hooks", "Redux", "TypeScript", "Testing"],
        ),
        preset(
            "nodejs-backend",
            "Node.js Backend Development",
            ("Prof. David Wilson", "Backend Architecture Specialist"),
            "Backend Development",
            CourseLevel::Intermediate,
            80,
            ["Express.js", "MongoDB", "REST APIs", "Authentication"],
        ),
        preset(
            "python-basics",
            "Python Programming Fundamentals",
            ("Dr. Emily Chen", "Python Expert"),
            "Programming",
            CourseLevel::Beginner,
            60,
            ["Python Syntax", "Data Structures", "OOP", "File Handling"],
        ),
        preset(
            "data-science",
            "Data Science with Machine Learning",
            ("Dr. Alex Kumar", "Data Science Lead"),
            "Data Science",
            CourseLevel::Advanced,
            150,
            ["Machine Learning", "Python", "Statistics", "Data Visualization"],
        ),
        preset(
            "ui-ux-design",
            "UI/UX Design Principles",
            ("Jessica Martinez", "Senior UX Designer"),
            "Design",
            CourseLevel::Intermediate,
            90,
            ["Design Thinking", "Prototyping", "User Research", "Figma"],
        ),
    ]
}

pub fn find(id: &str) -> Option<CoursePreset> {
    catalog().into_iter().find(|c| c.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_preset_has_a_named_instructor() {
        for preset in catalog() {
            assert!(!preset.instructors.is_empty(), "{}", preset.id);
            assert!(!preset.instructors[0].name.trim().is_empty(), "{}", preset.id);
        }
        assert_eq!(find("python-basics").unwrap().level, CourseLevel::Beginner);
    }
}
