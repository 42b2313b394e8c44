//! Project and intersection names.

use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Matches `projects.name VARCHAR(100)`.
const MAX_PROJECT_NAME_LEN: usize = 100;

const MAX_DESCRIPTION_LEN: usize = 500;

/// Matches `intersections.name VARCHAR(100)`.
const MAX_INTERSECTION_NAME_LEN: usize = 100;

/// Validated, trimmed project name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProjectName(String);

impl ProjectName {
    /// # Rules
    /// - Leading/trailing whitespace is dropped
    /// - 1 to 100 characters after trimming
    /// - No control characters
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty {
                field: "project name",
            });
        }

        if trimmed.chars().count() > MAX_PROJECT_NAME_LEN {
            return Err(ValidationError::TooLong {
                field: "project name",
                max: MAX_PROJECT_NAME_LEN,
            });
        }

        if trimmed.chars().any(char::is_control) {
            return Err(ValidationError::InvalidFormat {
                field: "project name",
                reason: "must not contain control characters",
            });
        }

        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ProjectName {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<ProjectName> for String {
    fn from(name: ProjectName) -> Self {
        name.0
    }
}

impl std::fmt::Display for ProjectName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Free-text project description, trimmed. Empty is allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Description(String);

impl Description {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let trimmed = s.trim();
        if trimmed.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(ValidationError::TooLong {
                field: "description",
                max: MAX_DESCRIPTION_LEN,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Description {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Description> for String {
    fn from(description: Description) -> Self {
        description.0
    }
}

/// Optional human label for an intersection. Empty is allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IntersectionName(String);

impl IntersectionName {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let trimmed = s.trim();
        if trimmed.chars().count() > MAX_INTERSECTION_NAME_LEN {
            return Err(ValidationError::TooLong {
                field: "intersection name",
                max: MAX_INTERSECTION_NAME_LEN,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for IntersectionName {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<IntersectionName> for String {
    fn from(name: IntersectionName) -> Self {
        name.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_name_is_trimmed() {
        let name = ProjectName::new("  Nevsky corridor ").unwrap();
        assert_eq!(name.as_str(), "Nevsky corridor");
    }

    #[test]
    fn project_name_rejects_blank() {
        assert_eq!(
            ProjectName::new("   "),
            Err(ValidationError::Empty {
                field: "project name"
            })
        );
    }

    #[test]
    fn project_name_length_counts_characters() {
        // 100 two-byte characters fit.
        assert!(ProjectName::new(&"ж".repeat(100)).is_ok());
        assert!(matches!(
            ProjectName::new(&"a".repeat(101)),
            Err(ValidationError::TooLong { max: 100, .. })
        ));
    }

    #[test]
    fn project_name_rejects_control_chars() {
        assert!(ProjectName::new("line\nbreak").is_err());
    }

    #[test]
    fn project_name_deserializes_with_validation() {
        let ok: ProjectName = serde_json::from_str(r#""Grid A""#).unwrap();
        assert_eq!(ok.as_str(), "Grid A");
        assert!(serde_json::from_str::<ProjectName>(r#""""#).is_err());
    }

    #[test]
    fn description_limit() {
        assert_eq!(Description::new("  ").unwrap().as_str(), "");
        assert!(Description::new(&"d".repeat(500)).is_ok());
        assert!(matches!(
            Description::new(&"d".repeat(501)),
            Err(ValidationError::TooLong { max: 500, .. })
        ));
    }

    #[test]
    fn intersection_name_may_be_empty() {
        assert_eq!(IntersectionName::new("").unwrap().as_str(), "");
        assert!(IntersectionName::new(&"x".repeat(101)).is_err());
    }
}
