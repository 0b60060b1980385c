use serde::{Deserialize, Serialize};

/// Category names shorter than this are rejected before reaching the API
pub const MIN_CATEGORY_NAME_LEN: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewCategory {
    pub name: String,
}

impl NewCategory {
    /// Trimmed name, or `None` when it is too short to save
    pub fn new(name: &str) -> Option<Self> {
        let name = name.trim();
        if name.chars().count() < MIN_CATEGORY_NAME_LEN {
            return None;
        }
        Some(Self {
            name: name.to_string(),
        })
    }
}
