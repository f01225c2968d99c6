use serde::{Deserialize, Serialize};

/// Minimal projection used when probing a table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RowId {
    pub id: i64,
}

/// The default singleton inserted into an empty `profile` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProfile {
    pub full_name: String,
    pub title: String,
    pub hero_tagline: String,
    pub hero_subtitle: String,
    pub email: String,
    pub location: String,
    pub years_experience: String,
    pub projects_delivered: String,
    pub open_source_contributions: String,
    pub client_satisfaction: String,
    pub available_for_work: bool,
}

impl Default for NewProfile {
    fn default() -> Self {
        Self {
            full_name: "Alex Chen".to_string(),
            title: "Full-stack Software Engineer".to_string(),
            hero_tagline: "Crafting digital experiences with purpose.".to_string(),
            hero_subtitle: "Full-stack software engineer with 5+ years building scalable web \
                            applications, design systems, and developer tools that make a \
                            difference."
                .to_string(),
            email: "alex@example.com".to_string(),
            location: "San Francisco, CA".to_string(),
            years_experience: "5+".to_string(),
            projects_delivered: "30+".to_string(),
            open_source_contributions: "15+".to_string(),
            client_satisfaction: "99%".to_string(),
            available_for_work: true,
        }
    }
}
