use std::fmt::Write;

/// One column of a table, excluding the surrogate key and audit timestamps
/// which every table carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub sql_type: &'static str,
    pub constraints: &'static str,
}

impl Column {
    const fn new(name: &'static str, sql_type: &'static str, constraints: &'static str) -> Self {
        Self {
            name,
            sql_type,
            constraints,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableDef {
    pub name: &'static str,
    pub columns: &'static [Column],
}

impl TableDef {
    pub fn create_sql(&self) -> String {
        let mut sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    id SERIAL PRIMARY KEY,\n",
            self.name
        );
        for column in self.columns {
            let _ = write!(sql, "    {} {}", column.name, column.sql_type);
            if !column.constraints.is_empty() {
                let _ = write!(sql, " {}", column.constraints);
            }
            sql.push_str(",\n");
        }
        sql.push_str("    created_at TIMESTAMPTZ DEFAULT NOW(),\n");
        sql.push_str("    updated_at TIMESTAMPTZ DEFAULT NOW()\n)");
        sql
    }
}

const PROFILE_COLUMNS: &[Column] = &[
    Column::new("full_name", "VARCHAR(200)", "NOT NULL DEFAULT 'Alex Chen'"),
    Column::new(
        "title",
        "VARCHAR(300)",
        "NOT NULL DEFAULT 'Full-stack Software Engineer'",
    ),
    Column::new("bio", "TEXT", ""),
    Column::new(
        "hero_tagline",
        "VARCHAR(500)",
        "NOT NULL DEFAULT 'Crafting digital experiences with purpose.'",
    ),
    Column::new("hero_subtitle", "TEXT", ""),
    Column::new("avatar_url", "TEXT", ""),
    Column::new("resume_url", "TEXT", ""),
    Column::new("github_url", "VARCHAR(500)", "DEFAULT ''"),
    Column::new("linkedin_url", "VARCHAR(500)", "DEFAULT ''"),
    Column::new("twitter_url", "VARCHAR(500)", "DEFAULT ''"),
    Column::new("email", "VARCHAR(320)", "DEFAULT ''"),
    Column::new("phone", "VARCHAR(50)", "DEFAULT ''"),
    Column::new("location", "VARCHAR(200)", "DEFAULT ''"),
    Column::new("years_experience", "VARCHAR(20)", "DEFAULT '5+'"),
    Column::new("projects_delivered", "VARCHAR(20)", "DEFAULT '30+'"),
    Column::new("open_source_contributions", "VARCHAR(20)", "DEFAULT '15+'"),
    Column::new("client_satisfaction", "VARCHAR(20)", "DEFAULT '99%'"),
    Column::new("available_for_work", "BOOLEAN", "DEFAULT true"),
];

const PROJECT_COLUMNS: &[Column] = &[
    Column::new("title", "VARCHAR(300)", "NOT NULL"),
    Column::new("description", "TEXT", ""),
    Column::new("image_url", "TEXT", ""),
    Column::new("live_url", "VARCHAR(500)", "DEFAULT ''"),
    Column::new("github_url", "VARCHAR(500)", "DEFAULT ''"),
    Column::new("tags", "TEXT", ""),
    Column::new("featured", "BOOLEAN", "DEFAULT false"),
    Column::new("sort_order", "INT", "DEFAULT 0"),
];

const EXPERIENCE_COLUMNS: &[Column] = &[
    Column::new("role", "VARCHAR(300)", "NOT NULL"),
    Column::new("company", "VARCHAR(300)", "NOT NULL"),
    Column::new("period", "VARCHAR(100)", "NOT NULL"),
    Column::new("description", "TEXT", ""),
    Column::new("tags", "TEXT", ""),
    Column::new("sort_order", "INT", "DEFAULT 0"),
];

const SKILL_CATEGORY_COLUMNS: &[Column] = &[
    Column::new("title", "VARCHAR(200)", "NOT NULL"),
    Column::new("icon", "VARCHAR(50)", "NOT NULL DEFAULT 'Code2'"),
    Column::new("skills", "TEXT", ""),
    Column::new("sort_order", "INT", "DEFAULT 0"),
];

/// The tables the provisioner owns, in creation order.
pub const PORTFOLIO_TABLES: [TableDef; 4] = [
    TableDef {
        name: "profile",
        columns: PROFILE_COLUMNS,
    },
    TableDef {
        name: "projects",
        columns: PROJECT_COLUMNS,
    },
    TableDef {
        name: "experiences",
        columns: EXPERIENCE_COLUMNS,
    },
    TableDef {
        name: "skill_categories",
        columns: SKILL_CATEGORY_COLUMNS,
    },
];
