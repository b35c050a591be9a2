use crate::project::{DatabaseConfig, ProjectModel};

const SQL_FOLDER_DIRECTIVE: &str = "IMPORTANT: Based on the frontend code, place SQL files in the SQL folder, implement SQL statements, write database creation and table creation statements, and include some sample data to be inserted into the database";

/// Provider-specific `IMPORTANT:` directives appended to builder prompts.
///
/// Unknown providers yield no directives.
pub fn database_directives(project: &ProjectModel) -> Vec<String> {
    let Some(database) = project.configs().and_then(|c| c.database.as_ref()) else {
        return Vec::new();
    };

    match database.provider.to_lowercase().as_str() {
        "mysql" => mysql(database),
        "postgresql" => postgresql(database),
        "mongodb" => mongodb(database),
        "sqlite" => sqlite(database),
        _ => Vec::new(),
    }
}

fn version_or_latest(database: &DatabaseConfig) -> &str {
    database.version.as_deref().unwrap_or("latest")
}

fn orm_directive(database: &DatabaseConfig, kind: &str) -> Option<String> {
    database.orm.as_ref().map(|orm| {
        format!(
            "IMPORTANT: Use {} {} as {} for database operations.",
            orm,
            database.orm_version.as_deref().unwrap_or(""),
            kind
        )
    })
}

fn mysql(database: &DatabaseConfig) -> Vec<String> {
    let mut out = vec![
        SQL_FOLDER_DIRECTIVE.to_string(),
        format!(
            "IMPORTANT: Use MySQL as the database ({}), configure connection in backend with appropriate settings.",
            version_or_latest(database)
        ),
    ];
    out.extend(orm_directive(database, "ORM"));
    if let Some(features) = &database.features {
        for feature in features.enabled_names() {
            out.push(format!(
                "IMPORTANT: Implement {} functionality in the database layer.",
                feature
            ));
        }
    }
    out
}

fn postgresql(database: &DatabaseConfig) -> Vec<String> {
    let mut out = vec![
        SQL_FOLDER_DIRECTIVE.to_string(),
        format!(
            "IMPORTANT: Use PostgreSQL as the database ({}), configure connection in backend with appropriate settings.",
            version_or_latest(database)
        ),
    ];
    out.extend(orm_directive(database, "ORM"));
    out
}

fn mongodb(database: &DatabaseConfig) -> Vec<String> {
    let mut out = vec![
        "IMPORTANT: Use MongoDB as the database, create appropriate collections and document schemas.".to_string(),
        format!(
            "IMPORTANT: Configure MongoDB connection ({}) in backend with appropriate settings.",
            version_or_latest(database)
        ),
    ];
    out.extend(orm_directive(database, "ODM"));
    out
}

fn sqlite(database: &DatabaseConfig) -> Vec<String> {
    let mut out = vec![
        "IMPORTANT: Use SQLite as the database, create database file and tables with appropriate schema.".to_string(),
        "IMPORTANT: Configure SQLite connection in backend with file-based storage.".to_string(),
    ];
    out.extend(orm_directive(database, "ORM"));
    out
}
