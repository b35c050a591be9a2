use crate::project::ProjectModel;

/// Docker and docker-compose instructions for the configured stack.
///
/// Empty when the project carries no development configuration.
pub fn docker_section(project: &ProjectModel) -> String {
    let Some(configs) = project.configs() else {
        return String::new();
    };

    let mut out = String::from("\n\n## Docker Configuration\n");
    out.push_str("Generate a production-ready Dockerfile and docker-compose.yml for this project.\n\n");

    if let Some(frontend) = &configs.frontend {
        out.push_str("### Frontend Dockerfile\n");
        out.push_str(&format!(
            "- **Framework**: {}{}\n",
            frontend.framework,
            frontend
                .framework_version
                .as_deref()
                .map(|v| format!(" v{}", v))
                .unwrap_or_default()
        ));
        out.push_str("- Use multi-stage build for optimization\n");
        out.push_str("- Install dependencies in first stage\n");
        out.push_str("- Build the application\n");
        out.push_str("- Serve with nginx or appropriate web server\n");
        out.push_str("- Expose appropriate port (default 80 or 3000)\n\n");
    }

    if let Some(backend) = &configs.backend {
        if let Some(language) = backend.language.as_deref().filter(|l| !l.is_empty()) {
            out.push_str("### Backend Dockerfile\n");
            out.push_str(&format!("- **Language**: {}\n", language));
            out.push_str(&format!(
                "- **Framework**: {}\n",
                backend.framework.as_deref().unwrap_or_default()
            ));
            out.push_str(&backend_runtime_lines(language));
            out.push('\n');
        }
    }

    if let Some(database) = &configs.database {
        let provider = database.provider.as_str();
        if !provider.is_empty() && provider != "none" {
            out.push_str("### Database Configuration\n");
            out.push_str(&format!(
                "- **Provider**: {}{}\n",
                provider,
                database
                    .version
                    .as_deref()
                    .map(|v| format!(" v{}", v))
                    .unwrap_or_default()
            ));
            out.push_str(&database_runtime_lines(provider));
            out.push('\n');
        }
    }

    out.push_str("### Docker Compose File\n");
    out.push_str("Create a docker-compose.yml file that:\n");
    out.push_str("- Defines all services (frontend, backend, database)\n");
    out.push_str("- Sets up networks for service communication\n");
    out.push_str("- Configures volumes for data persistence\n");
    out.push_str("- Uses environment variables from .env file\n");
    out.push_str("- Implements health checks for services\n");
    out.push_str("- Sets up proper service dependencies\n");
    out.push_str("- Configures restart policies\n\n");

    out.push_str("### Docker Best Practices\n");
    out.push_str("- Use .dockerignore to exclude unnecessary files\n");
    out.push_str("- Minimize image layers\n");
    out.push_str("- Use non-root user for security\n");
    out.push_str("- Add health checks\n");
    out.push_str("- Use specific version tags (not 'latest')\n");
    out.push_str("- Optimize for caching (copy package files first)\n");
    out.push_str("- Include README with Docker commands\n\n");

    out
}

fn backend_runtime_lines(language: &str) -> String {
    match language.to_lowercase().as_str() {
        "node" | "nodejs" | "typescript" => "- Use official Node.js LTS image\n\
             - Install dependencies with npm/yarn\n\
             - Copy application files\n\
             - Expose port 3001 or configured port\n\
             - Set NODE_ENV=production\n"
            .to_string(),
        "python" => "- Use official Python image\n\
             - Install requirements.txt dependencies\n\
             - Copy application files\n\
             - Expose port 8000 or configured port\n"
            .to_string(),
        "java" => "- Use official OpenJDK or Maven image\n\
             - Build with Maven/Gradle\n\
             - Copy JAR/WAR file\n\
             - Expose port 8080 or configured port\n"
            .to_string(),
        "go" => "- Use official Golang image for build\n\
             - Use alpine for runtime (multi-stage)\n\
             - Compile to binary\n\
             - Expose configured port\n"
            .to_string(),
        _ => format!(
            "- Use appropriate official image for {}\n- Follow best practices for the language\n",
            language
        ),
    }
}

fn database_runtime_lines(provider: &str) -> String {
    match provider.to_lowercase().as_str() {
        "postgresql" | "postgres" => "- Use official PostgreSQL image\n\
             - Set POSTGRES_DB, POSTGRES_USER, POSTGRES_PASSWORD\n\
             - Create volume for data persistence\n\
             - Expose port 5432\n"
            .to_string(),
        "mysql" => "- Use official MySQL image\n\
             - Set MYSQL_DATABASE, MYSQL_USER, MYSQL_PASSWORD, MYSQL_ROOT_PASSWORD\n\
             - Create volume for data persistence\n\
             - Expose port 3306\n"
            .to_string(),
        "mongodb" => "- Use official MongoDB image\n\
             - Set MONGO_INITDB_ROOT_USERNAME, MONGO_INITDB_ROOT_PASSWORD\n\
             - Create volume for data persistence\n\
             - Expose port 27017\n"
            .to_string(),
        "redis" => "- Use official Redis image\n\
             - Configure password if needed\n\
             - Create volume for data persistence\n\
             - Expose port 6379\n"
            .to_string(),
        _ => format!(
            "- Use official {} image\n- Configure environment variables\n- Create volume for data persistence\n",
            provider
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_without_configs() {
        let project: ProjectModel = serde_json::from_str(r#"{"name":"X"}"#).unwrap();
        assert_eq!(docker_section(&project), "");
    }

    #[test]
    fn covers_backend_and_database() {
        let project: ProjectModel = serde_json::from_str(
            r#"{"name":"X","analysisResultModel":{"development":{"configs":{
                "backend":{"language":"Python","framework":"django"},
                "database":{"provider":"postgres"}
            }}}}"#,
        )
        .unwrap();
        let out = docker_section(&project);
        assert!(out.starts_with("\n\n## Docker Configuration\n"));
        assert!(out.contains("- Use official Python image\n"));
        assert!(out.contains("- Expose port 5432\n"));
        assert!(!out.contains("### Frontend Dockerfile"));
        assert!(out.contains("### Docker Best Practices"));
    }

    #[test]
    fn skips_database_none() {
        let project: ProjectModel = serde_json::from_str(
            r#"{"name":"X","analysisResultModel":{"development":{"configs":{
                "database":{"provider":"none"}
            }}}}"#,
        )
        .unwrap();
        assert!(!docker_section(&project).contains("### Database Configuration"));
    }
}
