//! Section builders shared by every prompt template.
//!
//! Each builder is a pure function of one part of the project snapshot and
//! returns a markdown block without a trailing blank line.

use crate::project::{BackendConfig, Branding, DevelopmentConfigs, FrontendConfig, ProjectConfig, ProjectModel};

pub const NOT_SPECIFIED: &str = "Not specified";
pub const NO_DESCRIPTION: &str = "No description provided";

fn or_not_specified(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => NOT_SPECIFIED,
    }
}

fn version_suffix(version: Option<&str>) -> String {
    match version {
        Some(v) if !v.is_empty() => format!(" v{}", v),
        _ => String::new(),
    }
}

fn enabled(flag: bool) -> &'static str {
    if flag {
        "Enabled"
    } else {
        "Disabled"
    }
}

pub fn project_info(project: &ProjectModel) -> String {
    let description = project
        .description
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .unwrap_or(NO_DESCRIPTION);
    let kind = project.kind.as_deref().filter(|k| !k.is_empty()).unwrap_or("web");
    let targets = project
        .targets
        .as_ref()
        .map(|t| t.join(", "))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| NOT_SPECIFIED.to_string());

    format!(
        "## Project Information\n\
         - **Name**: {}\n\
         - **Description**: {}\n\
         - **Type**: {}\n\
         - **Scope**: {}\n\
         - **Targets**: {}",
        project.name,
        description,
        kind,
        or_not_specified(project.scope.as_deref()),
        targets
    )
}

pub fn brand_info(project: &ProjectModel) -> String {
    match project.branding() {
        Some(branding) => render_branding(branding),
        None => "## Brand Information\n- No brand information specified".to_string(),
    }
}

fn render_branding(branding: &Branding) -> String {
    let mut out = String::from("## Brand Information\n");

    if let Some(logo) = &branding.logo {
        out.push_str("### Logo\n");
        out.push_str(&format!("- **Main Logo**: {} (URL)\n", or_not_specified(logo.svg.as_deref())));
        out.push_str(&format!("- **Concept**: {}\n", or_not_specified(logo.concept.as_deref())));
        out.push_str(&format!("- **Colors**: {}\n", join_or_not_specified(logo.colors.as_deref())));
        out.push_str(&format!("- **Fonts**: {}\n", join_or_not_specified(logo.fonts.as_deref())));

        if let Some(variations) = &logo.variations {
            out.push_str("- **Variations**:\n");
            if let Some(light) = &variations.light_background {
                out.push_str(&format!("  - Light Background: {} (URL)\n", light));
            }
            if let Some(dark) = &variations.dark_background {
                out.push_str(&format!("  - Dark Background: {} (URL)\n", dark));
            }
            if let Some(mono) = &variations.monochrome {
                out.push_str(&format!("  - Monochrome: {} (URL)\n", mono));
            }
        }
    }

    if let Some(colors) = &branding.colors {
        out.push_str("### Colors\n");
        out.push_str(&format!("- **Color Scheme**: {}\n", or_not_specified(colors.name.as_deref())));
        out.push_str(&format!("- **Reference**: {} (URL)\n", or_not_specified(colors.url.as_deref())));
        if let Some(palette) = &colors.colors {
            out.push_str(&format!("- **Primary**: {}\n", or_not_specified(palette.primary.as_deref())));
            out.push_str(&format!("- **Secondary**: {}\n", or_not_specified(palette.secondary.as_deref())));
            out.push_str(&format!("- **Accent**: {}\n", or_not_specified(palette.accent.as_deref())));
            out.push_str(&format!("- **Background**: {}\n", or_not_specified(palette.background.as_deref())));
            out.push_str(&format!("- **Text**: {}\n", or_not_specified(palette.text.as_deref())));
        }
    }

    if let Some(typography) = &branding.typography {
        out.push_str("### Typography\n");
        out.push_str(&format!("- **Font System**: {}\n", or_not_specified(typography.name.as_deref())));
        out.push_str(&format!("- **Reference**: {} (URL)\n", or_not_specified(typography.url.as_deref())));
        out.push_str(&format!(
            "- **Primary Font**: {}\n",
            or_not_specified(typography.primary_font.as_deref())
        ));
        out.push_str(&format!(
            "- **Secondary Font**: {}\n",
            or_not_specified(typography.secondary_font.as_deref())
        ));
    }

    trim_block(out)
}

fn join_or_not_specified(items: Option<&[String]>) -> String {
    match items {
        Some(items) if !items.is_empty() => items.join(", "),
        _ => NOT_SPECIFIED.to_string(),
    }
}

pub fn tech_stack(project: &ProjectModel) -> String {
    match project.configs() {
        Some(configs) => render_tech_stack(configs),
        None => "## Technology Stack\n- No technology stack specified".to_string(),
    }
}

fn render_tech_stack(configs: &DevelopmentConfigs) -> String {
    let mut out = String::from("## Technology Stack\n");

    if let Some(frontend) = &configs.frontend {
        out.push_str(&frontend_block(frontend));
    }
    if let Some(backend) = &configs.backend {
        out.push_str(&backend_block(backend));
    }
    if let Some(database) = &configs.database {
        out.push_str("### Database\n");
        out.push_str(&format!(
            "- **Provider**: {}{}\n",
            or_not_specified(Some(database.provider.as_str())),
            version_suffix(database.version.as_deref())
        ));
        if let Some(orm) = &database.orm {
            out.push_str(&format!(
                "- **ORM**: {}{}\n",
                orm,
                version_suffix(database.orm_version.as_deref())
            ));
        }
    }
    if let Some(project_config) = &configs.project_config {
        out.push_str(&project_config_block(project_config));
    }

    if out == "## Technology Stack\n" {
        out.push_str("- No technology stack specified");
    }
    trim_block(out)
}

fn frontend_block(frontend: &FrontendConfig) -> String {
    let mut out = String::from("### Frontend\n");
    out.push_str(&format!(
        "- **Framework**: {}{}\n",
        or_not_specified(Some(frontend.framework.as_str())),
        version_suffix(frontend.framework_version.as_deref())
    ));
    let styling = frontend
        .styling
        .as_ref()
        .map(|s| s.join(", "))
        .unwrap_or_else(|| NOT_SPECIFIED.to_string());
    out.push_str(&format!("- **Styling**: {}\n", styling));
    if let Some(features) = &frontend.features {
        out.push_str(&format!("- **Frontend Features**: {}\n", features.to_json()));
    }
    out
}

fn backend_block(backend: &BackendConfig) -> String {
    let mut out = String::from("### Backend\n");
    out.push_str(&format!("- **Language**: {}\n", or_not_specified(backend.language.as_deref())));
    out.push_str(&format!(
        "- **Framework**: {}{}\n",
        or_not_specified(backend.framework.as_deref()),
        version_suffix(backend.framework_version.as_deref())
    ));
    out.push_str(&format!(
        "- **API Type**: {}\n",
        backend.api_type.as_deref().filter(|a| !a.is_empty()).unwrap_or("REST")
    ));
    if let Some(orm) = &backend.orm {
        out.push_str(&format!("- **ORM**: {}\n", orm));
    }
    if let Some(features) = &backend.features {
        out.push_str(&format!("- **Backend Features**: {}\n", features.to_json()));
    }
    out
}

fn project_config_block(config: &ProjectConfig) -> String {
    let mut out = String::from("### Project Configuration\n");
    out.push_str(&format!("- **Authentication**: {}\n", enabled(config.authentication)));
    out.push_str(&format!("- **Authorization**: {}\n", enabled(config.authorization)));
    out.push_str(&format!("- **SEO**: {}\n", enabled(config.seo_enabled)));
    out.push_str(&format!("- **Contact Form**: {}\n", enabled(config.contact_form_enabled)));
    out.push_str(&format!("- **Analytics**: {}\n", enabled(config.analytics_enabled)));
    out.push_str(&format!("- **Internationalization**: {}\n", enabled(config.i18n_enabled)));
    out.push_str(&format!(
        "- **Performance Optimization**: {}\n",
        enabled(config.performance_optimized)
    ));
    out.push_str(&format!("- **Payment Integration**: {}\n", enabled(config.payment_integration)));
    out
}

pub fn features(project: &ProjectModel) -> String {
    const FALLBACK: &str = "## Features\n- No features specified";

    let Some(configs) = project.configs() else {
        return FALLBACK.to_string();
    };

    let mut blocks: Vec<String> = Vec::new();

    if let Some(features) = configs.frontend.as_ref().and_then(|f| f.features.as_ref()) {
        blocks.push(feature_list("### Frontend Features", features.enabled_names()));
    }
    if let Some(features) = configs.backend.as_ref().and_then(|b| b.features.as_ref()) {
        blocks.push(feature_list("### Backend Features", features.enabled_names()));
    }
    if let Some(config) = &configs.project_config {
        let mut names: Vec<String> = [
            (config.authentication, "User Authentication"),
            (config.authorization, "User Authorization"),
            (config.seo_enabled, "SEO Optimization"),
            (config.contact_form_enabled, "Contact Form"),
            (config.analytics_enabled, "Analytics Integration"),
            (config.i18n_enabled, "Internationalization"),
            (config.performance_optimized, "Performance Optimization"),
            (config.payment_integration, "Payment Integration"),
        ]
        .into_iter()
        .filter(|(on, _)| *on)
        .map(|(_, label)| label.to_string())
        .collect();
        names.extend(config.extra_enabled().map(crate::project::model::capitalize));
        blocks.push(feature_list("### Project Features", names));
    }

    let blocks: Vec<String> = blocks.into_iter().filter(|b| b.contains("\n- ")).collect();
    if blocks.is_empty() {
        return FALLBACK.to_string();
    }

    format!("## Features to Implement\n{}", blocks.join("\n\n"))
}

fn feature_list(heading: &str, names: Vec<String>) -> String {
    let mut out = heading.to_string();
    for name in names {
        out.push_str(&format!("\n- {}", name));
    }
    out
}

pub fn use_case_diagrams(project: &ProjectModel) -> String {
    let sections = project.design_sections();
    if sections.is_empty() {
        return "## Use Case Diagrams\n- No use case diagrams specified".to_string();
    }

    let mut out = String::from("## Use Case Diagrams\n");
    out.push_str("**IMPORTANT**: Implement the application based on these use case diagrams:\n\n");

    for section in sections {
        out.push_str(&format!("### {}\n", section.name));
        out.push_str(&format!("- **Type**: {}\n", section.kind));
        out.push_str(&format!("- **Summary**: {}\n", section.summary));
        if let Some(data) = &section.data {
            let details = serde_json::to_string_pretty(data).unwrap_or_default();
            out.push_str(&format!("- **Details**: {}\n", details));
        }
        out.push('\n');
    }

    trim_block(out)
}

fn trim_block(mut s: String) -> String {
    let trimmed_len = s.trim_end().len();
    s.truncate(trimmed_len);
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(json: &str) -> ProjectModel {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn project_info_uses_fallbacks() {
        let info = project_info(&project(r#"{"name":"Empty"}"#));
        assert!(info.contains("- **Name**: Empty"));
        assert!(info.contains("- **Description**: No description provided"));
        assert!(info.contains("- **Type**: web"));
        assert!(info.contains("- **Scope**: Not specified"));
        assert!(info.contains("- **Targets**: Not specified"));
    }

    #[test]
    fn missing_analysis_degrades_every_section() {
        let p = project(r#"{"name":"Empty"}"#);
        assert_eq!(brand_info(&p), "## Brand Information\n- No brand information specified");
        assert_eq!(tech_stack(&p), "## Technology Stack\n- No technology stack specified");
        assert_eq!(features(&p), "## Features\n- No features specified");
        assert_eq!(
            use_case_diagrams(&p),
            "## Use Case Diagrams\n- No use case diagrams specified"
        );
    }

    #[test]
    fn tech_stack_renders_versions_and_flags() {
        let p = project(
            r#"{"name":"X","analysisResultModel":{"development":{"configs":{
                "frontend":{"framework":"react","frameworkVersion":"18","styling":"tailwind"},
                "backend":{"language":"python","framework":"fastapi"},
                "database":{"provider":"postgresql","version":"16"},
                "projectConfig":{"authentication":true}
            }}}}"#,
        );
        let stack = tech_stack(&p);
        assert!(stack.contains("- **Framework**: react v18"));
        assert!(stack.contains("- **Styling**: tailwind"));
        assert!(stack.contains("- **Language**: python"));
        assert!(stack.contains("- **API Type**: REST"));
        assert!(stack.contains("- **Provider**: postgresql v16"));
        assert!(stack.contains("- **Authentication**: Enabled"));
        assert!(stack.contains("- **SEO**: Disabled"));
    }

    #[test]
    fn features_list_enabled_entries_only() {
        let p = project(
            r#"{"name":"X","analysisResultModel":{"development":{"configs":{
                "frontend":{"framework":"vue","features":{"routing":true,"pwa":false}},
                "backend":{"framework":"axum","features":["logging","docs"]},
                "projectConfig":{"seoEnabled":true,"darkMode":true}
            }}}}"#,
        );
        let out = features(&p);
        assert!(out.starts_with("## Features to Implement\n"));
        assert!(out.contains("### Frontend Features\n- Routing"));
        assert!(!out.contains("Pwa"));
        assert!(out.contains("- logging\n- docs"));
        assert!(out.contains("- SEO Optimization"));
        assert!(out.contains("- DarkMode"));
    }

    #[test]
    fn diagrams_include_pretty_details() {
        let p = project(
            r#"{"name":"X","analysisResultModel":{"design":{"sections":[
                {"name":"Checkout","type":"use-case","summary":"Buy","data":{"actors":["buyer"]}}
            ]}}}"#,
        );
        let out = use_case_diagrams(&p);
        assert!(out.contains("### Checkout"));
        assert!(out.contains("- **Type**: use-case"));
        assert!(out.contains("\"actors\""));
    }
}
