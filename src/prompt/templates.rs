use serde::Serialize;

use super::sections;
use crate::project::{ChatType, LandingPageConfig, ProjectModel};

/// The four prompt templates a project can be rendered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    AppOnly,
    Integrated,
    Separate,
    LandingOnly,
}

impl TemplateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateKind::AppOnly => "app_only",
            TemplateKind::Integrated => "integrated",
            TemplateKind::Separate => "separate",
            TemplateKind::LandingOnly => "landing_only",
        }
    }
}

/// Dispatch table from landing page configuration and chat type to template.
pub fn select_template(config: LandingPageConfig, chat_type: ChatType) -> TemplateKind {
    match (config, chat_type) {
        (LandingPageConfig::Separate, ChatType::LandingPage) => TemplateKind::LandingOnly,
        (LandingPageConfig::Separate, ChatType::Application) => TemplateKind::Separate,
        (LandingPageConfig::Integrated, _) => TemplateKind::Integrated,
        (LandingPageConfig::OnlyLanding, _) => TemplateKind::LandingOnly,
        (LandingPageConfig::None, _) => TemplateKind::AppOnly,
    }
}

pub fn render(kind: TemplateKind, project: &ProjectModel) -> String {
    match kind {
        TemplateKind::LandingOnly => landing_only(project),
        _ => application(kind, project),
    }
}

fn landing_only(project: &ProjectModel) -> String {
    format!(
        r#"# Landing Page Only Generation

{project_info}

{brand_info}

## Objective
Create a standalone landing page for "{name}" without any application functionality.

## Landing Page Specifications
- **Type**: Marketing landing page only
- **Goal**: Present the product, convert visitors to users
- **Integration**: No application integration needed

{tech_stack}

## Landing Page Sections
1. **Hero Section**: Compelling headline, value proposition, primary CTA
2. **Features**: Key product features and benefits
3. **Social Proof**: Testimonials, reviews, client logos
4. **Pricing**: Pricing plans and packages (if applicable)
5. **About**: Company/product information
6. **Contact**: Contact form and information
7. **Footer**: Legal links, social media, additional info

## Instructions
- Create a high-converting standalone landing page
- Focus on marketing and conversion optimization
- Implement modern design with smooth animations
- Optimize for SEO and performance
- Include clear call-to-action buttons
- Make it fully responsive across all devices
- Use the provided brand assets and colors
- No application functionality needed

Generate the complete landing page code with all necessary files."#,
        project_info = sections::project_info(project),
        brand_info = sections::brand_info(project),
        name = project.name,
        tech_stack = sections::tech_stack(project),
    )
}

struct AppTemplate {
    title: &'static str,
    objective: String,
    specifications: &'static str,
    instructions: &'static str,
}

fn app_template(kind: TemplateKind, name: &str) -> AppTemplate {
    match kind {
        TemplateKind::Separate => AppTemplate {
            title: "Application Generation (Separate Configuration)",
            objective: format!(
                "Create the main \"{}\" application without integrated landing page.",
                name
            ),
            specifications: "## Application Specifications
- **Type**: Complete web application
- **Landing Page**: Separate (managed in another chat)
- **Focus**: Business features and user interface",
            instructions: "## Instructions
- Create a complete and functional web application
- Implement all required business features based on use case diagrams
- Ensure excellent UX/UI with brand consistency
- Optimize performance and security
- Include authentication and user management
- Landing page will be managed separately
- Use the provided brand assets and design system",
        },
        TemplateKind::Integrated => AppTemplate {
            title: "Application Generation with Integrated Landing Page",
            objective: format!(
                "Create a complete \"{}\" web application with integrated landing page.",
                name
            ),
            specifications: "## Architecture
- **Type**: Monolithic application with integrated landing page
- **Structure**: Landing page + Application in the same project
- **Routing**: Separate routes for landing (/), app (/app/*, /dashboard/*, etc.)

## Integrated Landing Page Sections
1. **Hero Section**: Product presentation
2. **Features**: Main features
3. **Benefits**: User advantages
4. **CTA**: Buttons to signup/login
5. **Footer**: Legal information",
            instructions: "## Instructions
- Create a complete application with integrated landing page
- Use a routing system to separate landing and app
- Ensure smooth transition between landing and application
- Implement authentication with appropriate redirection
- Optimize for SEO on the landing page
- Maintain design consistency between landing and app
- Use the provided brand assets throughout
- Implement all features based on use case diagrams",
        },
        _ => AppTemplate {
            title: "Web Application Generation",
            objective: format!(
                "Create the \"{}\" web application without landing page.",
                name
            ),
            specifications: "## Specifications
- **Type**: Pure web application
- **Landing Page**: None
- **Focus**: User interface and business features only",
            instructions: "## Instructions
- Create a complete and functional web application
- Start directly with authentication interface or dashboard
- Implement all required business features based on use case diagrams
- Ensure excellent UX/UI with brand consistency
- Optimize performance and security
- Include complete user management
- Use the provided brand assets and design system",
        },
    }
}

fn application(kind: TemplateKind, project: &ProjectModel) -> String {
    let template = app_template(kind, &project.name);

    format!(
        r#"# {title}

{project_info}

{brand_info}

## Objective
{objective}

{specifications}

{tech_stack}

{features}

{diagrams}

{instructions}

Generate the complete application code with all necessary files."#,
        title = template.title,
        project_info = sections::project_info(project),
        brand_info = sections::brand_info(project),
        objective = template.objective,
        specifications = template.specifications,
        tech_stack = sections::tech_stack(project),
        features = sections::features(project),
        diagrams = sections::use_case_diagrams(project),
        instructions = template.instructions,
    )
}
