use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Project snapshot as returned by the project API.
///
/// Everything except the name is optional; prompt builders fall back to
/// placeholder text instead of failing on missing data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectModel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub targets: Option<OneOrMany>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_result_model: Option<AnalysisResult>,
}

impl ProjectModel {
    pub fn branding(&self) -> Option<&Branding> {
        self.analysis_result_model.as_ref()?.branding.as_ref()
    }

    pub fn configs(&self) -> Option<&DevelopmentConfigs> {
        self.analysis_result_model
            .as_ref()?
            .development
            .as_ref()?
            .configs
            .as_ref()
    }

    pub fn design_sections(&self) -> &[DesignSection] {
        self.analysis_result_model
            .as_ref()
            .and_then(|a| a.design.as_ref())
            .and_then(|d| d.sections.as_deref())
            .unwrap_or(&[])
    }

    pub fn landing_page_config(&self) -> LandingPageConfig {
        self.configs()
            .and_then(|c| c.landing_page_config)
            .unwrap_or_default()
    }
}

/// A JSON value that may be a single string or a list of strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn join(&self, sep: &str) -> String {
        match self {
            OneOrMany::One(s) => s.clone(),
            OneOrMany::Many(items) => items.join(sep),
        }
    }
}

impl fmt::Display for OneOrMany {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.join(", "))
    }
}

/// Feature lists come either as plain names or as a name → enabled map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureSet {
    List(Vec<String>),
    Flags(BTreeMap<String, bool>),
}

impl FeatureSet {
    /// Names to implement: list entries verbatim, enabled flags capitalized.
    pub fn enabled_names(&self) -> Vec<String> {
        match self {
            FeatureSet::List(items) => items.clone(),
            FeatureSet::Flags(flags) => flags
                .iter()
                .filter(|(_, enabled)| **enabled)
                .map(|(name, _)| capitalize(name))
                .collect(),
        }
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        match self {
            FeatureSet::List(items) => items.iter().any(|i| i == name),
            FeatureSet::Flags(flags) => flags.get(name).copied().unwrap_or(false),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

pub(crate) fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branding: Option<Branding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub development: Option<Development>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub design: Option<Design>,
}

// ===== Branding =====

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Branding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<Logo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<ColorScheme>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typography: Option<Typography>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Logo {
    #[serde(default)]
    pub svg: Option<String>,
    #[serde(default)]
    pub concept: Option<String>,
    #[serde(default)]
    pub colors: Option<Vec<String>>,
    #[serde(default)]
    pub fonts: Option<Vec<String>>,
    #[serde(default)]
    pub variations: Option<LogoVariations>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoVariations {
    #[serde(default)]
    pub light_background: Option<String>,
    #[serde(default)]
    pub dark_background: Option<String>,
    #[serde(default)]
    pub monochrome: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorScheme {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub colors: Option<Palette>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Palette {
    #[serde(default)]
    pub primary: Option<String>,
    #[serde(default)]
    pub secondary: Option<String>,
    #[serde(default)]
    pub accent: Option<String>,
    #[serde(default)]
    pub background: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Typography {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub primary_font: Option<String>,
    #[serde(default)]
    pub secondary_font: Option<String>,
}

// ===== Development configuration =====

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Development {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configs: Option<DevelopmentConfigs>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevelopmentConfigs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frontend: Option<FrontendConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<BackendConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<DatabaseConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_config: Option<ProjectConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landing_page_config: Option<LandingPageConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrontendConfig {
    #[serde(default)]
    pub framework: String,
    #[serde(default)]
    pub framework_version: Option<String>,
    #[serde(default)]
    pub styling: Option<OneOrMany>,
    #[serde(default)]
    pub features: Option<FeatureSet>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendConfig {
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub framework: Option<String>,
    #[serde(default)]
    pub framework_version: Option<String>,
    #[serde(default)]
    pub api_type: Option<String>,
    #[serde(default)]
    pub orm: Option<String>,
    #[serde(default)]
    pub features: Option<FeatureSet>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseConfig {
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub orm: Option<String>,
    #[serde(default)]
    pub orm_version: Option<String>,
    #[serde(default)]
    pub features: Option<FeatureSet>,
}

/// Project-wide switches. Unknown keys are kept so extra boolean flags
/// can still be listed as features.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    #[serde(default)]
    pub authentication: bool,
    #[serde(default)]
    pub authorization: bool,
    #[serde(default)]
    pub seo_enabled: bool,
    #[serde(default)]
    pub contact_form_enabled: bool,
    #[serde(default)]
    pub analytics_enabled: bool,
    #[serde(default)]
    pub i18n_enabled: bool,
    #[serde(default)]
    pub performance_optimized: bool,
    #[serde(default)]
    pub payment_integration: bool,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ProjectConfig {
    /// Extra flags set to `true`, in key order.
    pub fn extra_enabled(&self) -> impl Iterator<Item = &str> {
        self.extra
            .iter()
            .filter(|(_, v)| v.as_bool() == Some(true))
            .map(|(k, _)| k.as_str())
    }
}

/// Which marketing page, if any, accompanies the generated application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", from = "String")]
pub enum LandingPageConfig {
    #[default]
    None,
    Integrated,
    Separate,
    OnlyLanding,
}

impl LandingPageConfig {
    pub fn as_str(&self) -> &'static str {
        match self {
            LandingPageConfig::None => "NONE",
            LandingPageConfig::Integrated => "INTEGRATED",
            LandingPageConfig::Separate => "SEPARATE",
            LandingPageConfig::OnlyLanding => "ONLY_LANDING",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "NONE" => Some(LandingPageConfig::None),
            "INTEGRATED" => Some(LandingPageConfig::Integrated),
            "SEPARATE" => Some(LandingPageConfig::Separate),
            "ONLY_LANDING" => Some(LandingPageConfig::OnlyLanding),
            _ => None,
        }
    }
}

impl From<String> for LandingPageConfig {
    fn from(s: String) -> Self {
        Self::parse(&s).unwrap_or_default()
    }
}

/// Which chat of a project is being driven. Only meaningful when the
/// landing page is generated separately.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChatType {
    #[default]
    Application,
    LandingPage,
}

// ===== Design =====

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Design {
    #[serde(default)]
    pub sections: Option<Vec<DesignSection>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignSection {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_project() {
        let project: ProjectModel = serde_json::from_str(r#"{"name":"Shop"}"#).unwrap();
        assert_eq!(project.name, "Shop");
        assert!(project.configs().is_none());
        assert!(project.branding().is_none());
        assert!(project.design_sections().is_empty());
        assert_eq!(project.landing_page_config(), LandingPageConfig::None);
    }

    #[test]
    fn parses_nested_configs() {
        let json = r#"{
            "name": "Shop",
            "description": "Sells things",
            "type": "web",
            "targets": ["students", "teachers"],
            "analysisResultModel": {
                "development": {
                    "configs": {
                        "frontend": {
                            "framework": "react",
                            "styling": ["tailwind", "css"],
                            "features": {"routing": true, "pwa": false}
                        },
                        "backend": {"framework": "express", "apiType": "REST", "features": ["logging"]},
                        "projectConfig": {"authentication": true, "darkMode": true, "beta": "x"},
                        "landingPageConfig": "SEPARATE"
                    }
                }
            }
        }"#;
        let project: ProjectModel = serde_json::from_str(json).unwrap();
        let configs = project.configs().unwrap();

        assert_eq!(project.landing_page_config(), LandingPageConfig::Separate);
        assert_eq!(project.targets.as_ref().unwrap().join(", "), "students, teachers");

        let frontend = configs.frontend.as_ref().unwrap();
        assert_eq!(frontend.styling.as_ref().unwrap().to_string(), "tailwind, css");
        assert_eq!(
            frontend.features.as_ref().unwrap().enabled_names(),
            vec!["Routing".to_string()]
        );

        let project_config = configs.project_config.as_ref().unwrap();
        assert!(project_config.authentication);
        assert_eq!(project_config.extra_enabled().collect::<Vec<_>>(), vec!["darkMode"]);
    }

    #[test]
    fn unknown_landing_config_falls_back_to_none() {
        let config: LandingPageConfig = serde_json::from_str(r#""SOMETHING""#).unwrap();
        assert_eq!(config, LandingPageConfig::None);
        let config: LandingPageConfig = serde_json::from_str(r#""ONLY_LANDING""#).unwrap();
        assert_eq!(config, LandingPageConfig::OnlyLanding);
    }

    #[test]
    fn feature_flags_serialize_deterministically() {
        let a: FeatureSet = serde_json::from_str(r#"{"b":true,"a":false}"#).unwrap();
        let b: FeatureSet = serde_json::from_str(r#"{"a":false,"b":true}"#).unwrap();
        assert_eq!(a.to_json(), b.to_json());
        assert_eq!(a.to_json(), r#"{"a":false,"b":true}"#);
    }
}
