//! Company records and their theme settings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Table holding company rows
pub const COMPANIES_TABLE: &str = "companies";

/// A tenant company
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub logo_light_storage_object_id: Option<Uuid>,
    pub logo_dark_storage_object_id: Option<Uuid>,
    pub theme: CompanyTheme,

    /// Resolved from storage, not a column
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_light_url: Option<String>,

    /// Resolved from storage, not a column
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_dark_url: Option<String>,
}

/// Partial update of a company row; `None` leaves a column untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompanyPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// `Some(None)` clears the logo
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_light_storage_object_id: Option<Option<Uuid>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_dark_storage_object_id: Option<Option<Uuid>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<CompanyTheme>,
}

/// Branding stored with each company
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyTheme {
    pub accent_color: AccentColor,
    pub gray_color: GrayColor,
    pub radius: Radius,
    pub scaling: Scaling,
    pub dark_mode: DarkMode,
    pub icon_weight: IconWeight,
    pub icon_sharpness: IconSharpness,
}

impl Default for CompanyTheme {
    fn default() -> Self {
        Self {
            accent_color: AccentColor::Gray,
            gray_color: GrayColor::Auto,
            radius: Radius::Medium,
            scaling: Scaling::Percent100,
            dark_mode: DarkMode::Choice,
            icon_weight: IconWeight::Regular,
            icon_sharpness: IconSharpness::Rounded,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccentColor {
    Tomato,
    Red,
    Ruby,
    Crimson,
    Pink,
    Plum,
    Purple,
    Violet,
    Iris,
    Indigo,
    Blue,
    Cyan,
    Teal,
    Jade,
    Green,
    Grass,
    Brown,
    Orange,
    Sky,
    Mint,
    Lime,
    Yellow,
    Amber,
    Gold,
    Bronze,
    Gray,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrayColor {
    Gray,
    Mauve,
    Slate,
    Sage,
    Olive,
    Sand,
    Auto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Radius {
    None,
    Small,
    Medium,
    Large,
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scaling {
    #[serde(rename = "90%")]
    Percent90,
    #[serde(rename = "95%")]
    Percent95,
    #[serde(rename = "100%")]
    Percent100,
    #[serde(rename = "105%")]
    Percent105,
    #[serde(rename = "110%")]
    Percent110,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DarkMode {
    Light,
    Dark,
    Choice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IconWeight {
    Solid,
    Regular,
    Light,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IconSharpness {
    Sharp,
    Rounded,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_company_from_row() {
        let row = json!({
            "id": "7c9e6679-7425-40de-944b-e07fc1f90ae7",
            "name": "Acme",
            "created_at": "2024-03-01T12:00:00+00:00",
            "logo_light_storage_object_id": null,
            "logo_dark_storage_object_id": null,
            "theme": {
                "accent_color": "jade",
                "gray_color": "auto",
                "radius": "large",
                "scaling": "105%",
                "dark_mode": "choice",
                "icon_weight": "solid",
                "icon_sharpness": "sharp"
            }
        });

        let company: Company = serde_json::from_value(row).unwrap();
        assert_eq!(company.name, "Acme");
        assert_eq!(company.theme.accent_color, AccentColor::Jade);
        assert_eq!(company.theme.scaling, Scaling::Percent105);
        assert!(company.logo_light_url.is_none());
    }

    #[test]
    fn test_patch_serializes_only_set_columns() {
        let patch = CompanyPatch {
            name: Some("Renamed".to_string()),
            logo_dark_storage_object_id: Some(None),
            ..CompanyPatch::default()
        };
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            json!({"name": "Renamed", "logo_dark_storage_object_id": null})
        );
    }

    #[test]
    fn test_default_theme_round_trips_names() {
        let theme = serde_json::to_value(CompanyTheme::default()).unwrap();
        assert_eq!(theme["scaling"], "100%");
        assert_eq!(theme["gray_color"], "auto");
    }
}
