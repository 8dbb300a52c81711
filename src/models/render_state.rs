use super::parameters::Parameters;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Portlet window state as understood by the portal
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum WindowState {
    Normal,
    Maximized,
    Minimized,
    /// Portal-specific window state
    Custom(String),
}

impl WindowState {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Normal => "normal",
            Self::Maximized => "maximized",
            Self::Minimized => "minimized",
            Self::Custom(name) => name,
        }
    }
}

impl From<String> for WindowState {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "normal" => Self::Normal,
            "maximized" => Self::Maximized,
            "minimized" => Self::Minimized,
            _ => Self::Custom(value),
        }
    }
}

impl From<&str> for WindowState {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<WindowState> for String {
    fn from(value: WindowState) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for WindowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Portlet mode as understood by the portal
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PortletMode {
    View,
    Edit,
    Help,
    /// Portal-specific portlet mode
    Custom(String),
}

impl PortletMode {
    pub fn as_str(&self) -> &str {
        match self {
            Self::View => "view",
            Self::Edit => "edit",
            Self::Help => "help",
            Self::Custom(name) => name,
        }
    }
}

impl From<String> for PortletMode {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "view" => Self::View,
            "edit" => Self::Edit,
            "help" => Self::Help,
            _ => Self::Custom(value),
        }
    }
}

impl From<&str> for PortletMode {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<PortletMode> for String {
    fn from(value: PortletMode) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for PortletMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Render state object produced by `HubHandle::new_state` and submitted back
/// through `HubHandle::set_render_state`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_state: Option<WindowState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portlet_mode: Option<PortletMode>,
    #[serde(default)]
    pub parameters: Parameters,
}
