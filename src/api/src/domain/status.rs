use serde::{Deserialize, Serialize};

/// The free-text `Estado` column.
///
/// Registries are edited by hand, so the same state shows up as `Activo`,
/// `activo` or ` ACTIVO `. Parsing folds those spellings together and keeps
/// anything unknown verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Status {
    Active,
    InProgress,
    Finished,
    Inactive,
    Other(String),
}

impl Status {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_lowercase().as_str() {
            "activo" => Self::Active,
            "en proceso" => Self::InProgress,
            "terminado" => Self::Finished,
            "inactivo" => Self::Inactive,
            _ => Self::Other(trimmed.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Active => "Activo",
            Self::InProgress => "En proceso",
            Self::Finished => "Terminado",
            Self::Inactive => "Inactivo",
            Self::Other(raw) => raw.as_str(),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Label used on the correction dashboards, where a request that was
    /// received but not finished is reported as being in progress.
    pub fn dashboard_label(&self) -> &str {
        match self {
            Self::Active | Self::InProgress => "En proceso",
            Self::Other(raw) if raw.is_empty() => "Sin estado",
            other => other.as_str(),
        }
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<String> for Status {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<Status> for String {
    fn from(value: Status) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
