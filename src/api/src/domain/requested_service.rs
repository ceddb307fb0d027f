use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestedService {
    OriginalityCheck,
    Paraphrasing,
    SimilarityReport,
    AiFactor,
    StyleReview,
    PartialTranslation,
}

impl RequestedService {
    pub const ALL: [RequestedService; 6] = [
        RequestedService::OriginalityCheck,
        RequestedService::Paraphrasing,
        RequestedService::SimilarityReport,
        RequestedService::AiFactor,
        RequestedService::StyleReview,
        RequestedService::PartialTranslation,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::OriginalityCheck => "Verificación de originalidad",
            Self::Paraphrasing => "Parafraseo",
            Self::SimilarityReport => "Reporte de similitudes",
            Self::AiFactor => "Factor IA",
            Self::StyleReview => "Revisión de estilo",
            Self::PartialTranslation => "Traducción parcial",
        }
    }

    /// Form value, matching the serde representation.
    pub fn key(&self) -> &'static str {
        match self {
            Self::OriginalityCheck => "originality_check",
            Self::Paraphrasing => "paraphrasing",
            Self::SimilarityReport => "similarity_report",
            Self::AiFactor => "ai_factor",
            Self::StyleReview => "style_review",
            Self::PartialTranslation => "partial_translation",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.key() == key.trim())
    }

    /// The `, `-joined form stored in `Servicios solicitados`.
    pub fn join(services: &[RequestedService]) -> String {
        services
            .iter()
            .map(|s| s.label())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
