use crate::domain::employee_number::EmployeeNumber;
use crate::domain::requested_service::RequestedService;
use crate::domain::status::Status;
use crate::domain::subscriber_email::SubscriberEmail;
use crate::domain::subscriber_name::SubscriberName;
use serde::{Deserialize, Serialize};

pub const CORRECTION_HEADER: [&str; 8] = [
    "Fecha",
    "Nombre",
    "Email",
    "Número económico",
    "Nombre del artículo",
    "Servicios solicitados",
    "Estado",
    "Fecha terminación",
];

/// One row of `registro_correccion.csv`. Older copies of the file use
/// different capitalisations for some columns, hence the aliases.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectionRecord {
    #[serde(rename = "Fecha", alias = "Fecha y Hora")]
    pub submitted_at: String,
    #[serde(rename = "Nombre")]
    pub name: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Número económico", alias = "Número Económico")]
    pub employee_number: String,
    #[serde(rename = "Nombre del artículo", alias = "Nombre del Archivo")]
    pub article_name: String,
    #[serde(rename = "Servicios solicitados", alias = "Servicios Solicitados")]
    pub services: String,
    #[serde(rename = "Estado")]
    pub status: Status,
    #[serde(rename = "Fecha terminación", alias = "Fecha Terminación")]
    pub finished_on: String,
}

/// A manuscript uploaded for review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleFile {
    pub original_name: String,
    pub content: Vec<u8>,
}

impl ArticleFile {
    pub const ALLOWED_EXTENSIONS: [&'static str; 2] = ["doc", "docx"];

    pub fn parse(original_name: String, content: Vec<u8>) -> Result<ArticleFile, String> {
        let original_name = original_name.trim().to_string();
        let file_name = std::path::Path::new(&original_name)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let extension = std::path::Path::new(&file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match extension {
            Some(ext) if Self::ALLOWED_EXTENSIONS.contains(&ext.as_str()) => {}
            _ => return Err(format!("{} is not a .doc or .docx file", original_name)),
        }
        if content.is_empty() {
            return Err(format!("{} is empty", file_name));
        }

        Ok(Self {
            original_name: file_name,
            content,
        })
    }

    pub fn content_type(&self) -> &'static str {
        if self.original_name.to_lowercase().ends_with(".docx") {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        } else {
            "application/msword"
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewCorrectionRequest {
    pub name: SubscriberName,
    pub email: SubscriberEmail,
    pub employee_number: EmployeeNumber,
    pub services: Vec<RequestedService>,
    pub article: ArticleFile,
}

impl NewCorrectionRequest {
    pub fn services_label(&self) -> String {
        RequestedService::join(&self.services)
    }

    pub fn into_record(&self, submitted_at: String) -> CorrectionRecord {
        CorrectionRecord {
            submitted_at,
            name: self.name.as_ref().to_string(),
            email: self.email.as_ref().to_string(),
            employee_number: self.employee_number.as_ref().to_string(),
            article_name: self.article.original_name.clone(),
            services: self.services_label(),
            status: Status::Active,
            finished_on: String::new(),
        }
    }
}
