//! Request and response bodies of the casebook API.
//!
//! These mirror the core case types field for field but stay flat, so the OpenAPI document
//! describes exactly what goes over the wire.

use casebook_core::{CaseData, CaseInput, CaseMeta, CaseSummary, VersionToken};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<String>,
}

/// Body of every unsuccessful response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SuccessRes {
    pub success: bool,
}

impl SuccessRes {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CaseMetaRes {
    pub id: String,
    pub title: String,
    pub description: String,
    pub image: String,
    pub date: String,
    pub tags: Vec<String>,
}

impl From<CaseMeta> for CaseMetaRes {
    fn from(meta: CaseMeta) -> Self {
        Self {
            id: meta.id.to_string(),
            title: meta.title,
            description: meta.description,
            image: meta.image,
            date: meta.date,
            tags: meta.tags,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CaseSummaryRes {
    pub id: String,
    pub title: String,
    pub description: String,
    pub image: String,
    pub date: String,
    pub tags: Vec<String>,
    pub file_name: String,
    /// Plain-text length of the body.
    pub word_count: usize,
}

impl From<CaseSummary> for CaseSummaryRes {
    fn from(summary: CaseSummary) -> Self {
        let meta = CaseMetaRes::from(summary.meta);
        Self {
            id: meta.id,
            title: meta.title,
            description: meta.description,
            image: meta.image,
            date: meta.date,
            tags: meta.tags,
            file_name: summary.file_name,
            word_count: summary.word_count,
        }
    }
}

/// Public view of one case: markdown body plus its rendered HTML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CaseDetailRes {
    pub id: String,
    pub title: String,
    pub description: String,
    pub image: String,
    pub date: String,
    pub tags: Vec<String>,
    pub content: String,
    pub html: String,
}

impl CaseDetailRes {
    pub fn new(data: CaseData, html: String) -> Self {
        let meta = CaseMetaRes::from(data.meta);
        Self {
            id: meta.id,
            title: meta.title,
            description: meta.description,
            image: meta.image,
            date: meta.date,
            tags: meta.tags,
            content: data.content,
            html,
        }
    }
}

/// Admin view of one case, carrying the version an edit must be based on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AdminCaseRes {
    pub id: String,
    pub title: String,
    pub description: String,
    pub image: String,
    pub date: String,
    pub tags: Vec<String>,
    pub content: String,
    pub version: Option<String>,
}

impl From<CaseData> for AdminCaseRes {
    fn from(data: CaseData) -> Self {
        let meta = CaseMetaRes::from(data.meta);
        Self {
            id: meta.id,
            title: meta.title,
            description: meta.description,
            image: meta.image,
            date: meta.date,
            tags: meta.tags,
            content: data.content,
            version: data.version.map(|v| v.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CreateCaseReq {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub image: Option<String>,
    pub date: String,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    pub content: String,
}

impl CreateCaseReq {
    /// Splits the request into the raw id and the case fields.
    pub fn into_parts(self) -> (String, CaseInput) {
        let input = CaseInput {
            title: self.title,
            description: self.description,
            image: self.image,
            date: self.date,
            tags: self.tags,
            content: self.content,
        };
        (self.id, input)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UpdateCaseReq {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub image: Option<String>,
    pub date: String,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    pub content: String,
    /// Version returned when the case was read. Omit to overwrite whatever is current.
    #[serde(default)]
    pub version: Option<String>,
}

impl UpdateCaseReq {
    pub fn into_parts(self) -> (CaseInput, Option<VersionToken>) {
        let input = CaseInput {
            title: self.title,
            description: self.description,
            image: self.image,
            date: self.date,
            tags: self.tags,
            content: self.content,
        };
        (input, self.version.map(VersionToken::new))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LoginReq {
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListCasesQuery {
    /// Return only the most recent `limit` cases.
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DeleteCaseQuery {
    /// Version returned when the case was read.
    pub version: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use casebook_core::CaseId;

    fn meta() -> CaseMeta {
        CaseMeta {
            id: CaseId::parse("c1").unwrap(),
            title: "T".into(),
            description: "D".into(),
            image: "/images/c1-cover.jpg".into(),
            date: "2024-01-01".into(),
            tags: vec!["sms".into()],
        }
    }

    #[test]
    fn summary_serializes_flat() {
        let res = CaseSummaryRes::from(CaseSummary {
            meta: meta(),
            file_name: "c1.md".into(),
            word_count: 42,
        });
        let json = serde_json::to_value(&res).unwrap();
        assert_eq!(json["id"], "c1");
        assert_eq!(json["file_name"], "c1.md");
        assert_eq!(json["word_count"], 42);
        assert_eq!(json["tags"][0], "sms");
    }

    #[test]
    fn update_request_optional_fields_default() {
        let req: UpdateCaseReq = serde_json::from_str(
            r#"{"title":"T","description":"D","date":"2024-01-01","content":"b"}"#,
        )
        .unwrap();
        let (input, version) = req.into_parts();
        assert_eq!(input.image, None);
        assert_eq!(input.tags, None);
        assert_eq!(version, None);
    }

    #[test]
    fn admin_case_carries_version() {
        let res = AdminCaseRes::from(CaseData {
            meta: meta(),
            content: "body".into(),
            version: Some(VersionToken::new("abc")),
        });
        assert_eq!(res.version.as_deref(), Some("abc"));
        assert_eq!(res.content, "body");
    }

    #[test]
    fn health_omits_missing_storage() {
        let json = serde_json::to_value(HealthRes {
            ok: true,
            message: "up".into(),
            storage: None,
        })
        .unwrap();
        assert!(json.get("storage").is_none());
    }
}
