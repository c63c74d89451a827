use serde::Deserialize;

/// One annotation batch response. All sections are optional on the wire;
/// missing sections deserialize to empty.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotateResult {
    #[serde(default)]
    pub label_annotations: Vec<LabelAnnotation>,
    #[serde(default)]
    pub localized_object_annotations: Vec<ObjectAnnotation>,
    #[serde(default)]
    pub safe_search_annotation: Option<SafeSearchAnnotation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LabelAnnotation {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub score: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectAnnotation {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub score: f32,
}

/// Likelihood buckets as reported by the service ("VERY_UNLIKELY" .. "VERY_LIKELY").
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeSearchAnnotation {
    #[serde(default)]
    pub adult: String,
    #[serde(default)]
    pub violence: String,
}

impl SafeSearchAnnotation {
    pub fn is_safe(&self) -> bool {
        matches!(self.adult.as_str(), "" | "VERY_UNLIKELY" | "UNLIKELY")
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AnnotateResponse {
    #[serde(default)]
    pub responses: Vec<AnnotateResult>,
}
