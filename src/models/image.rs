use crate::error::{ImageMakerError, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum IdeogramAspectRatio {
    #[serde(rename = "1:1")]
    Aspect1x1,
    #[serde(rename = "16:9")]
    Aspect16x9,
    #[serde(rename = "9:16")]
    Aspect9x16,
    #[serde(rename = "4:3")]
    Aspect4x3,
    #[serde(rename = "3:4")]
    Aspect3x4,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum IdeogramModel {
    #[serde(rename = "1")]
    V1,
    #[serde(rename = "2")]
    V2,
}

impl IdeogramModel {
    /// List price in USD for one generated image.
    pub fn price_per_image(&self) -> f64 {
        match self {
            IdeogramModel::V1 => 0.06,
            IdeogramModel::V2 => 0.08,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MagicPromptOption {
    On,
    Off,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StyleType {
    General,
    Anime,
    Photography,
}

/// Per-request generation options. Every field is optional; unset fields are left
/// to the provider's defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct IdeogramDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<IdeogramAspectRatio>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<IdeogramModel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magic_prompt_option: Option<MagicPromptOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_type: Option<StyleType>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub negative_prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
}

impl IdeogramDetails {
    /// Builds details from a loosely-typed mapping, rejecting unknown keys and bad enum codes.
    pub fn from_map(map: serde_json::Map<String, serde_json::Value>) -> Result<Self> {
        let details: IdeogramDetails = serde_json::from_value(serde_json::Value::Object(map))
            .map_err(|e| ImageMakerError::ValidationError(format!("Invalid ideogram details: {}", e)))?;
        details.validate()?;
        Ok(details)
    }

    pub fn validate(&self) -> Result<()> {
        if self.aspect_ratio.is_some() && self.resolution.is_some() {
            return Err(ImageMakerError::ValidationError(
                "aspect_ratio and resolution cannot be used together".into(),
            ));
        }
        Ok(())
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: IdeogramAspectRatio) -> Self {
        self.aspect_ratio = Some(aspect_ratio);
        self
    }

    pub fn with_model(mut self, model: IdeogramModel) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_magic_prompt(mut self, option: MagicPromptOption) -> Self {
        self.magic_prompt_option = Some(option);
        self
    }

    pub fn with_style(mut self, style_type: StyleType) -> Self {
        self.style_type = Some(style_type);
        self
    }

    pub fn with_negative_prompt(mut self, negative_prompt: impl Into<String>) -> Self {
        self.negative_prompt = negative_prompt.into();
        self
    }

    pub fn with_seed(mut self, seed: i64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// One image request as sent on the wire. Only set fields are serialized.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<IdeogramAspectRatio>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<IdeogramModel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub magic_prompt_option: Option<MagicPromptOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style_type: Option<StyleType>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub negative_prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, details: &IdeogramDetails) -> Result<Self> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(ImageMakerError::ValidationError("Prompt must not be empty".into()));
        }
        details.validate()?;

        Ok(Self {
            prompt,
            aspect_ratio: details.aspect_ratio,
            resolution: details.resolution.clone(),
            model: details.model,
            magic_prompt_option: details.magic_prompt_option,
            style_type: details.style_type,
            negative_prompt: details.negative_prompt.clone(),
            seed: details.seed,
        })
    }
}

#[derive(Serialize)]
pub(crate) struct WrappedImageRequest<'a> {
    pub image_request: &'a GenerationRequest,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneratedImage {
    pub url: String,
    pub prompt: String,
    pub resolution: String,
    pub is_image_safe: bool,
    pub seed: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerateResponse {
    #[serde(deserialize_with = "deserialize_created")]
    pub created: DateTime<Utc>,
    pub data: Vec<GeneratedImage>,
}

/// Accepts RFC 3339 and, failing that, an ISO timestamp without offset read as UTC.
fn deserialize_created<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    raw.parse::<NaiveDateTime>()
        .or_else(|_| NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S%.f"))
        .map(|naive| naive.and_utc())
        .map_err(|e| serde::de::Error::custom(format!("invalid created timestamp {:?}: {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_only_set_fields_are_serialized() {
        let request = GenerationRequest::new("a cat", &IdeogramDetails::default()).unwrap();
        let value = serde_json::to_value(WrappedImageRequest {
            image_request: &request,
        })
        .unwrap();
        assert_eq!(value, json!({"image_request": {"prompt": "a cat"}}));
    }

    #[test]
    fn test_enum_codes_on_the_wire() {
        let details = IdeogramDetails::default()
            .with_aspect_ratio(IdeogramAspectRatio::Aspect16x9)
            .with_model(IdeogramModel::V2)
            .with_magic_prompt(MagicPromptOption::Off)
            .with_style(StyleType::Photography)
            .with_negative_prompt("blurry")
            .with_seed(7);
        let request = GenerationRequest::new("a cat", &details).unwrap();
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "prompt": "a cat",
                "aspect_ratio": "16:9",
                "model": "2",
                "magic_prompt_option": "off",
                "style_type": "photography",
                "negative_prompt": "blurry",
                "seed": 7
            })
        );
    }

    #[test]
    fn test_from_map_rejects_unknown_keys() {
        let map = json!({"aspect_ratio": "1:1", "colour": "red"});
        let err = IdeogramDetails::from_map(map.as_object().unwrap().clone()).unwrap_err();
        assert!(matches!(err, ImageMakerError::ValidationError(_)));
    }

    #[test]
    fn test_from_map_rejects_bad_enum_code() {
        let map = json!({"style_type": "watercolour"});
        assert!(IdeogramDetails::from_map(map.as_object().unwrap().clone()).is_err());
    }

    #[test]
    fn test_from_map_accepts_known_keys() {
        let map = json!({"aspect_ratio": "9:16", "magic_prompt_option": "on"});
        let details = IdeogramDetails::from_map(map.as_object().unwrap().clone()).unwrap();
        assert_eq!(details.aspect_ratio, Some(IdeogramAspectRatio::Aspect9x16));
        assert_eq!(details.magic_prompt_option, Some(MagicPromptOption::On));
    }

    #[test]
    fn test_aspect_ratio_and_resolution_are_exclusive() {
        let details = IdeogramDetails {
            aspect_ratio: Some(IdeogramAspectRatio::Aspect1x1),
            resolution: Some("RESOLUTION_1024_1024".into()),
            ..Default::default()
        };
        assert!(GenerationRequest::new("x", &details).is_err());
    }

    #[test]
    fn test_empty_prompt_rejected() {
        assert!(GenerationRequest::new("   ", &IdeogramDetails::default()).is_err());
    }

    #[test]
    fn test_parse_response() {
        let body = json!({
            "created": "2024-08-01T12:00:00Z",
            "data": [{
                "url": "http://x/img.png",
                "prompt": "a red fox in snow",
                "resolution": "1024x1024",
                "is_image_safe": true,
                "seed": 12345
            }]
        });
        let response: GenerateResponse = serde_json::from_value(body).unwrap();
        assert_eq!(response.data.len(), 1);
        assert_eq!(response.data[0].prompt, "a red fox in snow");
    }

    #[test]
    fn test_parse_response_missing_field_fails() {
        let body = json!({"created": "2024-08-01T12:00:00Z", "data": [{"url": "u"}]});
        assert!(serde_json::from_value::<GenerateResponse>(body).is_err());
    }

    #[test]
    fn test_parse_created_without_offset_as_utc() {
        let image = json!({
            "url": "http://x/img.png",
            "prompt": "a red fox",
            "resolution": "1024x1024",
            "is_image_safe": true,
            "seed": 1
        });
        let expected: DateTime<Utc> = "2024-08-01T12:00:00Z".parse().unwrap();

        let forms = [
            "2024-08-01T12:00:00",
            "2024-08-01T12:00:00.000000",
            "2024-08-01 12:00:00",
        ];
        for created in forms {
            let body = json!({"created": created, "data": [image.clone()]});
            let response: GenerateResponse = serde_json::from_value(body).unwrap();
            assert_eq!(response.created, expected, "created = {}", created);
        }

        let offset = json!({"created": "2024-08-01T14:00:00+02:00", "data": [image.clone()]});
        let response: GenerateResponse = serde_json::from_value(offset).unwrap();
        assert_eq!(response.created, expected);

        let garbage = json!({"created": "yesterday", "data": [image]});
        assert!(serde_json::from_value::<GenerateResponse>(garbage).is_err());
    }
}
