//! Request and response shapes for the image API.
//!
//! Client submissions arrive as a flat [`SubmitRequest`] and are reshaped into
//! the vendor body for the selected job kind. Task envelopes are shared by the
//! client library and the poller.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::imaging::{detect_aspect_ratio, strip_data_url};

/// Separator placed between style and prompt (full-width comma).
pub const STYLE_SEPARATOR: char = '，';

/// Supported output aspect ratios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "16:9")]
    Widescreen,
    #[serde(rename = "4:3")]
    Standard,
    #[serde(rename = "3:2")]
    Classic,
    #[serde(rename = "2:3")]
    ClassicPortrait,
    #[serde(rename = "3:4")]
    StandardPortrait,
    #[serde(rename = "9:16")]
    Vertical,
    #[serde(rename = "21:9")]
    Ultrawide,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 8] = [
        AspectRatio::Square,
        AspectRatio::Widescreen,
        AspectRatio::Standard,
        AspectRatio::Classic,
        AspectRatio::ClassicPortrait,
        AspectRatio::StandardPortrait,
        AspectRatio::Vertical,
        AspectRatio::Ultrawide,
    ];

    /// Width and height terms of the ratio.
    pub fn terms(self) -> (u32, u32) {
        match self {
            AspectRatio::Square => (1, 1),
            AspectRatio::Widescreen => (16, 9),
            AspectRatio::Standard => (4, 3),
            AspectRatio::Classic => (3, 2),
            AspectRatio::ClassicPortrait => (2, 3),
            AspectRatio::StandardPortrait => (3, 4),
            AspectRatio::Vertical => (9, 16),
            AspectRatio::Ultrawide => (21, 9),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Widescreen => "16:9",
            AspectRatio::Standard => "4:3",
            AspectRatio::Classic => "3:2",
            AspectRatio::ClassicPortrait => "2:3",
            AspectRatio::StandardPortrait => "3:4",
            AspectRatio::Vertical => "9:16",
            AspectRatio::Ultrawide => "21:9",
        }
    }

    /// Map pixel dimensions onto a supported ratio (tolerance 0.01).
    pub fn from_dimensions(width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        let ratio = f64::from(width) / f64::from(height);
        Self::ALL.into_iter().find(|candidate| {
            let (w, h) = candidate.terms();
            (ratio - f64::from(w) / f64::from(h)).abs() < 0.01
        })
    }
}

impl std::str::FromStr for AspectRatio {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| format!("unsupported aspect ratio '{}'", s))
    }
}

/// Output resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    #[serde(rename = "1k")]
    OneK,
    #[serde(rename = "2k")]
    TwoK,
}

/// What a reference image constrains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageReference {
    Subject,
    Face,
}

/// Job family. Selects the vendor endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    #[default]
    Generate,
    Expand,
}

impl JobKind {
    pub fn as_str(self) -> &'static str {
        match self {
            JobKind::Generate => "generate",
            JobKind::Expand => "expand",
        }
    }

    /// Vendor path segments for this job family.
    pub fn path_segments(self) -> &'static [&'static str] {
        match self {
            JobKind::Generate => &["v1", "images", "generations"],
            JobKind::Expand => &["v1", "images", "editing", "expand"],
        }
    }
}

/// Client-side validation failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RequestError {
    #[error("missing prompt or image parameter")]
    MissingPromptOrImage,

    #[error("missing image parameter")]
    MissingImage,

    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        min: f32,
        max: f32,
    },
}

/// Submission body accepted from clients.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmitRequest {
    #[serde(rename = "type", default)]
    pub kind: JobKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// Base64 reference image, optionally as a data URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<AspectRatio>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Resolution>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_reference: Option<ImageReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_fidelity: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub human_fidelity: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub up_expansion_ratio: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub down_expansion_ratio: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left_expansion_ratio: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right_expansion_ratio: Option<f32>,
}

/// Defaults applied to generation bodies.
#[derive(Debug, Clone)]
pub struct GenerationDefaults {
    pub model_name: String,
    pub aspect_ratio: AspectRatio,
}

impl From<&crate::config::UpstreamConfig> for GenerationDefaults {
    fn from(config: &crate::config::UpstreamConfig) -> Self {
        Self {
            model_name: config.default_model.clone(),
            aspect_ratio: config.default_aspect_ratio,
        }
    }
}

/// Vendor body for `POST /v1/images/generations`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationBody {
    pub model_name: String,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_reference: Option<ImageReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_fidelity: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub human_fidelity: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Resolution>,
    pub n: u32,
    pub aspect_ratio: AspectRatio,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
}

/// Vendor body for `POST /v1/images/editing/expand`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpansionBody {
    pub image: String,
    pub up_expansion_ratio: f32,
    pub down_expansion_ratio: f32,
    pub left_expansion_ratio: f32,
    pub right_expansion_ratio: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

fn check_range(field: &'static str, value: Option<f32>, min: f32, max: f32) -> Result<(), RequestError> {
    match value {
        Some(v) if !(min..=max).contains(&v) => Err(RequestError::OutOfRange { field, min, max }),
        _ => Ok(()),
    }
}

fn check_count(n: Option<u32>) -> Result<(), RequestError> {
    check_range("n", n.map(|n| n as f32), 1.0, 9.0)
}

impl SubmitRequest {
    /// Prompt sent upstream: `"{style}，{prompt}"` when both are set.
    pub fn final_prompt(&self) -> String {
        match (present(&self.style), present(&self.prompt)) {
            (Some(style), Some(prompt)) => format!("{}{}{}", style, STYLE_SEPARATOR, prompt),
            (_, Some(prompt)) => prompt.to_string(),
            _ => String::new(),
        }
    }

    fn normalized_image(&self) -> Option<String> {
        present(&self.image).map(|image| strip_data_url(image).to_string())
    }

    /// Reshape into a generation body.
    pub fn into_generation(self, defaults: &GenerationDefaults) -> Result<GenerationBody, RequestError> {
        let image = self.normalized_image();
        if present(&self.prompt).is_none() && image.is_none() {
            return Err(RequestError::MissingPromptOrImage);
        }
        check_count(self.n)?;
        check_range("image_fidelity", self.image_fidelity, 0.0, 1.0)?;
        check_range("human_fidelity", self.human_fidelity, 0.0, 1.0)?;

        let aspect_ratio = self
            .aspect_ratio
            .or_else(|| image.as_deref().and_then(detect_aspect_ratio))
            .unwrap_or(defaults.aspect_ratio);

        Ok(GenerationBody {
            model_name: present(&self.model_name)
                .map(str::to_string)
                .unwrap_or_else(|| defaults.model_name.clone()),
            prompt: self.final_prompt(),
            negative_prompt: present(&self.negative_prompt).map(str::to_string),
            image,
            image_reference: self.image_reference,
            image_fidelity: self.image_fidelity,
            human_fidelity: self.human_fidelity,
            resolution: self.resolution,
            n: self.n.unwrap_or(1),
            aspect_ratio,
            callback_url: present(&self.callback_url).map(str::to_string),
        })
    }

    /// Reshape into an expansion body.
    pub fn into_expansion(self) -> Result<ExpansionBody, RequestError> {
        let image = self.normalized_image().ok_or(RequestError::MissingImage)?;
        check_count(self.n)?;

        let ratios = [
            ("up_expansion_ratio", self.up_expansion_ratio),
            ("down_expansion_ratio", self.down_expansion_ratio),
            ("left_expansion_ratio", self.left_expansion_ratio),
            ("right_expansion_ratio", self.right_expansion_ratio),
        ];
        for (field, value) in ratios {
            check_range(field, value, 0.0, 2.0)?;
        }

        let prompt = self.final_prompt();
        Ok(ExpansionBody {
            image,
            up_expansion_ratio: self.up_expansion_ratio.unwrap_or(0.0),
            down_expansion_ratio: self.down_expansion_ratio.unwrap_or(0.0),
            left_expansion_ratio: self.left_expansion_ratio.unwrap_or(0.0),
            right_expansion_ratio: self.right_expansion_ratio.unwrap_or(0.0),
            prompt: (!prompt.is_empty()).then_some(prompt),
            n: self.n,
            callback_url: present(&self.callback_url).map(str::to_string),
        })
    }
}

/// Vendor task lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Submitted,
    Processing,
    Succeed,
    Failed,
    /// Any state this client does not know; treated as still running.
    #[serde(other)]
    Pending,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Succeed | TaskState::Failed)
    }
}

/// One generated image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskImage {
    #[serde(default)]
    pub index: u32,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    #[serde(default)]
    pub images: Vec<TaskImage>,
}

/// Task payload inside the vendor envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskData {
    pub task_id: String,
    pub task_status: TaskState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_status_msg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_result: Option<TaskResult>,
}

impl TaskData {
    pub fn first_image_url(&self) -> Option<&str> {
        self.task_result
            .as_ref()?
            .images
            .first()
            .map(|image| image.url.as_str())
            .filter(|url| !url.is_empty())
    }
}

/// Vendor response envelope. `code == 0` means success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskEnvelope {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<TaskData>,
}

impl TaskEnvelope {
    pub fn is_ok(&self) -> bool {
        self.code == 0
    }
}
