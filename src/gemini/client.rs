/// Typed client for the Gemini generateContent endpoint
///
/// Requests carry images inline as base64 parts. Part ordering matters for
/// poster generation: the blank sizing canvas goes first, then the product
/// images, then the optional style reference, and the instruction text
/// always comes last.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};

use super::GeminiError;
use crate::geometry::AspectRatio;
use crate::raster;
use crate::state::data::ImageObject;

static API_ROOT_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Text-only model used for concept suggestions.
const TEXT_MODEL: &str = "gemini-2.5-flash";
/// Image-capable model used for poster generation and edits.
const IMAGE_MODEL: &str = "gemini-2.5-flash-image-preview";

/// Inputs for a poster generation request.
#[derive(Debug, Clone)]
pub struct GeneratePosterParams {
    pub product_images: Vec<ImageObject>,
    pub concept: String,
    pub aspect_ratio: AspectRatio,
    pub reference_image: Option<ImageObject>,
}

/// Inputs for an edit of the current poster.
#[derive(Debug, Clone)]
pub struct EditPosterParams {
    pub current_poster: ImageObject,
    pub instruction: String,
}

// --- Wire types -----------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<&'static str>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl Part {
    fn text(text: String) -> Self {
        Self {
            text: Some(text),
            inline_data: None,
        }
    }

    fn image(image: &ImageObject) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: image.mime_type.clone(),
                data: BASE64.encode(&image.bytes),
            }),
        }
    }
}

// --- Client ---------------------------------------------------------------

#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
        }
    }

    async fn generate_content(
        &self,
        model: &str,
        parts: Vec<Part>,
        generation_config: Option<GenerationConfig>,
    ) -> Result<GenerateResponse, GeminiError> {
        let url = format!("{API_ROOT_URL}/{model}:generateContent");
        let request = GenerateRequest {
            contents: vec![Content { parts }],
            generation_config,
        };

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GeminiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }

    /// Ask the text model for a poster concept based on the product images.
    /// Returns trimmed plain text (the prompt asks for 200-300 characters).
    pub async fn suggest_concept(
        &self,
        images: &[ImageObject],
    ) -> Result<String, GeminiError> {
        let mut parts: Vec<Part> = images.iter().map(Part::image).collect();
        parts.push(Part::text(SUGGEST_PROMPT.to_owned()));

        let response = self.generate_content(TEXT_MODEL, parts, None).await?;
        let suggestion = first_text(response).ok_or_else(|| {
            GeminiError::MalformedResponse("no text part in suggestion response".to_owned())
        })?;

        Ok(suggestion.trim().to_owned())
    }

    /// Generate a poster. The first image is a blank canvas anchoring the
    /// output dimensions; it is produced here and never shown to the user.
    pub async fn generate_poster(
        &self,
        params: GeneratePosterParams,
    ) -> Result<ImageObject, GeminiError> {
        let blank = raster::blank_canvas(params.aspect_ratio);

        let mut parts = vec![Part::image(&blank)];
        parts.extend(params.product_images.iter().map(Part::image));
        if let Some(reference) = &params.reference_image {
            parts.push(Part::image(reference));
        }
        parts.push(Part::text(generation_prompt(
            params.aspect_ratio,
            &params.concept,
            params.reference_image.is_some(),
        )));

        let response = self
            .generate_content(IMAGE_MODEL, parts, Some(image_config()))
            .await?;
        extract_image(response)
    }

    /// Apply a free-text edit to the current poster.
    pub async fn edit_poster(
        &self,
        params: EditPosterParams,
    ) -> Result<ImageObject, GeminiError> {
        let parts = vec![
            Part::image(&params.current_poster),
            Part::text(format!(
                "Apply the following edit to the image: \"{}\". Output only the edited image.",
                params.instruction
            )),
        ];

        let response = self
            .generate_content(IMAGE_MODEL, parts, Some(image_config()))
            .await?;
        extract_image(response)
    }
}

fn image_config() -> GenerationConfig {
    GenerationConfig {
        response_modalities: vec!["IMAGE", "TEXT"],
    }
}

/// Parts of the first candidate, or a malformed-response error.
fn candidate_parts(response: GenerateResponse) -> Result<Vec<Part>, GeminiError> {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts)
        .ok_or_else(|| GeminiError::MalformedResponse("response has no candidates".to_owned()))
}

fn first_text(response: GenerateResponse) -> Option<String> {
    candidate_parts(response)
        .ok()?
        .into_iter()
        .find_map(|part| part.text)
}

/// Pull the first inline image out of a response, or explain why there
/// was none using any text the model returned instead.
fn extract_image(response: GenerateResponse) -> Result<ImageObject, GeminiError> {
    let parts = candidate_parts(response)?;

    let mut model_text = None;
    for part in parts {
        if let Some(inline) = part.inline_data {
            let bytes = BASE64.decode(inline.data.as_bytes()).map_err(|err| {
                GeminiError::MalformedResponse(format!("image payload is not valid base64: {err}"))
            })?;
            return Ok(ImageObject::new(bytes, inline.mime_type));
        }
        if model_text.is_none() {
            model_text = part.text;
        }
    }

    Err(GeminiError::NoImageReturned {
        reason: model_text.unwrap_or_else(|| "the response carried no image part".to_owned()),
    })
}

const SUGGEST_PROMPT: &str = "Analyze the following product image(s). Based on the product's \
appearance, style, and potential use, generate a creative and detailed concept for a \
promotional poster. The concept should be a single paragraph, approximately 200-300 \
characters long. Only return the text of the concept, with no preamble or markdown.";

/// The instruction text sent after all image parts of a generation request.
/// It describes the images in the exact order they were attached.
fn generation_prompt(aspect_ratio: AspectRatio, concept: &str, has_reference: bool) -> String {
    let reference_note = if has_reference {
        "\n4. The very last image provided was a style reference. Use its color palette, \
         lighting, and overall mood as strong inspiration for the scene you create."
    } else {
        ""
    };

    format!(
        "**Task**: Create a promotional poster.\n\n\
         **Canvas & Aspect Ratio**: The very first image provided was a blank canvas with the \
         target aspect ratio of {aspect_ratio}. You must use this as the foundation, and your \
         final output must match these dimensions.\n\n\
         **Creative Concept**: \"{concept}\"\n\n\
         **Instructions**:\n\
         1. Completely replace the blank canvas with a new scene inspired by the Creative Concept.\n\
         2. The image(s) that followed the canvas are the primary product(s). Expertly cut them \
         out from their original backgrounds.\n\
         3. Integrate the product(s) into the new scene. They should be the main focus, \
         appearing natural and well-composed.{reference_note}\n\n\
         **Final Output**: Return ONLY the final composed image. No text, logos, or watermarks."
    )
}
