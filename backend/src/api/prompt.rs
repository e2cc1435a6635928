//! Prompt proxy API handler.

use axum::{extract::State, http::StatusCode, Json};
use minimart_types::api::{FailureResponse, PromptRequest, PromptResponse};
use tracing::{error, info};

use crate::state::AppState;

/// Send a prompt to the configured language model.
#[utoipa::path(
    post,
    path = "/prompt",
    tag = "prompt",
    request_body = PromptRequest,
    responses(
        (status = 200, description = "Generated response", body = PromptResponse),
        (status = 400, description = "Missing prompt", body = FailureResponse),
        (status = 500, description = "Provider not configured or failed", body = FailureResponse)
    )
)]
pub async fn send_prompt(
    State(state): State<AppState>,
    Json(request): Json<PromptRequest>,
) -> Result<Json<PromptResponse>, (StatusCode, Json<FailureResponse>)> {
    let prompt = match request.prompt {
        Some(prompt) if !prompt.trim().is_empty() => prompt,
        _ => {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(FailureResponse::new("Prompt is required")),
            ))
        }
    };

    info!("Forwarding prompt ({} chars)", prompt.len());
    match state.prompt().complete(&prompt).await {
        Ok(completion) => Ok(Json(PromptResponse {
            success: true,
            prompt,
            response: completion.text,
            usage: completion.usage,
        })),
        Err(e) => {
            error!("Error calling prompt provider: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(FailureResponse::new(e.to_string())),
            ))
        }
    }
}
