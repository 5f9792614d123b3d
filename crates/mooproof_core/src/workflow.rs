//! crates/mooproof_core/src/workflow.rs
//!
//! Steps shared by the submission and chat workflows.

use tracing::{error, warn};
use uuid::Uuid;

use crate::domain::{Caller, ResourceConfig};
use crate::error::{ProofError, ProofResult};
use crate::ports::{
    AuthorizationService, DatabaseService, GenerationRequest, PortError, TextGenerationService,
};

/// Shown when the provider fails without saying why.
const GENERIC_GENERATION_FAILURE: &str = "AI generation failed";

/// Loads the resource and checks the caller may submit to it.
pub(crate) async fn load_authorized_resource(
    db: &dyn DatabaseService,
    authz: &dyn AuthorizationService,
    resource_id: Uuid,
    caller: Caller,
) -> ProofResult<ResourceConfig> {
    let resource = db.get_resource(resource_id).await?;

    if !authz.can_submit(resource_id, caller.user_id).await? {
        warn!(
            "User {} lacks the submit capability on resource {}",
            caller.user_id, resource_id
        );
        return Err(ProofError::NotPermitted);
    }

    Ok(resource)
}

/// Runs exactly one generation call and folds both failure shapes into a `ProofError`.
pub(crate) async fn generate_text(
    generator: &dyn TextGenerationService,
    request: GenerationRequest,
) -> ProofResult<String> {
    let resource_id = request.resource_id;
    let outcome = generator.generate(request).await.map_err(|e| {
        error!("Text generation raised an error for resource {}: {}", resource_id, e);
        ProofError::ProviderException(port_message(e))
    })?;

    if !outcome.success {
        warn!(
            "Text generation failed for resource {}: {}",
            resource_id, outcome.error_message
        );
        let message = if outcome.error_message.trim().is_empty() {
            GENERIC_GENERATION_FAILURE.to_string()
        } else {
            outcome.error_message
        };
        return Err(ProofError::AiGenerationFailed(message));
    }

    Ok(outcome.generated_text)
}

/// The provider's own message, without our port error prefix.
fn port_message(err: PortError) -> String {
    match err {
        PortError::NotFound(msg) | PortError::Unexpected(msg) => msg,
        PortError::Unauthorized => "Unauthorized".to_string(),
    }
}
