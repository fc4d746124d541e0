use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

/// Google sync payload, posted by the identity broker after it has
/// completed the provider handshake.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GoogleSyncRequest {
    #[validate(email)]
    pub email: String,
    pub name: Option<String>,
    #[validate(length(min = 1))]
    pub google_id: String,
    pub image: Option<String>,
}

/// GitHub sync payload. GitHub may withhold the email, in which case the
/// provider access token is used to resolve one server-side.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GithubSyncRequest {
    #[validate(length(min = 1))]
    pub github_id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub access_token: Option<String>,
}

/// One entry of GitHub's `/user/emails` response.
#[derive(Debug, Deserialize)]
pub struct GithubEmail {
    pub email: String,
    pub primary: bool,
    pub verified: bool,
}
