use serde::Deserialize;

/// Request body for sending a message. `image` carries a base64 data
/// URL; both parts are optional and independent.
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub text: Option<String>,
    pub image: Option<String>,
}
