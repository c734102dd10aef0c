use serde::{Deserialize, Serialize};

/// Current-session user identity, consumed for order metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
}
