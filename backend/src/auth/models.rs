use serde::{Deserialize, Serialize};

/// Session token claims. `sub` carries the user id; the token is the
/// explicit per-request session context, there is no ambient state.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    pub name: String,
    pub exp: usize,
    pub iat: usize,
}
