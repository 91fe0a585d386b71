use std::fmt;

/// Outcome of a single remote token request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStatus {
    Ok,
    Blocked,
    ShouldWait,
    NoRuleExists,
    TooManyRequest,
    Fail,
    BadRequest,
}

impl fmt::Display for TokenStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Response envelope returned by a [`TokenService`] for both the plain and
/// parameterized token requests.
#[derive(Debug, Clone, Default)]
pub struct TokenResponse {
    pub status: Option<TokenStatus>,
    pub remaining: i32,
    pub wait_in_ms: u64,
}

impl TokenResponse {
    pub fn new(status: TokenStatus) -> Self {
        TokenResponse {
            status: Some(status),
            remaining: 0,
            wait_in_ms: 0,
        }
    }

    pub fn with_wait(status: TokenStatus, wait_in_ms: u64) -> Self {
        TokenResponse {
            status: Some(status),
            remaining: 0,
            wait_in_ms,
        }
    }

    pub fn status(&self) -> TokenStatus {
        self.status.unwrap_or(TokenStatus::Fail)
    }
}

/// SPI a caller must provide to reach a remote token server. The core never
/// implements the network leg; it only consumes the response shape above.
pub trait TokenService: Send + Sync {
    fn request_token(&self, flow_id: u64, count: u32, prioritized: bool) -> TokenResponse;

    fn request_param_token(&self, flow_id: u64, count: u32, params: &[String]) -> TokenResponse;
}
