use super::{TokenResponse, TokenService, TokenStatus};
use crate::base::{BlockType, TokenResult};
use crate::logging;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// Per-rule cluster settings: which remote counter to hit and what to do if
/// the request fails outright.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(default)]
pub struct ClusterConfig {
    /// Identifies the counter on the token server; rules sharing a `flow_id`
    /// share a global counter.
    pub flow_id: u64,
    /// When the request fails or no service is configured, fall back to the
    /// rule's local evaluation instead of passing unconditionally.
    pub fallback_to_local_when_fail: bool,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        ClusterConfig {
            flow_id: 0,
            fallback_to_local_when_fail: false,
        }
    }
}

lazy_static! {
    static ref TOKEN_SERVICE: Mutex<Option<Arc<dyn TokenService>>> = Mutex::new(None);
}

/// Registers the process-wide `TokenService` used by [`check`] and [`check_param`].
pub fn set_token_service(svc: Arc<dyn TokenService>) {
    *TOKEN_SERVICE.lock().unwrap() = Some(svc);
}

pub fn clear_token_service() {
    *TOKEN_SERVICE.lock().unwrap() = None;
}

fn token_service() -> Option<Arc<dyn TokenService>> {
    TOKEN_SERVICE.lock().unwrap().clone()
}

/// What a caller must do after consulting the cluster: either the verdict is
/// final, or the rule's local path must be evaluated instead.
pub enum Disposition {
    Resolved(TokenResult),
    FallbackToLocal,
}

fn disposition_for(cfg: &ClusterConfig, resp_status: TokenStatus, wait_in_ms: u64) -> Disposition {
    match resp_status {
        TokenStatus::Ok => Disposition::Resolved(TokenResult::new_pass()),
        TokenStatus::ShouldWait => {
            Disposition::Resolved(TokenResult::new_should_wait(wait_in_ms * 1_000_000))
        }
        TokenStatus::Blocked => Disposition::Resolved(TokenResult::new_blocked_with_msg(
            BlockType::Flow,
            "blocked by cluster token server".into(),
        )),
        TokenStatus::NoRuleExists | TokenStatus::TooManyRequest | TokenStatus::Fail | TokenStatus::BadRequest => {
            if cfg.fallback_to_local_when_fail {
                Disposition::FallbackToLocal
            } else {
                Disposition::Resolved(TokenResult::new_pass())
            }
        }
    }
}

/// Requests a plain (non-parameterized) token for `cfg`, mapping the remote
/// verdict onto the same disposition rules the local slots produce.
pub fn check(cfg: &ClusterConfig, count: u32, prioritized: bool) -> Disposition {
    let svc = match token_service() {
        Some(svc) => svc,
        None => {
            return if cfg.fallback_to_local_when_fail {
                Disposition::FallbackToLocal
            } else {
                Disposition::Resolved(TokenResult::new_pass())
            }
        }
    };
    let resp = svc.request_token(cfg.flow_id, count, prioritized);
    let status = resp.status();
    if status == TokenStatus::Fail {
        logging::warn!(
            "[cluster] request_token failed for flow_id {}, fallback_to_local_when_fail={}",
            cfg.flow_id,
            cfg.fallback_to_local_when_fail
        );
    }
    disposition_for(cfg, status, resp.wait_in_ms)
}

/// Parameterized counterpart of [`check`], used by hot-parameter rules.
pub fn check_param(cfg: &ClusterConfig, count: u32, params: &[String]) -> Disposition {
    let svc = match token_service() {
        Some(svc) => svc,
        None => {
            return if cfg.fallback_to_local_when_fail {
                Disposition::FallbackToLocal
            } else {
                Disposition::Resolved(TokenResult::new_pass())
            }
        }
    };
    let resp = svc.request_param_token(cfg.flow_id, count, params);
    disposition_for(cfg, resp.status(), resp.wait_in_ms)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct MockService {
        status: TokenStatus,
        wait_in_ms: u64,
        called: AtomicBool,
    }

    impl TokenService for MockService {
        fn request_token(&self, _flow_id: u64, _count: u32, _prioritized: bool) -> TokenResponse {
            self.called.store(true, Ordering::SeqCst);
            TokenResponse::with_wait(self.status, self.wait_in_ms)
        }

        fn request_param_token(&self, _flow_id: u64, _count: u32, _params: &[String]) -> TokenResponse {
            TokenResponse::new(self.status)
        }
    }

    #[test]
    fn ok_resolves_to_pass() {
        set_token_service(Arc::new(MockService {
            status: TokenStatus::Ok,
            wait_in_ms: 0,
            called: AtomicBool::new(false),
        }));
        let cfg = ClusterConfig {
            flow_id: 1,
            fallback_to_local_when_fail: false,
        };
        match check(&cfg, 1, false) {
            Disposition::Resolved(r) => assert!(!r.is_blocked()),
            Disposition::FallbackToLocal => panic!("expected resolved"),
        }
        clear_token_service();
    }

    #[test]
    fn should_wait_resolves_to_wait() {
        set_token_service(Arc::new(MockService {
            status: TokenStatus::ShouldWait,
            wait_in_ms: 50,
            called: AtomicBool::new(false),
        }));
        let cfg = ClusterConfig {
            flow_id: 2,
            fallback_to_local_when_fail: false,
        };
        match check(&cfg, 1, false) {
            Disposition::Resolved(TokenResult::Wait(ns)) => assert_eq!(ns, 50_000_000),
            _ => panic!("expected a wait result"),
        }
        clear_token_service();
    }

    #[test]
    fn blocked_resolves_to_blocked() {
        set_token_service(Arc::new(MockService {
            status: TokenStatus::Blocked,
            wait_in_ms: 0,
            called: AtomicBool::new(false),
        }));
        let cfg = ClusterConfig {
            flow_id: 3,
            fallback_to_local_when_fail: true,
        };
        match check(&cfg, 1, false) {
            Disposition::Resolved(r) => assert!(r.is_blocked()),
            Disposition::FallbackToLocal => panic!("expected resolved"),
        }
        clear_token_service();
    }

    #[test]
    fn fail_with_fallback_flag_falls_back_to_local() {
        set_token_service(Arc::new(MockService {
            status: TokenStatus::Fail,
            wait_in_ms: 0,
            called: AtomicBool::new(false),
        }));
        let cfg = ClusterConfig {
            flow_id: 4,
            fallback_to_local_when_fail: true,
        };
        assert!(matches!(check(&cfg, 1, false), Disposition::FallbackToLocal));
        clear_token_service();
    }

    #[test]
    fn fail_without_fallback_flag_passes() {
        set_token_service(Arc::new(MockService {
            status: TokenStatus::Fail,
            wait_in_ms: 0,
            called: AtomicBool::new(false),
        }));
        let cfg = ClusterConfig {
            flow_id: 5,
            fallback_to_local_when_fail: false,
        };
        match check(&cfg, 1, false) {
            Disposition::Resolved(r) => assert!(!r.is_blocked()),
            Disposition::FallbackToLocal => panic!("expected resolved pass"),
        }
        clear_token_service();
    }

    #[test]
    fn no_service_configured_without_fallback_passes() {
        clear_token_service();
        let cfg = ClusterConfig {
            flow_id: 6,
            fallback_to_local_when_fail: false,
        };
        match check(&cfg, 1, false) {
            Disposition::Resolved(r) => assert!(!r.is_blocked()),
            Disposition::FallbackToLocal => panic!("expected resolved pass"),
        }
    }

    #[test]
    fn no_service_configured_with_fallback_falls_back() {
        clear_token_service();
        let cfg = ClusterConfig {
            flow_id: 7,
            fallback_to_local_when_fail: true,
        };
        assert!(matches!(check(&cfg, 1, false), Disposition::FallbackToLocal));
    }
}
