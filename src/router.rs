//! Path dispatch with an authentication guard.
//!
//! Views are out of this crate's hands; the router decides which one a
//! path lands on, redirects protected paths to the login view when there
//! is no session, and hands each view a cancellation token that fires as
//! soon as the user navigates elsewhere.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::session::SessionManager;

/// Views the client knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Dashboard,
    Login,
    Register,
    NotFound,
}

impl Route {
    pub fn from_path(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        match path.trim_end_matches('/') {
            "" => Route::Dashboard,
            "/login" => Route::Login,
            "/register" => Route::Register,
            _ => Route::NotFound,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Route::Dashboard => "/",
            Route::Login => "/login",
            Route::Register => "/register",
            Route::NotFound => "/404",
        }
    }

    pub fn requires_auth(&self) -> bool {
        matches!(self, Route::Dashboard)
    }
}

/// Whatever actually changes the visible location.
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

/// Navigator that just records where it was sent.
#[derive(Default)]
pub struct History {
    entries: Mutex<Vec<String>>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<String> {
        self.entries.lock().last().cloned()
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }
}

impl Navigator for History {
    fn navigate(&self, path: &str) {
        self.entries.lock().push(path.to_string());
    }
}

impl<N: Navigator + ?Sized> Navigator for Arc<N> {
    fn navigate(&self, path: &str) {
        (**self).navigate(path)
    }
}

/// Resolves paths to views and tracks the active view's lifetime.
pub struct Router<N: Navigator> {
    session: Arc<SessionManager>,
    navigator: N,
    active: Mutex<CancellationToken>,
}

impl<N: Navigator> Router<N> {
    pub fn new(session: Arc<SessionManager>, navigator: N) -> Self {
        Self {
            session,
            navigator,
            active: Mutex::new(CancellationToken::new()),
        }
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    /// The view `path` lands on, after the authentication guard.
    pub fn resolve(&self, path: &str) -> Route {
        let route = Route::from_path(path);
        if route.requires_auth() && !self.session.is_authenticated() {
            tracing::debug!("{} requires a session, redirecting to login", path);
            return Route::Login;
        }
        route
    }

    /// Leave the current view and enter the one `path` resolves to.
    ///
    /// Requests still in flight for the previous view are cancelled.
    pub fn navigate(&self, path: &str) -> Route {
        let route = self.resolve(path);
        {
            let mut active = self.active.lock();
            active.cancel();
            *active = CancellationToken::new();
        }
        self.navigator.navigate(route.path());
        route
    }

    /// Token that fires when the current view is left.
    pub fn view_token(&self) -> CancellationToken {
        self.active.lock().child_token()
    }

    /// Installed as the gateway's unauthorized handler.
    pub fn redirect_to_login(&self) {
        self.navigate(Route::Login.path());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::memory::InMemoryStore;
    use crate::session::{AnyStore, DEFAULT_TOKEN_KEY};
    use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};

    fn router() -> Router<Arc<History>> {
        let store = Arc::new(AnyStore::Memory(InMemoryStore::new()));
        let session = Arc::new(SessionManager::new(store, DEFAULT_TOKEN_KEY));
        Router::new(session, Arc::new(History::new()))
    }

    fn valid_token() -> String {
        let exp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs()
            + 3600;
        let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"exp":{exp}}}"#));
        format!("h.{payload}.s")
    }

    #[test]
    fn test_route_from_path() {
        assert_eq!(Route::from_path("/"), Route::Dashboard);
        assert_eq!(Route::from_path(""), Route::Dashboard);
        assert_eq!(Route::from_path("/login"), Route::Login);
        assert_eq!(Route::from_path("/login/"), Route::Login);
        assert_eq!(Route::from_path("/register?ref=home"), Route::Register);
        assert_eq!(Route::from_path("/budgets"), Route::NotFound);
    }

    #[test]
    fn test_protected_route_redirects_without_session() {
        let router = router();
        assert_eq!(router.navigate("/"), Route::Login);
        assert_eq!(router.navigator().current().as_deref(), Some("/login"));
    }

    #[test]
    fn test_protected_route_allowed_with_session() {
        let router = router();
        router.session.set_token(Some(&valid_token()));
        assert_eq!(router.navigate("/"), Route::Dashboard);
        assert_eq!(router.navigator().current().as_deref(), Some("/"));
    }

    #[test]
    fn test_public_routes_need_no_session() {
        let router = router();
        assert_eq!(router.resolve("/login"), Route::Login);
        assert_eq!(router.resolve("/register"), Route::Register);
    }

    #[test]
    fn test_navigation_cancels_previous_view() {
        let router = router();
        router.navigate("/login");
        let login_view = router.view_token();
        assert!(!login_view.is_cancelled());

        router.navigate("/register");
        assert!(login_view.is_cancelled());
        assert!(!router.view_token().is_cancelled());
    }

    #[test]
    fn test_redirect_to_login() {
        let router = router();
        router.navigate("/register");
        router.redirect_to_login();
        assert_eq!(
            router.navigator().entries(),
            vec!["/register".to_string(), "/login".to_string()]
        );
    }
}
