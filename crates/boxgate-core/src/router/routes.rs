/// One entry in the route table.
///
/// Every route requires a session. The only exception is the table's login
/// route, which `RouteTable::new` marks public.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    path: String,
    name: Option<String>,
    title: Option<String>,
    requires_auth: bool,
    redirect: Option<String>,
}

impl Route {
    pub fn new(path: &str) -> Self {
        Self {
            path: normalize(path),
            name: None,
            title: None,
            requires_auth: true,
            redirect: None,
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn titled(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    /// Forward navigation from this path to `target`
    pub fn redirect_to(mut self, target: &str) -> Self {
        self.redirect = Some(normalize(target));
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn requires_auth(&self) -> bool {
        self.requires_auth
    }

    pub fn redirect(&self) -> Option<&str> {
        self.redirect.as_deref()
    }
}

#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
    login_path: String,
    landing_path: String,
}

impl RouteTable {
    /// Table with `login` as its single public route. Authenticated visits to
    /// the login route are sent to `landing_path`.
    pub fn new(login: Route, landing_path: &str) -> Self {
        let mut login = login;
        login.requires_auth = false;
        Self {
            login_path: login.path.clone(),
            landing_path: normalize(landing_path),
            routes: vec![login],
        }
    }

    pub fn route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    /// The console's views
    pub fn console() -> Self {
        Self::new(Route::new(super::LOGIN_PATH).named("login"), super::LANDING_PATH)
            .route(Route::new("/").redirect_to(super::LANDING_PATH))
            .route(Route::new("/dashboard").named("dashboard").titled("Dashboard"))
            .route(Route::new("/inbounds").named("inbounds").titled("Inbounds"))
            .route(Route::new("/subscriptions").named("subscriptions").titled("Subscriptions"))
            .route(Route::new("/outbounds").named("outbounds").titled("Outbounds"))
            .route(Route::new("/rulesets").named("rulesets").titled("Rule Sets"))
            .route(Route::new("/settings").named("settings").titled("Settings"))
    }

    pub fn resolve(&self, path: &str) -> Option<&Route> {
        let path = normalize(path);
        self.routes.iter().find(|route| route.path == path)
    }

    /// Unknown paths require a session, like every declared route but login
    pub fn requires_auth(&self, path: &str) -> bool {
        self.resolve(path).map(Route::requires_auth).unwrap_or(true)
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    pub fn landing_path(&self) -> &str {
        &self.landing_path
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }
}

/// Canonical form of a navigation target: leading slash, no trailing slash,
/// no query or fragment.
pub fn normalize(target: &str) -> String {
    let end = target.find(['?', '#']).unwrap_or(target.len());
    let trimmed = target[..end].trim().trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}
