//! Login against the league site and export of the resulting session.
//!
//! The site uses a classic form login protected by an anti-forgery token. A
//! plain HTTP client performs the login; its cookies are then handed to the
//! browser session so the rendered pages load as the logged-in user.

use crate::config::SourceSite;
use crate::error::AuthError;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use reqwest::StatusCode;
use reqwest::redirect::Policy;
use reqwest_cookie_store::{CookieStore, CookieStoreMutex};
use scraper::{Html, Selector};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use url::Url;

const CSRF_FIELD: &str = "_csrf-backend";
const ACCEPTED_STATUSES: [StatusCode; 2] = [StatusCode::OK, StatusCode::FOUND];

static CSRF_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r#"name="_csrf-backend"\s+value="([^"]+)""#).unwrap(),
        Regex::new(r#"value="([^"]+)"\s+name="_csrf-backend""#).unwrap(),
        Regex::new(r#"<meta\s+name="csrf-token"\s+content="([^"]+)""#).unwrap(),
    ]
});

/// Source account used to log in.
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A cookie exported from the HTTP session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    /// Domain the cookie is scoped to; the site's host for host-only cookies.
    pub domain: Option<String>,
    /// Path the cookie is scoped to, as the store recorded it.
    pub path: Option<String>,
}

/// Logged-in session: the cookie store filled by the login exchange.
pub struct AuthenticatedSession {
    store: Arc<CookieStoreMutex>,
    origin: Url,
}

impl fmt::Debug for AuthenticatedSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticatedSession")
            .field("origin", &self.origin.as_str())
            .field("cookies", &"<redacted>")
            .finish()
    }
}

impl AuthenticatedSession {
    /// Every unexpired cookie of the session, each with its own domain and
    /// path.
    ///
    /// # Returns
    ///
    /// The cookies to install in the browser. Host-only cookies get the
    /// site's host as their domain.
    pub fn cookies(&self) -> Vec<SessionCookie> {
        let host = self.origin.host_str().map(str::to_string);
        let Ok(store) = self.store.lock() else {
            warn!("Cookie store poisoned; exporting no cookies");
            return Vec::new();
        };
        store
            .iter_unexpired()
            .map(|cookie| SessionCookie {
                name: cookie.name().to_string(),
                value: cookie.value().to_string(),
                domain: cookie.domain().map(str::to_string).or_else(|| host.clone()),
                path: Some(String::from(&cookie.path)),
            })
            .collect()
    }
}

/// Pull the anti-forgery token out of the login page.
///
/// Tries the form field first, then a few textual patterns; the first hit
/// wins.
pub fn extract_csrf_token(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(&format!(r#"input[name="{CSRF_FIELD}"]"#)).ok()?;
    let from_form = document
        .select(&selector)
        .filter_map(|e| e.value().attr("value"))
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(str::to_string);
    if from_form.is_some() {
        return from_form;
    }

    CSRF_PATTERNS
        .iter()
        .find_map(|re| re.captures(html))
        .map(|caps| caps[1].to_string())
}

/// Performs the form login.
#[derive(Debug, Clone)]
pub struct SessionAuthenticator {
    site: SourceSite,
    user_agent: String,
}

impl SessionAuthenticator {
    pub fn new(site: SourceSite, user_agent: impl Into<String>) -> Self {
        Self {
            site,
            user_agent: user_agent.into(),
        }
    }

    fn client(&self, store: &Arc<CookieStoreMutex>, redirects: Policy) -> Result<Client, AuthError> {
        Ok(Client::builder()
            .cookie_provider(Arc::clone(store))
            .redirect(redirects)
            .user_agent(self.user_agent.clone())
            .build()?)
    }

    /// Log in and return the session.
    ///
    /// # Errors
    ///
    /// [`AuthError::MissingCredentials`] for blank credentials,
    /// [`AuthError::Http`] when the site cannot be reached and
    /// [`AuthError::Rejected`] when the login answer is neither 200 nor 302.
    #[instrument(level = "info", skip_all, fields(email = %credentials.email))]
    pub async fn login(&self, credentials: &Credentials) -> Result<AuthenticatedSession, AuthError> {
        if credentials.email.trim().is_empty() {
            return Err(AuthError::MissingCredentials("email"));
        }
        if credentials.password.is_empty() {
            return Err(AuthError::MissingCredentials("password"));
        }

        // both clients share one store; only the form post stops at redirects
        let store = Arc::new(CookieStoreMutex::new(CookieStore::default()));
        let browse = self.client(&store, Policy::default())?;
        let submit = self.client(&store, Policy::none())?;

        let login_url = self.site.login_url();
        let page = browse.get(&login_url).send().await?.text().await?;
        let token = extract_csrf_token(&page);
        match &token {
            Some(_) => debug!("Found anti-forgery token"),
            None => warn!("No anti-forgery token on login page; submitting without it"),
        }

        let mut form = vec![
            ("LoginForm[email]", credentials.email.clone()),
            ("LoginForm[password]", credentials.password.clone()),
            ("LoginForm[rememberMe]", "1".to_string()),
        ];
        if let Some(token) = token {
            form.push((CSRF_FIELD, token));
        }

        let response = submit.post(&login_url).form(&form).send().await?;
        let status = response.status();
        if !ACCEPTED_STATUSES.contains(&status) {
            return Err(AuthError::Rejected { status });
        }

        let session = AuthenticatedSession {
            store,
            origin: self.site.origin().clone(),
        };
        info!(%status, cookies = session.cookies().len(), "Logged in");
        Ok(session)
    }
}
