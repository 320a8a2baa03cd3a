use anyhow::{Context, Result, bail};
use tracing::{debug, info, warn};

use super::tokens::TokenStore;
use crate::api::{ApiClient, ApiError, SweepApi};

/// Port the hosted OAuth app is registered to redirect to.
pub const CALLBACK_PORT_DEFAULT: u16 = 9876;

/// One-shot localhost listener for the OAuth redirect. Bound up front so
/// the browser is only opened once the redirect target exists.
struct CallbackServer {
    server: tiny_http::Server,
}

impl CallbackServer {
    fn bind(port: u16) -> Result<Self> {
        let server = tiny_http::Server::http(("127.0.0.1", port))
            .map_err(|e| anyhow::anyhow!("failed to bind callback server on port {port}: {e}"))?;
        Ok(Self { server })
    }

    #[cfg(test)]
    fn port(&self) -> u16 {
        self.server
            .server_addr()
            .to_ip()
            .map(|a| a.port())
            .unwrap_or(0)
    }

    /// Block on the blocking pool until the provider redirects back with
    /// a `code`. Stray requests (favicon probes) are answered and ignored;
    /// an `error` parameter aborts the flow.
    async fn wait_for_code(self) -> Result<String> {
        tokio::task::spawn_blocking(move || self.recv_loop()).await?
    }

    fn recv_loop(self) -> Result<String> {
        loop {
            let request = self.server.recv().context("callback server closed")?;
            // tiny_http hands us a path + query; a base makes it parseable.
            let parsed = url::Url::parse(&format!("http://localhost{}", request.url()))?;

            if let Some((_, error)) = parsed.query_pairs().find(|(k, _)| k == "error") {
                let error = error.to_string();
                let _ = request.respond(tiny_http::Response::from_string(
                    "Sign-in was not completed. You can close this tab.",
                ));
                bail!("authorization denied: {error}");
            }

            if let Some((_, code)) = parsed.query_pairs().find(|(k, _)| k == "code") {
                let code = code.to_string();
                let _ = request.respond(tiny_http::Response::from_string(
                    "Signed in. You can close this tab and return to the terminal.",
                ));
                return Ok(code);
            }

            let _ = request.respond(
                tiny_http::Response::from_string("Waiting for sign-in...").with_status_code(404),
            );
        }
    }
}

fn open_browser(url: &str) {
    #[cfg(target_os = "macos")]
    let command = "open";
    #[cfg(target_os = "windows")]
    let command = "explorer";
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let command = "xdg-open";

    let _ = std::process::Command::new(command)
        .arg(url)
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn();
}

/// Full browser sign-in: fetch the provider authorization URL, open it,
/// capture the redirect code, exchange it for tokens, and persist them.
/// Watch startup afterwards is best-effort.
pub async fn sign_in(api: &ApiClient, tokens: &TokenStore, port: u16) -> Result<()> {
    let login = api.login_url().await?;
    let redirect_uri = format!("http://localhost:{port}/callback");

    let callback = CallbackServer::bind(port)?;
    info!("opening browser for sign-in");
    open_browser(&login.authorization_url);

    let code = callback.wait_for_code().await?;
    let response = api.exchange_code(&code, &redirect_uri).await?;

    tokens.store_access_token(&response.access_token).await?;
    if let Some(refresh) = &response.refresh_token {
        tokens.store_refresh_token(refresh).await?;
    }

    if let Err(e) = api.start_watch().await {
        warn!(error = %e, "could not start inbox watch after sign-in");
    }

    Ok(())
}

/// Drop both tokens. The next request fails fast as unauthenticated.
pub async fn sign_out(tokens: &TokenStore) -> Result<()> {
    tokens.clear().await
}

/// Startup probe: a stored token is only trusted once the backend accepts
/// it on a cheap authenticated call. A rejected token is deleted (the 401
/// path already clears it); a network failure keeps the token for a later
/// retry but still lands on the sign-in view.
pub async fn check_auth(api: &ApiClient, tokens: &TokenStore) -> bool {
    match tokens.access_token().await {
        Ok(Some(_)) => {}
        Ok(None) => return false,
        Err(e) => {
            warn!(error = %e, "could not read stored token");
            return false;
        }
    }

    match api.stats().await {
        Ok(_) => {
            if let Err(e) = api.start_watch().await {
                debug!(error = %e, "watch renewal on startup failed");
            }
            true
        }
        Err(ApiError::SessionExpired) | Err(ApiError::Unauthenticated) => false,
        Err(ApiError::RequestFailed { status, message }) => {
            warn!(status, %message, "stored token rejected, clearing it");
            if let Err(e) = tokens.clear().await {
                warn!(error = %e, "failed to clear rejected token");
            }
            false
        }
        Err(e) => {
            warn!(error = %e, "auth probe failed, keeping stored token");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn callback_captures_code() {
        let callback = CallbackServer::bind(0).unwrap();
        let port = callback.port();

        let (code, _) = futures::join!(callback.wait_for_code(), async {
            reqwest::get(format!("http://127.0.0.1:{port}/callback?code=abc123&state=xyz"))
                .await
                .unwrap()
        });
        assert_eq!(code.unwrap(), "abc123");
    }

    #[tokio::test]
    async fn callback_ignores_stray_requests() {
        let callback = CallbackServer::bind(0).unwrap();
        let port = callback.port();

        let (code, _) = futures::join!(callback.wait_for_code(), async {
            let favicon = reqwest::get(format!("http://127.0.0.1:{port}/favicon.ico"))
                .await
                .unwrap();
            assert_eq!(favicon.status().as_u16(), 404);
            reqwest::get(format!("http://127.0.0.1:{port}/callback?code=later"))
                .await
                .unwrap();
        });
        assert_eq!(code.unwrap(), "later");
    }

    #[tokio::test]
    async fn callback_aborts_on_provider_error() {
        let callback = CallbackServer::bind(0).unwrap();
        let port = callback.port();

        let (code, _) = futures::join!(callback.wait_for_code(), async {
            reqwest::get(format!(
                "http://127.0.0.1:{port}/callback?error=access_denied"
            ))
            .await
            .unwrap()
        });
        let err = code.unwrap_err().to_string();
        assert!(err.contains("access_denied"));
    }
}
