use std::{collections::HashMap, net::SocketAddr, str::FromStr, sync::Arc};

use axum::{
    Router,
    extract::{Query, State},
    response::Html,
    routing::get,
};
use tokio::{
    net::TcpListener,
    sync::{Mutex, oneshot},
    task::JoinHandle,
};

use crate::{Error, Result, warning};

/// Outcome of the authorization redirect: the code, or the error reported by
/// the authorization server.
pub type CallbackOutcome = std::result::Result<String, String>;

#[derive(Clone)]
struct CallbackState {
    sender: Arc<Mutex<Option<oneshot::Sender<CallbackOutcome>>>>,
}

/// Starts the local server that receives the OAuth redirect. The first
/// callback is forwarded through `sender`; later ones are answered but
/// ignored.
pub async fn start_callback_server(
    addr: &str,
    sender: oneshot::Sender<CallbackOutcome>,
) -> Result<JoinHandle<()>> {
    let addr = SocketAddr::from_str(addr)
        .map_err(|e| Error::Config(format!("Invalid server address {addr}: {e}")))?;

    let state = CallbackState {
        sender: Arc::new(Mutex::new(Some(sender))),
    };
    let app = Router::new()
        .route("/callback", get(callback))
        .with_state(state);

    let listener = TcpListener::bind(&addr).await?;
    Ok(tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            warning!("Callback server stopped: {}", e);
        }
    }))
}

async fn callback(
    State(state): State<CallbackState>,
    Query(params): Query<HashMap<String, String>>,
) -> Html<&'static str> {
    let outcome: CallbackOutcome = match (params.get("code"), params.get("error")) {
        (Some(code), _) => Ok(code.clone()),
        (None, Some(error)) => Err(error.clone()),
        (None, None) => Err("missing authorization code".to_string()),
    };

    let page = if outcome.is_ok() {
        "<h2>Authentication successful.</h2><p>Close this browser window.</p>"
    } else {
        "<h4>Login failed.</h4>"
    };

    if let Some(sender) = state.sender.lock().await.take() {
        let _ = sender.send(outcome);
    }

    Html(page)
}
