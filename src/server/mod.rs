// src/server/mod.rs

//! Static dev server for the build output.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::model::ServeSection;

pub mod reload;

pub use reload::{ReloadHub, ReloadNotifier};

/// Router serving `dir` as static files, with `index.html` for directories.
pub fn router(dir: impl AsRef<Path>) -> Router {
    Router::new()
        .fallback_service(ServeDir::new(dir.as_ref()).append_index_html_on_directories(true))
        .layer(TraceLayer::new_for_http())
}

/// A running dev server. Dropping it stops the server.
#[derive(Debug)]
pub struct DevServer {
    addr: SocketAddr,
    dir: PathBuf,
    handle: JoinHandle<()>,
}

impl DevServer {
    /// Bind `[serve].host:[serve].port` and serve `root/[serve].dir`.
    pub async fn start(root: &Path, serve: &ServeSection) -> Result<Self> {
        let dir = root.join(&serve.dir);
        let listener = TcpListener::bind((serve.host.as_str(), serve.port))
            .await
            .with_context(|| format!("binding dev server to {}:{}", serve.host, serve.port))?;
        let addr = listener.local_addr()?;

        let app = router(&dir);
        let handle = tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, app).await {
                error!(error = %err, "dev server stopped");
            }
        });

        info!("serving {:?} at http://{}", dir, addr);

        Ok(Self { addr, dir, handle })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Drop for DevServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
