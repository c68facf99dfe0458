use std::collections::HashSet;

use reqwest::Client;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::FetchError;
use crate::post::{Listing, PostRecord};

/// Fetches the feed endpoint. One request per call: no retry, no timeout.
#[derive(Debug, Clone)]
pub struct FeedLoader {
    client: Client,
    endpoint: Url,
}

impl FeedLoader {
    pub fn new(client: Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub async fn load(&self) -> Result<Vec<PostRecord>, FetchError> {
        let response = self.client.get(self.endpoint.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::NotOk(status));
        }
        let bytes = response.bytes().await?;
        let listing: Listing = serde_json::from_slice(&bytes)?;

        let mut seen = HashSet::new();
        let posts: Vec<PostRecord> = listing
            .data
            .children
            .into_iter()
            .map(|child| PostRecord::from_raw(child.data))
            .filter(|post| {
                let fresh = seen.insert(post.id.clone());
                if !fresh {
                    warn!(id = %post.id, "duplicate post id in feed, keeping the first");
                }
                fresh
            })
            .collect();

        info!(endpoint = %self.endpoint, count = posts.len(), "feed loaded");
        Ok(posts)
    }
}

/// Outcome of a spawned load, tagged with the ticket it was started for.
#[derive(Debug)]
pub struct LoadEvent {
    pub ticket: u64,
    pub result: Result<Vec<PostRecord>, FetchError>,
}

/// Handle on a spawned load. Dropping it cancels the load as well.
pub struct LoadHandle {
    cancel_tx: broadcast::Sender<()>,
    join: JoinHandle<()>,
}

impl LoadHandle {
    /// Stops the request if it is still in flight. Nothing is sent afterwards.
    pub async fn cancel(self) {
        let _ = self.cancel_tx.send(());
        if let Err(e) = self.join.await {
            warn!(error = %e, "load task failed");
        }
    }
}

/// Must be called from within a Tokio runtime.
pub fn spawn_load(loader: FeedLoader, ticket: u64, events: mpsc::Sender<LoadEvent>) -> LoadHandle {
    let (cancel_tx, mut cancel_rx) = broadcast::channel(1);
    let join = tokio::spawn(async move {
        tokio::select! {
            biased;
            _ = cancel_rx.recv() => {
                info!(ticket, "feed load cancelled");
            }
            result = loader.load() => {
                if let Err(e) = &result {
                    warn!(ticket, error = %e, "feed load failed");
                }
                if events.send(LoadEvent { ticket, result }).await.is_err() {
                    debug!(ticket, "load receiver dropped");
                }
            }
        }
    });

    LoadHandle { cancel_tx, join }
}
