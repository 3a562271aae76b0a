//! Login, search, request downloads, wait for them, logout.
use crate::client::Client;
use crate::error::PollError;
use crate::model::{
    Credentials, DownloadProduct, DownloadRequestResults, DownloadUrl, SceneSearchRequest,
    SessionToken,
};
use crate::poll::{expected_resolutions, PollPolicy, ResolvedDownloads};
use crate::scene_selection::SceneSelection;
use anyhow::Result;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    NoScenes,
    NoAvailableProducts { scenes: usize },
    Resolved,
}

#[derive(Debug)]
pub struct RunReport {
    pub outcome: Outcome,
    /// Resolved downloads in the order their URLs were printed.
    pub resolved: Vec<DownloadUrl>,
    pub retrieve_calls: u32,
    pub logged_out: bool,
}

impl RunReport {
    fn new(outcome: Outcome) -> Self {
        Self {
            outcome,
            resolved: vec![],
            retrieve_calls: 0,
            logged_out: false,
        }
    }
}

/// Run the whole exchange with the service. Once login succeeds the session is always
/// logged out, also when a later step fails; a failed logout is only logged.
pub async fn run(
    client: &Client,
    credentials: &Credentials,
    selection: &SceneSelection,
    policy: PollPolicy,
) -> Result<RunReport> {
    info!("Running ...");
    let token = client.login(credentials).await?;
    info!(username = %credentials.username, "Logged in");

    let result = search_and_request(client, &token, selection, policy).await;

    let logged_out = match client.logout(token).await {
        Ok(true) => {
            info!("Logged Out");
            true
        }
        Ok(false) => {
            warn!("Logout Failed");
            false
        }
        Err(err) => {
            warn!("Logout Failed: {err}");
            false
        }
    };

    let mut report = result?;
    report.logged_out = logged_out;
    Ok(report)
}

async fn search_and_request(
    client: &Client,
    token: &SessionToken,
    selection: &SceneSelection,
    policy: PollPolicy,
) -> Result<RunReport> {
    let request = SceneSearchRequest {
        dataset_name: &selection.dataset,
        scene_filter: selection.scene_filter(),
        max_results: selection.max_results,
    };

    info!(dataset = %selection.dataset, "Searching scenes...");
    let scenes = client.scene_search(token, &request).await?;
    if scenes.results.is_empty() {
        info!("Search found no results.");
        return Ok(RunReport::new(Outcome::NoScenes));
    }
    info!(
        returned = scenes.records_returned,
        total_hits = ?scenes.total_hits,
        "Found scenes"
    );

    let entity_ids: Vec<String> = scenes
        .results
        .iter()
        .map(|scene| scene.entity_id.clone())
        .collect();

    let options = client
        .download_options(token, &selection.dataset, &entity_ids)
        .await?;
    let products: Vec<DownloadProduct> = options
        .iter()
        .filter_map(DownloadProduct::from_option)
        .collect();

    if products.is_empty() {
        info!(
            "{} results were found but none available for download.",
            entity_ids.len()
        );
        return Ok(RunReport::new(Outcome::NoAvailableProducts {
            scenes: entity_ids.len(),
        }));
    }

    debug!(products = products.len(), label = %selection.label, "Requesting downloads");
    let results = client
        .download_request(token, &products, &selection.label)
        .await?;

    let mut report = RunReport::new(Outcome::Resolved);
    let mut resolved = ResolvedDownloads::new();

    if results.preparing_downloads.is_empty() {
        for download in &results.available_downloads {
            resolve(&mut resolved, download);
        }
    } else {
        let expected = expected_resolutions(products.len(), results.failed.len());
        report.retrieve_calls = wait_for_preparing(
            client,
            token,
            &selection.label,
            &results,
            expected,
            policy,
            &mut resolved,
        )
        .await?;
    }

    info!("All downloads are available to download.");
    report.resolved = resolved.into_urls();
    Ok(report)
}

/// Retrieve once right away, then every `policy.interval` until `expected` downloads are
/// resolved. Returns the number of retrieve calls made.
async fn wait_for_preparing(
    client: &Client,
    token: &SessionToken,
    label: &str,
    results: &DownloadRequestResults,
    expected: usize,
    policy: PollPolicy,
    resolved: &mut ResolvedDownloads,
) -> Result<u32> {
    let retrieved = client.download_retrieve(token, label).await?;
    let mut calls = 1;

    for download in retrieved.available.iter().chain(&retrieved.requested) {
        if results.tracks(&download.download_id) {
            resolve(resolved, download);
        }
    }

    let mut attempts = 0;
    while resolved.len() < expected {
        if attempts >= policy.max_attempts {
            return Err(PollError::Exhausted {
                resolved: resolved.len(),
                expected,
                attempts,
            }
            .into());
        }

        info!(
            "{} downloads are not available. Waiting for {} seconds.",
            expected - resolved.len(),
            policy.interval.as_secs()
        );
        tokio::time::sleep(policy.interval).await;
        attempts += 1;

        info!("Trying to retrieve data");
        let retrieved = client.download_retrieve(token, label).await?;
        calls += 1;

        for download in &retrieved.available {
            if results.tracks(&download.download_id) {
                resolve(resolved, download);
            }
        }
    }
    Ok(calls)
}

fn resolve(resolved: &mut ResolvedDownloads, download: &DownloadUrl) {
    if resolved.insert(download) {
        println!("DOWNLOAD: {}", download.url);
    }
}
