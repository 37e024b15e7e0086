use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::app::domain::update::UpdateEvent;
use crate::app::infrastructure::error::{AppError, Result};

const USER_AGENT: &str = "MarkPad";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum UpdateChannel {
    Stable,
    Beta,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseInfo {
    pub tag_name: String,
    pub name: String,
    #[serde(default)]
    pub body: String,
    pub html_url: String,
    pub published_at: String,
    pub prerelease: bool,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

impl ReleaseInfo {
    /// Get the version string (tag_name without 'v' prefix)
    pub fn version(&self) -> String {
        self.tag_name.trim_start_matches('v').to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub browser_download_url: String,
    pub size: u64,
}

/// Where update runtime events come from.
///
/// `check` and `download` start work and report back through `events`;
/// they never change updater state themselves.
pub trait UpdateSource {
    fn check(&mut self, events: Sender<UpdateEvent>);
    fn download(&mut self, version: &str, events: Sender<UpdateEvent>);
    /// Swap the installed program for the downloaded artifact.
    fn install(&mut self, artifact: &Path) -> Result<()>;
}

/// Compare two semantic versions
/// Returns true if remote is newer than current
pub fn is_newer_version(current: &str, remote: &str) -> bool {
    match (semver::Version::parse(current), semver::Version::parse(remote)) {
        (Ok(curr), Ok(rem)) => rem > curr,
        _ => false, // If parsing fails, assume not newer
    }
}

/// Check if enough time has passed since last check (24 hours)
pub fn should_check_now(last_check_timestamp: i64) -> bool {
    let twenty_four_hours = 24 * 60 * 60;
    (current_timestamp() - last_check_timestamp) >= twenty_four_hours
}

/// Get current Unix timestamp
pub fn current_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Fetch the latest release from GitHub
pub fn fetch_latest_release(owner: &str, repo: &str, channel: UpdateChannel) -> Result<ReleaseInfo> {
    let url = match channel {
        UpdateChannel::Stable => {
            format!("https://api.github.com/repos/{}/{}/releases/latest", owner, repo)
        }
        // Beta takes the most recent release, prereleases included
        UpdateChannel::Beta => format!("https://api.github.com/repos/{}/{}/releases", owner, repo),
    };

    let response = minreq::get(&url)
        .with_header("User-Agent", USER_AGENT)
        .with_header("Accept", "application/vnd.github+json")
        .with_timeout(10)
        .send()
        .map_err(|e| AppError::UpdateFailed(format!("Failed to connect to update server: {}", e)))?;

    if !(200..300).contains(&response.status_code) {
        return Err(AppError::UpdateFailed(format!(
            "Update server returned error: {}",
            response.status_code
        )));
    }

    match channel {
        UpdateChannel::Stable => response
            .json::<ReleaseInfo>()
            .map_err(|e| AppError::UpdateFailed(format!("Failed to parse update information: {}", e))),
        UpdateChannel::Beta => {
            let releases: Vec<ReleaseInfo> = response.json().map_err(|e| {
                AppError::UpdateFailed(format!("Failed to parse update information: {}", e))
            })?;
            releases
                .into_iter()
                .next()
                .ok_or_else(|| AppError::UpdateFailed("No releases found".to_string()))
        }
    }
}

/// Get the expected asset name for the current platform
pub fn get_platform_asset_name() -> &'static str {
    if cfg!(target_os = "macos") {
        "macos-universal"
    } else if cfg!(target_os = "windows") {
        "windows-x64.exe"
    } else {
        "linux-amd64"
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DownloadProgress {
    pub transferred: u64,
    pub total: u64,
    pub bytes_per_second: f64,
}

impl DownloadProgress {
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.transferred as f64 / self.total as f64 * 100.0).min(100.0)
        }
    }
}

/// Download a binary from a URL to a specified path with progress
pub fn download_file<F>(url: &str, dest_path: &Path, mut progress_cb: F) -> Result<()>
where
    F: FnMut(DownloadProgress),
{
    let response = minreq::get(url)
        .with_header("User-Agent", USER_AGENT)
        .with_timeout(60)
        .send_lazy()
        .map_err(|e| AppError::UpdateFailed(format!("Failed to download update: {}", e)))?;

    if !(200..300).contains(&response.status_code) {
        return Err(AppError::UpdateFailed(format!(
            "Download failed with status: {}",
            response.status_code
        )));
    }

    let total: u64 = response
        .headers
        .get("content-length")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);

    let mut file = std::fs::File::create(dest_path).map_err(|e| AppError::io(dest_path, e))?;
    let started = Instant::now();
    let mut transferred: u64 = 0;
    let mut chunk: Vec<u8> = Vec::with_capacity(64 * 1024);
    let mut last_percent = -1.0;

    let mut report = |transferred: u64, last_percent: &mut f64| {
        let elapsed = started.elapsed().as_secs_f64().max(0.001);
        let progress = DownloadProgress {
            transferred,
            total,
            bytes_per_second: transferred as f64 / elapsed,
        };
        let percent = progress.percent().floor();
        if percent > *last_percent {
            *last_percent = percent;
            progress_cb(progress);
        }
    };

    for byte in response {
        let (b, _) = byte.map_err(|e| {
            AppError::UpdateFailed(format!("Failed to read from download stream: {}", e))
        })?;
        chunk.push(b);
        if chunk.len() == chunk.capacity() {
            file.write_all(&chunk).map_err(|e| AppError::io(dest_path, e))?;
            transferred += chunk.len() as u64;
            chunk.clear();
            report(transferred, &mut last_percent);
        }
    }
    if !chunk.is_empty() {
        file.write_all(&chunk).map_err(|e| AppError::io(dest_path, e))?;
        transferred += chunk.len() as u64;
    }

    // Ensure all data is written to disk
    file.flush().map_err(|e| AppError::io(dest_path, e))?;
    file.sync_all().map_err(|e| AppError::io(dest_path, e))?;
    report(transferred, &mut last_percent);

    Ok(())
}

/// Replace the current executable with a new one
pub fn install_update(new_binary_path: &Path) -> Result<()> {
    let current_exe = std::env::current_exe()
        .map_err(|e| AppError::UpdateFailed(format!("Failed to get current executable path: {}", e)))?;

    // Running executables cannot be overwritten on Windows; rename first everywhere
    let old_exe = current_exe.with_extension("old");
    if old_exe.exists() {
        let _ = std::fs::remove_file(&old_exe);
    }

    std::fs::rename(&current_exe, &old_exe).map_err(|e| AppError::io(&current_exe, e))?;

    if let Err(e) = std::fs::rename(new_binary_path, &current_exe) {
        // Rollback on failure
        let _ = std::fs::rename(&old_exe, &current_exe);
        return Err(AppError::io(new_binary_path, e));
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(&current_exe)
            .map_err(|e| AppError::io(&current_exe, e))?
            .permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&current_exe, perms).map_err(|e| AppError::io(&current_exe, e))?;
    }

    Ok(())
}

/// Update source backed by GitHub releases. Network work runs on worker
/// threads; results come back as [`UpdateEvent`]s.
pub struct GitHubReleaseSource {
    owner: String,
    repo: String,
    current_version: String,
    channel: UpdateChannel,
    latest: Arc<Mutex<Option<ReleaseInfo>>>,
    download_dir: PathBuf,
}

impl GitHubReleaseSource {
    pub fn new(owner: &str, repo: &str, current_version: &str, channel: UpdateChannel) -> Self {
        Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
            current_version: current_version.to_string(),
            channel,
            latest: Arc::new(Mutex::new(None)),
            download_dir: std::env::temp_dir().join("markpad-update"),
        }
    }
}

impl UpdateSource for GitHubReleaseSource {
    fn check(&mut self, events: Sender<UpdateEvent>) {
        let owner = self.owner.clone();
        let repo = self.repo.clone();
        let current = self.current_version.clone();
        let channel = self.channel;
        let latest = Arc::clone(&self.latest);

        let _ = events.send(UpdateEvent::Checking);
        thread::spawn(move || {
            let event = match fetch_latest_release(&owner, &repo, channel) {
                Ok(release) if is_newer_version(&current, &release.version()) => {
                    let event = UpdateEvent::Available {
                        version: release.version(),
                        notes: release.body.clone(),
                    };
                    if let Ok(mut slot) = latest.lock() {
                        *slot = Some(release);
                    }
                    event
                }
                Ok(_) => UpdateEvent::NotAvailable,
                Err(e) => UpdateEvent::Error(e.to_string()),
            };
            let _ = events.send(event);
        });
    }

    fn download(&mut self, version: &str, events: Sender<UpdateEvent>) {
        let release = self.latest.lock().ok().and_then(|slot| slot.clone());
        let Some(release) = release.filter(|r| r.version() == version) else {
            let _ = events.send(UpdateEvent::Error(format!("release {} is not known", version)));
            return;
        };
        let asset_suffix = get_platform_asset_name();
        let Some(asset) = release
            .assets
            .iter()
            .find(|a| a.name.contains(asset_suffix))
            .cloned()
        else {
            let _ = events.send(UpdateEvent::Error(format!(
                "release {} has no {} build",
                version, asset_suffix
            )));
            return;
        };

        let dir = self.download_dir.clone();
        let version = version.to_string();
        thread::spawn(move || {
            let result = std::fs::create_dir_all(&dir)
                .map_err(|e| AppError::io(&dir, e))
                .and_then(|_| {
                    let dest = dir.join(&asset.name);
                    let progress_events = events.clone();
                    download_file(&asset.browser_download_url, &dest, |p| {
                        let _ = progress_events.send(UpdateEvent::Progress {
                            percent: p.percent(),
                            bytes_per_second: p.bytes_per_second,
                            transferred: p.transferred,
                            total: p.total,
                        });
                    })
                    .map(|_| dest)
                });
            let event = match result {
                Ok(artifact) => UpdateEvent::Downloaded { version, artifact },
                Err(e) => UpdateEvent::Error(e.to_string()),
            };
            let _ = events.send(event);
        });
    }

    fn install(&mut self, artifact: &Path) -> Result<()> {
        install_update(artifact)
    }
}
