//! Geth binary acquisition and validation.
//!
//! A path is only ever reported as available after `geth version` has
//! run successfully against it, so callers never hold a path to a
//! half-written or wrong-architecture binary.

use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use mars_common::{Layout, PlatformKey};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::error::GethError;
use crate::{DOWNLOAD_BASE, GETH_VERSION};

#[derive(Debug, Clone)]
pub struct BinaryStatus {
    pub ok: bool,
    pub path: PathBuf,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct DownloadProgress {
    pub percent: u8,
    pub downloaded_bytes: u64,
    pub total_bytes: u64,
}

#[derive(Debug, Clone)]
pub struct DownloadedBinary {
    pub path: PathBuf,
    pub version: String,
    /// True when the host had no native build and a compatible
    /// neighbour (e.g. darwin-amd64 under Rosetta) was installed.
    pub used_fallback: bool,
}

/// Release archive URL for a platform key.
///
/// Returns the URL and whether a fallback build was substituted.
pub fn archive_url(key: PlatformKey) -> Result<(String, bool), GethError> {
    let (tag, ext, fallback) = match key {
        PlatformKey::LinuxX64 => ("linux-amd64", "tar.gz", false),
        PlatformKey::LinuxArm64 => ("linux-arm64", "tar.gz", false),
        PlatformKey::DarwinX64 => ("darwin-amd64", "tar.gz", false),
        // No native darwin-arm64 archive for the pinned release;
        // the amd64 build runs under Rosetta.
        PlatformKey::DarwinArm64 => ("darwin-amd64", "tar.gz", true),
        PlatformKey::Win32X64 => ("windows-amd64", "zip", false),
        PlatformKey::Win32Arm64 => ("windows-amd64", "zip", true),
    };
    Ok((
        format!("{}/geth-{}-{}.{}", DOWNLOAD_BASE, tag, GETH_VERSION, ext),
        fallback,
    ))
}

/// Check whether a runnable Geth exists at the resolved (or given) path.
pub async fn is_available(layout: &Layout, path_override: Option<PathBuf>) -> BinaryStatus {
    let path = path_override.unwrap_or_else(|| layout.geth_binary_path());
    if !path.exists() {
        return BinaryStatus {
            ok: false,
            path,
            version: None,
        };
    }
    match geth_version(&path).await {
        Ok(version) => BinaryStatus {
            ok: true,
            path,
            version: Some(version),
        },
        Err(err) => {
            log::debug!("geth at {} failed version probe: {}", path.display(), err);
            BinaryStatus {
                ok: false,
                path,
                version: None,
            }
        }
    }
}

/// Run `geth version` and parse the version string.
pub async fn geth_version(path: &Path) -> Result<String, GethError> {
    let output = Command::new(path).arg("version").output().await?;
    if !output.status.success() {
        return Err(GethError::BinaryUnavailable(path.to_path_buf()));
    }
    parse_version_output(&String::from_utf8_lossy(&output.stdout))
}

fn parse_version_output(stdout: &str) -> Result<String, GethError> {
    stdout
        .lines()
        .find_map(|line| line.trim().strip_prefix("Version:"))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(GethError::VersionUnparseable)
}

/// Download, extract and validate the Geth release for this host.
///
/// The archive and extraction scratch space live in a temporary
/// directory that is deleted on every exit path. `bin/` only ever holds
/// a binary that has passed the version probe.
pub async fn download<F>(layout: &Layout, mut on_progress: F) -> Result<DownloadedBinary, GethError>
where
    F: FnMut(DownloadProgress),
{
    let key = PlatformKey::detect().map_err(|e| GethError::UnsupportedPlatform(e.to_string()))?;
    let (url, used_fallback) = archive_url(key)?;
    if used_fallback {
        log::warn!("No native geth build for {}, falling back to a compatible build", key);
    }

    let scratch = tempfile::tempdir()?;
    let archive_name = url.rsplit('/').next().unwrap_or("geth-archive");
    let archive_path = scratch.path().join(archive_name);

    log::info!("Downloading geth from {}", url);
    fetch_to_file(&url, &archive_path, &mut on_progress).await?;

    let extract_dir = scratch.path().join("extracted");
    tokio::fs::create_dir_all(&extract_dir).await?;
    extract_archive(&archive_path, &extract_dir).await?;

    let binary_name = if key.is_windows() { "geth.exe" } else { "geth" };
    let extracted = find_file(&extract_dir, binary_name)?.ok_or_else(|| {
        GethError::DownloadFailed(format!("archive did not contain {}", binary_name))
    })?;

    let final_path = layout.geth_binary_path();
    tokio::fs::create_dir_all(layout.bin_dir()).await?;
    tokio::fs::copy(&extracted, &final_path).await?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(&final_path)?.permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&final_path, perms)?;
    }

    // A corrupt or wrong-arch binary must not survive in bin/.
    let version = match geth_version(&final_path).await {
        Ok(version) => version,
        Err(err) => {
            let _ = tokio::fs::remove_file(&final_path).await;
            return Err(GethError::DownloadFailed(format!(
                "downloaded binary failed validation: {}",
                err
            )));
        }
    };

    log::info!("Installed geth {} at {}", version, final_path.display());
    Ok(DownloadedBinary {
        path: final_path,
        version,
        used_fallback,
    })
}

async fn fetch_to_file<F>(url: &str, dest: &Path, on_progress: &mut F) -> Result<(), GethError>
where
    F: FnMut(DownloadProgress),
{
    // Redirects (301/302) are followed by the client itself.
    let response = reqwest::get(url)
        .await
        .map_err(|e| GethError::DownloadFailed(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(GethError::DownloadFailed(format!("HTTP {}", status.as_u16())));
    }

    let total_bytes = response.content_length().unwrap_or(0);
    let mut downloaded: u64 = 0;
    let mut file = tokio::fs::File::create(dest).await?;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| GethError::DownloadFailed(e.to_string()))?;
        file.write_all(&chunk).await?;
        downloaded += chunk.len() as u64;
        let percent = if total_bytes > 0 {
            ((downloaded * 100) / total_bytes).min(100) as u8
        } else {
            0
        };
        on_progress(DownloadProgress {
            percent,
            downloaded_bytes: downloaded,
            total_bytes,
        });
    }
    file.flush().await?;
    Ok(())
}

/// Extraction dispatches on the archive extension.
async fn extract_archive(archive: &Path, dest: &Path) -> Result<(), GethError> {
    let name = archive.to_string_lossy();
    if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        extract_tar_gz(archive, dest).await
    } else if name.ends_with(".zip") {
        let archive = archive.to_path_buf();
        let dest = dest.to_path_buf();
        tokio::task::spawn_blocking(move || extract_zip(&archive, &dest))
            .await
            .map_err(|e| GethError::DownloadFailed(e.to_string()))?
    } else {
        Err(GethError::DownloadFailed(format!("unknown archive format: {}", name)))
    }
}

/// `.tar.gz` goes through the system tar, which every supported Unix
/// host ships.
async fn extract_tar_gz(archive: &Path, dest: &Path) -> Result<(), GethError> {
    let output = Command::new("tar")
        .arg("-xzf")
        .arg(archive)
        .arg("-C")
        .arg(dest)
        .output()
        .await?;
    if !output.status.success() {
        return Err(GethError::DownloadFailed(format!(
            "tar exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(())
}

fn extract_zip(archive: &Path, dest: &Path) -> Result<(), GethError> {
    let file = std::fs::File::open(archive)?;
    let mut zip = zip::ZipArchive::new(file)
        .map_err(|e| GethError::DownloadFailed(format!("bad zip archive: {}", e)))?;
    for i in 0..zip.len() {
        let mut entry = zip
            .by_index(i)
            .map_err(|e| GethError::DownloadFailed(format!("bad zip entry: {}", e)))?;
        let Some(relative) = entry.enclosed_name().map(|p| p.to_path_buf()) else {
            continue;
        };
        let outpath = dest.join(relative);
        if entry.is_dir() {
            std::fs::create_dir_all(&outpath)?;
        } else {
            if let Some(parent) = outpath.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let mut outfile = std::fs::File::create(&outpath)?;
            std::io::copy(&mut entry, &mut outfile)?;
        }
    }
    Ok(())
}

/// Depth-first search for a file by name under a directory.
fn find_file(dir: &Path, name: &str) -> Result<Option<PathBuf>, GethError> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            if let Some(found) = find_file(&path, name)? {
                return Ok(Some(found));
            }
        } else if path.file_name().and_then(|n| n.to_str()) == Some(name) {
            return Ok(Some(path));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_archive_urls_per_platform() {
        let (url, fallback) = archive_url(PlatformKey::LinuxX64).unwrap();
        assert_eq!(
            url,
            format!("{}/geth-linux-amd64-{}.tar.gz", DOWNLOAD_BASE, GETH_VERSION)
        );
        assert!(!fallback);

        let (url, fallback) = archive_url(PlatformKey::Win32X64).unwrap();
        assert!(url.ends_with(".zip"));
        assert!(!fallback);
    }

    #[test]
    fn test_darwin_arm64_falls_back_to_amd64() {
        let (url, fallback) = archive_url(PlatformKey::DarwinArm64).unwrap();
        assert!(url.contains("darwin-amd64"));
        assert!(fallback);
    }

    #[test]
    fn test_parse_version_output() {
        let stdout = "Geth\nVersion: 1.13.15-stable-c5ba367e\nArchitecture: amd64\n";
        assert_eq!(parse_version_output(stdout).unwrap(), "1.13.15-stable-c5ba367e");
        assert!(parse_version_output("no version here").is_err());
    }

    #[tokio::test]
    async fn test_is_available_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path());
        let status = is_available(&layout, None).await;
        assert!(!status.ok);
        assert!(status.version.is_none());
        assert_eq!(status.path, layout.geth_binary_path());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_is_available_with_stub_binary() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path());
        let path = layout.geth_binary_path();
        std::fs::create_dir_all(layout.bin_dir()).unwrap();
        std::fs::write(&path, "#!/bin/sh\necho 'Geth'\necho 'Version: 9.9.9-test'\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();

        let status = is_available(&layout, None).await;
        assert!(status.ok);
        assert_eq!(status.version.as_deref(), Some("9.9.9-test"));
    }

    #[test]
    fn test_zip_extraction_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("geth.zip");

        let file = std::fs::File::create(&archive).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options: zip::write::FileOptions = Default::default();
        writer.add_directory("geth-windows-amd64-test/", options).unwrap();
        writer
            .start_file("geth-windows-amd64-test/geth.exe", options)
            .unwrap();
        writer.write_all(b"not a real binary").unwrap();
        writer.finish().unwrap();

        let dest = dir.path().join("out");
        std::fs::create_dir_all(&dest).unwrap();
        extract_zip(&archive, &dest).unwrap();

        let found = find_file(&dest, "geth.exe").unwrap().unwrap();
        assert_eq!(std::fs::read(found).unwrap(), b"not a real binary");
    }
}
