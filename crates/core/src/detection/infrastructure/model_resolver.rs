use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

const APP_DIR_NAME: &str = "CandidSorter";
const DOWNLOAD_CHUNK_BYTES: usize = 1024 * 1024;

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("failed to create cache directory: {0}")]
    CacheDir(#[source] std::io::Error),
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to write model to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not determine cache directory")]
    NoCacheDir,
}

/// Progress callback: `(bytes_downloaded, total_bytes)`.
/// `total_bytes` is 0 if the server didn't provide Content-Length.
pub type ProgressFn = Box<dyn Fn(u64, u64) + Send>;

/// Locates ONNX model files, downloading them on first use.
///
/// Resolution order:
/// 1. Bundled directory (models shipped next to the binary or passed on the CLI)
/// 2. Cache directory
/// 3. Download from URL into the cache
pub struct ModelResolver {
    cache_dir: PathBuf,
    bundled_dir: Option<PathBuf>,
}

impl ModelResolver {
    pub fn new(cache_dir: PathBuf, bundled_dir: Option<PathBuf>) -> Self {
        Self {
            cache_dir,
            bundled_dir,
        }
    }

    /// Resolver rooted at the platform cache directory.
    pub fn with_default_cache(bundled_dir: Option<PathBuf>) -> Result<Self, ModelResolveError> {
        Ok(Self::new(model_cache_dir()?, bundled_dir))
    }

    /// Returns a local path for `name`, checking without touching the network first.
    pub fn locate(&self, name: &str) -> Option<PathBuf> {
        self.bundled_dir
            .iter()
            .map(|dir| dir.join(name))
            .chain(std::iter::once(self.cache_dir.join(name)))
            .find(|p| p.is_file())
    }

    pub fn resolve(
        &self,
        name: &str,
        url: &str,
        progress: Option<ProgressFn>,
    ) -> Result<PathBuf, ModelResolveError> {
        if let Some(path) = self.locate(name) {
            log::debug!("Using local model {}", path.display());
            return Ok(path);
        }

        fs::create_dir_all(&self.cache_dir).map_err(ModelResolveError::CacheDir)?;
        let dest = self.cache_dir.join(name);
        log::info!("Downloading {name} to {}", dest.display());
        download(url, &dest, progress)?;
        Ok(dest)
    }
}

/// Platform-specific model cache directory.
///
/// - macOS: `~/Library/Application Support/CandidSorter/models/`
/// - Linux: `$XDG_CACHE_HOME/CandidSorter/models/` or `~/.cache/CandidSorter/models/`
/// - Windows: `%LOCALAPPDATA%/CandidSorter/models/`
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    let base = dirs::data_dir();
    #[cfg(not(target_os = "macos"))]
    let base = dirs::cache_dir();

    base.map(|d| d.join(APP_DIR_NAME).join("models"))
        .ok_or(ModelResolveError::NoCacheDir)
}

/// Streams `url` into `dest` through a `.part` file renamed on success.
fn download(url: &str, dest: &Path, progress: Option<ProgressFn>) -> Result<(), ModelResolveError> {
    let temp_path = dest.with_extension("part");
    let result = stream_to(url, &temp_path, progress).and_then(|()| {
        fs::rename(&temp_path, dest).map_err(|e| ModelResolveError::Write {
            path: dest.to_path_buf(),
            source: e,
        })
    });
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

fn stream_to(
    url: &str,
    path: &Path,
    progress: Option<ProgressFn>,
) -> Result<(), ModelResolveError> {
    let write_err = |e: std::io::Error| ModelResolveError::Write {
        path: path.to_path_buf(),
        source: e,
    };

    let mut response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(|e| ModelResolveError::Download {
            url: url.to_string(),
            source: e,
        })?;
    let total = response.content_length().unwrap_or(0);

    let mut file = fs::File::create(path).map_err(write_err)?;
    let mut buf = vec![0u8; DOWNLOAD_CHUNK_BYTES];
    let mut downloaded: u64 = 0;
    loop {
        let n = response.read(&mut buf).map_err(write_err)?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n]).map_err(write_err)?;
        downloaded += n as u64;
        if let Some(ref cb) = progress {
            cb(downloaded, total);
        }
    }
    file.flush().map_err(write_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_prefers_bundled_file() {
        let tmp = TempDir::new().unwrap();
        let bundled = tmp.path().join("bundled");
        let cache = tmp.path().join("cache");
        fs::create_dir_all(&bundled).unwrap();
        fs::create_dir_all(&cache).unwrap();
        fs::write(bundled.join("m.onnx"), b"bundled").unwrap();
        fs::write(cache.join("m.onnx"), b"cached").unwrap();

        let resolver = ModelResolver::new(cache, Some(bundled.clone()));
        let path = resolver
            .resolve("m.onnx", "http://invalid.example.com/m.onnx", None)
            .unwrap();

        assert_eq!(path, bundled.join("m.onnx"));
    }

    #[test]
    fn test_resolve_falls_back_to_cache() {
        let tmp = TempDir::new().unwrap();
        let cache = tmp.path().join("cache");
        fs::create_dir_all(&cache).unwrap();
        fs::write(cache.join("m.onnx"), b"cached").unwrap();

        let resolver = ModelResolver::new(cache.clone(), Some(tmp.path().join("missing")));
        assert_eq!(resolver.locate("m.onnx"), Some(cache.join("m.onnx")));
    }

    #[test]
    fn test_locate_missing_is_none() {
        let tmp = TempDir::new().unwrap();
        let resolver = ModelResolver::new(tmp.path().to_path_buf(), None);
        assert_eq!(resolver.locate("absent.onnx"), None);
    }

    #[test]
    fn test_model_cache_dir_is_namespaced() {
        let path = model_cache_dir().unwrap();
        assert!(path.to_string_lossy().contains(APP_DIR_NAME));
        assert!(path.ends_with("models"));
    }

    #[test]
    fn test_failed_download_leaves_no_files() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("model.onnx");
        let result = download("http://invalid.nonexistent.example.com/model", &dest, None);
        assert!(result.is_err());
        assert!(!dest.exists());
        assert!(!dest.with_extension("part").exists());
    }
}
