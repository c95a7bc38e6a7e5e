use std::env;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;

use crate::{DatasetError, Split};

// CVDF mirror of http://yann.lecun.com/exdb/mnist/
const URL: &str = "https://storage.googleapis.com/cvdf-datasets/mnist/";

/// Directory the dataset is cached in: `<platform cache>/digits/mnist`.
pub fn cache_dir() -> PathBuf {
    if let Some(cache_dir) = dirs::cache_dir() {
        return cache_dir.join("digits").join("mnist");
    }
    if let Some(home_dir) = dirs::home_dir() {
        return home_dir.join(".cache").join("digits").join("mnist");
    }
    env::temp_dir().join("digits").join("mnist")
}

/// Ensures both files of `split` exist unpacked under `root/<split>`,
/// downloading whichever is missing. Returns the split directory.
pub fn download_split(split: Split, root: &Path) -> Result<PathBuf, DatasetError> {
    let split_dir = root.join(split.name());
    fs::create_dir_all(&split_dir)?;

    download_file(split.images_file(), &split_dir)?;
    download_file(split.labels_file(), &split_dir)?;

    Ok(split_dir)
}

/// Downloads `<URL><name>.gz` and writes its decompressed content to
/// `dest_dir/name`, unless that file already exists.
fn download_file(name: &str, dest_dir: &Path) -> Result<PathBuf, DatasetError> {
    let file_name = dest_dir.join(name);
    if file_name.exists() {
        return Ok(file_name);
    }

    let url = format!("{URL}{name}.gz");
    log::info!("Downloading {url}");
    let bytes = reqwest::blocking::get(&url)?.error_for_status()?.bytes()?;

    // Decode into a temporary file first so an interrupted download never
    // leaves a partial file behind under the final name.
    let partial = dest_dir.join(format!("{name}.part"));
    {
        let mut output = File::create(&partial)?;
        let mut decoder = GzDecoder::new(&bytes[..]);
        io::copy(&mut decoder, &mut output)?;
    }
    fs::rename(&partial, &file_name)?;
    log::info!("Saved {}", file_name.display());

    Ok(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_dir_ends_with_dataset_name() {
        let dir = cache_dir();
        assert!(dir.ends_with(Path::new("digits").join("mnist")));
    }

    #[test]
    fn test_existing_files_are_not_downloaded() {
        let root = tempfile::tempdir().unwrap();
        let split_dir = root.path().join("test");
        fs::create_dir_all(&split_dir).unwrap();
        fs::write(split_dir.join(Split::Test.images_file()), b"cached").unwrap();
        fs::write(split_dir.join(Split::Test.labels_file()), b"cached").unwrap();

        // No network access is needed when both files are already present.
        let dir = download_split(Split::Test, root.path()).unwrap();
        assert_eq!(dir, split_dir);
        assert_eq!(fs::read(dir.join(Split::Test.images_file())).unwrap(), b"cached");
    }
}
