use std::path::Path;

use md5::Digest;
use md5::Md5;
use tokio::fs;
use tokio::io::AsyncReadExt;

use crate::errors::Error;

/// Hex MD5 digest of a file's contents, read in chunks so large files
/// never sit in memory whole.
pub(crate) async fn md5_of_file(path: &Path) -> Result<String, Error> {
    let mut file = fs::File::open(path).await.map_err(|e| Error::Read {
        what: path.to_string_lossy().to_string(),
        how: e.to_string(),
    })?;
    let mut context = Md5::new();
    let mut buffer = vec![0; 4096];

    loop {
        let bytes_read = file.read(&mut buffer).await.map_err(|e| Error::Read {
            what: path.to_string_lossy().to_string(),
            how: e.to_string(),
        })?;
        if bytes_read == 0 {
            break;
        }
        context.update(&buffer[..bytes_read]);
    }
    Ok(format!("{:x}", context.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn digest_matches_known_value() {
        let path = std::env::temp_dir().join("viewfs-digest-test.txt");
        std::fs::write(&path, "0123456789").unwrap();
        let digest = md5_of_file(&path).await.unwrap();
        assert_eq!(digest, "781e5e245d69b566979b86e28d23f2c7");
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn missing_file_is_a_read_error() {
        let path = std::env::temp_dir().join("viewfs-digest-absent");
        let err = md5_of_file(&path).await.unwrap_err();
        assert!(matches!(err, Error::Read { .. }));
    }
}
