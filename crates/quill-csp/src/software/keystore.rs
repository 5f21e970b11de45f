use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::key::{util, Key};

/// File-based keystore rooted at a directory.
///
/// One file per key, named by the hex SKI: private keys as PKCS#8 PEM in
/// `<ski>_sk.pem`, public keys as SPKI PEM in `<ski>_pk.pem`. Writes are
/// serialized by an internal lock so concurrent generation/import cannot
/// interleave partial writes to the same location.
pub(crate) struct FileKeyStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FileKeyStore {
    pub(crate) fn new(root: &Path) -> Result<Self> {
        if !root.exists() {
            std::fs::create_dir_all(root)?;
        }
        Ok(Self {
            root: root.to_path_buf(),
            write_lock: Mutex::new(()),
        })
    }

    fn private_path(&self, ski: &[u8]) -> PathBuf {
        self.root.join(format!("{}_sk.pem", hex::encode(ski)))
    }

    fn public_path(&self, ski: &[u8]) -> PathBuf {
        self.root.join(format!("{}_pk.pem", hex::encode(ski)))
    }

    /// Persist a private key PEM under its SKI.
    ///
    /// Storing the same SKI again is a no-op: the SKI is derived from the
    /// key material, so the existing file already holds the same key.
    pub(crate) fn store_private(&self, ski: &[u8], pem: &str) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| Error::Crypto("keystore write lock poisoned".to_string()))?;

        let path = self.private_path(ski);
        if path.exists() {
            tracing::debug!(ski = %hex::encode(ski), "private key already persisted");
            return Ok(());
        }
        std::fs::write(&path, pem)?;
        tracing::debug!(ski = %hex::encode(ski), path = %path.display(), "persisted private key");
        Ok(())
    }

    /// Persist a public key PEM under its SKI.
    pub(crate) fn store_public(&self, ski: &[u8], pem: &str) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| Error::Crypto("keystore write lock poisoned".to_string()))?;

        let path = self.public_path(ski);
        if path.exists() {
            return Ok(());
        }
        std::fs::write(&path, pem)?;
        tracing::debug!(ski = %hex::encode(ski), path = %path.display(), "persisted public key");
        Ok(())
    }

    /// Load a key by SKI, preferring the private half when both exist.
    pub(crate) fn load(&self, ski: &[u8]) -> Result<Arc<dyn Key>> {
        let private_path = self.private_path(ski);
        if private_path.exists() {
            let pem = std::fs::read_to_string(&private_path)?;
            return util::private_key_from_pkcs8_pem(&pem);
        }

        let public_path = self.public_path(ski);
        if public_path.exists() {
            let pem = std::fs::read_to_string(&public_path)?;
            return util::public_key_from_spki_pem(&pem);
        }

        Err(Error::KeyNotFound(hex::encode(ski)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{EcdsaCurve, EcdsaPrivateKey};
    use tempfile::TempDir;

    #[test]
    fn test_store_and_load_private() {
        let dir = TempDir::new().unwrap();
        let store = FileKeyStore::new(dir.path()).unwrap();

        let key = EcdsaPrivateKey::generate(EcdsaCurve::P256).unwrap();
        store
            .store_private(key.ski(), &key.to_pkcs8_pem().unwrap())
            .unwrap();

        let loaded = store.load(key.ski()).unwrap();
        assert!(loaded.is_private());
        assert_eq!(loaded.ski(), key.ski());
    }

    #[test]
    fn test_load_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = FileKeyStore::new(dir.path()).unwrap();

        let err = store.load(&[0xab; 32]).unwrap_err();
        assert!(matches!(err, Error::KeyNotFound(_)));
    }

    #[test]
    fn test_duplicate_store_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = FileKeyStore::new(dir.path()).unwrap();

        let key = EcdsaPrivateKey::generate(EcdsaCurve::P256).unwrap();
        let pem = key.to_pkcs8_pem().unwrap();
        store.store_private(key.ski(), &pem).unwrap();
        store.store_private(key.ski(), &pem).unwrap();

        assert_eq!(store.load(key.ski()).unwrap().ski(), key.ski());
    }

    #[test]
    fn test_creates_missing_root() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        let store = FileKeyStore::new(&nested).unwrap();
        assert!(nested.exists());

        let key = EcdsaPrivateKey::generate(EcdsaCurve::P256).unwrap();
        store
            .store_private(key.ski(), &key.to_pkcs8_pem().unwrap())
            .unwrap();
        assert!(nested.join(format!("{}_sk.pem", hex::encode(key.ski()))).exists());
    }
}
