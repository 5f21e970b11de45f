//! Software-backed provider: in-process crypto over a file keystore.

mod keystore;

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use keystore::FileKeyStore;

use crate::error::{Error, Result};
use crate::factory::ResolvedConfig;
use crate::hash::{digest, HashAlgorithm};
use crate::key::{
    util, EcdsaCurve, EcdsaPrivateKey, EcdsaPublicKey, Key, RsaPrivateKey, RsaPublicKey,
};
use crate::opts::{HashOpts, ImportFormat, KeyGenOpts, KeyImportOpts, SignatureOpts};
use crate::provider::CryptoProvider;

/// Software cryptographic service provider.
///
/// Keys live in an in-memory cache over a file keystore; ephemeral keys
/// stay in the cache only and never reach disk. The default hash algorithm
/// is fixed at construction from the configured family and security level.
pub struct SoftwareProvider {
    default_hash: HashAlgorithm,
    keystore: FileKeyStore,
    cache: RwLock<HashMap<Vec<u8>, Arc<dyn Key>>>,
}

impl SoftwareProvider {
    /// Build a provider from a resolved configuration.
    pub fn new(config: &ResolvedConfig) -> Result<Self> {
        let default_hash = HashAlgorithm::from_family(&config.hash_family, config.security_level)?;
        let keystore = FileKeyStore::new(&config.keystore_path)?;
        tracing::debug!(
            keystore = %config.keystore_path.display(),
            hash = ?default_hash,
            "software provider initialized"
        );
        Ok(Self {
            default_hash,
            keystore,
            cache: RwLock::new(HashMap::new()),
        })
    }

    /// Registry constructor
    pub(crate) fn construct(config: &ResolvedConfig) -> Result<Arc<dyn CryptoProvider>> {
        Ok(Arc::new(Self::new(config)?))
    }

    /// Cache a key under its SKI.
    ///
    /// A public key never displaces a cached private key with the same SKI:
    /// both halves share the identifier, and lookups must keep returning the
    /// signing-capable one.
    fn cache_insert(&self, key: Arc<dyn Key>) -> Result<Arc<dyn Key>> {
        let mut cache = self
            .cache
            .write()
            .map_err(|_| Error::Crypto("key cache lock poisoned".to_string()))?;
        match cache.get(key.ski()) {
            Some(existing) if existing.is_private() && !key.is_private() => {}
            _ => {
                cache.insert(key.ski().to_vec(), Arc::clone(&key));
            }
        }
        Ok(key)
    }

    fn cache_get(&self, ski: &[u8]) -> Result<Option<Arc<dyn Key>>> {
        let cache = self
            .cache
            .read()
            .map_err(|_| Error::Crypto("key cache lock poisoned".to_string()))?;
        Ok(cache.get(ski).cloned())
    }

    /// Persist a key to the file keystore, private and public halves alike.
    fn persist(&self, key: &Arc<dyn Key>) -> Result<()> {
        if let Some(k) = key.as_any().downcast_ref::<EcdsaPrivateKey>() {
            self.keystore.store_private(k.ski(), &k.to_pkcs8_pem()?)?;
            self.keystore
                .store_public(k.ski(), &k.public_half()?.to_spki_pem()?)?;
        } else if let Some(k) = key.as_any().downcast_ref::<RsaPrivateKey>() {
            self.keystore.store_private(k.ski(), &k.to_pkcs8_pem()?)?;
            self.keystore
                .store_public(k.ski(), &k.public_half()?.to_spki_pem()?)?;
        } else if let Some(k) = key.as_any().downcast_ref::<EcdsaPublicKey>() {
            self.keystore.store_public(k.ski(), &k.to_spki_pem()?)?;
        } else if let Some(k) = key.as_any().downcast_ref::<RsaPublicKey>() {
            self.keystore.store_public(k.ski(), &k.to_spki_pem()?)?;
        } else {
            return Err(Error::Crypto("unsupported key type for keystore".to_string()));
        }
        Ok(())
    }
}

impl CryptoProvider for SoftwareProvider {
    fn key_gen(&self, opts: &KeyGenOpts) -> Result<Arc<dyn Key>> {
        let key: Arc<dyn Key> = match *opts {
            KeyGenOpts::EcdsaP256 { .. } => {
                Arc::new(EcdsaPrivateKey::generate(EcdsaCurve::P256)?)
            }
            KeyGenOpts::EcdsaP384 { .. } => {
                Arc::new(EcdsaPrivateKey::generate(EcdsaCurve::P384)?)
            }
            KeyGenOpts::Rsa2048 { .. } => Arc::new(RsaPrivateKey::generate(2048)?),
            KeyGenOpts::Rsa3072 { .. } => Arc::new(RsaPrivateKey::generate(3072)?),
            KeyGenOpts::Rsa4096 { .. } => Arc::new(RsaPrivateKey::generate(4096)?),
        };

        if !opts.ephemeral() {
            self.persist(&key)?;
        }
        tracing::debug!(
            ski = %hex::encode(key.ski()),
            ephemeral = opts.ephemeral(),
            "generated key"
        );
        self.cache_insert(key)
    }

    fn key_import(&self, raw: &[u8], opts: &KeyImportOpts) -> Result<Arc<dyn Key>> {
        let key = match opts.format {
            ImportFormat::Pkcs8PrivateDer => util::private_key_from_pkcs8_der(raw)?,
            ImportFormat::Pkcs8PrivatePem => {
                let pem = std::str::from_utf8(raw)
                    .map_err(|_| Error::Format("PEM is not valid UTF-8".to_string()))?;
                util::private_key_from_pkcs8_pem(pem)?
            }
            ImportFormat::SpkiPublicDer => util::public_key_from_spki_der(raw)?,
            ImportFormat::SpkiPublicPem => {
                let pem = std::str::from_utf8(raw)
                    .map_err(|_| Error::Format("PEM is not valid UTF-8".to_string()))?;
                util::public_key_from_spki_pem(pem)?
            }
            ImportFormat::CertificatePublicKey => util::public_key_from_certificate_der(raw)?,
        };

        if !opts.ephemeral {
            self.persist(&key)?;
        }
        self.cache_insert(key)
    }

    fn get_key(&self, ski: &[u8]) -> Result<Arc<dyn Key>> {
        if let Some(key) = self.cache_get(ski)? {
            if key.is_private() {
                return Ok(key);
            }
            // A cached public handle may stand in front of a private key
            // persisted on disk under the same SKI
            return match self.keystore.load(ski) {
                Ok(persisted) if persisted.is_private() => self.cache_insert(persisted),
                _ => Ok(key),
            };
        }
        let key = self.keystore.load(ski)?;
        self.cache_insert(key)
    }

    fn hash(&self, msg: &[u8], opts: &HashOpts) -> Result<Vec<u8>> {
        Ok(digest(opts.resolve(self.default_hash), msg))
    }

    fn sign(&self, key: &dyn Key, dgst: &[u8], _opts: &SignatureOpts) -> Result<Vec<u8>> {
        if !key.is_private() {
            return Err(Error::Crypto("signing requires a private key".to_string()));
        }

        if let Some(k) = key.as_any().downcast_ref::<EcdsaPrivateKey>() {
            k.sign_digest(dgst)
        } else if let Some(k) = key.as_any().downcast_ref::<RsaPrivateKey>() {
            k.sign_digest(dgst)
        } else {
            Err(Error::Crypto("unsupported key type for signing".to_string()))
        }
    }

    fn verify(
        &self,
        key: &dyn Key,
        signature: &[u8],
        dgst: &[u8],
        _opts: &SignatureOpts,
    ) -> Result<bool> {
        if let Some(k) = key.as_any().downcast_ref::<EcdsaPublicKey>() {
            k.verify_digest(dgst, signature)
        } else if let Some(k) = key.as_any().downcast_ref::<RsaPublicKey>() {
            k.verify_digest(dgst, signature)
        } else if let Some(k) = key.as_any().downcast_ref::<EcdsaPrivateKey>() {
            k.public_half()?.verify_digest(dgst, signature)
        } else if let Some(k) = key.as_any().downcast_ref::<RsaPrivateKey>() {
            k.public_half()?.verify_digest(dgst, signature)
        } else {
            Err(Error::Crypto(
                "unsupported key type for verification".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn provider(dir: &TempDir) -> SoftwareProvider {
        let config = ResolvedConfig {
            provider: "software".to_string(),
            hash_family: "SHA2".to_string(),
            security_level: 256,
            keystore_path: dir.path().join("keystore"),
            library: None,
            plugin_config: HashMap::new(),
        };
        SoftwareProvider::new(&config).unwrap()
    }

    #[test]
    fn test_rejects_unknown_hash_family() {
        let dir = TempDir::new().unwrap();
        let config = ResolvedConfig {
            provider: "software".to_string(),
            hash_family: "BLAKE".to_string(),
            security_level: 256,
            keystore_path: dir.path().to_path_buf(),
            library: None,
            plugin_config: HashMap::new(),
        };
        assert!(matches!(
            SoftwareProvider::new(&config),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_key_gen_persists_non_ephemeral() {
        let dir = TempDir::new().unwrap();
        let csp = provider(&dir);

        let key = csp
            .key_gen(&KeyGenOpts::EcdsaP256 { ephemeral: false })
            .unwrap();
        let sk_file = dir
            .path()
            .join("keystore")
            .join(format!("{}_sk.pem", hex::encode(key.ski())));
        assert!(sk_file.exists());
    }

    #[test]
    fn test_ephemeral_keys_never_touch_disk() {
        let dir = TempDir::new().unwrap();
        let csp = provider(&dir);

        let key = csp
            .key_gen(&KeyGenOpts::EcdsaP256 { ephemeral: true })
            .unwrap();
        let entries: Vec<_> = std::fs::read_dir(dir.path().join("keystore"))
            .unwrap()
            .collect();
        assert!(entries.is_empty());

        // Still resolvable through the cache
        assert_eq!(csp.get_key(key.ski()).unwrap().ski(), key.ski());
    }

    #[test]
    fn test_get_key_after_reconstruction() {
        let dir = TempDir::new().unwrap();
        let ski = {
            let csp = provider(&dir);
            let key = csp
                .key_gen(&KeyGenOpts::EcdsaP384 { ephemeral: false })
                .unwrap();
            key.ski().to_vec()
        };

        // A fresh provider over the same keystore finds the key on disk
        let csp = provider(&dir);
        let key = csp.get_key(&ski).unwrap();
        assert!(key.is_private());

        let dgst = csp.hash(b"payload", &HashOpts::ProviderDefault).unwrap();
        let sig = csp.sign(key.as_ref(), &dgst, &SignatureOpts::default()).unwrap();
        assert!(csp
            .verify(key.as_ref(), &sig, &dgst, &SignatureOpts::default())
            .unwrap());
    }

    #[test]
    fn test_get_key_unknown_ski() {
        let dir = TempDir::new().unwrap();
        let csp = provider(&dir);
        assert!(matches!(
            csp.get_key(&[0u8; 32]),
            Err(Error::KeyNotFound(_))
        ));
    }

    #[test]
    fn test_sign_with_public_key_fails() {
        let dir = TempDir::new().unwrap();
        let csp = provider(&dir);

        let key = csp
            .key_gen(&KeyGenOpts::EcdsaP256 { ephemeral: true })
            .unwrap();
        let public = key.public_key().unwrap();
        let dgst = csp.hash(b"payload", &HashOpts::ProviderDefault).unwrap();

        assert!(matches!(
            csp.sign(public.as_ref(), &dgst, &SignatureOpts::default()),
            Err(Error::Crypto(_))
        ));
    }

    #[test]
    fn test_import_same_key_twice_same_ski() {
        let dir = TempDir::new().unwrap();
        let csp = provider(&dir);

        let key = csp
            .key_gen(&KeyGenOpts::EcdsaP256 { ephemeral: true })
            .unwrap();
        let spki = key.public_key().unwrap().bytes().unwrap();

        let first = csp
            .key_import(
                &spki,
                &KeyImportOpts::new(ImportFormat::SpkiPublicDer, true),
            )
            .unwrap();
        let second = csp
            .key_import(
                &spki,
                &KeyImportOpts::new(ImportFormat::SpkiPublicDer, true),
            )
            .unwrap();
        assert_eq!(first.ski(), second.ski());
        assert_eq!(first.ski(), key.ski());
    }

    #[test]
    fn test_public_import_does_not_shadow_private_key() {
        let dir = TempDir::new().unwrap();
        let csp = provider(&dir);

        let key = csp
            .key_gen(&KeyGenOpts::EcdsaP256 { ephemeral: false })
            .unwrap();
        let spki = key.public_key().unwrap().bytes().unwrap();

        // Importing the public half (as token verification does) must not
        // hide the enrolled private key from lookups
        csp.key_import(
            &spki,
            &KeyImportOpts::new(ImportFormat::SpkiPublicDer, true),
        )
        .unwrap();

        let fetched = csp.get_key(key.ski()).unwrap();
        assert!(fetched.is_private());
    }

    #[test]
    fn test_hash_respects_explicit_opts() {
        let dir = TempDir::new().unwrap();
        let csp = provider(&dir);

        assert_eq!(csp.hash(b"x", &HashOpts::ProviderDefault).unwrap().len(), 32);
        assert_eq!(csp.hash(b"x", &HashOpts::Sha384).unwrap().len(), 48);
        assert_eq!(csp.hash(b"x", &HashOpts::Sha3_256).unwrap().len(), 32);
    }
}
