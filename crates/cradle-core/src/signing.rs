//! Signing identities and their binding to build variants.
//!
//! Password fields are write-only: they are wiped on drop, masked in `Debug`,
//! never serialized, and reach the outside world only through
//! [`SigningHandle::hand_off`] to an [`ArtifactSigner`].

use std::collections::BTreeMap;
use std::fmt;

use miette::Diagnostic;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::node::{ConfigNode, REDACTED};
use crate::value::Value;
use crate::variant::BuildVariant;

/// A credential string that is zeroed on drop and never printed.
#[derive(Clone, Default, PartialEq, Eq, Zeroize, ZeroizeOnDrop, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

/// Credentials for one named signing configuration (key store + key).
#[derive(Debug, Clone)]
pub struct SigningIdentity {
    pub name: String,
    pub store_file: String,
    store_password: Secret,
    pub key_alias: String,
    key_password: Secret,
}

/// A `[signing.<name>]` entry in `cradle.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SigningEntry {
    #[serde(default)]
    pub store_file: String,
    #[serde(default)]
    pub store_password: Secret,
    #[serde(default)]
    pub key_alias: String,
    #[serde(default)]
    pub key_password: Secret,
}

impl SigningEntry {
    /// Interpolate `${env:VAR}` in every field. Replaced secrets are wiped.
    pub fn interpolate(&mut self, env: &BTreeMap<String, String>) {
        for path in [&mut self.store_file, &mut self.key_alias] {
            *path = crate::properties::interpolate(path, env);
        }
        for secret in [&mut self.store_password, &mut self.key_password] {
            if secret.expose().contains("${env:") {
                *secret = Secret::new(crate::properties::interpolate(secret.expose(), env));
            }
        }
    }
}

impl SigningIdentity {
    pub fn new(
        name: impl Into<String>,
        store_file: impl Into<String>,
        store_password: Secret,
        key_alias: impl Into<String>,
        key_password: Secret,
    ) -> Self {
        Self {
            name: name.into(),
            store_file: store_file.into(),
            store_password,
            key_alias: key_alias.into(),
            key_password,
        }
    }

    /// Build an identity from a `signingConfigs` child block.
    ///
    /// `System.getenv("NAME")` values are looked up in `env`. Any other
    /// value that is not a string or `file(..)` leaves the field empty.
    pub fn from_node(node: &ConfigNode, env: &BTreeMap<String, String>) -> Self {
        let field = |key: &str| -> String {
            match node.get(key) {
                Some(Value::String(s)) | Some(Value::FileRef(s)) => s.clone(),
                Some(Value::Call(call)) if call.name == "System.getenv" => call
                    .single_string()
                    .and_then(|var| env.get(var).cloned())
                    .unwrap_or_default(),
                _ => String::new(),
            }
        };
        Self {
            name: node.key().to_string(),
            store_file: field("storeFile"),
            store_password: Secret::new(field("storePassword")),
            key_alias: field("keyAlias"),
            key_password: Secret::new(field("keyPassword")),
        }
    }

    pub fn from_entry(name: &str, entry: &SigningEntry) -> Self {
        Self::new(
            name,
            entry.store_file.clone(),
            entry.store_password.clone(),
            entry.key_alias.clone(),
            entry.key_password.clone(),
        )
    }

    /// Names of the credential fields that are empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.store_file.is_empty() {
            missing.push("storeFile");
        }
        if self.store_password.is_empty() {
            missing.push("storePassword");
        }
        if self.key_alias.is_empty() {
            missing.push("keyAlias");
        }
        if self.key_password.is_empty() {
            missing.push("keyPassword");
        }
        missing
    }

    /// Stable, secret-free fingerprint of the store path and alias.
    pub fn fingerprint(&self) -> String {
        cradle_util::hash::short_fingerprint(&[&self.store_file, &self.key_alias])
    }
}

/// The table of signing identities available to one resolution pass.
#[derive(Debug, Clone, Default)]
pub struct SigningIdentities {
    by_name: BTreeMap<String, SigningIdentity>,
}

impl SigningIdentities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identities declared as children of the descriptor's `signingConfigs` block.
    pub fn from_blocks<'n>(
        blocks: impl IntoIterator<Item = &'n ConfigNode>,
        env: &BTreeMap<String, String>,
    ) -> Self {
        let mut identities = Self::new();
        for block in blocks {
            identities.insert(SigningIdentity::from_node(block, env));
        }
        identities
    }

    /// Insert or replace an identity, returning the one it replaced.
    pub fn insert(&mut self, identity: SigningIdentity) -> Option<SigningIdentity> {
        self.by_name.insert(identity.name.clone(), identity)
    }

    pub fn get(&self, name: &str) -> Option<&SigningIdentity> {
        self.by_name.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// Signing failures. Fatal for the affected variant only.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum SigningError {
    #[error("variant `{variant}` requests signing identity `{identity}`, which is not defined")]
    #[diagnostic(
        code(cradle::signing::missing),
        help("Declare it under android.signingConfigs or as [signing.<name>] in cradle.toml")
    )]
    MissingSigningIdentity { variant: String, identity: String },

    #[error(
        "signing identity `{identity}` used by variant `{variant}` has empty fields: {}",
        .fields.join(", ")
    )]
    #[diagnostic(
        code(cradle::signing::incomplete),
        help("storeFile, storePassword, keyAlias and keyPassword must all be set")
    )]
    IncompleteSigningIdentity {
        variant: String,
        identity: String,
        fields: Vec<&'static str>,
    },
}

/// Credentials as handed to the external signer.
pub struct SigningCredentials<'a> {
    pub identity: &'a str,
    pub store_file: &'a str,
    pub store_password: &'a str,
    pub key_alias: &'a str,
    pub key_password: &'a str,
}

impl fmt::Debug for SigningCredentials<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningCredentials")
            .field("identity", &self.identity)
            .field("store_file", &self.store_file)
            .field("store_password", &REDACTED)
            .field("key_alias", &self.key_alias)
            .field("key_password", &REDACTED)
            .finish()
    }
}

/// The external collaborator that actually signs artifacts.
pub trait ArtifactSigner {
    fn sign(&self, credentials: &SigningCredentials<'_>) -> miette::Result<()>;
}

/// An opaque reference from a variant to the identity it is signed with.
#[derive(Debug, Clone)]
pub struct SigningHandle<'a> {
    identity: &'a SigningIdentity,
    fingerprint: String,
}

impl<'a> SigningHandle<'a> {
    fn new(identity: &'a SigningIdentity) -> Self {
        Self {
            fingerprint: identity.fingerprint(),
            identity,
        }
    }

    pub fn identity_name(&self) -> &str {
        &self.identity.name
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Pass the credentials through to `signer`.
    pub fn hand_off(&self, signer: &dyn ArtifactSigner) -> miette::Result<()> {
        let id = self.identity;
        signer.sign(&SigningCredentials {
            identity: &id.name,
            store_file: &id.store_file,
            store_password: id.store_password.expose(),
            key_alias: &id.key_alias,
            key_password: id.key_password.expose(),
        })
    }
}

impl Serialize for SigningHandle<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("SigningHandle", 3)?;
        state.serialize_field("identity", &self.identity.name)?;
        state.serialize_field("fingerprint", &self.fingerprint)?;
        state.serialize_field("bound", &true)?;
        state.end()
    }
}

/// Attach the signing identity `variant` asks for.
///
/// Variants that request no identity come back unbound. Only identities that
/// are actually requested are checked for completeness.
pub fn bind<'a>(
    mut variant: BuildVariant<'a>,
    identities: &'a SigningIdentities,
) -> Result<BuildVariant<'a>, SigningError> {
    let Some(name) = variant.signing_config.as_deref() else {
        return Ok(variant);
    };

    let identity = identities
        .get(name)
        .ok_or_else(|| SigningError::MissingSigningIdentity {
            variant: variant.name.clone(),
            identity: name.to_string(),
        })?;

    let missing = identity.missing_fields();
    if !missing.is_empty() {
        return Err(SigningError::IncompleteSigningIdentity {
            variant: variant.name.clone(),
            identity: identity.name.clone(),
            fields: missing,
        });
    }

    tracing::debug!(
        variant = %variant.name,
        identity = %identity.name,
        fingerprint = %identity.fingerprint(),
        "bound signing identity"
    );
    variant.signing = Some(SigningHandle::new(identity));
    Ok(variant)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_debug_is_masked() {
        let secret = Secret::new("12345678");
        assert_eq!(format!("{secret:?}"), REDACTED);
    }

    #[test]
    fn from_node_reads_env_lookups() {
        let text = r#"
create("release") {
    storeFile = file("release.jks")
    storePassword = System.getenv("STORE_PW")
    keyAlias = "key"
    keyPassword = System.getenv("MISSING_PW")
}
"#;
        let root = crate::parser::parse(text).unwrap();
        let mut env = BTreeMap::new();
        env.insert("STORE_PW".to_string(), "hunter2".to_string());
        let identity = SigningIdentity::from_node(root.block("release").unwrap(), &env);
        assert_eq!(identity.store_file, "release.jks");
        assert_eq!(identity.missing_fields(), vec!["keyPassword"]);
    }

    #[test]
    fn fingerprint_ignores_passwords() {
        let a = SigningIdentity::new("r", "r.jks", Secret::new("one"), "key", Secret::new("one"));
        let b = SigningIdentity::new("r", "r.jks", Secret::new("two"), "key", Secret::new("two"));
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn later_insert_replaces_identity() {
        let mut ids = SigningIdentities::new();
        ids.insert(SigningIdentity::new("release", "a.jks", Secret::new("p"), "k", Secret::new("p")));
        let replaced = ids.insert(SigningIdentity::new(
            "release",
            "b.jks",
            Secret::new("p"),
            "k",
            Secret::new("p"),
        ));
        assert_eq!(replaced.unwrap().store_file, "a.jks");
        assert_eq!(ids.get("release").unwrap().store_file, "b.jks");
        assert_eq!(ids.len(), 1);
    }
}
