//! The artifact resolution seam.
//!
//! Graph and context documents can live behind arbitrary URIs. The runtime
//! treats the artifact layer as opaque: anything that can turn a URI into
//! bytes works. A filesystem-backed resolver is provided for local
//! deployments and tests.

use url::Url;

use armature_context::entry::DirectiveError;
use armature_context::schema::ContextProfile;
use armature_state::graph::{GraphError, StateGraph};

/// Errors raised while fetching an artifact.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    /// The resolver does not handle the URI's scheme.
    #[error("scheme '{scheme}' is not supported by this resolver")]
    UnsupportedScheme {
        /// The unsupported scheme.
        scheme: String,
    },

    /// The URI does not address a fetchable artifact.
    #[error("no artifact at '{uri}'")]
    NotFound {
        /// The unresolvable URI.
        uri: Url,
    },

    /// The artifact is not valid UTF-8 text.
    #[error("artifact at '{uri}' is not valid UTF-8")]
    Encoding {
        /// The offending URI.
        uri: Url,
    },

    /// An I/O failure while reading the artifact.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Turns a URI into the bytes it addresses.
pub trait ArtifactResolver: Send + Sync {
    /// Fetches the artifact's bytes.
    ///
    /// # Errors
    ///
    /// Returns an [`ArtifactError`] when the URI cannot be resolved.
    fn resolve(&self, uri: &Url) -> Result<Vec<u8>, ArtifactError>;
}

/// Resolver for `file://` URIs.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileResolver;

impl ArtifactResolver for FileResolver {
    fn resolve(&self, uri: &Url) -> Result<Vec<u8>, ArtifactError> {
        if uri.scheme() != "file" {
            return Err(ArtifactError::UnsupportedScheme {
                scheme: uri.scheme().to_string(),
            });
        }
        let path = uri
            .to_file_path()
            .map_err(|()| ArtifactError::NotFound { uri: uri.clone() })?;
        Ok(std::fs::read(path)?)
    }
}

/// Errors raised while loading a document through a resolver.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The artifact could not be fetched.
    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    /// The fetched graph document was invalid.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// The fetched context document was invalid.
    #[error(transparent)]
    Context(#[from] DirectiveError),
}

fn fetch_text(resolver: &dyn ArtifactResolver, uri: &Url) -> Result<String, ArtifactError> {
    let bytes = resolver.resolve(uri)?;
    String::from_utf8(bytes).map_err(|_| ArtifactError::Encoding { uri: uri.clone() })
}

/// Loads and validates a state graph document from a URI.
///
/// # Errors
///
/// Propagates fetch failures and graph validation failures; no partial
/// graph is returned.
pub fn load_graph(resolver: &dyn ArtifactResolver, uri: &Url) -> Result<StateGraph, LoadError> {
    let text = fetch_text(resolver, uri)?;
    let graph = StateGraph::from_toml(&text)?;
    tracing::debug!(%uri, root = %graph.root().name, "state graph loaded");
    Ok(graph)
}

/// Loads a context profile document from a URI.
///
/// # Errors
///
/// Propagates fetch failures and descriptor validation failures.
pub fn load_profile(
    resolver: &dyn ArtifactResolver,
    uri: &Url,
) -> Result<ContextProfile, LoadError> {
    let text = fetch_text(resolver, uri)?;
    let profile = ContextProfile::from_toml(&text)?;
    tracing::debug!(%uri, entries = profile.descriptor.entries().len(), "context profile loaded");
    Ok(profile)
}
