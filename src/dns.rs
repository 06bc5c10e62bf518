use std::fmt;
use std::io;
use std::net::SocketAddr;

use reqwest::dns::{Addrs, Name, Resolve, Resolving};

/// A host name could not be resolved.
///
/// Produced by [`SystemResolver`] so that the retry classifier can recognize
/// resolution failures by type instead of by message text.
#[derive(Debug)]
pub struct NameResolutionError {
    host: String,
    source: io::Error,
}

impl NameResolutionError {
    pub fn new(host: impl Into<String>, source: io::Error) -> Self {
        Self {
            host: host.into(),
            source,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }
}

impl fmt::Display for NameResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to resolve host '{}'", self.host)
    }
}

impl std::error::Error for NameResolutionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Resolves through the operating system and tags failures.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct SystemResolver;

impl Resolve for SystemResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let host = name.as_str().to_owned();
        Box::pin(async move {
            let lookup = tokio::net::lookup_host((host.clone(), 0)).await;
            match lookup {
                Ok(addrs) => {
                    let addrs: Vec<SocketAddr> = addrs.collect();
                    if addrs.is_empty() {
                        let err = io::Error::new(io::ErrorKind::NotFound, "no addresses returned");
                        return Err(NameResolutionError::new(host, err).into());
                    }
                    Ok(Box::new(addrs.into_iter()) as Addrs)
                }
                Err(err) => Err(NameResolutionError::new(host, err).into()),
            }
        })
    }
}
