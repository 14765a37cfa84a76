// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Kubernetes API client construction.
//!
//! Credentials are resolved in order:
//!
//! 1. An explicit kubeconfig path (`--kubeconfig`)
//! 2. `$HOME/.kube/config`, if the file exists
//! 3. The in-cluster service account

use crate::constants::KUBECONFIG_RELATIVE_PATH;
use crate::errors::CredentialError;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Where API credentials are loaded from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CredentialSource {
    /// A kubeconfig file
    Kubeconfig(PathBuf),
    /// The in-cluster service account
    InCluster,
}

/// Pick the credential source.
///
/// # Arguments
///
/// * `explicit` - Kubeconfig path given on the command line, used even if missing
/// * `home` - Home directory of the current user, if known
#[must_use]
pub fn credential_source(explicit: Option<&Path>, home: Option<&Path>) -> CredentialSource {
    if let Some(path) = explicit {
        return CredentialSource::Kubeconfig(path.to_path_buf());
    }

    if let Some(home) = home {
        let candidate = home.join(KUBECONFIG_RELATIVE_PATH);
        if candidate.is_file() {
            return CredentialSource::Kubeconfig(candidate);
        }
        debug!(path = %candidate.display(), "No kubeconfig in home directory");
    }

    CredentialSource::InCluster
}

/// Create a client from the resolved credential source.
///
/// # Errors
///
/// Returns [`CredentialError`] if the kubeconfig cannot be read, the in-cluster
/// environment is missing, or the client cannot be built.
pub async fn create_client(source: &CredentialSource) -> Result<Client, CredentialError> {
    let config = match source {
        CredentialSource::Kubeconfig(path) => {
            info!(path = %path.display(), "Loading credentials from kubeconfig");
            let kubeconfig =
                Kubeconfig::read_from(path).map_err(|e| CredentialError::Kubeconfig {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })?;
            Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                .await
                .map_err(|e| CredentialError::Kubeconfig {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })?
        }
        CredentialSource::InCluster => {
            info!("Loading in-cluster credentials");
            Config::incluster().map_err(|e| CredentialError::InCluster {
                reason: e.to_string(),
            })?
        }
    };

    Client::try_from(config).map_err(|e| CredentialError::Client {
        reason: e.to_string(),
    })
}

/// Home directory of the current user, from `$HOME`.
#[must_use]
pub fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .filter(|home| !home.is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
#[path = "kube_client_tests.rs"]
mod kube_client_tests;
