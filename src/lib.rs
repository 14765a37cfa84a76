// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # Certificate Controller - AWS load balancer certificates for Kubernetes Services
//!
//! A level-triggered controller that keeps the
//! `service.beta.kubernetes.io/aws-load-balancer-ssl-cert` annotation of every Service
//! claimed through `easymile.com/certificate-controller.class` equal to a configured
//! certificate ARN, and clears it when the claim is withdrawn.
//!
//! ## Modules
//!
//! - [`config`] - Command-line flags and the controller identity
//! - [`record`] - Service snapshots and reconcile events
//! - [`reconcilers`] - Decision engine, per-Service dispatch and annotation writes
//! - [`watch`] - Local cache of watched Services
//! - [`controller`] - The event loop tying watch, resync and dispatch together
//! - [`kube_client`] - Credential discovery
//! - [`leader`] - Optional leader election
//! - [`server`] / [`metrics`] - Prometheus metrics and health probes
//!
//! ## Example
//!
//! ```rust
//! use certificate_controller::config::ControllerIdentity;
//!
//! let identity = ControllerIdentity::from_settings(Some("arn:aws:acm:example"), None)
//!     .expect("certificate ARN is set");
//! assert_eq!(identity.controller_class(), "certificate-controller");
//! ```

pub mod annotations;
pub mod config;
pub mod constants;
pub mod context;
pub mod controller;
pub mod errors;
pub mod kube_client;
pub mod leader;
pub mod metrics;
pub mod reconcilers;
pub mod record;
pub mod server;
pub mod watch;

#[cfg(test)]
mod test_support;
