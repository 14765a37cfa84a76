// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Annotation keys read and written by the controller.
//!
//! Both keys are fixed strings shared with the AWS load balancer integration and with
//! the users who label their Services, so they must match exactly.

// ============================================================================
// Managed Annotation
// ============================================================================

/// Annotation the controller sets to the certificate ARN on claimed Services.
///
/// The AWS cloud provider reads it to attach the certificate to the Service's load
/// balancer listener. An empty value detaches it.
pub const MANAGED_ANNOTATION: &str = "service.beta.kubernetes.io/aws-load-balancer-ssl-cert";

// ============================================================================
// Intent Annotation
// ============================================================================

/// Annotation naming the controller class responsible for a Service.
///
/// A Service is claimed by a controller instance when this value equals the instance's
/// configured class.
pub const CONTROLLER_CLASS_ANNOTATION: &str = "easymile.com/certificate-controller.class";
