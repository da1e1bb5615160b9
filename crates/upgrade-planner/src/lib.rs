#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::if_not_else)]

//! # Upgrade Planner
//!
//! Generates an Amazon EKS upgrade plan by feeding cluster facts through
//! topic-specific prompts into a model hosted on Amazon Bedrock.
//!
//! This crate provides:
//! - Cluster fact collection from the EKS API and (optionally) the cluster itself
//! - Version pair validation
//! - Reference document fetching
//! - A retry-governed model invoker with per-vendor request/response adapters
//! - Handlebars prompt templates for each analysis topic
//! - Markdown plan assembly
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::path::Path;
//! use upgrade_planner::{ClusterInfo, PlannerDomain};
//!
//! let cluster_info = ClusterInfo::from_file(Path::new("cluster-info.json"))?;
//!
//! let domain = PlannerDomain::new(invoker, fetcher, config);
//! let plan = domain.generate(&cluster_info, "us.deepseek.r1-v1:0").await?;
//! ```

// Error types
pub mod errors;

// Configuration
pub mod config;

// Cluster facts
pub mod entities;

// Fact collection (EKS API, kube-apiserver)
pub mod collector;

// Domain logic
pub mod domain;

// Model integration
pub mod ai;

// Terminal UI helpers
pub mod ui;

pub use config::{InvokerConfig, PlannerConfig};
pub use domain::{validate_versions, PlannerDomain, VersionCheck};
pub use entities::ClusterInfo;
pub use errors::{PlannerError, PlannerResult};

pub use ai::{ModelInvoker, ModelRuntime, PromptRequest, VendorRegistry};
