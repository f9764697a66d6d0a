//! Lead Relay API Library
//!
//! This library provides the core functionality for the Lead Relay API:
//! receiving form-submission webhooks from the website form builder,
//! normalizing them into canonical contact/deal records and relaying them
//! to RD Station CRM.
//!
//! # Modules
//!
//! - `config`: Configuration management.
//! - `crm_client`: RD Station CRM API client.
//! - `crm_models`: CRM-side data models and payload builders.
//! - `errors`: Error handling types.
//! - `handlers`: Shared state and health endpoint.
//! - `relay`: Lead relay workflow (upsert contact, resolve pipeline/stage, create deal).
//! - `validation`: Email and phone validation helpers.
//! - `webhook_handler`: Wix webhook handler.
//! - `webhook_models`: Inbound payload models and field normalization.

pub mod config;
pub mod crm_client;
pub mod crm_models;
pub mod errors;
pub mod handlers;
pub mod relay;
pub mod validation;
pub mod webhook_handler;
pub mod webhook_models;
