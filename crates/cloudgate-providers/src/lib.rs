//! Provider adapters for the cloud instance lifecycle gateway.
//!
//! Each adapter translates the gateway's generic list/find/create/delete
//! operations into calls against a minimal backend trait ([`gcp::GcpComputeApi`],
//! [`aws::Ec2Api`]) modeling the raw provider surface. The in-memory backends
//! in [`memory`] implement those traits for local development and tests; an
//! SDK-backed client would implement the same traits to go live.

pub mod aws;
pub mod credentials;
pub mod gcp;
pub mod memory;
pub mod password;

pub use aws::{AwsAdapter, Ec2Api};
pub use credentials::{CredentialResolver, GcpCredentials};
pub use gcp::{GcpAdapter, GcpComputeApi};
pub use memory::{MemoryEc2Api, MemoryGcpApi};
