#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Collaborator contracts used by services: file storage and email.
//!
//! Only the contracts and local implementations live here. Remote backends
//! plug in behind [`StorageBackend`] and [`EmailSender`].

pub mod email;
pub mod storage;

pub use email::{EmailError, EmailMessage, EmailSender, LogMailer, dispatch};
pub use storage::{LocalStorage, StorageBackend, StorageConfig, StorageError, UploadFile};
