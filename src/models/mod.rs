// src/models/mod.rs

//! Domain models for the portal client.
//!
//! This module contains all data structures used throughout the library,
//! organized by their primary purpose.

mod config;
mod credentials;
mod form;
mod login;
mod operation;
mod records;
mod reply;

// Re-export all public types
pub use config::{
    AnnouncementBoard, Config, ExtractionConfig, FieldSpec, LoginConfig, PagesConfig,
    PortalConfig,
};
pub use credentials::Credentials;
pub use form::{FormPayload, HiddenFieldSet};
pub use login::{LoginEvidence, LoginOptions, LoginOutcome, LoginReport};
pub use operation::{Feature, Operation};
pub use records::{
    AcademicRecord, AnnouncementList, AnnouncementRecord, ExtractedTable, KeyValueRecord,
    LinkList, LinkRecord, MenuLink, PageSnapshot, RecordSet, StudentInfo, TableSet,
};
pub use reply::{ErrorPayload, LoginReply, Reply};
