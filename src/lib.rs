//! # Fitlog
//!
//! `fitlog` serves the user resource of an exercise-log application:
//! registration, login and profile lookup. Profiles expand the user's
//! cardio and resistance entries.
//!
//! Persistence and credential checks live behind the [`fitlog::store::UserStore`]
//! trait; tokens are stateless HS256 JWTs issued by [`fitlog::token::TokenSigner`].

pub mod cli;
pub mod fitlog;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
