//! Typed async client for the CAME Domotic HTTP/JSON control protocol
//!
//! This crate manages the authenticated session against a CAME Domotic
//! gateway and exposes its devices as typed entities. It uses the private
//! `domo-client` crate for the low-level HTTP exchange.
//!
//! The session token issued by the gateway expires; the [`Session`] keeps it
//! fresh transparently, so callers never deal with logins or renewals: every
//! operation acquires a valid token on its way out. Concurrent callers are
//! multiplexed through one critical section, which guarantees at most one
//! login in flight no matter how many tasks race against an expired session.
//!
//! # Example
//!
//! ```no_run
//! # async fn run() -> came_api::Result<()> {
//! use came_api::{CameDomoticApi, LightStatus};
//!
//! let api = CameDomoticApi::connect("192.168.1.3", "admin", "secret").await?;
//!
//! for mut light in api.get_lights().await? {
//!     if light.name() == "kitchen" {
//!         light.set_status(LightStatus::On, None).await?;
//!     }
//! }
//!
//! api.dispose().await;
//! # Ok(())
//! # }
//! ```

pub mod ack;
pub mod api;
pub mod error;
pub mod models;
pub mod session;

mod envelope;
mod vault;

pub use api::CameDomoticApi;
pub use error::{CameError, Result};
pub use models::{
    Floor, Light, LightStatus, LightType, Opening, OpeningStatus, OpeningType, Room, ServerInfo,
    UpdateList, User,
};
pub use session::{Session, SessionBackup, DEFAULT_TIMEOUT};
