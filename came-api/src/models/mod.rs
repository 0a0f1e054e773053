//! Typed entities parsed from gateway responses
//!
//! Device entities (lights, openings) keep a handle to the [`Session`] they
//! came from and issue their own control commands through it; pure data
//! entities (users, server info, floors, rooms, updates) just carry the
//! decoded response fields.
//!
//! [`Session`]: crate::session::Session

mod light;
mod opening;
mod server;
mod update;
mod user;

pub use light::{Light, LightData, LightStatus, LightType};
pub use opening::{Opening, OpeningData, OpeningStatus, OpeningType};
pub use server::{Floor, Room, ServerInfo};
pub use update::UpdateList;
pub use user::{User, UserData};
