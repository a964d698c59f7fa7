pub mod recorder;
pub mod rest;
pub mod stub;
pub mod traits;
pub mod types;

pub use recorder::RecordingBackend;
pub use rest::RestClient;
pub use stub::StubBackend;
pub use traits::*;
pub use types::*;
