pub mod credentials;
pub mod location;
pub mod request;
pub mod status;

pub use credentials::Credentials;
pub use location::{Protocol, ResourceFilePath, ResourceLocation};
pub use request::{PutOutcome, PutRequest, RemoveOutcome, ServerCandidate, UploadMode};
pub use status::{RunningState, RunningStatusRecord};
