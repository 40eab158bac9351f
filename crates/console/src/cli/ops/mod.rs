pub mod bucket;
pub mod init;
pub mod serve;
pub mod session;
pub mod version;

pub use bucket::Bucket;
pub use init::Init;
pub use serve::Serve;
pub use session::Session;
pub use version::Version;
