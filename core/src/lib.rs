mod app;
pub mod config;
pub mod directory;
pub mod error;
pub mod flags;
pub mod gateway;
pub mod groups;
pub mod http_api;
mod puppyshare;
pub mod remote;
pub mod session;
pub mod store;
pub mod view;

pub use app::SessionSnapshot;
pub use config::Config;
pub use directory::SharedDirectory;
pub use error::{RemoteOp, ShareError};
pub use flags::{ShareFlag, ShareFlags};
pub use gateway::{MemoryGateway, SyncGateway};
pub use groups::{GroupCatalog, GroupId, GroupSet, Visibility};
pub use puppyshare::PuppyShare;
pub use remote::JsonApiGateway;
pub use session::{CommitFailurePolicy, EditMode, EditSession};
pub use store::{DirectoryEdit, SharedDirectoryStore};
