pub mod context;
pub mod identity;
pub mod provider;
pub mod session;

pub use context::AuthContext;
pub use identity::IdentityToolkitAuth;
pub use provider::AuthProvider;
pub use session::{Session, SessionStorage, User};
