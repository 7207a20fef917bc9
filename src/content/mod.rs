pub mod addressing;
mod hash;
mod machines;
mod store;
mod transport;

pub use hash::{check_hash, hash_bytes, hash_reader, is_valid_hash, HASH_LEN};
pub use machines::Machines;
pub use store::{ContentStore, Staged};
pub use transport::{ScpTransport, Transport};
