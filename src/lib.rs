pub mod socket;
mod addr;
mod error;

pub use self::error::{SocketError, ErrorCause, errno};
pub use self::addr::{Family, SockAddr, SocketAddrV4, SocketAddrV6};
pub use self::socket::{Socket, State, ConnType, SockOption, Options, Accepted, SocketBuilder};
