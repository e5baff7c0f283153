pub mod cbr;
pub mod kudago;

pub use cbr::CbrProvider;
pub use kudago::KudaGoProvider;
