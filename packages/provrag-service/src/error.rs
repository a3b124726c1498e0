pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	/// A backend answered, but with data that cannot form a record.
	#[error("Contract violation from {backend} backend: {message}")]
	Contract { backend: &'static str, message: String },
}
