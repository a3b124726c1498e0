use uuid::Uuid;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Unknown graph node {0}.")]
	UnknownNode(Uuid),
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),
}
