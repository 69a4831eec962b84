use thiserror::Error;

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Hard failures only. Missing report sections and remote transport problems are
/// carried as data (`Record::error`, `RemoteOutput::error`) and never show up here.
#[derive(Debug, Error)]
pub enum Error {
	#[error("io: {0}")]
	Io(#[from] std::io::Error),
	#[error("serde: {0}")]
	Serde(#[from] serde_json::Error),
	#[error("toml: {0}")]
	Toml(#[from] toml::de::Error),
	#[error("config: {0}")]
	Config(String),
	#[error("bundle: {0}")]
	Bundle(String),
	#[error("stage {stage} failed: {reason}")]
	Stage { stage: String, reason: String },
}

impl Error {
	pub fn config(msg: impl Into<String>) -> Self { Self::Config(msg.into()) }
	pub fn bundle(msg: impl Into<String>) -> Self { Self::Bundle(msg.into()) }
	pub fn stage(stage: impl Into<String>, reason: impl Into<String>) -> Self {
		Self::Stage { stage: stage.into(), reason: reason.into() }
	}

	/// True for errors that must abort a command before it touches the report root.
	pub fn is_config(&self) -> bool { matches!(self, Self::Config(_) | Self::Toml(_)) }
}
