// Error type shared by the publisher, the key reader and the runtime

/// Everything that can end a teleop run
#[derive(Debug, thiserror::Error)]
pub enum TeleopError {
    #[error("Got shutdown request before subscribers connected")]
    SetupAborted,

    #[error("Keyboard input error: {0}")]
    Input(#[from] std::io::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] zenoh::Error),

    #[error("Failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Failed to start publisher thread: {0}")]
    Thread(std::io::Error),

    #[error("Teleop task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Publisher thread panicked")]
    PublisherPanicked,
}

pub type Result<T> = std::result::Result<T, TeleopError>;
