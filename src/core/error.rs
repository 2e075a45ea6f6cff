use thiserror::Error;

#[derive(Error, Debug)]
pub enum BlockfsError {
    #[error("Identifier already stored: {0}")]
    DuplicateIdentifier(String),

    #[error("Insufficient space: {required} blocks required, {available} free")]
    InsufficientSpace { required: usize, available: usize },

    #[error("Unknown identifier: {0}")]
    UnknownIdentifier(String),

    #[error("Corrupted read: block {index} is empty")]
    CorruptedRead { index: usize },

    #[error("Block index {index} out of range (capacity {capacity})")]
    IndexOutOfRange { index: usize, capacity: usize },

    #[error("Payload of {len} bytes exceeds block size {block_size}")]
    PayloadTooLarge { len: usize, block_size: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Directory not found: {0}")]
    DirectoryNotFound(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Name already exists: {0}")]
    DuplicateName(String),

    #[error("Invalid name: {0:?} (must be non-empty and contain no '/')")]
    InvalidName(String),

    #[error("The root directory cannot be removed")]
    RootDirectoryRemoval,

    #[error("Storage invariant violated: {0}")]
    InvariantViolation(String),
}

pub type Result<T> = std::result::Result<T, BlockfsError>;
