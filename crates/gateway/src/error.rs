use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatherError {
    /// Сводный отказ begin: сообщения ВСЕХ отказавших шардов, через "; ".
    #[error("begin failed: {0}")]
    Begin(String),
    /// Сбой соединения/сокета — всегда наружу (кроме close, там только лог).
    #[error("transport {addr}: {message}")]
    Transport { addr: String, message: String },
    /// Шард ответил, но с error/message вместо статуса.
    #[error("shard {addr}: {message}")]
    Shard { addr: String, message: String },
    /// Current до первого next/seek, после исчерпания или seek мимо диапазона.
    #[error("cursor is not positioned on a row")]
    InvalidCursorState,
}
