//! Типы ошибок крейта.
//!
//! Ошибок здесь намеренно мало: контракт шины и стека построен на тихих
//! no-op-ах (см. документацию операций), а не на исключениях. Единственная
//! представимая ошибка возникает на динамической границе, где действие
//! приходит как произвольное JSON-значение.

use thiserror::Error;

pub type StackResult<T> = Result<T, StackError>;

/// Ошибки стека действий.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StackError {
    /// Действие не является ни именем темы, ни callback-ом.
    #[error("action must be a topic name or a callback, got {0}")]
    InvalidAction(&'static str),
}
