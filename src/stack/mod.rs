//! Стек отменяемых действий.
//!
//! - `action`: тип действия (тема либо callback) и динамическая граница
//!   для действий, приходящих JSON-значениями.
//! - `escape`: сам стек — слотовая таблица записей, именованный протокол
//!   open/close и поиск с вершины вниз с действием по умолчанию.
//!
//! Публичный API переэкспортирует:
//! - `action::*`
//! - `escape::*`

pub mod action;
pub mod escape;

pub use action::{Action, ActionFn, DefaultActionFn};
pub use escape::ActionStack;
