use std::{fmt, sync::Arc};

use serde_json::Value;

use crate::error::StackError;

/// Callback действия: вызывается с контекстом (если задан) и payload-ом.
pub type ActionFn = dyn Fn(Option<&Value>, &Value) + Send + Sync;

/// Действие по умолчанию стека: запускается, когда живых записей нет.
pub type DefaultActionFn = dyn Fn() + Send + Sync;

/// Действие в стеке: имя темы либо callback.
///
/// Выполнение темы — это `publish` через [`crate::TopicRegistry`], то есть
/// доставка в тему и во все её записанные префиксы. Callback вызывается
/// напрямую.
#[derive(Clone)]
pub enum Action {
    Topic(String),
    Callback(Arc<ActionFn>),
}

impl Action {
    pub fn topic(name: impl Into<String>) -> Self {
        Action::Topic(name.into())
    }

    pub fn callback(f: impl Fn(Option<&Value>, &Value) + Send + Sync + 'static) -> Self {
        Action::Callback(Arc::new(f))
    }

    pub fn is_topic(&self) -> bool {
        matches!(self, Action::Topic(_))
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Topic(name) => f.debug_tuple("Topic").field(name).finish(),
            Action::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

/// Динамическая граница: действие, пришедшее произвольным JSON-значением.
/// Строка становится темой, всё остальное отвергается как
/// [`StackError::InvalidAction`].
impl TryFrom<Value> for Action {
    type Error = StackError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(name) => Ok(Action::Topic(name)),
            other => Err(StackError::InvalidAction(value_kind(&other))),
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
