use std::sync::Arc;

use serde_json::Value;

/// Callback перехода состояния: получает данные перехода, если они есть.
pub type StateFn = dyn Fn(Option<&Value>) + Send + Sync;

/// Именованное состояние модуля с двумя необязательными callback-ами:
/// входным (запускается при переходе в состояние) и завершающим
/// (запускается при уходе из него).
pub struct State {
    name: String,
    init: Option<Arc<StateFn>>,
    end: Option<Arc<StateFn>>,
}

impl State {
    pub fn new(
        name: impl Into<String>,
        init: Option<Arc<StateFn>>,
        end: Option<Arc<StateFn>>,
    ) -> Self {
        Self {
            name: name.into(),
            init,
            end,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Переименование без потери callback-ов.
    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_init(&mut self, f: impl Fn(Option<&Value>) + Send + Sync + 'static) {
        self.init = Some(Arc::new(f));
    }

    pub fn clear_init(&mut self) {
        self.init = None;
    }

    pub fn set_end(&mut self, f: impl Fn(Option<&Value>) + Send + Sync + 'static) {
        self.end = Some(Arc::new(f));
    }

    pub fn clear_end(&mut self) {
        self.end = None;
    }

    pub(crate) fn init_callback(&self) -> Option<Arc<StateFn>> {
        self.init.clone()
    }

    pub(crate) fn end_callback(&self) -> Option<Arc<StateFn>> {
        self.end.clone()
    }
}

/// Описание состояния для регистрации модуля.
#[derive(Default)]
pub struct StateSpec {
    pub name: String,
    pub init: Option<Arc<StateFn>>,
    pub end: Option<Arc<StateFn>>,
}

impl StateSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            init: None,
            end: None,
        }
    }

    pub fn with_init(mut self, f: impl Fn(Option<&Value>) + Send + Sync + 'static) -> Self {
        self.init = Some(Arc::new(f));
        self
    }

    pub fn with_end(mut self, f: impl Fn(Option<&Value>) + Send + Sync + 'static) -> Self {
        self.end = Some(Arc::new(f));
        self
    }
}
